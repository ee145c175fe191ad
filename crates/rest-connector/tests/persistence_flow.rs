use rest_connector::config::EncryptionConfig;
use rest_connector::encryption::is_encrypted;
use rest_connector::{
    ApiKeyLocation, ApiTemplate, AuthStrategy, BasicAuth, ConnectorError, ContentType, CustomAuth,
    FieldEncryption, HttpMethod, OAuth2Password, RequestDescriptor, SecretCipher, StringMap,
    TemplateMethod,
};
use serde_json::json;

fn cipher() -> FieldEncryption {
    FieldEncryption::new(EncryptionConfig::new(FieldEncryption::generate_master_key(), 1))
}

fn all_strategies() -> Vec<AuthStrategy> {
    vec![
        AuthStrategy::None,
        BasicAuth::new("alice", "s3cret").with_preemptive(false).into(),
        AuthStrategy::bearer("tok"),
        AuthStrategy::api_key("X-Key", "k-1", ApiKeyLocation::Header),
        AuthStrategy::api_key("key", "k-2", ApiKeyLocation::Query),
        rest_connector::OAuth2ClientCredentials::new("https://auth.test/token", "cid", "csecret")
            .unwrap()
            .with_scope("read write")
            .with_audience("api://orders")
            .into(),
        OAuth2Password::new("https://auth.test/token", "cid", "bob", "hunter2")
            .unwrap()
            .with_client_secret("csecret")
            .into(),
        CustomAuth::from_iter([("X-Signature".to_string(), "sig".to_string())]).into(),
    ]
}

#[test]
fn every_strategy_survives_plain_and_encrypted_storage() {
    let cipher = cipher();
    for strategy in all_strategies() {
        let plain = strategy.to_json();
        assert_eq!(AuthStrategy::from_json_with(&plain, None), strategy, "plain {:?}", strategy);

        let sealed = strategy.to_json_with(Some(&cipher as &dyn SecretCipher));
        assert_eq!(sealed["authType"], plain["authType"]);
        assert_eq!(
            AuthStrategy::from_json_with(&sealed, Some(&cipher as &dyn SecretCipher)),
            strategy,
            "encrypted {:?}",
            strategy
        );
    }
}

#[test]
fn stored_secrets_are_never_plain_text() {
    let cipher = cipher();
    let request = RequestDescriptor::builder("https://api.test.com")
        .auth(OAuth2Password::new("https://auth.test/token", "cid", "bob", "hunter2").unwrap())
        .build()
        .unwrap();

    let stored = request.to_json_with(Some(&cipher as &dyn SecretCipher));
    let text = stored.to_string();
    assert!(!text.contains("hunter2"));
    assert!(is_encrypted(stored["auth"]["password"].as_str().unwrap()));
    assert_eq!(stored["auth"]["username"], "bob");

    let restored = RequestDescriptor::from_json_with(&stored, Some(&cipher as &dyn SecretCipher)).unwrap();
    assert_eq!(restored, request);
}

#[test]
fn secrets_sealed_with_another_key_degrade_to_empty() {
    let writer = cipher();
    let reader = cipher();
    let stored = AuthStrategy::bearer("tok").to_json_with(Some(&writer as &dyn SecretCipher));

    let restored = AuthStrategy::from_json_with(&stored, Some(&reader as &dyn SecretCipher));
    assert_eq!(restored, AuthStrategy::bearer(""));
    let without_key = AuthStrategy::from_json_with(&stored, None);
    assert_eq!(without_key, AuthStrategy::bearer(""));
}

#[test]
fn template_document_drives_requests() {
    let document = json!({
        "name": "crm",
        "displayName": "",
        "baseUrl": "https://crm.test/api/",
        "timeoutMs": 5000,
        "verifySsl": false,
        "auth": { "authType": "basic", "username": "svc", "password": "pw" },
        "headers": { "Accept": "application/json", "X-Client": "rest-connector" },
        "methods": [
            {
                "name": "getContact",
                "httpMethod": "GET",
                "path": "contacts/{id}",
                "queryParams": { "expand": "owner" }
            },
            {
                "name": "createContact",
                "displayName": "Create contact",
                "httpMethod": "POST",
                "path": "/contacts",
                "headers": { "X-Client": "importer" },
                "bodyTemplate": "{\"name\":\"${name}\"}"
            }
        ]
    });

    let template = ApiTemplate::from_json_with(&document, None).unwrap();
    assert_eq!(template.display_name(), "crm");
    assert_eq!(template.method("createContact").map(TemplateMethod::display_name), Some("Create contact"));
    assert_eq!(template.method("getContact").map(TemplateMethod::display_name), Some("getContact"));

    let mut vars = StringMap::new();
    vars.insert("id".to_string(), "c/42".to_string());
    let get = template.request_for("getContact", &vars).unwrap();
    assert_eq!(get.full_url(), "https://crm.test/api/contacts/c%2F42?expand=owner");
    assert_eq!(get.timeout_ms(), 5000);
    assert!(!get.verify_ssl());
    assert_eq!(get.full_headers()["Authorization"], "Basic c3ZjOnB3");

    let create = template.request_for("createContact", &StringMap::new()).unwrap();
    assert_eq!(create.method(), HttpMethod::Post);
    assert_eq!(create.url(), "https://crm.test/api/contacts");
    assert_eq!(create.headers()["X-Client"], "importer");
    assert_eq!(create.content_type(), ContentType::Json);
    assert_eq!(create.full_headers()["Content-Type"], "application/json");
    assert!(create.has_body());

    assert!(matches!(
        template.request_for("deleteContact", &StringMap::new()),
        Err(ConnectorError::MethodNotFound(_))
    ));
}

#[test]
fn template_json_is_compact_and_stable() {
    let template = ApiTemplate::builder("billing", "https://billing.test")
        .description("Invoices and payments")
        .auth(AuthStrategy::api_key("X-Key", "k", ApiKeyLocation::Header))
        .add_method("listInvoices", HttpMethod::Get, "/invoices")
        .build()
        .unwrap();

    let node = template.to_json();
    assert_eq!(node["description"], "Invoices and payments");
    assert_eq!(node["headers"]["Accept"], "application/json");
    assert_eq!(
        node["methods"],
        json!([{ "name": "listInvoices", "displayName": "listInvoices", "httpMethod": "GET", "path": "/invoices" }])
    );
    assert_eq!(ApiTemplate::from_json_with(&node, None).unwrap(), template);
}
