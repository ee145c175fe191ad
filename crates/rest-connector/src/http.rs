//! HTTP verbs and body content types

/// HTTP method for an outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Case-insensitive parse
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Parse with GET as the fallback for blank or unknown verbs
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.filter(|v| !v.trim().is_empty()) {
            None => Self::Get,
            Some(v) => Self::parse(v).unwrap_or_else(|| {
                tracing::warn!(method = %v, "Unknown HTTP method, using GET");
                Self::Get
            }),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content type of a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    #[default]
    Json,
    Xml,
    FormUrlencoded,
    MultipartFormData,
    TextPlain,
    TextHtml,
    OctetStream,
}

impl ContentType {
    const ALL: [ContentType; 7] = [
        Self::Json,
        Self::Xml,
        Self::FormUrlencoded,
        Self::MultipartFormData,
        Self::TextPlain,
        Self::TextHtml,
        Self::OctetStream,
    ];

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
            Self::FormUrlencoded => "application/x-www-form-urlencoded",
            Self::MultipartFormData => "multipart/form-data",
            Self::TextPlain => "text/plain",
            Self::TextHtml => "text/html",
            Self::OctetStream => "application/octet-stream",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::FormUrlencoded => "FORM_URLENCODED",
            Self::MultipartFormData => "MULTIPART_FORM_DATA",
            Self::TextPlain => "TEXT_PLAIN",
            Self::TextHtml => "TEXT_HTML",
            Self::OctetStream => "OCTET_STREAM",
        }
    }

    /// Accepts a MIME string (parameters ignored) or an enum name
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let mime = value.split(';').next().unwrap_or_default().trim();
        Self::ALL.into_iter().find(|ct| {
            ct.mime_type().eq_ignore_ascii_case(mime) || ct.name().eq_ignore_ascii_case(value)
        })
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// True for `application/json` and `+json` media types
pub fn is_json_media_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}
