//! URL building utilities

use url::form_urlencoded;

/// Form-encode one query component (`application/x-www-form-urlencoded`,
/// spaces become `+`)
pub fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Join `key=value` pairs with `&`, encoding each side
pub fn encode_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append query pairs to a URL, using `&` when it already has a query string
pub fn append_query<'a, I>(url: &str, pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let query = encode_pairs(pairs);
    if query.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, query)
}

/// Join a base URL and a path with exactly one slash between them
///
/// - `join("https://api.example.com/v1/", "/users")` -> `https://api.example.com/v1/users`
/// - `join("https://api.example.com", "")` -> `https://api.example.com`
pub fn join(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Replace `{name}` placeholders with percent-encoded values.
///
/// Unknown placeholders are left in place.
pub fn substitute_path_vars<'a, I>(path: &str, vars: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    vars.into_iter().fold(path.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), &encode_path_segment(value))
    })
}

fn encode_path_segment(value: &str) -> String {
    // form encoding turns spaces into '+', which is literal in a path
    encode_component(value).replace('+', "%20")
}
