//! URL helpers for building Gemini endpoint addresses.

/// Strip trailing slashes so endpoint paths can be appended safely.
///
/// ```
/// use mindchat::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://generativelanguage.googleapis.com/v1beta/"),
///     "https://generativelanguage.googleapis.com/v1beta"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between them.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// URL of the `generateContent` method for `model`.
///
/// ```
/// use mindchat::utils::url::generate_content_url;
///
/// assert_eq!(
///     generate_content_url("https://generativelanguage.googleapis.com/v1beta", "gemini-2.0-flash"),
///     "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
/// );
/// ```
pub fn generate_content_url(base_url: &str, model: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    construct_api_url(base_url, &format!("models/{model}:generateContent"))
}
