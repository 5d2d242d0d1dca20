//! URL helpers for the Gemini REST endpoints.

/// Strip trailing slashes so endpoint paths can be appended safely.
///
/// ```
/// use gemini_chat::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://generativelanguage.googleapis.com/v1beta//"),
///     "https://generativelanguage.googleapis.com/v1beta"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Server-sent-events streaming endpoint for `model`.
///
/// Accepts both bare model ids and the `models/` prefixed form the API
/// reports in listings.
///
/// ```
/// use gemini_chat::utils::url::stream_generate_url;
///
/// assert_eq!(
///     stream_generate_url("https://example.com/v1beta/", "gemini-2.5-flash"),
///     "https://example.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
/// );
/// ```
pub fn stream_generate_url(base_url: &str, model: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    construct_api_url(
        base_url,
        &format!("models/{model}:streamGenerateContent?alt=sse"),
    )
}
