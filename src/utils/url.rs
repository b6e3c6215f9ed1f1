//! URL helpers for building backend endpoint addresses.

/// Normalize a base URL by removing trailing slashes.
///
/// ```
/// use medassist::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:5000/"), "http://localhost:5000");
/// assert_eq!(normalize_base_url("https://medassist.example.org///"), "https://medassist.example.org");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path without doubling slashes.
///
/// ```
/// use medassist::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:5000/", "/api/query"),
///     "http://localhost:5000/api/query"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:5000"),
            "http://localhost:5000"
        );
        assert_eq!(
            normalize_base_url("http://localhost:5000///"),
            "http://localhost:5000"
        );
        assert_eq!(normalize_base_url(""), "");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("http://localhost:5000", "api/health"),
            "http://localhost:5000/api/health"
        );

        // Deployments behind a path prefix keep the prefix.
        assert_eq!(
            construct_api_url("https://example.org/medassist/", "/api/query"),
            "https://example.org/medassist/api/query"
        );

        assert_eq!(
            construct_api_url("http://localhost:5000", "///api/query"),
            "http://localhost:5000/api/query"
        );
    }
}
