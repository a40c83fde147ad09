//! Database connection utilities

/// Normalize a SurrealDB URL for the Ws engine (expects host:port, no scheme)
pub fn normalize_ws_url(s: &str) -> String {
    s.strip_prefix("ws://")
        .or_else(|| s.strip_prefix("wss://"))
        .or_else(|| s.strip_prefix("http://"))
        .or_else(|| s.strip_prefix("https://"))
        .unwrap_or(s)
        .trim_end_matches('/')
        .to_string()
}

/// True when the URL carries a scheme the store knows how to reach
pub fn has_supported_scheme(url: &str) -> bool {
    ["ws://", "wss://", "http://", "https://"]
        .iter()
        .any(|p| url.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_trailing_slash() {
        assert_eq!(normalize_ws_url("ws://127.0.0.1:8000/"), "127.0.0.1:8000");
        assert_eq!(normalize_ws_url("127.0.0.1:8000"), "127.0.0.1:8000");
    }

    #[test]
    fn scheme_detection() {
        assert!(has_supported_scheme("wss://db.internal:443"));
        assert!(!has_supported_scheme("127.0.0.1:8000"));
    }
}
