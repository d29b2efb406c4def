// src/normalize.rs

use url::Url;

/// Normalize a subject to its canonical cache-key form.
///
/// URLs are reparsed so scheme and host come out lowercased (path and query
/// are left alone, they may be case-sensitive). Free text is trimmed as-is.
pub fn normalize_subject(subject: &str) -> String {
    let trimmed = subject.trim();

    if let Ok(parsed) = Url::parse(trimmed) {
        if parsed.has_host() {
            return parsed.to_string();
        }
    }

    trimmed.to_string()
}

/// Whether the subject parses as an absolute URL with a host.
pub fn is_url(subject: &str) -> bool {
    Url::parse(subject.trim())
        .map(|u| u.has_host())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_scheme_and_host_lowercased() {
        let normalized = normalize_subject("  HTTPS://ExAmPle.COM/Login?Token=AbC  ");
        assert_eq!(normalized, "https://example.com/Login?Token=AbC");
    }

    #[test]
    fn test_free_text_only_trimmed() {
        let normalized = normalize_subject("  Verify Your Account NOW  ");
        assert_eq!(normalized, "Verify Your Account NOW");
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/path"));
        assert!(is_url("http://192.168.0.1/login"));
        assert!(!is_url("dear customer, verify your account"));
        assert!(!is_url("example.com")); // no scheme, treated as text
    }

    #[test]
    fn test_same_subject_same_key() {
        let a = normalize_subject("https://Example.com/a");
        let b = normalize_subject("HTTPS://example.COM/a");
        assert_eq!(a, b);
    }
}
