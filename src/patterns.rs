// src/patterns.rs
//
// Local pattern classifier: the zero-network fallback. Pure and
// deterministic, same subject always yields the same verdict.

use crate::normalize::is_url;
use crate::types::{Label, Verdict};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use url::Url;

pub const LOCAL_SOURCE: &str = "local";

const SHORTENER_HOSTS: &[&str] = &["bit.ly", "tinyurl.com", "goo.gl", "ow.ly", "t.co"];

const SUSPICIOUS_TLDS: &[&str] = &[".tk", ".ml", ".ga", ".cf", ".gq"];

const TYPOSQUATS: &[&str] = &["g00gle", "paypa1", "amazom", "faceb00k"];

// (brand keyword, legitimate registered domain)
const BRANDS: &[(&str, &str)] = &[
    ("paypal", "paypal.com"),
    ("amazon", "amazon.com"),
    ("apple", "apple.com"),
    ("microsoft", "microsoft.com"),
    ("google", "google.com"),
    ("facebook", "facebook.com"),
    ("instagram", "instagram.com"),
];

const URL_KEYWORDS: &[&str] = &["verify", "account", "secure", "update", "confirm", "login"];

// High-confidence phishing phrases, rarely used legitimately.
const CRITICAL_PHRASES: &[&str] = &[
    "verify your account immediately",
    "account will be suspended",
    "confirm your identity now",
    "unusual activity detected on your account",
    "your account has been locked",
    "click here to verify within 24 hours",
    "confirm your payment information immediately",
    "urgent: verify your identity",
];

// Only scored when several occur together.
const MEDIUM_PHRASES: &[&str] = &[
    "verify your account",
    "update your payment",
    "confirm your information",
    "unusual activity",
    "suspended account",
];

const URGENCY_WORDS: &[&str] = &["urgent", "immediately", "within 24 hours", "act now", "limited time"];

const ACCOUNT_WORDS: &[&str] = &["account", "password", "login", "verify", "confirm"];

const OTP_INDICATORS: &[&str] = &[
    "share otp",
    "send otp",
    "tell me the code",
    "provide verification code",
    "what is the otp",
    "read otp aloud",
];

static SUSPICIOUS_DOMAIN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"paypal-verify",
        r"amazon-secure",
        r"apple-id-locked",
        r"microsoft-support-",
        r"bank-.*-verify",
        r"-verify-.*-secure",
        r"secure-.*-login-.*\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static IP_HOST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").unwrap());

struct PatternMatch {
    kind: &'static str,
    description: String,
    points: u32,
}

/// Classify a subject with the static pattern set. No I/O, never fails.
pub fn classify(subject: &str) -> Verdict {
    let subject = subject.trim();
    let mut matches = Vec::new();

    if is_url(subject) {
        score_url(subject, &mut matches);
    } else {
        score_text(subject, &mut matches);
    }

    let score: u32 = matches.iter().map(|m| m.points).sum();

    let label = if score >= 60 {
        Label::Malicious
    } else if score >= 25 {
        Label::Suspicious
    } else {
        Label::Benign
    };

    let confidence = match label {
        // Confidence follows the cumulative pattern weight.
        Label::Malicious | Label::Suspicious => (score.min(100) as f64) / 100.0,
        // A clean subject is a confident benign; near-threshold scores less so.
        _ => (1.0 - score as f64 / 100.0).max(0.5),
    };

    let raw = if matches.is_empty() {
        None
    } else {
        Some(json!({
            "score": score,
            "threats": matches
                .iter()
                .map(|m| json!({ "type": m.kind, "description": m.description }))
                .collect::<Vec<_>>(),
        }))
    };

    Verdict {
        label,
        confidence,
        source: LOCAL_SOURCE.to_string(),
        raw,
    }
}

fn score_url(subject: &str, matches: &mut Vec<PatternMatch>) {
    let parsed = match Url::parse(subject) {
        Ok(u) => u,
        Err(_) => return,
    };
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if IP_HOST.is_match(&host) {
        matches.push(PatternMatch {
            kind: "ip_address_url",
            description: "Using IP address instead of domain name".to_string(),
            points: 25,
        });
    }

    for tld in SUSPICIOUS_TLDS {
        if host.ends_with(tld) {
            matches.push(PatternMatch {
                kind: "suspicious_tld",
                description: format!("Domain uses high-abuse TLD {}", tld),
                points: 20,
            });
            break;
        }
    }

    if SHORTENER_HOSTS.contains(&host.as_str()) {
        matches.push(PatternMatch {
            kind: "url_shortener",
            description: format!("Shortened URL hides destination ({})", host),
            points: 25,
        });
    }

    for squat in TYPOSQUATS {
        if host.contains(squat) {
            matches.push(PatternMatch {
                kind: "typosquat",
                description: format!("Domain contains typosquat pattern {}", squat),
                points: 60,
            });
            break;
        }
    }

    for pattern in SUSPICIOUS_DOMAIN_PATTERNS.iter() {
        if pattern.is_match(&host) {
            matches.push(PatternMatch {
                kind: "suspicious_domain",
                description: format!("Domain contains phishing pattern: {}", host),
                points: 40,
            });
            break;
        }
    }

    for (brand, real) in BRANDS {
        let legit = host == *real || host.ends_with(&format!(".{}", real));
        if host.contains(brand) && !legit {
            matches.push(PatternMatch {
                kind: "brand_impersonation",
                description: format!("Domain appears to impersonate {}", real),
                points: 35,
            });
            break;
        }
    }

    let lower = subject.to_lowercase();
    let keyword_hits = URL_KEYWORDS.iter().filter(|k| lower.contains(*k)).count() as u32;
    if keyword_hits > 0 {
        matches.push(PatternMatch {
            kind: "url_keywords",
            description: format!("{} credential-bait keyword(s) in URL", keyword_hits),
            points: (keyword_hits * 5).min(15),
        });
    }

    // Plain HTTP only matters alongside other signals.
    let prior: u32 = matches.iter().map(|m| m.points).sum();
    if parsed.scheme() == "http" && prior > 0 {
        matches.push(PatternMatch {
            kind: "insecure_connection",
            description: "Not using HTTPS encryption".to_string(),
            points: 10,
        });
    }
}

fn score_text(subject: &str, matches: &mut Vec<PatternMatch>) {
    let lower = subject.to_lowercase();

    let critical_hits = CRITICAL_PHRASES.iter().filter(|p| lower.contains(*p)).count() as u32;
    if critical_hits > 0 {
        matches.push(PatternMatch {
            kind: "critical_phishing_language",
            description: format!("Found {} high-confidence phishing phrase(s)", critical_hits),
            points: critical_hits * 20,
        });
    }

    let medium_hits = MEDIUM_PHRASES.iter().filter(|p| lower.contains(*p)).count() as u32;
    if medium_hits >= 3 {
        matches.push(PatternMatch {
            kind: "multiple_phishing_keywords",
            description: format!("Detected {} suspicious phrases", medium_hits),
            points: medium_hits * 8,
        });
    }

    let otp_hits = OTP_INDICATORS.iter().filter(|p| lower.contains(*p)).count() as u32;
    if otp_hits > 0 {
        matches.push(PatternMatch {
            kind: "otp_sharing",
            description: "Requests sharing of a one-time password".to_string(),
            points: 25,
        });
    }

    let has_urgency = URGENCY_WORDS.iter().any(|w| lower.contains(w));
    let account_hits = ACCOUNT_WORDS.iter().filter(|w| lower.contains(*w)).count();
    if has_urgency && account_hits >= 2 {
        matches.push(PatternMatch {
            kind: "urgency_account_request",
            description: "Combines urgency with account-related requests".to_string(),
            points: 15,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_is_benign() {
        let verdict = classify("https://www.google.com/search?q=weather");
        assert_eq!(verdict.label, Label::Benign);
        assert!(verdict.confidence >= 0.5);
        assert_eq!(verdict.source, "local");
    }

    #[test]
    fn test_phishing_domain_is_malicious() {
        let verdict = classify("https://paypal-verify-secure.tk/account");
        assert_eq!(verdict.label, Label::Malicious);
        assert!(verdict.confidence > 0.8);
        assert!(verdict.raw.is_some());
    }

    #[test]
    fn test_ip_address_url_is_suspicious() {
        let verdict = classify("http://192.0.2.7/login");
        assert_eq!(verdict.label, Label::Suspicious);
    }

    #[test]
    fn test_shortener_is_suspicious() {
        let verdict = classify("https://bit.ly/3xYzAbc");
        assert_eq!(verdict.label, Label::Suspicious);
    }

    #[test]
    fn test_typosquat_flagged() {
        let verdict = classify("https://paypa1-login.com/signin");
        assert_eq!(verdict.label, Label::Malicious);
        let raw = verdict.raw.unwrap();
        let kinds: Vec<&str> = raw["threats"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["type"].as_str().unwrap())
            .collect();
        assert!(kinds.contains(&"typosquat"));
    }

    #[test]
    fn test_legitimate_subdomain_not_impersonation() {
        let verdict = classify("https://mail.google.com/mail/u/0");
        assert_eq!(verdict.label, Label::Benign);
    }

    #[test]
    fn test_phishing_text_is_malicious() {
        let verdict = classify(
            "URGENT: verify your account immediately or your account will be \
             suspended. Confirm your identity now.",
        );
        assert_eq!(verdict.label, Label::Malicious);
    }

    #[test]
    fn test_otp_request_is_suspicious() {
        let verdict = classify("hello, please share otp so we can process your delivery");
        assert_eq!(verdict.label, Label::Suspicious);
    }

    #[test]
    fn test_harmless_text_is_benign() {
        let verdict = classify("see you at lunch tomorrow");
        assert_eq!(verdict.label, Label::Benign);
        assert!(verdict.raw.is_none());
    }

    #[test]
    fn test_deterministic() {
        let subject = "https://secure-bank-verify.ml/confirm";
        let first = classify(subject);
        let second = classify(subject);
        assert_eq!(first.label, second.label);
        assert_eq!(first.confidence, second.confidence);
    }
}
