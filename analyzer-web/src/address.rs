//! Validation and normalization of submitted site addresses.
//!
//! Two sites are the same site when their lowercase `scheme://host[:port]`
//! agree; path, query, fragment and credentials never take part.
use analyzer_common::AnalyzerError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use url::{Host, Url};

pub const MAX_URL_LEN: usize = 255;

/// Form field the validation messages are keyed by.
pub const URL_FIELD: &str = "url";

/// Field name → message. Empty means valid.
pub type ValidationErrors = BTreeMap<&'static str, String>;

static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid DNS label pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL must not be empty")]
    Empty,
    #[error("URL is too long (maximum 255 characters)")]
    TooLong,
    #[error("Wrong URL: {0}")]
    Malformed(String),
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("URL has no valid host")]
    InvalidHost,
}

impl From<UrlError> for AnalyzerError {
    fn from(err: UrlError) -> Self {
        AnalyzerError::Validation(err.to_string())
    }
}

/// Check a submitted string and report problems keyed by form field.
///
/// ```
/// use analyzer_web::{validate, URL_FIELD};
///
/// assert!(validate("https://example.com").is_empty());
///
/// let errors = validate(&"a".repeat(300));
/// assert!(errors.contains_key(URL_FIELD));
/// ```
pub fn validate(input: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if let Err(err) = parse(input) {
        errors.insert(URL_FIELD, err.to_string());
    }
    errors
}

/// Parse a submitted string into an absolute `http`/`https` URL with a
/// plausible host.
pub fn parse(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }
    if trimmed.chars().count() > MAX_URL_LEN {
        return Err(UrlError::TooLong);
    }

    let url = Url::parse(trimmed).map_err(|e| UrlError::Malformed(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::UnsupportedScheme(other.to_string())),
    }
    match url.host() {
        Some(Host::Domain(domain)) if is_valid_domain(domain) => Ok(url),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(url),
        _ => Err(UrlError::InvalidHost),
    }
}

/// Reduce a URL to lowercase `scheme://host[:port]`.
///
/// The port is kept only when it differs from the scheme's default.
///
/// ```
/// use analyzer_web::normalize;
///
/// assert_eq!(normalize("HTTP://Example.com/a?x=1").unwrap(), "http://example.com");
/// assert_eq!(normalize("https://example.com:8443/").unwrap(), "https://example.com:8443");
/// ```
pub fn normalize(raw: &str) -> Result<String, UrlError> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Malformed(e.to_string()))?;
    let host = url.host_str().ok_or(UrlError::InvalidHost)?;
    let normalized = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Ok(normalized.to_lowercase())
}

fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain == "localhost" {
        return true;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| DNS_LABEL.is_match(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_sites() {
        for ok in [
            "https://example.com",
            "http://example.com/path?q=1#frag",
            "https://sub.domain.example.co.uk",
            "http://localhost:8000",
            "http://127.0.0.1:3000/health",
            "http://[::1]:8080",
            "https://пример.рф",
        ] {
            assert!(validate(ok).is_empty(), "{ok} should be valid");
        }
    }

    #[test]
    fn rejects_bad_input() {
        for (bad, expected) in [
            ("", UrlError::Empty),
            ("   ", UrlError::Empty),
            ("ftp://example.com", UrlError::UnsupportedScheme("ftp".into())),
            ("mailto:someone@example.com", UrlError::UnsupportedScheme("mailto".into())),
            ("http://example", UrlError::InvalidHost),
            ("http://intranet", UrlError::InvalidHost),
            ("http://my_site.example.com", UrlError::InvalidHost),
        ] {
            assert_eq!(parse(bad).unwrap_err(), expected, "input {bad:?}");
        }
        assert!(matches!(parse("example.com"), Err(UrlError::Malformed(_))));
        assert!(matches!(parse("http://exa mple.com"), Err(UrlError::Malformed(_))));
    }

    #[test]
    fn length_bound_is_255() {
        let base = "https://example.com/";
        let fits = format!("{base}{}", "a".repeat(MAX_URL_LEN - base.len()));
        let over = format!("{fits}a");
        assert!(validate(&fits).is_empty());
        assert_eq!(parse(&over).unwrap_err(), UrlError::TooLong);
        assert_eq!(validate(&"x".repeat(300))[URL_FIELD], UrlError::TooLong.to_string());
    }

    #[test]
    fn normalize_strips_everything_but_scheme_and_host() {
        assert_eq!(normalize("HTTP://Example.com/a?x=1").unwrap(), "http://example.com");
        assert_eq!(
            normalize("https://user:pw@Example.com/x#y").unwrap(),
            "https://example.com"
        );
        assert_eq!(normalize("https://example.com:443/").unwrap(), "https://example.com");
        assert_eq!(normalize("http://example.com:8080/").unwrap(), "http://example.com:8080");
        assert_eq!(normalize("  https://example.com  ").unwrap(), "https://example.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "HTTP://Example.com/a?x=1",
            "https://WWW.Example.ORG:8443/x/y",
            "http://[::1]:8080/",
            "https://пример.рф/страница",
            "http://127.0.0.1",
        ] {
            let once = normalize(raw).unwrap();
            assert_eq!(normalize(&once).unwrap(), once, "input {raw}");
        }
    }

    #[test]
    fn normalize_rejects_unparseable_input() {
        assert!(matches!(normalize("not a url"), Err(UrlError::Malformed(_))));
    }

    #[test]
    fn errors_become_validation_failures() {
        let err: AnalyzerError = UrlError::Empty.into();
        assert!(matches!(err, AnalyzerError::Validation(_)));
    }
}
