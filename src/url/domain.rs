use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docsweep::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com/api/").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the `host[:port]` network location of a URL
///
/// Default ports are omitted by the `url` crate, so `https://a.org:443/` and
/// `https://a.org/` share a network location.
pub fn netloc(url: &Url) -> String {
    let host = extract_domain(url).unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

/// Checks whether a domain matches a pattern
///
/// A `*.` prefix matches the base domain itself and any of its subdomains.
/// Any other pattern must match exactly. Comparison is case-insensitive.
///
/// # Arguments
///
/// * `pattern` - The domain pattern, e.g. `docs.example.com` or `*.example.com`
/// * `domain` - The host to test
pub fn matches_wildcard(pattern: &str, domain: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let domain = domain.to_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => {
            domain == base
                || (domain.len() > base.len()
                    && domain.ends_with(base)
                    && domain[..domain.len() - base.len()].ends_with('.'))
        }
        None => pattern == domain,
    }
}
