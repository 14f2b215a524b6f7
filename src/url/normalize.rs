use crate::{UrlError, UrlResult};
use url::Url;

/// Query keys always removed when tracking parameters are stripped
const TRACKING_KEYS: &[&str] = &["gclid", "fbclid", "igshid", "mc_cid", "mc_eid"];

/// Any query key starting with one of these prefixes is a tracking key
const TRACKING_PREFIXES: &[&str] = &["utm_"];

/// Link schemes that never point at a fetchable document
const PSEUDO_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// Canonicalizes `href` relative to `base`
///
/// # Normalization Steps
///
/// 1. Reject empty hrefs and `mailto:`/`tel:`/`javascript:` pseudo-links
/// 2. Resolve the reference against `base`
/// 3. Reject anything that is not http or https after resolution
/// 4. Drop the fragment
/// 5. When `strip_tracking` is set, drop tracking query keys and sort the
///    remaining pairs so parameter order never changes the result
///
/// The function is idempotent: normalizing a canonical URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use docsweep::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://docs.example.com/api/index.html").unwrap();
/// let url = normalize(&base, "classes.html?b=2&utm_source=x&a=1#top", true).unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/api/classes.html?a=1&b=2");
/// ```
pub fn normalize(base: &Url, href: &str, strip_tracking: bool) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if PSEUDO_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.host_str()?;

    url.set_fragment(None);

    if strip_tracking && url.query().is_some() {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_key(key))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        pairs.sort();

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    Some(url)
}

/// Parses and canonicalizes a seed URL supplied by the caller
///
/// Unlike [`normalize`], failures are reported as errors because a bad seed
/// aborts the run before any work starts.
pub fn normalize_seed(seed: &str) -> UrlResult<Url> {
    let seed = seed.trim();
    if seed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(seed).map_err(|e| UrlError::Parse(e.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(parsed.scheme().to_string()));
    }
    if parsed.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    normalize(&parsed, seed, true).ok_or_else(|| UrlError::Parse(seed.to_string()))
}

fn is_tracking_key(key: &str) -> bool {
    TRACKING_KEYS.contains(&key) || TRACKING_PREFIXES.iter().any(|p| key.starts_with(p))
}
