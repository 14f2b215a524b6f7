//! Crawl scope: which discovered URLs belong to the documentation set

use crate::url::domain::{extract_domain, matches_wildcard, netloc};
use url::Url;

/// Extensions of resources that are never documentation pages
///
/// Unknown or missing extensions are allowed so path-only documentation
/// URLs (`/docs/guide/`) stay in scope. PDF is allowed on purpose.
const BLOCKED_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp",
    // Styles & scripts
    "css", "js", "json", "xml", "map",
    // Archives
    "zip", "tar", "gz", "rar", "7z",
    // Media
    "mp4", "mp3", "avi", "mov", "wmv", "flv", "wav",
    // Fonts
    "woff", "woff2", "ttf", "eot", "otf",
    // Office formats
    "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // Other
    "txt", "csv", "log",
];

/// Conventional landing pages of generated API documentation
pub const LANDING_PAGES: &[&str] = &[
    "index.html",
    "modules.html",
    "namespaces.html",
    "classes.html",
    "files.html",
    "annotated.html",
    "functions.html",
    "globals.html",
    "pages.html",
];

/// The network location and base directory a crawl is confined to
#[derive(Debug, Clone)]
pub struct CrawlScope {
    netloc: String,
    base_path: String,
    allowed_domains: Vec<String>,
    base_dir_url: Url,
}

impl CrawlScope {
    /// Builds the scope of a crawl from its seed
    ///
    /// The base directory is the seed path up to and including its last `/`,
    /// so `https://ex.org/docs/index.html` confines the crawl to `/docs/`.
    /// `allowed_domains` restricts outbound links; empty means the seed host.
    pub fn from_seed(seed: &Url, allowed_domains: &[String]) -> Self {
        let path = seed.path();
        let base_path = match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => "/".to_string(),
        };

        let mut base_dir_url = seed.clone();
        base_dir_url.set_path(&base_path);
        base_dir_url.set_query(None);
        base_dir_url.set_fragment(None);

        let allowed_domains = if allowed_domains.is_empty() {
            extract_domain(seed).into_iter().collect()
        } else {
            allowed_domains.iter().map(|d| d.to_lowercase()).collect()
        };

        Self {
            netloc: netloc(seed),
            base_path,
            allowed_domains,
            base_dir_url,
        }
    }

    /// Returns the base directory path (always ends with `/`)
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Returns the `host[:port]` the crawl is confined to
    pub fn netloc(&self) -> &str {
        &self.netloc
    }

    /// Returns true if the URL may be enqueued for crawling
    pub fn contains(&self, url: &Url) -> bool {
        if netloc(url) != self.netloc {
            return false;
        }
        if !url.path().starts_with(&self.base_path) {
            return false;
        }
        !has_blocked_extension(url)
    }

    /// Returns true if the URL's host is in the allowed domain set
    pub fn allows_domain(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(host) => self
                .allowed_domains
                .iter()
                .any(|pattern| matches_wildcard(pattern, &host)),
            None => false,
        }
    }

    /// Returns the conventional landing pages next to the seed
    pub fn landing_pages(&self) -> Vec<Url> {
        LANDING_PAGES
            .iter()
            .filter_map(|name| self.base_dir_url.join(name).ok())
            .collect()
    }
}

/// Returns true if the last path segment carries a blocked extension
fn has_blocked_extension(url: &Url) -> bool {
    let filename = url.path().rsplit('/').next().unwrap_or("");
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            BLOCKED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> CrawlScope {
        let seed = Url::parse("https://ex.org/docs/index.html").unwrap();
        CrawlScope::from_seed(&seed, &[])
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_base_path_from_file_seed() {
        assert_eq!(scope().base_path(), "/docs/");
    }

    #[test]
    fn test_base_path_from_directory_seed() {
        let seed = url("https://ex.org/docs/guide/");
        assert_eq!(CrawlScope::from_seed(&seed, &[]).base_path(), "/docs/guide/");

        let root = url("https://ex.org");
        assert_eq!(CrawlScope::from_seed(&root, &[]).base_path(), "/");
    }

    #[test]
    fn test_contains_same_directory() {
        let scope = scope();
        assert!(scope.contains(&url("https://ex.org/docs/classes.html")));
        assert!(scope.contains(&url("https://ex.org/docs/sub/page")));
        assert!(scope.contains(&url("https://ex.org/docs/manual.pdf")));
    }

    #[test]
    fn test_rejects_other_host_or_port() {
        let scope = scope();
        assert!(!scope.contains(&url("https://other.org/docs/classes.html")));
        assert!(!scope.contains(&url("https://ex.org:8443/docs/classes.html")));
    }

    #[test]
    fn test_rejects_outside_base_path() {
        let scope = scope();
        assert!(!scope.contains(&url("https://ex.org/blog/post.html")));
        assert!(!scope.contains(&url("https://ex.org/")));
    }

    #[test]
    fn test_extension_blocklist() {
        let scope = scope();
        assert!(!scope.contains(&url("https://ex.org/docs/logo.PNG")));
        assert!(!scope.contains(&url("https://ex.org/docs/search.js")));
        assert!(!scope.contains(&url("https://ex.org/docs/archive.tar")));
        assert!(!scope.contains(&url("https://ex.org/docs/font.woff2")));
        // unknown or missing extensions pass
        assert!(scope.contains(&url("https://ex.org/docs/api.v2")));
        assert!(scope.contains(&url("https://ex.org/docs/guide")));
    }

    #[test]
    fn test_allows_domain_defaults_to_seed_host() {
        let scope = scope();
        assert!(scope.allows_domain(&url("https://ex.org/anything")));
        assert!(!scope.allows_domain(&url("https://cdn.ex.org/anything")));
    }

    #[test]
    fn test_allows_domain_with_wildcards() {
        let seed = url("https://ex.org/docs/index.html");
        let scope = CrawlScope::from_seed(&seed, &["*.ex.org".to_string()]);
        assert!(scope.allows_domain(&url("https://ex.org/a")));
        assert!(scope.allows_domain(&url("https://api.ex.org/a")));
        assert!(!scope.allows_domain(&url("https://ex.com/a")));
    }

    #[test]
    fn test_landing_pages() {
        let pages = scope().landing_pages();
        assert_eq!(pages.len(), LANDING_PAGES.len());
        assert_eq!(pages[0].as_str(), "https://ex.org/docs/index.html");
        assert!(pages
            .iter()
            .any(|p| p.as_str() == "https://ex.org/docs/annotated.html"));
    }
}
