//! The PageRecord data model
//!
//! One `PageRecord` is produced for every frontier entry the crawl draws,
//! whatever its outcome. Successful records carry the extracted content;
//! skipped and error records carry the reason in `error`.

use crate::state::PageStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Number of hex characters kept from the SHA-256 of the canonical URL
const PAGE_KEY_LEN: usize = 16;

/// Document format a record was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[default]
    Html,
    Pdf,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }
}

/// One heading of the main content region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 for `h1` through 6 for `h6`
    pub level: u8,
    pub text: String,
}

/// How an asset was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetKind {
    /// `<img>` element (`src` or the last `srcset` candidate)
    Image,
    /// `background-image: url(...)` in inline, embedded or computed styles
    CssBackground,
}

/// An image referenced by a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub kind: AssetKind,

    /// Resolved source URL, query string preserved
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    /// Where the asset store saved the file, when it did
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
}

/// The normalized extraction result for one crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Canonical URL, unique within a run
    pub url: String,

    /// URL the content was finally served from (after redirects)
    pub final_url: String,

    pub fetched_at: DateTime<Utc>,

    pub http_status: Option<u16>,

    pub status: PageStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the rendering backend produced the content
    pub rendered: bool,

    pub file_type: FileType,

    pub title: String,

    pub text: String,

    pub headings: Vec<Heading>,

    pub code_blocks: Vec<String>,

    pub assets: Vec<Asset>,

    /// Canonical in-domain links found on the page, first-seen order
    pub out_links: Vec<String>,

    pub depth: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_profile: Option<String>,

    /// Stable identifier derived from the canonical URL
    pub page_key: String,
}

impl PageRecord {
    /// Creates an empty successful record for `url`
    ///
    /// Callers fill the extracted fields afterwards.
    pub fn new(url: &Url, depth: u32, auth_profile: Option<String>) -> Self {
        Self {
            url: url.to_string(),
            final_url: url.to_string(),
            fetched_at: Utc::now(),
            http_status: None,
            status: PageStatus::Success,
            error: None,
            rendered: false,
            file_type: FileType::Html,
            title: String::new(),
            text: String::new(),
            headings: Vec::new(),
            code_blocks: Vec::new(),
            assets: Vec::new(),
            out_links: Vec::new(),
            depth,
            auth_profile,
            page_key: page_key(url),
        }
    }

    /// Creates an error record carrying the failure cause
    pub fn error(
        url: &Url,
        depth: u32,
        auth_profile: Option<String>,
        cause: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(url, depth, auth_profile);
        record.status = PageStatus::Error;
        record.error = Some(cause.into());
        record
    }

    /// Creates a skipped record carrying the reason
    pub fn skipped(
        url: &Url,
        depth: u32,
        auth_profile: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        let mut record = Self::new(url, depth, auth_profile);
        record.status = PageStatus::Skipped;
        record.error = Some(reason.into());
        record
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Derives the stable page key of a canonical URL
///
/// The key is the first 16 hex characters of the URL's SHA-256 digest and
/// names the directory co-located assets are stored under.
pub fn page_key(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(PAGE_KEY_LEN);
    key
}
