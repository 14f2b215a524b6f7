use serde::Deserialize;

/// Main configuration structure for Docsweep
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a default configuration rooted at the given seed URL
    pub fn for_seed(seed: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.crawler.seed = seed.into();
        config
    }
}

/// Scheduling model for a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// One page at a time, sorted seed-first order, polite delay between fetches
    #[default]
    Sequential,
    /// Bounded pool of in-flight fetches drained in FIFO order
    Concurrent,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URL the crawl starts from
    #[serde(default)]
    pub seed: String,

    #[serde(default)]
    pub mode: CrawlMode,

    /// Maximum number of successfully extracted pages
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link-following depth from a seed (seeds are depth 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Delay between fetches in sequential mode (milliseconds)
    #[serde(rename = "delay-ms", default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Maximum number of in-flight fetches in concurrent mode
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Seconds without a completed page before the run is forcibly stopped
    #[serde(rename = "idle-timeout-secs", default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Number of error records after which the run is forcibly stopped
    #[serde(rename = "max-errors", default = "default_max_errors")]
    pub max_errors: usize,

    /// Probe conventional documentation landing pages next to the seed
    #[serde(rename = "probe-landing-pages", default = "default_true")]
    pub probe_landing_pages: bool,

    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// Domain patterns (e.g. "docs.example.com" or "*.example.com") outbound
    /// links are filtered to; empty means the seed host only
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Titles treated as placeholders and replaced by a URL-derived title
    #[serde(rename = "boilerplate-titles", default = "default_boilerplate_titles")]
    pub boilerplate_titles: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            seed: String::new(),
            mode: CrawlMode::default(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            delay_ms: default_delay_ms(),
            concurrency: default_concurrency(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_errors: default_max_errors(),
            probe_landing_pages: true,
            respect_robots: true,
            allowed_domains: Vec::new(),
            boilerplate_titles: default_boilerplate_titles(),
        }
    }
}

/// Network fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first failed attempt of a non-rendered fetch
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Rendering backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Whether client-rendered pages are re-fetched through the browser
    #[serde(default)]
    pub enabled: bool,

    /// Maximum number of simultaneously open browser pages
    #[serde(rename = "max-sessions", default = "default_max_sessions")]
    pub max_sessions: u32,

    #[serde(
        rename = "navigation-timeout-secs",
        default = "default_navigation_timeout_secs"
    )]
    pub navigation_timeout_secs: u64,

    #[serde(rename = "include-css-backgrounds", default = "default_true")]
    pub include_css_backgrounds: bool,

    /// Named auth/session profile passed through to the fetch layer
    #[serde(rename = "auth-profile", default)]
    pub auth_profile: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_sessions: default_max_sessions(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            include_css_backgrounds: true,
            auth_profile: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for shards, text files, summary and assets
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Maximum character count of one JSONL shard
    #[serde(rename = "shard-limit", default = "default_shard_limit")]
    pub shard_limit: usize,

    #[serde(rename = "write-text", default = "default_true")]
    pub write_text: bool,

    #[serde(rename = "write-summary", default = "default_true")]
    pub write_summary: bool,

    #[serde(rename = "download-assets", default)]
    pub download_assets: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            shard_limit: default_shard_limit(),
            write_text: true,
            write_summary: true,
            download_assets: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> usize {
    500
}

fn default_max_depth() -> u32 {
    4
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_concurrency() -> u32 {
    16
}

fn default_idle_timeout_secs() -> u64 {
    120
}

fn default_max_errors() -> usize {
    50
}

fn default_boilerplate_titles() -> Vec<String> {
    vec!["Untitled".to_string(), "Main Page".to_string()]
}

fn default_user_agent() -> String {
    "docsweep/1.0 (compatible; documentation crawler)".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_sessions() -> u32 {
    4
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_output_directory() -> String {
    "./crawl_output".to_string()
}

fn default_shard_limit() -> usize {
    495_000
}
