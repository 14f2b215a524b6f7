//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of
//! one crawl invocation, including:
//! - Seeding the frontier (seed URL plus probed landing pages)
//! - Fetching robots.txt for the seed host
//! - Draining the frontier sequentially or with a bounded worker pool
//! - Enforcing the page, error and idle ceilings and cancellation
//! - Writing records and the final summary
//!
//! The coordinator is the single owner of `CrawlState`: spawned workers only
//! return `PageOutcome`s and never touch the frontier or counters.

use crate::config::{validate, Config, CrawlMode};
use crate::crawler::assets::{AssetStore, DiskAssetStore, NullAssetStore};
use crate::crawler::decider::{Decider, MarkerHeuristic, RenderHeuristic};
use crate::crawler::fetcher::{build_http_client, RetryPolicy};
use crate::crawler::frontier::{DrawOrder, Frontier, FrontierEntry};
use crate::crawler::pdf::{NoPdfConverter, PdfTextExtractor};
use crate::crawler::render::{ChromiumRenderer, Renderer};
use crate::crawler::worker::{PageOutcome, PageWorker};
use crate::output::{CrawlStatistics, CrawlSummary, FileOutput, OutputHandler};
use crate::record::PageRecord;
use crate::robots::fetch_robots;
use crate::state::{CancelFlag, CrawlState, PageStatus};
use crate::url::{normalize, normalize_seed, CrawlScope};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use url::Url;

/// How a crawl ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationStatus {
    /// Page ceiling reached or frontier exhausted
    Completed,
    /// External stop requested
    Cancelled,
    /// Idle watchdog or error ceiling tripped
    ForcedStop { reason: String },
}

impl TerminationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::ForcedStop { .. } => "forced-stop",
        }
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForcedStop { reason } => write!(f, "forced-stop ({})", reason),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Progress notifications for a host that wants a live log
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    Started { seeds: Vec<String> },
    PageDone {
        url: String,
        status: PageStatus,
        depth: u32,
        pages_completed: usize,
    },
    Finished {
        status: TerminationStatus,
        pages_completed: usize,
    },
}

impl fmt::Display for CrawlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { seeds } => write!(f, "Starting crawl with {} seed(s)", seeds.len()),
            Self::PageDone {
                url,
                status,
                depth,
                pages_completed,
            } => write!(
                f,
                "[{}] {} (depth {}, {} pages)",
                status, url, depth, pages_completed
            ),
            Self::Finished {
                status,
                pages_completed,
            } => write!(f, "Crawl {}: {} pages extracted", status, pages_completed),
        }
    }
}

/// Collaborators and hooks of one crawl invocation
///
/// Everything defaults to what the configuration asks for: the Chromium
/// renderer when rendering is enabled, disk asset storage when asset
/// download is enabled, and no PDF converter.
#[derive(Clone)]
pub struct CrawlOptions {
    pub cancel: CancelFlag,
    pub events: Option<UnboundedSender<CrawlEvent>>,
    pub renderer: Option<Arc<dyn Renderer>>,
    pub heuristic: Arc<dyn RenderHeuristic>,
    pub pdf_extractor: Arc<dyn PdfTextExtractor>,
    pub asset_store: Option<Arc<dyn AssetStore>>,
    pub config_hash: Option<String>,
    /// Send every page straight to the renderer
    pub force_render: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            cancel: CancelFlag::new(),
            events: None,
            renderer: None,
            heuristic: Arc::new(MarkerHeuristic::default()),
            pdf_extractor: Arc::new(NoPdfConverter),
            asset_store: None,
            config_hash: None,
            force_render: false,
        }
    }
}

impl CrawlOptions {
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_events(mut self, events: UnboundedSender<CrawlEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Uses `renderer` instead of launching Chromium when rendering is enabled
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_heuristic(mut self, heuristic: Arc<dyn RenderHeuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_pdf_extractor(mut self, extractor: Arc<dyn PdfTextExtractor>) -> Self {
        self.pdf_extractor = extractor;
        self
    }

    pub fn with_asset_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.asset_store = Some(store);
        self
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn with_force_render(mut self, force: bool) -> Self {
        self.force_render = force;
        self
    }
}

/// What a finished crawl hands back to its caller
#[derive(Debug)]
pub struct CrawlReport {
    pub status: TerminationStatus,
    /// Every record produced, in completion order
    pub records: Vec<PageRecord>,
    pub statistics: CrawlStatistics,
    pub shard_files: Vec<PathBuf>,
    pub text_files: Vec<PathBuf>,
    /// Filesystem failures hit while writing; the crawl kept going
    pub write_errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Number of successfully extracted pages
    pub fn successes(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    /// A run that extracted nothing is a failure for the caller
    pub fn is_failure(&self) -> bool {
        self.successes() == 0
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    seed: Url,
    scope: Arc<CrawlScope>,
    client: Client,
    state: CrawlState,
    worker: PageWorker,
    renderer: Option<Arc<dyn Renderer>>,
    output: Arc<dyn OutputHandler>,
    delay: Duration,
    events: Option<UnboundedSender<CrawlEvent>>,
    config_hash: Option<String>,
    force_render: bool,
    statistics: CrawlStatistics,
    records: Vec<PageRecord>,
    write_errors: Vec<String>,
    started_at: DateTime<Utc>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Validates the configuration, prepares the output directory, builds
    /// the HTTP client and, when enabled, the rendering backend. Any error
    /// here aborts the run before a single page is fetched.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `options` - Collaborators and hooks for this invocation
    pub async fn new(config: Config, options: CrawlOptions) -> crate::Result<Self> {
        validate(&config)?;
        let seed = normalize_seed(&config.crawler.seed)?;
        let scope = Arc::new(CrawlScope::from_seed(&seed, &config.crawler.allowed_domains));

        let output: Arc<dyn OutputHandler> = Arc::new(FileOutput::create(&config.output)?);
        let client = build_http_client(&config.fetch)?;

        let renderer = if config.render.enabled {
            match options.renderer {
                Some(renderer) => Some(renderer),
                None => match ChromiumRenderer::launch(&config.render, &config.fetch.user_agent).await
                {
                    Ok(renderer) => Some(Arc::new(renderer) as Arc<dyn Renderer>),
                    Err(e) => {
                        tracing::warn!("Rendering backend unavailable, continuing without it: {}", e);
                        None
                    }
                },
            }
        } else {
            None
        };

        let robots = if config.crawler.respect_robots {
            Some(Arc::new(fetch_robots(&client, &seed).await))
        } else {
            None
        };

        let mut delay = Duration::from_millis(config.crawler.delay_ms);
        if let Some(crawl_delay) = robots
            .as_ref()
            .and_then(|r| r.crawl_delay(&config.fetch.user_agent))
        {
            if crawl_delay > delay {
                tracing::info!("robots.txt raises the delay to {:?}", crawl_delay);
                delay = crawl_delay;
            }
        }

        let assets: Arc<dyn AssetStore> = match options.asset_store {
            Some(store) => store,
            None if config.output.download_assets => Arc::new(DiskAssetStore::new(
                client.clone(),
                PathBuf::from(&config.output.directory),
            )),
            None => Arc::new(NullAssetStore),
        };

        let auth_profile = config.render.auth_profile.clone();
        let decider = Decider::new(
            client.clone(),
            RetryPolicy::from_config(&config.fetch),
            renderer.clone(),
            options.heuristic,
            auth_profile.clone(),
            config.render.include_css_backgrounds,
        );

        let worker = PageWorker {
            decider,
            scope: scope.clone(),
            robots,
            user_agent: config.fetch.user_agent.clone(),
            pdf: options.pdf_extractor,
            assets,
            boilerplate_titles: Arc::new(config.crawler.boilerplate_titles.clone()),
            css_backgrounds: config.render.include_css_backgrounds,
            auth_profile,
        };

        let order = match config.crawler.mode {
            CrawlMode::Sequential => DrawOrder::Sorted,
            CrawlMode::Concurrent => DrawOrder::Fifo,
        };
        let frontier = Frontier::new(order, config.crawler.max_depth, config.crawler.max_pages);

        Ok(Self {
            config: Arc::new(config),
            seed,
            scope,
            client,
            state: CrawlState::new(frontier, options.cancel),
            worker,
            renderer,
            output,
            delay,
            events: options.events,
            config_hash: options.config_hash,
            force_render: options.force_render,
            statistics: CrawlStatistics::new(),
            records: Vec::new(),
            write_errors: Vec::new(),
            started_at: Utc::now(),
        })
    }

    /// Runs the crawl to termination and writes the summary
    pub async fn run(mut self) -> crate::Result<CrawlReport> {
        let seeds = self.seed_frontier().await;
        tracing::info!(
            "Starting {:?} crawl of {} with {} seed(s)",
            self.config.crawler.mode,
            self.seed,
            seeds.len()
        );
        self.emit(CrawlEvent::Started { seeds });

        let status = match self.config.crawler.mode {
            CrawlMode::Sequential => self.run_sequential().await,
            CrawlMode::Concurrent => self.run_concurrent().await,
        };

        tracing::info!(
            "Crawl {}: {} pages extracted, {} skipped, {} errors",
            status,
            self.state.pages_completed(),
            self.state.skipped(),
            self.state.errors()
        );

        if let Some(renderer) = &self.renderer {
            renderer.shutdown().await;
        }

        let finished_at = Utc::now();
        let summary = CrawlSummary {
            seed: self.seed.to_string(),
            started_at: self.started_at,
            finished_at,
            termination: status.to_string(),
            config_hash: self.config_hash.clone(),
            statistics: self.statistics.clone(),
            shard_files: self.output.shard_files(),
            text_files: self.output.text_files(),
        };
        if let Err(e) = self.output.finalize(&summary) {
            tracing::error!("Failed to finalize output: {}", e);
            self.write_errors.push(format!("summary: {}", e));
        }

        self.emit(CrawlEvent::Finished {
            status: status.clone(),
            pages_completed: self.state.pages_completed(),
        });

        Ok(CrawlReport {
            status,
            records: self.records,
            statistics: self.statistics,
            shard_files: summary.shard_files,
            text_files: summary.text_files,
            write_errors: self.write_errors,
            started_at: self.started_at,
            finished_at,
        })
    }

    /// Offers the seed and every landing page that answers with success
    async fn seed_frontier(&mut self) -> Vec<String> {
        let mut seeds = vec![self.seed.clone()];

        if self.config.crawler.probe_landing_pages {
            for candidate in self.scope.landing_pages() {
                if self.state.is_cancelled() {
                    break;
                }
                let Some(candidate) = normalize(&self.seed, candidate.as_str(), true) else {
                    continue;
                };
                if candidate == self.seed {
                    continue;
                }
                if let Some(robots) = &self.worker.robots {
                    if !robots.is_allowed(&candidate, &self.worker.user_agent) {
                        tracing::debug!("Landing page {} disallowed by robots.txt", candidate);
                        continue;
                    }
                }
                match self.client.get(candidate.clone()).send().await {
                    Ok(response) if response.status().is_success() => {
                        tracing::debug!("Landing page {} found", candidate);
                        seeds.push(candidate);
                    }
                    Ok(response) => {
                        tracing::trace!("Landing page {} answered {}", candidate, response.status());
                    }
                    Err(e) => tracing::trace!("Landing page {} unreachable: {}", candidate, e),
                }
            }
        }

        let offered: Vec<String> = seeds
            .into_iter()
            .filter(|url| {
                let entry = forced(FrontierEntry::seed(url.clone()), self.force_render);
                self.state.offer(entry)
            })
            .map(|url| url.to_string())
            .collect();

        self.state.reset_idle_clock();
        offered
    }

    /// Returns the termination status if the crawl must stop now
    fn stop_condition(&self) -> Option<TerminationStatus> {
        if self.state.is_cancelled() {
            return Some(TerminationStatus::Cancelled);
        }
        if self.state.ceiling_reached() {
            return Some(TerminationStatus::Completed);
        }

        let max_errors = self.config.crawler.max_errors;
        if max_errors > 0 && self.state.errors() >= max_errors {
            return Some(TerminationStatus::ForcedStop {
                reason: format!("{} errors reached the error ceiling", self.state.errors()),
            });
        }

        if self.state.idle_for() >= self.idle_timeout() {
            return Some(self.idle_stop());
        }

        None
    }

    fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.config.crawler.idle_timeout_secs)
    }

    /// Time left before the idle watchdog trips
    fn idle_remaining(&self) -> Duration {
        self.idle_timeout().saturating_sub(self.state.idle_for())
    }

    fn idle_stop(&self) -> TerminationStatus {
        TerminationStatus::ForcedStop {
            reason: format!(
                "no page completed within {}s",
                self.config.crawler.idle_timeout_secs
            ),
        }
    }

    /// Sequential mode: one page at a time, polite delay between fetches
    async fn run_sequential(&mut self) -> TerminationStatus {
        loop {
            if let Some(status) = self.stop_condition() {
                return status;
            }

            let Some(entry) = self.state.next() else {
                return TerminationStatus::Completed;
            };

            let processing = self.worker.clone().process(entry);
            match tokio::time::timeout(self.idle_remaining(), processing).await {
                Ok(outcome) => self.handle_outcome(outcome),
                Err(_) => return self.idle_stop(),
            }

            if !self.delay.is_zero() && !self.state.frontier().is_empty() {
                let paused = Instant::now();
                tokio::time::sleep(self.delay).await;
                self.state.exclude_from_idle(paused.elapsed());
            }
        }
    }

    /// Concurrent mode: a bounded pool of in-flight pages
    async fn run_concurrent(&mut self) -> TerminationStatus {
        let concurrency = self.config.crawler.concurrency as usize;
        let mut in_flight: JoinSet<PageOutcome> = JoinSet::new();

        let status = loop {
            let stop = self.stop_condition();
            if stop.is_none() {
                while in_flight.len() < concurrency {
                    let Some(entry) = self.state.next() else {
                        break;
                    };
                    in_flight.spawn(self.worker.clone().process(entry));
                }
            }

            if let Some(status) = stop {
                break status;
            }
            if in_flight.is_empty() {
                break TerminationStatus::Completed;
            }

            match tokio::time::timeout(self.idle_remaining(), in_flight.join_next()).await {
                Ok(Some(Ok(outcome))) => self.handle_outcome(outcome),
                Ok(Some(Err(e))) => tracing::error!("Page worker failed: {}", e),
                Ok(None) => {}
                Err(_) => break self.idle_stop(),
            }
        };

        match status {
            TerminationStatus::ForcedStop { .. } => in_flight.abort_all(),
            _ => self.drain(&mut in_flight).await,
        }

        status
    }

    /// Waits for pages already in flight; new work is never started
    async fn drain(&mut self, in_flight: &mut JoinSet<PageOutcome>) {
        while !in_flight.is_empty() {
            match tokio::time::timeout(self.idle_remaining(), in_flight.join_next()).await {
                Ok(Some(Ok(outcome))) => self.handle_outcome(outcome),
                Ok(Some(Err(e))) => tracing::error!("Page worker failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!("Abandoning {} in-flight pages", in_flight.len());
                    in_flight.abort_all();
                    break;
                }
            }
        }
    }

    /// Counts, writes and follows the links of one finished page
    fn handle_outcome(&mut self, outcome: PageOutcome) {
        let PageOutcome {
            entry,
            record,
            links,
        } = outcome;

        // concurrent workers may finish after the ceiling was hit
        if record.is_success() && self.state.ceiling_reached() {
            tracing::debug!("Discarding {} beyond the page ceiling", record.url);
            return;
        }

        self.state.record(record.status);
        self.statistics.observe(&record);

        match self.output.record_page(&record) {
            Ok(Some(path)) => tracing::debug!("Wrote {}", path.display()),
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Failed to write record for {}: {}", record.url, e);
                self.write_errors.push(format!("{}: {}", record.url, e));
            }
        }

        if record.is_success() {
            let mut accepted = 0;
            for link in links {
                if !self.scope.contains(&link) {
                    tracing::trace!("Out of scope: {}", link);
                    continue;
                }
                let next = forced(FrontierEntry::discovered(link, entry.depth), self.force_render);
                if self.state.offer(next) {
                    accepted += 1;
                }
            }
            tracing::info!(
                "[{}/{}] {} (depth {}, {} new links{})",
                self.state.pages_completed(),
                self.config.crawler.max_pages,
                record.url,
                entry.depth,
                accepted,
                if record.rendered { ", rendered" } else { "" }
            );
        }

        self.emit(CrawlEvent::PageDone {
            url: record.url.clone(),
            status: record.status,
            depth: entry.depth,
            pages_completed: self.state.pages_completed(),
        });
        self.records.push(record);
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(events) = &self.events {
            // a host that stopped listening must not stop the crawl
            let _ = events.send(event);
        }
    }
}

fn forced(entry: FrontierEntry, force_render: bool) -> FrontierEntry {
    if force_render {
        entry.with_forced_render()
    } else {
        entry
    }
}

/// Runs a complete crawl with default collaborators
///
/// # Example
///
/// ```no_run
/// use docsweep::{crawl, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = crawl(Config::for_seed("https://docs.example.com/api/index.html")).await?;
/// println!("{} pages extracted", report.successes());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> crate::Result<CrawlReport> {
    crawl_with(config, CrawlOptions::default()).await
}

/// Runs a complete crawl with the given collaborators and hooks
pub async fn crawl_with(config: Config, options: CrawlOptions) -> crate::Result<CrawlReport> {
    Coordinator::new(config, options).await?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_string(format!("<html><body>{}</body></html>", body))
            .insert_header("content-type", "text/html")
    }

    fn test_config(server: &MockServer, dir: &TempDir) -> Config {
        let mut config = Config::for_seed(&format!("{}/docs/index.html", server.uri()));
        config.crawler.delay_ms = 0;
        config.crawler.probe_landing_pages = false;
        config.fetch.retries = 0;
        config.output.directory = dir.path().to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_termination_status_display() {
        assert_eq!(TerminationStatus::Completed.to_string(), "completed");
        assert_eq!(TerminationStatus::Cancelled.as_str(), "cancelled");
        let forced = TerminationStatus::ForcedStop {
            reason: "idle".to_string(),
        };
        assert_eq!(forced.as_str(), "forced-stop");
        assert_eq!(forced.to_string(), "forced-stop (idle)");
    }

    #[tokio::test]
    async fn test_invalid_seed_aborts_before_work() {
        let config = Config::for_seed("ftp://example.com/docs/");
        let result = crawl(config).await;
        assert!(matches!(result, Err(crate::SweepError::Config(_))));
    }

    #[tokio::test]
    async fn test_landing_pages_become_seeds() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html("<h1>Index</h1>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/classes.html"))
            .respond_with(html("<h1>Classes</h1>"))
            .mount(&server)
            .await;

        let mut config = test_config(&server, &dir);
        config.crawler.probe_landing_pages = true;

        let report = crawl(config).await.unwrap();
        let urls: Vec<&str> = report.records.iter().map(|r| r.url.as_str()).collect();

        assert_eq!(report.status, TerminationStatus::Completed);
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().any(|u| u.ends_with("/docs/classes.html")));
        assert!(report.records.iter().all(|r| r.depth == 0));
    }

    #[tokio::test]
    async fn test_disallowed_landing_pages_are_not_probed() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/classes.html"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html("<h1>Index</h1>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/classes.html"))
            .respond_with(html("<h1>Classes</h1>"))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config(&server, &dir);
        config.crawler.probe_landing_pages = true;

        let report = crawl(config).await.unwrap();

        assert_eq!(report.status, TerminationStatus::Completed);
        assert_eq!(report.records.len(), 1);
        assert!(report.records[0].url.ends_with("/docs/index.html"));
    }

    #[tokio::test]
    async fn test_huge_robots_crawl_delay_is_capped() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("User-agent: *\nCrawl-delay: 99999999999999999999\n"),
            )
            .mount(&server)
            .await;

        let coordinator = Coordinator::new(test_config(&server, &dir), CrawlOptions::default())
            .await
            .unwrap();

        assert_eq!(coordinator.delay, crate::robots::MAX_CRAWL_DELAY);
    }

    #[tokio::test]
    async fn test_robots_disallow_yields_skipped_record() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/private/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html(r#"<a href="private/a.html">A</a><a href="public.html">B</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/public.html"))
            .respond_with(html("<h1>Public</h1>"))
            .mount(&server)
            .await;

        let report = crawl(test_config(&server, &dir)).await.unwrap();

        let private = report
            .records
            .iter()
            .find(|r| r.url.ends_with("/docs/private/a.html"))
            .unwrap();
        assert_eq!(private.status, PageStatus::Skipped);
        assert_eq!(private.error.as_deref(), Some("disallowed by robots.txt"));
        assert_eq!(report.successes(), 2);
    }

    #[tokio::test]
    async fn test_error_ceiling_forces_stop() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        let links: String = (0..5)
            .map(|i| format!(r#"<a href="broken{}.html">x</a>"#, i))
            .collect();
        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html(&links))
            .mount(&server)
            .await;

        let mut config = test_config(&server, &dir);
        config.crawler.max_errors = 2;

        let report = crawl(config).await.unwrap();

        assert!(matches!(report.status, TerminationStatus::ForcedStop { .. }));
        assert_eq!(report.statistics.count(PageStatus::Error), 2);
        assert_eq!(report.successes(), 1);
    }

    #[tokio::test]
    async fn test_pdf_without_converter_is_error() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html(r#"<a href="manual.pdf">Manual</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/manual.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"%PDF-1.7".to_vec())
                    .insert_header("content-type", "application/pdf"),
            )
            .mount(&server)
            .await;

        let report = crawl(test_config(&server, &dir)).await.unwrap();
        let pdf = report
            .records
            .iter()
            .find(|r| r.url.ends_with("manual.pdf"))
            .unwrap();

        assert_eq!(pdf.status, PageStatus::Error);
        assert_eq!(pdf.error.as_deref(), Some("PDF text extraction failed"));
    }

    #[tokio::test]
    async fn test_pdf_with_converter() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html(r#"<a href="user_manual.pdf">Manual</a>"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/user_manual.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"%PDF-1.7".to_vec())
                    .insert_header("content-type", "application/pdf"),
            )
            .mount(&server)
            .await;

        let converter = |_: &[u8]| Some("Chapter one\n\n\n\nChapter two".to_string());
        let options = CrawlOptions::default().with_pdf_extractor(Arc::new(converter));
        let report = crawl_with(test_config(&server, &dir), options).await.unwrap();

        let pdf = report
            .records
            .iter()
            .find(|r| r.url.ends_with("user_manual.pdf"))
            .unwrap();
        assert_eq!(pdf.status, PageStatus::Success);
        assert_eq!(pdf.file_type, crate::record::FileType::Pdf);
        assert_eq!(pdf.title, "user manual");
        assert_eq!(pdf.text, "Chapter one\n\nChapter two");
        assert!(report
            .text_files
            .iter()
            .any(|p| p.to_string_lossy().contains("[PDF]_user manual")));
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/docs/index.html"))
            .respond_with(html("<h1>Index</h1>"))
            .mount(&server)
            .await;

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let options = CrawlOptions::default().with_events(tx);
        crawl_with(test_config(&server, &dir), options).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert!(matches!(events.first(), Some(CrawlEvent::Started { .. })));
        assert!(matches!(
            events.get(1),
            Some(CrawlEvent::PageDone {
                status: PageStatus::Success,
                pages_completed: 1,
                ..
            })
        ));
        assert!(matches!(
            events.last(),
            Some(CrawlEvent::Finished {
                status: TerminationStatus::Completed,
                ..
            })
        ));
    }
}
