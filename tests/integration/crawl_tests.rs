//! Integration tests for the crawler
//!
//! These tests use wiremock to serve small documentation sites and run
//! full crawls end-to-end against them.

use async_trait::async_trait;
use docsweep::config::{Config, CrawlMode};
use docsweep::crawler::{
    crawl_with, CrawlEvent, CrawlOptions, RenderError, RenderedPage, Renderer, TerminationStatus,
};
use docsweep::{crawl, PageRecord, PageStatus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renderer double that counts calls and can be told to crash
struct MockRenderer {
    calls: AtomicUsize,
    crash: bool,
}

impl MockRenderer {
    fn new(crash: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            crash,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(
        &self,
        url: &Url,
        _auth_profile: Option<&str>,
        _collect_backgrounds: bool,
    ) -> Result<RenderedPage, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.crash {
            return Err(RenderError::Navigation("browser crashed".to_string()));
        }
        Ok(RenderedPage {
            final_url: url.clone(),
            html: r#"<html><body><div id="root"><h1>Rendered API</h1>
                <p>Content produced by scripts.</p></div></body></html>"#
                .to_string(),
            css_backgrounds: Vec::new(),
        })
    }
}

/// Mounts an HTML page at `route`
async fn page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(format!("<html><body>{}</body></html>", body)),
        )
        .mount(server)
        .await;
}

/// Creates a test configuration rooted at `/docs/index.html` of the server
fn create_test_config(server: &MockServer, output: &TempDir) -> Config {
    let mut config = Config::for_seed(&format!("{}/docs/index.html", server.uri()));
    config.crawler.delay_ms = 0;
    config.crawler.probe_landing_pages = false;
    config.fetch.retries = 0;
    config.output.directory = output.path().to_string_lossy().into_owned();
    config
}

fn read_shards(output: &TempDir) -> Vec<PageRecord> {
    let mut shards: Vec<_> = std::fs::read_dir(output.path().join("json"))
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    shards.sort();

    shards
        .iter()
        .flat_map(|path| {
            std::fs::read_to_string(path)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str::<PageRecord>(line).unwrap())
                .collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test]
async fn test_page_ceiling_and_depth() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(
        &server,
        "/docs/index.html",
        r#"<h1>Index</h1>
        <a href="a.html">A</a>
        <a href="b.html">B</a>
        <a href="c.html">C</a>
        <a href="https://other.org/docs/x.html">External</a>"#,
    )
    .await;
    for name in ["a", "b", "c"] {
        page(
            &server,
            &format!("/docs/{}.html", name),
            &format!(r#"<h1>Page {}</h1><a href="deeper/{}.html">deeper</a>"#, name, name),
        )
        .await;
    }

    let mut config = create_test_config(&server, &output);
    config.crawler.max_pages = 3;
    config.crawler.max_depth = 1;

    let report = crawl(config).await.unwrap();

    assert_eq!(report.status, TerminationStatus::Completed);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.successes(), 3);
    for record in &report.records {
        assert!(record.depth <= 1);
        assert!(record.out_links.iter().all(|l| !l.contains("other.org")));
        assert!(record.out_links.iter().all(|l| l.starts_with(&server.uri())));
    }

    // the JSONL output matches what the report says
    let written = read_shards(&output);
    assert_eq!(written.len(), 3);
    assert_eq!(report.text_files.len(), 3);
    assert!(output.path().join("crawl_summary.md").exists());
}

#[tokio::test]
async fn test_depth_limit_stops_link_following() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(&server, "/docs/index.html", r#"<a href="one.html">1</a>"#).await;
    page(&server, "/docs/one.html", r#"<a href="two.html">2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/docs/two.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>never</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, &output);
    config.crawler.max_depth = 1;

    let report = crawl(config).await.unwrap();
    let depths: Vec<u32> = report.records.iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![0, 1]);
}

#[tokio::test]
async fn test_client_rendered_page_is_rendered_once() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(
        &server,
        "/docs/index.html",
        r#"<div id="root"></div><script src="bundle.js"></script>"#,
    )
    .await;

    let mut config = create_test_config(&server, &output);
    config.render.enabled = true;

    let renderer = MockRenderer::new(false);
    let options = CrawlOptions::default().with_renderer(renderer.clone());
    let report = crawl_with(config, options).await.unwrap();

    assert_eq!(renderer.calls(), 1);
    assert_eq!(report.records.len(), 1);

    let record = &report.records[0];
    assert_eq!(record.status, PageStatus::Success);
    assert!(record.rendered);
    assert_eq!(record.title, "Rendered API");
    assert!(record.text.contains("Content produced by scripts."));
}

#[tokio::test]
async fn test_render_crash_falls_back_to_static_fetch() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/docs/index.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(
                    r#"<html><body><h1>Shell</h1><div id="root"></div></body></html>"#,
                ),
        )
        // initial static fetch plus exactly one fallback
        .expect(2)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, &output);
    config.render.enabled = true;

    let renderer = MockRenderer::new(true);
    let options = CrawlOptions::default().with_renderer(renderer.clone());
    let report = crawl_with(config, options).await.unwrap();

    assert_eq!(renderer.calls(), 1);
    let record = &report.records[0];
    assert_eq!(record.status, PageStatus::Success);
    assert!(!record.rendered);
    assert!(record.error.is_none());
    assert_eq!(record.title, "Shell");
}

#[tokio::test]
async fn test_rendering_disabled_keeps_static_result() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(&server, "/docs/index.html", r#"<h1>Shell</h1><div id="root"></div>"#).await;

    let renderer = MockRenderer::new(false);
    let options = CrawlOptions::default().with_renderer(renderer.clone());
    let report = crawl_with(create_test_config(&server, &output), options)
        .await
        .unwrap();

    assert_eq!(renderer.calls(), 0);
    assert!(!report.records[0].rendered);
}

#[tokio::test]
async fn test_no_url_recorded_twice() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(
        &server,
        "/docs/index.html",
        r#"<a href="a.html">A</a>
        <a href="a.html#section">A again</a>
        <a href="a.html?utm_source=nav">A tracked</a>
        <a href="b.html?y=2&x=1">B</a>"#,
    )
    .await;
    page(
        &server,
        "/docs/a.html",
        r#"<a href="index.html">Home</a><a href="b.html?x=1&y=2&gclid=abc">B</a>"#,
    )
    .await;
    page(&server, "/docs/b.html", r#"<a href="a.html">A</a><a href="./index.html">Home</a>"#).await;

    for mode in [CrawlMode::Sequential, CrawlMode::Concurrent] {
        let output = TempDir::new().unwrap();
        let mut config = create_test_config(&server, &output);
        config.crawler.mode = mode;
        config.crawler.concurrency = 4;

        let report = crawl(config).await.unwrap();

        let urls: Vec<&str> = report.records.iter().map(|r| r.url.as_str()).collect();
        let unique: HashSet<&str> = urls.iter().copied().collect();
        assert_eq!(urls.len(), unique.len(), "duplicate records in {:?}", mode);
        assert_eq!(urls.len(), 3);
        assert!(unique.contains(format!("{}/docs/b.html?x=1&y=2", server.uri()).as_str()));
    }

    drop(output);
}

#[tokio::test]
async fn test_concurrent_mode_respects_page_ceiling() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (0..20)
        .map(|i| format!(r#"<a href="p{}.html">{}</a>"#, i, i))
        .collect();
    page(&server, "/docs/index.html", &links).await;
    for i in 0..20 {
        page(&server, &format!("/docs/p{}.html", i), "<h1>Leaf</h1>").await;
    }

    let mut config = create_test_config(&server, &output);
    config.crawler.mode = CrawlMode::Concurrent;
    config.crawler.concurrency = 8;
    config.crawler.max_pages = 5;

    let report = crawl(config).await.unwrap();

    assert_eq!(report.status, TerminationStatus::Completed);
    assert!(report.successes() <= 5);
    assert_eq!(read_shards(&output).iter().filter(|r| r.is_success()).count(), report.successes());
}

#[tokio::test]
async fn test_shards_rotate_at_limit() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (0..6)
        .map(|i| format!(r#"<a href="p{}.html">{}</a>"#, i, i))
        .collect();
    page(&server, "/docs/index.html", &links).await;
    let filler = "Lorem ipsum dolor sit amet. ".repeat(20);
    for i in 0..6 {
        page(
            &server,
            &format!("/docs/p{}.html", i),
            &format!("<h1>Page {}</h1><p>{}</p>", i, filler),
        )
        .await;
    }

    let mut config = create_test_config(&server, &output);
    config.output.shard_limit = 1024;

    let report = crawl(config).await.unwrap();

    assert!(report.shard_files.len() > 1);
    for shard in &report.shard_files {
        let content = std::fs::read_to_string(shard).unwrap();
        let lines = content.lines().count();
        assert!(content.chars().count() <= 1024 || lines == 1);
    }
    assert_eq!(read_shards(&output).len(), 7);
}

#[tokio::test]
async fn test_cancellation_returns_partial_results() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (0..5)
        .map(|i| format!(r#"<a href="p{}.html">{}</a>"#, i, i))
        .collect();
    page(&server, "/docs/index.html", &links).await;
    for i in 0..5 {
        page(&server, &format!("/docs/p{}.html", i), "<h1>Leaf</h1>").await;
    }

    let mut config = create_test_config(&server, &output);
    config.crawler.delay_ms = 300;

    let cancel = docsweep::CancelFlag::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let host_cancel = cancel.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if matches!(event, CrawlEvent::PageDone { .. }) {
                host_cancel.cancel();
            }
        }
    });

    let options = CrawlOptions::default().with_cancel(cancel).with_events(tx);
    let report = crawl_with(config, options).await.unwrap();

    assert_eq!(report.status, TerminationStatus::Cancelled);
    assert_eq!(report.records.len(), 1);
    assert_eq!(read_shards(&output).len(), 1);
}

#[tokio::test]
async fn test_title_from_file_name() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(&server, "/docs/index.html", r#"<a href="foo_bar.html">next</a>"#).await;
    page(&server, "/docs/foo_bar.html", "<p>No headings on this page.</p>").await;

    let report = crawl(create_test_config(&server, &output)).await.unwrap();

    let record = report
        .records
        .iter()
        .find(|r| r.url.ends_with("foo_bar.html"))
        .unwrap();
    assert_eq!(record.title, "foo bar");
    assert!(report
        .text_files
        .iter()
        .any(|p| p.file_name().unwrap().to_string_lossy().starts_with("002_foo bar_")));
}

#[tokio::test]
async fn test_failed_fetch_becomes_error_record() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(&server, "/docs/index.html", r#"<a href="gone.html">gone</a>"#).await;

    let report = crawl(create_test_config(&server, &output)).await.unwrap();

    let gone = report
        .records
        .iter()
        .find(|r| r.url.ends_with("gone.html"))
        .unwrap();
    assert_eq!(gone.status, PageStatus::Error);
    assert_eq!(gone.http_status, Some(404));
    assert!(gone.error.is_some());
    assert_eq!(report.status, TerminationStatus::Completed);
    // error pages get no text file
    assert_eq!(report.text_files.len(), 1);
}

#[tokio::test]
async fn test_stalled_page_trips_idle_watchdog() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(&server, "/docs/index.html", r#"<h1>Index</h1><a href="slow.html">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/docs/slow.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body><h1>Slow</h1></body></html>")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, &output);
    config.crawler.idle_timeout_secs = 1;

    let started = std::time::Instant::now();
    let report = crawl(config).await.unwrap();

    assert!(matches!(report.status, TerminationStatus::ForcedStop { .. }));
    assert!(started.elapsed() < Duration::from_secs(8));
    assert_eq!(report.successes(), 1);
    assert!(report.records[0].url.ends_with("/docs/index.html"));

    let written = read_shards(&output);
    assert_eq!(written.len(), 1);
    assert!(written[0].url.ends_with("/docs/index.html"));
}

#[tokio::test]
async fn test_polite_delay_does_not_count_as_idle() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    page(
        &server,
        "/docs/index.html",
        r#"<h1>Index</h1><a href="a.html">A</a><a href="b.html">B</a>"#,
    )
    .await;
    page(&server, "/docs/a.html", "<h1>A</h1>").await;
    page(&server, "/docs/b.html", "<h1>B</h1>").await;

    let mut config = create_test_config(&server, &output);
    config.crawler.delay_ms = 1500;
    config.crawler.idle_timeout_secs = 1;

    let report = crawl(config).await.unwrap();

    assert_eq!(report.status, TerminationStatus::Completed);
    assert_eq!(report.successes(), 3);
}
