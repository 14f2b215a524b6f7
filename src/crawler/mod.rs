//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier and its dedup tracker
//! - HTTP fetching with retry logic
//! - The fetch/render decision and the rendering backend
//! - The per-page pipeline and overall crawl coordination

mod assets;
mod coordinator;
mod decider;
mod fetcher;
mod frontier;
mod pdf;
mod render;
mod worker;

pub use assets::{asset_path, AssetStore, DiskAssetStore, NullAssetStore};
pub use coordinator::{
    crawl, crawl_with, Coordinator, CrawlEvent, CrawlOptions, CrawlReport, TerminationStatus,
};
pub use decider::{visible_text_len, Attempt, Decider, Decision, Fetched, MarkerHeuristic, RenderHeuristic};
pub use fetcher::{
    build_http_client, fetch_once, fetch_with_retries, FetchError, FetchedPage, RetryPolicy,
};
pub use frontier::{DrawOrder, Frontier, FrontierEntry, Priority};
pub use pdf::{NoPdfConverter, PdfTextExtractor};
pub use render::{ChromiumRenderer, RenderError, RenderedPage, Renderer};
pub use worker::{PageOutcome, PageWorker};
