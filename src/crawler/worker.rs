//! Per-page pipeline: robots check, fetch/render decision, extraction and
//! asset storage
//!
//! A worker never touches the frontier or the page counter. It turns one
//! frontier entry into a `PageRecord` plus the links it found and hands
//! both back to the coordinator.

use crate::crawler::assets::AssetStore;
use crate::crawler::decider::{Decider, Decision, Fetched};
use crate::crawler::frontier::FrontierEntry;
use crate::crawler::pdf::PdfTextExtractor;
use crate::extract::{extract_page, normalize_text, title_from_url, ExtractOptions};
use crate::record::{FileType, PageRecord};
use crate::robots::ParsedRobots;
use crate::url::CrawlScope;
use std::sync::Arc;
use url::Url;

/// Result of processing one frontier entry
#[derive(Debug)]
pub struct PageOutcome {
    pub entry: FrontierEntry,
    pub record: PageRecord,
    /// Canonical links found on the page, not yet scope-filtered
    pub links: Vec<Url>,
}

/// Everything a worker needs, cheap to clone into spawned tasks
#[derive(Clone)]
pub struct PageWorker {
    pub(crate) decider: Decider,
    pub(crate) scope: Arc<CrawlScope>,
    pub(crate) robots: Option<Arc<ParsedRobots>>,
    pub(crate) user_agent: String,
    pub(crate) pdf: Arc<dyn PdfTextExtractor>,
    pub(crate) assets: Arc<dyn AssetStore>,
    pub(crate) boilerplate_titles: Arc<Vec<String>>,
    pub(crate) css_backgrounds: bool,
    pub(crate) auth_profile: Option<String>,
}

impl PageWorker {
    /// Processes one entry to a terminal record
    pub async fn process(self, entry: FrontierEntry) -> PageOutcome {
        let url = entry.url.clone();
        let depth = entry.depth;
        let profile = self.auth_profile.clone();

        if let Some(robots) = &self.robots {
            if !robots.is_allowed(&url, &self.user_agent) {
                tracing::info!("URL {} disallowed by robots.txt", url);
                let record = PageRecord::skipped(&url, depth, profile, "disallowed by robots.txt");
                return PageOutcome {
                    entry,
                    record,
                    links: Vec::new(),
                };
            }
        }

        let (record, links) = match self.decider.decide(&url, entry.attempt).await {
            Decision::Failed { status, cause } => {
                tracing::error!("Failed {}: {}", url, cause);
                let mut record = PageRecord::error(&url, depth, profile, cause);
                record.http_status = status;
                (record, Vec::new())
            }
            Decision::Skipped { status, reason } => {
                tracing::debug!("Skipped {}: {}", url, reason);
                let mut record = PageRecord::skipped(&url, depth, profile, reason);
                record.http_status = Some(status);
                (record, Vec::new())
            }
            Decision::Page(Fetched::Pdf {
                final_url,
                status,
                bytes,
            }) => (self.pdf_record(&url, depth, final_url, status, &bytes), Vec::new()),
            Decision::Page(Fetched::Html {
                final_url,
                status,
                html,
                rendered,
                css_backgrounds,
            }) => {
                let mut record = PageRecord::new(&url, depth, profile);
                record.http_status = Some(status);
                record.rendered = rendered;

                let extraction = extract_page(
                    &html,
                    &final_url,
                    &css_backgrounds,
                    &self.scope,
                    ExtractOptions {
                        boilerplate_titles: &self.boilerplate_titles,
                        css_backgrounds: self.css_backgrounds,
                    },
                );
                record.final_url = final_url.to_string();
                record.title = extraction.content.title;
                record.headings = extraction.content.headings;
                record.code_blocks = extraction.content.code_blocks;
                record.text = extraction.content.text;
                record.assets = extraction.assets;
                record.out_links = extraction.links.iter().map(|l| l.to_string()).collect();

                self.store_assets(&mut record).await;
                (record, extraction.links)
            }
        };

        PageOutcome {
            entry,
            record,
            links,
        }
    }

    fn pdf_record(
        &self,
        url: &Url,
        depth: u32,
        final_url: Url,
        status: u16,
        bytes: &[u8],
    ) -> PageRecord {
        let profile = self.auth_profile.clone();
        let mut record = match self.pdf.extract_text(bytes) {
            Some(text) => {
                let mut record = PageRecord::new(url, depth, profile);
                record.title = title_from_url(url);
                record.text = normalize_text(&text);
                record
            }
            None => {
                tracing::error!("Failed {}: PDF text extraction failed", url);
                PageRecord::error(url, depth, profile, "PDF text extraction failed")
            }
        };
        record.file_type = FileType::Pdf;
        record.final_url = final_url.to_string();
        record.http_status = Some(status);
        record
    }

    async fn store_assets(&self, record: &mut PageRecord) {
        for asset in record.assets.iter_mut() {
            asset.local_path = self.assets.store(&asset.src, &record.page_key).await;
        }
    }
}
