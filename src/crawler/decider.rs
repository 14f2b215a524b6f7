//! Fetch/render decider
//!
//! Every frontier entry goes through this state machine:
//!
//! ```text
//! Initial ──static fetch──> classify ──> done
//!                              │
//!                              └─ needs render ─> RenderRetry ──> done
//!                                                     │
//!                                               render failed
//!                                                     │
//!                                                     v
//!                                               FallbackRetry ──> done | error
//! ```
//!
//! Only `Initial` results are ever classified for rendering, and only a
//! render attempt can lead to `FallbackRetry`, so a URL is fetched at most
//! three times and never re-enqueued.

use crate::crawler::fetcher::{fetch_with_retries, FetchedPage, RetryPolicy};
use crate::crawler::render::Renderer;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::{Arc, OnceLock};
use url::Url;

/// Which fetch of a URL is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attempt {
    /// First, static fetch
    Initial,
    /// First fetch goes straight to the renderer
    ForcedRender,
    /// Re-fetch with rendering after the static body looked client-rendered
    RenderRetry,
    /// Static re-fetch after the renderer failed; never escalates again
    FallbackRetry,
}

impl Attempt {
    /// Returns true if this attempt goes through the rendering backend
    pub fn uses_renderer(&self) -> bool {
        matches!(self, Self::ForcedRender | Self::RenderRetry)
    }

    /// Returns true if a static result of this attempt may escalate to rendering
    pub fn may_escalate(&self) -> bool {
        matches!(self, Self::Initial)
    }
}

/// Decides from a static HTML body whether the page needs a browser
pub trait RenderHeuristic: Send + Sync {
    fn needs_render(&self, html: &str) -> bool;
}

/// Default heuristic: known app-shell markers or an empty mount point
#[derive(Debug, Clone)]
pub struct MarkerHeuristic {
    markers: Vec<String>,
}

impl MarkerHeuristic {
    /// Creates a heuristic matching the given markers (case-insensitive)
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(|m| m.into().to_lowercase()).collect(),
        }
    }
}

impl Default for MarkerHeuristic {
    fn default() -> Self {
        Self::new([
            "__next_data__",
            "id=\"__next\"",
            "data-reactroot",
            "id=\"root\"",
            "ng-version",
            "data-v-app",
            "id=\"___gatsby\"",
        ])
    }
}

fn empty_mount_point() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<div\s+id=["'](?:root|app|__next|___gatsby)["']\s*>\s*</div>"#)
            .expect("Failed to compile mount point regex")
    })
}

impl RenderHeuristic for MarkerHeuristic {
    fn needs_render(&self, html: &str) -> bool {
        let lowered = html.to_lowercase();
        self.markers.iter().any(|m| lowered.contains(m.as_str()))
            || empty_mount_point().is_match(html)
    }
}

/// Content obtained for one URL
#[derive(Debug, Clone)]
pub enum Fetched {
    Html {
        final_url: Url,
        status: u16,
        html: String,
        rendered: bool,
        /// Raw computed-style background URLs (rendered pages only)
        css_backgrounds: Vec<String>,
    },
    Pdf {
        final_url: Url,
        status: u16,
        bytes: Vec<u8>,
    },
}

/// Outcome of the decider for one URL
#[derive(Debug, Clone)]
pub enum Decision {
    Page(Fetched),
    /// Not a document; terminal but not an error
    Skipped { status: u16, reason: String },
    Failed { status: Option<u16>, cause: String },
}

/// Runs the fetch/render state machine for single URLs
#[derive(Clone)]
pub struct Decider {
    client: Client,
    retry: RetryPolicy,
    renderer: Option<Arc<dyn Renderer>>,
    heuristic: Arc<dyn RenderHeuristic>,
    auth_profile: Option<String>,
    collect_backgrounds: bool,
}

impl Decider {
    pub fn new(
        client: Client,
        retry: RetryPolicy,
        renderer: Option<Arc<dyn Renderer>>,
        heuristic: Arc<dyn RenderHeuristic>,
        auth_profile: Option<String>,
        collect_backgrounds: bool,
    ) -> Self {
        Self {
            client,
            retry,
            renderer,
            heuristic,
            auth_profile,
            collect_backgrounds,
        }
    }

    /// Fetches `url`, starting at `start`, until a terminal decision
    pub async fn decide(&self, url: &Url, start: Attempt) -> Decision {
        let mut attempt = start;
        let mut static_status = None;
        let mut render_failure: Option<String> = None;

        loop {
            if attempt.uses_renderer() {
                let Some(renderer) = &self.renderer else {
                    // forced render with no backend configured
                    attempt = Attempt::Initial;
                    continue;
                };

                match renderer
                    .render(url, self.auth_profile.as_deref(), self.collect_backgrounds)
                    .await
                {
                    Ok(page) => {
                        return Decision::Page(Fetched::Html {
                            final_url: page.final_url,
                            status: static_status.unwrap_or(200),
                            html: page.html,
                            rendered: true,
                            css_backgrounds: page.css_backgrounds,
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Render of {} failed ({}), retrying without rendering", url, e);
                        render_failure = Some(e.to_string());
                        attempt = Attempt::FallbackRetry;
                        continue;
                    }
                }
            }

            let page = match fetch_with_retries(&self.client, url, &self.retry).await {
                Ok(page) => page,
                Err(e) => {
                    let cause = match &render_failure {
                        Some(render) => format!("render failed: {}; fallback failed: {}", render, e),
                        None => e.to_string(),
                    };
                    return Decision::Failed {
                        status: e.status(),
                        cause,
                    };
                }
            };

            match self.classify(page, attempt) {
                Classified::Done(decision) => return decision,
                Classified::NeedsRender(status) => {
                    static_status = Some(status);
                    attempt = Attempt::RenderRetry;
                }
            }
        }
    }

    fn classify(&self, page: FetchedPage, attempt: Attempt) -> Classified {
        if page.is_pdf() {
            return Classified::Done(Decision::Page(Fetched::Pdf {
                final_url: page.final_url,
                status: page.status,
                bytes: page.body,
            }));
        }

        if !page.is_document() {
            return Classified::Done(Decision::Skipped {
                status: page.status,
                reason: format!("non-document content type '{}'", page.content_type),
            });
        }

        let html = page.text();
        if attempt.may_escalate() && self.heuristic.needs_render(&html) {
            if self.renderer.is_some() {
                tracing::debug!(
                    "{} looks client-rendered ({} chars of static text), re-fetching with renderer",
                    page.final_url,
                    visible_text_len(&html)
                );
                return Classified::NeedsRender(page.status);
            }
            tracing::debug!(
                "{} looks client-rendered but rendering is disabled",
                page.final_url
            );
        }

        Classified::Done(Decision::Page(Fetched::Html {
            final_url: page.final_url,
            status: page.status,
            html,
            rendered: false,
            css_backgrounds: Vec::new(),
        }))
    }
}

enum Classified {
    Done(Decision),
    NeedsRender(u16),
}

/// Returns the length of the non-blank text nodes under `<body>`
pub fn visible_text_len(html: &str) -> usize {
    let document = Html::parse_document(html);
    let Ok(body) = Selector::parse("body") else {
        return 0;
    };
    document
        .select(&body)
        .next()
        .map(|b| {
            b.text()
                .filter(|t| !t.trim().is_empty())
                .map(|t| t.trim().len())
                .sum()
        })
        .unwrap_or(0)
}
