//! Rendering backend
//!
//! Pages judged client-rendered are re-fetched through headless Chromium
//! (over CDP, via `chromiumoxide`). The `Renderer` trait is the seam the
//! decider talks to, so crawls can run against any backend.

use crate::config::RenderConfig;
use crate::url::extract_domain;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinHandle;
use url::Url;

/// Context key used when the crawl carries no auth profile
const ANONYMOUS_PROFILE: &str = "anonymous";

/// Computed-style background pass, run inside the rendered page
///
/// Samples the 400 largest container elements (area above 50x50 px) and
/// returns every `url(...)` their computed `background-image` resolves to.
const CSS_BACKGROUND_PROBE: &str = r#"(() => {
  const nodes = Array.from(document.querySelectorAll('div,section,a,span,main,header'));
  const sized = nodes
    .map((el) => { const r = el.getBoundingClientRect(); return [el, Math.max(0, r.width) * Math.max(0, r.height)]; })
    .filter(([, area]) => area > 2500)
    .sort((a, b) => b[1] - a[1])
    .slice(0, 400);
  const out = new Set();
  for (const [el] of sized) {
    const bg = getComputedStyle(el).backgroundImage;
    if (!bg || bg === 'none') continue;
    const re = /url\(\s*(['"]?)(.*?)\1\s*\)/g;
    let m;
    while ((m = re.exec(bg)) !== null) {
      if (m[2] && !m[2].startsWith('data:')) out.add(m[2].trim());
    }
  }
  return Array.from(out);
})()"#;

/// Rendering backend failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to open browser session: {0}")]
    Session(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {0:?}")]
    Timeout(Duration),

    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    #[error("renderer is shut down")]
    Closed,
}

/// DOM snapshot of a page after its scripts ran
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL the browser ended up on
    pub final_url: Url,

    /// Serialized DOM
    pub html: String,

    /// Raw `url(...)` targets from the computed-style pass; unresolved
    pub css_backgrounds: Vec<String>,
}

/// A backend able to execute page scripts and return the resulting DOM
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders one page
    ///
    /// # Arguments
    ///
    /// * `url` - Page to load
    /// * `auth_profile` - Named session profile; pages with the same
    ///   (domain, profile) share one browser context
    /// * `collect_backgrounds` - Run the computed-style background pass
    async fn render(
        &self,
        url: &Url,
        auth_profile: Option<&str>,
        collect_backgrounds: bool,
    ) -> Result<RenderedPage, RenderError>;

    /// Releases every backend resource; later renders fail with `Closed`
    async fn shutdown(&self) {}
}

/// Headless Chromium renderer
///
/// Concurrent renders are bounded by `max-sessions`. Browser contexts are
/// cached per (domain, auth profile) so session cookies survive between
/// pages of the same site.
pub struct ChromiumRenderer {
    browser: Mutex<Option<Browser>>,
    contexts: Mutex<HashMap<(String, String), BrowserContextId>>,
    sessions: Semaphore,
    navigation_timeout: Duration,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Launches a headless browser for the crawl
    pub async fn launch(config: &RenderConfig, user_agent: &str) -> Result<Self, RenderError> {
        let navigation_timeout = Duration::from_secs(config.navigation_timeout_secs);

        let browser_config = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(navigation_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", user_agent))
            .build()
            .map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(
            "Launched headless browser ({} sessions max)",
            config.max_sessions
        );

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            contexts: Mutex::new(HashMap::new()),
            sessions: Semaphore::new(config.max_sessions as usize),
            navigation_timeout,
            handler,
        })
    }

    /// Returns the browser context for (domain, profile), creating it once
    async fn context_for(&self, url: &Url, profile: &str) -> Result<BrowserContextId, RenderError> {
        let key = (extract_domain(url).unwrap_or_default(), profile.to_string());

        let mut contexts = self.contexts.lock().await;
        if let Some(id) = contexts.get(&key) {
            return Ok(id.clone());
        }

        let mut browser = self.browser.lock().await;
        let browser = browser.as_mut().ok_or(RenderError::Closed)?;
        let id = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .map_err(|e| RenderError::Session(e.to_string()))?;

        tracing::debug!("Created browser context {}:{}", key.0, key.1);
        contexts.insert(key, id.clone());
        Ok(id)
    }

    async fn open_page(&self, context: BrowserContextId) -> Result<Page, RenderError> {
        let params = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context)
            .build()
            .map_err(RenderError::Session)?;

        let browser = self.browser.lock().await;
        let browser = browser.as_ref().ok_or(RenderError::Closed)?;
        browser
            .new_page(params)
            .await
            .map_err(|e| RenderError::Session(e.to_string()))
    }
}

/// Navigates and snapshots an already open page
async fn drive(
    page: &Page,
    url: &Url,
    collect_backgrounds: bool,
) -> Result<RenderedPage, RenderError> {
    page.goto(url.as_str())
        .await
        .map_err(|e| RenderError::Navigation(e.to_string()))?;

    let html = page
        .content()
        .await
        .map_err(|e| RenderError::Evaluation(e.to_string()))?;

    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .and_then(|u| Url::parse(&u).ok())
        .unwrap_or_else(|| url.clone());

    let css_backgrounds = if collect_backgrounds {
        match page.evaluate(CSS_BACKGROUND_PROBE).await {
            Ok(result) => result.into_value::<Vec<String>>().unwrap_or_default(),
            Err(e) => {
                // the DOM snapshot is still usable without backgrounds
                tracing::warn!("Background probe failed on {}: {}", url, e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    Ok(RenderedPage {
        final_url,
        html,
        css_backgrounds,
    })
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn render(
        &self,
        url: &Url,
        auth_profile: Option<&str>,
        collect_backgrounds: bool,
    ) -> Result<RenderedPage, RenderError> {
        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|_| RenderError::Closed)?;

        let context = self
            .context_for(url, auth_profile.unwrap_or(ANONYMOUS_PROFILE))
            .await?;
        let page = self.open_page(context).await?;

        let result = tokio::time::timeout(
            self.navigation_timeout,
            drive(&page, url, collect_backgrounds),
        )
        .await
        .unwrap_or(Err(RenderError::Timeout(self.navigation_timeout)));

        // released on success and failure alike
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page for {}: {}", url, e);
        }

        result
    }

    async fn shutdown(&self) {
        self.sessions.close();
        self.contexts.lock().await.clear();

        if let Some(mut browser) = self.browser.lock().await.take() {
            if let Err(e) = browser.close().await {
                tracing::debug!("Browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        self.handler.abort();
        tracing::info!("Headless browser shut down");
    }
}
