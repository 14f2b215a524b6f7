//! Robots.txt rules, matched with the robotstxt crate

use robotstxt::DefaultMatcher;
use std::time::Duration;
use url::Url;

/// Upper bound applied to any `Crawl-delay` value
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Parsed robots.txt data
///
/// Keeps the raw body; the `robotstxt` matcher parses it on each check.
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty means allow all)
    content: String,
}

impl ParsedRobots {
    /// Creates rules from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Creates permissive rules that allow everything
    ///
    /// Used whenever robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &Url, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, product_token(user_agent), url.as_str())
    }

    /// Gets the `Crawl-delay` that applies to the given user agent
    ///
    /// A group naming the agent wins over the `*` group. Negative or NaN
    /// values are ignored; anything larger than [`MAX_CRAWL_DELAY`] is capped.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let agent = product_token(user_agent).to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut for_agent = None;
        let mut for_wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    // consecutive user-agent lines share one group
                    if !group_open {
                        group.clear();
                        group_open = true;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_open = false;
                    let Ok(secs) = value.parse::<f64>() else {
                        continue;
                    };
                    if secs.is_nan() {
                        continue;
                    }
                    let capped = secs.min(MAX_CRAWL_DELAY.as_secs_f64());
                    let Ok(delay) = Duration::try_from_secs_f64(capped) else {
                        continue;
                    };
                    if group.iter().any(|ua| *ua == agent) {
                        for_agent = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard = Some(delay);
                    }
                }
                _ => group_open = false,
            }
        }

        for_agent.or(for_wildcard)
    }
}

/// Reduces a full user-agent header to its product token
///
/// `docsweep/1.0 (+https://...)` matches robots groups named `docsweep`.
fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(user_agent)
}
