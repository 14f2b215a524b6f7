//! Link and asset extraction
//!
//! Links are canonicalized with tracking parameters stripped; asset URLs
//! keep their query strings since image servers often need them.

use crate::record::{Asset, AssetKind};
use crate::url::{normalize, CrawlScope};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

fn css_url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"]*))\s*\)"#)
            .expect("Failed to compile css url regex")
    })
}

/// Extracts the outbound links of a page
///
/// # Link Extraction Rules
///
/// - Every `<a href>` is canonicalized against `base`
/// - Fragment-only links (`#section`) are dropped
/// - Links outside the scope's allowed domains are dropped
/// - Duplicates are removed, keeping first-seen order
pub fn extract_links(document: &Html, base: &Url, scope: &CrawlScope) -> Vec<Url> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !href.trim_start().starts_with('#'))
        .filter_map(|href| normalize(base, href, true))
        .filter(|url| scope.allows_domain(url))
        .filter(|url| seen.insert(url.as_str().to_string()))
        .collect()
}

/// Extracts `<img>` sources with their alt text
///
/// When `src` is absent the last `srcset` candidate is used, which is
/// usually the highest resolution.
pub fn extract_images(document: &Html, base: &Url) -> Vec<Asset> {
    let Ok(images) = Selector::parse("img") else {
        return Vec::new();
    };

    document
        .select(&images)
        .filter_map(|img| {
            let el = img.value();
            let src = el
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .or_else(|| el.attr("srcset").and_then(last_srcset_candidate))?;

            let resolved = resolve_asset(base, &src)?;
            Some(Asset {
                kind: AssetKind::Image,
                src: resolved,
                alt: el
                    .attr("alt")
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
                local_path: None,
            })
        })
        .collect()
}

fn last_srcset_candidate(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .last()
        .map(str::to_string)
}

/// Extracts background images from `style` attributes and `<style>` blocks
pub fn extract_css_backgrounds(document: &Html, base: &Url) -> Vec<Asset> {
    let mut raw = Vec::new();

    if let Ok(styled) = Selector::parse("[style]") {
        for el in document.select(&styled) {
            if let Some(style) = el.value().attr("style") {
                raw.extend(css_urls(style));
            }
        }
    }

    if let Ok(blocks) = Selector::parse("style") {
        for block in document.select(&blocks) {
            raw.extend(css_urls(&block.text().collect::<String>()));
        }
    }

    backgrounds_from(&raw, base)
}

/// Turns raw `url(...)` targets (e.g. from computed styles) into assets
pub fn backgrounds_from(raw: &[String], base: &Url) -> Vec<Asset> {
    raw.iter()
        .filter_map(|src| resolve_asset(base, src))
        .map(|src| Asset {
            kind: AssetKind::CssBackground,
            src,
            alt: None,
            local_path: None,
        })
        .collect()
}

/// Returns every `url(...)` target in a CSS fragment, skipping data URIs
pub fn css_urls(css: &str) -> Vec<String> {
    css_url_pattern()
        .captures_iter(css)
        .filter_map(|caps| caps.get(1).or(caps.get(2)).or(caps.get(3)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|u| !u.is_empty() && !u.to_ascii_lowercase().starts_with("data:"))
        .collect()
}

fn resolve_asset(base: &Url, src: &str) -> Option<String> {
    if src.trim().to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    normalize(base, src, false).map(|u| u.to_string())
}

/// Merges asset lists, keeping the first entry for each resolved source
pub fn merge_assets<I>(lists: I) -> Vec<Asset>
where
    I: IntoIterator<Item = Vec<Asset>>,
{
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|asset| seen.insert(asset.src.clone()))
        .collect()
}
