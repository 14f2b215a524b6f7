//! Extraction module
//!
//! Turns a fetched (or rendered) HTML document into the content, links and
//! assets of a `PageRecord`. Parsing happens synchronously so the `scraper`
//! DOM never lives across an await point.

mod content;
mod links;

pub use content::{body_text, extract_content, main_region, normalize_text, title_from_url, Content};
pub use links::{
    backgrounds_from, css_urls, extract_css_backgrounds, extract_images, extract_links,
    merge_assets,
};

use crate::record::Asset;
use crate::url::CrawlScope;
use scraper::{Html, Selector};
use url::Url;

/// Everything extracted from one HTML document
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub content: Content,
    /// Canonical links within the allowed domains, first-seen order
    pub links: Vec<Url>,
    pub assets: Vec<Asset>,
}

/// Options that shape extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions<'a> {
    /// Titles treated as missing
    pub boilerplate_titles: &'a [String],
    /// Whether CSS background images are collected at all
    pub css_backgrounds: bool,
}

/// Extracts content, links and assets from an HTML document
///
/// # Arguments
///
/// * `html` - The document source (static or rendered)
/// * `page_url` - URL the document was served from
/// * `computed_backgrounds` - Raw `url(...)` targets from the renderer's
///   computed-style pass; empty for static pages
/// * `scope` - Crawl scope used to filter links by domain
/// * `options` - Extraction options
pub fn extract_page(
    html: &str,
    page_url: &Url,
    computed_backgrounds: &[String],
    scope: &CrawlScope,
    options: ExtractOptions<'_>,
) -> Extraction {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url);

    let content = extract_content(&document, page_url, options.boilerplate_titles);
    let links = extract_links(&document, &base, scope);

    let mut asset_lists = vec![extract_images(&document, &base)];
    if options.css_backgrounds {
        asset_lists.push(extract_css_backgrounds(&document, &base));
        asset_lists.push(backgrounds_from(computed_backgrounds, &base));
    }

    Extraction {
        content,
        links,
        assets: merge_assets(asset_lists),
    }
}

/// Honors `<base href>` when the document declares one
fn document_base(document: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
        })
        .unwrap_or_else(|| page_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AssetKind;

    fn page_url() -> Url {
        Url::parse("https://ex.org/docs/guide/intro.html").unwrap()
    }

    fn scope() -> CrawlScope {
        CrawlScope::from_seed(&Url::parse("https://ex.org/docs/index.html").unwrap(), &[])
    }

    fn options(boilerplate: &[String], css: bool) -> ExtractOptions<'_> {
        ExtractOptions {
            boilerplate_titles: boilerplate,
            css_backgrounds: css,
        }
    }

    const PAGE: &str = r#"<html><head><title>Intro</title>
        <style>.banner { background-image: url(banner.png) }</style></head>
        <body><main>
          <h1>Introduction</h1>
          <p>Welcome.</p>
          <img src="banner.png" alt="Banner">
          <a href="setup.html">Setup</a>
        </main></body></html>"#;

    #[test]
    fn test_extract_page_merges_assets() {
        let extraction = extract_page(
            PAGE,
            &page_url(),
            &["hero.webp".to_string()],
            &scope(),
            options(&[], true),
        );

        assert_eq!(extraction.content.title, "Introduction");
        assert_eq!(
            extraction.links[0].as_str(),
            "https://ex.org/docs/guide/setup.html"
        );

        // the <img> wins over the stylesheet reference to the same file
        assert_eq!(extraction.assets.len(), 2);
        assert_eq!(extraction.assets[0].kind, AssetKind::Image);
        assert_eq!(extraction.assets[1].src, "https://ex.org/docs/guide/hero.webp");
        assert_eq!(extraction.assets[1].kind, AssetKind::CssBackground);
    }

    #[test]
    fn test_css_backgrounds_can_be_disabled() {
        let extraction = extract_page(
            PAGE,
            &page_url(),
            &["hero.webp".to_string()],
            &scope(),
            options(&[], false),
        );
        assert_eq!(extraction.assets.len(), 1);
    }

    #[test]
    fn test_base_element_changes_resolution() {
        let html = r#"<html><head><base href="/docs/api/"></head>
            <body><a href="vec.html">Vec</a></body></html>"#;
        let extraction = extract_page(html, &page_url(), &[], &scope(), options(&[], true));
        assert_eq!(extraction.links[0].as_str(), "https://ex.org/docs/api/vec.html");
    }
}
