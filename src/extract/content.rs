//! Title, heading, code-block and body-text extraction

use crate::record::Heading;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Main-content candidates, tried in order; the first match wins
const MAIN_SELECTORS: &[&str] = &[".contents", "#doc-content", "main", "article", ".textblock"];

/// Elements dropped before body text is flattened
const NON_CONTENT: &str = "script, style, noscript, template, nav, header, footer, \
     .navpath, .breadcrumb, .breadcrumbs, [aria-label=breadcrumb], [role=navigation]";

/// Elements that start a new line when flattened
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "div", "dl", "dt",
    "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "td", "th", "thead", "tr", "ul",
];

/// Code-bearing elements; `div.fragment` is the Doxygen code listing
const CODE_SELECTOR: &str = "pre, code, div.fragment";

/// Code blocks must be longer than this (in characters) to be kept
const MIN_CODE_CHARS: usize = 10;

/// Text content of one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    pub title: String,
    pub headings: Vec<Heading>,
    pub code_blocks: Vec<String>,
    pub text: String,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Extracts the text content of a parsed document
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `url` - The page URL, used for the last-resort title
/// * `boilerplate_titles` - Titles treated as missing (site-wide placeholders)
pub fn extract_content(document: &Html, url: &Url, boilerplate_titles: &[String]) -> Content {
    let root = main_region(document);

    Content {
        title: resolve_title(document, root, url, boilerplate_titles),
        headings: root.map(extract_headings).unwrap_or_default(),
        code_blocks: root.map(extract_code_blocks).unwrap_or_default(),
        text: root.map(body_text).unwrap_or_default(),
    }
}

/// Returns the first matching main-content candidate, else `<body>`
pub fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    MAIN_SELECTORS
        .iter()
        .chain(std::iter::once(&"body"))
        .filter_map(|css| selector(css))
        .find_map(|sel| document.select(&sel).next())
}

fn resolve_title(
    document: &Html,
    root: Option<ElementRef<'_>>,
    url: &Url,
    boilerplate_titles: &[String],
) -> String {
    let is_usable = |title: &str| {
        !title.is_empty()
            && !boilerplate_titles
                .iter()
                .any(|b| b.trim().eq_ignore_ascii_case(title))
    };

    let in_root = root.and_then(|r| first_text(r, "h1"));
    let in_document = first_text(document.root_element(), "h1");
    let declared = first_text(document.root_element(), "title");

    [in_root, in_document, declared]
        .into_iter()
        .flatten()
        .find(|t| is_usable(t))
        .unwrap_or_else(|| title_from_url(url))
}

fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    scope
        .select(&sel)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Derives a title from the last path segment of a URL
///
/// `.../foo_bar.html` becomes `foo bar`; a trailing slash uses the segment
/// before it; a bare host yields the host name.
///
/// # Examples
///
/// ```
/// use docsweep::extract::title_from_url;
/// use url::Url;
///
/// let url = Url::parse("https://ex.org/docs/foo_bar.html").unwrap();
/// assert_eq!(title_from_url(&url), "foo bar");
/// ```
pub fn title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("");

    let stem = [".html", ".htm", ".pdf"]
        .iter()
        .find_map(|ext| {
            let lower = segment.to_ascii_lowercase();
            lower.ends_with(ext).then(|| &segment[..segment.len() - ext.len()])
        })
        .unwrap_or(segment);

    let title = collapse_whitespace(&stem.replace(['_', '-'], " "));
    if !title.is_empty() {
        return title;
    }

    url.host_str()
        .map(str::to_string)
        .unwrap_or_else(|| "Untitled".to_string())
}

fn extract_headings(root: ElementRef<'_>) -> Vec<Heading> {
    let Some(sel) = selector("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    root.select(&sel)
        .filter_map(|el| {
            let level = el.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
            let text = collapse_whitespace(&el.text().collect::<String>());
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

fn extract_code_blocks(root: ElementRef<'_>) -> Vec<String> {
    let (Some(code), Some(container)) = (selector(CODE_SELECTOR), selector("pre, div.fragment"))
    else {
        return Vec::new();
    };

    root.select(&code)
        .filter(|el| {
            // a <code> inside <pre> is part of the enclosing block
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .any(|a| container.matches(&a))
        })
        .filter_map(|el| {
            let literal = el.value().name() == "pre";
            let mut raw = String::new();
            flatten(el, None, literal, &mut raw);
            // outside <pre>, blank lines are markup indentation, not code
            let block = raw
                .lines()
                .map(str::trim_end)
                .filter(|line| literal || !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
                .trim_matches('\n')
                .to_string();
            (block.trim().chars().count() > MIN_CODE_CHARS).then_some(block)
        })
        .collect()
}

/// Flattens an element to normalized, newline-separated text
///
/// Navigation-like elements are dropped; intra-line whitespace collapses to
/// single spaces and runs of blank lines collapse to one.
pub fn body_text(root: ElementRef<'_>) -> String {
    let skip = selector(NON_CONTENT);
    let mut raw = String::new();
    flatten(root, skip.as_ref(), false, &mut raw);
    normalize_text(&raw)
}

/// Appends the text under `element`, one line per block element
///
/// Source line breaks only survive when `literal` is set or inside `<pre>`.
fn flatten(element: ElementRef<'_>, skip: Option<&Selector>, literal: bool, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) if literal => out.push_str(text),
            Node::Text(text) => {
                out.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }))
            }
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip.is_some_and(|s| s.matches(&child_el)) {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&el.name());
                if block {
                    out.push('\n');
                }
                flatten(child_el, skip, literal || el.name() == "pre", out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapses whitespace within lines and any run of blank lines to one
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::new();
    let mut blank_run = 0;

    for line in raw.lines().map(collapse_whitespace) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        out.push_str(&line);
        blank_run = 0;
    }

    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("https://ex.org/docs/{}", path)).unwrap()
    }

    fn extract(html: &str, path: &str) -> Content {
        let document = Html::parse_document(html);
        extract_content(&document, &url(path), &["Main Page".to_string()])
    }

    #[test]
    fn test_title_prefers_heading_in_main_region() {
        let content = extract(
            r#"<html><head><title>Site</title></head>
               <body><h1>Banner</h1><div class="contents"><h1>Vector Class</h1></div></body></html>"#,
            "vector.html",
        );
        assert_eq!(content.title, "Vector Class");
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let content = extract(
            "<html><head><title> API  Guide </title></head><body><p>x</p></body></html>",
            "guide.html",
        );
        assert_eq!(content.title, "API Guide");
    }

    #[test]
    fn test_title_from_url_when_missing() {
        let content = extract("<html><body><p>No title here.</p></body></html>", "foo_bar.html");
        assert_eq!(content.title, "foo bar");
    }

    #[test]
    fn test_boilerplate_title_replaced() {
        let content = extract(
            "<html><head><title>Main Page</title></head><body><p>x</p></body></html>",
            "getting-started.html",
        );
        assert_eq!(content.title, "getting started");
    }

    #[test]
    fn test_title_from_url_variants() {
        assert_eq!(title_from_url(&url("class_vec__3.html")), "class vec 3");
        assert_eq!(title_from_url(&url("guide/")), "guide");
        assert_eq!(title_from_url(&url("manual.PDF")), "manual");
        assert_eq!(
            title_from_url(&Url::parse("https://ex.org/").unwrap()),
            "ex.org"
        );
    }

    #[test]
    fn test_main_region_cascade() {
        let html = r#"<html><body><nav>menu</nav><article><p>article</p></article>
                      <main><p>main</p></main></body></html>"#;
        let document = Html::parse_document(html);
        // "main" is listed before "article"
        let region = main_region(&document).unwrap();
        assert_eq!(region.value().name(), "main");
    }

    #[test]
    fn test_falls_back_to_body() {
        let content = extract("<html><body><p>Only body.</p></body></html>", "x.html");
        assert_eq!(content.text, "Only body.");
    }

    #[test]
    fn test_headings_in_order_with_levels() {
        let content = extract(
            "<html><body><main><h2>Usage</h2><p>a</p><h3> Options </h3><h1>Top</h1></main></body></html>",
            "x.html",
        );
        let got: Vec<(u8, &str)> = content
            .headings
            .iter()
            .map(|h| (h.level, h.text.as_str()))
            .collect();
        assert_eq!(got, vec![(2, "Usage"), (3, "Options"), (1, "Top")]);
    }

    #[test]
    fn test_code_blocks_filtered_by_length() {
        let content = extract(
            r#"<html><body><main>
                 <p>Call <code>init()</code> first.</p>
                 <pre><code>let v = Vec::new();
v.push(1);</code></pre>
               </main></body></html>"#,
            "x.html",
        );
        assert_eq!(content.code_blocks, vec!["let v = Vec::new();\nv.push(1);"]);
    }

    #[test]
    fn test_doxygen_fragment_keeps_lines() {
        let content = extract(
            r#"<html><body><div class="contents"><div class="fragment">
                 <div class="line">int main() {</div>
                 <div class="line">  return 0;</div>
                 <div class="line">}</div>
               </div></div></body></html>"#,
            "x.html",
        );
        assert_eq!(content.code_blocks, vec!["int main() {\n  return 0;\n}"]);
    }

    #[test]
    fn test_body_text_drops_navigation() {
        let content = extract(
            r#"<html><body><main>
                 <div class="navpath">Home &gt; API</div>
                 <nav>Prev | Next</nav>
                 <script>var x = 1;</script>
                 <p>Real   content
                    here.</p>
                 <footer>Generated by Doxygen</footer>
               </main></body></html>"#,
            "x.html",
        );
        assert_eq!(content.text, "Real content here.");
    }

    #[test]
    fn test_normalize_text_collapses_blank_runs() {
        assert_eq!(normalize_text("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_text("a\nb"), "a\nb");
        assert_eq!(normalize_text("a\n   \nb"), "a\n\nb");
        assert_eq!(normalize_text("\n\n  x \t y  \n\n"), "x y");
    }

    #[test]
    fn test_inline_elements_stay_on_one_line() {
        let content = extract(
            "<html><body><main><p>See <a href='a.html'>the guide</a> for <b>details</b>.</p></main></body></html>",
            "x.html",
        );
        assert_eq!(content.text, "See the guide for details.");
    }
}
