//! Robots.txt handling module
//!
//! The seed host's robots.txt is fetched once per run. A missing,
//! unreachable or non-2xx robots.txt means everything is allowed.

mod parser;

pub use parser::{ParsedRobots, MAX_CRAWL_DELAY};

use url::Url;

/// Fetches and parses robots.txt for the host of `seed`
///
/// # Arguments
///
/// * `client` - The HTTP client (already carrying the crawl's user agent)
/// * `seed` - Any URL on the host whose robots.txt should be read
///
/// # Returns
///
/// The parsed rules, or allow-all when robots.txt cannot be obtained
pub async fn fetch_robots(client: &reqwest::Client, seed: &Url) -> ParsedRobots {
    let robots_url = match seed.join("/robots.txt") {
        Ok(url) => url,
        Err(_) => return ParsedRobots::allow_all(),
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unreachable at {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned {}, allowing all",
            robots_url,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::info!("Loaded robots.txt from {}", robots_url);
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::debug!("Failed to read robots.txt body: {}", e);
            ParsedRobots::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_robots_parses_rules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /docs/private/"),
            )
            .mount(&server)
            .await;

        let seed = Url::parse(&format!("{}/docs/index.html", server.uri())).unwrap();
        let robots = fetch_robots(&reqwest::Client::new(), &seed).await;

        let private = seed.join("private/secret.html").unwrap();
        assert!(!robots.is_allowed(&private, "docsweep"));
        assert!(robots.is_allowed(&seed, "docsweep"));
    }

    #[tokio::test]
    async fn test_missing_robots_allows_all() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let seed = Url::parse(&format!("{}/docs/", server.uri())).unwrap();
        let robots = fetch_robots(&reqwest::Client::new(), &seed).await;
        assert!(robots.is_allowed(&seed.join("anything").unwrap(), "docsweep"));
    }
}
