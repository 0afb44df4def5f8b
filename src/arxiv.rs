//! arXiv API client.
//!
//! Sends exactly one GET per search. No retries and, unless configured, no
//! timeout: a failure is surfaced once to the caller.

use crate::atom::{self, Namespaces};
use crate::error::{ArxivError, Result};
use crate::query::{build_search_url, SearchQuery, DEFAULT_API_URL};
use crate::report::Report;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// User agent sent with every request
const USER_AGENT: &str = concat!("arxiv-reporter/", env!("CARGO_PKG_VERSION"));

/// Client options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API endpoint (defaults to the public arXiv export mirror)
    pub base_url: String,
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
    /// Whole-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            proxy: None,
            timeout: None,
        }
    }
}

/// arXiv search client
pub struct ArxivClient {
    client: Client,
    base_url: String,
    namespaces: Namespaces<'static>,
}

impl ArxivClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns [`ArxivError::Config`] for an invalid proxy or base URL.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_url) = options.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                ArxivError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ArxivError::Config(format!("Failed to build HTTP client: {}", e)))?;

        url::Url::parse(&options.base_url).map_err(|e| {
            ArxivError::Config(format!("Invalid base URL '{}': {}", options.base_url, e))
        })?;

        Ok(Self {
            client,
            base_url: options.base_url.clone(),
            namespaces: Namespaces::ARXIV_FEED,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a search and return the parsed report.
    ///
    /// # Errors
    ///
    /// Connection-kind errors for transport failures and non-success statuses,
    /// [`ArxivError::Parse`] for a malformed body, and the entry-level errors of
    /// [`atom::parse_feed`].
    pub async fn search(&self, query: &SearchQuery) -> Result<Report> {
        let url = build_search_url(&self.base_url, query)?;

        info!(
            query = query.expression(),
            max_results = query.max_results(),
            "Starting arXiv query"
        );

        let body = self.fetch(url.as_str()).await?;
        let feed = atom::parse_feed(&body, &self.namespaces, query.max_results())?;

        info!(
            count = feed.articles.len(),
            total = ?feed.total_results,
            "arXiv query complete"
        );

        Ok(Report::new(query.expression(), feed))
    }

    /// Fetch the response body. The body is read to the end, which returns the
    /// connection to the pool; on every error path the response is dropped.
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching arXiv feed");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!(status = status.as_u16(), "arXiv API returned an error status");
            return Err(ArxivError::Status {
                code: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Received arXiv feed");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::tests::{entry, feed};
    use crate::error::FailureKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ArxivClient {
        let options = ClientOptions {
            base_url: format!("{}/api/query", server.uri()),
            ..Default::default()
        };
        ArxivClient::new(&options).expect("client")
    }

    #[tokio::test]
    async fn test_search_sends_fixed_parameters() {
        let server = MockServer::start().await;
        let body = feed(&[
            entry("First", &["A"], "2019-05-01T00:00:00Z", "http://x/1"),
            entry("Second", &["B"], "2019-05-02T00:00:00Z", "http://x/2"),
            entry("Third", &["C"], "2019-05-03T00:00:00Z", "http://x/3"),
        ]);

        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("search_query", "all:a & b"))
            .and(query_param("start", "0"))
            .and(query_param("max_results", "2"))
            .and(query_param("sortBy", "relevance"))
            .and(query_param("sortOrder", "descending"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery::new("all:a & b", 2).expect("valid query");
        let report = client_for(&server).search(&query).await.expect("search");

        assert_eq!(report.query, "all:a & b");
        assert_eq!(report.articles.len(), 2);
        assert_eq!(report.articles[0].title, "First");
        assert_eq!(report.articles[1].title, "Second");
    }

    #[tokio::test]
    async fn test_error_status_is_connection_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let query = SearchQuery::new("all:x", 5).expect("valid query");
        let err = client_for(&server).search(&query).await.expect_err("503");

        assert_eq!(err.kind(), FailureKind::Connection);
        assert_eq!(err.to_string(), "Service Unavailable");
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<feed><entry>"))
            .mount(&server)
            .await;

        let query = SearchQuery::new("all:x", 5).expect("valid query");
        let err = client_for(&server).search(&query).await.expect_err("bad xml");
        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let options = ClientOptions {
            base_url: "http://127.0.0.1:1/api/query".to_string(),
            ..Default::default()
        };
        let client = ArxivClient::new(&options).expect("client");
        let query = SearchQuery::new("all:x", 5).expect("valid query");

        let err = client.search(&query).await.expect_err("refused");
        assert!(matches!(err, ArxivError::Connection(_)));

        let reason = err.to_string();
        assert!(reason.contains("refused"), "reason: {reason}");
        assert!(!reason.contains("127.0.0.1"), "reason: {reason}");
        assert!(!reason.contains("search_query"), "reason: {reason}");
    }

    #[test]
    fn test_invalid_options() {
        let bad_url = ClientOptions {
            base_url: "::nope".to_string(),
            ..Default::default()
        };
        assert!(matches!(ArxivClient::new(&bad_url), Err(ArxivError::Config(_))));

        let bad_proxy = ClientOptions {
            proxy: Some("not a proxy url".to_string()),
            ..Default::default()
        };
        assert!(matches!(ArxivClient::new(&bad_proxy), Err(ArxivError::Config(_))));
    }
}
