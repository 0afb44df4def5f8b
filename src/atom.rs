//! Atom feed parsing for arXiv API responses.
//!
//! Namespace URIs are never looked up from global state: every helper takes the
//! [`Namespaces`] binding it should match against, so a feed served under a
//! different namespace set can be parsed by passing a different binding.

use crate::error::{ArxivError, OptionExt, Result};
use chrono::NaiveDate;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Atom syndication namespace
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// arXiv extension namespace (`arxiv:primary_category`, `arxiv:doi`, ...)
pub const ARXIV_NS: &str = "http://arxiv.org/schemas/atom";

/// OpenSearch namespace (`opensearch:totalResults`)
pub const OPENSEARCH_NS: &str = "http://a9.com/-/spec/opensearch/1.1/";

/// Entry ids of this form mark the arXiv error feed
const ERROR_ID_PREFIX: &str = "http://arxiv.org/api/errors";

/// Namespace binding used for element lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespaces<'a> {
    pub atom: &'a str,
    pub arxiv: &'a str,
    pub opensearch: &'a str,
}

impl Namespaces<'static> {
    /// Binding for feeds served by `export.arxiv.org`
    pub const ARXIV_FEED: Namespaces<'static> = Namespaces {
        atom: ATOM_NS,
        arxiv: ARXIV_NS,
        opensearch: OPENSEARCH_NS,
    };
}

impl Default for Namespaces<'static> {
    fn default() -> Self {
        Self::ARXIV_FEED
    }
}

/// One article extracted from a feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Title with surrounding whitespace removed
    pub title: String,
    /// Author names in feed order
    pub authors: Vec<String>,
    /// Date part of the `published` timestamp: its first 10 characters, after
    /// trimming, parsed as `YYYY-MM-DD`. Anything else is rejected with
    /// [`ArxivError::InvalidDate`].
    pub published: NaiveDate,
    /// Canonical abstract page (`rel="alternate"` link)
    pub link: String,
    /// arXiv identifier, e.g. `1706.03762v7`
    #[serde(default)]
    pub arxiv_id: Option<String>,
    /// Abstract with whitespace runs collapsed
    #[serde(default)]
    pub summary: Option<String>,
    /// Direct PDF link
    #[serde(default)]
    pub pdf_url: Option<String>,
    /// Primary category first, then the remaining category terms
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Parsed feed: the articles plus what the feed says about the full result set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feed {
    pub total_results: Option<usize>,
    pub articles: Vec<Article>,
}

/// Parse an Atom document into at most `limit` articles.
///
/// Entries are taken from the direct children of the root element, in document
/// order. A feed with no entries is not an error.
///
/// # Errors
///
/// * [`ArxivError::Parse`] - the document is not well-formed XML
/// * [`ArxivError::Api`] - arXiv answered with its error feed
/// * [`ArxivError::MissingField`] / [`ArxivError::InvalidDate`] - an entry is incomplete
pub fn parse_feed(xml: &str, ns: &Namespaces<'_>, limit: usize) -> Result<Feed> {
    let document = Document::parse(xml)?;
    let root = document.root_element();

    let entries: Vec<Node<'_, '_>> = children(root, ns.atom, "entry").collect();
    debug!(entries = entries.len(), limit = limit, "Parsed Atom document");

    if let Some(message) = entries.first().and_then(|entry| error_feed_message(*entry, ns)) {
        warn!(message = %message, "arXiv returned an error feed");
        return Err(ArxivError::Api(message));
    }

    let total_results = child(root, ns.opensearch, "totalResults")
        .and_then(|node| node.text())
        .and_then(|text| text.trim().parse().ok());

    let articles = entries
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| parse_entry(entry, ns, index + 1))
        .collect::<Result<Vec<_>>>()?;

    Ok(Feed {
        total_results,
        articles,
    })
}

/// Extract one article. `position` is 1-based and only used in error messages.
fn parse_entry(entry: Node<'_, '_>, ns: &Namespaces<'_>, position: usize) -> Result<Article> {
    let title = child(entry, ns.atom, "title")
        .ok_or_missing(position, "title")
        .map(|node| text_content(node).trim().to_string())?;

    let link = children(entry, ns.atom, "link")
        .find(|node| node.attribute("rel") == Some("alternate"))
        .ok_or_missing(position, "alternate link")?
        .attribute("href")
        .ok_or_missing(position, "alternate link href")?
        .to_string();

    let authors = children(entry, ns.atom, "author")
        .map(|author| {
            child(author, ns.atom, "name")
                .map(text_content)
                .filter(|name| !name.trim().is_empty())
                .ok_or_missing(position, "author name")
        })
        .collect::<Result<Vec<_>>>()?;

    let published_raw = child(entry, ns.atom, "published")
        .map(text_content)
        .ok_or_missing(position, "published")?;
    let published = parse_date_prefix(&published_raw).ok_or_else(|| ArxivError::InvalidDate {
        entry: position,
        value: published_raw.clone(),
    })?;

    let arxiv_id = child(entry, ns.atom, "id")
        .map(text_content)
        .map(|id| match id.rsplit_once("/abs/") {
            Some((_, short)) => short.to_string(),
            None => id.trim().to_string(),
        })
        .filter(|id| !id.is_empty());

    let summary = child(entry, ns.atom, "summary")
        .map(|node| collapse_whitespace(&text_content(node)))
        .filter(|summary| !summary.is_empty());

    let pdf_url = children(entry, ns.atom, "link")
        .find(|node| node.attribute("title") == Some("pdf"))
        .and_then(|node| node.attribute("href"))
        .map(str::to_string);

    Ok(Article {
        title,
        authors,
        published,
        link,
        arxiv_id,
        summary,
        pdf_url,
        categories: categories(entry, ns),
    })
}

/// Primary category first, then every `category` term not already listed
fn categories(entry: Node<'_, '_>, ns: &Namespaces<'_>) -> Vec<String> {
    let primary = child(entry, ns.arxiv, "primary_category");
    let mut terms: Vec<String> = Vec::new();

    for node in primary.into_iter().chain(children(entry, ns.atom, "category")) {
        if let Some(term) = node.attribute("term") {
            if !terms.iter().any(|t| t == term) {
                terms.push(term.to_string());
            }
        }
    }

    terms
}

/// Message of an arXiv error feed entry, if this is one
fn error_feed_message(entry: Node<'_, '_>, ns: &Namespaces<'_>) -> Option<String> {
    let id = child(entry, ns.atom, "id").map(text_content)?;
    if !id.trim().starts_with(ERROR_ID_PREFIX) {
        return None;
    }

    let message = child(entry, ns.atom, "summary")
        .map(|node| collapse_whitespace(&text_content(node)))
        .filter(|summary| !summary.is_empty())
        .unwrap_or(id);
    Some(message)
}

/// First 10 characters of an ISO-8601 timestamp as a date
fn parse_date_prefix(timestamp: &str) -> Option<NaiveDate> {
    let prefix: String = timestamp.trim().chars().take(10).collect();
    NaiveDate::parse_from_str(&prefix, "%Y-%m-%d").ok()
}

fn child<'a, 'input>(node: Node<'a, 'input>, ns: &str, name: &str) -> Option<Node<'a, 'input>> {
    children(node, ns, name).next()
}

fn children<'a, 'input, 'q>(
    node: Node<'a, 'input>,
    ns: &'q str,
    name: &'q str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'q
where
    'a: 'q,
    'input: 'q,
{
    node.children()
        .filter(move |n| n.is_element() && n.has_tag_name((ns, name)))
}

/// Concatenated text of the direct text children (CDATA included)
fn text_content(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(title: &str, authors: &[&str], published: &str, link: &str) -> String {
        let authors: String = authors
            .iter()
            .map(|name| format!("<author><name>{}</name></author>", name))
            .collect();
        format!(
            r#"<entry>
    <id>{link}</id>
    <published>{published}</published>
    <title>{title}</title>
    <summary>  An abstract
      over two lines. </summary>
    {authors}
    <link href="{link}" rel="alternate" type="text/html"/>
    <link title="pdf" href="{link}.pdf" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>"#
        )
    }

    pub(crate) fn feed(entries: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query</title>
  <opensearch:totalResults>1234</opensearch:totalResults>
  {}
</feed>"#,
            entries.join("\n  ")
        )
    }

    fn numbered(count: usize) -> Vec<String> {
        (1..=count)
            .map(|i| {
                entry(
                    &format!("Paper {}", i),
                    &["A"],
                    "2020-01-01T00:00:00Z",
                    &format!("http://arxiv.org/abs/{}", i),
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_fabricated_entry() {
        let xml = feed(&[entry(
            "  Attention Is All You Need  ",
            &["A", "B"],
            "2017-06-12T10:00:00Z",
            "http://x/1",
        )]);

        let parsed = parse_feed(&xml, &Namespaces::ARXIV_FEED, 5).expect("Parse failed");
        assert_eq!(parsed.total_results, Some(1234));
        assert_eq!(parsed.articles.len(), 1);

        let article = &parsed.articles[0];
        assert_eq!(article.title, "Attention Is All You Need");
        assert_eq!(article.authors, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(article.published.to_string(), "2017-06-12");
        assert_eq!(article.link, "http://x/1");
        assert_eq!(article.summary.as_deref(), Some("An abstract over two lines."));
        assert_eq!(article.pdf_url.as_deref(), Some("http://x/1.pdf"));
        assert_eq!(article.categories, vec!["cs.CL".to_string(), "cs.LG".to_string()]);
    }

    #[test]
    fn test_limit_truncates_and_keeps_order() {
        let xml = feed(&numbered(8));
        for k in 1..=8 {
            let parsed = parse_feed(&xml, &Namespaces::ARXIV_FEED, k).expect("Parse failed");
            assert_eq!(parsed.articles.len(), k);
        }

        let parsed = parse_feed(&xml, &Namespaces::ARXIV_FEED, 20).expect("Parse failed");
        let titles: Vec<&str> = parsed.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Paper 1", "Paper 2", "Paper 3", "Paper 4", "Paper 5", "Paper 6", "Paper 7", "Paper 8"]
        );
        assert_eq!(parsed.articles[2].arxiv_id.as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_feed() {
        let parsed = parse_feed(&feed(&[]), &Namespaces::ARXIV_FEED, 5).expect("Parse failed");
        assert!(parsed.articles.is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        let xml = feed(&numbered(2));
        let truncated = &xml[..xml.len() / 2];
        let err = parse_feed(truncated, &Namespaces::ARXIV_FEED, 5).expect_err("should fail");
        assert!(matches!(err, ArxivError::Parse(_)));
    }

    #[test]
    fn test_namespace_binding_is_respected() {
        // Same element names in a foreign namespace are not entries.
        let xml = r#"<feed xmlns="urn:other"><entry><title>x</title></entry></feed>"#;
        let parsed = parse_feed(xml, &Namespaces::ARXIV_FEED, 5).expect("Parse failed");
        assert!(parsed.articles.is_empty());

        let custom = Namespaces {
            atom: "urn:other",
            ..Namespaces::ARXIV_FEED
        };
        let err = parse_feed(xml, &custom, 5).expect_err("entry lacks a link");
        assert!(matches!(
            err,
            ArxivError::MissingField {
                entry: 1,
                field: "alternate link"
            }
        ));
    }

    #[test]
    fn test_entry_without_authors() {
        let xml = feed(&[entry("Solo", &[], "2021-03-04T00:00:00Z", "http://x/2")]);
        let parsed = parse_feed(&xml, &Namespaces::ARXIV_FEED, 5).expect("Parse failed");
        assert!(parsed.articles[0].authors.is_empty());
    }

    #[test]
    fn test_empty_author_name() {
        let xml = feed(&[entry("T", &["", "B"], "2021-03-04T00:00:00Z", "http://x/4")]);
        let err = parse_feed(&xml, &Namespaces::ARXIV_FEED, 5).expect_err("should fail");
        assert!(matches!(
            err,
            ArxivError::MissingField {
                entry: 1,
                field: "author name"
            }
        ));
    }

    #[test]
    fn test_missing_published_and_bad_date() {
        let missing = feed(&[r#"<entry><title>T</title><link rel="alternate" href="h"/></entry>"#.to_string()]);
        let err = parse_feed(&missing, &Namespaces::ARXIV_FEED, 5).expect_err("should fail");
        assert!(matches!(err, ArxivError::MissingField { field: "published", .. }));

        let padded = feed(&[entry("T", &["A"], "\n  2017-06-12T10:00:00Z ", "http://x/3")]);
        let parsed = parse_feed(&padded, &Namespaces::ARXIV_FEED, 5).expect("Parse failed");
        assert_eq!(parsed.articles[0].published.to_string(), "2017-06-12");

        let bad = feed(&[entry("T", &["A"], "yesterday", "http://x/3")]);
        let err = parse_feed(&bad, &Namespaces::ARXIV_FEED, 5).expect_err("should fail");
        assert!(matches!(err, ArxivError::InvalidDate { entry: 1, .. }));
    }

    #[test]
    fn test_error_feed() {
        let xml = feed(&[r#"<entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
    <updated>2024-01-01T00:00:00-05:00</updated>
    <link href="http://arxiv.org/api/errors#incorrect_id_format_for_1234" rel="alternate" type="text/html"/>
    <author><name>arXiv api core</name></author>
  </entry>"#
            .to_string()]);
        let err = parse_feed(&xml, &Namespaces::ARXIV_FEED, 5).expect_err("error feed");
        match err {
            ArxivError::Api(message) => assert_eq!(message, "incorrect id format for 1234"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
