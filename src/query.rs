//! Search query construction.
//!
//! A [`SearchQuery`] is validated once and then turned into the arXiv request
//! URL by [`build_search_url`]. Parameters are form-urlencoded, so a space or an
//! `&` inside the expression never breaks the parameter boundaries.

use crate::error::{ArxivError, Result};
use std::fmt;
use url::Url;

/// arXiv API query endpoint
pub const DEFAULT_API_URL: &str = "http://export.arxiv.org/api/query";

/// Default number of results per report
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Query used by the CLI when none is given
pub const EXAMPLE_QUERY: &str = "all:transformer AND cat:cs.CL";

/// Field prefix restricting where arXiv matches the expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    All,
    Title,
    Author,
    Abstract,
    Category,
    Comment,
    JournalRef,
    ReportNumber,
    Id,
}

impl SearchField {
    /// Prefix understood by the arXiv query syntax
    pub fn prefix(self) -> &'static str {
        match self {
            SearchField::All => "all",
            SearchField::Title => "ti",
            SearchField::Author => "au",
            SearchField::Abstract => "abs",
            SearchField::Category => "cat",
            SearchField::Comment => "co",
            SearchField::JournalRef => "jr",
            SearchField::ReportNumber => "rn",
            SearchField::Id => "id",
        }
    }

    /// Parse a field from either its prefix (`au`) or its long name (`author`)
    pub fn parse(name: &str) -> Result<Self> {
        let field = match name.trim().to_ascii_lowercase().as_str() {
            "all" => SearchField::All,
            "ti" | "title" => SearchField::Title,
            "au" | "author" => SearchField::Author,
            "abs" | "abstract" => SearchField::Abstract,
            "cat" | "category" => SearchField::Category,
            "co" | "comment" => SearchField::Comment,
            "jr" | "journal" => SearchField::JournalRef,
            "rn" | "report" => SearchField::ReportNumber,
            "id" => SearchField::Id,
            other => {
                return Err(ArxivError::Validation(format!(
                    "Unknown search field '{}'",
                    other
                )))
            }
        };
        Ok(field)
    }
}

/// A single search request: expression plus result cap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    expression: String,
    max_results: usize,
}

impl SearchQuery {
    /// Create a query from a raw arXiv expression.
    ///
    /// # Errors
    ///
    /// Returns [`ArxivError::Validation`] if the expression is blank or
    /// `max_results` is zero.
    pub fn new(expression: impl Into<String>, max_results: usize) -> Result<Self> {
        let expression = expression.into();
        if expression.trim().is_empty() {
            return Err(ArxivError::Validation(
                "Search expression must not be empty".to_string(),
            ));
        }
        if max_results == 0 {
            return Err(ArxivError::Validation(
                "max_results must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            expression,
            max_results,
        })
    }

    /// Create a query scoped to one field, e.g. `au:` + `Hinton`
    pub fn with_field(field: SearchField, terms: &str, max_results: usize) -> Result<Self> {
        if terms.trim().is_empty() {
            return Err(ArxivError::Validation(
                "Search expression must not be empty".to_string(),
            ));
        }
        Self::new(format!("{}:{}", field.prefix(), terms.trim()), max_results)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Build the arXiv API URL for a query.
///
/// Pagination is fixed to the first page and ranking to relevance, descending.
pub fn build_search_url(base_url: &str, query: &SearchQuery) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ArxivError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("search_query", query.expression());
        params.append_pair("start", "0");
        params.append_pair("max_results", &query.max_results().to_string());
        params.append_pair("sortBy", "relevance");
        params.append_pair("sortOrder", "descending");
    }

    Ok(url)
}
