//! Report rendering.
//!
//! The text format is the human-readable one the CLI prints by default. JSON and
//! CSV carry the same records for further processing.

use crate::atom::{Article, Feed};
use crate::error::{ArxivError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Output format for a rendered report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ArxivError::Validation(format!(
                "Unknown output format '{}'",
                other
            ))),
        }
    }
}

/// Articles returned for one query, in upstream ranking order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Expression the report was produced for
    pub query: String,
    /// Total matches reported by the API (all pages)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_results: Option<usize>,
    pub articles: Vec<Article>,
}

impl Report {
    pub fn new(query: impl Into<String>, feed: Feed) -> Self {
        Self {
            query: query.into(),
            total_results: feed.total_results,
            articles: feed.articles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Write the report in the requested format.
    pub fn render<W: Write>(&self, out: &mut W, format: OutputFormat, show_summary: bool) -> Result<()> {
        match format {
            OutputFormat::Text => self.write_text(out, show_summary),
            OutputFormat::Json => self.write_json(out),
            OutputFormat::Csv => self.write_csv(out),
        }
    }

    /// Numbered article blocks, each followed by a blank line
    pub fn write_text<W: Write>(&self, out: &mut W, show_summary: bool) -> Result<()> {
        for (index, article) in self.articles.iter().enumerate() {
            writeln!(out, "--- Article {} ---", index + 1)?;
            writeln!(out, "Title: {}", article.title)?;
            writeln!(out, "Authors: {}", article.authors.join(", "))?;
            writeln!(out, "Published: {}", article.published)?;
            writeln!(out, "Link: {}", article.link)?;
            if show_summary {
                if let Some(summary) = &article.summary {
                    writeln!(out, "Summary: {}", summary)?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }

    /// One row per article; list fields are joined with ", "
    pub fn write_csv<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(out);

        for (index, article) in self.articles.iter().enumerate() {
            wtr.serialize(CsvRow::new(index + 1, article))?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Flat CSV record; csv cannot serialize nested sequences
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    title: &'a str,
    authors: String,
    published: String,
    link: &'a str,
    arxiv_id: &'a str,
    pdf_url: &'a str,
    categories: String,
    summary: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(rank: usize, article: &'a Article) -> Self {
        Self {
            rank,
            title: &article.title,
            authors: article.authors.join(", "),
            published: article.published.to_string(),
            link: &article.link,
            arxiv_id: article.arxiv_id.as_deref().unwrap_or_default(),
            pdf_url: article.pdf_url.as_deref().unwrap_or_default(),
            categories: article.categories.join(", "),
            summary: article.summary.as_deref().unwrap_or_default(),
        }
    }
}
