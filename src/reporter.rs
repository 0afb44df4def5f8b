//! Search-and-report operation.
//!
//! Runs one search and prints the outcome. Failures are reported to the user as
//! a message and also handed back to the caller as a typed [`ArxivError`], so
//! the caller decides what a failure means without parsing message text.

use crate::arxiv::ArxivClient;
use crate::error::{ArxivError, FailureKind, Result};
use crate::query::SearchQuery;
use crate::report::{OutputFormat, Report};
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

/// How the report should be rendered and where it goes
#[derive(Debug, Clone, Default)]
pub struct ReportSettings {
    pub format: OutputFormat,
    /// Add a `Summary:` line to text blocks
    pub show_summary: bool,
    /// Write the rendered report to this file instead of the status writer
    pub output: Option<PathBuf>,
}

impl ReportSettings {
    /// Status lines would corrupt machine-readable output sharing the same writer
    fn status_lines(&self) -> bool {
        self.format == OutputFormat::Text || self.output.is_some()
    }
}

/// Search arXiv and print a report to `out`.
///
/// Returns the number of articles reported. On failure the user-facing message
/// has already been written when the error is returned.
pub async fn search_and_report<W: Write>(
    client: &ArxivClient,
    query: &SearchQuery,
    settings: &ReportSettings,
    out: &mut W,
) -> Result<usize> {
    if settings.status_lines() {
        writeln!(out, "Retrieving search results for: '{}'", query)?;
    } else {
        info!(query = query.expression(), "Retrieving search results");
    }

    let result = client.search(query).await;
    report_outcome(result, settings, out)
}

/// Print a search outcome: the articles, the empty-result notice, or the
/// failure message matching the error's kind.
pub fn report_outcome<W: Write>(
    result: Result<Report>,
    settings: &ReportSettings,
    out: &mut W,
) -> Result<usize> {
    let outcome = result.and_then(|report| emit(&report, settings, out));

    if let Err(e) = &outcome {
        error!(kind = %e.kind(), error = %e, "Search report failed");
        if let Err(write_err) = writeln!(out, "\n{}", failure_message(e)) {
            error!(error = %write_err, "Failed to print failure message");
        }
    }

    outcome
}

fn emit<W: Write>(report: &Report, settings: &ReportSettings, out: &mut W) -> Result<usize> {
    if report.is_empty() {
        writeln!(out, "\nNo articles found for this query.")?;
        return Ok(0);
    }

    let count = report.articles.len();
    if settings.status_lines() {
        writeln!(out, "\nFound {} articles:\n", count)?;
    }

    match &settings.output {
        Some(path) => {
            let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
            report.render(&mut file, settings.format, settings.show_summary)?;
            file.flush()?;
            writeln!(out, "Saved: {}", path.display())?;
        }
        None => report.render(out, settings.format, settings.show_summary)?,
    }

    info!(count = count, "Report written");
    Ok(count)
}

/// User-facing message for a failure
pub fn failure_message(err: &ArxivError) -> String {
    match err.kind() {
        FailureKind::Connection => format!("Error connecting to the API: {}", err),
        FailureKind::Parse => "Error parsing the XML response.".to_string(),
        FailureKind::Unexpected => format!("An unexpected error occurred: {}", err),
    }
}
