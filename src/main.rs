//! arxiv-reporter - search arXiv from the command line
//!
//! ## Usage
//!
//! ```bash
//! arxiv-reporter search "all:transformer AND cat:cs.CL" -n 5
//! arxiv-reporter search "Hinton" --field author --format json --output hinton.json
//! arxiv-reporter url "ti:attention"
//! arxiv-reporter parse saved_feed.xml
//! ```

use anyhow::{Context, Result};
use arxiv_reporter::arxiv::{ArxivClient, ClientOptions};
use arxiv_reporter::atom::{self, Namespaces};
use arxiv_reporter::query::{
    build_search_url, SearchField, SearchQuery, DEFAULT_API_URL, DEFAULT_MAX_RESULTS,
    EXAMPLE_QUERY,
};
use arxiv_reporter::report::{OutputFormat, Report};
use arxiv_reporter::reporter::{self, ReportSettings};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Search arXiv and print formatted results
#[derive(Parser)]
#[command(name = "arxiv-reporter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query arXiv and print a report
    Search {
        #[command(flatten)]
        query: QueryArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// API endpoint
        #[arg(long, default_value = DEFAULT_API_URL)]
        base_url: String,

        /// Proxy URL (e.g., http://127.0.0.1:7890)
        #[arg(long)]
        proxy: Option<String>,

        /// Request timeout in seconds (default: wait indefinitely)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the request URL without sending it
    Url {
        #[command(flatten)]
        query: QueryArgs,

        /// API endpoint
        #[arg(long, default_value = DEFAULT_API_URL)]
        base_url: String,
    },

    /// Render a saved Atom response
    Parse {
        /// Atom XML file
        file: PathBuf,

        /// Maximum number of articles
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct QueryArgs {
    /// Search expression (arXiv query syntax, e.g. "all:transformer AND cat:cs.CL")
    #[arg(default_value = EXAMPLE_QUERY)]
    query: String,

    /// Maximum number of articles
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Restrict the expression to one field (all, title, author, abstract, category, ...)
    #[arg(long)]
    field: Option<String>,
}

impl QueryArgs {
    fn to_query(&self) -> Result<SearchQuery> {
        let query = match &self.field {
            Some(field) => SearchQuery::with_field(SearchField::parse(field)?, &self.query, self.max_results)?,
            None => SearchQuery::new(self.query.clone(), self.max_results)?,
        };
        Ok(query)
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json", "csv"])]
    format: String,

    /// Include each article's abstract in text output
    #[arg(long)]
    summary: bool,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl OutputArgs {
    fn to_settings(&self) -> Result<ReportSettings> {
        Ok(ReportSettings {
            format: OutputFormat::parse(&self.format)?,
            show_summary: self.summary,
            output: self.output.clone(),
        })
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search {
            query,
            output,
            base_url,
            proxy,
            timeout,
        } => {
            let options = ClientOptions {
                base_url,
                proxy,
                timeout: timeout.map(Duration::from_secs),
            };
            run_search(&query, &output, &options).await
        }
        Commands::Url { query, base_url } => {
            let url = build_search_url(&base_url, &query.to_query()?)?;
            println!("{}", url);
            Ok(())
        }
        Commands::Parse {
            file,
            max_results,
            output,
        } => run_parse(&file, max_results, &output),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_search(args: &QueryArgs, output: &OutputArgs, options: &ClientOptions) -> Result<()> {
    let query = args.to_query().context("Invalid search query")?;
    let settings = output.to_settings()?;
    let client = ArxivClient::new(options).context("Failed to create arXiv client")?;

    let mut stdout = std::io::stdout().lock();

    // The reporter has already printed the failure; it is not a process error.
    if let Err(e) = reporter::search_and_report(&client, &query, &settings, &mut stdout).await {
        debug!(kind = %e.kind(), "Search finished with a reported failure");
    }

    Ok(())
}

fn run_parse(file: &Path, max_results: usize, output: &OutputArgs) -> Result<()> {
    if max_results == 0 {
        anyhow::bail!("--max-results must be at least 1");
    }
    let settings = output.to_settings()?;
    let xml = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let result = atom::parse_feed(&xml, &Namespaces::ARXIV_FEED, max_results)
        .map(|feed| Report::new(file.display().to_string(), feed));

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = reporter::report_outcome(result, &settings, &mut stdout) {
        debug!(kind = %e.kind(), "Parse finished with a reported failure");
    }

    Ok(())
}
