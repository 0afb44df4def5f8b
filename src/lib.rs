//! # arxiv-reporter
//!
//! Query the arXiv search API and print formatted results.
//!
//! ## Modules
//!
//! - [`query`] - Search query and request URL construction
//! - [`arxiv`] - arXiv API client
//! - [`atom`] - Atom feed parsing with explicit namespace bindings
//! - [`report`] - Text, JSON and CSV rendering
//! - [`reporter`] - Search-and-report operation with user-facing messages
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arxiv_reporter::arxiv::{ArxivClient, ClientOptions};
//! use arxiv_reporter::query::SearchQuery;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ArxivClient::new(&ClientOptions::default())?;
//!     let query = SearchQuery::new("all:transformer AND cat:cs.CL", 5)?;
//!     let report = client.search(&query).await?;
//!     println!("Found {} articles", report.articles.len());
//!     Ok(())
//! }
//! ```

pub mod arxiv;
pub mod atom;
pub mod error;
pub mod query;
pub mod report;
pub mod reporter;

pub use error::{ArxivError, FailureKind, Result};
