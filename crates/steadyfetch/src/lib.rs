//! steadyfetch - content-aware page fetching
//!
//! Fetches a page and decides whether what came back is the real content or
//! a transient state in front of it: a loading screen, an anti-bot
//! challenge, a JavaScript shell, or a cookie/adblock banner. Not-yet-final
//! content is re-fetched with bounded waits until it settles or the retry
//! budget runs out.
//!
//! ## Components
//!
//! - [`ContentDetector`] - classifies fetched markup into a [`ContentAnalysis`]
//! - [`HandlerRegistry`] - ordered per-site [`SiteHandler`]s, first match wins
//! - [`Client`] - the fetch controller combining both in a retry loop
//!
//! Built-in handlers:
//! - [`CodePenHandler`] - codepen.io pens
//! - [`DerStandardHandler`] - derstandard.at articles and adblock walls
//! - [`GenericSpaHandler`] - single-page application hosts
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> Result<(), steadyfetch::FetchError> {
//! let client = steadyfetch::Client::builder().max_retries(2).build()?;
//! let outcome = client.fetch("https://example.com", true).await?;
//! if let Some(analysis) = &outcome.analysis {
//!     println!("loaded: {}", analysis.is_loaded);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod detector;
mod error;
pub mod handlers;
mod html;

pub use client::{fetch, Client, ClientBuilder, FetchOptions, FetchOutcome};
pub use detector::{ContentAnalysis, ContentDetector, DEFAULT_MIN_CONTENT_LENGTH};
pub use error::{DetectorError, FetchError, HandlerError};
pub use handlers::{
    CodePenHandler, DerStandardHandler, GenericSpaHandler, HandlerRegistry, SiteHandler,
};

/// Default User-Agent string, a desktop browser so sites serve their full page
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";
