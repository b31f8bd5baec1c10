//! derStandard.at handler
//!
//! The site puts an adblock wall in front of articles. The wall text is
//! reported on its own; otherwise the headline and article body are
//! extracted.

use crate::error::HandlerError;
use crate::handlers::SiteHandler;
use crate::html::{all_text, first_text};
use scraper::Html;
use std::time::Duration;
use url::Url;

const ADBLOCK_SELECTOR: &str = ".adblock-banner, #adblock-message, .adblocker-message";
const HEADLINE_SELECTOR: &str = "h1, .article-title, .headline";
const ARTICLE_SELECTOR: &str = ".article-content, .article-body, .content";

const WAIT_TIME: Duration = Duration::from_secs(2);

/// Content shorter than this that mentions adblock is still the wall
const ADBLOCK_WALL_MAX_LEN: usize = 1000;

/// derStandard.at handler
///
/// Matches any URL containing `derstandard.at`.
pub struct DerStandardHandler;

impl DerStandardHandler {
    /// Create a new derStandard handler
    pub fn new() -> Self {
        Self
    }
}

impl Default for DerStandardHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteHandler for DerStandardHandler {
    fn name(&self) -> &'static str {
        "derstandard"
    }

    fn can_handle(&self, url: &Url) -> bool {
        url.as_str().contains("derstandard.at")
    }

    fn process_content(&self, content: &str, _base_url: &Url) -> Result<String, HandlerError> {
        let doc = Html::parse_document(content);

        let banner = all_text(&doc, ADBLOCK_SELECTOR)?;
        if !banner.is_empty() {
            return Ok(format!(
                "=== DerStandard.at ===\n\
                 AdBlock Banner Detected: {}\n\
                 Note: This site requires disabling ad blockers to view full content.\n",
                banner.trim()
            ));
        }

        let headline = first_text(&doc, HEADLINE_SELECTOR)?;
        if headline.is_empty() {
            return Ok(content.to_string());
        }

        let mut summary = format!("=== DerStandard.at ===\nTitle: {}\n\n", headline.trim());
        let article = all_text(&doc, ARTICLE_SELECTOR)?;
        summary.push_str(article.trim());
        Ok(summary)
    }

    fn wait_time(&self) -> Duration {
        WAIT_TIME
    }

    fn requires_retry(&self, content: &str) -> bool {
        content.to_lowercase().contains("adblock") && content.len() < ADBLOCK_WALL_MAX_LEN
    }
}
