//! Generic single-page application handler
//!
//! Fallback for hosts that look like web apps (`app.`, `dashboard.`,
//! `admin.`, `portal.`). Such pages usually ship an empty shell and render
//! client-side, so a shell is replaced with a short notice instead of being
//! shown as if it were the page.

use crate::error::HandlerError;
use crate::handlers::SiteHandler;
use crate::html::{all_text, has_match};
use scraper::Html;
use std::time::Duration;
use url::Url;

/// Host fragments that suggest a single-page application
const SPA_HOST_PREFIXES: &[&str] = &["app.", "dashboard.", "admin.", "portal."];

const LOADING_SELECTOR: &str = ".loading, .spinner, .loader, [data-loading], #loading";

/// Body text shorter than this is treated as an unrendered shell
const SHELL_MAX_LEN: usize = 200;

/// Content shorter than this still needs another attempt
const MIN_RENDERED_LEN: usize = 500;

const WAIT_TIME: Duration = Duration::from_secs(5);

const LOADING_NOTICE: &str = "=== Single Page Application ===\n\
    Content is still loading. This appears to be a dynamic web application.\n\
    Note: Terminal browsers have limited support for dynamic content.\n";

const SHELL_NOTICE: &str = "=== Single Page Application ===\n\
    This appears to be a single-page application with minimal initial content.\n\
    The main content is likely loaded via JavaScript after page load.\n";

/// Generic single-page application handler
///
/// Register this last: it matches broad host patterns and would shadow
/// narrower site handlers.
pub struct GenericSpaHandler;

impl GenericSpaHandler {
    /// Create a new generic SPA handler
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenericSpaHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteHandler for GenericSpaHandler {
    fn name(&self) -> &'static str {
        "generic_spa"
    }

    fn can_handle(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        SPA_HOST_PREFIXES.iter().any(|prefix| host.contains(prefix))
    }

    fn process_content(&self, content: &str, _base_url: &Url) -> Result<String, HandlerError> {
        let doc = Html::parse_document(content);

        if has_match(&doc, LOADING_SELECTOR)? {
            return Ok(LOADING_NOTICE.to_string());
        }

        let body = all_text(&doc, "body")?;
        if body.trim().len() < SHELL_MAX_LEN {
            return Ok(SHELL_NOTICE.to_string());
        }

        Ok(content.to_string())
    }

    fn wait_time(&self) -> Duration {
        WAIT_TIME
    }

    fn requires_retry(&self, content: &str) -> bool {
        let lower = content.to_lowercase();
        lower.contains("loading")
            || lower.contains("spinner")
            || content.trim().len() < MIN_RENDERED_LEN
    }
}
