//! Site handler system for per-domain content handling
//!
//! Design: Each handler recognizes specific URLs and knows how its site
//! loads. HandlerRegistry resolves to the first matching handler.

mod codepen;
mod derstandard;
mod generic_spa;

pub use codepen::CodePenHandler;
pub use derstandard::DerStandardHandler;
pub use generic_spa::GenericSpaHandler;

use crate::error::HandlerError;
use std::time::Duration;
use url::Url;

/// Trait for site-specific content handling
///
/// Implement this trait to teach the fetch controller about a site: how to
/// summarize its markup, how long it usually takes to render, and how to
/// tell that it has not finished yet.
pub trait SiteHandler: Send + Sync {
    /// Unique identifier for this handler (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Returns true if this handler is responsible for the given URL
    ///
    /// Called by the registry to determine which handler to use.
    /// More specific handlers should be registered before generic ones.
    fn can_handle(&self, url: &Url) -> bool;

    /// Transform fetched content
    ///
    /// Returns a synthesized plain-text summary when site-specific content
    /// is recognized, or the input unchanged otherwise. An error means the
    /// handler could not process the content; the caller keeps its previous
    /// content.
    fn process_content(&self, content: &str, base_url: &Url) -> Result<String, HandlerError>;

    /// Typical dynamic-load latency of this site
    fn wait_time(&self) -> Duration;

    /// Whether the (possibly transformed) content still needs another attempt
    fn requires_retry(&self, content: &str) -> bool;
}

/// Ordered collection of site handlers
///
/// Handlers are checked in registration order and the first one whose
/// `can_handle` returns true wins, so register narrow handlers before broad
/// fallbacks.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn SiteHandler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Create a registry with the built-in handlers pre-registered
    ///
    /// Includes (in order of priority):
    /// 1. CodePenHandler - codepen.io pens
    /// 2. DerStandardHandler - derstandard.at articles and adblock walls
    /// 3. GenericSpaHandler - app./dashboard./admin./portal. hosts
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CodePenHandler::new()));
        registry.register(Box::new(DerStandardHandler::new()));
        // Broad fallback last so it cannot shadow the site handlers
        registry.register(Box::new(GenericSpaHandler::new()));
        registry
    }

    /// Register a handler
    ///
    /// Handlers are checked in registration order, so register more
    /// specific handlers before generic ones.
    pub fn register(&mut self, handler: Box<dyn SiteHandler>) {
        self.handlers.push(handler);
    }

    /// Find the handler responsible for a URL
    pub fn resolve(&self, url: &Url) -> Option<&dyn SiteHandler> {
        let handler = self
            .handlers
            .iter()
            .find(|handler| handler.can_handle(url))
            .map(|handler| &**handler);

        if let Some(handler) = handler {
            tracing::debug!(handler = handler.name(), url = %url, "Using site handler");
        }
        handler
    }

    /// Names of the registered handlers, in priority order
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handler is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
