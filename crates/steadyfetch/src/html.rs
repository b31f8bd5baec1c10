//! Small HTML helpers shared by the detector and the site handlers

use crate::error::HandlerError;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript"];

/// Extract the visible text of a document
///
/// Text inside script/style/noscript is skipped. The body text is trimmed;
/// documents without a body fall back to the text of the whole tree.
pub(crate) fn visible_text(doc: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next());

    let nodes = match body {
        Some(body) => body.descendants(),
        None => doc.tree.root().descendants(),
    };

    let mut out = String::new();
    for node in nodes {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }

    if body.is_some() {
        out.trim().to_string()
    } else {
        out
    }
}

/// Compile a selector, mapping failures to a handler parse error
pub(crate) fn selector(css: &str) -> Result<Selector, HandlerError> {
    Selector::parse(css).map_err(|e| HandlerError::Parse(format!("{css}: {e:?}")))
}

/// Text of the first element matching `css`, or an empty string
pub(crate) fn first_text(doc: &Html, css: &str) -> Result<String, HandlerError> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .map(element_text)
        .unwrap_or_default())
}

/// Concatenated text of every element matching `css`
pub(crate) fn all_text(doc: &Html, css: &str) -> Result<String, HandlerError> {
    let sel = selector(css)?;
    Ok(doc.select(&sel).map(element_text).collect())
}

/// Whether any element matches `css`
pub(crate) fn has_match(doc: &Html, css: &str) -> Result<bool, HandlerError> {
    let sel = selector(css)?;
    Ok(doc.select(&sel).next().is_some())
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}
