//! CodePen handler
//!
//! Pens render their editors client-side. When the pen metadata or code
//! panes are present in the markup, they are condensed into a labeled
//! plain-text summary.

use crate::error::HandlerError;
use crate::handlers::SiteHandler;
use crate::html::{all_text, first_text};
use scraper::Html;
use std::time::Duration;
use url::Url;

const TITLE_SELECTOR: &str = "h1.pen-title, .pen-title h1, [data-slug-hash] h1";
const DESCRIPTION_SELECTOR: &str = ".pen-description, .pen-details .description";
const AUTHOR_SELECTOR: &str = ".pen-author, .profile-name";
const HTML_CODE_SELECTOR: &str = "#html-editor .ace_content, .code-wrap.html-wrap pre";
const CSS_CODE_SELECTOR: &str = "#css-editor .ace_content, .code-wrap.css-wrap pre";
const JS_CODE_SELECTOR: &str = "#js-editor .ace_content, .code-wrap.js-wrap pre";

/// CodePen editors usually need a few seconds to populate
const WAIT_TIME: Duration = Duration::from_secs(3);

/// CodePen handler
///
/// Matches any URL containing `codepen.io`.
pub struct CodePenHandler;

impl CodePenHandler {
    /// Create a new CodePen handler
    pub fn new() -> Self {
        Self
    }
}

impl Default for CodePenHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteHandler for CodePenHandler {
    fn name(&self) -> &'static str {
        "codepen"
    }

    fn can_handle(&self, url: &Url) -> bool {
        url.as_str().contains("codepen.io")
    }

    fn process_content(&self, content: &str, _base_url: &Url) -> Result<String, HandlerError> {
        let doc = Html::parse_document(content);

        let title = first_text(&doc, TITLE_SELECTOR)?;
        let description = first_text(&doc, DESCRIPTION_SELECTOR)?;
        let author = first_text(&doc, AUTHOR_SELECTOR)?;

        let code = [
            ("HTML", all_text(&doc, HTML_CODE_SELECTOR)?),
            ("CSS", all_text(&doc, CSS_CODE_SELECTOR)?),
            ("JavaScript", all_text(&doc, JS_CODE_SELECTOR)?),
        ];

        let has_code = code.iter().any(|(_, text)| !text.trim().is_empty());
        if title.trim().is_empty() && !has_code {
            return Ok(content.to_string());
        }

        let mut summary = String::from("=== CodePen ===\n");
        for (label, value) in [
            ("Title", &title),
            ("Author", &author),
            ("Description", &description),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                summary.push_str(&format!("{label}: {value}\n"));
            }
        }

        for (label, text) in &code {
            let text = text.trim();
            if !text.is_empty() {
                summary.push_str(&format!("\n--- {label} Code ---\n{text}\n"));
            }
        }

        Ok(summary)
    }

    fn wait_time(&self) -> Duration {
        WAIT_TIME
    }

    fn requires_retry(&self, content: &str) -> bool {
        !content.contains("pen-title") && !content.contains("code-wrap")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://codepen.io/jane/pen/abc").unwrap()
    }

    #[test]
    fn test_can_handle() {
        let handler = CodePenHandler::new();
        assert!(handler.can_handle(&base()));
        assert!(handler.can_handle(&Url::parse("https://cdpn.io/?ref=codepen.io").unwrap()));
        assert!(!handler.can_handle(&Url::parse("https://example.com/pen").unwrap()));
    }

    #[test]
    fn test_summarizes_pen() {
        let html = r#"<html><body>
            <h1 class="pen-title"> Bouncing Ball </h1>
            <a class="pen-author">Jane Doe</a>
            <div class="pen-description">A ball that bounces.</div>
            <div class="code-wrap html-wrap"><pre>&lt;div class="ball"&gt;&lt;/div&gt;</pre></div>
            <div class="code-wrap css-wrap"><pre>.ball { border-radius: 50%; }</pre></div>
        </body></html>"#;

        let summary = CodePenHandler::new().process_content(html, &base()).unwrap();

        assert!(summary.starts_with("=== CodePen ===\n"));
        assert!(summary.contains("Title: Bouncing Ball\n"));
        assert!(summary.contains("Author: Jane Doe\n"));
        assert!(summary.contains("Description: A ball that bounces.\n"));
        assert!(summary.contains("\n--- HTML Code ---\n<div class=\"ball\"></div>\n"));
        assert!(summary.contains("\n--- CSS Code ---\n.ball { border-radius: 50%; }\n"));
        assert!(!summary.contains("JavaScript Code"));
    }

    #[test]
    fn test_code_without_title_is_recognized() {
        let html = r#"<div id="js-editor"><div class="ace_content">console.log(1)</div></div>"#;
        let summary = CodePenHandler::new().process_content(html, &base()).unwrap();

        assert!(summary.contains("--- JavaScript Code ---\nconsole.log(1)"));
        assert!(!summary.contains("Title:"));
    }

    #[test]
    fn test_unrecognized_content_unchanged() {
        let html = "<html><body><p>Loading pen...</p></body></html>";
        let out = CodePenHandler::new().process_content(html, &base()).unwrap();
        assert_eq!(out, html);
    }

    #[test]
    fn test_requires_retry() {
        let handler = CodePenHandler::new();
        assert!(handler.requires_retry("<div id=\"app\"></div>"));
        assert!(!handler.requires_retry("<h1 class=\"pen-title\">x</h1>"));
        assert!(!handler.requires_retry("<div class=\"code-wrap\"></div>"));
        // A synthesized summary carries neither marker
        assert!(handler.requires_retry("=== CodePen ===\nTitle: x\n"));
    }

    #[test]
    fn test_wait_time() {
        assert_eq!(CodePenHandler::new().wait_time(), Duration::from_secs(3));
    }
}
