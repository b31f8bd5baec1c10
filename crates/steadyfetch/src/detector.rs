//! Content detector
//!
//! Classifies fetched markup as final content or as an interstitial state:
//! a loading screen, an anti-bot challenge, or a cookie/adblock banner.
//! Every check runs over the visible text of the document, never the raw
//! markup, so scripts and styles cannot trigger a match.

use crate::error::DetectorError;
use crate::html::visible_text;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Default minimum visible-text length for a page to count as loaded
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 500;

/// Below this visible-text length the longest wait is suggested
const SHORT_CONTENT_LENGTH: usize = 100;

const BASE_WAIT: Duration = Duration::from_secs(2);
const LOADING_WAIT: Duration = Duration::from_secs(3);
const BANNER_WAIT: Duration = Duration::from_secs(1);
const SHORT_CONTENT_WAIT: Duration = Duration::from_secs(5);

const DEFAULT_LOADING_INDICATORS: &[&str] = &[
    "just a moment",
    "loading",
    "please wait",
    "redirecting",
    "checking your browser",
    "verifying you are human",
    "one moment please",
    "loading content",
    "initializing",
    "preparing",
];

const DEFAULT_LOADING_PATTERNS: &[&str] = &[
    r"(?i)loading[\s\.]{0,3}",
    r"(?i)please\s+wait",
    r"(?i)just\s+a\s+moment",
    r"(?i)checking\s+your\s+browser",
    r"(?i)verifying\s+you\s+are\s+human",
    r"(?i)cloudflare",
    r"(?i)ddos\s+protection",
    r"(?i)security\s+check",
];

const COOKIE_PHRASES: &[&str] = &[
    "accept cookies",
    "cookie policy",
    "we use cookies",
    "cookies help us",
    "cookie consent",
    "privacy policy",
    "accept all",
    "manage cookies",
];

const COOKIE_SELECTORS: &[&str] = &[
    "#cookie-banner",
    ".cookie-banner",
    "#cookie-consent",
    ".cookie-consent",
    "#gdpr-banner",
    ".gdpr-banner",
    "[data-cookie]",
];

const ADBLOCK_PHRASES: &[&str] = &[
    "disable adblock",
    "turn off adblock",
    "ad blocker detected",
    "please disable",
    "whitelist this site",
    "support us by disabling",
    "ads help us",
];

/// Classification of a single fetched document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentAnalysis {
    /// Byte length of the visible text
    pub content_length: usize,
    /// Content looks final
    pub is_loaded: bool,
    /// At least one loading indicator matched
    pub is_loading_page: bool,
    /// Cookie consent banner detected
    pub is_cookie_banner: bool,
    /// Adblock detection banner detected
    pub is_adblock_banner: bool,
    /// Any transient non-final state (cookie, adblock or loading)
    pub is_interstitial: bool,
    /// Indicator phrases and pattern matches found in the visible text
    pub loading_indicators: Vec<String>,
    /// How long to wait before fetching again
    #[serde(rename = "suggested_wait_ms", serialize_with = "serialize_millis")]
    pub suggested_wait: Duration,
    /// Content is not final and another attempt may help
    pub requires_retry: bool,
}

impl ContentAnalysis {
    /// Analysis for input that could not be parsed at all
    ///
    /// Only the raw length is known; the page is reported as not loaded and
    /// every other check is skipped.
    pub fn unparsed(raw_length: usize) -> Self {
        Self {
            content_length: raw_length,
            ..Default::default()
        }
    }
}

fn serialize_millis<S: Serializer>(wait: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(wait.as_millis()).unwrap_or(u64::MAX))
}

/// Heuristic detector for loading screens, challenges and banners
///
/// Configure it with the `set_*`/`add_*` methods before handing it to a
/// [`Client`](crate::Client); after that it is shared read-only.
#[derive(Debug, Clone)]
pub struct ContentDetector {
    loading_indicators: Vec<String>,
    loading_patterns: Vec<Regex>,
    min_content_length: usize,
}

impl Default for ContentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentDetector {
    /// Create a detector with the built-in indicators and patterns
    pub fn new() -> Self {
        Self {
            loading_indicators: DEFAULT_LOADING_INDICATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            loading_patterns: DEFAULT_LOADING_PATTERNS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
        }
    }

    /// Minimum visible-text length for a page to count as loaded
    pub fn min_content_length(&self) -> usize {
        self.min_content_length
    }

    /// Set the minimum visible-text length threshold
    pub fn set_min_content_length(&mut self, length: usize) {
        self.min_content_length = length;
    }

    /// Add a loading phrase, matched case-insensitively
    pub fn add_loading_indicator(&mut self, indicator: impl AsRef<str>) {
        self.loading_indicators
            .push(indicator.as_ref().to_lowercase());
    }

    /// Add a loading regex
    ///
    /// Patterns are matched as written; prefix with `(?i)` for
    /// case-insensitive matching. An invalid pattern leaves the detector
    /// unchanged.
    pub fn add_loading_pattern(&mut self, pattern: &str) -> Result<(), DetectorError> {
        let regex = Regex::new(pattern)?;
        self.loading_patterns.push(regex);
        Ok(())
    }

    /// Analyze a document and classify its loading state
    pub fn analyze(&self, html: &str) -> ContentAnalysis {
        let doc = Html::parse_document(html);
        let text = visible_text(&doc);
        let lower = text.to_lowercase();

        let content_length = text.len();
        let loading_indicators = self.find_loading_indicators(&text, &lower);
        let is_loading_page = !loading_indicators.is_empty();
        let is_cookie_banner = detect_cookie_banner(&doc, &lower);
        let is_adblock_banner = detect_adblock_banner(&lower);
        let is_interstitial = is_cookie_banner || is_adblock_banner || is_loading_page;

        let is_loaded =
            !is_loading_page && content_length >= self.min_content_length && !is_interstitial;
        let requires_retry =
            !is_loaded && (is_loading_page || content_length < self.min_content_length);

        let mut analysis = ContentAnalysis {
            content_length,
            is_loaded,
            is_loading_page,
            is_cookie_banner,
            is_adblock_banner,
            is_interstitial,
            loading_indicators,
            suggested_wait: Duration::ZERO,
            requires_retry,
        };
        analysis.suggested_wait = suggested_wait(&analysis);
        analysis
    }

    fn find_loading_indicators(&self, text: &str, lower: &str) -> Vec<String> {
        let phrases = self
            .loading_indicators
            .iter()
            .filter(|indicator| lower.contains(indicator.as_str()))
            .cloned();

        let patterns = self
            .loading_patterns
            .iter()
            .filter_map(|pattern| pattern.find(text))
            .map(|m| m.as_str().to_string());

        phrases.chain(patterns).collect()
    }
}

fn detect_cookie_banner(doc: &Html, lower: &str) -> bool {
    if COOKIE_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }

    COOKIE_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .any(|sel| doc.select(&sel).next().is_some())
}

fn detect_adblock_banner(lower: &str) -> bool {
    ADBLOCK_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Suggested wait before the next attempt
///
/// Each rule overwrites the previous one in this fixed order, so the last
/// applicable rule decides: base, loading page, banner, short content.
fn suggested_wait(analysis: &ContentAnalysis) -> Duration {
    if !analysis.requires_retry {
        return Duration::ZERO;
    }

    let mut wait = BASE_WAIT;
    if analysis.is_loading_page {
        wait = LOADING_WAIT;
    }
    if analysis.is_cookie_banner || analysis.is_adblock_banner {
        wait = BANNER_WAIT;
    }
    if analysis.content_length < SHORT_CONTENT_LENGTH {
        wait = SHORT_CONTENT_WAIT;
    }
    wait
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Neutral filler text with no indicator or banner phrases
    fn filler(len: usize) -> String {
        "Lorem ipsum dolor sit amet consectetur adipiscing elit. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    fn page(body: &str) -> String {
        format!("<!DOCTYPE html><html><head><title>t</title></head><body>{body}</body></html>")
    }

    #[test]
    fn test_defaults() {
        let detector = ContentDetector::new();
        assert_eq!(detector.min_content_length(), 500);
        assert_eq!(detector.loading_indicators.len(), 10);
        assert_eq!(detector.loading_patterns.len(), 8);
    }

    #[test]
    fn test_loaded_page() {
        let detector = ContentDetector::new();
        let analysis = detector.analyze(&page(&filler(800)));

        assert!(analysis.is_loaded);
        assert!(!analysis.requires_retry);
        assert!(!analysis.is_interstitial);
        assert!(analysis.loading_indicators.is_empty());
        assert_eq!(analysis.suggested_wait, Duration::ZERO);
    }

    #[test]
    fn test_short_content_requires_retry() {
        let detector = ContentDetector::new();
        let analysis = detector.analyze(&page(&filler(300)));

        assert_eq!(analysis.content_length, 300);
        assert!(!analysis.is_loaded);
        assert!(!analysis.is_loading_page);
        assert!(analysis.requires_retry);
        assert_eq!(analysis.suggested_wait, Duration::from_secs(2));
    }

    #[test]
    fn test_just_a_moment_any_case() {
        let detector = ContentDetector::new();
        let body = format!("<p>JuSt A MoMeNt</p><p>{}</p>", filler(600));
        let analysis = detector.analyze(&page(&body));

        assert!(analysis.is_loading_page);
        assert!(!analysis.is_loaded);
        assert!(analysis.requires_retry);
        assert!(analysis
            .loading_indicators
            .contains(&"just a moment".to_string()));
        assert!(analysis
            .loading_indicators
            .contains(&"JuSt A MoMeNt".to_string()));
        assert_eq!(analysis.suggested_wait, Duration::from_secs(3));
    }

    #[test]
    fn test_short_content_wait_wins_last() {
        let detector = ContentDetector::new();
        // 50 bytes of visible text that is also a loading page and a cookie banner
        let text = format!("Loading... we use cookies{}", filler(25));
        assert_eq!(text.len(), 50);
        let analysis = detector.analyze(&page(&text));

        assert!(analysis.is_loading_page);
        assert!(analysis.is_cookie_banner);
        assert_eq!(analysis.content_length, 50);
        assert_eq!(analysis.suggested_wait, Duration::from_secs(5));
    }

    #[test]
    fn test_banner_overrides_loading_wait() {
        let detector = ContentDetector::new();
        let body = format!("<p>Please wait. We use cookies.</p><p>{}</p>", filler(600));
        let analysis = detector.analyze(&page(&body));

        assert!(analysis.is_loading_page);
        assert!(analysis.is_cookie_banner);
        assert_eq!(analysis.suggested_wait, Duration::from_secs(1));
    }

    #[test]
    fn test_cookie_banner_by_selector() {
        let detector = ContentDetector::new();
        let body = format!(r#"<div id="gdpr-banner"></div><p>{}</p>"#, filler(700));
        let analysis = detector.analyze(&page(&body));

        assert!(analysis.is_cookie_banner);
        assert!(analysis.is_interstitial);
        assert!(!analysis.is_loaded);
        // Long enough and no loading indicator, so no retry is requested
        assert!(!analysis.requires_retry);
        assert_eq!(analysis.suggested_wait, Duration::ZERO);
    }

    #[test]
    fn test_adblock_banner() {
        let detector = ContentDetector::new();
        let body = format!("<p>Ad blocker detected!</p><p>{}</p>", filler(40));
        let analysis = detector.analyze(&page(&body));

        assert!(analysis.is_adblock_banner);
        assert!(analysis.is_interstitial);
        assert!(analysis.requires_retry);
        assert_eq!(analysis.suggested_wait, Duration::from_secs(5));
    }

    #[test]
    fn test_scripts_do_not_count() {
        let detector = ContentDetector::new();
        let script = format!("<script>var msg = 'loading'; // {}</script>", filler(900));
        let analysis = detector.analyze(&page(&format!("{script}<p>Hi</p>")));

        assert_eq!(analysis.content_length, 2);
        assert!(!analysis.is_loading_page);
        assert!(analysis.requires_retry);
    }

    #[test]
    fn test_challenge_pattern() {
        let detector = ContentDetector::new();
        let body = format!("<p>DDoS   protection by Cloudflare</p><p>{}</p>", filler(600));
        let analysis = detector.analyze(&page(&body));

        assert!(analysis.is_loading_page);
        assert!(analysis
            .loading_indicators
            .contains(&"DDoS   protection".to_string()));
        assert!(analysis.loading_indicators.contains(&"Cloudflare".to_string()));
    }

    #[test]
    fn test_custom_indicator_and_threshold() {
        let mut detector = ContentDetector::new();
        detector.set_min_content_length(10);
        detector.add_loading_indicator("Hold On");

        let analysis = detector.analyze(&page("Hold on, fetching your data"));
        assert!(analysis.is_loading_page);
        assert!(analysis.loading_indicators.contains(&"hold on".to_string()));

        let analysis = detector.analyze(&page("Short but fine here"));
        assert!(analysis.is_loaded);
    }

    #[test]
    fn test_custom_pattern() {
        let mut detector = ContentDetector::new();
        detector.add_loading_pattern(r"(?i)queue\s+position\s+\d+").unwrap();

        let analysis = detector.analyze(&page("You are in QUEUE position 42"));
        assert!(analysis
            .loading_indicators
            .contains(&"QUEUE position 42".to_string()));
    }

    #[test]
    fn test_invalid_pattern_leaves_detector_unchanged() {
        let mut detector = ContentDetector::new();
        assert!(detector.add_loading_pattern("(unclosed").is_err());
        assert_eq!(detector.loading_patterns.len(), 8);
    }

    #[test]
    fn test_garbage_input_is_total() {
        let detector = ContentDetector::new();
        let analysis = detector.analyze("<<<>>> </div></div><p");
        assert!(!analysis.is_loaded);
        assert!(analysis.requires_retry);
    }

    #[test]
    fn test_unparsed_analysis() {
        let analysis = ContentAnalysis::unparsed(42);
        assert_eq!(analysis.content_length, 42);
        assert!(!analysis.is_loaded);
        assert!(!analysis.requires_retry);
        assert_eq!(analysis.suggested_wait, Duration::ZERO);
    }

    #[test]
    fn test_analysis_serializes_wait_as_millis() {
        let analysis = ContentDetector::new().analyze(&page("tiny"));
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["suggested_wait_ms"], 5000);
        assert_eq!(json["is_loaded"], false);
    }
}
