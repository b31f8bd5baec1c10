//! steadyfetch CLI - fetch a page and wait out loading screens and banners

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use steadyfetch::{Client, ContentAnalysis, FetchOutcome};
use tracing_subscriber::EnvFilter;

/// Output format for fetch subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Analysis report followed by the content
    #[default]
    Md,
    /// JSON format
    Json,
}

/// steadyfetch - content-aware page fetching
#[derive(Parser, Debug)]
#[command(name = "steadyfetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch URL, retrying until the content looks final
    Fetch {
        /// URL to fetch
        url: String,

        /// Disable content detection and retry logic
        #[arg(long)]
        no_retry: bool,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        /// Custom User-Agent
        #[arg(long)]
        user_agent: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Retries after the first attempt
        #[arg(long, default_value_t = 3)]
        max_retries: usize,

        /// Longest single wait between attempts, in seconds
        #[arg(long, default_value_t = 10)]
        max_wait: u64,

        /// Budget for the whole fetch in seconds, across all attempts
        #[arg(long)]
        deadline: Option<u64>,
    },
}

/// JSON output document
#[derive(Serialize)]
struct JsonOutput<'a> {
    url: &'a str,
    #[serde(flatten)]
    outcome: &'a FetchOutcome,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("steadyfetch=info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Some(Commands::Fetch {
            url,
            no_retry,
            output,
            user_agent,
            timeout,
            max_retries,
            max_wait,
            deadline,
        }) => {
            let mut builder = Client::builder()
                .timeout(Duration::from_secs(timeout))
                .max_retries(max_retries)
                .max_wait_time(Duration::from_secs(max_wait));

            if let Some(ua) = user_agent {
                builder = builder.user_agent(ua);
            }
            if let Some(secs) = deadline {
                builder = builder.deadline(Duration::from_secs(secs));
            }

            let client = match builder.build() {
                Ok(client) => client,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            run_fetch(&client, &url, !no_retry, output).await;
        }
        None => {
            eprintln!("Usage: steadyfetch fetch <URL> [--no-retry]");
            eprintln!("   or: steadyfetch --help");
            std::process::exit(1);
        }
    }
}

async fn run_fetch(client: &Client, url: &str, enable_retry: bool, output: OutputFormat) {
    if !enable_retry {
        eprintln!("Content detection and retry logic disabled");
    }

    match client.fetch(url, enable_retry).await {
        Ok(outcome) => match output {
            OutputFormat::Md => {
                if let Some(ref analysis) = outcome.analysis {
                    writeln_safe(&format_analysis(analysis));
                }
                writeln_safe(&outcome.content);
            }
            OutputFormat::Json => {
                let doc = JsonOutput {
                    url,
                    outcome: &outcome,
                };
                let json = serde_json::to_string_pretty(&doc).unwrap_or_else(|e| {
                    eprintln!("Error serializing response: {}", e);
                    std::process::exit(1);
                });
                writeln_safe(&json);
            }
        },
        Err(e) => {
            eprintln!("Failed to fetch page: {}", e);
            std::process::exit(1);
        }
    }
}

/// Format the analysis report shown above the content
fn format_analysis(analysis: &ContentAnalysis) -> String {
    let mut output = String::from("=== Content Analysis ===\n");

    if analysis.is_loaded {
        output.push_str("Content appears to be fully loaded\n");
    } else {
        output.push_str("Content may not be fully loaded\n");
    }

    if analysis.is_loading_page {
        output.push_str("Loading page detected\n");
        if !analysis.loading_indicators.is_empty() {
            output.push_str(&format!(
                "  Indicators: {}\n",
                analysis.loading_indicators.join(", ")
            ));
        }
    }

    if analysis.is_cookie_banner {
        output.push_str("Cookie consent banner detected\n");
    }

    if analysis.is_adblock_banner {
        output.push_str("AdBlock detection banner found\n");
    }

    if analysis.is_interstitial {
        output.push_str("Interstitial page detected (banner/loading screen)\n");
    }

    output.push_str(&format!(
        "Content length: {} bytes\n",
        analysis.content_length
    ));

    if analysis.requires_retry {
        output.push_str(&format!(
            "Retry recommended (wait time: {:?})\n",
            analysis.suggested_wait
        ));
    }

    output.push_str("========================\n");
    output
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_loaded_page() {
        let analysis = ContentAnalysis {
            content_length: 1200,
            is_loaded: true,
            ..Default::default()
        };

        let output = format_analysis(&analysis);

        assert!(output.starts_with("=== Content Analysis ===\n"));
        assert!(output.contains("Content appears to be fully loaded\n"));
        assert!(output.contains("Content length: 1200 bytes\n"));
        assert!(!output.contains("Retry recommended"));
        assert!(!output.contains("Interstitial"));
    }

    #[test]
    fn test_format_loading_page() {
        let analysis = ContentAnalysis {
            content_length: 40,
            is_loading_page: true,
            is_cookie_banner: true,
            is_interstitial: true,
            loading_indicators: vec!["just a moment".to_string(), "Just a moment".to_string()],
            suggested_wait: Duration::from_secs(5),
            requires_retry: true,
            ..Default::default()
        };

        let output = format_analysis(&analysis);

        assert!(output.contains("Content may not be fully loaded\n"));
        assert!(output.contains("  Indicators: just a moment, Just a moment\n"));
        assert!(output.contains("Cookie consent banner detected\n"));
        assert!(output.contains("Interstitial page detected"));
        assert!(output.contains("Retry recommended (wait time: 5s)\n"));
        assert!(!output.contains("AdBlock"));
    }

    #[test]
    fn test_json_output_flattens_outcome() {
        let outcome = FetchOutcome {
            content: "<p>hi</p>".to_string(),
            analysis: None,
            attempts: 1,
            handler: None,
            status_code: 200,
        };
        let doc = JsonOutput {
            url: "https://example.com",
            outcome: &outcome,
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["url"], "https://example.com");
        assert_eq!(json["attempts"], 1);
        assert_eq!(json["content"], "<p>hi</p>");
        assert!(json["analysis"].is_null());
    }

    #[test]
    fn test_cli_parses_fetch_flags() {
        let cli = Cli::parse_from([
            "steadyfetch",
            "fetch",
            "https://example.com",
            "--no-retry",
            "--max-retries",
            "5",
            "--deadline",
            "30",
        ]);

        match cli.command {
            Some(Commands::Fetch {
                url,
                no_retry,
                max_retries,
                deadline,
                max_wait,
                ..
            }) => {
                assert_eq!(url, "https://example.com");
                assert!(no_retry);
                assert_eq!(max_retries, 5);
                assert_eq!(deadline, Some(30));
                assert_eq!(max_wait, 10);
            }
            None => panic!("expected fetch subcommand"),
        }
    }
}
