//! Example: Fetch various URLs and display their content analysis
//!
//! Run with: cargo run -p steadyfetch --example fetch_urls
//!
//! This example shows which site handler each URL binds to and how the
//! detector classifies what came back.

use std::time::Duration;
use steadyfetch::{Client, FetchOutcome};

/// Example URL definition
struct Case {
    url: &'static str,
    description: &'static str,
    expect_handler: Option<&'static str>,
}

const CASES: &[Case] = &[
    Case {
        url: "https://example.com",
        description: "Static page, too short to count as loaded",
        expect_handler: None,
    },
    Case {
        url: "https://httpbin.org/html",
        description: "Long static page",
        expect_handler: None,
    },
    Case {
        url: "https://codepen.io/team/codepen/pen/PNaGbb",
        description: "CodePen pen (uses CodePenHandler)",
        expect_handler: Some("codepen"),
    },
    Case {
        url: "https://www.derstandard.at/",
        description: "derStandard front page (uses DerStandardHandler)",
        expect_handler: Some("derstandard"),
    },
    Case {
        url: "https://app.netlify.com/",
        description: "Single-page app (uses GenericSpaHandler)",
        expect_handler: Some("generic_spa"),
    },
];

#[tokio::main]
async fn main() {
    println!("steadyfetch URL Examples");
    println!("========================\n");

    let client = match Client::builder()
        .max_retries(2)
        .max_wait_time(Duration::from_secs(3))
        .deadline(Duration::from_secs(20))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut failed = 0;

    for (i, case) in CASES.iter().enumerate() {
        println!("{}. {}", i + 1, case.description);
        println!("   URL: {}", case.url);

        match client.fetch_page(case.url).await {
            Ok(outcome) => {
                print_outcome(&outcome);
                if outcome.handler != case.expect_handler {
                    println!(
                        "   ✗ expected handler {:?}, got {:?}\n",
                        case.expect_handler, outcome.handler
                    );
                    failed += 1;
                } else {
                    println!("   ✓ OK\n");
                }
            }
            Err(e) => {
                println!("   Error: {}\n", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_outcome(outcome: &FetchOutcome) {
    println!("   Status: {}", outcome.status_code);
    println!("   Attempts: {}", outcome.attempts);

    if let Some(ref analysis) = outcome.analysis {
        println!(
            "   Loaded: {} (visible text: {} bytes)",
            analysis.is_loaded, analysis.content_length
        );
        if !analysis.loading_indicators.is_empty() {
            println!("   Indicators: {:?}", analysis.loading_indicators);
        }
    }

    println!("   Preview: {}", preview(&outcome.content, 100));
}

/// First `limit` characters on one line, with "..." only when something was cut
fn preview(content: &str, limit: usize) -> String {
    let mut chars = content.chars();
    let mut preview = chars.by_ref().take(limit).collect::<String>().replace('\n', " ");
    if chars.next().is_some() {
        preview.push_str("...");
    }
    preview
}
