use std::io::Write;

use anyhow::Result;
use dotenv::dotenv;
use url::Url;

use wishlist_crawler::browser;
use wishlist_crawler::captcha::TerminalSolver;
use wishlist_crawler::pipeline::{self, PipelineError};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let urls = prompt_for_urls()?;
    if urls.is_empty() {
        eprintln!("❌ No valid wishlist URLs supplied.");
        std::process::exit(1);
    }

    let headless = browser::headless_requested();
    println!("🚀 Launching Chrome (headless: {})...", headless);
    let chrome = browser::launch(headless)?;
    let tab = browser::open_page(&chrome)?;
    let solver = TerminalSolver;

    let mut failed = 0usize;
    for url in &urls {
        match pipeline::process_wishlist(&tab, url, &solver).await {
            Ok(path) => println!("✅ {} → {}", url, path.display()),
            Err(e) if e.downcast_ref::<PipelineError>().is_some() => {
                eprintln!("❌ {}", e);
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if failed > 0 {
        eprintln!("⚠️ {} of {} wishlists failed.", failed, urls.len());
        // exit() skips destructors; shut Chrome down first
        drop(tab);
        drop(chrome);
        std::process::exit(1);
    }
    Ok(())
}

fn prompt_for_urls() -> Result<Vec<String>> {
    print!("Enter wishlist URLs (comma-separated): ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(parse_url_list(&line))
}

fn parse_url_list(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match Url::parse(entry) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
            _ => {
                eprintln!("⚠️ Skipping invalid URL: {}", entry);
                None
            }
        })
        .collect()
}
