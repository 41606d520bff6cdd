//! Per-wishlist-URL driver: navigate, recover, scroll, extract, resolve,
//! export. Strictly sequential over the one shared page.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use headless_chrome::Tab;
use thiserror::Error;
use url::Url;

use crate::browser;
use crate::captcha::{self, CaptchaOutcome, ChallengeSolver};
use crate::export;
use crate::extract;
use crate::scroll;
use crate::search;

const NAV_SETTLE_MILLIS: u64 = 2000;

/// Failures that end one wishlist URL but not the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not resolve a list name for {0}")]
    ListNameUnresolved(String),
    #[error("challenge recovery failed for {0}")]
    ChallengeUnsolved(String),
}

/// Process one wishlist URL end to end and return the CSV path it produced.
pub async fn process_wishlist(
    tab: &Arc<Tab>,
    wishlist_url: &str,
    solver: &dyn ChallengeSolver,
) -> Result<PathBuf> {
    println!("🧾 Processing wishlist: {}", wishlist_url);
    tab.navigate_to(wishlist_url)?;
    tab.wait_until_navigated()?;
    tokio::time::sleep(browser::settle_with_jitter(NAV_SETTLE_MILLIS)).await;
    browser::dismiss_consent(tab)?;

    if captcha::recover(tab, solver).await? == CaptchaOutcome::Unsolved {
        return Err(PipelineError::ChallengeUnsolved(wishlist_url.to_string()).into());
    }

    let list_name = extract::extract_list_name(&tab.get_content()?)
        .ok_or_else(|| PipelineError::ListNameUnresolved(wishlist_url.to_string()))?;
    println!("📋 List name: {}", list_name);

    scroll::scroll_to_end(tab).await?;

    let base = origin_of(wishlist_url);
    let mut items = extract::extract_items(&tab.get_content()?, &base);
    println!("📦 Extracted {} items.", items.len());

    search::resolve_missing_links(tab, &mut items).await;

    let path = export::write_batch(&list_name, &items)?;
    println!("💾 Wrote {} rows to {}", items.len(), path.display());
    Ok(path)
}

/// Base origin for resolving relative product hrefs, taken from the wishlist
/// URL itself so regional storefronts keep their own domain.
fn origin_of(wishlist_url: &str) -> String {
    Url::parse(wishlist_url)
        .map(|u| u.origin().ascii_serialization())
        .unwrap_or_else(|_| "https://www.amazon.com".to_string())
}
