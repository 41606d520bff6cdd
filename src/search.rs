//! Best-effort manufacturer-link resolution through DuckDuckGo.
//!
//! Items that only exist as Amazon catalog entries get one search each; the
//! first organic hit's real destination becomes the non-Amazon link. This is
//! enrichment, not a requirement: empty-handed lookups are logged and the
//! field stays empty.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::Tab;
use scraper::{Html, Selector};

use crate::browser;
use crate::extract::WishlistItem;
use crate::links;

const RESULT_ANCHOR: &str = "a.result__a";
const RESULT_TIMEOUT: Duration = Duration::from_secs(8);
const SETTLE_MILLIS: u64 = 2000;
/// Keeps marketplace listings out so the first hit is the maker's own page.
const EXCLUDE_FILTER: &str = "-amazon";

/// Skip rule: a scraped or already-resolved link is never overwritten, and
/// a nameless item has nothing to search for.
pub fn wants_external_link(item: &WishlistItem) -> bool {
    item.external_link.is_empty() && !item.name.is_empty()
}

pub fn build_query(item: &WishlistItem) -> String {
    let mut terms = item.name.clone();
    for option in &item.options {
        terms.push(' ');
        terms.push_str(option);
    }
    format!("{} {}", terms.trim(), EXCLUDE_FILTER)
}

pub fn search_url(query: &str) -> String {
    format!("https://duckduckgo.com/html/?q={}", urlencoding::encode(query))
}

/// First organic result's de-proxied href, if the page has one.
pub fn first_result_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(RESULT_ANCHOR).unwrap();
    let href = document.select(&sel).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    // The html endpoint serves protocol-relative hrefs.
    let absolute = if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        href.to_string()
    };
    Some(links::unwrap_redirect(&absolute))
}

async fn first_organic_result(tab: &Arc<Tab>, query: &str) -> Result<Option<String>> {
    tab.navigate_to(&search_url(query))?;
    tab.wait_until_navigated()?;
    tokio::time::sleep(browser::settle_with_jitter(SETTLE_MILLIS)).await;

    if browser::wait_for(tab, RESULT_ANCHOR, RESULT_TIMEOUT).is_none() {
        return Ok(None);
    }
    Ok(first_result_href(&tab.get_content()?))
}

/// Fill `external_link` for every item that still lacks one. Never fails a
/// batch: a lookup that errors or comes back empty is logged and skipped.
pub async fn resolve_missing_links(tab: &Arc<Tab>, items: &mut [WishlistItem]) {
    for item in items.iter_mut().filter(|item| wants_external_link(item)) {
        let query = build_query(item);
        println!("🔎 Searching manufacturer link: {}", query);
        match first_organic_result(tab, &query).await {
            Ok(Some(href)) => {
                println!("🔗 Resolved: {}", href);
                item.external_link = href;
            }
            Ok(None) => println!("⚠️ No organic result for '{}'; leaving link empty.", item.name),
            Err(e) => eprintln!("⚠️ Lookup failed for '{}': {}", item.name, e),
        }
    }
}
