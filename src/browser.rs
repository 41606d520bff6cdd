//! Chrome session setup and small page utilities.
//!
//! Amazon fingerprints automation aggressively, so every session launches
//! with the automation-controlled blink feature disabled, a rotating desktop
//! user agent and `navigator.webdriver` unmasked before any page script runs.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use tracing::warn;

static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    ]
});

/// Runs via Page.addScriptToEvaluateOnNewDocument, ahead of any site script.
const UNMASK_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', {
        get: () => undefined,
    });
"#;

/// Headless mode is driven by the environment: CI always runs headless,
/// and HEADLESS=true forces it locally.
pub fn headless_requested() -> bool {
    let truthy = |key: &str| std::env::var(key).map(|v| v == "true").unwrap_or(false);
    truthy("CI") || truthy("HEADLESS")
}

pub fn launch(headless: bool) -> Result<Browser> {
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&USER_AGENTS[0]);
    let ua_arg = format!("--user-agent={}", user_agent);

    let mut args = vec![
        OsStr::new("--disable-blink-features=AutomationControlled"),
        OsStr::new("--no-sandbox"),
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-infobars"),
        OsStr::new("--window-position=0,0"),
        OsStr::new("--incognito"),
    ];
    args.push(OsStr::new(&ua_arg));
    if headless {
        args.push(OsStr::new("--headless=new"));
    }

    let browser = Browser::new(LaunchOptions {
        headless: false, // new headless mode goes through args
        window_size: Some((1280, 1024)),
        args,
        ..Default::default()
    })?;

    Ok(browser)
}

/// Open the single page the whole run drives, with unmasking installed.
pub fn open_page(browser: &Browser) -> Result<Arc<Tab>> {
    let tab = browser.new_tab()?;
    tab.enable_debugger()?;
    tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
        source: UNMASK_SCRIPT.to_string(),
        world_name: None,
        include_command_line_api: None,
        run_immediately: None,
    })?;
    Ok(tab)
}

/// Bounded wait: up to `timeout` for `selector`, absence is not an error.
pub fn wait_for<'a>(tab: &'a Arc<Tab>, selector: &str, timeout: Duration) -> Option<Element<'a>> {
    tab.wait_for_element_with_custom_timeout(selector, timeout).ok()
}

/// Whether `selector` currently matches a rendered, visible element.
pub fn is_visible(tab: &Arc<Tab>, selector: &str) -> Result<bool> {
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            return style.display !== 'none' && style.visibility !== 'hidden' && el.offsetParent !== null;
        }})()"#,
        sel = serde_json::to_string(selector)?,
    );
    let result = tab.evaluate(&script, false)?;
    Ok(matches!(result.value, Some(serde_json::Value::Bool(true))))
}

/// Click the amazon cookie-consent banner away if one is covering the page.
pub fn dismiss_consent(tab: &Arc<Tab>) -> Result<()> {
    let result = tab.evaluate(
        r#"
        (() => {
            const btn = document.querySelector('#sp-cc-accept');
            if (btn && btn.offsetParent !== null) {
                btn.click();
                return "consent_clicked";
            }
            return "no_consent";
        })();
    "#,
        false,
    )?;

    if let Some(serde_json::Value::String(outcome)) = result.value {
        if outcome == "consent_clicked" {
            println!("🍪 Dismissed cookie consent banner.");
        }
    }
    Ok(())
}

/// Fixed settle interval plus up to a second of jitter, so waits don't tick
/// at a machine-regular cadence.
pub fn settle_with_jitter(base_millis: u64) -> Duration {
    Duration::from_millis(base_millis + rand::random::<u64>() % 1000)
}

/// Best-effort full-page screenshot under debug/, for post-mortems.
pub fn save_debug_screenshot(tab: &Arc<Tab>, name: &str) {
    let _ = std::fs::create_dir_all("debug");
    match tab.capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true) {
        Ok(png) => {
            let path = format!("debug/{}.png", name);
            if std::fs::write(&path, png).is_ok() {
                println!("📸 Screenshot saved to {}", path);
            }
        }
        Err(e) => warn!("screenshot capture failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmask_script_hides_webdriver() {
        assert!(UNMASK_SCRIPT.contains("navigator, 'webdriver'"));
    }

    #[test]
    fn settle_jitter_stays_within_a_second_of_base() {
        for _ in 0..50 {
            let settle = settle_with_jitter(2000);
            assert!(settle >= Duration::from_millis(2000));
            assert!(settle < Duration::from_millis(3000));
        }
    }
}
