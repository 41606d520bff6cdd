//! Robot-check recovery with a human in the loop.
//!
//! Amazon serves its challenge as a distorted-character image; nothing here
//! tries to read it. The image goes to the operator, their answer goes back
//! into the form, and the outcome is checked once. A wrong answer is
//! escalated rather than re-submitted: hammering the challenge is what gets
//! a session flagged for harsher anti-automation treatment.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::Tab;

use crate::browser;

pub const CHALLENGE_FORM: &str = "form[action*='validateCaptcha']";
const CHALLENGE_IMAGE: &str = "form[action*='validateCaptcha'] img";
const ANSWER_INPUT: &str = "#captchacharacters";

const DETECT_TIMEOUT: Duration = Duration::from_secs(5);
const RECHECK_TIMEOUT: Duration = Duration::from_secs(2);
const SETTLE_MILLIS: u64 = 3000;

/// Turns a challenge image into the operator's typed answer. Swappable so
/// tests and unattended runs can fail the challenge without a terminal.
pub trait ChallengeSolver {
    fn solve(&self, image_png: &[u8]) -> Result<String>;
}

/// Saves the challenge image to disk and blocks on stdin for the answer.
pub struct TerminalSolver;

impl ChallengeSolver for TerminalSolver {
    fn solve(&self, image_png: &[u8]) -> Result<String> {
        std::fs::create_dir_all("debug")?;
        std::fs::write("debug/captcha.png", image_png)?;
        println!("🤖 Robot check! The challenge image was saved to debug/captcha.png");
        print!("Type the characters you see: ");
        std::io::stdout().flush()?;

        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        Ok(answer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaOutcome {
    NotPresent,
    Cleared,
    Unsolved,
}

/// Detect and clear a robot-check page. One attempt only.
pub async fn recover(tab: &Arc<Tab>, solver: &dyn ChallengeSolver) -> Result<CaptchaOutcome> {
    if browser::wait_for(tab, CHALLENGE_FORM, DETECT_TIMEOUT).is_none() {
        return Ok(CaptchaOutcome::NotPresent);
    }

    println!("🛑 Challenge page detected.");
    browser::save_debug_screenshot(tab, "wishlist_challenge");

    let png = browser::wait_for(tab, CHALLENGE_IMAGE, DETECT_TIMEOUT)
        .context("challenge page has no image to capture")?
        .capture_screenshot(Page::CaptureScreenshotFormatOption::Png)?;

    let answer = normalize_answer(&solver.solve(&png)?);

    // Focus the input the way a user would before typing.
    tab.evaluate(
        &format!(
            r#"
            const input = document.querySelector('{ANSWER_INPUT}');
            if (input) {{ input.click(); input.focus(); input.value = ''; }}
        "#
        ),
        false,
    )?;
    tab.type_str(&answer)?;
    tab.press_key("Enter")?;

    // Submission reloads the page when accepted; a rejected answer may just
    // re-render the form, so a failed navigation wait is not conclusive.
    let _ = tab.wait_until_navigated();
    tokio::time::sleep(browser::settle_with_jitter(SETTLE_MILLIS)).await;

    if browser::wait_for(tab, CHALLENGE_FORM, RECHECK_TIMEOUT).is_some() {
        eprintln!("❌ Challenge still present after submitting the answer.");
        return Ok(CaptchaOutcome::Unsolved);
    }

    println!("✅ Challenge cleared.");
    Ok(CaptchaOutcome::Cleared)
}

/// Amazon's checker is case-insensitive but the form expects upper-case.
fn normalize_answer(raw: &str) -> String {
    raw.trim().to_uppercase()
}
