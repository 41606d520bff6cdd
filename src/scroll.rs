//! Scroll-completion detection for the lazy-loaded wishlist.
//!
//! The list only renders more entries as the viewport reaches the bottom,
//! and the end-of-list marker can flicker during reflows, so "done" means
//! the marker stayed visible for a sustained stretch, not that it was seen
//! once.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::Tab;

use crate::browser;

pub const END_OF_LIST_SELECTOR: &str = "#endOfListMarker";
pub const SCROLL_ATTEMPT_BUDGET: u32 = 30;
pub const SENTINEL_STABLE_FOR: Duration = Duration::from_secs(10);

const SETTLE_MILLIS: u64 = 2000;
const STABILIZE_POLL_MILLIS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Scrolling,
    SentinelSeen,
    Stabilizing,
    Done { complete: bool },
}

/// Progress of one infinite-scroll pass, fed with visibility observations.
#[derive(Debug)]
pub struct ScrollTracker {
    state: ScrollState,
    attempts: u32,
    visible_for: Duration,
}

impl ScrollTracker {
    pub fn new() -> Self {
        Self {
            state: ScrollState::Scrolling,
            attempts: 0,
            visible_for: Duration::ZERO,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Feed one observation: whether the sentinel is visible right now, and
    /// how long it has been since the previous observation.
    pub fn observe(&mut self, sentinel_visible: bool, elapsed: Duration) -> ScrollState {
        self.state = match self.state {
            ScrollState::Scrolling => {
                self.attempts += 1;
                if sentinel_visible {
                    self.visible_for = Duration::ZERO;
                    ScrollState::SentinelSeen
                } else if self.attempts >= SCROLL_ATTEMPT_BUDGET {
                    ScrollState::Done { complete: false }
                } else {
                    ScrollState::Scrolling
                }
            }
            ScrollState::SentinelSeen | ScrollState::Stabilizing => {
                if sentinel_visible {
                    self.visible_for += elapsed;
                    if self.visible_for >= SENTINEL_STABLE_FOR {
                        ScrollState::Done { complete: true }
                    } else {
                        ScrollState::Stabilizing
                    }
                } else {
                    // a reflow hid the marker; the visible stretch starts over
                    self.visible_for = Duration::ZERO;
                    ScrollState::Stabilizing
                }
            }
            done @ ScrollState::Done { .. } => done,
        };
        self.state
    }
}

impl Default for ScrollTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scroll the page until the end-of-list marker holds steady or the attempt
/// budget runs out. Returns whether the list finished loading; the caller
/// extracts whatever is rendered either way.
pub async fn scroll_to_end(tab: &Arc<Tab>) -> Result<bool> {
    println!("📜 Scrolling to load the full list...");
    let mut tracker = ScrollTracker::new();

    loop {
        match tracker.state() {
            ScrollState::Done { complete } => {
                if complete {
                    println!(
                        "✅ End-of-list marker held steady after {} scroll attempts.",
                        tracker.attempts()
                    );
                } else {
                    eprintln!(
                        "⚠️ Scroll budget ({}) exhausted without a stable end-of-list marker; extracting what rendered.",
                        SCROLL_ATTEMPT_BUDGET
                    );
                }
                return Ok(complete);
            }
            ScrollState::Scrolling => {
                tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)?;
                let settle = browser::settle_with_jitter(SETTLE_MILLIS);
                tokio::time::sleep(settle).await;
                let visible = browser::is_visible(tab, END_OF_LIST_SELECTOR)?;
                tracker.observe(visible, settle);
            }
            ScrollState::SentinelSeen | ScrollState::Stabilizing => {
                let poll = Duration::from_millis(STABILIZE_POLL_MILLIS);
                tokio::time::sleep(poll).await;
                let visible = browser::is_visible(tab, END_OF_LIST_SELECTOR)?;
                tracker.observe(visible, poll);
            }
        }
    }
}
