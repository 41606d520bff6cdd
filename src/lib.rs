//! Amazon wishlist → CSV exporter.
//!
//! Drives one Headless Chrome page through each wishlist URL: recover from a
//! robot check with the operator's help, scroll the lazy-loaded list to its
//! end, extract every entry, resolve missing non-Amazon links through a
//! search engine, and write one CSV per list.

pub mod browser;
pub mod captcha;
pub mod export;
pub mod extract;
pub mod links;
pub mod pipeline;
pub mod scroll;
pub mod search;
