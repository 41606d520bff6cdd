//! Product-link cleanup: canonical Amazon URLs and search-redirect unwrapping.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// An absolute http(s) URL with no embedded whitespace.
pub static ABSOLUTE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://\S+$").unwrap());

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("malformed product link '{0}'")]
    Malformed(String),
}

/// Canonicalize a product href into a stable Amazon URL.
///
/// Resolves relative hrefs against the wishlist's origin, strips the `psc`
/// and `ref_` tracking parameters and pins `th=1` so every link lands on the
/// same product-page variant. Normalizing an already-normalized URL is a
/// no-op.
pub fn normalize_product_url(href: &str, base: &str) -> Result<String, LinkError> {
    let base_url = Url::parse(base).map_err(|_| LinkError::Malformed(base.to_string()))?;
    let mut url = base_url
        .join(href.trim())
        .map_err(|_| LinkError::Malformed(href.to_string()))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "psc" && k != "ref_" && k != "th")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("th", "1");
    }

    Ok(url.to_string())
}

/// Resolve a search-engine redirect link to its true destination.
///
/// DuckDuckGo's html endpoint routes results through `/l/?uddg=<encoded>`;
/// anything else is returned verbatim.
pub fn unwrap_redirect(href: &str) -> String {
    if let Ok(url) = Url::parse(href) {
        let is_ddg = url.host_str().map_or(false, |h| h.ends_with("duckduckgo.com"));
        if is_ddg && url.path().starts_with("/l/") {
            for (k, v) in url.query_pairs() {
                if k == "uddg" && !v.trim().is_empty() {
                    return v.into_owned();
                }
            }
        }
    }
    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.amazon.com";

    #[test]
    fn strips_tracking_params_and_pins_variant() {
        let url = normalize_product_url("/dp/B000X?psc=1&ref_=lv_vv_lig_dp_it", BASE).unwrap();
        assert_eq!(url, "https://www.amazon.com/dp/B000X?th=1");
    }

    #[test]
    fn keeps_unrelated_params() {
        let url = normalize_product_url("/dp/B000X?smid=A1B2&psc=1", BASE).unwrap();
        assert_eq!(url, "https://www.amazon.com/dp/B000X?smid=A1B2&th=1");
    }

    #[test]
    fn normalizing_is_idempotent() {
        let once = normalize_product_url("/dp/B000X?psc=1&ref_=abc", BASE).unwrap();
        let twice = normalize_product_url(&once, BASE).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn th_appears_exactly_once() {
        let url = normalize_product_url("https://www.amazon.com/dp/B000X?th=2&th=1", BASE).unwrap();
        let parsed = Url::parse(&url).unwrap();
        let th_count = parsed.query_pairs().filter(|(k, _)| k == "th").count();
        assert_eq!(th_count, 1);
        assert!(parsed.query_pairs().any(|(k, v)| k == "th" && v == "1"));
    }

    #[test]
    fn absolute_links_resolve_without_base_rewrite() {
        let url = normalize_product_url("https://www.amazon.de/dp/B000X", BASE).unwrap();
        assert_eq!(url, "https://www.amazon.de/dp/B000X?th=1");
    }

    #[test]
    fn unparseable_href_is_malformed() {
        let err = normalize_product_url("http://[not-a-host/dp/B000X", BASE).unwrap_err();
        assert!(matches!(err, LinkError::Malformed(_)));
    }

    #[test]
    fn unwraps_ddg_redirect() {
        let wrapped = "https://duckduckgo.com/l/?uddg=https%3A%2F%2Fmaker.example%2Flamp&rut=abc123";
        assert_eq!(unwrap_redirect(wrapped), "https://maker.example/lamp");
    }

    #[test]
    fn plain_hrefs_pass_through() {
        assert_eq!(unwrap_redirect("https://maker.example/lamp"), "https://maker.example/lamp");
        // uddg on a foreign host is not a redirect we know how to unwrap
        let foreign = "https://example.com/l/?uddg=https%3A%2F%2Fother.example";
        assert_eq!(unwrap_redirect(foreign), foreign);
    }

    #[test]
    fn absolute_url_pattern_rejects_whitespace() {
        assert!(ABSOLUTE_URL_RE.is_match("https://maker.example/lamp"));
        assert!(!ABSOLUTE_URL_RE.is_match("a lamp I saw at https://maker.example"));
        assert!(!ABSOLUTE_URL_RE.is_match("Desk Lamp"));
    }
}
