//! Wishlist item extraction from the rendered page HTML.
//!
//! Amazon renders two structurally different kinds of entries: catalog items
//! (a product anchor plus byline and variant spans) and "non-catalog" items
//! the owner typed in by hand, which carry a marker attribute and a single
//! text node that is either a free-form name or a pasted URL.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::links::{self, ABSOLUTE_URL_RE};

/// One wishlist entry.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct WishlistItem {
    pub name: String,
    pub manufacturer: String,
    /// Selected variant attributes (size, color, ...) in document order.
    pub options: Vec<String>,
    pub product_link: String,
    pub external_link: String,
}

impl WishlistItem {
    /// Decorative nodes match the item selector too; keep an entry only if
    /// it carries at least one identifying field.
    pub fn is_usable(&self) -> bool {
        !self.name.is_empty() || !self.product_link.is_empty() || !self.external_link.is_empty()
    }
}

const ITEM_SELECTOR: &str = "li[data-itemid]";
const NON_CATALOG_MARKER: &str = "data-non-catalog-item";
const NAME_ANCHOR: &str = "a[id^='itemName']";
const NAME_SPAN: &str = "span[id^='itemName']";
const BYLINE_SPAN: &str = "span[id^='item-byline']";
const OPTION_SPANS: &str = "span[id^='twisterText']";
const LIST_NAME: &str = "#profile-list-name";

/// Extract every usable wishlist entry from the page, in DOM order.
pub fn extract_items(html: &str, base: &str) -> Vec<WishlistItem> {
    let document = Html::parse_document(html);
    let item_sel = Selector::parse(ITEM_SELECTOR).unwrap();
    document
        .select(&item_sel)
        .filter_map(|node| extract_item(node, base))
        .collect()
}

/// Classify one item node and pull its fields; `None` for noise nodes.
pub fn extract_item(node: ElementRef, base: &str) -> Option<WishlistItem> {
    let item = if node.value().attr(NON_CATALOG_MARKER).is_some() {
        extract_non_catalog(node)
    } else {
        extract_catalog(node, base)
    };
    item.is_usable().then_some(item)
}

fn extract_non_catalog(node: ElementRef) -> WishlistItem {
    let span_sel = Selector::parse(NAME_SPAN).unwrap();
    let text = node
        .select(&span_sel)
        .next()
        .map(|el| collapse_ws(&el.text().collect::<String>()))
        .unwrap_or_default();

    let mut item = WishlistItem::default();
    if ABSOLUTE_URL_RE.is_match(&text) {
        item.external_link = text;
    } else {
        item.name = text;
    }
    item
}

fn extract_catalog(node: ElementRef, base: &str) -> WishlistItem {
    let anchor_sel = Selector::parse(NAME_ANCHOR).unwrap();
    let byline_sel = Selector::parse(BYLINE_SPAN).unwrap();
    let option_sel = Selector::parse(OPTION_SPANS).unwrap();

    let mut item = WishlistItem::default();

    if let Some(anchor) = node.select(&anchor_sel).next() {
        item.name = collapse_ws(&anchor.text().collect::<String>());
        if let Some(href) = anchor.value().attr("href") {
            match links::normalize_product_url(href, base) {
                Ok(url) => item.product_link = url,
                Err(e) => eprintln!("⚠️ Skipping product link for '{}': {}", item.name, e),
            }
        }
    }

    item.manufacturer = node
        .select(&byline_sel)
        .next()
        .map(|el| collapse_ws(&el.text().collect::<String>()))
        .map(|byline| byline.strip_prefix("by ").map(str::to_string).unwrap_or(byline))
        .unwrap_or_default();

    item.options = node
        .select(&option_sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    item
}

/// The wishlist's display name, if the page rendered one.
pub fn extract_list_name(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = Selector::parse(LIST_NAME).unwrap();
    document
        .select(&sel)
        .next()
        .map(|el| collapse_ws(&el.text().collect::<String>()))
        .filter(|name| !name.is_empty())
}

fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.amazon.com";

    fn items_from(html: &str) -> Vec<WishlistItem> {
        extract_items(html, BASE)
    }

    #[test]
    fn catalog_item_pulls_all_fields() {
        let html = r#"
            <li data-itemid="I1">
              <a id="itemName_I1" href="/dp/B0TEST?psc=1">Cast Iron Skillet</a>
              <span id="item-byline-I1">by Lodge</span>
              <span id="twisterText_I1_size">10 Inch</span>
              <span id="twisterText_I1_color">  Black  </span>
            </li>"#;
        let items = items_from(html);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.name, "Cast Iron Skillet");
        assert_eq!(item.manufacturer, "Lodge");
        assert_eq!(item.product_link, "https://www.amazon.com/dp/B0TEST?th=1");
        assert_eq!(item.options, vec!["10 Inch", "Black"]);
        assert!(item.external_link.is_empty());
    }

    #[test]
    fn non_catalog_url_text_becomes_external_link() {
        let html = r#"
            <li data-itemid="I2" data-non-catalog-item="">
              <span id="itemName_I2">https://maker.example/lamp</span>
            </li>"#;
        let items = items_from(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].external_link, "https://maker.example/lamp");
        assert!(items[0].name.is_empty());
        assert!(items[0].product_link.is_empty());
    }

    #[test]
    fn non_catalog_plain_text_becomes_name() {
        let html = r#"
            <li data-itemid="I3" data-non-catalog-item="">
              <span id="itemName_I3">that lamp from the market</span>
            </li>"#;
        let items = items_from(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "that lamp from the market");
        assert!(items[0].external_link.is_empty());
    }

    #[test]
    fn empty_nodes_are_dropped_as_noise() {
        let html = r#"
            <li data-itemid="I4"><div class="a-spacing-base"></div></li>
            <li data-itemid="I5" data-non-catalog-item=""><span id="itemName_I5">  </span></li>"#;
        assert!(items_from(html).is_empty());
    }

    #[test]
    fn malformed_href_keeps_the_item_without_a_link() {
        let html = r#"
            <li data-itemid="I6">
              <a id="itemName_I6" href="http://[bad/dp/B0TEST">Mystery Gadget</a>
            </li>"#;
        let items = items_from(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Mystery Gadget");
        assert!(items[0].product_link.is_empty());
    }

    #[test]
    fn missing_byline_and_options_are_just_empty() {
        let html = r#"
            <li data-itemid="I7">
              <a id="itemName_I7" href="/dp/B0TEST">Plain Item</a>
              <span id="twisterText_I7"> </span>
            </li>"#;
        let items = items_from(html);
        assert_eq!(items[0].manufacturer, "");
        assert!(items[0].options.is_empty());
    }

    #[test]
    fn list_name_is_trimmed_and_collapsed() {
        let html = r#"<span id="profile-list-name">  Kitchen
            Upgrades </span>"#;
        assert_eq!(extract_list_name(html).unwrap(), "Kitchen Upgrades");
        assert_eq!(extract_list_name("<div></div>"), None);
        assert_eq!(extract_list_name(r#"<span id="profile-list-name">  </span>"#), None);
    }
}
