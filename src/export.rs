//! CSV encoding and output-file naming.

use std::path::PathBuf;

use anyhow::Result;
use csv::Writer;

use crate::extract::WishlistItem;

const SCALAR_HEADERS: [&str; 4] = ["Item Name", "Manufacturer", "Product Link", "Non-Amazon Link"];
const NAME_FILLER: char = '_';
const FALLBACK_BASENAME: &str = "wishlist";

/// Encode a batch of items as a CSV document.
///
/// The header carries one `Option N` column per slot of the widest option
/// list in the batch; shorter items pad with empty fields. Item and option
/// order is preserved exactly, so the same batch always encodes to the same
/// bytes.
pub fn encode_csv(items: &[WishlistItem]) -> Result<String> {
    let max_options = items.iter().map(|item| item.options.len()).max().unwrap_or(0);

    let mut writer = Writer::from_writer(Vec::new());

    let mut header: Vec<String> = SCALAR_HEADERS.iter().map(|h| h.to_string()).collect();
    for n in 1..=max_options {
        header.push(format!("Option {}", n));
    }
    writer.write_record(&header)?;

    for item in items {
        let mut row = vec![
            item.name.clone(),
            item.manufacturer.clone(),
            item.product_link.clone(),
            item.external_link.clone(),
        ];
        for slot in 0..max_options {
            row.push(item.options.get(slot).cloned().unwrap_or_default());
        }
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing csv buffer: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

/// Reduce a list name to a filesystem-safe token: runs of non-alphanumeric
/// characters collapse into one filler character.
pub fn sanitize_list_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_filler = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_was_filler = false;
        } else if !last_was_filler {
            out.push(NAME_FILLER);
            last_was_filler = true;
        }
    }
    let trimmed = out.trim_matches(NAME_FILLER);
    if trimmed.is_empty() {
        FALLBACK_BASENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write one wishlist's CSV into the working directory.
pub fn write_batch(list_name: &str, items: &[WishlistItem]) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}.csv", sanitize_list_name(list_name)));
    std::fs::write(&path, encode_csv(items)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, options: &[&str]) -> WishlistItem {
        WishlistItem {
            name: name.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn commas_in_fields_are_quoted() {
        let csv = encode_csv(&[item("Mug, Blue", &[])]).unwrap();
        let body = csv.lines().nth(1).unwrap();
        assert_eq!(body, r#""Mug, Blue",,,"#);
    }

    #[test]
    fn quotes_are_doubled() {
        let csv = encode_csv(&[item(r#"He said "hi""#, &[])]).unwrap();
        let body = csv.lines().nth(1).unwrap();
        assert_eq!(body, r#""He said ""hi""",,,"#);
    }

    #[test]
    fn header_width_matches_widest_item_and_short_rows_pad() {
        let batch = [item("A", &["S"]), item("B", &["M", "Red", "Left"])];
        let csv = encode_csv(&batch).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Item Name,Manufacturer,Product Link,Non-Amazon Link,Option 1,Option 2,Option 3"
        );
        assert_eq!(lines.next().unwrap(), "A,,,,S,,");
        assert_eq!(lines.next().unwrap(), "B,,,,M,Red,Left");
    }

    #[test]
    fn empty_batch_still_emits_the_scalar_header() {
        let csv = encode_csv(&[]).unwrap();
        assert_eq!(csv.trim_end(), "Item Name,Manufacturer,Product Link,Non-Amazon Link");
    }

    #[test]
    fn encoding_is_deterministic() {
        let batch = [item("A", &["S", "M"]), item("B", &[])];
        assert_eq!(encode_csv(&batch).unwrap(), encode_csv(&batch).unwrap());
    }

    #[test]
    fn list_names_become_filesystem_safe() {
        assert_eq!(sanitize_list_name("Kitchen Upgrades"), "Kitchen_Upgrades");
        assert_eq!(sanitize_list_name("gifts!!! (2024)"), "gifts_2024");
        assert_eq!(sanitize_list_name("---"), "wishlist");
        assert_eq!(sanitize_list_name(""), "wishlist");
    }
}
