use serde_json::Value;
use url::Url;

use crate::scryfall::Card;

/// One row of the per-card attributes table: raw key on the left, display
/// text on the right, hyperlinked when the text is an absolute URL.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub key: String,
    pub text: String,
    pub link: Option<String>,
}

/// Merge the card's auxiliary sections into one ordered row list.
///
/// Later sections override earlier ones on key collision (preview < prices <
/// related_uris < purchase_uris), and an overridden key moves to the position
/// of its last write so row order is deterministic.
pub fn build_rows(card: &Card) -> Vec<TableRow> {
    let mut merged: Vec<(String, Value)> = Vec::new();
    for section in [
        &card.preview,
        &card.prices,
        &card.related_uris,
        &card.purchase_uris,
    ] {
        for (key, value) in section {
            merged.retain(|(k, _)| k != key);
            merged.push((key.clone(), value.clone()));
        }
    }

    merged
        .into_iter()
        .map(|(key, value)| {
            let text = value_text(&value);
            let link = as_absolute_url(&text);
            TableRow { key, text, link }
        })
        .collect()
}

/// Display form of a heterogeneous section value. Strings come through
/// unquoted; numbers, booleans and nulls use their JSON text form.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Some(text) when the text parses as an absolute URL with a host.
fn as_absolute_url(text: &str) -> Option<String> {
    let parsed = Url::parse(text).ok()?;
    if parsed.has_host() {
        Some(text.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn section(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn card_with_sections(
        preview: Map<String, Value>,
        prices: Map<String, Value>,
        related: Map<String, Value>,
        purchase: Map<String, Value>,
    ) -> Card {
        Card {
            preview,
            prices,
            related_uris: related,
            purchase_uris: purchase,
            ..Card::default()
        }
    }

    #[test]
    fn later_section_overrides_and_moves_to_end() {
        let card = card_with_sections(
            section(&[("source", json!("mothership")), ("usd", json!("0.10"))]),
            section(&[("usd", json!("1.25")), ("eur", json!("0.99"))]),
            Map::new(),
            Map::new(),
        );
        let rows = build_rows(&card);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["source", "usd", "eur"]);
        assert_eq!(rows[1].text, "1.25");
    }

    #[test]
    fn urls_become_links() {
        let card = card_with_sections(
            Map::new(),
            Map::new(),
            section(&[("gatherer", json!("https://gatherer.wizards.com/x"))]),
            Map::new(),
        );
        let rows = build_rows(&card);
        assert_eq!(
            rows[0].link.as_deref(),
            Some("https://gatherer.wizards.com/x")
        );
    }

    #[test]
    fn plain_text_has_no_link() {
        let card = card_with_sections(
            section(&[("source", json!("scryfall preview"))]),
            Map::new(),
            Map::new(),
            Map::new(),
        );
        assert_eq!(build_rows(&card)[0].link, None);
    }

    #[test]
    fn numbers_and_bools_are_stringified() {
        let card = card_with_sections(
            section(&[("previewed_at", json!(20230401)), ("foil", json!(true))]),
            Map::new(),
            Map::new(),
            Map::new(),
        );
        let rows = build_rows(&card);
        assert_eq!(rows[0].text, "20230401");
        assert_eq!(rows[1].text, "true");
        assert!(rows.iter().all(|r| r.link.is_none()));
    }

    #[test]
    fn scheme_without_host_is_not_a_link() {
        let card = card_with_sections(
            section(&[("note", json!("mailto:someone"))]),
            Map::new(),
            Map::new(),
            Map::new(),
        );
        assert_eq!(build_rows(&card)[0].link, None);
    }

    #[test]
    fn empty_sections_yield_no_rows() {
        let card = Card::default();
        assert!(build_rows(&card).is_empty());
    }
}
