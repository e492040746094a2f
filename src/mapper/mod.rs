pub mod keywords;
pub mod table;

use crate::scryfall::Card;

/// Fully mapped destination property bag for one card. Field set matches the
/// Notion database schema exactly; optional image fields are omitted (None)
/// rather than emptied so an update never clears an existing image.
#[derive(Debug, Clone, PartialEq)]
pub struct CardProperties {
    pub name: String,
    pub card_types: Vec<String>,
    pub mana_cost: String,
    pub set_name: String,
    pub rarity: String,
    pub oracle_text: String,
    pub flavor_text: String,
    pub power: String,
    pub toughness: String,
    pub power_toughness: String,
    pub loyalty: String,
    pub legalities: Vec<String>,
    pub artist: String,
    pub keywords: Vec<&'static str>,
    pub scryfall_id: String,
    pub illustration: Option<Illustration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Illustration {
    pub name: String,
    pub url: String,
}

/// Map one card into the destination schema. Total over any well-formed card:
/// missing optional fields degrade to empty strings or omitted properties.
pub fn map_card(card: &Card) -> CardProperties {
    let power_toughness = if is_numeric(&card.power) && is_numeric(&card.toughness) {
        format!("{}/{}", card.power, card.toughness)
    } else {
        String::new()
    };
    let loyalty = if is_numeric(&card.loyalty) {
        card.loyalty.clone()
    } else {
        String::new()
    };

    let illustration = card
        .image_uris
        .as_ref()
        .and_then(|uris| uris.png.as_ref())
        .map(|png| Illustration {
            name: card.name.clone(),
            url: png.clone(),
        });

    CardProperties {
        name: card.name.clone(),
        card_types: split_type_line(&card.type_line),
        mana_cost: card.mana_cost.clone(),
        // Notion multi-select option names cannot contain commas.
        set_name: card.set_name.replace(',', " "),
        rarity: capitalize(&card.rarity),
        oracle_text: card.oracle_text.clone(),
        flavor_text: card.flavor_text.clone(),
        power: card.power.clone(),
        toughness: card.toughness.clone(),
        power_toughness,
        loyalty,
        legalities: format_legalities(card),
        artist: card.artist.clone(),
        keywords: keywords::extract(&card.oracle_text),
        scryfall_id: card.id.clone(),
        illustration,
    }
}

/// `"{format}: {status}"` tags for every format not marked `not_legal`.
/// Absence of a tag means not legal, which is distinct from unknown.
fn format_legalities(card: &Card) -> Vec<String> {
    card.legalities
        .iter()
        .filter_map(|(format, status)| {
            let status = status.as_str().unwrap_or_default();
            if status == "not_legal" {
                None
            } else {
                Some(format!("{}: {}", format, status))
            }
        })
        .collect()
}

/// Distinct sub-types of a compound type line ("Instant // Sorcery").
fn split_type_line(type_line: &str) -> Vec<String> {
    type_line.split(" // ").map(str::to_string).collect()
}

/// Digits with at most one decimal point. Rejects empty strings and symbolic
/// values like "*" or "1+*".
fn is_numeric(s: &str) -> bool {
    let digits = s.replacen('.', "", 1);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scryfall::ImageUris;
    use serde_json::json;

    #[test]
    fn legalities_exclude_not_legal() {
        let mut card = Card::default();
        card.legalities
            .insert("standard".into(), json!("legal"));
        card.legalities
            .insert("modern".into(), json!("not_legal"));
        card.legalities
            .insert("legacy".into(), json!("banned"));
        let props = map_card(&card);
        assert_eq!(
            props.legalities,
            vec!["standard: legal".to_string(), "legacy: banned".to_string()]
        );
    }

    #[test]
    fn combined_power_toughness_when_both_numeric() {
        let card = Card {
            power: "3".into(),
            toughness: "4".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&card).power_toughness, "3/4");
    }

    #[test]
    fn combined_field_empty_for_symbolic_power() {
        let card = Card {
            power: "*".into(),
            toughness: "4".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&card).power_toughness, "");
    }

    #[test]
    fn decimal_power_counts_as_numeric() {
        let card = Card {
            power: "3.5".into(),
            toughness: "4".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&card).power_toughness, "3.5/4");
    }

    #[test]
    fn loyalty_kept_only_when_numeric() {
        let numeric = Card {
            loyalty: "4".into(),
            ..Card::default()
        };
        let symbolic = Card {
            loyalty: "X".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&numeric).loyalty, "4");
        assert_eq!(map_card(&symbolic).loyalty, "");
    }

    #[test]
    fn compound_type_line_splits() {
        let card = Card {
            type_line: "Instant // Sorcery".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&card).card_types, vec!["Instant", "Sorcery"]);
    }

    #[test]
    fn rarity_capitalized() {
        let card = Card {
            rarity: "mythic".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&card).rarity, "Mythic");
    }

    #[test]
    fn set_name_commas_replaced() {
        let card = Card {
            set_name: "Throne, of Eldraine".into(),
            ..Card::default()
        };
        assert_eq!(map_card(&card).set_name, "Throne  of Eldraine");
    }

    #[test]
    fn illustration_requires_png() {
        let with_png = Card {
            name: "Opt".into(),
            image_uris: Some(ImageUris {
                png: Some("https://img.example/opt.png".into()),
                small: None,
            }),
            ..Card::default()
        };
        let without = Card {
            image_uris: Some(ImageUris {
                png: None,
                small: Some("https://img.example/opt-small.jpg".into()),
            }),
            ..Card::default()
        };
        assert_eq!(
            map_card(&with_png).illustration,
            Some(Illustration {
                name: "Opt".into(),
                url: "https://img.example/opt.png".into()
            })
        );
        assert_eq!(map_card(&without).illustration, None);
        assert_eq!(map_card(&Card::default()).illustration, None);
    }

    #[test]
    fn mapping_is_total_over_empty_card() {
        let props = map_card(&Card::default());
        assert_eq!(props.name, "");
        assert_eq!(props.power_toughness, "");
        assert!(props.legalities.is_empty());
        assert!(props.keywords.is_empty());
    }
}
