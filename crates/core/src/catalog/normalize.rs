//! Mapping of catalog elements onto [`GameRecord`] values.

use tracing::{debug, warn};

use super::payload::Element;
use crate::models::{
    GameRecord, DEFAULT_PLAYERS, DEFAULT_PLAYTIME, NOT_AVAILABLE, UNKNOWN_NAME,
};

const PRIMARY_NAME: &str = "primary";

/// Kind of a `<link>` tag attached to a detailed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// `boardgamecategory`
    Category,
    /// `boardgamemechanic`
    Mechanic,
}

impl LinkKind {
    /// Map a link `type` discriminator; other link types are ignored.
    pub fn from_discriminator(value: &str) -> Option<Self> {
        match value {
            "boardgamecategory" => Some(Self::Category),
            "boardgamemechanic" => Some(Self::Mechanic),
            _ => None,
        }
    }
}

/// Convert a search response into partial records.
pub fn search_results(root: &Element) -> Vec<GameRecord> {
    items(root)
        .filter_map(|item| {
            let id = item_id(item)?;
            let name = item
                .child_value("name")
                .unwrap_or(UNKNOWN_NAME)
                .to_string();
            let mut record = GameRecord::partial(id, name);
            record.yearpublished = value_or(item, "yearpublished", NOT_AVAILABLE);
            Some(record)
        })
        .collect()
}

/// Convert a detail response into hydrated records.
pub fn detail_results(root: &Element) -> Vec<GameRecord> {
    items(root)
        .filter_map(|item| {
            let id = item_id(item)?;
            let mut record = GameRecord::partial(id, primary_name(item));
            record.yearpublished = value_or(item, "yearpublished", NOT_AVAILABLE);
            record.minplayers = value_or(item, "minplayers", DEFAULT_PLAYERS);
            record.maxplayers = value_or(item, "maxplayers", DEFAULT_PLAYERS);
            record.minplaytime = value_or(item, "minplaytime", DEFAULT_PLAYTIME);
            record.maxplaytime = value_or(item, "maxplaytime", DEFAULT_PLAYTIME);
            record.thumbnail = child_text(item, "thumbnail");
            record.image = child_text(item, "image");
            record.description = Some(child_text(item, "description").unwrap_or_default());
            record.rating = Some(average_rating(item));

            for link in item.children_named("link") {
                let Some(kind) = link.attribute("type").and_then(LinkKind::from_discriminator)
                else {
                    continue;
                };
                let Some(value) = link.attribute("value") else {
                    continue;
                };
                match kind {
                    LinkKind::Category => record.categories.push(value.to_string()),
                    LinkKind::Mechanic => record.mechanics.push(value.to_string()),
                }
            }

            debug!(
                id = %record.id,
                name = %record.name,
                categories = record.categories.len(),
                mechanics = record.mechanics.len(),
                "Normalized detail item"
            );
            Some(record)
        })
        .collect()
}

/// Primary localized name, else the first variant, else `Unknown`.
pub fn primary_name(item: &Element) -> String {
    let names: Vec<&Element> = item.children_named("name").collect();
    names
        .iter()
        .find(|name| name.attribute("type") == Some(PRIMARY_NAME))
        .or_else(|| names.first())
        .and_then(|name| name.attribute("value"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}

/// First average rating found under the item's statistics.
pub fn average_rating(item: &Element) -> String {
    item.child("statistics")
        .and_then(|stats| stats.descendant("average"))
        .or_else(|| item.descendant("average"))
        .and_then(|average| average.attribute("value"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

fn items(root: &Element) -> impl Iterator<Item = &Element> + '_ {
    root.children_named("item")
}

fn item_id(item: &Element) -> Option<String> {
    match item.attribute("id").map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => Some(id.to_string()),
        None => {
            warn!("Skipping catalog item without an id");
            None
        }
    }
}

fn value_or(item: &Element, tag: &str, fallback: &str) -> String {
    item.child_value(tag).unwrap_or(fallback).to_string()
}

fn child_text(item: &Element, tag: &str) -> Option<String> {
    item.child(tag)
        .and_then(Element::text)
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::payload::{parse_document, parse_xml};
    use pretty_assertions::assert_eq;

    const SEARCH_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items total="3" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <item type="boardgame" id="169786">
    <name type="primary" value="Scythe"/>
    <yearpublished value="2016" />
  </item>
  <item type="boardgame" id="1">
    <name type="alternate" value="Scytheworks"/>
  </item>
  <item type="boardgame">
    <name type="primary" value="No Id"/>
  </item>
</items>"#;

    const THING_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<items termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
  <item type="boardgame" id="169786">
    <thumbnail>https://cf.geekdo-images.com/thumb.jpg</thumbnail>
    <image>https://cf.geekdo-images.com/full.jpg</image>
    <name type="alternate" sortindex="1" value="Сайт" />
    <name type="primary" sortindex="1" value="Scythe" />
    <description>Five factions vie for control.</description>
    <yearpublished value="2016" />
    <minplayers value="1" />
    <maxplayers value="5" />
    <minplaytime value="90" />
    <maxplaytime value="115" />
    <link type="boardgamecategory" id="1021" value="Economic" />
    <link type="boardgamemechanic" id="2002" value="Tile Placement" />
    <link type="boardgamedesigner" id="62640" value="Jamey Stegmaier" />
    <link type="boardgamecategory" id="1086" value="Territory Building" />
    <statistics page="1">
      <ratings>
        <usersrated value="80000" />
        <average value="8.08" />
        <bayesaverage value="7.9" />
      </ratings>
    </statistics>
  </item>
  <item type="boardgame" id="2">
    <name type="alternate" value="Only Alternate" />
    <name type="alternate" value="Second Alternate" />
  </item>
</items>"#;

    #[test]
    fn search_items_default_missing_fields() {
        let root = parse_xml(SEARCH_XML).unwrap();
        let results = search_results(&root);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "169786");
        assert_eq!(results[0].name, "Scythe");
        assert_eq!(results[0].yearpublished, "2016");
        assert_eq!(results[1].name, "Scytheworks");
        assert_eq!(results[1].yearpublished, "N/A");
        assert!(!results[0].is_hydrated());
    }

    #[test]
    fn details_pick_primary_name_rating_and_links() {
        let root = parse_xml(THING_XML).unwrap();
        let results = detail_results(&root);
        assert_eq!(results.len(), 2);

        let scythe = &results[0];
        assert_eq!(scythe.name, "Scythe");
        assert_eq!(scythe.rating.as_deref(), Some("8.08"));
        assert_eq!(scythe.maxplayers, "5");
        assert_eq!(scythe.minplaytime, "90");
        assert_eq!(
            scythe.thumbnail.as_deref(),
            Some("https://cf.geekdo-images.com/thumb.jpg")
        );
        assert_eq!(scythe.categories, vec!["Economic", "Territory Building"]);
        assert_eq!(scythe.mechanics, vec!["Tile Placement"]);
        assert_eq!(
            scythe.description.as_deref(),
            Some("Five factions vie for control.")
        );

        let bare = &results[1];
        assert_eq!(bare.name, "Only Alternate");
        assert_eq!(bare.rating.as_deref(), Some("N/A"));
        assert_eq!(bare.yearpublished, "N/A");
        assert_eq!(bare.minplayers, "1");
        assert_eq!(bare.maxplayers, "1");
        assert_eq!(bare.maxplaytime, "0");
        assert!(bare.categories.is_empty());
        assert!(bare.is_hydrated());
    }

    #[test]
    fn json_details_normalize_like_xml() {
        let root = parse_document(
            r#"{"items": {"item": [{
                "$": {"type": "boardgame", "id": "169786"},
                "name": [
                    {"$": {"type": "alternate", "value": "Сайт"}},
                    {"$": {"type": "primary", "value": "Scythe"}}
                ],
                "yearpublished": [{"$": {"value": "2016"}}],
                "maxplayers": [{"$": {"value": "5"}}],
                "link": [
                    {"$": {"type": "boardgamemechanic", "value": "Tile Placement"}},
                    {"$": {"type": "boardgamecategory", "value": "Economic"}}
                ],
                "statistics": [{"ratings": [{"average": [{"$": {"value": "8.08"}}]}]}]
            }]}}"#,
        )
        .unwrap();
        let results = detail_results(&root);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Scythe");
        assert_eq!(results[0].yearpublished, "2016");
        assert_eq!(results[0].maxplayers, "5");
        assert_eq!(results[0].rating.as_deref(), Some("8.08"));
        assert_eq!(results[0].categories, vec!["Economic"]);
        assert_eq!(results[0].mechanics, vec!["Tile Placement"]);
    }

    #[test]
    fn missing_names_fall_back_to_unknown() {
        let root = parse_xml(r#"<items><item id="9"/></items>"#).unwrap();
        assert_eq!(search_results(&root)[0].name, "Unknown");
        assert_eq!(detail_results(&root)[0].name, "Unknown");
    }

    #[test]
    fn unknown_link_types_are_ignored() {
        assert_eq!(
            LinkKind::from_discriminator("boardgamecategory"),
            Some(LinkKind::Category)
        );
        assert_eq!(LinkKind::from_discriminator("boardgamepublisher"), None);
    }
}
