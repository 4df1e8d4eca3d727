//! Format-independent view of a catalog response.
//!
//! The XML API answers with attribute-heavy XML; proxies and cached exports
//! hand out the same document converted to JSON in the xml2js layout
//! (attributes under `"$"`, text under `"_"`, children as arrays). Both are
//! lowered into [`Element`] trees so normalization only has one shape to
//! handle.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{CatalogError, Result};

const ATTRIBUTES_KEY: &str = "$";
const TEXT_KEY: &str = "_";

/// A single element with its attributes, text content and child elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) attributes: HashMap<String, String>,
    pub(crate) text: Option<String>,
    pub(crate) children: Vec<Element>,
}

impl Element {
    fn named(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Tag name of the element.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Direct children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// First descendant (depth-first, document order) with the given tag.
    pub fn descendant(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| {
            if child.tag == tag {
                Some(child)
            } else {
                child.descendant(tag)
            }
        })
    }

    /// `value` attribute of the first child named `tag`.
    pub fn child_value(&self, tag: &str) -> Option<&str> {
        self.child(tag)
            .and_then(|child| child.attribute("value"))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Decode a raw response body, sniffing XML versus JSON from its first byte.
pub fn parse_document(body: &str) -> Result<Element> {
    match body.trim_start().chars().next() {
        Some('<') => parse_xml(body),
        Some('{') | Some('[') => parse_json(body),
        Some(other) => Err(CatalogError::Network(format!(
            "unrecognised response payload starting with {other:?}"
        ))),
        None => Err(CatalogError::Network("empty response payload".to_string())),
    }
}

/// Parse an XML document into an element tree rooted at its root element.
pub fn parse_xml(body: &str) -> Result<Element> {
    let doc = roxmltree::Document::parse(body)?;
    Ok(lower_xml(doc.root_element()))
}

fn lower_xml(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::named(node.tag_name().name());
    for attribute in node.attributes() {
        element
            .attributes
            .insert(attribute.name().to_string(), attribute.value().to_string());
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            element.children.push(lower_xml(child));
        } else if child.is_text() {
            if let Some(value) = child.text() {
                text.push_str(value);
            }
        }
    }
    if !text.trim().is_empty() {
        element.text = Some(text);
    }
    element
}

/// Parse an xml2js-style JSON document.
///
/// A top-level object with a single key is unwrapped into that element
/// (`{"items": {...}}` yields an `items` root). Anything else becomes an
/// anonymous root holding the converted members.
pub fn parse_json(body: &str) -> Result<Element> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| CatalogError::Network(format!("failed to parse JSON response: {err}")))?;

    if let Value::Object(map) = &value {
        if map.len() == 1 {
            if let Some((tag, inner)) = map.iter().next() {
                if tag != ATTRIBUTES_KEY && tag != TEXT_KEY {
                    let mut lowered = lower_json(tag, inner);
                    if lowered.len() == 1 {
                        return Ok(lowered.remove(0));
                    }
                    let mut root = Element::named("");
                    root.children = lowered;
                    return Ok(root);
                }
            }
        }
    }

    let mut root = Element::named("");
    match &value {
        Value::Object(_) => fill_json_element(&mut root, &value),
        Value::Array(values) => {
            for entry in values {
                root.children.extend(lower_json("item", entry));
            }
        }
        _ => {}
    }
    Ok(root)
}

fn lower_json(tag: &str, value: &Value) -> Vec<Element> {
    match value {
        Value::Array(values) => values
            .iter()
            .flat_map(|entry| lower_json(tag, entry))
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let mut element = Element::named(tag);
            fill_json_element(&mut element, other);
            vec![element]
        }
    }
}

fn fill_json_element(element: &mut Element, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                match key.as_str() {
                    ATTRIBUTES_KEY => {
                        if let Value::Object(attributes) = inner {
                            for (name, attr) in attributes {
                                if let Some(attr) = scalar(attr) {
                                    element.attributes.insert(name.clone(), attr);
                                }
                            }
                        }
                    }
                    TEXT_KEY => element.text = scalar(inner),
                    _ => element.children.extend(lower_json(key, inner)),
                }
            }
        }
        other => element.text = scalar(other),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_attributes_and_text_are_lowered() {
        let root = parse_document(
            r#"<?xml version="1.0" encoding="utf-8"?>
<items total="1">
  <item type="boardgame" id="13">
    <name type="primary" value="Catan"/>
    <description>Trade &amp; build</description>
  </item>
</items>"#,
        )
        .unwrap();
        assert_eq!(root.tag(), "items");
        assert_eq!(root.attribute("total"), Some("1"));
        let item = root.child("item").unwrap();
        assert_eq!(item.attribute("id"), Some("13"));
        assert_eq!(item.child_value("name"), Some("Catan"));
        assert_eq!(item.child("description").unwrap().text(), Some("Trade & build"));
    }

    #[test]
    fn xml2js_json_matches_xml_shape() {
        let root = parse_document(
            r#"{"items": {"$": {"total": "1"}, "item": [
                {"$": {"id": "13"}, "name": [{"$": {"type": "primary", "value": "Catan"}}],
                 "description": ["Trade & build"]}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(root.tag(), "items");
        assert_eq!(root.attribute("total"), Some("1"));
        let item = root.child("item").unwrap();
        assert_eq!(item.attribute("id"), Some("13"));
        assert_eq!(item.child_value("name"), Some("Catan"));
        assert_eq!(item.child("description").unwrap().text(), Some("Trade & build"));
    }

    #[test]
    fn json_text_key_and_numbers() {
        let root = parse_json(
            r#"{"items": {"item": {"$": {"id": 7}, "thumbnail": {"_": " https://x/y.png "}}}}"#,
        )
        .unwrap();
        let item = root.child("item").unwrap();
        assert_eq!(item.attribute("id"), Some("7"));
        assert_eq!(item.child("thumbnail").unwrap().text(), Some("https://x/y.png"));
    }

    #[test]
    fn child_outlives_borrowed_tag() {
        let root = parse_xml(r#"<items><item id="1"/><item id="2"/></items>"#).unwrap();
        let item = {
            let tag = String::from("item");
            root.child(&tag)
        };
        assert_eq!(item.and_then(|el| el.attribute("id")), Some("1"));
        assert!(root.child("missing").is_none());
    }

    #[test]
    fn descendant_search_is_depth_first() {
        let root = parse_xml(
            r#"<item><statistics><ratings><average value="7.5"/></ratings></statistics><average value="1"/></item>"#,
        )
        .unwrap();
        assert_eq!(
            root.descendant("average").and_then(|el| el.attribute("value")),
            Some("7.5")
        );
    }

    #[test]
    fn garbage_is_a_network_error() {
        assert!(matches!(
            parse_document("Rate limit exceeded"),
            Err(CatalogError::Network(_))
        ));
        assert!(matches!(parse_document("   "), Err(CatalogError::Network(_))));
        assert!(matches!(parse_document("<items>"), Err(CatalogError::Network(_))));
    }
}
