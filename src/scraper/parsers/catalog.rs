//! Parser for the sport/tournament discovery document.

use serde_json::Value;

use super::json::{first_array, first_string};
use crate::error::{HarvestError, Result};

const GROUP_LIST_KEYS: [&str; 3] = ["sports", "groups", "displayGroupInfos"];
const SPORT_ID_KEYS: [&str; 3] = ["id", "displayGroupId", "sportId"];
const SPORT_NAME_KEYS: [&str; 3] = ["name", "displayName", "description"];
const CHILD_LIST_KEYS: [&str; 4] = ["eventGroups", "eventGroupInfos", "leagues", "children"];
const CHILD_ID_KEYS: [&str; 3] = ["eventGroupId", "id", "leagueId"];
const CHILD_NAME_KEYS: [&str; 3] = ["name", "eventGroupName", "displayName"];
const CHILD_SLUG_KEYS: [&str; 3] = ["urlName", "slug", "seoIdentifier"];

/// A sport group as listed in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SportGroup {
    pub id: Option<String>,
    pub name: Option<String>,
    pub children: Vec<GroupDescriptor>,
}

/// A child tournament/event-group descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDescriptor {
    pub id: Option<String>,
    pub name: String,
    pub slug: Option<String>,
}

/// Parser for the catalog document
pub struct CatalogParser;

impl CatalogParser {
    /// Parse the catalog into sport groups, in document order.
    ///
    /// The document is either an array of sport groups or an object holding
    /// one under a known key. Anything else is malformed.
    pub fn parse(body: &str) -> Result<Vec<SportGroup>> {
        let document: Value = serde_json::from_str(body)
            .map_err(|e| HarvestError::CatalogMalformed(format!("invalid JSON: {}", e)))?;

        let groups = match &document {
            Value::Array(items) => items,
            Value::Object(_) => first_array(&document, &GROUP_LIST_KEYS).ok_or_else(|| {
                HarvestError::CatalogMalformed("no sport group list in catalog".to_string())
            })?,
            _ => {
                return Err(HarvestError::CatalogMalformed(
                    "catalog is neither an array nor an object".to_string(),
                ))
            }
        };

        Ok(groups.iter().filter_map(Self::parse_group).collect())
    }

    fn parse_group(value: &Value) -> Option<SportGroup> {
        if !value.is_object() {
            return None;
        }
        let children = first_array(value, &CHILD_LIST_KEYS)
            .map(|items| items.iter().filter_map(Self::parse_child).collect())
            .unwrap_or_default();

        Some(SportGroup {
            id: first_string(value, &SPORT_ID_KEYS),
            name: first_string(value, &SPORT_NAME_KEYS),
            children,
        })
    }

    fn parse_child(value: &Value) -> Option<GroupDescriptor> {
        let name = first_string(value, &CHILD_NAME_KEYS)?;
        Some(GroupDescriptor {
            id: first_string(value, &CHILD_ID_KEYS),
            name,
            slug: first_string(value, &CHILD_SLUG_KEYS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_catalog() {
        let json = r#"{
            "sports": [
                {"id": "6", "name": "Tennis", "eventGroups": [
                    {"eventGroupId": 12345, "name": "ATP - Delray Beach", "urlName": "atp-delray-beach"},
                    {"eventGroupId": 12346, "name": "WTA Doubles - Delray Beach"}
                ]},
                {"id": "2", "name": "Basketball", "eventGroups": []}
            ]
        }"#;

        let groups = CatalogParser::parse(json).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id.as_deref(), Some("6"));
        assert_eq!(groups[0].children.len(), 2);
        assert_eq!(groups[0].children[0].id.as_deref(), Some("12345"));
        assert_eq!(groups[0].children[0].slug.as_deref(), Some("atp-delray-beach"));
        assert_eq!(groups[0].children[1].slug, None);
    }

    #[test]
    fn test_parse_bare_array_with_alternate_keys() {
        let json = r#"[
            {"displayGroupId": 6, "displayName": "TENNIS", "eventGroupInfos": [
                {"eventGroupId": "900", "eventGroupName": "ATP - Doha"}
            ]}
        ]"#;

        let groups = CatalogParser::parse(json).unwrap();
        assert_eq!(groups[0].id.as_deref(), Some("6"));
        assert_eq!(groups[0].name.as_deref(), Some("TENNIS"));
        assert_eq!(groups[0].children[0].name, "ATP - Doha");
    }

    #[test]
    fn test_malformed_catalog() {
        assert!(matches!(
            CatalogParser::parse("<html>blocked</html>"),
            Err(HarvestError::CatalogMalformed(_))
        ));
        assert!(matches!(
            CatalogParser::parse(r#"{"status": "ok"}"#),
            Err(HarvestError::CatalogMalformed(_))
        ));
        assert!(matches!(
            CatalogParser::parse("42"),
            Err(HarvestError::CatalogMalformed(_))
        ));
    }
}
