//! Flat-form odds documents: global `events` / `markets` / `selections`
//! arrays cross-referenced by foreign ids.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::json::{de_id, de_opt_id, de_opt_number, decode_entries};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatParticipant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    /// "Home" / "Away"
    #[serde(default)]
    pub venue_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEvent {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub league_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_event_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub participants: Vec<FlatParticipant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketType {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatMarket {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub event_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub market_type: Option<MarketType>,
}

impl FlatMarket {
    /// Display name, falling back to the market type name.
    pub fn label(&self) -> &str {
        if !self.name.trim().is_empty() {
            return &self.name;
        }
        self.market_type
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayOdds {
    #[serde(default)]
    pub american: Option<String>,
    #[serde(default)]
    pub decimal: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatSelection {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "de_id")]
    pub market_id: String,
    #[serde(default)]
    pub label: String,
    /// "Home" / "Away" / "Over" / "Under"
    #[serde(default)]
    pub outcome_type: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub points: Option<f64>,
    #[serde(default)]
    pub display_odds: Option<DisplayOdds>,
    #[serde(default)]
    pub true_odds: Option<f64>,
    #[serde(default)]
    pub participants: Vec<FlatParticipant>,
}

/// One flat-form response, or the slice of it belonging to one tournament
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatDocument {
    #[serde(default)]
    pub events: Vec<FlatEvent>,
    #[serde(default)]
    pub markets: Vec<FlatMarket>,
    #[serde(default)]
    pub selections: Vec<FlatSelection>,
}

impl FlatDocument {
    /// Whether a JSON body looks like a flat-form document.
    pub fn detect(body: &Value) -> bool {
        ["events", "markets", "selections"]
            .iter()
            .any(|key| body.get(*key).map(Value::is_array).unwrap_or(false))
    }

    /// Decode a flat-form body, skipping individual entries that do not
    /// decode instead of rejecting the whole document.
    pub fn from_value(body: Value) -> Self {
        let Value::Object(mut map) = body else {
            return Self::default();
        };
        Self {
            events: decode_entries(map.remove("events"), "event"),
            markets: decode_entries(map.remove("markets"), "market"),
            selections: decode_entries(map.remove("selections"), "selection"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.markets.is_empty() && self.selections.is_empty()
    }

    /// League ids referenced by events, in first-seen order.
    pub fn league_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .filter_map(|e| e.league_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect()
    }

    /// The part of this document reachable from the given events: the
    /// events themselves, their markets, and those markets' selections.
    pub fn slice_for_events(&self, event_ids: &HashSet<String>) -> Self {
        let events: Vec<FlatEvent> = self
            .events
            .iter()
            .filter(|e| event_ids.contains(&e.id))
            .cloned()
            .collect();
        let markets: Vec<FlatMarket> = self
            .markets
            .iter()
            .filter(|m| event_ids.contains(&m.event_id))
            .cloned()
            .collect();
        let market_ids: HashSet<&str> = markets.iter().map(|m| m.id.as_str()).collect();
        let selections = self
            .selections
            .iter()
            .filter(|s| market_ids.contains(s.market_id.as_str()))
            .cloned()
            .collect();
        Self {
            events,
            markets,
            selections,
        }
    }

    /// Slice for a league: its events plus everything hanging off them.
    pub fn slice_for_league(&self, league_id: &str) -> Self {
        let event_ids: HashSet<String> = self
            .events
            .iter()
            .filter(|e| e.league_id.as_deref() == Some(league_id))
            .map(|e| e.id.clone())
            .collect();
        self.slice_for_events(&event_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "events": [
                {"id": "1", "leagueId": 12345, "name": "A vs B", "status": "NOT_STARTED"},
                {"id": 2, "leagueId": "999", "name": "C vs D", "status": "NOT_STARTED"},
                {"name": "missing id"}
            ],
            "markets": [
                {"id": "m1", "eventId": "1", "name": "Moneyline"},
                {"id": "m2", "eventId": "2", "marketType": {"name": "Moneyline"}}
            ],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "A", "displayOdds": {"american": "−150"}},
                {"id": "s2", "marketId": "m1", "label": "B", "points": "+1.5"},
                {"id": "s3", "marketId": "m2", "label": "C"}
            ]
        })
    }

    #[test]
    fn test_detect() {
        assert!(FlatDocument::detect(&sample()));
        assert!(FlatDocument::detect(&json!({"selections": []})));
        assert!(!FlatDocument::detect(&json!({"events": {}})));
        assert!(!FlatDocument::detect(&json!({"eventGroup": {}})));
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let doc = FlatDocument::from_value(sample());
        assert_eq!(doc.events.len(), 2);
        assert_eq!(doc.events[1].id, "2");
        assert_eq!(doc.events[0].league_id.as_deref(), Some("12345"));
        assert_eq!(doc.selections[1].points, Some(1.5));
        assert_eq!(doc.markets[1].label(), "Moneyline");
    }

    #[test]
    fn test_slice_for_league() {
        let doc = FlatDocument::from_value(sample());
        assert_eq!(doc.league_ids(), vec!["12345", "999"]);

        let slice = doc.slice_for_league("12345");
        assert_eq!(slice.events.len(), 1);
        assert_eq!(slice.markets.len(), 1);
        assert_eq!(slice.selections.len(), 2);
        assert!(slice.selections.iter().all(|s| s.market_id == "m1"));
    }
}
