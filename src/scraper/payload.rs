//! Captured payloads and the shape-agnostic joined view built from them.
//!
//! Both payload generations decode into [`CapturedPayload`]; normalization
//! only ever sees [`JoinedPayload`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::parsers::flat::FlatDocument;
use super::parsers::grouped::GroupedDocument;
use super::parsers::OddsFields;

/// An accepted odds document, tagged by the shape it arrived in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "document", rename_all = "snake_case")]
pub enum CapturedPayload {
    Grouped(GroupedDocument),
    Flat(FlatDocument),
}

impl CapturedPayload {
    /// Decode a JSON body into one of the known shapes.
    pub fn decode(body: Value) -> Option<Self> {
        if GroupedDocument::detect(&body) {
            return serde_json::from_value(body).ok().map(CapturedPayload::Grouped);
        }
        if FlatDocument::detect(&body) {
            let doc = FlatDocument::from_value(body);
            return (!doc.is_empty()).then_some(CapturedPayload::Flat(doc));
        }
        None
    }

    pub fn shape(&self) -> &'static str {
        match self {
            CapturedPayload::Grouped(_) => "grouped",
            CapturedPayload::Flat(_) => "flat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Some(Side::Home),
            "away" => Some(Side::Away),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeRole {
    Home,
    Away,
    Over,
    Under,
}

impl OutcomeRole {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "home" => Some(OutcomeRole::Home),
            "away" => Some(OutcomeRole::Away),
            "over" => Some(OutcomeRole::Over),
            "under" => Some(OutcomeRole::Under),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub name: String,
    pub short_name: Option<String>,
    pub role: Option<Side>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventView {
    pub id: String,
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub participants: Vec<ParticipantView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketView {
    pub id: String,
    pub event_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionView {
    pub market_id: String,
    pub label: String,
    pub participant: Option<String>,
    pub role: Option<OutcomeRole>,
    pub line: Option<f64>,
    pub odds: OddsFields,
}

/// Parse the start-time formats seen in payloads. Timestamps without an
/// offset are UTC.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Insertion-ordered collection where a repeated key replaces the earlier
/// entry in place.
struct Deduped<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Deduped<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn upsert(&mut self, key: String, item: T) {
        match self.index.get(&key) {
            Some(&i) => self.items[i] = item,
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
            }
        }
    }
}

/// Events with their markets and selections joined by id, deduplicated
/// (later entries for the same id win).
#[derive(Debug, Clone, Default)]
pub struct JoinedPayload {
    events: Vec<EventView>,
    markets_by_event: HashMap<String, Vec<MarketView>>,
    selections_by_market: HashMap<String, Vec<SelectionView>>,
}

impl JoinedPayload {
    /// Join payloads in capture order.
    pub fn from_payloads<'a>(payloads: impl IntoIterator<Item = &'a CapturedPayload>) -> Self {
        let mut events = Deduped::new();
        let mut markets = Deduped::new();
        let mut selections = Deduped::new();

        for payload in payloads {
            match payload {
                CapturedPayload::Flat(doc) => {
                    Self::add_flat(doc, &mut events, &mut markets, &mut selections)
                }
                CapturedPayload::Grouped(doc) => {
                    Self::add_grouped(doc, &mut events, &mut markets, &mut selections)
                }
            }
        }

        let mut markets_by_event: HashMap<String, Vec<MarketView>> = HashMap::new();
        for market in markets.items {
            markets_by_event
                .entry(market.event_id.clone())
                .or_default()
                .push(market);
        }
        let mut selections_by_market: HashMap<String, Vec<SelectionView>> = HashMap::new();
        for selection in selections.items {
            selections_by_market
                .entry(selection.market_id.clone())
                .or_default()
                .push(selection);
        }

        Self {
            events: events.items,
            markets_by_event,
            selections_by_market,
        }
    }

    pub fn events(&self) -> &[EventView] {
        &self.events
    }

    pub fn markets_for(&self, event_id: &str) -> &[MarketView] {
        self.markets_by_event
            .get(event_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selections_for(&self, market_id: &str) -> &[SelectionView] {
        self.selections_by_market
            .get(market_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn add_flat(
        doc: &FlatDocument,
        events: &mut Deduped<EventView>,
        markets: &mut Deduped<MarketView>,
        selections: &mut Deduped<SelectionView>,
    ) {
        for event in &doc.events {
            events.upsert(
                event.id.clone(),
                EventView {
                    id: event.id.clone(),
                    name: event.name.clone(),
                    start_time: event.start_event_date.as_deref().and_then(parse_start_time),
                    status: event.status.clone(),
                    participants: event
                        .participants
                        .iter()
                        .map(|p| ParticipantView {
                            name: p.name.clone(),
                            short_name: p.short_name.clone(),
                            role: p.venue_role.as_deref().and_then(Side::parse),
                        })
                        .collect(),
                },
            );
        }

        for market in &doc.markets {
            markets.upsert(
                market.id.clone(),
                MarketView {
                    id: market.id.clone(),
                    event_id: market.event_id.clone(),
                    name: market.label().to_string(),
                },
            );
        }

        for selection in &doc.selections {
            let key = selection
                .id
                .clone()
                .unwrap_or_else(|| format!("{}:{}", selection.market_id, selection.label));
            let display = selection.display_odds.clone().unwrap_or_default();
            selections.upsert(
                key,
                SelectionView {
                    market_id: selection.market_id.clone(),
                    label: selection.label.clone(),
                    participant: selection.participants.first().map(|p| p.name.clone()),
                    role: selection.outcome_type.as_deref().and_then(OutcomeRole::parse),
                    line: selection.points,
                    odds: OddsFields {
                        american: display.american,
                        decimal: display.decimal,
                        decimal_value: selection.true_odds,
                    },
                },
            );
        }
    }

    fn add_grouped(
        doc: &GroupedDocument,
        events: &mut Deduped<EventView>,
        markets: &mut Deduped<MarketView>,
        selections: &mut Deduped<SelectionView>,
    ) {
        for event in &doc.event_group.events {
            let sides = [
                (&event.team_name1, &event.team_short_name1, Side::Home),
                (&event.team_name2, &event.team_short_name2, Side::Away),
            ];
            let participants = sides
                .into_iter()
                .filter_map(|(name, short, side)| {
                    name.as_ref().map(|name| ParticipantView {
                        name: name.clone(),
                        short_name: short.clone(),
                        role: Some(side),
                    })
                })
                .collect();

            events.upsert(
                event.event_id.clone(),
                EventView {
                    id: event.event_id.clone(),
                    name: event.name.clone(),
                    start_time: event.start_date.as_deref().and_then(parse_start_time),
                    status: event.event_status.as_ref().and_then(|s| s.state.clone()),
                    participants,
                },
            );
        }

        for offer in doc.offers() {
            let market_id = offer
                .provider_offer_id
                .clone()
                .unwrap_or_else(|| format!("{}:{}", offer.event_id, offer.label));
            markets.upsert(
                market_id.clone(),
                MarketView {
                    id: market_id.clone(),
                    event_id: offer.event_id.clone(),
                    name: offer.label.clone(),
                },
            );
            for outcome in &offer.outcomes {
                selections.upsert(
                    format!("{}:{}", market_id, outcome.label),
                    SelectionView {
                        market_id: market_id.clone(),
                        label: outcome.label.clone(),
                        participant: outcome.participant.clone(),
                        role: OutcomeRole::parse(&outcome.label),
                        line: outcome.line,
                        odds: OddsFields {
                            american: outcome.odds_american.clone(),
                            decimal: None,
                            decimal_value: outcome.odds_decimal,
                        },
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn flat(body: Value) -> CapturedPayload {
        CapturedPayload::decode(body).unwrap()
    }

    #[test]
    fn test_decode_picks_shape() {
        let grouped = CapturedPayload::decode(json!({"eventGroup": {"eventGroupId": 1}})).unwrap();
        assert_eq!(grouped.shape(), "grouped");

        let flat_payload = CapturedPayload::decode(json!({"events": [{"id": 1}]})).unwrap();
        assert_eq!(flat_payload.shape(), "flat");

        assert!(CapturedPayload::decode(json!({"events": []})).is_none());
        assert!(CapturedPayload::decode(json!({"config": true})).is_none());
        assert!(CapturedPayload::decode(json!({"eventGroup": {"name": "no id"}})).is_none());
    }

    #[test]
    fn test_grouped_decode_survives_stray_offer() {
        let payload = CapturedPayload::decode(json!({"eventGroup": {
            "eventGroupId": 12345,
            "events": [{"eventId": 77, "name": "A vs B"}],
            "offerCategories": [{"offerSubcategoryDescriptors": [{"offerSubcategory": {"offers": [[
                {"eventId": 77, "label": "Moneyline", "outcomes": [
                    {"label": "A", "oddsAmerican": "-150"}, {"label": "B", "oddsAmerican": "+130"}
                ]},
                {"label": "Promo tile without eventId", "outcomes": []}
            ]]}}]}]
        }}));

        let Some(CapturedPayload::Grouped(doc)) = payload else {
            panic!("grouped payload rejected");
        };
        assert_eq!(doc.offers().count(), 1);
    }

    #[test]
    fn test_later_selection_wins() {
        let first = flat(json!({
            "events": [{"id": "e1", "name": "A vs B"}],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Moneyline"}],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "A", "displayOdds": {"american": "-150"}},
                {"id": "s2", "marketId": "m1", "label": "B", "displayOdds": {"american": "+130"}},
                {"id": "s1", "marketId": "m1", "label": "A", "displayOdds": {"american": "-160"}}
            ]
        }));
        let joined = JoinedPayload::from_payloads([&first]);

        let selections = joined.selections_for("m1");
        assert_eq!(selections.len(), 2);
        assert_eq!(selections[0].odds.american.as_deref(), Some("-160"));
        assert_eq!(selections[1].label, "B");
    }

    #[test]
    fn test_later_payload_wins_across_captures() {
        let listing = flat(json!({
            "events": [{"id": "e1", "name": "A vs B", "status": "NOT_STARTED"}],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Moneyline"}]
        }));
        let detail = flat(json!({
            "events": [{"id": "e1", "name": "A vs B", "status": "STARTED"}],
            "markets": [{"id": "m2", "eventId": "e1", "name": "Total Games"}],
            "selections": [{"marketId": "m2", "label": "Over", "points": 22.5}]
        }));
        let joined = JoinedPayload::from_payloads([&listing, &detail]);

        assert_eq!(joined.events().len(), 1);
        assert_eq!(joined.events()[0].status.as_deref(), Some("STARTED"));
        assert_eq!(joined.markets_for("e1").len(), 2);
        assert_eq!(joined.selections_for("m2")[0].line, Some(22.5));
        assert!(joined.markets_for("nope").is_empty());
    }

    #[test]
    fn test_grouped_joins_to_same_view() {
        let payload = CapturedPayload::decode(json!({
            "eventGroup": {
                "eventGroupId": 12345,
                "events": [{"eventId": 77, "name": "A vs B", "startDate": "2030-02-01T18:00:00.0000000Z",
                            "eventStatus": {"state": "NOT_STARTED"}, "teamName1": "A", "teamName2": "B"}],
                "offerCategories": [{"offerSubcategoryDescriptors": [{"offerSubcategory": {"offers": [[
                    {"eventId": 77, "label": "Moneyline", "outcomes": [
                        {"label": "A", "oddsAmerican": "-150"},
                        {"label": "B", "oddsDecimal": 2.3}
                    ]}
                ]]}}]}]
            }
        }))
        .unwrap();
        let joined = JoinedPayload::from_payloads([&payload]);

        let event = &joined.events()[0];
        assert_eq!(event.id, "77");
        assert_eq!(event.participants[0].role, Some(Side::Home));
        assert_eq!(
            event.start_time,
            Some(Utc.with_ymd_and_hms(2030, 2, 1, 18, 0, 0).unwrap())
        );

        let market = &joined.markets_for("77")[0];
        assert_eq!(market.id, "77:Moneyline");
        let selections = joined.selections_for(&market.id);
        assert_eq!(selections[1].odds.decimal_value, Some(2.3));
    }

    #[test]
    fn test_parse_start_time_formats() {
        let expected = Utc.with_ymd_and_hms(2030, 2, 1, 18, 0, 0).unwrap();
        assert_eq!(parse_start_time("2030-02-01T18:00:00Z"), Some(expected));
        assert_eq!(parse_start_time("2030-02-01T19:00:00+01:00"), Some(expected));
        assert_eq!(parse_start_time("2030-02-01T18:00:00"), Some(expected));
        assert_eq!(parse_start_time("tomorrow"), None);
    }

    #[test]
    fn test_payload_archive_round_trip_tag() {
        let payload = flat(json!({"events": [{"id": 5, "leagueId": 12345}]}));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["shape"], "flat");
        assert_eq!(value["document"]["events"][0]["leagueId"], "12345");
    }
}
