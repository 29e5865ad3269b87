//! Odds normalization: joined payload → one record per upcoming match.
//!
//! Pure and deterministic for a given `now`: output order follows event
//! order in the joined payload, and nothing here performs I/O.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use super::payload::{EventView, JoinedPayload, OutcomeRole, SelectionView, Side};
use crate::types::{MatchStatus, NormalizedMatchRecord, Participant};

/// Statuses (lowercased, separators removed) meaning "not started yet"
const UPCOMING_STATUSES: [&str; 4] = ["notstarted", "scheduled", "pregame", "upcoming"];

const PLACEHOLDER_NAMES: [&str; 5] = ["", "unknown", "tbd", "tba", "n/a"];

const SPREAD_KEYWORDS: [&str; 2] = ["spread", "handicap"];
const TOTAL_KEYWORDS: [&str; 3] = ["total", "over/under", "over under"];
const MONEYLINE_KEYWORDS: [&str; 4] = ["moneyline", "money line", "winner", "to win"];

static VS_SPLIT: OnceLock<Option<Regex>> = OnceLock::new();
static PERIOD_MARKET: OnceLock<Option<Regex>> = OnceLock::new();

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Market buckets we extract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    Moneyline,
    Spread,
    Total,
}

impl MarketKind {
    /// Classify a market by case-insensitive keyword match on its name.
    /// Per-set and per-game markets are not match markets and classify as
    /// nothing.
    pub fn classify(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        let period = cached(
            &PERIOD_MARKET,
            r"(?i)\b(set|game)\s*\d|\b\d+(st|nd|rd|th)\s+(set|game)\b",
        );
        if period.map(|re| re.is_match(&lower)).unwrap_or(false) {
            return None;
        }
        let has = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
        if has(&SPREAD_KEYWORDS) {
            Some(MarketKind::Spread)
        } else if has(&TOTAL_KEYWORDS) {
            Some(MarketKind::Total)
        } else if has(&MONEYLINE_KEYWORDS) {
            Some(MarketKind::Moneyline)
        } else {
            None
        }
    }
}

/// Participant-name resolution strategies, tried in this order
#[derive(Debug, Clone, Copy)]
enum NameSource {
    VenueRoles,
    StructuredOrder,
    DisplayName,
}

const NAME_RESOLUTION_ORDER: [NameSource; 3] = [
    NameSource::VenueRoles,
    NameSource::StructuredOrder,
    NameSource::DisplayName,
];

/// Outcome-pairing strategies for two-sided markets, tried in this order
#[derive(Debug, Clone, Copy)]
enum SidePairing {
    ParticipantName,
    OutcomeRole,
    Positional,
}

const SIDE_PAIRING_ORDER: [SidePairing; 3] = [
    SidePairing::ParticipantName,
    SidePairing::OutcomeRole,
    SidePairing::Positional,
];

/// Outcome-pairing strategies for totals, tried in this order
#[derive(Debug, Clone, Copy)]
enum TotalPairing {
    OverUnderLabel,
    Positional,
}

const TOTAL_PAIRING_ORDER: [TotalPairing; 2] = [TotalPairing::OverUnderLabel, TotalPairing::Positional];

/// Why an event produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotUpcoming,
    StartPassed,
    MissingStart,
    UnresolvedNames,
}

/// Normalizer configured with the output labels of one deployment
#[derive(Debug, Clone)]
pub struct Normalizer {
    sport: String,
    id_prefix: String,
}

impl Normalizer {
    pub fn new(sport: impl Into<String>, id_prefix: impl Into<String>) -> Self {
        Self {
            sport: sport.into(),
            id_prefix: id_prefix.into(),
        }
    }

    /// Normalize every upcoming, not-started event in the payload.
    pub fn normalize(
        &self,
        payload: &JoinedPayload,
        tournament_label: &str,
        now: DateTime<Utc>,
    ) -> Vec<NormalizedMatchRecord> {
        payload
            .events()
            .iter()
            .filter_map(|event| match self.normalize_event(payload, event, tournament_label, now) {
                Ok(record) => Some(record),
                Err(reason) => {
                    debug!("Skipping event {} ({}): {:?}", event.id, event.name, reason);
                    None
                }
            })
            .collect()
    }

    fn normalize_event(
        &self,
        payload: &JoinedPayload,
        event: &EventView,
        tournament_label: &str,
        now: DateTime<Utc>,
    ) -> Result<NormalizedMatchRecord, Rejection> {
        if !is_upcoming(event.status.as_deref()) {
            return Err(Rejection::NotUpcoming);
        }
        let start_time = event.start_time.ok_or(Rejection::MissingStart)?;
        if start_time <= now {
            return Err(Rejection::StartPassed);
        }
        let (home, away) = resolve_participants(event).ok_or(Rejection::UnresolvedNames)?;

        let mut record = NormalizedMatchRecord {
            external_id: format!("{}-{}", self.id_prefix, event.id),
            sport: self.sport.clone(),
            league: tournament_label.to_string(),
            home_team: home,
            away_team: away,
            start_time,
            status: MatchStatus::Scheduled,
            is_outdoor: !tournament_label.to_lowercase().contains("indoor"),
            moneyline_home: None,
            moneyline_away: None,
            spread_home: None,
            spread_away: None,
            total_over: None,
            total_under: None,
        };

        let mut filled = Vec::with_capacity(3);
        for market in payload.markets_for(&event.id) {
            let Some(kind) = MarketKind::classify(&market.name) else {
                continue;
            };
            if filled.contains(&kind) {
                continue;
            }
            let selections = payload.selections_for(&market.id);
            if apply_market(&mut record, kind, selections) {
                filled.push(kind);
            }
        }

        Ok(record)
    }
}

fn is_upcoming(status: Option<&str>) -> bool {
    let Some(status) = status else {
        return false;
    };
    let compact: String = status
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    UPCOMING_STATUSES.contains(&compact.as_str())
}

fn is_placeholder(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    PLACEHOLDER_NAMES.contains(&lower.as_str()) || lower.starts_with("unknown")
}

/// Short code for a participant: the provided short name, else the first
/// three letters of the surname.
fn abbreviate(name: &str, short_name: Option<&str>) -> String {
    if let Some(short) = short_name.map(str::trim).filter(|s| !s.is_empty()) {
        return short.to_string();
    }
    let surname = name.split_whitespace().last().unwrap_or(name);
    let letters: String = surname
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(3)
        .collect();
    if letters.is_empty() {
        name.chars().filter(|c| c.is_alphanumeric()).take(3).collect::<String>().to_uppercase()
    } else {
        letters.to_uppercase()
    }
}

fn participant(name: &str, short_name: Option<&str>) -> Participant {
    let name = name.trim();
    Participant {
        name: name.to_string(),
        abbreviation: abbreviate(name, short_name),
    }
}

fn resolve_participants(event: &EventView) -> Option<(Participant, Participant)> {
    NAME_RESOLUTION_ORDER
        .iter()
        .filter_map(|source| resolve_names(event, *source))
        .find(|(home, away)| !is_placeholder(&home.name) && !is_placeholder(&away.name))
}

fn resolve_names(event: &EventView, source: NameSource) -> Option<(Participant, Participant)> {
    match source {
        NameSource::VenueRoles => {
            let by_role = |side: Side| event.participants.iter().find(|p| p.role == Some(side));
            let home = by_role(Side::Home)?;
            let away = by_role(Side::Away)?;
            Some((
                participant(&home.name, home.short_name.as_deref()),
                participant(&away.name, away.short_name.as_deref()),
            ))
        }
        NameSource::StructuredOrder => {
            let mut named = event.participants.iter().filter(|p| !p.name.trim().is_empty());
            let home = named.next()?;
            let away = named.next()?;
            Some((
                participant(&home.name, home.short_name.as_deref()),
                participant(&away.name, away.short_name.as_deref()),
            ))
        }
        NameSource::DisplayName => {
            let splitter = cached(&VS_SPLIT, r"(?i)\s+(?:vs\.?|v\.?)\s+")?;
            let mut parts = splitter.splitn(event.name.trim(), 2);
            let home = parts.next()?;
            let away = parts.next()?;
            Some((participant(home, None), participant(away, None)))
        }
    }
}

fn selection_names(selection: &SelectionView) -> impl Iterator<Item = &str> {
    [Some(selection.label.as_str()), selection.participant.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
}

fn surname(name: &str) -> &str {
    let name = name.trim();
    name.split_whitespace().last().unwrap_or(name)
}

fn full_name_match(selection: &SelectionView, name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && selection_names(selection).any(|c| c.eq_ignore_ascii_case(name))
}

/// Surname containment, only usable when the two players' surnames differ.
fn surname_match(selection: &SelectionView, name: &str, other: &str) -> bool {
    let last = surname(name).to_lowercase();
    if last.chars().count() < 3 || last == surname(other).to_lowercase() {
        return false;
    }
    selection_names(selection).any(|c| c.to_lowercase().contains(&last))
}

fn side_pair<'a>(
    selections: &'a [SelectionView],
    home: &Participant,
    away: &Participant,
) -> Option<(&'a SelectionView, &'a SelectionView)> {
    if selections.len() < 2 {
        return None;
    }
    SIDE_PAIRING_ORDER.iter().find_map(|strategy| match strategy {
        SidePairing::ParticipantName => {
            let find = |taken: &[Option<usize>], matches: &dyn Fn(&SelectionView) -> bool| {
                selections
                    .iter()
                    .enumerate()
                    .position(|(i, s)| !taken.contains(&Some(i)) && matches(s))
            };
            let mut home_idx = find(&[], &|s: &SelectionView| full_name_match(s, &home.name));
            let mut away_idx = find(&[home_idx], &|s: &SelectionView| full_name_match(s, &away.name));
            if home_idx.is_none() {
                home_idx = find(&[away_idx], &|s: &SelectionView| surname_match(s, &home.name, &away.name));
            }
            if away_idx.is_none() {
                away_idx = find(&[home_idx], &|s: &SelectionView| surname_match(s, &away.name, &home.name));
            }
            let other = |taken: usize| (0..selections.len()).find(|i| *i != taken);
            let (h, a) = match (home_idx, away_idx) {
                (Some(h), Some(a)) => (h, a),
                (Some(h), None) => (h, other(h)?),
                (None, Some(a)) => (other(a)?, a),
                (None, None) => return None,
            };
            Some((&selections[h], &selections[a]))
        }
        SidePairing::OutcomeRole => {
            let by_role = |role| selections.iter().find(|s| s.role == Some(role));
            Some((by_role(OutcomeRole::Home)?, by_role(OutcomeRole::Away)?))
        }
        SidePairing::Positional => Some((&selections[0], &selections[1])),
    })
}

fn total_pair(selections: &[SelectionView]) -> Option<(&SelectionView, &SelectionView)> {
    if selections.len() < 2 {
        return None;
    }
    TOTAL_PAIRING_ORDER.iter().find_map(|strategy| match strategy {
        TotalPairing::OverUnderLabel => {
            let find = |word: &str, role: OutcomeRole| {
                selections.iter().find(|s| {
                    s.role == Some(role) || s.label.trim().to_lowercase().starts_with(word)
                })
            };
            Some((find("over", OutcomeRole::Over)?, find("under", OutcomeRole::Under)?))
        }
        TotalPairing::Positional => Some((&selections[0], &selections[1])),
    })
}

/// Fill the record fields for one market. Returns whether any value was
/// extracted.
fn apply_market(record: &mut NormalizedMatchRecord, kind: MarketKind, selections: &[SelectionView]) -> bool {
    match kind {
        MarketKind::Moneyline => {
            let Some((home, away)) = side_pair(selections, &record.home_team, &record.away_team) else {
                return false;
            };
            record.moneyline_home = home.odds.to_american();
            record.moneyline_away = away.odds.to_american();
            record.moneyline_home.is_some() || record.moneyline_away.is_some()
        }
        MarketKind::Spread => {
            let Some((home, away)) = side_pair(selections, &record.home_team, &record.away_team) else {
                return false;
            };
            record.spread_home = home.line;
            record.spread_away = away.line;
            record.spread_home.is_some() || record.spread_away.is_some()
        }
        MarketKind::Total => {
            let Some((over, under)) = total_pair(selections) else {
                return false;
            };
            record.total_over = over.line;
            record.total_under = under.line;
            record.total_over.is_some() || record.total_under.is_some()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::payload::CapturedPayload;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Value};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    fn joined(body: Value) -> JoinedPayload {
        let payload = CapturedPayload::decode(body).unwrap();
        JoinedPayload::from_payloads([&payload])
    }

    fn normalizer() -> Normalizer {
        Normalizer::new("tennis", "sbk-tennis")
    }

    fn flat_event(id: &str, name: &str, status: &str, start: &str) -> Value {
        json!({"id": id, "leagueId": 12345, "name": name, "status": status, "startEventDate": start})
    }

    #[test]
    fn test_moneyline_by_participant_name() {
        let payload = joined(json!({
            "events": [{
                "id": "e1", "name": "A vs B", "status": "NOT_STARTED",
                "startEventDate": "2030-02-01T18:00:00Z",
                "participants": [{"name": "A", "venueRole": "Home"}, {"name": "B", "venueRole": "Away"}]
            }],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Moneyline"}],
            "selections": [
                {"id": "s2", "marketId": "m1", "label": "B", "displayOdds": {"american": "+130"}},
                {"id": "s1", "marketId": "m1", "label": "A", "displayOdds": {"american": "\u{2212}150"}}
            ]
        }));

        let records = normalizer().normalize(&payload, "ATP - Delray Beach", now());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.external_id, "sbk-tennis-e1");
        assert_eq!(r.league, "ATP - Delray Beach");
        assert_eq!(r.home_team.name, "A");
        assert_eq!(r.moneyline_home, Some(-150));
        assert_eq!(r.moneyline_away, Some(130));
        assert_eq!(r.spread_home, None);
        assert_eq!(r.total_over, None);
        assert!(r.is_outdoor);
    }

    #[test]
    fn test_positional_fallback_when_names_do_not_match() {
        let payload = joined(json!({
            "events": [flat_event("e1", "Novak Djokovic vs Carlos Alcaraz", "NOT_STARTED", "2030-02-01T18:00:00Z")],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Match Winner"}],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "Player 1", "displayOdds": {"american": "-120"}},
                {"id": "s2", "marketId": "m1", "label": "Player 2", "displayOdds": {"american": "EVEN"}}
            ]
        }));

        let records = normalizer().normalize(&payload, "ATP - Doha", now());
        let r = &records[0];
        assert_eq!(r.home_team.name, "Novak Djokovic");
        assert_eq!(r.home_team.abbreviation, "DJO");
        assert_eq!(r.away_team.name, "Carlos Alcaraz");
        assert_eq!(r.moneyline_home, Some(-120));
        assert_eq!(r.moneyline_away, Some(100));
    }

    #[test]
    fn test_surname_match_and_single_sided_match() {
        let payload = joined(json!({
            "events": [flat_event("e1", "Iga Swiatek vs Coco Gauff", "NOT_STARTED", "2030-02-01T18:00:00Z")],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Moneyline"}],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "Other", "displayOdds": {"american": "+200"}},
                {"id": "s2", "marketId": "m1", "label": "C. Gauff", "displayOdds": {"american": "-250"}}
            ]
        }));

        let r = &normalizer().normalize(&payload, "WTA - Dubai", now())[0];
        assert_eq!(r.moneyline_away, Some(-250));
        assert_eq!(r.moneyline_home, Some(200));
    }

    #[test]
    fn test_shared_surname_pairs_by_full_name() {
        let payload = joined(json!({
            "events": [flat_event("e1", "Venus Williams vs Serena Williams", "NOT_STARTED", "2030-02-01T18:00:00Z")],
            "markets": [
                {"id": "m1", "eventId": "e1", "name": "Moneyline"},
                {"id": "m2", "eventId": "e1", "name": "Game Spread"}
            ],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "Serena Williams", "displayOdds": {"american": "-300"}},
                {"id": "s2", "marketId": "m1", "label": "Venus Williams", "displayOdds": {"american": "+250"}},
                {"id": "s3", "marketId": "m2", "label": "Serena Williams", "points": -4.5, "displayOdds": {"american": "-110"}},
                {"id": "s4", "marketId": "m2", "label": "Venus Williams", "points": 4.5, "displayOdds": {"american": "-110"}}
            ]
        }));

        let r = &normalizer().normalize(&payload, "WTA - Miami", now())[0];
        assert_eq!(r.home_team.name, "Venus Williams");
        assert_eq!(r.moneyline_home, Some(250));
        assert_eq!(r.moneyline_away, Some(-300));
        assert_eq!(r.spread_home, Some(4.5));
        assert_eq!(r.spread_away, Some(-4.5));
    }

    #[test]
    fn test_shared_surname_is_not_guessed() {
        let payload = joined(json!({
            "events": [flat_event("e1", "Venus Williams vs Serena Williams", "NOT_STARTED", "2030-02-01T18:00:00Z")],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Moneyline"}],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "S. Williams", "displayOdds": {"american": "-300"}},
                {"id": "s2", "marketId": "m1", "label": "Venus Williams", "displayOdds": {"american": "+250"}}
            ]
        }));

        let r = &normalizer().normalize(&payload, "WTA - Miami", now())[0];
        assert_eq!(r.moneyline_home, Some(250));
        assert_eq!(r.moneyline_away, Some(-300));
    }

    #[test]
    fn test_spread_and_total_lines() {
        let payload = joined(json!({
            "events": [flat_event("e1", "A vs B", "NOT_STARTED", "2030-02-01T18:00:00Z")],
            "markets": [
                {"id": "m2", "eventId": "e1", "name": "Game Spread"},
                {"id": "m3", "eventId": "e1", "name": "Total Games"},
                {"id": "m4", "eventId": "e1", "name": "Set 1 Total Games"}
            ],
            "selections": [
                {"id": "a", "marketId": "m2", "label": "B", "points": 2.5},
                {"id": "b", "marketId": "m2", "label": "A", "points": "\u{2212}2.5"},
                {"id": "c", "marketId": "m3", "label": "Under", "points": 21.5},
                {"id": "d", "marketId": "m3", "label": "Over", "points": 22.5},
                {"id": "e", "marketId": "m4", "label": "Over", "points": 9.5},
                {"id": "f", "marketId": "m4", "label": "Under", "points": 9.5}
            ]
        }));

        let r = &normalizer().normalize(&payload, "ATP - Delray Beach", now())[0];
        assert_eq!(r.spread_home, Some(-2.5));
        assert_eq!(r.spread_away, Some(2.5));
        assert_eq!(r.total_over, Some(22.5));
        assert_eq!(r.total_under, Some(21.5));
        assert_eq!(r.moneyline_home, None);
    }

    #[test]
    fn test_rejects_started_and_past_events() {
        let past = (now() - Duration::minutes(5)).to_rfc3339();
        let payload = joined(json!({
            "events": [
                flat_event("live", "A vs B", "STARTED", "2030-02-01T18:00:00Z"),
                flat_event("done", "C vs D", "FINISHED", "2030-02-01T18:00:00Z"),
                flat_event("past", "E vs F", "NOT_STARTED", &past),
                flat_event("nostart", "G vs H", "NOT_STARTED", "soon"),
                flat_event("nostatus", "I vs J", "", "2030-02-01T18:00:00Z"),
                flat_event("ok", "K vs L", "not_started", "2030-02-01T18:00:00Z")
            ]
        }));

        let records = normalizer().normalize(&payload, "ATP", now());
        let ids: Vec<&str> = records.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(ids, vec!["sbk-tennis-ok"]);
        assert!(records.iter().all(|r| r.start_time > now()));
    }

    #[test]
    fn test_rejects_placeholder_names() {
        let payload = joined(json!({
            "events": [
                {"id": "e1", "name": "Unknown vs B", "status": "NOT_STARTED", "startEventDate": "2030-02-01T18:00:00Z",
                 "participants": [{"name": "Unknown"}, {"name": "B"}]},
                flat_event("e2", "Single Name", "NOT_STARTED", "2030-02-01T18:00:00Z"),
                {"id": "e3", "name": "C vs D", "status": "NOT_STARTED", "startEventDate": "2030-02-01T18:00:00Z",
                 "participants": [{"name": "TBD"}, {"name": "D"}]}
            ]
        }));

        let records = normalizer().normalize(&payload, "ATP", now());
        // e3's structured names are placeholders but its display name resolves
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].home_team.name, "C");
        assert_eq!(records[0].away_team.name, "D");
    }

    #[test]
    fn test_unparseable_odds_stay_null() {
        let payload = joined(json!({
            "events": [flat_event("e1", "A vs B", "NOT_STARTED", "2030-02-01T18:00:00Z")],
            "markets": [
                {"id": "m1", "eventId": "e1", "name": "Moneyline"},
                {"id": "m5", "eventId": "e1", "name": "Moneyline"}
            ],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "A", "displayOdds": {"american": "OFF"}},
                {"id": "s2", "marketId": "m1", "label": "B", "displayOdds": {"american": "+130"}},
                {"id": "s3", "marketId": "m5", "label": "A", "displayOdds": {"american": "-900"}}
            ]
        }));

        let r = &normalizer().normalize(&payload, "ATP", now())[0];
        assert_eq!(r.moneyline_home, None);
        assert_eq!(r.moneyline_away, Some(130));
    }

    #[test]
    fn test_grouped_shape_normalizes_the_same() {
        let payload = joined(json!({
            "eventGroup": {
                "eventGroupId": 12345,
                "events": [{"eventId": 77, "name": "A vs B", "startDate": "2030-02-01T18:00:00.0000000Z",
                            "eventStatus": {"state": "NOT_STARTED"}, "teamName1": "A", "teamName2": "B",
                            "teamShortName1": "AAA"}],
                "offerCategories": [{"offerSubcategoryDescriptors": [{"offerSubcategory": {"offers": [[
                    {"eventId": 77, "label": "Moneyline", "outcomes": [
                        {"label": "A", "oddsAmerican": "-150"},
                        {"label": "B", "oddsDecimal": 2.3}
                    ]},
                    {"eventId": 77, "label": "Total Games", "outcomes": [
                        {"label": "Over", "line": 22.5},
                        {"label": "Under", "line": 22.5}
                    ]}
                ]]}}]}]
            }
        }));

        let r = &normalizer().normalize(&payload, "ATP - Delray Beach", now())[0];
        assert_eq!(r.external_id, "sbk-tennis-77");
        assert_eq!(r.home_team.abbreviation, "AAA");
        assert_eq!(r.moneyline_home, Some(-150));
        assert_eq!(r.moneyline_away, Some(130));
        assert_eq!(r.total_over, Some(22.5));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let body = json!({
            "events": [
                flat_event("e1", "A vs B", "NOT_STARTED", "2030-02-01T18:00:00Z"),
                flat_event("e2", "C vs D", "NOT_STARTED", "2030-02-02T18:00:00Z")
            ],
            "markets": [{"id": "m1", "eventId": "e1", "name": "Moneyline"}],
            "selections": [
                {"id": "s1", "marketId": "m1", "label": "A", "displayOdds": {"american": "-150"}},
                {"id": "s2", "marketId": "m1", "label": "B", "displayOdds": {"american": "+130"}}
            ]
        });
        let payload = joined(body);
        let first = serde_json::to_string(&normalizer().normalize(&payload, "ATP", now())).unwrap();
        let second = serde_json::to_string(&normalizer().normalize(&payload, "ATP", now())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_market_classification() {
        assert_eq!(MarketKind::classify("Moneyline"), Some(MarketKind::Moneyline));
        assert_eq!(MarketKind::classify("Match Winner"), Some(MarketKind::Moneyline));
        assert_eq!(MarketKind::classify("Game Handicap"), Some(MarketKind::Spread));
        assert_eq!(MarketKind::classify("Set Spread"), Some(MarketKind::Spread));
        assert_eq!(MarketKind::classify("Total Games Over/Under"), Some(MarketKind::Total));
        assert_eq!(MarketKind::classify("Set 1 Winner"), None);
        assert_eq!(MarketKind::classify("2nd Set Total Games"), None);
        assert_eq!(MarketKind::classify("Correct Score"), None);
    }

    #[test]
    fn test_indoor_flag_and_abbreviations() {
        assert_eq!(abbreviate("Jannik Sinner", None), "SIN");
        assert_eq!(abbreviate("Jannik Sinner", Some(" JS ")), "JS");
        assert_eq!(abbreviate("Li", None), "LI");

        let payload = joined(json!({
            "events": [flat_event("e1", "A vs B", "NOT_STARTED", "2030-02-01T18:00:00Z")]
        }));
        let r = &normalizer().normalize(&payload, "ATP - Rotterdam (Indoor)", now())[0];
        assert!(!r.is_outdoor);
    }
}
