//! Shared domain and wire types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque numeric identifier the source assigns to a tournament
pub type TournamentId = u64;

/// A tournament (event group) resolved from the catalog for one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// One side of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub abbreviation: String,
}

/// Lifecycle status of an emitted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
}

/// One upcoming match in the downstream schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMatchRecord {
    pub external_id: String,
    pub sport: String,
    pub league: String,
    pub home_team: Participant,
    pub away_team: Participant,
    pub start_time: DateTime<Utc>,
    pub status: MatchStatus,
    pub is_outdoor: bool,
    pub moneyline_home: Option<i32>,
    pub moneyline_away: Option<i32>,
    pub spread_home: Option<f64>,
    pub spread_away: Option<f64>,
    pub total_over: Option<f64>,
    pub total_under: Option<f64>,
}

/// Body of the upload request
#[derive(Debug, Serialize)]
pub struct PublishRequest<'a> {
    pub events: &'a [NormalizedMatchRecord],
}

/// Success response of the upload endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishReceipt {
    #[serde(default, alias = "count", alias = "upserted")]
    pub processed: Option<u64>,
    #[serde(default, alias = "server_time", alias = "serverTime")]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_wire_shape() {
        let record = NormalizedMatchRecord {
            external_id: "sbk-tennis-1".to_string(),
            sport: "tennis".to_string(),
            league: "ATP - Delray Beach".to_string(),
            home_team: Participant {
                name: "A".to_string(),
                abbreviation: "A".to_string(),
            },
            away_team: Participant {
                name: "B".to_string(),
                abbreviation: "B".to_string(),
            },
            start_time: Utc.with_ymd_and_hms(2030, 2, 1, 18, 0, 0).unwrap(),
            status: MatchStatus::Scheduled,
            is_outdoor: true,
            moneyline_home: Some(-150),
            moneyline_away: Some(130),
            spread_home: None,
            spread_away: None,
            total_over: None,
            total_under: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "scheduled");
        assert_eq!(value["home_team"]["name"], "A");
        assert_eq!(value["start_time"], "2030-02-01T18:00:00Z");
        assert_eq!(value["moneyline_home"], -150);
        assert!(value["spread_home"].is_null());
    }

    #[test]
    fn test_receipt_aliases() {
        let receipt: PublishReceipt =
            serde_json::from_str(r#"{"count": 4, "server_time": "2030-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(receipt.processed, Some(4));
        assert_eq!(receipt.timestamp.as_deref(), Some("2030-01-01T00:00:00Z"));

        let empty: PublishReceipt = serde_json::from_str("{}").unwrap();
        assert!(empty.processed.is_none());
    }
}
