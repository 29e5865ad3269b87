//! Uploads normalized records to the storage endpoint.

use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::PublishConfig;
use crate::error::{HarvestError, Result};
use crate::types::{NormalizedMatchRecord, PublishReceipt, PublishRequest};

/// Longest rejection body kept in the error
const MAX_ERROR_BODY: usize = 512;

/// Upload client for the configured endpoint
pub struct Publisher {
    client: Client,
    upload_url: String,
    token: Option<String>,
}

impl Publisher {
    /// `None` when no upload endpoint is configured.
    pub fn from_config(config: &PublishConfig) -> Result<Option<Self>> {
        let Some(upload_url) = config.upload_url.clone().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Some(Self {
            client,
            upload_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        }))
    }

    /// POST `{ events: [...] }` in a single request.
    ///
    /// An empty batch is not sent.
    pub async fn publish(&self, records: &[NormalizedMatchRecord]) -> Result<Option<PublishReceipt>> {
        if records.is_empty() {
            info!("No records to publish");
            return Ok(None);
        }

        let mut request = self
            .client
            .post(&self.upload_url)
            .json(&PublishRequest { events: records });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(HarvestError::PublishStatus {
                status: status.as_u16(),
                body,
            });
        }

        let receipt = match serde_json::from_str::<PublishReceipt>(&body) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Upload accepted but response was not understood: {}", e);
                PublishReceipt::default()
            }
        };
        info!(
            "Published {} record(s): {} processed at {}",
            records.len(),
            receipt
                .processed
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".to_string()),
            receipt.timestamp.as_deref().unwrap_or("?")
        );
        Ok(Some(receipt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MatchStatus, Participant};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record() -> NormalizedMatchRecord {
        NormalizedMatchRecord {
            external_id: "sbk-tennis-e1".to_string(),
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
        }
    }

    fn publisher(server: &MockServer, token: Option<&str>) -> Publisher {
        Publisher::from_config(&PublishConfig {
            upload_url: Some(format!("{}/upload", server.uri())),
            token: token.map(str::to_string),
            timeout_secs: 5,
        })
        .unwrap()
        .unwrap()
    }

    #[tokio::test]
    async fn test_publish_sends_bearer_and_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "events": [{"external_id": "sbk-tennis-e1", "moneyline_home": -150, "status": "scheduled"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"count": 1, "timestamp": "2030-01-01T00:00:00Z"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let receipt = publisher(&server, Some("secret"))
            .publish(&[record()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receipt.processed, Some(1));
        assert_eq!(receipt.timestamp.as_deref(), Some("2030-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let receipt = publisher(&server, None).publish(&[]).await.unwrap();
        assert!(receipt.is_none());
    }

    #[tokio::test]
    async fn test_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let err = publisher(&server, Some("wrong"))
            .publish(&[record()])
            .await
            .unwrap_err();
        match err {
            HarvestError::PublishStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad token");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_no_endpoint_means_no_publisher() {
        assert!(Publisher::from_config(&PublishConfig::default())
            .unwrap()
            .is_none());
    }
}
