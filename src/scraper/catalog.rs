//! Tournament catalog resolver.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::parsers::{CatalogParser, SportGroup};
use crate::config::{BrowserConfig, CatalogConfig, SourceConfig};
use crate::error::{HarvestError, Result};
use crate::retry::{retry_when, RetryConfig};
use crate::types::{Tournament, TournamentId};

/// Sport lookup and exclusion rules
#[derive(Debug, Clone)]
pub struct TournamentFilter {
    pub sport_id: String,
    pub sport_name: String,
    /// Tournaments already sourced elsewhere
    pub excluded_keywords: Vec<String>,
    pub category_keywords: Vec<String>,
}

impl TournamentFilter {
    pub fn new(source: &SourceConfig, catalog: &CatalogConfig) -> Self {
        Self {
            sport_id: source.sport_id.clone(),
            sport_name: source.sport_name.clone(),
            excluded_keywords: catalog.excluded_keywords.clone(),
            category_keywords: catalog.category_keywords.clone(),
        }
    }

    fn is_sport(&self, group: &SportGroup) -> bool {
        let id_match = group.id.as_deref().map(str::trim) == Some(self.sport_id.trim());
        let name_match = group
            .name
            .as_deref()
            .map(|n| n.trim().eq_ignore_ascii_case(self.sport_name.trim()))
            .unwrap_or(false);
        id_match || name_match
    }

    fn matches_any(name: &str, keywords: &[String]) -> Option<String> {
        let lowered = name.to_lowercase();
        keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .find(|k| !k.is_empty() && lowered.contains(k.as_str()))
    }

    /// Tournaments of the target sport that survive both exclusion filters,
    /// in catalog order. A missing sport yields an empty list.
    pub fn select(&self, groups: &[SportGroup]) -> Vec<Tournament> {
        let Some(sport) = groups.iter().find(|g| self.is_sport(g)) else {
            info!(
                "Sport '{}' ({}) not listed in catalog, nothing to do",
                self.sport_name, self.sport_id
            );
            return Vec::new();
        };

        let mut tournaments = Vec::new();
        for child in &sport.children {
            if let Some(keyword) = Self::matches_any(&child.name, &self.excluded_keywords) {
                debug!("Skipping {} (sourced elsewhere: '{}')", child.name, keyword);
                continue;
            }
            if let Some(keyword) = Self::matches_any(&child.name, &self.category_keywords) {
                debug!("Skipping {} (category '{}')", child.name, keyword);
                continue;
            }
            let Some(id) = child
                .id
                .as_deref()
                .and_then(|id| id.trim().parse::<TournamentId>().ok())
            else {
                debug!("Skipping {} (no numeric id)", child.name);
                continue;
            };
            tournaments.push(Tournament {
                id,
                name: child.name.clone(),
                slug: child.slug.clone(),
            });
        }
        tournaments
    }
}

/// Fetches the discovery document and resolves the cycle's tournaments
pub struct CatalogResolver {
    client: Client,
    url: String,
    filter: TournamentFilter,
    retry: RetryConfig,
}

impl CatalogResolver {
    pub fn new(source: &SourceConfig, catalog: &CatalogConfig, browser: &BrowserConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(browser.user_agent.clone())
            .timeout(Duration::from_secs(catalog.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: source.catalog_url.clone(),
            filter: TournamentFilter::new(source, catalog),
            retry: RetryConfig::catalog(),
        })
    }

    /// Resolve the tournaments to capture this cycle.
    ///
    /// A non-success status or malformed document fails the cycle.
    pub async fn resolve(&self) -> Result<Vec<Tournament>> {
        let body = retry_when(
            &self.retry,
            "catalog fetch",
            || self.fetch(),
            HarvestError::is_transient,
        )
        .await?;
        let groups = CatalogParser::parse(&body)?;
        let tournaments = self.filter.select(&groups);
        info!("Resolved {} tournament(s) from catalog", tournaments.len());
        Ok(tournaments)
    }

    async fn fetch(&self) -> Result<String> {
        debug!("Fetching catalog from {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::CatalogStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog_body() -> serde_json::Value {
        json!({
            "sports": [
                {"id": "2", "name": "Basketball", "eventGroups": [
                    {"eventGroupId": 42, "name": "NBA"}
                ]},
                {"id": "6", "name": "Tennis", "eventGroups": [
                    {"eventGroupId": 12345, "name": "ATP - Delray Beach"},
                    {"eventGroupId": 12346, "name": "WTA Doubles - Delray Beach"}
                ]}
            ]
        })
    }

    async fn resolver_for(server: &MockServer, catalog: CatalogConfig) -> CatalogResolver {
        let source = SourceConfig {
            catalog_url: format!("{}/api/sports", server.uri()),
            ..Default::default()
        };
        CatalogResolver::new(&source, &catalog, &BrowserConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_excludes_doubles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(catalog_body()))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, CatalogConfig::default()).await;
        let tournaments = resolver.resolve().await.unwrap();

        assert_eq!(
            tournaments,
            vec![Tournament {
                id: 12345,
                name: "ATP - Delray Beach".to_string(),
                slug: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_non_success_status_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, CatalogConfig::default()).await;
        assert!(matches!(
            resolver.resolve().await,
            Err(HarvestError::CatalogStatus { status: 403 })
        ));
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>challenge</html>"))
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, CatalogConfig::default()).await;
        assert!(matches!(
            resolver.resolve().await,
            Err(HarvestError::CatalogMalformed(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_sport_is_empty_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"sports": [{"id": "2", "name": "Basketball"}]})),
            )
            .mount(&server)
            .await;

        let resolver = resolver_for(&server, CatalogConfig::default()).await;
        assert!(resolver.resolve().await.unwrap().is_empty());
    }

    #[test]
    fn test_filters_apply_in_order_and_keep_catalog_order() {
        let groups = CatalogParser::parse(
            &json!([{"displayName": "tennis", "leagues": [
                {"id": 3, "name": "WTA - Dubai"},
                {"id": 1, "name": "ATP - Indian Wells"},
                {"id": 7, "name": "ATP Doubles - Dubai"},
                {"id": "x", "name": "Exhibition"},
                {"id": 2, "name": "Davis Cup"}
            ]}])
            .to_string(),
        )
        .unwrap();

        let filter = TournamentFilter {
            sport_id: "6".to_string(),
            sport_name: "Tennis".to_string(),
            excluded_keywords: vec!["indian wells".to_string(), " ".to_string()],
            category_keywords: vec!["Doubles".to_string()],
        };
        let ids: Vec<TournamentId> = filter.select(&groups).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_sport_matched_by_id() {
        let groups = CatalogParser::parse(
            &json!({"groups": [{"sportId": 6, "name": "Tenis", "children": [
                {"leagueId": 9, "name": "ATP - Doha", "slug": "atp-doha"}
            ]}]})
            .to_string(),
        )
        .unwrap();
        let filter = TournamentFilter::new(&SourceConfig::default(), &CatalogConfig::default());
        let tournaments = filter.select(&groups);
        assert_eq!(tournaments[0].slug.as_deref(), Some("atp-doha"));
    }
}
