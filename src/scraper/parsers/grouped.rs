//! Grouped-form odds documents: one `eventGroup` per tournament with nested
//! event → offer category → subcategory → offer → outcome arrays.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::json::{de_id, de_lenient_rows, de_lenient_vec, de_opt_id, de_opt_number};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventStatus {
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedEvent {
    #[serde(deserialize_with = "de_id")]
    pub event_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub event_status: Option<EventStatus>,
    #[serde(default)]
    pub team_name1: Option<String>,
    #[serde(default)]
    pub team_name2: Option<String>,
    #[serde(default)]
    pub team_short_name1: Option<String>,
    #[serde(default)]
    pub team_short_name2: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub odds_american: Option<String>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub odds_decimal: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_number")]
    pub line: Option<f64>,
    #[serde(default)]
    pub participant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub provider_offer_id: Option<String>,
    #[serde(deserialize_with = "de_id")]
    pub event_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferSubcategory {
    #[serde(default, deserialize_with = "de_lenient_rows")]
    pub offers: Vec<Vec<Offer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub offer_subcategory: Option<OfferSubcategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferCategory {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub offer_subcategory_descriptors: Vec<SubcategoryDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGroup {
    #[serde(deserialize_with = "de_id")]
    pub event_group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_lenient_vec")]
    pub events: Vec<GroupedEvent>,
    #[serde(default)]
    pub offer_categories: Vec<OfferCategory>,
}

/// A grouped-form response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedDocument {
    pub event_group: EventGroup,
}

impl GroupedDocument {
    /// Whether a JSON body looks like a grouped-form document.
    pub fn detect(body: &Value) -> bool {
        body.get("eventGroup").map(Value::is_object).unwrap_or(false)
    }

    /// The embedded tournament identifier.
    pub fn tournament_id(&self) -> &str {
        &self.event_group.event_group_id
    }

    /// Every offer in the document, flattened, in document order.
    pub fn offers(&self) -> impl Iterator<Item = &Offer> {
        self.event_group
            .offer_categories
            .iter()
            .flat_map(|c| c.offer_subcategory_descriptors.iter())
            .filter_map(|d| d.offer_subcategory.as_ref())
            .flat_map(|s| s.offers.iter())
            .flat_map(|row| row.iter())
    }
}
