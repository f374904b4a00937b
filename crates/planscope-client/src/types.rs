//! Wire shapes of the two upstream APIs.
//!
//! These exist only between an HTTP response and normalization; nothing
//! outside this crate sees them.

use serde::Deserialize;

/// Body of the PlanIt `applics/json` endpoint.
#[derive(Debug, Deserialize)]
pub struct PlanItResponse {
    pub records: Vec<PlanItRecord>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// One planning application as PlanIt reports it.
#[derive(Debug, Default, Deserialize)]
pub struct PlanItRecord {
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub authority_name: Option<String>,
    #[serde(default)]
    pub area_name: Option<String>,
    /// Date received, `"YYYY-MM-DD"`.
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub decided_date: Option<String>,
    #[serde(default)]
    pub app_type: Option<String>,
    /// Free-form decision state, e.g. `"Permitted"`, `"Rejected"`.
    #[serde(default)]
    pub app_state: Option<String>,
}

/// Body of the planning data platform `entity.json` endpoint.
#[derive(Debug, Deserialize)]
pub struct EntityResponse {
    #[serde(default)]
    pub entities: Vec<PlanningDataEntity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanningDataEntity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "designation-date")]
    pub designation_date: Option<String>,
    #[serde(default, rename = "start-date")]
    pub start_date: Option<String>,
    #[serde(default, rename = "listed-building-grade")]
    pub listed_building_grade: Option<String>,
    #[serde(default, rename = "documentation-url")]
    pub documentation_url: Option<String>,
    #[serde(default, rename = "document-url")]
    pub document_url: Option<String>,
}
