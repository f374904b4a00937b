//! Canonical planning data shapes handed to downstream consumers.
//!
//! Every value here is constructed fresh per query and never mutated after
//! the [`PlanningResult`] is assembled. All types round-trip through serde so
//! a result can be cached by value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Decision state of a planning application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Approved,
    Refused,
    Pending,
    Withdrawn,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Approved => write!(f, "APPROVED"),
            ApplicationStatus::Refused => write!(f, "REFUSED"),
            ApplicationStatus::Pending => write!(f, "PENDING"),
            ApplicationStatus::Withdrawn => write!(f, "WITHDRAWN"),
        }
    }
}

/// A planning application near the query point.
///
/// `distance_meters` is measured from the query point and rounded to whole
/// metres. Records without usable coordinates never become a
/// `PlanningApplication`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningApplication {
    pub id: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub distance_meters: u32,
    pub status: ApplicationStatus,
    pub decision_date: Option<NaiveDate>,
    /// Date the application was received (the source's start date).
    pub received_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub application_type: String,
    pub summary: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub authority_name: Option<String>,
}

/// Constraint datasets queried on the planning data platform.
///
/// The list is closed: [`ConstraintDataset::ALL`] drives the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintDataset {
    ConservationArea,
    ListedBuilding,
    #[serde(rename = "article-4-direction-area")]
    Article4DirectionArea,
    GreenBelt,
    FloodRiskZone,
    TreePreservationZone,
    AreaOfOutstandingNaturalBeauty,
    ScheduledMonument,
    WorldHeritageSite,
    SiteOfSpecialScientificInterest,
    AncientWoodland,
}

impl ConstraintDataset {
    pub const ALL: [ConstraintDataset; 11] = [
        ConstraintDataset::ConservationArea,
        ConstraintDataset::ListedBuilding,
        ConstraintDataset::Article4DirectionArea,
        ConstraintDataset::GreenBelt,
        ConstraintDataset::FloodRiskZone,
        ConstraintDataset::TreePreservationZone,
        ConstraintDataset::AreaOfOutstandingNaturalBeauty,
        ConstraintDataset::ScheduledMonument,
        ConstraintDataset::WorldHeritageSite,
        ConstraintDataset::SiteOfSpecialScientificInterest,
        ConstraintDataset::AncientWoodland,
    ];

    /// Dataset identifier as used in the platform's `dataset` query parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintDataset::ConservationArea => "conservation-area",
            ConstraintDataset::ListedBuilding => "listed-building",
            ConstraintDataset::Article4DirectionArea => "article-4-direction-area",
            ConstraintDataset::GreenBelt => "green-belt",
            ConstraintDataset::FloodRiskZone => "flood-risk-zone",
            ConstraintDataset::TreePreservationZone => "tree-preservation-zone",
            ConstraintDataset::AreaOfOutstandingNaturalBeauty => {
                "area-of-outstanding-natural-beauty"
            }
            ConstraintDataset::ScheduledMonument => "scheduled-monument",
            ConstraintDataset::WorldHeritageSite => "world-heritage-site",
            ConstraintDataset::SiteOfSpecialScientificInterest => {
                "site-of-special-scientific-interest"
            }
            ConstraintDataset::AncientWoodland => "ancient-woodland",
        }
    }
}

impl std::fmt::Display for ConstraintDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A designation affecting the query point, from one constraint dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningConstraint {
    pub dataset: ConstraintDataset,
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub designation_date: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningClimate {
    ProDevelopment,
    Moderate,
    Restrictive,
}

impl PlanningClimate {
    /// Buckets an approval rate: `>= 0.85` pro-development, `>= 0.65`
    /// moderate, anything lower restrictive.
    #[must_use]
    pub fn from_approval_rate(rate: f64) -> Self {
        if rate >= 0.85 {
            PlanningClimate::ProDevelopment
        } else if rate >= 0.65 {
            PlanningClimate::Moderate
        } else {
            PlanningClimate::Restrictive
        }
    }
}

/// Statistics derived from the applications returned for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAuthorityStats {
    pub name: String,
    pub approval_rate: f64,
    pub avg_decision_days: u32,
    pub climate: PlanningClimate,
}

/// Top-level output of a planning query.
///
/// `applications` is sorted by ascending distance from the query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningResult {
    pub applications: Vec<PlanningApplication>,
    pub local_authority: LocalAuthorityStats,
    pub constraints: Vec<PlanningConstraint>,
}

/// Per-query options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    /// Bypass the cache-first read. Results are still written back.
    pub skip_cache: bool,
}

impl QueryOptions {
    /// Date-filtered queries skip the cache-first read and are never written
    /// back. The offline fallback may still serve them a cached result.
    #[must_use]
    pub fn has_date_filter(&self) -> bool {
        self.from_date.is_some() || self.to_date.is_some()
    }
}
