//! Normalization of upstream records into the canonical planning model.

use chrono::NaiveDate;
use planscope_core::{
    haversine_distance_m, ApplicationStatus, ConstraintDataset, PlanningApplication,
    PlanningConstraint,
};

use crate::types::{PlanItRecord, PlanningDataEntity};

/// Maps PlanIt's free-form `app_state` to an [`ApplicationStatus`].
///
/// Undecided, referred, unresolved and unrecognised states are all pending.
#[must_use]
pub fn map_app_state(app_state: Option<&str>) -> ApplicationStatus {
    match app_state.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("permitted" | "conditions") => ApplicationStatus::Approved,
        Some("rejected") => ApplicationStatus::Refused,
        Some("withdrawn") => ApplicationStatus::Withdrawn,
        _ => ApplicationStatus::Pending,
    }
}

/// Parses a `"YYYY-MM-DD"` date, tolerating a trailing time component.
#[must_use]
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Coordinates are usable when both are present, finite, in range, and not
/// the `(0, 0)` placeholder.
fn usable_coordinates(lat: Option<f64>, lng: Option<f64>) -> Option<(f64, f64)> {
    let (lat, lng) = (lat?, lng?);
    let in_range = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);
    #[allow(clippy::float_cmp)]
    let null_island = lat == 0.0 && lng == 0.0;
    (in_range && !null_island).then_some((lat, lng))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Converts a PlanIt record into a [`PlanningApplication`] relative to the
/// query point, or `None` when the record has no usable coordinates.
#[must_use]
pub fn normalize_application(
    record: PlanItRecord,
    query_lat: f64,
    query_lng: f64,
) -> Option<PlanningApplication> {
    let (lat, lng) = usable_coordinates(record.lat, record.lng)?;
    let distance = haversine_distance_m(query_lat, query_lng, lat, lng).round();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let distance_meters = distance.clamp(0.0, f64::from(u32::MAX)) as u32;

    let id = non_empty(record.reference)
        .or_else(|| non_empty(record.uid))
        .or_else(|| non_empty(record.name))
        .unwrap_or_else(|| "unknown".to_string());

    Some(PlanningApplication {
        id,
        address: non_empty(record.address).unwrap_or_else(|| "Address not available".to_string()),
        lat,
        lng,
        distance_meters,
        status: map_app_state(record.app_state.as_deref()),
        decision_date: record.decided_date.as_deref().and_then(parse_date),
        received_date: record.start_date.as_deref().and_then(parse_date),
        application_type: non_empty(record.app_type).unwrap_or_else(|| "Unknown".to_string()),
        summary: non_empty(record.description)
            .unwrap_or_else(|| "No description available".to_string()),
        source_url: non_empty(record.url).or_else(|| non_empty(record.link)),
        authority_name: non_empty(record.authority_name).or_else(|| non_empty(record.area_name)),
    })
}

/// Normalizes a batch of records, dropping those without coordinates and
/// sorting nearest first. The sort is stable, so equidistant records keep
/// upstream order.
#[must_use]
pub fn normalize_applications(
    records: Vec<PlanItRecord>,
    query_lat: f64,
    query_lng: f64,
) -> Vec<PlanningApplication> {
    let mut applications: Vec<PlanningApplication> = records
        .into_iter()
        .filter_map(|r| normalize_application(r, query_lat, query_lng))
        .collect();
    applications.sort_by_key(|a| a.distance_meters);
    applications
}

#[must_use]
pub fn normalize_constraint(
    entity: PlanningDataEntity,
    dataset: ConstraintDataset,
) -> PlanningConstraint {
    PlanningConstraint {
        dataset,
        name: non_empty(entity.name).unwrap_or_else(|| "Unknown".to_string()),
        reference: non_empty(entity.reference),
        description: non_empty(entity.description),
        designation_date: non_empty(entity.designation_date)
            .or_else(|| non_empty(entity.start_date)),
        grade: non_empty(entity.listed_building_grade),
        document_url: non_empty(entity.documentation_url)
            .or_else(|| non_empty(entity.document_url)),
    }
}
