//! Local authority statistics derived from a query's applications.

use planscope_core::{ApplicationStatus, LocalAuthorityStats, PlanningApplication, PlanningClimate};

const FALLBACK_AUTHORITY_NAME: &str = "Local Planning Authority";
/// Approval rate assumed when nothing in the result has been decided.
const NEUTRAL_APPROVAL_RATE: f64 = 0.5;
/// Statutory eight-week target, used when no decision time can be measured.
const DEFAULT_DECISION_DAYS: u32 = 56;

/// Derives [`LocalAuthorityStats`] from canonical applications.
///
/// An application counts as decided when it carries a decision date or a
/// terminal approve/refuse status. The authority name comes from the first
/// application, which after sorting is the nearest one.
#[must_use]
pub fn derive_authority_stats(applications: &[PlanningApplication]) -> LocalAuthorityStats {
    let decided: Vec<&PlanningApplication> = applications
        .iter()
        .filter(|a| {
            a.decision_date.is_some()
                || matches!(
                    a.status,
                    ApplicationStatus::Approved | ApplicationStatus::Refused
                )
        })
        .collect();
    let approved = decided
        .iter()
        .filter(|a| a.status == ApplicationStatus::Approved)
        .count();

    let approval_rate = if decided.is_empty() {
        NEUTRAL_APPROVAL_RATE
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = approved as f64 / decided.len() as f64;
        rate
    };

    let name = applications
        .first()
        .and_then(|a| a.authority_name.clone())
        .unwrap_or_else(|| FALLBACK_AUTHORITY_NAME.to_string());

    LocalAuthorityStats {
        name,
        approval_rate,
        avg_decision_days: average_decision_days(&decided),
        climate: PlanningClimate::from_approval_rate(approval_rate),
    }
}

fn average_decision_days(decided: &[&PlanningApplication]) -> u32 {
    let durations: Vec<i64> = decided
        .iter()
        .filter_map(|a| {
            let days = (a.decision_date? - a.received_date?).num_days();
            (days >= 0).then_some(days)
        })
        .collect();

    if durations.is_empty() {
        return DEFAULT_DECISION_DAYS;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = durations.iter().sum::<i64>() as f64 / durations.len() as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = mean.round().clamp(0.0, f64::from(u32::MAX)) as u32;
    rounded
}
