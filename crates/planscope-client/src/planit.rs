//! Client for the PlanIt planning-applications API (the primary source).

use std::time::Duration;

use chrono::NaiveDate;
use planscope_core::{PlanningApplication, QueryOptions};
use reqwest::Url;

use crate::error::{BuildError, ErrorDetails};
use crate::executor::{RequestExecutor, RequestOptions};
use crate::normalize::normalize_applications;
use crate::types::PlanItResponse;

const SOURCE_NAME: &str = "PlanIt API";
const APPLICATIONS_PATH: &str = "api/applics/json";
const HEALTH_PATH: &str = "api/areas/json";
const SORT_ORDER: &str = "start_date.desc.nullslast";

/// Fetches nearby applications from PlanIt and normalizes them.
#[derive(Debug, Clone)]
pub struct PlanItClient {
    executor: RequestExecutor,
    base_url: Url,
    timeout: Duration,
    page_size: u32,
    max_retries: u32,
}

impl PlanItClient {
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        executor: RequestExecutor,
        base_url: &str,
        timeout: Duration,
        page_size: u32,
        max_retries: u32,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            executor,
            base_url: parse_base_url(base_url)?,
            timeout,
            page_size,
            max_retries,
        })
    }

    /// Fetches applications within `radius_m` of the point, nearest first.
    ///
    /// # Errors
    ///
    /// Returns the classified failure once the executor gives up, or
    /// [`ErrorKind::Parse`](crate::ErrorKind::Parse) if the body is not a
    /// PlanIt record list.
    pub async fn fetch_applications(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        options: &QueryOptions,
    ) -> Result<Vec<PlanningApplication>, ErrorDetails> {
        let url = self.applications_url(lat, lng, radius_m, options);
        tracing::debug!(url = %url, "fetching planning applications");

        let request = RequestOptions::new(self.timeout, self.max_retries).accept_json();
        let response = self.executor.execute(&url, &request).await?;
        let body: PlanItResponse = self.executor.decode_json(response, SOURCE_NAME).await?;

        let raw_count = body.records.len();
        let applications = normalize_applications(body.records, lat, lng);
        tracing::debug!(
            raw_count,
            reported_count = body.count,
            page_size = body.page_size,
            kept = applications.len(),
            "normalized planning applications"
        );
        Ok(applications)
    }

    /// Lightweight reachability probe: one attempt, no retries.
    pub async fn check_health(&self, timeout: Duration) -> bool {
        let mut url = self.endpoint(HEALTH_PATH);
        url.query_pairs_mut().append_pair("limit", "1");
        let request = RequestOptions::new(timeout, 0).accept_json();
        match self.executor.execute(&url, &request).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(kind = %e.kind, error = %e.message, "health probe failed");
                false
            }
        }
    }

    fn applications_url(&self, lat: f64, lng: f64, radius_m: u32, options: &QueryOptions) -> Url {
        let mut url = self.endpoint(APPLICATIONS_PATH);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("lat", &lat.to_string());
            pairs.append_pair("lng", &lng.to_string());
            pairs.append_pair("krad", &(f64::from(radius_m) / 1_000.0).to_string());
            pairs.append_pair("pg_sz", &self.page_size.to_string());
            pairs.append_pair("sort", SORT_ORDER);
            if let Some(from) = options.from_date {
                pairs.append_pair("start_date", &format_date(from));
            }
            if let Some(to) = options.to_date {
                pairs.append_pair("end_date", &format_date(to));
            }
        }
        url
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("{}{path}", self.base_url.path()));
        url
    }
}

/// Normalises a base URL so it ends with exactly one slash.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, BuildError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| BuildError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
