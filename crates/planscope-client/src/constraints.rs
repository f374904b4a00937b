//! Fan-out over the planning data platform's constraint datasets.

use std::time::Duration;

use futures::future::join_all;
use planscope_core::{ConstraintDataset, PlanningConstraint};
use reqwest::Url;

use crate::error::{BuildError, ErrorDetails};
use crate::executor::{RequestExecutor, RequestOptions};
use crate::normalize::normalize_constraint;
use crate::planit::parse_base_url;
use crate::types::EntityResponse;

const SOURCE_NAME: &str = "Planning Data API";
const ENTITY_PATH: &str = "entity.json";

/// Queries every [`ConstraintDataset`] concurrently and merges the results.
///
/// A dataset that fails contributes nothing; it never fails the aggregate.
#[derive(Debug, Clone)]
pub struct ConstraintAggregator {
    executor: RequestExecutor,
    base_url: Url,
    timeout: Duration,
    max_retries: u32,
    limit: u32,
}

impl ConstraintAggregator {
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        executor: RequestExecutor,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
        limit: u32,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            executor,
            base_url: parse_base_url(base_url)?,
            timeout,
            max_retries,
            limit,
        })
    }

    /// Fetches constraints at a point from all datasets.
    ///
    /// Resolves once every dataset request has settled. Results are
    /// concatenated in [`ConstraintDataset::ALL`] order.
    pub async fn fetch_constraints(&self, lat: f64, lng: f64) -> Vec<PlanningConstraint> {
        let per_dataset = join_all(ConstraintDataset::ALL.into_iter().map(|dataset| async move {
            match self.fetch_dataset(dataset, lat, lng).await {
                Ok(constraints) => {
                    tracing::debug!(
                        dataset = %dataset,
                        count = constraints.len(),
                        "fetched constraint dataset"
                    );
                    constraints
                }
                Err(e) => {
                    tracing::warn!(
                        dataset = %dataset,
                        kind = %e.kind,
                        error = %e.message,
                        "constraint dataset fetch failed; continuing without it"
                    );
                    Vec::new()
                }
            }
        }))
        .await;

        per_dataset.into_iter().flatten().collect()
    }

    async fn fetch_dataset(
        &self,
        dataset: ConstraintDataset,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<PlanningConstraint>, ErrorDetails> {
        let url = self.dataset_url(dataset, lat, lng);
        let request = RequestOptions::new(self.timeout, self.max_retries).accept_json();
        let response = self.executor.execute(&url, &request).await?;
        let body: EntityResponse = self.executor.decode_json(response, SOURCE_NAME).await?;
        Ok(body
            .entities
            .into_iter()
            .map(|entity| normalize_constraint(entity, dataset))
            .collect())
    }

    fn dataset_url(&self, dataset: ConstraintDataset, lat: f64, lng: f64) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("{}{ENTITY_PATH}", self.base_url.path()));
        url.query_pairs_mut()
            .append_pair("dataset", dataset.as_str())
            .append_pair("latitude", &lat.to_string())
            .append_pair("longitude", &lng.to_string())
            .append_pair("limit", &self.limit.to_string());
        url
    }
}
