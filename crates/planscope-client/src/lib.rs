//! Resilient retrieval of planning data for a point.
//!
//! [`PlanningDataService`] is the entry point: it reads through the
//! persistent cache, falls back to cached data when offline, fetches
//! applications from PlanIt and constraints from the planning data
//! platform concurrently, and classifies every failure as an
//! [`ErrorDetails`].

pub mod constraints;
pub mod error;
pub mod executor;
pub mod network;
pub mod normalize;
pub mod planit;
pub mod service;
pub mod stats;
pub mod types;

pub use constraints::ConstraintAggregator;
pub use error::{classify, BuildError, ErrorDetails, ErrorKind, Failure};
pub use executor::{RequestExecutor, RequestOptions, RetryPolicy};
pub use network::NetworkStatus;
pub use planit::PlanItClient;
pub use service::PlanningDataService;
pub use stats::derive_authority_stats;
