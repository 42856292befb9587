//! Developer directory client.
//!
//! The review queue only sees the [`DirectoryClient`] trait; [`GitHubDirectory`]
//! is the production implementation.

mod github;
#[cfg(test)]
pub mod stub;

pub use github::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{CandidateDetail, CandidateSummary};

/// Source of candidate batches and per-candidate details.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch one batch of candidate summaries using the default search.
    async fn search_batch(&self) -> Result<Vec<CandidateSummary>, AppError>;

    /// Fetch the enriched record for `login`.
    ///
    /// An unknown login yields a record with an empty `login`, not an error.
    async fn fetch_detail(&self, login: &str) -> Result<CandidateDetail, AppError>;
}
