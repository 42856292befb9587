//! Review queue snapshot exposed to the UI.

use serde::{Deserialize, Serialize};

use super::CandidateDetail;
use crate::errors::ErrorKind;

/// Lifecycle phase of the review queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueuePhase {
    /// No batch requested yet.
    Idle,
    /// Batch fetch in flight.
    Loading,
    /// A candidate is in focus.
    Ready,
    /// The cursor passed the last batch entry.
    Exhausted,
    /// The directory returned no usable candidates.
    Empty,
    /// The batch fetch failed.
    Failed,
}

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub phase: QueuePhase,
    /// Focused candidate: the enriched detail, or the batch summary until it arrives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<CandidateDetail>,
    pub detail_loaded: bool,
    pub cursor: usize,
    pub batch_length: usize,
    pub loading: bool,
    pub enriching: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub exhausted: bool,
}
