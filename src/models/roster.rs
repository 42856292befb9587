//! Roster view request and response bodies.

use serde::{Deserialize, Serialize};

use super::CandidateDetail;
use crate::errors::ErrorKind;

/// Columns the roster can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Login,
    Location,
    Email,
    HtmlUrl,
    Company,
    Id,
}

/// Request body for setting the free-text roster filter.
#[derive(Debug, Clone, Deserialize)]
pub struct SetQueryRequest {
    #[serde(default)]
    pub query: String,
}

/// Request body for toggling the sort column.
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleSortRequest {
    pub field: SortField,
}

/// Filtered and sorted roster, ready for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDisplay {
    pub candidates: Vec<CandidateDetail>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<SortField>,
    pub ascending: bool,
    /// Number of saved candidates before filtering.
    pub total: usize,
    /// Number of candidates passing the filter.
    pub matched: usize,
    /// One-time notice, e.g. that corrupt saved data was cleared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice_message: Option<String>,
}
