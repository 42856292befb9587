//! Candidate records as served by the developer directory.
//!
//! Field names follow the directory's JSON (`avatar_url`, `html_url`, ...) so the
//! same shape is used on the wire, in the persisted roster and in API responses.

use serde::{Deserialize, Serialize};

/// Minimal directory record returned by a batch search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    /// Unique username; the primary key for every set operation.
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Enriched directory record. A detail with an empty `login` means the
/// directory has no such user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDetail {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl CandidateDetail {
    /// Whether the directory actually resolved this record.
    pub fn is_resolved(&self) -> bool {
        !self.login.is_empty()
    }
}

impl From<CandidateSummary> for CandidateDetail {
    fn from(summary: CandidateSummary) -> Self {
        Self {
            login: summary.login,
            id: summary.id,
            avatar_url: summary.avatar_url,
            html_url: summary.html_url,
            name: summary.name,
            ..Default::default()
        }
    }
}

impl From<&CandidateSummary> for CandidateDetail {
    fn from(summary: &CandidateSummary) -> Self {
        summary.clone().into()
    }
}
