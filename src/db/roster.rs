//! Persisted roster of accepted candidates.
//!
//! The roster is one JSON array stored under [`ROSTER_KEY`]. Every mutation
//! rewrites the whole snapshot. Unparseable data is replaced with an empty
//! roster and reported once through [`RosterStore::take_notice`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use super::KeyValueStore;
use crate::errors::{AppError, ErrorKind};
use crate::models::CandidateDetail;

/// Storage key for the accepted-candidate snapshot.
pub const ROSTER_KEY: &str = "savedCandidates";

/// Result of reading the persisted roster.
#[derive(Debug, Clone, Default)]
pub struct LoadedRoster {
    pub candidates: Vec<CandidateDetail>,
    pub revision: i64,
    /// The stored value was corrupt and has been reset to empty.
    pub recovered: bool,
}

/// Result of appending an accepted candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// False when the login was already on the roster.
    pub inserted: bool,
    pub revision: i64,
}

/// Load/save/remove access to the accepted-candidate roster.
pub struct RosterStore {
    kv: Arc<dyn KeyValueStore>,
    // Serializes read-modify-write cycles within this process.
    write_lock: AsyncMutex<()>,
    notice: Mutex<Option<ErrorKind>>,
}

impl RosterStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: AsyncMutex::new(()),
            notice: Mutex::new(None),
        }
    }

    /// Read the persisted roster.
    ///
    /// A missing value is an empty roster. A value that does not parse is
    /// overwritten with `[]` and flagged as `recovered`; only storage I/O
    /// failures are returned as errors.
    pub async fn load(&self) -> Result<LoadedRoster, AppError> {
        let _guard = self.write_lock.lock().await;
        self.load_unlocked().await
    }

    /// Overwrite the persisted roster and return the new revision.
    pub async fn save(&self, candidates: &[CandidateDetail]) -> Result<i64, AppError> {
        let _guard = self.write_lock.lock().await;
        self.save_unlocked(candidates).await
    }

    /// Add an accepted candidate unless its login is already present.
    pub async fn append(&self, candidate: CandidateDetail) -> Result<AppendOutcome, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut roster = self.load_unlocked().await?;

        if roster.candidates.iter().any(|c| c.login == candidate.login) {
            tracing::debug!("Candidate {} already on roster", candidate.login);
            return Ok(AppendOutcome {
                inserted: false,
                revision: roster.revision,
            });
        }

        roster.candidates.push(candidate);
        let revision = self.save_unlocked(&roster.candidates).await?;
        Ok(AppendOutcome {
            inserted: true,
            revision,
        })
    }

    /// Drop the candidate with `login`. Absent logins are a no-op.
    pub async fn remove(&self, login: &str) -> Result<LoadedRoster, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut roster = self.load_unlocked().await?;

        let before = roster.candidates.len();
        roster.candidates.retain(|c| c.login != login);
        if roster.candidates.len() == before {
            return Ok(roster);
        }

        roster.revision = self.save_unlocked(&roster.candidates).await?;
        Ok(roster)
    }

    /// Current write revision without parsing the snapshot.
    pub async fn revision(&self) -> i64 {
        match self.kv.get(ROSTER_KEY).await {
            Ok(stored) => stored.map(|s| s.revision).unwrap_or(0),
            Err(e) => {
                tracing::warn!("Failed to read roster revision, reporting 0: {}", e);
                0
            }
        }
    }

    /// Take the pending one-time notice, if any.
    pub fn take_notice(&self) -> Option<ErrorKind> {
        self.notice.lock().ok().and_then(|mut notice| notice.take())
    }

    async fn load_unlocked(&self) -> Result<LoadedRoster, AppError> {
        let Some(stored) = self.kv.get(ROSTER_KEY).await? else {
            return Ok(LoadedRoster::default());
        };

        match serde_json::from_str::<Vec<CandidateDetail>>(&stored.value) {
            Ok(candidates) => Ok(LoadedRoster {
                candidates: normalize(candidates),
                revision: stored.revision,
                recovered: false,
            }),
            Err(e) => {
                tracing::warn!("Saved roster is corrupt, resetting to empty: {}", e);
                let revision = self.kv.put(ROSTER_KEY, "[]").await?;
                if let Ok(mut notice) = self.notice.lock() {
                    *notice = Some(ErrorKind::CorruptData);
                }
                Ok(LoadedRoster {
                    candidates: Vec::new(),
                    revision,
                    recovered: true,
                })
            }
        }
    }

    async fn save_unlocked(&self, candidates: &[CandidateDetail]) -> Result<i64, AppError> {
        let json = serde_json::to_string(candidates)
            .map_err(|e| AppError::Internal(format!("Failed to encode roster: {}", e)))?;
        let revision = self.kv.put(ROSTER_KEY, &json).await?;
        tracing::debug!(
            "Saved roster with {} candidates (revision {})",
            candidates.len(),
            revision
        );
        Ok(revision)
    }
}

/// Drop entries without a login and keep the first entry per login.
fn normalize(candidates: Vec<CandidateDetail>) -> Vec<CandidateDetail> {
    let total = candidates.len();
    let mut seen = HashSet::new();
    let kept: Vec<CandidateDetail> = candidates
        .into_iter()
        .filter(|c| c.is_resolved() && seen.insert(c.login.clone()))
        .collect();

    if kept.len() != total {
        tracing::warn!(
            "Dropped {} saved entries with empty or duplicate logins",
            total - kept.len()
        );
    }
    kept
}
