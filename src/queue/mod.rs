//! Candidate review queue.
//!
//! Holds one batch of candidate summaries and a cursor over it. The candidate
//! at the cursor is enriched with a detail fetch in the background; accepting
//! appends it to the roster, rejecting just moves on. Passing the last entry
//! exhausts the queue until it is initialized again.
//!
//! Every cursor move and every (re)initialization bumps a generation counter.
//! Background results are applied only if the generation they were issued
//! under is still current when they arrive, so a slow fetch for an old cursor
//! can never overwrite a newer candidate.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::db::RosterStore;
use crate::directory::DirectoryClient;
use crate::errors::{AppError, ErrorKind};
use crate::models::{CandidateDetail, CandidateSummary, QueuePhase, QueueSnapshot};

/// Result of a queue operation.
#[derive(Debug)]
pub struct QueueTransition {
    pub snapshot: QueueSnapshot,
    /// Enrichment started by this operation, if any. Dropping the handle
    /// detaches the task.
    pub enrichment: Option<JoinHandle<()>>,
}

/// Identifies the cursor position an enrichment was issued for.
#[derive(Debug, Clone)]
struct FocusTicket {
    generation: u64,
    login: String,
}

#[derive(Debug)]
struct QueueState {
    phase: QueuePhase,
    batch: Vec<CandidateSummary>,
    cursor: usize,
    focused: Option<CandidateDetail>,
    enriching: bool,
    last_error: Option<ErrorKind>,
    generation: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            phase: QueuePhase::Idle,
            batch: Vec::new(),
            cursor: 0,
            focused: None,
            enriching: false,
            last_error: None,
            generation: 0,
        }
    }

    /// Record for the candidate in focus: detail if loaded, else the summary.
    fn current(&self) -> Option<CandidateDetail> {
        if self.phase != QueuePhase::Ready {
            return None;
        }
        self.focused
            .clone()
            .or_else(|| self.batch.get(self.cursor).map(CandidateDetail::from))
    }

    fn ticket(&mut self) -> Option<FocusTicket> {
        let login = self.batch.get(self.cursor)?.login.clone();
        self.enriching = true;
        Some(FocusTicket {
            generation: self.generation,
            login,
        })
    }

    /// Move past the current candidate. Returns the ticket for the next
    /// enrichment, or `None` once the batch is exhausted.
    fn advance(&mut self) -> Option<FocusTicket> {
        self.generation += 1;
        self.focused = None;
        self.enriching = false;
        self.last_error = None;

        if self.cursor + 1 < self.batch.len() {
            self.cursor += 1;
            self.ticket()
        } else {
            tracing::info!("No more candidates in batch");
            self.batch.clear();
            self.cursor = 0;
            self.phase = QueuePhase::Exhausted;
            None
        }
    }

    fn require_ready(&self) -> Result<(), AppError> {
        if self.phase == QueuePhase::Ready {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "No candidate in focus (queue is {:?})",
                self.phase
            )))
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            phase: self.phase,
            candidate: self.current(),
            detail_loaded: self.focused.is_some(),
            cursor: self.cursor,
            batch_length: self.batch.len(),
            loading: self.phase == QueuePhase::Loading,
            enriching: self.enriching,
            error: self.last_error,
            error_message: self.last_error.map(|kind| kind.message().to_string()),
            exhausted: self.phase == QueuePhase::Exhausted,
        }
    }
}

/// Review queue over one directory batch.
#[derive(Clone)]
pub struct ReviewQueue {
    directory: Arc<dyn DirectoryClient>,
    roster: Arc<RosterStore>,
    state: Arc<Mutex<QueueState>>,
    batch_size: usize,
}

impl ReviewQueue {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        roster: Arc<RosterStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            directory,
            roster,
            state: Arc::new(Mutex::new(QueueState::new())),
            batch_size: batch_size.max(1),
        }
    }

    /// Current queue state.
    pub async fn snapshot(&self) -> QueueSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Fetch a fresh batch and focus its first candidate.
    ///
    /// Failures are recorded in the snapshot (`FetchFailed`, `EmptyResult`)
    /// rather than returned.
    pub async fn initialize(&self) -> QueueTransition {
        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.phase = QueuePhase::Loading;
            state.batch.clear();
            state.cursor = 0;
            state.focused = None;
            state.enriching = false;
            state.last_error = None;
            state.generation
        };

        let result = self.directory.search_batch().await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            tracing::debug!("Discarding batch from superseded initialization");
            return QueueTransition {
                snapshot: state.snapshot(),
                enrichment: None,
            };
        }

        let mut enrichment = None;
        match result {
            Ok(mut batch) => {
                batch.retain(|c| !c.login.is_empty());
                batch.truncate(self.batch_size);
                tracing::info!("Fetched batch of {} candidates", batch.len());

                if batch.is_empty() {
                    state.phase = QueuePhase::Empty;
                    state.last_error = Some(ErrorKind::EmptyResult);
                } else {
                    state.batch = batch;
                    state.phase = QueuePhase::Ready;
                    enrichment = state.ticket().map(|t| self.spawn_enrichment(t));
                }
            }
            Err(e) => {
                tracing::warn!("Failed to fetch candidate batch: {}", e);
                state.phase = QueuePhase::Failed;
                state.last_error = Some(ErrorKind::FetchFailed);
            }
        }

        QueueTransition {
            snapshot: state.snapshot(),
            enrichment,
        }
    }

    /// Save the focused candidate to the roster and move on.
    ///
    /// `candidate` must be the one in focus (matched by login); the queue
    /// stores its own record for it. If the roster write fails the cursor
    /// stays put and `StorageFailed` is recorded.
    pub async fn accept(&self, candidate: &CandidateDetail) -> Result<QueueTransition, AppError> {
        let mut state = self.state.lock().await;
        state.require_ready()?;

        let current = state
            .current()
            .ok_or_else(|| AppError::InvalidState("No candidate in focus".to_string()))?;
        if current.login != candidate.login {
            return Err(AppError::InvalidState(format!(
                "Candidate {} is not in focus",
                candidate.login
            )));
        }

        match self.roster.append(current).await {
            Ok(outcome) => {
                if outcome.inserted {
                    tracing::info!(
                        "Accepted candidate {} (roster revision {})",
                        candidate.login,
                        outcome.revision
                    );
                } else {
                    tracing::info!("Candidate {} was already saved", candidate.login);
                }
            }
            Err(e) => {
                tracing::error!("Failed to save candidate {}: {}", candidate.login, e);
                state.last_error = Some(ErrorKind::StorageFailed);
                return Ok(QueueTransition {
                    snapshot: state.snapshot(),
                    enrichment: None,
                });
            }
        }

        let enrichment = state.advance().map(|t| self.spawn_enrichment(t));
        Ok(QueueTransition {
            snapshot: state.snapshot(),
            enrichment,
        })
    }

    /// Skip the focused candidate without touching the roster.
    pub async fn reject(&self) -> Result<QueueTransition, AppError> {
        let mut state = self.state.lock().await;
        state.require_ready()?;

        tracing::debug!("Rejected candidate at cursor {}", state.cursor);
        let enrichment = state.advance().map(|t| self.spawn_enrichment(t));
        Ok(QueueTransition {
            snapshot: state.snapshot(),
            enrichment,
        })
    }

    fn spawn_enrichment(&self, ticket: FocusTicket) -> JoinHandle<()> {
        let queue = self.clone();
        tokio::spawn(async move { queue.enrich(ticket).await })
    }

    /// Fetch details for `ticket` and apply them if still current.
    ///
    /// Unresolvable candidates are skipped in place, continuing with the next
    /// cursor under the same task.
    async fn enrich(&self, mut ticket: FocusTicket) {
        loop {
            let result = self.directory.fetch_detail(&ticket.login).await;

            let mut state = self.state.lock().await;
            if state.generation != ticket.generation {
                tracing::debug!("Discarding stale detail for {}", ticket.login);
                return;
            }
            state.enriching = false;

            match result {
                Ok(detail) if !detail.is_resolved() => {
                    tracing::info!("Directory has no record for {}, skipping", ticket.login);
                    match state.advance() {
                        Some(next) => ticket = next,
                        None => return,
                    }
                }
                Ok(detail) => {
                    state.focused = Some(detail);
                    return;
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch details for {}: {}", ticket.login, e);
                    state.last_error = Some(ErrorKind::FetchFailed);
                    return;
                }
            }
        }
    }
}
