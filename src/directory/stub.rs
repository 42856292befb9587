//! Scripted directory for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::DirectoryClient;
use crate::errors::AppError;
use crate::models::{CandidateDetail, CandidateSummary};

/// Directory whose responses are set up by the test.
///
/// Logins without a registered detail resolve to an empty record. A gated
/// login holds its detail response until [`StubDirectory::release`] is called.
#[derive(Default)]
pub struct StubDirectory {
    batch: Mutex<Vec<CandidateSummary>>,
    fail_batch: Mutex<bool>,
    details: Mutex<HashMap<String, CandidateDetail>>,
    failing_details: Mutex<HashSet<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    detail_calls: Mutex<Vec<String>>,
}

impl StubDirectory {
    /// Batch of `logins`, each with a resolvable detail.
    pub fn with_candidates(logins: &[&str]) -> Self {
        let stub = Self::default();
        let summaries: Vec<CandidateSummary> = logins
            .iter()
            .enumerate()
            .map(|(i, login)| summary(login, i as i64 + 1))
            .collect();
        for s in &summaries {
            stub.set_detail(detail_for(s));
        }
        stub.set_batch(summaries);
        stub
    }

    pub fn set_batch(&self, batch: Vec<CandidateSummary>) {
        *self.batch.lock().unwrap() = batch;
    }

    pub fn fail_batch(&self, fail: bool) {
        *self.fail_batch.lock().unwrap() = fail;
    }

    pub fn set_detail(&self, detail: CandidateDetail) {
        self.details
            .lock()
            .unwrap()
            .insert(detail.login.clone(), detail);
    }

    /// Make `login` resolve to an empty record.
    pub fn unresolve(&self, login: &str) {
        self.details.lock().unwrap().remove(login);
    }

    pub fn fail_detail(&self, login: &str) {
        self.failing_details
            .lock()
            .unwrap()
            .insert(login.to_string());
    }

    /// Hold detail responses for `login` until released.
    pub fn gate(&self, login: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(login.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, login: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(login) {
            gate.notify_one();
        }
    }

    /// Logins whose detail has been requested, in call order.
    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryClient for StubDirectory {
    async fn search_batch(&self) -> Result<Vec<CandidateSummary>, AppError> {
        if *self.fail_batch.lock().unwrap() {
            return Err(AppError::Directory("stub batch failure".to_string()));
        }
        Ok(self.batch.lock().unwrap().clone())
    }

    async fn fetch_detail(&self, login: &str) -> Result<CandidateDetail, AppError> {
        self.detail_calls.lock().unwrap().push(login.to_string());

        let gate = self.gates.lock().unwrap().get(login).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.failing_details.lock().unwrap().contains(login) {
            return Err(AppError::Directory(format!("stub detail failure for {}", login)));
        }

        Ok(self
            .details
            .lock()
            .unwrap()
            .get(login)
            .cloned()
            .unwrap_or_default())
    }
}

pub fn summary(login: &str, id: i64) -> CandidateSummary {
    CandidateSummary {
        login: login.to_string(),
        id,
        avatar_url: Some(format!("https://avatars.example/{}", id)),
        html_url: Some(format!("https://github.com/{}", login)),
        name: None,
    }
}

pub fn detail_for(summary: &CandidateSummary) -> CandidateDetail {
    CandidateDetail {
        name: Some(format!("{} (detail)", summary.login)),
        location: Some("Remote".to_string()),
        company: Some(format!("{} Co", summary.login)),
        ..CandidateDetail::from(summary)
    }
}
