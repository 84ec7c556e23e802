use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{CandidateMap, JobId, NewInvitation, WorkerId};
use super::store::{InvitationStore, StoreError};

pub const DEFAULT_FANOUT_CONCURRENCY: usize = 8;

/// Turns a candidate map into invitation rows, one independent write per worker.
pub struct InvitationFanOut<I> {
    invitations: Arc<I>,
    concurrency: usize,
}

impl<I> InvitationFanOut<I>
where
    I: InvitationStore + 'static,
{
    pub fn new(invitations: Arc<I>, concurrency: usize) -> Self {
        Self {
            invitations,
            concurrency: concurrency.max(1),
        }
    }

    /// Writes an invitation for every candidate that does not already have one.
    ///
    /// Failures are collected per worker; completed writes are never undone.
    pub async fn fan_out(&self, job_id: &JobId, candidates: CandidateMap) -> FanOutReport {
        let created_at = Utc::now();
        let writes = candidates
            .into_iter()
            .filter(|(_, matched_skills)| !matched_skills.is_empty())
            .map(|(worker_id, matched_skills)| {
                let invitation = NewInvitation {
                    job_id: job_id.clone(),
                    worker_id: worker_id.clone(),
                    matched_skills,
                    created_at,
                };
                let store = Arc::clone(&self.invitations);
                async move { (worker_id, store.insert_if_absent(invitation).await) }
            });

        let results: Vec<(WorkerId, Result<bool, StoreError>)> = stream::iter(writes)
            .buffer_unordered(self.concurrency)
            .map(|(worker_id, result)| (worker_id, result.map(|outcome| outcome.created)))
            .collect()
            .await;

        let mut report = FanOutReport::default();
        for (worker_id, result) in results {
            match result {
                Ok(true) => report.created.push(worker_id),
                Ok(false) | Err(StoreError::Conflict) => report.already_invited.push(worker_id),
                Err(error) => {
                    warn!(job_id = %job_id, worker_id = %worker_id, %error, "invitation write failed");
                    report.failed.push(FailedInvitation {
                        worker_id,
                        reason: error.to_string(),
                    });
                }
            }
        }
        report.sort();

        debug!(
            job_id = %job_id,
            created = report.created.len(),
            already_invited = report.already_invited.len(),
            failed = report.failed.len(),
            "invitation fan-out finished"
        );

        report
    }
}

/// Per-worker outcome of a fan-out run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub created: Vec<WorkerId>,
    pub already_invited: Vec<WorkerId>,
    pub failed: Vec<FailedInvitation>,
}

impl FanOutReport {
    /// Number of invitation rows this run actually created.
    pub fn invited_count(&self) -> usize {
        self.created.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Workers whose write failed, ready to be retried.
    pub fn retry_candidates(&self, candidates: &CandidateMap) -> CandidateMap {
        self.failed
            .iter()
            .filter_map(|failure| {
                candidates
                    .get_key_value(&failure.worker_id)
                    .map(|(worker_id, skills)| (worker_id.clone(), skills.clone()))
            })
            .collect()
    }

    fn sort(&mut self) {
        self.created.sort();
        self.already_invited.sort();
        self.failed
            .sort_by(|left, right| left.worker_id.cmp(&right.worker_id));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedInvitation {
    pub worker_id: WorkerId,
    pub reason: String,
}
