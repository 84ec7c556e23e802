use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Invitation, Job, JobId, JobStatus};
use super::fanout::{FailedInvitation, InvitationFanOut};
use super::matching::{MatchError, MatchPolicy, MatchingEngine};
use super::store::{
    AccountRegistry, CompetencyStore, InvitationStore, JobStore, StoreError, Stores,
};

/// Tuning knobs for the approval flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalSettings {
    pub policy: MatchPolicy,
    pub fanout_concurrency: usize,
}

impl Default for ApprovalSettings {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            fanout_concurrency: super::fanout::DEFAULT_FANOUT_CONCURRENCY,
        }
    }
}

/// Service flipping a job to open and inviting every qualifying worker.
pub struct ApprovalService<C, A, I, J> {
    jobs: Arc<J>,
    invitations: Arc<I>,
    engine: MatchingEngine<C, A>,
    fan_out: InvitationFanOut<I>,
}

impl<C, A, I, J> ApprovalService<C, A, I, J>
where
    C: CompetencyStore + 'static,
    A: AccountRegistry + 'static,
    I: InvitationStore + 'static,
    J: JobStore + 'static,
{
    pub fn new(stores: Stores<C, A, I, J>, settings: ApprovalSettings) -> Self {
        let Stores {
            competencies,
            accounts,
            invitations,
            jobs,
        } = stores;

        Self {
            engine: MatchingEngine::new(competencies, accounts, settings.policy),
            fan_out: InvitationFanOut::new(invitations.clone(), settings.fanout_concurrency),
            invitations,
            jobs,
        }
    }

    /// Opens the job and invites matching active workers.
    ///
    /// Approving an open job re-runs matching; existing invitations are untouched.
    pub async fn approve(&self, job_id: &JobId) -> Result<ApprovalOutcome, ApprovalError> {
        let job = self
            .jobs
            .fetch(job_id)
            .await?
            .ok_or_else(|| ApprovalError::NotFound(job_id.clone()))?;

        if job.status == JobStatus::Closed {
            return Err(ApprovalError::JobClosed(job_id.clone()));
        }

        let job = match job.status {
            JobStatus::Open => job,
            _ => self.jobs.set_status(job_id, JobStatus::Open).await?,
        };

        if job.required_skills.is_empty() {
            info!(job_id = %job_id, "job approved without required skills; nobody to invite");
            return Ok(ApprovalOutcome::skipped(job, SkipReason::NoRequiredSkills));
        }

        let candidates = self.engine.match_workers(&job.required_skills).await?;
        if candidates.is_empty() {
            info!(job_id = %job_id, "job approved; no active workers matched");
            return Ok(ApprovalOutcome::skipped(job, SkipReason::NoCandidates));
        }

        let report = self.fan_out.fan_out(job_id, candidates).await;
        if !report.is_clean() {
            warn!(
                job_id = %job_id,
                failed = report.failed.len(),
                "some invitations could not be written; retrying approval is safe"
            );
        }
        info!(
            job_id = %job_id,
            invited = report.invited_count(),
            already_invited = report.already_invited.len(),
            "job approved"
        );

        Ok(ApprovalOutcome {
            invited_count: report.invited_count(),
            already_invited: report.already_invited.len(),
            failed: report.failed,
            skipped: None,
            job,
        })
    }

    /// Invitations recorded for a job, for operator inspection.
    pub async fn invitations(&self, job_id: &JobId) -> Result<Vec<Invitation>, ApprovalError> {
        if self.jobs.fetch(job_id).await?.is_none() {
            return Err(ApprovalError::NotFound(job_id.clone()));
        }

        Ok(self.invitations.invitations_for_job(job_id).await?)
    }
}

/// Result of a successful approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    pub job: Job,
    /// Rows created by this call; pre-existing invitations are not counted.
    pub invited_count: usize,
    pub already_invited: usize,
    pub failed: Vec<FailedInvitation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl ApprovalOutcome {
    fn skipped(job: Job, reason: SkipReason) -> Self {
        Self {
            job,
            invited_count: 0,
            already_invited: 0,
            failed: Vec::new(),
            skipped: Some(reason),
        }
    }

    /// Operator-facing summary, e.g. `approved, 3 invited`.
    pub fn summary(&self) -> String {
        let mut summary = format!("approved, {} invited", self.invited_count);
        if self.already_invited > 0 {
            summary.push_str(&format!(", {} already invited", self.already_invited));
        }
        if !self.failed.is_empty() {
            summary.push_str(&format!(", {} failed", self.failed.len()));
        }
        summary
    }
}

/// Why an approval finished without attempting any invitation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoRequiredSkills,
    NoCandidates,
}

/// Error raised by the approval service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApprovalError {
    #[error("job {0} not found")]
    NotFound(JobId),
    #[error("job {0} is closed and cannot be approved")]
    JobClosed(JobId),
    #[error("matching unavailable: {0}")]
    Matching(#[from] MatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApprovalError {
    /// True when a backing store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ApprovalError::Matching(_) | ApprovalError::Store(StoreError::Unavailable(_))
        )
    }
}
