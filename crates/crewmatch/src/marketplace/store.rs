use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use super::domain::{
    Competency, Invitation, Job, JobId, JobStatus, NewInvitation, SkillId, WorkerId,
};

/// Read access to workers' declared skills.
#[async_trait]
pub trait CompetencyStore: Send + Sync {
    /// Every competency whose skill is in `skill_ids`.
    async fn competencies_for_skills(
        &self,
        skill_ids: &BTreeSet<SkillId>,
    ) -> Result<Vec<Competency>, StoreError>;
}

/// Read access to the account registry.
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// The subset of `worker_ids` whose accounts are active.
    async fn active_worker_ids(
        &self,
        worker_ids: &BTreeSet<WorkerId>,
    ) -> Result<BTreeSet<WorkerId>, StoreError>;
}

/// Invitation persistence keyed by `(job_id, worker_id)`.
#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Creates the row only when no row exists for the key. An existing row is
    /// left untouched and reported with `created: false`.
    async fn insert_if_absent(&self, invitation: NewInvitation)
        -> Result<InsertOutcome, StoreError>;

    async fn invitations_for_job(&self, job_id: &JobId) -> Result<Vec<Invitation>, StoreError>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn fetch(&self, job_id: &JobId) -> Result<Option<Job>, StoreError>;

    /// Persists the new status and returns the updated job, or `NotFound`.
    async fn set_status(&self, job_id: &JobId, status: JobStatus) -> Result<Job, StoreError>;
}

/// Result of an insert-if-absent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub created: bool,
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// The collaborators the approval flow reads from and writes to, wired once.
pub struct Stores<C, A, I, J> {
    pub competencies: Arc<C>,
    pub accounts: Arc<A>,
    pub invitations: Arc<I>,
    pub jobs: Arc<J>,
}

impl<C, A, I, J> Clone for Stores<C, A, I, J> {
    fn clone(&self) -> Self {
        Self {
            competencies: Arc::clone(&self.competencies),
            accounts: Arc::clone(&self.accounts),
            invitations: Arc::clone(&self.invitations),
            jobs: Arc::clone(&self.jobs),
        }
    }
}
