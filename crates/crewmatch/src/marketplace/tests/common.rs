use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::marketplace::approval::{ApprovalService, ApprovalSettings};
use crate::marketplace::domain::{
    Competency, CompetencyStatus, Invitation, Job, JobId, JobStatus, NewInvitation,
    ProficiencyLevel, SkillId, WorkerId,
};
use crate::marketplace::memory::{
    MemoryAccountRegistry, MemoryCompetencyStore, MemoryInvitationStore, MemoryJobStore,
};
use crate::marketplace::store::{
    AccountRegistry, CompetencyStore, InsertOutcome, InvitationStore, StoreError, Stores,
};

pub(crate) fn skill(id: &str) -> SkillId {
    SkillId(id.to_string())
}

pub(crate) fn worker(id: &str) -> WorkerId {
    WorkerId(id.to_string())
}

pub(crate) fn job_id() -> JobId {
    JobId("J1".to_string())
}

pub(crate) fn skills(ids: &[&str]) -> BTreeSet<SkillId> {
    ids.iter().map(|id| skill(id)).collect()
}

pub(crate) fn competency(worker_id: &str, skill_id: &str) -> Competency {
    Competency {
        worker_id: worker(worker_id),
        skill_id: skill(skill_id),
        level: ProficiencyLevel::Intermediate,
        years_experience: 3,
        status: CompetencyStatus::Active,
    }
}

pub(crate) fn job(required: &[&str], status: JobStatus) -> Job {
    Job {
        id: job_id(),
        title: "Warehouse night shift".to_string(),
        required_skills: skills(required),
        status,
    }
}

/// Memory-backed fixture: J1 requires {S1, S2}; W1 {S1} active, W2 {S1, S2}
/// inactive, W3 {S3} active.
pub(crate) struct Fixture {
    pub(crate) competencies: Arc<MemoryCompetencyStore>,
    pub(crate) accounts: Arc<MemoryAccountRegistry>,
    pub(crate) invitations: Arc<FlakyInvitationStore>,
    pub(crate) jobs: Arc<MemoryJobStore>,
}

impl Fixture {
    pub(crate) fn new(job: Job) -> Self {
        let competencies = MemoryCompetencyStore::default();
        competencies.extend(vec![
            competency("W1", "S1"),
            competency("W2", "S1"),
            competency("W2", "S2"),
            competency("W3", "S3"),
        ]);

        let accounts = MemoryAccountRegistry::default();
        accounts.set_active(worker("W1"), true);
        accounts.set_active(worker("W2"), false);
        accounts.set_active(worker("W3"), true);

        let jobs = MemoryJobStore::default();
        jobs.insert(job).expect("fresh job store");

        Self {
            competencies: Arc::new(competencies),
            accounts: Arc::new(accounts),
            invitations: Arc::new(FlakyInvitationStore::default()),
            jobs: Arc::new(jobs),
        }
    }

    pub(crate) fn example() -> Self {
        Self::new(job(&["S1", "S2"], JobStatus::Draft))
    }

    pub(crate) fn service(
        &self,
    ) -> ApprovalService<
        MemoryCompetencyStore,
        MemoryAccountRegistry,
        FlakyInvitationStore,
        MemoryJobStore,
    > {
        ApprovalService::new(
            Stores {
                competencies: self.competencies.clone(),
                accounts: self.accounts.clone(),
                invitations: self.invitations.clone(),
                jobs: self.jobs.clone(),
            },
            ApprovalSettings::default(),
        )
    }

    pub(crate) fn rows(&self) -> Vec<Invitation> {
        self.invitations.inner.snapshot()
    }
}

/// Invitation store wrapper that counts writes and fails them for chosen workers.
#[derive(Default)]
pub(crate) struct FlakyInvitationStore {
    pub(crate) inner: MemoryInvitationStore,
    failing: BTreeSet<WorkerId>,
    attempts: AtomicUsize,
}

impl FlakyInvitationStore {
    pub(crate) fn failing_for(worker_ids: &[&str]) -> Self {
        Self {
            failing: worker_ids.iter().map(|id| worker(id)).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn write_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InvitationStore for FlakyInvitationStore {
    async fn insert_if_absent(
        &self,
        invitation: NewInvitation,
    ) -> Result<InsertOutcome, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if self.failing.contains(&invitation.worker_id) {
            return Err(StoreError::Unavailable("write timed out".to_string()));
        }
        self.inner.insert_if_absent(invitation).await
    }

    async fn invitations_for_job(&self, job_id: &JobId) -> Result<Vec<Invitation>, StoreError> {
        self.inner.invitations_for_job(job_id).await
    }
}

/// Competency store wrapper counting lookups.
#[derive(Default)]
pub(crate) struct CountingCompetencyStore {
    pub(crate) inner: MemoryCompetencyStore,
    reads: AtomicUsize,
}

impl CountingCompetencyStore {
    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompetencyStore for CountingCompetencyStore {
    async fn competencies_for_skills(
        &self,
        skill_ids: &BTreeSet<SkillId>,
    ) -> Result<Vec<Competency>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.competencies_for_skills(skill_ids).await
    }
}

pub(crate) struct UnavailableCompetencyStore;

#[async_trait]
impl CompetencyStore for UnavailableCompetencyStore {
    async fn competencies_for_skills(
        &self,
        _skill_ids: &BTreeSet<SkillId>,
    ) -> Result<Vec<Competency>, StoreError> {
        Err(StoreError::Unavailable("competency replica offline".to_string()))
    }
}

pub(crate) struct UnavailableAccountRegistry;

#[async_trait]
impl AccountRegistry for UnavailableAccountRegistry {
    async fn active_worker_ids(
        &self,
        _worker_ids: &BTreeSet<WorkerId>,
    ) -> Result<BTreeSet<WorkerId>, StoreError> {
        Err(StoreError::Unavailable("account registry offline".to_string()))
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
