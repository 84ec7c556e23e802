//! In-process store adapters used by the service binary, the CLI, and tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use super::domain::{
    Competency, Invitation, InvitationStatus, Job, JobId, JobStatus, NewInvitation, SkillId,
    WorkerId,
};
use super::store::{
    AccountRegistry, CompetencyStore, InsertOutcome, InvitationStore, JobStore, StoreError,
};

#[derive(Default, Clone)]
pub struct MemoryCompetencyStore {
    by_worker: Arc<RwLock<BTreeMap<WorkerId, BTreeMap<SkillId, Competency>>>>,
}

impl MemoryCompetencyStore {
    /// Adds competencies; a repeated (worker, skill) pair overwrites the earlier row.
    pub fn extend<I>(&self, competencies: I)
    where
        I: IntoIterator<Item = Competency>,
    {
        let mut guard = self.by_worker.write().expect("competency lock poisoned");
        for competency in competencies {
            guard
                .entry(competency.worker_id.clone())
                .or_default()
                .insert(competency.skill_id.clone(), competency);
        }
    }

    /// Swaps a worker's whole competency list, as a profile self-update does.
    pub fn replace_for_worker(&self, worker_id: &WorkerId, competencies: Vec<Competency>) {
        let rows: BTreeMap<SkillId, Competency> = competencies
            .into_iter()
            .filter(|competency| &competency.worker_id == worker_id)
            .map(|competency| (competency.skill_id.clone(), competency))
            .collect();

        let mut guard = self.by_worker.write().expect("competency lock poisoned");
        if rows.is_empty() {
            guard.remove(worker_id);
        } else {
            guard.insert(worker_id.clone(), rows);
        }
    }

    pub fn for_worker(&self, worker_id: &WorkerId) -> Vec<Competency> {
        let guard = self.by_worker.read().expect("competency lock poisoned");
        guard
            .get(worker_id)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompetencyStore for MemoryCompetencyStore {
    async fn competencies_for_skills(
        &self,
        skill_ids: &BTreeSet<SkillId>,
    ) -> Result<Vec<Competency>, StoreError> {
        let guard = self.by_worker.read().expect("competency lock poisoned");
        Ok(guard
            .values()
            .flat_map(|rows| rows.values())
            .filter(|competency| skill_ids.contains(&competency.skill_id))
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryAccountRegistry {
    accounts: Arc<RwLock<BTreeMap<WorkerId, bool>>>,
}

impl MemoryAccountRegistry {
    pub fn set_active(&self, worker_id: WorkerId, active: bool) {
        let mut guard = self.accounts.write().expect("account lock poisoned");
        guard.insert(worker_id, active);
    }
}

#[async_trait]
impl AccountRegistry for MemoryAccountRegistry {
    async fn active_worker_ids(
        &self,
        worker_ids: &BTreeSet<WorkerId>,
    ) -> Result<BTreeSet<WorkerId>, StoreError> {
        let guard = self.accounts.read().expect("account lock poisoned");
        Ok(worker_ids
            .iter()
            .filter(|worker_id| guard.get(*worker_id).copied().unwrap_or(false))
            .cloned()
            .collect())
    }
}

/// Invitation rows keyed by `(job, worker)`; check-and-insert happens under one lock.
#[derive(Default, Clone)]
pub struct MemoryInvitationStore {
    rows: Arc<Mutex<BTreeMap<(JobId, WorkerId), Invitation>>>,
}

impl MemoryInvitationStore {
    /// Every stored invitation, ordered by job then worker.
    pub fn snapshot(&self) -> Vec<Invitation> {
        let guard = self.rows.lock().expect("invitation mutex poisoned");
        guard.values().cloned().collect()
    }

    /// Records a worker-interaction event such as a view or an acceptance.
    pub fn update_status(
        &self,
        job_id: &JobId,
        worker_id: &WorkerId,
        status: InvitationStatus,
    ) -> Result<Invitation, StoreError> {
        let mut guard = self.rows.lock().expect("invitation mutex poisoned");
        let row = guard
            .get_mut(&(job_id.clone(), worker_id.clone()))
            .ok_or(StoreError::NotFound)?;
        row.status = status;
        Ok(row.clone())
    }
}

#[async_trait]
impl InvitationStore for MemoryInvitationStore {
    async fn insert_if_absent(
        &self,
        invitation: NewInvitation,
    ) -> Result<InsertOutcome, StoreError> {
        let mut guard = self.rows.lock().expect("invitation mutex poisoned");
        let key = (invitation.job_id.clone(), invitation.worker_id.clone());
        if guard.contains_key(&key) {
            return Ok(InsertOutcome { created: false });
        }
        guard.insert(key, invitation.into_invitation());
        Ok(InsertOutcome { created: true })
    }

    async fn invitations_for_job(&self, job_id: &JobId) -> Result<Vec<Invitation>, StoreError> {
        let guard = self.rows.lock().expect("invitation mutex poisoned");
        Ok(guard
            .values()
            .filter(|invitation| &invitation.job_id == job_id)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<BTreeMap<JobId, Job>>>,
}

impl MemoryJobStore {
    pub fn insert(&self, job: Job) -> Result<(), StoreError> {
        let mut guard = self.jobs.write().expect("job lock poisoned");
        if guard.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn fetch(&self, job_id: &JobId) -> Result<Option<Job>, StoreError> {
        let guard = self.jobs.read().expect("job lock poisoned");
        Ok(guard.get(job_id).cloned())
    }

    async fn set_status(&self, job_id: &JobId, status: JobStatus) -> Result<Job, StoreError> {
        let mut guard = self.jobs.write().expect("job lock poisoned");
        let job = guard.get_mut(job_id).ok_or(StoreError::NotFound)?;
        job.status = status;
        Ok(job.clone())
    }
}
