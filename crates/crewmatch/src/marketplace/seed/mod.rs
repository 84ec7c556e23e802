//! Loading marketplace fixtures into the in-memory stores.

mod competencies;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::domain::{Account, Competency, Job, Skill, SkillId, SkillStatus, WorkerId};
use super::memory::{
    MemoryAccountRegistry, MemoryCompetencyStore, MemoryInvitationStore, MemoryJobStore,
};
use super::store::{StoreError, Stores};

pub use competencies::CompetencyCsvImporter;

/// Concrete store bundle backed by the in-memory adapters.
pub type MemoryStores =
    Stores<MemoryCompetencyStore, MemoryAccountRegistry, MemoryInvitationStore, MemoryJobStore>;

#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Csv(csv::Error),
    UnknownSkill { owner: String, skill_id: SkillId },
    DuplicateCompetency { worker_id: WorkerId, skill_id: SkillId },
    InvalidRow { worker_id: String, detail: String },
    Store(StoreError),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Io(err) => write!(f, "failed to read seed data: {}", err),
            SeedError::Json(err) => write!(f, "invalid seed JSON: {}", err),
            SeedError::Csv(err) => write!(f, "invalid competency CSV: {}", err),
            SeedError::UnknownSkill { owner, skill_id } => {
                write!(f, "{} references unknown skill '{}'", owner, skill_id)
            }
            SeedError::DuplicateCompetency {
                worker_id,
                skill_id,
            } => write!(
                f,
                "worker '{}' declares skill '{}' more than once",
                worker_id, skill_id
            ),
            SeedError::InvalidRow { worker_id, detail } => {
                write!(f, "competency row for worker '{}': {}", worker_id, detail)
            }
            SeedError::Store(err) => write!(f, "could not load seed into stores: {}", err),
        }
    }
}

impl std::error::Error for SeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedError::Io(err) => Some(err),
            SeedError::Json(err) => Some(err),
            SeedError::Csv(err) => Some(err),
            SeedError::Store(err) => Some(err),
            SeedError::UnknownSkill { .. }
            | SeedError::DuplicateCompetency { .. }
            | SeedError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for SeedError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<csv::Error> for SeedError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<StoreError> for SeedError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Fixture describing skills, workers, and jobs for demos and local runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketplaceSeed {
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub competencies: Vec<Competency>,
}

impl MarketplaceSeed {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        let seed: Self = serde_json::from_reader(reader)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Rejects references to skills missing from the catalog and repeated competencies.
    pub fn validate(&self) -> Result<(), SeedError> {
        let catalog: BTreeMap<&SkillId, SkillStatus> = self
            .skills
            .iter()
            .map(|skill| (&skill.id, skill.status))
            .collect();

        for job in &self.jobs {
            for skill_id in &job.required_skills {
                match catalog.get(skill_id) {
                    None => {
                        return Err(SeedError::UnknownSkill {
                            owner: format!("job '{}'", job.id),
                            skill_id: skill_id.clone(),
                        })
                    }
                    Some(SkillStatus::Inactive) => {
                        warn!(job_id = %job.id, skill_id = %skill_id, "job requires an inactive skill");
                    }
                    Some(SkillStatus::Active) => {}
                }
            }
        }

        let mut seen = BTreeSet::new();
        for competency in &self.competencies {
            if !catalog.contains_key(&competency.skill_id) {
                return Err(SeedError::UnknownSkill {
                    owner: format!("worker '{}'", competency.worker_id),
                    skill_id: competency.skill_id.clone(),
                });
            }
            if !seen.insert((&competency.worker_id, &competency.skill_id)) {
                return Err(SeedError::DuplicateCompetency {
                    worker_id: competency.worker_id.clone(),
                    skill_id: competency.skill_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Builds fresh in-memory stores holding the fixture.
    pub fn into_stores(self) -> Result<MemoryStores, SeedError> {
        let competencies = MemoryCompetencyStore::default();
        let accounts = MemoryAccountRegistry::default();
        let jobs = MemoryJobStore::default();

        let job_count = self.jobs.len();
        let worker_count = self.accounts.len();

        competencies.extend(self.competencies);
        for account in self.accounts {
            accounts.set_active(account.worker_id, account.active);
        }
        for job in self.jobs {
            jobs.insert(job)?;
        }

        info!(
            skills = self.skills.len(),
            workers = worker_count,
            jobs = job_count,
            "marketplace seed loaded"
        );

        Ok(Stores {
            competencies: Arc::new(competencies),
            accounts: Arc::new(accounts),
            invitations: Arc::new(MemoryInvitationStore::default()),
            jobs: Arc::new(jobs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::domain::{JobId, JobStatus};
    use crate::marketplace::store::JobStore;
    use std::io::Cursor;

    const SEED: &str = r#"{
        "skills": [
            { "id": "S1", "name": "Welding", "slug": "welding", "status": "active" },
            { "id": "S2", "name": "Forklift", "slug": "forklift", "status": "inactive" }
        ],
        "accounts": [
            { "worker_id": "W1", "active": true },
            { "worker_id": "W2", "active": false }
        ],
        "jobs": [
            { "id": "J1", "title": "Dock crew", "required_skills": ["S1", "S2"], "status": "draft" }
        ],
        "competencies": [
            { "worker_id": "W1", "skill_id": "S1", "level": "advanced", "years_experience": 4, "status": "active" }
        ]
    }"#;

    #[tokio::test]
    async fn seed_loads_into_stores() {
        let seed = MarketplaceSeed::from_reader(Cursor::new(SEED)).expect("seed parses");
        let stores = seed.into_stores().expect("stores build");

        let job = stores
            .jobs
            .fetch(&JobId("J1".to_string()))
            .await
            .expect("fetch succeeds")
            .expect("job present");
        assert_eq!(job.status, JobStatus::Draft);
        assert_eq!(job.required_skills.len(), 2);
        assert_eq!(
            stores
                .competencies
                .for_worker(&WorkerId("W1".to_string()))
                .len(),
            1
        );
    }

    #[test]
    fn unknown_job_skill_is_rejected() {
        let raw = SEED.replace(r#"["S1", "S2"]"#, r#"["S1", "S9"]"#);
        match MarketplaceSeed::from_reader(Cursor::new(raw)) {
            Err(SeedError::UnknownSkill { skill_id, .. }) => {
                assert_eq!(skill_id, SkillId("S9".to_string()))
            }
            other => panic!("expected unknown skill, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_competency_is_rejected() {
        let mut seed = MarketplaceSeed::from_reader(Cursor::new(SEED)).expect("seed parses");
        let duplicate = seed.competencies[0].clone();
        seed.competencies.push(duplicate);

        assert!(matches!(
            seed.validate(),
            Err(SeedError::DuplicateCompetency { .. })
        ));
    }
}
