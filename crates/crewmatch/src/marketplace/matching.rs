use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::domain::{CandidateMap, Competency, CompetencyStatus, ProficiencyLevel, SkillId, WorkerId};
use super::store::{AccountRegistry, CompetencyStore, StoreError};

/// Optional gates applied to competency rows before grouping.
///
/// The default admits every competency row that references a required skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    pub minimum_level: Option<ProficiencyLevel>,
    pub active_competencies_only: bool,
}

impl MatchPolicy {
    pub fn admits(&self, competency: &Competency) -> bool {
        if self.active_competencies_only && competency.status != CompetencyStatus::Active {
            return false;
        }

        match self.minimum_level {
            Some(minimum) => competency.level >= minimum,
            None => true,
        }
    }
}

/// Computes the active candidate set for a job's required skills.
pub struct MatchingEngine<C, A> {
    competencies: Arc<C>,
    accounts: Arc<A>,
    policy: MatchPolicy,
}

impl<C, A> MatchingEngine<C, A>
where
    C: CompetencyStore + 'static,
    A: AccountRegistry + 'static,
{
    pub fn new(competencies: Arc<C>, accounts: Arc<A>, policy: MatchPolicy) -> Self {
        Self {
            competencies,
            accounts,
            policy,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Workers with an active account and at least one required skill, each
    /// mapped to the required skills they declared.
    pub async fn match_workers(
        &self,
        required_skills: &BTreeSet<SkillId>,
    ) -> Result<CandidateMap, MatchError> {
        if required_skills.is_empty() {
            return Ok(CandidateMap::new());
        }

        let competencies = self
            .competencies
            .competencies_for_skills(required_skills)
            .await
            .map_err(MatchError::Competencies)?;

        let pairs = competencies
            .iter()
            .filter(|competency| required_skills.contains(&competency.skill_id))
            .filter(|competency| self.policy.admits(competency))
            .map(|competency| (competency.worker_id.clone(), competency.skill_id.clone()));
        let mut candidates = group_by_worker(pairs);

        if candidates.is_empty() {
            return Ok(candidates);
        }

        let worker_ids: BTreeSet<WorkerId> = candidates.keys().cloned().collect();
        let active = self
            .accounts
            .active_worker_ids(&worker_ids)
            .await
            .map_err(MatchError::Accounts)?;

        let matched = candidates.len();
        candidates.retain(|worker_id, _| active.contains(worker_id));
        debug!(
            matched,
            active = candidates.len(),
            "filtered skill matches to active accounts"
        );

        Ok(candidates)
    }
}

/// Groups `(worker, skill)` pairs into one deduplicated skill set per worker.
///
/// The result does not depend on the order of `pairs`.
pub fn group_by_worker<I>(pairs: I) -> CandidateMap
where
    I: IntoIterator<Item = (WorkerId, SkillId)>,
{
    pairs
        .into_iter()
        .fold(CandidateMap::new(), |mut grouped, (worker_id, skill_id)| {
            grouped.entry(worker_id).or_default().insert(skill_id);
            grouped
        })
}

/// Lookup failures; no partial candidate map is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("competency lookup failed: {0}")]
    Competencies(StoreError),
    #[error("account lookup failed: {0}")]
    Accounts(StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::memory::{MemoryAccountRegistry, MemoryCompetencyStore};

    fn skill(id: &str) -> SkillId {
        SkillId(id.to_string())
    }

    fn worker(id: &str) -> WorkerId {
        WorkerId(id.to_string())
    }

    fn competency(worker_id: &str, skill_id: &str, level: ProficiencyLevel) -> Competency {
        Competency {
            worker_id: worker(worker_id),
            skill_id: skill(skill_id),
            level,
            years_experience: 2,
            status: CompetencyStatus::Active,
        }
    }

    fn engine(
        competencies: Vec<Competency>,
        active: &[(&str, bool)],
        policy: MatchPolicy,
    ) -> MatchingEngine<MemoryCompetencyStore, MemoryAccountRegistry> {
        let store = MemoryCompetencyStore::default();
        store.extend(competencies);
        let accounts = MemoryAccountRegistry::default();
        for (id, is_active) in active {
            accounts.set_active(worker(id), *is_active);
        }
        MatchingEngine::new(Arc::new(store), Arc::new(accounts), policy)
    }

    #[test]
    fn group_by_worker_deduplicates_skills() {
        let grouped = group_by_worker(vec![
            (worker("w1"), skill("s1")),
            (worker("w1"), skill("s1")),
            (worker("w1"), skill("s2")),
            (worker("w2"), skill("s2")),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&worker("w1")], BTreeSet::from([skill("s1"), skill("s2")]));
        assert_eq!(grouped[&worker("w2")], BTreeSet::from([skill("s2")]));
    }

    #[test]
    fn group_by_worker_ignores_input_order() {
        let pairs = vec![
            (worker("w2"), skill("s3")),
            (worker("w1"), skill("s1")),
            (worker("w2"), skill("s1")),
            (worker("w1"), skill("s2")),
        ];
        let mut reversed = pairs.clone();
        reversed.reverse();

        assert_eq!(group_by_worker(pairs), group_by_worker(reversed));
    }

    #[tokio::test]
    async fn empty_skill_set_matches_nobody() {
        let engine = engine(
            vec![competency("w1", "s1", ProficiencyLevel::Expert)],
            &[("w1", true)],
            MatchPolicy::default(),
        );

        let candidates = engine
            .match_workers(&BTreeSet::new())
            .await
            .expect("match succeeds");
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn inactive_accounts_are_dropped() {
        let engine = engine(
            vec![
                competency("w1", "s1", ProficiencyLevel::Beginner),
                competency("w2", "s1", ProficiencyLevel::Expert),
                competency("w2", "s2", ProficiencyLevel::Expert),
                competency("w3", "s3", ProficiencyLevel::Advanced),
            ],
            &[("w1", true), ("w2", false), ("w3", true)],
            MatchPolicy::default(),
        );

        let candidates = engine
            .match_workers(&BTreeSet::from([skill("s1"), skill("s2")]))
            .await
            .expect("match succeeds");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[&worker("w1")], BTreeSet::from([skill("s1")]));
    }

    #[tokio::test]
    async fn workers_without_accounts_are_dropped() {
        let engine = engine(
            vec![competency("ghost", "s1", ProficiencyLevel::Expert)],
            &[],
            MatchPolicy::default(),
        );

        let candidates = engine
            .match_workers(&BTreeSet::from([skill("s1")]))
            .await
            .expect("match succeeds");
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn default_policy_ignores_level_and_competency_status() {
        let mut dormant = competency("w1", "s1", ProficiencyLevel::Beginner);
        dormant.status = CompetencyStatus::Inactive;
        let engine = engine(vec![dormant], &[("w1", true)], MatchPolicy::default());

        let candidates = engine
            .match_workers(&BTreeSet::from([skill("s1")]))
            .await
            .expect("match succeeds");
        assert!(candidates.contains_key(&worker("w1")));
    }

    #[tokio::test]
    async fn policy_can_gate_on_level_and_status() {
        let mut dormant = competency("w3", "s1", ProficiencyLevel::Expert);
        dormant.status = CompetencyStatus::Inactive;
        let engine = engine(
            vec![
                competency("w1", "s1", ProficiencyLevel::Beginner),
                competency("w1", "s2", ProficiencyLevel::Advanced),
                competency("w2", "s1", ProficiencyLevel::Intermediate),
                dormant,
            ],
            &[("w1", true), ("w2", true), ("w3", true)],
            MatchPolicy {
                minimum_level: Some(ProficiencyLevel::Advanced),
                active_competencies_only: true,
            },
        );

        let candidates = engine
            .match_workers(&BTreeSet::from([skill("s1"), skill("s2")]))
            .await
            .expect("match succeeds");

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[&worker("w1")], BTreeSet::from([skill("s2")]));
    }
}
