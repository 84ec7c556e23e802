use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use super::SeedError;
use crate::marketplace::domain::{
    Competency, CompetencyStatus, ProficiencyLevel, SkillId, WorkerId,
};
use crate::marketplace::memory::MemoryCompetencyStore;

/// Reads worker competency exports and applies them as wholesale profile updates.
///
/// Expected header: `worker_id,skill_id,level,years_experience,status`. The
/// `status` column may be empty, in which case the competency is active.
pub struct CompetencyCsvImporter;

impl CompetencyCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<BTreeMap<WorkerId, Vec<Competency>>, SeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses the export, grouping rows by worker.
    pub fn from_reader<R: Read>(reader: R) -> Result<BTreeMap<WorkerId, Vec<Competency>>, SeedError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut grouped: BTreeMap<WorkerId, Vec<Competency>> = BTreeMap::new();
        let mut seen: BTreeSet<(WorkerId, SkillId)> = BTreeSet::new();

        for record in csv_reader.deserialize::<CompetencyRow>() {
            let row = record?;
            let competency = row.into_competency()?;

            if !seen.insert((competency.worker_id.clone(), competency.skill_id.clone())) {
                return Err(SeedError::DuplicateCompetency {
                    worker_id: competency.worker_id,
                    skill_id: competency.skill_id,
                });
            }

            grouped
                .entry(competency.worker_id.clone())
                .or_default()
                .push(competency);
        }

        Ok(grouped)
    }

    /// Replaces the competencies of every worker present in the export.
    pub fn apply(grouped: BTreeMap<WorkerId, Vec<Competency>>, store: &MemoryCompetencyStore) {
        let workers = grouped.len();
        for (worker_id, competencies) in grouped {
            store.replace_for_worker(&worker_id, competencies);
        }
        info!(workers, "competency export applied");
    }
}

#[derive(Debug, Deserialize)]
struct CompetencyRow {
    worker_id: String,
    skill_id: String,
    level: String,
    years_experience: u8,
    #[serde(default)]
    status: Option<String>,
}

impl CompetencyRow {
    fn into_competency(self) -> Result<Competency, SeedError> {
        let level = ProficiencyLevel::parse(&self.level).ok_or_else(|| SeedError::InvalidRow {
            worker_id: self.worker_id.clone(),
            detail: format!("unknown proficiency level '{}'", self.level),
        })?;

        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => CompetencyStatus::Active,
            Some(raw) => CompetencyStatus::parse(raw).ok_or_else(|| SeedError::InvalidRow {
                worker_id: self.worker_id.clone(),
                detail: format!("unknown competency status '{raw}'"),
            })?,
        };

        Ok(Competency {
            worker_id: WorkerId(self.worker_id),
            skill_id: SkillId(self.skill_id),
            level,
            years_experience: self.years_experience,
            status,
        })
    }
}
