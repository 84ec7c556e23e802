//! Approval-triggered skill matching and invitation fan-out.
//!
//! Approving a job posting opens it, matches workers whose declared skills
//! overlap the job's required skills, drops workers without an active account,
//! and writes one invitation per remaining worker. Invitation writes are
//! insert-if-absent, so repeated or concurrent approvals never duplicate rows.

pub mod approval;
pub mod domain;
pub mod fanout;
pub mod matching;
pub mod memory;
pub mod router;
pub mod seed;
pub mod store;

#[cfg(test)]
mod tests;

pub use approval::{ApprovalError, ApprovalOutcome, ApprovalService, ApprovalSettings, SkipReason};
pub use domain::{
    Account, CandidateMap, Competency, CompetencyStatus, Invitation, InvitationStatus, Job, JobId,
    JobStatus, NewInvitation, ProficiencyLevel, Skill, SkillId, SkillStatus, WorkerId,
};
pub use fanout::{FailedInvitation, FanOutReport, InvitationFanOut};
pub use matching::{group_by_worker, MatchError, MatchPolicy, MatchingEngine};
pub use memory::{
    MemoryAccountRegistry, MemoryCompetencyStore, MemoryInvitationStore, MemoryJobStore,
};
pub use router::{approval_router, ApprovalView, InvitationView};
pub use seed::{CompetencyCsvImporter, MarketplaceSeed, MemoryStores, SeedError};
pub use store::{
    AccountRegistry, CompetencyStore, InsertOutcome, InvitationStore, JobStore, StoreError, Stores,
};
