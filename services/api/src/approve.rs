use crate::infra::load_stores;
use clap::Args;
use crewmatch::config::AppConfig;
use crewmatch::error::AppError;
use crewmatch::marketplace::{ApprovalOutcome, ApprovalService, Invitation, JobId};
use crewmatch::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ApproveArgs {
    /// JSON fixture with skills, accounts, jobs, and competencies
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Optional competency CSV export applied on top of the fixture
    #[arg(long)]
    pub(crate) competencies: Option<PathBuf>,
    /// Identifier of the job to approve
    #[arg(long)]
    pub(crate) job: String,
    /// Approve the job this many times to observe idempotent re-runs
    #[arg(long, default_value_t = 1)]
    pub(crate) repeat: u8,
}

pub(crate) async fn run_approve(args: ApproveArgs) -> Result<(), AppError> {
    let ApproveArgs {
        seed,
        competencies,
        job,
        repeat,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let stores = load_stores(Some(seed.as_path()), competencies.as_deref())?;
    let invitations = stores.invitations.clone();
    let service = ApprovalService::new(stores, config.matching.approval_settings());
    let job_id = JobId(job);

    for attempt in 1..=repeat.max(1) {
        let outcome = service.approve(&job_id).await?;
        render_outcome(attempt, &outcome);
    }

    let rows: Vec<Invitation> = invitations
        .snapshot()
        .into_iter()
        .filter(|invitation| invitation.job_id == job_id)
        .collect();
    render_invitations(&rows);

    Ok(())
}

fn render_outcome(attempt: u8, outcome: &ApprovalOutcome) {
    println!(
        "[{}] job {} ({}): {}",
        attempt,
        outcome.job.id,
        outcome.job.status.label(),
        outcome.summary()
    );
    for failure in &outcome.failed {
        println!("    failed {}: {}", failure.worker_id, failure.reason);
    }
}

fn render_invitations(rows: &[Invitation]) {
    if rows.is_empty() {
        println!("\nInvitations: none");
        return;
    }

    println!("\nInvitations");
    for row in rows {
        let skills: Vec<&str> = row
            .matched_skills
            .iter()
            .map(|skill| skill.0.as_str())
            .collect();
        println!(
            "- {} | {} | matched {} | created {}",
            row.worker_id,
            row.status.label(),
            skills.join(", "),
            row.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}
