use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use super::approval::{ApprovalError, ApprovalOutcome, ApprovalService};
use super::domain::{Invitation, JobId};
use super::store::{AccountRegistry, CompetencyStore, InvitationStore, JobStore};

/// Router builder exposing the approval boundary over HTTP.
pub fn approval_router<C, A, I, J>(service: Arc<ApprovalService<C, A, I, J>>) -> Router
where
    C: CompetencyStore + 'static,
    A: AccountRegistry + 'static,
    I: InvitationStore + 'static,
    J: JobStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs/:job_id/approve",
            post(approve_handler::<C, A, I, J>),
        )
        .route(
            "/api/v1/jobs/:job_id/invitations",
            get(invitations_handler::<C, A, I, J>),
        )
        .with_state(service)
}

/// Response body for a completed approval.
#[derive(Debug, Serialize)]
pub struct ApprovalView {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ApprovalOutcome,
}

impl From<ApprovalOutcome> for ApprovalView {
    fn from(outcome: ApprovalOutcome) -> Self {
        Self {
            message: outcome.summary(),
            outcome,
        }
    }
}

/// Sanitized representation of a stored invitation.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationView {
    pub job_id: String,
    pub worker_id: String,
    pub matched_skills: Vec<String>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<Invitation> for InvitationView {
    fn from(invitation: Invitation) -> Self {
        Self {
            job_id: invitation.job_id.0,
            worker_id: invitation.worker_id.0,
            matched_skills: invitation
                .matched_skills
                .into_iter()
                .map(|skill| skill.0)
                .collect(),
            status: invitation.status.label(),
            created_at: invitation.created_at,
        }
    }
}

pub(crate) async fn approve_handler<C, A, I, J>(
    State(service): State<Arc<ApprovalService<C, A, I, J>>>,
    Path(job_id): Path<String>,
) -> Response
where
    C: CompetencyStore + 'static,
    A: AccountRegistry + 'static,
    I: InvitationStore + 'static,
    J: JobStore + 'static,
{
    match service.approve(&JobId(job_id)).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(ApprovalView::from(outcome))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn invitations_handler<C, A, I, J>(
    State(service): State<Arc<ApprovalService<C, A, I, J>>>,
    Path(job_id): Path<String>,
) -> Response
where
    C: CompetencyStore + 'static,
    A: AccountRegistry + 'static,
    I: InvitationStore + 'static,
    J: JobStore + 'static,
{
    match service.invitations(&JobId(job_id)).await {
        Ok(invitations) => {
            let views: Vec<InvitationView> =
                invitations.into_iter().map(InvitationView::from).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ApprovalError) -> Response {
    let status = match &error {
        ApprovalError::NotFound(_) => StatusCode::NOT_FOUND,
        ApprovalError::JobClosed(_) => StatusCode::CONFLICT,
        error if error.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
