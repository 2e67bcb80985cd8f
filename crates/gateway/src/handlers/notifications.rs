//! Notification handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use signet_common::{auth::AuthContext, errors::Result, notify::NotifySummary};

/// Request to dispatch signing invitations for a document
#[derive(Debug, Default, Deserialize, Validate)]
pub struct NotifyRequest {
    /// Optional display title overriding the stored document title
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
}

/// Dispatch one invitation per addressable contact of the document
pub async fn notify_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
    body: Option<Json<NotifyRequest>>,
) -> Result<Json<NotifySummary>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let summary = state
        .notifier
        .notify_document(auth.workspace_id, document_id, request.title)
        .await?;

    tracing::info!(
        document_id = %document_id,
        workspace_id = %auth.workspace_id,
        sent = summary.sent,
        skipped = summary.skipped,
        "Notifications dispatched"
    );

    Ok(Json(summary))
}
