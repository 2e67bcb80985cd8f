//! Signing workflow handlers
//!
//! Link issuance is an owner-facing, authenticated operation; token
//! resolution and field submission are the public signer surface, gated
//! only by the opaque token.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::AppState;
use signet_common::{
    auth::AuthContext,
    errors::{AppError, Result},
    signing::{IssuedLink, SigningSession},
};

#[derive(Serialize)]
pub struct IssueLinksResponse {
    pub links: Vec<IssuedLink>,
    pub count: usize,
}

/// Fields as shown to the signer
#[derive(Serialize)]
pub struct SignerFieldResponse {
    pub id: Uuid,
    pub field_name: String,
    pub field_type: String,
    pub is_required: bool,
    pub field_value: Option<String>,
}

/// What a signer sees when opening their link. Deliberately excludes the
/// contact's email and the owner's identity.
#[derive(Serialize)]
pub struct SigningSessionResponse {
    pub status: String,
    pub document: SignerDocument,
    pub contact: SignerContact,
    pub fields: Vec<SignerFieldResponse>,
}

#[derive(Serialize)]
pub struct SignerDocument {
    pub id: Uuid,
    pub title: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct SignerContact {
    pub id: Uuid,
    pub name: String,
}

/// Request body for a field submission: field id -> value (null clears)
#[derive(Debug, Deserialize)]
pub struct SubmitFieldsRequest {
    pub fields: HashMap<Uuid, Option<String>>,
}

#[derive(Serialize)]
pub struct SubmitFieldsResponse {
    pub fields_saved: usize,
    pub status: String,
}

/// Issue signing links for a document, one per distinct contact
pub async fn issue_links(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
) -> Result<(StatusCode, Json<IssueLinksResponse>)> {
    let links = state
        .signing
        .issue_links(auth.workspace_id, auth.owner_id(), document_id)
        .await?;

    let status = if links.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((
        status,
        Json(IssueLinksResponse {
            count: links.len(),
            links,
        }),
    ))
}

/// Resolve a signing token for the public signer page
pub async fn resolve_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SigningSessionResponse>> {
    let session = state
        .signing
        .resolve(&token)
        .await?
        .ok_or(AppError::LinkInvalid)?;

    Ok(Json(session_response(session)))
}

/// Submit field values against a signing token
pub async fn submit_fields(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<SubmitFieldsRequest>,
) -> Result<Json<SubmitFieldsResponse>> {
    let fields_saved = state.signing.submit(&token, request.fields).await?;

    Ok(Json(SubmitFieldsResponse {
        fields_saved,
        status: "completed".to_string(),
    }))
}

fn session_response(session: SigningSession) -> SigningSessionResponse {
    SigningSessionResponse {
        status: session.link.status,
        document: SignerDocument {
            id: session.document.id,
            title: session.document.title,
            content: session.document.content,
        },
        contact: SignerContact {
            id: session.contact.id,
            name: session.contact.name,
        },
        fields: session
            .fields
            .into_iter()
            .map(|f| SignerFieldResponse {
                id: f.id,
                field_name: f.field_name,
                field_type: f.field_type,
                is_required: f.is_required,
                field_value: f.field_value,
            })
            .collect(),
    }
}
