//! Document management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use signet_common::{
    auth::AuthContext,
    db::models::{ContractField, Document, FieldType},
    db::{NewContractField, Repository},
    errors::{AppError, Result},
};

/// Request to create a new document with its contract fields
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[validate(length(min = 1, max = 100_000))]
    pub content: String,

    #[serde(default)]
    #[validate(nested)]
    pub fields: Vec<FieldInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct FieldInput {
    pub contact_id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub field_name: String,

    pub field_type: FieldType,

    #[serde(default)]
    pub is_required: bool,
}

/// Query parameters for listing documents
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    20
}

#[derive(Serialize)]
pub struct FieldResponse {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub field_name: String,
    pub field_type: String,
    pub is_required: bool,
    pub field_value: Option<String>,
}

impl From<ContractField> for FieldResponse {
    fn from(f: ContractField) -> Self {
        Self {
            id: f.id,
            contact_id: f.contact_id,
            field_name: f.field_name,
            field_type: f.field_type,
            is_required: f.is_required,
            field_value: f.field_value,
        }
    }
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub fields: Vec<FieldResponse>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total: u64,
}

#[derive(Serialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: String,
}

impl From<Document> for DocumentSummary {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            title: d.title,
            created_at: d.created_at.to_rfc3339(),
        }
    }
}

/// Create a new document with its contract fields
pub async fn create_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    request.validate()?;

    let repo = Repository::new(state.db.clone());

    // Every referenced contact must exist in this workspace before any row
    // is written
    for field in &request.fields {
        let contact = repo
            .find_contact_by_id(field.contact_id)
            .await?
            .ok_or_else(|| AppError::ContactNotFound {
                id: field.contact_id.to_string(),
            })?;

        if contact.workspace_id != auth.workspace_id {
            return Err(AppError::WorkspaceMismatch);
        }
    }

    let fields = request
        .fields
        .into_iter()
        .map(|f| NewContractField {
            contact_id: f.contact_id,
            field_name: f.field_name,
            field_type: f.field_type,
            is_required: f.is_required,
        })
        .collect();

    let (document, created_fields) = repo
        .create_document(
            auth.workspace_id,
            auth.owner_id(),
            request.title,
            request.content,
            fields,
        )
        .await?;

    tracing::info!(
        document_id = %document.id,
        workspace_id = %auth.workspace_id,
        fields = created_fields.len(),
        "Document created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DocumentResponse {
            id: document.id,
            title: document.title,
            content: document.content,
            fields: created_fields.into_iter().map(Into::into).collect(),
            created_at: document.created_at.to_rfc3339(),
        }),
    ))
}

/// Get a document by ID
pub async fn get_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>> {
    let repo = Repository::new(state.db.clone());

    let document = repo
        .find_document_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound {
            id: document_id.to_string(),
        })?;

    // Verify workspace access
    if document.workspace_id != auth.workspace_id {
        return Err(AppError::WorkspaceMismatch);
    }

    let fields = repo.fields_for_document(document_id).await?;

    Ok(Json(DocumentResponse {
        id: document.id,
        title: document.title,
        content: document.content,
        fields: fields.into_iter().map(Into::into).collect(),
        created_at: document.created_at.to_rfc3339(),
    }))
}

/// List documents for the workspace
pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<DocumentListResponse>> {
    let repo = Repository::new(state.db.clone());

    let limit = query.limit.clamp(1, 100);
    let (documents, total) = repo
        .list_documents(auth.workspace_id, query.offset, limit)
        .await?;

    Ok(Json(DocumentListResponse {
        documents: documents.into_iter().map(Into::into).collect(),
        total,
    }))
}

/// Delete a document
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode> {
    let repo = Repository::new(state.db.clone());

    // Verify document exists and belongs to workspace
    let document = repo
        .find_document_by_id(document_id)
        .await?
        .ok_or_else(|| AppError::DocumentNotFound {
            id: document_id.to_string(),
        })?;

    if document.workspace_id != auth.workspace_id {
        return Err(AppError::WorkspaceMismatch);
    }

    repo.delete_document(document_id).await?;

    tracing::info!(
        document_id = %document_id,
        workspace_id = %auth.workspace_id,
        "Document deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}
