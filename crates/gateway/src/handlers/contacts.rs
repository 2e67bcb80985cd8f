//! Contact management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use signet_common::{
    auth::AuthContext,
    db::models::Contact,
    db::Repository,
    errors::{AppError, Result},
};

/// Request to create a new contact
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[validate(email)]
    pub email: Option<String>,
}

/// Request to update a contact. Only the email is mutable, and only while
/// every signing link for the contact is still pending.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateContactRequest {
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl From<Contact> for ContactResponse {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Create a new contact
pub async fn create_contact(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(request): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>)> {
    request.validate()?;

    let repo = Repository::new(state.db.clone());

    let contact = repo
        .create_contact(auth.workspace_id, request.name, request.email)
        .await?;

    tracing::info!(
        contact_id = %contact.id,
        workspace_id = %auth.workspace_id,
        "Contact created"
    );

    Ok((StatusCode::CREATED, Json(contact.into())))
}

/// Get a contact by ID
pub async fn get_contact(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(contact_id): Path<Uuid>,
) -> Result<Json<ContactResponse>> {
    let repo = Repository::new(state.db.clone());

    let contact = repo
        .find_contact_by_id(contact_id)
        .await?
        .ok_or_else(|| AppError::ContactNotFound {
            id: contact_id.to_string(),
        })?;

    if contact.workspace_id != auth.workspace_id {
        return Err(AppError::WorkspaceMismatch);
    }

    Ok(Json(contact.into()))
}

/// Update a contact's email
pub async fn update_contact(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(contact_id): Path<Uuid>,
    Json(request): Json<UpdateContactRequest>,
) -> Result<Json<ContactResponse>> {
    request.validate()?;

    let repo = Repository::new(state.db.clone());

    let contact = repo
        .find_contact_by_id(contact_id)
        .await?
        .ok_or_else(|| AppError::ContactNotFound {
            id: contact_id.to_string(),
        })?;

    if contact.workspace_id != auth.workspace_id {
        return Err(AppError::WorkspaceMismatch);
    }

    // Email is frozen once any link for this contact has been dispatched
    if repo.contact_has_dispatched_link(contact_id).await? {
        return Err(AppError::ContactLocked);
    }

    let updated = repo
        .update_contact_email(contact_id, request.email)
        .await?;

    tracing::info!(
        contact_id = %contact_id,
        workspace_id = %auth.workspace_id,
        "Contact email updated"
    );

    Ok(Json(updated.into()))
}
