//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A signing link joined with its contact, as loaded for the notifier
#[derive(Debug, Clone)]
pub struct LinkWithContact {
    pub link: SigningLink,
    pub contact: Option<Contact>,
}

/// Input shape for creating a contract field alongside a document
#[derive(Debug, Clone)]
pub struct NewContractField {
    pub contact_id: Uuid,
    pub field_name: String,
    pub field_type: FieldType,
    pub is_required: bool,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Workspace Operations
    // ========================================================================

    /// Find workspace by ID
    pub async fn find_workspace_by_id(&self, id: Uuid) -> Result<Option<Workspace>> {
        WorkspaceEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find workspace by API key hash
    pub async fn find_workspace_by_api_key_hash(&self, hash: &str) -> Result<Option<Workspace>> {
        WorkspaceEntity::find()
            .filter(WorkspaceColumn::ApiKeyHash.eq(hash))
            .filter(WorkspaceColumn::IsActive.eq(true))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Document Operations
    // ========================================================================

    /// Create a new document with its contract fields.
    ///
    /// Field inserts follow the document insert; if they fail, the document
    /// row is removed best-effort so a half-created document is not left
    /// behind (no cross-statement transaction guarantee is claimed).
    pub async fn create_document(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        title: String,
        content: String,
        fields: Vec<NewContractField>,
    ) -> Result<(Document, Vec<ContractField>)> {
        let document_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let document = DocumentActiveModel {
            id: Set(document_id),
            workspace_id: Set(workspace_id),
            user_id: Set(user_id),
            title: Set(title),
            content: Set(content),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let document = document.insert(self.write_conn()).await?;

        let mut created_fields = Vec::with_capacity(fields.len());
        for field in fields {
            let model = ContractFieldActiveModel {
                id: Set(Uuid::new_v4()),
                document_id: Set(document_id),
                contact_id: Set(field.contact_id),
                field_name: Set(field.field_name),
                field_type: Set(String::from(field.field_type)),
                is_required: Set(field.is_required),
                field_value: Set(None),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };

            match model.insert(self.write_conn()).await {
                Ok(f) => created_fields.push(f),
                Err(e) => {
                    tracing::error!(
                        document_id = %document_id,
                        error = %e,
                        "Field insert failed, rolling back document"
                    );
                    if let Err(rollback_err) = DocumentEntity::delete_by_id(document_id)
                        .exec(self.write_conn())
                        .await
                    {
                        tracing::error!(
                            document_id = %document_id,
                            error = %rollback_err,
                            "Best-effort document rollback failed"
                        );
                    }
                    return Err(e.into());
                }
            }
        }

        Ok((document, created_fields))
    }

    /// Find document by ID
    pub async fn find_document_by_id(&self, id: Uuid) -> Result<Option<Document>> {
        DocumentEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List documents for a workspace with pagination
    pub async fn list_documents(
        &self,
        workspace_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Document>, u64)> {
        let paginator = DocumentEntity::find()
            .filter(DocumentColumn::WorkspaceId.eq(workspace_id))
            .order_by_desc(DocumentColumn::CreatedAt)
            .paginate(self.read_conn(), limit);

        let total = paginator.num_items().await?;
        let documents = paginator.fetch_page(offset / limit).await?;

        Ok((documents, total))
    }

    /// Delete document by ID
    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        let result = DocumentEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Contact Operations
    // ========================================================================

    /// Create a new contact
    pub async fn create_contact(
        &self,
        workspace_id: Uuid,
        name: String,
        email: Option<String>,
    ) -> Result<Contact> {
        let now = chrono::Utc::now();

        let contact = ContactActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(workspace_id),
            name: Set(name),
            email: Set(email),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        contact.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find contact by ID
    pub async fn find_contact_by_id(&self, id: Uuid) -> Result<Option<Contact>> {
        ContactEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Whether any signing link for the contact has advanced past pending.
    /// Once that happens the contact's email is locked.
    pub async fn contact_has_dispatched_link(&self, contact_id: Uuid) -> Result<bool> {
        let count = SigningLinkEntity::find()
            .filter(SigningLinkColumn::ContactId.eq(contact_id))
            .filter(SigningLinkColumn::Status.ne(String::from(LinkStatus::Pending)))
            .count(self.read_conn())
            .await?;

        Ok(count > 0)
    }

    /// Update a contact's email
    pub async fn update_contact_email(
        &self,
        contact_id: Uuid,
        email: Option<String>,
    ) -> Result<Contact> {
        let mut contact: ContactActiveModel = ContactEntity::find_by_id(contact_id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::ContactNotFound {
                id: contact_id.to_string(),
            })?
            .into();

        contact.email = Set(email);
        contact.updated_at = Set(chrono::Utc::now().into());

        contact.update(self.write_conn()).await.map_err(Into::into)
    }

    // ========================================================================
    // Contract Field Operations
    // ========================================================================

    /// Get all fields for a document
    pub async fn fields_for_document(&self, document_id: Uuid) -> Result<Vec<ContractField>> {
        ContractFieldEntity::find()
            .filter(ContractFieldColumn::DocumentId.eq(document_id))
            .order_by_asc(ContractFieldColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Distinct contact ids referenced by a document's fields, in stable order
    pub async fn distinct_field_contacts(&self, document_id: Uuid) -> Result<Vec<Uuid>> {
        let fields = self.fields_for_document(document_id).await?;

        let distinct: BTreeSet<Uuid> = fields.into_iter().map(|f| f.contact_id).collect();
        Ok(distinct.into_iter().collect())
    }

    /// Fields scoped to one contact/document pair, as shown to a signer
    pub async fn fields_for_link(
        &self,
        document_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Vec<ContractField>> {
        ContractFieldEntity::find()
            .filter(ContractFieldColumn::DocumentId.eq(document_id))
            .filter(ContractFieldColumn::ContactId.eq(contact_id))
            .order_by_asc(ContractFieldColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Signing Link Operations
    // ========================================================================

    /// Create a signing link with status pending
    pub async fn create_signing_link(
        &self,
        document_id: Uuid,
        contact_id: Uuid,
        user_id: Uuid,
        token: String,
    ) -> Result<SigningLink> {
        let now = chrono::Utc::now();

        let link = SigningLinkActiveModel {
            id: Set(Uuid::new_v4()),
            token: Set(token),
            document_id: Set(document_id),
            contact_id: Set(contact_id),
            user_id: Set(user_id),
            status: Set(String::from(LinkStatus::Pending)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        link.insert(self.write_conn()).await.map_err(Into::into)
    }

    /// Find an existing non-completed link for a contact/document pair
    pub async fn find_open_link(
        &self,
        document_id: Uuid,
        contact_id: Uuid,
    ) -> Result<Option<SigningLink>> {
        SigningLinkEntity::find()
            .filter(SigningLinkColumn::DocumentId.eq(document_id))
            .filter(SigningLinkColumn::ContactId.eq(contact_id))
            .filter(SigningLinkColumn::Status.ne(String::from(LinkStatus::Completed)))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find signing link by its opaque token.
    ///
    /// Always reads the primary so the submission handler's re-resolve sees
    /// current status rather than replica lag.
    pub async fn find_link_by_token(&self, token: &str) -> Result<Option<SigningLink>> {
        SigningLinkEntity::find()
            .filter(SigningLinkColumn::Token.eq(token))
            .one(self.write_conn())
            .await
            .map_err(Into::into)
    }

    /// All links for a document joined with their contacts
    pub async fn links_with_contacts(&self, document_id: Uuid) -> Result<Vec<LinkWithContact>> {
        let rows = SigningLinkEntity::find()
            .filter(SigningLinkColumn::DocumentId.eq(document_id))
            .order_by_asc(SigningLinkColumn::CreatedAt)
            .find_also_related(ContactEntity)
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(link, contact)| LinkWithContact { link, contact })
            .collect())
    }

    /// Mark a link as sent. Conditional on the link still being pending so a
    /// later state (viewed, completed) is never rewound.
    pub async fn mark_link_sent(&self, link_id: Uuid) -> Result<bool> {
        let result = SigningLinkEntity::update_many()
            .col_expr(
                SigningLinkColumn::Status,
                sea_orm::sea_query::Expr::value(String::from(LinkStatus::Sent)),
            )
            .col_expr(
                SigningLinkColumn::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now()),
            )
            .filter(SigningLinkColumn::Id.eq(link_id))
            .filter(SigningLinkColumn::Status.eq(String::from(LinkStatus::Pending)))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Persist accepted field values and complete the link in one transaction.
    ///
    /// The status transition is a conditional update: it only matches while
    /// the link is still pending or viewed, so concurrent submissions cannot
    /// both complete the same link. Returns false (and commits nothing) when
    /// the condition no longer holds.
    pub async fn submit_field_values(
        &self,
        owner_id: Uuid,
        document_id: Uuid,
        link_id: Uuid,
        values: &[(Uuid, Option<String>)],
    ) -> Result<bool> {
        let txn = self.write_conn().begin().await?;

        // Claim the link first; losing the race means no field is written.
        let claimed = SigningLinkEntity::update_many()
            .col_expr(
                SigningLinkColumn::Status,
                sea_orm::sea_query::Expr::value(String::from(LinkStatus::Completed)),
            )
            .col_expr(
                SigningLinkColumn::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now()),
            )
            .filter(SigningLinkColumn::Id.eq(link_id))
            .filter(SigningLinkColumn::Status.is_in([
                String::from(LinkStatus::Pending),
                String::from(LinkStatus::Viewed),
            ]))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        // Batch write, scoped by owner and document for storage-layer access
        // control; the join to documents enforces the owner scope.
        for (field_id, value) in values {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"
                UPDATE contract_fields f
                SET field_value = $1, updated_at = NOW()
                FROM documents d
                WHERE f.id = $2
                  AND f.document_id = $3
                  AND d.id = f.document_id
                  AND d.user_id = $4
                "#,
                vec![
                    value.clone().into(),
                    (*field_id).into(),
                    document_id.into(),
                    owner_id.into(),
                ],
            );

            txn.execute(stmt).await?;
        }

        txn.commit().await?;
        Ok(true)
    }
}
