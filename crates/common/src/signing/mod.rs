//! Signing workflow
//!
//! The core of the service: link issuance, token resolution, and field
//! submission. Storage access goes through [`Repository`]; everything that
//! can be decided without the database (submission filtering, token and URL
//! formats) lives in pure functions here.

use crate::db::models::{Contact, ContractField, Document, SigningLink};
use crate::db::Repository;
use crate::errors::{AppError, Result};
use crate::SIGNING_PATH;
use std::collections::HashMap;
use uuid::Uuid;

/// Generate a new opaque signing token
pub fn generate_signing_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    format!("sg_{}", hex::encode(random_bytes))
}

/// Absolute signing URL for a token: `{base}/sign/{token}`
pub fn signing_url(base_url: &str, token: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), SIGNING_PATH, token)
}

/// One issued link, as returned to the document owner
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedLink {
    pub link_id: Uuid,
    pub contact_id: Uuid,
    pub token: String,
    pub url: String,
}

/// Everything a signer sees when resolving a token
#[derive(Debug, Clone)]
pub struct SigningSession {
    pub link: SigningLink,
    pub document: Document,
    pub contact: Contact,
    pub fields: Vec<ContractField>,
}

/// Outcome of filtering a submitted value map against the authoritative
/// field list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionPlan {
    /// (field id, value) pairs that passed the ownership check
    pub accepted: Vec<(Uuid, Option<String>)>,
    /// Submitted field ids that were dropped
    pub dropped: Vec<Uuid>,
}

impl SubmissionPlan {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Validate a submitted field-id -> value map against a field-descriptor
/// list. A submitted id is accepted only when a matching field exists and
/// its contact/document pair equals the link's pair; everything else is
/// dropped, never failing the whole map.
pub fn filter_submission(
    fields: &[ContractField],
    document_id: Uuid,
    contact_id: Uuid,
    submitted: &HashMap<Uuid, Option<String>>,
) -> SubmissionPlan {
    let mut plan = SubmissionPlan::default();

    // Walk the authoritative list so accepted order is stable
    for field in fields {
        if let Some(value) = submitted.get(&field.id) {
            if field.belongs_to(document_id, contact_id) {
                plan.accepted.push((field.id, value.clone()));
            } else {
                plan.dropped.push(field.id);
            }
        }
    }

    // Submitted ids that matched no field at all
    for id in submitted.keys() {
        if !fields.iter().any(|f| f.id == *id) {
            plan.dropped.push(*id);
        }
    }

    plan
}

/// Orchestrates the signing workflow against the repository
#[derive(Clone)]
pub struct SigningService {
    repo: Repository,
    base_url: String,
}

impl SigningService {
    pub fn new(repo: Repository, base_url: impl Into<String>) -> Self {
        Self {
            repo,
            base_url: base_url.into(),
        }
    }

    /// Issue one pending link per distinct contact referenced by the
    /// document's fields. Returns an empty list when the document has no
    /// fields. Re-issuing reuses a contact's existing non-completed link
    /// instead of minting a duplicate token.
    pub async fn issue_links(
        &self,
        workspace_id: Uuid,
        owner_id: Uuid,
        document_id: Uuid,
    ) -> Result<Vec<IssuedLink>> {
        let document = self
            .repo
            .find_document_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::DocumentNotFound {
                id: document_id.to_string(),
            })?;

        if document.workspace_id != workspace_id {
            return Err(AppError::WorkspaceMismatch);
        }

        let contacts = self.repo.distinct_field_contacts(document_id).await?;
        if contacts.is_empty() {
            tracing::info!(document_id = %document_id, "No fields on document, no links issued");
            return Ok(Vec::new());
        }

        let mut issued = Vec::with_capacity(contacts.len());
        for contact_id in contacts {
            let link = match self.repo.find_open_link(document_id, contact_id).await? {
                Some(existing) => existing,
                None => {
                    self.repo
                        .create_signing_link(
                            document_id,
                            contact_id,
                            owner_id,
                            generate_signing_token(),
                        )
                        .await?
                }
            };

            issued.push(IssuedLink {
                link_id: link.id,
                contact_id,
                url: signing_url(&self.base_url, &link.token),
                token: link.token,
            });
        }

        metrics::counter!("signet_links_issued_total").increment(issued.len() as u64);

        tracing::info!(
            document_id = %document_id,
            count = issued.len(),
            "Signing links issued"
        );

        Ok(issued)
    }

    /// Resolve an opaque token to its link, document, contact, and the field
    /// list for that contact/document pair. Returns None for unknown tokens
    /// and for links whose document or contact has gone missing; the caller
    /// must not distinguish the two. Never changes link status.
    pub async fn resolve(&self, token: &str) -> Result<Option<SigningSession>> {
        let Some(link) = self.repo.find_link_by_token(token).await? else {
            return Ok(None);
        };

        let Some(document) = self.repo.find_document_by_id(link.document_id).await? else {
            tracing::warn!(link_id = %link.id, "Signing link references missing document");
            return Ok(None);
        };

        let Some(contact) = self.repo.find_contact_by_id(link.contact_id).await? else {
            tracing::warn!(link_id = %link.id, "Signing link references missing contact");
            return Ok(None);
        };

        let fields = self
            .repo
            .fields_for_link(link.document_id, link.contact_id)
            .await?;

        Ok(Some(SigningSession {
            link,
            document,
            contact,
            fields,
        }))
    }

    /// Handle a field submission for a token. Re-resolves the link fresh,
    /// fails closed unless the status still accepts submissions, drops
    /// non-matching field ids, persists the survivors in one batch, and
    /// completes the link. Returns the number of fields persisted.
    pub async fn submit(
        &self,
        token: &str,
        submitted: HashMap<Uuid, Option<String>>,
    ) -> Result<usize> {
        // Fresh read, never a cached session
        let link = self
            .repo
            .find_link_by_token(token)
            .await?
            .ok_or(AppError::LinkInvalid)?;

        if !link.link_status().accepts_submission() {
            tracing::warn!(
                link_id = %link.id,
                status = %link.status,
                "Submission rejected: link no longer open"
            );
            metrics::counter!("signet_submissions_rejected_total").increment(1);
            return Err(AppError::LinkInvalid);
        }

        let fields = self.repo.fields_for_document(link.document_id).await?;
        let plan = filter_submission(&fields, link.document_id, link.contact_id, &submitted);

        for dropped in &plan.dropped {
            tracing::warn!(
                link_id = %link.id,
                field_id = %dropped,
                "Dropped submitted field not owned by this link"
            );
        }
        if !plan.dropped.is_empty() {
            metrics::counter!("signet_fields_dropped_total").increment(plan.dropped.len() as u64);
        }

        if plan.is_empty() {
            metrics::counter!("signet_submissions_rejected_total").increment(1);
            return Err(AppError::NoValidFields);
        }

        let completed = self
            .repo
            .submit_field_values(link.user_id, link.document_id, link.id, &plan.accepted)
            .await?;

        // A concurrent submission won the conditional transition; nothing
        // was written for this one.
        if !completed {
            metrics::counter!("signet_submissions_rejected_total").increment(1);
            return Err(AppError::LinkInvalid);
        }

        metrics::counter!("signet_submissions_total").increment(1);

        tracing::info!(
            link_id = %link.id,
            document_id = %link.document_id,
            fields = plan.accepted.len(),
            "Submission persisted, link completed"
        );

        Ok(plan.accepted.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn field(document_id: Uuid, contact_id: Uuid, name: &str) -> ContractField {
        ContractField {
            id: Uuid::new_v4(),
            document_id,
            contact_id,
            field_name: name.into(),
            field_type: "text".into(),
            is_required: false,
            field_value: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_token_format() {
        let token = generate_signing_token();
        assert!(token.starts_with("sg_"));
        assert_eq!(token.len(), 3 + 64);
        assert_ne!(token, generate_signing_token());
    }

    #[test]
    fn test_signing_url() {
        assert_eq!(
            signing_url("https://sign.example.com", "sg_abc"),
            "https://sign.example.com/sign/sg_abc"
        );
        // Trailing slash on the base does not double up
        assert_eq!(
            signing_url("https://sign.example.com/", "sg_abc"),
            "https://sign.example.com/sign/sg_abc"
        );
    }

    #[test]
    fn test_filter_accepts_owned_fields() {
        let doc = Uuid::new_v4();
        let contact = Uuid::new_v4();
        let f1 = field(doc, contact, "name");
        let f2 = field(doc, contact, "signature");

        let submitted = HashMap::from([
            (f1.id, Some("Alice".to_string())),
            (f2.id, None),
        ]);

        let plan = filter_submission(&[f1.clone(), f2.clone()], doc, contact, &submitted);
        assert_eq!(plan.accepted.len(), 2);
        assert!(plan.dropped.is_empty());
        assert_eq!(plan.accepted[0], (f1.id, Some("Alice".to_string())));
        assert_eq!(plan.accepted[1], (f2.id, None));
    }

    #[test]
    fn test_filter_drops_cross_contact_but_keeps_siblings() {
        let doc = Uuid::new_v4();
        let contact_a = Uuid::new_v4();
        let contact_b = Uuid::new_v4();
        let mine = field(doc, contact_a, "name");
        let theirs = field(doc, contact_b, "name");

        let submitted = HashMap::from([
            (mine.id, Some("Alice".to_string())),
            (theirs.id, Some("Mallory".to_string())),
        ]);

        let plan = filter_submission(
            &[mine.clone(), theirs.clone()],
            doc,
            contact_a,
            &submitted,
        );
        assert_eq!(plan.accepted, vec![(mine.id, Some("Alice".to_string()))]);
        assert_eq!(plan.dropped, vec![theirs.id]);
    }

    #[test]
    fn test_filter_drops_cross_document() {
        let doc = Uuid::new_v4();
        let other_doc = Uuid::new_v4();
        let contact = Uuid::new_v4();
        let foreign = field(other_doc, contact, "name");

        let submitted = HashMap::from([(foreign.id, Some("x".to_string()))]);

        let plan = filter_submission(&[foreign.clone()], doc, contact, &submitted);
        assert!(plan.accepted.is_empty());
        assert_eq!(plan.dropped, vec![foreign.id]);
    }

    #[test]
    fn test_filter_drops_unknown_ids() {
        let doc = Uuid::new_v4();
        let contact = Uuid::new_v4();
        let f1 = field(doc, contact, "name");
        let forged = Uuid::new_v4();

        let submitted = HashMap::from([
            (f1.id, Some("Alice".to_string())),
            (forged, Some("evil".to_string())),
        ]);

        let plan = filter_submission(&[f1.clone()], doc, contact, &submitted);
        assert_eq!(plan.accepted, vec![(f1.id, Some("Alice".to_string()))]);
        assert_eq!(plan.dropped, vec![forged]);
    }

    #[test]
    fn test_filter_empty_submission() {
        let doc = Uuid::new_v4();
        let contact = Uuid::new_v4();
        let f1 = field(doc, contact, "name");

        let plan = filter_submission(&[f1], doc, contact, &HashMap::new());
        assert!(plan.is_empty());
        assert!(plan.dropped.is_empty());
    }
}
