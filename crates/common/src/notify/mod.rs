//! Notification dispatch for signing invitations
//!
//! The transport is an external collaborator behind a trait: the default
//! deployment logs instead of transmitting, and a webhook transport posts to
//! a configured HTTP endpoint. Per-contact failures are logged and skipped,
//! never aborting the batch.

use crate::config::NotifyConfig;
use crate::db::{LinkWithContact, Repository};
use crate::errors::{AppError, Result};
use crate::signing::signing_url;
use async_trait::async_trait;
use regex_lite::Regex;
use std::sync::Arc;
use uuid::Uuid;

/// Accepts (recipient, subject, body) and reports delivery confirmation
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<bool>;

    fn name(&self) -> &'static str;
}

/// Logging stub transport: records the message instead of transmitting it
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<bool> {
        tracing::info!(
            recipient = %recipient,
            subject = %subject,
            body_len = body.len(),
            "Notification (log transport, not transmitted)"
        );
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Webhook transport: posts the message as JSON to a configured endpoint
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
    from_address: String,
}

impl WebhookTransport {
    pub fn new(url: String, from_address: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url,
            from_address,
        })
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<bool> {
        let payload = serde_json::json!({
            "from": self.from_address,
            "to": recipient,
            "subject": subject,
            "body": body,
        });

        let response = self.client.post(&self.url).json(&payload).send().await?;

        Ok(response.status().is_success())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}

/// Build the configured transport
pub fn transport_from_config(config: &NotifyConfig) -> Result<Arc<dyn NotificationTransport>> {
    match config.transport.as_str() {
        "log" => Ok(Arc::new(LogTransport)),
        "webhook" => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                AppError::Configuration {
                    message: "notify.webhook_url is required for the webhook transport".into(),
                }
            })?;
            Ok(Arc::new(WebhookTransport::new(
                url,
                config.from_address.clone(),
                config.timeout_secs,
            )?))
        }
        other => Err(AppError::Configuration {
            message: format!("Unknown notify transport: {}", other),
        }),
    }
}

/// One invitation ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMessage {
    pub link_id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Summary returned to the caller after a notifier run
#[derive(Debug, Clone, serde::Serialize)]
pub struct NotifySummary {
    pub sent: usize,
    pub skipped: usize,
}

/// Format the invitation for one contact
pub fn format_invitation(contact_name: &str, document_title: &str, url: &str) -> (String, String) {
    let subject = format!("Signature requested: {}", document_title);
    let body = format!(
        "Hello {},\n\nYou have been asked to review and sign \"{}\".\n\n\
         Open your signing link to fill in your fields:\n{}\n\n\
         This link is personal to you. Do not forward it.",
        contact_name, document_title, url
    );
    (subject, body)
}

/// Plan invitations for a document's links. Links without a contact or
/// without a non-empty email are skipped.
pub fn plan_notifications(
    rows: &[LinkWithContact],
    document_title: &str,
    base_url: &str,
) -> (Vec<PlannedMessage>, usize) {
    let mut planned = Vec::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(contact) = &row.contact else {
            tracing::warn!(link_id = %row.link.id, "Signing link has no contact, skipping");
            skipped += 1;
            continue;
        };

        if !contact.has_deliverable_email() {
            tracing::info!(
                link_id = %row.link.id,
                contact_id = %contact.id,
                "Contact has no email, skipping"
            );
            skipped += 1;
            continue;
        }

        let recipient = contact.email.clone().unwrap_or_default();
        let url = signing_url(base_url, &row.link.token);
        let (subject, body) = format_invitation(&contact.name, document_title, &url);

        planned.push(PlannedMessage {
            link_id: row.link.id,
            recipient,
            subject,
            body,
        });
    }

    (planned, skipped)
}

/// Dispatches signing invitations for a document
#[derive(Clone)]
pub struct Notifier {
    repo: Repository,
    transport: Arc<dyn NotificationTransport>,
    base_url: String,
}

impl Notifier {
    pub fn new(
        repo: Repository,
        transport: Arc<dyn NotificationTransport>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            transport,
            base_url: base_url.into(),
        }
    }

    /// Send (or simulate sending) one invitation per addressable contact of
    /// the document, marking each processed link "sent". Transport errors
    /// skip that contact and leave its link untouched; an unconfirmed
    /// delivery still marks the link sent.
    pub async fn notify_document(
        &self,
        workspace_id: Uuid,
        document_id: Uuid,
        display_title: Option<String>,
    ) -> Result<NotifySummary> {
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

        let rows = self.repo.links_with_contacts(document_id).await?;
        if rows.is_empty() {
            return Err(AppError::Conflict {
                message: "no signing links exist for this document".into(),
            });
        }

        let title = display_title.unwrap_or_else(|| document.title.clone());
        let (planned, mut skipped) = plan_notifications(&rows, &title, &self.base_url);

        if planned.is_empty() {
            return Err(AppError::Conflict {
                message: "no contacts with a deliverable email".into(),
            });
        }

        // Flag odd-looking addresses before dispatch; they are still sent,
        // the transport is the authority on deliverability.
        let email_shape = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex");

        let mut sent = 0usize;
        for message in planned {
            if !email_shape.is_match(&message.recipient) {
                tracing::warn!(
                    link_id = %message.link_id,
                    recipient = %message.recipient,
                    "Recipient address looks malformed"
                );
            }

            match self
                .transport
                .send(&message.recipient, &message.subject, &message.body)
                .await
            {
                Ok(confirmed) => {
                    if !confirmed {
                        tracing::warn!(
                            link_id = %message.link_id,
                            transport = self.transport.name(),
                            "Transport did not confirm delivery"
                        );
                    }
                    // Status advances regardless of confirmation
                    self.repo.mark_link_sent(message.link_id).await?;
                    sent += 1;
                }
                Err(e) => {
                    tracing::error!(
                        link_id = %message.link_id,
                        transport = self.transport.name(),
                        error = %e,
                        "Notification dispatch failed, skipping contact"
                    );
                    skipped += 1;
                }
            }
        }

        metrics::counter!("signet_notifications_sent_total").increment(sent as u64);

        tracing::info!(
            document_id = %document_id,
            sent,
            skipped,
            "Notifier run complete"
        );

        Ok(NotifySummary { sent, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Contact, LinkStatus, SigningLink};
    use chrono::Utc;

    fn link(document_id: Uuid, contact_id: Uuid) -> SigningLink {
        SigningLink {
            id: Uuid::new_v4(),
            token: "sg_test".into(),
            document_id,
            contact_id,
            user_id: Uuid::new_v4(),
            status: String::from(LinkStatus::Pending),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn contact(email: Option<&str>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            name: "Alice".into(),
            email: email.map(String::from),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_format_invitation_embeds_url_and_title() {
        let (subject, body) =
            format_invitation("Alice", "NDA", "https://x.test/sign/sg_abc");
        assert!(subject.contains("NDA"));
        assert!(body.contains("Alice"));
        assert!(body.contains("https://x.test/sign/sg_abc"));
    }

    #[test]
    fn test_plan_skips_empty_emails() {
        let doc = Uuid::new_v4();
        let a = contact(Some(""));
        let b = contact(Some("bob@example.com"));
        let rows = vec![
            LinkWithContact { link: link(doc, a.id), contact: Some(a) },
            LinkWithContact { link: link(doc, b.id), contact: Some(b) },
        ];

        let (planned, skipped) = plan_notifications(&rows, "NDA", "https://x.test");
        assert_eq!(planned.len(), 1);
        assert_eq!(skipped, 1);
        assert_eq!(planned[0].recipient, "bob@example.com");
        assert!(planned[0].body.contains("/sign/sg_test"));
    }

    #[test]
    fn test_plan_skips_missing_contact() {
        let doc = Uuid::new_v4();
        let rows = vec![LinkWithContact {
            link: link(doc, Uuid::new_v4()),
            contact: None,
        }];

        let (planned, skipped) = plan_notifications(&rows, "NDA", "https://x.test");
        assert!(planned.is_empty());
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn test_log_transport_confirms() {
        let transport = LogTransport;
        let ok = transport
            .send("alice@example.com", "subject", "body")
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(transport.name(), "log");
    }

    #[test]
    fn test_transport_from_config_rejects_unknown() {
        let mut config = NotifyConfig {
            transport: "carrier-pigeon".into(),
            from_address: "no-reply@signet.local".into(),
            webhook_url: None,
            timeout_secs: 5,
        };
        assert!(transport_from_config(&config).is_err());

        config.transport = "webhook".into();
        // webhook without a URL is a configuration error
        assert!(transport_from_config(&config).is_err());

        config.webhook_url = Some("https://hooks.example.com/mail".into());
        assert!(transport_from_config(&config).is_ok());
    }
}
