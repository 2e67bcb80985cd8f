//! Signing link entity
//!
//! A per-contact access token gating a document's fillable fields.
//! Status advances monotonically: pending -> sent -> viewed -> completed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Link status enum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Pending,
    Sent,
    Viewed,
    Completed,
}

impl LinkStatus {
    /// Position in the lifecycle; transitions must never decrease this.
    pub fn rank(&self) -> u8 {
        match self {
            LinkStatus::Pending => 0,
            LinkStatus::Sent => 1,
            LinkStatus::Viewed => 2,
            LinkStatus::Completed => 3,
        }
    }

    /// Whether a transition to `next` preserves monotonicity
    pub fn can_advance_to(&self, next: LinkStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Whether a field submission is allowed against this link
    pub fn accepts_submission(&self) -> bool {
        matches!(self, LinkStatus::Pending | LinkStatus::Viewed)
    }
}

impl From<String> for LinkStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => LinkStatus::Pending,
            "sent" => LinkStatus::Sent,
            "viewed" => LinkStatus::Viewed,
            "completed" => LinkStatus::Completed,
            _ => LinkStatus::Pending,
        }
    }
}

impl From<LinkStatus> for String {
    fn from(status: LinkStatus) -> Self {
        match status {
            LinkStatus::Pending => "pending".to_string(),
            LinkStatus::Sent => "sent".to_string(),
            LinkStatus::Viewed => "viewed".to_string(),
            LinkStatus::Completed => "completed".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "signing_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Opaque public token; unique, no format guarantees beyond that
    #[sea_orm(column_type = "Text", unique)]
    pub token: String,

    pub document_id: Uuid,

    pub contact_id: Uuid,

    /// Owner who issued the link
    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the link status as an enum
    pub fn link_status(&self) -> LinkStatus {
        LinkStatus::from(self.status.clone())
    }

    /// Check if the link is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.link_status() == LinkStatus::Completed
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document::Entity",
        from = "Column::DocumentId",
        to = "super::document::Column::Id"
    )]
    Document,

    #[sea_orm(
        belongs_to = "super::contact::Entity",
        from = "Column::ContactId",
        to = "super::contact::Column::Id"
    )]
    Contact,
}

impl Related<super::document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_monotonic() {
        assert!(LinkStatus::Pending.can_advance_to(LinkStatus::Sent));
        assert!(LinkStatus::Pending.can_advance_to(LinkStatus::Completed));
        assert!(LinkStatus::Sent.can_advance_to(LinkStatus::Viewed));
        assert!(!LinkStatus::Completed.can_advance_to(LinkStatus::Pending));
        assert!(!LinkStatus::Viewed.can_advance_to(LinkStatus::Sent));
        assert!(!LinkStatus::Sent.can_advance_to(LinkStatus::Sent));
    }

    #[test]
    fn test_submission_gate() {
        assert!(LinkStatus::Pending.accepts_submission());
        assert!(LinkStatus::Viewed.accepts_submission());
        assert!(!LinkStatus::Sent.accepts_submission());
        assert!(!LinkStatus::Completed.accepts_submission());
    }

    #[test]
    fn test_status_string_roundtrip() {
        assert_eq!(LinkStatus::from("viewed".to_string()), LinkStatus::Viewed);
        assert_eq!(String::from(LinkStatus::Completed), "completed");
        // Unknown strings degrade to pending
        assert_eq!(LinkStatus::from("weird".to_string()), LinkStatus::Pending);
    }
}
