//! Contact entity
//!
//! A person expected to fill fields on documents. The email may be
//! edited until a signing link for the contact has been sent.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub workspace_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub name: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub email: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether the notifier can address this contact
    pub fn has_deliverable_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspace::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspace::Column::Id"
    )]
    Workspace,

    #[sea_orm(has_many = "super::contract_field::Entity")]
    ContractFields,

    #[sea_orm(has_many = "super::signing_link::Entity")]
    SigningLinks,
}

impl Related<super::workspace::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspace.def()
    }
}

impl Related<super::contract_field::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContractFields.def()
    }
}

impl Related<super::signing_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SigningLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn contact(email: Option<&str>) -> Model {
        Model {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            name: "Alice".into(),
            email: email.map(String::from),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_deliverable_email() {
        assert!(contact(Some("alice@example.com")).has_deliverable_email());
        assert!(!contact(Some("")).has_deliverable_email());
        assert!(!contact(Some("   ")).has_deliverable_email());
        assert!(!contact(None).has_deliverable_email());
    }
}
