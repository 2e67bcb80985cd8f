//! Document entity
//!
//! A signable text artifact. Content is expected to stay stable once
//! signing links exist, but this is a convention, not a constraint.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub workspace_id: Uuid,

    /// Owning user within the workspace
    pub user_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
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
