//! Contract field entity
//!
//! A named slot on a document, owned by exactly one contact. The value is
//! only ever written through the field submission handler.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Field type enum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Signature,
    Text,
    Date,
    Checkbox,
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "signature" => FieldType::Signature,
            "text" => FieldType::Text,
            "date" => FieldType::Date,
            "checkbox" => FieldType::Checkbox,
            _ => FieldType::Text,
        }
    }
}

impl From<FieldType> for String {
    fn from(ft: FieldType) -> Self {
        match ft {
            FieldType::Signature => "signature".to_string(),
            FieldType::Text => "text".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::Checkbox => "checkbox".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contract_fields")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub document_id: Uuid,

    pub contact_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub field_name: String,

    #[sea_orm(column_type = "Text")]
    pub field_type: String,

    pub is_required: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub field_value: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the field type as an enum
    pub fn kind(&self) -> FieldType {
        FieldType::from(self.field_type.clone())
    }

    /// Whether the submitted field id may write through the given link pair.
    /// Both the contact and the document must match; this is what blocks
    /// cross-contact and cross-document injection via forged field ids.
    pub fn belongs_to(&self, document_id: Uuid, contact_id: Uuid) -> bool {
        self.document_id == document_id && self.contact_id == contact_id
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
    use chrono::Utc;

    #[test]
    fn test_field_type_roundtrip() {
        assert_eq!(FieldType::from("signature".to_string()), FieldType::Signature);
        assert_eq!(String::from(FieldType::Checkbox), "checkbox");
        // Unknown types degrade to text
        assert_eq!(FieldType::from("blob".to_string()), FieldType::Text);
    }

    #[test]
    fn test_belongs_to_requires_double_match() {
        let doc = Uuid::new_v4();
        let contact = Uuid::new_v4();
        let field = Model {
            id: Uuid::new_v4(),
            document_id: doc,
            contact_id: contact,
            field_name: "signature".into(),
            field_type: "signature".into(),
            is_required: true,
            field_value: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };

        assert!(field.belongs_to(doc, contact));
        assert!(!field.belongs_to(doc, Uuid::new_v4()));
        assert!(!field.belongs_to(Uuid::new_v4(), contact));
    }
}
