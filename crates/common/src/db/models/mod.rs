//! SeaORM entity models
//!
//! Database entities for Signet

mod contact;
mod contract_field;
mod document;
mod signing_link;
mod workspace;

pub use workspace::{
    Entity as WorkspaceEntity,
    Model as Workspace,
    ActiveModel as WorkspaceActiveModel,
    Column as WorkspaceColumn,
};

pub use document::{
    Entity as DocumentEntity,
    Model as Document,
    ActiveModel as DocumentActiveModel,
    Column as DocumentColumn,
};

pub use contact::{
    Entity as ContactEntity,
    Model as Contact,
    ActiveModel as ContactActiveModel,
    Column as ContactColumn,
};

pub use contract_field::{
    Entity as ContractFieldEntity,
    Model as ContractField,
    ActiveModel as ContractFieldActiveModel,
    Column as ContractFieldColumn,
    FieldType,
};

pub use signing_link::{
    Entity as SigningLinkEntity,
    Model as SigningLink,
    ActiveModel as SigningLinkActiveModel,
    Column as SigningLinkColumn,
    LinkStatus,
};
