//! Request handlers for the Signet gateway

pub mod contacts;
pub mod documents;
pub mod health;
pub mod notifications;
pub mod signing;
