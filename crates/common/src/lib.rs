//! Signet Common Library
//!
//! Shared code for the Signet e-signature service including:
//! - Database models and repository pattern
//! - Signing workflow (link issuance, token resolution, field submission)
//! - Notification transports
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod notify;
pub mod signing;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use notify::{NotificationTransport, Notifier};
pub use signing::SigningService;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Path segment under which public signing URLs are served
pub const SIGNING_PATH: &str = "sign";
