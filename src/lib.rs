pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use config::{AppConfig, MatchingConfig};
pub use error::ConfigError;
pub use models::{ExtractedDocument, MatchingResult, ReconcileOutcome};
pub use service::{reconcile, reconcile_workspaces, ReconcileService};
