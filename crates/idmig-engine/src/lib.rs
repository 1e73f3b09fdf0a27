//! # idmig-engine
//!
//! The migration itself: per-user reconciliation, the orchestrator that runs
//! it over every source user, the role and tenant binders, and the password
//! importer.
//!
//! Every phase takes a [`MigrationContext`] and returns a serializable
//! summary. Failures of individual records are collected in the summary;
//! only a failed listing ends a phase early.

pub mod context;
pub mod login_ids;
pub mod orchestrator;
pub mod passwords;
pub mod reconcile;
pub mod resilient;
pub mod roles;
pub mod tally;
pub mod tenants;

mod error;
mod members;

pub use context::{MigrationContext, RunSettings};
pub use error::PasswordError;
pub use orchestrator::{MigrationSummary, Orchestrator, Progress, ProgressObserver};
pub use passwords::PasswordSummary;
pub use reconcile::Reconciler;
pub use resilient::RetryingDirectory;
pub use roles::RoleSummary;
pub use tally::{BindingTally, CreationTally};
pub use tenants::TenantSummary;
