//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Methods suffixed `_in` take an
//! open connection instead, so a caller can compose several writes into one
//! transaction.

pub mod deployment_repo;
pub mod ledger_repo;
pub mod project_repo;
pub mod user_repo;

pub use deployment_repo::DeploymentRepo;
pub use ledger_repo::{LedgerError, LedgerRepo};
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
