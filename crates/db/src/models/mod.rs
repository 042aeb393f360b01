//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the DTOs its repository accepts.

pub mod deployment;
pub mod project;
pub mod status;
pub mod transaction;
pub mod user;
