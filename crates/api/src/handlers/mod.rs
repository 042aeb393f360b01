//! Request handlers.
//!
//! Each submodule provides the async handler functions for one route group.
//! Handlers delegate to the repositories in `lasy_db`, the job pipeline and
//! the provider clients, and map errors via [`AppError`].

pub mod ai;
pub mod auth;
pub mod payment;
pub mod project;
pub mod user;

use lasy_core::error::CoreError;
use lasy_core::types::DbId;
use lasy_db::repositories::LedgerRepo;
use sqlx::PgConnection;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Run the `validator` rules of a request body.
///
/// Field errors are flattened into one `VALIDATION_ERROR` message, sorted
/// by field name so the output is stable.
pub(crate) fn validate_input<T: Validate>(input: &T) -> AppResult<()> {
    input.validate().map_err(|errors| {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match &err.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: {}", err.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Core(CoreError::Validation(messages.join("; ")))
    })
}

/// Debit `cost` credits inside the caller's transaction.
///
/// A zero price (configurable) is free and writes no ledger row.
pub(crate) async fn charge(
    conn: &mut PgConnection,
    user_id: DbId,
    cost: i32,
    description: &str,
) -> AppResult<()> {
    if cost > 0 {
        LedgerRepo::debit_in(conn, user_id, cost, description).await?;
    }
    Ok(())
}

fn not_found(entity: &'static str, id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity, id })
}
