//! Credit ledger entry model.

use lasy_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::{StatusId, TransactionKind};

/// A row from the append-only `transactions` table.
///
/// `amount` is signed: debits are negative, credits positive.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditTransaction {
    pub id: DbId,
    pub user_id: DbId,
    pub amount: i32,
    #[serde(rename = "kind", serialize_with = "TransactionKind::serialize_id")]
    pub kind_id: StatusId,
    pub description: String,
    pub external_ref: Option<String>,
    pub balance_after: i32,
    pub created_at: Timestamp,
}

impl CreditTransaction {
    pub fn kind(&self) -> Option<TransactionKind> {
        TransactionKind::from_id(self.kind_id)
    }
}
