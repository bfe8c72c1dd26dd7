use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{OperationKind, SourceSystem};
use crate::types::{AccountId, TransactionId};

/// Status the first legacy system used to soft-delete rows before `isDeleted` existed.
pub const DELETED_STATUS: &str = "DELETED";

/// Fee breakdown carried by wallet deposits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commission {
    pub gross_amount: Decimal,
    pub rate: Decimal,
    pub commission_amount: Decimal,
    pub net_amount: Decimal
}

impl Commission {
    /// Withholds `rate` of `gross_amount`. `None` when the figures leave the `Decimal` range.
    pub fn apply(gross_amount: Decimal, rate: Decimal) -> Option<Self> {
        let commission_amount = gross_amount.checked_mul(rate)?;

        Some(Self {
            gross_amount,
            rate,
            commission_amount,
            net_amount: gross_amount.checked_sub(commission_amount)?
        })
    }

    /// A deposit on which no commission was withheld.
    pub fn waived(gross_amount: Decimal, rate: Decimal) -> Self {
        Self {
            gross_amount,
            rate,
            commission_amount: Decimal::ZERO,
            net_amount: gross_amount
        }
    }
}

/// A classified transaction, ready for balance aggregation.
///
/// `amount` is always a non-negative magnitude; the direction comes from
/// `operation_kind` (and from `is_credit` for balance overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub card_id: Option<String>,
    pub source: SourceSystem,
    /// The status string exactly as the source system reported it.
    pub source_status: String,
    pub operation_kind: OperationKind,
    pub amount: Decimal,
    pub is_credit: bool,
    pub is_deleted: bool,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub commission: Option<Commission>
}

impl NormalizedTransaction {
    /// Whether the transaction takes part in balance aggregation.
    ///
    /// Either soft-delete signal excludes it: the `is_deleted` flag or the older
    /// `DELETED` status.
    pub fn is_active(&self) -> bool {
        !self.is_deleted && !self.source_status.trim().eq_ignore_ascii_case(DELETED_STATUS)
    }
}
