mod account;
mod command;
mod comment;
mod errors;
mod history;
mod raw;
mod transaction;

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use account::{Account, TransactionUpdate};
pub use command::{CommandRow, LedgerCommand};
pub use errors::{AccountError, CommandError};
pub use history::{FieldChange, HistoryAction, HistoryEntry};
pub use raw::{CanonicalRecord, LegacyRecord, MercuryRecord, RawTransaction, UNASSIGNED_ACCOUNT};
pub use transaction::{Commission, NormalizedTransaction, DELETED_STATUS};

/// Canonical category of a transaction, used for all balance math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    WalletDeposit,
    Withdrawal,
    TransactionApproved,
    TransactionPending,
    TransactionRefund,
    TransactionReversed,
    TransactionRejected,
    OverrideVirtualBalance
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::WalletDeposit => "WALLET_DEPOSIT",
            OperationKind::Withdrawal => "WITHDRAWAL",
            OperationKind::TransactionApproved => "TRANSACTION_APPROVED",
            OperationKind::TransactionPending => "TRANSACTION_PENDING",
            OperationKind::TransactionRefund => "TRANSACTION_REFUND",
            OperationKind::TransactionReversed => "TRANSACTION_REVERSED",
            OperationKind::TransactionRejected => "TRANSACTION_REJECTED",
            OperationKind::OverrideVirtualBalance => "OVERRIDE_VIRTUAL_BALANCE"
        }
    }

    /// Direction implied by the kind when the source carries no explicit credit flag.
    pub fn implies_credit(&self) -> bool {
        matches!(
            self,
            OperationKind::WalletDeposit | OperationKind::TransactionRefund | OperationKind::TransactionReversed
        )
    }
}

impl Display for OperationKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The legacy system a raw record was exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSystem {
    Legacy,
    Mercury
}

impl FromStr for SourceSystem {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "legacy" | "a" => Ok(SourceSystem::Legacy),
            "mercury" | "b" => Ok(SourceSystem::Mercury),
            other => Err(format!("Unknown source system '{other}'"))
        }
    }
}
