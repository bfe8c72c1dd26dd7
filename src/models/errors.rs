use rust_decimal::Decimal;
use thiserror::Error;

use crate::balance::BalanceError;
use crate::types::{AccountId, RawFieldError, TransactionId};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Duplicate transaction [{transaction_id}] for account [{account_id}]")]
    DuplicateTransaction {
        account_id: AccountId,
        transaction_id: TransactionId
    },
    #[error("Transaction [{transaction_id}] belongs to account [{transaction_account_id}], not [{account_id}]")]
    AccountMismatch {
        account_id: AccountId,
        transaction_id: TransactionId,
        transaction_account_id: AccountId
    },
    #[error("Transaction [{transaction_id}] was not found for account [{account_id}]")]
    TransactionNotFound {
        account_id: AccountId,
        transaction_id: TransactionId
    },
    #[error("Transaction [{transaction_id}] is already deleted for account [{account_id}]")]
    AlreadyDeleted {
        account_id: AccountId,
        transaction_id: TransactionId
    },
    #[error("Transaction [{transaction_id}] is not deleted for account [{account_id}]")]
    NotDeleted {
        account_id: AccountId,
        transaction_id: TransactionId
    },
    #[error("Amount [{amount}] must not be negative for transaction [{transaction_id}] for account [{account_id}]")]
    NegativeAmount {
        account_id: AccountId,
        transaction_id: TransactionId,
        amount: Decimal
    },
    #[error("Transaction [{transaction_id}] rejected for account [{account_id}]: {source}")]
    BalanceOverflow {
        account_id: AccountId,
        transaction_id: TransactionId,
        source: BalanceError
    }
}

impl AccountError {
    pub fn duplicate_transaction(account_id: &str, transaction_id: &str) -> Self {
        Self::DuplicateTransaction {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string()
        }
    }

    pub fn account_mismatch(account_id: &str, transaction_id: &str, transaction_account_id: &str) -> Self {
        Self::AccountMismatch {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string(),
            transaction_account_id: transaction_account_id.to_string()
        }
    }

    pub fn transaction_not_found(account_id: &str, transaction_id: &str) -> Self {
        Self::TransactionNotFound {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string()
        }
    }

    pub fn already_deleted(account_id: &str, transaction_id: &str) -> Self {
        Self::AlreadyDeleted {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string()
        }
    }

    pub fn not_deleted(account_id: &str, transaction_id: &str) -> Self {
        Self::NotDeleted {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string()
        }
    }

    pub fn negative_amount(account_id: &str, transaction_id: &str, amount: Decimal) -> Self {
        Self::NegativeAmount {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string(),
            amount
        }
    }

    pub fn balance_overflow(account_id: &str, transaction_id: &str, source: BalanceError) -> Self {
        Self::BalanceOverflow {
            account_id: account_id.to_string(),
            transaction_id: transaction_id.to_string(),
            source
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command error: Unknown action [{action}]")]
    UnknownAction {
        action: String
    },
    #[error("Command error: Missing [{field}]")]
    MissingField {
        field: &'static str
    },
    #[error("Command error: Invalid [{field}]: {source}")]
    InvalidField {
        field: &'static str,
        source: RawFieldError
    }
}

impl CommandError {
    pub fn unknown_action(action: &str) -> Self {
        Self::UnknownAction {
            action: action.to_string()
        }
    }

    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    pub fn invalid_field(field: &'static str, source: RawFieldError) -> Self {
        Self::InvalidField { field, source }
    }
}
