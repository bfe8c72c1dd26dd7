use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use crate::balance::{aggregate, BalanceError, BalanceSnapshot};
use crate::models::comment::{mark_deleted, unmark_deleted};
use crate::models::history::{FIELD_AMOUNT, FIELD_COMMENT, FIELD_IS_DELETED, FIELD_STATUS};
use crate::models::{AccountError, FieldChange, HistoryAction, HistoryEntry, LedgerCommand, NormalizedTransaction, DELETED_STATUS};
use crate::types::{AccountId, TransactionId};

/// Manual corrections to a recorded transaction. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    pub comment: Option<String>,
    pub amount: Option<Decimal>
}

/// A recorded transaction together with its audit trail.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    transaction: NormalizedTransaction,
    /// Set while the comment carries a deletion annotation from [`Account::delete`].
    deleted_at: Option<DateTime<Utc>>,
    history: Vec<HistoryEntry>
}

impl LedgerEntry {
    fn new(transaction: NormalizedTransaction, actor: &str, at: DateTime<Utc>) -> Self {
        let mut entry = Self {
            transaction,
            deleted_at: None,
            history: Vec::new()
        };

        entry.push(HistoryAction::Created, actor, at, Vec::new());
        entry
    }

    pub fn transaction(&self) -> &NormalizedTransaction {
        &self.transaction
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The user-authored comment, without any deletion annotation.
    pub fn comment(&self) -> &str {
        let stored = self.transaction.comment.as_str();

        match self.deleted_at {
            Some(deleted_at) => unmark_deleted(stored, deleted_at).unwrap_or(stored),
            None => stored
        }
    }

    fn push(&mut self, action: HistoryAction, actor: &str, at: DateTime<Utc>, changes: Vec<FieldChange>) {
        let version = self.history.last().map_or(1, |entry| entry.version + 1);

        self.history.push(HistoryEntry {
            version,
            action,
            at,
            actor: actor.to_string(),
            changes
        });
    }
}

/// The transaction set of a single account (card) and the balance derived from it.
///
/// Every mutation ends with a full [`Account::recalculate`], so `balance` always
/// reflects exactly the active transactions currently in the ledger.
#[derive(Debug, Clone)]
pub struct Account {
    /// The unique identifier for the account.
    pub account_id: AccountId,
    /// Balance fields aggregated from every active transaction.
    pub balance: BalanceSnapshot,
    /// Every transaction ever recorded, soft-deleted ones included.
    entries: HashMap<TransactionId, LedgerEntry>
}

impl Account {
    /// Creates a new, empty account for the given ID.
    pub fn new(account_id: impl Into<AccountId>) -> Self {
        Self {
            account_id: account_id.into(),
            balance: BalanceSnapshot::default(),
            entries: HashMap::new()
        }
    }

    /// Applies a single ledger command to the account.
    ///
    /// # Errors
    /// Returns `AccountError` if:
    /// - A recorded transaction is a duplicate, belongs to another account or has a negative amount.
    /// - The referenced transaction does not exist.
    /// - A delete targets a deleted transaction, or a restore targets an active one.
    /// - The resulting balance would leave the `Decimal` range. The command is then rolled back.
    pub fn apply(&mut self, command: LedgerCommand) -> Result<(), AccountError> {
        match command {
            LedgerCommand::Record { transaction, actor, at } => self.record(transaction, &actor, at),
            LedgerCommand::Delete { transaction_id, actor, at, .. } => self.delete(&transaction_id, &actor, at),
            LedgerCommand::Restore { transaction_id, actor, at, .. } => self.restore(&transaction_id, &actor, at),
            LedgerCommand::Update { transaction_id, update, actor, at, .. } => {
                self.update(&transaction_id, update, &actor, at).map(|_| ())
            }
        }
    }

    pub fn record(&mut self, transaction: NormalizedTransaction, actor: &str, at: DateTime<Utc>) -> Result<(), AccountError> {
        if transaction.account_id != self.account_id {
            return Err(AccountError::account_mismatch(&self.account_id, &transaction.id, &transaction.account_id))
        }

        if self.entries.contains_key(&transaction.id) {
            return Err(AccountError::duplicate_transaction(&self.account_id, &transaction.id))
        }

        if transaction.amount < Decimal::ZERO {
            return Err(AccountError::negative_amount(&self.account_id, &transaction.id, transaction.amount))
        }

        let transaction_id = transaction.id.clone();
        self.entries.insert(transaction_id.clone(), LedgerEntry::new(transaction, actor, at));

        self.commit(&transaction_id, None)
    }

    /// Soft-deletes a transaction. Kind and amount are left untouched.
    pub fn delete(&mut self, transaction_id: &str, actor: &str, at: DateTime<Utc>) -> Result<(), AccountError> {
        let entry = self.entries.get_mut(transaction_id)
            .ok_or_else(|| AccountError::transaction_not_found(&self.account_id, transaction_id))?;

        if !entry.transaction.is_active() {
            return Err(AccountError::already_deleted(&self.account_id, transaction_id))
        }

        let previous = entry.clone();
        entry.transaction.comment = mark_deleted(&entry.transaction.comment, at);
        entry.transaction.is_deleted = true;
        entry.deleted_at = Some(at);
        entry.push(HistoryAction::Deleted, actor, at, vec![FieldChange::new(FIELD_IS_DELETED, false, true)]);

        self.commit(transaction_id, Some(previous))
    }

    /// Undoes a soft delete, returning the transaction to exactly its pre-delete state.
    pub fn restore(&mut self, transaction_id: &str, actor: &str, at: DateTime<Utc>) -> Result<(), AccountError> {
        let entry = self.entries.get_mut(transaction_id)
            .ok_or_else(|| AccountError::transaction_not_found(&self.account_id, transaction_id))?;

        if entry.transaction.is_active() {
            return Err(AccountError::not_deleted(&self.account_id, transaction_id))
        }

        let previous = entry.clone();
        let mut changes = Vec::new();

        if entry.transaction.is_deleted {
            entry.transaction.is_deleted = false;
            changes.push(FieldChange::new(FIELD_IS_DELETED, true, false));
        }

        if let Some(deleted_at) = entry.deleted_at.take() {
            let original = unmark_deleted(&entry.transaction.comment, deleted_at).map(str::to_string);

            match original {
                Some(original) => entry.transaction.comment = original,
                None => warn!("Deletion annotation missing on transaction [{transaction_id}] for account [{}], comment left as is", self.account_id)
            }
        }

        //NOTE: Rows deleted through the old status have no earlier status to return to, the kind is the closest equivalent
        if entry.transaction.source_status.trim().eq_ignore_ascii_case(DELETED_STATUS) {
            let status = entry.transaction.operation_kind.as_str().to_string();
            changes.push(FieldChange::new(FIELD_STATUS, &entry.transaction.source_status, &status));
            entry.transaction.source_status = status;
        }

        entry.push(HistoryAction::Restored, actor, at, changes);

        self.commit(transaction_id, Some(previous))
    }

    /// Applies manual corrections, returning whether anything actually changed.
    ///
    /// Only fields whose value differs are written to the history, and an update
    /// that changes nothing leaves no history entry at all.
    pub fn update(&mut self, transaction_id: &str, update: TransactionUpdate, actor: &str, at: DateTime<Utc>) -> Result<bool, AccountError> {
        let entry = self.entries.get_mut(transaction_id)
            .ok_or_else(|| AccountError::transaction_not_found(&self.account_id, transaction_id))?;

        if let Some(amount) = update.amount {
            if amount < Decimal::ZERO {
                return Err(AccountError::negative_amount(&self.account_id, transaction_id, amount))
            }
        }

        let previous = entry.clone();
        let mut changes = Vec::new();

        if let Some(comment) = update.comment {
            let current = entry.comment().to_string();

            if comment != current {
                entry.transaction.comment = match entry.deleted_at {
                    Some(deleted_at) => mark_deleted(&comment, deleted_at),
                    None => comment.clone()
                };
                changes.push(FieldChange::new(FIELD_COMMENT, current, comment));
            }
        }

        if let Some(amount) = update.amount {
            if amount != entry.transaction.amount {
                changes.push(FieldChange::new(FIELD_AMOUNT, entry.transaction.amount, amount));
                entry.transaction.amount = amount;
            }
        }

        if changes.is_empty() {
            return Ok(false)
        }

        entry.push(HistoryAction::Updated, actor, at, changes);

        self.commit(transaction_id, Some(previous))?;

        Ok(true)
    }

    /// Rebuilds the balance from scratch out of every active transaction.
    ///
    /// On error the previous balance is kept.
    pub fn recalculate(&mut self) -> Result<(), BalanceError> {
        self.balance = aggregate(self.entries.values().map(LedgerEntry::transaction))?;

        Ok(())
    }

    /// Recalculates after a mutation of `transaction_id`, putting `previous` back if the balance cannot be computed.
    fn commit(&mut self, transaction_id: &str, previous: Option<LedgerEntry>) -> Result<(), AccountError> {
        let Err(source) = self.recalculate() else {
            return Ok(())
        };

        match previous {
            Some(entry) => self.entries.insert(transaction_id.to_string(), entry),
            None => self.entries.remove(transaction_id)
        };

        Err(AccountError::balance_overflow(&self.account_id, transaction_id, source))
    }

    pub fn entry(&self, transaction_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(transaction_id)
    }

    /// Number of recorded transactions, soft-deleted ones included.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
