use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{CommandError, NormalizedTransaction, TransactionUpdate};
use crate::types::{AccountId, RawField, TransactionId};

/// Actor written to the history when a command row names none.
const DEFAULT_COMMAND_ACTOR: &str = "operator";

/// A mutation of one account's transaction set.
#[derive(Debug, Clone)]
pub enum LedgerCommand {
    Record {
        transaction: NormalizedTransaction,
        actor: String,
        at: DateTime<Utc>
    },
    Delete {
        account_id: AccountId,
        transaction_id: TransactionId,
        actor: String,
        at: DateTime<Utc>
    },
    Restore {
        account_id: AccountId,
        transaction_id: TransactionId,
        actor: String,
        at: DateTime<Utc>
    },
    Update {
        account_id: AccountId,
        transaction_id: TransactionId,
        update: TransactionUpdate,
        actor: String,
        at: DateTime<Utc>
    }
}

impl LedgerCommand {
    pub fn account_id(&self) -> &str {
        match self {
            LedgerCommand::Record { transaction, .. } => &transaction.account_id,
            LedgerCommand::Delete { account_id, .. }
            | LedgerCommand::Restore { account_id, .. }
            | LedgerCommand::Update { account_id, .. } => account_id
        }
    }

    pub fn transaction_id(&self) -> &str {
        match self {
            LedgerCommand::Record { transaction, .. } => &transaction.id,
            LedgerCommand::Delete { transaction_id, .. }
            | LedgerCommand::Restore { transaction_id, .. }
            | LedgerCommand::Update { transaction_id, .. } => transaction_id
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerCommand::Record { .. } => "record",
            LedgerCommand::Delete { .. } => "delete",
            LedgerCommand::Restore { .. } => "restore",
            LedgerCommand::Update { .. } => "update"
        }
    }
}

/// One row of an operator command file, read as CSV or JSON lines.
///
/// `action` is `delete`, `restore` or `update`. Updates carry a new `comment`, a new
/// `amount`, or both. `at` defaults to the time the row is read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandRow {
    pub action: RawField,
    #[serde(rename = "accountId")]
    pub account_id: RawField,
    #[serde(rename = "transactionId", alias = "id")]
    pub transaction_id: RawField,
    pub actor: Option<RawField>,
    pub at: Option<RawField>,
    #[serde(alias = "comentario")]
    pub comment: Option<RawField>,
    pub amount: Option<RawField>
}

impl CommandRow {
    pub fn into_command(self, now: DateTime<Utc>) -> Result<LedgerCommand, CommandError> {
        if self.account_id.is_blank() {
            return Err(CommandError::missing_field("accountId"))
        }

        if self.transaction_id.is_blank() {
            return Err(CommandError::missing_field("transactionId"))
        }

        let account_id = self.account_id.as_str().to_string();
        let transaction_id = self.transaction_id.as_str().to_string();
        let actor = self.actor.as_ref()
            .filter(|actor| !actor.is_blank())
            .map_or(DEFAULT_COMMAND_ACTOR, RawField::as_str)
            .to_string();
        let at = match self.at.filter(|at| !at.is_blank()) {
            Some(at) => at.to_timestamp().map_err(|source| CommandError::invalid_field("at", source))?,
            None => now
        };

        match self.action.as_str().to_ascii_lowercase().as_str() {
            "delete" => Ok(LedgerCommand::Delete { account_id, transaction_id, actor, at }),
            "restore" => Ok(LedgerCommand::Restore { account_id, transaction_id, actor, at }),
            "update" => {
                let amount = self.amount
                    .filter(|amount| !amount.is_blank())
                    .map(|amount| amount.to_amount())
                    .transpose()
                    .map_err(|source| CommandError::invalid_field("amount", source))?;
                //NOTE: Comments are user text, kept byte for byte
                let comment = self.comment.map(|comment| comment.raw().to_string());

                if comment.is_none() && amount.is_none() {
                    return Err(CommandError::missing_field("comment or amount"))
                }

                Ok(LedgerCommand::Update { account_id, transaction_id, update: TransactionUpdate { comment, amount }, actor, at })
            }
            _ => Err(CommandError::unknown_action(self.action.raw()))
        }
    }
}
