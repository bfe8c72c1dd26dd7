use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::SourceSystem;
use crate::types::{AccountId, RawField, TransactionId};

/// Account that records without any account or card reference are booked against.
pub const UNASSIGNED_ACCOUNT: &str = "unassigned";

/// A row exported from the first legacy system.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyRecord {
    #[serde(alias = "_id")]
    pub id: RawField,
    #[serde(rename = "accountId")]
    pub account_id: Option<RawField>,
    #[serde(rename = "cardId")]
    pub card_id: Option<RawField>,
    pub status: Option<RawField>,
    pub name: Option<RawField>,
    pub credit: Option<RawField>,
    #[serde(rename = "MontoTransacction")]
    pub monto_transacction: Option<RawField>,
    pub monto: Option<RawField>,
    pub comentario: Option<RawField>,
    #[serde(rename = "Date")]
    pub date: Option<RawField>,
    pub fecha: Option<RawField>,
    #[serde(rename = "isDeleted")]
    pub is_deleted: Option<RawField>,
    #[serde(rename = "originalBalance")]
    pub original_balance: Option<RawField>,
    #[serde(rename = "newBalance")]
    pub new_balance: Option<RawField>
}

/// A row exported from the Mercury-style card provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MercuryRecord {
    #[serde(alias = "_id")]
    pub id: RawField,
    #[serde(rename = "accountId")]
    pub account_id: Option<RawField>,
    #[serde(rename = "cardId")]
    pub card_id: Option<RawField>,
    pub status: Option<RawField>,
    pub name: Option<RawField>,
    pub credit: Option<RawField>,
    pub amount: Option<RawField>,
    pub monto: Option<RawField>,
    #[serde(alias = "comentario")]
    pub comment: Option<RawField>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<RawField>,
    pub date: Option<RawField>,
    #[serde(rename = "isDeleted")]
    pub is_deleted: Option<RawField>,
    #[serde(rename = "originalBalance")]
    pub original_balance: Option<RawField>,
    #[serde(rename = "newBalance")]
    pub new_balance: Option<RawField>
}

/// A raw transaction from either known source system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum RawTransaction {
    Legacy(LegacyRecord),
    Mercury(MercuryRecord)
}

/// The source-independent view of a raw record that the classification rules run against.
///
/// Text fields are trimmed but otherwise untouched, `amount` keeps whatever sign the
/// source used and is 0 when no amount field could be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub card_id: Option<String>,
    pub status: String,
    pub name: String,
    pub credit: Option<bool>,
    pub amount: Decimal,
    pub comment: String,
    pub created_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub original_balance: Option<Decimal>,
    pub new_balance: Option<Decimal>
}

impl RawTransaction {
    pub fn source(&self) -> SourceSystem {
        match self {
            RawTransaction::Legacy(_) => SourceSystem::Legacy,
            RawTransaction::Mercury(_) => SourceSystem::Mercury
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RawTransaction::Legacy(record) => record.id.as_str(),
            RawTransaction::Mercury(record) => record.id.as_str()
        }
    }

    /// Maps the source-specific field names onto one canonical record.
    pub fn canonical(&self) -> CanonicalRecord {
        match self {
            RawTransaction::Legacy(record) => {
                let id = record.id.as_str().to_string();

                CanonicalRecord {
                    account_id: resolve_account(&record.account_id, &record.card_id),
                    card_id: optional_text(&record.card_id),
                    status: text(&record.status),
                    name: text(&record.name),
                    credit: flag(&record.credit),
                    amount: first_amount(&id, &[&record.monto_transacction, &record.monto]),
                    comment: comment_text(&record.comentario),
                    created_at: first_timestamp(&[&record.date, &record.fecha]),
                    is_deleted: flag(&record.is_deleted).unwrap_or(false),
                    original_balance: optional_amount(&id, &record.original_balance),
                    new_balance: optional_amount(&id, &record.new_balance),
                    id
                }
            }
            RawTransaction::Mercury(record) => {
                let id = record.id.as_str().to_string();

                CanonicalRecord {
                    account_id: resolve_account(&record.account_id, &record.card_id),
                    card_id: optional_text(&record.card_id),
                    status: text(&record.status),
                    name: text(&record.name),
                    credit: flag(&record.credit),
                    amount: first_amount(&id, &[&record.amount, &record.monto]),
                    comment: comment_text(&record.comment),
                    created_at: first_timestamp(&[&record.created_at, &record.date]),
                    is_deleted: flag(&record.is_deleted).unwrap_or(false),
                    original_balance: optional_amount(&id, &record.original_balance),
                    new_balance: optional_amount(&id, &record.new_balance),
                    id
                }
            }
        }
    }
}

impl From<LegacyRecord> for RawTransaction {
    fn from(record: LegacyRecord) -> Self {
        RawTransaction::Legacy(record)
    }
}

impl From<MercuryRecord> for RawTransaction {
    fn from(record: MercuryRecord) -> Self {
        RawTransaction::Mercury(record)
    }
}

fn optional_text(field: &Option<RawField>) -> Option<String> {
    field.as_ref()
        .filter(|value| !value.is_blank())
        .map(|value| value.as_str().to_string())
}

fn text(field: &Option<RawField>) -> String {
    optional_text(field).unwrap_or_default()
}

// Comments are user-authored, so unlike the other text fields they are not trimmed
fn comment_text(field: &Option<RawField>) -> String {
    field.as_ref()
        .map(|value| value.raw().to_string())
        .unwrap_or_default()
}

fn flag(field: &Option<RawField>) -> Option<bool> {
    field.as_ref().and_then(RawField::to_flag)
}

fn resolve_account(account_id: &Option<RawField>, card_id: &Option<RawField>) -> AccountId {
    optional_text(account_id)
        .or_else(|| optional_text(card_id))
        .unwrap_or_else(|| UNASSIGNED_ACCOUNT.to_string())
}

fn optional_amount(id: &str, field: &Option<RawField>) -> Option<Decimal> {
    let field = field.as_ref().filter(|value| !value.is_blank())?;

    match field.to_amount() {
        Ok(amount) => Some(amount),
        Err(error) => {
            warn!("Transaction [{id}] has an unusable balance field: {error}");
            None
        }
    }
}

fn first_amount(id: &str, candidates: &[&Option<RawField>]) -> Decimal {
    candidates.iter()
        .find_map(|field| optional_amount(id, field))
        .unwrap_or(Decimal::ZERO)
}

fn first_timestamp(candidates: &[&Option<RawField>]) -> Option<DateTime<Utc>> {
    candidates.iter()
        .filter_map(|field| (*field).as_ref())
        .find_map(|field| field.to_timestamp().ok())
}
