use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{trace, warn};

use crate::classifier::{resolve_kind, RuleFacts};
use crate::models::{Commission, NormalizedTransaction, OperationKind, RawTransaction, DELETED_STATUS};

/// Commission withheld from wallet deposits unless configured otherwise (0.3%).
pub const DEFAULT_COMMISSION_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 3);

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Fraction of a wallet deposit's gross amount kept as commission.
    pub commission_rate: Decimal
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            commission_rate: DEFAULT_COMMISSION_RATE
        }
    }
}

/// Turns raw records from either source system into normalized transactions.
///
/// Classification never fails. Unparsable amounts become 0, unrecognised
/// statuses fall through to the most conservative kind, and arithmetic that
/// leaves the `Decimal` range degrades with a warning instead of panicking.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, raw: &RawTransaction) -> NormalizedTransaction {
        self.classify_at(raw, Utc::now())
    }

    /// Classifies a record, using `now` as the creation time when the source has no usable date.
    pub fn classify_at(&self, raw: &RawTransaction, now: DateTime<Utc>) -> NormalizedTransaction {
        let record = raw.canonical();
        let (operation_kind, rule) = resolve_kind(&RuleFacts::from(&record));

        trace!("Transaction [{}] from [{:?}] classified as [{operation_kind}] by rule [{rule}]", record.id, raw.source());

        let (amount, is_credit, commission) = match operation_kind {
            OperationKind::OverrideVirtualBalance => {
                let difference = match (record.original_balance, record.new_balance) {
                    (Some(original), Some(new)) => new.checked_sub(original).unwrap_or_else(|| {
                        warn!("Balance override [{original}] -> [{new}] on transaction [{}] is out of range, amount set to 0", record.id);
                        Decimal::ZERO
                    }),
                    _ => record.amount
                };

                (difference.abs(), difference >= Decimal::ZERO, None)
            }
            OperationKind::WalletDeposit => {
                let gross_amount = record.amount.abs();
                let commission = Commission::apply(gross_amount, self.config.commission_rate).unwrap_or_else(|| {
                    warn!("Commission on transaction [{}] is out of range, deposit of [{gross_amount}] kept whole", record.id);
                    Commission::waived(gross_amount, self.config.commission_rate)
                });
                let is_credit = record.credit.unwrap_or(true);

                (commission.net_amount, is_credit, Some(commission))
            }
            kind => (record.amount.abs(), record.credit.unwrap_or_else(|| kind.implies_credit()), None)
        };

        let is_deleted = record.is_deleted || record.status.eq_ignore_ascii_case(DELETED_STATUS);

        NormalizedTransaction {
            id: record.id,
            account_id: record.account_id,
            card_id: record.card_id,
            source: raw.source(),
            source_status: record.status,
            operation_kind,
            amount,
            is_credit,
            is_deleted,
            comment: record.comment,
            created_at: record.created_at.unwrap_or(now),
            commission
        }
    }
}
