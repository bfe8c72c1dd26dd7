use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::balance::BalanceError;
use crate::models::{NormalizedTransaction, OperationKind};

/// Balance fields of one account, derived from its active transactions.
///
/// Sums are non-negative magnitudes; `available` is the only signed figure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub deposited: Decimal,
    pub refunded: Decimal,
    pub posted: Decimal,
    pub pending: Decimal,
    pub withdrawal: Decimal,
    pub reversed: Decimal,
    pub rejected: Decimal,
    /// Deposits net of withdrawals.
    pub money_in: Decimal,
    pub available: Decimal,
    /// Active transactions per kind, for audits. Not used in any balance figure.
    pub counts: BTreeMap<OperationKind, usize>
}

impl BalanceSnapshot {
    pub fn transaction_count(&self) -> usize {
        self.counts.values().sum()
    }

    fn add(&mut self, transaction: &NormalizedTransaction) -> Result<(), BalanceError> {
        let (field, total) = match transaction.operation_kind {
            OperationKind::WalletDeposit => ("deposited", &mut self.deposited),
            OperationKind::Withdrawal => ("withdrawal", &mut self.withdrawal),
            OperationKind::TransactionApproved => ("posted", &mut self.posted),
            OperationKind::TransactionPending => ("pending", &mut self.pending),
            OperationKind::TransactionRefund => ("refunded", &mut self.refunded),
            OperationKind::TransactionReversed => ("reversed", &mut self.reversed),
            OperationKind::TransactionRejected => ("rejected", &mut self.rejected),
            //NOTE: An override moves the balance to a new value, so lowering it counts as money out
            OperationKind::OverrideVirtualBalance if transaction.is_credit => ("deposited", &mut self.deposited),
            OperationKind::OverrideVirtualBalance => ("withdrawal", &mut self.withdrawal)
        };

        *total = total.checked_add(transaction.amount).ok_or(BalanceError::overflow(field))?;
        *self.counts.entry(transaction.operation_kind).or_insert(0) += 1;

        Ok(())
    }

    fn derive_totals(&mut self) -> Result<(), BalanceError> {
        self.money_in = self.deposited.checked_sub(self.withdrawal).ok_or(BalanceError::overflow("money_in"))?;
        self.available = [self.refunded, -self.posted, -self.pending, self.reversed]
            .into_iter()
            .try_fold(self.money_in, |available, amount| available.checked_add(amount))
            .ok_or(BalanceError::overflow("available"))?;

        Ok(())
    }
}

/// Computes the balance of one account from its transactions.
///
/// Inactive (soft-deleted) transactions are skipped entirely, counts included. The
/// result depends only on the set of transactions, never on their order, and an
/// empty set yields an all-zero snapshot. Any sum that leaves the `Decimal` range is
/// an error; no partial snapshot is returned.
pub fn aggregate<'a, I>(transactions: I) -> Result<BalanceSnapshot, BalanceError>
where
    I: IntoIterator<Item = &'a NormalizedTransaction>,
{
    let mut snapshot = BalanceSnapshot::default();

    for transaction in transactions.into_iter().filter(|transaction| transaction.is_active()) {
        snapshot.add(transaction)?;
    }

    snapshot.derive_totals()?;

    Ok(snapshot)
}
