use crate::models::{CanonicalRecord, OperationKind};

const OVERRIDE_VIRTUAL_BALANCE: &str = "OVERRIDE_VIRTUAL_BALANCE";
const COMPLETED: &str = "COMPLETED";
const DEPOSITED: &str = "DEPOSITED";
const WALLET_DEPOSIT: &str = "WALLET_DEPOSIT";
const WITHDRAWAL: &str = "WITHDRAWAL";

const REVERSED_STATUSES: [&str; 2] = ["TRANSACTION_REVERSED", "REVERSED"];
const PENDING_STATUSES: [&str; 2] = ["TRANSACTION_PENDING", "PENDING"];
const REJECTED_STATUSES: [&str; 3] = ["TRANSACTION_REJECTED", "REJECTED", "FAILED"];
const REFUND_STATUSES: [&str; 2] = ["TRANSACTION_REFUND", "REFUND"];
const APPROVED_STATUSES: [&str; 4] = ["TRANSACTION_APPROVED", "APPROVED", "SUCCESS", "SENT"];

/// The discriminators the rules look at, upper-cased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFacts {
    pub status: String,
    pub name: String,
    pub credit: Option<bool>
}

impl RuleFacts {
    pub fn new(status: &str, name: &str, credit: Option<bool>) -> Self {
        Self {
            status: status.trim().to_ascii_uppercase(),
            name: name.trim().to_ascii_uppercase(),
            credit
        }
    }

    fn status_in(&self, statuses: &[&str]) -> bool {
        statuses.contains(&self.status.as_str())
    }

    fn is_completed(&self) -> bool {
        self.status == COMPLETED
    }
}

impl From<&CanonicalRecord> for RuleFacts {
    fn from(record: &CanonicalRecord) -> Self {
        RuleFacts::new(&record.status, &record.name, record.credit)
    }
}

struct Rule {
    name: &'static str,
    decide: fn(&RuleFacts) -> Option<OperationKind>
}

/// Ordered, first match wins. Statuses overlap in meaning across the two sources,
/// so moving a rule changes results.
const RULES: [Rule; 10] = [
    Rule { name: "balance-override", decide: balance_override },
    Rule { name: "reversed-status", decide: reversed_status },
    Rule { name: "pending-status", decide: pending_status },
    Rule { name: "rejected-status", decide: rejected_status },
    Rule { name: "refund-status", decide: refund_status },
    Rule { name: "wallet-deposit", decide: wallet_deposit },
    Rule { name: "withdrawal", decide: withdrawal },
    Rule { name: "approved-status", decide: approved_status },
    Rule { name: "completed-by-credit", decide: completed_by_credit },
    Rule { name: "fallback", decide: fallback }
];

/// Resolves the operation kind of a record, along with the name of the rule that decided it.
///
/// Always returns a kind: the last rule accepts every input.
pub fn resolve_kind(facts: &RuleFacts) -> (OperationKind, &'static str) {
    RULES.iter()
        .find_map(|rule| (rule.decide)(facts).map(|kind| (kind, rule.name)))
        .unwrap_or_else(|| (fallback_kind(facts), "fallback"))
}

fn balance_override(facts: &RuleFacts) -> Option<OperationKind> {
    (facts.status == OVERRIDE_VIRTUAL_BALANCE || facts.name == OVERRIDE_VIRTUAL_BALANCE)
        .then_some(OperationKind::OverrideVirtualBalance)
}

fn reversed_status(facts: &RuleFacts) -> Option<OperationKind> {
    facts.status_in(&REVERSED_STATUSES).then_some(OperationKind::TransactionReversed)
}

fn pending_status(facts: &RuleFacts) -> Option<OperationKind> {
    facts.status_in(&PENDING_STATUSES).then_some(OperationKind::TransactionPending)
}

fn rejected_status(facts: &RuleFacts) -> Option<OperationKind> {
    facts.status_in(&REJECTED_STATUSES).then_some(OperationKind::TransactionRejected)
}

fn refund_status(facts: &RuleFacts) -> Option<OperationKind> {
    facts.status_in(&REFUND_STATUSES).then_some(OperationKind::TransactionRefund)
}

fn wallet_deposit(facts: &RuleFacts) -> Option<OperationKind> {
    ((facts.is_completed() && facts.name == DEPOSITED) || facts.status == WALLET_DEPOSIT)
        .then_some(OperationKind::WalletDeposit)
}

// A bare WITHDRAWAL status comes from rows already written in the newer schema
fn withdrawal(facts: &RuleFacts) -> Option<OperationKind> {
    ((facts.is_completed() && facts.name == WITHDRAWAL) || facts.status == WITHDRAWAL)
        .then_some(OperationKind::Withdrawal)
}

fn approved_status(facts: &RuleFacts) -> Option<OperationKind> {
    facts.status_in(&APPROVED_STATUSES).then_some(OperationKind::TransactionApproved)
}

fn completed_by_credit(facts: &RuleFacts) -> Option<OperationKind> {
    if !facts.is_completed() || facts.name.is_empty() {
        return None;
    }

    match facts.credit {
        Some(false) => Some(OperationKind::TransactionApproved),
        _ => Some(OperationKind::TransactionRefund)
    }
}

fn fallback(facts: &RuleFacts) -> Option<OperationKind> {
    Some(fallback_kind(facts))
}

//NOTE: Unknown states are treated as pending so they hold funds without ever counting as settled
fn fallback_kind(facts: &RuleFacts) -> OperationKind {
    match facts.credit {
        Some(false) => OperationKind::TransactionApproved,
        _ => OperationKind::TransactionPending
    }
}
