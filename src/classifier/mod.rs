mod rules;
mod transaction_classifier;

pub use rules::{resolve_kind, RuleFacts};
pub use transaction_classifier::{Classifier, ClassifierConfig, DEFAULT_COMMISSION_RATE};
