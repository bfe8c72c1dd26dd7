mod aggregator;
mod errors;

pub use aggregator::{aggregate, BalanceSnapshot};
pub use errors::BalanceError;
