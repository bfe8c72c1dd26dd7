use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("Balance overflow while computing [{field}]")]
    Overflow {
        field: &'static str
    }
}

impl BalanceError {
    pub fn overflow(field: &'static str) -> Self {
        Self::Overflow { field }
    }
}
