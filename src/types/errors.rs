use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawFieldError {
    #[error("Raw field error: [{0}] is not a valid amount")]
    InvalidAmount(String),
    #[error("Raw field error: [{0}] is not a valid timestamp")]
    InvalidTimestamp(String),
    #[error("Raw field error: Value is an empty string")]
    Empty
}
