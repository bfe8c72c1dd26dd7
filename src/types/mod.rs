mod errors;
mod raw_field;

pub use errors::RawFieldError;
pub use raw_field::RawField;

pub type AccountId = String;
pub type TransactionId = String;
