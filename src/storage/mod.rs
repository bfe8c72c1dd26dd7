mod account_storage;

use crate::models::Account;

pub use account_storage::AccountStorage;

pub trait Storage: Send + Sync + 'static {
    /// Takes the account out of storage; the caller owns it until `save`.
    fn load(&self, account_id: &str) -> Option<Account>;
    fn save(&self, account: Account);
}
