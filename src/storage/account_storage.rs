use crate::models::Account;
use crate::storage::Storage;
use crate::types::AccountId;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct AccountStorage {
    cache: Arc<DashMap<AccountId, Account>>
}

impl AccountStorage {
    pub fn new() -> Self {
        Self {
            cache: Arc::new(DashMap::new())
        }
    }

    /// Clones every stored account, ordered by account id.
    pub fn sorted(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.cache.iter().map(|item| item.value().clone()).collect();
        accounts.sort_by(|left, right| left.account_id.cmp(&right.account_id));
        accounts
    }
}

impl Storage for AccountStorage {
    fn load(&self, account_id: &str) -> Option<Account> {
        self.cache.remove(account_id).map(|(_, account)| account)
    }

    fn save(&self, account: Account) {
        self.cache.insert(account.account_id.clone(), account);
    }
}
