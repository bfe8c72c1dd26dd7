use std::sync::Arc;

use tokio::spawn;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, warn};

use crate::models::{Account, AccountError, LedgerCommand};
use crate::storage::Storage;
use crate::types::AccountId;

/// Owns one account while it is being mutated.
///
/// Commands for the account are applied strictly in arrival order by a single task, so
/// a mutation and the balance recalculation that follows it are never observed apart.
pub struct AccountActor {
    sender: mpsc::UnboundedSender<LedgerCommand>,
    handle: JoinHandle<()>
}

impl AccountActor {
    /// Spawns a new actor, hydrating the account from storage or starting an empty one.
    pub fn new<S: Storage>(account_id: impl Into<AccountId>, storage: Arc<S>) -> Self {
        let account_id = account_id.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<LedgerCommand>();

        let handle = spawn(async move {
            let mut account = storage.load(&account_id)
                .unwrap_or_else(|| Account::new(account_id.clone()));

            while let Some(command) = receiver.recv().await {
                let name = command.name();
                let transaction_id = command.transaction_id().to_string();

                match account.apply(command) {
                    Ok(_) => {
                        let audit = account.entry(&transaction_id).and_then(|entry| entry.history().last());

                        if let Some(audit) = audit {
                            debug!("Command [{name}] for transaction [{transaction_id}] on account [{account_id}] applied as version [{}] by [{}] at [{}] with {} change(s)",
                                audit.version, audit.actor, audit.at, audit.changes.len());
                        }
                    },
                    Err(error @ AccountError::BalanceOverflow { .. }) => {
                        //NOTE: The account was rolled back to its state before the command
                        error!("{error}");
                    },
                    Err(error) => {
                        //NOTE: Ledger errors only reject the single command, the account keeps processing
                        warn!("{error}");
                    }
                }
            }

            //NOTE: Commands aimed at unknown accounts must not leave empty accounts behind
            if account.entry_count() == 0 {
                debug!("Account [{account_id}] has no transactions, nothing to save");
                return;
            }

            debug!("Account [{account_id}] saved with {} transaction(s)", account.entry_count());
            storage.save(account);
        });

        Self { sender, handle }
    }

    /// Queues a command, returning false if the actor is no longer running.
    pub fn accept(&self, command: LedgerCommand) -> bool {
        self.sender.send(command).is_ok()
    }

    /// Closes the queue and waits until every pending command is applied and the account saved.
    pub async fn despawn(self) -> Result<(), JoinError> {
        drop(self.sender);
        self.handle.await
    }
}
