use super::async_engine::InputFormat;
use super::AsyncEngine;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use tempfile::{Builder, NamedTempFile};

use crate::classifier::{Classifier, ClassifierConfig};
use crate::models::{Account, HistoryAction, SourceSystem};
use crate::storage::{AccountStorage, Storage};

fn create_temporary_file(suffix: &str, content: &str) -> Result<NamedTempFile> {
    let mut file = Builder::new().suffix(suffix).tempfile()?;
    write!(file, "{content}")?;
    file.flush()?;

    Ok(file)
}

async fn run(source: SourceSystem, suffix: &str, content: &str) -> Result<Arc<AccountStorage>> {
    let file = create_temporary_file(suffix, content)?;
    let path = file.path().to_str().ok_or_else(|| anyhow!("Temporary path is not valid UTF-8"))?;

    let storage = Arc::new(AccountStorage::new());
    let engine = AsyncEngine::new(storage.clone(), source);
    engine.run(path).await?;

    Ok(storage)
}

async fn apply_commands(storage: Arc<AccountStorage>, suffix: &str, content: &str) -> Result<()> {
    let file = create_temporary_file(suffix, content)?;
    let path = file.path().to_str().ok_or_else(|| anyhow!("Temporary path is not valid UTF-8"))?;

    AsyncEngine::new(storage, SourceSystem::Legacy).run_commands(path).await
}

fn load(storage: &AccountStorage, account_id: &str) -> Result<Account> {
    storage.load(account_id).ok_or_else(|| anyhow!("Account [{account_id}] missing from storage"))
}

#[test]
fn test_input_format_is_detected_from_extension() {
    assert_eq!(InputFormat::from_path("exports/mercury.jsonl"), InputFormat::JsonLines);
    assert_eq!(InputFormat::from_path("exports/mercury.NDJSON"), InputFormat::JsonLines);
    assert_eq!(InputFormat::from_path("exports/legacy.csv"), InputFormat::Csv);
    assert_eq!(InputFormat::from_path("exports/legacy"), InputFormat::Csv);
}

#[tokio::test]
async fn test_engine_processes_legacy_csv_into_balances() -> Result<()> {
    let content = "id,accountId,status,name,credit,MontoTransacction,comentario,Date\n\
        1,acc-1,Completed,Deposited,,100,payroll,2024-01-01\n\
        2,acc-1,Completed,WITHDRAWAL,false,-20,,2024-01-02\n\
        3,acc-1,TRANSACTION_APPROVED,Coffee shop,false,30,,2024-01-03\n\
        4,acc-1,TRANSACTION_REFUND,Coffee shop,true,5,,2024-01-04\n\
        5,acc-2,TRANSACTION_REJECTED,Airline,false,50,,2024-01-05\n";

    let storage = run(SourceSystem::Legacy, ".csv", content).await?;
    let account_1 = load(&storage, "acc-1")?;
    let account_2 = load(&storage, "acc-2")?;

    assert_eq!(account_1.balance.deposited, Decimal::from_str("99.7")?);
    assert_eq!(account_1.balance.withdrawal, Decimal::from_str("20")?);
    assert_eq!(account_1.balance.posted, Decimal::from_str("30")?);
    assert_eq!(account_1.balance.refunded, Decimal::from_str("5")?);
    assert_eq!(account_1.balance.available, Decimal::from_str("54.7")?);
    assert_eq!(account_2.balance.rejected, Decimal::from_str("50")?);
    assert!(account_2.balance.available.is_zero());

    Ok(())
}

#[tokio::test]
async fn test_engine_processes_mercury_json_lines() -> Result<()> {
    let content = r#"{"id": "m1", "accountId": "acc-9", "status": "WALLET_DEPOSIT", "amount": 200}
{"id": "m2", "accountId": "acc-9", "status": "SUCCESS", "monto": "45.50", "credit": false}

{"id": "m3", "accountId": "acc-9", "status": "failed", "amount": 10}
{"id": "m4", "accountId": "acc-9", "status": "Frozen", "amount": 4, "isDeleted": true}
"#;

    let storage = run(SourceSystem::Mercury, ".jsonl", content).await?;
    let account = load(&storage, "acc-9")?;

    assert_eq!(account.entry_count(), 4);
    assert_eq!(account.balance.deposited, Decimal::from_str("199.4")?);
    assert_eq!(account.balance.posted, Decimal::from_str("45.5")?);
    assert_eq!(account.balance.rejected, Decimal::from_str("10")?);
    assert!(account.balance.pending.is_zero());
    assert_eq!(account.balance.available, Decimal::from_str("153.9")?);
    assert_eq!(account.balance.transaction_count(), 3);

    Ok(())
}

#[tokio::test]
async fn test_engine_gracefully_skips_malformed_input() -> Result<()> {
    let content = r#"{"id": "m1", "accountId": "acc-1", "status": "sent", "amount": 10}
this is not json
{"accountId": "acc-1", "status": "sent", "amount": 99}
{"id": "m2", "accountId": "acc-1", "status": "sent", "amount": "ten"}
{"id": "m3", "accountId": "acc-1", "status": "sent", "amount": 5}
"#;

    let storage = run(SourceSystem::Mercury, ".jsonl", content).await?;
    let account = load(&storage, "acc-1")?;

    assert_eq!(account.entry_count(), 3);
    assert_eq!(account.balance.posted, Decimal::from_str("15")?);

    Ok(())
}

#[tokio::test]
async fn test_engine_handles_missing_file_without_error() -> Result<()> {
    let storage = Arc::new(AccountStorage::new());
    let engine = AsyncEngine::new(storage.clone(), SourceSystem::Legacy);

    assert!(engine.run("missing.csv").await.is_ok());
    assert!(storage.sorted().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_engine_keeps_first_of_duplicate_ids_and_routes_unassigned() -> Result<()> {
    let content = "id,status,credit,amount,cardId\n\
        1,sent,false,10,\n\
        1,sent,false,99,\n\
        2,Pending,,3,card-7\n";

    let storage = run(SourceSystem::Mercury, ".csv", content).await?;
    let unassigned = load(&storage, "unassigned")?;
    let card = load(&storage, "card-7")?;

    assert_eq!(unassigned.entry_count(), 1);
    assert_eq!(unassigned.balance.posted, Decimal::from_str("10")?);
    assert_eq!(card.balance.pending, Decimal::from_str("3")?);

    Ok(())
}

#[tokio::test]
async fn test_engine_uses_configured_commission() -> Result<()> {
    let file = create_temporary_file(".csv", "id,accountId,status,MontoTransacction\n1,acc-1,WALLET_DEPOSIT,1000\n2,acc-1,WALLET_DEPOSIT,1000\n3,acc-2,WALLET_DEPOSIT,10\n")?;
    let path = file.path().to_str().ok_or_else(|| anyhow!("Temporary path is not valid UTF-8"))?;

    let storage = Arc::new(AccountStorage::new());
    let engine = AsyncEngine::new(storage.clone(), SourceSystem::Legacy)
        .with_classifier(Classifier::new(ClassifierConfig { commission_rate: Decimal::from_str("0.01")? }));

    engine.run(path).await?;

    assert_eq!(load(&storage, "acc-1")?.balance.available, Decimal::from_str("1980")?);
    assert_eq!(load(&storage, "acc-2")?.balance.available, Decimal::from_str("9.9")?);

    Ok(())
}

#[tokio::test]
async fn test_engine_preserves_csv_text_verbatim() -> Result<()> {
    let content = "id,accountId,status,credit,MontoTransacction,comentario\n007,acc-1,sent,false,1.50, 1.50 \n";

    let storage = run(SourceSystem::Legacy, ".csv", content).await?;
    let account = load(&storage, "acc-1")?;
    let entry = account.entry("007").ok_or_else(|| anyhow!("Transaction 007 missing"))?;

    assert_eq!(entry.transaction().comment, " 1.50 ");
    assert_eq!(entry.transaction().amount, Decimal::from_str("1.5")?);
    assert_eq!(entry.history().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_engine_keeps_account_whose_balance_would_overflow() -> Result<()> {
    let content = "id,accountId,status,name,MontoTransacction\n\
        1,big,TRANSACTION_REFUND,Airline,70000000000000000000000000000\n\
        2,big,TRANSACTION_REFUND,Airline,70000000000000000000000000000\n\
        3,ok,TRANSACTION_REFUND,Airline,5\n";

    let storage = run(SourceSystem::Legacy, ".csv", content).await?;
    let big = load(&storage, "big")?;
    let ok = load(&storage, "ok")?;

    assert_eq!(big.entry_count(), 1);
    assert_eq!(big.balance.refunded, Decimal::from_str("70000000000000000000000000000")?);
    assert_eq!(ok.balance.available, Decimal::from_str("5")?);

    Ok(())
}

struct UnavailableStorage;

impl Storage for UnavailableStorage {
    fn load(&self, _account_id: &str) -> Option<Account> {
        None
    }

    fn save(&self, account: Account) {
        panic!("storage is unavailable, account [{}] was not saved", account.account_id);
    }
}

#[tokio::test]
async fn test_engine_fails_when_an_account_actor_fails() -> Result<()> {
    let file = create_temporary_file(".csv", "id,accountId,status,MontoTransacction\n1,acc-1,WALLET_DEPOSIT,10\n")?;
    let path = file.path().to_str().ok_or_else(|| anyhow!("Temporary path is not valid UTF-8"))?;

    let engine = AsyncEngine::new(Arc::new(UnavailableStorage), SourceSystem::Legacy);

    assert!(engine.run(path).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_engine_applies_command_file_to_imported_accounts() -> Result<()> {
    let content = "id,accountId,status,name,credit,MontoTransacction,comentario\n\
        1,acc-1,Completed,Deposited,,100,payroll\n\
        2,acc-1,TRANSACTION_APPROVED,Coffee shop,false,30,latte\n\
        3,acc-1,TRANSACTION_APPROVED,Books,false,12,\n";
    let storage = run(SourceSystem::Legacy, ".csv", content).await?;

    let commands = "action,accountId,transactionId,actor,at,comment,amount\n\
        delete,acc-1,2,auditor,2024-05-01T10:00:00Z,,\n\
        update,acc-1,3,auditor,,second hand,10\n";
    apply_commands(storage.clone(), ".csv", commands).await?;

    let account = load(&storage, "acc-1")?;
    let deleted = account.entry("2").ok_or_else(|| anyhow!("Transaction 2 missing"))?;
    let updated = account.entry("3").ok_or_else(|| anyhow!("Transaction 3 missing"))?;

    assert!(!deleted.transaction().is_active());
    assert_eq!(deleted.transaction().comment, "latte [DELETED 2024-05-01T10:00:00Z]");
    assert_eq!(deleted.history()[1].action, HistoryAction::Deleted);
    assert_eq!(deleted.history()[1].actor, "auditor");
    assert_eq!(updated.transaction().amount, Decimal::from_str("10")?);
    assert_eq!(updated.transaction().comment, "second hand");
    assert_eq!(account.balance.posted, Decimal::from_str("10")?);
    assert_eq!(account.balance.available, Decimal::from_str("89.7")?);

    storage.save(account);

    let restore = r#"{"action": "restore", "accountId": "acc-1", "transactionId": "2"}
{"action": "archive", "accountId": "acc-1", "transactionId": "1"}
{"action": "update", "accountId": "acc-1", "transactionId": "1", "amount": "lots"}
"#;
    apply_commands(storage.clone(), ".jsonl", restore).await?;

    let account = load(&storage, "acc-1")?;
    let restored = account.entry("2").ok_or_else(|| anyhow!("Transaction 2 missing"))?;

    assert!(restored.transaction().is_active());
    assert_eq!(restored.transaction().comment, "latte");
    assert_eq!(restored.history()[2].actor, "operator");
    assert_eq!(account.entry("1").ok_or_else(|| anyhow!("Transaction 1 missing"))?.history().len(), 1);
    assert_eq!(account.balance.available, Decimal::from_str("59.7")?);

    Ok(())
}

#[tokio::test]
async fn test_engine_command_for_unknown_account_creates_nothing() -> Result<()> {
    let storage = Arc::new(AccountStorage::new());

    apply_commands(storage.clone(), ".csv", "action,accountId,transactionId\ndelete,ghost,1\n").await?;

    assert!(storage.sorted().is_empty());

    Ok(())
}
