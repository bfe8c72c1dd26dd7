mod actors;
mod balance;
mod classifier;
mod engine;
mod models;
mod storage;
mod types;

use std::io::{stderr, stdout};
use std::process::exit;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::classifier::{Classifier, ClassifierConfig, DEFAULT_COMMISSION_RATE};
use crate::engine::AsyncEngine;
use crate::models::{Account, SourceSystem};
use crate::storage::AccountStorage;

const USAGE: &str = "Usage: card-ledger-engine [input].csv|.jsonl [legacy|mercury] [log_level:optional] [commission_rate:optional] [commands].csv|.jsonl:optional > [output].csv";

const REPORT_HEADER: [&str; 11] = ["account", "deposited", "refunded", "posted", "pending", "withdrawal", "reversed", "rejected", "money_in", "available", "transactions"];

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: With more options than these positional ones, the clap crate would be a better fit
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("{USAGE}");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        eprintln!("Commission rate applied to wallet deposits (default: {DEFAULT_COMMISSION_RATE})");
        eprintln!("Commands file with action,accountId,transactionId,actor,at,comment,amount rows applied after the import");
        exit(1);
    }

    let path = &args[1];
    let source = match SourceSystem::from_str(&args[2]) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{error}");
            eprintln!("{USAGE}");
            exit(1);
        }
    };
    let log_level = args.get(3)
        .map(|s| parse_log_level(s)).unwrap_or_else(|| LevelFilter::ERROR);
    let commission_rate = args.get(4)
        .map(|s| parse_commission_rate(s)).unwrap_or(DEFAULT_COMMISSION_RATE);
    let commands_path = args.get(5);

    setup_logging(log_level);

    let storage = Arc::new(AccountStorage::new());
    let classifier = Classifier::new(ClassifierConfig { commission_rate });
    let engine = AsyncEngine::new(storage.clone(), source)
        .with_classifier(classifier);

    let timer = Instant::now();
    engine.run(path).await?;

    if let Some(commands_path) = commands_path {
        engine.run_commands(commands_path).await?;
    }

    let duration = timer.elapsed();

    info!("Processed transactions in: {duration:?}");

    write_results_to_stdout(&storage)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn parse_commission_rate(rate: &str) -> Decimal {
    match Decimal::from_str(rate.trim()) {
        Ok(rate) if rate >= Decimal::ZERO && rate < Decimal::ONE => rate,
        _ => {
            eprintln!("Invalid commission rate '{}', defaulting to '{}'", rate, DEFAULT_COMMISSION_RATE);
            DEFAULT_COMMISSION_RATE
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: Because we are doing stdout redirection, we will need to utilize stderr to display logging
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

/// One line of the balance report. Amounts are rendered with four decimal places.
#[derive(Serialize)]
struct ReportRow<'a> {
    account: &'a str,
    deposited: String,
    refunded: String,
    posted: String,
    pending: String,
    withdrawal: String,
    reversed: String,
    rejected: String,
    money_in: String,
    available: String,
    transactions: usize
}

impl<'a> From<&'a Account> for ReportRow<'a> {
    fn from(account: &'a Account) -> Self {
        let balance = &account.balance;

        Self {
            account: &account.account_id,
            deposited: format!("{:.4}", balance.deposited),
            refunded: format!("{:.4}", balance.refunded),
            posted: format!("{:.4}", balance.posted),
            pending: format!("{:.4}", balance.pending),
            withdrawal: format!("{:.4}", balance.withdrawal),
            reversed: format!("{:.4}", balance.reversed),
            rejected: format!("{:.4}", balance.rejected),
            money_in: format!("{:.4}", balance.money_in),
            available: format!("{:.4}", balance.available),
            transactions: balance.transaction_count()
        }
    }
}

fn write_results_to_stdout(storage: &AccountStorage) -> Result<()> {
    let accounts = storage.sorted();
    let mut writer = csv::Writer::from_writer(stdout().lock());

    //NOTE: The header is written explicitly so an empty report still has one
    if accounts.is_empty() {
        writer.write_record(REPORT_HEADER)?;
    }

    for account in &accounts {
        writer.serialize(ReportRow::from(account))?;
    }

    writer.flush()?;

    Ok(())
}
