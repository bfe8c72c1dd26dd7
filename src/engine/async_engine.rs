use crate::actors::AccountActor;
use crate::classifier::Classifier;
use crate::models::{CommandRow, LedgerCommand, LegacyRecord, MercuryRecord, RawTransaction, SourceSystem, UNASSIGNED_ACCOUNT};
use crate::storage::{AccountStorage, Storage};
use crate::types::AccountId;
use anyhow::{anyhow, bail};
use chrono::Utc;
use csv::{ReaderBuilder, Trim};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{error, info, warn};

/// Actor name written to the history of every transaction created by an import.
const IMPORT_ACTOR: &str = "import";

/// Commands buffered between the blocking reader and the router before the reader waits.
const BACKPRESSURE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    JsonLines
}

impl InputFormat {
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("jsonl") || extension.eq_ignore_ascii_case("ndjson") => InputFormat::JsonLines,
            _ => InputFormat::Csv
        }
    }
}

/// Imports raw transaction exports and operator commands, rebuilding every account balance they touch.
pub struct AsyncEngine<S: Storage = AccountStorage> {
    storage: Arc<S>,
    classifier: Arc<Classifier>,
    source: SourceSystem
}

impl<S: Storage> AsyncEngine<S> {
    /// Creates a new engine for exports of the given source system.
    pub fn new(storage: Arc<S>, source: SourceSystem) -> Self {
        Self {
            storage,
            classifier: Arc::new(Classifier::default()),
            source
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Orchestrates the end-to-end import pipeline for one export file.
    ///
    /// # Errors
    /// Fails when an account actor stops before every command routed to it was applied
    /// and saved, since the stored balances would then be incomplete.
    pub async fn run(&self, path: &str) -> anyhow::Result<()> {
        let (sender, receiver) = mpsc::channel::<LedgerCommand>(BACKPRESSURE);
        let reader_handle = self.spawn_import_reader(path.to_string(), sender);

        self.drain(reader_handle, receiver).await
    }

    /// Applies a file of delete, restore and update commands to the accounts already in storage.
    ///
    /// # Errors
    /// Same as [`AsyncEngine::run`]. Rows that are not valid commands are logged and skipped.
    pub async fn run_commands(&self, path: &str) -> anyhow::Result<()> {
        let (sender, receiver) = mpsc::channel::<LedgerCommand>(BACKPRESSURE);
        let reader_handle = spawn_command_reader(path.to_string(), sender);

        self.drain(reader_handle, receiver).await
    }

    async fn drain(&self, reader_handle: JoinHandle<()>, receiver: mpsc::Receiver<LedgerCommand>) -> anyhow::Result<()> {
        let processing_result = self.process_commands(receiver).await;

        if let Err(error) = reader_handle.await {
            error!("Ingestion failed: {error}");
            processing_result?;
            bail!("Input reader stopped early: {error}");
        }

        processing_result
    }

    fn spawn_import_reader(&self, path: String, sender: mpsc::Sender<LedgerCommand>) -> JoinHandle<()> {
        let classifier = self.classifier.clone();
        let source = self.source;

        spawn_blocking(move || {
            let mut imported = 0usize;
            let mut forward = |raw: RawTransaction| -> bool {
                if raw.id().is_empty() {
                    error!("Skipping [{:?}] record without an id", raw.source());
                    return true;
                }

                let transaction = classifier.classify(&raw);

                if transaction.account_id == UNASSIGNED_ACCOUNT {
                    warn!("Transaction [{}] has no account or card, booked to [{UNASSIGNED_ACCOUNT}]", transaction.id);
                }

                let command = LedgerCommand::Record {
                    transaction,
                    actor: IMPORT_ACTOR.to_string(),
                    at: Utc::now()
                };

                imported += 1;
                sender.blocking_send(command).is_ok()
            };

            match source {
                SourceSystem::Legacy => read_input(&path, |record: LegacyRecord| forward(record.into())),
                SourceSystem::Mercury => read_input(&path, |record: MercuryRecord| forward(record.into()))
            }

            info!("Imported {imported} [{source:?}] records from {path}");
        })
    }

    async fn process_commands(&self, mut receiver: mpsc::Receiver<LedgerCommand>) -> anyhow::Result<()> {
        let mut actors = HashMap::<AccountId, AccountActor>::new();
        let mut failures = 0usize;

        // NOTE: Routing by account keeps every account's commands strictly ordered while accounts progress independently.
        while let Some(command) = receiver.recv().await {
            let account_id = command.account_id().to_string();
            let transaction_id = command.transaction_id().to_string();

            let actor = actors.entry(account_id.clone()).or_insert_with(|| {
                AccountActor::new(account_id.clone(), self.storage.clone())
            });

            if !actor.accept(command) {
                error!("Account actor for account [{account_id}] could not accept transaction [{transaction_id}]");
                failures += 1;
            }
        }

        //NOTE: Provide a graceful shutdown and wait for all actors to finish processing their individual queues
        let despawns = actors.into_iter().map(|(account_id, actor)| async move {
            (account_id, actor.despawn().await)
        });

        for (account_id, result) in join_all(despawns).await {
            if let Err(error) = result {
                error!("Account actor for account [{account_id}] did not despawn gracefully: {error:?}");
                failures += 1;
            }
        }

        if failures > 0 {
            return Err(anyhow!("{failures} account actor failure(s), stored balances are incomplete"));
        }

        Ok(())
    }
}

fn spawn_command_reader(path: String, sender: mpsc::Sender<LedgerCommand>) -> JoinHandle<()> {
    spawn_blocking(move || {
        let mut forwarded = 0usize;

        read_input(&path, |row: CommandRow| -> bool {
            match row.into_command(Utc::now()) {
                Ok(command) => {
                    forwarded += 1;
                    sender.blocking_send(command).is_ok()
                }
                Err(error) => {
                    error!("Skipping command row: {error}");
                    true
                }
            }
        });

        info!("Forwarded {forwarded} commands from {path}");
    })
}

/// Streams every record of a CSV or JSON-lines file into `forward` until it returns false.
fn read_input<T, F>(path: &str, forward: F)
where
    T: DeserializeOwned,
    F: FnMut(T) -> bool,
{
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) => {
            error!("Error opening input at path: {path} | {error}");
            return;
        }
    };

    let reader = BufReader::new(file);

    match InputFormat::from_path(path) {
        InputFormat::Csv => read_csv::<T, F>(reader, forward),
        InputFormat::JsonLines => read_json_lines::<T, F>(reader, forward)
    }
}

fn read_csv<T, F>(reader: impl Read, mut forward: F)
where
    T: DeserializeOwned,
    F: FnMut(T) -> bool,
{
    //NOTE: Only headers are trimmed, cell whitespace belongs to user comments
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    for (index, result) in reader.deserialize::<HashMap<String, String>>().enumerate() {
        let record = result.map_err(|error| error.to_string())
            .and_then(|row| row_to_record::<T>(row).map_err(|error| error.to_string()));

        match record {
            Ok(record) => {
                if !forward(record) {
                    break;
                }
            }
            Err(error) => {
                error!("CSV deserialization error on row {}: {error}", index + 1);
            }
        }
    }
}

// Cells stay strings so they keep their exact text; deserializing rows directly would infer
// numbers and turn "007" into "7". Empty cells count as absent.
fn row_to_record<T: DeserializeOwned>(row: HashMap<String, String>) -> serde_json::Result<T> {
    let object = row.into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key, Value::String(value)))
        .collect::<Map<String, Value>>();

    serde_json::from_value(Value::Object(object))
}

fn read_json_lines<T, F>(reader: impl BufRead, mut forward: F)
where
    T: DeserializeOwned,
    F: FnMut(T) -> bool,
{
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                error!("Error reading line {}: {error}", index + 1);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(&line) {
            Ok(record) => {
                if !forward(record) {
                    break;
                }
            }
            Err(error) => {
                error!("JSON deserialization error on line {}: {error}", index + 1);
            }
        }
    }
}
