use bank_ledger::application::banking::BankingService;
use bank_ledger::application::error_collector::ErrorCollector;
use bank_ledger::application::executor::BatchExecutor;
use bank_ledger::application::seeder::seed_demo_accounts;
use bank_ledger::config::LedgerConfig;
use bank_ledger::domain::account::AccountType;
use bank_ledger::domain::ports::SnapshotStoreBox;
use bank_ledger::domain::transaction::Transaction;
use bank_ledger::infrastructure::csv_snapshot::CsvSnapshotStore;
#[cfg(feature = "storage-rocksdb")]
use bank_ledger::infrastructure::rocksdb::RocksDbSnapshotStore;
use bank_ledger::interfaces::csv::account_writer::AccountWriter;
use bank_ledger::interfaces::csv::instruction_reader::InstructionReader;
use bank_ledger::observability;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Batch instructions CSV file (`type, account, amount`)
    input: Option<PathBuf>,

    /// JSON configuration file. Missing fields use the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding a CSV snapshot, restored at start and saved at exit.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Path to a RocksDB snapshot (requires the `storage-rocksdb` feature).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Open the demo accounts when the ledger starts out empty.
    #[arg(long)]
    seed_demo: bool,

    /// Number of batch workers.
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long)]
    max_accounts: Option<usize>,

    #[arg(long)]
    max_transactions: Option<usize>,

    /// Charge the monthly fee on every checking account after the batch.
    #[arg(long)]
    apply_monthly_fees: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let store = open_store(&cli)?;
    let service = Arc::new(BankingService::new(config));

    if let Some(store) = &store {
        let accounts = store.load_accounts().await.into_diagnostic()?;
        let transactions = store.load_transactions().await.into_diagnostic()?;
        service
            .restore(accounts, transactions)
            .await
            .into_diagnostic()?;
    }

    if cli.seed_demo && service.get_account_count().await == 0 {
        seed_demo_accounts(&service).await.into_diagnostic()?;
    }

    let collector = Arc::new(ErrorCollector::new());
    let mut executor =
        BatchExecutor::from_config(Arc::clone(&service), collector).into_diagnostic()?;

    if let Some(input) = &cli.input {
        let batch = read_batch(&service, input).await?;
        executor.submit(batch).await;
    }

    if cli.apply_monthly_fees {
        charge_monthly_fees(&service).await;
    }

    executor.shutdown().await;

    for discrepancy in service.reconcile().await.into_diagnostic()? {
        warn!(
            account = %discrepancy.account_number,
            balance = %discrepancy.balance,
            journal = %discrepancy.journal_total,
            "balance does not match journal"
        );
    }

    let accounts = service.view_all_accounts().await;
    if let Some(store) = &store {
        store.save_accounts(&accounts).await.into_diagnostic()?;
        store
            .save_transactions(&service.view_all_transactions().await)
            .await
            .into_diagnostic()?;
    }

    let transactions = service.get_transaction_count().await;
    match service.get_total_bank_balance().await {
        Ok(total_balance) => info!(
            accounts = accounts.len(),
            transactions,
            %total_balance,
            "run complete"
        ),
        Err(e) => warn!(
            accounts = accounts.len(),
            transactions,
            "run complete, total balance unavailable: {e}"
        ),
    }

    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(&accounts).into_diagnostic()?;

    Ok(())
}

fn load_config(cli: &Cli) -> Result<LedgerConfig> {
    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_path(path).into_diagnostic()?,
        None => LedgerConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.worker_pool_size = workers;
    }
    if cli.max_accounts.is_some() {
        config.max_accounts = cli.max_accounts;
    }
    if cli.max_transactions.is_some() {
        config.max_transactions = cli.max_transactions;
    }
    config.validate().into_diagnostic()?;
    Ok(config)
}

fn open_store(cli: &Cli) -> Result<Option<SnapshotStoreBox>> {
    if let Some(db_path) = &cli.db_path {
        if let Some(store) = open_db(db_path)? {
            return Ok(Some(store));
        }
    }
    match &cli.snapshot_dir {
        Some(dir) => {
            let store = CsvSnapshotStore::open(dir).into_diagnostic()?;
            Ok(Some(Box::new(store)))
        }
        None => Ok(None),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_db(path: &Path) -> Result<Option<SnapshotStoreBox>> {
    let store = RocksDbSnapshotStore::open(path).into_diagnostic()?;
    Ok(Some(Box::new(store)))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_db(path: &Path) -> Result<Option<SnapshotStoreBox>> {
    warn!(
        path = %path.display(),
        "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to --snapshot-dir or in-memory storage."
    );
    Ok(None)
}

/// Proposes one transaction per readable row. Bad rows and unknown accounts
/// are logged and skipped.
async fn read_batch(service: &BankingService, input: &Path) -> Result<Vec<Transaction>> {
    let file = File::open(input).into_diagnostic()?;
    let reader = InstructionReader::new(file);

    let mut batch = Vec::new();
    for instruction in reader.instructions() {
        let instruction = match instruction {
            Ok(instruction) => instruction,
            Err(e) => {
                warn!("Error reading instruction: {e}");
                continue;
            }
        };
        let proposed = service
            .get_account_by_number(&instruction.account)
            .await
            .and_then(|account| {
                service.propose(&account, instruction.amount, instruction.r#type)
            });
        match proposed {
            Ok(transaction) => batch.push(transaction),
            Err(e) => warn!("Error processing instruction: {e}"),
        }
    }
    Ok(batch)
}

async fn charge_monthly_fees(service: &BankingService) {
    for account in service.view_all_accounts().await {
        if account.account_type() != AccountType::Checking {
            continue;
        }
        if let Err(e) = service.charge_monthly_fee(&account.number).await {
            warn!(account = %account.number, "monthly fee not charged: {e}");
        }
    }
}
