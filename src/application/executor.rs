use super::banking::BankingService;
use super::error_collector::ErrorCollector;
use crate::domain::id::{AccountNumber, TransactionId};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const QUEUE_DEPTH: usize = 64;

/// What happened to one transaction of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Confirmed {
        transaction_id: TransactionId,
    },
    Failed {
        transaction_id: TransactionId,
        message: String,
    },
}

impl TaskOutcome {
    pub fn transaction_id(&self) -> &TransactionId {
        match self {
            TaskOutcome::Confirmed { transaction_id } => transaction_id,
            TaskOutcome::Failed { transaction_id, .. } => transaction_id,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, TaskOutcome::Confirmed { .. })
    }
}

/// Result of a batch, reported after every task has finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// One entry per submitted transaction, in submission order.
    pub outcomes: Vec<TaskOutcome>,
    /// Messages drained from the error collector for this batch.
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn confirmed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_confirmed()).count()
    }

    pub fn error_count(&self) -> usize {
        self.outcomes.len() - self.confirmed_count()
    }

    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }
}

/// One unit of work: confirm a single transaction and report back.
struct ConfirmTask {
    transaction: Transaction,
    reply: oneshot::Sender<TaskOutcome>,
}

impl ConfirmTask {
    async fn run(self, worker: usize, service: &BankingService, collector: &ErrorCollector) {
        let transaction_id = self.transaction.id.clone();
        let description = format!(
            "{} {} {} to {}",
            transaction_id,
            self.transaction.r#type,
            self.transaction.amount,
            self.transaction.account_number
        );

        let outcome = match confirm_one(service, self.transaction).await {
            Ok(()) => {
                debug!(worker, "{description} confirmed");
                TaskOutcome::Confirmed { transaction_id }
            }
            Err(e) => {
                let message = format!("{description} rejected: {e}");
                collector.add_error(message.clone());
                TaskOutcome::Failed {
                    transaction_id,
                    message,
                }
            }
        };

        // The submitter only drops its receiver if it was itself cancelled.
        let _ = self.reply.send(outcome);
    }
}

async fn confirm_one(service: &BankingService, transaction: Transaction) -> Result<()> {
    let account = service.account_handle(&transaction.account_number).await?;
    service.confirm(&account, transaction).await
}

struct Worker {
    queue: mpsc::Sender<ConfirmTask>,
    handle: JoinHandle<()>,
}

/// Confirms batches of proposed transactions on a fixed pool of workers.
///
/// Each account is pinned to one worker by a stable hash of its number, and a
/// worker drains its queue in order, so transactions for the same account are
/// applied in submission order. Different accounts proceed in parallel.
/// Failures are recorded per task and never abort the rest of the batch.
pub struct BatchExecutor {
    collector: Arc<ErrorCollector>,
    workers: Vec<Worker>,
    grace_period: Duration,
}

impl BatchExecutor {
    /// Spawns `pool_size` workers on the current tokio runtime.
    pub fn new(
        pool_size: usize,
        grace_period: Duration,
        service: Arc<BankingService>,
        collector: Arc<ErrorCollector>,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(LedgerError::Config(
                "worker pool needs at least one worker".to_string(),
            ));
        }

        let workers = (0..pool_size)
            .map(|id| {
                let (queue, receiver) = mpsc::channel(QUEUE_DEPTH);
                let handle = tokio::spawn(run_worker(
                    id,
                    receiver,
                    Arc::clone(&service),
                    Arc::clone(&collector),
                ));
                Worker { queue, handle }
            })
            .collect();

        Ok(Self {
            collector,
            workers,
            grace_period,
        })
    }

    /// Builds an executor sized by the service's configuration.
    pub fn from_config(service: Arc<BankingService>, collector: Arc<ErrorCollector>) -> Result<Self> {
        let config = service.config();
        let (pool_size, grace_period) = (config.worker_pool_size, config.shutdown_grace());
        Self::new(pool_size, grace_period, service, collector)
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// Confirms every transaction and waits for all of them before returning.
    ///
    /// Taking `&mut self` keeps a second batch from starting before this one's
    /// barrier has returned.
    pub async fn submit(&mut self, transactions: Vec<Transaction>) -> BatchResult {
        let mut pending = Vec::with_capacity(transactions.len());

        for transaction in transactions {
            let transaction_id = transaction.id.clone();
            let worker = &self.workers[self.shard(&transaction.account_number)];
            let (reply, receiver) = oneshot::channel();

            if worker.queue.send(ConfirmTask { transaction, reply }).await.is_err() {
                let message = format!("{transaction_id} could not be queued: worker has stopped");
                self.collector.add_error(message.clone());
                pending.push(Err(TaskOutcome::Failed {
                    transaction_id,
                    message,
                }));
            } else {
                pending.push(Ok((transaction_id, receiver)));
            }
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for entry in pending {
            let outcome = match entry {
                Ok((transaction_id, receiver)) => match receiver.await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        let message =
                            format!("{transaction_id} was abandoned: worker stopped mid-batch");
                        self.collector.add_error(message.clone());
                        TaskOutcome::Failed {
                            transaction_id,
                            message,
                        }
                    }
                },
                Err(outcome) => outcome,
            };
            outcomes.push(outcome);
        }

        let errors = if self.collector.has_errors() {
            let errors = self.collector.drain();
            for error in &errors {
                warn!("{error}");
            }
            errors
        } else {
            Vec::new()
        };

        let result = BatchResult { outcomes, errors };
        info!(
            submitted = result.outcomes.len(),
            confirmed = result.confirmed_count(),
            failed = result.error_count(),
            "batch complete"
        );
        result
    }

    /// Errors recorded since the executor started or the count was last reset.
    pub fn error_count(&self) -> usize {
        self.collector.lifetime_count()
    }

    pub fn reset_error_count(&self) {
        self.collector.reset_lifetime_count();
    }

    /// Stops accepting work and waits up to the grace period for the workers
    /// to drain. Workers still running after that are aborted, and whatever
    /// they were doing is left incomplete.
    pub async fn shutdown(self) {
        let mut handles: Vec<JoinHandle<()>> = self
            .workers
            .into_iter()
            .map(|worker| worker.handle)
            .collect();

        let drained = tokio::time::timeout(self.grace_period, async {
            for handle in handles.iter_mut() {
                if let Err(e) = handle.await {
                    warn!("worker ended abnormally: {e}");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                grace_secs = self.grace_period.as_secs_f64(),
                "workers did not stop within the grace period, aborting"
            );
            for handle in &handles {
                handle.abort();
            }
        }
    }

    fn shard(&self, number: &AccountNumber) -> usize {
        let mut hasher = DefaultHasher::new();
        number.hash(&mut hasher);
        (hasher.finish() % self.workers.len() as u64) as usize
    }
}

async fn run_worker(
    id: usize,
    mut queue: mpsc::Receiver<ConfirmTask>,
    service: Arc<BankingService>,
    collector: Arc<ErrorCollector>,
) {
    while let Some(task) = queue.recv().await {
        task.run(id, &service, &collector).await;
    }
    debug!(worker = id, "worker stopped");
}
