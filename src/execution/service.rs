use super::execution_log::ExecutionLog;
use super::settlement::SettlementPolicy;
use crate::config::ExecutorConfig;
use crate::errors::LedgerError;
use crate::intake::{CrossLayerRequest, EscrowLedger, RequestId, Settlement};
use crate::queue::PriorityQueue;
use crate::utils::now_timestamp;
use async_trait::async_trait;
use eyre::{Result, eyre};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// The execution layer that runs dequeued requests on L2.
#[async_trait]
pub trait L2Executor: Send + Sync {
    /// Run the call and report whether it succeeded. An error counts as a failed execution.
    async fn execute(&self, request: &CrossLayerRequest) -> Result<bool>;
}

/// Summary of one dequeue-execute-record round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Settle calls that errored this round, retries included
    pub settlement_failures: usize,
}

impl BatchReport {
    fn absorb(&mut self, other: BatchReport) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.settlement_failures += other.settlement_failures;
    }
}

/// Takes batches from the queue, executes them and posts outcomes back to the log
#[derive(Clone)]
pub struct ExecutionWorker {
    queue: Arc<PriorityQueue>,
    log: Arc<ExecutionLog>,
    ledger: Arc<dyn EscrowLedger>,
    executor: Arc<dyn L2Executor>,
    batch_size: usize,
    settlement: SettlementPolicy,
    /// Settlements the ledger refused, retried at the start of every round
    unsettled: Arc<Mutex<Vec<(RequestId, Settlement)>>>,
}

impl ExecutionWorker {
    pub fn new(
        config: &ExecutorConfig,
        queue: Arc<PriorityQueue>,
        log: Arc<ExecutionLog>,
        ledger: Arc<dyn EscrowLedger>,
        executor: Arc<dyn L2Executor>,
    ) -> Self {
        Self {
            queue,
            log,
            ledger,
            executor,
            batch_size: config.batch_size,
            settlement: config.settlement,
            unsettled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn unsettled(&self) -> MutexGuard<'_, Vec<(RequestId, Settlement)>> {
        self.unsettled.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Escrows waiting for a settlement retry
    pub fn pending_settlements(&self) -> usize {
        self.unsettled().len()
    }

    /// Settle an escrow, parking it for retry on a ledger error. Returns false if the ledger refused.
    fn settle(&self, request_id: RequestId, settlement: Settlement) -> bool {
        match self.ledger.settle(request_id, settlement) {
            Ok(()) => true,
            Err(LedgerError::UnknownEscrow(_)) => {
                // Nothing is held for this id, a retry cannot succeed.
                error!("No open escrow to settle for request {}", request_id);
                false
            }
            Err(e) => {
                warn!("Settlement of request {} failed, will retry: {}", request_id, e);
                self.unsettled().push((request_id, settlement));
                false
            }
        }
    }

    /// Retry parked settlements once. Returns how many failed again.
    pub fn retry_settlements(&self) -> usize {
        let parked = std::mem::take(&mut *self.unsettled());
        if parked.is_empty() {
            return 0;
        }
        debug!("Retrying {} parked settlements", parked.len());
        parked.into_iter().filter(|(request_id, settlement)| !self.settle(*request_id, *settlement)).count()
    }

    /// Run one request on its own task so a panicking executor counts as a failed execution
    async fn execute_isolated(&self, request: &CrossLayerRequest) -> bool {
        let executor = self.executor.clone();
        let task_request = request.clone();
        match tokio::spawn(async move { executor.execute(&task_request).await }).await {
            Ok(Ok(succeeded)) => succeeded,
            Ok(Err(e)) => {
                warn!("Execution of request {} errored, recording failure: {}", request.id(), e);
                false
            }
            Err(e) => {
                error!("Executor task for request {} did not complete, recording failure: {}", request.id(), e);
                false
            }
        }
    }

    /// Process one batch. Every dequeued request gets its outcome recorded even if
    /// an earlier one in the batch hit a fatal error; the first such error is returned.
    pub async fn process_batch(&self) -> Result<BatchReport> {
        let mut report = BatchReport { settlement_failures: self.retry_settlements(), ..BatchReport::default() };
        let batch = self.queue.dequeue_batch(self.batch_size);
        let mut fatal = None;

        for request in batch {
            let request_id = request.id();
            if request.is_expired(now_timestamp()) {
                warn!("Request {} (serial {}) executed after its expiration", request_id, request.serial_id());
            }

            let succeeded = self.execute_isolated(&request).await;

            if let Err(e) = self.log.record(request_id, request.serial_id(), succeeded) {
                error!("Could not record outcome of request {}: {}", request_id, e);
                fatal.get_or_insert(e);
                continue;
            }

            report.processed += 1;
            if succeeded {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }

            if !self.settle(request_id, self.settlement.settlement_for(&request, succeeded)) {
                report.settlement_failures += 1;
            }
            debug!("Request {} finished: succeeded={}", request_id, succeeded);
        }

        match fatal {
            Some(e) => Err(eyre::Report::new(e)),
            None => Ok(report),
        }
    }

    /// Process batches until the queue is empty, then retry parked settlements once more
    pub async fn run_until_idle(&self) -> Result<BatchReport> {
        let mut total = BatchReport::default();
        while !self.queue.is_empty() {
            total.absorb(self.process_batch().await?);
        }
        total.settlement_failures += self.retry_settlements();
        Ok(total)
    }
}

/// Background service playing the single executor role for one queue
pub struct ExecutionService {
    config: ExecutorConfig,
    worker: ExecutionWorker,
    task: Option<JoinHandle<()>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl ExecutionService {
    pub fn new(config: ExecutorConfig, worker: ExecutionWorker) -> Self {
        Self { config, worker, task: None, shutdown_tx: None }
    }

    pub fn worker(&self) -> &ExecutionWorker {
        &self.worker
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.task.is_some() {
            return Err(eyre!("ExecutionService already started"));
        }
        info!("Starting ExecutionService (batch size {}, interval {:?})", self.config.batch_size, self.config.poll_interval());

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let worker = self.worker.clone();
        let poll_interval = self.config.poll_interval();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("ExecutionService received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        match worker.process_batch().await {
                            Ok(report) => {
                                if report.processed > 0 {
                                    info!(
                                        "Executed batch: {} processed, {} succeeded, {} failed",
                                        report.processed, report.succeeded, report.failed
                                    );
                                }
                                if report.settlement_failures > 0 {
                                    warn!(
                                        "{} settlements failed this round, {} parked for retry",
                                        report.settlement_failures,
                                        worker.pending_settlements()
                                    );
                                }
                            }
                            Err(e) => {
                                error!("Halting ExecutionService on fatal error: {}", e);
                                break;
                            }
                        }
                    }
                }
            }
        });

        self.task = Some(task);
        self.shutdown_tx = Some(shutdown_tx);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping ExecutionService");

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("ExecutionService task error during shutdown: {}", e);
            }
        }

        info!("ExecutionService stopped");
        Ok(())
    }
}
