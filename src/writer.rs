//! Batch writer: coalesces single-row writes into `BatchWriteRow`
//! requests with adaptive back-pressure.
//!
//! Callers enqueue single-row puts, updates and deletes; one aggregator
//! task drains the queue into batched requests on every nap cycle. Each
//! cycle first adapts its nap and concurrency to the back-pressure
//! observed since the previous cycle (halving concurrency, then doubling
//! the nap, under pressure; shrinking the nap, then growing concurrency,
//! while calm), then dispatches up to `concurrency` batches.
//!
//! Two pending rows with the same real primary key never share a batch:
//! the service rejects duplicate keys within one request. They flow
//! through back to back instead, never merged. Auto-increment
//! placeholders cannot collide and coalesce freely.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::protocol::action::Action;
use crate::protocol::messages::{
    BatchWriteRowRequest, BatchWriteRowResponse, DeleteRowResponse, PutRowResponse,
    UpdateRowResponse, WriteEntry,
};
use crate::retry::{retriable, server_throttle};
use crate::types::{
    ConsumedCapacity, PrimaryKeyValue, Row, RowChange, RowDeleteChange, RowPutChange,
    RowUpdateChange,
};

/// The seam batches leave through. [`Client`] implements it; tests plug
/// in mocks.
#[async_trait]
pub trait BatchWrite: Send + Sync + 'static {
    async fn batch_write_row(
        &self,
        request: BatchWriteRowRequest,
    ) -> Result<BatchWriteRowResponse>;
}

#[async_trait]
impl BatchWrite for Client {
    async fn batch_write_row(
        &self,
        request: BatchWriteRowRequest,
    ) -> Result<BatchWriteRowResponse> {
        Client::batch_write_row(self, request).await
    }
}

/// Batch-writer tuning knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriterConfig {
    /// Upper bound on concurrently in-flight batches.
    pub max_concurrency: usize,

    /// Upper bound on rows per batch.
    pub max_batch_size: usize,

    /// Nap between dispatch cycles while the service keeps up.
    pub regular_nap: Duration,

    /// Upper bound the nap grows to under sustained back-pressure.
    pub max_nap: Duration,

    /// How much of the nap one calm cycle wins back.
    pub nap_shrink_step: Duration,
}

impl Default for BatchWriterConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 32,
            max_batch_size: 200,
            regular_nap: Duration::from_millis(10),
            max_nap: Duration::from_secs(10),
            nap_shrink_step: Duration::from_millis(157),
        }
    }
}

impl BatchWriterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency < 1 {
            return Err(Error::validation("max concurrency must be positive"));
        }
        if self.max_batch_size < 1 {
            return Err(Error::validation("max batch size must be positive"));
        }
        if self.regular_nap <= Duration::from_millis(1) {
            return Err(Error::validation(
                "regular nap must be longer than one millisecond",
            ));
        }
        if self.max_nap < self.regular_nap * 2 {
            return Err(Error::validation(
                "max nap must be at least twice the regular nap",
            ));
        }
        if self.nap_shrink_step.is_zero() {
            return Err(Error::validation("nap shrink step must be positive"));
        }
        Ok(())
    }
}

enum Pending {
    Put {
        change: RowPutChange,
        tx: oneshot::Sender<Result<PutRowResponse>>,
    },
    Update {
        change: RowUpdateChange,
        tx: oneshot::Sender<Result<UpdateRowResponse>>,
    },
    Delete {
        change: RowDeleteChange,
        tx: oneshot::Sender<Result<DeleteRowResponse>>,
    },
}

impl Pending {
    fn to_row_change(&self) -> RowChange {
        match self {
            Self::Put { change, .. } => RowChange::Put(change.clone()),
            Self::Update { change, .. } => RowChange::Update(change.clone()),
            Self::Delete { change, .. } => RowChange::Delete(change.clone()),
        }
    }

    fn action(&self) -> Action {
        match self {
            Self::Put { .. } => Action::PutRow,
            Self::Update { .. } => Action::UpdateRow,
            Self::Delete { .. } => Action::DeleteRow,
        }
    }

    fn table_name(&self) -> &str {
        match self {
            Self::Put { change, .. } => &change.table_name,
            Self::Update { change, .. } => &change.table_name,
            Self::Delete { change, .. } => &change.table_name,
        }
    }

    fn primary_key(&self) -> &crate::types::PrimaryKey {
        match self {
            Self::Put { change, .. } => &change.primary_key,
            Self::Update { change, .. } => &change.primary_key,
            Self::Delete { change, .. } => &change.primary_key,
        }
    }

    /// Whether this row cannot share a batch with `other`.
    fn collides_with(&self, other: &Pending) -> bool {
        if self.table_name() != other.table_name() {
            return false;
        }
        let key = self.primary_key();
        if key
            .iter()
            .any(|col| col.value == PrimaryKeyValue::AutoIncrement)
        {
            return false;
        }
        key == other.primary_key()
    }

    fn succeed(
        self,
        request_id: &str,
        trace_id: &str,
        consumed: Option<ConsumedCapacity>,
        row: Option<Row>,
    ) {
        let consumed = consumed.unwrap_or_default();
        match self {
            Self::Put { tx, .. } => {
                let _ = tx.send(Ok(PutRowResponse {
                    request_id: request_id.to_string(),
                    trace_id: trace_id.to_string(),
                    consumed,
                    row,
                }));
            }
            Self::Update { tx, .. } => {
                let _ = tx.send(Ok(UpdateRowResponse {
                    request_id: request_id.to_string(),
                    trace_id: trace_id.to_string(),
                    consumed,
                    row,
                }));
            }
            Self::Delete { tx, .. } => {
                let _ = tx.send(Ok(DeleteRowResponse {
                    request_id: request_id.to_string(),
                    trace_id: trace_id.to_string(),
                    consumed,
                    row,
                }));
            }
        }
    }

    fn fail(self, error: Error) {
        match self {
            Self::Put { tx, .. } => {
                let _ = tx.send(Err(error));
            }
            Self::Update { tx, .. } => {
                let _ = tx.send(Err(error));
            }
            Self::Delete { tx, .. } => {
                let _ = tx.send(Err(error));
            }
        }
    }
}

struct Shared {
    config: BatchWriterConfig,
    waiting: Mutex<VecDeque<Pending>>,
    wakeup: Notify,
    exit: AtomicBool,
    backoff: AtomicBool,
    ongoing: AtomicI64,
}

/// Aggregates single-row writes into batched requests.
///
/// Exactly one aggregator task runs per writer. Call
/// [`flush`](Self::flush) to push everything out, and
/// [`close`](Self::close) for an orderly teardown; rows still queued at
/// close time fail with a client-side error.
pub struct BatchWriter {
    shared: Arc<Shared>,
    aggregator: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl BatchWriter {
    pub fn new(client: Client, config: BatchWriterConfig) -> Result<Self> {
        Self::with_sender(Arc::new(client), config)
    }

    /// Like [`new`](Self::new), over any batch sender.
    pub fn with_sender(sender: Arc<dyn BatchWrite>, config: BatchWriterConfig) -> Result<Self> {
        config.validate()?;
        let shared = Arc::new(Shared {
            config,
            waiting: Mutex::new(VecDeque::new()),
            wakeup: Notify::new(),
            exit: AtomicBool::new(false),
            backoff: AtomicBool::new(false),
            ongoing: AtomicI64::new(0),
        });
        let aggregator = tokio::spawn(aggregator(Arc::clone(&shared), sender));
        Ok(Self {
            shared,
            aggregator: Mutex::new(Some(aggregator)),
        })
    }

    pub async fn put_row(&self, change: RowPutChange) -> Result<PutRowResponse> {
        change.validate()?;
        let (tx, rx) = oneshot::channel();
        self.enqueue(Pending::Put { change, tx })?;
        rx.await
            .unwrap_or_else(|_| Err(Error::no_available_connection("batch writer is closed")))
    }

    pub async fn update_row(&self, change: RowUpdateChange) -> Result<UpdateRowResponse> {
        change.validate()?;
        let (tx, rx) = oneshot::channel();
        self.enqueue(Pending::Update { change, tx })?;
        rx.await
            .unwrap_or_else(|_| Err(Error::no_available_connection("batch writer is closed")))
    }

    pub async fn delete_row(&self, change: RowDeleteChange) -> Result<DeleteRowResponse> {
        change.validate()?;
        let (tx, rx) = oneshot::channel();
        self.enqueue(Pending::Delete { change, tx })?;
        rx.await
            .unwrap_or_else(|_| Err(Error::no_available_connection("batch writer is closed")))
    }

    fn enqueue(&self, pending: Pending) -> Result<()> {
        if self.shared.exit.load(Ordering::Acquire) {
            return Err(Error::no_available_connection("batch writer is closed"));
        }
        self.shared.waiting.lock().push_back(pending);
        // no wakeup here: rows gather until the nap runs out, which is
        // the whole point of batching
        Ok(())
    }

    /// Waits until the waiting list is empty and no batch is in flight.
    pub async fn flush(&self) {
        loop {
            let drained = self.shared.waiting.lock().is_empty()
                && self.shared.ongoing.load(Ordering::Acquire) == 0;
            if drained {
                return;
            }
            self.shared.wakeup.notify_one();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Stops the aggregator and awaits outstanding batches. Queued rows
    /// that never made it out fail with a client-side error.
    pub async fn close(&self) {
        self.shared.exit.store(true, Ordering::Release);
        self.shared.wakeup.notify_one();
        let aggregator = self.aggregator.lock().take();
        if let Some(aggregator) = aggregator {
            let _ = aggregator.await;
        }
    }
}

impl std::fmt::Debug for BatchWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("config", &self.shared.config)
            .field("waiting", &self.shared.waiting.lock().len())
            .field("ongoing", &self.shared.ongoing.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        // best effort; close() is the orderly path
        self.shared.exit.store(true, Ordering::Release);
        self.shared.wakeup.notify_one();
    }
}

/// One adaptation step: what the next cycle's nap and concurrency should
/// be, given what this cycle observed.
fn next_nap_and_concurrency(
    config: &BatchWriterConfig,
    backoff: bool,
    concurrency: usize,
    nap: Duration,
) -> (Duration, usize) {
    if backoff {
        if concurrency > 1 {
            (nap, concurrency / 2)
        } else {
            ((nap * 2).min(config.max_nap), 1)
        }
    } else if nap > config.regular_nap {
        (
            config.regular_nap.max(nap.saturating_sub(config.nap_shrink_step)),
            concurrency,
        )
    } else {
        (
            config.regular_nap,
            (concurrency + 1).min(config.max_concurrency),
        )
    }
}

/// Takes the next batch off the waiting list: up to `max_batch_size`
/// rows, stopping early at the first row whose key already sits in the
/// batch.
fn take_batch(shared: &Shared) -> Option<Vec<Pending>> {
    let mut waiting = shared.waiting.lock();
    if waiting.is_empty() {
        return None;
    }
    let mut batch: Vec<Pending> = Vec::new();
    while batch.len() < shared.config.max_batch_size {
        let Some(candidate) = waiting.front() else {
            break;
        };
        if batch.iter().any(|taken| candidate.collides_with(taken)) {
            break;
        }
        // front() just succeeded under the same lock
        let Some(candidate) = waiting.pop_front() else {
            break;
        };
        batch.push(candidate);
    }
    Some(batch)
}

fn prepend_waiting(shared: &Shared, batch: Vec<Pending>) {
    let mut waiting = shared.waiting.lock();
    for pending in batch.into_iter().rev() {
        waiting.push_front(pending);
    }
}

async fn aggregator(shared: Arc<Shared>, sender: Arc<dyn BatchWrite>) {
    let mut nap = shared.config.regular_nap;
    let mut concurrency = 1usize;

    loop {
        // rows gather while the aggregator naps; a flush, a finished
        // batch or a shutdown cuts the nap short
        tokio::select! {
            _ = shared.wakeup.notified() => {}
            _ = tokio::time::sleep(nap) => {}
        }
        if shared.exit.load(Ordering::Acquire) {
            break;
        }

        let backoff = shared.backoff.swap(false, Ordering::AcqRel);
        (nap, concurrency) =
            next_nap_and_concurrency(&shared.config, backoff, concurrency, nap);
        if backoff {
            debug!(
                nap_ms = nap.as_millis() as u64,
                concurrency, "backing off"
            );
        }

        while shared.ongoing.load(Ordering::Acquire) < concurrency as i64 {
            let Some(batch) = take_batch(&shared) else {
                break;
            };
            shared.ongoing.fetch_add(1, Ordering::AcqRel);
            tokio::spawn(send_batch(
                Arc::clone(&shared),
                Arc::clone(&sender),
                batch,
            ));
        }
    }

    // outstanding batches run to completion
    while shared.ongoing.load(Ordering::Acquire) > 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    // whatever still waits never got sent; dropping it fails the callers
    let abandoned = { shared.waiting.lock().len() };
    if abandoned > 0 {
        warn!(abandoned, "closing with unsent rows");
        shared.waiting.lock().clear();
    }
}

async fn send_batch(shared: Arc<Shared>, sender: Arc<dyn BatchWrite>, batch: Vec<Pending>) {
    let request = BatchWriteRowRequest {
        rows: batch
            .iter()
            .map(|pending| WriteEntry::new(pending.to_row_change()))
            .collect(),
    };

    match sender.batch_write_row(request).await {
        Err(error) if retriable(Action::BatchWriteRow, &error) => {
            debug!(%error, rows = batch.len(), "whole batch failed, requeueing");
            shared.backoff.store(true, Ordering::Release);
            prepend_waiting(&shared, batch);
        }
        Err(error) => {
            warn!(%error, rows = batch.len(), "whole batch failed terminally");
            for pending in batch {
                pending.fail(error.clone());
            }
        }
        Ok(response) => {
            let mut throttled = false;
            let mut requeue = Vec::new();
            for (pending, row) in batch.into_iter().zip(response.rows) {
                match row.result {
                    Ok(returned) => pending.succeed(
                        &response.request_id,
                        &response.trace_id,
                        row.consumed,
                        returned,
                    ),
                    Err(error) if retriable(pending.action(), &error) => {
                        if server_throttle(&error) {
                            throttled = true;
                        }
                        requeue.push(pending);
                    }
                    Err(error) => pending.fail(error),
                }
            }
            if throttled {
                shared.backoff.store(true, Ordering::Release);
            }
            if !requeue.is_empty() {
                debug!(rows = requeue.len(), "requeueing failed rows");
                prepend_waiting(&shared, requeue);
            }
        }
    }

    shared.ongoing.fetch_sub(1, Ordering::AcqRel);
    shared.wakeup.notify_one();
}
