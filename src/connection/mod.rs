//! Connection pool and scheduler.
//!
//! The pool resolves the endpoint, keeps up to `max_connections` TCP/TLS
//! connections and serves borrow requests FIFO. Borrowers that find no
//! idle connection queue up as waiters; a maintenance task pairs waiters
//! with returned connections, fails the ones whose deadline passed and
//! lazily re-opens connections (every 15 seconds, and whenever demand
//! shows up).
//!
//! A connection is in exactly one of three states: idle (queued in the
//! pool), busy (out on loan behind a [`PooledConnection`]) or being
//! opened. The invariant `idle + busy + connecting <= max_connections`
//! holds at all times.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub mod endpoint;
pub(crate) mod http;
pub mod transport;

pub use endpoint::Endpoint;
pub use transport::TlsConfig;

use transport::Transport;

/// How often the pool re-targets `max_connections`.
const REPLENISH_PERIOD: Duration = Duration::from_secs(15);

/// How often waiters are scanned for expiry.
const SCAN_PERIOD: Duration = Duration::from_millis(50);

/// Silence window of connect-failure warnings.
const WARN_SILENCE: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub(crate) struct PoolConfig {
    pub(crate) endpoint: Endpoint,
    pub(crate) tls_config: TlsConfig,
    pub(crate) max_connections: usize,
    pub(crate) connect_timeout: Option<Duration>,
}

#[derive(Debug)]
pub(crate) struct Connection {
    pub(crate) id: u64,
    pub(crate) transport: Transport,
}

struct Waiter {
    tracker: String,
    deadline: Instant,
    tx: oneshot::Sender<Result<Connection>>,
}

#[derive(Default)]
struct State {
    idle: VecDeque<Connection>,
    waiters: VecDeque<Waiter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolStats {
    pub(crate) idle: usize,
    pub(crate) busy: usize,
    pub(crate) connecting: usize,
    pub(crate) waiters: usize,
}

struct Inner {
    config: PoolConfig,
    state: Mutex<State>,
    busy: AtomicUsize,
    connecting: AtomicUsize,
    closed: AtomicBool,
    wakeup: Notify,
    next_id: AtomicU64,
    last_connect_warning: Mutex<Option<std::time::Instant>>,
}

pub(crate) struct ConnectionPool {
    inner: Arc<Inner>,
    maintenance: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl ConnectionPool {
    /// Creates the pool and starts filling it. Must run on a tokio
    /// runtime.
    pub(crate) fn new(config: PoolConfig) -> Self {
        let inner = Arc::new(Inner {
            config,
            state: Mutex::new(State::default()),
            busy: AtomicUsize::new(0),
            connecting: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            wakeup: Notify::new(),
            next_id: AtomicU64::new(0),
            last_connect_warning: Mutex::new(None),
        });
        let maintenance = tokio::spawn(maintenance(Arc::clone(&inner)));
        Self {
            inner,
            maintenance: Mutex::new(Some(maintenance)),
        }
    }

    /// Borrows one connection, waiting FIFO behind earlier borrowers.
    ///
    /// Fails with `OperationTimeout` once `deadline` passes and with
    /// `NoConnectionAvailable` when the pool shuts down first.
    pub(crate) async fn borrow(&self, tracker: &str, deadline: Instant) -> Result<PooledConnection> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(Error::no_available_connection("client is closed"));
        }

        let rx = {
            let mut state = inner.state.lock();
            // taking an idle connection while others queue would jump the line
            if state.waiters.is_empty() {
                if let Some(conn) = state.idle.pop_front() {
                    inner.busy.fetch_add(1, Ordering::AcqRel);
                    debug!(tracker, connection = conn.id, "borrowing an idle connection");
                    return Ok(PooledConnection {
                        conn: Some(conn),
                        pool: Arc::downgrade(inner),
                    });
                }
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(Waiter {
                tracker: tracker.to_string(),
                deadline,
                tx,
            });
            rx
        };
        debug!(tracker, "no idle connection, queueing");
        inner.wakeup.notify_one();

        match rx.await {
            Ok(Ok(conn)) => Ok(PooledConnection {
                conn: Some(conn),
                pool: Arc::downgrade(inner),
            }),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(Error::no_available_connection("connection pool is gone")),
        }
    }

    pub(crate) fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        PoolStats {
            idle: state.idle.len(),
            busy: self.inner.busy.load(Ordering::Acquire),
            connecting: self.inner.connecting.load(Ordering::Acquire),
            waiters: state.waiters.len(),
        }
    }

    /// Shuts the pool down: fails all waiters, waits for loaned and
    /// in-progress connections to come home, then drains the idle queue.
    pub(crate) async fn close(&self) {
        let inner = &self.inner;
        if inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        inner.wakeup.notify_one();

        {
            let mut state = inner.state.lock();
            for waiter in state.waiters.drain(..) {
                debug!(tracker = %waiter.tracker, "failing waiter, pool is closing");
                let _ = waiter
                    .tx
                    .send(Err(Error::no_available_connection("client is closed")));
            }
        }

        while inner.busy.load(Ordering::Acquire) > 0
            || inner.connecting.load(Ordering::Acquire) > 0
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        inner.state.lock().idle.clear();

        let maintenance = self.maintenance.lock().take();
        if let Some(maintenance) = maintenance {
            let _ = maintenance.await;
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("endpoint", &self.inner.config.endpoint)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

async fn maintenance(inner: Arc<Inner>) {
    let mut last_replenish: Option<Instant> = None;
    loop {
        if inner.closed.load(Ordering::Acquire) {
            break;
        }

        inner.scan_waiters();

        let due = last_replenish.map_or(true, |t| t.elapsed() >= REPLENISH_PERIOD);
        let demand = { inner.state.lock().waiters.len() } > 0;
        if due || demand {
            inner.replenish();
            last_replenish = Some(Instant::now());
        }

        tokio::select! {
            _ = inner.wakeup.notified() => {}
            _ = tokio::time::sleep(SCAN_PERIOD) => {}
        }
    }
}

impl Inner {
    /// Pairs idle connections with waiters and fails expired waiters, in
    /// arrival order.
    fn scan_waiters(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();
        while let Some(waiter) = state.waiters.pop_front() {
            if waiter.deadline <= now {
                debug!(tracker = %waiter.tracker, "borrow deadline passed");
                let _ = waiter.tx.send(Err(Error::operation_timeout(
                    "no connection became available in time",
                )));
                continue;
            }
            match state.idle.pop_front() {
                Some(conn) => match waiter.tx.send(Ok(conn)) {
                    Ok(()) => {
                        self.busy.fetch_add(1, Ordering::AcqRel);
                    }
                    Err(sent) => {
                        // the borrower gave up; keep the connection
                        if let Ok(conn) = sent {
                            state.idle.push_front(conn);
                        }
                    }
                },
                None => {
                    state.waiters.push_front(waiter);
                    break;
                }
            }
        }
    }

    /// Re-targets `max_connections`, opening the missing ones concurrently.
    fn replenish(self: &Arc<Self>) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let idle = self.state.lock().idle.len();
        let total = idle
            + self.busy.load(Ordering::Acquire)
            + self.connecting.load(Ordering::Acquire);
        let require = self.config.max_connections.saturating_sub(total);
        if require == 0 {
            return;
        }
        debug!(require, "replenishing the connection pool");
        for _ in 0..require {
            self.spawn_connect();
        }
    }

    fn spawn_connect(self: &Arc<Self>) {
        self.connecting.fetch_add(1, Ordering::AcqRel);
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner.open_connection().await;
            inner.connecting.fetch_sub(1, Ordering::AcqRel);
            match result {
                Ok(conn) => {
                    if inner.closed.load(Ordering::Acquire) {
                        return;
                    }
                    inner.receive(conn);
                }
                Err(error) => inner.warn_connect_failure(&error),
            }
        });
    }

    async fn open_connection(&self) -> Result<Connection> {
        let authority = self.config.endpoint.authority();
        let mut addrs = tokio::net::lookup_host(&authority).await.map_err(|e| {
            Error::couldnt_resolve_host(format!("cannot resolve {authority:?}: {e}"))
        })?;
        let addr = addrs.next().ok_or_else(|| {
            Error::couldnt_resolve_host(format!("{authority:?} resolves to no address"))
        })?;

        let transport = Transport::connect(
            addr,
            self.config.endpoint.host(),
            self.config.endpoint.https(),
            self.config.tls_config.clone(),
            self.config.connect_timeout,
        )
        .await
        .map_err(transport_error)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(connection = id, %addr, "opened a connection");
        Ok(Connection { id, transport })
    }

    /// Takes a fresh or returned connection: hands it to the oldest live
    /// waiter, or parks it idle.
    fn receive(&self, mut conn: Connection) {
        let now = Instant::now();
        let mut state = self.state.lock();
        loop {
            match state.waiters.pop_front() {
                Some(waiter) => {
                    if waiter.deadline <= now {
                        let _ = waiter.tx.send(Err(Error::operation_timeout(
                            "no connection became available in time",
                        )));
                        continue;
                    }
                    match waiter.tx.send(Ok(conn)) {
                        Ok(()) => {
                            self.busy.fetch_add(1, Ordering::AcqRel);
                            return;
                        }
                        Err(sent) => match sent {
                            Ok(c) => {
                                conn = c;
                                continue;
                            }
                            Err(_) => return,
                        },
                    }
                }
                None => {
                    state.idle.push_back(conn);
                    return;
                }
            }
        }
    }

    fn return_connection(&self, conn: Connection, healthy: bool) {
        self.busy.fetch_sub(1, Ordering::AcqRel);
        if !healthy || self.closed.load(Ordering::Acquire) {
            debug!(connection = conn.id, healthy, "dropping a returned connection");
            drop(conn);
            // a slot opened up; demand-driven replenishment may kick in
            self.wakeup.notify_one();
            return;
        }
        self.receive(conn);
    }

    fn warn_connect_failure(&self, error: &Error) {
        let now = std::time::Instant::now();
        let mut last = self.last_connect_warning.lock();
        if last.map_or(true, |t| now.duration_since(t) >= WARN_SILENCE) {
            *last = Some(now);
            warn!(%error, endpoint = %self.config.endpoint, "cannot open a connection");
        } else {
            debug!(%error, "cannot open a connection (warning suppressed)");
        }
    }
}

pub(crate) fn transport_error(error: transport::Error) -> Error {
    match &error {
        transport::Error::IO(_) | transport::Error::ConnectTimeout => {
            Error::couldnt_connect(error.to_string())
        }
        _ => Error::ssl_handshake_fail(error.to_string()),
    }
}

/// A scoped borrow of one pooled connection.
///
/// Give it back with [`give_back`](Self::give_back) after a clean
/// exchange. Dropping it any other way closes the connection: a borrow
/// that did not end cleanly may have left bytes in flight, and the pool
/// only reuses connections known to be quiet.
#[derive(Debug)]
pub(crate) struct PooledConnection {
    conn: Option<Connection>,
    pool: Weak<Inner>,
}

impl PooledConnection {
    pub(crate) fn transport_mut(&mut self) -> &mut Transport {
        &mut self.conn.as_mut().expect("present until returned").transport
    }

    /// Returns a healthy connection to the pool.
    pub(crate) fn give_back(mut self) {
        if let (Some(conn), Some(pool)) = (self.conn.take(), self.pool.upgrade()) {
            pool.return_connection(conn, true);
        }
    }

    /// Closes a broken connection and frees its slot.
    pub(crate) fn destroy(mut self) {
        if let (Some(conn), Some(pool)) = (self.conn.take(), self.pool.upgrade()) {
            pool.return_connection(conn, false);
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Some(pool) = self.pool.upgrade() {
                pool.return_connection(conn, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Accepts connections and keeps them open until the peer closes.
    async fn sink_server() -> Endpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    while matches!(socket.read(&mut buf).await, Ok(n) if n > 0) {}
                });
            }
        });
        Endpoint::parse(&format!("http://127.0.0.1:{port}")).unwrap()
    }

    fn config(endpoint: Endpoint, max_connections: usize) -> PoolConfig {
        PoolConfig {
            endpoint,
            #[cfg(feature = "transport-tls")]
            tls_config: None,
            #[cfg(not(feature = "transport-tls"))]
            tls_config: TlsConfig::default(),
            max_connections,
            connect_timeout: Some(Duration::from_secs(1)),
        }
    }

    async fn wait_for_idle(pool: &ConnectionPool, want: usize) {
        for _ in 0..100 {
            if pool.stats().idle == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("pool never reached {want} idle connections: {:?}", pool.stats());
    }

    #[tokio::test]
    async fn fills_to_max_connections() {
        let pool = ConnectionPool::new(config(sink_server().await, 3));
        wait_for_idle(&pool, 3).await;
        let stats = pool.stats();
        assert_eq!(stats.busy, 0);
        assert_eq!(stats.connecting, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn excess_borrowers_wait_and_recover() {
        // M connections, N > M borrowers
        let pool = ConnectionPool::new(config(sink_server().await, 2));
        wait_for_idle(&pool, 2).await;

        let deadline = Instant::now() + Duration::from_secs(5);
        let first = pool.borrow("t-0", deadline).await.unwrap();
        let second = pool.borrow("t-1", deadline).await.unwrap();

        // the two extra borrowers find nothing and queue up; the pool is
        // already at max so no new connection can serve them
        let waiting = {
            let f1 = pool.borrow("t-2", deadline);
            let f2 = pool.borrow("t-3", deadline);
            tokio::join!(
                async {
                    tokio::time::sleep(Duration::from_millis(150)).await;
                    let stats = pool.stats();
                    assert_eq!(stats.busy, 2);
                    assert_eq!(stats.idle, 0);
                    assert_eq!(stats.waiters, 2);
                    first.give_back();
                    second.give_back();
                },
                f1,
                f2,
            )
        };
        waiting.1.unwrap().give_back();
        waiting.2.unwrap().give_back();

        wait_for_idle(&pool, 2).await;
        assert_eq!(pool.stats().busy, 0);
        pool.close().await;
    }

    #[tokio::test]
    async fn waiters_time_out_fifo() {
        let pool = ConnectionPool::new(config(sink_server().await, 1));
        wait_for_idle(&pool, 1).await;

        let held = pool
            .borrow("t-0", Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();
        let err = pool
            .borrow("t-1", Instant::now() + Duration::from_millis(120))
            .await
            .unwrap_err();
        assert_eq!(err.http_status, crate::error::HTTP_OPERATION_TIMEOUT);

        held.give_back();
        pool.close().await;
    }

    #[tokio::test]
    async fn destroy_frees_the_slot_for_new_demand() {
        let pool = ConnectionPool::new(config(sink_server().await, 1));
        wait_for_idle(&pool, 1).await;

        let held = pool
            .borrow("t-0", Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();
        held.destroy();

        // demand triggers a fresh connect well before the periodic tick
        let conn = pool
            .borrow("t-1", Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();
        conn.give_back();
        pool.close().await;
    }

    #[tokio::test]
    async fn close_fails_waiters() {
        let pool = ConnectionPool::new(config(sink_server().await, 1));
        wait_for_idle(&pool, 1).await;

        let held = pool
            .borrow("t-0", Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();

        let ((), waiter) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                // closing fails the waiter, then waits for the loan
                let close = pool.close();
                tokio::pin!(close);
                tokio::select! {
                    _ = &mut close => {}
                    _ = tokio::time::sleep(Duration::from_millis(200)) => {}
                }
                held.give_back();
                close.await;
            },
            pool.borrow("t-1", Instant::now() + Duration::from_secs(5)),
        );
        let err = waiter.unwrap_err();
        assert_eq!(err.http_status, crate::error::HTTP_NO_AVAILABLE_CONNECTION);
    }

    #[tokio::test]
    async fn unresolvable_host_keeps_pool_alive() {
        let endpoint = Endpoint::parse("http://no-such-host.invalid").unwrap();
        let pool = ConnectionPool::new(config(endpoint, 1));
        let err = pool
            .borrow("t-0", Instant::now() + Duration::from_millis(200))
            .await
            .unwrap_err();
        // the borrower times out; resolution failures only warn
        assert_eq!(err.http_status, crate::error::HTTP_OPERATION_TIMEOUT);
        pool.close().await;
    }
}
