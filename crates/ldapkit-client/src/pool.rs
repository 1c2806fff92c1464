//! Cached connection pool.
//!
//! The pool keeps up to `max_pool_size` connections alive, never evicting
//! the first `core_pool_size` of them, and hands them out wrapped in
//! [`PooledConnection`] proxies that return the underlying connection to
//! the pool on close or drop.
//!
//! A single queue holds either idle connections or pending waiters, never
//! both at once: the queue alternates between an excess-supply phase
//! (idle connections waiting for callers) and an excess-demand phase
//! (callers waiting for connections). A counting semaphore enforces the
//! hard cap: permits are consumed when a new connection is requested from
//! the underlying factory and released on every close, eviction and
//! failure path. Pending waiters are satisfied in strict FIFO order, and
//! a factory failure is delivered to the oldest waiter.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use ldapkit_schema::entry::{Dn, Entry};

use crate::connection::{Connection, ConnectionEventListener, ConnectionFactory};
use crate::error::{ClientError, ClientResult};
use crate::requests::{
    AddRequest, CompareRequest, DeleteRequest, ExtendedRequest, ExtendedResponse, ModifyDnRequest,
    ModifyRequest, SearchRequest,
};

/// Sizing and eviction options for [`CachedConnectionPool`].
#[derive(Debug, Clone)]
pub struct ConnectionPoolOptions {
    /// Connections kept alive regardless of idle time.
    pub core_pool_size: usize,
    /// Hard cap on live connections (idle plus checked out).
    pub max_pool_size: usize,
    /// Idle connections beyond the core are closed after this long;
    /// `Duration::ZERO` disables eviction.
    pub idle_timeout: Duration,
}

impl Default for ConnectionPoolOptions {
    fn default() -> Self {
        ConnectionPoolOptions {
            core_pool_size: 1,
            max_pool_size: 10,
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl ConnectionPoolOptions {
    /// Validate the sizing invariants.
    pub fn validate(&self) -> ClientResult<()> {
        if self.max_pool_size == 0 {
            return Err(ClientError::invalid_configuration(
                "max_pool_size must be at least 1",
            ));
        }
        if self.core_pool_size > self.max_pool_size {
            return Err(ClientError::invalid_configuration(
                "core_pool_size must not exceed max_pool_size",
            ));
        }
        Ok(())
    }
}

struct IdleConnection {
    connection: Box<dyn Connection>,
    idle_since: Instant,
}

/// The queue alternates between holding idle connections and pending
/// waiters; a tagged element keeps the two cases explicit.
enum QueueElement {
    Idle(IdleConnection),
    Pending(oneshot::Sender<ClientResult<Box<dyn Connection>>>),
}

#[derive(Default)]
struct PoolState {
    queue: VecDeque<QueueElement>,
    /// Live connections plus in-flight factory requests; bounded by
    /// `max_pool_size` through the semaphore.
    connection_count: usize,
    closed: bool,
}

struct PoolInner {
    factory: Box<dyn ConnectionFactory>,
    core_pool_size: usize,
    idle_timeout: Duration,
    available: Semaphore,
    state: Mutex<PoolState>,
    evictor: Mutex<Option<JoinHandle<()>>>,
}

impl PoolInner {
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release_permit(&self) {
        self.state().connection_count -= 1;
        self.available.add_permits(1);
    }

    /// Close a connection for good and give its permit back.
    fn dispose(&self, mut connection: Box<dyn Connection>) {
        self.release_permit();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                connection.close().await;
            });
        }
    }

    /// Route a factory connection to the oldest waiter, or park it as
    /// idle. Closes it instead when the pool shut down in the meantime.
    fn publish_connection(&self, connection: Box<dyn Connection>) {
        let mut connection = connection;
        loop {
            let mut state = self.state();
            if state.closed {
                drop(state);
                self.dispose(connection);
                return;
            }
            match state.queue.front() {
                Some(QueueElement::Pending(_)) => {
                    let Some(QueueElement::Pending(sender)) = state.queue.pop_front() else {
                        continue;
                    };
                    drop(state);
                    match sender.send(Ok(connection)) {
                        Ok(()) => return,
                        // The waiter went away; hand the connection to the
                        // next one.
                        Err(Ok(returned)) => connection = returned,
                        Err(Err(_)) => return,
                    }
                }
                _ => {
                    state.queue.push_back(QueueElement::Idle(IdleConnection {
                        connection,
                        idle_since: Instant::now(),
                    }));
                    return;
                }
            }
        }
    }

    /// Return path for checked-out connections.
    fn release_connection(&self, connection: Box<dyn Connection>) {
        let closed = self.state().closed;
        if closed || !connection.is_valid() {
            self.dispose(connection);
        } else {
            self.publish_connection(connection);
        }
    }

    async fn connect_and_publish(self: Arc<Self>) {
        match self.factory.get_connection().await {
            Ok(connection) => self.publish_connection(connection),
            Err(error) => {
                // FIFO fairness: the failure goes to the oldest waiter.
                let waiter = {
                    let mut state = self.state();
                    match state.queue.front() {
                        Some(QueueElement::Pending(_)) => match state.queue.pop_front() {
                            Some(QueueElement::Pending(sender)) => Some(sender),
                            _ => None,
                        },
                        _ => None,
                    }
                };
                match waiter {
                    Some(sender) => {
                        let _ = sender.send(Err(error));
                    }
                    None => warn!(error = %error, "connection attempt failed with no waiter"),
                }
                self.release_permit();
            }
        }
    }

    /// Close idle connections older than the timeout while the pool is
    /// above its core size. Core connections are never evicted.
    fn evict_idle(&self) {
        let mut evicted = Vec::new();
        {
            let mut state = self.state();
            while state.connection_count > self.core_pool_size + evicted.len() {
                match state.queue.front() {
                    Some(QueueElement::Idle(idle))
                        if idle.idle_since.elapsed() >= self.idle_timeout =>
                    {
                        if let Some(QueueElement::Idle(idle)) = state.queue.pop_front() {
                            evicted.push(idle.connection);
                        }
                    }
                    _ => break,
                }
            }
        }
        for connection in evicted {
            debug!("evicting idle connection past its idle timeout");
            self.dispose(connection);
        }
    }
}

/// A concurrent pool of directory connections with core/max sizing and
/// idle-timeout eviction.
///
/// All acquisition is asynchronous; [`get_connection`] suspends the
/// calling task (never a thread) until a connection is available.
///
/// [`get_connection`]: CachedConnectionPool::get_connection
pub struct CachedConnectionPool {
    inner: Arc<PoolInner>,
}

impl CachedConnectionPool {
    /// Create a pool over the given factory.
    ///
    /// Must be called from within a tokio runtime when eviction is
    /// enabled, since the eviction task is spawned here.
    pub fn new(
        factory: impl ConnectionFactory + 'static,
        options: ConnectionPoolOptions,
    ) -> ClientResult<Self> {
        options.validate()?;
        let inner = Arc::new(PoolInner {
            factory: Box::new(factory),
            core_pool_size: options.core_pool_size,
            idle_timeout: options.idle_timeout,
            available: Semaphore::new(options.max_pool_size),
            state: Mutex::new(PoolState::default()),
            evictor: Mutex::new(None),
        });

        if !options.idle_timeout.is_zero() {
            let weak: Weak<PoolInner> = Arc::downgrade(&inner);
            let period = options.idle_timeout;
            let handle = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let Some(inner) = weak.upgrade() else { break };
                    inner.evict_idle();
                }
            });
            *inner.evictor.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        }

        Ok(CachedConnectionPool { inner })
    }

    /// Number of live connections (idle plus checked out plus in-flight
    /// factory requests).
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.inner.state().connection_count
    }

    /// Acquire a connection.
    ///
    /// Idle connections are reused when valid; otherwise the pool grows
    /// up to its maximum size, and past that the caller queues behind
    /// earlier waiters in FIFO order.
    pub async fn get_connection(&self) -> ClientResult<PooledConnection> {
        loop {
            let idle = {
                let mut state = self.inner.state();
                if state.closed {
                    return Err(ClientError::PoolClosing);
                }
                match state.queue.front() {
                    Some(QueueElement::Idle(_)) => match state.queue.pop_front() {
                        Some(QueueElement::Idle(idle)) => Some(idle),
                        _ => None,
                    },
                    _ => None,
                }
            };
            let Some(idle) = idle else { break };
            if idle.connection.is_valid() {
                return Ok(PooledConnection::new(idle.connection, self.inner.clone()));
            }
            debug!("discarding stale idle connection");
            self.inner.dispose(idle.connection);
        }

        // No idle connection: queue up, then grow the pool if the cap
        // still allows a new connection.
        let receiver = {
            let mut state = self.inner.state();
            if state.closed {
                return Err(ClientError::PoolClosing);
            }
            let (sender, receiver) = oneshot::channel();
            state.queue.push_back(QueueElement::Pending(sender));
            receiver
        };

        if let Ok(permit) = self.inner.available.try_acquire() {
            permit.forget();
            self.inner.state().connection_count += 1;
            let inner = self.inner.clone();
            tokio::spawn(inner.connect_and_publish());
        }

        match receiver.await {
            Ok(Ok(connection)) => Ok(PooledConnection::new(connection, self.inner.clone())),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(ClientError::PoolClosing),
        }
    }

    /// Shut the pool down: close all idle connections, fail all pending
    /// waiters, stop eviction and close the underlying factory.
    /// Connections still checked out are closed as they come back.
    /// Idempotent.
    pub async fn close(&self) {
        let drained = {
            let mut state = self.inner.state();
            if state.closed {
                return;
            }
            state.closed = true;
            std::mem::take(&mut state.queue)
        };
        if let Some(handle) = self
            .inner
            .evictor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
        for element in drained {
            match element {
                QueueElement::Idle(idle) => self.inner.dispose(idle.connection),
                QueueElement::Pending(sender) => {
                    let _ = sender.send(Err(ClientError::PoolClosing));
                }
            }
        }
        self.inner.factory.close().await;
    }
}

#[async_trait]
impl ConnectionFactory for CachedConnectionPool {
    async fn get_connection(&self) -> ClientResult<Box<dyn Connection>> {
        let connection = CachedConnectionPool::get_connection(self).await?;
        Ok(Box::new(connection))
    }

    async fn close(&self) {
        CachedConnectionPool::close(self).await;
    }
}

/// A pooled connection proxy.
///
/// Forwards every operation to the underlying connection. Closing or
/// dropping the proxy returns the underlying connection to the pool; it
/// is closed for real only when it reports itself invalid or the pool is
/// shutting down.
pub struct PooledConnection {
    connection: Option<Box<dyn Connection>>,
    pool: Arc<PoolInner>,
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("connection", &self.connection)
            .finish()
    }
}

impl PooledConnection {
    fn new(connection: Box<dyn Connection>, pool: Arc<PoolInner>) -> Self {
        PooledConnection {
            connection: Some(connection),
            pool,
        }
    }

    fn active(&mut self) -> ClientResult<&mut Box<dyn Connection>> {
        self.connection.as_mut().ok_or(ClientError::ConnectionClosed)
    }
}

#[async_trait]
impl Connection for PooledConnection {
    async fn search(&mut self, request: SearchRequest) -> ClientResult<Vec<Entry>> {
        self.active()?.search(request).await
    }

    async fn read_entry(&mut self, dn: &Dn, attributes: &[String]) -> ClientResult<Entry> {
        self.active()?.read_entry(dn, attributes).await
    }

    async fn add(&mut self, request: AddRequest) -> ClientResult<()> {
        self.active()?.add(request).await
    }

    async fn delete(&mut self, request: DeleteRequest) -> ClientResult<()> {
        self.active()?.delete(request).await
    }

    async fn modify(&mut self, request: ModifyRequest) -> ClientResult<()> {
        self.active()?.modify(request).await
    }

    async fn modify_dn(&mut self, request: ModifyDnRequest) -> ClientResult<()> {
        self.active()?.modify_dn(request).await
    }

    async fn compare(&mut self, request: CompareRequest) -> ClientResult<bool> {
        self.active()?.compare(request).await
    }

    async fn simple_bind(&mut self, dn: &Dn, password: &str) -> ClientResult<()> {
        self.active()?.simple_bind(dn, password).await
    }

    async fn extended(&mut self, request: ExtendedRequest) -> ClientResult<ExtendedResponse> {
        self.active()?.extended(request).await
    }

    fn is_valid(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| c.is_valid())
    }

    fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    fn add_event_listener(&mut self, listener: Box<dyn ConnectionEventListener>) {
        if let Some(connection) = self.connection.as_mut() {
            connection.add_event_listener(listener);
        }
    }

    /// Returns the underlying connection to the pool rather than closing
    /// it.
    async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.release_connection(connection);
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.pool.release_connection(connection);
        }
    }
}
