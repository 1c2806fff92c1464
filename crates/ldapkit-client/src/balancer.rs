//! Failover-aware load balancing over multiple connection factories.
//!
//! A [`LoadBalancer`] wraps an ordered list of factories, tracking an
//! online/offline flag for each. Connect attempts start at the index the
//! [`LoadBalancingStrategy`] picks and scan circularly for an operational
//! factory; a connect failure marks the factory offline and moves on to
//! the next one. While at least one factory is offline a background
//! monitor task periodically probes the offline factories with a test
//! connection (closed immediately on success) so that recovered servers
//! come back into rotation without client traffic having to find out the
//! hard way.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection::{Connection, ConnectionFactory};
use crate::error::{ClientError, ClientResult};

/// Picks the index at which a connect attempt starts scanning.
pub trait LoadBalancingStrategy: Send + Sync {
    /// The first factory index to try, given the number of factories.
    fn initial_index(&self, factories: usize) -> usize;
}

/// Distributes load by rotating the starting index across requests.
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    next: AtomicUsize,
}

impl RoundRobinStrategy {
    #[must_use]
    pub fn new() -> Self {
        RoundRobinStrategy::default()
    }
}

impl LoadBalancingStrategy for RoundRobinStrategy {
    fn initial_index(&self, factories: usize) -> usize {
        if factories == 0 {
            return 0;
        }
        self.next.fetch_add(1, Ordering::Relaxed) % factories
    }
}

/// Always prefers the first factory, falling back through the list only
/// on failure.
#[derive(Debug, Default)]
pub struct FailoverStrategy;

impl LoadBalancingStrategy for FailoverStrategy {
    fn initial_index(&self, _factories: usize) -> usize {
        0
    }
}

/// Listener notified of factory state transitions. Each transition is
/// reported exactly once, and callbacks are serialized so transitions on
/// different factories never interleave.
pub trait BalancerEventListener: Send + Sync {
    /// A factory stopped accepting connections.
    fn factory_offline(&self, index: usize, error: &ClientError);

    /// A previously offline factory recovered.
    fn factory_online(&self, index: usize);
}

/// Options for [`LoadBalancer`].
#[derive(Debug, Clone)]
pub struct LoadBalancerOptions {
    /// Delay between monitoring probes of offline factories.
    pub monitor_interval: Duration,
}

impl Default for LoadBalancerOptions {
    fn default() -> Self {
        LoadBalancerOptions {
            monitor_interval: Duration::from_secs(1),
        }
    }
}

struct MonitoredFactory {
    factory: Box<dyn ConnectionFactory>,
    operational: AtomicBool,
}

struct BalancerState {
    offline_count: usize,
    last_failure: Option<Arc<ClientError>>,
    monitor: Option<JoinHandle<()>>,
    closed: bool,
}

struct BalancerInner {
    factories: Vec<MonitoredFactory>,
    listener: Option<Box<dyn BalancerEventListener>>,
    monitor_interval: Duration,
    state: Mutex<BalancerState>,
    // Serializes listener callbacks across concurrent transitions.
    listener_lock: Mutex<()>,
}

impl BalancerInner {
    fn state(&self) -> MutexGuard<'_, BalancerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify_offline(&self, index: usize, error: &ClientError) {
        if let Some(listener) = &self.listener {
            let _guard = self.listener_lock.lock().unwrap_or_else(|e| e.into_inner());
            // A misbehaving listener must never break failover.
            if catch_unwind(AssertUnwindSafe(|| listener.factory_offline(index, error))).is_err() {
                warn!(index, "load balancer event listener panicked");
            }
        }
    }

    fn notify_online(&self, index: usize) {
        if let Some(listener) = &self.listener {
            let _guard = self.listener_lock.lock().unwrap_or_else(|e| e.into_inner());
            if catch_unwind(AssertUnwindSafe(|| listener.factory_online(index))).is_err() {
                warn!(index, "load balancer event listener panicked");
            }
        }
    }

    /// Mark a factory offline. The transition fires the listener exactly
    /// once and starts the monitor when this is the first offline
    /// factory.
    fn mark_offline(self: &Arc<Self>, index: usize, error: &Arc<ClientError>) {
        let transitioned = self.factories[index]
            .operational
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        {
            let mut state = self.state();
            state.last_failure = Some(error.clone());
            if transitioned {
                state.offline_count += 1;
                if state.offline_count == 1 && !state.closed && state.monitor.is_none() {
                    state.monitor = Some(self.spawn_monitor());
                }
            }
        }
        if transitioned {
            warn!(index, error = %error, "connection factory is offline");
            self.notify_offline(index, error);
        }
    }

    /// Mark a factory online. The transition fires the listener exactly
    /// once and stops the monitor once no factory remains offline.
    fn mark_online(&self, index: usize) {
        let transitioned = self.factories[index]
            .operational
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !transitioned {
            return;
        }
        let finished_monitor = {
            let mut state = self.state();
            state.offline_count -= 1;
            if state.offline_count == 0 {
                state.monitor.take()
            } else {
                None
            }
        };
        if let Some(handle) = finished_monitor {
            handle.abort();
        }
        info!(index, "connection factory is back online");
        self.notify_online(index);
    }

    fn spawn_monitor(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<BalancerInner> = Arc::downgrade(self);
        let period = self.monitor_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                inner.probe_offline_factories().await;
            }
        })
    }

    /// Issue a lightweight test connection to every offline factory. A
    /// successful probe is closed immediately; it exists only to detect
    /// recovery.
    async fn probe_offline_factories(&self) {
        for (index, monitored) in self.factories.iter().enumerate() {
            if monitored.operational.load(Ordering::Acquire) {
                continue;
            }
            match monitored.factory.get_connection().await {
                Ok(mut connection) => {
                    connection.close().await;
                    self.mark_online(index);
                }
                Err(error) => {
                    debug!(index, error = %error, "offline factory probe failed");
                }
            }
        }
    }
}

/// A failover load balancer over an ordered list of connection
/// factories. Implements [`ConnectionFactory`] so it can slot in
/// anywhere a factory is expected, including underneath a
/// [`CachedConnectionPool`](crate::pool::CachedConnectionPool).
pub struct LoadBalancer {
    inner: Arc<BalancerInner>,
    strategy: Box<dyn LoadBalancingStrategy>,
}

impl LoadBalancer {
    /// Create a load balancer over the given factories.
    pub fn new(
        factories: Vec<Box<dyn ConnectionFactory>>,
        strategy: impl LoadBalancingStrategy + 'static,
        options: LoadBalancerOptions,
    ) -> ClientResult<Self> {
        Self::with_listener(factories, strategy, options, None)
    }

    /// Create a load balancer with a state-transition listener.
    pub fn with_listener(
        factories: Vec<Box<dyn ConnectionFactory>>,
        strategy: impl LoadBalancingStrategy + 'static,
        options: LoadBalancerOptions,
        listener: Option<Box<dyn BalancerEventListener>>,
    ) -> ClientResult<Self> {
        if factories.is_empty() {
            return Err(ClientError::invalid_configuration(
                "a load balancer needs at least one connection factory",
            ));
        }
        if options.monitor_interval.is_zero() {
            return Err(ClientError::invalid_configuration(
                "monitor_interval must be non-zero",
            ));
        }
        let factories = factories
            .into_iter()
            .map(|factory| MonitoredFactory {
                factory,
                operational: AtomicBool::new(true),
            })
            .collect();
        Ok(LoadBalancer {
            inner: Arc::new(BalancerInner {
                factories,
                listener,
                monitor_interval: options.monitor_interval,
                state: Mutex::new(BalancerState {
                    offline_count: 0,
                    last_failure: None,
                    monitor: None,
                    closed: false,
                }),
                listener_lock: Mutex::new(()),
            }),
            strategy: Box::new(strategy),
        })
    }

    /// Number of wrapped factories.
    #[must_use]
    pub fn factory_count(&self) -> usize {
        self.inner.factories.len()
    }

    /// True if the factory at `index` is currently marked operational.
    #[must_use]
    pub fn is_operational(&self, index: usize) -> bool {
        self.inner
            .factories
            .get(index)
            .is_some_and(|f| f.operational.load(Ordering::Acquire))
    }

    /// The index of the first operational factory, scanning circularly
    /// from the strategy's starting point.
    pub fn select_factory_index(&self) -> ClientResult<usize> {
        let count = self.inner.factories.len();
        let start = self.strategy.initial_index(count);
        for offset in 0..count {
            let index = (start + offset) % count;
            if self.inner.factories[index]
                .operational
                .load(Ordering::Acquire)
            {
                return Ok(index);
            }
        }
        Err(ClientError::no_operational_factories(
            self.inner.state().last_failure.clone(),
        ))
    }

    /// Obtain a connection, failing over across factories.
    ///
    /// Starting at the strategy's index, each operational factory is
    /// tried in turn; a failure marks that factory offline and the scan
    /// continues. When every factory has been passed over the call fails
    /// with a no-operational-factories error whose cause is the most
    /// recent underlying failure.
    pub async fn get_connection(&self) -> ClientResult<Box<dyn Connection>> {
        let count = self.inner.factories.len();
        let start = self.strategy.initial_index(count);
        for offset in 0..count {
            let index = (start + offset) % count;
            let monitored = &self.inner.factories[index];
            if !monitored.operational.load(Ordering::Acquire) {
                continue;
            }
            match monitored.factory.get_connection().await {
                Ok(connection) => {
                    self.inner.mark_online(index);
                    return Ok(connection);
                }
                Err(error) => {
                    let error = Arc::new(error);
                    self.inner.mark_offline(index, &error);
                }
            }
        }
        Err(ClientError::no_operational_factories(
            self.inner.state().last_failure.clone(),
        ))
    }

    /// Stop monitoring and close every wrapped factory. Idempotent.
    pub async fn close(&self) {
        let monitor = {
            let mut state = self.inner.state();
            if state.closed {
                return;
            }
            state.closed = true;
            state.monitor.take()
        };
        if let Some(handle) = monitor {
            handle.abort();
        }
        for monitored in &self.inner.factories {
            monitored.factory.close().await;
        }
    }
}

#[async_trait]
impl ConnectionFactory for LoadBalancer {
    async fn get_connection(&self) -> ClientResult<Box<dyn Connection>> {
        LoadBalancer::get_connection(self).await
    }

    async fn close(&self) {
        LoadBalancer::close(self).await;
    }
}
