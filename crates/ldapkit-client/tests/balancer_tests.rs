//! Load balancer behavior: failover, state transitions, monitoring and
//! exhaustion.

mod common;

use std::error::Error as _;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ldapkit_client::balancer::{
    BalancerEventListener, FailoverStrategy, LoadBalancer, LoadBalancerOptions,
    RoundRobinStrategy,
};
use ldapkit_client::connection::{Connection as _, ConnectionFactory};
use ldapkit_client::error::ClientError;

use common::MockConnectionFactory;

#[derive(Default)]
struct RecordingListener {
    offline_events: Mutex<Vec<usize>>,
    online_events: Mutex<Vec<usize>>,
}

impl BalancerEventListener for RecordingListener {
    fn factory_offline(&self, index: usize, _error: &ClientError) {
        self.offline_events.lock().unwrap().push(index);
    }

    fn factory_online(&self, index: usize) {
        self.online_events.lock().unwrap().push(index);
    }
}

struct SharedListener(Arc<RecordingListener>);

impl BalancerEventListener for SharedListener {
    fn factory_offline(&self, index: usize, error: &ClientError) {
        self.0.factory_offline(index, error);
    }

    fn factory_online(&self, index: usize) {
        self.0.factory_online(index);
    }
}

fn balancer_options() -> LoadBalancerOptions {
    LoadBalancerOptions {
        monitor_interval: Duration::from_secs(1),
    }
}

fn three_factories() -> (Vec<MockConnectionFactory>, Vec<Box<dyn ConnectionFactory>>) {
    let handles: Vec<MockConnectionFactory> =
        (0..3).map(|_| MockConnectionFactory::new()).collect();
    let boxed: Vec<Box<dyn ConnectionFactory>> = handles
        .iter()
        .map(|factory| Box::new(factory.clone()) as Box<dyn ConnectionFactory>)
        .collect();
    (handles, boxed)
}

#[tokio::test]
async fn failover_skips_broken_factories_and_reports_each_once() {
    let (handles, boxed) = three_factories();
    handles[0].fail.store(true, Ordering::Release);
    handles[1].fail.store(true, Ordering::Release);

    let listener = Arc::new(RecordingListener::default());
    let balancer = LoadBalancer::with_listener(
        boxed,
        FailoverStrategy,
        balancer_options(),
        Some(Box::new(SharedListener(listener.clone()))),
    )
    .unwrap();

    let connection = balancer.get_connection().await.unwrap();
    assert!(connection.is_valid());
    assert_eq!(handles[2].connect_attempts(), 1);

    assert!(!balancer.is_operational(0));
    assert!(!balancer.is_operational(1));
    assert!(balancer.is_operational(2));
    assert_eq!(*listener.offline_events.lock().unwrap(), vec![0, 1]);

    // Later requests skip the offline factories without re-reporting.
    let _connection = balancer.get_connection().await.unwrap();
    assert_eq!(*listener.offline_events.lock().unwrap(), vec![0, 1]);
    assert_eq!(handles[0].connect_attempts(), 1);
    assert_eq!(handles[1].connect_attempts(), 1);
    assert_eq!(handles[2].connect_attempts(), 2);
}

#[tokio::test]
async fn exhaustion_reports_the_last_observed_failure() {
    let (handles, boxed) = three_factories();
    for factory in &handles {
        factory.fail.store(true, Ordering::Release);
    }
    let balancer = LoadBalancer::new(boxed, FailoverStrategy, balancer_options()).unwrap();

    let error = balancer.get_connection().await.unwrap_err();
    match &error {
        ClientError::NoOperationalFactories { last_failure } => {
            let last = last_failure.as_ref().expect("a cause should be recorded");
            assert!(last.to_string().contains("mock server is down"));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    // The cause is also reachable through the standard error chain.
    assert!(error.source().is_some());

    // select_factory_index fails the same way once everything is down.
    assert!(balancer.select_factory_index().is_err());
}

#[tokio::test(start_paused = true)]
async fn monitor_detects_recovered_factories() {
    let (handles, boxed) = three_factories();
    handles[0].fail.store(true, Ordering::Release);

    let listener = Arc::new(RecordingListener::default());
    let balancer = LoadBalancer::with_listener(
        boxed,
        FailoverStrategy,
        balancer_options(),
        Some(Box::new(SharedListener(listener.clone()))),
    )
    .unwrap();

    // Drive factory 0 offline; the connection comes from factory 1.
    let _connection = balancer.get_connection().await.unwrap();
    assert!(!balancer.is_operational(0));
    let probes_before = handles[0].connect_attempts();

    // While offline, the monitor keeps probing.
    tokio::time::advance(Duration::from_millis(1500)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(handles[0].connect_attempts() > probes_before);
    assert!(!balancer.is_operational(0));

    // Once the server recovers, a probe brings the factory back online
    // and the probe connection is closed immediately.
    handles[0].fail.store(false, Ordering::Release);
    tokio::time::advance(Duration::from_millis(1500)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(balancer.is_operational(0));
    assert_eq!(*listener.online_events.lock().unwrap(), vec![0]);
    assert_eq!(handles[0].open_connections(), 0);
}

#[tokio::test]
async fn round_robin_rotates_across_factories() {
    let (handles, boxed) = three_factories();
    let balancer =
        LoadBalancer::new(boxed, RoundRobinStrategy::new(), balancer_options()).unwrap();

    for _ in 0..6 {
        let _connection = balancer.get_connection().await.unwrap();
    }
    assert_eq!(handles[0].connect_attempts(), 2);
    assert_eq!(handles[1].connect_attempts(), 2);
    assert_eq!(handles[2].connect_attempts(), 2);
}

#[tokio::test]
async fn close_is_idempotent_and_closes_every_factory() {
    let (handles, boxed) = three_factories();
    let balancer = LoadBalancer::new(boxed, FailoverStrategy, balancer_options()).unwrap();

    balancer.close().await;
    balancer.close().await;
    for factory in &handles {
        assert!(factory.stats.factory_closed.load(Ordering::Acquire));
    }
}

#[tokio::test]
async fn panicking_listener_does_not_break_failover() {
    struct PanickingListener;
    impl BalancerEventListener for PanickingListener {
        fn factory_offline(&self, _index: usize, _error: &ClientError) {
            panic!("listener bug");
        }
        fn factory_online(&self, _index: usize) {
            panic!("listener bug");
        }
    }

    let (handles, boxed) = three_factories();
    handles[0].fail.store(true, Ordering::Release);
    let balancer = LoadBalancer::with_listener(
        boxed,
        FailoverStrategy,
        balancer_options(),
        Some(Box::new(PanickingListener)),
    )
    .unwrap();

    let connection = balancer.get_connection().await.unwrap();
    assert!(connection.is_valid());
    assert!(!balancer.is_operational(0));
}

#[test]
fn empty_factory_list_is_rejected() {
    let result = LoadBalancer::new(Vec::new(), FailoverStrategy, balancer_options());
    assert!(matches!(
        result,
        Err(ClientError::InvalidConfiguration { .. })
    ));
}
