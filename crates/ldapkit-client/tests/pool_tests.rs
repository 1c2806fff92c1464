//! Connection pool behavior: sizing, reuse, queueing, eviction and
//! shutdown.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use ldapkit_client::connection::Connection;
use ldapkit_client::error::ClientError;
use ldapkit_client::pool::{CachedConnectionPool, ConnectionPoolOptions};

use common::MockConnectionFactory;

fn options(core: usize, max: usize, idle_timeout: Duration) -> ConnectionPoolOptions {
    ConnectionPoolOptions {
        core_pool_size: core,
        max_pool_size: max,
        idle_timeout,
    }
}

#[tokio::test]
async fn released_connections_are_reused() {
    let factory = MockConnectionFactory::new();
    let stats = factory.stats.clone();
    let pool =
        CachedConnectionPool::new(factory, options(1, 4, Duration::ZERO)).unwrap();

    let connection = pool.get_connection().await.unwrap();
    drop(connection);
    tokio::task::yield_now().await;
    let _connection = pool.get_connection().await.unwrap();

    assert_eq!(stats.connect_attempts.load(Ordering::Acquire), 1);
    assert_eq!(pool.pool_size(), 1);
}

#[tokio::test]
async fn pool_never_exceeds_max_size() {
    let factory = MockConnectionFactory::new();
    let stats = factory.stats.clone();
    let pool = Arc::new(
        CachedConnectionPool::new(factory, options(2, 4, Duration::ZERO)).unwrap(),
    );

    let mut connections = Vec::new();
    for _ in 0..4 {
        connections.push(pool.get_connection().await.unwrap());
    }
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 4);
    assert_eq!(pool.pool_size(), 4);

    // A fifth request must queue: the cap is hard.
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get_connection().await })
    };
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert!(!waiter.is_finished(), "fifth request should still be queued");
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 4);

    // Releasing one connection completes the waiter with the released
    // connection, never a fifth one.
    connections.pop();
    let fifth = waiter.await.unwrap().unwrap();
    assert!(fifth.is_valid());
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 4);
    assert_eq!(stats.connect_attempts.load(Ordering::Acquire), 4);
}

#[tokio::test(start_paused = true)]
async fn idle_connections_beyond_core_are_evicted() {
    let factory = MockConnectionFactory::new();
    let stats = factory.stats.clone();
    let pool = CachedConnectionPool::new(
        factory,
        options(2, 4, Duration::from_secs(1)),
    )
    .unwrap();

    let mut connections = Vec::new();
    for _ in 0..4 {
        connections.push(pool.get_connection().await.unwrap());
    }
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 4);

    connections.clear();
    tokio::task::yield_now().await;

    // Let the eviction task observe the idle timeout expiring.
    tokio::time::advance(Duration::from_millis(2500)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    // The two excess connections are gone; the core two survive any
    // amount of idle time.
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 2);
    assert_eq!(pool.pool_size(), 2);

    tokio::time::advance(Duration::from_secs(30)).await;
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 2);
}

#[tokio::test]
async fn invalid_connections_are_closed_not_requeued() {
    let factory = MockConnectionFactory::new();
    let stats = factory.stats.clone();
    let valid = factory.connection_valid.clone();
    let pool =
        CachedConnectionPool::new(factory, options(1, 4, Duration::ZERO)).unwrap();

    let connection = pool.get_connection().await.unwrap();
    valid.store(false, Ordering::Release);
    drop(connection);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 0);
    assert_eq!(pool.pool_size(), 0);

    // The next acquisition builds a fresh connection.
    valid.store(true, Ordering::Release);
    let connection = pool.get_connection().await.unwrap();
    assert!(connection.is_valid());
    assert_eq!(stats.connect_attempts.load(Ordering::Acquire), 2);
}

#[tokio::test]
async fn factory_failures_reach_the_oldest_waiter() {
    let factory = MockConnectionFactory::failing();
    let pool =
        CachedConnectionPool::new(factory, options(1, 2, Duration::ZERO)).unwrap();

    let result = pool.get_connection().await;
    assert!(matches!(
        result,
        Err(ClientError::ConnectionFailed { .. })
    ));
    // The failed attempt released its permit; the pool is back to empty.
    assert_eq!(pool.pool_size(), 0);
}

#[tokio::test]
async fn close_fails_pending_waiters_and_closes_idles() {
    let factory = MockConnectionFactory::new();
    let stats = factory.stats.clone();
    let pool = Arc::new(
        CachedConnectionPool::new(factory, options(1, 1, Duration::ZERO)).unwrap(),
    );

    let held = pool.get_connection().await.unwrap();

    // This waiter can never be satisfied while the single connection is
    // checked out.
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.get_connection().await })
    };
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    pool.close().await;
    assert!(matches!(
        waiter.await.unwrap(),
        Err(ClientError::PoolClosing)
    ));
    assert!(stats.factory_closed.load(Ordering::Acquire));

    // A connection returned after shutdown is closed, not requeued.
    drop(held);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(stats.open_connections.load(Ordering::Acquire), 0);

    // Close is idempotent and later acquisitions fail fast.
    pool.close().await;
    assert!(matches!(
        pool.get_connection().await,
        Err(ClientError::PoolClosing)
    ));
}

#[tokio::test]
async fn pooled_connection_forwards_operations() {
    use ldapkit_client::requests::{SearchRequest, SearchScope};
    use ldapkit_schema::entry::{Dn, Entry};

    let base = Entry::new(Dn::new("dc=example,dc=com"))
        .with_attribute("objectClass", ["top", "dcObject"]);
    let factory = MockConnectionFactory::with_directory(vec![base]);
    let pool =
        CachedConnectionPool::new(factory, options(1, 2, Duration::ZERO)).unwrap();

    let mut connection = pool.get_connection().await.unwrap();
    let entries = connection
        .search(SearchRequest::new(
            "dc=example,dc=com",
            SearchScope::Base,
            "(objectClass=*)",
        ))
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    connection.close().await;
    assert!(connection.is_closed());
    // Operations after close fail with a closed-connection error.
    let result = connection
        .search(SearchRequest::new(
            "dc=example,dc=com",
            SearchScope::Base,
            "(objectClass=*)",
        ))
        .await;
    assert!(matches!(result, Err(ClientError::ConnectionClosed)));
}

#[test]
fn invalid_options_are_rejected() {
    let options = ConnectionPoolOptions {
        core_pool_size: 5,
        max_pool_size: 4,
        idle_timeout: Duration::ZERO,
    };
    assert!(options.validate().is_err());

    let options = ConnectionPoolOptions {
        core_pool_size: 0,
        max_pool_size: 0,
        idle_timeout: Duration::ZERO,
    };
    assert!(options.validate().is_err());
}
