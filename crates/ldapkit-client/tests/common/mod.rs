//! In-memory connection and factory mocks shared by the integration
//! tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use ldapkit_client::async_trait;
use ldapkit_client::connection::{Connection, ConnectionEventListener, ConnectionFactory};
use ldapkit_client::error::{ClientError, ClientResult};
use ldapkit_client::requests::{
    AddRequest, CompareRequest, DeleteRequest, ExtendedRequest, ExtendedResponse, ModifyDnRequest,
    ModifyRequest, SearchRequest,
};
use ldapkit_schema::entry::{Dn, Entry};

/// Counters shared between a factory and the connections it produced.
#[derive(Default)]
pub struct FactoryStats {
    pub connect_attempts: AtomicUsize,
    pub open_connections: AtomicUsize,
    pub factory_closed: AtomicBool,
}

pub struct MockConnection {
    stats: Arc<FactoryStats>,
    valid: Arc<AtomicBool>,
    closed: bool,
    directory: Arc<Vec<Entry>>,
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection")
            .field("closed", &self.closed)
            .finish()
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn search(&mut self, request: SearchRequest) -> ClientResult<Vec<Entry>> {
        Ok(self
            .directory
            .iter()
            .filter(|entry| entry.name() == &request.base)
            .cloned()
            .collect())
    }

    async fn read_entry(&mut self, dn: &Dn, _attributes: &[String]) -> ClientResult<Entry> {
        self.directory
            .iter()
            .find(|entry| entry.name() == dn)
            .cloned()
            .ok_or_else(|| ClientError::entry_not_found(dn.to_string()))
    }

    async fn add(&mut self, _request: AddRequest) -> ClientResult<()> {
        Ok(())
    }

    async fn delete(&mut self, _request: DeleteRequest) -> ClientResult<()> {
        Ok(())
    }

    async fn modify(&mut self, _request: ModifyRequest) -> ClientResult<()> {
        Ok(())
    }

    async fn modify_dn(&mut self, _request: ModifyDnRequest) -> ClientResult<()> {
        Ok(())
    }

    async fn compare(&mut self, _request: CompareRequest) -> ClientResult<bool> {
        Ok(false)
    }

    async fn simple_bind(&mut self, _dn: &Dn, _password: &str) -> ClientResult<()> {
        Ok(())
    }

    async fn extended(&mut self, _request: ExtendedRequest) -> ClientResult<ExtendedResponse> {
        Ok(ExtendedResponse::default())
    }

    fn is_valid(&self) -> bool {
        !self.closed && self.valid.load(Ordering::Acquire)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn add_event_listener(&mut self, _listener: Box<dyn ConnectionEventListener>) {}

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.open_connections.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// A factory handing out in-memory connections. Clones share the same
/// counters and toggles, so tests can keep a handle while the factory
/// itself is boxed away.
#[derive(Clone)]
pub struct MockConnectionFactory {
    pub stats: Arc<FactoryStats>,
    /// While set, every connect attempt fails.
    pub fail: Arc<AtomicBool>,
    /// Validity flag shared by produced connections, so tests can
    /// invalidate checked-out connections.
    pub connection_valid: Arc<AtomicBool>,
    directory: Arc<Vec<Entry>>,
}

impl MockConnectionFactory {
    pub fn new() -> Self {
        Self::with_directory(Vec::new())
    }

    pub fn with_directory(directory: Vec<Entry>) -> Self {
        MockConnectionFactory {
            stats: Arc::new(FactoryStats::default()),
            fail: Arc::new(AtomicBool::new(false)),
            connection_valid: Arc::new(AtomicBool::new(true)),
            directory: Arc::new(directory),
        }
    }

    pub fn failing() -> Self {
        let factory = Self::new();
        factory.fail.store(true, Ordering::Release);
        factory
    }

    pub fn open_connections(&self) -> usize {
        self.stats.open_connections.load(Ordering::Acquire)
    }

    pub fn connect_attempts(&self) -> usize {
        self.stats.connect_attempts.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ConnectionFactory for MockConnectionFactory {
    async fn get_connection(&self) -> ClientResult<Box<dyn Connection>> {
        self.stats.connect_attempts.fetch_add(1, Ordering::AcqRel);
        if self.fail.load(Ordering::Acquire) {
            return Err(ClientError::connection_failed("mock server is down"));
        }
        self.stats.open_connections.fetch_add(1, Ordering::AcqRel);
        Ok(Box::new(MockConnection {
            stats: self.stats.clone(),
            valid: self.connection_valid.clone(),
            closed: false,
            directory: self.directory.clone(),
        }))
    }

    async fn close(&self) {
        self.stats.factory_closed.store(true, Ordering::Release);
    }
}
