//! The connection capability consumed by the pool and load balancer.
//!
//! [`Connection`] is what a transport implementation provides: the LDAP
//! operations, validity reporting, and out-of-band event notification.
//! [`ConnectionFactory`] produces connections; pools and load balancers
//! implement it themselves so the layers compose freely.

use async_trait::async_trait;

use ldapkit_schema::entry::{Dn, Entry};

use crate::error::ClientResult;
use crate::requests::{
    AddRequest, CompareRequest, DeleteRequest, ExtendedRequest, ExtendedResponse, ModifyDnRequest,
    ModifyRequest, SearchRequest,
};

/// Listener notified of out-of-band connection events.
pub trait ConnectionEventListener: Send + Sync {
    /// The connection was closed by the client.
    fn connection_closed(&self) {}

    /// The connection failed unexpectedly.
    fn connection_error(&self, message: &str) {
        let _ = message;
    }
}

/// A single directory connection.
#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug {
    /// Perform a search and collect the matching entries.
    async fn search(&mut self, request: SearchRequest) -> ClientResult<Vec<Entry>>;

    /// Read a single entry by DN, or fail with `EntryNotFound`.
    async fn read_entry(&mut self, dn: &Dn, attributes: &[String]) -> ClientResult<Entry>;

    /// Add an entry.
    async fn add(&mut self, request: AddRequest) -> ClientResult<()>;

    /// Delete an entry.
    async fn delete(&mut self, request: DeleteRequest) -> ClientResult<()>;

    /// Apply attribute modifications to an entry.
    async fn modify(&mut self, request: ModifyRequest) -> ClientResult<()>;

    /// Rename or move an entry.
    async fn modify_dn(&mut self, request: ModifyDnRequest) -> ClientResult<()>;

    /// Compare an attribute value; `true` when the assertion matches.
    async fn compare(&mut self, request: CompareRequest) -> ClientResult<bool>;

    /// Perform a simple bind.
    async fn simple_bind(&mut self, dn: &Dn, password: &str) -> ClientResult<()>;

    /// Perform an extended operation.
    async fn extended(&mut self, request: ExtendedRequest) -> ClientResult<ExtendedResponse>;

    /// True while the connection is believed usable.
    fn is_valid(&self) -> bool;

    /// True once the connection has been closed.
    fn is_closed(&self) -> bool;

    /// Register a listener for out-of-band close and error events.
    fn add_event_listener(&mut self, listener: Box<dyn ConnectionEventListener>);

    /// Close the connection, releasing its resources.
    async fn close(&mut self);
}

/// Produces [`Connection`]s.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Obtain a connection. May block (asynchronously) while one is
    /// established or becomes available.
    async fn get_connection(&self) -> ClientResult<Box<dyn Connection>>;

    /// Release resources held by the factory. Idempotent.
    async fn close(&self);
}
