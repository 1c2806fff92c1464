//! # ldapkit-client
//!
//! Connection management for the ldapkit LDAP SDK: pooling, failover
//! load balancing and schema discovery over an abstract connection
//! capability.
//!
//! ## Architecture
//!
//! Everything composes through two traits:
//!
//! - [`Connection`] - a single directory connection (search, add,
//!   modify, bind, ...) with validity reporting
//! - [`ConnectionFactory`] - produces connections
//!
//! [`CachedConnectionPool`] and [`LoadBalancer`] both consume factories
//! and implement [`ConnectionFactory`] themselves, so a pool can sit on
//! top of a load balancer which fans out over per-server factories:
//!
//! ```ignore
//! use ldapkit_client::prelude::*;
//!
//! let servers: Vec<Box<dyn ConnectionFactory>> = vec![
//!     Box::new(NativeConnectionFactory::new(LdapConfig::new("ldap1.example.com"))?),
//!     Box::new(NativeConnectionFactory::new(LdapConfig::new("ldap2.example.com"))?),
//! ];
//! let balancer = LoadBalancer::new(
//!     servers,
//!     RoundRobinStrategy::new(),
//!     LoadBalancerOptions::default(),
//! )?;
//! let pool = CachedConnectionPool::new(balancer, ConnectionPoolOptions::default())?;
//!
//! let mut connection = pool.get_connection().await?;
//! let schema = read_schema(&mut connection, &Dn::new("cn=schema")).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`connection`] - the [`Connection`]/[`ConnectionFactory`] traits
//! - [`pool`] - [`CachedConnectionPool`]
//! - [`balancer`] - [`LoadBalancer`] and its strategies
//! - [`discovery`] - reading server-published schema
//! - [`native`] - the `ldap3`-backed transport
//! - [`config`] - connection configuration
//! - [`error`] - error types with transient/permanent classification
//!
//! [`Connection`]: connection::Connection
//! [`ConnectionFactory`]: connection::ConnectionFactory
//! [`CachedConnectionPool`]: pool::CachedConnectionPool
//! [`LoadBalancer`]: balancer::LoadBalancer

pub mod balancer;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod error;
pub mod native;
pub mod pool;
pub mod requests;

/// Prelude module for convenient imports.
///
/// ```
/// use ldapkit_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::balancer::{
        BalancerEventListener, FailoverStrategy, LoadBalancer, LoadBalancerOptions,
        LoadBalancingStrategy, RoundRobinStrategy,
    };
    pub use crate::config::LdapConfig;
    pub use crate::connection::{Connection, ConnectionEventListener, ConnectionFactory};
    pub use crate::discovery::{read_schema, read_schema_for_entry};
    pub use crate::error::{ClientError, ClientResult};
    pub use crate::native::{NativeConnection, NativeConnectionFactory};
    pub use crate::pool::{CachedConnectionPool, ConnectionPoolOptions, PooledConnection};
    pub use crate::requests::{
        AddRequest, CompareRequest, DeleteRequest, ExtendedRequest, ExtendedResponse,
        Modification, ModificationKind, ModifyDnRequest, ModifyRequest, SearchRequest,
        SearchScope,
    };
    pub use ldapkit_schema::entry::{Dn, Entry};
}

// Re-export async_trait for Connection implementors.
pub use async_trait::async_trait;

pub use crate::error::{ClientError, ClientResult};
