//! The `ldap3`-backed transport: a concrete [`Connection`] and
//! [`ConnectionFactory`] over a real directory server.

use async_trait::async_trait;
use ldap3::exop::Exop;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use tracing::{debug, info, warn};

use ldapkit_schema::entry::{Dn, Entry};

use crate::config::LdapConfig;
use crate::connection::{Connection, ConnectionEventListener, ConnectionFactory};
use crate::error::{ClientError, ClientResult};
use crate::requests::{
    AddRequest, CompareRequest, DeleteRequest, ExtendedRequest, ExtendedResponse, ModifyDnRequest,
    ModificationKind, ModifyRequest, SearchRequest, SearchScope,
};

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::SingleLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn to_entry(search_entry: SearchEntry) -> Entry {
    let mut entry = Entry::new(Dn::new(search_entry.dn));
    for (name, values) in search_entry.attrs {
        entry.add_attribute(name, values);
    }
    entry
}

/// A connection over an `ldap3` session.
pub struct NativeConnection {
    ldap: Ldap,
    closed: bool,
    valid: bool,
    listeners: Vec<Box<dyn ConnectionEventListener>>,
}

impl std::fmt::Debug for NativeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeConnection")
            .field("closed", &self.closed)
            .field("valid", &self.valid)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl NativeConnection {
    fn record_failure(&mut self, message: &str) {
        self.valid = false;
        for listener in &self.listeners {
            listener.connection_error(message);
        }
    }

    fn operation_error(
        &mut self,
        context: &str,
        error: ldap3::LdapError,
    ) -> ClientError {
        let message = format!("{context}: {error}");
        self.record_failure(&message);
        ClientError::operation_failed_with_source(context.to_string(), error)
    }
}

#[async_trait]
impl Connection for NativeConnection {
    async fn search(&mut self, request: SearchRequest) -> ClientResult<Vec<Entry>> {
        let attributes: Vec<&str> = request.attributes.iter().map(String::as_str).collect();
        let result = self
            .ldap
            .search(
                request.base.as_str(),
                to_scope(request.scope),
                &request.filter,
                attributes,
            )
            .await
            .map_err(|e| self.operation_error("search failed", e))?;
        let (entries, _res) = result
            .success()
            .map_err(|e| ClientError::operation_failed_with_source("search failed", e))?;
        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(to_entry)
            .collect())
    }

    async fn read_entry(&mut self, dn: &Dn, attributes: &[String]) -> ClientResult<Entry> {
        let request = SearchRequest::new(dn.clone(), SearchScope::Base, "(objectClass=*)")
            .with_attributes(attributes.iter().cloned());
        let mut entries = self.search(request).await?;
        entries
            .pop()
            .ok_or_else(|| ClientError::entry_not_found(dn.to_string()))
    }

    async fn add(&mut self, request: AddRequest) -> ClientResult<()> {
        let attributes: Vec<(String, std::collections::HashSet<String>)> = request
            .attributes
            .into_iter()
            .map(|(name, values)| (name, values.into_iter().collect()))
            .collect();
        let result = self
            .ldap
            .add(request.dn.as_str(), attributes)
            .await
            .map_err(|e| self.operation_error("add failed", e))?;
        result
            .success()
            .map_err(|e| ClientError::operation_failed_with_source("add failed", e))?;
        Ok(())
    }

    async fn delete(&mut self, request: DeleteRequest) -> ClientResult<()> {
        let result = self
            .ldap
            .delete(request.dn.as_str())
            .await
            .map_err(|e| self.operation_error("delete failed", e))?;
        result
            .success()
            .map_err(|e| ClientError::operation_failed_with_source("delete failed", e))?;
        Ok(())
    }

    async fn modify(&mut self, request: ModifyRequest) -> ClientResult<()> {
        let mods: Vec<Mod<String>> = request
            .modifications
            .into_iter()
            .map(|modification| {
                let values = modification.values.into_iter().collect();
                match modification.kind {
                    ModificationKind::Add => Mod::Add(modification.attribute, values),
                    ModificationKind::Delete => Mod::Delete(modification.attribute, values),
                    ModificationKind::Replace => Mod::Replace(modification.attribute, values),
                }
            })
            .collect();
        let result = self
            .ldap
            .modify(request.dn.as_str(), mods)
            .await
            .map_err(|e| self.operation_error("modify failed", e))?;
        result
            .success()
            .map_err(|e| ClientError::operation_failed_with_source("modify failed", e))?;
        Ok(())
    }

    async fn modify_dn(&mut self, request: ModifyDnRequest) -> ClientResult<()> {
        let result = self
            .ldap
            .modifydn(
                request.dn.as_str(),
                &request.new_rdn,
                request.delete_old_rdn,
                request.new_superior.as_ref().map(Dn::as_str),
            )
            .await
            .map_err(|e| self.operation_error("modify DN failed", e))?;
        result
            .success()
            .map_err(|e| ClientError::operation_failed_with_source("modify DN failed", e))?;
        Ok(())
    }

    async fn compare(&mut self, request: CompareRequest) -> ClientResult<bool> {
        let result = self
            .ldap
            .compare(
                request.dn.as_str(),
                &request.attribute,
                request.value.as_str(),
            )
            .await
            .map_err(|e| self.operation_error("compare failed", e))?;
        result
            .equal()
            .map_err(|e| ClientError::operation_failed_with_source("compare failed", e))
    }

    async fn simple_bind(&mut self, dn: &Dn, password: &str) -> ClientResult<()> {
        let result = self
            .ldap
            .simple_bind(dn.as_str(), password)
            .await
            .map_err(|e| self.operation_error("bind failed", e))?;
        if result.rc == 49 {
            return Err(ClientError::AuthenticationFailed);
        }
        if result.rc != 0 {
            return Err(ClientError::operation_failed(format!(
                "bind failed with result code {}: {}",
                result.rc, result.text
            )));
        }
        Ok(())
    }

    async fn extended(&mut self, request: ExtendedRequest) -> ClientResult<ExtendedResponse> {
        let exop = Exop {
            name: Some(request.oid),
            val: request.value,
        };
        let result = self
            .ldap
            .extended(exop)
            .await
            .map_err(|e| self.operation_error("extended operation failed", e))?;
        let (exop, _res) = result.success().map_err(|e| {
            ClientError::operation_failed_with_source("extended operation failed", e)
        })?;
        Ok(ExtendedResponse {
            oid: exop.name,
            value: exop.val,
        })
    }

    fn is_valid(&self) -> bool {
        !self.closed && self.valid
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn add_event_listener(&mut self, listener: Box<dyn ConnectionEventListener>) {
        self.listeners.push(listener);
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(error) = self.ldap.unbind().await {
            warn!(error = %error, "error during LDAP unbind");
        }
        for listener in &self.listeners {
            listener.connection_closed();
        }
    }
}

/// Connection factory establishing `ldap3` sessions from an
/// [`LdapConfig`].
pub struct NativeConnectionFactory {
    config: LdapConfig,
}

impl NativeConnectionFactory {
    /// Create a factory for the given configuration.
    pub fn new(config: LdapConfig) -> ClientResult<Self> {
        config.validate()?;
        Ok(NativeConnectionFactory { config })
    }
}

#[async_trait]
impl ConnectionFactory for NativeConnectionFactory {
    async fn get_connection(&self) -> ClientResult<Box<dyn Connection>> {
        let url = self.config.url();
        debug!(url = %url, "connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connect_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ClientError::connection_failed_with_source(
                    format!("failed to connect to LDAP server at {url}"),
                    e,
                )
            })?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(error) = conn.drive().await {
                warn!(error = %error, "LDAP connection driver error");
            }
        });

        if !self.config.bind_dn.is_empty() {
            let password = self.config.bind_password.as_deref().unwrap_or("");
            let result = ldap
                .simple_bind(&self.config.bind_dn, password)
                .await
                .map_err(|e| {
                    ClientError::connection_failed_with_source(
                        format!("LDAP bind failed for {}", self.config.bind_dn),
                        e,
                    )
                })?;
            if result.rc == 49 {
                return Err(ClientError::AuthenticationFailed);
            }
            if result.rc != 0 {
                return Err(ClientError::connection_failed(format!(
                    "LDAP bind failed with result code {}: {}",
                    result.rc, result.text
                )));
            }
        }

        info!(host = %self.config.host, "LDAP connection established");
        Ok(Box::new(NativeConnection {
            ldap,
            closed: false,
            valid: true,
            listeners: Vec::new(),
        }))
    }

    async fn close(&self) {}
}
