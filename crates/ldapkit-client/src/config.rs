//! Connection configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for a directory server connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    /// Server hostname or IP address.
    pub host: String,

    /// Server port (389 for LDAP, 636 for LDAPS).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use SSL/TLS (LDAPS).
    #[serde(default)]
    pub use_ssl: bool,

    /// Upgrade a plain connection with STARTTLS.
    #[serde(default)]
    pub use_starttls: bool,

    /// Bind DN for authentication; anonymous bind when empty.
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_password: Option<String>,

    /// Connection establishment timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl std::fmt::Debug for LdapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("use_starttls", &self.use_starttls)
            .field("bind_dn", &self.bind_dn)
            .field(
                "bind_password",
                &self.bind_password.as_ref().map(|_| "***REDACTED***"),
            )
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

fn default_ldap_port() -> u16 {
    389
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl LdapConfig {
    /// Create a configuration for the given host.
    pub fn new(host: impl Into<String>) -> Self {
        LdapConfig {
            host: host.into(),
            port: default_ldap_port(),
            use_ssl: false,
            use_starttls: false,
            bind_dn: String::new(),
            bind_password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    /// Set the bind DN.
    #[must_use]
    pub fn with_bind_dn(mut self, bind_dn: impl Into<String>) -> Self {
        self.bind_dn = bind_dn.into();
        self
    }

    /// Set the bind password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.bind_password = Some(password.into());
        self
    }

    /// Enable SSL (LDAPS) and switch to the LDAPS port.
    #[must_use]
    pub fn with_ssl(mut self) -> Self {
        self.use_ssl = true;
        self.port = 636;
        self
    }

    /// Enable STARTTLS.
    #[must_use]
    pub fn with_starttls(mut self) -> Self {
        self.use_starttls = true;
        self
    }

    /// Set a non-default port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The LDAP URL for this configuration.
    #[must_use]
    pub fn url(&self) -> String {
        let scheme = if self.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if self.host.is_empty() {
            return Err(ClientError::invalid_configuration("host must not be empty"));
        }
        if self.use_ssl && self.use_starttls {
            return Err(ClientError::invalid_configuration(
                "use_ssl and use_starttls are mutually exclusive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_url() {
        let config = LdapConfig::new("ldap.example.com");
        assert_eq!(config.port, 389);
        assert_eq!(config.url(), "ldap://ldap.example.com:389");

        let config = LdapConfig::new("ldap.example.com").with_ssl();
        assert_eq!(config.url(), "ldaps://ldap.example.com:636");
    }

    #[test]
    fn test_validation() {
        assert!(LdapConfig::new("").validate().is_err());
        assert!(LdapConfig::new("h").with_ssl().with_starttls().validate().is_err());
        assert!(LdapConfig::new("h").with_bind_dn("cn=admin").validate().is_ok());
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let config = LdapConfig::new("h").with_password("secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn test_deserialization_defaults() {
        let config: LdapConfig =
            serde_json::from_str(r#"{"host": "ldap.example.com"}"#).unwrap();
        assert_eq!(config.port, 389);
        assert!(!config.use_ssl);
        assert_eq!(config.connect_timeout_secs, 30);
    }
}
