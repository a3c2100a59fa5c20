//! Archiver configuration
//!
//! # Security Note
//!
//! Credential fields use [`SensitiveString`] and custom `Debug`/`Serialize`
//! impls so secrets cannot leak into logs or serialized config dumps.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Wrapper for sensitive configuration values.
///
/// Prevents accidental logging of secrets while allowing access when needed.
#[derive(Clone)]
pub struct SensitiveString(SecretString);

impl SensitiveString {
    /// Create a new sensitive string
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    /// Expose the secret value
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for SensitiveString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SensitiveString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for SensitiveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for SensitiveString {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str("***REDACTED***")
    }
}

impl<'de> Deserialize<'de> for SensitiveString {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// Connection settings for the replicated database. Consumed by the external
/// change-stream source; the pipeline itself never dials the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    /// Default: 3306
    pub port: u16,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SensitiveString>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
        }
    }
}

/// Archiver run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiverConfig {
    /// Database connection settings, handed to the change-stream source
    pub database: DatabaseConfig,
    /// Replication source identity; must be unique among replicas
    pub server_id: u32,
    /// Resume from the persisted checkpoint instead of the stream head
    pub resume_from_checkpoint: bool,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            server_id: 1001,
            resume_from_checkpoint: false,
        }
    }
}

impl ArchiverConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig {
                host: host.into(),
                user: user.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<SensitiveString>) -> Self {
        self.database.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.database.port = port;
        self
    }

    pub fn with_server_id(mut self, server_id: u32) -> Self {
        self.server_id = server_id;
        self
    }

    pub fn with_resume(mut self, enabled: bool) -> Self {
        self.resume_from_checkpoint = enabled;
        self
    }
}
