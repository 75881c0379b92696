use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

/// The credential pair for the two external providers. Opaque strings,
/// validated only for non-emptiness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub supadata_key: String,
    pub openai_key: String,
}

impl Credentials {
    /// Credentials taken from the process environment
    pub fn from_env() -> Self {
        Self {
            supadata_key: std::env::var("SUPADATA_API_KEY").unwrap_or_default(),
            openai_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.supadata_key.trim().is_empty() && !self.openai_key.trim().is_empty()
    }

    /// Fill empty fields from another pair (environment over saved file, etc.)
    pub fn or(mut self, fallback: Credentials) -> Self {
        if self.supadata_key.trim().is_empty() {
            self.supadata_key = fallback.supadata_key;
        }
        if self.openai_key.trim().is_empty() {
            self.openai_key = fallback.openai_key;
        }
        self
    }
}

/// Storage capability for the credential pair, swappable per backend
pub trait CredentialStore {
    /// Missing or unreadable storage loads as empty credentials
    fn load(&self) -> Credentials;
    fn save(&self, credentials: &Credentials) -> Result<()>;
}

/// Plain-JSON file under the user config dir, overwritten wholesale on save
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("ytqa")
            .join("credentials.json")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

impl CredentialStore for JsonFileStore {
    fn load(&self) -> Credentials {
        let Ok(data) = std::fs::read_to_string(&self.path) else {
            debug!("No credentials file at {}", self.path.display());
            return Credentials::default();
        };
        serde_json::from_str(&data).unwrap_or_default()
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, data)?;
        debug!("Saved credentials to {}", self.path.display());
        Ok(())
    }
}

/// In-memory backend, for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    inner: std::sync::Mutex<Credentials>,
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Credentials {
        self.inner.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Ok(mut guard) = self.inner.lock() {
            *guard = credentials.clone();
        }
        Ok(())
    }
}
