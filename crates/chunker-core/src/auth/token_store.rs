use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use crate::config::{Config, TokenStoreKind};

/// Token file name in the data directory
const TOKEN_FILE: &str = "token";

/// Keychain service name
const SERVICE_NAME: &str = "chunker";

/// Keychain entry holding the token
const KEYRING_USER: &str = "token";

/// Holder of the single bearer token.
///
/// A store has exactly one logical key. Absence of a value means logged
/// out; `set_token` overwrites, `clear_token` on an empty store is a no-op.
/// Stores do not expire tokens.
pub trait TokenStore: Send + Sync {
    fn get_token(&self) -> Result<Option<String>>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear_token(&self) -> Result<()>;
}

/// Build the store selected by the configuration.
pub fn open_store(config: &Config) -> Result<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match config.token_store {
        TokenStoreKind::File => Arc::new(FileTokenStore::new(config.data_dir()?)),
        TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new()?),
        TokenStoreKind::Memory => Arc::new(MemoryTokenStore::default()),
    };
    debug!(kind = ?config.token_store, "Token store opened");
    Ok(store)
}

/// Stored values are raw strings; surrounding whitespace is not part of the
/// token and a blank value counts as no token at all.
fn normalize(raw: &str) -> Option<String> {
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// File
// ============================================================================

/// Durable store: one file containing the raw token string.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token file")?;
        Ok(normalize(&contents))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create data directory")?;
        let path = self.token_path();
        let mut file = open_private(&path).context("Failed to open token file")?;
        file.write_all(token.as_bytes())
            .context("Failed to write token file")?;
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

/// Open the token file for writing, readable by the owner only.
#[cfg(unix)]
fn open_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies when the file is created
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// ============================================================================
// Keyring
// ============================================================================

/// Durable store backed by the OS keychain.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self> {
        Self::with_service(SERVICE_NAME)
    }

    /// Store under a different keychain service name.
    pub fn with_service(service: &str) -> Result<Self> {
        let entry = Entry::new(service, KEYRING_USER).context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn get_token(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(normalize(&token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set_token(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear_token(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// In-process store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Result<Option<String>> {
        let guard = self
            .token
            .read()
            .map_err(|_| anyhow::anyhow!("Token lock poisoned"))?;
        Ok(guard.as_deref().and_then(normalize))
    }

    fn set_token(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Token lock poisoned"))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| anyhow::anyhow!("Token lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
