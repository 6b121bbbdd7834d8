//! Per-user credential storage.
//!
//! Holds the provider API key and the GitHub token in a small JSON file
//! under the user's config directory. Every write publishes the new
//! snapshot on a [`watch`] channel so open sessions pick up changes
//! without re-reading the file. Last writer wins.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

/// Errors from the credential store.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("could not determine the user config directory")]
    NoConfigDir,

    #[error("failed to read credentials {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse credentials {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write credentials {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A snapshot of the stored secrets. Absent means "not configured".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "provider_api_key", default, skip_serializing_if = "Option::is_none")]
    pub provider_key: Option<String>,
    #[serde(rename = "github_pat", default, skip_serializing_if = "Option::is_none")]
    pub repo_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("provider_key", &self.provider_key.as_ref().map(|_| "[REDACTED]"))
            .field("repo_token", &self.repo_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// File-backed credential store with change notification.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    tx: watch::Sender<Credentials>,
}

impl CredentialStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();
        let initial = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Credentials::default(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| CredentialError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Credentials::default(),
            Err(source) => {
                return Err(CredentialError::Read {
                    path: path.clone(),
                    source,
                });
            }
        };
        let (tx, _rx) = watch::channel(initial);
        Ok(Self { path, tx })
    }

    /// Open the store at `~/.config/revu/credentials.json`.
    pub fn open_default() -> Result<Self, CredentialError> {
        Self::open(Self::default_path().ok_or(CredentialError::NoConfigDir)?)
    }

    /// Default store location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| {
            d.join(crate::constants::CONFIG_DIR)
                .join(crate::constants::CREDENTIALS_FILENAME)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot.
    pub fn get(&self) -> Credentials {
        self.tx.borrow().clone()
    }

    /// Store or remove the provider API key. Blank values remove it.
    pub fn set_provider_key(&self, key: Option<&str>) -> Result<(), CredentialError> {
        let key = normalize(key);
        self.update(|c| c.provider_key = key)
    }

    /// Store or remove the GitHub token. Blank values remove it.
    pub fn set_repo_token(&self, token: Option<&str>) -> Result<(), CredentialError> {
        let token = normalize(token);
        self.update(|c| c.repo_token = token)
    }

    /// Remove both secrets.
    pub fn clear(&self) -> Result<(), CredentialError> {
        self.update(|c| *c = Credentials::default())
    }

    /// Receive every snapshot written after this call.
    pub fn subscribe(&self) -> watch::Receiver<Credentials> {
        self.tx.subscribe()
    }

    fn update(&self, apply: impl FnOnce(&mut Credentials)) -> Result<(), CredentialError> {
        let mut next = self.get();
        apply(&mut next);
        self.persist(&next)?;
        debug!(path = %self.path.display(), "credentials updated");
        self.tx.send_replace(next);
        Ok(())
    }

    /// Write via a temp file and rename so readers never see a partial file.
    fn persist(&self, creds: &Credentials) -> Result<(), CredentialError> {
        let write_err = |source| CredentialError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = serde_json::to_string_pretty(creds).map_err(|e| write_err(e.into()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(write_err)?;
        restrict_permissions(&tmp).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
