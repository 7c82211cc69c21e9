//! File-backed session credential storage.
//!
//! Credentials live in a single folder that acts as the storage key. The folder is the only source
//! of truth for whether the bot is logged in: deleting it forces a fresh login.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, instrument, trace};

use crate::Error;
use crate::consts::CREDENTIALS_FILE_NAME;

/// Opaque session credentials, owned by the external client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Credentials(pub Map<String, Value>);

impl Credentials {
    /// Whether no credentials have been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the string stored under `key`, if any.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Stores `value` under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }
}

/// Loaded credentials together with the callback that persists updates.
#[derive(Debug)]
pub struct AuthState {
    /// The credentials as they were on disk when loaded.
    pub credentials: Credentials,
    /// Persists credential updates back to the same folder.
    pub saver: CredentialSaver,
}

/// Writes credentials to the auth folder.
#[derive(Clone, Debug)]
pub struct CredentialSaver {
    folder: PathBuf,
}

impl CredentialSaver {
    /// The folder this saver writes to.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Replaces the stored credentials with `credentials`.
    ///
    /// The file is written next to its final location and renamed into place, so a crash never
    /// leaves half-written credentials behind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] if serialization fails and [`Error::AuthIo`] if the file
    /// cannot be written.
    #[instrument(skip_all, fields(folder = %self.folder.display()))]
    pub async fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        let path = self.folder.join(CREDENTIALS_FILE_NAME);
        let tmp_path = self.folder.join(format!("{CREDENTIALS_FILE_NAME}.tmp"));
        let data = serde_json::to_vec_pretty(credentials).map_err(Error::Credentials)?;

        fs::write(&tmp_path, data)
            .await
            .map_err(|source| auth_io(&tmp_path, source))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| auth_io(&path, source))?;

        trace!(num_keys = credentials.0.len(), "saved credentials");

        Ok(())
    }
}

/// Loads the credentials stored in `folder`, creating the folder if it doesn't exist.
///
/// A missing credentials file yields empty credentials.
///
/// # Errors
///
/// Returns [`Error::AuthIo`] if the folder or file cannot be accessed and
/// [`Error::Credentials`] if the stored credentials are not valid JSON.
#[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
pub async fn load(folder: impl AsRef<Path>) -> Result<AuthState, Error> {
    let folder = folder.as_ref().to_path_buf();

    fs::create_dir_all(&folder)
        .await
        .map_err(|source| auth_io(&folder, source))?;

    let path = folder.join(CREDENTIALS_FILE_NAME);
    let credentials = match fs::read(&path).await {
        Ok(data) => serde_json::from_slice(&data).map_err(Error::Credentials)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!("no stored credentials, starting a new session");

            Credentials::default()
        }
        Err(source) => return Err(auth_io(&path, source)),
    };

    Ok(AuthState {
        credentials,
        saver: CredentialSaver { folder },
    })
}

/// Removes `folder` and everything stored in it.
///
/// Returns `true` if there was anything to remove.
///
/// # Errors
///
/// Returns [`Error::AuthIo`] if the folder exists but cannot be removed.
pub async fn clear(folder: impl AsRef<Path>) -> Result<bool, Error> {
    let folder = folder.as_ref();

    match fs::remove_dir_all(folder).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(auth_io(folder, source)),
    }
}

fn auth_io(path: &Path, source: io::Error) -> Error {
    Error::AuthIo {
        path: path.to_path_buf(),
        source,
    }
}
