//! Credential file parsing for the remote sink

use super::SinkError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncReadExt;

const DEFAULT_COLLECTION: &str = "trading_logs";

/// Largest credential file that will be read
pub const MAX_CREDENTIALS_BYTES: u64 = 64 * 1024;

/// On-disk layout; a Firebase service-account file is accepted as-is
#[derive(Deserialize)]
struct CredentialFile {
    project_id: String,
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    collection: Option<String>,
}

/// Parsed remote sink credentials
pub struct SinkCredentials {
    pub project_id: String,
    pub client_email: Option<String>,
    /// Overrides the documents endpoint (e.g. an emulator)
    pub endpoint: Option<String>,
    /// Collection records are written to
    pub collection: String,
    access_token: Option<SecretString>,
}

impl SinkCredentials {
    /// Read and parse a credential file
    ///
    /// Only regular files up to [`MAX_CREDENTIALS_BYTES`] are read; pipes,
    /// devices and oversized files are rejected without reading them.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let unreadable = |source| SinkError::CredentialsUnreadable {
            path: path.to_path_buf(),
            source,
        };
        let invalid = |reason: String| SinkError::InvalidCredentials {
            path: path.to_path_buf(),
            reason,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(invalid("not a regular file".to_string()));
        }
        if metadata.len() > MAX_CREDENTIALS_BYTES {
            return Err(invalid(format!(
                "larger than {} bytes",
                MAX_CREDENTIALS_BYTES
            )));
        }

        // The file may grow after the size check
        let file = tokio::fs::File::open(path).await.map_err(unreadable)?;
        let mut content = String::new();
        file.take(MAX_CREDENTIALS_BYTES + 1)
            .read_to_string(&mut content)
            .await
            .map_err(unreadable)?;
        if content.len() as u64 > MAX_CREDENTIALS_BYTES {
            return Err(invalid(format!(
                "larger than {} bytes",
                MAX_CREDENTIALS_BYTES
            )));
        }

        Self::parse(&content).map_err(invalid)
    }

    /// Parse credential JSON
    pub fn parse(content: &str) -> Result<Self, String> {
        let file: CredentialFile = serde_json::from_str(content).map_err(|e| e.to_string())?;

        if file.project_id.trim().is_empty() {
            return Err("project_id is empty".to_string());
        }

        Ok(Self {
            project_id: file.project_id.trim().to_string(),
            client_email: file.client_email,
            endpoint: file.endpoint.filter(|e| !e.trim().is_empty()),
            collection: file
                .collection
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            access_token: file
                .access_token
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        })
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.expose_secret())
    }
}

impl fmt::Debug for SinkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("endpoint", &self.endpoint)
            .field("collection", &self.collection)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
