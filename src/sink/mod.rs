//! Remote event sink
//!
//! Write-only capability for persisting critical structured log records to
//! an external document store. Settings resolution decides whether one is
//! available; loggers receive the handle explicitly.

mod credentials;
mod firestore;
mod memory;
mod types;

pub use credentials::SinkCredentials;
pub use firestore::{FirestoreConnector, FirestoreSink, FIRESTORE_API_URL};
pub use memory::MemorySink;
pub use types::{Metadata, SinkError, SinkRecord};

use async_trait::async_trait;
use std::sync::Arc;

/// Trait for remote sink implementations
#[async_trait]
pub trait RemoteSink: Send + Sync {
    /// Persist a single record
    async fn write(&self, record: SinkRecord) -> Result<(), SinkError>;
    /// Short name used in diagnostics
    fn name(&self) -> &str;
}

/// Shared handle to an established sink
pub type SinkHandle = Arc<dyn RemoteSink>;

/// Establishes a sink from parsed credentials
///
/// Implementations may perform network I/O; the resolver bounds the call
/// with a timeout.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    async fn connect(&self, credentials: SinkCredentials) -> Result<SinkHandle, SinkError>;
}
