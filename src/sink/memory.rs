//! In-process sink that keeps records in memory

use super::{RemoteSink, SinkError, SinkRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Sink that stores records in memory, for dry runs and tests
#[derive(Default)]
pub struct MemorySink {
    records: Arc<RwLock<Vec<SinkRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record written so far
    pub async fn records(&self) -> Vec<SinkRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RemoteSink for MemorySink {
    async fn write(&self, record: SinkRecord) -> Result<(), SinkError> {
        self.records.write().await.push(record);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
