//! Operational helpers: logging setup and upload history.

use std::sync::Arc;

use moasnap_types::{config::OpsConfig, snap::UploadRecord, Result, SnapError};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| SnapError::Ops(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| SnapError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// In-memory record of finished upload attempts.
#[derive(Clone, Default)]
pub struct UploadHistory {
    records: Arc<Mutex<Vec<UploadRecord>>>,
}

impl UploadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_attempt(&self, record: UploadRecord) {
        debug!(attempt = %record.attempt_id, "recording upload attempt");
        self.records.lock().await.push(record);
    }

    pub async fn snapshot(&self) -> Vec<UploadRecord> {
        self.records.lock().await.clone()
    }
}
