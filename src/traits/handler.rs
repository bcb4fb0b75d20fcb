use async_trait::async_trait;

use crate::record::Value;

/// Application callback run after an output record accepts a new value.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn on_update(&self, record: &str, value: Value) -> anyhow::Result<()>;
}
