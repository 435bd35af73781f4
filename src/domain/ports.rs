use crate::utils::error::Result;
use async_trait::async_trait;

/// Message transport the bridge talks through. The real implementation is
/// an MQTT client; tests use an in-memory recording bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
    async fn subscribe(&self, filter: &str) -> Result<()>;
}
