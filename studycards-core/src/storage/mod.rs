use crate::CoreError;
use async_trait::async_trait;
use serde_json::Value;

pub mod memory;

/// Key holding the whole deck collection.
pub const DECKS_KEY: &str = "study-cards-decks";
/// Key holding the progress map, nested by user id then deck id.
pub const PROGRESS_KEY: &str = "study-cards-progress";

/// Named JSON blobs. Writes replace the previous value whole; there are no
/// transactions across keys.
#[async_trait]
pub trait Storage: Send + Sync {
    /// `None` when the key was never written or no storage environment is live.
    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError>;

    async fn write(&self, key: &str, value: Value) -> Result<(), CoreError>;
}
