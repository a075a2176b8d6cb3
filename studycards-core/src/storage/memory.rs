use crate::storage::Storage;
use crate::CoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    writes: RwLock<HashMap<String, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes issued against `key` so far.
    pub fn write_count(&self, key: &str) -> usize {
        self.writes.read().get(key).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Value>, CoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn write(&self, key: &str, value: Value) -> Result<(), CoreError> {
        self.entries.write().insert(key.to_string(), value);
        *self.writes.write().entry(key.to_string()).or_default() += 1;
        Ok(())
    }
}

/// Stands in for a context with no storage behind it: nothing is ever found
/// and every write is refused.
#[derive(Default, Clone, Copy)]
pub struct DetachedStore;

#[async_trait]
impl Storage for DetachedStore {
    async fn read(&self, _key: &str) -> Result<Option<Value>, CoreError> {
        Ok(None)
    }

    async fn write(&self, _key: &str, _value: Value) -> Result<(), CoreError> {
        Err(CoreError::Unavailable("no storage environment"))
    }
}
