use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Result;

/// Shared data passed between the tasks of one pipeline run
#[derive(Clone, Debug)]
pub struct Context {
    data: Arc<DashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: impl serde::Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.data.insert(key.into(), value);
        Ok(())
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_sync(key)
    }

    /// Synchronous read, used by edge conditions which cannot await.
    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get() {
        let context = Context::new();
        context.set("score", 0.25_f64).await.unwrap();

        assert_eq!(context.get::<f64>("score").await, Some(0.25));
        assert!(context.contains("score"));
        // wrong type reads as absent rather than panicking
        assert_eq!(context.get::<Vec<String>>("score").await, None);
        assert!(!context.contains("claim_id"));
    }

    #[tokio::test]
    async fn clones_share_data() {
        let context = Context::new();
        let other = context.clone();
        other.set("claim_id", "clm_1").await.unwrap();
        assert_eq!(context.get_sync::<String>("claim_id").as_deref(), Some("clm_1"));
    }
}
