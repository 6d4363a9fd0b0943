//! Storage adapter: key-value operations as ready-to-send responses.
//!
//! Backend failures never escape this layer as errors; they come back as
//! `ok:false` responses with the failure description in `error`.

use std::sync::Arc;

use crate::platform::KeyValueStore;
use crate::protocol::{ReqId, Response};

#[derive(Clone)]
pub struct StorageAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl StorageAdapter {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, key: &str, req_id: Option<ReqId>) -> Response {
        match self.store.get(key).await {
            Ok(value) => Response::success(req_id).with_key(key).with_value(value),
            Err(err) => {
                tracing::warn!(
                    event = "ud.bridge.storage.get_failed",
                    key,
                    error = %err,
                    "storage get failed"
                );
                Response::failure(req_id, err.to_string()).with_key(key)
            }
        }
    }

    pub async fn set(&self, key: &str, value: serde_json::Value, req_id: Option<ReqId>) -> Response {
        match self.store.set(key, value).await {
            Ok(()) => Response::success(req_id).with_key(key),
            Err(err) => {
                tracing::warn!(
                    event = "ud.bridge.storage.set_failed",
                    key,
                    error = %err,
                    "storage set failed"
                );
                Response::failure(req_id, err.to_string()).with_key(key)
            }
        }
    }

    pub async fn remove(&self, key: &str, req_id: Option<ReqId>) -> Response {
        match self.store.remove(key).await {
            Ok(()) => Response::success(req_id).with_key(key),
            Err(err) => {
                tracing::warn!(
                    event = "ud.bridge.storage.remove_failed",
                    key,
                    error = %err,
                    "storage remove failed"
                );
                Response::failure(req_id, err.to_string()).with_key(key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryKv;
    use serde_json::json;

    fn adapter() -> (Arc<MemoryKv>, StorageAdapter) {
        let kv = Arc::new(MemoryKv::new());
        let adapter = StorageAdapter::new(Arc::clone(&kv) as Arc<dyn KeyValueStore>);
        (kv, adapter)
    }

    #[tokio::test]
    async fn set_then_get_echoes_key_and_value() {
        let (_kv, adapter) = adapter();

        let set = adapter.set("k", json!("v"), Some(ReqId::Num(1))).await;
        assert!(set.ok);
        assert_eq!(set.key.as_deref(), Some("k"));
        assert_eq!(set.req_id, Some(ReqId::Num(1)));
        assert_eq!(set.value, None, "set response carries no value field");

        let get = adapter.get("k", Some(ReqId::Num(2))).await;
        assert!(get.ok);
        assert_eq!(get.value, Some(json!("v")));
        assert_eq!(get.req_id, Some(ReqId::Num(2)));
    }

    #[tokio::test]
    async fn get_of_missing_key_is_ok_with_absent_value() {
        let (_kv, adapter) = adapter();
        let get = adapter.get("missing", None).await;
        assert!(get.ok);
        assert_eq!(get.value, None);
    }

    #[tokio::test]
    async fn backend_failure_becomes_ok_false_with_error() {
        let (kv, adapter) = adapter();

        kv.fail_next_op();
        let set = adapter.set("k", json!(1), Some(ReqId::from("r1"))).await;
        assert!(!set.ok);
        assert!(
            set.error.as_deref().unwrap_or_default().contains("injected"),
            "error field must carry the failure description: {set:?}"
        );
        assert_eq!(set.req_id, Some(ReqId::from("r1")));

        kv.fail_next_op();
        let remove = adapter.remove("k", None).await;
        assert!(!remove.ok);
        assert!(remove.error.is_some());
    }
}
