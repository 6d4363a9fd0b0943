//! Single-instance window registry.
//!
//! Maps a logical instance name to a live window handle, persisted in the
//! key-value store so the mapping survives router restarts. Liveness is
//! decided by a platform lookup at use time; any lookup error or null result
//! counts as stale and falls through to the creation path. Persistence is
//! best-effort only — a failed mapping write never blocks window creation.

use std::sync::Arc;

use crate::error::PlatformError;
use crate::platform::{KeyValueStore, WindowId, WindowSystem};
use crate::protocol::{WINDOW_MAP_KEY, WindowCreate, WindowMap};

pub struct WindowRegistry {
    store: Arc<dyn KeyValueStore>,
    windows: Arc<dyn WindowSystem>,
}

impl WindowRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, windows: Arc<dyn WindowSystem>) -> Self {
        Self { store, windows }
    }

    /// Create-or-focus for `UD_WINDOW_CREATE`.
    ///
    /// Named windows are deduplicated: if the stored handle still resolves,
    /// that window is focused and returned instead of creating a second one.
    /// A stale or missing entry (or an unnamed request) creates a new window
    /// and, for named requests, overwrites the mapping.
    pub async fn ensure_window(&self, options: &WindowCreate) -> Result<WindowId, PlatformError> {
        if let Some(name) = options.instance_name() {
            if let Some(existing) = self.live_window_for(name).await {
                tracing::debug!(
                    event = "ud.bridge.registry.reuse",
                    name,
                    window_id = existing,
                    "focusing existing single-instance window"
                );
                return Ok(existing);
            }
        }

        let id = self.windows.create(options).await?;
        if let Some(name) = options.instance_name() {
            self.record_mapping(name, id).await;
        }
        Ok(id)
    }

    pub async fn hide_window(&self, id: WindowId) -> Result<(), PlatformError> {
        self.windows.minimize(id).await
    }

    pub async fn close_window(&self, id: WindowId) -> Result<(), PlatformError> {
        self.windows.remove(id).await
    }

    /// Resolve `name` to a window that is still open, focusing it on the way
    /// out. Any failure along the path (map read, platform lookup, focus)
    /// reads as "no live window" so the caller recreates.
    async fn live_window_for(&self, name: &str) -> Option<WindowId> {
        let map = self.load_map().await;
        let id = *map.get(name)?;
        match self.windows.get(id).await {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => return None,
        }
        match self.windows.focus(id).await {
            Ok(()) => Some(id),
            Err(err) => {
                tracing::debug!(
                    event = "ud.bridge.registry.focus_failed",
                    name,
                    window_id = id,
                    error = %err,
                    "treating unfocusable window as stale"
                );
                None
            }
        }
    }

    async fn load_map(&self) -> WindowMap {
        match self.store.get(WINDOW_MAP_KEY).await {
            Ok(Some(raw)) => serde_json::from_value(raw).unwrap_or_default(),
            Ok(None) => WindowMap::default(),
            Err(err) => {
                tracing::warn!(
                    event = "ud.bridge.registry.map_read_failed",
                    error = %err,
                    "window map unreadable; proceeding as if empty"
                );
                WindowMap::default()
            }
        }
    }

    async fn record_mapping(&self, name: &str, id: WindowId) {
        let mut map = self.load_map().await;
        map.insert(name.to_string(), id);
        let raw = match serde_json::to_value(&map) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(
                    event = "ud.bridge.registry.map_encode_failed",
                    error = %err,
                    "window map not persisted"
                );
                return;
            }
        };
        if let Err(err) = self.store.set(WINDOW_MAP_KEY, raw).await {
            tracing::warn!(
                event = "ud.bridge.registry.map_write_failed",
                name,
                window_id = id,
                error = %err,
                "window map not persisted; creation still succeeds"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryKv, SimWindows};

    fn registry() -> (Arc<MemoryKv>, Arc<SimWindows>, WindowRegistry) {
        let kv = Arc::new(MemoryKv::new());
        let windows = Arc::new(SimWindows::new());
        let registry = WindowRegistry::new(
            Arc::clone(&kv) as Arc<dyn KeyValueStore>,
            Arc::clone(&windows) as Arc<dyn WindowSystem>,
        );
        (kv, windows, registry)
    }

    fn named(name: &str) -> WindowCreate {
        WindowCreate {
            url: Some("https://x".to_string()),
            name: Some(name.to_string()),
            ..WindowCreate::default()
        }
    }

    #[tokio::test]
    async fn repeated_named_create_returns_same_window() {
        let (_kv, windows, registry) = registry();

        let first = registry.ensure_window(&named("main")).await.expect("first");
        let second = registry
            .ensure_window(&named("main"))
            .await
            .expect("second");

        assert_eq!(first, second);
        assert_eq!(windows.created_count(), 1, "no second window created");
    }

    #[tokio::test]
    async fn stale_handle_recreates_and_overwrites_mapping() {
        let (_kv, windows, registry) = registry();

        let first = registry.ensure_window(&named("main")).await.expect("first");
        windows.close_from_outside(first);

        let second = registry
            .ensure_window(&named("main"))
            .await
            .expect("recreate");
        assert_ne!(first, second, "dead handles are never resurrected");
        assert_eq!(windows.created_count(), 2);

        // The overwritten mapping now points at the new window.
        let third = registry.ensure_window(&named("main")).await.expect("third");
        assert_eq!(second, third);
        assert_eq!(windows.created_count(), 2);
    }

    #[tokio::test]
    async fn unnamed_create_never_deduplicates() {
        let (_kv, windows, registry) = registry();

        let a = registry
            .ensure_window(&WindowCreate::default())
            .await
            .expect("a");
        let b = registry
            .ensure_window(&WindowCreate {
                name: Some("   ".to_string()),
                ..WindowCreate::default()
            })
            .await
            .expect("b");

        assert_ne!(a, b);
        assert_eq!(windows.created_count(), 2);
    }

    #[tokio::test]
    async fn mapping_write_failure_does_not_block_creation() {
        let (kv, windows, registry) = registry();

        kv.fail_next_op();
        let id = registry
            .ensure_window(&named("main"))
            .await
            .expect("creation succeeds despite persistence failure");
        assert!(windows.get(id).await.expect("get").is_some());

        // The mapping was lost, so the next call creates a fresh window.
        let next = registry.ensure_window(&named("main")).await.expect("next");
        assert_ne!(id, next);
        assert_eq!(windows.created_count(), 2);
    }

    #[tokio::test]
    async fn mapping_read_failure_falls_through_to_creation() {
        let (kv, windows, registry) = registry();

        registry.ensure_window(&named("main")).await.expect("seed");
        kv.fail_next_op();
        registry
            .ensure_window(&named("main"))
            .await
            .expect("unreadable map must not wedge creation");
        assert_eq!(windows.created_count(), 2);
    }

    #[tokio::test]
    async fn reuse_focuses_and_restores_the_window() {
        let (_kv, windows, registry) = registry();

        let id = registry.ensure_window(&named("main")).await.expect("first");
        registry.hide_window(id).await.expect("minimize");

        registry.ensure_window(&named("main")).await.expect("reuse");
        let info = windows.get(id).await.expect("get").expect("open");
        assert_eq!(info.state, crate::platform::WindowState::Normal);
        assert!(info.focused);
    }

    #[tokio::test]
    async fn mapping_survives_registry_restart() {
        let kv = Arc::new(MemoryKv::new());
        let windows = Arc::new(SimWindows::new());

        let first = {
            let registry = WindowRegistry::new(
                Arc::clone(&kv) as Arc<dyn KeyValueStore>,
                Arc::clone(&windows) as Arc<dyn WindowSystem>,
            );
            registry.ensure_window(&named("main")).await.expect("first")
        };

        let registry = WindowRegistry::new(
            Arc::clone(&kv) as Arc<dyn KeyValueStore>,
            Arc::clone(&windows) as Arc<dyn WindowSystem>,
        );
        let second = registry
            .ensure_window(&named("main"))
            .await
            .expect("after restart");
        assert_eq!(first, second);
        assert_eq!(windows.created_count(), 1);
    }

    #[tokio::test]
    async fn close_window_of_missing_handle_errors() {
        let (_kv, _windows, registry) = registry();
        assert!(registry.close_window(999).await.is_err());
        assert!(registry.hide_window(999).await.is_err());
    }
}
