//! In-memory platform implementations with fault injection hooks.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;

use super::{KeyValueStore, PageSurface, WindowId, WindowInfo, WindowState, WindowSystem};
use crate::error::PlatformError;
use crate::protocol::WindowCreate;

/// In-memory key-value store. `fail_next_op` poisons exactly one upcoming
/// operation, which is how tests exercise the `ok:false` paths.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: StdMutex<HashMap<String, Value>>,
    fail_next: AtomicBool,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_op(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_fault(&self) -> Result<(), PlatformError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PlatformError::Storage("injected storage fault".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, PlatformError> {
        self.take_fault()?;
        Ok(self
            .entries
            .lock()
            .expect("memory kv mutex poisoned")
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), PlatformError> {
        self.take_fault()?;
        self.entries
            .lock()
            .expect("memory kv mutex poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PlatformError> {
        self.take_fault()?;
        self.entries
            .lock()
            .expect("memory kv mutex poisoned")
            .remove(key);
        Ok(())
    }
}

/// In-memory window table. `close_from_outside` simulates the user closing a
/// window behind the registry's back, which is how handles go stale.
#[derive(Debug, Default)]
pub struct SimWindows {
    next_id: AtomicU64,
    windows: StdMutex<HashMap<WindowId, WindowInfo>>,
    created: AtomicU64,
}

impl SimWindows {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            windows: StdMutex::new(HashMap::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Total windows ever created, open or not.
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn open_count(&self) -> usize {
        self.windows.lock().expect("sim windows mutex poisoned").len()
    }

    pub fn close_from_outside(&self, id: WindowId) {
        self.windows
            .lock()
            .expect("sim windows mutex poisoned")
            .remove(&id);
    }
}

#[async_trait]
impl WindowSystem for SimWindows {
    async fn create(&self, options: &WindowCreate) -> Result<WindowId, PlatformError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let info = WindowInfo {
            id,
            state: WindowState::Normal,
            focused: options.focused.unwrap_or(true),
        };
        self.windows
            .lock()
            .expect("sim windows mutex poisoned")
            .insert(id, info);
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn get(&self, id: WindowId) -> Result<Option<WindowInfo>, PlatformError> {
        Ok(self
            .windows
            .lock()
            .expect("sim windows mutex poisoned")
            .get(&id)
            .copied())
    }

    async fn focus(&self, id: WindowId) -> Result<(), PlatformError> {
        let mut windows = self.windows.lock().expect("sim windows mutex poisoned");
        let info = windows
            .get_mut(&id)
            .ok_or_else(|| PlatformError::Window(format!("no window with id {id}")))?;
        info.focused = true;
        info.state = WindowState::Normal;
        Ok(())
    }

    async fn minimize(&self, id: WindowId) -> Result<(), PlatformError> {
        let mut windows = self.windows.lock().expect("sim windows mutex poisoned");
        let info = windows
            .get_mut(&id)
            .ok_or_else(|| PlatformError::Window(format!("no window with id {id}")))?;
        info.state = WindowState::Minimized;
        Ok(())
    }

    async fn remove(&self, id: WindowId) -> Result<(), PlatformError> {
        let mut windows = self.windows.lock().expect("sim windows mutex poisoned");
        windows
            .remove(&id)
            .ok_or_else(|| PlatformError::Window(format!("no window with id {id}")))?;
        Ok(())
    }
}

/// Togglable game surface. When `present` is false both actions report
/// failure, matching a page without the expected iframe.
#[derive(Debug)]
pub struct SimPage {
    present: AtomicBool,
    last_resize: StdMutex<Option<(u32, u32)>>,
}

impl SimPage {
    #[must_use]
    pub fn new(present: bool) -> Self {
        Self {
            present: AtomicBool::new(present),
            last_resize: StdMutex::new(None),
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.present.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_resize(&self) -> Option<(u32, u32)> {
        *self.last_resize.lock().expect("sim page mutex poisoned")
    }
}

#[async_trait]
impl PageSurface for SimPage {
    async fn close_game(&self) -> Result<bool, PlatformError> {
        Ok(self.present.swap(false, Ordering::SeqCst))
    }

    async fn resize(&self, width: u32, height: u32) -> Result<bool, PlatformError> {
        if !self.present.load(Ordering::SeqCst) {
            return Ok(false);
        }
        *self.last_resize.lock().expect("sim page mutex poisoned") = Some((width, height));
        Ok(true)
    }
}
