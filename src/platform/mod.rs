//! Platform service seams.
//!
//! The router never touches browser APIs directly; it talks to these traits.
//! Each execution context constructs concrete implementations once and
//! injects them — there are no process-wide singletons. The in-memory
//! implementations double as the test harness.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PlatformError;
use crate::protocol::WindowCreate;

mod fs_store;
mod memory;

pub use fs_store::JsonFileKv;
pub use memory::{MemoryKv, SimPage, SimWindows};

/// Platform window handle. Numeric, like a browser window id.
pub type WindowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Minimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub state: WindowState,
    pub focused: bool,
}

/// Key-value storage. All operations may fail with a [`PlatformError`];
/// nothing here panics on backend trouble.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, PlatformError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), PlatformError>;
    async fn remove(&self, key: &str) -> Result<(), PlatformError>;
}

/// Window management. `get` returning `Ok(None)` and `Err(_)` are both
/// treated as a stale handle by the registry.
#[async_trait]
pub trait WindowSystem: Send + Sync {
    async fn create(&self, options: &WindowCreate) -> Result<WindowId, PlatformError>;
    async fn get(&self, id: WindowId) -> Result<Option<WindowInfo>, PlatformError>;
    /// Bring the window to the foreground and restore it to normal state.
    async fn focus(&self, id: WindowId) -> Result<(), PlatformError>;
    async fn minimize(&self, id: WindowId) -> Result<(), PlatformError>;
    async fn remove(&self, id: WindowId) -> Result<(), PlatformError>;
}

/// The page-level game surface. Actions run in the page hosting the game,
/// not in the router's own context; both report a bare success flag.
#[async_trait]
pub trait PageSurface: Send + Sync {
    async fn close_game(&self) -> Result<bool, PlatformError>;
    async fn resize(&self, width: u32, height: u32) -> Result<bool, PlatformError>;
}
