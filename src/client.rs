//! High-level caller facade.
//!
//! `BridgeClient` replaces the original's ambient page globals with an
//! explicitly constructed object: one per execution context, injected into
//! whatever needs to talk to the bridge. Contexts are short-lived, so there
//! is no teardown beyond dropping it.

use serde_json::Value;

use crate::correlator::Correlator;
use crate::error::BridgeError;
use crate::platform::WindowId;
use crate::protocol::{Message, PageSize, Response, WindowCreate};

/// Result of a popup-window request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupWindow {
    pub ok: bool,
    pub window_id: Option<WindowId>,
}

pub struct BridgeClient {
    correlator: Correlator,
}

impl BridgeClient {
    #[must_use]
    pub fn new(correlator: Correlator) -> Self {
        Self { correlator }
    }

    /// Heartbeat. True when the router answered inside the timeout.
    pub async fn ping(&self) -> Result<bool, BridgeError> {
        let response = self.correlator.send(Message::Ping { req_id: None }).await?;
        Ok(response.ok)
    }

    /// Read a stored value. `None` when the key is unset or the backend
    /// reported a failure.
    pub async fn storage_get(&self, key: impl Into<String>) -> Result<Option<Value>, BridgeError> {
        let response = self
            .correlator
            .send(Message::StorageGet {
                key: key.into(),
                req_id: None,
            })
            .await?;
        Ok(if response.ok { response.value } else { None })
    }

    pub async fn storage_set(
        &self,
        key: impl Into<String>,
        value: Value,
    ) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::StorageSet {
                key: key.into(),
                value,
                req_id: None,
            })
            .await?;
        Ok(response.ok)
    }

    pub async fn storage_remove(&self, key: impl Into<String>) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::StorageRemove {
                key: key.into(),
                req_id: None,
            })
            .await?;
        Ok(response.ok)
    }

    /// Create (or focus) a popup window.
    pub async fn create_window(&self, options: WindowCreate) -> Result<PopupWindow, BridgeError> {
        let response = self
            .correlator
            .send(Message::WindowCreate {
                options,
                req_id: None,
            })
            .await?;
        Ok(PopupWindow {
            ok: response.ok,
            window_id: response.window_id,
        })
    }

    pub async fn hide_window(&self, window_id: WindowId) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::WindowHide {
                window_id: Some(window_id),
                req_id: None,
            })
            .await?;
        Ok(response.ok)
    }

    pub async fn close_window(&self, window_id: WindowId) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::WindowClose {
                window_id: Some(window_id),
                req_id: None,
            })
            .await?;
        Ok(response.ok)
    }

    pub async fn close_game(&self) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::CloseGame { req_id: None })
            .await?;
        Ok(response.ok)
    }

    pub async fn resize_page(&self, width: u32, height: u32) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::ResizePage {
                size: Some(PageSize {
                    width: Some(width),
                    height: Some(height),
                }),
                req_id: None,
            })
            .await?;
        Ok(response.ok)
    }

    /// Announce a completed login so the token lands in extension storage.
    pub async fn notify_login_success(
        &self,
        token: impl Into<String>,
    ) -> Result<bool, BridgeError> {
        let response = self
            .correlator
            .send(Message::LoginSuccess {
                token: token.into(),
                req_id: None,
            })
            .await?;
        Ok(response.ok)
    }

    /// Escape hatch: send an arbitrary JSON value through the transport.
    pub async fn send_raw(&self, value: Value) -> Result<Response, BridgeError> {
        self.correlator.send_raw(value).await
    }
}
