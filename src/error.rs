//! Error taxonomy for the bridge.
//!
//! Platform and stale-handle failures are caught at the operation boundary
//! and converted into `ok:false` responses; they never cross a context as a
//! panic or an `Err`. Timeouts (and transport loss) are the only failures a
//! caller observes as a rejected outcome, so callers must check both for
//! `Err` and for `ok:false`.

use thiserror::Error;

use crate::platform::WindowId;

/// Failures raised by an underlying platform service (storage backend,
/// window system, page surface).
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("storage backend failure: {0}")]
    Storage(String),

    #[error("window system failure: {0}")]
    Window(String),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failure: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures surfaced to bridge callers.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("request `{tag}` timed out after {timeout_ms}ms")]
    Timeout { tag: String, timeout_ms: u64 },

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("malformed or unrecognized message: {0}")]
    Protocol(String),

    #[error("window {window_id} is no longer resolvable")]
    StaleHandle { window_id: WindowId },

    #[error("transport closed before request `{req_id}` completed")]
    TransportClosed { req_id: String },
}

impl BridgeError {
    /// True when the caller saw no answer at all inside the timeout window.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_includes_tag_and_bound() {
        let err = BridgeError::Timeout {
            tag: "UD_STORAGE_GET".to_string(),
            timeout_ms: 3000,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("UD_STORAGE_GET"), "got: {rendered}");
        assert!(rendered.contains("3000ms"), "got: {rendered}");
        assert!(err.is_timeout());
    }

    #[test]
    fn platform_error_converts_into_bridge_error() {
        let err: BridgeError = PlatformError::Storage("quota exceeded".to_string()).into();
        assert!(matches!(err, BridgeError::Platform(_)));
        assert!(!err.is_timeout());
    }
}
