//! Wire protocol shared by every execution context.
//!
//! Messages are JSON objects tagged by a `type` field and correlated by a
//! caller-generated `reqId`. The frame codec carries serialized messages as
//! newline-delimited JSON with a pre-parse size cap, so a hostile or corrupt
//! peer cannot force an unbounded parse.

use std::collections::HashMap;
use std::fmt;

use memchr::memchr;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::platform::WindowId;

pub const MAX_FRAME_BYTES: usize = 256 * 1024;

/// Storage key holding the persisted name-to-window mapping.
pub const WINDOW_MAP_KEY: &str = "ud_window_map";

/// Storage key holding the login token saved on `UD_LOGIN_SUCCESS`.
pub const LOGIN_TOKEN_KEY: &str = "udomain_ut";

// ─── Correlation ids ────────────────────────────────────────────────────────

/// Caller-generated correlation identifier. Either a string or a number on
/// the wire; treated as opaque everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReqId {
    Num(u64),
    Str(String),
}

impl fmt::Display for ReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for ReqId {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<String> for ReqId {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for ReqId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

// ─── Requests ───────────────────────────────────────────────────────────────

/// Window geometry and creation options for `UD_WINDOW_CREATE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowCreate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incognito: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_type: Option<String>,
}

impl WindowCreate {
    /// Logical instance name, trimmed. `None` means "no dedup, always create".
    #[must_use]
    pub fn instance_name(&self) -> Option<&str> {
        let name = self.name.as_deref()?.trim();
        if name.is_empty() { None } else { Some(name) }
    }
}

/// Target size for `UD_RESIZE_PAGE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Every request the router recognizes. Unrecognized tags fail to decode and
/// are dropped by the relay without a response; callers observe that as a
/// timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(
        rename = "UD_PING",
        alias = "UD_PING_HIDDEN",
        alias = "UD_HEARTBEAT",
        alias = "PING_HIDDEN",
        rename_all = "camelCase"
    )]
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_STORAGE_GET", rename_all = "camelCase")]
    StorageGet {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_STORAGE_SET", rename_all = "camelCase")]
    StorageSet {
        key: String,
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_STORAGE_REMOVE", rename_all = "camelCase")]
    StorageRemove {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_WINDOW_CREATE", rename_all = "camelCase")]
    WindowCreate {
        #[serde(flatten)]
        options: WindowCreate,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_WINDOW_HIDE", rename_all = "camelCase")]
    WindowHide {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window_id: Option<WindowId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_WINDOW_CLOSE", rename_all = "camelCase")]
    WindowClose {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        window_id: Option<WindowId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_CLOSE_GAME", alias = "CLOSE_GAME", rename_all = "camelCase")]
    CloseGame {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(rename = "UD_RESIZE_PAGE", alias = "RESIZE_PAGE", rename_all = "camelCase")]
    ResizePage {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<PageSize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },

    #[serde(
        rename = "UD_LOGIN_SUCCESS",
        alias = "UD_LoginSuccess",
        rename_all = "camelCase"
    )]
    LoginSuccess {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<ReqId>,
    },
}

/// Fieldless discriminant used as the dispatch-map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Ping,
    StorageGet,
    StorageSet,
    StorageRemove,
    WindowCreate,
    WindowHide,
    WindowClose,
    CloseGame,
    ResizePage,
    LoginSuccess,
}

impl MessageKind {
    /// Canonical wire tag for this kind.
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Ping => "UD_PING",
            Self::StorageGet => "UD_STORAGE_GET",
            Self::StorageSet => "UD_STORAGE_SET",
            Self::StorageRemove => "UD_STORAGE_REMOVE",
            Self::WindowCreate => "UD_WINDOW_CREATE",
            Self::WindowHide => "UD_WINDOW_HIDE",
            Self::WindowClose => "UD_WINDOW_CLOSE",
            Self::CloseGame => "UD_CLOSE_GAME",
            Self::ResizePage => "UD_RESIZE_PAGE",
            Self::LoginSuccess => "UD_LOGIN_SUCCESS",
        }
    }
}

impl Message {
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Ping { .. } => MessageKind::Ping,
            Self::StorageGet { .. } => MessageKind::StorageGet,
            Self::StorageSet { .. } => MessageKind::StorageSet,
            Self::StorageRemove { .. } => MessageKind::StorageRemove,
            Self::WindowCreate { .. } => MessageKind::WindowCreate,
            Self::WindowHide { .. } => MessageKind::WindowHide,
            Self::WindowClose { .. } => MessageKind::WindowClose,
            Self::CloseGame { .. } => MessageKind::CloseGame,
            Self::ResizePage { .. } => MessageKind::ResizePage,
            Self::LoginSuccess { .. } => MessageKind::LoginSuccess,
        }
    }

    #[must_use]
    pub const fn req_id(&self) -> Option<&ReqId> {
        match self {
            Self::Ping { req_id }
            | Self::StorageGet { req_id, .. }
            | Self::StorageSet { req_id, .. }
            | Self::StorageRemove { req_id, .. }
            | Self::WindowCreate { req_id, .. }
            | Self::WindowHide { req_id, .. }
            | Self::WindowClose { req_id, .. }
            | Self::CloseGame { req_id }
            | Self::ResizePage { req_id, .. }
            | Self::LoginSuccess { req_id, .. } => req_id.as_ref(),
        }
    }

    pub fn set_req_id(&mut self, id: ReqId) {
        match self {
            Self::Ping { req_id }
            | Self::StorageGet { req_id, .. }
            | Self::StorageSet { req_id, .. }
            | Self::StorageRemove { req_id, .. }
            | Self::WindowCreate { req_id, .. }
            | Self::WindowHide { req_id, .. }
            | Self::WindowClose { req_id, .. }
            | Self::CloseGame { req_id }
            | Self::ResizePage { req_id, .. }
            | Self::LoginSuccess { req_id, .. } => *req_id = Some(id),
        }
    }
}

// ─── Responses ──────────────────────────────────────────────────────────────

/// Marker for the single response tag, `UD_RESPONSE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseTag {
    #[default]
    #[serde(rename = "UD_RESPONSE")]
    Response,
}

/// The one response shape every request resolves to. Absent fields are
/// omitted on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(rename = "type", default)]
    pub tag: ResponseTag,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub req_id: Option<ReqId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    #[must_use]
    pub fn success(req_id: Option<ReqId>) -> Self {
        Self {
            tag: ResponseTag::Response,
            ok: true,
            req_id,
            key: None,
            value: None,
            window_id: None,
            ts: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(req_id: Option<ReqId>, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::success(req_id)
        }
    }

    #[must_use]
    pub fn with_ok(mut self, ok: bool) -> Self {
        self.ok = ok;
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Option<Value>) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn with_window_id(mut self, window_id: WindowId) -> Self {
        self.window_id = Some(window_id);
        self
    }

    #[must_use]
    pub fn with_ts(mut self, ts: i64) -> Self {
        self.ts = Some(ts);
        self
    }
}

// ─── Frame codec ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FrameCodecError {
    #[error("frame exceeds {max_bytes} bytes before JSON parse (got {frame_bytes})")]
    FrameTooLarge {
        frame_bytes: usize,
        max_bytes: usize,
    },
    #[error("invalid JSON frame: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Serialize a message as a single newline-terminated JSON frame.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>, FrameCodecError> {
    let mut encoded = serde_json::to_vec(message)?;
    if encoded.len() > MAX_FRAME_BYTES {
        return Err(FrameCodecError::FrameTooLarge {
            frame_bytes: encoded.len(),
            max_bytes: MAX_FRAME_BYTES,
        });
    }
    encoded.push(b'\n');
    Ok(encoded)
}

/// Decode the first complete frame in `input`. Returns the decoded value and
/// the number of bytes consumed, or `None` when no full frame has arrived.
pub fn decode_frame<T: DeserializeOwned>(
    input: &[u8],
) -> Result<Option<(T, usize)>, FrameCodecError> {
    match memchr(b'\n', input) {
        Some(newline_idx) => {
            if newline_idx > MAX_FRAME_BYTES {
                return Err(FrameCodecError::FrameTooLarge {
                    frame_bytes: newline_idx,
                    max_bytes: MAX_FRAME_BYTES,
                });
            }
            let decoded = serde_json::from_slice::<T>(&input[..newline_idx])?;
            Ok(Some((decoded, newline_idx + 1)))
        }
        None => {
            if input.len() > MAX_FRAME_BYTES {
                return Err(FrameCodecError::FrameTooLarge {
                    frame_bytes: input.len(),
                    max_bytes: MAX_FRAME_BYTES,
                });
            }
            Ok(None)
        }
    }
}

/// Best-effort reqId extraction from an arbitrary JSON object, for raw sends
/// that bypass the typed [`Message`] surface.
#[must_use]
pub fn req_id_of_value(value: &Value) -> Option<ReqId> {
    let raw = value.get("reqId")?;
    serde_json::from_value::<ReqId>(raw.clone()).ok()
}

/// Window-map payload stored under [`WINDOW_MAP_KEY`].
pub type WindowMap = HashMap<String, WindowId>;
