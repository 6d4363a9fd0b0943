//! Cross-context message bridge for the Domain Heroes extension.
//!
//! Three execution contexts — the embedded game page, a relay frame, and
//! the extension controller — talk through typed, reqId-correlated JSON
//! messages:
//!
//! - [`protocol`]: the tagged message set, response shape, and frame codec;
//! - [`platform`]: injected storage/window/page service seams;
//! - [`storage`]: key-value operations as `ok`-flagged responses;
//! - [`registry`]: single-instance named windows with persisted handles;
//! - [`router`]: the startup-registered dispatch map;
//! - [`correlator`]: pending-request bookkeeping with timeout rejection;
//! - [`relay`]: origin-checked forwarding between page and router;
//! - [`client`] / [`bridge`]: the injected caller facade and the wiring.

pub mod bridge;
pub mod client;
pub mod config;
pub mod correlator;
pub mod error;
pub mod logging;
pub mod platform;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod router;
pub mod storage;

pub use bridge::Bridge;
pub use client::{BridgeClient, PopupWindow};
pub use config::BridgeConfig;
pub use correlator::Correlator;
pub use error::{BridgeError, PlatformError};
pub use protocol::{Message, MessageKind, PageSize, ReqId, Response, WindowCreate};
pub use registry::WindowRegistry;
pub use relay::{PagePacket, Relay};
pub use router::Router;
pub use storage::StorageAdapter;
