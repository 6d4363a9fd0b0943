//! Relay frame: origin-checked forwarding between the page transport and
//! the router channel.
//!
//! Inbound packets carry the sender's origin alongside the serialized frame.
//! Anything from the wrong origin, any frame the codec rejects, and any tag
//! the protocol does not recognize is dropped without a response — callers
//! experience all three identically, as a timeout. Outbound responses are
//! re-framed for the page side.

use tokio::sync::mpsc;

use crate::protocol::{self, Message, Response};

/// A serialized message plus the origin it was posted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePacket {
    pub origin: String,
    pub frame: Vec<u8>,
}

pub struct Relay {
    allowed_origin: String,
}

impl Relay {
    #[must_use]
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
        }
    }

    /// Forward until either side closes. Origins match by prefix, the same
    /// check the embedding page applies to `postMessage` events.
    pub async fn run(
        self,
        mut from_page: mpsc::UnboundedReceiver<PagePacket>,
        to_router: mpsc::UnboundedSender<Message>,
        mut from_router: mpsc::UnboundedReceiver<Response>,
        to_page: mpsc::UnboundedSender<Vec<u8>>,
    ) {
        loop {
            tokio::select! {
                packet = from_page.recv() => {
                    let Some(packet) = packet else { break };
                    if let Some(message) = self.accept(&packet) {
                        if to_router.send(message).is_err() {
                            break;
                        }
                    }
                }
                response = from_router.recv() => {
                    let Some(response) = response else { break };
                    match protocol::encode_frame(&response) {
                        Ok(frame) => {
                            if to_page.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(
                                event = "ud.bridge.relay.encode_failed",
                                error = %err,
                                "dropping unencodable response"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Screen one inbound packet. `None` means drop silently.
    fn accept(&self, packet: &PagePacket) -> Option<Message> {
        if !packet.origin.starts_with(&self.allowed_origin) {
            tracing::warn!(
                event = "ud.bridge.relay.origin_rejected",
                origin = %packet.origin,
                "dropping packet from disallowed origin"
            );
            return None;
        }
        match protocol::decode_frame::<Message>(&packet.frame) {
            Ok(Some((message, _))) => Some(message),
            Ok(None) => {
                tracing::debug!(
                    event = "ud.bridge.relay.partial_frame",
                    "dropping incomplete frame"
                );
                None
            }
            Err(err) => {
                tracing::debug!(
                    event = "ud.bridge.relay.undecodable",
                    error = %err,
                    "dropping malformed or unrecognized message"
                );
                None
            }
        }
    }
}
