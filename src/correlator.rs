//! Request/response correlation for the page-side caller.
//!
//! Every outgoing request gets a reqId built from high-resolution time plus
//! a random suffix, and a pending `oneshot` slot keyed by that id. A pump
//! task resolves slots as response frames arrive; the configured timeout
//! removes the slot and rejects the caller. Exactly one resolution path
//! fires, deregistration is idempotent, and a response arriving after its
//! slot is gone is inert — it settles nothing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::BridgeError;
use crate::protocol::{self, Message, ReqId, Response};
use crate::relay::PagePacket;

type PendingResponses = HashMap<ReqId, oneshot::Sender<Response>>;

pub struct Correlator {
    origin: String,
    timeout: Duration,
    outbound: mpsc::UnboundedSender<PagePacket>,
    pending: Arc<StdMutex<PendingResponses>>,
    pump: JoinHandle<()>,
}

impl Correlator {
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        timeout: Duration,
        outbound: mpsc::UnboundedSender<PagePacket>,
        inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    ) -> Self {
        let pending = Arc::new(StdMutex::new(PendingResponses::new()));
        let pump = spawn_response_pump(Arc::clone(&pending), inbound);
        Self {
            origin: origin.into(),
            timeout,
            outbound,
            pending,
            pump,
        }
    }

    /// Unique per outstanding request within this context: wall-clock millis
    /// plus a random suffix.
    #[must_use]
    pub fn next_req_id(&self) -> ReqId {
        ReqId::Str(format!(
            "{:x}-{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        ))
    }

    /// Send a typed request and await its correlated response.
    pub async fn send(&self, mut message: Message) -> Result<Response, BridgeError> {
        let req_id = self.next_req_id();
        message.set_req_id(req_id.clone());
        let tag = message.kind().as_tag().to_string();
        let value =
            serde_json::to_value(&message).map_err(|err| BridgeError::Protocol(err.to_string()))?;
        self.dispatch_value(tag, &value, Some(req_id)).await
    }

    /// Send an arbitrary JSON value as-is. Without a `reqId` field the call
    /// can only ever time out, since no response can be correlated back.
    pub async fn send_raw(&self, value: serde_json::Value) -> Result<Response, BridgeError> {
        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("<untyped>")
            .to_string();
        let req_id = protocol::req_id_of_value(&value);
        self.dispatch_value(tag, &value, req_id).await
    }

    /// Outstanding requests in this context. Test hook.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .expect("pending responses mutex poisoned")
            .len()
    }

    async fn dispatch_value(
        &self,
        tag: String,
        value: &serde_json::Value,
        req_id: Option<ReqId>,
    ) -> Result<Response, BridgeError> {
        let frame =
            protocol::encode_frame(value).map_err(|err| BridgeError::Protocol(err.to_string()))?;

        let receiver = req_id.as_ref().map(|id| {
            let (tx, rx) = oneshot::channel();
            self.pending
                .lock()
                .expect("pending responses mutex poisoned")
                .insert(id.clone(), tx);
            rx
        });

        let packet = PagePacket {
            origin: self.origin.clone(),
            frame,
        };
        if self.outbound.send(packet).is_err() {
            self.deregister(req_id.as_ref());
            return Err(BridgeError::TransportClosed {
                req_id: req_id.map(|id| id.to_string()).unwrap_or_default(),
            });
        }

        let Some(receiver) = receiver else {
            // No correlation id, so no response can ever match; burn the
            // full timeout window to keep the caller-visible contract.
            tokio::time::sleep(self.timeout).await;
            return Err(self.timeout_error(tag));
        };

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => {
                self.deregister(req_id.as_ref());
                Err(BridgeError::TransportClosed {
                    req_id: req_id.map(|id| id.to_string()).unwrap_or_default(),
                })
            }
            Err(_) => {
                self.deregister(req_id.as_ref());
                tracing::debug!(
                    event = "ud.bridge.correlator.timeout",
                    tag = %tag,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "request timed out; any late response will be dropped"
                );
                Err(self.timeout_error(tag))
            }
        }
    }

    fn deregister(&self, req_id: Option<&ReqId>) {
        if let Some(id) = req_id {
            self.pending
                .lock()
                .expect("pending responses mutex poisoned")
                .remove(id);
        }
    }

    fn timeout_error(&self, tag: String) -> BridgeError {
        BridgeError::Timeout {
            tag,
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }
}

impl Drop for Correlator {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

fn spawn_response_pump(
    pending: Arc<StdMutex<PendingResponses>>,
    mut inbound: mpsc::UnboundedReceiver<Vec<u8>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = inbound.recv().await {
            let response = match protocol::decode_frame::<Response>(&frame) {
                Ok(Some((response, _))) => response,
                Ok(None) | Err(_) => {
                    tracing::debug!(
                        event = "ud.bridge.correlator.bad_frame",
                        "dropping undecodable inbound frame"
                    );
                    continue;
                }
            };
            let Some(req_id) = response.req_id.clone() else {
                continue;
            };
            let slot = pending
                .lock()
                .expect("pending responses mutex poisoned")
                .remove(&req_id);
            match slot {
                // The receiver may already be gone; a failed send is fine.
                Some(tx) => {
                    let _ = tx.send(response);
                }
                None => {
                    tracing::debug!(
                        event = "ud.bridge.correlator.late_response",
                        req_id = %req_id,
                        "response arrived for a settled or unknown request"
                    );
                }
            }
        }
    })
}
