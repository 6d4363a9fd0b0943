//! Message router: a dispatch map from message kind to async handler.
//!
//! Handlers are registered once at startup; dispatch is a map lookup, not a
//! conditional chain. The router owns no durable state — side effects live
//! in the storage adapter and the platform window/page services. A message
//! whose kind has no registered handler produces no response at all; callers
//! cover that case with their own timeout.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;

use crate::platform::PageSurface;
use crate::protocol::{LOGIN_TOKEN_KEY, Message, MessageKind, Response};
use crate::registry::WindowRegistry;
use crate::storage::StorageAdapter;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Option<Response>> + Send>>;
pub type Handler = Arc<dyn Fn(Message) -> HandlerFuture + Send + Sync>;

#[derive(Default)]
pub struct Router {
    handlers: HashMap<MessageKind, Handler>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `kind`.
    pub fn register<F, Fut>(&mut self, kind: MessageKind, handler: F)
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Response>> + Send + 'static,
    {
        self.handlers.insert(
            kind,
            Arc::new(move |message| -> HandlerFuture { Box::pin(handler(message)) }),
        );
    }

    /// A router with the built-in handler set: ping, storage, window,
    /// page actions, and the login-success notification.
    #[must_use]
    pub fn with_defaults(
        storage: StorageAdapter,
        registry: Arc<WindowRegistry>,
        page: Option<Arc<dyn PageSurface>>,
    ) -> Self {
        let mut router = Self::new();

        router.register(MessageKind::Ping, |message| async move {
            let req_id = message.req_id().cloned();
            Some(Response::success(req_id).with_ts(Utc::now().timestamp_millis()))
        });

        let adapter = storage.clone();
        router.register(MessageKind::StorageGet, move |message| {
            let adapter = adapter.clone();
            async move {
                let Message::StorageGet { key, req_id } = message else {
                    return None;
                };
                Some(adapter.get(&key, req_id).await)
            }
        });

        let adapter = storage.clone();
        router.register(MessageKind::StorageSet, move |message| {
            let adapter = adapter.clone();
            async move {
                let Message::StorageSet { key, value, req_id } = message else {
                    return None;
                };
                Some(adapter.set(&key, value, req_id).await)
            }
        });

        let adapter = storage.clone();
        router.register(MessageKind::StorageRemove, move |message| {
            let adapter = adapter.clone();
            async move {
                let Message::StorageRemove { key, req_id } = message else {
                    return None;
                };
                Some(adapter.remove(&key, req_id).await)
            }
        });

        let windows = Arc::clone(&registry);
        router.register(MessageKind::WindowCreate, move |message| {
            let registry = Arc::clone(&windows);
            async move {
                let Message::WindowCreate { options, req_id } = message else {
                    return None;
                };
                match registry.ensure_window(&options).await {
                    Ok(id) => Some(Response::success(req_id).with_window_id(id)),
                    Err(err) => {
                        tracing::warn!(
                            event = "ud.bridge.router.window_create_failed",
                            error = %err,
                            "window creation failed"
                        );
                        Some(Response::failure(req_id, err.to_string()))
                    }
                }
            }
        });

        let windows = Arc::clone(&registry);
        router.register(MessageKind::WindowHide, move |message| {
            let registry = Arc::clone(&windows);
            async move {
                let Message::WindowHide { window_id, req_id } = message else {
                    return None;
                };
                let Some(id) = window_id else {
                    return Some(Response::failure(req_id, "missing windowId"));
                };
                Some(match registry.hide_window(id).await {
                    Ok(()) => Response::success(req_id).with_window_id(id),
                    Err(err) => Response::failure(req_id, err.to_string()).with_window_id(id),
                })
            }
        });

        let windows = Arc::clone(&registry);
        router.register(MessageKind::WindowClose, move |message| {
            let registry = Arc::clone(&windows);
            async move {
                let Message::WindowClose { window_id, req_id } = message else {
                    return None;
                };
                let Some(id) = window_id else {
                    return Some(Response::failure(req_id, "missing windowId"));
                };
                Some(match registry.close_window(id).await {
                    Ok(()) => Response::success(req_id).with_window_id(id),
                    Err(err) => Response::failure(req_id, err.to_string()).with_window_id(id),
                })
            }
        });

        let surface = page.clone();
        router.register(MessageKind::CloseGame, move |message| {
            let surface = surface.clone();
            async move {
                let req_id = message.req_id().cloned();
                let closed = match &surface {
                    Some(surface) => surface.close_game().await.unwrap_or(false),
                    None => false,
                };
                Some(Response::success(req_id).with_ok(closed))
            }
        });

        let surface = page;
        router.register(MessageKind::ResizePage, move |message| {
            let surface = surface.clone();
            async move {
                let Message::ResizePage { size, req_id } = message else {
                    return None;
                };
                let resized = match (&surface, size) {
                    (Some(surface), Some(size)) => surface
                        .resize(size.width.unwrap_or(0), size.height.unwrap_or(0))
                        .await
                        .unwrap_or(false),
                    _ => false,
                };
                Some(Response::success(req_id).with_ok(resized))
            }
        });

        let adapter = storage;
        router.register(MessageKind::LoginSuccess, move |message| {
            let adapter = adapter.clone();
            async move {
                let Message::LoginSuccess { token, req_id } = message else {
                    return None;
                };
                // The token value itself is deliberately kept out of logs.
                tracing::info!(
                    event = "ud.bridge.router.login_success",
                    "persisting login token"
                );
                Some(adapter.set(LOGIN_TOKEN_KEY, json!(token), req_id).await)
            }
        });

        router
    }

    /// Dispatch one message, returning the response to deliver (if any).
    pub async fn dispatch(&self, message: Message) -> Option<Response> {
        let kind = message.kind();
        let Some(handler) = self.handlers.get(&kind) else {
            tracing::debug!(
                event = "ud.bridge.router.unhandled",
                tag = kind.as_tag(),
                "no handler registered; dropping without response"
            );
            return None;
        };
        handler(message).await
    }

    /// Consume the inbound channel until it closes, running each handler to
    /// completion before the next message is taken.
    pub async fn run(
        self,
        mut inbound: mpsc::UnboundedReceiver<Message>,
        outbound: mpsc::UnboundedSender<Response>,
    ) {
        while let Some(message) = inbound.recv().await {
            let tag = message.kind().as_tag();
            if let Some(response) = self.dispatch(message).await {
                if outbound.send(response).is_err() {
                    tracing::debug!(
                        event = "ud.bridge.router.outbound_closed",
                        tag,
                        "response channel closed; stopping router"
                    );
                    break;
                }
            }
        }
    }
}
