//! Full-pipeline assembly: client ↔ relay ↔ router over in-process channels.
//!
//! Each execution context runs single-threaded event processing with
//! run-to-completion semantics; concurrency exists only between contexts,
//! through these channels. `launch` wires the three contexts the way the
//! extension wires page, relay frame, and controller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::client::BridgeClient;
use crate::config::BridgeConfig;
use crate::correlator::Correlator;
use crate::platform::{KeyValueStore, PageSurface, WindowSystem};
use crate::registry::WindowRegistry;
use crate::relay::Relay;
use crate::router::Router;
use crate::storage::StorageAdapter;

pub struct Bridge {
    pub client: BridgeClient,
    relay_task: JoinHandle<()>,
    router_task: JoinHandle<()>,
}

impl Bridge {
    /// Spawn the router and relay tasks and hand back the page-side client.
    #[must_use]
    pub fn launch(
        config: BridgeConfig,
        store: Arc<dyn KeyValueStore>,
        windows: Arc<dyn WindowSystem>,
        page: Option<Arc<dyn PageSurface>>,
    ) -> Self {
        let storage = StorageAdapter::new(Arc::clone(&store));
        let registry = Arc::new(WindowRegistry::new(store, windows));
        let router = Router::with_defaults(storage, registry, page);
        Self::launch_with_router(config, router)
    }

    /// Same wiring with a caller-built router, for custom handler sets.
    #[must_use]
    pub fn launch_with_router(config: BridgeConfig, router: Router) -> Self {
        let (page_out_tx, page_out_rx) = mpsc::unbounded_channel();
        let (page_in_tx, page_in_rx) = mpsc::unbounded_channel();
        let (router_in_tx, router_in_rx) = mpsc::unbounded_channel();
        let (router_out_tx, router_out_rx) = mpsc::unbounded_channel();

        let router_task = tokio::spawn(router.run(router_in_rx, router_out_tx));
        let relay = Relay::new(config.allowed_origin.clone());
        let relay_task =
            tokio::spawn(relay.run(page_out_rx, router_in_tx, router_out_rx, page_in_tx));

        let correlator = Correlator::new(
            config.page_origin,
            config.request_timeout,
            page_out_tx,
            page_in_rx,
        );
        Self {
            client: BridgeClient::new(correlator),
            relay_task,
            router_task,
        }
    }

    /// Tear the background tasks down. Dropping the bridge does the same.
    pub fn shutdown(&self) {
        self.relay_task.abort();
        self.router_task.abort();
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}
