//! Single-instance window behavior through the full pipeline, including
//! persistence of the name→handle mapping across a router restart.

use std::sync::Arc;

use ud_bridge::platform::{
    JsonFileKv, KeyValueStore, MemoryKv, SimWindows, WindowSystem,
};
use ud_bridge::{Bridge, BridgeConfig, WindowCreate};

fn named(name: &str) -> WindowCreate {
    WindowCreate {
        url: Some("https://x".to_string()),
        name: Some(name.to_string()),
        ..WindowCreate::default()
    }
}

#[tokio::test]
async fn second_create_with_same_name_reuses_the_window() {
    let kv = Arc::new(MemoryKv::new());
    let windows = Arc::new(SimWindows::new());
    let bridge = Bridge::launch(
        BridgeConfig::new(),
        Arc::clone(&kv) as Arc<dyn KeyValueStore>,
        Arc::clone(&windows) as Arc<dyn WindowSystem>,
        None,
    );

    let first = bridge
        .client
        .create_window(named("main"))
        .await
        .expect("first create");
    let second = bridge
        .client
        .create_window(named("main"))
        .await
        .expect("second create");

    assert!(first.ok && second.ok);
    assert_eq!(first.window_id, second.window_id);
    assert_eq!(windows.created_count(), 1, "no duplicate window");
}

#[tokio::test]
async fn closed_window_is_not_resurrected() {
    let kv = Arc::new(MemoryKv::new());
    let windows = Arc::new(SimWindows::new());
    let bridge = Bridge::launch(
        BridgeConfig::new(),
        Arc::clone(&kv) as Arc<dyn KeyValueStore>,
        Arc::clone(&windows) as Arc<dyn WindowSystem>,
        None,
    );

    let first = bridge
        .client
        .create_window(named("main"))
        .await
        .expect("first create");
    windows.close_from_outside(first.window_id.expect("windowId"));

    let second = bridge
        .client
        .create_window(named("main"))
        .await
        .expect("recreate");
    assert!(second.ok);
    assert_ne!(first.window_id, second.window_id);
    assert_eq!(windows.created_count(), 2);
}

#[tokio::test]
async fn unnamed_windows_always_multiply() {
    let kv = Arc::new(MemoryKv::new());
    let windows = Arc::new(SimWindows::new());
    let bridge = Bridge::launch(
        BridgeConfig::new(),
        Arc::clone(&kv) as Arc<dyn KeyValueStore>,
        Arc::clone(&windows) as Arc<dyn WindowSystem>,
        None,
    );

    let a = bridge
        .client
        .create_window(WindowCreate::default())
        .await
        .expect("a");
    let b = bridge
        .client
        .create_window(WindowCreate::default())
        .await
        .expect("b");
    assert_ne!(a.window_id, b.window_id);
    assert_eq!(windows.created_count(), 2);
}

#[tokio::test]
async fn mapping_survives_a_router_restart_on_file_backed_storage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bridge-store.json");
    let windows = Arc::new(SimWindows::new());

    let first = {
        let kv = Arc::new(JsonFileKv::new(&path));
        let bridge = Bridge::launch(
            BridgeConfig::new(),
            kv as Arc<dyn KeyValueStore>,
            Arc::clone(&windows) as Arc<dyn WindowSystem>,
            None,
        );
        bridge
            .client
            .create_window(named("main"))
            .await
            .expect("create before restart")
    };

    // Fresh bridge over the same storage file and the same window system:
    // the persisted mapping still points at the live window.
    let kv = Arc::new(JsonFileKv::new(&path));
    let bridge = Bridge::launch(
        BridgeConfig::new(),
        kv as Arc<dyn KeyValueStore>,
        Arc::clone(&windows) as Arc<dyn WindowSystem>,
        None,
    );
    let second = bridge
        .client
        .create_window(named("main"))
        .await
        .expect("create after restart");

    assert_eq!(first.window_id, second.window_id);
    assert_eq!(windows.created_count(), 1);
}
