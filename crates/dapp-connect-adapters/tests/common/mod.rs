#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use dapp_connect_adapters::{
    ConnectConfig, ConnectionManager, LoopbackClient, PageHost, ProviderHost,
};
use dapp_connect_core::platform::OKX_MINI_WALLET_ID;
use dapp_connect_core::{ChainFamily, ConnectionClient, Listener, ProviderEvent};

pub const DESKTOP_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 Version/17.4 Safari/605.1.15";
pub const TELEGRAM_UA: &str =
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 Telegram-Android/10.9.1";

pub type TestHost = PageHost<LoopbackClient>;
pub type TestManager = ConnectionManager<LoopbackClient, TestHost>;

pub fn desktop_host() -> Arc<TestHost> {
    Arc::new(PageHost::new(DESKTOP_UA))
}

pub fn telegram_host() -> Arc<TestHost> {
    Arc::new(PageHost::new(TELEGRAM_UA).with_telegram_bridge())
}

pub fn new_manager(host: Arc<TestHost>) -> TestManager {
    ConnectionManager::new(ConnectConfig::default(), host)
}

pub async fn connected_manager() -> (TestManager, Arc<LoopbackClient>) {
    let manager = new_manager(desktop_host());
    let client = manager.init().await.expect("init");
    manager.connect(OKX_MINI_WALLET_ID).await.expect("connect");
    (manager, client)
}

/// Listener that records every event it sees, in order.
pub fn recording_listener() -> (Listener, Arc<Mutex<Vec<ProviderEvent>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: Listener = Arc::new(move |event: &ProviderEvent| {
        sink.lock().expect("listener lock").push(event.clone());
    });
    (listener, seen)
}

/// Subscribes one recorder to all four events of `family`.
pub fn record_all<C: ConnectionClient, H: ProviderHost<C>>(
    manager: &ConnectionManager<C, H>,
    family: ChainFamily,
) -> Arc<Mutex<Vec<ProviderEvent>>> {
    let (listener, seen) = recording_listener();
    let adapter = manager.adapter(family).expect("adapter");
    for event in ["connect", "disconnect", "chainChanged", "accountsChanged"] {
        assert!(adapter.on(event, Arc::clone(&listener)));
    }
    seen
}

pub fn events(seen: &Arc<Mutex<Vec<ProviderEvent>>>) -> Vec<ProviderEvent> {
    seen.lock().expect("events lock").clone()
}
