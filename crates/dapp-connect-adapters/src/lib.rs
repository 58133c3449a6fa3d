pub mod adapter;
#[cfg(not(target_arch = "wasm32"))]
pub mod bridge;
#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod config;
pub mod ethereum;
pub mod host;
pub mod hub;
pub mod injected;
pub mod loopback;
pub mod manager;

pub use adapter::ChainAdapter;
#[cfg(not(target_arch = "wasm32"))]
pub use bridge::HttpBridgeClient;
#[cfg(target_arch = "wasm32")]
pub use browser::BrowserWalletDiscovery;
pub use config::ConnectConfig;
pub use host::{PageHost, ProviderHost};
pub use hub::{ConnectionHub, SessionSink};
pub use injected::{InjectedProvider, ProviderAnnouncement, EXPOSED_MEMBERS};
pub use loopback::{LoopbackClient, RecordedRequest, LOOPBACK_ACCOUNT};
pub use manager::ConnectionManager;
