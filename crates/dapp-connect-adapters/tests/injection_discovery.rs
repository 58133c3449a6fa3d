mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use dapp_connect_adapters::{
    ConnectConfig, ConnectionManager, LoopbackClient, PageHost, ProviderHost, EXPOSED_MEMBERS,
};
use dapp_connect_core::platform::{OKX_MINI_WALLET_ID, OKX_MINI_WALLET_NAME};
use dapp_connect_core::{
    ChainFamily, ClientEventHandler, ClientOptions, ConnectError, ConnectParams, ConnectionClient,
    ConnectionState, RequestArguments, Session, UserPlatform, WalletDescriptor,
};

use common::{desktop_host, new_manager, telegram_host, DESKTOP_UA};

#[tokio::test]
async fn operations_before_init_are_not_initialized() {
    let manager = new_manager(desktop_host());
    assert_eq!(manager.state(), ConnectionState::Uninitialized);

    let err = manager
        .connect(OKX_MINI_WALLET_ID)
        .await
        .expect_err("connect before init");
    assert!(matches!(err, ConnectError::NotInitialized(_)));
    let err = manager.disconnect().await.expect_err("disconnect before init");
    assert!(matches!(err, ConnectError::NotInitialized(_)));
    assert!(!manager.is_connected());
    assert!(manager.client().is_none());
    assert!(manager.provider(ChainFamily::Ethereum).is_none());
}

#[tokio::test]
async fn init_is_idempotent() {
    let manager = new_manager(desktop_host());
    let first = manager.init().await.expect("first init");
    let second = manager.init().await.expect("second init");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(manager.state(), ConnectionState::Ready);
    assert_eq!(
        first.dapp().map(|d| d.name),
        Some("OKX WalletConnect UI Demo".to_owned())
    );
}

#[tokio::test]
async fn init_installs_one_global_per_chain_family() {
    let host = desktop_host();
    let manager = new_manager(Arc::clone(&host));
    manager.init().await.expect("init");

    for family in ChainFamily::ALL {
        let provider = host.global_provider(family).expect("installed");
        assert_eq!(provider.family(), family);
        assert!(provider.is_okx_connect_provider());
        assert!(!provider.is_connected());
    }
}

#[tokio::test]
async fn existing_global_provider_is_left_alone() {
    let host = Arc::new(
        PageHost::new(DESKTOP_UA).with_foreign_provider(ChainFamily::Ethereum, "MetaMask"),
    );
    let manager = new_manager(Arc::clone(&host));
    manager.init().await.expect("init");

    assert!(host.global_provider(ChainFamily::Ethereum).is_none());
    assert_eq!(
        host.foreign_provider_name(ChainFamily::Ethereum).as_deref(),
        Some("MetaMask")
    );
    assert!(host.global_provider(ChainFamily::Solana).is_some());
    // the facade still exists and is announced even without the global slot
    assert!(manager.provider(ChainFamily::Ethereum).is_some());
    assert_eq!(host.announcements().len(), 1);
}

#[tokio::test]
async fn installing_into_a_taken_slot_fails() {
    let host = desktop_host();
    let manager = new_manager(Arc::clone(&host));
    manager.init().await.expect("init");
    let provider = manager.provider(ChainFamily::Sui).expect("provider");

    let err = host
        .install_global_provider(ChainFamily::Sui, provider)
        .expect_err("slot taken");
    assert!(matches!(err, ConnectError::InvalidState(_)));
}

#[tokio::test]
async fn injected_facade_exposes_only_the_allowed_members() {
    let manager = new_manager(desktop_host());
    manager.init().await.expect("init");
    let provider = manager.provider(ChainFamily::Bitcoin).expect("provider");

    for member in EXPOSED_MEMBERS {
        provider.check_member(member).expect("exposed");
    }
    for member in ["client", "sendAsync", "_events", "disconnect"] {
        assert!(matches!(
            provider.check_member(member),
            Err(ConnectError::Unsupported(_))
        ));
    }
}

#[tokio::test]
async fn ethereum_provider_is_announced_with_mini_wallet_info() {
    let host = desktop_host();
    let manager = new_manager(Arc::clone(&host));
    manager.init().await.expect("init");

    let announcements = host.announcements();
    assert_eq!(announcements.len(), 1);
    assert_eq!(announcements[0].info.id, OKX_MINI_WALLET_ID);
    assert_eq!(announcements[0].info.name, OKX_MINI_WALLET_NAME);
    assert_eq!(announcements[0].provider.family(), ChainFamily::Ethereum);
    assert_eq!(host.broadcast_count(), 1);

    // answering a later requestProvider re-broadcasts
    host.request_providers();
    assert_eq!(host.broadcast_count(), 2);
}

#[tokio::test]
async fn desktop_wallet_list_merges_discovered_wallets_once() {
    let rabby = WalletDescriptor {
        rdns: Some("io.rabby".to_owned()),
        ..WalletDescriptor::new("rabby-uuid", "Rabby Wallet")
    };
    let host = Arc::new(PageHost::new(DESKTOP_UA).with_foreign_wallet(rabby));
    let manager = new_manager(host);
    manager.init().await.expect("init");
    assert_eq!(manager.platform(), UserPlatform::DesktopBrowser);

    let first: Vec<String> = manager.supported_wallets().into_iter().map(|w| w.id).collect();
    let second: Vec<String> = manager.supported_wallets().into_iter().map(|w| w.id).collect();
    assert_eq!(first, vec!["rabby-uuid".to_owned(), OKX_MINI_WALLET_ID.to_owned()]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn telegram_only_offers_the_mini_wallet() {
    let manager = new_manager(telegram_host());
    manager.init().await.expect("init");
    assert_eq!(manager.platform(), UserPlatform::Telegram);

    let wallets = manager.supported_wallets();
    assert_eq!(wallets.len(), 1);
    assert_eq!(wallets[0].id, OKX_MINI_WALLET_ID);

    manager.connect(OKX_MINI_WALLET_ID).await.expect("connect");
    assert!(manager.is_connected());
}

#[tokio::test]
async fn unknown_wallet_id_is_rejected_before_connecting() {
    let manager = new_manager(telegram_host());
    let client = manager.init().await.expect("init");

    let err = manager
        .connect("rabby-uuid")
        .await
        .expect_err("unknown wallet");
    assert!(matches!(err, ConnectError::Unsupported(_)));
    assert_eq!(client.connect_count(), 0);
    assert_eq!(manager.state(), ConnectionState::Ready);
}

#[tokio::test]
async fn connect_forwards_wallet_and_namespaces() {
    let (manager, client) = common::connected_manager().await;
    let session = client.session().expect("session");
    let eip155 = session.namespace("eip155").expect("eip155 namespace");
    assert_eq!(eip155.chains, vec!["eip155:1".to_owned(), "eip155:43114".to_owned()]);
    assert_eq!(eip155.default_chain.as_deref(), Some("1"));
    assert_eq!(
        eip155.rpc_map.get("1").map(String::as_str),
        Some("https://rpc.flashbots.net")
    );
    assert_eq!(session.topic.as_deref(), Some("loopback-1"));
    assert_eq!(
        manager
            .adapter(ChainFamily::Ethereum)
            .and_then(|a| a.active_chain()),
        Some("eip155:1".to_owned())
    );
}

static SLOW_INIT_PENDING: AtomicBool = AtomicBool::new(true);

/// Loopback wallet whose first `init` never resolves.
struct SlowInitClient(LoopbackClient);

impl ConnectionClient for SlowInitClient {
    async fn init(options: &ClientOptions) -> Result<Self, ConnectError> {
        if SLOW_INIT_PENDING.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(SlowInitClient(LoopbackClient::init(options).await?))
    }

    async fn connect(&self, params: &ConnectParams) -> Result<Session, ConnectError> {
        self.0.connect(params).await
    }

    async fn request(
        &self,
        args: &RequestArguments,
        chain: Option<&str>,
    ) -> Result<Value, ConnectError> {
        self.0.request(args, chain).await
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        self.0.disconnect().await
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }

    fn session(&self) -> Option<Session> {
        self.0.session()
    }

    fn subscribe(&self, handler: ClientEventHandler) {
        self.0.subscribe(handler)
    }
}

#[tokio::test]
async fn abandoned_init_can_be_retried() {
    let host = Arc::new(PageHost::<SlowInitClient>::new(DESKTOP_UA));
    let manager = ConnectionManager::new(ConnectConfig::default(), host);

    tokio::select! {
        biased;
        _ = manager.init() => panic!("first init should still be pending"),
        _ = std::future::ready(()) => {}
    }
    assert_eq!(manager.state(), ConnectionState::Uninitialized);

    manager.init().await.expect("retry init");
    assert_eq!(manager.state(), ConnectionState::Ready);
    assert!(manager.provider(ChainFamily::Ethereum).is_some());
}
