use std::sync::Arc;

use serde_json::Value;

use dapp_connect_core::{
    ChainFamily, ConnectError, ConnectionClient, Listener, RequestArguments, WalletDescriptor,
};

use crate::adapter::ChainAdapter;

/// Members a page script may touch on an injected provider.
pub const EXPOSED_MEMBERS: &[&str] = &[
    "request",
    "on",
    "removeListener",
    "isConnected",
    "isOKXConnectProvider",
];

/// Restricted facade installed as the page-global provider.
pub struct InjectedProvider<C: ConnectionClient> {
    adapter: Arc<ChainAdapter<C>>,
}

impl<C: ConnectionClient> Clone for InjectedProvider<C> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
        }
    }
}

impl<C: ConnectionClient> std::fmt::Debug for InjectedProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectedProvider")
            .field("family", &self.adapter.family())
            .finish()
    }
}

impl<C: ConnectionClient> InjectedProvider<C> {
    pub fn new(adapter: Arc<ChainAdapter<C>>) -> Self {
        Self { adapter }
    }

    pub fn family(&self) -> ChainFamily {
        self.adapter.family()
    }

    pub async fn request(&self, args: RequestArguments) -> Result<Value, ConnectError> {
        self.adapter.request(args).await
    }

    pub fn on(&self, event: &str, listener: Listener) -> bool {
        self.adapter.on(event, listener)
    }

    pub fn remove_listener(&self, event: &str, listener: &Listener) -> bool {
        self.adapter.remove_listener(event, listener)
    }

    pub fn is_connected(&self) -> bool {
        self.adapter.is_connected()
    }

    pub fn is_okx_connect_provider(&self) -> bool {
        true
    }

    pub fn exposed_members(&self) -> &'static [&'static str] {
        EXPOSED_MEMBERS
    }

    /// Gate for dynamic property access coming from a script bridge.
    pub fn check_member(&self, member: &str) -> Result<(), ConnectError> {
        if EXPOSED_MEMBERS.contains(&member) {
            Ok(())
        } else {
            tracing::warn!(family = %self.family(), member, "blocked provider member access");
            Err(ConnectError::Unsupported(format!("member {member} not exposed")))
        }
    }
}

/// EIP-6963 `announceProvider` detail.
pub struct ProviderAnnouncement<C: ConnectionClient> {
    pub info: WalletDescriptor,
    pub provider: InjectedProvider<C>,
}

impl<C: ConnectionClient> Clone for ProviderAnnouncement<C> {
    fn clone(&self) -> Self {
        Self {
            info: self.info.clone(),
            provider: self.provider.clone(),
        }
    }
}
