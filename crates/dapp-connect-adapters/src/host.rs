use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use dapp_connect_core::{
    detect_platform, ChainFamily, ConnectError, ConnectionClient, UserPlatform, WalletDescriptor,
};

use crate::injected::{InjectedProvider, ProviderAnnouncement};

/// The page the SDK runs in: global provider slots plus the EIP-6963 bus.
pub trait ProviderHost<C: ConnectionClient>: Send + Sync {
    fn platform(&self) -> UserPlatform;

    fn has_global_provider(&self, family: ChainFamily) -> bool;

    /// Fails when the slot is already taken.
    fn install_global_provider(
        &self,
        family: ChainFamily,
        provider: InjectedProvider<C>,
    ) -> Result<(), ConnectError>;

    /// Broadcasts the announcement now and again on every later
    /// `requestProvider`.
    fn announce_provider(&self, announcement: ProviderAnnouncement<C>);

    /// Dispatches `requestProvider` and returns every wallet that answered.
    fn request_providers(&self) -> Vec<WalletDescriptor>;
}

enum GlobalSlot<C: ConnectionClient> {
    Foreign(String),
    Synthetic(InjectedProvider<C>),
}

struct PageState<C: ConnectionClient> {
    globals: BTreeMap<ChainFamily, GlobalSlot<C>>,
    announcements: Vec<ProviderAnnouncement<C>>,
    foreign_wallets: Vec<WalletDescriptor>,
    broadcasts: usize,
}

/// In-process page model used by the demo and tests.
pub struct PageHost<C: ConnectionClient> {
    user_agent: String,
    webview_bridge: bool,
    state: Mutex<PageState<C>>,
}

impl<C: ConnectionClient> PageHost<C> {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            webview_bridge: false,
            state: Mutex::new(PageState {
                globals: BTreeMap::new(),
                announcements: Vec::new(),
                foreign_wallets: Vec::new(),
                broadcasts: 0,
            }),
        }
    }

    pub fn with_telegram_bridge(mut self) -> Self {
        self.webview_bridge = true;
        self
    }

    /// Simulates an installed extension that already owns `window.<family>`.
    pub fn with_foreign_provider(self, family: ChainFamily, name: impl Into<String>) -> Self {
        if let Ok(mut g) = self.state.lock() {
            g.globals.insert(family, GlobalSlot::Foreign(name.into()));
        }
        self
    }

    /// Simulates another wallet answering `requestProvider`.
    pub fn with_foreign_wallet(self, info: WalletDescriptor) -> Self {
        if let Ok(mut g) = self.state.lock() {
            g.foreign_wallets.push(info);
        }
        self
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The synthetic provider at `window.<family>`, if this SDK installed it.
    pub fn global_provider(&self, family: ChainFamily) -> Option<InjectedProvider<C>> {
        let g = self.lock().ok()?;
        match g.globals.get(&family) {
            Some(GlobalSlot::Synthetic(provider)) => Some(provider.clone()),
            _ => None,
        }
    }

    pub fn foreign_provider_name(&self, family: ChainFamily) -> Option<String> {
        let g = self.lock().ok()?;
        match g.globals.get(&family) {
            Some(GlobalSlot::Foreign(name)) => Some(name.clone()),
            _ => None,
        }
    }

    pub fn announcements(&self) -> Vec<ProviderAnnouncement<C>> {
        self.lock()
            .map(|g| g.announcements.clone())
            .unwrap_or_default()
    }

    /// Number of `announceProvider` events dispatched so far.
    pub fn broadcast_count(&self) -> usize {
        self.lock().map(|g| g.broadcasts).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, PageState<C>>, ConnectError> {
        self.state
            .lock()
            .map_err(|e| ConnectError::InvalidState(format!("page lock poisoned: {e}")))
    }
}

impl<C: ConnectionClient> ProviderHost<C> for PageHost<C> {
    fn platform(&self) -> UserPlatform {
        detect_platform(&self.user_agent, self.webview_bridge)
    }

    fn has_global_provider(&self, family: ChainFamily) -> bool {
        self.lock()
            .map(|g| g.globals.contains_key(&family))
            .unwrap_or(true)
    }

    fn install_global_provider(
        &self,
        family: ChainFamily,
        provider: InjectedProvider<C>,
    ) -> Result<(), ConnectError> {
        let mut g = self.lock()?;
        if g.globals.contains_key(&family) {
            return Err(ConnectError::InvalidState(format!(
                "window.{} is already defined",
                family.global_name()
            )));
        }
        g.globals.insert(family, GlobalSlot::Synthetic(provider));
        tracing::info!(global = family.global_name(), "installed synthetic provider");
        Ok(())
    }

    fn announce_provider(&self, announcement: ProviderAnnouncement<C>) {
        match self.lock() {
            Ok(mut g) => {
                tracing::info!(wallet = %announcement.info.name, "eip6963:announceProvider");
                g.announcements.push(announcement);
                g.broadcasts += 1;
            }
            Err(e) => tracing::error!("{e}"),
        }
    }

    fn request_providers(&self) -> Vec<WalletDescriptor> {
        let Ok(mut g) = self.lock() else {
            return Vec::new();
        };
        tracing::debug!("eip6963:requestProvider");
        let answered = g.announcements.len();
        g.broadcasts += answered;
        g.foreign_wallets
            .iter()
            .cloned()
            .chain(g.announcements.iter().map(|a| a.info.clone()))
            .collect()
    }
}
