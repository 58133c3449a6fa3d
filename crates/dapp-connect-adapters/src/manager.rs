use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use dapp_connect_core::{
    connection_transition, ChainFamily, ConnectError, ConnectionAction, ConnectionClient,
    ConnectionState, Session, UserPlatform, WalletDescriptor, WalletRegistry,
};

use crate::adapter::ChainAdapter;
use crate::config::ConnectConfig;
use crate::host::ProviderHost;
use crate::hub::{ConnectionHub, SessionSink};
use crate::injected::{InjectedProvider, ProviderAnnouncement};

/// Entry point of the SDK. Construct one per page and pass it around.
pub struct ConnectionManager<C: ConnectionClient, H: ProviderHost<C>> {
    config: ConnectConfig,
    host: Arc<H>,
    slot: Mutex<Slot<C>>,
    wallets: Mutex<WalletRegistry>,
}

enum Slot<C: ConnectionClient> {
    Uninitialized,
    Initializing,
    Ready(Initialized<C>),
}

struct Initialized<C: ConnectionClient> {
    hub: Arc<ConnectionHub<C>>,
    adapters: BTreeMap<ChainFamily, Arc<ChainAdapter<C>>>,
}

impl<C: ConnectionClient> Clone for Initialized<C> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            adapters: self.adapters.clone(),
        }
    }
}

impl<C: ConnectionClient, H: ProviderHost<C>> ConnectionManager<C, H> {
    pub fn new(config: ConnectConfig, host: Arc<H>) -> Self {
        Self {
            config,
            host,
            slot: Mutex::new(Slot::Uninitialized),
            wallets: Mutex::new(WalletRegistry::default()),
        }
    }

    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn state(&self) -> ConnectionState {
        match self.lock_slot().as_deref() {
            Ok(Slot::Uninitialized) | Err(_) => ConnectionState::Uninitialized,
            Ok(Slot::Initializing) => ConnectionState::Initializing,
            Ok(Slot::Ready(init)) => init.hub.state(),
        }
    }

    /// Constructs the client on first call; later calls return the same one.
    pub async fn init(&self) -> Result<Arc<C>, ConnectError> {
        {
            let mut slot = self.lock_slot()?;
            let current = match &*slot {
                Slot::Ready(init) => return Ok(Arc::clone(init.hub.client())),
                Slot::Initializing => ConnectionState::Initializing,
                Slot::Uninitialized => ConnectionState::Uninitialized,
            };
            connection_transition(current, ConnectionAction::BeginInit)?;
            *slot = Slot::Initializing;
        }
        let mut guard = InitGuard {
            slot: &self.slot,
            armed: true,
        };
        tracing::info!(app = %self.config.app_name, "initializing connect sdk");

        let client = match C::init(&self.config.client_options()).await {
            Ok(client) => Arc::new(client),
            Err(e) => {
                tracing::error!("failed to initialize wallet client: {e}");
                return Err(e);
            }
        };

        let hub = ConnectionHub::new(Arc::clone(&client), self.config.connect_params());
        let mut adapters = BTreeMap::new();
        for family in &self.config.chains {
            let adapter = Arc::new(ChainAdapter::new(*family, Arc::clone(&hub)));
            let sink: Weak<dyn SessionSink> = Arc::downgrade(&adapter) as Weak<dyn SessionSink>;
            hub.register_sink(sink)?;
            adapters.insert(*family, adapter);
        }
        self.install_providers(&adapters);

        *self.lock_slot()? = Slot::Ready(Initialized { hub, adapters });
        guard.armed = false;
        tracing::info!("connect sdk initialized");
        Ok(client)
    }

    /// Opens the connect flow for `wallet_id`.
    pub async fn connect(&self, wallet_id: &str) -> Result<Session, ConnectError> {
        tracing::info!(wallet_id, "connecting to wallet");
        let init = self.initialized().inspect_err(|e| tracing::error!("{e}"))?;
        let known = self
            .supported_wallets()
            .iter()
            .any(|w| w.id == wallet_id);
        if !known {
            return Err(ConnectError::Unsupported(format!(
                "wallet {wallet_id} is not available on this platform"
            )));
        }
        init.hub.connect(Some(wallet_id)).await
    }

    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        tracing::info!("disconnecting from wallet");
        let init = self.initialized().inspect_err(|e| tracing::error!("{e}"))?;
        init.hub.disconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.initialized()
            .map(|init| init.hub.client().is_connected())
            .unwrap_or(false)
    }

    pub fn client(&self) -> Option<Arc<C>> {
        self.initialized()
            .ok()
            .map(|init| Arc::clone(init.hub.client()))
    }

    pub fn adapter(&self, family: ChainFamily) -> Option<Arc<ChainAdapter<C>>> {
        self.initialized().ok()?.adapters.get(&family).cloned()
    }

    /// Facade for `family`, whether or not it was installed on the host.
    pub fn provider(&self, family: ChainFamily) -> Option<InjectedProvider<C>> {
        self.adapter(family).map(InjectedProvider::new)
    }

    pub fn platform(&self) -> UserPlatform {
        self.host.platform()
    }

    pub fn supported_wallets(&self) -> Vec<WalletDescriptor> {
        let platform = self.host.platform();
        let Ok(mut registry) = self.wallets.lock() else {
            return Vec::new();
        };
        if platform == UserPlatform::DesktopBrowser {
            for info in self.host.request_providers() {
                registry.record_announcement(info);
            }
        }
        registry.supported_wallets(platform)
    }

    fn install_providers(&self, adapters: &BTreeMap<ChainFamily, Arc<ChainAdapter<C>>>) {
        for (family, adapter) in adapters {
            let provider = InjectedProvider::new(Arc::clone(adapter));
            if self.config.inject_providers {
                if self.host.has_global_provider(*family) {
                    tracing::info!(global = family.global_name(), "global provider already present");
                } else if let Err(e) = self
                    .host
                    .install_global_provider(*family, provider.clone())
                {
                    tracing::error!("provider injection failed: {e}");
                }
            }
            if *family == ChainFamily::Ethereum && self.config.announce_provider {
                self.host.announce_provider(ProviderAnnouncement {
                    info: self.config.wallet_info.clone(),
                    provider,
                });
            }
        }
    }

    fn initialized(&self) -> Result<Initialized<C>, ConnectError> {
        match &*self.lock_slot()? {
            Slot::Ready(init) => Ok(init.clone()),
            Slot::Uninitialized | Slot::Initializing => Err(ConnectError::NotInitialized(
                "call init() before using the connection manager".to_owned(),
            )),
        }
    }

    fn lock_slot(&self) -> Result<MutexGuard<'_, Slot<C>>, ConnectError> {
        self.slot
            .lock()
            .map_err(|e| ConnectError::InvalidState(format!("manager lock poisoned: {e}")))
    }
}

/// Puts an abandoned or failed init back to `Uninitialized` so a later call can retry.
struct InitGuard<'a, C: ConnectionClient> {
    slot: &'a Mutex<Slot<C>>,
    armed: bool,
}

impl<C: ConnectionClient> Drop for InitGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slot = match self.slot.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if matches!(*slot, Slot::Initializing) {
            tracing::warn!("connect sdk init abandoned, resetting");
            *slot = Slot::Uninitialized;
        }
    }
}
