use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use dapp_connect_core::methods;
use dapp_connect_core::{
    group_accounts_by_chain, ChainFamily, ConnectError, ConnectionClient, EventName,
    EventRegistry, Listener, ProviderEvent, RequestArguments, Session, SessionTranslator,
};

use crate::ethereum;
use crate::hub::{ConnectionHub, SessionSink};

/// Per-chain injected-wallet surface: `request`, `on`, `removeListener`.
pub struct ChainAdapter<C: ConnectionClient> {
    family: ChainFamily,
    hub: Arc<ConnectionHub<C>>,
    state: Mutex<AdapterState>,
}

struct AdapterState {
    translator: SessionTranslator,
    registry: EventRegistry,
}

impl<C: ConnectionClient> std::fmt::Debug for ChainAdapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAdapter")
            .field("family", &self.family)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl<C: ConnectionClient> ChainAdapter<C> {
    pub fn new(family: ChainFamily, hub: Arc<ConnectionHub<C>>) -> Self {
        Self {
            family,
            hub,
            state: Mutex::new(AdapterState {
                translator: SessionTranslator::new(family.namespace()),
                registry: EventRegistry::default(),
            }),
        }
    }

    pub fn family(&self) -> ChainFamily {
        self.family
    }

    pub fn supported_methods(&self) -> &'static [&'static str] {
        methods::supported_methods(self.family)
    }

    pub async fn request(&self, args: RequestArguments) -> Result<Value, ConnectError> {
        if !methods::is_supported(self.family, &args.method) {
            tracing::warn!(family = %self.family, method = %args.method, "method not supported");
            return Err(ConnectError::Unsupported(format!(
                "method {} not supported",
                args.method
            )));
        }
        if methods::account_request_method(self.family) == Some(args.method.as_str()) {
            return self.request_accounts().await;
        }
        if !self.hub.client().is_connected() {
            tracing::warn!(
                family = %self.family,
                method = %args.method,
                "request without a session"
            );
            return Err(ConnectError::NotInitialized(
                "no active session; connect first".to_owned(),
            ));
        }

        let prepared = match self.family {
            ChainFamily::Ethereum => ethereum::prepare_request(args)?,
            _ => args,
        };
        let chain = self.active_chain();
        let result = self
            .hub
            .client()
            .request(&prepared, chain.as_deref())
            .await;
        match &result {
            Ok(value) => tracing::debug!(method = %prepared.method, %value, "request resolved"),
            Err(e) => tracing::error!(method = %prepared.method, "request rejected: {e}"),
        }
        result
    }

    /// Registers `listener` for `event`; unknown event names are ignored.
    pub fn on(&self, event: &str, listener: Listener) -> bool {
        let name = match event.parse::<EventName>() {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(family = %self.family, "on: {e}");
                return false;
            }
        };
        match self.lock() {
            Ok(mut g) => g.registry.subscribe(name, listener),
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        }
    }

    pub fn remove_listener(&self, event: &str, listener: &Listener) -> bool {
        let Ok(name) = event.parse::<EventName>() else {
            tracing::warn!(family = %self.family, event, "removeListener for unknown event");
            return false;
        };
        self.lock()
            .map(|mut g| g.registry.unsubscribe(name, listener))
            .unwrap_or(false)
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.lock()
            .map(|g| g.registry.listener_count(event))
            .unwrap_or(0)
    }

    pub fn is_connected(&self) -> bool {
        self.hub.client().is_connected()
    }

    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        self.hub.disconnect().await
    }

    /// `namespace:reference` the next forwarded call is scoped to.
    pub fn active_chain(&self) -> Option<String> {
        let from_translator = self
            .lock()
            .ok()
            .and_then(|g| g.translator.active_chain());
        from_translator.or_else(|| {
            self.hub
                .client()
                .session()
                .and_then(|s| s.active_chain(self.family.namespace()))
        })
    }

    pub fn last_session(&self) -> Option<Session> {
        self.lock()
            .ok()
            .and_then(|g| g.translator.last_session().cloned())
    }

    async fn request_accounts(&self) -> Result<Value, ConnectError> {
        if !self.hub.client().is_connected() {
            tracing::info!(family = %self.family, "no session, opening connect flow");
            self.hub.connect(None).await?;
        }
        Ok(Value::from(self.cached_accounts()))
    }

    /// Accounts the session approved on the active chain, without a wallet round trip.
    fn cached_accounts(&self) -> Vec<String> {
        let Some(session) = self.last_session().or_else(|| self.hub.client().session()) else {
            return Vec::new();
        };
        let namespace = self.family.namespace();
        let (Some(ns), Some(chain)) = (
            session.namespace(namespace),
            session.active_chain(namespace),
        ) else {
            return Vec::new();
        };
        group_accounts_by_chain(&ns.accounts)
            .remove(&chain)
            .unwrap_or_default()
    }

    fn translate_and_emit(
        &self,
        step: impl FnOnce(&mut SessionTranslator) -> Option<ProviderEvent>,
    ) {
        let (event, listeners) = match self.lock() {
            Ok(mut g) => {
                let Some(event) = step(&mut g.translator) else {
                    return;
                };
                let listeners = g.registry.listeners_for(event.name());
                (event, listeners)
            }
            Err(e) => {
                tracing::error!("{e}");
                return;
            }
        };
        tracing::debug!(family = %self.family, ?event, listeners = listeners.len(), "emitting");
        for listener in &listeners {
            listener(&event);
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, AdapterState>, ConnectError> {
        self.state
            .lock()
            .map_err(|e| ConnectError::InvalidState(format!("adapter lock poisoned: {e}")))
    }
}

impl<C: ConnectionClient> SessionSink for ChainAdapter<C> {
    fn family(&self) -> ChainFamily {
        self.family
    }

    fn on_session_update(&self, session: &Session) {
        let namespace = self.family.namespace();
        self.translate_and_emit(|t| {
            // chains the wallet never approved stay silent
            if t.last_session().is_none() && session.namespace(namespace).is_none() {
                return None;
            }
            Some(t.apply_update(session.clone()))
        });
    }

    fn on_session_delete(&self) {
        self.translate_and_emit(|t| {
            t.last_session()?;
            Some(t.apply_delete())
        });
    }
}
