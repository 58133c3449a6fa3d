use std::sync::{Arc, Mutex, MutexGuard, Weak};

use dapp_connect_core::{
    connection_transition, ChainFamily, ClientEvent, ConnectError, ConnectParams,
    ConnectionAction, ConnectionClient, ConnectionState, Session, StateTransition,
};

/// Receiver of relayed session lifecycle callbacks.
pub trait SessionSink: Send + Sync {
    fn family(&self) -> ChainFamily;
    fn on_session_update(&self, session: &Session);
    fn on_session_delete(&self);
}

/// Owns the connected client and its session lifecycle once the manager has
/// initialized. Chain adapters delegate to it.
pub struct ConnectionHub<C: ConnectionClient> {
    client: Arc<C>,
    connect_params: ConnectParams,
    state: Mutex<HubState>,
}

struct HubState {
    connection: ConnectionState,
    sinks: Vec<Weak<dyn SessionSink>>,
    wired: bool,
    transitions: Vec<StateTransition>,
}

impl<C: ConnectionClient> ConnectionHub<C> {
    pub fn new(client: Arc<C>, connect_params: ConnectParams) -> Arc<Self> {
        Arc::new(Self {
            client,
            connect_params,
            state: Mutex::new(HubState {
                connection: ConnectionState::Ready,
                sinks: Vec::new(),
                wired: false,
                transitions: Vec::new(),
            }),
        })
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn state(&self) -> ConnectionState {
        self.lock()
            .map(|g| g.connection)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Transition log, oldest first.
    pub fn transitions(&self) -> Vec<StateTransition> {
        self.lock()
            .map(|g| g.transitions.clone())
            .unwrap_or_default()
    }

    pub fn register_sink(&self, sink: Weak<dyn SessionSink>) -> Result<(), ConnectError> {
        self.lock()?.sinks.push(sink);
        Ok(())
    }

    pub async fn connect(self: &Arc<Self>, wallet_id: Option<&str>) -> Result<Session, ConnectError> {
        if self.state() == ConnectionState::Connected {
            if let Some(session) = self.client.session() {
                tracing::debug!("already connected, reusing session");
                return Ok(session);
            }
            // client dropped the session without a session_delete callback
            self.transition(ConnectionAction::SessionDeleted)?;
            self.relay_delete();
        }
        self.transition(ConnectionAction::BeginConnect)?;

        let mut params = self.connect_params.clone();
        params.wallet_id = wallet_id.map(str::to_owned);
        match self.client.connect(&params).await {
            Ok(session) => {
                self.transition(ConnectionAction::ConnectSucceeded)?;
                self.wire()?;
                self.relay_update(&session);
                Ok(session)
            }
            Err(e) => {
                tracing::warn!("connect failed: {e}");
                self.transition(ConnectionAction::ConnectFailed)?;
                Err(e)
            }
        }
    }

    pub async fn disconnect(&self) -> Result<(), ConnectError> {
        if matches!(
            self.state(),
            ConnectionState::Ready | ConnectionState::Disconnected
        ) {
            tracing::debug!("disconnect requested without an active session");
            return Ok(());
        }
        self.transition(ConnectionAction::BeginDisconnect)?;
        match self.client.disconnect().await {
            Ok(()) => {
                self.transition(ConnectionAction::DisconnectSucceeded)?;
                self.relay_delete();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("disconnect failed: {e}");
                self.transition(ConnectionAction::DisconnectFailed)?;
                Err(e)
            }
        }
    }

    /// Entry point for raw client callbacks.
    pub fn handle_client_event(&self, event: &ClientEvent) {
        match event {
            ClientEvent::SessionUpdate(session) => {
                if self.state() != ConnectionState::Connected {
                    tracing::warn!(state = ?self.state(), "ignoring session_update");
                    return;
                }
                self.relay_update(session);
            }
            ClientEvent::SessionDelete { topic } => {
                if self.state() != ConnectionState::Connected {
                    tracing::debug!(state = ?self.state(), ?topic, "ignoring session_delete");
                    return;
                }
                if let Err(e) = self.transition(ConnectionAction::SessionDeleted) {
                    tracing::error!("session_delete transition failed: {e}");
                    return;
                }
                self.relay_delete();
            }
            ClientEvent::DisplayUri(uri) => tracing::info!(%uri, "wallet connect uri"),
            ClientEvent::DefaultChainChanged(chain) => {
                tracing::debug!(%chain, "client default chain changed")
            }
        }
    }

    fn wire(self: &Arc<Self>) -> Result<(), ConnectError> {
        {
            let mut g = self.lock()?;
            if g.wired {
                return Ok(());
            }
            g.wired = true;
        }
        let weak = Arc::downgrade(self);
        self.client.subscribe(Arc::new(move |event: &ClientEvent| {
            if let Some(hub) = weak.upgrade() {
                hub.handle_client_event(event);
            }
        }));
        tracing::debug!("client lifecycle callbacks wired");
        Ok(())
    }

    fn relay_update(&self, session: &Session) {
        for sink in self.live_sinks() {
            sink.on_session_update(session);
        }
    }

    fn relay_delete(&self) {
        for sink in self.live_sinks() {
            sink.on_session_delete();
        }
    }

    fn live_sinks(&self) -> Vec<Arc<dyn SessionSink>> {
        match self.lock() {
            Ok(mut g) => {
                g.sinks.retain(|s| s.strong_count() > 0);
                g.sinks.iter().filter_map(Weak::upgrade).collect()
            }
            Err(e) => {
                tracing::error!("{e}");
                Vec::new()
            }
        }
    }

    fn transition(&self, action: ConnectionAction) -> Result<StateTransition, ConnectError> {
        let mut g = self.lock()?;
        let (to, transition) = connection_transition(g.connection, action)?;
        tracing::info!(from = ?transition.from, to = ?to, reason = transition.reason, "connection state");
        g.connection = to;
        g.transitions.push(transition.clone());
        Ok(transition)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>, ConnectError> {
        self.state
            .lock()
            .map_err(|e| ConnectError::InvalidState(format!("hub lock poisoned: {e}")))
    }
}
