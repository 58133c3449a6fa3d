use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;

use dapp_connect_core::methods::{WALLET_ADD_ETHEREUM_CHAIN, WALLET_SWITCH_ETHEREUM_CHAIN};
use dapp_connect_core::{
    ClientEvent, ClientEventHandler, ClientOptions, ConnectError, ConnectParams,
    ConnectionClient, DappMetadata, RequestArguments, Session,
};

pub const BRIDGE_CONNECT: &str = "okx_connect";
pub const BRIDGE_SESSION: &str = "okx_session";
pub const BRIDGE_DISCONNECT: &str = "okx_disconnect";

/// Wallet client that forwards every call as JSON-RPC to a bridge process
/// holding the real wallet connection.
#[derive(Clone)]
pub struct HttpBridgeClient {
    base_url: String,
    dapp: DappMetadata,
    http: reqwest::Client,
    state: Arc<Mutex<BridgeState>>,
}

#[derive(Default)]
struct BridgeState {
    session: Option<Session>,
    handlers: Vec<ClientEventHandler>,
    next_id: u64,
}

impl std::fmt::Debug for HttpBridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBridgeClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpBridgeClient {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Re-reads the session from the bridge and raises `session_update` when
    /// the snapshot changed.
    pub async fn refresh_session(&self) -> Result<Option<Session>, ConnectError> {
        let raw = self.rpc(BRIDGE_SESSION, serde_json::json!([]), None).await?;
        let fresh = decode_session(raw)?;
        let (changed, handlers) = {
            let mut g = self.lock()?;
            let changed = g.session != fresh;
            g.session = fresh.clone();
            (changed, g.handlers.clone())
        };
        if changed {
            let event = match &fresh {
                Some(session) => ClientEvent::SessionUpdate(session.clone()),
                None => ClientEvent::SessionDelete { topic: None },
            };
            for handler in &handlers {
                handler(&event);
            }
        }
        Ok(fresh)
    }

    async fn rpc(
        &self,
        method: &str,
        params: Value,
        chain: Option<&str>,
    ) -> Result<Value, ConnectError> {
        let id = {
            let mut g = self.lock()?;
            g.next_id = g.next_id.saturating_add(1);
            g.next_id
        };
        let mut payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        if let Some(chain) = chain {
            payload["chainId"] = Value::String(chain.to_owned());
        }

        let response = self
            .http
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ConnectError::UpstreamFailure(format!("bridge request failed: {e}")))?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            ConnectError::UpstreamFailure(format!("bridge json decode failed: {e}"))
        })?;
        if !status.is_success() {
            return Err(ConnectError::UpstreamFailure(format!(
                "bridge status {status}: {body}"
            )));
        }
        if let Some(err) = body.get("error") {
            return Err(ConnectError::UpstreamFailure(format!(
                "bridge returned error: {err}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| ConnectError::UpstreamFailure("bridge missing result".to_owned()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, BridgeState>, ConnectError> {
        self.state
            .lock()
            .map_err(|e| ConnectError::InvalidState(format!("bridge lock poisoned: {e}")))
    }
}

impl ConnectionClient for HttpBridgeClient {
    async fn init(options: &ClientOptions) -> Result<Self, ConnectError> {
        let base_url = options.bridge_url.clone().ok_or_else(|| {
            ConnectError::InvalidParams("bridge url not configured".to_owned())
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(options.request_timeout_ms))
            .build()
            .map_err(|e| {
                ConnectError::UpstreamFailure(format!("failed to build bridge client: {e}"))
            })?;
        tracing::info!(%base_url, "bridge client ready");
        Ok(Self {
            base_url,
            dapp: options.dapp.clone(),
            http,
            state: Arc::new(Mutex::new(BridgeState::default())),
        })
    }

    async fn connect(&self, params: &ConnectParams) -> Result<Session, ConnectError> {
        let request = serde_json::json!([{ "dapp": self.dapp, "params": params }]);
        let raw = self.rpc(BRIDGE_CONNECT, request, None).await?;
        let session = decode_session(raw)?.ok_or_else(|| {
            ConnectError::UpstreamFailure("bridge approved no session".to_owned())
        })?;
        self.lock()?.session = Some(session.clone());
        Ok(session)
    }

    async fn request(
        &self,
        args: &RequestArguments,
        chain: Option<&str>,
    ) -> Result<Value, ConnectError> {
        let params = args.params.clone().unwrap_or_else(|| serde_json::json!([]));
        let result = self.rpc(&args.method, params, chain).await?;
        if matches!(
            args.method.as_str(),
            WALLET_SWITCH_ETHEREUM_CHAIN | WALLET_ADD_ETHEREUM_CHAIN
        ) {
            if let Err(e) = self.refresh_session().await {
                tracing::warn!(method = %args.method, "session refresh failed: {e}");
            }
        }
        Ok(result)
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        self.rpc(BRIDGE_DISCONNECT, serde_json::json!([]), None).await?;
        let (session, handlers) = {
            let mut g = self.lock()?;
            (g.session.take(), g.handlers.clone())
        };
        if let Some(session) = session {
            let event = ClientEvent::SessionDelete {
                topic: session.topic,
            };
            for handler in &handlers {
                handler(&event);
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock().map(|g| g.session.is_some()).unwrap_or(false)
    }

    fn session(&self) -> Option<Session> {
        self.lock().ok().and_then(|g| g.session.clone())
    }

    fn subscribe(&self, handler: ClientEventHandler) {
        if let Ok(mut g) = self.lock() {
            g.handlers.push(handler);
        }
    }
}

fn decode_session(raw: Value) -> Result<Option<Session>, ConnectError> {
    if raw.is_null() {
        return Ok(None);
    }
    serde_json::from_value(raw)
        .map(Some)
        .map_err(|e| ConnectError::UpstreamFailure(format!("malformed session: {e}")))
}
