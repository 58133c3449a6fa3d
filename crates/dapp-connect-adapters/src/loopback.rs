//! Deterministic in-process wallet client.
//!
//! Answers the EVM and stub-chain methods locally, signs with keccak-derived
//! placeholders and raises the same lifecycle callbacks a remote wallet
//! would. Test hooks let callers inject session updates, deletions and
//! failures.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::Poll;

use alloy::primitives::keccak256;
use serde_json::Value;

use dapp_connect_core::methods::{
    self, ETH_ACCOUNTS, ETH_CHAIN_ID, ETH_SEND_TRANSACTION, ETH_SIGN_TYPED_DATA_V4,
    PERSONAL_SIGN, WALLET_ADD_ETHEREUM_CHAIN, WALLET_SWITCH_ETHEREUM_CHAIN, WALLET_WATCH_ASSET,
};
use dapp_connect_core::{
    group_accounts_by_chain, ChainFamily, ClientEvent, ClientEventHandler, ClientOptions,
    ConnectError, ConnectParams, ConnectionClient, DappMetadata, NamespaceSession,
    RequestArguments, Session,
};

use crate::ethereum::{chain_id_to_hex, parse_chain_id};

pub const LOOPBACK_ACCOUNT: &str = "0xfcd218cc65bca1dfe5fee91e8a2182d5643b094c";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Option<Value>,
    pub chain: Option<String>,
}

#[derive(Clone, Default)]
pub struct LoopbackClient {
    state: Arc<Mutex<LoopbackState>>,
}

#[derive(Default)]
struct LoopbackState {
    dapp: Option<DappMetadata>,
    session: Option<Session>,
    handlers: Vec<ClientEventHandler>,
    requests: Vec<RecordedRequest>,
    reject_next_connect: Option<String>,
    fail_next_request: Option<String>,
    connects: u64,
}

impl std::fmt::Debug for LoopbackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackClient")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl LoopbackClient {
    pub fn dapp(&self) -> Option<DappMetadata> {
        self.lock().ok().and_then(|g| g.dapp.clone())
    }

    pub fn reject_next_connect(&self, reason: impl Into<String>) {
        if let Ok(mut g) = self.lock() {
            g.reject_next_connect = Some(reason.into());
        }
    }

    pub fn fail_next_request(&self, reason: impl Into<String>) {
        if let Ok(mut g) = self.lock() {
            g.fail_next_request = Some(reason.into());
        }
    }

    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.lock().map(|g| g.requests.clone()).unwrap_or_default()
    }

    pub fn connect_count(&self) -> u64 {
        self.lock().map(|g| g.connects).unwrap_or(0)
    }

    /// Replaces the session and raises `session_update`.
    pub fn push_session_update(&self, session: Session) -> Result<(), ConnectError> {
        let handlers = {
            let mut g = self.lock()?;
            g.session = Some(session.clone());
            g.handlers.clone()
        };
        notify(&handlers, &ClientEvent::SessionUpdate(session));
        Ok(())
    }

    /// Drops the session as if the wallet ended it and raises `session_delete`.
    pub fn push_session_delete(&self) -> Result<(), ConnectError> {
        let (topic, handlers) = {
            let mut g = self.lock()?;
            let topic = g.session.take().and_then(|s| s.topic);
            (topic, g.handlers.clone())
        };
        notify(&handlers, &ClientEvent::SessionDelete { topic });
        Ok(())
    }

    fn answer(&self, args: &RequestArguments, chain: Option<&str>) -> Result<Value, ConnectError> {
        let session = self
            .lock()?
            .session
            .clone()
            .ok_or_else(|| ConnectError::UpstreamFailure("no active session".to_owned()))?;
        let params = args.positional();

        match args.method.as_str() {
            ETH_ACCOUNTS => {
                let chain = evm_chain(&session, chain)?;
                let grouped = session
                    .namespace(ChainFamily::Ethereum.namespace())
                    .map(|ns| group_accounts_by_chain(&ns.accounts))
                    .unwrap_or_default();
                Ok(serde_json::json!(grouped.get(&chain).cloned().unwrap_or_default()))
            }
            ETH_CHAIN_ID => {
                let chain = evm_chain(&session, chain)?;
                let reference = chain.rsplit(':').next().unwrap_or_default();
                Ok(Value::String(chain_id_to_hex(parse_chain_id(reference)?)))
            }
            PERSONAL_SIGN => Ok(Value::String(placeholder_signature(args, chain))),
            ETH_SIGN_TYPED_DATA_V4 => {
                if !params.get(1).is_some_and(Value::is_object) {
                    return Err(ConnectError::UpstreamFailure(
                        "typed data must be an object".to_owned(),
                    ));
                }
                Ok(Value::String(placeholder_signature(args, chain)))
            }
            ETH_SEND_TRANSACTION => {
                let tx = params.first().cloned().unwrap_or(Value::Null);
                let canonical = serde_json::to_vec(&tx).map_err(|e| {
                    ConnectError::UpstreamFailure(format!("tx serialization failed: {e}"))
                })?;
                Ok(Value::String(keccak256(canonical).to_string()))
            }
            WALLET_SWITCH_ETHEREUM_CHAIN => {
                let reference = requested_chain(params)?;
                self.update_evm_namespace(|ns| {
                    let key = format!("eip155:{reference}");
                    if !ns.chains.contains(&key) {
                        return Err(ConnectError::UpstreamFailure(format!(
                            "4902: unrecognized chain {}",
                            chain_id_to_hex(reference)
                        )));
                    }
                    ns.default_chain = Some(reference.to_string());
                    Ok(())
                })?;
                Ok(Value::Null)
            }
            WALLET_ADD_ETHEREUM_CHAIN => {
                let reference = requested_chain(params)?;
                self.update_evm_namespace(|ns| {
                    let key = format!("eip155:{reference}");
                    if !ns.chains.contains(&key) {
                        ns.accounts.push(format!("{key}:{LOOPBACK_ACCOUNT}"));
                        ns.chains.push(key);
                    }
                    Ok(())
                })?;
                Ok(Value::Null)
            }
            WALLET_WATCH_ASSET => Ok(Value::Bool(true)),
            _ => Ok(serde_json::json!({ "signature": placeholder_signature(args, chain) })),
        }
    }

    fn update_evm_namespace(
        &self,
        edit: impl FnOnce(&mut NamespaceSession) -> Result<(), ConnectError>,
    ) -> Result<(), ConnectError> {
        let (session, handlers) = {
            let mut g = self.lock()?;
            let session = g
                .session
                .as_mut()
                .ok_or_else(|| ConnectError::UpstreamFailure("no active session".to_owned()))?;
            let ns = session
                .namespaces
                .get_mut(ChainFamily::Ethereum.namespace())
                .ok_or_else(|| {
                    ConnectError::UpstreamFailure("eip155 namespace not approved".to_owned())
                })?;
            edit(ns)?;
            (session.clone(), g.handlers.clone())
        };
        notify(&handlers, &ClientEvent::SessionUpdate(session));
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LoopbackState>, ConnectError> {
        self.state
            .lock()
            .map_err(|e| ConnectError::InvalidState(format!("loopback lock poisoned: {e}")))
    }
}

impl ConnectionClient for LoopbackClient {
    async fn init(options: &ClientOptions) -> Result<Self, ConnectError> {
        let client = Self::default();
        client.lock()?.dapp = Some(options.dapp.clone());
        Ok(client)
    }

    async fn connect(&self, params: &ConnectParams) -> Result<Session, ConnectError> {
        let handlers = self.lock()?.handlers.clone();
        notify(
            &handlers,
            &ClientEvent::DisplayUri("okxconnect://loopback/connect".to_owned()),
        );
        // the wallet answers on a later turn of the event loop
        yield_once().await;

        let mut g = self.lock()?;
        if let Some(reason) = g.reject_next_connect.take() {
            return Err(ConnectError::UpstreamFailure(reason));
        }
        g.connects += 1;
        let session = approve(params, g.connects);
        g.session = Some(session.clone());
        Ok(session)
    }

    async fn request(
        &self,
        args: &RequestArguments,
        chain: Option<&str>,
    ) -> Result<Value, ConnectError> {
        {
            let mut g = self.lock()?;
            g.requests.push(RecordedRequest {
                method: args.method.clone(),
                params: args.params.clone(),
                chain: chain.map(str::to_owned),
            });
            if let Some(reason) = g.fail_next_request.take() {
                return Err(ConnectError::UpstreamFailure(reason));
            }
        }
        self.answer(args, chain)
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        let (session, handlers) = {
            let mut g = self.lock()?;
            (g.session.take(), g.handlers.clone())
        };
        if let Some(session) = session {
            notify(
                &handlers,
                &ClientEvent::SessionDelete {
                    topic: session.topic,
                },
            );
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

/// Builds the session a wallet would approve for `params`.
fn approve(params: &ConnectParams, seq: u64) -> Session {
    let mut namespaces: BTreeMap<String, NamespaceSession> = BTreeMap::new();
    let requested = params
        .namespaces
        .iter()
        .map(|(key, req)| (key, req, true))
        .chain(params.optional_namespaces.iter().map(|(key, req)| (key, req, false)));
    for (key, req, required) in requested {
        let ns = namespaces.entry(key.clone()).or_default();
        for chain in &req.chains {
            if !ns.chains.contains(chain) {
                ns.chains.push(chain.clone());
                ns.accounts.push(format!("{chain}:{LOOPBACK_ACCOUNT}"));
            }
        }
        ns.rpc_map.extend(req.rpc_map.clone());
        if required && ns.default_chain.is_none() {
            ns.default_chain = req.default_chain.clone();
        }
        if ns.methods.is_empty() {
            if let Some(family) = ChainFamily::from_namespace(key) {
                ns.methods = methods::supported_methods(family)
                    .iter()
                    .map(|m| (*m).to_owned())
                    .collect();
            }
        }
    }
    Session {
        topic: Some(format!("loopback-{seq}")),
        namespaces,
    }
}

fn evm_chain(session: &Session, chain: Option<&str>) -> Result<String, ConnectError> {
    chain
        .map(str::to_owned)
        .or_else(|| session.active_chain(ChainFamily::Ethereum.namespace()))
        .ok_or_else(|| ConnectError::UpstreamFailure("no eip155 chain in session".to_owned()))
}

fn requested_chain(params: &[Value]) -> Result<u64, ConnectError> {
    let raw = params
        .first()
        .and_then(|p| p.get("chainId"))
        .and_then(Value::as_str)
        .ok_or_else(|| ConnectError::UpstreamFailure("missing chainId".to_owned()))?;
    parse_chain_id(raw)
}

fn placeholder_signature(args: &RequestArguments, chain: Option<&str>) -> String {
    let mut seed = Vec::new();
    seed.extend_from_slice(args.method.as_bytes());
    seed.extend_from_slice(chain.unwrap_or_default().as_bytes());
    if let Some(params) = &args.params {
        seed.extend_from_slice(params.to_string().as_bytes());
    }
    let hash = keccak256(seed);
    let mut sig = Vec::with_capacity(65);
    sig.extend_from_slice(hash.as_slice());
    sig.extend_from_slice(hash.as_slice());
    sig.push(27);
    format!("0x{}", alloy::hex::encode(sig))
}

fn notify(handlers: &[ClientEventHandler], event: &ClientEvent) {
    for handler in handlers {
        handler(event);
    }
}

async fn yield_once() {
    let mut yielded = false;
    std::future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}
