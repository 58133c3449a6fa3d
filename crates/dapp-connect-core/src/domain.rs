use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::ConnectError;

/// Chain families the SDK exposes an adapter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Ethereum,
    Solana,
    Bitcoin,
    Ton,
    Aptos,
    Sui,
}

impl ChainFamily {
    pub const ALL: [ChainFamily; 6] = [
        ChainFamily::Ethereum,
        ChainFamily::Solana,
        ChainFamily::Bitcoin,
        ChainFamily::Ton,
        ChainFamily::Aptos,
        ChainFamily::Sui,
    ];

    /// Session namespace key used by the wallet library.
    pub fn namespace(self) -> &'static str {
        match self {
            ChainFamily::Ethereum => "eip155",
            ChainFamily::Solana => "solana",
            ChainFamily::Bitcoin => "btc",
            ChainFamily::Ton => "ton",
            ChainFamily::Aptos => "aptos",
            ChainFamily::Sui => "sui",
        }
    }

    /// Name of the page-global provider object (`window.<name>`).
    pub fn global_name(self) -> &'static str {
        match self {
            ChainFamily::Ethereum => "ethereum",
            ChainFamily::Solana => "solana",
            ChainFamily::Bitcoin => "bitcoin",
            ChainFamily::Ton => "ton",
            ChainFamily::Aptos => "aptos",
            ChainFamily::Sui => "sui",
        }
    }

    pub fn from_namespace(namespace: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.namespace() == namespace)
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.global_name())
    }
}

impl FromStr for ChainFamily {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.global_name().eq_ignore_ascii_case(s) || f.namespace() == s)
            .ok_or_else(|| ConnectError::Unsupported(format!("unknown chain family: {s}")))
    }
}

/// One namespace entry of a wallet session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceSession {
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub rpc_map: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chain: Option<String>,
}

impl NamespaceSession {
    /// `defaultChain`, or the reference of the first authorised chain.
    pub fn resolved_default_chain(&self) -> Option<&str> {
        if let Some(chain) = self.default_chain.as_deref() {
            return Some(chain);
        }
        self.chains
            .first()
            .map(|c| c.rsplit_once(':').map_or(c.as_str(), |(_, reference)| reference))
    }
}

/// Snapshot of a wallet session. Every update replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceSession>,
}

impl Session {
    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceSession> {
        self.namespaces.get(namespace)
    }

    pub fn default_chain(&self, namespace: &str) -> Option<&str> {
        self.namespace(namespace)
            .and_then(NamespaceSession::resolved_default_chain)
    }

    /// `namespace:reference` of the namespace's default chain.
    pub fn active_chain(&self, namespace: &str) -> Option<String> {
        self.default_chain(namespace)
            .map(|reference| format!("{namespace}:{reference}"))
    }
}

/// Requested namespace for a connect call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRequest {
    pub chains: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rpc_map: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    pub namespaces: BTreeMap<String, NamespaceRequest>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub optional_namespaces: BTreeMap<String, NamespaceRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappMetadata {
    pub name: String,
    pub icon: String,
}

/// Options handed to the underlying client when it is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub dapp: DappMetadata,
    pub bridge_url: Option<String>,
    pub request_timeout_ms: u64,
}

/// `{method, params}` as passed to an EIP-1193 `request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params: Some(params),
        }
    }

    /// Positional params, empty when absent or not an array.
    pub fn positional(&self) -> &[Value] {
        self.params
            .as_ref()
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// EIP-6963 provider info. `id` is announced as `uuid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletDescriptor {
    #[serde(rename = "uuid")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdns: Option<String>,
}

impl WalletDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: None,
            rdns: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserPlatform {
    Telegram,
    MobileBrowser,
    DesktopBrowser,
}

/// Standardized event names of the injected-wallet surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventName {
    Connect,
    Disconnect,
    AccountsChanged,
    ChainChanged,
}

impl EventName {
    pub const ALL: [EventName; 4] = [
        EventName::Connect,
        EventName::Disconnect,
        EventName::AccountsChanged,
        EventName::ChainChanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Connect => "connect",
            EventName::Disconnect => "disconnect",
            EventName::AccountsChanged => "accountsChanged",
            EventName::ChainChanged => "chainChanged",
        }
    }
}

impl FromStr for EventName {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connect" => Ok(EventName::Connect),
            "disconnect" => Ok(EventName::Disconnect),
            "accountsChanged" | "accountChanged" => Ok(EventName::AccountsChanged),
            "chainChanged" => Ok(EventName::ChainChanged),
            other => Err(ConnectError::Unsupported(format!("event {other} not supported"))),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to listeners of a chain adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect { chain_id: Option<String> },
    Disconnect,
    ChainChanged(String),
    AccountsChanged(Vec<String>),
}

impl ProviderEvent {
    pub fn name(&self) -> EventName {
        match self {
            ProviderEvent::Connect { .. } => EventName::Connect,
            ProviderEvent::Disconnect => EventName::Disconnect,
            ProviderEvent::ChainChanged(_) => EventName::ChainChanged,
            ProviderEvent::AccountsChanged(_) => EventName::AccountsChanged,
        }
    }

    /// Argument passed to JavaScript-style listeners.
    pub fn payload(&self) -> Value {
        match self {
            ProviderEvent::Connect { chain_id } => serde_json::json!({ "chainId": chain_id }),
            ProviderEvent::Disconnect => Value::Null,
            ProviderEvent::ChainChanged(chain_id) => Value::String(chain_id.clone()),
            ProviderEvent::AccountsChanged(accounts) => serde_json::json!(accounts),
        }
    }
}

/// Raw lifecycle callbacks raised by the underlying client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    SessionUpdate(Session),
    SessionDelete { topic: Option<String> },
    DisplayUri(String),
    DefaultChainChanged(String),
}
