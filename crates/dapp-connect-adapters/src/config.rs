use std::collections::BTreeMap;

use dapp_connect_core::{
    okx_mini_wallet, ChainFamily, ClientOptions, ConnectParams, DappMetadata, NamespaceRequest,
    WalletDescriptor,
};

#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub app_name: String,
    pub app_icon_url: String,
    /// Families that get a chain adapter.
    pub chains: Vec<ChainFamily>,
    pub evm_chains: Vec<String>,
    pub evm_optional_chains: Vec<String>,
    pub evm_default_chain: String,
    pub rpc_map: BTreeMap<String, String>,
    pub redirect: Option<String>,
    pub bridge_url: Option<String>,
    pub request_timeout_ms: u64,
    pub inject_providers: bool,
    pub announce_provider: bool,
    pub wallet_info: WalletDescriptor,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            app_name: "OKX WalletConnect UI Demo".to_owned(),
            app_icon_url: "https://static.okx.com/cdn/assets/imgs/247/58E63FEA47A2B7D7.png"
                .to_owned(),
            chains: ChainFamily::ALL.to_vec(),
            evm_chains: vec!["eip155:1".to_owned()],
            evm_optional_chains: vec!["eip155:43114".to_owned()],
            evm_default_chain: "1".to_owned(),
            rpc_map: BTreeMap::from([("1".to_owned(), "https://rpc.flashbots.net".to_owned())]),
            redirect: Some("tg://resolve".to_owned()),
            bridge_url: None,
            request_timeout_ms: 15_000,
            inject_providers: true,
            announce_provider: true,
            wallet_info: okx_mini_wallet(),
        }
    }
}

impl ConnectConfig {
    /// Defaults overridden by `DAPP_CONNECT_*` environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(name) = env_string("DAPP_CONNECT_APP_NAME") {
            cfg.app_name = name;
        }
        if let Some(icon) = env_string("DAPP_CONNECT_APP_ICON") {
            cfg.app_icon_url = icon;
        }
        if let Some(chains) = env_string("DAPP_CONNECT_CHAINS") {
            let parsed: Vec<ChainFamily> = chains
                .split(',')
                .filter_map(|raw| match raw.trim().parse() {
                    Ok(family) => Some(family),
                    Err(e) => {
                        tracing::warn!("ignoring DAPP_CONNECT_CHAINS entry: {e}");
                        None
                    }
                })
                .collect();
            if !parsed.is_empty() {
                cfg.chains = parsed;
            }
        }
        if let Some(chain) = env_string("DAPP_CONNECT_DEFAULT_CHAIN") {
            cfg.evm_chains = vec![format!("eip155:{chain}")];
            cfg.evm_default_chain = chain;
        }
        if let Some(url) = env_string("DAPP_CONNECT_RPC_URL") {
            cfg.rpc_map.insert(cfg.evm_default_chain.clone(), url);
        }
        cfg.bridge_url = env_string("DAPP_CONNECT_BRIDGE_URL");
        if let Some(ms) = env_string("DAPP_CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            cfg.request_timeout_ms = ms;
        }
        if let Some(flag) = env_string("DAPP_CONNECT_INJECT") {
            cfg.inject_providers = !matches!(flag.as_str(), "0" | "false" | "no");
        }
        cfg
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            dapp: DappMetadata {
                name: self.app_name.clone(),
                icon: self.app_icon_url.clone(),
            },
            bridge_url: self.bridge_url.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn connect_params(&self) -> ConnectParams {
        let namespace = ChainFamily::Ethereum.namespace().to_owned();
        let mut optional_namespaces = BTreeMap::new();
        if !self.evm_optional_chains.is_empty() {
            optional_namespaces.insert(
                namespace.clone(),
                NamespaceRequest {
                    chains: self.evm_optional_chains.clone(),
                    ..NamespaceRequest::default()
                },
            );
        }
        ConnectParams {
            namespaces: BTreeMap::from([(
                namespace,
                NamespaceRequest {
                    chains: self.evm_chains.clone(),
                    rpc_map: self.rpc_map.clone(),
                    default_chain: Some(self.evm_default_chain.clone()),
                },
            )]),
            optional_namespaces,
            redirect: self.redirect.clone(),
            wallet_id: None,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_params_request_mainnet_with_avalanche_optional() {
        let params = ConnectConfig::default().connect_params();
        let required = &params.namespaces["eip155"];
        assert_eq!(required.chains, vec!["eip155:1".to_owned()]);
        assert_eq!(required.default_chain.as_deref(), Some("1"));
        assert_eq!(
            required.rpc_map.get("1").map(String::as_str),
            Some("https://rpc.flashbots.net")
        );
        assert_eq!(
            params.optional_namespaces["eip155"].chains,
            vec!["eip155:43114".to_owned()]
        );
        assert_eq!(params.redirect.as_deref(), Some("tg://resolve"));
        assert_eq!(params.wallet_id, None);
    }

    #[test]
    fn client_options_carry_dapp_metadata() {
        let options = ConnectConfig::default().client_options();
        assert_eq!(options.dapp.name, "OKX WalletConnect UI Demo");
        assert_eq!(options.bridge_url, None);
        assert_eq!(options.request_timeout_ms, 15_000);
    }
}
