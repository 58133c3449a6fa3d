//! Demo state: chain tabs, sample requests and the event log.

use serde_json::json;
use web_time::{SystemTime, UNIX_EPOCH};

use dapp_connect_core::{group_accounts_by_chain, ChainFamily, RequestArguments, Session};

/// Storage key the selected tab is persisted under.
pub const TAB_STORAGE_KEY: &str = "localTabKey";

const MAX_LOG_ENTRIES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemoTab {
    #[default]
    Evm,
    Solana,
    Bitcoin,
    Ton,
    Aptos,
    Sui,
}

impl DemoTab {
    pub const ALL: [DemoTab; 6] = [
        DemoTab::Evm,
        DemoTab::Solana,
        DemoTab::Bitcoin,
        DemoTab::Ton,
        DemoTab::Aptos,
        DemoTab::Sui,
    ];

    pub fn family(self) -> ChainFamily {
        match self {
            DemoTab::Evm => ChainFamily::Ethereum,
            DemoTab::Solana => ChainFamily::Solana,
            DemoTab::Bitcoin => ChainFamily::Bitcoin,
            DemoTab::Ton => ChainFamily::Ton,
            DemoTab::Aptos => ChainFamily::Aptos,
            DemoTab::Sui => ChainFamily::Sui,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DemoTab::Evm => "EVM",
            DemoTab::Solana => "Solana",
            DemoTab::Bitcoin => "Bitcoin",
            DemoTab::Ton => "TON",
            DemoTab::Aptos => "Aptos",
            DemoTab::Sui => "Sui",
        }
    }

    pub fn storage_value(self) -> &'static str {
        match self {
            DemoTab::Evm => "evm",
            DemoTab::Solana => "solana",
            DemoTab::Bitcoin => "btc",
            DemoTab::Ton => "ton",
            DemoTab::Aptos => "aptos",
            DemoTab::Sui => "sui",
        }
    }

    /// Unknown or missing stored values fall back to the EVM tab.
    pub fn from_storage(raw: Option<&str>) -> Self {
        raw.and_then(|raw| {
            Self::ALL
                .into_iter()
                .find(|tab| tab.storage_value() == raw.trim())
        })
        .unwrap_or_default()
    }
}

/// First address approved on the session's active chain for `family`.
pub fn active_account(session: &Session, family: ChainFamily) -> Option<String> {
    let namespace = family.namespace();
    let ns = session.namespace(namespace)?;
    let chain = session.active_chain(namespace)?;
    group_accounts_by_chain(&ns.accounts)
        .remove(&chain)?
        .into_iter()
        .next()
}

#[derive(Debug, Clone)]
pub struct SampleRequest {
    pub label: &'static str,
    pub args: RequestArguments,
}

impl SampleRequest {
    fn new(label: &'static str, method: &str, params: serde_json::Value) -> Self {
        Self {
            label,
            args: RequestArguments::with_params(method, params),
        }
    }
}

/// Buttons shown on `tab` once a wallet is connected as `account`.
pub fn sample_requests(tab: DemoTab, account: &str) -> Vec<SampleRequest> {
    match tab {
        DemoTab::Evm => vec![
            SampleRequest {
                label: "Chain ID",
                args: RequestArguments::new("eth_chainId"),
            },
            SampleRequest::new(
                "Personal Sign",
                "personal_sign",
                json!(["Hello from OKX Connect", account]),
            ),
            SampleRequest::new(
                "Sign Typed Data v4",
                "eth_signTypedData_v4",
                json!([account, typed_data_sample()]),
            ),
            SampleRequest::new(
                "Send Transaction",
                "eth_sendTransaction",
                json!([{ "from": account, "to": account, "value": "0x0" }]),
            ),
            SampleRequest::new(
                "Switch to Avalanche",
                "wallet_switchEthereumChain",
                json!([{ "chainId": "0xa86a" }]),
            ),
            SampleRequest::new(
                "Switch to Mainnet",
                "wallet_switchEthereumChain",
                json!([{ "chainId": "0x1" }]),
            ),
            SampleRequest::new(
                "Add Polygon",
                "wallet_addEthereumChain",
                json!([{
                    "chainId": "0x89",
                    "chainName": "Polygon",
                    "rpcUrls": ["https://polygon-rpc.com"],
                    "nativeCurrency": { "name": "POL", "symbol": "POL", "decimals": 18 }
                }]),
            ),
        ],
        DemoTab::Solana => vec![SampleRequest::new(
            "Sign Message",
            "solana_signMessage",
            json!({ "message": "Hello from OKX Connect" }),
        )],
        DemoTab::Bitcoin => vec![SampleRequest::new(
            "Sign Message",
            "btc_signMessage",
            json!({ "message": "Hello from OKX Connect", "type": "ecdsa" }),
        )],
        DemoTab::Ton => vec![SampleRequest::new(
            "Send Transaction",
            "ton_sendTransaction",
            json!({ "messages": [{ "address": account, "amount": "1000" }] }),
        )],
        DemoTab::Aptos => vec![SampleRequest::new(
            "Sign Message",
            "aptos_signMessage",
            json!({ "message": "Hello from OKX Connect", "nonce": "1" }),
        )],
        DemoTab::Sui => vec![SampleRequest::new(
            "Sign Personal Message",
            "sui_signPersonalMessage",
            json!({ "message": "Hello from OKX Connect" }),
        )],
    }
}

fn typed_data_sample() -> serde_json::Value {
    json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "chainId", "type": "uint256" }
            ],
            "Greeting": [{ "name": "contents", "type": "string" }]
        },
        "primaryType": "Greeting",
        "domain": { "name": "OKX Connect Demo", "chainId": 1 },
        "message": { "contents": "Hello from OKX Connect" }
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub source: String,
    pub message: String,
}

/// Bounded, newest-last log of provider events and request outcomes.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn push(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: clock_time(),
            source: source.into(),
            message: message.into(),
        });
        if self.entries.len() > MAX_LOG_ENTRIES {
            let overflow = self.entries.len() - MAX_LOG_ENTRIES;
            self.entries.drain(..overflow);
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// `HH:MM:SS` UTC.
fn clock_time() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapp_connect_core::methods;

    #[test]
    fn stored_tab_round_trips_and_falls_back_to_evm() {
        for tab in DemoTab::ALL {
            assert_eq!(DemoTab::from_storage(Some(tab.storage_value())), tab);
        }
        assert_eq!(DemoTab::from_storage(Some("dogecoin")), DemoTab::Evm);
        assert_eq!(DemoTab::from_storage(None), DemoTab::Evm);
    }

    #[test]
    fn every_sample_request_is_supported_by_its_tab() {
        let account = "0xfcd218cc65bca1dfe5fee91e8a2182d5643b094c";
        for tab in DemoTab::ALL {
            let samples = sample_requests(tab, account);
            assert!(!samples.is_empty());
            for sample in samples {
                assert!(
                    methods::is_supported(tab.family(), &sample.args.method),
                    "{} not supported on {}",
                    sample.args.method,
                    tab.label()
                );
            }
        }
    }

    #[test]
    fn active_account_follows_the_default_chain() {
        let mut session = Session::default();
        session.namespaces.insert(
            "eip155".to_owned(),
            dapp_connect_core::NamespaceSession {
                chains: vec!["eip155:1".to_owned(), "eip155:43114".to_owned()],
                accounts: vec![
                    "eip155:1:0xaaaa".to_owned(),
                    "eip155:43114:0xbbbb".to_owned(),
                ],
                default_chain: Some("43114".to_owned()),
                ..Default::default()
            },
        );
        assert_eq!(
            active_account(&session, ChainFamily::Ethereum).as_deref(),
            Some("0xbbbb")
        );
        assert_eq!(active_account(&session, ChainFamily::Solana), None);
    }

    #[test]
    fn event_log_keeps_the_newest_entries() {
        let mut log = EventLog::default();
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            log.push("evm", format!("event {i}"));
        }
        assert_eq!(log.entries().len(), MAX_LOG_ENTRIES);
        assert_eq!(log.entries()[0].message, "event 5");
        assert_eq!(log.entries()[0].timestamp.len(), 8);
    }
}
