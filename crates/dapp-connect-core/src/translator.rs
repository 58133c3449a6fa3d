use std::collections::BTreeMap;

use crate::domain::{ProviderEvent, Session};

/// Turns whole-session snapshots into one standardized provider event.
#[derive(Debug, Clone)]
pub struct SessionTranslator {
    namespace: &'static str,
    last_session: Option<Session>,
}

impl SessionTranslator {
    pub fn new(namespace: &'static str) -> Self {
        Self {
            namespace,
            last_session: None,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn last_session(&self) -> Option<&Session> {
        self.last_session.as_ref()
    }

    /// Active `namespace:reference` of the last observed session.
    pub fn active_chain(&self) -> Option<String> {
        self.last_session
            .as_ref()
            .and_then(|s| s.active_chain(self.namespace))
    }

    pub fn apply_update(&mut self, session: Session) -> ProviderEvent {
        let next_chain = session.default_chain(self.namespace).map(str::to_owned);
        let event = match &self.last_session {
            None => ProviderEvent::Connect {
                chain_id: next_chain,
            },
            Some(prev) => match next_chain {
                Some(chain) if prev.default_chain(self.namespace) != Some(chain.as_str()) => {
                    ProviderEvent::ChainChanged(chain)
                }
                Some(chain) => {
                    ProviderEvent::AccountsChanged(self.accounts_for(&session, &chain))
                }
                None => ProviderEvent::AccountsChanged(Vec::new()),
            },
        };
        self.last_session = Some(session);
        event
    }

    pub fn apply_delete(&mut self) -> ProviderEvent {
        self.last_session = None;
        ProviderEvent::Disconnect
    }

    fn accounts_for(&self, session: &Session, chain: &str) -> Vec<String> {
        let Some(ns) = session.namespace(self.namespace) else {
            return Vec::new();
        };
        let key = format!("{}:{chain}", self.namespace);
        group_accounts_by_chain(&ns.accounts)
            .remove(&key)
            .unwrap_or_default()
    }
}

/// Groups `namespace:chainId:address` entries by their `namespace:chainId` prefix.
///
/// ```
/// use dapp_connect_core::translator::group_accounts_by_chain;
///
/// let grouped = group_accounts_by_chain(&[
///     "eip155:1:0xabc".to_owned(),
///     "eip155:10:0xabc".to_owned(),
/// ]);
/// assert_eq!(grouped["eip155:1"], vec!["0xabc".to_owned()]);
/// ```
pub fn group_accounts_by_chain(accounts: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for account in accounts {
        let mut parts = account.splitn(3, ':');
        let (Some(namespace), Some(chain)) = (parts.next(), parts.next()) else {
            continue;
        };
        let entry = grouped.entry(format!("{namespace}:{chain}")).or_default();
        if let Some(address) = parts.next().filter(|a| !a.is_empty()) {
            entry.push(address.to_owned());
        }
    }
    grouped
}
