use std::collections::BTreeMap;

use dapp_connect_core::{
    group_accounts_by_chain, NamespaceSession, ProviderEvent, Session, SessionTranslator,
};

fn evm_session(default_chain: &str, accounts: &[&str]) -> Session {
    let mut namespaces = BTreeMap::new();
    namespaces.insert(
        "eip155".to_owned(),
        NamespaceSession {
            chains: vec!["eip155:1".to_owned(), "eip155:43114".to_owned()],
            accounts: accounts.iter().map(|a| (*a).to_owned()).collect(),
            default_chain: Some(default_chain.to_owned()),
            ..NamespaceSession::default()
        },
    );
    Session {
        topic: Some("topic-1".to_owned()),
        namespaces,
    }
}

#[test]
fn first_session_emits_connect_with_default_chain() {
    let mut translator = SessionTranslator::new("eip155");
    let event = translator.apply_update(evm_session("1", &[]));
    assert_eq!(
        event,
        ProviderEvent::Connect {
            chain_id: Some("1".to_owned())
        }
    );
    assert!(translator.last_session().is_some());
    assert_eq!(translator.active_chain().as_deref(), Some("eip155:1"));
}

#[test]
fn default_chain_change_emits_single_chain_changed() {
    let mut translator = SessionTranslator::new("eip155");
    translator.apply_update(evm_session("1", &[]));
    let event = translator.apply_update(evm_session("43114", &[]));
    assert_eq!(event, ProviderEvent::ChainChanged("43114".to_owned()));
    assert_eq!(translator.active_chain().as_deref(), Some("eip155:43114"));
}

#[test]
fn same_chain_emits_accounts_for_live_default_chain() {
    let mut translator = SessionTranslator::new("eip155");
    translator.apply_update(evm_session("1", &[]));
    let event = translator.apply_update(evm_session(
        "1",
        &["eip155:1:0xabc", "eip155:1:0xdef", "eip155:43114:0x999"],
    ));
    assert_eq!(
        event,
        ProviderEvent::AccountsChanged(vec!["0xabc".to_owned(), "0xdef".to_owned()])
    );
}

#[test]
fn accounts_follow_current_chain_not_first_chain() {
    let mut translator = SessionTranslator::new("eip155");
    translator.apply_update(evm_session("43114", &[]));
    let event = translator.apply_update(evm_session(
        "43114",
        &["eip155:1:0xabc", "eip155:43114:0x999"],
    ));
    assert_eq!(event, ProviderEvent::AccountsChanged(vec!["0x999".to_owned()]));
}

#[test]
fn delete_emits_disconnect_and_next_update_connects_again() {
    let mut translator = SessionTranslator::new("eip155");
    translator.apply_update(evm_session("1", &[]));
    assert_eq!(translator.apply_delete(), ProviderEvent::Disconnect);
    assert!(translator.last_session().is_none());

    let event = translator.apply_update(evm_session("10", &[]));
    assert_eq!(
        event,
        ProviderEvent::Connect {
            chain_id: Some("10".to_owned())
        }
    );
}

#[test]
fn missing_namespace_yields_empty_accounts() {
    let mut translator = SessionTranslator::new("solana");
    let connect = translator.apply_update(evm_session("1", &["eip155:1:0xabc"]));
    assert_eq!(connect, ProviderEvent::Connect { chain_id: None });
    let event = translator.apply_update(evm_session("1", &["eip155:1:0xabc"]));
    assert_eq!(event, ProviderEvent::AccountsChanged(Vec::new()));
}

#[test]
fn default_chain_falls_back_to_first_authorised_chain() {
    let session: Session = serde_json::from_value(serde_json::json!({
        "topic": "2a7a",
        "namespaces": {
            "eip155": {
                "chains": ["eip155:10", "eip155:1"],
                "accounts": ["eip155:10:0xfcd2"],
                "methods": ["personal_sign"],
                "rpcMap": { "10": "https://mainnet.optimism.io" }
            }
        }
    }))
    .expect("session json");
    assert_eq!(session.default_chain("eip155"), Some("10"));
    assert_eq!(session.active_chain("eip155").as_deref(), Some("eip155:10"));
}

#[test]
fn grouping_skips_malformed_entries_and_keeps_order() {
    let grouped = group_accounts_by_chain(&[
        "eip155:1:0xfcd2".to_owned(),
        "eip155:43114:0xfcd2".to_owned(),
        "eip155:1:0xbeef".to_owned(),
        "garbage".to_owned(),
        "eip155:10".to_owned(),
    ]);
    assert_eq!(grouped["eip155:1"], vec!["0xfcd2".to_owned(), "0xbeef".to_owned()]);
    assert_eq!(grouped["eip155:43114"], vec!["0xfcd2".to_owned()]);
    assert!(grouped["eip155:10"].is_empty());
    assert!(!grouped.contains_key("garbage"));
}

#[test]
fn delete_on_a_fresh_translator_still_reports_disconnect() {
    let mut translator = SessionTranslator::new("eip155");
    assert_eq!(translator.apply_delete(), ProviderEvent::Disconnect);
    assert!(translator.last_session().is_none());
    assert!(translator.active_chain().is_none());
}
