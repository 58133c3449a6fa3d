use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dapp_connect_core::{EventName, EventRegistry, Listener, ProviderEvent};

fn counting_listener() -> (Listener, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let listener: Listener = Arc::new(move |_event: &ProviderEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (listener, hits)
}

#[test]
fn duplicate_subscription_fires_once() {
    let mut registry = EventRegistry::default();
    let (listener, hits) = counting_listener();
    assert!(registry.subscribe(EventName::ChainChanged, Arc::clone(&listener)));
    assert!(!registry.subscribe(EventName::ChainChanged, Arc::clone(&listener)));

    let delivered = registry.emit(&ProviderEvent::ChainChanged("1".to_owned()));
    assert_eq!(delivered, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn removed_listener_is_never_invoked_and_removal_is_idempotent() {
    let mut registry = EventRegistry::default();
    let (listener, hits) = counting_listener();
    let (other, other_hits) = counting_listener();
    registry.subscribe(EventName::Disconnect, Arc::clone(&listener));
    registry.subscribe(EventName::Disconnect, Arc::clone(&other));

    assert!(registry.unsubscribe(EventName::Disconnect, &listener));
    assert!(!registry.unsubscribe(EventName::Disconnect, &listener));
    assert!(!registry.unsubscribe(EventName::Connect, &listener));

    registry.emit(&ProviderEvent::Disconnect);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(other_hits.load(Ordering::SeqCst), 1);
    assert_eq!(registry.listener_count(EventName::Disconnect), 1);
}

#[test]
fn emit_only_reaches_listeners_of_that_event() {
    let mut registry = EventRegistry::default();
    let (listener, hits) = counting_listener();
    registry.subscribe(EventName::AccountsChanged, listener);

    registry.emit(&ProviderEvent::Connect {
        chain_id: Some("1".to_owned()),
    });
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    registry.emit(&ProviderEvent::AccountsChanged(vec!["0xabc".to_owned()]));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn event_names_parse_with_account_alias() {
    assert_eq!("accountsChanged".parse::<EventName>(), Ok(EventName::AccountsChanged));
    assert_eq!("accountChanged".parse::<EventName>(), Ok(EventName::AccountsChanged));
    let err = "message".parse::<EventName>().expect_err("unknown event");
    assert!(err.to_string().contains("message"));
}

#[test]
fn payloads_match_injected_surface() {
    let connect = ProviderEvent::Connect {
        chain_id: Some("1".to_owned()),
    };
    assert_eq!(connect.payload(), serde_json::json!({ "chainId": "1" }));
    assert_eq!(
        ProviderEvent::AccountsChanged(vec!["0xabc".to_owned()]).payload(),
        serde_json::json!(["0xabc"])
    );
    assert!(ProviderEvent::Disconnect.payload().is_null());
}
