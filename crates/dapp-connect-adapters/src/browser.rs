//! Browser glue for wasm32 builds: platform detection from the real
//! navigator and EIP-6963 wallet discovery on the window event bus.

use std::sync::{Arc, Mutex};

use wasm_bindgen::{closure::Closure, JsCast, JsValue};

use dapp_connect_core::{
    detect_platform, ConnectError, UserPlatform, WalletDescriptor, WalletRegistry,
};

pub const ANNOUNCE_PROVIDER_EVENT: &str = "eip6963:announceProvider";
pub const REQUEST_PROVIDER_EVENT: &str = "eip6963:requestProvider";

pub fn user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

/// `window.TelegramWebviewProxy` is only defined inside Telegram's webview.
pub fn telegram_webview_present() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    js_sys::Reflect::get(&window.into(), &JsValue::from_str("TelegramWebviewProxy"))
        .map(|v| !v.is_null() && !v.is_undefined())
        .unwrap_or(false)
}

pub fn detect_browser_platform() -> UserPlatform {
    detect_platform(&user_agent(), telegram_webview_present())
}

/// Listens for `announceProvider` and records every wallet that answers.
/// The listener is removed when this value is dropped.
pub struct BrowserWalletDiscovery {
    registry: Arc<Mutex<WalletRegistry>>,
    listener: Closure<dyn FnMut(web_sys::Event)>,
}

impl BrowserWalletDiscovery {
    pub fn start() -> Result<Self, ConnectError> {
        let window = web_sys::window()
            .ok_or_else(|| ConnectError::Unsupported("missing window".to_owned()))?;
        let registry = Arc::new(Mutex::new(WalletRegistry::default()));

        let sink = Arc::clone(&registry);
        let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let Some(info) = announced_info(event) else {
                tracing::debug!("ignoring malformed provider announcement");
                return;
            };
            if let Ok(mut g) = sink.lock() {
                if g.record_announcement(info.clone()) {
                    tracing::info!(wallet = %info.name, "discovered wallet");
                }
            }
        });
        window
            .add_event_listener_with_callback(
                ANNOUNCE_PROVIDER_EVENT,
                listener.as_ref().unchecked_ref(),
            )
            .map_err(|e| {
                ConnectError::UpstreamFailure(format!("register announce listener failed: {e:?}"))
            })?;

        let discovery = Self { registry, listener };
        discovery.request_providers()?;
        Ok(discovery)
    }

    /// Asks every installed wallet to announce itself again.
    pub fn request_providers(&self) -> Result<(), ConnectError> {
        let window = web_sys::window()
            .ok_or_else(|| ConnectError::Unsupported("missing window".to_owned()))?;
        let event = web_sys::Event::new(REQUEST_PROVIDER_EVENT).map_err(|e| {
            ConnectError::UpstreamFailure(format!("create requestProvider failed: {e:?}"))
        })?;
        window.dispatch_event(&event).map_err(|e| {
            ConnectError::UpstreamFailure(format!("dispatch requestProvider failed: {e:?}"))
        })?;
        Ok(())
    }

    pub fn supported_wallets(&self) -> Vec<WalletDescriptor> {
        let platform = detect_browser_platform();
        self.registry
            .lock()
            .map(|g| g.supported_wallets(platform))
            .unwrap_or_default()
    }
}

impl Drop for BrowserWalletDiscovery {
    fn drop(&mut self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                ANNOUNCE_PROVIDER_EVENT,
                self.listener.as_ref().unchecked_ref(),
            );
        }
    }
}

fn announced_info(event: web_sys::Event) -> Option<WalletDescriptor> {
    let custom = event.dyn_into::<web_sys::CustomEvent>().ok()?;
    let info = js_sys::Reflect::get(&custom.detail(), &JsValue::from_str("info")).ok()?;
    serde_wasm_bindgen::from_value(info).ok()
}
