use crate::domain::{UserPlatform, WalletDescriptor};

pub const OKX_MINI_WALLET_ID: &str = "0asdf-asdf-7982-8fef-341bf2a6eb2e";
pub const OKX_MINI_WALLET_NAME: &str = "OKX Mini Wallet";

pub fn okx_mini_wallet() -> WalletDescriptor {
    WalletDescriptor::new(OKX_MINI_WALLET_ID, OKX_MINI_WALLET_NAME)
}

pub fn is_telegram(user_agent: &str, webview_bridge_present: bool) -> bool {
    webview_bridge_present || user_agent.to_ascii_lowercase().contains("telegram")
}

pub fn is_mobile(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    ["android", "iphone", "mobile"]
        .iter()
        .any(|needle| ua.contains(needle))
}

pub fn detect_platform(user_agent: &str, webview_bridge_present: bool) -> UserPlatform {
    if is_telegram(user_agent, webview_bridge_present) {
        UserPlatform::Telegram
    } else if is_mobile(user_agent) {
        UserPlatform::MobileBrowser
    } else {
        UserPlatform::DesktopBrowser
    }
}

/// Wallets collected from EIP-6963 announcements, unique by id.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    announced: Vec<WalletDescriptor>,
}

impl WalletRegistry {
    /// Returns false for a duplicate id.
    pub fn record_announcement(&mut self, info: WalletDescriptor) -> bool {
        if self.announced.iter().any(|w| w.id == info.id) {
            return false;
        }
        tracing::debug!(wallet = %info.name, id = %info.id, "wallet announced");
        self.announced.push(info);
        true
    }

    pub fn announced(&self) -> &[WalletDescriptor] {
        &self.announced
    }

    /// Desktop browsers list announced wallets; embedded and mobile
    /// platforms only offer the built-in mini wallet.
    pub fn supported_wallets(&self, platform: UserPlatform) -> Vec<WalletDescriptor> {
        match platform {
            UserPlatform::DesktopBrowser => self.announced.clone(),
            UserPlatform::Telegram | UserPlatform::MobileBrowser => vec![okx_mini_wallet()],
        }
    }
}
