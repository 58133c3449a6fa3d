use dapp_connect_core::platform::{OKX_MINI_WALLET_ID, OKX_MINI_WALLET_NAME};
use dapp_connect_core::{
    detect_platform, methods, ChainFamily, UserPlatform, WalletDescriptor, WalletRegistry,
};

const DESKTOP_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";
const IPHONE_UA: &str =
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148";

#[test]
fn platform_detection_orders_telegram_mobile_desktop() {
    assert_eq!(detect_platform(DESKTOP_UA, false), UserPlatform::DesktopBrowser);
    assert_eq!(detect_platform(IPHONE_UA, false), UserPlatform::MobileBrowser);
    assert_eq!(detect_platform(IPHONE_UA, true), UserPlatform::Telegram);
    assert_eq!(
        detect_platform("Mozilla/5.0 (Linux; Android 14) TelegramBot", false),
        UserPlatform::Telegram
    );
}

#[test]
fn desktop_lists_announced_wallets_without_duplicates() {
    let mut registry = WalletRegistry::default();
    assert!(registry.record_announcement(WalletDescriptor::new("mm-uuid", "MetaMask")));
    assert!(!registry.record_announcement(WalletDescriptor::new("mm-uuid", "MetaMask again")));
    assert!(registry.record_announcement(WalletDescriptor::new("okx-uuid", "OKX Wallet")));

    let wallets = registry.supported_wallets(UserPlatform::DesktopBrowser);
    assert_eq!(wallets.len(), 2);
    assert_eq!(wallets[0].name, "MetaMask");
}

#[test]
fn embedded_platforms_offer_only_mini_wallet() {
    let mut registry = WalletRegistry::default();
    registry.record_announcement(WalletDescriptor::new("mm-uuid", "MetaMask"));
    for platform in [UserPlatform::Telegram, UserPlatform::MobileBrowser] {
        let wallets = registry.supported_wallets(platform);
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].id, OKX_MINI_WALLET_ID);
        assert_eq!(wallets[0].name, OKX_MINI_WALLET_NAME);
    }
}

#[test]
fn wallet_descriptor_serializes_id_as_uuid() {
    let json = serde_json::to_value(WalletDescriptor::new("abc", "Test")).expect("json");
    assert_eq!(json, serde_json::json!({ "uuid": "abc", "name": "Test" }));
}

#[test]
fn method_sets_are_family_specific() {
    assert!(methods::is_supported(ChainFamily::Ethereum, "eth_requestAccounts"));
    assert!(!methods::is_supported(ChainFamily::Ethereum, "eth_sign"));
    assert!(methods::is_supported(ChainFamily::Ton, "ton_sendTransaction"));
    assert!(!methods::is_supported(ChainFamily::Solana, "personal_sign"));
    assert_eq!(
        methods::account_request_method(ChainFamily::Ethereum),
        Some("eth_requestAccounts")
    );
    assert_eq!(methods::account_request_method(ChainFamily::Sui), None);
}

#[test]
fn families_round_trip_through_names() {
    for family in ChainFamily::ALL {
        assert_eq!(family.global_name().parse::<ChainFamily>(), Ok(family));
        assert_eq!(ChainFamily::from_namespace(family.namespace()), Some(family));
    }
}
