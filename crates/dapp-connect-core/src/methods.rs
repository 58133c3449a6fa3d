use crate::domain::ChainFamily;

pub const ETH_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const ETH_ACCOUNTS: &str = "eth_accounts";
pub const ETH_CHAIN_ID: &str = "eth_chainId";
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";
pub const PERSONAL_SIGN: &str = "personal_sign";
pub const ETH_SIGN_TYPED_DATA_V4: &str = "eth_signTypedData_v4";
pub const WALLET_ADD_ETHEREUM_CHAIN: &str = "wallet_addEthereumChain";
pub const WALLET_SWITCH_ETHEREUM_CHAIN: &str = "wallet_switchEthereumChain";
pub const WALLET_WATCH_ASSET: &str = "wallet_watchAsset";

pub const EVM_METHODS: &[&str] = &[
    PERSONAL_SIGN,
    ETH_SIGN_TYPED_DATA_V4,
    ETH_SEND_TRANSACTION,
    ETH_ACCOUNTS,
    ETH_REQUEST_ACCOUNTS,
    ETH_CHAIN_ID,
    WALLET_SWITCH_ETHEREUM_CHAIN,
    WALLET_ADD_ETHEREUM_CHAIN,
    WALLET_WATCH_ASSET,
];

pub const SOLANA_METHODS: &[&str] = &[
    "solana_signTransaction",
    "solana_signMessage",
    "solana_signAllTransactions",
    "solana_signAndSendTransaction",
];

pub const BTC_METHODS: &[&str] = &[
    "btc_signMessage",
    "btc_send",
    "btc_signPsbts",
    "btc_signAndPushPsbt",
    "btc_sendInscription",
];

pub const TON_METHODS: &[&str] = &["ton_sendTransaction"];

pub const APTOS_METHODS: &[&str] = &[
    "aptos_signMessage",
    "aptos_signTransaction",
    "aptos_signAndSubmitTransaction",
];

pub const SUI_METHODS: &[&str] = &[
    "sui_signMessage",
    "sui_signPersonalMessage",
    "sui_signTransactionBlock",
    "sui_signAndExecuteTransactionBlock",
];

pub fn supported_methods(family: ChainFamily) -> &'static [&'static str] {
    match family {
        ChainFamily::Ethereum => EVM_METHODS,
        ChainFamily::Solana => SOLANA_METHODS,
        ChainFamily::Bitcoin => BTC_METHODS,
        ChainFamily::Ton => TON_METHODS,
        ChainFamily::Aptos => APTOS_METHODS,
        ChainFamily::Sui => SUI_METHODS,
    }
}

pub fn is_supported(family: ChainFamily, method: &str) -> bool {
    supported_methods(family).contains(&method)
}

/// Method that opens the connect flow when no session exists.
pub fn account_request_method(family: ChainFamily) -> Option<&'static str> {
    match family {
        ChainFamily::Ethereum => Some(ETH_REQUEST_ACCOUNTS),
        _ => None,
    }
}
