pub mod domain;
pub mod events;
pub mod methods;
pub mod platform;
pub mod ports;
pub mod state_machine;
pub mod translator;

pub use domain::{
    ChainFamily, ClientEvent, ClientOptions, ConnectParams, DappMetadata, EventName,
    NamespaceRequest, NamespaceSession, ProviderEvent, RequestArguments, Session, UserPlatform,
    WalletDescriptor,
};
pub use events::{EventRegistry, Listener};
pub use platform::{detect_platform, okx_mini_wallet, WalletRegistry};
pub use ports::{ClientEventHandler, ConnectError, ConnectionClient};
pub use state_machine::{
    connection_transition, ConnectionAction, ConnectionState, StateTransition,
};
pub use translator::{group_accounts_by_chain, SessionTranslator};
