use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::domain::{ClientEvent, ClientOptions, ConnectParams, RequestArguments, Session};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("not initialized: {0}")]
    NotInitialized(String),
    #[error("busy: {0}")]
    Busy(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type ClientEventHandler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// The wallet-connect client the SDK wraps.
///
/// Implementations own the session protocol and the connect modal. The
/// connection manager constructs exactly one instance and shares it with the
/// chain adapters as a delegate.
#[allow(async_fn_in_trait)]
pub trait ConnectionClient: Send + Sync + Sized + 'static {
    async fn init(options: &ClientOptions) -> Result<Self, ConnectError>;

    /// Opens the connection flow and resolves with the approved session.
    async fn connect(&self, params: &ConnectParams) -> Result<Session, ConnectError>;

    /// `chain` is the `namespace:reference` the call is scoped to.
    async fn request(
        &self,
        args: &RequestArguments,
        chain: Option<&str>,
    ) -> Result<Value, ConnectError>;

    async fn disconnect(&self) -> Result<(), ConnectError>;

    fn is_connected(&self) -> bool;

    fn session(&self) -> Option<Session>;

    /// Registers a handler for raw lifecycle callbacks.
    fn subscribe(&self, handler: ClientEventHandler);
}
