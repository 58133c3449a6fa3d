//! Wallet client used by the demo: the HTTP bridge when a bridge URL is
//! configured, the in-process loopback wallet otherwise.

use serde_json::Value;

use dapp_connect_adapters::{HttpBridgeClient, LoopbackClient};
use dapp_connect_core::{
    ClientEventHandler, ClientOptions, ConnectError, ConnectParams, ConnectionClient,
    RequestArguments, Session,
};

#[derive(Debug, Clone)]
pub enum DemoClient {
    Loopback(LoopbackClient),
    Bridge(HttpBridgeClient),
}

impl DemoClient {
    pub fn label(&self) -> &'static str {
        match self {
            DemoClient::Loopback(_) => "loopback wallet",
            DemoClient::Bridge(_) => "http bridge",
        }
    }
}

impl ConnectionClient for DemoClient {
    async fn init(options: &ClientOptions) -> Result<Self, ConnectError> {
        if options.bridge_url.is_some() {
            Ok(DemoClient::Bridge(HttpBridgeClient::init(options).await?))
        } else {
            Ok(DemoClient::Loopback(LoopbackClient::init(options).await?))
        }
    }

    async fn connect(&self, params: &ConnectParams) -> Result<Session, ConnectError> {
        match self {
            DemoClient::Loopback(c) => c.connect(params).await,
            DemoClient::Bridge(c) => c.connect(params).await,
        }
    }

    async fn request(
        &self,
        args: &RequestArguments,
        chain: Option<&str>,
    ) -> Result<Value, ConnectError> {
        match self {
            DemoClient::Loopback(c) => c.request(args, chain).await,
            DemoClient::Bridge(c) => c.request(args, chain).await,
        }
    }

    async fn disconnect(&self) -> Result<(), ConnectError> {
        match self {
            DemoClient::Loopback(c) => c.disconnect().await,
            DemoClient::Bridge(c) => c.disconnect().await,
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            DemoClient::Loopback(c) => c.is_connected(),
            DemoClient::Bridge(c) => c.is_connected(),
        }
    }

    fn session(&self) -> Option<Session> {
        match self {
            DemoClient::Loopback(c) => c.session(),
            DemoClient::Bridge(c) => c.session(),
        }
    }

    fn subscribe(&self, handler: ClientEventHandler) {
        match self {
            DemoClient::Loopback(c) => c.subscribe(handler),
            DemoClient::Bridge(c) => c.subscribe(handler),
        }
    }
}
