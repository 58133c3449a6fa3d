use crate::ports::ConnectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
}

impl ConnectionState {
    pub fn is_initialized(self) -> bool {
        !matches!(
            self,
            ConnectionState::Uninitialized | ConnectionState::Initializing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    BeginInit,
    InitSucceeded,
    InitFailed,
    BeginConnect,
    ConnectSucceeded,
    ConnectFailed,
    BeginDisconnect,
    DisconnectSucceeded,
    DisconnectFailed,
    SessionDeleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub reason: &'static str,
}

pub fn connection_transition(
    from: ConnectionState,
    action: ConnectionAction,
) -> Result<(ConnectionState, StateTransition), ConnectError> {
    use ConnectionAction as A;
    use ConnectionState as S;

    let (to, reason) = match (from, action) {
        (S::Uninitialized, A::BeginInit) => (S::Initializing, "init_started"),
        (S::Initializing, A::InitSucceeded) => (S::Ready, "init_succeeded"),
        (S::Initializing, A::InitFailed) => (S::Uninitialized, "init_failed"),
        (S::Initializing, A::BeginInit) => {
            return Err(ConnectError::Busy("init already in progress".to_owned()))
        }
        (S::Ready | S::Disconnected, A::BeginConnect) => (S::Connecting, "connect_started"),
        (S::Connecting, A::ConnectSucceeded) => (S::Connected, "connect_succeeded"),
        (S::Connecting, A::ConnectFailed) => (S::Ready, "connect_failed"),
        (S::Connected, A::BeginDisconnect) => (S::Disconnecting, "disconnect_started"),
        (S::Disconnecting, A::DisconnectSucceeded) => (S::Disconnected, "disconnect_succeeded"),
        (S::Disconnecting, A::DisconnectFailed) => (S::Connected, "disconnect_failed"),
        (S::Connected, A::SessionDeleted) => (S::Disconnected, "session_deleted"),
        (S::Uninitialized | S::Initializing, A::BeginConnect | A::BeginDisconnect) => {
            return Err(ConnectError::NotInitialized(
                "connection manager not initialized".to_owned(),
            ))
        }
        (S::Connecting, A::BeginConnect | A::BeginDisconnect) => {
            return Err(ConnectError::Busy("connect already in progress".to_owned()))
        }
        (S::Disconnecting, A::BeginConnect | A::BeginDisconnect) => {
            return Err(ConnectError::Busy("disconnect in progress".to_owned()))
        }
        (from, action) => {
            return Err(ConnectError::InvalidState(format!(
                "illegal connection transition: {from:?} --{action:?}-->"
            )))
        }
    };
    Ok((to, StateTransition { from, to, reason }))
}
