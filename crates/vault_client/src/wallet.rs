//! Connection lifecycle as an explicit state machine, so callers assert on
//! state instead of on incidental callback timing from the signing layer.

use solana_sdk::pubkey::Pubkey;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    Disconnected,
    Connecting,
    Connected(Pubkey),
    Disconnecting,
}

#[derive(Debug, Clone, Copy)]
pub enum WalletEvent {
    ConnectRequested,
    ConnectSucceeded(Pubkey),
    ConnectFailed,
    DisconnectRequested,
    DisconnectCompleted,
}

#[derive(Debug, Default)]
pub struct WalletSession {
    state: WalletState,
}

impl Default for WalletState {
    fn default() -> Self {
        WalletState::Disconnected
    }
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WalletState {
        self.state
    }

    pub fn connected_wallet(&self) -> Option<Pubkey> {
        match self.state {
            WalletState::Connected(pk) => Some(pk),
            _ => None,
        }
    }

    /// Applies a transition trigger. Anything not in the transition table is
    /// a typed error, never a silent state change.
    pub fn apply(&mut self, event: WalletEvent) -> Result<WalletState, ClientError> {
        let next = match (self.state, event) {
            (WalletState::Disconnected, WalletEvent::ConnectRequested) => WalletState::Connecting,
            (WalletState::Connecting, WalletEvent::ConnectSucceeded(pk)) => {
                WalletState::Connected(pk)
            }
            (WalletState::Connecting, WalletEvent::ConnectFailed) => WalletState::Disconnected,
            (WalletState::Connected(_), WalletEvent::DisconnectRequested) => {
                WalletState::Disconnecting
            }
            (WalletState::Disconnecting, WalletEvent::DisconnectCompleted) => {
                WalletState::Disconnected
            }
            (state, event) => {
                return Err(ClientError::IllegalTransition(format!(
                    "{event:?} in {state:?}"
                )))
            }
        };
        self.state = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle() {
        let wallet = Pubkey::new_unique();
        let mut session = WalletSession::new();
        assert_eq!(session.state(), WalletState::Disconnected);

        session.apply(WalletEvent::ConnectRequested).unwrap();
        assert_eq!(session.state(), WalletState::Connecting);
        assert_eq!(session.connected_wallet(), None);

        session.apply(WalletEvent::ConnectSucceeded(wallet)).unwrap();
        assert_eq!(session.connected_wallet(), Some(wallet));

        session.apply(WalletEvent::DisconnectRequested).unwrap();
        session.apply(WalletEvent::DisconnectCompleted).unwrap();
        assert_eq!(session.state(), WalletState::Disconnected);
    }

    #[test]
    fn failed_connect_returns_to_disconnected() {
        let mut session = WalletSession::new();
        session.apply(WalletEvent::ConnectRequested).unwrap();
        session.apply(WalletEvent::ConnectFailed).unwrap();
        assert_eq!(session.state(), WalletState::Disconnected);
    }

    #[test]
    fn out_of_order_events_are_typed_errors() {
        let mut session = WalletSession::new();
        let err = session
            .apply(WalletEvent::ConnectSucceeded(Pubkey::new_unique()))
            .unwrap_err();
        assert!(matches!(err, ClientError::IllegalTransition(_)));
        // State is unchanged after a refused transition.
        assert_eq!(session.state(), WalletState::Disconnected);

        session.apply(WalletEvent::ConnectRequested).unwrap();
        assert!(session.apply(WalletEvent::DisconnectRequested).is_err());
    }
}
