//! Connection lifecycle state machine.

use crate::error::{SyncError, SyncResult};
use hookbin_model::Identity;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-local identifier for one live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next connection id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}

/// Lifecycle state of one client connection.
///
/// `Connecting → Connected → [Reconnecting → Connected]* → Disconnected`.
/// Reconciliation and the snapshot run on every entry into `Connected`; a
/// `Reconnecting` excursion does not re-run them until the connection is
/// `Connected` again. `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport established, not yet registered or reconciled.
    Connecting,
    /// Registered, reconciled, snapshot sent.
    Connected,
    /// Transport interrupted; registration survives until disconnect.
    Reconnecting,
    /// Unregistered. Terminal.
    Disconnected,
}

impl ConnectionState {
    /// Returns true if the connection is registered in the presence
    /// registry (counted for fan-out).
    #[must_use]
    pub fn is_registered(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Reconnecting)
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }
}

/// One client connection with its identity and lifecycle state.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    identity: Identity,
    state: ConnectionState,
}

impl Connection {
    /// Creates a connection in the `Connecting` state.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            id: ConnectionId::next(),
            identity,
            state: ConnectionState::Connecting,
        }
    }

    /// The connection's id.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The connection's verified identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Marks the connection `Connected`.
    ///
    /// Valid from `Connecting` and `Reconnecting`. The caller must run
    /// reconciliation and send the snapshot on every successful call.
    pub fn established(&mut self) -> SyncResult<()> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Reconnecting => {
                self.state = ConnectionState::Connected;
                Ok(())
            }
            from => Err(self.invalid(from, ConnectionState::Connected)),
        }
    }

    /// Marks the connection `Reconnecting` after a transport interruption.
    pub fn interrupted(&mut self) -> SyncResult<()> {
        match self.state {
            ConnectionState::Connected => {
                self.state = ConnectionState::Reconnecting;
                Ok(())
            }
            from => Err(self.invalid(from, ConnectionState::Reconnecting)),
        }
    }

    /// Marks the connection `Disconnected`. Valid from any non-terminal
    /// state.
    pub fn closed(&mut self) -> SyncResult<()> {
        if self.state.is_terminal() {
            return Err(self.invalid(self.state, ConnectionState::Disconnected));
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn invalid(&self, from: ConnectionState, to: ConnectionState) -> SyncError {
        SyncError::InvalidTransition {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}
