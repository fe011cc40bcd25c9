//! The identity-scoped service facade.

use crate::auth::TokenVerifier;
use crate::capture::CaptureRequest;
use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use hookbin_model::{now_ms, Entry, Identity};
use hookbin_protocol::{CaptureAck, ClientCommand};
use hookbin_store::StoreBackend;
use hookbin_sync::{Connection, EventSink, SyncEngine};
use tracing::error;

/// The webhook service: capture ingress plus identity-scoped management.
///
/// The surrounding HTTP/push framework routes requests here; this type owns
/// authentication, policy, and the mapping onto sync engine operations.
pub struct WebhookService<B: StoreBackend, S: EventSink, V: TokenVerifier> {
    engine: SyncEngine<B, S>,
    verifier: V,
    config: ServerConfig,
}

impl<B: StoreBackend, S: EventSink, V: TokenVerifier> WebhookService<B, S, V> {
    /// Creates a service.
    pub fn new(engine: SyncEngine<B, S>, verifier: V, config: ServerConfig) -> Self {
        Self {
            engine,
            verifier,
            config,
        }
    }

    /// The underlying sync engine.
    pub fn engine(&self) -> &SyncEngine<B, S> {
        &self.engine
    }

    /// Handles the public capture endpoint. No authentication.
    ///
    /// The capture's response depends only on the master write; fan-out
    /// failures are recovered inside the engine.
    pub fn handle_capture(&self, request: CaptureRequest) -> ApiResult<CaptureAck> {
        let entry = request.into_entry(&self.config.webhook_prefix);
        let stored = self.engine.capture(entry)?;
        Ok(CaptureAck::for_entry(&stored))
    }

    /// Verifies a bearer token and applies the allow-list.
    pub fn authenticate(&self, token: &str) -> ApiResult<Identity> {
        let principal = self.verifier.verify(token)?;
        let identity = Identity::new(&principal.email)?;
        if !self.config.access_policy.permits(&identity) {
            return Err(ApiError::Forbidden {
                identity: identity.to_string(),
            });
        }
        Ok(identity)
    }

    /// `GET /entries` — the caller's inbox, newest first.
    pub fn list_entries(&self, identity: &Identity) -> ApiResult<Vec<Entry>> {
        Ok(self.engine.store().list_inbox(identity, now_ms())?)
    }

    /// `GET /entries/{id}` — one inbox entry.
    pub fn get_entry(&self, identity: &Identity, id: &str) -> ApiResult<Entry> {
        self.engine
            .store()
            .get_inbox(identity, id, now_ms())?
            .ok_or_else(|| ApiError::NotFound(id.to_owned()))
    }

    /// `DELETE /entries/{id}` — removes from the caller's inbox only.
    pub fn delete_entry(&self, identity: &Identity, id: &str) -> ApiResult<()> {
        if self.engine.delete_entry(identity, id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(id.to_owned()))
        }
    }

    /// `DELETE /entries` — clears the caller's inbox, returning the count.
    pub fn clear_entries(&self, identity: &Identity) -> ApiResult<usize> {
        Ok(self.engine.clear(identity)?)
    }

    /// Handles a push connection reaching the transport's ready state.
    ///
    /// Authenticates, registers the identity, reconciles, and sends the
    /// `InitialData` snapshot to the new connection. Returns the connection
    /// handle in the `Connected` state.
    pub fn client_connected(&self, token: &str) -> ApiResult<Connection> {
        let identity = self.authenticate(token)?;
        let mut connection = Connection::new(identity.clone());
        self.engine.connect(&identity, connection.id())?;
        connection.established()?;
        Ok(connection)
    }

    /// Handles a push connection going away for good.
    pub fn client_disconnected(&self, connection: &mut Connection) -> ApiResult<()> {
        connection.closed()?;
        self.engine.disconnect(connection.identity());
        Ok(())
    }

    /// Dispatches a push-channel command in the connection's identity
    /// context.
    ///
    /// The channel has no synchronous error-response convention, so a
    /// failed command is logged and dropped.
    pub fn handle_command(&self, identity: &Identity, command: ClientCommand) {
        let outcome = match &command {
            ClientCommand::DeleteEntry { id } => {
                self.engine.delete_entry(identity, id).map(|_| ())
            }
            ClientCommand::ClearAll => self.engine.clear(identity).map(|_| ()),
            ClientCommand::RestoreAll => self.engine.restore(identity).map(|_| ()),
        };
        if let Err(err) = outcome {
            error!(%identity, command = command.name(), %err, "push command dropped");
        }
    }
}
