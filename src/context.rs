//! Context lifecycle, connection health, and the secure operation pipeline
//!
//! A [`Context`] is the aggregate root for one logical session: it owns the
//! configuration, the credential bundle, and the remote client handle bound
//! to that bundle. Contexts are caller-owned handles; any number of
//! independent contexts can coexist in a process.
//!
//! Every remote operation runs the same pipeline: validate the caller's
//! parameters (no I/O on violation), ensure the client connection is alive
//! (recreating it when the transport has dropped), then delegate to the
//! blocking remote call and hand the result back as a [`SecureBuffer`].
//!
//! A single mutex guards the mutable interior and is held for the full
//! duration of each operation, including the remote round trip. Callers are
//! serialized, and none can ever observe a partially rotated
//! credentials/connection pair.

use std::sync::{Arc, Mutex, MutexGuard};

use metrics::counter;

use crate::buffer::SecureBuffer;
use crate::client::{KmsConnection, KmsConnector};
use crate::config::Config;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::log;
use crate::timer;

/// Upper bound on plaintext length accepted by [`Context::encrypt`], in bytes.
///
/// This is a policy limit on the encrypt path, carried over from the original
/// control layer; it is not a limit of the underlying cryptosystem.
pub const MAX_ENCRYPT_PLAINTEXT_LEN: usize = 4096;

/// Smallest accepted `limit` for [`Context::list_key_policies`]
pub const LIST_KEY_POLICIES_MIN_LIMIT: u32 = 1;

/// Largest accepted `limit` for [`Context::list_key_policies`]
pub const LIST_KEY_POLICIES_MAX_LIMIT: u32 = 1000;

/// State held only while the context is initialized.
///
/// Invariant: `connection`, when present, was created from `credentials`;
/// rotation replaces both under the same lock acquisition.
///
/// Field order is the release order: connection, then credentials, then
/// config.
struct Initialized {
    connection: Option<Box<dyn KmsConnection>>,
    credentials: Credentials,
    config: Config,
}

/// Aggregate root for one enclave KMS session
pub struct Context {
    connector: Arc<dyn KmsConnector>,
    inner: Mutex<Option<Initialized>>,
}

impl Context {
    /// Creates an empty, uninitialized context using the given connector for
    /// all client construction
    pub fn new(connector: Arc<dyn KmsConnector>) -> Self {
        Self {
            connector,
            inner: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Initialized>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns true if the context has been initialized and not shut down
    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Initializes the context with the given configuration and credentials.
    ///
    /// Validates every required field before acquiring any resource, then
    /// connects the remote client. On connection failure nothing is retained:
    /// the context is left in the empty state and `init` is safe to retry.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` if called twice without an intervening
    /// [`shutdown`](Context::shutdown); `InvalidParameter` if the config or
    /// credential triple is incomplete; `ClientCreateFailed` if the remote
    /// client could not be constructed.
    pub fn init(&self, config: Config, credentials: Credentials) -> Result<()> {
        let mut inner = self.lock();

        if inner.is_some() {
            log::error("context has already been initialized");
            return Err(Error::AlreadyInitialized);
        }

        config.validate()?;

        if credentials.has_empty_field() {
            return Err(Error::InvalidParameter(
                "credential triple is incomplete".into(),
            ));
        }

        let connection = self
            .connector
            .connect(&credentials, &config.region, config.endpoint)
            .map_err(|e| {
                log::error(&format!("failed to create kms client: {}", e));
                Error::ClientCreateFailed(e.to_string())
            })?;

        if config.enable_logging {
            log::info("context initialized");
        }

        *inner = Some(Initialized {
            connection: Some(connection),
            credentials,
            config,
        });

        Ok(())
    }

    /// Shuts the context down, releasing the connection, credentials, and
    /// configuration in that order.
    ///
    /// Idempotent: calling it on an already-empty context is a no-op that
    /// still succeeds. Afterwards the context is indistinguishable from a
    /// freshly constructed one.
    pub fn shutdown(&self) -> Result<()> {
        let mut inner = self.lock();

        if let Some(mut state) = inner.take() {
            // Connection first: it is bound to the credentials it was
            // created from and must not outlive them.
            drop(state.connection.take());

            if state.config.enable_logging {
                log::info("context shut down");
            }
        }

        Ok(())
    }

    /// Replaces the credential bundle and reconnects the remote client.
    ///
    /// The old credentials and the connection bound to them are destroyed as
    /// a unit before the new triple is installed. Reconnection happens
    /// immediately; if it fails, the new credentials are kept, the connection
    /// is left absent for the next operation's health check to retry, and
    /// `ClientCreateFailed` is returned.
    ///
    /// # Errors
    ///
    /// `NotInitialized` before [`init`](Context::init); `InvalidParameter`
    /// if any field of the triple is empty.
    pub fn update_credentials(
        &self,
        access_key_id: &str,
        secret_access_key: &str,
        session_token: &str,
    ) -> Result<()> {
        let mut inner = self.lock();

        let state = match inner.as_mut() {
            Some(state) => state,
            None => {
                log::error("context must be initialized before updating credentials");
                return Err(Error::NotInitialized);
            }
        };

        let new_credentials = Credentials::new(access_key_id, secret_access_key, session_token);
        if new_credentials.has_empty_field() {
            return Err(Error::InvalidParameter(
                "credential triple is incomplete".into(),
            ));
        }

        // Destroy the connection together with the credentials it was bound
        // to, then install the new bundle. Both happen under the lock, so no
        // caller can mix old credentials with a new connection or vice versa.
        drop(state.connection.take());
        state.credentials = new_credentials;

        if state.config.enable_logging {
            log::info("credentials updated, reconnecting kms client");
        }

        match self.connector.connect(
            &state.credentials,
            &state.config.region,
            state.config.endpoint,
        ) {
            Ok(connection) => {
                state.connection = Some(connection);
                Ok(())
            }
            Err(e) => {
                log::error(&format!("failed to reconnect kms client: {}", e));
                Err(Error::ClientCreateFailed(e.to_string()))
            }
        }
    }

    /// Encrypts plaintext under the given key.
    ///
    /// Plaintext must be non-empty and at most [`MAX_ENCRYPT_PLAINTEXT_LEN`]
    /// bytes. Returns the ciphertext as an owned [`SecureBuffer`].
    pub fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<SecureBuffer> {
        if plaintext.is_empty() {
            log::error("plaintext must not be empty");
            return Err(Error::InvalidParameter("plaintext is empty".into()));
        }

        if key_id.is_empty() {
            log::error("kms key id must not be empty");
            return Err(Error::InvalidParameter("key id is empty".into()));
        }

        if plaintext.len() > MAX_ENCRYPT_PLAINTEXT_LEN {
            log::error("plaintext too large");
            return Err(Error::InvalidParameter(format!(
                "plaintext length {} exceeds the {} byte limit",
                plaintext.len(),
                MAX_ENCRYPT_PLAINTEXT_LEN
            )));
        }

        let mut inner = self.lock();
        let state = inner.as_mut().ok_or(Error::NotInitialized)?;

        Self::ensure_connected(&*self.connector, state)?;
        let connection = Self::connection(state)?;

        if state.config.enable_logging {
            log::info("encrypt");
        }

        counter!("enclavekms.kms.encrypt", 1);
        let _timer = timer!("enclavekms.kms.encrypt.time");

        connection.encrypt(key_id, plaintext)
    }

    /// Decrypts ciphertext under the given key and encryption algorithm.
    ///
    /// Returns the plaintext as an owned [`SecureBuffer`]; dropping the
    /// buffer zeroizes it.
    pub fn decrypt(&self, key_id: &str, algorithm: &str, ciphertext: &[u8]) -> Result<SecureBuffer> {
        if ciphertext.is_empty() {
            log::error("ciphertext must not be empty");
            return Err(Error::InvalidParameter("ciphertext is empty".into()));
        }

        if key_id.is_empty() || algorithm.is_empty() {
            log::error("kms key id and algorithm must not be empty");
            return Err(Error::InvalidParameter(
                "key id or algorithm is empty".into(),
            ));
        }

        let mut inner = self.lock();
        let state = inner.as_mut().ok_or(Error::NotInitialized)?;

        Self::ensure_connected(&*self.connector, state)?;
        let connection = Self::connection(state)?;

        if state.config.enable_logging {
            log::info("decrypt");
        }

        counter!("enclavekms.kms.decrypt", 1);
        let _timer = timer!("enclavekms.kms.decrypt.time");

        connection.decrypt(key_id, algorithm, ciphertext)
    }

    /// Lists key policy names for the given key.
    ///
    /// `limit` must lie in `[1, 1000]`; the bound is checked before any
    /// network call. Returns the raw JSON response bytes.
    pub fn list_key_policies(
        &self,
        key_id: &str,
        limit: u32,
        marker: Option<&str>,
    ) -> Result<SecureBuffer> {
        if key_id.is_empty() {
            log::error("kms key id must not be empty");
            return Err(Error::InvalidParameter("key id is empty".into()));
        }

        if !(LIST_KEY_POLICIES_MIN_LIMIT..=LIST_KEY_POLICIES_MAX_LIMIT).contains(&limit) {
            log::error("list key policies limit is out of range");
            return Err(Error::InvalidParameter(format!(
                "limit {} is outside [{}, {}]",
                limit, LIST_KEY_POLICIES_MIN_LIMIT, LIST_KEY_POLICIES_MAX_LIMIT
            )));
        }

        let mut inner = self.lock();
        let state = inner.as_mut().ok_or(Error::NotInitialized)?;

        Self::ensure_connected(&*self.connector, state)?;
        let connection = Self::connection(state)?;

        if state.config.enable_logging {
            log::info("list key policies");
        }

        counter!("enclavekms.kms.list_key_policies", 1);
        let _timer = timer!("enclavekms.kms.list_key_policies.time");

        connection.list_key_policies(key_id, limit, marker)
    }

    /// Fetches the named key policy for the given key as raw JSON bytes
    pub fn get_key_policy(&self, key_id: &str, policy_name: &str) -> Result<SecureBuffer> {
        if key_id.is_empty() {
            log::error("kms key id must not be empty");
            return Err(Error::InvalidParameter("key id is empty".into()));
        }

        if policy_name.is_empty() {
            log::error("policy name must not be empty");
            return Err(Error::InvalidParameter("policy name is empty".into()));
        }

        let mut inner = self.lock();
        let state = inner.as_mut().ok_or(Error::NotInitialized)?;

        Self::ensure_connected(&*self.connector, state)?;
        let connection = Self::connection(state)?;

        if state.config.enable_logging {
            log::info("get key policy");
        }

        counter!("enclavekms.kms.get_key_policy", 1);
        let _timer = timer!("enclavekms.kms.get_key_policy.time");

        connection.get_key_policy(key_id, policy_name)
    }

    /// Fetches an attestation document for this execution environment.
    ///
    /// The document is an opaque payload; interpretation belongs to the
    /// caller.
    pub fn attestation_document(&self) -> Result<SecureBuffer> {
        let mut inner = self.lock();
        let state = inner.as_mut().ok_or(Error::NotInitialized)?;

        Self::ensure_connected(&*self.connector, state)?;
        let connection = Self::connection(state)?;

        if state.config.enable_logging {
            log::info("get attestation document");
        }

        counter!("enclavekms.kms.attestation_document", 1);
        let _timer = timer!("enclavekms.kms.attestation_document.time");

        connection.attestation_document()
    }

    /// Check-and-repair for the connection.
    ///
    /// If the held connection reports a live transport this is a no-op and
    /// cheap enough to run before every operation. Otherwise the stale handle
    /// is destroyed and a fresh one is created from the current credentials.
    fn ensure_connected(connector: &dyn KmsConnector, state: &mut Initialized) -> Result<()> {
        if let Some(connection) = &state.connection {
            if connection.is_connected() {
                return Ok(());
            }

            log::info("kms client transport dropped, reconnecting");
        }

        drop(state.connection.take());

        let connection = connector
            .connect(
                &state.credentials,
                &state.config.region,
                state.config.endpoint,
            )
            .map_err(|e| {
                log::error(&format!("failed to recreate kms client: {}", e));
                Error::ClientCreateFailed(e.to_string())
            })?;

        state.connection = Some(connection);
        Ok(())
    }

    // ensure_connected ran first, so the handle is always present here.
    fn connection(state: &Initialized) -> Result<&dyn KmsConnection> {
        state
            .connection
            .as_deref()
            .ok_or_else(|| Error::ClientCreateFailed("connection absent".into()))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
