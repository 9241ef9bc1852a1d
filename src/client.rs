//! Remote KMS client seam
//!
//! The wire protocol, request signing, and vsock transport are external
//! collaborators. The context talks to them exclusively through these traits:
//! [`KmsConnector`] creates a connected client bound to one credentials
//! snapshot, and [`KmsConnection`] carries the blocking remote operations
//! plus the transport status the connection-health check inspects.
//!
//! A production implementation backed by the AWS SDK lives in
//! `plugins::aws_v2` (feature `aws-v2-kms`); tests inject doubles.

use crate::buffer::SecureBuffer;
use crate::config::Endpoint;
use crate::credentials::Credentials;
use crate::error::Result;

/// A connected KMS client handle.
///
/// Every remote call blocks the calling thread until the transport round trip
/// completes. Implementations report transport state through
/// [`is_connected`](KmsConnection::is_connected); a connection that has
/// observed a transport failure must report disconnected so the next
/// health check replaces it.
pub trait KmsConnection: Send + Sync {
    /// Returns true if the underlying transport is currently connected
    fn is_connected(&self) -> bool;

    /// Encrypts plaintext under the given key
    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<SecureBuffer>;

    /// Decrypts ciphertext under the given key and algorithm
    fn decrypt(&self, key_id: &str, algorithm: &str, ciphertext: &[u8]) -> Result<SecureBuffer>;

    /// Lists key policy names for the given key as raw JSON bytes
    fn list_key_policies(
        &self,
        key_id: &str,
        limit: u32,
        marker: Option<&str>,
    ) -> Result<SecureBuffer>;

    /// Fetches the named key policy as raw JSON bytes
    fn get_key_policy(&self, key_id: &str, policy_name: &str) -> Result<SecureBuffer>;

    /// Fetches an attestation document for this execution environment.
    ///
    /// The document is opaque to this layer; interpretation belongs to the
    /// caller.
    fn attestation_document(&self) -> Result<SecureBuffer>;
}

/// Factory for [`KmsConnection`]s.
///
/// A connector binds a credentials snapshot, region, and transport endpoint
/// into a new connection. The context invokes it at init, on credential
/// rotation, and whenever the health check finds the transport dropped.
pub trait KmsConnector: Send + Sync {
    /// Creates a new connection bound to the given credentials and endpoint
    fn connect(
        &self,
        credentials: &Credentials,
        region: &str,
        endpoint: Endpoint,
    ) -> Result<Box<dyn KmsConnection>>;
}
