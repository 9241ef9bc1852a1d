use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aws_sdk_kms::error::SdkError;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::EncryptionAlgorithmSpec;
use aws_sdk_kms::Client as AwsSdkKmsClient;
use serde::Serialize;
use tokio::runtime::Runtime;

use crate::buffer::SecureBuffer;
use crate::client::KmsConnection;
use crate::error::{Error, Result};
use crate::plugins::aws_v2::AttestationProvider;

/// JSON shape of a ListKeyPolicies response, matching the KMS wire format
#[derive(Serialize)]
struct ListKeyPoliciesResponse {
    #[serde(rename = "PolicyNames")]
    policy_names: Vec<String>,

    #[serde(rename = "NextMarker", skip_serializing_if = "Option::is_none")]
    next_marker: Option<String>,

    #[serde(rename = "Truncated")]
    truncated: bool,
}

/// A connected KMS client backed by the AWS SDK.
///
/// The core contract is blocking, so the connection owns a current-thread
/// tokio runtime and drives every SDK call with `block_on`. Transport-level
/// failures (dispatch, timeout, malformed response) flip the connection to
/// disconnected; the next health check replaces it. Service-level errors
/// leave the transport state alone.
pub struct AwsKmsConnection {
    client: AwsSdkKmsClient,
    runtime: Runtime,
    connected: AtomicBool,
    attestation: Option<Arc<dyn AttestationProvider>>,
}

impl AwsKmsConnection {
    pub(crate) fn new(
        client: AwsSdkKmsClient,
        runtime: Runtime,
        attestation: Option<Arc<dyn AttestationProvider>>,
    ) -> Self {
        Self {
            client,
            runtime,
            connected: AtomicBool::new(true),
            attestation,
        }
    }

    /// Maps an SDK error, marking the transport dropped when the failure is
    /// transport-level rather than a service response.
    fn map_sdk_error<E>(&self, operation: &str, err: &SdkError<E>) -> Error {
        let transport_failure = matches!(
            err,
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_)
        );

        if transport_failure {
            self.connected.store(false, Ordering::SeqCst);
        }

        log::error!("KMS {} error: {}", operation, err);
        Error::RemoteCallFailed(format!("KMS {} error: {}", operation, err))
    }
}

impl KmsConnection for AwsKmsConnection {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<SecureBuffer> {
        let result = self.runtime.block_on(
            self.client
                .encrypt()
                .key_id(key_id)
                .encryption_algorithm(EncryptionAlgorithmSpec::SymmetricDefault)
                .plaintext(Blob::new(plaintext.to_vec()))
                .send(),
        );

        let output = result.map_err(|e| self.map_sdk_error("encrypt", &e))?;

        output
            .ciphertext_blob()
            .map(|b| SecureBuffer::from_slice(b.as_ref()))
            .ok_or_else(|| Error::RemoteCallFailed("No ciphertext blob returned from KMS".into()))
    }

    fn decrypt(&self, key_id: &str, algorithm: &str, ciphertext: &[u8]) -> Result<SecureBuffer> {
        let result = self.runtime.block_on(
            self.client
                .decrypt()
                .key_id(key_id)
                .encryption_algorithm(EncryptionAlgorithmSpec::from(algorithm))
                .ciphertext_blob(Blob::new(ciphertext.to_vec()))
                .send(),
        );

        let output = result.map_err(|e| self.map_sdk_error("decrypt", &e))?;

        output
            .plaintext()
            .map(|b| SecureBuffer::from_slice(b.as_ref()))
            .ok_or_else(|| Error::RemoteCallFailed("No plaintext returned from KMS".into()))
    }

    fn list_key_policies(
        &self,
        key_id: &str,
        limit: u32,
        marker: Option<&str>,
    ) -> Result<SecureBuffer> {
        let result = self.runtime.block_on(
            self.client
                .list_key_policies()
                .key_id(key_id)
                .limit(limit as i32)
                .set_marker(marker.map(str::to_string))
                .send(),
        );

        let output = result.map_err(|e| self.map_sdk_error("list key policies", &e))?;

        let response = ListKeyPoliciesResponse {
            policy_names: output.policy_names().unwrap_or_default().to_vec(),
            next_marker: output.next_marker().map(str::to_string),
            truncated: output.truncated(),
        };

        let json = serde_json::to_vec(&response).map_err(|e| {
            Error::RemoteCallFailed(format!("Error marshalling key policies: {}", e))
        })?;

        Ok(SecureBuffer::from_vec(json))
    }

    fn get_key_policy(&self, key_id: &str, policy_name: &str) -> Result<SecureBuffer> {
        let result = self.runtime.block_on(
            self.client
                .get_key_policy()
                .key_id(key_id)
                .policy_name(policy_name)
                .send(),
        );

        let output = result.map_err(|e| self.map_sdk_error("get key policy", &e))?;

        output
            .policy()
            .map(|p| SecureBuffer::from_slice(p.as_bytes()))
            .ok_or_else(|| Error::RemoteCallFailed("No policy returned from KMS".into()))
    }

    fn attestation_document(&self) -> Result<SecureBuffer> {
        match &self.attestation {
            Some(provider) => provider.attestation_document(),
            None => Err(Error::RemoteCallFailed(
                "No attestation provider configured".into(),
            )),
        }
    }
}

impl std::fmt::Debug for AwsKmsConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKmsConnection")
            .field("connected", &self.is_connected())
            .finish()
    }
}
