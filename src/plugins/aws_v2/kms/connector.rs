use std::sync::Arc;
use std::time::Duration;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_kms::config::{Credentials as SdkCredentials, Region};
use aws_sdk_kms::Client as AwsSdkKmsClient;

use crate::client::{KmsConnection, KmsConnector};
use crate::config::Endpoint;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::plugins::aws_v2::kms::client::AwsKmsConnection;
use crate::plugins::aws_v2::AttestationProvider;

/// Builder-style [`KmsConnector`] backed by the AWS SDK.
///
/// Each `connect` call produces a fresh client bound to one credentials
/// snapshot. The vsock endpoint is reached through a local TCP forward of the
/// parent's proxy, so the connector derives an HTTP endpoint URL from the
/// vsock port; use [`with_endpoint_url`](AwsKmsConnector::with_endpoint_url)
/// to override it.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
/// use enclavekms::plugins::aws_v2::AwsKmsConnector;
///
/// let connector = AwsKmsConnector::new()
///     .with_retry_config(3, 100)
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Default)]
pub struct AwsKmsConnector {
    /// Endpoint URL override; derived from the vsock port when unset
    endpoint_url: Option<String>,

    /// Custom timeout configuration
    timeout_config: Option<TimeoutConfig>,

    /// Custom retry configuration
    retry_config: Option<RetryConfig>,

    /// Attestation document source for connections created by this connector
    attestation: Option<Arc<dyn AttestationProvider>>,
}

impl AwsKmsConnector {
    /// Creates a connector with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the endpoint URL used for every connection
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Sets a custom timeout for SDK operations
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_config = Some(
            TimeoutConfig::builder()
                .operation_timeout(timeout)
                .operation_attempt_timeout(timeout)
                .build(),
        );
        self
    }

    /// Configures retry behavior for SDK operations
    pub fn with_retry_config(mut self, max_retries: u32, base_delay_ms: u64) -> Self {
        self.retry_config = Some(
            RetryConfig::standard()
                .with_max_attempts(max_retries)
                .with_initial_backoff(Duration::from_millis(base_delay_ms)),
        );
        self
    }

    /// Sets the attestation document source
    pub fn with_attestation_provider(mut self, provider: Arc<dyn AttestationProvider>) -> Self {
        self.attestation = Some(provider);
        self
    }

    fn endpoint_url_for(&self, endpoint: Endpoint) -> String {
        match &self.endpoint_url {
            Some(url) => url.clone(),
            // The parent's vsock proxy is forwarded to a local TCP port.
            None => format!("http://127.0.0.1:{}", endpoint.port),
        }
    }
}

impl KmsConnector for AwsKmsConnector {
    fn connect(
        &self,
        credentials: &Credentials,
        region: &str,
        endpoint: Endpoint,
    ) -> Result<Box<dyn KmsConnection>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::ClientCreateFailed(format!("runtime creation failed: {}", e)))?;

        let sdk_credentials = SdkCredentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_string()),
            None,
            "enclavekms",
        );

        let mut config_builder = aws_sdk_kms::Config::builder()
            .region(Region::new(region.to_string()))
            .credentials_provider(sdk_credentials)
            .endpoint_url(self.endpoint_url_for(endpoint));

        if let Some(timeout_config) = self.timeout_config.clone() {
            config_builder = config_builder.timeout_config(timeout_config);
        }

        if let Some(retry_config) = self.retry_config.clone() {
            config_builder = config_builder.retry_config(retry_config);
        }

        let client = AwsSdkKmsClient::from_conf(config_builder.build());

        log::debug!("created KMS client for region {}", region);

        Ok(Box::new(AwsKmsConnection::new(
            client,
            runtime,
            self.attestation.clone(),
        )))
    }
}

impl std::fmt::Debug for AwsKmsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsKmsConnector")
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}
