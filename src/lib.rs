//! # Enclave KMS Control Layer
//!
//! `enclavekms` is the enclave-resident control layer for a confidential
//! key-management client. It holds AWS credentials and a KMS client handle
//! inside an isolated execution environment, exposes a small set of
//! cryptographic and administrative operations (encrypt, decrypt, list/get
//! key policy, fetch an attestation document), and transparently reconnects
//! the remote client whenever its transport has dropped.
//!
//! The wire protocol, request signing, and vsock transport are external
//! collaborators behind the [`KmsConnection`]/[`KmsConnector`] traits. A
//! production connector backed by the AWS SDK is available through the
//! `plugins` module (feature `aws-v2-kms`).
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use enclavekms::config::Config;
//! use enclavekms::context::Context;
//! use enclavekms::credentials::Credentials;
//! use enclavekms::plugins::aws_v2::AwsKmsConnector;
//!
//! let connector = Arc::new(AwsKmsConnector::new());
//! let ctx = Context::new(connector);
//!
//! let config = Config::new("us-east-1", 8000)
//!     .with_default_key_id("alias/my-key")
//!     .with_logging(true);
//! let credentials = Credentials::new(access_key_id, secret_access_key, session_token);
//!
//! ctx.init(config, credentials)?;
//!
//! let ciphertext = ctx.encrypt("alias/my-key", b"hello")?;
//! let plaintext = ctx.decrypt("alias/my-key", "SYMMETRIC_DEFAULT", ciphertext.as_slice())?;
//! assert_eq!(plaintext.as_slice(), b"hello");
//!
//! // Rotate credentials; the client is reconnected under the new bundle.
//! ctx.update_credentials(new_id, new_secret, new_token)?;
//!
//! // Shutdown wipes credentials and drops the connection. Idempotent.
//! ctx.shutdown()?;
//! # Ok::<(), enclavekms::Error>(())
//! ```
//!
//! Results that carry secret material are returned as [`SecureBuffer`]s,
//! whose backing storage is zeroized on drop. Dropping the buffer is the
//! caller's release obligation; there is no other release path.

pub mod buffer;
pub mod client;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod log;
pub mod metrics;
pub mod util;

// Plugin architecture for AWS service integrations
pub mod plugins;

// Re-export key types
pub use crate::buffer::SecureBuffer;
pub use crate::client::{KmsConnection, KmsConnector};
pub use crate::config::{Config, Endpoint};
pub use crate::context::{Context, MAX_ENCRYPT_PLAINTEXT_LEN};
pub use crate::credentials::Credentials;
pub use crate::error::{Error, Result};
pub use crate::log::{set_logger, Logger, NoopLogger, StderrLogger};
pub use crate::metrics::{disable_metrics, metrics_enabled, set_metrics_provider, MetricsProvider};

mod context_test;
