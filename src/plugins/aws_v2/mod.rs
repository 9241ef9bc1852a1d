//! AWS SDK v2 integration
//!
//! A [`KmsConnector`](crate::KmsConnector) implementation backed by the AWS
//! SDK for Rust. The core API is blocking, so each connection owns a
//! dedicated current-thread tokio runtime and drives the async SDK with
//! `block_on`.

pub mod kms;

pub use kms::{AwsKmsConnection, AwsKmsConnector};

use crate::buffer::SecureBuffer;
use crate::error::Result;

/// Source of attestation documents for this execution environment.
///
/// Document generation and signing belong to the platform (the Nitro Secure
/// Module device in production); this layer only fetches the opaque payload.
pub trait AttestationProvider: Send + Sync {
    /// Fetches a fresh attestation document
    fn attestation_document(&self) -> Result<SecureBuffer>;
}
