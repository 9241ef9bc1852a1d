//! Plugin architecture for AWS service integrations
//!
//! Production implementations of the [`KmsConnector`](crate::KmsConnector)
//! seam live here, feature-gated so the core stays dependency-light.

#[cfg(feature = "aws-v2-kms")]
pub mod aws_v2;
