//! Context configuration
//!
//! Mirrors the initialization surface of the enclave control layer: AWS
//! region, the vsock endpoint where the parent's proxy listens, a default key
//! id and encryption algorithm, and the logging switch. Validated once, at
//! `Context::init`.

use crate::error::{Error, Result};

/// Default parent CID for vsock communication with the parent instance
pub const DEFAULT_PARENT_CID: u32 = 3;

/// Default KMS encryption algorithm
pub const DEFAULT_ENCRYPTION_ALGORITHM: &str = "SYMMETRIC_DEFAULT";

/// A vsock endpoint: context id plus port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// vsock context id of the peer (the parent instance)
    pub cid: u32,

    /// vsock port on which the proxy is available
    pub port: u32,
}

impl Endpoint {
    /// Creates an endpoint addressing the parent CID on the given port
    pub fn parent(port: u32) -> Self {
        Self {
            cid: DEFAULT_PARENT_CID,
            port,
        }
    }
}

/// Configuration for a [`Context`](crate::context::Context)
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS region for KMS operations
    pub region: String,

    /// vsock endpoint of the parent's proxy
    pub endpoint: Endpoint,

    /// Default KMS key id for operations that do not name one
    pub default_key_id: String,

    /// Default KMS encryption algorithm
    pub default_algorithm: String,

    /// Emit per-operation info logs when set
    pub enable_logging: bool,
}

impl Config {
    /// Creates a config for the given region and proxy port, with defaults
    /// for the remaining fields
    pub fn new(region: impl Into<String>, proxy_port: u32) -> Self {
        Self {
            region: region.into(),
            endpoint: Endpoint::parent(proxy_port),
            default_key_id: String::new(),
            default_algorithm: DEFAULT_ENCRYPTION_ALGORITHM.to_string(),
            enable_logging: false,
        }
    }

    /// Sets the default KMS key id
    pub fn with_default_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.default_key_id = key_id.into();
        self
    }

    /// Sets the default encryption algorithm
    pub fn with_default_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.default_algorithm = algorithm.into();
        self
    }

    /// Enables per-operation info logging
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Validates that every required field is present.
    ///
    /// Called by `Context::init` before any resource is acquired.
    pub fn validate(&self) -> Result<()> {
        if self.region.is_empty() {
            return Err(Error::InvalidParameter("region is empty".into()));
        }

        if self.default_key_id.is_empty() {
            return Err(Error::InvalidParameter("default key id is empty".into()));
        }

        if self.default_algorithm.is_empty() {
            return Err(Error::InvalidParameter(
                "default encryption algorithm is empty".into(),
            ));
        }

        Ok(())
    }
}
