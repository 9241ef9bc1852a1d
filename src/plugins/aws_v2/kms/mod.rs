//! AWS KMS connector and connection, SDK v2

mod client;
mod connector;

pub use client::AwsKmsConnection;
pub use connector::AwsKmsConnector;
