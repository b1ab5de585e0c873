//! Error types for zabbixbot

use thiserror::Error;

use crate::aggregator::AggregationError;
use crate::bot::ChannelError;
use crate::formatter::RenderError;
use crate::zabbix::RpcError;

/// Result type alias using zabbixbot's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for zabbixbot operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON-RPC error
    #[error("Zabbix API error: {0}")]
    Rpc(#[from] RpcError),

    /// Aggregation error
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Rendering error
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Chat transport error
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
