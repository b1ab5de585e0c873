//! Zabbix JSON-RPC API access
//!
//! [`RpcClient`] performs single-attempt JSON-RPC 2.0 calls over HTTP. The
//! [`JsonRpc`] trait is the seam the aggregator is written against, so it can
//! run against a live backend or an in-memory one.

mod api;
mod rpc;

pub use api::{
    MalformedField, ProblemQuery, RawHost, RawProblem, RawTrigger, TriggerQuery, PROBLEM_GET,
    TRIGGER_GET,
};
pub use rpc::{RpcClient, RpcError, JSON_RPC_CONTENT_TYPE};

use async_trait::async_trait;
use serde_json::Value;

/// A JSON-RPC endpoint
#[async_trait]
pub trait JsonRpc: Send + Sync {
    /// Call `method` with `params`, returning the `result` member of the response
    async fn call(&self, method: &str, params: Value, auth_token: &str)
        -> Result<Value, RpcError>;
}
