//! JSON-RPC 2.0 client over HTTP

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::JsonRpc;
use crate::config::BackendConfig;

/// Content type the Zabbix frontend expects for API calls
pub const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";

/// Errors returned by [`RpcClient`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    /// The request never produced a usable HTTP response
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered without a `result` member
    #[error("RPC fault {code}: {message} {data}")]
    RpcFault {
        /// JSON-RPC error code (0 when the backend sent no error object)
        code: i64,
        /// Error message
        message: String,
        /// Backend-specific detail
        data: String,
    },

    /// The response body was not a JSON-RPC response
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a Value,
    id: u32,
    auth: &'a str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for RpcError {
    fn from(err: RpcErrorObject) -> Self {
        let data = match err.data {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        RpcError::RpcFault {
            code: err.code,
            message: err.message,
            data,
        }
    }
}

/// Zabbix JSON-RPC client
///
/// One HTTP POST per call, no retries.
pub struct RpcClient {
    client: Client,
    endpoint: String,
}

impl RpcClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &BackendConfig) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.url.clone(),
        })
    }

    /// Endpoint this client posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn extract_result(method: &str, response: RpcResponse) -> Result<Value, RpcError> {
        match response.result {
            Some(result) => Ok(result),
            None => {
                let fault = match response.error {
                    Some(err) => RpcError::from(err),
                    None => RpcError::RpcFault {
                        code: 0,
                        message: "response has no result".to_string(),
                        data: String::new(),
                    },
                };
                error!(method, error = %fault, "Zabbix API returned a fault");
                Err(fault)
            }
        }
    }
}

#[async_trait]
impl JsonRpc for RpcClient {
    async fn call(
        &self,
        method: &str,
        params: Value,
        auth_token: &str,
    ) -> Result<Value, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params: &params,
            id: 1,
            auth: auth_token,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|e| RpcError::InvalidResponse(format!("failed to encode request: {e}")))?;

        debug!(method, endpoint = %self.endpoint, "Calling Zabbix API");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_RPC_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(method, error = %e, "Request failed");
                RpcError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(method, %status, "Request failed");
            return Err(RpcError::Transport(format!(
                "Zabbix returned {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        let decoded: RpcResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        Self::extract_result(method, decoded)
    }
}
