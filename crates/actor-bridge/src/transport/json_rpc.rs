use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use url::Url;

use super::RpcTransport;
use crate::error::{BridgeError, BridgeResult};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

/// Body of a non-200 reply
#[derive(Debug, Deserialize)]
struct RawJsonRpcError {
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<RemoteErrorData>,
}

/// Originating exception attached by the server
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteErrorData {
    #[serde(default)]
    exception_type_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl JsonRpcErrorObject {
    /// Pick the richest description available
    fn into_error(self) -> Option<BridgeError> {
        if let Some(data) = self.data {
            let message = data.message.unwrap_or_default();
            return Some(match data.exception_type_name {
                Some(exception_type) => BridgeError::RemoteException {
                    exception_type,
                    message,
                },
                None => BridgeError::Rpc {
                    code: self.code,
                    message: format!("Error: {}", message),
                },
            });
        }
        self.message.map(|message| BridgeError::Rpc {
            code: self.code,
            message,
        })
    }
}

/// JSON-RPC 2.0 over HTTP POST
#[derive(Debug)]
pub struct JsonRpcTransport {
    url: Url,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(url: Url) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: Url, http: reqwest::Client) -> Self {
        Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn decode_failure(status: StatusCode, body: &[u8]) -> BridgeError {
        match serde_json::from_slice::<RawJsonRpcError>(body) {
            Ok(RawJsonRpcError { error: Some(error) }) => error
                .into_error()
                .unwrap_or(BridgeError::UnknownRpcError {
                    status: status.as_u16(),
                }),
            Ok(_) => BridgeError::UnknownRpcError {
                status: status.as_u16(),
            },
            Err(e) => {
                warn!("Undecodable JSON-RPC error body (HTTP {}): {}", status, e);
                BridgeError::UnknownRpcError {
                    status: status.as_u16(),
                }
            }
        }
    }
}

#[async_trait]
impl RpcTransport for JsonRpcTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> BridgeResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        debug!("JSON-RPC request #{}: {}", id, method);

        let response = self
            .http
            .post(self.url.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            return Err(Self::decode_failure(status, &body));
        }

        let response: JsonRpcResponse = serde_json::from_slice(&body)?;
        if let Some(error) = response.error {
            return Err(error.into_error().unwrap_or(BridgeError::UnknownRpcError {
                status: status.as_u16(),
            }));
        }
        match response.id {
            Some(Value::Number(n)) if n.as_u64() == Some(id) => {}
            other => {
                return Err(BridgeError::protocol(format!(
                    "JSON-RPC response id {:?} does not match request #{}",
                    other, id
                )))
            }
        }

        debug!("JSON-RPC response #{} received", id);
        Ok(response.result)
    }
}
