//! # RPC transports
//!
//! One method call, one network round trip. Both encodings exchange
//! [`serde_json::Value`]s so the layers above never see the wire format.

mod json_rpc;
mod xml_codec;
mod xml_rpc;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::{ClientConfig, TransportKind};
use crate::error::BridgeResult;

pub use json_rpc::JsonRpcTransport;
pub use xml_rpc::XmlRpcTransport;

/// A request/response RPC capability
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Invoke `method` with positional `params` and return the raw result
    async fn call(&self, method: &str, params: Vec<Value>) -> BridgeResult<Value>;
}

/// Build the transport named by the endpoint's path suffix
pub fn connect(config: &ClientConfig) -> BridgeResult<Arc<dyn RpcTransport>> {
    let url = config.endpoint_url()?;
    let kind = TransportKind::from_url(&url)?;
    let http = config.http_client()?;
    debug!("Using {} transport for {}", kind, url);

    let transport: Arc<dyn RpcTransport> = match kind {
        TransportKind::JsonRpc => Arc::new(JsonRpcTransport::with_client(url, http)),
        TransportKind::XmlRpc => Arc::new(XmlRpcTransport::with_client(url, http)),
    };
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_connect_rejects_unknown_transport_before_any_call() {
        let result = connect(&ClientConfig::new("http://localhost:8080/soap"));
        assert!(matches!(
            result,
            Err(BridgeError::UnsupportedTransport { .. })
        ));
    }

    #[test]
    fn test_connect_accepts_both_encodings() {
        assert!(connect(&ClientConfig::new("http://localhost:8080/jsonrpc")).is_ok());
        assert!(connect(&ClientConfig::new("http://localhost:8080/xmlrpc")).is_ok());
    }
}
