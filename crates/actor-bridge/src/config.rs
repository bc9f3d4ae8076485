use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{BridgeError, BridgeResult};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/jsonrpc";

/// RPC encoding spoken by the configured endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    JsonRpc,
    XmlRpc,
}

impl TransportKind {
    /// Pick the transport from the last path segment of the endpoint URL
    pub fn from_url(url: &Url) -> BridgeResult<Self> {
        let token = url
            .path_segments()
            .and_then(|segments| segments.last())
            .unwrap_or_default();
        token.parse()
    }

    pub fn token(&self) -> &'static str {
        match self {
            TransportKind::JsonRpc => "jsonrpc",
            TransportKind::XmlRpc => "xmlrpc",
        }
    }
}

impl FromStr for TransportKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jsonrpc" => Ok(TransportKind::JsonRpc),
            "xmlrpc" => Ok(TransportKind::XmlRpc),
            other => Err(BridgeError::UnsupportedTransport {
                token: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Connection settings for an [`ActorApi`](crate::ActorApi)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RPC endpoint, ending in `/jsonrpc` or `/xmlrpc`
    pub endpoint: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: None,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn endpoint_url(&self) -> BridgeResult<Url> {
        Ok(Url::parse(&self.endpoint)?)
    }

    pub fn transport_kind(&self) -> BridgeResult<TransportKind> {
        TransportKind::from_url(&self.endpoint_url()?)
    }

    pub(crate) fn http_client(&self) -> BridgeResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_is_jsonrpc() {
        let config = ClientConfig::default();
        assert_eq!(config.transport_kind().unwrap(), TransportKind::JsonRpc);
    }

    #[test]
    fn test_xmlrpc_suffix() {
        let config = ClientConfig::new("http://actors.local:9000/api/xmlrpc");
        assert_eq!(config.transport_kind().unwrap(), TransportKind::XmlRpc);
    }

    #[test]
    fn test_unknown_suffix_is_rejected() {
        let err = ClientConfig::new("http://localhost:8080/grpc")
            .transport_kind()
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedTransport { ref token } if token == "grpc"));
    }

    #[test]
    fn test_trailing_slash_is_not_a_transport() {
        let err = ClientConfig::new("http://localhost:8080/jsonrpc/")
            .transport_kind()
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedTransport { .. }));
    }

    #[test]
    fn test_unparseable_url() {
        let err = ClientConfig::new("not a url").transport_kind().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidUrl(_)));
    }

    #[test]
    fn test_config_from_toml_like_json() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"endpoint":"http://h/xmlrpc"}"#).unwrap();
        assert!(config.user_agent.is_none());
        assert_eq!(config.transport_kind().unwrap(), TransportKind::XmlRpc);
    }
}
