use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::xml_codec;
use super::RpcTransport;
use crate::error::BridgeResult;

/// XML-RPC over HTTP POST
#[derive(Debug)]
pub struct XmlRpcTransport {
    url: Url,
    http: reqwest::Client,
}

impl XmlRpcTransport {
    pub fn new(url: Url) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: Url, http: reqwest::Client) -> Self {
        Self { url, http }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for XmlRpcTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> BridgeResult<Value> {
        debug!("XML-RPC request: {}", method);
        let body = xml_codec::encode_call(method, &params)?;

        let response = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let text = response.text().await?;
        xml_codec::decode_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_call_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/xmlrpc")
            .match_header("content-type", "text/xml")
            .match_body(Matcher::Regex(
                "<methodName>api.receive</methodName>.*<string>printer</string>.*<int>250</int>"
                    .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(
                "<methodResponse><params><param><value><struct>\
                 <member><name>status</name><value><string>ok</string></value></member>\
                 <member><name>result</name><value><string>hello</string></value></member>\
                 </struct></value></param></params></methodResponse>",
            )
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/xmlrpc", server.url())).unwrap();
        let result = XmlRpcTransport::new(url)
            .call("api.receive", vec![json!("printer"), json!(250)])
            .await
            .unwrap();

        assert_eq!(result, json!({"status": "ok", "result": "hello"}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fault_is_raised() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/xmlrpc")
            .with_status(200)
            .with_body(
                "<methodResponse><fault><value><struct>\
                 <member><name>faultCode</name><value><int>0</int></value></member>\
                 <member><name>faultString</name><value>No such handler: api.nope</value></member>\
                 </struct></value></fault></methodResponse>",
            )
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/xmlrpc", server.url())).unwrap();
        let err = XmlRpcTransport::new(url)
            .call("api.nope", vec![])
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::Fault { code: 0, .. }));
        assert!(err.to_string().contains("No such handler"));
    }

    #[tokio::test]
    async fn test_http_failure_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/xmlrpc")
            .with_status(500)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/xmlrpc", server.url())).unwrap();
        let err = XmlRpcTransport::new(url).call("m", vec![]).await.unwrap_err();
        assert!(matches!(err, BridgeError::Http(_)));
    }
}
