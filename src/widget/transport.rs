//! Network seam of the widget.

use async_trait::async_trait;
use url::Url;

use super::error::{Result, TransportError};
use crate::protocol::{CHAT_PATH, ChatReply, ChatRequest, ErrorBody};

/// One request/response exchange with the chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request and decode the reply.
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// JSON-over-HTTP transport posting to `{base_url}/api/chat`.
///
/// The HTTP status is not inspected: whatever body comes back is decoded,
/// and only a body that fails to decode counts as a failure.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for the server at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a transport with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let endpoint = Url::parse(base_url.as_ref())?.join(CHAT_PATH)?;
        Ok(Self { endpoint, http })
    }

    /// The full URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        tracing::debug!(status = %response.status(), "Chat endpoint answered");

        let body = response.bytes().await?;
        decode_reply(&body)
    }
}

/// Decode a reply body, surfacing an `{"error": ...}` body as its message.
pub(crate) fn decode_reply(body: &[u8]) -> Result<ChatReply> {
    match serde_json::from_slice::<ChatReply>(body) {
        Ok(reply) => Ok(reply),
        Err(err) => match serde_json::from_slice::<ErrorBody>(body) {
            Ok(failure) => Err(TransportError::Server(failure.error)),
            Err(_) => Err(TransportError::Json(err)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_is_fixed_path() {
        let transport = HttpTransport::new("http://localhost:5000").unwrap();
        assert_eq!(
            transport.endpoint().as_str(),
            "http://localhost:5000/api/chat"
        );

        // A path on the base URL does not change the endpoint.
        let transport = HttpTransport::new("http://localhost:5000/ui/").unwrap();
        assert_eq!(
            transport.endpoint().as_str(),
            "http://localhost:5000/api/chat"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new("not a url").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl(_)));
    }

    #[test]
    fn test_decode_reply() {
        let reply = decode_reply(br#"{"response":"hi"}"#).unwrap();
        assert_eq!(reply.response, "hi");
    }

    #[test]
    fn test_decode_error_body() {
        let err = decode_reply(br#"{"error":"model unavailable"}"#).unwrap_err();
        assert_eq!(err.to_string(), "model unavailable");
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode_reply(b"<html>Internal Server Error</html>").unwrap_err();
        assert!(matches!(err, TransportError::Json(_)));
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
