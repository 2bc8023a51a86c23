//! WebSocket client for inference server execution events.
//!
//! [`InferenceClient`] holds the WebSocket URL of one server. Call
//! [`InferenceClient::connect`] to open a live [`InferenceConnection`];
//! the server addresses execution events to the connection's
//! `client_id`, which must be passed along when submitting a workflow.

use tokio_tungstenite::{connect_async, MaybeTlsStream};

/// Raw WebSocket stream type used for inference events.
pub type InferenceStream =
    tokio_tungstenite::WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection configuration for an inference server.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    ws_url: String,
}

/// A live WebSocket connection to an inference server.
pub struct InferenceConnection {
    /// Unique client ID sent during the WebSocket handshake.
    pub client_id: String,
    /// The raw WebSocket stream for reading frames.
    pub ws_stream: InferenceStream,
}

impl InferenceClient {
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:8188`.
    pub fn new(ws_url: String) -> Self {
        Self {
            ws_url: ws_url.trim_end_matches('/').to_string(),
        }
    }

    /// Derive the WebSocket URL from an HTTP API URL.
    pub fn from_api_url(api_url: &str) -> Self {
        Self::new(ws_url_for(api_url))
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Connect to the `/ws` endpoint with a fresh `client_id` (UUID v4).
    pub async fn connect(&self) -> Result<InferenceConnection, InferenceClientError> {
        let client_id = uuid::Uuid::new_v4().to_string();
        let url = format!("{}/ws?clientId={}", self.ws_url, client_id);

        let (ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            InferenceClientError::Connection(format!(
                "Failed to connect to inference server at {}: {e}",
                self.ws_url
            ))
        })?;

        tracing::debug!(client_id = %client_id, ws_url = %self.ws_url, "Connected to inference server");

        Ok(InferenceConnection {
            client_id,
            ws_stream,
        })
    }
}

/// Map `http(s)://` to `ws(s)://`, leaving other schemes untouched.
pub fn ws_url_for(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        trimmed.to_string()
    }
}

/// Errors that can occur when working with the WebSocket client.
#[derive(Debug, thiserror::Error)]
pub enum InferenceClientError {
    /// Failed to establish the initial WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_mapping() {
        assert_eq!(ws_url_for("http://127.0.0.1:8188/"), "ws://127.0.0.1:8188");
        assert_eq!(ws_url_for("https://gpu.example.com"), "wss://gpu.example.com");
        assert_eq!(ws_url_for("ws://already"), "ws://already");
    }

    #[test]
    fn client_from_api_url() {
        let client = InferenceClient::from_api_url("http://host:8188");
        assert_eq!(client.ws_url(), "ws://host:8188");
    }
}
