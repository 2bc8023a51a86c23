//! Workflow execution against an inference server.
//!
//! [`WorkflowExecutor`] is the seam between engines and the server: the
//! production [`InferenceExecutor`] submits over REST and follows progress
//! over WebSocket, while tests substitute an in-memory implementation.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::api::InferenceApi;
use crate::client::{InferenceClient, InferenceClientError};
use crate::config::InferenceConfig;
use crate::error::GenerationError;
use crate::messages::{parse_message, InferenceMessage, PromptState};

/// Runs workflows and returns the bytes of their output image.
#[async_trait]
pub trait WorkflowExecutor: Send + Sync {
    /// Make `bytes` available to `LoadImage` nodes; returns the name to
    /// reference in the workflow.
    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> Result<String, GenerationError>;

    /// Execute `workflow` and download the first image of `output_node`.
    async fn execute(
        &self,
        workflow: &serde_json::Value,
        output_node: &str,
    ) -> Result<Vec<u8>, GenerationError>;
}

/// Executor backed by a ComfyUI-compatible server.
#[derive(Debug, Clone)]
pub struct InferenceExecutor {
    api: InferenceApi,
    client: InferenceClient,
    timeout: Duration,
}

impl InferenceExecutor {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            api: InferenceApi::new(config.url.clone()),
            client: InferenceClient::from_api_url(&config.url),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl WorkflowExecutor for InferenceExecutor {
    async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> Result<String, GenerationError> {
        let uploaded = self.api.upload_image(filename, bytes).await?;
        Ok(uploaded.node_reference())
    }

    async fn execute(
        &self,
        workflow: &serde_json::Value,
        output_node: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        // Subscribe before submitting so no completion event is missed.
        let mut connection = self.client.connect().await?;
        let submitted = self
            .api
            .submit_workflow(workflow, &connection.client_id)
            .await?;
        let prompt_id = submitted.prompt_id;
        tracing::info!(prompt_id = %prompt_id, queue_position = submitted.number, "Workflow submitted");

        let waited = wait_bounded(&mut connection.ws_stream, &prompt_id, self.timeout).await;
        let _ = connection.ws_stream.close(None).await;

        if let Err(e) = waited {
            if matches!(e, GenerationError::Timeout(_)) {
                if let Err(interrupt_err) = self.api.interrupt().await {
                    tracing::warn!(prompt_id = %prompt_id, error = %interrupt_err, "Failed to interrupt timed-out prompt");
                }
            }
            return Err(e);
        }

        let history = self.api.get_history(&prompt_id).await?;
        let image = history
            .output_image(&prompt_id, output_node)
            .ok_or(GenerationError::NoOutput)?;
        tracing::debug!(prompt_id = %prompt_id, filename = %image.filename, "Downloading output image");
        Ok(self.api.view_image(&image).await?)
    }
}

/// [`wait_for_prompt`] bounded by `timeout`.
async fn wait_bounded<S>(
    ws_stream: &mut S,
    prompt_id: &str,
    timeout: Duration,
) -> Result<(), GenerationError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    match tokio::time::timeout(timeout, wait_for_prompt(ws_stream, prompt_id)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(timeout.as_secs())),
    }
}

/// Read events until `prompt_id` finishes, fails or the socket closes.
async fn wait_for_prompt<S>(ws_stream: &mut S, prompt_id: &str) -> Result<(), GenerationError>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(frame) = ws_stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(frame)) => {
                tracing::debug!(?frame, "Inference WebSocket closed");
                break;
            }
            // Binary frames carry live previews.
            Ok(_) => continue,
            Err(e) => {
                return Err(InferenceClientError::Protocol(e.to_string()).into());
            }
        };

        let message = match parse_message(&text) {
            Ok(message) => message,
            Err(e) => {
                tracing::trace!(error = %e, "Skipping unrecognised inference message");
                continue;
            }
        };

        if let InferenceMessage::Progress(progress) = &message {
            tracing::debug!(prompt_id, value = progress.value, max = progress.max, "Generation progress");
        }

        match message.state_for(prompt_id) {
            PromptState::Running => {}
            PromptState::Finished => return Ok(()),
            PromptState::Failed { node_id, message } => {
                return Err(GenerationError::Execution { node_id, message });
            }
            PromptState::Interrupted => return Err(GenerationError::Interrupted),
        }
    }

    Err(InferenceClientError::Protocol(format!(
        "connection closed before prompt {prompt_id} finished"
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use futures::stream;

    use super::*;

    fn text(json: &str) -> Result<Message, WsError> {
        Ok(Message::text(json))
    }

    #[tokio::test]
    async fn finishes_on_own_prompt_only() {
        let mut frames = stream::iter(vec![
            text(r#"{"type":"executing","data":{"node":null,"prompt_id":"other"}}"#),
            text(r#"{"type":"progress","data":{"value":3,"max":80,"prompt_id":"p1","node":"5"}}"#),
            Ok(Message::binary(vec![0u8, 1, 2])),
            text("not json"),
            text(r#"{"type":"executing","data":{"node":null,"prompt_id":"p1"}}"#),
        ]);
        assert_matches!(wait_for_prompt(&mut frames, "p1").await, Ok(()));
    }

    #[tokio::test]
    async fn execution_error_fails() {
        let mut frames = stream::iter(vec![text(
            r#"{"type":"execution_error","data":{"prompt_id":"p1","node_id":"7","exception_message":"CUDA out of memory","exception_type":"RuntimeError"}}"#,
        )]);
        let result = wait_for_prompt(&mut frames, "p1").await;
        assert_matches!(
            result,
            Err(GenerationError::Execution { node_id, message })
                if node_id == "7" && message == "CUDA out of memory"
        );
    }

    #[tokio::test]
    async fn close_before_finish_is_an_error() {
        let mut closed = stream::iter(vec![
            text(r#"{"type":"executing","data":{"node":"4","prompt_id":"p1"}}"#),
            Ok(Message::Close(None)),
        ]);
        assert_matches!(
            wait_for_prompt(&mut closed, "p1").await,
            Err(GenerationError::Client(InferenceClientError::Protocol(_)))
        );

        let mut ended = stream::iter(Vec::<Result<Message, WsError>>::new());
        assert_matches!(
            wait_for_prompt(&mut ended, "p1").await,
            Err(GenerationError::Client(InferenceClientError::Protocol(_)))
        );

        let mut broken = stream::iter(vec![Err(WsError::ConnectionClosed)]);
        assert_matches!(
            wait_for_prompt(&mut broken, "p1").await,
            Err(GenerationError::Client(InferenceClientError::Protocol(_)))
        );
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let mut silent = stream::pending::<Result<Message, WsError>>();
        let result = wait_bounded(&mut silent, "p1", Duration::from_millis(50)).await;
        assert_matches!(result, Err(GenerationError::Timeout(_)));
    }

    #[tokio::test]
    async fn bounded_wait_passes_through_completion() {
        let mut frames = stream::iter(vec![text(
            r#"{"type":"execution_success","data":{"prompt_id":"p1"}}"#,
        )]);
        assert_matches!(
            wait_bounded(&mut frames, "p1", Duration::from_secs(5)).await,
            Ok(())
        );
    }
}
