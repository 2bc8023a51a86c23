//! Inference server WebSocket message types and parser.
//!
//! The server sends JSON messages shaped `{"type": "<kind>", "data": {...}}`.
//! This module deserializes the kinds the executor reacts to.

use serde::Deserialize;

/// Known WebSocket message types.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InferenceMessage {
    /// Server status broadcast (queue depth).
    #[serde(rename = "status")]
    Status(StatusData),

    /// A prompt has started executing.
    #[serde(rename = "execution_start")]
    ExecutionStart(PromptRef),

    /// Some nodes were skipped because their outputs are cached.
    #[serde(rename = "execution_cached")]
    ExecutionCached(ExecutionCachedData),

    /// A node is executing, or the prompt finished when `node` is `None`.
    #[serde(rename = "executing")]
    Executing(ExecutingData),

    /// Step-level progress from a sampler node.
    #[serde(rename = "progress")]
    Progress(ProgressData),

    /// A node finished and produced output.
    #[serde(rename = "executed")]
    Executed(ExecutedData),

    /// The prompt finished successfully (newer servers).
    #[serde(rename = "execution_success")]
    ExecutionSuccess(PromptRef),

    /// Execution failed.
    #[serde(rename = "execution_error")]
    ExecutionError(ErrorData),

    /// Execution was interrupted.
    #[serde(rename = "execution_interrupted")]
    ExecutionInterrupted(PromptRef),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub exec_info: ExecInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecInfo {
    pub queue_remaining: i32,
}

/// Payload carrying only the prompt ID.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRef {
    pub prompt_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionCachedData {
    pub prompt_id: String,
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutingData {
    pub node: Option<String>,
    pub prompt_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressData {
    pub value: i32,
    pub max: i32,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutedData {
    pub node: String,
    pub output: serde_json::Value,
    pub prompt_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    pub prompt_id: String,
    pub node_id: String,
    pub exception_message: String,
    pub exception_type: String,
}

/// Where a prompt stands after a message has been observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState {
    Running,
    Finished,
    Failed { node_id: String, message: String },
    Interrupted,
}

impl InferenceMessage {
    /// Interpret the message for `prompt_id`; messages about other prompts
    /// leave it running.
    pub fn state_for(&self, prompt_id: &str) -> PromptState {
        match self {
            Self::Executing(data)
                if data.node.is_none() && data.prompt_id.as_deref() == Some(prompt_id) =>
            {
                PromptState::Finished
            }
            Self::ExecutionSuccess(data) if data.prompt_id == prompt_id => PromptState::Finished,
            Self::ExecutionError(data) if data.prompt_id == prompt_id => PromptState::Failed {
                node_id: data.node_id.clone(),
                message: format!("{}: {}", data.exception_type, data.exception_message),
            },
            Self::ExecutionInterrupted(data) if data.prompt_id == prompt_id => {
                PromptState::Interrupted
            }
            _ => PromptState::Running,
        }
    }
}

/// Parse a WebSocket text message into a typed enum.
///
/// Returns `Err` for malformed JSON or unknown `type` values.
/// Callers should log unknown types and continue.
pub fn parse_message(text: &str) -> Result<InferenceMessage, serde_json::Error> {
    serde_json::from_str(text)
}
