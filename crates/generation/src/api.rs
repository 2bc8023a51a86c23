//! REST API client for the inference server's HTTP endpoints.
//!
//! Wraps workflow submission, interruption, history retrieval, output
//! download and input upload using [`reqwest`].

use std::collections::HashMap;

use serde::Deserialize;

/// HTTP client for a single inference server.
#[derive(Debug, Clone)]
pub struct InferenceApi {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by `POST /prompt` after queuing a workflow.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued prompt.
    pub prompt_id: String,
    /// Position in the execution queue.
    pub number: i32,
}

/// Response returned by `POST /upload/image`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub folder_type: String,
}

impl UploadResponse {
    /// Value a `LoadImage` node expects for this upload.
    pub fn node_reference(&self) -> String {
        if self.subfolder.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.subfolder, self.name)
        }
    }
}

/// `GET /history/{prompt_id}` body, keyed by prompt ID.
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(flatten)]
    pub prompts: HashMap<String, PromptHistory>,
}

#[derive(Debug, Deserialize)]
pub struct PromptHistory {
    #[serde(default)]
    pub outputs: HashMap<String, NodeOutput>,
    pub status: Option<PromptStatus>,
}

#[derive(Debug, Deserialize)]
pub struct NodeOutput {
    pub images: Option<Vec<OutputImage>>,
}

/// A file written by an output node.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OutputImage {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub folder_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptStatus {
    #[serde(default)]
    pub status_str: String,
    #[serde(default)]
    pub completed: bool,
}

impl HistoryResponse {
    /// First image written by `node_id` for `prompt_id`, falling back to
    /// the first image of any node.
    pub fn output_image(&self, prompt_id: &str, node_id: &str) -> Option<OutputImage> {
        let history = self.prompts.get(prompt_id)?;
        let first_of = |output: &NodeOutput| output.images.as_ref()?.first().cloned();
        history
            .outputs
            .get(node_id)
            .and_then(first_of)
            .or_else(|| {
                let mut nodes: Vec<_> = history.outputs.iter().collect();
                nodes.sort_by(|a, b| a.0.cmp(b.0));
                nodes.into_iter().find_map(|(_, output)| first_of(output))
            })
    }
}

/// Errors from the inference server REST layer.
#[derive(Debug, thiserror::Error)]
pub enum InferenceApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("Inference API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl InferenceApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `http://host:8188`.
    pub fn new(api_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a workflow for execution (`POST /prompt`).
    pub async fn submit_workflow(
        &self,
        workflow: &serde_json::Value,
        client_id: &str,
    ) -> Result<SubmitResponse, InferenceApiError> {
        let body = serde_json::json!({
            "prompt": workflow,
            "client_id": client_id,
        });

        let response = self
            .client
            .post(format!("{}/prompt", self.api_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Interrupt whatever is executing right now (`POST /interrupt`).
    pub async fn interrupt(&self) -> Result<(), InferenceApiError> {
        let response = self
            .client
            .post(format!("{}/interrupt", self.api_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Retrieve execution history for a prompt (`GET /history/{prompt_id}`).
    pub async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, InferenceApiError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.api_url, prompt_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download an output file (`GET /view`).
    pub async fn view_image(&self, image: &OutputImage) -> Result<Vec<u8>, InferenceApiError> {
        let response = self
            .client
            .get(format!("{}/view", self.api_url))
            .query(&[
                ("filename", image.filename.as_str()),
                ("subfolder", image.subfolder.as_str()),
                ("type", image.folder_type.as_str()),
            ])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Upload an input image (`POST /upload/image`), overwriting any file
    /// with the same name.
    pub async fn upload_image(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, InferenceApiError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("overwrite", "true");

        let response = self
            .client
            .post(format!("{}/upload/image", self.api_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an
    /// [`InferenceApiError::ApiError`] with status and body on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, InferenceApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(InferenceApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, InferenceApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), InferenceApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
