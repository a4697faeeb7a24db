//! HttpBackend - REST implementation of [`AikaBackend`].
//!
//! Talks JSON to the backend for chat and category listing, and multipart
//! for document uploads. Non-success statuses become
//! [`AikaError::Backend`]; requests that never got a response become
//! [`AikaError::Transport`].

use aika_core::backend::{AikaBackend, ChatReply, ChatRequest, DocumentUpload};
use aika_core::catalog::OnaceCategory;
use aika_core::config::{ApiSettings, normalize_base_url};
use aika_core::{AikaError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Backend client over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url` with the given per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AikaError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn from_settings(settings: &ApiSettings) -> Result<Self> {
        Self::new(&settings.base_url, Duration::from_secs(settings.timeout_secs))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-success response into a backend error, passing successes through.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(AikaError::backend(status.as_u16(), error_detail(&body, status.canonical_reason())))
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        response.json::<T>().await.map_err(|e| AikaError::Serialization {
            format: "JSON".to_string(),
            message: format!("Failed to parse {what} response: {e}"),
        })
    }
}

fn transport(err: reqwest::Error) -> AikaError {
    if err.is_timeout() {
        AikaError::transport(format!("Request timed out: {err}"))
    } else {
        AikaError::transport(err.to_string())
    }
}

/// Human-readable message from an error body.
///
/// Prefers a `detail` or `message` field of a JSON body, then the raw body,
/// then the status reason.
fn error_detail(body: &str, reason: Option<&str>) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: Option<serde_json::Value>,
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match (parsed.detail, parsed.message) {
            (Some(serde_json::Value::String(detail)), _) => return detail,
            (Some(detail), _) => return detail.to_string(),
            (None, Some(message)) => return message,
            (None, None) => {}
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    reason.unwrap_or("Unknown error").to_string()
}

#[derive(Deserialize)]
struct UploadResponse {
    document_id: String,
}

#[derive(Deserialize)]
struct CategoriesResponse {
    categories: Vec<OnaceCategory>,
}

#[async_trait]
impl AikaBackend for HttpBackend {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        tracing::debug!(
            model = %request.model,
            industry = %request.industry_code,
            history = request.history.len(),
            "Sending chat request"
        );
        let response = self
            .client
            .post(self.url("/chat"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let response = Self::check(response).await?;
        Self::parse(response, "chat").await
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String> {
        let mime = mime_guess::from_path(&upload.file_name).first_or_octet_stream();
        let file_part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(mime.essence_str())
            .map_err(transport)?;
        let metadata = serde_json::json!({ "category": upload.category }).to_string();
        let form = Form::new()
            .part("file", file_part)
            .text("metadata", metadata);

        tracing::debug!(file = %upload.file_name, size = upload.size(), mime = %mime, "Uploading document");
        let response = self
            .client
            .post(self.url("/documents/upload"))
            .header("accept", "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        let response = Self::check(response).await?;
        let parsed: UploadResponse = Self::parse(response, "upload").await?;
        Ok(parsed.document_id)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/documents/{document_id}")))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(transport)?;

        Self::check(response).await?;
        tracing::info!(document_id, "Deleted document from knowledge base");
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<OnaceCategory>> {
        let response = self
            .client
            .get(self.url("/onace/categories"))
            .send()
            .await
            .map_err(transport)?;

        let response = Self::check(response).await?;
        let parsed: CategoriesResponse = Self::parse(response, "categories").await?;
        Ok(parsed.categories)
    }
}
