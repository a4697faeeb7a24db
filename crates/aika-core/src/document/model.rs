use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse category attached to an uploaded document.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DocumentCategory {
    #[default]
    General,
    Technical,
    Business,
    Research,
    Other,
}

/// Where the backend is in ingesting an uploaded document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    /// Records written before statuses were tracked count as completed.
    #[default]
    Completed,
    Failed,
}

/// One upload attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    /// Size in bytes
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    pub success: bool,
    #[serde(default)]
    pub category: DocumentCategory,
    #[serde(default)]
    pub processing_status: ProcessingStatus,
    /// Backend id; only present when the upload succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl UploadedFile {
    pub fn succeeded(
        name: impl Into<String>,
        size: u64,
        category: DocumentCategory,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            size,
            upload_date: Utc::now(),
            success: true,
            category,
            processing_status: ProcessingStatus::Processing,
            document_id: Some(document_id.into()),
        }
    }

    pub fn failed(name: impl Into<String>, size: u64, category: DocumentCategory) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            size,
            upload_date: Utc::now(),
            success: false,
            category,
            processing_status: ProcessingStatus::Failed,
            document_id: None,
        }
    }
}
