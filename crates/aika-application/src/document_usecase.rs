//! Document use case: knowledge-base uploads and deletions.

use aika_core::backend::{AikaBackend, DocumentUpload};
use aika_core::document::{DocumentCategory, UploadTracker, UploadedFile};
use aika_core::{AikaError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Shown when the backend refused to delete a document.
pub const DELETE_REJECTED_MESSAGE: &str =
    "Failed to delete document from knowledge base. Please try again.";
/// Shown when the backend could not be reached for a deletion.
pub const DELETE_UNREACHABLE_MESSAGE: &str =
    "Failed to connect to server. Please check your connection and try again.";

/// User-facing message for a failed knowledge-base deletion.
pub fn delete_failure_message(err: &AikaError) -> &'static str {
    match err {
        AikaError::Backend { .. } => DELETE_REJECTED_MESSAGE,
        _ => DELETE_UNREACHABLE_MESSAGE,
    }
}

/// Uploads documents and keeps the local record of every attempt.
///
/// Successful uploads start out as processing and are switched to completed
/// by a background task after the configured delay.
pub struct DocumentUseCase {
    tracker: Arc<Mutex<UploadTracker>>,
    backend: Arc<dyn AikaBackend>,
    processing_delay: Duration,
}

impl DocumentUseCase {
    pub fn new(
        tracker: UploadTracker,
        backend: Arc<dyn AikaBackend>,
        processing_delay: Duration,
    ) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            backend,
            processing_delay,
        }
    }

    /// Snapshot of the records in `category`, or of all records for `None`.
    pub async fn files(&self, category: Option<DocumentCategory>) -> Vec<UploadedFile> {
        self.tracker
            .lock()
            .await
            .filtered(category)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn get(&self, id: &str) -> Option<UploadedFile> {
        self.tracker.lock().await.get(id).cloned()
    }

    /// Uploads one document and records the attempt.
    ///
    /// Backend failures are recorded as failed uploads, not returned.
    pub async fn upload(&self, upload: DocumentUpload) -> Result<UploadedFile> {
        let record = match self.backend.upload_document(&upload).await {
            Ok(document_id) => {
                UploadedFile::succeeded(&upload.file_name, upload.size(), upload.category, document_id)
            }
            Err(e) => {
                tracing::warn!(file = %upload.file_name, error = %e, "Upload failed");
                UploadedFile::failed(&upload.file_name, upload.size(), upload.category)
            }
        };

        self.tracker.lock().await.record(record.clone())?;
        if record.success {
            self.schedule_completion(record.id.clone());
        }
        Ok(record)
    }

    /// Reads and uploads each file in order.
    ///
    /// A file that cannot be read is recorded as a failed upload.
    pub async fn upload_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        category: DocumentCategory,
    ) -> Result<Vec<UploadedFile>> {
        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let record = match tokio::fs::read(path).await {
                Ok(bytes) => {
                    self.upload(DocumentUpload {
                        file_name,
                        bytes,
                        category,
                    })
                    .await?
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot read file for upload");
                    let record = UploadedFile::failed(file_name, 0, category);
                    self.tracker.lock().await.record(record.clone())?;
                    record
                }
            };
            records.push(record);
        }
        Ok(records)
    }

    fn schedule_completion(&self, id: String) {
        let tracker = Arc::clone(&self.tracker);
        let delay = self.processing_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tracker.lock().await.mark_completed(&id) {
                Ok(true) => tracing::debug!(id = %id, "Upload processing completed"),
                Ok(false) => {}
                Err(e) => tracing::warn!(id = %id, error = %e, "Failed to record completed upload"),
            }
        });
    }

    /// Deletes a document from the backend knowledge base.
    ///
    /// The local record is left alone; see [`remove_local`](Self::remove_local).
    /// Use [`delete_failure_message`] to present a failure.
    pub async fn delete_from_knowledge_base(&self, document_id: &str) -> Result<()> {
        self.backend.delete_document(document_id).await.inspect_err(|e| {
            tracing::warn!(document_id, error = %e, "Knowledge-base deletion failed");
        })
    }

    pub async fn remove_local(&self, id: &str) -> Result<Option<UploadedFile>> {
        self.tracker.lock().await.remove(id)
    }

    pub async fn set_category(&self, id: &str, category: DocumentCategory) -> Result<bool> {
        self.tracker.lock().await.set_category(id, category)
    }
}
