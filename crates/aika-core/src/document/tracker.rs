use super::model::{DocumentCategory, ProcessingStatus, UploadedFile};
use crate::error::Result;
use crate::storage::{KeyValueStore, UPLOADED_FILES_KEY, load_json, save_json};
use std::sync::Arc;

/// Persisted list of upload attempts, newest first.
///
/// Every mutation is written back to [`UPLOADED_FILES_KEY`] immediately.
pub struct UploadTracker {
    storage: Arc<dyn KeyValueStore>,
    files: Vec<UploadedFile>,
}

impl UploadTracker {
    /// Loads the stored records; unreadable storage yields an empty list.
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let files = load_json::<Vec<UploadedFile>>(storage.as_ref(), UPLOADED_FILES_KEY)?
            .unwrap_or_default();
        tracing::debug!(count = files.len(), "Loaded upload records");
        Ok(Self { storage, files })
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Records matching `category`, or all records for `None`.
    pub fn filtered(&self, category: Option<DocumentCategory>) -> Vec<&UploadedFile> {
        self.files
            .iter()
            .filter(|f| category.is_none_or(|c| f.category == c))
            .collect()
    }

    /// Prepends `file` and persists.
    pub fn record(&mut self, file: UploadedFile) -> Result<()> {
        tracing::info!(
            name = %file.name,
            success = file.success,
            status = %file.processing_status,
            "Recorded upload"
        );
        self.files.insert(0, file);
        self.persist()
    }

    /// Moves a record from processing to completed.
    ///
    /// Returns false when the record is gone or no longer processing.
    pub fn mark_completed(&mut self, id: &str) -> Result<bool> {
        let Some(file) = self
            .get_mut(id)
            .filter(|f| f.processing_status == ProcessingStatus::Processing)
        else {
            return Ok(false);
        };
        file.processing_status = ProcessingStatus::Completed;
        self.persist()?;
        Ok(true)
    }

    pub fn set_category(&mut self, id: &str, category: DocumentCategory) -> Result<bool> {
        let Some(file) = self.get_mut(id) else {
            return Ok(false);
        };
        file.category = category;
        self.persist()?;
        Ok(true)
    }

    /// Drops a record locally and returns it.
    pub fn remove(&mut self, id: &str) -> Result<Option<UploadedFile>> {
        let Some(index) = self.files.iter().position(|f| f.id == id) else {
            return Ok(None);
        };
        let removed = self.files.remove(index);
        self.persist()?;
        Ok(Some(removed))
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut UploadedFile> {
        self.files.iter_mut().find(|f| f.id == id)
    }

    fn persist(&self) -> Result<()> {
        save_json(self.storage.as_ref(), UPLOADED_FILES_KEY, &self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::MemoryStore;

    fn tracker() -> (Arc<MemoryStore>, UploadTracker) {
        let storage = Arc::new(MemoryStore::default());
        let tracker = UploadTracker::load(storage.clone()).unwrap();
        (storage, tracker)
    }

    #[test]
    fn test_records_newest_first_and_persists() {
        let (storage, mut tracker) = tracker();
        tracker
            .record(UploadedFile::succeeded("a.pdf", 10, DocumentCategory::General, "doc-a"))
            .unwrap();
        tracker
            .record(UploadedFile::failed("b.pdf", 20, DocumentCategory::Research))
            .unwrap();

        assert_eq!(tracker.files()[0].name, "b.pdf");
        let reloaded = UploadTracker::load(storage).unwrap();
        assert_eq!(reloaded.files(), tracker.files());
    }

    #[test]
    fn test_mark_completed_only_from_processing() {
        let (_, mut tracker) = tracker();
        let ok = UploadedFile::succeeded("a.pdf", 10, DocumentCategory::General, "doc-a");
        let failed = UploadedFile::failed("b.pdf", 20, DocumentCategory::General);
        let (ok_id, failed_id) = (ok.id.clone(), failed.id.clone());
        tracker.record(ok).unwrap();
        tracker.record(failed).unwrap();

        assert!(tracker.mark_completed(&ok_id).unwrap());
        assert!(!tracker.mark_completed(&ok_id).unwrap());
        assert!(!tracker.mark_completed(&failed_id).unwrap());
        assert_eq!(
            tracker.get(&failed_id).unwrap().processing_status,
            ProcessingStatus::Failed
        );
    }

    #[test]
    fn test_filter_and_recategorize() {
        let (_, mut tracker) = tracker();
        let file = UploadedFile::succeeded("a.pdf", 10, DocumentCategory::General, "doc-a");
        let id = file.id.clone();
        tracker.record(file).unwrap();
        tracker
            .record(UploadedFile::succeeded("b.pdf", 10, DocumentCategory::Business, "doc-b"))
            .unwrap();

        assert_eq!(tracker.filtered(None).len(), 2);
        assert_eq!(tracker.filtered(Some(DocumentCategory::Technical)).len(), 0);

        assert!(tracker.set_category(&id, DocumentCategory::Technical).unwrap());
        let technical = tracker.filtered(Some(DocumentCategory::Technical));
        assert_eq!(technical.len(), 1);
        assert_eq!(technical[0].id, id);
    }

    #[test]
    fn test_remove() {
        let (_, mut tracker) = tracker();
        let file = UploadedFile::failed("a.pdf", 10, DocumentCategory::General);
        let id = file.id.clone();
        tracker.record(file).unwrap();

        assert_eq!(tracker.remove(&id).unwrap().map(|f| f.name), Some("a.pdf".to_string()));
        assert!(tracker.remove(&id).unwrap().is_none());
        assert!(tracker.files().is_empty());
    }
}
