//! Knowledge-base documents uploaded from this client.
//!
//! - `model`: `UploadedFile` and its category/status enums
//! - `tracker`: `UploadTracker`, the persisted list of upload attempts

mod model;
mod tracker;

pub use model::{DocumentCategory, ProcessingStatus, UploadedFile};
pub use tracker::UploadTracker;
