//! ÖNACE category loading.

use aika_core::backend::AikaBackend;
use aika_core::catalog::CategoryCatalog;

/// Fetches the category listing, falling back to the built-in list.
///
/// An empty listing is treated like a failed one.
pub async fn fetch_catalog(backend: &dyn AikaBackend) -> CategoryCatalog {
    match backend.list_categories().await {
        Ok(categories) if !categories.is_empty() => {
            tracing::debug!(count = categories.len(), "Loaded ÖNACE categories");
            CategoryCatalog::new(categories)
        }
        Ok(_) => {
            tracing::warn!("Backend returned no ÖNACE categories, using fallback list");
            CategoryCatalog::fallback()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch ÖNACE categories, using fallback list");
            CategoryCatalog::fallback()
        }
    }
}
