//! HTTP adapter for the AIKA retrieval backend.

pub mod http_backend;

pub use crate::http_backend::HttpBackend;
