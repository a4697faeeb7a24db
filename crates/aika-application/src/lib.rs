//! Application layer for AIKA.
//!
//! This crate provides use case implementations that coordinate the domain
//! types of `aika-core` with the ports implemented by the outer layers.

pub mod app;
pub mod category_service;
pub mod chat_usecase;
pub mod document_usecase;

pub use app::AikaApp;
pub use category_service::fetch_catalog;
pub use chat_usecase::ChatUseCase;
pub use document_usecase::{DocumentUseCase, delete_failure_message};
