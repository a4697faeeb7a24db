//! Application wiring.
//!
//! `AikaApp` connects the session gate to the conversation store: signing
//! in activates the user's conversations, signing out drops them. Everything
//! else is reached through the use cases it exposes.

use crate::category_service::fetch_catalog;
use crate::chat_usecase::ChatUseCase;
use crate::document_usecase::DocumentUseCase;
use aika_core::Result;
use aika_core::backend::AikaBackend;
use aika_core::catalog::CategoryCatalog;
use aika_core::config::AikaConfig;
use aika_core::confirmation::Intent;
use aika_core::conversation::ConversationStore;
use aika_core::document::UploadTracker;
use aika_core::identity::{Credentials, Identity, IdentityVerifier, LoginOutcome, SessionGate};
use aika_core::storage::KeyValueStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub struct AikaApp {
    gate: Mutex<SessionGate>,
    store: Arc<Mutex<ConversationStore>>,
    chat: ChatUseCase,
    documents: DocumentUseCase,
    backend: Arc<dyn AikaBackend>,
    catalog: RwLock<CategoryCatalog>,
    login_pending: AtomicBool,
}

/// Clears the login-pending flag when the attempt ends, even if it is dropped.
struct PendingLogin<'a>(&'a AtomicBool);

impl<'a> PendingLogin<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AikaApp {
    /// Builds the application over the given ports.
    ///
    /// # Errors
    ///
    /// Fails only if the stored upload records cannot be read from storage.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        verifier: Arc<dyn IdentityVerifier>,
        backend: Arc<dyn AikaBackend>,
        config: &AikaConfig,
    ) -> Result<Self> {
        let store = Arc::new(Mutex::new(ConversationStore::new(storage.clone())));
        let tracker = UploadTracker::load(storage.clone())?;

        Ok(Self {
            gate: Mutex::new(SessionGate::new(storage, verifier)),
            chat: ChatUseCase::new(store.clone(), backend.clone(), config.chat.clone()),
            documents: DocumentUseCase::new(
                tracker,
                backend.clone(),
                Duration::from_millis(config.uploads.processing_delay_ms),
            ),
            store,
            backend,
            catalog: RwLock::new(CategoryCatalog::fallback()),
            login_pending: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> &Arc<Mutex<ConversationStore>> {
        &self.store
    }

    pub fn chat(&self) -> &ChatUseCase {
        &self.chat
    }

    pub fn documents(&self) -> &DocumentUseCase {
        &self.documents
    }

    pub fn backend(&self) -> &Arc<dyn AikaBackend> {
        &self.backend
    }

    pub async fn identity(&self) -> Option<Identity> {
        self.gate.lock().await.identity().cloned()
    }

    /// Restores a persisted sign-in and hydrates that user's conversations.
    pub async fn restore_session(&self) -> Result<Option<Identity>> {
        let identity = self.gate.lock().await.restore().cloned();
        if let Some(identity) = &identity {
            self.store.lock().await.activate(&identity.username)?;
        }
        Ok(identity)
    }

    /// True while a login attempt is waiting for its verdict.
    ///
    /// Front ends use this to keep a second submission from racing the first.
    pub fn is_login_pending(&self) -> bool {
        self.login_pending.load(Ordering::SeqCst)
    }

    /// Signs in and, on success, activates the user's conversations.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
        let outcome = {
            let _pending = PendingLogin::start(&self.login_pending);
            self.gate.lock().await.login(credentials).await
        };
        if let LoginOutcome::Authenticated(identity) = &outcome {
            self.store.lock().await.activate(&identity.username)?;
        }
        Ok(outcome)
    }

    pub async fn request_logout(&self) -> Option<Intent> {
        self.gate.lock().await.request_logout()
    }

    /// Signs out and drops the in-memory conversations.
    pub async fn confirm_logout(&self, intent: Intent) -> Result<()> {
        let result = self.gate.lock().await.confirm_logout(intent);
        if !self.gate.lock().await.is_authenticated() {
            self.store.lock().await.deactivate();
        }
        result
    }

    pub async fn decline_logout(&self, intent: Intent) {
        self.gate.lock().await.decline_logout(intent);
    }

    /// Reloads the ÖNACE categories from the backend (or the fallback list).
    pub async fn refresh_categories(&self) -> CategoryCatalog {
        let catalog = fetch_catalog(self.backend.as_ref()).await;
        *self.catalog.write().await = catalog.clone();
        catalog
    }

    pub async fn catalog(&self) -> CategoryCatalog {
        self.catalog.read().await.clone()
    }
}
