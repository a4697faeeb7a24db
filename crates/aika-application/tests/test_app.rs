use aika_application::AikaApp;
use aika_application::chat_usecase::CHAT_ERROR_PREFIX;
use aika_application::document_usecase::{
    DELETE_REJECTED_MESSAGE, DELETE_UNREACHABLE_MESSAGE, delete_failure_message,
};
use aika_core::backend::{AikaBackend, ChatReply, ChatRequest, DocumentUpload};
use aika_core::catalog::OnaceCategory;
use aika_core::config::AikaConfig;
use aika_core::conversation::{DEFAULT_TITLE, MessageRole};
use aika_core::document::{DocumentCategory, ProcessingStatus};
use aika_core::identity::{Credentials, Identity, IdentityVerifier, LoginFailure, LoginOutcome};
use aika_core::storage::KeyValueStore;
use aika_core::{AikaError, Result};
use aika_infrastructure::static_verifier::StaticCredentialVerifier;
use aika_infrastructure::InMemoryKeyValueStore;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Scripted backend recording every chat request it receives.
#[derive(Default)]
struct MockBackend {
    requests: Mutex<Vec<ChatRequest>>,
    fail_chat: bool,
    fail_uploads: bool,
    categories: Option<Vec<OnaceCategory>>,
    /// When set, `chat` signals `entered` and waits for `release`.
    hold: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MockBackend {
    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AikaBackend for MockBackend {
    fn base_url(&self) -> &str {
        "http://backend.test"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some((entered, release)) = &self.hold {
            entered.notify_one();
            release.notified().await;
        }
        if self.fail_chat {
            return Err(AikaError::transport("connection refused"));
        }
        Ok(ChatReply {
            content: format!("Answer to: {}", request.content),
            sources: Vec::new(),
            expanded_queries: vec!["expanded".to_string()],
            relevant_links: Vec::new(),
        })
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> Result<String> {
        if self.fail_uploads {
            return Err(AikaError::backend(500, "ingestion failed"));
        }
        Ok(format!("doc-{}", upload.file_name))
    }

    async fn delete_document(&self, _document_id: &str) -> Result<()> {
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<OnaceCategory>> {
        self.categories
            .clone()
            .ok_or_else(|| AikaError::transport("offline"))
    }
}

fn config() -> AikaConfig {
    let mut config = AikaConfig::default();
    config.uploads.processing_delay_ms = 3000;
    config
}

fn app_with(storage: Arc<InMemoryKeyValueStore>, backend: Arc<MockBackend>) -> AikaApp {
    let verifier = Arc::new(StaticCredentialVerifier::default().with_delay(Duration::ZERO));
    AikaApp::new(storage, verifier, backend, &config()).unwrap()
}

async fn signed_in(backend: MockBackend) -> (Arc<InMemoryKeyValueStore>, Arc<MockBackend>, AikaApp) {
    let storage = Arc::new(InMemoryKeyValueStore::new());
    let backend = Arc::new(backend);
    let app = app_with(storage.clone(), backend.clone());
    let outcome = app
        .login(&Credentials::new("test1", "test1&1234"))
        .await
        .unwrap();
    assert!(outcome.is_authenticated());
    (storage, backend, app)
}

#[tokio::test]
async fn test_login_activates_conversations() {
    let (_, _, app) = signed_in(MockBackend::default()).await;

    let store = app.store().lock().await;
    assert_eq!(store.active_user(), Some("test1"));
    assert_eq!(store.conversations().len(), 1);
    assert_eq!(store.current().unwrap().title, DEFAULT_TITLE);
}

#[tokio::test]
async fn test_failed_login_leaves_store_inactive() {
    let storage = Arc::new(InMemoryKeyValueStore::new());
    let app = app_with(storage, Arc::new(MockBackend::default()));

    let outcome = app
        .login(&Credentials::new("test1", "wrong"))
        .await
        .unwrap();
    assert_eq!(outcome, LoginOutcome::Rejected(LoginFailure::InvalidCredentials));
    assert!(!app.store().lock().await.is_initialized());
}

#[tokio::test]
async fn test_send_message_records_question_and_answer() {
    let (_, backend, app) = signed_in(MockBackend::default()).await;
    let id = app.store().lock().await.current_id().unwrap().to_string();
    app.store()
        .lock()
        .await
        .update_meta_information(&id, "40 employees")
        .unwrap();

    let reply = app.chat().send_message("What is VSME?").await.unwrap();
    assert_eq!(reply.role, MessageRole::Assistant);

    let store = app.store().lock().await;
    let conversation = store.get(&id).unwrap();
    assert_eq!(conversation.title, "What is VSME?");
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
    assert_eq!(conversation.messages[1].content, "Answer to: What is VSME?");
    assert_eq!(conversation.messages[1].expanded_queries, vec!["expanded"]);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[0].meta_information, "40 employees");
    assert_eq!(requests[0].model, "gpt-4.1");
}

#[tokio::test]
async fn test_history_contains_prior_turns_only() {
    let (_, backend, app) = signed_in(MockBackend::default()).await;

    app.chat().send_message("first").await.unwrap();
    app.chat().send_message("second").await.unwrap();

    let requests = backend.requests();
    let history: Vec<&str> = requests[1].history.iter().map(|h| h.content.as_str()).collect();
    assert_eq!(history, vec!["first", "Answer to: first"]);
}

#[tokio::test]
async fn test_blank_message_never_reaches_backend() {
    let (_, backend, app) = signed_in(MockBackend::default()).await;

    let err = app.chat().send_message("   \n").await.unwrap_err();
    assert!(err.is_validation());
    assert!(backend.requests().is_empty());
    assert!(app.store().lock().await.current().unwrap().messages.is_empty());
}

#[tokio::test]
async fn test_backend_failure_becomes_error_message() {
    let (_, _, app) = signed_in(MockBackend {
        fail_chat: true,
        ..Default::default()
    })
    .await;

    let reply = app.chat().send_message("Hello").await.unwrap();
    assert_eq!(reply.role, MessageRole::Error);
    assert_eq!(
        reply.content,
        format!("{CHAT_ERROR_PREFIX}: connection refused")
    );

    let store = app.store().lock().await;
    let messages = &store.current().unwrap().messages;
    assert_eq!(messages.len(), 2);
    assert!(!messages[1].has_enrichment());
}

#[tokio::test]
async fn test_answer_lands_in_originating_conversation() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let (_, _, app) = signed_in(MockBackend {
        hold: Some((entered.clone(), release.clone())),
        ..Default::default()
    })
    .await;
    let app = Arc::new(app);
    let origin = app.store().lock().await.current_id().unwrap().to_string();

    let sender = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.chat().send_message("slow question").await })
    };

    entered.notified().await;
    let other = app.store().lock().await.create().unwrap().unwrap();
    release.notify_one();
    sender.await.unwrap().unwrap();

    let store = app.store().lock().await;
    assert_eq!(store.current_id(), Some(other.as_str()));
    assert!(store.get(&other).unwrap().messages.is_empty());
    assert_eq!(store.get(&origin).unwrap().messages.len(), 2);
}

#[tokio::test]
async fn test_logout_then_restore_rehydrates() {
    let (storage, backend, app) = signed_in(MockBackend::default()).await;
    app.chat().send_message("remember me").await.unwrap();

    // A restart restores the stored sign-in without asking again.
    let restarted = app_with(storage.clone(), backend.clone());
    let identity = restarted.restore_session().await.unwrap().unwrap();
    assert_eq!(identity.display_name, "Test User 1");
    assert_eq!(
        restarted.store().lock().await.current().unwrap().messages.len(),
        2
    );

    let intent = restarted.request_logout().await.unwrap();
    restarted.confirm_logout(intent).await.unwrap();
    assert!(restarted.identity().await.is_none());
    assert!(restarted.store().lock().await.conversations().is_empty());
    assert!(storage.get("aika_user").unwrap().is_none());

    // Conversations stay on disk for the next sign-in.
    let again = app_with(storage, backend);
    assert!(again.restore_session().await.unwrap().is_none());
    again
        .login(&Credentials::new("test1", "test1&1234"))
        .await
        .unwrap();
    assert_eq!(
        again.store().lock().await.current().unwrap().messages.len(),
        2
    );
}

#[tokio::test]
async fn test_declined_logout_keeps_session() {
    let (_, _, app) = signed_in(MockBackend::default()).await;

    let intent = app.request_logout().await.unwrap();
    app.decline_logout(intent).await;

    assert!(app.identity().await.is_some());
    assert!(app.store().lock().await.is_initialized());
}

#[tokio::test(start_paused = true)]
async fn test_upload_completes_after_processing_delay() {
    let (_, _, app) = signed_in(MockBackend::default()).await;

    let record = app
        .documents()
        .upload(DocumentUpload {
            file_name: "report.pdf".to_string(),
            bytes: vec![1, 2, 3],
            category: DocumentCategory::Research,
        })
        .await
        .unwrap();
    assert!(record.success);
    assert_eq!(record.processing_status, ProcessingStatus::Processing);
    assert_eq!(record.document_id.as_deref(), Some("doc-report.pdf"));
    assert_eq!(record.size, 3);

    tokio::time::sleep(Duration::from_millis(3100)).await;

    let stored = app.documents().get(&record.id).await.unwrap();
    assert_eq!(stored.processing_status, ProcessingStatus::Completed);
}

#[tokio::test]
async fn test_failed_and_unreadable_uploads_are_recorded() {
    let (_, _, app) = signed_in(MockBackend {
        fail_uploads: true,
        ..Default::default()
    })
    .await;
    let temp_dir = tempfile::TempDir::new().unwrap();
    let existing = temp_dir.path().join("notes.txt");
    std::fs::write(&existing, "hello").unwrap();
    let missing = temp_dir.path().join("missing.pdf");

    let records = app
        .documents()
        .upload_files(&[existing, missing], DocumentCategory::Other)
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| !r.success));
    assert!(records
        .iter()
        .all(|r| r.processing_status == ProcessingStatus::Failed));

    let files = app.documents().files(None).await;
    assert_eq!(files[0].name, "missing.pdf");
    assert_eq!(files[1].name, "notes.txt");
    assert_eq!(files[1].size, 5);
}

#[tokio::test]
async fn test_categories_fall_back_when_backend_offline() {
    let (_, _, app) = signed_in(MockBackend::default()).await;

    let catalog = app.refresh_categories().await;
    assert_eq!(catalog.categories().len(), 11);
    assert_eq!(catalog.categories()[0].code, "0");
}

#[tokio::test]
async fn test_categories_from_backend() {
    let mining = OnaceCategory {
        code: "B".to_string(),
        name_german: "Bergbau".to_string(),
        name_english: "Mining".to_string(),
        description: String::new(),
    };
    let (_, _, app) = signed_in(MockBackend {
        categories: Some(vec![mining.clone()]),
        ..Default::default()
    })
    .await;

    app.refresh_categories().await;
    assert_eq!(app.catalog().await.categories(), &[mining]);
}

#[test]
fn test_delete_failure_messages() {
    assert_eq!(
        delete_failure_message(&AikaError::backend(404, "missing")),
        DELETE_REJECTED_MESSAGE
    );
    assert_eq!(
        delete_failure_message(&AikaError::transport("refused")),
        DELETE_UNREACHABLE_MESSAGE
    );
}

#[tokio::test]
async fn test_padded_username_does_not_sign_in() {
    let storage = Arc::new(InMemoryKeyValueStore::new());
    let app = app_with(storage, Arc::new(MockBackend::default()));

    let outcome = app
        .login(&Credentials::new(" test1", "test1&1234"))
        .await
        .unwrap();
    assert_eq!(outcome, LoginOutcome::Rejected(LoginFailure::InvalidCredentials));
    assert!(app.identity().await.is_none());
}

/// Signals `entered` on each verification and waits for `release`.
struct HeldVerifier {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl IdentityVerifier for HeldVerifier {
    async fn verify(&self, _credentials: &Credentials) -> Result<Option<Identity>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(Some(Identity::new("test1", "Test User 1")))
    }
}

fn held_app() -> (Arc<Notify>, Arc<Notify>, Arc<AikaApp>) {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let verifier = Arc::new(HeldVerifier {
        entered: entered.clone(),
        release: release.clone(),
    });
    let app = AikaApp::new(
        Arc::new(InMemoryKeyValueStore::new()),
        verifier,
        Arc::new(MockBackend::default()),
        &config(),
    )
    .unwrap();
    (entered, release, Arc::new(app))
}

#[tokio::test]
async fn test_login_pending_while_verifying() {
    let (entered, release, app) = held_app();
    assert!(!app.is_login_pending());

    let task = tokio::spawn({
        let app = app.clone();
        async move { app.login(&Credentials::new("test1", "test1&1234")).await }
    });
    entered.notified().await;
    assert!(app.is_login_pending());

    release.notify_one();
    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.is_authenticated());
    assert!(!app.is_login_pending());
}

#[tokio::test]
async fn test_abandoned_login_is_not_left_pending() {
    let (entered, _release, app) = held_app();

    let task = tokio::spawn({
        let app = app.clone();
        async move { app.login(&Credentials::new("test1", "test1&1234")).await }
    });
    entered.notified().await;
    assert!(app.is_login_pending());

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(!app.is_login_pending());
    assert!(app.identity().await.is_none());
}
