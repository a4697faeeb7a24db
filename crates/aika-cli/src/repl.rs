//! Interactive session: sign-in prompt, then the chat loop.

use std::path::PathBuf;
use std::sync::Arc;

use aika_application::{AikaApp, delete_failure_message};
use aika_core::catalog::Language;
use aika_core::config::AVAILABLE_MODELS;
use aika_core::confirmation::Intent;
use aika_core::conversation::{ConversationStore, MessageRole};
use aika_core::document::{DocumentCategory, UploadedFile};
use aika_core::identity::{Credentials, Identity, LoginOutcome};
use aika_infrastructure::AikaPaths;
use aika_infrastructure::storage::write_atomic;
use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::commands::{self, COMMANDS, Command};
use crate::helper::CliHelper;
use crate::view;

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Logout,
    Quit,
}

pub struct Repl {
    app: Arc<AikaApp>,
    editor: Editor<CliHelper, DefaultHistory>,
    paths: AikaPaths,
}

impl Repl {
    pub fn new(app: Arc<AikaApp>, paths: AikaPaths) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CliHelper::new()));
        Ok(Self { app, editor, paths })
    }

    pub async fn run(mut self) -> Result<()> {
        println!("{}", "=== AIKA ===".bright_magenta().bold());
        println!(
            "{}",
            "Ask about sustainability reporting and compliance. Type '/help' for commands."
                .bright_black()
        );
        println!();

        loop {
            let identity = match self.app.restore_session().await? {
                Some(identity) => identity,
                None => match self.login().await? {
                    Some(identity) => identity,
                    None => break,
                },
            };
            println!(
                "{}",
                format!("Welcome, {}!", identity.display_name).bright_green()
            );

            let catalog = self.app.refresh_categories().await;
            tracing::debug!(count = catalog.categories().len(), "Categories loaded");
            self.show_current().await;

            if self.chat_loop().await? == Flow::Quit {
                break;
            }
        }

        println!("{}", "Goodbye!".bright_green());
        Ok(())
    }

    /// Prompts until sign-in succeeds. `None` means the user gave up.
    async fn login(&mut self) -> Result<Option<Identity>> {
        println!("{}", "Please sign in.".bright_yellow());
        loop {
            let Some(username) = self.prompt("Username: ", true)? else {
                return Ok(None);
            };
            let Some(password) = self.prompt("Password: ", false)? else {
                return Ok(None);
            };

            println!("{}", "Signing in...".bright_black());
            let credentials = Credentials::new(username, password);
            match self.app.login(&credentials).await? {
                LoginOutcome::Authenticated(identity) => return Ok(Some(identity)),
                LoginOutcome::Rejected(failure) => println!("{}", failure.to_string().red()),
            }
        }
    }

    /// Reads one line. Ctrl-C and Ctrl-D yield `None`.
    fn prompt(&mut self, prompt: &str, remember: bool) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if remember && !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.prompt(&format!("{question} [y/N] "), false)?;
        Ok(answer.is_some_and(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes")))
    }

    async fn chat_loop(&mut self) -> Result<Flow> {
        loop {
            let line = match self.editor.readline(">> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "CTRL-D detected. Exiting...".bright_green());
                    return Ok(Flow::Quit);
                }
                Err(err) => return Err(err.into()),
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let _ = self.editor.add_history_entry(trimmed);
            if trimmed == "quit" || trimmed == "exit" {
                return Ok(Flow::Quit);
            }

            let result = match commands::parse(trimmed) {
                Some(command) => self.execute(command).await,
                None => self.send(trimmed).await.map(|()| Flow::Continue),
            };
            match result {
                Ok(Flow::Continue) => {}
                Ok(flow) => return Ok(flow),
                Err(e) => println!("{}", format!("Error: {e:#}").red()),
            }
        }
    }

    async fn send(&self, content: &str) -> Result<()> {
        println!("{}", "Thinking...".bright_black());
        let reply = self.app.chat().send_message(content).await?;
        view::print_message(&reply, content, self.app.backend().base_url());
        Ok(())
    }

    async fn show_current(&self) {
        let store = self.app.store().lock().await;
        if let Some(conversation) = store.current() {
            view::print_transcript(conversation, self.app.backend().base_url());
        }
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::New => {
                self.app.store().lock().await.start_new_chat()?;
                println!("{}", "Started a new chat.".bright_green());
            }
            Command::List => {
                let store = self.app.store().lock().await;
                view::print_conversations(store.conversations(), store.current_id());
            }
            Command::Select(reference) => {
                {
                    let mut store = self.app.store().lock().await;
                    let id = conversation_id(&store, &reference)?;
                    store.select(&id);
                }
                self.show_current().await;
            }
            Command::Delete(reference) => {
                let mut store = self.app.store().lock().await;
                let id = conversation_id(&store, &reference)?;
                store.delete(&id)?;
                println!("{}", "Conversation deleted.".bright_green());
            }
            Command::Title(title) => {
                let mut store = self.app.store().lock().await;
                let id = current_id(&store)?;
                store.update_title(&id, &title)?;
                if let Some(conversation) = store.get(&id) {
                    println!("{}", format!("Renamed to '{}'.", conversation.title).bright_green());
                }
            }
            Command::Meta(meta) => {
                let mut store = self.app.store().lock().await;
                let id = current_id(&store)?;
                store.update_meta_information(&id, &meta)?;
                println!("{}", "Context updated.".bright_green());
            }
            Command::Clear => {
                let intent = self.app.store().lock().await.request_clear_current();
                self.settle_store_intent(intent, "Conversation cleared.").await?;
            }
            Command::ClearAll => {
                let intent = self.app.store().lock().await.request_clear_all();
                self.settle_store_intent(intent, "All conversations cleared.").await?;
            }
            Command::Sources => {
                let store = self.app.store().lock().await;
                let answer = store.current().and_then(|c| {
                    c.messages
                        .iter()
                        .rev()
                        .find(|m| m.role == MessageRole::Assistant)
                });
                match answer {
                    Some(message) => view::print_sources(message, self.app.backend().base_url()),
                    None => println!("{}", "No answer yet.".bright_black()),
                }
            }
            Command::Export(target) => {
                let path = self.export(target).await?;
                println!("{}", format!("Exported to {}", path.display()).bright_green());
            }
            Command::Industry(None) => {
                let catalog = self.app.catalog().await;
                let settings = self.app.chat().settings().await;
                view::print_categories(&catalog, &settings.industry_code);
            }
            Command::Industry(Some(code)) => {
                let catalog = self.app.catalog().await;
                if !catalog.contains(&code) {
                    return Err(anyhow!("Unknown industry code '{code}'. See /industry"));
                }
                self.app.chat().set_industry_code(&code).await?;
                println!(
                    "{}",
                    format!("Industry: {}", catalog.name_of(&code, Language::English)).bright_green()
                );
            }
            Command::Categories => {
                let catalog = self.app.refresh_categories().await;
                println!(
                    "{}",
                    format!("{} categories loaded.", catalog.categories().len()).bright_green()
                );
            }
            Command::Model(None) => {
                let settings = self.app.chat().settings().await;
                for model in AVAILABLE_MODELS {
                    if *model == settings.model {
                        println!("{}", format!("{model} *").bright_green());
                    } else {
                        println!("{model}");
                    }
                }
            }
            Command::Model(Some(model)) => {
                self.app.chat().set_model(&model).await?;
                println!("{}", format!("Model: {model}").bright_green());
            }
            Command::Temperature(value) => {
                let temperature: f32 = value
                    .parse()
                    .with_context(|| format!("'{value}' is not a number"))?;
                self.app.chat().set_temperature(temperature).await?;
                println!("{}", format!("Temperature: {temperature}").bright_green());
            }
            Command::TopK(value) => {
                let top_k: u32 = value
                    .parse()
                    .with_context(|| format!("'{value}' is not a whole number"))?;
                self.app.chat().set_top_k(top_k).await?;
                println!("{}", format!("Top-K: {top_k}").bright_green());
            }
            Command::Settings => {
                let settings = self.app.chat().settings().await;
                view::print_settings(&settings, &self.app.catalog().await);
            }
            Command::Upload(args) => self.upload(args).await?,
            Command::Files(category) => {
                let category = category.as_deref().map(parse_category).transpose()?;
                view::print_files(&self.app.documents().files(category).await);
            }
            Command::FileCategory { file, category } => {
                let record = self.uploaded_file(&file).await?;
                let category = parse_category(&category)?;
                self.app.documents().set_category(&record.id, category).await?;
                println!(
                    "{}",
                    format!("{} is now {category}.", record.name).bright_green()
                );
            }
            Command::Forget(file) => {
                let record = self.uploaded_file(&file).await?;
                self.app.documents().remove_local(&record.id).await?;
                println!("{}", format!("Removed {} from the list.", record.name).bright_green());
            }
            Command::DeleteDoc(file) => self.delete_document(&file).await?,
            Command::Logout => {
                let Some(intent) = self.app.request_logout().await else {
                    return Ok(Flow::Continue);
                };
                if self.confirm(intent.prompt())? {
                    self.app.confirm_logout(intent).await?;
                    println!("{}", "Signed out.".bright_green());
                    return Ok(Flow::Logout);
                }
                self.app.decline_logout(intent).await;
            }
            Command::Help => {
                for (name, usage) in COMMANDS {
                    println!("{}  {}", format!("{name:<15}").bright_cyan(), usage.bright_black());
                }
            }
            Command::Quit => return Ok(Flow::Quit),
            Command::Usage(usage) => println!("{}", format!("Usage: {usage}").yellow()),
            Command::Unknown(name) => {
                println!(
                    "{}",
                    format!("Unknown command {name}. Type /help for the list.").bright_black()
                );
            }
        }
        Ok(Flow::Continue)
    }

    /// Asks the user and confirms or declines a conversation-store intent.
    async fn settle_store_intent(&mut self, intent: Option<Intent>, done: &str) -> Result<()> {
        let Some(intent) = intent else {
            println!("{}", "Nothing to clear.".bright_black());
            return Ok(());
        };
        if self.confirm(intent.prompt())? {
            self.app.store().lock().await.confirm(intent)?;
            println!("{}", done.bright_green());
        } else {
            self.app.store().lock().await.decline(intent);
        }
        Ok(())
    }

    async fn export(&self, target: Option<String>) -> Result<PathBuf> {
        let json = {
            let store = self.app.store().lock().await;
            let conversation = store
                .current()
                .ok_or_else(|| anyhow!("No conversation to export"))?;
            conversation.export_messages_json()?
        };
        let path = match target {
            Some(target) => PathBuf::from(target),
            None => self.paths.exports_dir().join(format!(
                "chat-export-{}.json",
                chrono::Utc::now().format("%Y%m%d-%H%M%S")
            )),
        };
        write_atomic(&path, json.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Exported conversation");
        Ok(path)
    }

    /// `/upload [category] <file>...`; the first argument is a category only
    /// when it names one and more arguments follow.
    async fn upload(&self, mut args: Vec<String>) -> Result<()> {
        let category = match args.first().map(|a| a.parse::<DocumentCategory>()) {
            Some(Ok(category)) if args.len() > 1 => {
                args.remove(0);
                category
            }
            _ => DocumentCategory::default(),
        };

        println!("{}", format!("Uploading {} file(s)...", args.len()).bright_black());
        let records = self.app.documents().upload_files(&args, category).await?;
        for record in records {
            if record.success {
                println!(
                    "{}",
                    format!("{} uploaded, processing.", record.name).bright_green()
                );
            } else {
                println!("{}", format!("{} failed to upload.", record.name).red());
            }
        }
        Ok(())
    }

    async fn delete_document(&self, file: &str) -> Result<()> {
        let record = self.uploaded_file(file).await?;
        let Some(document_id) = record.document_id.as_deref() else {
            return Err(anyhow!("{} is not in the knowledge base", record.name));
        };

        match self.app.documents().delete_from_knowledge_base(document_id).await {
            Ok(()) => {
                self.app.documents().remove_local(&record.id).await?;
                println!(
                    "{}",
                    format!("Deleted {} from the knowledge base.", record.name).bright_green()
                );
            }
            Err(e) => println!("{}", delete_failure_message(&e).red()),
        }
        Ok(())
    }

    async fn uploaded_file(&self, reference: &str) -> Result<UploadedFile> {
        let files = self.app.documents().files(None).await;
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        let id = commands::resolve_reference(reference, &ids)
            .ok_or_else(|| anyhow!("No uploaded document '{reference}'. See /files"))?;
        files
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("No uploaded document '{reference}'"))
    }
}

fn conversation_id(store: &ConversationStore, reference: &str) -> Result<String> {
    let ids: Vec<&str> = store.conversations().iter().map(|c| c.id.as_str()).collect();
    commands::resolve_reference(reference, &ids)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No conversation '{reference}'. See /list"))
}

fn current_id(store: &ConversationStore) -> Result<String> {
    store
        .current_id()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No current conversation"))
}

fn parse_category(name: &str) -> Result<DocumentCategory> {
    name.parse()
        .map_err(|_| anyhow!("Unknown category '{name}' (general, technical, business, research, other)"))
}
