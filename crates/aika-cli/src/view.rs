//! Terminal rendering of conversations, answers and upload records.

use aika_core::catalog::{CategoryCatalog, Language};
use aika_core::config::ChatSettings;
use aika_core::conversation::{Conversation, Message, MessageRole};
use aika_core::document::{ProcessingStatus, UploadedFile};
use aika_core::render::{self, Segment};
use colored::Colorize;

pub fn print_user(content: &str) {
    println!("{}", format!("> {content}").green());
}

/// Prints a message the way it appears in the chat transcript.
///
/// `question` is the user message the answer responds to; relevant links
/// are filtered against it.
pub fn print_message(message: &Message, question: &str, base_url: &str) {
    match message.role {
        MessageRole::User => print_user(&message.content),
        MessageRole::Error => println!("{}", message.content.red()),
        MessageRole::Assistant => {
            println!("{}", "[AIKA]".bright_magenta());
            println!("{}", render_content(message, base_url));
            print_expanded_queries(&message.expanded_queries);
            print_relevant_links(&message.relevant_links, question);
            if !message.sources.is_empty() {
                println!(
                    "{}",
                    format!("{} source(s), see /sources", message.sources.len()).bright_black()
                );
            }
        }
    }
}

pub fn print_transcript(conversation: &Conversation, base_url: &str) {
    println!("{}", format!("=== {} ===", conversation.title).bright_magenta().bold());
    if !conversation.meta_information.is_empty() {
        println!("{}", format!("Context: {}", conversation.meta_information).bright_black());
    }
    let mut question = "";
    for message in &conversation.messages {
        if message.role == MessageRole::User {
            question = &message.content;
        }
        print_message(message, question, base_url);
    }
}

/// Answer text with resolved document references underlined.
fn render_content(message: &Message, base_url: &str) -> String {
    render::render_references(&message.content, &message.sources, base_url)
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => text.bright_blue().to_string(),
            Segment::Reference { reference, url, .. } => {
                format!("{} <{}>", reference.cyan().underline(), url.bright_black())
            }
        })
        .collect()
}

fn print_expanded_queries(queries: &[String]) {
    if queries.is_empty() {
        return;
    }
    println!("{}", "Also searched for:".bright_black());
    for query in queries {
        println!("  {}", query.bright_black());
    }
}

fn print_relevant_links(links: &[String], question: &str) {
    let links = render::filter_relevant_links(links, question);
    if links.is_empty() {
        return;
    }
    println!("{}", "Relevant links:".yellow());
    for link in links {
        println!("  {} {}", render::link_label(link).yellow(), link.cyan().underline());
    }
}

/// Lists the sources of an answer with excerpt and download link.
pub fn print_sources(message: &Message, base_url: &str) {
    if message.sources.is_empty() {
        println!("{}", "The last answer has no sources.".bright_black());
        return;
    }
    for (i, source) in message.sources.iter().enumerate() {
        let page = source.page_number();
        let mut heading = format!("{}. {}", i + 1, source.filename().unwrap_or("Document"));
        if let Some(page) = page {
            heading.push_str(&format!(", page {page}"));
        }
        println!(
            "{} {}",
            heading.bold(),
            format!("(score {:.2})", source.score).bright_black()
        );
        println!("   {}", render::truncate_excerpt(&source.text));
        println!(
            "   {}",
            render::document_link(base_url, &source.document_id, page)
                .cyan()
                .underline()
        );
    }
}

pub fn print_conversations(conversations: &[Conversation], current_id: Option<&str>) {
    for (i, conversation) in conversations.iter().enumerate() {
        let marker = if current_id == Some(conversation.id.as_str()) {
            "*"
        } else {
            " "
        };
        let line = format!(
            "{marker} {}. {} ({} messages, {})",
            i + 1,
            conversation.title,
            conversation.messages.len(),
            conversation.last_updated.format("%Y-%m-%d %H:%M")
        );
        if marker == "*" {
            println!("{}", line.bright_green());
        } else {
            println!("{line}");
        }
    }
}

pub fn print_files(files: &[UploadedFile]) {
    if files.is_empty() {
        println!("{}", "No uploaded documents.".bright_black());
        return;
    }
    for (i, file) in files.iter().enumerate() {
        let status = match file.processing_status {
            ProcessingStatus::Completed => file.processing_status.to_string().green(),
            ProcessingStatus::Failed => file.processing_status.to_string().red(),
            _ => file.processing_status.to_string().yellow(),
        };
        println!(
            "{}. {} [{}] {} {}",
            i + 1,
            file.name.bold(),
            file.category,
            format_size(file.size),
            status
        );
    }
}

pub fn print_categories(catalog: &CategoryCatalog, selected: &str) {
    for category in catalog.categories() {
        let line = format!("{:>3}  {}", category.code, category.name(Language::English));
        if category.code == selected {
            println!("{}", format!("{line} *").bright_green());
        } else {
            println!("{line}");
        }
    }
}

pub fn print_settings(settings: &ChatSettings, catalog: &CategoryCatalog) {
    println!("model:       {}", settings.model);
    println!("temperature: {}", settings.temperature);
    println!("top_k:       {}", settings.top_k);
    println!(
        "industry:    {} ({})",
        catalog.name_of(&settings.industry_code, Language::English),
        settings.industry_code
    );
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KB {
        format!("{bytes} B")
    } else if bytes_f < KB * KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{:.1} MB", bytes_f / (KB * KB))
    }
}
