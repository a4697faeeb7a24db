//! Slash command parsing.

/// Every slash command with its usage line, as shown by `/help`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/new", "Start a new chat (reuses an empty one)"),
    ("/list", "List conversations"),
    ("/select", "/select <n|id> - switch conversation"),
    ("/delete", "/delete <n|id> - delete a conversation"),
    ("/title", "/title [text] - rename the current chat (empty resets)"),
    ("/meta", "/meta [text] - set context sent with every question"),
    ("/clear", "Clear the current chat"),
    ("/clear-all", "Delete all chats"),
    ("/sources", "Show sources of the last answer"),
    ("/export", "/export [file] - save the current chat as JSON"),
    ("/industry", "/industry [code] - show or pick the ÖNACE industry"),
    ("/categories", "Reload ÖNACE categories from the backend"),
    ("/model", "/model [name] - show or pick the model"),
    ("/temperature", "/temperature <value>"),
    ("/topk", "/topk <value>"),
    ("/settings", "Show chat settings"),
    ("/upload", "/upload [category] <file>... - add documents to the knowledge base"),
    ("/files", "/files [category] - list uploaded documents"),
    ("/file-category", "/file-category <n|id> <category>"),
    ("/forget", "/forget <n|id> - remove an upload record"),
    ("/delete-doc", "/delete-doc <n|id> - delete a document from the knowledge base"),
    ("/logout", "Sign out"),
    ("/help", "Show this help"),
    ("/quit", "Exit"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Select(String),
    Delete(String),
    Title(String),
    Meta(String),
    Clear,
    ClearAll,
    Sources,
    Export(Option<String>),
    Industry(Option<String>),
    Categories,
    Model(Option<String>),
    Temperature(String),
    TopK(String),
    Settings,
    Upload(Vec<String>),
    Files(Option<String>),
    FileCategory { file: String, category: String },
    Forget(String),
    DeleteDoc(String),
    Logout,
    Help,
    Quit,
    /// Recognized command with missing arguments; carries its usage line.
    Usage(&'static str),
    Unknown(String),
}

fn usage(name: &str) -> &'static str {
    COMMANDS
        .iter()
        .find(|(command, _)| *command == name)
        .map_or("", |(_, usage)| *usage)
}

fn optional(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Parses a line starting with `/`. Returns `None` for ordinary chat input.
pub fn parse(line: &str) -> Option<Command> {
    let line = line.trim();
    if !line.starts_with('/') {
        return None;
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let required = |build: fn(String) -> Command| {
        if rest.is_empty() {
            Command::Usage(usage(name))
        } else {
            build(rest.to_string())
        }
    };

    let command = match name {
        "/new" => Command::New,
        "/list" => Command::List,
        "/select" => required(Command::Select),
        "/delete" => required(Command::Delete),
        "/title" => Command::Title(rest.to_string()),
        "/meta" => Command::Meta(rest.to_string()),
        "/clear" => Command::Clear,
        "/clear-all" => Command::ClearAll,
        "/sources" => Command::Sources,
        "/export" => Command::Export(optional(rest)),
        "/industry" => Command::Industry(optional(rest)),
        "/categories" => Command::Categories,
        "/model" => Command::Model(optional(rest)),
        "/temperature" => required(Command::Temperature),
        "/topk" => required(Command::TopK),
        "/settings" => Command::Settings,
        "/upload" => {
            let args: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
            if args.is_empty() {
                Command::Usage(usage(name))
            } else {
                Command::Upload(args)
            }
        }
        "/files" => Command::Files(optional(rest)),
        "/file-category" => match rest.split_once(char::is_whitespace) {
            Some((file, category)) if !category.trim().is_empty() => Command::FileCategory {
                file: file.to_string(),
                category: category.trim().to_string(),
            },
            _ => Command::Usage(usage(name)),
        },
        "/forget" => required(Command::Forget),
        "/delete-doc" => required(Command::DeleteDoc),
        "/logout" => Command::Logout,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    };
    Some(command)
}

/// Resolves a `<n|id>` argument against a list of ids.
///
/// A number is a 1-based position; anything else must equal an id or be an
/// unambiguous prefix of one.
pub fn resolve_reference<'a>(reference: &str, ids: &[&'a str]) -> Option<&'a str> {
    if let Ok(position) = reference.parse::<usize>() {
        return position.checked_sub(1).and_then(|i| ids.get(i)).copied();
    }
    if let Some(exact) = ids.iter().find(|id| **id == reference) {
        return Some(*exact);
    }
    let mut matches = ids.iter().filter(|id| id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse("What is VSME?"), None);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse("/select 2"), Some(Command::Select("2".to_string())));
        assert_eq!(
            parse("/meta  Company with 40 employees "),
            Some(Command::Meta("Company with 40 employees".to_string()))
        );
        assert_eq!(parse("/title"), Some(Command::Title(String::new())));
        assert_eq!(parse("/model"), Some(Command::Model(None)));
        assert_eq!(
            parse("/upload research a.pdf b.pdf"),
            Some(Command::Upload(vec![
                "research".to_string(),
                "a.pdf".to_string(),
                "b.pdf".to_string()
            ]))
        );
        assert_eq!(
            parse("/file-category 1 technical"),
            Some(Command::FileCategory {
                file: "1".to_string(),
                category: "technical".to_string()
            })
        );
    }

    #[test]
    fn test_missing_arguments_yield_usage() {
        assert_eq!(
            parse("/select"),
            Some(Command::Usage("/select <n|id> - switch conversation"))
        );
        assert!(matches!(parse("/upload"), Some(Command::Usage(_))));
        assert!(matches!(parse("/file-category 1"), Some(Command::Usage(_))));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse("/frobnicate"), Some(Command::Unknown("/frobnicate".to_string())));
    }

    #[test]
    fn test_resolve_reference() {
        let ids = ["3f2a-1", "3f2b-2", "9c00-3"];
        assert_eq!(resolve_reference("2", &ids), Some("3f2b-2"));
        assert_eq!(resolve_reference("0", &ids), None);
        assert_eq!(resolve_reference("9c", &ids), Some("9c00-3"));
        assert_eq!(resolve_reference("3f2", &ids), None);
        assert_eq!(resolve_reference("3f2a-1", &ids), Some("3f2a-1"));
    }
}
