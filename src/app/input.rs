//! Parsing of interactive prompt lines.

/// How the user identified a format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection {
    /// Zero-based position in the listed options.
    Index(usize),
    /// Display label or bare format id.
    Label(String),
}

/// A downloader prompt command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FormatCommand {
    /// Optionally set the URL, then discover formats.
    Fetch(Option<String>),
    List,
    Select(Selection),
    Download,
    Status,
    Help,
    Quit,
}

/// A chat prompt command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChatCommand {
    Send(String),
    Help,
    Quit,
}

pub(crate) const FORMAT_HELP: &str = "\
Commands:
  <url>                  fetch formats for a video page
  fetch [url]            fetch formats (for the current URL if none given)
  list                   show the available formats
  select <n|label|id>    choose a format (numbers pick from the list)
  download               download the selected format
  status                 show the current state
  quit                   exit";

pub(crate) const CHAT_HELP: &str = "\
Type a message and press enter to send it.
  /help                  show this help
  /quit                  exit";

/// Parses one downloader prompt line. Blank lines yield `Ok(None)`.
pub(crate) fn parse_format_command(line: &str) -> Result<Option<FormatCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if looks_like_url(line) {
        return Ok(Some(FormatCommand::Fetch(Some(line.to_string()))));
    }

    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()));
    let command = match word.to_ascii_lowercase().as_str() {
        "fetch" | "f" => FormatCommand::Fetch((!rest.is_empty()).then(|| rest.to_string())),
        "list" | "ls" => FormatCommand::List,
        "select" | "s" => {
            if rest.is_empty() {
                return Err("usage: select <n|label|id>".to_string());
            }
            FormatCommand::Select(parse_selection(rest))
        }
        "download" | "get" | "d" => FormatCommand::Download,
        "status" => FormatCommand::Status,
        "help" | "?" => FormatCommand::Help,
        "quit" | "exit" | "q" => FormatCommand::Quit,
        other => return Err(format!("unknown command `{other}`; type `help`")),
    };
    Ok(Some(command))
}

fn parse_selection(choice: &str) -> Selection {
    match choice.parse::<usize>() {
        Ok(position) if position >= 1 => Selection::Index(position - 1),
        _ => Selection::Label(choice.to_string()),
    }
}

fn looks_like_url(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Parses one chat prompt line.
///
/// Blank lines are passed through as messages so the orchestrator can
/// reject them.
pub(crate) fn parse_chat_command(line: &str) -> ChatCommand {
    match line.trim() {
        "/quit" | "/exit" => ChatCommand::Quit,
        "/help" => ChatCommand::Help,
        _ => ChatCommand::Send(line.to_string()),
    }
}
