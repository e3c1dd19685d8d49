//! Slash commands available on the chat screen.

pub struct CommandUsage {
    pub syntax: &'static str,
    pub description: &'static str,
}

pub const COMMAND_USAGES: &[CommandUsage] = &[
    CommandUsage {
        syntax: "/help",
        description: "Show this help",
    },
    CommandUsage {
        syntax: "/theme [light|dark]",
        description: "Set the color scheme, or toggle it when no argument is given",
    },
    CommandUsage {
        syntax: "/key <api-key>",
        description: "Store the Gemini API key",
    },
    CommandUsage {
        syntax: "/settings",
        description: "Show current settings",
    },
    CommandUsage {
        syntax: "/quit",
        description: "Leave the chat",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Theme(Option<String>),
    Key(Option<String>),
    Settings,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Command(ChatCommand),
    ProcessAsMessage(String),
}

/// Classify a line of chat input. Unknown `/words` are sent as messages.
pub fn process_input(input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts
        .next()
        .map(str::trim)
        .filter(|args| !args.is_empty())
        .map(str::to_string);

    let command = match command_name.to_ascii_lowercase().as_str() {
        "help" => ChatCommand::Help,
        "theme" => ChatCommand::Theme(args),
        "key" => ChatCommand::Key(args),
        "settings" => ChatCommand::Settings,
        "quit" | "exit" => ChatCommand::Quit,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    CommandResult::Command(command)
}

pub fn help_lines() -> Vec<String> {
    let width = COMMAND_USAGES
        .iter()
        .map(|usage| usage.syntax.len())
        .max()
        .unwrap_or(0);
    let mut lines = vec!["Commands:".to_string()];
    for usage in COMMAND_USAGES {
        lines.push(format!(
            "  {:width$}  {}",
            usage.syntax,
            usage.description,
            width = width
        ));
    }
    lines
}
