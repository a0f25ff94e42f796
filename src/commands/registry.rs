use super::CommandResult;
use crate::cli::chat::ChatSession;

pub type CommandHandler = fn(&mut ChatSession, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

impl<'a> CommandInvocation<'a> {
    /// The argument string, or `None` when nothing follows the command.
    pub fn arg(&self) -> Option<&'a str> {
        Some(self.args).filter(|args| !args.is_empty())
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "provider",
        usage: "/provider [n1n|openrouter]",
        help: "Switch provider (toggles when no id is given). Clears the chat.",
        handler: super::handle_provider,
    },
    Command {
        name: "model",
        usage: "/model [id]",
        help: "Switch model, or show the current one. Clears the chat.",
        handler: super::handle_model,
    },
    Command {
        name: "models",
        usage: "/models [query]",
        help: "List models for the current provider, optionally filtered.",
        handler: super::handle_models,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new chat and greet the assistant.",
        handler: super::handle_new,
    },
    Command {
        name: "clear",
        usage: "/clear",
        help: "Clear the conversation.",
        handler: super::handle_clear,
    },
    Command {
        name: "key",
        usage: "/key",
        help: "Enter a new API key for the current provider.",
        handler: super::handle_key,
    },
    Command {
        name: "attach",
        usage: "/attach <path>",
        help: "Attach a file or image to the next message.",
        handler: super::handle_attach,
    },
    Command {
        name: "detach",
        usage: "/detach",
        help: "Drop all pending attachments.",
        handler: super::handle_detach,
    },
    Command {
        name: "log",
        usage: "/log [file]",
        help: "Toggle transcript logging or set the log file path.",
        handler: super::handle_log,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
