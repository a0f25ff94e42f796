mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use std::path::Path;

use crate::auth::validate_api_key;
use crate::cli::chat::ChatSession;
use crate::core::app::AppAction;
use crate::core::message::Attachment;
use crate::core::providers::Provider;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Action(AppAction),
    Quit,
}

/// Route one line of input. While credential entry is open, a line that is
/// not a command is taken as the API key.
pub fn process_input(session: &mut ChatSession, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix('/') {
        let mut parts = rest.splitn(2, ' ');
        let command_name = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim();

        if let Some(command) = registry::find_command(command_name) {
            let invocation = CommandInvocation {
                input: trimmed,
                args,
            };
            return (command.handler)(session, invocation);
        }
    }

    if session.app.ui.credential_entry_open {
        return match validate_api_key(trimmed) {
            Ok(secret) => CommandResult::Action(AppAction::SubmitCredential { secret }),
            Err(err) => {
                session.set_status(format!("❌ {err}"));
                CommandResult::Continue
            }
        };
    }

    CommandResult::ProcessAsMessage(trimmed.to_string())
}

pub(super) fn handle_help(session: &mut ChatSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let commands = match invocation.arg() {
        Some(prefix) => matching_commands(prefix.trim_start_matches('/')),
        None => all_commands().iter().collect(),
    };
    if commands.is_empty() {
        session.set_status(format!("No commands match '{}'", invocation.args));
        return CommandResult::Continue;
    }

    let width = commands
        .iter()
        .map(|command| command.usage.len())
        .max()
        .unwrap_or(0);
    let mut help = String::from("Commands:");
    for command in commands {
        help.push_str(&format!("\n  {:width$}  {}", command.usage, command.help));
    }
    help.push_str("\nAnything else is sent as a message, with pending attachments.");
    session.set_status(help);
    CommandResult::Continue
}

pub(super) fn handle_provider(session: &mut ChatSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let provider = match invocation.arg() {
        None => session.app.session.provider.other(),
        Some(id) => match id.parse::<Provider>() {
            Ok(provider) => provider,
            Err(err) => {
                session.set_status(format!("❌ {err}"));
                return CommandResult::Continue;
            }
        },
    };

    if provider == session.app.session.provider {
        session.set_status(format!("Already using {}", provider.display_name()));
        return CommandResult::Continue;
    }
    CommandResult::Action(AppAction::SwitchProvider { provider })
}

pub(super) fn handle_model(session: &mut ChatSession, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.arg() {
        Some(model) => {
            if !session.app.ui.catalog.contains(model) {
                session.set_status(format!(
                    "ℹ️  {model} is not in the {} list; trying it anyway",
                    session.app.provider_label()
                ));
            }
            CommandResult::Action(AppAction::SelectModel {
                model: model.to_string(),
            })
        }
        None => {
            session.set_status(format!(
                "Current model: {} ({}). Use /models to browse.",
                session.app.session.model,
                session.app.provider_label()
            ));
            CommandResult::Continue
        }
    }
}

pub(super) fn handle_models(session: &mut ChatSession, invocation: CommandInvocation<'_>) -> CommandResult {
    session.model_filter = invocation.arg().map(str::to_string);
    CommandResult::Action(AppAction::OpenModelPicker)
}

pub(super) fn handle_new(_session: &mut ChatSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Action(AppAction::NewChat)
}

pub(super) fn handle_clear(_session: &mut ChatSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Action(AppAction::ClearChat)
}

pub(super) fn handle_key(_session: &mut ChatSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Action(AppAction::OpenCredentialEntry)
}

pub(super) fn handle_attach(session: &mut ChatSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(path) = invocation.arg() else {
        session.set_status("Usage: /attach <path>");
        return CommandResult::Continue;
    };

    match Attachment::from_path(Path::new(path)) {
        Ok(attachment) => {
            session.set_status(format!("📎 Attached {}", attachment.label()));
            session.attachments.push(attachment);
        }
        Err(err) => session.set_status(format!("❌ {err}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_detach(session: &mut ChatSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    let dropped = session.attachments.len();
    session.attachments.clear();
    session.set_status(format!("Removed {dropped} pending attachment(s)"));
    CommandResult::Continue
}

pub(super) fn handle_log(session: &mut ChatSession, invocation: CommandInvocation<'_>) -> CommandResult {
    let result = match invocation.arg() {
        None => session.transcript.toggle(),
        Some(filename) => session.transcript.set_log_file(filename.to_string()),
    };
    match result {
        Ok(message) => session.set_status(message),
        Err(err) => session.set_status(format!("Log error: {err}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_quit(_session: &mut ChatSession, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
