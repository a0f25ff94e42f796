use tracing::{debug, info, warn};

use super::{App, AppAction, AppCommand};
use crate::core::app::GREETING;
use crate::core::chat_client::CompletionRequest;
use crate::core::error::ChatError;
use crate::core::message::{Attachment, Message};

pub(super) fn handle_conversation_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SendMessage { text, attachments } => send_message(app, text, attachments),
        AppAction::CompletionSucceeded { epoch, text } => {
            complete_request(app, epoch, Ok(text));
            None
        }
        AppAction::CompletionFailed { epoch, error } => {
            complete_request(app, epoch, Err(error));
            None
        }
        AppAction::NewChat => {
            app.reset_conversation();
            info!("New chat");
            send_greeting_if_keyed(app)
        }
        AppAction::ClearChat => {
            app.reset_conversation();
            info!("Chat cleared");
            None
        }
        _ => unreachable!("non-conversation action routed to conversation handler"),
    }
}

pub(super) fn send_message(
    app: &mut App,
    text: String,
    attachments: Vec<Attachment>,
) -> Option<AppCommand> {
    if !app.session.has_key() {
        debug!("Send blocked: no API key");
        app.ui.credential_entry_open = true;
        return None;
    }
    if app.ui.loading {
        warn!("Send rejected: a reply is still pending");
        return None;
    }
    if text.trim().is_empty() && attachments.is_empty() {
        return None;
    }

    app.ui.messages.push(Message::user(text, attachments));
    app.ui.loading = true;
    let (cancel_token, epoch) = app.session.start_request();
    debug!(
        epoch,
        model = %app.session.model,
        turns = app.ui.messages.len(),
        "Spawning completion"
    );

    Some(AppCommand::SpawnCompletion(CompletionRequest {
        provider: app.session.provider,
        api_key: app.session.api_key.clone(),
        model: app.session.model.clone(),
        history: app.ui.messages.clone(),
        epoch,
        cancel_token,
    }))
}

/// Send the greeting now. This consumes any pending greeting, so a later
/// credential submission does not greet a second time.
pub(super) fn send_greeting(app: &mut App) -> Option<AppCommand> {
    app.ui.pending_greeting = false;
    send_message(app, GREETING.to_string(), Vec::new())
}

/// Greet when a key is available, otherwise ask for one and greet later.
pub(super) fn send_greeting_or_request_key(app: &mut App) -> Option<AppCommand> {
    if app.session.has_key() {
        send_greeting(app)
    } else {
        app.ui.request_credential();
        None
    }
}

fn send_greeting_if_keyed(app: &mut App) -> Option<AppCommand> {
    if app.session.has_key() {
        send_greeting(app)
    } else {
        None
    }
}

fn complete_request(app: &mut App, epoch: u64, result: Result<String, ChatError>) {
    if !app.session.is_current(epoch) {
        debug!(
            epoch,
            current = app.session.epoch,
            "Discarding reply from a previous conversation"
        );
        return;
    }

    match result {
        Ok(text) => app.ui.messages.push(Message::assistant(text)),
        Err(error) => {
            warn!(error = %error, "Completion failed");
            if error.reopens_credential_entry() {
                app.ui.credential_entry_open = true;
            }
            app.ui.messages.push(Message::assistant(error.user_message()));
        }
    }
    app.ui.loading = false;
    app.session.finish_request();
}
