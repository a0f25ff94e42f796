mod conversation;
mod picker;
mod selection;

use tokio::sync::mpsc;

use super::App;
use crate::core::catalog::{CatalogListing, CatalogRequest};
use crate::core::chat_client::{CompletionOutcome, CompletionRequest};
use crate::core::error::ChatError;
use crate::core::message::Attachment;
use crate::core::providers::Provider;

#[derive(Debug, Clone)]
pub enum AppAction {
    SubmitCredential {
        secret: String,
    },
    SwitchProvider {
        provider: Provider,
    },
    SelectModel {
        model: String,
    },
    SendMessage {
        text: String,
        attachments: Vec<Attachment>,
    },
    CompletionSucceeded {
        epoch: u64,
        text: String,
    },
    CompletionFailed {
        epoch: u64,
        error: ChatError,
    },
    NewChat,
    ClearChat,
    OpenCredentialEntry,
    CloseCredentialEntry,
    OpenModelPicker,
    CloseModelPicker,
    ModelCatalogLoaded {
        epoch: u64,
        listing: CatalogListing,
    },
    DismissToast,
}

impl From<CompletionOutcome> for AppAction {
    fn from(outcome: CompletionOutcome) -> Self {
        match outcome.result {
            Ok(text) => AppAction::CompletionSucceeded {
                epoch: outcome.epoch,
                text,
            },
            Err(error) => AppAction::CompletionFailed {
                epoch: outcome.epoch,
                error,
            },
        }
    }
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppAction>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppAction>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction) {
        let _ = self.tx.send(action);
    }
}

#[derive(Debug)]
pub enum AppCommand {
    SpawnCompletion(CompletionRequest),
    LoadModelCatalog(CatalogRequest),
}

pub fn apply_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SendMessage { .. }
        | AppAction::CompletionSucceeded { .. }
        | AppAction::CompletionFailed { .. }
        | AppAction::NewChat
        | AppAction::ClearChat => conversation::handle_conversation_action(app, action),

        AppAction::SubmitCredential { .. }
        | AppAction::SwitchProvider { .. }
        | AppAction::SelectModel { .. } => selection::handle_selection_action(app, action),

        AppAction::OpenModelPicker
        | AppAction::CloseModelPicker
        | AppAction::ModelCatalogLoaded { .. } => picker::handle_picker_action(app, action),

        AppAction::OpenCredentialEntry => {
            app.ui.credential_entry_open = true;
            None
        }
        AppAction::CloseCredentialEntry => {
            app.ui.credential_entry_open = false;
            None
        }
        AppAction::DismissToast => {
            app.ui.toast = None;
            None
        }
    }
}
