//! The conversation/session state machine.
//!
//! [`App`] owns provider, key, model, history and the UI flags as one unit.
//! Everything that changes them goes through [`apply_action`]; network work
//! is described by the returned [`AppCommand`] and executed by the driver,
//! whose results come back as further actions.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::auth::CredentialStore;

pub mod actions;
pub mod session;
pub mod ui_state;

pub use actions::{apply_action, AppAction, AppActionDispatcher, AppCommand};
pub use session::{SessionContext, StartupOptions};
pub use ui_state::{Toast, UiState, TOAST_DURATION};

/// Probe sent whenever a fresh conversation becomes usable.
pub const GREETING: &str = "Hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Idle,
    AwaitingReply,
}

pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    /// Load the persisted provider and its key. Without a key the credential
    /// entry opens with the greeting pending; with one, the greeting is
    /// handed out once by [`App::startup_command`].
    pub fn initialize(credentials: Arc<dyn CredentialStore>, options: StartupOptions) -> App {
        let session = SessionContext::bootstrap(credentials, &options);
        let mut ui = UiState::new(session.provider);

        if session.has_key() {
            ui.startup_greeting = true;
        } else {
            ui.request_credential();
        }

        info!(
            provider = %session.provider,
            model = %session.model,
            has_key = session.has_key(),
            "Session initialized"
        );
        App { session, ui }
    }

    pub fn startup_command(&mut self) -> Option<AppCommand> {
        if !std::mem::take(&mut self.ui.startup_greeting) {
            return None;
        }
        apply_action(
            self,
            AppAction::SendMessage {
                text: GREETING.to_string(),
                attachments: Vec::new(),
            },
        )
    }

    pub fn phase(&self) -> SessionPhase {
        if !self.session.has_key() || self.ui.credential_entry_open {
            SessionPhase::Unauthenticated
        } else if self.ui.loading {
            SessionPhase::AwaitingReply
        } else {
            SessionPhase::Idle
        }
    }

    /// Drop the toast once it has been visible long enough.
    pub fn expire_toast(&mut self, now: Instant) -> bool {
        match &self.ui.toast {
            Some(toast) if toast.is_expired(now) => {
                self.ui.toast = None;
                true
            }
            _ => false,
        }
    }

    pub fn provider_label(&self) -> &'static str {
        self.session.provider.display_name()
    }

    /// Empty the conversation and retire any in-flight request.
    pub(crate) fn reset_conversation(&mut self) {
        self.ui.messages.clear();
        self.ui.loading = false;
        self.session.cancel_in_flight();
    }
}
