//! Line-oriented chat driver.
//!
//! [`ChatSession`] wraps the [`App`] with what only the terminal front end
//! needs: the transcript log, attachments staged for the next message, and
//! bookkeeping for what has already been printed. [`run_chat`] owns the
//! session and multiplexes stdin, completion outcomes and background actions.

use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::cli::model_list::render_listing;
use crate::commands::{process_input, CommandResult};
use crate::core::app::{
    apply_action, App, AppAction, AppActionDispatcher, AppCommand, StartupOptions,
};
use crate::core::catalog::{CatalogListing, ModelCatalog};
use crate::core::chat_client::{ChatBackend, CompletionService};
use crate::core::message::{Attachment, Message, Role};
use crate::utils::logging::TranscriptLog;

const TOAST_TICK: Duration = Duration::from_millis(250);

pub enum LineOutcome {
    Command(Option<AppCommand>),
    Quit,
}

pub struct ChatSession {
    pub app: App,
    pub transcript: TranscriptLog,
    pub attachments: Vec<Attachment>,
    pub model_filter: Option<String>,
    notices: Vec<String>,
    rendered: usize,
    toast_shown: Option<Instant>,
    credential_prompted: bool,
    catalog_view: Option<(CatalogListing, bool)>,
}

impl ChatSession {
    pub fn new(app: App, transcript: TranscriptLog) -> Self {
        Self {
            app,
            transcript,
            attachments: Vec::new(),
            model_filter: None,
            notices: Vec::new(),
            rendered: 0,
            toast_shown: None,
            credential_prompted: false,
            catalog_view: None,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    /// Apply an action, noting when it starts a fresh conversation.
    pub fn apply(&mut self, action: AppAction) -> Option<AppCommand> {
        let resets = matches!(
            action,
            AppAction::NewChat
                | AppAction::ClearChat
                | AppAction::SwitchProvider { .. }
                | AppAction::SelectModel { .. }
        );
        let epoch_before = self.app.session.epoch;
        let command = apply_action(&mut self.app, action);

        if resets && self.app.session.epoch != epoch_before {
            self.rendered = 0;
            self.set_status("── new conversation ──");
        }
        command
    }

    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Command(None);
        }

        match process_input(self, line) {
            CommandResult::Continue => LineOutcome::Command(None),
            CommandResult::Quit => LineOutcome::Quit,
            CommandResult::Action(action) => LineOutcome::Command(self.apply(action)),
            CommandResult::ProcessAsMessage(text) => LineOutcome::Command(self.send(text)),
        }
    }

    /// Pending attachments ride along only when the message can actually go out.
    fn send(&mut self, text: String) -> Option<AppCommand> {
        if self.app.ui.loading {
            self.set_status("⏳ Still waiting for the previous reply");
            return None;
        }

        let attachments = if self.app.session.has_key() {
            std::mem::take(&mut self.attachments)
        } else {
            Vec::new()
        };
        self.apply(AppAction::SendMessage { text, attachments })
    }

    /// Everything that became visible since the last call, in print order.
    pub fn take_output(&mut self) -> Vec<String> {
        let mut output = std::mem::take(&mut self.notices);

        let start = self.rendered.min(self.app.ui.messages.len());
        for message in &self.app.ui.messages[start..] {
            if let Err(err) = self.transcript.log_message(message) {
                warn!(error = %err, "Could not write transcript");
            }
            output.push(format_message(message));
        }
        self.rendered = self.app.ui.messages.len();

        if let Some(toast) = &self.app.ui.toast {
            if self.toast_shown != Some(toast.shown_at) {
                self.toast_shown = Some(toast.shown_at);
                output.push(toast.message.clone());
            }
        }

        if self.app.ui.credential_entry_open && !self.credential_prompted {
            output.push(format!(
                "🔑 Enter an API key for {} (starts with sk-)",
                self.app.provider_label()
            ));
        }
        self.credential_prompted = self.app.ui.credential_entry_open;

        self.render_catalog(&mut output);
        output
    }

    fn render_catalog(&mut self, output: &mut Vec<String>) {
        if !self.app.ui.model_picker_open {
            self.catalog_view = None;
            return;
        }

        let view = (self.app.ui.catalog.clone(), self.app.ui.catalog_loading);
        if self.catalog_view.as_ref() == Some(&view) {
            return;
        }

        let listing = match self.model_filter.as_deref() {
            Some(query) => view.0.filter(query),
            None => view.0.clone(),
        };
        output.push(render_listing(&listing));
        if view.1 {
            output.push("Loading models…".to_string());
        } else {
            output.push("Use /model <id> to switch.".to_string());
        }
        self.catalog_view = Some(view);
    }

    pub fn prompt(&self) -> String {
        let mut prompt = format!("[{} · {}]", self.app.provider_label(), self.app.session.model);
        if !self.attachments.is_empty() {
            prompt.push_str(&format!(" 📎{}", self.attachments.len()));
        }
        prompt.push_str(" > ");
        prompt
    }
}

pub fn format_message(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    let mut text = format!("{speaker}: {}", message.content);
    for attachment in &message.attachments {
        text.push_str(&format!("\n  {}", attachment.label()));
    }
    text
}

/// Runs [`AppCommand`]s off the driver task.
pub struct CommandExecutor {
    service: CompletionService,
    backend: Arc<dyn ChatBackend>,
    dispatcher: AppActionDispatcher,
}

impl CommandExecutor {
    pub fn new(
        service: CompletionService,
        backend: Arc<dyn ChatBackend>,
        dispatcher: AppActionDispatcher,
    ) -> Self {
        Self {
            service,
            backend,
            dispatcher,
        }
    }

    pub fn execute(&self, command: AppCommand) {
        match command {
            AppCommand::SpawnCompletion(request) => {
                debug!(epoch = request.epoch, "Dispatching completion");
                self.service.spawn(request);
            }
            AppCommand::LoadModelCatalog(request) => {
                let backend = Arc::clone(&self.backend);
                let dispatcher = self.dispatcher.clone();
                tokio::spawn(async move {
                    let listing =
                        ModelCatalog::list(backend.as_ref(), request.provider, &request.api_key)
                            .await;
                    dispatcher.dispatch(AppAction::ModelCatalogLoaded {
                        epoch: request.epoch,
                        listing,
                    });
                });
            }
        }
    }
}

fn flush(session: &mut ChatSession) -> Result<(), Box<dyn Error>> {
    let output = session.take_output();
    let mut stdout = std::io::stdout().lock();
    for block in output {
        writeln!(stdout, "{block}")?;
    }
    write!(stdout, "{}", session.prompt())?;
    stdout.flush()?;
    Ok(())
}

pub async fn run_chat(
    credentials: Arc<dyn CredentialStore>,
    options: StartupOptions,
    log_file: Option<String>,
    backend: Arc<dyn ChatBackend>,
) -> Result<(), Box<dyn Error>> {
    let transcript = TranscriptLog::new(log_file)?;
    let app = App::initialize(credentials, options);
    let mut session = ChatSession::new(app, transcript);

    let (service, mut outcomes) = CompletionService::new(Arc::clone(&backend));
    let (action_tx, mut actions) = mpsc::unbounded_channel();
    let executor = CommandExecutor::new(service, backend, AppActionDispatcher::new(action_tx));

    println!("relaychat · type /help for commands, /quit to leave");
    if let Some(command) = session.app.startup_command() {
        executor.execute(command);
    }
    flush(&mut session)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TOAST_TICK);

    loop {
        let command = tokio::select! {
            line = lines.next_line() => match line? {
                None => break,
                Some(line) => match session.handle_line(&line) {
                    LineOutcome::Quit => break,
                    LineOutcome::Command(command) => command,
                },
            },
            Some(outcome) = outcomes.recv() => session.apply(outcome.into()),
            Some(action) = actions.recv() => session.apply(action),
            _ = ticker.tick() => {
                session.app.expire_toast(Instant::now());
                continue;
            }
        };

        if let Some(command) = command {
            if matches!(command, AppCommand::SpawnCompletion(_)) {
                session.set_status(format!("… waiting for {}", session.app.session.model));
            }
            executor.execute(command);
        }
        flush(&mut session)?;
    }

    session.app.session.cancel_in_flight();
    println!();
    Ok(())
}
