use tracing::{info, warn};

use super::conversation::{send_greeting, send_greeting_or_request_key};
use super::{App, AppAction, AppCommand};
use crate::core::catalog::ModelCatalog;
use crate::core::providers::Provider;

pub(super) fn handle_selection_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::SubmitCredential { secret } => submit_credential(app, secret),
        AppAction::SwitchProvider { provider } => switch_provider(app, provider),
        AppAction::SelectModel { model } => select_model(app, model),
        _ => unreachable!("non-selection action routed to selection handler"),
    }
}

fn submit_credential(app: &mut App, secret: String) -> Option<AppCommand> {
    let secret = secret.trim().to_string();
    if secret.is_empty() {
        return None;
    }

    let provider = app.session.provider;
    if let Err(err) = app.session.credentials.set(provider, &secret) {
        warn!(provider = %provider, error = %err, "Could not persist API key");
        app.ui
            .show_toast(format!("⚠️ Key not saved ({err}); using it for this session"));
    }
    app.session.api_key = secret;
    app.ui.credential_entry_open = false;
    info!(provider = %provider, "API key updated");

    if app.ui.pending_greeting {
        send_greeting(app)
    } else {
        None
    }
}

fn switch_provider(app: &mut App, next: Provider) -> Option<AppCommand> {
    if next == app.session.provider {
        return None;
    }

    app.session.provider = next;
    if let Err(err) = app.session.credentials.set_active_provider_preference(next) {
        warn!(provider = %next, error = %err, "Could not persist provider choice");
    }
    app.ui.model_picker_open = false;
    app.reset_conversation();
    app.session.model = next.default_model().to_string();
    app.session.api_key = app.session.stored_key(next);
    app.session.next_catalog_epoch();
    app.ui.catalog = ModelCatalog::curated(next);
    app.ui.catalog_loading = false;
    app.ui
        .show_toast(format!("🔄 Chat cleared. Provider: {}", next.display_name()));
    info!(provider = %next, model = %app.session.model, "Switched provider");

    send_greeting_or_request_key(app)
}

fn select_model(app: &mut App, model: String) -> Option<AppCommand> {
    let model = model.trim().to_string();
    if model.is_empty() {
        return None;
    }

    app.session.model = model;
    app.ui.model_picker_open = false;
    app.reset_conversation();
    info!(model = %app.session.model, "Selected model");

    send_greeting_or_request_key(app)
}
