use tracing::debug;

use super::{App, AppAction, AppCommand};
use crate::core::catalog::{CatalogRequest, ModelCatalog};

pub(super) fn handle_picker_action(app: &mut App, action: AppAction) -> Option<AppCommand> {
    match action {
        AppAction::OpenModelPicker => open_model_picker(app),
        AppAction::CloseModelPicker => {
            app.ui.model_picker_open = false;
            None
        }
        AppAction::ModelCatalogLoaded { epoch, listing } => {
            if epoch != app.session.catalog_epoch || listing.provider != app.session.provider {
                debug!(epoch, "Discarding stale model catalog");
                return None;
            }
            app.ui.catalog = listing;
            app.ui.catalog_loading = false;
            None
        }
        _ => unreachable!("non-picker action routed to picker handler"),
    }
}

/// The curated list shows at once; a fetch is only requested with a key.
fn open_model_picker(app: &mut App) -> Option<AppCommand> {
    let provider = app.session.provider;
    app.ui.model_picker_open = true;
    if app.ui.catalog.provider != provider {
        app.ui.catalog = ModelCatalog::curated(provider);
    }

    if !app.session.has_key() {
        return None;
    }

    let epoch = app.session.next_catalog_epoch();
    app.ui.catalog_loading = true;
    Some(AppCommand::LoadModelCatalog(CatalogRequest {
        provider,
        api_key: app.session.api_key.clone(),
        epoch,
    }))
}
