use axum::{Json, extract::State};
use kitchen_printer::{PrintAck, PrintError, PrinterInfo};

use crate::core::{Result, ServerError, ServerState};
use crate::services::PrintSettings;

/// GET /api/settings
pub async fn get(State(state): State<ServerState>) -> Json<PrintSettings> {
    Json(state.settings.get())
}

/// PUT /api/settings
pub async fn update(
    State(state): State<ServerState>,
    Json(mut settings): Json<PrintSettings>,
) -> Result<Json<PrintSettings>> {
    settings.restaurant_name = settings.restaurant_name.trim().to_string();
    if settings.restaurant_name.is_empty() {
        return Err(ServerError::Validation(
            "restaurantName must not be empty".into(),
        ));
    }
    settings.selected_printer = settings
        .selected_printer
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    state.settings.update(settings.clone())?;
    tracing::info!(
        printer = ?settings.selected_printer,
        auto_print = settings.auto_print,
        "Print settings updated"
    );
    Ok(Json(settings))
}

/// GET /api/printers
pub async fn printers(State(state): State<ServerState>) -> Result<Json<Vec<PrinterInfo>>> {
    let printers = state
        .transport
        .list_printers()
        .await
        .map_err(|e| ServerError::Unavailable(e.to_string()))?;
    Ok(Json(printers))
}

/// POST /api/printers/test
///
/// Test page on the selected printer, headed with the configured restaurant name.
pub async fn print_test(State(state): State<ServerState>) -> Result<Json<PrintAck>> {
    let settings = state.settings.get();
    let printer = settings
        .selected_printer
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServerError::Validation(PrintError::NoPrinterSelected.to_string()))?;

    let ack = state
        .transport
        .print_test(&printer, &settings.restaurant_name)
        .await
        .map_err(|e| {
            tracing::warn!(printer = %printer, error = %e, "Test print failed");
            ServerError::Unavailable(e.to_string())
        })?;
    Ok(Json(ack))
}
