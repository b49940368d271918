//! Local dashboard: JSON API over the view controller and a plain HTML table

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::controller::{
    InventoryController, Mutation, MutationKind, MutationReport, RefreshOutcome,
};
use crate::inventory::SelectedItem;
use crate::InventoryError;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub controller: Arc<InventoryController>,
    pub rundown_delay: Duration,
}

/// Build the dashboard axum router
pub fn build_router(controller: Arc<InventoryController>, rundown_delay: Duration) -> Router {
    let dashboard_state = DashboardState {
        controller,
        rundown_delay,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/inventory", get(inventory_handler))
        .route("/api/groups", get(groups_handler))
        .route("/api/state", get(state_handler))
        .route("/api/filter", post(filter_handler))
        .route("/api/select", post(select_handler))
        .route("/api/refresh", post(refresh_handler))
        .route("/api/rundown", post(rundown_handler))
        .route("/api/order", post(order_handler))
        .route("/api/shipment", post(shipment_handler))
        .route("/api/name", post(name_handler))
        .route("/api/clear", post(clear_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.controller.snapshot().await;
    let grouped = dashboard.controller.group_field().is_some();

    let rows: String = state
        .displayed()
        .iter()
        .map(|r| {
            let group_cell = if grouped {
                format!(
                    "<td>{}</td>",
                    escape_html(r.group_key.as_deref().unwrap_or(""))
                )
            } else {
                String::new()
            };
            format!(
                r#"<tr>{}<td>{}</td><td style="text-align: right;">{}</td></tr>"#,
                group_cell,
                escape_html(&r.item_type),
                r.quantity
            )
        })
        .collect();

    let group_header = match dashboard.controller.group_field() {
        Some(field) => format!("<th>{}</th>", field.field_name()),
        None => String::new(),
    };
    let heading = if state.name.is_empty() {
        "Inventory".to_string()
    } else {
        format!("{} Inventory", escape_html(&state.name))
    };
    let filter = state
        .filter
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "All".to_string());

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{heading}</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <h1>{heading}</h1>
    <p>Showing: {filter}</p>
    <table style="width: 100%; border-collapse: collapse;">
        <thead><tr>{group_header}<th>Item</th><th style="text-align: right;">Quantity</th></tr></thead>
        <tbody>{rows}</tbody>
    </table>
</body>
</html>"#
    );

    Html(html)
}

async fn inventory_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.controller.displayed().await)
}

async fn groups_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.controller.group_values().await)
}

async fn state_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.controller.snapshot().await)
}

#[derive(Debug, Deserialize)]
struct FilterRequest {
    #[serde(default)]
    group: Option<String>,
}

async fn filter_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<FilterRequest>,
) -> impl IntoResponse {
    dashboard.controller.set_filter(request.group).await;
    Json(dashboard.controller.displayed().await)
}

#[derive(Debug, Deserialize)]
struct SelectRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    new: bool,
}

async fn select_handler(
    State(dashboard): State<DashboardState>,
    Json(request): Json<SelectRequest>,
) -> Response {
    let controller = &dashboard.controller;
    if request.new {
        return Json(Some(controller.select_new_item().await)).into_response();
    }
    match request.id {
        Some(id) => match controller.select_record(&id).await {
            Ok(item) => Json(Some(item)).into_response(),
            Err(e) => error_response(&e),
        },
        None => {
            controller.select_item(None).await;
            Json(None::<()>).into_response()
        }
    }
}

async fn refresh_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.controller.refresh_inventory().await)
}

#[derive(Debug, Serialize)]
struct RundownResponse {
    rundown_error: Option<String>,
    refresh: RefreshOutcome,
}

async fn rundown_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let rundown_error = dashboard
        .controller
        .request_rundown()
        .await
        .err()
        .map(|e| e.to_string());
    tokio::time::sleep(dashboard.rundown_delay).await;
    let refresh = dashboard.controller.refresh_inventory().await;
    Json(RundownResponse {
        rundown_error,
        refresh,
    })
}

#[derive(Debug, Default, Deserialize)]
struct StageRequest {
    #[serde(default)]
    item_type: Option<String>,
    #[serde(default)]
    quantity: Option<String>,
}

async fn order_handler(
    State(dashboard): State<DashboardState>,
    body: Bytes,
) -> Response {
    staged_mutation(&dashboard, Mutation::Order, &body).await
}

async fn shipment_handler(
    State(dashboard): State<DashboardState>,
    body: Bytes,
) -> Response {
    staged_mutation(&dashboard, Mutation::Shipment, &body).await
}

/// Apply edits to the current selection, then submit it. An empty body submits it as is.
async fn staged_mutation(
    dashboard: &DashboardState,
    submit_as: fn(SelectedItem) -> Mutation,
    body: &[u8],
) -> Response {
    let request: StageRequest = if body.is_empty() {
        StageRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(e) => return error_response(&InventoryError::InvalidSelection(e.to_string())),
        }
    };
    let item = match dashboard
        .controller
        .edit_selection(request.item_type, request.quantity.as_deref())
        .await
    {
        Ok(item) => item,
        Err(e) => return error_response(&e),
    };

    report_response(dashboard.controller.submit_mutation(submit_as(item)).await)
}

async fn name_handler(State(dashboard): State<DashboardState>, body: String) -> Response {
    report_response(
        dashboard
            .controller
            .submit_mutation(Mutation::SetName(body))
            .await,
    )
}

async fn clear_handler(State(dashboard): State<DashboardState>) -> Response {
    report_response(dashboard.controller.submit_mutation(Mutation::Clear).await)
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

#[derive(Debug, Serialize)]
struct MutationResponse {
    kind: MutationKind,
    success: bool,
    message: String,
    refresh: RefreshOutcome,
}

fn report_response(report: MutationReport) -> Response {
    let (status, success, message) = match report.result {
        Ok(body) => (StatusCode::OK, true, body),
        Err(e) => (error_status(&e), false, e.to_string()),
    };
    (
        status,
        Json(MutationResponse {
            kind: report.kind,
            success,
            message,
            refresh: report.refresh,
        }),
    )
        .into_response()
}

fn error_status(error: &InventoryError) -> StatusCode {
    match error {
        InventoryError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
        InventoryError::Transport(_) | InventoryError::Parse(_) | InventoryError::Record(_) => {
            StatusCode::BAD_GATEWAY
        }
        InventoryError::Config(_) | InventoryError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &InventoryError) -> Response {
    (
        error_status(error),
        Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}
