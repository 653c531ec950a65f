// HTTP request handlers
use crate::application::chart_service::ChartError;
use crate::domain::cursor::LookupError;
use crate::domain::sample::parse_query_time;
use crate::domain::selection::{Selection, SelectionError};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SelectionQuery {
    pub female: Option<String>,
    pub male: Option<String>,
}

impl SelectionQuery {
    fn selection(self) -> Selection {
        Selection::new(self.female, self.male)
    }
}

#[derive(Deserialize)]
pub struct TooltipQuery {
    pub t: String,
    pub female: Option<String>,
    pub male: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_status(error: &ChartError) -> StatusCode {
    match error {
        ChartError::UnknownChart(_) => StatusCode::NOT_FOUND,
        ChartError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ChartError::NoTooltip(_) => StatusCode::BAD_REQUEST,
        ChartError::Selection(SelectionError::UnknownIndividual(_)) => StatusCode::BAD_REQUEST,
        ChartError::Selection(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ChartError::Lookup(LookupError::NotFound) => StatusCode::NO_CONTENT,
    }
}

async fn send<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response {
    match json_response(status, data, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

async fn send_error(error: ChartError, compress: bool) -> Response {
    let status = error_status(&error);
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    if status.is_server_error() {
        tracing::error!("Chart request failed: {}", error);
    } else {
        tracing::debug!("Chart request rejected: {}", error);
    }
    let body = ErrorBody { error: error.to_string() };
    send(status, &body, compress).await
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all charts with their availability and selectable individuals
pub async fn list_charts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let charts = state.chart_service.list_charts();
    send(StatusCode::OK, &charts, accepts_brotli(&headers)).await
}

/// Full redraw of a chart for the requested selection
pub async fn render_chart(
    Path(id): Path<String>,
    Query(query): Query<SelectionQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    match state.chart_service.render(&id, &query.selection()) {
        Ok(view) => send(StatusCode::OK, &view, compress).await,
        Err(e) => send_error(e, compress).await,
    }
}

/// Tooltip for the sample nearest to `t`; 204 when there is nothing to show
pub async fn chart_tooltip(
    Path(id): Path<String>,
    Query(query): Query<TooltipQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let at = match parse_query_time(&query.t) {
        Ok(at) => at,
        Err(e) => {
            let body = ErrorBody { error: e.to_string() };
            return send(StatusCode::BAD_REQUEST, &body, compress).await;
        }
    };

    let selection = Selection::new(query.female, query.male);
    match state.chart_service.tooltip(&id, &selection, at) {
        Ok(tooltip) => send(StatusCode::OK, &tooltip, compress).await,
        Err(e) => send_error(e, compress).await,
    }
}
