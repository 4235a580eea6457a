use super::models::HealthCheck;
use crate::common::state::AppState;
use crate::services::report_service::ReportConverter;
use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(healthz))
        .with_state(state.converter.clone())
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = OK, description = "Service is ready to convert", body = HealthCheck),
        (status = SERVICE_UNAVAILABLE, description = "Template workbook is missing", body = HealthCheck)
    )
)]
pub async fn healthz(
    State(converter): State<Arc<ReportConverter>>,
) -> (StatusCode, Json<HealthCheck>) {
    if !converter.template_available() {
        tracing::warn!(
            "Health check failed: template not found at {}",
            converter.template_path().display()
        );
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthCheck::template_missing()),
        );
    }

    (StatusCode::OK, Json(HealthCheck::ok()))
}
