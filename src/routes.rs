use crate::common::state::AppState;
use crate::config::Config;
use crate::reports;
use axum::{Router, extract::DefaultBodyLimit};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

pub fn build_router(config: &Config) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        info(
            title = "Flight log report",
            description = "Converts flight log exports into the formatted report workbook"
        ),
        tags(
            (name = "reports", description = "Upload form and report conversion")
        )
    )]
    struct ApiDoc;

    let app_state: AppState = AppState::new(config.clone());

    // Build the router with OpenAPI documentation
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(&app_state)) // Health check
        .merge(reports::views::router(&app_state))
        .split_for_parts();

    router
        .merge(Scalar::with_url("/api/docs", api))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}
