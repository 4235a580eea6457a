use flightlog_report::config::Config;
use flightlog_report::routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing/logging
    tracing_subscriber::fmt::init();

    // Load configuration and environment variables to pass to the application
    let config: Config = Config::from_env();

    tracing::info!(
        "Starting server {} ({} deployment) ...",
        config.app_name,
        config.deployment.to_uppercase()
    );

    if config.template_path.is_file() {
        tracing::info!("Using template {}", config.template_path.display());
    } else {
        tracing::warn!(
            "Template {} not found; conversions will fail until it is provided",
            config.template_path.display()
        );
    }

    let router = routes::build_router(&config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
