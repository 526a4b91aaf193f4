use anyhow::Context;

use campus_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    campus_observability::init();

    let config = AppConfig::from_env().context("loading configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let lifecycle = campus_api::app::services::build_lifecycle(&config)
        .context("initializing token store")?;
    let verifier = campus_api::app::services::build_credential_verifier(&config)?;
    let app = campus_api::app::build_app(lifecycle, verifier);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
