use anyhow::Context;

use realty_ledger::LedgerConfig;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    realty_observability::init();

    let config = LedgerConfig::from_env().context("invalid ledger configuration")?;

    let addr = std::env::var("REALTY_API_ADDR").unwrap_or_else(|_| {
        tracing::warn!("REALTY_API_ADDR not set; defaulting to {DEFAULT_ADDR}");
        DEFAULT_ADDR.to_string()
    });

    let app = realty_api::app::build_app(&config)
        .await
        .with_context(|| format!("cannot reach ledger at {}", config.endpoint))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
