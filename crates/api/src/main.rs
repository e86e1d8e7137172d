use anyhow::{Context, Result};
use triage_api::{bind_address, build_app};
use triage_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("triage_api");

    let bind = bind_address();
    let app = build_app()?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(bind = %bind, "triage api started");

    axum::serve(listener, app).await?;
    Ok(())
}
