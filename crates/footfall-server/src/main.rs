use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use footfall_server::{config::Config, state::AppState};

/// `footfall health` — liveness probe for container HEALTHCHECK.
///
/// Calls `GET http://localhost:$FOOTFALL_PORT/healthz`.
/// Exits 0 if the server responds with HTTP 200, exits 1 otherwise.
fn run_health_check() -> ! {
    let port = std::env::var("FOOTFALL_PORT").unwrap_or_else(|_| "3000".to_string());
    let url = format!("http://localhost:{}/healthz", port);
    match ureq::get(&url).call() {
        Ok(resp) if resp.status() == 200 => std::process::exit(0),
        _ => std::process::exit(1),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(|s| s.as_str()) == Some("health") {
        run_health_check();
    }

    // Structured JSON logging. Level controlled via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("footfall=info".parse()?),
        )
        .json()
        .init();

    let cfg = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    if cfg.admin_token.is_none() {
        tracing::warn!("FOOTFALL_ADMIN_TOKEN not set; /admin routes will answer 500");
    }

    let state = Arc::new(AppState::new(cfg.clone()));

    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            state.run_visit_flush_loop().await;
        });
    }

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = footfall_server::app::build_app(Arc::clone(&state));

    info!(
        port = cfg.port,
        visits_enabled = cfg.visits_enabled(),
        "Footfall listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    tokio::time::timeout(std::time::Duration::from_secs(5), state.flush_visits())
        .await
        .ok();

    Ok(())
}
