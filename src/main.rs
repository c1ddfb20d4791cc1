mod config;
mod error;
mod handlers;
mod logging;
mod metrics;
mod middleware;
mod models;
mod provider;
mod rate_limit;
mod routes;
mod state;
mod validation;

#[cfg(test)]
mod test_support;

use clap::Parser;
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Args;
use crate::error::ServerError;
use crate::provider::ProviderClient;
use crate::rate_limit::{RateLimiter, window_sweeper};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // .env first so clap sees its values
    dotenv::dotenv().ok();
    let args = Args::parse();
    logging::init_logging(args.log_json)?;

    let rpc_url = Url::parse(&args.rpc_url).map_err(|e| ServerError::InvalidRpcUrl {
        url: args.rpc_url.clone(),
        reason: e.to_string(),
    })?;
    let provider = ProviderClient::new(rpc_url, args.rpc_timeout())?;
    let rate_limiter = Arc::new(RateLimiter::new(args.token_rate(), args.sol_rate()));

    let state = Arc::new(AppState {
        provider,
        rate_limiter: Arc::clone(&rate_limiter),
        token_mint: args.token_mint.clone(),
        min_token_balance: args.min_token_balance,
        trust_forwarded_for: args.trust_forwarded_for,
    });

    // evict closed rate windows in the background
    tokio::spawn(window_sweeper(rate_limiter, args.sweep_interval()));

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "relay listening");
    tracing::info!(rpc_url = %args.rpc_url, timeout_secs = args.rpc_timeout, "forwarding to provider");
    tracing::info!(mint = %args.token_mint, minimum = %args.min_token_balance, "token gate");
    tracing::info!(
        token = %format!("{}/{}s", args.token_rate_limit, args.token_rate_window),
        sol = %format!("{}/{}s", args.sol_rate_limit, args.sol_rate_window),
        "rate limits"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
