use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::error::AppError;
use crate::metrics::{RATE_LIMITED, RATE_WINDOWS, REQUEST_TOTAL};
use crate::rate_limit::EndpointCategory;
use crate::state::AppState;

// Address the rate limiter keys on. Only the IP counts, the peer port
// changes per connection. A forwarded hop that is not an IP falls back to
// the peer so junk header values never mint new limiter keys.
pub fn client_address(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(first_hop) = forwarded {
            return first_hop.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// Gate in front of each balance route, runs before the body is read
pub async fn rate_limit(
    State((state, category)): State<(Arc<AppState>, EndpointCategory)>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_address(&request, state.trust_forwarded_for);
    let decision = state.rate_limiter.check(&client, category);
    RATE_WINDOWS.set(state.rate_limiter.len() as f64);

    if !decision.allowed {
        RATE_LIMITED.with_label_values(&[category.as_str()]).inc();
        REQUEST_TOTAL
            .with_label_values(&[category.as_str(), "rate_limited"])
            .inc();
        tracing::warn!(%client, %category, retry_after = ?decision.retry_after, "rate limit exceeded");
        return AppError::RateLimited {
            retry_after: decision.retry_after,
        }
        .into_response();
    }

    tracing::debug!(%client, %category, remaining = decision.remaining, "rate limit passed");
    next.run(request).await
}
