use rust_decimal::Decimal;
use std::sync::Arc;

use crate::provider::ProviderClient;
use crate::rate_limit::RateLimiter;

// app's shared state
pub struct AppState {
    pub provider: ProviderClient,
    pub rate_limiter: Arc<RateLimiter>, // shared with the window sweeper
    pub token_mint: String,
    pub min_token_balance: Decimal,
    pub trust_forwarded_for: bool,
}
