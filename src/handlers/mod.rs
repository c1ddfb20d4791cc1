mod balance;
mod health;
mod metrics;

pub use balance::{validate_sol_handler, validate_token_handler};
pub use health::health_handler;
pub use metrics::metrics_handler;
