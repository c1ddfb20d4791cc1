use clap::Parser;
use rust_decimal::Decimal;
use std::time::Duration;

use crate::rate_limit::RateLimitConfig;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "token-gate-relay")]
#[command(about = "Token gating relay in front of a Solana JSON-RPC provider")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    // Provider base url, the caller's key is appended as ?api-key=
    #[arg(long, env = "RPC_URL", default_value = "https://rpc.helius.xyz/")]
    pub rpc_url: String,

    // Mint of the gating token
    #[arg(long, env = "TOKEN_MINT", default_value = "CyFoxoQhcjJFQJtz32SaYZFUfs1xLMXoXz3nBSytGvcD")]
    pub token_mint: String,

    // Minimum token balance for /validate-token to pass
    #[arg(long, env = "MIN_TOKEN_BALANCE", default_value = "750000")]
    pub min_token_balance: Decimal,

    // Token check: max requests per window
    #[arg(long, env = "TOKEN_RATE_LIMIT", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub token_rate_limit: u32,

    // Token check: window in seconds
    #[arg(long, env = "TOKEN_RATE_WINDOW", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub token_rate_window: u64,

    // SOL check: max requests per window
    #[arg(long, env = "SOL_RATE_LIMIT", default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub sol_rate_limit: u32,

    // SOL check: window in seconds
    #[arg(long, env = "SOL_RATE_WINDOW", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub sol_rate_window: u64,

    // Timeout for one provider call, in seconds
    #[arg(long, env = "RPC_TIMEOUT", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub rpc_timeout: u64,

    // How often expired rate windows get evicted
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..=86_400))]
    pub sweep_interval: u64,

    // Key rate limits on the first X-Forwarded-For hop (only behind a proxy)
    #[arg(long, env = "TRUST_FORWARDED_FOR", default_value_t = false)]
    pub trust_forwarded_for: bool,

    // Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Args {
    pub fn token_rate(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.token_rate_limit, Duration::from_secs(self.token_rate_window))
    }

    pub fn sol_rate(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.sol_rate_limit, Duration::from_secs(self.sol_rate_window))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}
