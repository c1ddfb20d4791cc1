use sha2::{Digest, Sha256};
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::ServerError;

// Installs the global subscriber. `RUST_LOG` wins over the `info` default.
pub fn init_logging(json: bool) -> Result<(), ServerError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if json {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .try_init()
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| ServerError::Logging(e.to_string()))
}

// Short stable tag for an API key so logs can correlate callers without
// ever holding the key itself
pub fn key_fingerprint(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = key_fingerprint("secret-key");
        assert_eq!(a.len(), 12);
        assert_eq!(a, key_fingerprint("secret-key"));
        assert_ne!(a, key_fingerprint("secret-kez"));
        assert!(!a.contains("secret"));
    }
}
