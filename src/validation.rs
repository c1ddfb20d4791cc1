use thiserror::Error;

use crate::models::BalanceQuery;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Wallet address required.")]
    MissingWallet,
    #[error("API key is missing. Please enter a valid API key.")]
    MissingApiKey,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// Syntactic check only: both fields present and not blank once trimmed.
// The wallet is checked first, no address-format verification is done.
pub fn validate(wallet: Option<&str>, api_key: Option<&str>) -> Result<BalanceQuery, ValidationError> {
    let wallet = non_blank(wallet).ok_or(ValidationError::MissingWallet)?;
    let api_key = non_blank(api_key).ok_or(ValidationError::MissingApiKey)?;

    Ok(BalanceQuery {
        wallet: wallet.to_string(),
        api_key: api_key.to_string(),
    })
}
