use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

// Inbound body for both endpoints. Fields stay optional so a missing
// wallet/apiKey is reported as a 400 by the validator, not by serde.
#[derive(Deserialize, Debug, Default)]
pub struct BalanceRequest {
    pub wallet: Option<String>,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

// Validated request, lives for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub wallet: String,
    pub api_key: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceResponse {
    pub success: bool,
    #[serde(serialize_with = "whole_or_float")]
    pub token_balance: Decimal,
}

// 800000 stays `800000` on the wire, fractional amounts go out as floats
fn whole_or_float<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    match value.fract().is_zero().then(|| value.to_i64()).flatten() {
        Some(whole) => serializer.serialize_i64(whole),
        None => rust_decimal::serde::float::serialize(value, serializer),
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SolBalanceResponse {
    pub success: bool,
    // always three fractional digits, e.g. "1.500"
    #[serde(with = "rust_decimal::serde::str")]
    pub sol_balance: Decimal,
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub category: &'static str,
    pub error: String,
}

// Outbound JSON-RPC envelope
#[derive(Serialize, Debug)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}
