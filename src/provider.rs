use reqwest::Url;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Number, Value, json};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::metrics::PROVIDER_LATENCY;
use crate::models::{BalanceQuery, RpcRequest};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const TOKEN_ACCOUNTS_ID: u64 = 1;
const BALANCE_ID: u64 = 2;

// Shape of a provider reply after the parse step. Nothing past this point
// looks at optional JSON fields directly.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Success(Value),
    MissingField(&'static str),
    Malformed(String),
    RpcError { code: i64, message: String },
}

impl RpcReply {
    pub fn parse(body: &[u8]) -> Self {
        let mut reply: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => return RpcReply::Malformed(format!("invalid JSON: {}", e)),
        };
        if !reply.is_object() {
            return RpcReply::Malformed("reply is not a JSON object".to_string());
        }

        if let Some(error) = reply.get("error").filter(|e| !e.is_null()) {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = match error.get("message").and_then(Value::as_str) {
                Some(m) => m.to_string(),
                None => error.to_string(),
            };
            return RpcReply::RpcError { code, message };
        }

        let Some(result) = reply.get_mut("result").filter(|r| !r.is_null()) else {
            return RpcReply::MissingField("result");
        };
        match result.get_mut("value") {
            None => RpcReply::MissingField("result.value"),
            Some(Value::Null) => RpcReply::MissingField("result.value"),
            Some(value) => RpcReply::Success(value.take()),
        }
    }

    pub fn into_value(self) -> Result<Value, AppError> {
        match self {
            RpcReply::Success(value) => Ok(value),
            RpcReply::MissingField(path) => {
                Err(AppError::ProviderFormat(format!("missing `{}`", path)))
            }
            RpcReply::Malformed(reason) => Err(AppError::ProviderFormat(reason)),
            RpcReply::RpcError { code, message } => Err(AppError::ProviderRpc { code, message }),
        }
    }
}

fn number_to_decimal(n: &Number) -> Result<Decimal, AppError> {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| AppError::ProviderFormat(format!("token amount {} out of range: {}", text, e)))
}

// Amount held in the first token account of a `getTokenAccountsByOwner`
// reply. No account means a zero balance.
pub fn token_amount(value: &Value) -> Result<Decimal, AppError> {
    let accounts = value
        .as_array()
        .ok_or_else(|| AppError::ProviderFormat("`result.value` is not a list".to_string()))?;

    let Some(first) = accounts.first() else {
        return Ok(Decimal::ZERO);
    };

    let amount = first
        .pointer("/account/data/parsed/info/tokenAmount")
        .ok_or_else(|| AppError::ProviderFormat("token account without `tokenAmount`".to_string()))?;

    if let Some(text) = amount.get("uiAmountString").and_then(Value::as_str) {
        return Decimal::from_str(text)
            .map_err(|e| AppError::ProviderFormat(format!("bad uiAmountString {:?}: {}", text, e)));
    }

    match amount.get("uiAmount") {
        Some(Value::Number(n)) => number_to_decimal(n),
        Some(Value::Null) => Ok(Decimal::ZERO),
        _ => Err(AppError::ProviderFormat("token account without `uiAmount`".to_string())),
    }
}

// lamports -> SOL, rounded half away from zero to exactly 3 places
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    let mut sol = (Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL))
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero);
    sol.rescale(3);
    sol
}

pub fn sol_amount(value: &Value) -> Result<Decimal, AppError> {
    value
        .as_u64()
        .map(lamports_to_sol)
        .ok_or_else(|| AppError::ProviderFormat(format!("lamport balance is not an integer: {}", value)))
}

// Talks to the Solana JSON-RPC provider. One shared connection pool, every
// call bounded by the client timeout.
#[derive(Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    rpc_url: Url,
}

impl ProviderClient {
    pub fn new(rpc_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, rpc_url })
    }

    fn endpoint(&self, api_key: &str) -> Url {
        let mut url = self.rpc_url.clone();
        url.query_pairs_mut().append_pair("api-key", api_key);
        url
    }

    async fn call(&self, api_key: &str, request: &RpcRequest<'_>) -> Result<Value, AppError> {
        let start = Instant::now();

        let result = self
            .client
            .post(self.endpoint(api_key))
            .json(request)
            .send()
            .await;

        let response = match result {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!(method = request.method, error = %e, "provider call failed");
                return Err(e.into());
            }
        };
        let status = response.status();
        let body = response.bytes().await?;
        PROVIDER_LATENCY.observe(start.elapsed().as_secs_f64());

        let reply = RpcReply::parse(&body);
        if !matches!(reply, RpcReply::Success(_)) {
            tracing::warn!(method = request.method, %status, reply = ?reply, "unusable provider reply");
        }
        reply.into_value()
    }

    pub async fn token_balance(&self, query: &BalanceQuery, mint: &str) -> Result<Decimal, AppError> {
        let request = RpcRequest::new(
            TOKEN_ACCOUNTS_ID,
            "getTokenAccountsByOwner",
            json!([query.wallet, { "mint": mint }, { "encoding": "jsonParsed" }]),
        );
        let value = self.call(&query.api_key, &request).await?;
        token_amount(&value)
    }

    pub async fn sol_balance(&self, query: &BalanceQuery) -> Result<Decimal, AppError> {
        let request = RpcRequest::new(BALANCE_ID, "getBalance", json!([query.wallet]));
        let value = self.call(&query.api_key, &request).await?;
        sol_amount(&value)
    }
}
