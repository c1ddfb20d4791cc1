// In-process stand-in for the JSON-RPC provider used by the tests.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::post,
};
use reqwest::Url;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct StubState {
    token: Value,
    sol: Value,
    delay: Duration,
    last: Mutex<Option<Value>>,
    calls: Mutex<u32>,
}

pub struct StubRpc {
    addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubRpc {
    pub const API_KEY: &'static str = "good-key";

    pub async fn start(token: Value, sol: Value) -> Self {
        Self::spawn(token, sol, Duration::ZERO).await
    }

    pub async fn start_slow(delay: Duration) -> Self {
        Self::spawn(token_reply(json!(0)), sol_reply(0), delay).await
    }

    async fn spawn(token: Value, sol: Value, delay: Duration) -> Self {
        let state = Arc::new(StubState {
            token,
            sol,
            delay,
            last: Mutex::new(None),
            calls: Mutex::new(0),
        });
        let app = Router::new()
            .route("/", post(stub_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).unwrap()
    }

    pub fn last_request(&self) -> Option<Value> {
        self.state.last.lock().unwrap().clone()
    }

    pub fn calls(&self) -> u32 {
        *self.state.calls.lock().unwrap()
    }
}

async fn stub_handler(
    State(state): State<Arc<StubState>>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    *state.last.lock().unwrap() = Some(body.clone());
    *state.calls.lock().unwrap() += 1;

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    if params.get("api-key").map(String::as_str) != Some(StubRpc::API_KEY) {
        let reply = json!({
            "jsonrpc": "2.0",
            "id": body["id"],
            "error": { "code": -32401, "message": "invalid api key provided" }
        });
        return (StatusCode::UNAUTHORIZED, Json(reply));
    }

    let reply = match body["method"].as_str() {
        Some("getTokenAccountsByOwner") => state.token.clone(),
        Some("getBalance") => state.sol.clone(),
        _ => json!({ "error": { "code": -32601, "message": "Method not found" } }),
    };
    (StatusCode::OK, Json(reply))
}

// getTokenAccountsByOwner reply with a single account holding `ui_amount`
pub fn token_reply(ui_amount: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "context": { "slot": 250000000 },
            "value": [{
                "pubkey": "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
                "account": {
                    "data": {
                        "parsed": {
                            "info": {
                                "isNative": false,
                                "mint": "CyFoxoQhcjJFQJtz32SaYZFUfs1xLMXoXz3nBSytGvcD",
                                "owner": "WalletOwner1111111111111111111111111111111",
                                "tokenAmount": { "decimals": 6, "uiAmount": ui_amount }
                            },
                            "type": "account"
                        },
                        "program": "spl-token"
                    },
                    "lamports": 2039280
                }
            }]
        }
    })
}

pub fn empty_token_reply() -> Value {
    json!({ "jsonrpc": "2.0", "id": 1, "result": { "context": { "slot": 1 }, "value": [] } })
}

pub fn sol_reply(lamports: u64) -> Value {
    json!({ "jsonrpc": "2.0", "id": 2, "result": { "context": { "slot": 1 }, "value": lamports } })
}
