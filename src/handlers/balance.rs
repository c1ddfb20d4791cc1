use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::logging::key_fingerprint;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{BalanceQuery, BalanceRequest, SolBalanceResponse, TokenBalanceResponse};
use crate::rate_limit::EndpointCategory;
use crate::state::AppState;
use crate::validation::validate;

type Payload = Result<Json<BalanceRequest>, JsonRejection>;

fn parse_query(payload: Payload) -> Result<BalanceQuery, AppError> {
    let Json(body) = payload.map_err(|rejection| {
        AppError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    Ok(validate(body.wallet.as_deref(), body.api_key.as_deref())?)
}

fn record<T>(category: EndpointCategory, result: &Result<T, AppError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.category(),
    };
    REQUEST_TOTAL
        .with_label_values(&[category.as_str(), outcome])
        .inc();
}

async fn check_token(state: &AppState, payload: Payload) -> Result<TokenBalanceResponse, AppError> {
    let query = parse_query(payload)?;
    tracing::info!(wallet = %query.wallet, key = %key_fingerprint(&query.api_key), "token check received");

    let balance = state.provider.token_balance(&query, &state.token_mint).await?;

    if balance < state.min_token_balance {
        tracing::warn!(wallet = %query.wallet, %balance, minimum = %state.min_token_balance, "access denied");
        return Err(AppError::InsufficientBalance {
            balance,
            minimum: state.min_token_balance,
        });
    }

    tracing::info!(wallet = %query.wallet, %balance, "access granted");
    Ok(TokenBalanceResponse {
        success: true,
        token_balance: balance,
    })
}

async fn check_sol(state: &AppState, payload: Payload) -> Result<SolBalanceResponse, AppError> {
    let query = parse_query(payload)?;
    tracing::info!(wallet = %query.wallet, key = %key_fingerprint(&query.api_key), "sol check received");

    let balance = state.provider.sol_balance(&query).await?;

    tracing::info!(wallet = %query.wallet, %balance, "sol balance fetched");
    Ok(SolBalanceResponse {
        success: true,
        sol_balance: balance,
    })
}

pub async fn validate_token_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload,
) -> Result<Json<TokenBalanceResponse>, AppError> {
    let result = check_token(&state, payload).await;
    record(EndpointCategory::Token, &result);
    result.map(Json)
}

pub async fn validate_sol_handler(
    State(state): State<Arc<AppState>>,
    payload: Payload,
) -> Result<Json<SolBalanceResponse>, AppError> {
    let result = check_sol(&state, payload).await;
    record(EndpointCategory::Sol, &result);
    result.map(Json)
}
