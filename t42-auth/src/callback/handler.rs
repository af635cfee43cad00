use super::pages;
use crate::error::AuthError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
};
use reqwest::Url;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

pub(super) type CallbackOutcome = Result<String, AuthError>;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Clone)]
pub(super) struct CallbackState {
    pub expected_state: Arc<str>,
    pub sender: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

pub(super) async fn oauth_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    let sender = state
        .sender
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    let Some(sender) = sender else {
        tracing::warn!("Ignoring callback request after the login attempt was settled");
        return (
            StatusCode::GONE,
            Html(pages::error_page("This login attempt has already completed.")),
        );
    };

    let outcome = evaluate(&params, &state.expected_state);
    let response = match &outcome {
        Ok(_) => {
            tracing::info!("OAuth callback received authorization code");
            (StatusCode::OK, Html(pages::success_page()))
        }
        Err(err) => {
            tracing::warn!(error = %err, "OAuth callback rejected");
            (StatusCode::BAD_REQUEST, Html(pages::error_page(&err.to_string())))
        }
    };

    if sender.send(outcome).is_err() {
        tracing::debug!("Login flow stopped waiting before the callback arrived");
    }

    response
}

/// Provider error first, then state, then code.
pub(super) fn evaluate(params: &CallbackParams, expected_state: &str) -> CallbackOutcome {
    if let Some(error) = &params.error {
        return Err(AuthError::Provider {
            error: error.clone(),
            description: params.error_description.clone(),
        });
    }

    match params.state.as_deref() {
        Some(state) if constant_time_eq(state.as_bytes(), expected_state.as_bytes()) => {}
        _ => return Err(AuthError::StateMismatch),
    }

    params
        .code
        .clone()
        .filter(|code| !code.is_empty())
        .ok_or(AuthError::MissingCode)
}

/// Reads the code from what the user pasted after a redirect without a listener.
///
/// A full redirect URL gets the same checks as a live callback. A bare code is
/// taken as is, since it carries no state to compare.
pub fn code_from_pasted(input: &str, expected_state: &str) -> Result<String, AuthError> {
    let input = input.trim();
    if !(input.starts_with("http://") || input.starts_with("https://")) {
        return Some(input.to_string())
            .filter(|code| !code.is_empty())
            .ok_or(AuthError::MissingCode);
    }

    let url = Url::parse(input).map_err(|_| AuthError::MissingCode)?;
    let mut params = CallbackParams::default();
    for (key, value) in url.query_pairs() {
        let value = Some(value.into_owned());
        match key.as_ref() {
            "code" => params.code = value,
            "state" => params.state = value,
            "error" => params.error = value,
            "error_description" => params.error_description = value,
            _ => {}
        }
    }
    evaluate(&params, expected_state)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
