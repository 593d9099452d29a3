//! HTTP routes — the inbound webhook surface.
//!
//! `POST /webhook` accepts free text or JSON, parses it into logical alerts,
//! and dispatches each independently. The response status reflects the
//! active mode's success rule across every alert: 200 only when all alerts
//! were delivered, 502 otherwise, with per-alert, per-channel outcomes in
//! the body so broadcast partial failures are never silent.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, error};

use relay_channels::{DispatchResult, Manager};
use relay_core::alert::{parse_payload, ParsedAlert};

/// Shared state for the webhook handlers.
pub struct AppState {
    pub manager: Arc<Manager>,
    /// Upper bound on one alert's whole dispatch.
    pub dispatch_timeout: Duration,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/healthz", get(healthz))
        .with_state(state)
}

// ─────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────

#[derive(Serialize)]
struct ChannelOutcome {
    channel: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct AlertOutcome {
    message: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    channels: Vec<ChannelOutcome>,
}

#[derive(Serialize)]
struct WebhookResponse {
    ok: bool,
    alerts: Vec<AlertOutcome>,
}

// ─────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────

async fn healthz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "channels": state.manager.registry().len(),
    }))
}

async fn webhook(
    State(state): State<Arc<AppState>>,
    body: String,
) -> (StatusCode, Json<WebhookResponse>) {
    debug!(bytes = body.len(), "received webhook");

    let alerts = parse_payload(&body);
    if alerts.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse {
                ok: false,
                alerts: Vec::new(),
            }),
        );
    }

    let mut outcomes = Vec::with_capacity(alerts.len());
    let mut all_ok = true;
    for alert in &alerts {
        let outcome = dispatch_alert(&state, alert).await;
        all_ok &= outcome.ok;
        outcomes.push(outcome);
    }

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };
    (
        status,
        Json(WebhookResponse {
            ok: all_ok,
            alerts: outcomes,
        }),
    )
}

/// Dispatch one alert, bounded by the configured timeout.
async fn dispatch_alert(state: &AppState, alert: &ParsedAlert) -> AlertOutcome {
    let dispatch = tokio::time::timeout(
        state.dispatch_timeout,
        state.manager.dispatch(
            &alert.message,
            alert.channels.as_deref(),
            alert.target.as_deref(),
        ),
    )
    .await;

    match dispatch {
        Ok(result) => summarize(alert, result),
        Err(_) => {
            error!(
                timeout_secs = state.dispatch_timeout.as_secs(),
                "dispatch timed out"
            );
            AlertOutcome {
                message: alert.message.clone(),
                ok: false,
                error: Some("dispatch timed out".to_string()),
                channels: Vec::new(),
            }
        }
    }
}

fn summarize(alert: &ParsedAlert, result: DispatchResult) -> AlertOutcome {
    AlertOutcome {
        message: alert.message.clone(),
        ok: result.succeeded(),
        error: None,
        channels: result
            .results
            .iter()
            .map(|r| ChannelOutcome {
                channel: r.channel.clone(),
                ok: r.outcome.is_ok(),
                error: r.outcome.as_ref().err().map(|e| e.to_string()),
            })
            .collect(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
