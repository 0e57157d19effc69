use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rex_core::Clock;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime: String,
    pub rules_loaded: usize,
    pub rules_enabled: usize,
}

pub async fn health<C: Clock>(State(state): State<AppState<C>>) -> Response {
    if !state.health_limiter.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }

    let rules = state.rules.read();
    let rules_loaded = rules.len();
    let rules_enabled = rules.iter().filter(|r| r.enabled).count();
    let uptime = format_uptime(state.clock.now().saturating_duration_since(state.started_at));

    Json(HealthResponse { status: "ok", uptime, rules_loaded, rules_enabled }).into_response()
}

fn format_uptime(d: std::time::Duration) -> String {
    let total = d.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

#[derive(Serialize)]
pub struct RuleSummary {
    pub name: String,
    pub enabled: bool,
    pub dry_run: bool,
    pub last_state: Option<String>,
}

pub async fn list_rules<C: Clock>(State(state): State<AppState<C>>) -> Response {
    if !state.rules_limiter.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }

    let rules = state.rules.read();
    let last_state = state.last_run_state.lock();
    let summaries: Vec<RuleSummary> = rules
        .iter()
        .map(|r| RuleSummary {
            name: r.name.clone(),
            enabled: r.enabled,
            dry_run: r.dry_run,
            last_state: last_state.get(&r.name).cloned(),
        })
        .collect();

    Json(summaries).into_response()
}

#[derive(serde::Deserialize)]
pub struct HistoryQuery {
    rule: Option<String>,
    state: Option<String>,
    limit: Option<u32>,
}

pub async fn history<C: Clock>(State(state): State<AppState<C>>, Query(q): Query<HistoryQuery>) -> Response {
    if !state.history_limiter.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }

    let Some(store) = &state.history else {
        return Json(Vec::<()>::new()).into_response();
    };

    let limit = q.limit.unwrap_or(50).min(500);
    let execution_state = q.state.as_deref().and_then(parse_execution_state);
    match store.history(q.rule, execution_state, limit).await {
        Ok(records) => Json(records).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "history query failed");
            Json(Vec::<()>::new()).into_response()
        }
    }
}

fn parse_execution_state(s: &str) -> Option<rex_core::ExecutionState> {
    match s {
        "success" => Some(rex_core::ExecutionState::Success),
        "failure" => Some(rex_core::ExecutionState::Failure),
        "timeout" => Some(rex_core::ExecutionState::Timeout),
        "cancelled" => Some(rex_core::ExecutionState::Cancelled),
        _ => None,
    }
}

/// Manually fires a rule's event, mirroring the Manual trigger's `fire`.
/// Backs `rex fire`. The body, if present, is merged in as the event's
/// `data` map; an absent or non-object body means an empty map.
pub async fn fire<C: Clock>(State(state): State<AppState<C>>, Path(name): Path<String>, body: axum::body::Bytes) -> Response {
    if !state.rules_limiter.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }

    if !state.rules.read().iter().any(|r| r.name == name) {
        return (StatusCode::NOT_FOUND, format!("no such rule: {name}")).into_response();
    }

    let data = if body.is_empty() {
        serde_json::Map::new()
    } else {
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => return (StatusCode::BAD_REQUEST, "body must be a JSON object").into_response(),
        }
    };

    let event = rex_core::Event::new(name, "manual").with_data(data);
    if state.event_tx.try_send(event).is_err() {
        return (StatusCode::SERVICE_UNAVAILABLE, "event channel full").into_response();
    }

    (StatusCode::ACCEPTED, "fired").into_response()
}

/// Nudges the hot-reload watcher to reload the rules directory right now
/// instead of waiting for its debounce window. Backs `rex reload`.
pub async fn reload<C: Clock>(State(state): State<AppState<C>>) -> Response {
    if !state.rules_limiter.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }

    if state.reload_tx.try_send(()).is_err() {
        return (StatusCode::ACCEPTED, "reload already pending").into_response();
    }

    (StatusCode::ACCEPTED, "reload requested").into_response()
}

/// Catch-all for any path not matched by `/health`, `/api/rules`, or
/// `/api/history`: resolved against the registered webhooks map.
pub async fn webhook_catch_all<C: Clock>(
    State(state): State<AppState<C>>,
    method: Method,
    Path(path): Path<String>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    if !matches!(method, Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE) {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if !state.webhook_limiter.try_acquire() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response();
    }

    let full_path = format!("/{path}");
    let webhooks = state.webhooks.read();
    let Some(source) = webhooks.get(&full_path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let header_map: HashMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let body_str = String::from_utf8_lossy(&body).into_owned();

    match source.handle_request(method.as_str(), &full_path, &header_map, &body_str, &state.event_tx) {
        rex_triggers::WebhookDecision::Accepted => (StatusCode::OK, "OK").into_response(),
        rex_triggers::WebhookDecision::Rejected => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    }
}
