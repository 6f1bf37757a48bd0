//! Country gate.
//!
//! The edge platform in front of the service reports the caller's country in a header. When the
//! gate is enabled, requests from outside the allow-list get a static 403 page. Requests without
//! a country header pass, as do exempt paths such as the payment callback, whose gateways call
//! from abroad.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{AppState, config::GeoConfig, db::models::geo_access_logs::GeoAccessLogCreateDBRequest, templates::GEO_BLOCKED_PAGE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoDecision {
    Allow,
    Block { country: String },
}

fn is_exempt(path: &str, exempt_paths: &[String]) -> bool {
    exempt_paths.iter().any(|exempt| {
        let exempt = exempt.trim_end_matches('/');
        path == exempt || path.strip_prefix(exempt).is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Country code from the first configured header that carries one
pub fn country_from_headers(headers: &HeaderMap, country_headers: &[String]) -> Option<String> {
    country_headers.iter().find_map(|name| {
        headers
            .get(name.as_str())
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_uppercase())
            .filter(|value| !value.is_empty())
    })
}

pub fn decide(config: &GeoConfig, headers: &HeaderMap, path: &str) -> GeoDecision {
    if !config.enabled || is_exempt(path, &config.exempt_paths) {
        return GeoDecision::Allow;
    }

    match country_from_headers(headers, &config.country_headers) {
        Some(country) if !config.allowed_countries.iter().any(|allowed| allowed == &country) => GeoDecision::Block { country },
        _ => GeoDecision::Allow,
    }
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::to_string)
}

/// Middleware applying [`decide`] to every request
pub async fn geo_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    let country = match decide(&state.config.geo, request.headers(), &path) {
        GeoDecision::Allow => return next.run(request).await,
        GeoDecision::Block { country } => country,
    };

    warn!(country = %country, path = %path, "Blocked request from outside allowed countries");

    let log = GeoAccessLogCreateDBRequest {
        country,
        path,
        ip: client_ip(request.headers()),
        user_agent: request
            .headers()
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let store = state.store.clone();
    tokio::spawn(async move {
        if let Err(e) = store.record_geo_access(&log).await {
            debug!(error = %e, "Failed to record geo access log");
        }
    });

    (StatusCode::FORBIDDEN, Html(GEO_BLOCKED_PAGE)).into_response()
}
