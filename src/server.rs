//!
//! tenderguard HTTP server
//! -----------------------
//! Axum surface over the identity and permission model so the console frontend can ask the
//! same questions the in-process API answers.
//!
//! Responsibilities:
//! - Login/logout backed by an `IdentityValidator` (the JSON user directory in production).
//! - One explicit `Session` per cookie; sessions expire after the configured TTL.
//! - Page access and department checks for the caller's session.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::identity::{Credentials, IdentityValidator, Session};
use crate::permission::AccessType;

pub const SESSION_COOKIE: &str = "tenderguard_session";

struct ConsoleSession {
    session: Session,
    expires_at: Instant,
}

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<dyn IdentityValidator>,
    sessions: Arc<RwLock<HashMap<String, ConsoleSession>>>,
    pub ttl: Duration,
}

impl AppState {
    pub fn new(validator: Arc<dyn IdentityValidator>, ttl: Duration) -> Self {
        Self { validator, sessions: Arc::new(RwLock::new(HashMap::new())), ttl }
    }

    pub async fn session_count(&self) -> usize { self.sessions.read().await.len() }

    /// Drop expired sessions; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut map = self.sessions.write().await;
        let before = map.len();
        map.retain(|_, s| s.expires_at > now);
        before - map.len()
    }

    /// Run `f` against the caller's live session, if any.
    async fn with_session<R, F: FnOnce(&Session) -> R>(&self, headers: &HeaderMap, f: F) -> Option<R> {
        let sid = parse_cookie(headers, SESSION_COOKIE)?;
        {
            let map = self.sessions.read().await;
            let entry = map.get(&sid)?;
            if entry.expires_at > Instant::now() {
                return Some(f(&entry.session));
            }
        }
        self.sessions.write().await.remove(&sid);
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let label = match status {
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::FORBIDDEN => "forbidden",
            _ => "error",
        };
        (status, Json(json!({"status": label, "error": self}))).into_response()
    }
}

fn gen_id() -> Result<String, AppError> {
    session_id_from(getrandom::getrandom)
}

/// Encode 32 random bytes as a cookie-safe id. No id is issued if the source fails.
fn session_id_from<F: FnOnce(&mut [u8]) -> Result<(), getrandom::Error>>(fill: F) -> Result<String, AppError> {
    let mut buf = [0u8; 32];
    fill(&mut buf).map_err(|e| AppError::internal("session_id".to_string(), format!("random source unavailable: {}", e)))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie")?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        if let Some((k, v)) = part.trim().split_once('=') {
            if k == name { return Some(v.to_string()); }
        }
    }
    None
}

fn cookie_headers(value: String) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&value) {
        headers.insert("Set-Cookie", v);
    }
    headers
}

fn set_session_cookie(sid: &str) -> HeaderMap {
    cookie_headers(format!("{}={}; HttpOnly; Secure; SameSite=Strict; Path=/", SESSION_COOKIE, sid))
}

fn clear_session_cookie() -> HeaderMap {
    cookie_headers(format!("{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/", SESSION_COOKIE))
}

fn session_summary(session: &Session) -> serde_json::Value {
    match session.identity() {
        Some(id) => json!({
            "authenticated": session.is_authenticated(),
            "identity": {
                "id": id.id,
                "username": id.username,
                "email": id.email,
                "display_name": id.display_name(),
                "role": id.role_name(),
                "role_rank": id.role_rank(),
                "department_id": id.department(),
            },
            "permission_tokens": session.permission_tokens(),
            "index": session.index(),
        }),
        None => json!({"authenticated": false}),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "tenderguard ok" }))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
        .route("/access", get(page_access))
        .route("/departments/{id}/access", get(department_access))
        .fallback(|| async { AppError::not_found("no_route", "no such route") })
        .with_state(state)
}

async fn login(State(state): State<AppState>, headers: HeaderMap, Json(creds): Json<Credentials>) -> Response {
    let mut session = Session::in_memory();
    if let Err(e) = session.login(&creds, state.validator.as_ref()).await {
        return AppError::from(e).into_response();
    }
    let sid = match gen_id() {
        Ok(sid) => sid,
        Err(e) => {
            warn!(target: "tenderguard::server", error = %e, "could not issue session id");
            return e.into_response();
        }
    };
    let body = session_summary(&session);
    let previous = parse_cookie(&headers, SESSION_COOKIE);
    let mut map = state.sessions.write().await;
    if let Some(old) = previous {
        map.remove(&old);
    }
    map.insert(sid.clone(), ConsoleSession { session, expires_at: Instant::now() + state.ttl });
    drop(map);
    (StatusCode::OK, set_session_cookie(&sid), Json(json!({"status": "ok", "session": body}))).into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
        if let Some(mut entry) = state.sessions.write().await.remove(&sid) {
            entry.session.logout();
        }
    }
    (StatusCode::OK, clear_session_cookie(), Json(json!({"status": "ok"}))).into_response()
}

async fn session_info(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match state.with_session(&headers, session_summary).await {
        Some(body) => Json(json!({"status": "ok", "session": body})).into_response(),
        None => AppError::auth("no_session", "not logged in").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct AccessQuery {
    page: String,
    #[serde(default)]
    access: Option<String>,
}

async fn page_access(State(state): State<AppState>, headers: HeaderMap, Query(q): Query<AccessQuery>) -> Response {
    let access = match q.access.as_deref() {
        None => Ok(AccessType::Read),
        Some(raw) => raw.parse::<AccessType>(),
    };
    let out = state
        .with_session(&headers, |s| match access {
            Ok(a) => {
                let d = s.decide(&q.page, a);
                json!({"page": q.page, "access": a, "allowed": d.allowed, "reason": d.reason})
            }
            Err(e) => json!({"page": q.page, "access": e.0, "allowed": false, "reason": "unknown_access_type"}),
        })
        .await;
    match out {
        Some(body) => Json(body).into_response(),
        None => AppError::auth("no_session", "not logged in").into_response(),
    }
}

async fn department_access(State(state): State<AppState>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    match state.with_session(&headers, |s| s.can_access_department(&id)).await {
        Some(allowed) => Json(json!({"department_id": id, "allowed": allowed})).into_response(),
        None => AppError::auth("no_session", "not logged in").into_response(),
    }
}

/// Start the HTTP server with the given configuration.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let directory = config.user_directory().context("While opening the user directory")?;
    match directory.source() {
        Some(p) => info!(target: "startup", users = directory.users().len(), path = %p.display(), "user directory ready"),
        None => warn!(target: "startup", "no user directory configured; every login will be refused"),
    }
    let state = AppState::new(Arc::new(directory), config.session_ttl());

    {
        let state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(30)).await;
                let removed = state.sweep_expired().await;
                if removed > 0 { tracing::debug!(target: "tenderguard::server", removed, "session_sweep"); }
            }
        });
    }

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!(target: "tenderguard::server", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_random_and_cookie_safe() {
        let a = gen_id().unwrap();
        let b = gen_id().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn failing_random_source_issues_no_id() {
        let err = session_id_from(|_| Err(getrandom::Error::UNSUPPORTED)).unwrap_err();
        assert_eq!(err.code_str(), "session_id");
        assert_eq!(err.http_status(), 500);
    }
}
