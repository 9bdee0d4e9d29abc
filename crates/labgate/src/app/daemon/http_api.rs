//! HTTP API: status, admin and the terminal channel.

use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use tokio::sync::Semaphore;
use tokio::sync::watch;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing::warn;

use super::terminal_ws::terminal_handler;
use crate::adapters::daemon::UseCaseContainer;
use crate::adapters::wire::{
    AdminLoginRequest, AdminLoginResponse, ErrorResponse, IssueTokenRequest, IssueTokenResponse,
    MetricsResponse, StatusResponse,
};
use crate::domain::LabError;
use crate::domain::TokenString;
use crate::usecases::{
    AdminLoginUseCase, AdminLogoutUseCase, IssueTokenUseCase, RevokeTokenUseCase, StatusUseCase,
};

mod error;
pub(crate) use error::ApiServerError;

pub(crate) struct ApiState {
    pub(crate) container: Arc<UseCaseContainer>,
    pub(crate) ws_limits: Arc<Semaphore>,
    pub(crate) ws_queue_capacity: usize,
    pub(crate) shutdown_rx: watch::Receiver<bool>,
    pub(crate) poll_interval_seconds: u64,
}

pub(crate) fn build_router(state: Arc<ApiState>) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    axum::Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/admin/login", post(admin_login_handler))
        .route("/api/admin/logout", post(admin_logout_handler))
        .route("/api/admin/token", post(issue_token_handler))
        .route("/api/admin/token/:token", delete(revoke_token_handler))
        .route("/api/admin/metrics", get(metrics_handler))
        .route("/api/terminal", get(terminal_handler))
        .layer(cors)
        .with_state(state)
}

async fn status_handler(State(state): State<Arc<ApiState>>) -> Response {
    let snapshot = state.container.status.execute();
    Json(StatusResponse::from_snapshot(
        snapshot,
        state.poll_interval_seconds,
    ))
    .into_response()
}

async fn admin_login_handler(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<AdminLoginRequest>,
) -> Response {
    match state
        .container
        .admin
        .login
        .execute(&request.username, &request.password)
    {
        Ok(token) => {
            info!(username = %request.username, "Admin logged in");
            Json(AdminLoginResponse { token }).into_response()
        }
        Err(err) => {
            warn!(username = %request.username, "Admin login rejected");
            lab_error_response(&err)
        }
    }
}

async fn admin_logout_handler(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let Some(admin_token) = bearer_token(&headers) else {
        return lab_error_response(&LabError::Unauthorized);
    };
    state.container.admin.logout.execute(&admin_token);
    StatusCode::NO_CONTENT.into_response()
}

async fn issue_token_handler(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let admin_token = match bearer_token(&headers) {
        Some(token) => Some(token),
        None if body.is_empty() => None,
        None => match serde_json::from_slice::<IssueTokenRequest>(&body) {
            Ok(request) => request.admin_token,
            Err(err) => {
                return error_response(StatusCode::BAD_REQUEST, &format!("invalid body: {err}"));
            }
        },
    };
    let Some(admin_token) = admin_token else {
        return lab_error_response(&LabError::Unauthorized);
    };

    match state.container.admin.issue_token.execute(&admin_token) {
        Ok(token) => {
            info!(token = %token.value().redacted(), "Access token issued");
            Json(IssueTokenResponse {
                token_string: token.value().to_string(),
                issued_at: token.issued_at().to_rfc3339(),
            })
            .into_response()
        }
        Err(err) => lab_error_response(&err),
    }
}

async fn revoke_token_handler(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Response {
    let Some(admin_token) = bearer_token(&headers) else {
        return lab_error_response(&LabError::Unauthorized);
    };
    match state
        .container
        .admin
        .revoke_token
        .execute(&admin_token, &token)
    {
        Ok(true) => {
            let token = TokenString::parse(&token)
                .map(|t| t.redacted())
                .unwrap_or_default();
            info!(token = %token, "Access token revoked");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => lab_error_response(&LabError::InvalidToken),
        Err(err) => lab_error_response(&err),
    }
}

async fn metrics_handler(State(state): State<Arc<ApiState>>, headers: HeaderMap) -> Response {
    let authorized = bearer_token(&headers)
        .is_some_and(|token| state.container.authenticator.verify(&token).is_ok());
    if !authorized {
        return lab_error_response(&LabError::Unauthorized);
    }
    let capacity = state.container.admission.snapshot();
    Json(MetricsResponse::new(
        state.container.metrics.snapshot(),
        state.container.tokens.outstanding(),
        capacity.active,
        capacity.max_sessions,
    ))
    .into_response()
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorResponse::message(message))).into_response()
}

pub(crate) fn lab_error_response(err: &LabError) -> Response {
    let status = match err {
        LabError::InvalidToken => StatusCode::NOT_FOUND,
        LabError::Unauthorized => StatusCode::UNAUTHORIZED,
        LabError::ServerFull { .. } | LabError::UpstreamUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (status, Json(ErrorResponse::from(err))).into_response()
}

pub(crate) fn bind_listener(
    listen: &str,
    allow_remote: bool,
) -> Result<(std::net::TcpListener, SocketAddr), ApiServerError> {
    let mut addrs = listen
        .to_socket_addrs()
        .map_err(|e| ApiServerError::InvalidListen {
            message: e.to_string(),
        })?;
    let addr = addrs.next().ok_or_else(|| ApiServerError::InvalidListen {
        message: "no resolved address".to_string(),
    })?;

    if !allow_remote && !addr.ip().is_loopback() {
        return Err(ApiServerError::InvalidListen {
            message: "refusing to bind non-loopback address without LABGATE_ALLOW_REMOTE=1"
                .to_string(),
        });
    }

    let listener = std::net::TcpListener::bind(addr).map_err(|e| ApiServerError::Io {
        operation: "bind",
        source: e,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|e| ApiServerError::Io {
            operation: "set non-blocking",
            source: e,
        })?;
    let local_addr = listener.local_addr().map_err(|e| ApiServerError::Io {
        operation: "read local address",
        source: e,
    })?;
    Ok((listener, local_addr))
}
