use axum::{
    Router,
    extract::{Json, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::service::{AuthCustomer, ServiceError, SessionService};

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Clone)]
pub struct AppState {
    service: SessionService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBalancePayload {
    current_balance: Decimal,
}

pub fn router(service: SessionService) -> Router {
    Router::new()
        .route("/api/me", get(me_handler).patch(update_balance_handler))
        .route("/api/me/line-chart", get(line_chart_handler))
        .route("/api/me/timeline", get(timeline_handler))
        .fallback(not_found_handler)
        .with_state(AppState { service })
}

pub async fn run_http_server(port: u16, service: SessionService) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(service);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "snowball HTTP API listening");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn me_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result: Result<_, ServiceError> = async {
        let auth = auth_customer(&headers)?;
        let service = state.service.clone();
        run_blocking(move |_| service.compute_current_snapshot(auth)).await
    }
    .await;

    match result {
        Ok(view) => json_response(StatusCode::OK, view),
        Err(err) => err.into_response(),
    }
}

async fn update_balance_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<UpdateBalancePayload>,
) -> Response {
    let result: Result<_, ServiceError> = async {
        let auth = auth_customer(&headers)?;
        let service = state.service.clone();
        run_blocking(move |_| service.update_current_balance(auth, payload.current_balance)).await
    }
    .await;

    match result {
        Ok(()) => with_cache_control(StatusCode::NO_CONTENT),
        Err(err) => err.into_response(),
    }
}

async fn line_chart_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result: Result<_, ServiceError> = async {
        let auth = auth_customer(&headers)?;
        let service = state.service.clone();
        let today = today();
        run_blocking(move |cancel| service.generate_chart_series(auth, today, cancel)).await
    }
    .await;

    match result {
        Ok(series) => json_response(StatusCode::OK, series),
        Err(err) => err.into_response(),
    }
}

async fn timeline_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let result: Result<_, ServiceError> = async {
        let auth = auth_customer(&headers)?;
        let service = state.service.clone();
        let today = today();
        run_blocking(move |cancel| service.generate_timeline(auth, today, cancel)).await
    }
    .await;

    match result {
        Ok(timeline) => json_response(StatusCode::OK, timeline),
        Err(err) => err.into_response(),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn auth_customer(headers: &HeaderMap) -> Result<AuthCustomer, ServiceError> {
    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or(ServiceError::Unauthorized)?;
    debug!(session_id, "request authenticated");
    Ok(AuthCustomer { session_id })
}

// The token is cancelled if the request future is dropped first.
async fn run_blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce(&CancellationToken) -> Result<T, ServiceError> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    tokio::task::spawn_blocking(move || work(&cancel))
        .await
        .map_err(|err| ServiceError::Internal(err.to_string()))?
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
