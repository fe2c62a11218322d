//! API handlers.
//!
//! Every handler is a thin translation between HTTP and one engine or
//! certificate operation; no state is touched directly.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::params::{service_from_query, QueryParams};
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::service::{Service, ValidationError};

type Pairs = Query<Vec<(String, String)>>;

pub async fn reconfigure(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> Result<ApiResponse, ApiError> {
    let params = QueryParams::from(pairs);
    let service = service_from_query(&params)?;
    let name = service.name.clone();
    let report = state.engine.execute(service, &state.context).await?;
    Ok(ApiResponse::from_report(
        format!("service '{}' reconfigured", name),
        report,
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> Result<ApiResponse, ApiError> {
    let params = QueryParams::from(pairs);
    let name = params
        .get("serviceName")
        .ok_or_else(|| ValidationError::new("serviceName", "is required"))?;
    let report = state.engine.remove(name, &state.context).await?;
    Ok(ApiResponse::from_report(
        format!("service '{}' removed", name),
        report,
    ))
}

pub async fn reload(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> Result<ApiResponse, ApiError> {
    let recreate = QueryParams::from(pairs).flag("recreate")?;
    let report = state.engine.reload(recreate, &state.context).await?;
    Ok(ApiResponse::from_report("proxy reloaded", report))
}

/// Called by peers; reloads locally and never fans out again.
pub async fn reload_all(
    State(state): State<AppState>,
    Query(pairs): Pairs,
) -> Result<ApiResponse, ApiError> {
    let params = QueryParams::from(pairs);
    tracing::info!(
        from_instance = params.get("instance").unwrap_or("unknown"),
        from_mode = params.get("mode").unwrap_or("unknown"),
        "Reload requested by peer"
    );
    let report = state.engine.reload_local(true, &state.context).await?;
    Ok(ApiResponse::from_report("all services reloaded", report))
}

pub async fn config(State(state): State<AppState>) -> Result<Response, ApiError> {
    let content = state
        .engine
        .current_config()
        .await
        .map_err(|e| ApiError::internal(format!("failed to read proxy config: {}", e)))?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        content,
    )
        .into_response())
}

pub async fn put_cert(
    State(state): State<AppState>,
    Query(pairs): Pairs,
    body: Bytes,
) -> Result<ApiResponse, ApiError> {
    let params = QueryParams::from(pairs);
    let name = params
        .get("certName")
        .ok_or_else(|| ValidationError::new("certName", "is required"))?;
    let path = state.certs.put(name, &body).await?;
    let report = state.engine.reload_local(true, &state.context).await?;
    Ok(ApiResponse::from_report(format!("certificate stored at {}", path), report))
}

pub async fn certs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let bundle = state.certs.get_all().await?;
    Ok(Json(bundle))
}

pub async fn services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.engine.services().as_ref().clone())
}

pub async fn ping() -> ApiResponse {
    ApiResponse::ok("pong")
}
