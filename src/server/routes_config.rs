//! Configuration management API routes.

use crate::reconcile::ApplyConfigRequest;
use crate::server::{AppContext, AppError};
use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use ocbridge_common::{ConfigId, Error, StatusMessage};
use ocbridge_db::models::{ConfigRecord, Endpoint};
use serde::Serialize;

pub fn config_routes() -> Router<AppContext> {
    Router::new()
        .route("/config", get(get_config).post(apply_config))
        .route("/config/endpoints", get(list_endpoints))
}

#[derive(Serialize)]
struct ConfigResponse {
    id: ConfigId,
    config: serde_json::Value,
    updated_at: DateTime<Utc>,
    // password is stripped before serialization
}

impl TryFrom<&ConfigRecord> for ConfigResponse {
    type Error = Error;

    fn try_from(record: &ConfigRecord) -> Result<Self, Self::Error> {
        let mut config = serde_json::to_value(&record.config)?;
        if let Some(map) = config.as_object_mut() {
            map.remove("password");
        }

        Ok(Self {
            id: record.id,
            config,
            updated_at: record.updated_at,
        })
    }
}

#[derive(Serialize)]
struct ApplyResponse {
    config: ConfigResponse,
    message: StatusMessage,
}

async fn get_config(State(ctx): State<AppContext>) -> Result<Json<ConfigResponse>, AppError> {
    let record = ctx
        .reconciler
        .current_config()?
        .ok_or_else(|| Error::not_found("configuration"))?;

    Ok(Json(ConfigResponse::try_from(&record)?))
}

async fn apply_config(
    State(ctx): State<AppContext>,
    Json(req): Json<ApplyConfigRequest>,
) -> Result<Json<ApplyResponse>, AppError> {
    let result = ctx.reconciler.apply_config(req).await?;

    Ok(Json(ApplyResponse {
        config: ConfigResponse::try_from(&result.config)?,
        message: result.message,
    }))
}

#[derive(Serialize)]
struct EndpointResponse {
    service_type: String,
    service_url: String,
    updated_at: DateTime<Utc>,
}

impl From<Endpoint> for EndpointResponse {
    fn from(endpoint: Endpoint) -> Self {
        Self {
            service_type: endpoint.service_type.to_string(),
            service_url: endpoint.service_url,
            updated_at: endpoint.updated_at,
        }
    }
}

async fn list_endpoints(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<EndpointResponse>>, AppError> {
    let endpoints = ctx.reconciler.endpoints()?;
    Ok(Json(endpoints.into_iter().map(EndpointResponse::from).collect()))
}
