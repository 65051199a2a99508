use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::ApiError;
use crate::{
    models::catalog::{
        BulkPermissionRequest, CreateRoleRequest, CreateSubjectRequest, CreateTopicRequest,
        PermissionRequest, UpdateSubjectRequest, UpdateTopicRequest,
    },
    services::{catalog_service::CatalogService, AppState},
};

/// POST /api/v1/catalog/subjects
pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSubjectRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let created = CatalogService::new(state.kidemia.as_ref())
        .create_subject(&req)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/catalog/subjects/{id}
pub async fn update_subject(
    State(state): State<Arc<AppState>>,
    Path(subject_id): Path<String>,
    payload: Result<Json<UpdateSubjectRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let updated = CatalogService::new(state.kidemia.as_ref())
        .update_subject(&subject_id, &req)
        .await?;
    Ok(Json(updated))
}

/// POST /api/v1/catalog/topics
pub async fn create_topic(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateTopicRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let created = CatalogService::new(state.kidemia.as_ref())
        .create_topic(&req)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/v1/catalog/topics/{id}
pub async fn update_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    payload: Result<Json<UpdateTopicRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let updated = CatalogService::new(state.kidemia.as_ref())
        .update_topic(&topic_id, &req)
        .await?;
    Ok(Json(updated))
}

/// POST /api/v1/catalog/roles
pub async fn create_role(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let created = CatalogService::new(state.kidemia.as_ref())
        .create_role(&req)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/catalog/roles/{id}/permissions
pub async fn assign_permissions(
    State(state): State<Arc<AppState>>,
    Path(role_id): Path<String>,
    payload: Result<Json<BulkPermissionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    let assigned = CatalogService::new(state.kidemia.as_ref())
        .assign_permissions(&role_id, &req)
        .await?;
    Ok(Json(assigned))
}

/// POST /api/v1/catalog/permissions
pub async fn create_permission(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PermissionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let created = CatalogService::new(state.kidemia.as_ref())
        .create_permission(&req)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}
