use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::ApiError;
use crate::{
    models::{
        authoring::{
            AuthoringSession, CreateAuthoringSessionRequest, ImportSummary, SubmitResponse,
            TrueFalseAnswerRequest, ValidationReport,
        },
        question::{OptionUpdate, QuestionLocal, QuestionUpdate},
        topic::Topic,
    },
    services::{
        csv_import::{QUESTION_CSV_FILENAME, QUESTION_CSV_TEMPLATE},
        kidemia_client::api_path,
        AppState,
    },
};

/// GET /api/v1/question-csv/template
pub async fn download_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", QUESTION_CSV_FILENAME),
            ),
        ],
        QUESTION_CSV_TEMPLATE,
    )
}

/// POST /api/v1/authoring/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAuthoringSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    if req.subject_id.trim().is_empty() {
        return Err(ApiError::bad_request("subject_id is required"));
    }
    if api_path(&[&req.subject_id]).is_err() {
        return Err(ApiError::bad_request("subject_id is not a valid identifier"));
    }

    let session = state
        .authoring
        .create_session(req.subject_id, req.subject_title)
        .await;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/authoring/sessions/{id}
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<AuthoringSession>, ApiError> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.authoring.get_session(id).await?))
}

/// DELETE /api/v1/authoring/sessions/{id}
pub async fn discard_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&session_id)?;
    state.authoring.discard_session(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/authoring/sessions/{id}/topics
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let topics = state
        .authoring
        .topics_for_session(id, state.kidemia.as_ref())
        .await?;
    Ok(Json(topics))
}

/// POST /api/v1/authoring/sessions/{id}/questions
pub async fn add_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_session_id(&session_id)?;
    let question = state.authoring.add_question(id).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// PATCH /api/v1/authoring/sessions/{id}/questions/{qid}
pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, String)>,
    payload: Result<Json<QuestionUpdate>, JsonRejection>,
) -> Result<Json<QuestionLocal>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let Json(update) = payload?;
    let question = state
        .authoring
        .update_question(id, &question_id, update)
        .await?;
    Ok(Json(question))
}

/// DELETE /api/v1/authoring/sessions/{id}/questions/{qid}
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = parse_session_id(&session_id)?;
    state.authoring.delete_question(id, &question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/authoring/sessions/{id}/questions/{qid}/options
pub async fn add_option(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_session_id(&session_id)?;
    let question = state.authoring.add_option(id, &question_id).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// PATCH /api/v1/authoring/sessions/{id}/questions/{qid}/options/{index}
pub async fn update_option(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, usize)>, PathRejection>,
    payload: Result<Json<OptionUpdate>, JsonRejection>,
) -> Result<Json<QuestionLocal>, ApiError> {
    let Path((session_id, question_id, index)) = path?;
    let id = parse_session_id(&session_id)?;
    let Json(update) = payload?;
    let question = state
        .authoring
        .update_option(id, &question_id, index, update)
        .await?;
    Ok(Json(question))
}

/// DELETE /api/v1/authoring/sessions/{id}/questions/{qid}/options/{index}
pub async fn remove_option(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, usize)>, PathRejection>,
) -> Result<Json<QuestionLocal>, ApiError> {
    let Path((session_id, question_id, index)) = path?;
    let id = parse_session_id(&session_id)?;
    let question = state
        .authoring
        .remove_option(id, &question_id, index)
        .await?;
    Ok(Json(question))
}

/// POST /api/v1/authoring/sessions/{id}/questions/{qid}/options/{index}/toggle-correct
pub async fn toggle_option_correct(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(String, String, usize)>, PathRejection>,
) -> Result<Json<QuestionLocal>, ApiError> {
    let Path((session_id, question_id, index)) = path?;
    let id = parse_session_id(&session_id)?;
    let question = state
        .authoring
        .toggle_option_correct(id, &question_id, index)
        .await?;
    Ok(Json(question))
}

/// PUT /api/v1/authoring/sessions/{id}/questions/{qid}/true-false-answer
pub async fn set_true_false_answer(
    State(state): State<Arc<AppState>>,
    Path((session_id, question_id)): Path<(String, String)>,
    payload: Result<Json<TrueFalseAnswerRequest>, JsonRejection>,
) -> Result<Json<QuestionLocal>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let Json(req) = payload?;
    let question = state
        .authoring
        .set_true_false_answer(id, &question_id, req.answer)
        .await?;
    Ok(Json(question))
}

/// POST /api/v1/authoring/sessions/{id}/import (raw CSV body)
pub async fn import_csv(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Result<Json<ImportSummary>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let text = std::str::from_utf8(&body)
        .map_err(|_| ApiError::Import("CSV file must be UTF-8 encoded".to_string()))?;
    let text = text.trim_start_matches('\u{feff}');

    let summary = state.authoring.import_csv(id, text).await?;
    Ok(Json(summary))
}

/// POST /api/v1/authoring/sessions/{id}/validate
pub async fn validate_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ValidationReport>, ApiError> {
    let id = parse_session_id(&session_id)?;
    Ok(Json(state.authoring.validate(id).await?))
}

/// POST /api/v1/authoring/sessions/{id}/submit
pub async fn submit_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let id = parse_session_id(&session_id)?;
    let response = state
        .authoring
        .submit(id, Arc::clone(&state.kidemia))
        .await?;
    Ok(Json(response))
}

// Unknown and malformed ids are both "not found".
fn parse_session_id(value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|_| ApiError::NotFound("Authoring session not found".to_string()))
}
