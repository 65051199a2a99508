use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::QuestionLocal;

/// In-memory authoring session owning a list of draft questions for one subject.
#[derive(Debug, Clone, Serialize)]
pub struct AuthoringSession {
    pub id: Uuid,
    pub subject_id: String,
    /// Shown in breadcrumbs by the dashboard.
    pub subject_title: Option<String>,
    pub questions: Vec<QuestionLocal>,
    /// Set while a bulk submit is in flight.
    pub submitting: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthoringSession {
    pub fn new(subject_id: String, subject_title: Option<String>) -> Self {
        let now = Utc::now();
        let first = QuestionLocal::blank(new_question_id(), subject_id.clone());
        Self {
            id: Uuid::new_v4(),
            subject_id,
            subject_title,
            questions: vec![first],
            submitting: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn question_mut(&mut self, question_id: &str) -> Option<&mut QuestionLocal> {
        self.questions.iter_mut().find(|q| q.id == question_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

pub fn new_question_id() -> String {
    format!("q-{}", Uuid::new_v4())
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthoringSessionRequest {
    pub subject_id: String,
    pub subject_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrueFalseAnswerRequest {
    pub answer: bool,
}

/// A lenient fallback applied while importing a CSV row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportWarning {
    /// 1-based line number in the uploaded file (header is line 1).
    pub row: usize,
    pub field: &'static str,
    pub value: String,
    pub applied: String,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub total_questions: usize,
    pub warnings: Vec<ImportWarning>,
}

#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub message: Option<String>,
    /// 1-based position of the first offending question.
    pub question_position: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submitted: usize,
    pub upstream: serde_json::Value,
}
