use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    metrics,
    models::{
        authoring::{new_question_id, AuthoringSession, ImportSummary, SubmitResponse, ValidationReport},
        question::{OptionLocal, OptionUpdate, QuestionLocal, QuestionUpdate},
        topic::Topic,
    },
    services::{
        csv_import::{parse_questions_csv_with_report, CsvImportError},
        kidemia_client::{KidemiaBackend, UpstreamError},
        payload_mapper::map_to_api_payload,
        question_validation::{validate_questions, QuestionValidationError},
    },
};

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("Authoring session not found")]
    SessionNotFound,
    #[error("Question not found")]
    QuestionNotFound,
    #[error("Option {index} does not exist")]
    OptionOutOfRange { index: usize },
    #[error("You must have at least one question")]
    LastQuestion,
    #[error("Questions are already being submitted")]
    SubmitInProgress,
    #[error("True/false questions always have exactly two options")]
    FixedOptions,
    #[error("Question is not a true/false question")]
    NotTrueFalse,
    #[error(transparent)]
    Import(#[from] CsvImportError),
    #[error(transparent)]
    Validation(#[from] QuestionValidationError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Draft sessions held in memory until they are submitted or discarded.
#[derive(Default)]
pub struct AuthoringStore {
    sessions: RwLock<HashMap<Uuid, AuthoringSession>>,
}

impl AuthoringStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_session(
        &self,
        subject_id: String,
        subject_title: Option<String>,
    ) -> AuthoringSession {
        let session = AuthoringSession::new(subject_id, subject_title);
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, session.clone());
        metrics::AUTHORING_SESSIONS_ACTIVE.set(sessions.len() as i64);

        tracing::info!(
            "Authoring session {} opened for subject {}",
            session.id,
            session.subject_id
        );
        session
    }

    pub async fn get_session(&self, id: Uuid) -> Result<AuthoringSession, AuthoringError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AuthoringError::SessionNotFound)
    }

    pub async fn discard_session(&self, id: Uuid) -> Result<(), AuthoringError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id).ok_or(AuthoringError::SessionNotFound)?;
        metrics::AUTHORING_SESSIONS_ACTIVE.set(sessions.len() as i64);

        tracing::info!("Authoring session {} discarded", id);
        Ok(())
    }

    pub async fn add_question(&self, id: Uuid) -> Result<QuestionLocal, AuthoringError> {
        self.edit(id, |session| {
            let question = QuestionLocal::blank(new_question_id(), session.subject_id.clone());
            session.questions.push(question.clone());
            Ok(question)
        })
        .await
    }

    pub async fn update_question(
        &self,
        id: Uuid,
        question_id: &str,
        update: QuestionUpdate,
    ) -> Result<QuestionLocal, AuthoringError> {
        self.edit_question(id, question_id, |question| {
            update.apply(question);
            Ok(question.clone())
        })
        .await
    }

    pub async fn delete_question(&self, id: Uuid, question_id: &str) -> Result<(), AuthoringError> {
        self.edit(id, |session| {
            let position = session
                .questions
                .iter()
                .position(|q| q.id == question_id)
                .ok_or(AuthoringError::QuestionNotFound)?;
            if session.questions.len() == 1 {
                return Err(AuthoringError::LastQuestion);
            }
            session.questions.remove(position);
            Ok(())
        })
        .await
    }

    pub async fn add_option(
        &self,
        id: Uuid,
        question_id: &str,
    ) -> Result<QuestionLocal, AuthoringError> {
        self.edit_question(id, question_id, |question| {
            if question.is_true_false() {
                return Err(AuthoringError::FixedOptions);
            }
            let order = question.options.len() as u32 + 1;
            question.options.push(OptionLocal::new("", false, order));
            Ok(question.clone())
        })
        .await
    }

    pub async fn update_option(
        &self,
        id: Uuid,
        question_id: &str,
        index: usize,
        update: OptionUpdate,
    ) -> Result<QuestionLocal, AuthoringError> {
        self.edit_question(id, question_id, |question| {
            if question.is_true_false() {
                // Only correctness is editable; it goes through correct_answer.
                if index > 1 {
                    return Err(AuthoringError::OptionOutOfRange { index });
                }
                if update.option_text.is_some()
                    || matches!(update.explanation, Some(Some(_)))
                    || matches!(update.image_url, Some(Some(_)))
                {
                    return Err(AuthoringError::FixedOptions);
                }
                if let Some(is_correct) = update.is_correct {
                    question.set_true_false_answer((index == 0) == is_correct);
                }
                return Ok(question.clone());
            }

            let option = option_at(question, index)?;
            update.apply(option);
            Ok(question.clone())
        })
        .await
    }

    pub async fn toggle_option_correct(
        &self,
        id: Uuid,
        question_id: &str,
        index: usize,
    ) -> Result<QuestionLocal, AuthoringError> {
        self.edit_question(id, question_id, |question| {
            if question.is_true_false() {
                if index > 1 {
                    return Err(AuthoringError::OptionOutOfRange { index });
                }
                question.set_true_false_answer(index == 0);
                return Ok(question.clone());
            }

            let option = option_at(question, index)?;
            option.is_correct = !option.is_correct;
            Ok(question.clone())
        })
        .await
    }

    pub async fn remove_option(
        &self,
        id: Uuid,
        question_id: &str,
        index: usize,
    ) -> Result<QuestionLocal, AuthoringError> {
        self.edit_question(id, question_id, |question| {
            if question.is_true_false() {
                return Err(AuthoringError::FixedOptions);
            }
            if index >= question.options.len() {
                return Err(AuthoringError::OptionOutOfRange { index });
            }
            question.options.remove(index);
            question.renumber_options();
            Ok(question.clone())
        })
        .await
    }

    pub async fn set_true_false_answer(
        &self,
        id: Uuid,
        question_id: &str,
        answer: bool,
    ) -> Result<QuestionLocal, AuthoringError> {
        self.edit_question(id, question_id, |question| {
            if !question.is_true_false() {
                return Err(AuthoringError::NotTrueFalse);
            }
            question.set_true_false_answer(answer);
            Ok(question.clone())
        })
        .await
    }

    /// Parses `text` and appends the drafts after the existing ones.
    pub async fn import_csv(&self, id: Uuid, text: &str) -> Result<ImportSummary, AuthoringError> {
        let summary = self
            .edit(id, |session| {
                let import = parse_questions_csv_with_report(text, &session.subject_id)?;
                let imported = import.questions.len();
                session.questions.extend(import.questions);
                Ok(ImportSummary {
                    imported,
                    total_questions: session.questions.len(),
                    warnings: import.warnings,
                })
            })
            .await?;

        metrics::QUESTIONS_IMPORTED_TOTAL.inc_by(summary.imported as u64);
        for warning in &summary.warnings {
            metrics::IMPORT_WARNINGS_TOTAL
                .with_label_values(&[warning.field])
                .inc();
        }
        tracing::info!(
            "Imported {} questions into session {} ({} warnings)",
            summary.imported,
            id,
            summary.warnings.len()
        );

        Ok(summary)
    }

    pub async fn validate(&self, id: Uuid) -> Result<ValidationReport, AuthoringError> {
        let session = self.get_session(id).await?;
        Ok(match validate_questions(&session.questions) {
            Ok(()) => ValidationReport {
                valid: true,
                message: None,
                question_position: None,
            },
            Err(err) => {
                metrics::QUESTION_VALIDATION_FAILURES_TOTAL
                    .with_label_values(&[err.rule()])
                    .inc();
                ValidationReport {
                    valid: false,
                    message: Some(err.to_string()),
                    question_position: Some(err.position()),
                }
            }
        })
    }

    /// Validates, maps and sends every draft in one bulk call.
    ///
    /// The session is discarded on success; on failure it stays editable.
    /// The upstream call runs on its own task, so dropping the returned
    /// future never leaves the session stuck in the submitting state.
    pub async fn submit(
        self: &Arc<Self>,
        id: Uuid,
        backend: Arc<dyn KidemiaBackend>,
    ) -> Result<SubmitResponse, AuthoringError> {
        let payload = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.get_mut(&id).ok_or(AuthoringError::SessionNotFound)?;
            if session.submitting {
                metrics::record_submission("conflict");
                return Err(AuthoringError::SubmitInProgress);
            }
            if let Err(err) = validate_questions(&session.questions) {
                metrics::QUESTION_VALIDATION_FAILURES_TOTAL
                    .with_label_values(&[err.rule()])
                    .inc();
                metrics::record_submission("invalid");
                return Err(err.into());
            }
            session.submitting = true;
            map_to_api_payload(&session.questions)
        };

        tracing::info!(
            "Submitting {} questions from session {}",
            payload.len(),
            id
        );

        let store = Arc::clone(self);
        let task = tokio::spawn(async move {
            let result = backend.create_bulk_questions(&payload).await;
            store.finish_submit(id, payload.len(), result).await
        });

        match task.await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!("Submit task for session {} aborted: {}", id, err);
                self.release_submitting(id).await;
                metrics::record_submission("upstream_error");
                let err = UpstreamError::Transport("submission was interrupted".to_string());
                Err(err.into())
            }
        }
    }

    async fn finish_submit(
        &self,
        id: Uuid,
        submitted: usize,
        result: Result<serde_json::Value, UpstreamError>,
    ) -> Result<SubmitResponse, AuthoringError> {
        match result {
            Ok(upstream) => {
                let mut sessions = self.sessions.write().await;
                sessions.remove(&id);
                metrics::AUTHORING_SESSIONS_ACTIVE.set(sessions.len() as i64);
                metrics::record_submission("ok");
                tracing::info!("Session {} submitted {} questions", id, submitted);
                Ok(SubmitResponse {
                    submitted,
                    upstream,
                })
            }
            Err(err) => {
                self.release_submitting(id).await;
                metrics::record_submission("upstream_error");
                tracing::warn!("Submit of session {} failed: {}", id, err);
                Err(err.into())
            }
        }
    }

    async fn release_submitting(&self, id: Uuid) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.submitting = false;
            session.touch();
        }
    }

    pub async fn topics_for_session(
        &self,
        id: Uuid,
        backend: &dyn KidemiaBackend,
    ) -> Result<Vec<Topic>, AuthoringError> {
        let subject_id = self.get_session(id).await?.subject_id;
        Ok(backend.topics_by_subject(&subject_id).await?)
    }

    async fn edit<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AuthoringSession) -> Result<T, AuthoringError>,
    ) -> Result<T, AuthoringError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(AuthoringError::SessionNotFound)?;
        if session.submitting {
            return Err(AuthoringError::SubmitInProgress);
        }
        let value = f(session)?;
        session.touch();
        Ok(value)
    }

    async fn edit_question<T>(
        &self,
        id: Uuid,
        question_id: &str,
        f: impl FnOnce(&mut QuestionLocal) -> Result<T, AuthoringError>,
    ) -> Result<T, AuthoringError> {
        self.edit(id, |session| {
            let question = session
                .question_mut(question_id)
                .ok_or(AuthoringError::QuestionNotFound)?;
            f(question)
        })
        .await
    }
}

fn option_at(question: &mut QuestionLocal, index: usize) -> Result<&mut OptionLocal, AuthoringError> {
    question
        .options
        .get_mut(index)
        .ok_or(AuthoringError::OptionOutOfRange { index })
}
