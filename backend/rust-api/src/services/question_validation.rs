use thiserror::Error;

use crate::models::question::{QuestionLocal, QuestionType};

/// First pre-submission violation found in a question list.
///
/// `position` is the 1-based index of the offending question.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionValidationError {
    #[error("Please fill in all question texts")]
    MissingText { position: usize },
    #[error("Please select a topic for all questions")]
    MissingTopic { position: usize },
    #[error("Please select a question type for all questions")]
    MissingType { position: usize },
    #[error("Multiple choice questions must have at least 2 options")]
    TooFewChoices { position: usize },
    #[error("Please mark the correct answer for all multiple choice questions")]
    NoCorrectChoice { position: usize },
    #[error("Please fill in all option texts")]
    EmptyOptionText { position: usize },
    #[error("Ordering questions must have at least 2 options")]
    TooFewOrderingItems { position: usize },
}

impl QuestionValidationError {
    pub fn position(&self) -> usize {
        match self {
            Self::MissingText { position }
            | Self::MissingTopic { position }
            | Self::MissingType { position }
            | Self::TooFewChoices { position }
            | Self::NoCorrectChoice { position }
            | Self::EmptyOptionText { position }
            | Self::TooFewOrderingItems { position } => *position,
        }
    }

    /// Short label used for metrics.
    pub fn rule(&self) -> &'static str {
        match self {
            Self::MissingText { .. } => "missing_text",
            Self::MissingTopic { .. } => "missing_topic",
            Self::MissingType { .. } => "missing_type",
            Self::TooFewChoices { .. } => "too_few_choices",
            Self::NoCorrectChoice { .. } => "no_correct_choice",
            Self::EmptyOptionText { .. } => "empty_option_text",
            Self::TooFewOrderingItems { .. } => "too_few_ordering_items",
        }
    }
}

/// Checks every draft in order and stops at the first violation.
pub fn validate_questions(questions: &[QuestionLocal]) -> Result<(), QuestionValidationError> {
    for (idx, question) in questions.iter().enumerate() {
        validate_question(question, idx + 1)?;
    }
    Ok(())
}

fn validate_question(q: &QuestionLocal, position: usize) -> Result<(), QuestionValidationError> {
    if q.question_text.trim().is_empty() {
        return Err(QuestionValidationError::MissingText { position });
    }
    if q.topic_id.is_empty() {
        return Err(QuestionValidationError::MissingTopic { position });
    }
    if q.question_type.is_empty() {
        return Err(QuestionValidationError::MissingType { position });
    }

    // Matches the type string exactly as entered; normalization happens in the mapper.
    if q.question_type == QuestionType::MultipleChoice.as_str() {
        if q.options.len() < 2 {
            return Err(QuestionValidationError::TooFewChoices { position });
        }
        if !q.options.iter().any(|o| o.is_correct) {
            return Err(QuestionValidationError::NoCorrectChoice { position });
        }
        if q.options.iter().any(|o| o.option_text.trim().is_empty()) {
            return Err(QuestionValidationError::EmptyOptionText { position });
        }
    }

    if q.question_type == QuestionType::Ordering.as_str() && q.options.len() < 2 {
        return Err(QuestionValidationError::TooFewOrderingItems { position });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::OptionLocal;

    fn mc(text: &str, options: &[(&str, bool)]) -> QuestionLocal {
        let mut q = QuestionLocal::blank("q", "s");
        q.question_text = text.to_string();
        q.topic_id = "t1".to_string();
        q.options = options
            .iter()
            .enumerate()
            .map(|(idx, (text, correct))| OptionLocal::new(*text, *correct, idx as u32 + 1))
            .collect();
        q
    }

    #[test]
    fn valid_multiple_choice_passes() {
        let q = mc("2+2?", &[("3", false), ("4", true)]);
        assert_eq!(validate_questions(&[q]), Ok(()));
    }

    #[test]
    fn empty_list_is_valid() {
        assert_eq!(validate_questions(&[]), Ok(()));
    }

    #[test]
    fn multiple_choice_without_correct_option_fails() {
        let q = mc("2+2?", &[("3", false), ("4", false)]);
        let err = validate_questions(&[q]).unwrap_err();
        assert_eq!(err, QuestionValidationError::NoCorrectChoice { position: 1 });
        assert_eq!(
            err.to_string(),
            "Please mark the correct answer for all multiple choice questions"
        );
    }

    #[test]
    fn ordering_with_one_option_fails() {
        let mut q = mc("Order these", &[("first", false)]);
        q.question_type = "ordering".to_string();
        assert_eq!(
            validate_questions(&[q]),
            Err(QuestionValidationError::TooFewOrderingItems { position: 1 })
        );
    }

    #[test]
    fn checks_run_in_documented_order() {
        let mut q = mc("   ", &[]);
        q.topic_id.clear();
        q.question_type.clear();
        assert!(matches!(
            validate_questions(std::slice::from_ref(&q)),
            Err(QuestionValidationError::MissingText { .. })
        ));

        q.question_text = "text".to_string();
        assert!(matches!(
            validate_questions(std::slice::from_ref(&q)),
            Err(QuestionValidationError::MissingTopic { .. })
        ));

        q.topic_id = "t1".to_string();
        assert!(matches!(
            validate_questions(std::slice::from_ref(&q)),
            Err(QuestionValidationError::MissingType { .. })
        ));

        q.question_type = "multiple_choice".to_string();
        assert!(matches!(
            validate_questions(std::slice::from_ref(&q)),
            Err(QuestionValidationError::TooFewChoices { .. })
        ));
    }

    #[test]
    fn blank_option_text_is_reported_after_correctness() {
        let q = mc("2+2?", &[("4", true), ("  ", false)]);
        assert_eq!(
            validate_questions(&[q]),
            Err(QuestionValidationError::EmptyOptionText { position: 1 })
        );
    }

    #[test]
    fn reports_first_offending_position() {
        let good = mc("ok", &[("a", true), ("b", false)]);
        let bad = mc("bad", &[("a", false), ("b", false)]);
        let err = validate_questions(&[good.clone(), good, bad]).unwrap_err();
        assert_eq!(err.position(), 3);
        assert_eq!(err.rule(), "no_correct_choice");
    }

    #[test]
    fn other_types_skip_option_checks() {
        for kind in ["essay", "fill_in_blank", "matching", "true_false"] {
            let mut q = mc("Explain", &[]);
            q.question_type = kind.to_string();
            assert_eq!(validate_questions(&[q]), Ok(()), "type {kind}");
        }
    }
}
