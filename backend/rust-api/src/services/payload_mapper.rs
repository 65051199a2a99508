use crate::models::question::{
    true_false_options, DifficultyLevel, OptionCreate, OptionLocal, QuestionCreate,
    QuestionLocal, QuestionType,
};

/// Translates drafts into the bulk-create payload. Never fails; one output per input.
pub fn map_to_api_payload(questions: &[QuestionLocal]) -> Vec<QuestionCreate> {
    questions.iter().map(map_question).collect()
}

pub fn map_question(q: &QuestionLocal) -> QuestionCreate {
    let (question_type, _) = QuestionType::parse_lenient(&q.question_type);
    let (difficulty_level, _) = DifficultyLevel::parse_lenient(&q.difficulty_level);

    // true_false correctness comes from `correct_answer` only.
    let options = if question_type == QuestionType::TrueFalse {
        true_false_options(q.true_false_answer())
            .iter()
            .map(map_option)
            .collect()
    } else {
        q.options.iter().map(map_option).collect()
    };

    QuestionCreate {
        subject_id: q.subject_id.clone(),
        topic_id: q.topic_id.clone(),
        question_text: q.question_text.clone(),
        question_type,
        difficulty_level,
        explanation: non_empty(&q.explanation),
        image_url: non_empty(&q.image_url),
        audio_url: non_empty(&q.audio_url),
        video_url: non_empty(&q.video_url),
        points: q.points,
        time_limit_seconds: q.time_limit_seconds,
        options,
        tag_ids: q.tag_ids.clone(),
    }
}

fn map_option(o: &OptionLocal) -> OptionCreate {
    OptionCreate {
        option_text: o.option_text.clone(),
        option_order: if o.display_order == 0 {
            1
        } else {
            o.display_order
        },
        is_correct: o.is_correct,
        explanation: o.explanation.as_deref().and_then(non_empty),
        image_url: o.image_url.as_deref().and_then(non_empty),
        match_pair_id: None,
        correct_order: None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(kind: &str) -> QuestionLocal {
        let mut q = QuestionLocal::blank("q-1", "subject-1");
        q.question_text = "Question".to_string();
        q.topic_id = "topic-1".to_string();
        q.question_type = kind.to_string();
        q
    }

    #[test]
    fn output_length_matches_input() {
        let drafts = vec![draft("essay"), draft("multiple_choice"), draft("true_false")];
        assert_eq!(map_to_api_payload(&drafts).len(), 3);
        assert!(map_to_api_payload(&[]).is_empty());
    }

    #[test]
    fn invalid_type_and_difficulty_fall_back() {
        let mut q = draft("Short_Answer");
        q.difficulty_level = "HARD".to_string();
        let mapped = map_question(&q);
        assert_eq!(mapped.question_type, QuestionType::MultipleChoice);
        assert_eq!(mapped.difficulty_level, DifficultyLevel::Hard);

        q.difficulty_level = "unknown".to_string();
        assert_eq!(map_question(&q).difficulty_level, DifficultyLevel::Easy);
    }

    #[test]
    fn true_false_uses_correct_answer_only() {
        let mut q = draft("true_false");
        q.correct_answer = Some("false".to_string());
        // Stale options disagreeing with correct_answer are ignored.
        q.options = vec![OptionLocal::new("True", true, 1)];

        let mapped = map_question(&q);
        assert_eq!(mapped.options.len(), 2);
        assert_eq!(mapped.options[0].option_text, "True");
        assert_eq!(mapped.options[0].option_order, 1);
        assert!(!mapped.options[0].is_correct);
        assert_eq!(mapped.options[1].option_text, "False");
        assert_eq!(mapped.options[1].option_order, 2);
        assert!(mapped.options[1].is_correct);
    }

    #[test]
    fn true_false_without_answer_marks_nothing() {
        let mapped = map_question(&draft("true_false"));
        assert!(mapped.options.iter().all(|o| !o.is_correct));
    }

    #[test]
    fn options_carry_order_and_normalized_fields() {
        let mut q = draft("multiple_choice");
        let mut first = OptionLocal::new("a", false, 0);
        first.explanation = Some(String::new());
        first.image_url = Some("https://img.example/a.png".to_string());
        let mut second = OptionLocal::new("b", true, 2);
        second.explanation = Some("because".to_string());
        q.options = vec![first, second];

        let mapped = map_question(&q);
        assert_eq!(mapped.options[0].option_order, 1);
        assert_eq!(mapped.options[0].explanation, None);
        assert_eq!(
            mapped.options[0].image_url.as_deref(),
            Some("https://img.example/a.png")
        );
        assert_eq!(mapped.options[1].option_order, 2);
        assert!(mapped.options[1].is_correct);
        assert_eq!(mapped.options[1].explanation.as_deref(), Some("because"));
    }

    #[test]
    fn empty_strings_serialize_as_null() {
        let mut q = draft("essay");
        q.time_limit_seconds = Some(45);
        let value = serde_json::to_value(map_question(&q)).unwrap();

        assert_eq!(
            value,
            json!({
                "subject_id": "subject-1",
                "topic_id": "topic-1",
                "question_text": "Question",
                "question_type": "essay",
                "difficulty_level": "easy",
                "explanation": null,
                "image_url": null,
                "audio_url": null,
                "video_url": null,
                "points": 1,
                "time_limit_seconds": 45,
                "options": [],
                "tag_ids": null
            })
        );
    }
}
