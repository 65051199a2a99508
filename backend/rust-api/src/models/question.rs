use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    TrueFalse,
    FillInBlank,
    Essay,
    Matching,
    Ordering,
}

impl QuestionType {
    pub const ALL: [QuestionType; 6] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::FillInBlank,
        QuestionType::Essay,
        QuestionType::Matching,
        QuestionType::Ordering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::TrueFalse => "true_false",
            QuestionType::FillInBlank => "fill_in_blank",
            QuestionType::Essay => "essay",
            QuestionType::Matching => "matching",
            QuestionType::Ordering => "ordering",
        }
    }

    /// Parses case-insensitively, falling back to `multiple_choice`.
    /// The flag is `true` when the fallback was used.
    pub fn parse_lenient(value: &str) -> (Self, bool) {
        match value.parse() {
            Ok(parsed) => (parsed, false),
            Err(_) => (QuestionType::MultipleChoice, true),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        QuestionType::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| format!("Invalid question type: {}", value))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    #[default]
    Easy,
    Medium,
    Hard,
    Expert,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 4] = [
        DifficultyLevel::Easy,
        DifficultyLevel::Medium,
        DifficultyLevel::Hard,
        DifficultyLevel::Expert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
            DifficultyLevel::Expert => "expert",
        }
    }

    /// Same lenient policy as [`QuestionType::parse_lenient`], defaulting to `easy`.
    pub fn parse_lenient(value: &str) -> (Self, bool) {
        match value.parse() {
            Ok(parsed) => (parsed, false),
            Err(_) => (DifficultyLevel::Easy, true),
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        DifficultyLevel::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| format!("Invalid difficulty level: {}", value))
    }
}

/// Answer option of a draft question, as edited by the author.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionLocal {
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    /// 1-based, kept contiguous across removals.
    pub display_order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl OptionLocal {
    pub fn new(option_text: impl Into<String>, is_correct: bool, display_order: u32) -> Self {
        Self {
            option_text: option_text.into(),
            is_correct,
            display_order,
            explanation: None,
            image_url: None,
        }
    }
}

/// Draft question held by an authoring session until it is submitted.
///
/// `question_type` and `difficulty_level` keep whatever the author entered;
/// they are only normalized when the payload is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionLocal {
    pub id: String,
    pub subject_id: String,
    pub topic_id: String,
    pub question_text: String,
    pub question_type: String,
    pub difficulty_level: String,
    pub points: u32,
    pub time_limit_seconds: Option<u32>,
    pub explanation: String,
    pub options: Vec<OptionLocal>,
    /// `"true"` or `"false"`, only meaningful for `true_false` questions.
    #[serde(default)]
    pub correct_answer: Option<String>,
    pub audio_url: String,
    pub image_url: String,
    pub video_url: String,
    #[serde(default)]
    pub tag_ids: Option<Vec<String>>,
}

impl QuestionLocal {
    /// Empty draft with the defaults the authoring screen starts from.
    pub fn blank(id: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject_id: subject_id.into(),
            topic_id: String::new(),
            question_text: String::new(),
            question_type: QuestionType::MultipleChoice.as_str().to_string(),
            difficulty_level: DifficultyLevel::Easy.as_str().to_string(),
            points: 1,
            time_limit_seconds: None,
            explanation: String::new(),
            options: Vec::new(),
            correct_answer: None,
            audio_url: String::new(),
            image_url: String::new(),
            video_url: String::new(),
            tag_ids: None,
        }
    }

    pub fn is_true_false(&self) -> bool {
        self.question_type.eq_ignore_ascii_case(QuestionType::TrueFalse.as_str())
    }

    /// `correct_answer` interpreted as a boolean.
    pub fn true_false_answer(&self) -> Option<bool> {
        match self.correct_answer.as_deref().map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("true") => Some(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    /// Sets the answer and rewrites the two synthetic options to match it.
    pub fn set_true_false_answer(&mut self, answer: bool) {
        self.correct_answer = Some(answer.to_string());
        self.options = true_false_options(Some(answer));
    }

    /// Re-numbers `display_order` to `1..=N` in the current order.
    pub fn renumber_options(&mut self) {
        for (idx, option) in self.options.iter_mut().enumerate() {
            option.display_order = idx as u32 + 1;
        }
    }
}

/// The "True"/"False" pair used for `true_false` questions.
pub fn true_false_options(answer: Option<bool>) -> Vec<OptionLocal> {
    vec![
        OptionLocal::new("True", answer == Some(true), 1),
        OptionLocal::new("False", answer == Some(false), 2),
    ]
}

/// Partial update of a draft; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionUpdate {
    pub topic_id: Option<String>,
    pub question_text: Option<String>,
    pub question_type: Option<String>,
    pub difficulty_level: Option<String>,
    pub points: Option<u32>,
    /// `Some(None)` clears the limit.
    #[serde(default, deserialize_with = "double_option")]
    pub time_limit_seconds: Option<Option<u32>>,
    pub explanation: Option<String>,
    pub audio_url: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub tag_ids: Option<Option<Vec<String>>>,
}

impl QuestionUpdate {
    pub fn apply(self, question: &mut QuestionLocal) {
        if let Some(topic_id) = self.topic_id {
            question.topic_id = topic_id;
        }
        if let Some(text) = self.question_text {
            question.question_text = text;
        }
        if let Some(question_type) = self.question_type {
            let becomes_true_false =
                question_type.eq_ignore_ascii_case(QuestionType::TrueFalse.as_str());
            if becomes_true_false && !question.is_true_false() {
                question.options = true_false_options(question.true_false_answer());
            } else if !becomes_true_false && question.is_true_false() {
                question.options.clear();
                question.correct_answer = None;
            }
            question.question_type = question_type;
        }
        if let Some(level) = self.difficulty_level {
            question.difficulty_level = level;
        }
        if let Some(points) = self.points {
            question.points = points.max(1);
        }
        if let Some(limit) = self.time_limit_seconds {
            question.time_limit_seconds = limit.filter(|value| *value > 0);
        }
        if let Some(explanation) = self.explanation {
            question.explanation = explanation;
        }
        if let Some(url) = self.audio_url {
            question.audio_url = url;
        }
        if let Some(url) = self.image_url {
            question.image_url = url;
        }
        if let Some(url) = self.video_url {
            question.video_url = url;
        }
        if let Some(tags) = self.tag_ids {
            question.tag_ids = tags;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionUpdate {
    pub option_text: Option<String>,
    pub is_correct: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub explanation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl OptionUpdate {
    pub fn apply(self, option: &mut OptionLocal) {
        if let Some(text) = self.option_text {
            option.option_text = text;
        }
        if let Some(is_correct) = self.is_correct {
            option.is_correct = is_correct;
        }
        if let Some(explanation) = self.explanation {
            option.explanation = explanation;
        }
        if let Some(url) = self.image_url {
            option.image_url = url;
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Option record expected by the bulk-create endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionCreate {
    pub option_text: String,
    pub option_order: u32,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub image_url: Option<String>,
    pub match_pair_id: Option<String>,
    pub correct_order: Option<u32>,
}

/// Question record expected by the bulk-create endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionCreate {
    pub subject_id: String,
    pub topic_id: String,
    pub question_text: String,
    pub question_type: QuestionType,
    pub difficulty_level: DifficultyLevel,
    pub explanation: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub points: u32,
    pub time_limit_seconds: Option<u32>,
    pub options: Vec<OptionCreate>,
    pub tag_ids: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parses_case_insensitively() {
        assert_eq!(
            "TRUE_FALSE".parse::<QuestionType>().unwrap(),
            QuestionType::TrueFalse
        );
        assert_eq!(
            " Ordering ".parse::<QuestionType>().unwrap(),
            QuestionType::Ordering
        );
        assert!("short_answer".parse::<QuestionType>().is_err());
    }

    #[test]
    fn lenient_parse_reports_fallback() {
        assert_eq!(
            QuestionType::parse_lenient("essay"),
            (QuestionType::Essay, false)
        );
        assert_eq!(
            QuestionType::parse_lenient("quiz"),
            (QuestionType::MultipleChoice, true)
        );
        assert_eq!(
            DifficultyLevel::parse_lenient("Expert"),
            (DifficultyLevel::Expert, false)
        );
        assert_eq!(
            DifficultyLevel::parse_lenient("impossible"),
            (DifficultyLevel::Easy, true)
        );
    }

    #[test]
    fn wire_enums_serialize_as_snake_case() {
        let value = serde_json::to_value(QuestionType::FillInBlank).unwrap();
        assert_eq!(value, "fill_in_blank");
        let value = serde_json::to_value(DifficultyLevel::Hard).unwrap();
        assert_eq!(value, "hard");
    }

    #[test]
    fn renumber_keeps_relative_order() {
        let mut question = QuestionLocal::blank("q-1", "s-1");
        question.options = vec![
            OptionLocal::new("a", false, 1),
            OptionLocal::new("c", false, 3),
            OptionLocal::new("d", true, 4),
        ];
        question.renumber_options();

        let orders: Vec<u32> = question.options.iter().map(|o| o.display_order).collect();
        let texts: Vec<&str> = question
            .options
            .iter()
            .map(|o| o.option_text.as_str())
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(texts, vec!["a", "c", "d"]);
    }

    #[test]
    fn switching_to_true_false_synthesizes_options() {
        let mut question = QuestionLocal::blank("q-1", "s-1");
        question.options.push(OptionLocal::new("stale", true, 1));

        QuestionUpdate {
            question_type: Some("true_false".to_string()),
            ..Default::default()
        }
        .apply(&mut question);

        assert_eq!(question.options.len(), 2);
        assert_eq!(question.options[0].option_text, "True");
        assert!(!question.options[0].is_correct);
        assert!(!question.options[1].is_correct);

        question.set_true_false_answer(false);
        assert_eq!(question.correct_answer.as_deref(), Some("false"));
        assert!(question.options[1].is_correct);
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let mut question = QuestionLocal::blank("q-1", "s-1");
        question.time_limit_seconds = Some(30);

        let untouched: QuestionUpdate = serde_json::from_str(r#"{"points": 5}"#).unwrap();
        untouched.apply(&mut question);
        assert_eq!(question.time_limit_seconds, Some(30));
        assert_eq!(question.points, 5);

        let cleared: QuestionUpdate =
            serde_json::from_str(r#"{"time_limit_seconds": null}"#).unwrap();
        cleared.apply(&mut question);
        assert_eq!(question.time_limit_seconds, None);
    }
}
