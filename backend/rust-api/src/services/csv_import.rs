//! Bulk question import from the dashboard's CSV template.
//!
//! Column layout (0-based):
//! 0 question text, 1 topic id, 2 question type, 3 difficulty level,
//! 4 points, 5 time limit (seconds), 6 explanation, 7..=10 options 1..4,
//! 11 correct answer index (1-based), 12 audio url, 13 image url, 14 video url.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    authoring::ImportWarning,
    question::{DifficultyLevel, OptionLocal, QuestionLocal, QuestionType},
};

pub const QUESTION_CSV_FILENAME: &str = "questions_template.csv";

pub const QUESTION_CSV_HEADER: [&str; 15] = [
    "Question Text",
    "Topic ID",
    "Question Type",
    "Difficulty Level",
    "Points",
    "Time Limit (seconds)",
    "Explanation",
    "Option 1",
    "Option 2",
    "Option 3",
    "Option 4",
    "Correct Answer Index",
    "Audio URL",
    "Image URL",
    "Video URL",
];

pub const QUESTION_CSV_TEMPLATE: &str = "\
Question Text,Topic ID,Question Type,Difficulty Level,Points,Time Limit (seconds),Explanation,Option 1,Option 2,Option 3,Option 4,Correct Answer Index,Audio URL,Image URL,Video URL
\"What is Newton's first law of motion?\",\"topic-id-here\",\"multiple_choice\",\"medium\",\"10\",\"60\",\"An object at rest stays at rest...\",\"An object at rest stays at rest\",\"An object in motion stays in motion\",\"Both A and B\",\"None of the above\",\"3\",\"\",\"\",\"\"
\"The Earth revolves around the Sun\",\"topic-id-here\",\"true_false\",\"easy\",\"5\",\"30\",\"The Earth orbits the Sun\",\"True\",\"False\",\"\",\"\",\"1\",\"\",\"\",\"\"
";

const COL_TEXT: usize = 0;
const COL_TOPIC: usize = 1;
const COL_TYPE: usize = 2;
const COL_LEVEL: usize = 3;
const COL_POINTS: usize = 4;
const COL_TIME_LIMIT: usize = 5;
const COL_EXPLANATION: usize = 6;
const COL_OPTIONS: std::ops::RangeInclusive<usize> = 7..=10;
const COL_CORRECT_INDEX: usize = 11;
const COL_AUDIO: usize = 12;
const COL_IMAGE: usize = 13;
const COL_VIDEO: usize = 14;

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("CSV contains no rows")]
    NoRows,
    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

#[derive(Debug, Default)]
pub struct CsvImport {
    pub questions: Vec<QuestionLocal>,
    pub warnings: Vec<ImportWarning>,
}

/// Parses the CSV and returns the drafts in row order.
pub fn parse_questions_csv(
    text: &str,
    subject_id: &str,
) -> Result<Vec<QuestionLocal>, CsvImportError> {
    parse_questions_csv_with_report(text, subject_id).map(|import| import.questions)
}

/// Like [`parse_questions_csv`], also reporting every lenient fallback applied.
pub fn parse_questions_csv_with_report(
    text: &str,
    subject_id: &str,
) -> Result<CsvImport, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut import = CsvImport::default();
    let mut saw_record = false;

    for result in reader.records() {
        let record = result.map_err(|e| CsvImportError::Malformed {
            line: e.position().map(|p| p.line()).unwrap_or_default(),
            message: e.to_string(),
        })?;
        saw_record = true;

        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(import.questions.len() + 2);
        let question = parse_row(&record, line, subject_id, &mut import.warnings);
        import.questions.push(question);
    }

    if !saw_record {
        return Err(CsvImportError::NoRows);
    }

    tracing::debug!(
        "Parsed {} questions from CSV ({} warnings)",
        import.questions.len(),
        import.warnings.len()
    );

    Ok(import)
}

fn parse_row(
    record: &csv::StringRecord,
    line: usize,
    subject_id: &str,
    warnings: &mut Vec<ImportWarning>,
) -> QuestionLocal {
    let field = move |idx: usize| record.get(idx).unwrap_or("");

    let mut warn = |name: &'static str, value: &str, applied: String| {
        tracing::warn!(
            "CSV line {}: invalid {} {:?}, using {}",
            line,
            name,
            value,
            applied
        );
        warnings.push(ImportWarning {
            row: line,
            field: name,
            value: value.to_string(),
            applied,
        });
    };

    let raw_type = field(COL_TYPE);
    let question_type = if raw_type.is_empty() {
        QuestionType::MultipleChoice
    } else {
        let (parsed, fell_back) = QuestionType::parse_lenient(raw_type);
        if fell_back {
            warn("question_type", raw_type, parsed.to_string());
        }
        parsed
    };

    let raw_level = field(COL_LEVEL);
    let difficulty = if raw_level.is_empty() {
        DifficultyLevel::Easy
    } else {
        let (parsed, fell_back) = DifficultyLevel::parse_lenient(raw_level);
        if fell_back {
            warn("difficulty_level", raw_level, parsed.to_string());
        }
        parsed
    };

    let raw_points = field(COL_POINTS);
    let points = match positive_number(raw_points) {
        Some(points) => points,
        None => {
            if !raw_points.is_empty() {
                warn("points", raw_points, "1".to_string());
            }
            1
        }
    };

    let raw_limit = field(COL_TIME_LIMIT);
    let time_limit_seconds = positive_number(raw_limit);
    if time_limit_seconds.is_none() && !raw_limit.is_empty() {
        warn("time_limit_seconds", raw_limit, "none".to_string());
    }

    let raw_index = field(COL_CORRECT_INDEX);
    let correct_index = match positive_number(raw_index) {
        Some(index) => index,
        None => {
            if !raw_index.is_empty() {
                warn("correct_answer_index", raw_index, "1".to_string());
            }
            1
        }
    };

    let mut question = QuestionLocal::blank(
        format!("csv-{}-{}", Uuid::new_v4(), line),
        subject_id.to_string(),
    );
    question.question_text = field(COL_TEXT).to_string();
    question.topic_id = field(COL_TOPIC).to_string();
    question.question_type = question_type.as_str().to_string();
    question.difficulty_level = difficulty.as_str().to_string();
    question.points = points;
    question.time_limit_seconds = time_limit_seconds;
    question.explanation = field(COL_EXPLANATION).to_string();
    question.audio_url = field(COL_AUDIO).to_string();
    question.image_url = field(COL_IMAGE).to_string();
    question.video_url = field(COL_VIDEO).to_string();

    if question_type == QuestionType::TrueFalse {
        if correct_index > 2 {
            warn("correct_answer_index", raw_index, "2 (False)".to_string());
        }
        question.set_true_false_answer(correct_index == 1);
    } else {
        question.options = COL_OPTIONS
            .map(field)
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(idx, text)| {
                let order = idx as u32 + 1;
                OptionLocal::new(text, order == correct_index, order)
            })
            .collect();
    }

    question
}

fn positive_number(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Question Text,Topic ID,Question Type,Difficulty Level,Points,Time Limit (seconds),Explanation,Option 1,Option 2,Option 3,Option 4,Correct Answer Index,Audio URL,Image URL,Video URL";

    fn csv(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn parses_multiple_choice_example_row() {
        let text = csv(&[
            r#""What is 2+2?","t1","multiple_choice","easy","1","30","","3","4","5","6","1","","","""#,
        ]);
        let questions = parse_questions_csv(&text, "subject-1").unwrap();

        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.question_text, "What is 2+2?");
        assert_eq!(q.topic_id, "t1");
        assert_eq!(q.subject_id, "subject-1");
        assert_eq!(q.question_type, "multiple_choice");
        assert_eq!(q.time_limit_seconds, Some(30));
        let texts: Vec<&str> = q.options.iter().map(|o| o.option_text.as_str()).collect();
        assert_eq!(texts, vec!["3", "4", "5", "6"]);
        assert!(q.options[0].is_correct);
        assert!(q.options[1..].iter().all(|o| !o.is_correct));
        assert!(q.id.starts_with("csv-"));
    }

    #[test]
    fn true_false_row_synthesizes_two_options() {
        let text = csv(&[
            r#""The Earth revolves around the Sun","t1","true_false","easy","5","30","","True","False","","","1","","","""#,
        ]);
        let q = &parse_questions_csv(&text, "s").unwrap()[0];

        assert_eq!(q.options.len(), 2);
        assert_eq!(q.options[0].option_text, "True");
        assert_eq!(q.options[0].display_order, 1);
        assert!(q.options[0].is_correct);
        assert_eq!(q.options[1].option_text, "False");
        assert_eq!(q.options[1].display_order, 2);
        assert!(!q.options[1].is_correct);
        assert_eq!(q.correct_answer.as_deref(), Some("true"));
    }

    #[test]
    fn true_false_index_two_marks_false() {
        let text = csv(&[r#"Sky is green,t1,true_false,easy,1,,,,,,,2,,,"#]);
        let q = &parse_questions_csv(&text, "s").unwrap()[0];
        assert!(!q.options[0].is_correct);
        assert!(q.options[1].is_correct);
        assert_eq!(q.correct_answer.as_deref(), Some("false"));
    }

    #[test]
    fn header_only_is_an_error() {
        assert!(matches!(
            parse_questions_csv(HEADER, "s"),
            Err(CsvImportError::NoRows)
        ));
        assert!(matches!(
            parse_questions_csv("", "s"),
            Err(CsvImportError::NoRows)
        ));
        assert!(matches!(
            parse_questions_csv("\n\n", "s"),
            Err(CsvImportError::NoRows)
        ));
    }

    #[test]
    fn blank_rows_are_skipped_and_order_is_preserved() {
        let text = format!(
            "{}\r\nFirst,t1,essay,easy,1,,,,,,,,,,\r\n\r\n,,,,,,,,,,,,,,\r\nSecond,t2,essay,hard,2,,,,,,,,,,\r\n",
            HEADER
        );
        let questions = parse_questions_csv(&text, "s").unwrap();
        let texts: Vec<&str> = questions
            .iter()
            .map(|q| q.question_text.as_str())
            .collect();
        assert_eq!(texts, vec!["First", "Second"]);
        assert_eq!(questions[1].difficulty_level, "hard");
    }

    #[test]
    fn unknown_type_and_level_fall_back_with_warnings() {
        let text = csv(&["Q,t1,Short_Answer,legendary,abc,xyz,,a,b,,,2,,,"]);
        let import = parse_questions_csv_with_report(&text, "s").unwrap();
        let q = &import.questions[0];

        assert_eq!(q.question_type, "multiple_choice");
        assert_eq!(q.difficulty_level, "easy");
        assert_eq!(q.points, 1);
        assert_eq!(q.time_limit_seconds, None);
        assert!(q.options[1].is_correct);

        let fields: Vec<&str> = import.warnings.iter().map(|w| w.field).collect();
        assert_eq!(
            fields,
            vec!["question_type", "difficulty_level", "points", "time_limit_seconds"]
        );
        assert!(import.warnings.iter().all(|w| w.row == 2));
    }

    #[test]
    fn case_insensitive_type_is_normalized() {
        let text = csv(&["Q,t1,ORDERING,Medium,3,,,first,second,third,,1,,,"]);
        let q = &parse_questions_csv(&text, "s").unwrap()[0];
        assert_eq!(q.question_type, "ordering");
        assert_eq!(q.difficulty_level, "medium");
        assert_eq!(q.points, 3);
        assert_eq!(q.options.len(), 3);
    }

    #[test]
    fn empty_option_columns_are_compacted() {
        let text = csv(&["Q,t1,multiple_choice,easy,1,,,a,,c,,2,,,"]);
        let q = &parse_questions_csv(&text, "s").unwrap()[0];
        let orders: Vec<u32> = q.options.iter().map(|o| o.display_order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(q.options[1].option_text, "c");
        assert!(q.options[1].is_correct);
    }

    #[test]
    fn quoted_commas_stay_in_one_field() {
        let text = csv(&[
            r#""Pick the primes, all of them",t1,multiple_choice,easy,1,,"2, 3 and 5","2, 3","4, 6",,,1,,https://img.example/p.png,"#,
        ]);
        let q = &parse_questions_csv(&text, "s").unwrap()[0];
        assert_eq!(q.question_text, "Pick the primes, all of them");
        assert_eq!(q.explanation, "2, 3 and 5");
        assert_eq!(q.options[0].option_text, "2, 3");
        assert_eq!(q.image_url, "https://img.example/p.png");
        assert_eq!(q.video_url, "");
    }

    #[test]
    fn short_rows_are_padded_with_defaults() {
        let text = csv(&["Only text,t9"]);
        let q = &parse_questions_csv(&text, "s").unwrap()[0];
        assert_eq!(q.topic_id, "t9");
        assert_eq!(q.question_type, "multiple_choice");
        assert_eq!(q.points, 1);
        assert!(q.options.is_empty());
    }

    #[test]
    fn template_parses_cleanly() {
        let import = parse_questions_csv_with_report(QUESTION_CSV_TEMPLATE, "s").unwrap();
        assert_eq!(import.questions.len(), 2);
        assert!(import.warnings.is_empty());
        assert_eq!(import.questions[0].options.len(), 4);
        assert!(import.questions[0].options[2].is_correct);
        assert_eq!(import.questions[1].question_type, "true_false");
        assert_eq!(QUESTION_CSV_TEMPLATE.lines().next().unwrap(), HEADER);
        assert_eq!(QUESTION_CSV_HEADER.join(","), HEADER);
    }
}
