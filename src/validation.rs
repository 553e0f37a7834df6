//! Conversion from wire payloads to validated domain values.
//!
//! Every rule is checked, so a rejected payload reports all of its
//! problems in one response.

use std::collections::HashSet;

use handle_errors::FieldError;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::question::{
    NewQuestion, QuestionId, QuestionKind, QuestionPayload, QuestionType,
};
use crate::types::questionnaire::NewQuestionnaire;

pub const MIN_QUESTION_TEXT_LENGTH: usize = 1;
pub const MAX_QUESTION_TEXT_LENGTH: usize = 500;
pub const MAX_CORRECT_TEXT_LENGTH: usize = 500;
pub const MAX_OPTION_LENGTH: usize = 255;
pub const MIN_SINGLE_CHOICE_OPTIONS: usize = 2;
pub const MIN_MULTI_CHOICE_OPTIONS: usize = 3;
pub const MIN_MULTI_CHOICE_CORRECT_ANSWERS: usize = 2;

pub const MIN_TITLE_LENGTH: usize = 1;
pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

#[derive(Debug, Default)]
struct Violations(Vec<FieldError>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(self.0),
        }
    }
}

/// Validates a create or update payload and turns it into a `NewQuestion`.
///
/// The payload must satisfy the full contract of the `question_type` it
/// names; nothing is merged from a previously stored version.
pub fn validate_question(payload: QuestionPayload) -> Result<NewQuestion, Vec<FieldError>> {
    let mut violations = Violations::default();
    let present = payload.present_variant_fields();

    let QuestionPayload {
        question_text,
        question_type,
        options,
        correct_text,
        correct_boolean,
        correct_option_index,
        correct_option_indices,
        following_question_id,
        unknown,
    } = payload;

    let question_text: Option<String> = match question_text {
        Some(value) => decode("question_text", value, "a string", &mut violations),
        None => {
            violations.push("question_text", "field required");
            None
        }
    };
    if let Some(text) = &question_text {
        let length = text.chars().count();
        if !(MIN_QUESTION_TEXT_LENGTH..=MAX_QUESTION_TEXT_LENGTH).contains(&length) {
            violations.push(
                "question_text",
                format!(
                    "must be between {} and {} characters",
                    MIN_QUESTION_TEXT_LENGTH, MAX_QUESTION_TEXT_LENGTH
                ),
            );
        }
    }

    let question_type = match question_type {
        Some(Value::String(name)) => match name.parse::<QuestionType>() {
            Ok(question_type) => Some(question_type),
            Err(_) => {
                violations.push(
                    "question_type",
                    format!(
                        "must be one of: {}",
                        QuestionType::ALL.map(|t| t.as_str()).join(", ")
                    ),
                );
                None
            }
        },
        Some(_) => {
            violations.push("question_type", "must be a string");
            None
        }
        None => {
            violations.push("question_type", "field required");
            None
        }
    };

    for field in unknown.keys() {
        violations.push(field.as_str(), "unknown field");
    }

    let kind = question_type.and_then(|question_type| {
        check_field_set(question_type, &present, &mut violations);

        match question_type {
            QuestionType::Text => {
                let correct_text =
                    decode_present("correct_text", correct_text, "a string", &mut violations);
                text_kind(correct_text, &mut violations)
            }
            QuestionType::YesNo => {
                let correct_boolean = decode_present(
                    "correct_boolean",
                    correct_boolean,
                    "a boolean",
                    &mut violations,
                );
                let following_question_id = decode_present(
                    "following_question_id",
                    following_question_id,
                    "an integer",
                    &mut violations,
                );
                Some(QuestionKind::YesNo {
                    correct_boolean: correct_boolean?,
                    following_question_id: following_question_id.map(QuestionId),
                })
            }
            QuestionType::SingleChoice => {
                let options =
                    decode_present("options", options, "a list of strings", &mut violations);
                let correct_option_index = decode_present(
                    "correct_option_index",
                    correct_option_index,
                    "an integer",
                    &mut violations,
                );
                single_choice_kind(options, correct_option_index, &mut violations)
            }
            QuestionType::MultiChoice => {
                let options =
                    decode_present("options", options, "a list of strings", &mut violations);
                let correct_option_indices = decode_present(
                    "correct_option_indices",
                    correct_option_indices,
                    "a list of integers",
                    &mut violations,
                );
                multi_choice_kind(options, correct_option_indices, &mut violations)
            }
        }
    });

    let question = question_text
        .zip(kind)
        .map(|(question_text, kind)| NewQuestion {
            question_text,
            kind,
        });

    violations.finish(question)
}

/// Converts one raw JSON value, recording a violation when it has the
/// wrong shape.
fn decode<T: DeserializeOwned>(
    field: &str,
    value: Value,
    expected: &str,
    violations: &mut Violations,
) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(value) => Some(value),
        Err(_) => {
            violations.push(field, format!("must be {}", expected));
            None
        }
    }
}

/// Like `decode`, for variant fields whose absence `check_field_set`
/// has already reported.
fn decode_present<T: DeserializeOwned>(
    field: &str,
    value: Option<Value>,
    expected: &str,
    violations: &mut Violations,
) -> Option<T> {
    decode(field, value?, expected, violations)
}

/// Reports missing required fields and fields that belong to another variant.
fn check_field_set(question_type: QuestionType, present: &[&str], violations: &mut Violations) {
    for field in question_type.required_fields() {
        if !present.contains(field) {
            violations.push(
                *field,
                format!("field required for {} questions", question_type),
            );
        }
    }

    for field in present {
        if !question_type.allows(field) {
            violations.push(
                *field,
                format!("not allowed for {} questions", question_type),
            );
        }
    }
}

fn text_kind(correct_text: Option<String>, violations: &mut Violations) -> Option<QuestionKind> {
    let correct_text = correct_text?;
    if correct_text.is_empty() {
        violations.push("correct_text", "must not be empty");
    } else if correct_text.chars().count() > MAX_CORRECT_TEXT_LENGTH {
        violations.push(
            "correct_text",
            format!("must be at most {} characters", MAX_CORRECT_TEXT_LENGTH),
        );
    }
    Some(QuestionKind::Text { correct_text })
}

fn single_choice_kind(
    options: Option<Vec<String>>,
    correct_option_index: Option<i32>,
    violations: &mut Violations,
) -> Option<QuestionKind> {
    if let Some(options) = &options {
        check_options(
            options,
            MIN_SINGLE_CHOICE_OPTIONS,
            QuestionType::SingleChoice,
            violations,
        );
        if let Some(index) = correct_option_index {
            if !index_in_range(index, options.len()) {
                violations.push(
                    "correct_option_index",
                    out_of_range_message(index, options.len()),
                );
            }
        }
    }

    Some(QuestionKind::SingleChoice {
        options: options?,
        correct_option_index: correct_option_index?,
    })
}

fn multi_choice_kind(
    options: Option<Vec<String>>,
    correct_option_indices: Option<Vec<i32>>,
    violations: &mut Violations,
) -> Option<QuestionKind> {
    if let Some(options) = &options {
        check_options(
            options,
            MIN_MULTI_CHOICE_OPTIONS,
            QuestionType::MultiChoice,
            violations,
        );
    }

    if let Some(indices) = &correct_option_indices {
        if indices.len() < MIN_MULTI_CHOICE_CORRECT_ANSWERS {
            violations.push(
                "correct_option_indices",
                format!(
                    "multi_choice questions need at least {} correct options",
                    MIN_MULTI_CHOICE_CORRECT_ANSWERS
                ),
            );
        }

        let mut seen = HashSet::new();
        if !indices.iter().all(|index| seen.insert(*index)) {
            violations.push("correct_option_indices", "must not contain duplicates");
        }

        if let Some(options) = &options {
            for index in indices {
                if !index_in_range(*index, options.len()) {
                    violations.push(
                        "correct_option_indices",
                        out_of_range_message(*index, options.len()),
                    );
                }
            }
        }
    }

    Some(QuestionKind::MultiChoice {
        options: options?,
        correct_option_indices: correct_option_indices?,
    })
}

fn check_options(
    options: &[String],
    minimum: usize,
    question_type: QuestionType,
    violations: &mut Violations,
) {
    if options.len() < minimum {
        violations.push(
            "options",
            format!(
                "{} questions need at least {} options",
                question_type, minimum
            ),
        );
    }

    for (position, option) in options.iter().enumerate() {
        if option.chars().count() > MAX_OPTION_LENGTH {
            violations.push(
                format!("options[{}]", position),
                format!("must be at most {} characters", MAX_OPTION_LENGTH),
            );
        }
    }
}

fn index_in_range(index: i32, len: usize) -> bool {
    usize::try_from(index).is_ok_and(|index| index < len)
}

fn out_of_range_message(index: i32, len: usize) -> String {
    format!("index {} is out of range for {} options", index, len)
}

/// Checks the rules a questionnaire can satisfy on its own. Whether the
/// referenced questions exist is up to the store.
pub fn validate_questionnaire(
    questionnaire: NewQuestionnaire,
) -> Result<NewQuestionnaire, Vec<FieldError>> {
    let mut violations = Violations::default();

    let title_length = questionnaire.title.chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&title_length) {
        violations.push(
            "title",
            format!(
                "must be between {} and {} characters",
                MIN_TITLE_LENGTH, MAX_TITLE_LENGTH
            ),
        );
    }

    if let Some(description) = &questionnaire.description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            violations.push(
                "description",
                format!("must be at most {} characters", MAX_DESCRIPTION_LENGTH),
            );
        }
    }

    let mut seen = HashSet::new();
    if !questionnaire.question_ids.iter().all(|id| seen.insert(*id)) {
        violations.push("question_ids", "must not contain duplicates");
    }

    violations.finish(Some(questionnaire))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn validate(body: Value) -> Result<NewQuestion, Vec<FieldError>> {
        validate_question(serde_json::from_value(body).unwrap())
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn accepts_minimal_payload_for_every_variant() {
        let text = validate(json!({
            "question_text": "Capital of France?",
            "question_type": "text",
            "correct_text": "Paris",
        }))
        .unwrap();
        assert_eq!(
            text.kind,
            QuestionKind::Text {
                correct_text: "Paris".to_string()
            }
        );

        let yes_no = validate(json!({
            "question_text": "Is water wet?",
            "question_type": "yes_no",
            "correct_boolean": false,
            "following_question_id": 12,
        }))
        .unwrap();
        assert_eq!(
            yes_no.kind,
            QuestionKind::YesNo {
                correct_boolean: false,
                following_question_id: Some(QuestionId(12)),
            }
        );

        let single = validate(json!({
            "question_text": "2 + 2?",
            "question_type": "single_choice",
            "options": ["3", "4"],
            "correct_option_index": 1,
        }))
        .unwrap();
        assert_eq!(single.kind.question_type(), QuestionType::SingleChoice);

        let multi = validate(json!({
            "question_text": "Pick the primes",
            "question_type": "multi_choice",
            "options": ["2", "4", "7"],
            "correct_option_indices": [0, 2],
        }))
        .unwrap();
        assert_eq!(multi.kind.question_type(), QuestionType::MultiChoice);
    }

    #[test]
    fn rejects_fields_of_other_variants() {
        let errors = validate(json!({
            "question_text": "Capital of France?",
            "question_type": "text",
            "correct_text": "Paris",
            "options": ["Paris", "Rome"],
            "correct_boolean": true,
        }))
        .unwrap_err();

        assert_eq!(fields(&errors), vec!["options", "correct_boolean"]);
        assert_eq!(errors[0].message, "not allowed for text questions");
    }

    #[test]
    fn rejects_keys_that_are_not_question_fields() {
        let errors = validate(json!({
            "question_text": "Capital of France?",
            "question_type": "text",
            "correct_text": "Paris",
            "id": 3,
        }))
        .unwrap_err();

        assert_eq!(errors, vec![FieldError::new("id", "unknown field")]);
    }

    #[test]
    fn single_choice_index_must_be_below_option_count() {
        let payload = |index: i32| {
            json!({
                "question_text": "2 + 2?",
                "question_type": "single_choice",
                "options": ["3", "4", "5"],
                "correct_option_index": index,
            })
        };

        assert!(validate(payload(2)).is_ok());
        assert_eq!(
            validate(payload(3)).unwrap_err(),
            vec![FieldError::new(
                "correct_option_index",
                "index 3 is out of range for 3 options"
            )]
        );
        assert!(validate(payload(-1)).is_err());
    }

    #[test]
    fn single_choice_needs_two_options() {
        let errors = validate(json!({
            "question_text": "Only one way",
            "question_type": "single_choice",
            "options": ["yes"],
            "correct_option_index": 0,
        }))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![FieldError::new(
                "options",
                "single_choice questions need at least 2 options"
            )]
        );
    }

    #[test]
    fn multi_choice_rejects_duplicate_indices() {
        let errors = validate(json!({
            "question_text": "Pick the primes",
            "question_type": "multi_choice",
            "options": ["2", "4", "7"],
            "correct_option_indices": [0, 0],
        }))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![FieldError::new(
                "correct_option_indices",
                "must not contain duplicates"
            )]
        );
    }

    #[test]
    fn multi_choice_reports_every_broken_rule() {
        let errors = validate(json!({
            "question_text": "Pick the primes",
            "question_type": "multi_choice",
            "options": ["2", "4"],
            "correct_option_indices": [5],
        }))
        .unwrap_err();

        assert_eq!(
            fields(&errors),
            vec!["options", "correct_option_indices", "correct_option_indices"]
        );
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let errors = validate(json!({ "question_type": "yes_no" })).unwrap_err();

        assert_eq!(
            errors,
            vec![
                FieldError::new("question_text", "field required"),
                FieldError::new("correct_boolean", "field required for yes_no questions"),
            ]
        );
    }

    #[test]
    fn question_text_length_is_counted_in_characters() {
        let long = "é".repeat(MAX_QUESTION_TEXT_LENGTH);
        let accepted = validate(json!({
            "question_text": long,
            "question_type": "yes_no",
            "correct_boolean": true,
        }));
        assert!(accepted.is_ok());

        let errors = validate(json!({
            "question_text": "",
            "question_type": "yes_no",
            "correct_boolean": true,
        }))
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["question_text"]);
    }

    #[test]
    fn question_text_upper_limit() {
        let payload = |length: usize| {
            json!({
                "question_text": "q".repeat(length),
                "question_type": "yes_no",
                "correct_boolean": true,
            })
        };

        assert!(validate(payload(MAX_QUESTION_TEXT_LENGTH)).is_ok());
        assert_eq!(
            validate(payload(MAX_QUESTION_TEXT_LENGTH + 1)).unwrap_err(),
            vec![FieldError::new(
                "question_text",
                "must be between 1 and 500 characters"
            )]
        );
    }

    #[test]
    fn correct_text_upper_limit() {
        let payload = |length: usize| {
            json!({
                "question_text": "Spell it out",
                "question_type": "text",
                "correct_text": "a".repeat(length),
            })
        };

        assert!(validate(payload(MAX_CORRECT_TEXT_LENGTH)).is_ok());
        assert_eq!(
            validate(payload(MAX_CORRECT_TEXT_LENGTH + 1)).unwrap_err(),
            vec![FieldError::new(
                "correct_text",
                "must be at most 500 characters"
            )]
        );
    }

    #[test]
    fn option_upper_limit_names_the_position() {
        let payload = |length: usize| {
            json!({
                "question_text": "Pick one",
                "question_type": "single_choice",
                "options": ["short", "o".repeat(length)],
                "correct_option_index": 0,
            })
        };

        assert!(validate(payload(MAX_OPTION_LENGTH)).is_ok());
        assert_eq!(
            validate(payload(MAX_OPTION_LENGTH + 1)).unwrap_err(),
            vec![FieldError::new(
                "options[1]",
                "must be at most 255 characters"
            )]
        );
    }

    #[test]
    fn wrongly_typed_values_are_reported_with_the_rest() {
        let errors = validate(json!({
            "question_text": "",
            "question_type": "yes_no",
            "correct_boolean": "yes",
            "options": ["a", "b"],
        }))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                FieldError::new("question_text", "must be between 1 and 500 characters"),
                FieldError::new("options", "not allowed for yes_no questions"),
                FieldError::new("correct_boolean", "must be a boolean"),
            ]
        );
    }

    #[test]
    fn wrongly_typed_choice_fields() {
        let errors = validate(json!({
            "question_text": 42,
            "question_type": "multi_choice",
            "options": "2, 4, 7",
            "correct_option_indices": [0, "two"],
        }))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                FieldError::new("question_text", "must be a string"),
                FieldError::new("options", "must be a list of strings"),
                FieldError::new("correct_option_indices", "must be a list of integers"),
            ]
        );

        let errors = validate(json!({
            "question_text": "Which type?",
            "question_type": 3,
        }))
        .unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("question_type", "must be a string")]
        );
    }

    #[test]
    fn unknown_question_type_lists_the_choices() {
        let errors = validate(json!({
            "question_text": "Essay time",
            "question_type": "essay",
        }))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![FieldError::new(
                "question_type",
                "must be one of: text, yes_no, single_choice, multi_choice"
            )]
        );
    }

    #[test]
    fn empty_correct_text_is_rejected() {
        let errors = validate(json!({
            "question_text": "Capital of France?",
            "question_type": "text",
            "correct_text": "",
        }))
        .unwrap_err();

        assert_eq!(fields(&errors), vec!["correct_text"]);
    }

    #[test]
    fn questionnaire_rules() {
        let ok = validate_questionnaire(NewQuestionnaire {
            title: "Geography".to_string(),
            description: None,
            question_ids: vec![QuestionId(1), QuestionId(2)],
        });
        assert!(ok.is_ok());

        let errors = validate_questionnaire(NewQuestionnaire {
            title: String::new(),
            description: Some("x".repeat(MAX_DESCRIPTION_LENGTH + 1)),
            question_ids: vec![QuestionId(1), QuestionId(1)],
        })
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["title", "description", "question_ids"]);
    }
}
