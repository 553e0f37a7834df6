use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Debug, Clone, Copy, Eq, Hash, Deserialize, PartialEq, PartialOrd, Ord)]
pub struct QuestionId(pub i32);

/// The `question_type` discriminator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    YesNo,
    SingleChoice,
    MultiChoice,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::Text,
        QuestionType::YesNo,
        QuestionType::SingleChoice,
        QuestionType::MultiChoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::YesNo => "yes_no",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::MultiChoice => "multi_choice",
        }
    }

    /// Variant fields that must be present for this type.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            QuestionType::Text => &["correct_text"],
            QuestionType::YesNo => &["correct_boolean"],
            QuestionType::SingleChoice => &["options", "correct_option_index"],
            QuestionType::MultiChoice => &["options", "correct_option_indices"],
        }
    }

    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            QuestionType::YesNo => &["following_question_id"],
            _ => &[],
        }
    }

    pub fn allows(&self, field: &str) -> bool {
        self.required_fields().contains(&field) || self.optional_fields().contains(&field)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuestionType(pub String);

impl FromStr for QuestionType {
    type Err = UnknownQuestionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionType::ALL
            .into_iter()
            .find(|question_type| question_type.as_str() == s)
            .ok_or_else(|| UnknownQuestionType(s.to_owned()))
    }
}

/// Variant-specific part of a question. Serialized flat next to the
/// common fields, with `question_type` as the tag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "question_type", rename_all = "snake_case")]
pub enum QuestionKind {
    Text {
        correct_text: String,
    },
    YesNo {
        correct_boolean: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        following_question_id: Option<QuestionId>,
    },
    SingleChoice {
        options: Vec<String>,
        correct_option_index: i32,
    },
    MultiChoice {
        options: Vec<String>,
        correct_option_indices: Vec<i32>,
    },
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Text { .. } => QuestionType::Text,
            QuestionKind::YesNo { .. } => QuestionType::YesNo,
            QuestionKind::SingleChoice { .. } => QuestionType::SingleChoice,
            QuestionKind::MultiChoice { .. } => QuestionType::MultiChoice,
        }
    }
}

#[derive(Serialize, Debug, Deserialize, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub question_text: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated question that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question_text: String,
    pub kind: QuestionKind,
}

/// Request body for create and update, as it arrives on the wire.
///
/// Every field is kept as raw JSON so that validation can report all
/// problems at once, wrongly typed values included, instead of failing
/// on the first bad key. Keys that are not question fields at all end
/// up in `unknown`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct QuestionPayload {
    pub question_text: Option<Value>,
    pub question_type: Option<Value>,
    pub options: Option<Value>,
    pub correct_text: Option<Value>,
    pub correct_boolean: Option<Value>,
    pub correct_option_index: Option<Value>,
    pub correct_option_indices: Option<Value>,
    pub following_question_id: Option<Value>,
    #[serde(flatten)]
    pub unknown: BTreeMap<String, Value>,
}

impl QuestionPayload {
    /// Names of the variant fields that carry a value.
    pub fn present_variant_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.options.is_some() {
            fields.push("options");
        }
        if self.correct_text.is_some() {
            fields.push("correct_text");
        }
        if self.correct_boolean.is_some() {
            fields.push("correct_boolean");
        }
        if self.correct_option_index.is_some() {
            fields.push("correct_option_index");
        }
        if self.correct_option_indices.is_some() {
            fields.push("correct_option_indices");
        }
        if self.following_question_id.is_some() {
            fields.push("following_question_id");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_serializes_with_flat_variant_fields() {
        let created = "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let question = Question {
            id: QuestionId(4),
            question_text: "Is Rust memory safe?".to_string(),
            kind: QuestionKind::YesNo {
                correct_boolean: true,
                following_question_id: None,
            },
            created_at: created,
            updated_at: created,
        };

        let value = serde_json::to_value(&question).unwrap();

        assert_eq!(
            value,
            json!({
                "id": 4,
                "question_text": "Is Rust memory safe?",
                "question_type": "yes_no",
                "correct_boolean": true,
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:00:00Z",
            })
        );
    }

    #[test]
    fn payload_collects_keys_it_does_not_know() {
        let payload: QuestionPayload = serde_json::from_value(json!({
            "question_text": "Capital of France?",
            "question_type": "text",
            "correct_text": "Paris",
            "hint": "starts with P",
        }))
        .unwrap();

        assert_eq!(payload.correct_text, Some(json!("Paris")));
        assert_eq!(payload.present_variant_fields(), vec!["correct_text"]);
        assert_eq!(payload.unknown.keys().collect::<Vec<_>>(), vec!["hint"]);
    }

    #[test]
    fn question_type_parses_wire_names_only() {
        assert_eq!(
            "multi_choice".parse::<QuestionType>(),
            Ok(QuestionType::MultiChoice)
        );
        assert!("MultiChoice".parse::<QuestionType>().is_err());
        assert!(QuestionType::YesNo.allows("following_question_id"));
        assert!(!QuestionType::Text.allows("options"));
    }
}
