use regex::Regex;
use serde::Serialize;

use crate::answers::{AnswerSet, AnswerValue, Entry};
use crate::spec::catalog::Catalog;
use crate::spec::question::{QuestionKind, QuestionSpec};
use crate::visibility::resolve_visibility;

/// Problem found for a single answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub question_id: String,
    pub path: String,
    pub message: String,
    pub code: String,
}

/// Outcome of checking a whole answer set against a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
}

/// Checks saved answers, e.g. before rendering a document from them.
///
/// Questions hidden by an unmet dependency are not required.
pub fn validate(catalog: &Catalog, answers: &AnswerSet) -> ValidationResult {
    let visibility = resolve_visibility(catalog, answers);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for question in &catalog.questions {
        if !visibility.get(&question.id).copied().unwrap_or(true) {
            continue;
        }

        match answers.get(&question.id) {
            None => {
                if question.required {
                    missing_required.push(question.id.clone());
                }
            }
            Some(value) => {
                if let Some(error) = validate_value(question, value) {
                    errors.push(error);
                } else if question.required && value.is_empty() {
                    missing_required.push(question.id.clone());
                }
            }
        }
    }

    let unknown_fields: Vec<String> = answers
        .iter()
        .map(|(key, _)| key)
        .filter(|key| catalog.question(key).is_none())
        .map(str::to_string)
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn validate_value(question: &QuestionSpec, value: &AnswerValue) -> Option<ValidationError> {
    if !matches_kind(question.kind, value) {
        return Some(base_error(question, "type mismatch", "type_mismatch"));
    }

    if let (Some(pattern), Some(text)) = (&question.pattern, value.as_text())
        && !text.trim().is_empty()
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text.trim())
    {
        return Some(base_error(
            question,
            "value does not match pattern",
            "pattern_mismatch",
        ));
    }

    if question.kind == QuestionKind::Block
        && let Some(entries) = value.as_list()
    {
        for entry in entries {
            let Some(record) = entry.as_record() else {
                continue;
            };
            if let Some(step) = question
                .steps
                .iter()
                .find(|step| step.required && record.non_empty(&step.id).is_none())
            {
                return Some(ValidationError {
                    question_id: question.id.clone(),
                    path: format!("/{}/{}", question.id, step.id),
                    message: format!("entry is missing '{}'", step.id),
                    code: "incomplete_record".into(),
                });
            }
        }
    }

    None
}

fn matches_kind(kind: QuestionKind, value: &AnswerValue) -> bool {
    match (kind, value) {
        (QuestionKind::Text, AnswerValue::Text(_)) => true,
        (QuestionKind::Image, AnswerValue::Text(text)) => {
            text.is_empty() || text.starts_with("data:image")
        }
        (QuestionKind::Block, AnswerValue::List(entries)) => {
            entries.iter().all(|entry| matches!(entry, Entry::Record(_)))
        }
        (QuestionKind::Lines, AnswerValue::List(entries)) => {
            entries.iter().all(|entry| matches!(entry, Entry::Line(_)))
        }
        _ => false,
    }
}

fn base_error(question: &QuestionSpec, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: question.id.clone(),
        path: format!("/{}", question.id),
        message: message.into(),
        code: code.into(),
    }
}
