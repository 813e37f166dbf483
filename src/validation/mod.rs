//! Schema validation for `POST /send-email` bodies.
//!
//! Rules:
//! - `to`: required string, valid email address with a dotted domain that the
//!   mail builder also accepts
//! - `subject`: required string, at least 3 characters
//! - `template`: required, non-empty string
//! - `variables`: optional object of any shape
//!
//! An empty body is treated as `{}`. Unknown top-level keys are rejected.
//! Every failing field is reported, not only the first.

use lettre::Address;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use validator::ValidateEmail;

use crate::email::SendEmailRequest;

const SUBJECT_MIN_CHARS: usize = 3;

const KNOWN_FIELDS: [&str; 4] = ["to", "subject", "template", "variables"];

/// A single failing field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// All field errors found in one body
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Validation failed: {}", summary(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn details(&self) -> &[FieldError] {
        &self.0
    }
}

/// Parse raw bytes as JSON and validate the result
pub fn validate_json(body: &[u8]) -> Result<SendEmailRequest, ValidationErrors> {
    if body.is_empty() {
        return validate(&Value::Object(Map::new()));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        ValidationErrors(vec![FieldError::new("body", format!("invalid JSON: {}", e))])
    })?;
    validate(&value)
}

/// Validate a decoded body and normalize it into a [`SendEmailRequest`]
pub fn validate(body: &Value) -> Result<SendEmailRequest, ValidationErrors> {
    let Value::Object(fields) = body else {
        return Err(ValidationErrors(vec![FieldError::new(
            "body",
            "\"value\" must be of type object",
        )]));
    };

    let mut errors = Vec::new();

    let to = required_string(fields, "to", &mut errors).filter(|to| {
        let valid = is_valid_email(to);
        if !valid {
            errors.push(FieldError::new("to", "\"to\" must be a valid email"));
        }
        valid
    });

    let subject = required_string(fields, "subject", &mut errors).filter(|subject| {
        let long_enough = subject.chars().count() >= SUBJECT_MIN_CHARS;
        if !long_enough {
            errors.push(FieldError::new(
                "subject",
                format!(
                    "\"subject\" length must be at least {} characters long",
                    SUBJECT_MIN_CHARS
                ),
            ));
        }
        long_enough
    });

    let template = required_string(fields, "template", &mut errors);

    let variables = match fields.get("variables") {
        None => Some(Map::new()),
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            errors.push(FieldError::new(
                "variables",
                "\"variables\" must be of type object",
            ));
            None
        }
    };

    for key in fields.keys().filter(|k| !KNOWN_FIELDS.contains(&k.as_str())) {
        errors.push(FieldError::new(key, format!("\"{}\" is not allowed", key)));
    }

    match (to, subject, template, variables) {
        (Some(to), Some(subject), Some(template), Some(variables)) if errors.is_empty() => {
            Ok(SendEmailRequest {
                to,
                subject,
                template,
                variables,
            })
        }
        _ => Err(ValidationErrors(errors)),
    }
}

/// Accepts only addresses that both `validator` and `lettre` parse, with a
/// domain of at least two labels ending in a plausible TLD.
fn is_valid_email(address: &str) -> bool {
    if !address.validate_email() {
        return false;
    }
    let Ok(parsed) = address.parse::<Address>() else {
        return false;
    };

    let labels: Vec<&str> = parsed.domain().split('.').collect();
    let Some(tld) = labels.last() else {
        return false;
    };

    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && tld.len() >= 2
        && tld.starts_with(|c: char| c.is_ascii_alphabetic())
        && tld.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn required_string(
    fields: &Map<String, Value>,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match fields.get(name) {
        None => {
            errors.push(FieldError::new(name, format!("\"{}\" is required", name)));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(FieldError::new(
                name,
                format!("\"{}\" is not allowed to be empty", name),
            ));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new(
                name,
                format!("\"{}\" must be a string", name),
            ));
            None
        }
    }
}
