//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::{Amount, ClassId, Email, Error, Role, SelectionId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidEmail,
    InvalidRole,
    InvalidAmount,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidRole => "invalid_role",
            ErrorCode::InvalidAmount => "invalid_amount",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn field_error(field: FieldName, message: String, code: ErrorCode, value: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("missing required field: {name}")).with_details(json!({
        "field": name,
        "code": ErrorCode::MissingField.as_str(),
    }))
}

pub(crate) fn parse_email(value: &str, field: FieldName) -> Result<Email, Error> {
    Email::new(value).map_err(|_| {
        field_error(
            field,
            format!("{} must be an email address", field.as_str()),
            ErrorCode::InvalidEmail,
            value,
        )
    })
}

fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        field_error(
            field,
            format!("{} must be a valid UUID", field.as_str()),
            ErrorCode::InvalidUuid,
            value,
        )
    })
}

pub(crate) fn parse_class_id(value: &str, field: FieldName) -> Result<ClassId, Error> {
    parse_uuid(value, field).map(ClassId::from_uuid)
}

pub(crate) fn parse_selection_id(value: &str, field: FieldName) -> Result<SelectionId, Error> {
    parse_uuid(value, field).map(SelectionId::from_uuid)
}

pub(crate) fn parse_role(value: &str, field: FieldName) -> Result<Role, Error> {
    Role::from_str(value).map_err(|_| {
        field_error(
            field,
            format!("{} must be student, instructor or admin", field.as_str()),
            ErrorCode::InvalidRole,
            value,
        )
    })
}

/// Amounts arrive as integer cents; zero is never a valid charge.
pub(crate) fn parse_amount(cents: u64, field: FieldName) -> Result<Amount, Error> {
    if cents == 0 {
        return Err(field_error(
            field,
            format!("{} must be a positive number of cents", field.as_str()),
            ErrorCode::InvalidAmount,
            "0",
        ));
    }
    Ok(Amount::from_cents(cents))
}

/// Treat an absent or blank string as missing.
pub(crate) fn require_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| missing_field_error(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details().and_then(|d| d.get(key)).and_then(Value::as_str)
    }

    #[rstest]
    #[case("not-an-email")]
    #[case("   ")]
    fn rejects_malformed_emails(#[case] raw: &str) {
        let err = parse_email(raw, FieldName::new("email")).expect_err("invalid email");
        assert_eq!(detail(&err, "code"), Some("invalid_email"));
        assert_eq!(detail(&err, "field"), Some("email"));
    }

    #[rstest]
    fn uuid_errors_name_the_field() {
        let err = parse_selection_id("abc", FieldName::new("selectionId")).expect_err("bad uuid");
        assert_eq!(err.message(), "selectionId must be a valid UUID");
        assert_eq!(detail(&err, "value"), Some("abc"));
    }

    #[rstest]
    #[case("student", Role::Student)]
    #[case("admin", Role::Admin)]
    fn parses_known_roles(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(parse_role(raw, FieldName::new("role")).ok(), Some(expected));
    }

    #[rstest]
    fn rejects_unknown_roles() {
        let err = parse_role("owner", FieldName::new("role")).expect_err("unknown role");
        assert_eq!(detail(&err, "code"), Some("invalid_role"));
    }

    #[rstest]
    fn zero_amount_is_invalid() {
        assert!(parse_amount(0, FieldName::new("amount")).is_err());
        assert_eq!(
            parse_amount(5000, FieldName::new("amount")).ok(),
            Some(Amount::from_cents(5000))
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some("  ".to_owned()))]
    fn blank_text_is_missing(#[case] value: Option<String>) {
        let err = require_text(value, FieldName::new("transactionId")).expect_err("missing");
        assert_eq!(detail(&err, "code"), Some("missing_field"));
    }
}
