//! User identity, role and the derived instructor counter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Validation errors raised while constructing user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must look like local@domain")]
    InvalidEmail,
    #[error("unknown role '{0}'; expected student, instructor or admin")]
    UnknownRole(String),
}

/// Email address used as the unique user identity.
///
/// ## Invariants
/// - Surrounding whitespace is trimmed.
/// - Exactly one `@` with non-empty local and domain parts, no inner
///   whitespace.
///
/// # Examples
/// ```
/// use enrollment::domain::Email;
///
/// let email = Email::new("  ada@example.com ").unwrap();
/// assert_eq!(email.as_ref(), "ada@example.com");
/// assert!(Email::new("not-an-email").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Access role held by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Default for self-registered users.
    Student,
    /// Owns classes and is credited per enrollment.
    Instructor,
    /// Administers roles.
    Admin,
}

impl Role {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Application user as held by the credential store.
///
/// `students` is only meaningful for instructors and stays `None` until the
/// first paid enrollment in one of their classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "ada@example.com")]
    email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    photo_url: Option<String>,
    role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    students: Option<u32>,
}

impl User {
    /// Build a user with the given identity and role.
    pub fn new(email: Email, role: Role) -> Self {
        Self {
            email,
            name: None,
            photo_url: None,
            role,
            students: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a profile photo URL.
    #[must_use]
    pub fn with_photo_url(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    /// Set the instructor student counter.
    #[must_use]
    pub fn with_students(mut self, students: u32) -> Self {
        self.students = Some(students);
        self
    }

    /// Identity key.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Display name, when provided at registration.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Avatar URL, when provided at registration.
    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Current role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Committed enrollments in this instructor's classes; `None` until the
    /// first one.
    pub fn students(&self) -> Option<u32> {
        self.students
    }

    /// Replace the role, as done by role administration.
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    /// Count one more student, creating the counter at 1 when absent.
    pub fn credit_student(&mut self) {
        self.students = Some(self.students.map_or(1, |count| count.saturating_add(1)));
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case("   ", UserValidationError::EmptyEmail)]
    #[case("ada", UserValidationError::InvalidEmail)]
    #[case("@example.com", UserValidationError::InvalidEmail)]
    #[case("ada@", UserValidationError::InvalidEmail)]
    #[case("ada@x@y", UserValidationError::InvalidEmail)]
    #[case("ada lovelace@example.com", UserValidationError::InvalidEmail)]
    fn rejects_malformed_emails(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Email::new(raw).expect_err("must fail"), expected);
    }

    #[rstest]
    #[case("student", Role::Student)]
    #[case("instructor", Role::Instructor)]
    #[case("admin", Role::Admin)]
    fn role_parses_storage_names(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(raw.parse::<Role>().expect("known role"), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[test]
    fn role_rejects_unknown_names() {
        assert!("tutor".parse::<Role>().is_err());
    }

    #[test]
    fn credit_student_creates_then_increments_counter() {
        let mut user = User::new(Email::new("ins@example.com").expect("email"), Role::Instructor);
        assert_eq!(user.students(), None);
        user.credit_student();
        assert_eq!(user.students(), Some(1));
        user.credit_student();
        assert_eq!(user.students(), Some(2));
    }

    #[test]
    fn deserialises_camel_case_payload() {
        let user: User = serde_json::from_str(
            r#"{"email":"ada@example.com","name":"Ada","photoUrl":"https://img","role":"admin"}"#,
        )
        .expect("valid payload");
        assert_eq!(user.role(), Role::Admin);
        assert_eq!(user.photo_url(), Some("https://img"));
        assert_eq!(user.students(), None);
    }
}
