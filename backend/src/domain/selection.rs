//! Pending class selections awaiting payment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Amount, ClassId, ClassOffering, Email};

/// Selection identifier; doubles as the idempotency key of its commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionId(Uuid);

impl SelectionId {
    /// Wrap an existing selection id.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// A fresh random (v4) id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SelectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SelectionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A student's uncommitted intent to enroll in a class.
///
/// `price` is a snapshot taken at selection time; later price changes on the
/// class do not affect what the student is charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Selection id; also the idempotency key of its commit.
    #[schema(value_type = String, format = Uuid)]
    pub id: SelectionId,
    /// Student who made the selection.
    #[schema(value_type = String)]
    pub student_email: Email,
    /// Selected class.
    #[schema(value_type = String, format = Uuid)]
    pub class_id: ClassId,
    /// Class name at selection time.
    pub class_name: String,
    /// Price at selection time, in cents.
    #[schema(value_type = u64)]
    pub price: Amount,
    pub created_at: DateTime<Utc>,
}

impl Selection {
    /// Snapshot `class` for `student` at `now`.
    pub fn snapshot(student_email: Email, class: &ClassOffering, now: DateTime<Utc>) -> Self {
        Self {
            id: SelectionId::random(),
            student_email,
            class_id: class.id(),
            class_name: class.name().to_owned(),
            price: class.price(),
            created_at: now,
        }
    }

    /// Whether `student` made this selection.
    pub fn is_owned_by(&self, student: &Email) -> bool {
        &self.student_email == student
    }
}
