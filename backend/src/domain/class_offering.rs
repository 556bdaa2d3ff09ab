//! Class offerings and their seat counters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Amount, Email};

/// Stable class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(Uuid);

impl ClassId {
    /// Wrap an existing class id.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// A fresh random (v4) id.
    ///
    /// ```
    /// use enrollment::domain::ClassId;
    ///
    /// let id = ClassId::random();
    /// assert_eq!(ClassId::from_uuid(*id.as_uuid()), id);
    /// assert_eq!(id.to_string().parse::<ClassId>().ok(), Some(id));
    /// ```
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

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ClassId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Review state of a class. Only approved classes are visible and selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClassStatus {
    /// Awaiting admin review.
    Pending,
    Approved,
    /// Refused by an admin; never selectable.
    Rejected,
}

impl ClassStatus {
    /// Stored and wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for ClassStatus {
    type Err = ClassValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ClassValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Errors raised when class data violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassValidationError {
    /// Name blank after trimming.
    #[error("class name must not be empty")]
    EmptyName,
    #[error(
        "enrolled ({enrolled}) + available seats ({available_seats}) must equal capacity ({capacity})"
    )]
    /// Counters do not add up to the capacity.
    SeatMismatch {
        /// Declared capacity.
        capacity: u32,
        /// Seats still open.
        available_seats: u32,
        /// Committed enrollments.
        enrolled: u32,
    },
    /// Stored status text is not one of the known values.
    #[error("unknown class status '{0}'")]
    UnknownStatus(String),
}

/// A class students can select and pay for.
///
/// ## Invariants
/// - `enrolled + available_seats == capacity` whenever the value is observed
///   outside a store transaction.
/// - `capacity` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassOffering {
    #[schema(value_type = String, format = Uuid)]
    id: ClassId,
    name: String,
    #[schema(value_type = String)]
    instructor_email: Email,
    #[schema(value_type = u64)]
    price: Amount,
    capacity: u32,
    available_seats: u32,
    enrolled: u32,
    status: ClassStatus,
}

/// Raw parts used to rebuild a class from storage.
#[derive(Debug, Clone)]
pub struct ClassOfferingParts {
    pub id: ClassId,
    pub name: String,
    /// Owning instructor, credited on each committed enrollment.
    pub instructor_email: Email,
    /// Price per seat.
    pub price: Amount,
    pub capacity: u32,
    pub available_seats: u32,
    pub enrolled: u32,
    pub status: ClassStatus,
}

impl ClassOffering {
    /// Create a fresh class with every seat available.
    pub fn new(
        name: impl Into<String>,
        instructor_email: Email,
        price: Amount,
        capacity: u32,
        status: ClassStatus,
    ) -> Result<Self, ClassValidationError> {
        Self::from_parts(ClassOfferingParts {
            id: ClassId::random(),
            name: name.into(),
            instructor_email,
            price,
            capacity,
            available_seats: capacity,
            enrolled: 0,
            status,
        })
    }

    /// Rebuild a class from stored parts, checking the seat invariant.
    pub fn from_parts(parts: ClassOfferingParts) -> Result<Self, ClassValidationError> {
        let ClassOfferingParts {
            id,
            name,
            instructor_email,
            price,
            capacity,
            available_seats,
            enrolled,
            status,
        } = parts;
        if name.trim().is_empty() {
            return Err(ClassValidationError::EmptyName);
        }
        if u64::from(available_seats) + u64::from(enrolled) != u64::from(capacity) {
            return Err(ClassValidationError::SeatMismatch {
                capacity,
                available_seats,
                enrolled,
            });
        }
        Ok(Self {
            id,
            name,
            instructor_email,
            price,
            capacity,
            available_seats,
            enrolled,
            status,
        })
    }

    /// Class identifier.
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning instructor.
    pub fn instructor_email(&self) -> &Email {
        &self.instructor_email
    }

    /// Price per seat.
    pub fn price(&self) -> Amount {
        self.price
    }

    /// Total seats; fixed at creation.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Seats not yet taken by a committed enrollment.
    pub fn available_seats(&self) -> u32 {
        self.available_seats
    }

    /// Committed enrollments.
    pub fn enrolled(&self) -> u32 {
        self.enrolled
    }

    /// Review state.
    pub fn status(&self) -> ClassStatus {
        self.status
    }

    /// Only approved classes are listed and selectable.
    pub fn is_approved(&self) -> bool {
        self.status == ClassStatus::Approved
    }

    /// At least one seat remains.
    pub fn has_free_seat(&self) -> bool {
        self.available_seats > 0
    }

    /// Whether the seat counters add up to the capacity.
    pub fn seats_balanced(&self) -> bool {
        u64::from(self.available_seats) + u64::from(self.enrolled) == u64::from(self.capacity)
    }

    pub(crate) fn increment_enrolled(&mut self) {
        self.enrolled = self.enrolled.saturating_add(1);
    }

    /// Take one seat if any is left.
    pub(crate) fn try_take_seat(&mut self) -> bool {
        match self.available_seats.checked_sub(1) {
            Some(remaining) => {
                self.available_seats = remaining;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    fn instructor() -> Email {
        Email::new("ins@example.com").expect("email")
    }

    #[test]
    fn new_class_starts_with_all_seats_available() {
        let class = ClassOffering::new(
            "Watercolour",
            instructor(),
            Amount::from_cents(5000),
            3,
            ClassStatus::Approved,
        )
        .expect("valid class");
        assert_eq!(class.available_seats(), 3);
        assert_eq!(class.enrolled(), 0);
        assert!(class.seats_balanced());
    }

    #[test]
    fn from_parts_rejects_unbalanced_counters() {
        let err = ClassOffering::from_parts(ClassOfferingParts {
            id: ClassId::random(),
            name: "Pottery".to_owned(),
            instructor_email: instructor(),
            price: Amount::from_cents(100),
            capacity: 5,
            available_seats: 3,
            enrolled: 1,
            status: ClassStatus::Approved,
        })
        .expect_err("unbalanced seats");
        assert!(matches!(err, ClassValidationError::SeatMismatch { .. }));
    }

    #[test]
    fn take_seat_stops_at_zero() {
        let mut class = ClassOffering::new(
            "Chess",
            instructor(),
            Amount::from_cents(100),
            1,
            ClassStatus::Approved,
        )
        .expect("valid class");
        assert!(class.try_take_seat());
        assert!(!class.try_take_seat());
        assert_eq!(class.available_seats(), 0);
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = ClassOffering::new(
            "  ",
            instructor(),
            Amount::from_cents(1),
            1,
            ClassStatus::Pending,
        )
        .expect_err("blank name");
        assert_eq!(err, ClassValidationError::EmptyName);
    }
}
