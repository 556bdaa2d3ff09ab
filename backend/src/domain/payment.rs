//! Amounts, payment proofs and the append-only payment ledger entry.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ClassId, Email, SelectionId};

/// Money in minor units (US cents).
///
/// # Examples
/// ```
/// use enrollment::domain::Amount;
///
/// assert_eq!(Amount::from_cents(5000).to_string(), "50.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    /// Amount of `cents` minor units.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Value in minor units.
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Ledger entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Wrap an existing ledger entry id.
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

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Client-supplied evidence that the payment provider confirmed a charge.
///
/// The coordinator trusts the provider's client-side confirmation; the
/// `transaction_id` is recorded for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    /// Provider reference, e.g. a Stripe payment intent id.
    #[schema(example = "pi_3NxYz")]
    pub transaction_id: String,
    /// Amount charged, in cents.
    #[schema(value_type = u64, example = 5000)]
    pub amount: Amount,
}

/// A completed payment. Created exactly once per committed selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Ledger entry id.
    #[schema(value_type = String, format = Uuid)]
    pub id: PaymentId,
    /// Paying student.
    #[schema(value_type = String)]
    pub student_email: Email,
    /// Class paid for.
    #[schema(value_type = String, format = Uuid)]
    pub class_id: ClassId,
    /// Amount charged, in cents.
    #[schema(value_type = u64)]
    pub amount: Amount,
    /// The consumed selection; unique across the ledger.
    #[schema(value_type = String, format = Uuid)]
    pub selection_id: SelectionId,
    /// Provider reference copied from the payment proof.
    pub transaction_id: String,
    /// When the commit recorded the payment.
    pub paid_at: DateTime<Utc>,
}
