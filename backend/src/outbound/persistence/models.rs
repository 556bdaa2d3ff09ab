//! Internal Diesel row structs and their conversions to domain values.
//!
//! Rows never leave the persistence layer. Conversions fail with a message
//! when stored data no longer satisfies domain validation; adapters turn that
//! message into their port's `Query` error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{classes, payments, selections, users};
use crate::domain::{
    Amount, ClassId, ClassOffering, ClassOfferingParts, ClassStatus, Email, PaymentId,
    PaymentRecord, Role, Selection, SelectionId, User,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub students: Option<i32>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub name: Option<&'a str>,
    pub photo_url: Option<&'a str>,
    pub role: &'a str,
}

impl<'a> From<&'a User> for NewUserRow<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            email: user.email().as_ref(),
            name: user.name(),
            photo_url: user.photo_url(),
            role: user.role().as_str(),
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::new(&row.email).map_err(|e| format!("stored email invalid: {e}"))?;
        let role: Role = row
            .role
            .parse()
            .map_err(|e| format!("stored role invalid: {e}"))?;
        let mut user = User::new(email, role);
        if let Some(name) = row.name {
            user = user.with_name(name);
        }
        if let Some(photo_url) = row.photo_url {
            user = user.with_photo_url(photo_url);
        }
        if let Some(students) = row.students {
            let students =
                u32::try_from(students).map_err(|_| format!("negative student count {students}"))?;
            user = user.with_students(students);
        }
        Ok(user)
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = classes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ClassRow {
    pub id: Uuid,
    pub name: String,
    pub instructor_email: String,
    pub price_cents: i64,
    pub capacity: i32,
    pub available_seats: i32,
    pub enrolled: i32,
    pub status: String,
}

fn counter(value: i32, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{column} is negative: {value}"))
}

fn cents(value: i64, column: &str) -> Result<Amount, String> {
    u64::try_from(value)
        .map(Amount::from_cents)
        .map_err(|_| format!("{column} is negative: {value}"))
}

/// Convert an amount into its `BIGINT` column value.
pub(crate) fn cents_column(amount: Amount) -> Result<i64, String> {
    i64::try_from(amount.cents()).map_err(|_| format!("amount {amount} out of range"))
}

impl TryFrom<ClassRow> for ClassOffering {
    type Error = String;

    fn try_from(row: ClassRow) -> Result<Self, Self::Error> {
        let status: ClassStatus = row
            .status
            .parse()
            .map_err(|e| format!("stored status invalid: {e}"))?;
        ClassOffering::from_parts(ClassOfferingParts {
            id: ClassId::from_uuid(row.id),
            name: row.name,
            instructor_email: Email::new(&row.instructor_email)
                .map_err(|e| format!("stored instructor email invalid: {e}"))?,
            price: cents(row.price_cents, "price_cents")?,
            capacity: counter(row.capacity, "capacity")?,
            available_seats: counter(row.available_seats, "available_seats")?,
            enrolled: counter(row.enrolled, "enrolled")?,
            status,
        })
        .map_err(|e| format!("stored class invalid: {e}"))
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = selections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SelectionRow {
    pub id: Uuid,
    pub student_email: String,
    pub class_id: Uuid,
    pub class_name: String,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&Selection> for SelectionRow {
    type Error = String;

    fn try_from(selection: &Selection) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *selection.id.as_uuid(),
            student_email: selection.student_email.to_string(),
            class_id: *selection.class_id.as_uuid(),
            class_name: selection.class_name.clone(),
            price_cents: cents_column(selection.price)?,
            created_at: selection.created_at,
        })
    }
}

impl TryFrom<SelectionRow> for Selection {
    type Error = String;

    fn try_from(row: SelectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SelectionId::from_uuid(row.id),
            student_email: Email::new(&row.student_email)
                .map_err(|e| format!("stored student email invalid: {e}"))?,
            class_id: ClassId::from_uuid(row.class_id),
            class_name: row.class_name,
            price: cents(row.price_cents, "price_cents")?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub student_email: String,
    pub class_id: Uuid,
    pub amount_cents: i64,
    pub selection_id: Uuid,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

impl TryFrom<&PaymentRecord> for PaymentRow {
    type Error = String;

    fn try_from(record: &PaymentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: *record.id.as_uuid(),
            student_email: record.student_email.to_string(),
            class_id: *record.class_id.as_uuid(),
            amount_cents: cents_column(record.amount)?,
            selection_id: *record.selection_id.as_uuid(),
            transaction_id: record.transaction_id.clone(),
            paid_at: record.paid_at,
        })
    }
}

impl TryFrom<PaymentRow> for PaymentRecord {
    type Error = String;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PaymentId::from_uuid(row.id),
            student_email: Email::new(&row.student_email)
                .map_err(|e| format!("stored student email invalid: {e}"))?,
            class_id: ClassId::from_uuid(row.class_id),
            amount: cents(row.amount_cents, "amount_cents")?,
            selection_id: SelectionId::from_uuid(row.selection_id),
            transaction_id: row.transaction_id,
            paid_at: row.paid_at,
        })
    }
}

/// Convert every row, failing on the first invalid one.
pub(crate) fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>, String>
where
    T: TryFrom<R, Error = String>,
{
    rows.into_iter().map(T::try_from).collect()
}
