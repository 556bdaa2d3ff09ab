//! PostgreSQL unit of work for the enrollment commit.
//!
//! Each transaction owns one pooled connection between `BEGIN` and
//! `COMMIT`/`ROLLBACK`. Concurrency relies on three database guarantees:
//!
//! - the selection row is read `FOR UPDATE`, so a second commit of the same
//!   selection waits and then sees it gone;
//! - `payments.selection_id` is unique, so a selection is paid at most once;
//! - the seat decrement is conditional on `available_seats > 0` and
//!   re-evaluated after any competing row lock is released.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{PaymentRow, SelectionRow};
use super::pool::DbPool;
use super::schema::{classes, payments, selections};
use crate::domain::ports::{
    EnrollmentStore, EnrollmentStoreError, EnrollmentTransaction, SeatUpdate,
};
use crate::domain::{ClassId, Email, PaymentRecord, Selection, SelectionId};

const SELECTION_PAID_KEY: &str = "payments_selection_id_key";

type Tm = AnsiTransactionManager;

fn diesel_error(error: diesel::result::Error) -> EnrollmentStoreError {
    map_diesel_error(
        error,
        EnrollmentStoreError::query,
        EnrollmentStoreError::connection,
    )
}

/// Opens enrollment transactions on pooled PostgreSQL connections.
#[derive(Clone)]
pub struct DieselEnrollmentStore {
    pool: DbPool,
}

impl DieselEnrollmentStore {
    /// Commit transactions over `pool`; each holds one connection until it
    /// ends.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentStore for DieselEnrollmentStore {
    async fn begin(&self) -> Result<Box<dyn EnrollmentTransaction>, EnrollmentStoreError> {
        let mut conn = self
            .pool
            .get_owned()
            .await
            .map_err(|e| map_pool_error(e, EnrollmentStoreError::connection))?;
        <Tm as TransactionManager<AsyncPgConnection>>::begin_transaction(&mut *conn)
            .await
            .map_err(diesel_error)?;
        Ok(Box::new(DieselEnrollmentTransaction { conn }))
    }
}

struct DieselEnrollmentTransaction {
    conn: PooledConnection<'static, AsyncPgConnection>,
}

#[async_trait]
impl EnrollmentTransaction for DieselEnrollmentTransaction {
    async fn find_payment_for_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<Option<PaymentRecord>, EnrollmentStoreError> {
        let row = payments::table
            .filter(payments::selection_id.eq(*selection.as_uuid()))
            .select(PaymentRow::as_select())
            .first(&mut self.conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(PaymentRecord::try_from)
            .transpose()
            .map_err(EnrollmentStoreError::query)
    }

    async fn lock_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<Option<Selection>, EnrollmentStoreError> {
        let row = selections::table
            .find(*selection.as_uuid())
            .select(SelectionRow::as_select())
            .for_update()
            .first(&mut self.conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(Selection::try_from)
            .transpose()
            .map_err(EnrollmentStoreError::query)
    }

    async fn append_payment(&mut self, record: &PaymentRecord) -> Result<(), EnrollmentStoreError> {
        let row = PaymentRow::try_from(record).map_err(EnrollmentStoreError::query)?;
        diesel::insert_into(payments::table)
            .values(&row)
            .execute(&mut self.conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error, SELECTION_PAID_KEY) {
                    EnrollmentStoreError::duplicate_payment(record.selection_id.to_string())
                } else {
                    diesel_error(error)
                }
            })?;
        Ok(())
    }

    async fn remove_selection(
        &mut self,
        selection: SelectionId,
    ) -> Result<bool, EnrollmentStoreError> {
        let deleted = diesel::delete(selections::table.find(*selection.as_uuid()))
            .execute(&mut self.conn)
            .await
            .map_err(diesel_error)?;
        Ok(deleted > 0)
    }

    async fn increment_enrolled(&mut self, class: ClassId) -> Result<bool, EnrollmentStoreError> {
        let updated = diesel::update(classes::table.find(*class.as_uuid()))
            .set(classes::enrolled.eq(classes::enrolled + 1))
            .execute(&mut self.conn)
            .await
            .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn take_seat(&mut self, class: ClassId) -> Result<SeatUpdate, EnrollmentStoreError> {
        let taken = diesel::update(
            classes::table
                .filter(classes::id.eq(*class.as_uuid()))
                .filter(classes::available_seats.gt(0)),
        )
        .set(classes::available_seats.eq(classes::available_seats - 1))
        .execute(&mut self.conn)
        .await
        .map_err(diesel_error)?;
        if taken > 0 {
            return Ok(SeatUpdate::Taken);
        }

        let class_exists: bool =
            diesel::select(exists(classes::table.filter(classes::id.eq(*class.as_uuid()))))
                .get_result(&mut self.conn)
                .await
                .map_err(diesel_error)?;
        Ok(if class_exists {
            SeatUpdate::SoldOut
        } else {
            SeatUpdate::ClassMissing
        })
    }

    async fn find_class_instructor(
        &mut self,
        class: ClassId,
    ) -> Result<Option<Email>, EnrollmentStoreError> {
        let instructor: Option<String> = classes::table
            .find(*class.as_uuid())
            .select(classes::instructor_email)
            .first(&mut self.conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        instructor
            .map(|raw| Email::new(raw).map_err(|e| EnrollmentStoreError::query(e.to_string())))
            .transpose()
    }

    async fn credit_instructor(&mut self, instructor: &Email) -> Result<bool, EnrollmentStoreError> {
        let updated = diesel::sql_query(
            "UPDATE users SET students = COALESCE(students, 0) + 1 WHERE email = $1",
        )
        .bind::<Text, _>(instructor.as_ref())
        .execute(&mut self.conn)
        .await
        .map_err(diesel_error)?;
        Ok(updated > 0)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), EnrollmentStoreError> {
        <Tm as TransactionManager<AsyncPgConnection>>::commit_transaction(&mut *self.conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error, SELECTION_PAID_KEY) {
                    EnrollmentStoreError::duplicate_payment("concurrent commit")
                } else {
                    diesel_error(error)
                }
            })
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), EnrollmentStoreError> {
        <Tm as TransactionManager<AsyncPgConnection>>::rollback_transaction(&mut *self.conn)
            .await
            .map_err(diesel_error)
    }
}
