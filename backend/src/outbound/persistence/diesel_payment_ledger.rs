//! PostgreSQL-backed `PaymentLedger` (read side).

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{PaymentRow, convert_rows};
use super::pool::{DbPool, PoolError};
use super::schema::payments;
use crate::domain::ports::{PaymentLedger, PaymentLedgerError};
use crate::domain::{ClassId, Email, PaymentRecord};

/// Diesel implementation of the ledger read side. Entries are only written
/// by [`DieselEnrollmentStore`](super::DieselEnrollmentStore) commits.
#[derive(Clone)]
pub struct DieselPaymentLedger {
    pool: DbPool,
}

impl DieselPaymentLedger {
    /// Ledger reads over `pool`.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PaymentLedgerError {
    map_pool_error(error, PaymentLedgerError::connection)
}

fn diesel_error(error: diesel::result::Error) -> PaymentLedgerError {
    map_diesel_error(
        error,
        PaymentLedgerError::query,
        PaymentLedgerError::connection,
    )
}

#[async_trait]
impl PaymentLedger for DieselPaymentLedger {
    async fn list_for_student(
        &self,
        student: &Email,
    ) -> Result<Vec<PaymentRecord>, PaymentLedgerError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<PaymentRow> = payments::table
            .filter(payments::student_email.eq(student.as_ref()))
            .order(payments::paid_at.desc())
            .select(PaymentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        convert_rows(rows).map_err(PaymentLedgerError::query)
    }

    async fn has_paid(&self, student: &Email, class: ClassId) -> Result<bool, PaymentLedgerError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(exists(
            payments::table
                .filter(payments::student_email.eq(student.as_ref()))
                .filter(payments::class_id.eq(*class.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }
}
