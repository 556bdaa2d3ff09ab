//! PostgreSQL-backed `SelectionRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{SelectionRow, convert_rows};
use super::pool::{DbPool, PoolError};
use super::schema::selections;
use crate::domain::ports::{SelectionRepository, SelectionRepositoryError};
use crate::domain::{Email, Selection, SelectionId};

const STUDENT_CLASS_KEY: &str = "selections_student_class_key";

/// Diesel implementation of the pending-selection store.
///
/// One selection per student and class, enforced by the
/// `selections_student_class_key` unique constraint.
#[derive(Clone)]
pub struct DieselSelectionRepository {
    pool: DbPool,
}

impl DieselSelectionRepository {
    /// Selection store over `pool`.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SelectionRepositoryError {
    map_pool_error(error, SelectionRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> SelectionRepositoryError {
    map_diesel_error(
        error,
        SelectionRepositoryError::query,
        SelectionRepositoryError::connection,
    )
}

#[async_trait]
impl SelectionRepository for DieselSelectionRepository {
    async fn insert(&self, selection: &Selection) -> Result<(), SelectionRepositoryError> {
        let row = SelectionRow::try_from(selection).map_err(SelectionRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(selections::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|error| {
                if is_unique_violation(&error, STUDENT_CLASS_KEY) {
                    SelectionRepositoryError::duplicate(format!(
                        "{} already selected {}",
                        selection.student_email, selection.class_id
                    ))
                } else {
                    diesel_error(error)
                }
            })?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: SelectionId,
    ) -> Result<Option<Selection>, SelectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = selections::table
            .find(*id.as_uuid())
            .select(SelectionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(Selection::try_from)
            .transpose()
            .map_err(SelectionRepositoryError::query)
    }

    async fn list_for_student(
        &self,
        student: &Email,
    ) -> Result<Vec<Selection>, SelectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<SelectionRow> = selections::table
            .filter(selections::student_email.eq(student.as_ref()))
            .order((selections::created_at.asc(), selections::id.asc()))
            .select(SelectionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        convert_rows(rows).map_err(SelectionRepositoryError::query)
    }

    async fn delete_for_student(
        &self,
        id: SelectionId,
        student: &Email,
    ) -> Result<bool, SelectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            selections::table
                .filter(selections::id.eq(*id.as_uuid()))
                .filter(selections::student_email.eq(student.as_ref())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(deleted > 0)
    }
}
