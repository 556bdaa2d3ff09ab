//! PostgreSQL-backed `ClassRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::ClassRow;
use super::pool::DbPool;
use super::schema::classes;
use crate::domain::ports::{ClassRepository, ClassRepositoryError};
use crate::domain::{ClassId, ClassOffering};

/// Diesel implementation of the catalog reads.
#[derive(Clone)]
pub struct DieselClassRepository {
    pool: DbPool,
}

impl DieselClassRepository {
    /// Catalog reads over `pool`.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassRepository for DieselClassRepository {
    async fn find_by_id(&self, id: ClassId) -> Result<Option<ClassOffering>, ClassRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ClassRepositoryError::connection))?;
        let row = classes::table
            .find(*id.as_uuid())
            .select(ClassRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| {
                map_diesel_error(
                    e,
                    ClassRepositoryError::query,
                    ClassRepositoryError::connection,
                )
            })?;
        row.map(ClassOffering::try_from)
            .transpose()
            .map_err(ClassRepositoryError::query)
    }
}
