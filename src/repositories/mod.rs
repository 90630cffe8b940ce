use sea_orm::{ActiveModelTrait, DatabaseConnection, DeleteMany, EntityTrait};
use std::sync::Arc;
use tracing::debug;

use crate::db::DatabaseAccess;
use crate::errors::ServiceError;

pub mod catalog_repository;
pub mod fact_repository;
pub mod forecast_repository;
pub mod summary_repository;

pub use catalog_repository::{CatalogRepository, ProductFilter};
pub use fact_repository::FactRepository;
pub use forecast_repository::{ForecastRepository, ForecastRow};
pub use summary_repository::{BrandSummaryRow, CategorySummaryRow, SummaryRepository};

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn access(&self) -> DatabaseAccess {
        DatabaseAccess::new(self.db.clone())
    }

    /// Replaces a whole output partition: `delete` runs first, then `rows` are
    /// inserted in chunks of `chunk_size`, all inside one transaction. A failure
    /// anywhere leaves the previous partition in place.
    pub async fn replace_partition<E, A>(
        &self,
        operation: &str,
        delete: DeleteMany<E>,
        rows: Vec<A>,
        chunk_size: usize,
    ) -> Result<u64, ServiceError>
    where
        E: EntityTrait,
        A: ActiveModelTrait<Entity = E> + Clone + Send + Sync + 'static,
    {
        let chunk_size = chunk_size.max(1);
        let total = rows.len();
        debug!(operation, rows = total, chunk_size, "Replacing partition");

        self.access()
            .transaction(operation, move |txn| {
                Box::pin(async move {
                    let deleted = delete.exec(txn).await?.rows_affected;
                    debug!(deleted, "Cleared partition");

                    let mut written = 0u64;
                    // insert_many rejects empty batches, chunks() never yields one
                    for chunk in rows.chunks(chunk_size) {
                        E::insert_many(chunk.to_vec()).exec(txn).await?;
                        written += chunk.len() as u64;
                    }
                    Ok(written)
                })
            })
            .await
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
