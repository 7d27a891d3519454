use std::{fs, path::Path, sync::Arc};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;
use tracing::{info, warn};

use crate::{database::sqlite::SqliteDatabase, error::AppError};

use super::business::Business;

/// Read access to stored businesses, already normalized.
///
/// Cloning is cheap; every clone shares the pool created at startup.
#[derive(Clone)]
pub struct Directory {
    connection_pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Directory {
    pub fn setup(connection_pool: Arc<Pool<SqliteConnectionManager>>) -> Result<Self, AppError> {
        let directory = Self { connection_pool };
        SqliteDatabase::create_table(&directory.get_connection()?)?;
        Ok(directory)
    }

    fn get_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, AppError> {
        Ok(self.connection_pool.get()?)
    }

    pub fn business(&self, id: &str) -> Result<Option<Business>, AppError> {
        let connection = self.get_connection()?;
        let Some(record) = SqliteDatabase::query_business(&connection, id)? else {
            return Ok(None);
        };
        let record: Value = serde_json::from_str(&record)?;
        Ok(Some(Business::from_record(&record)?))
    }

    /// Every business that normalizes. Rows that don't are logged and left out.
    pub fn businesses(&self) -> Result<Vec<Business>, AppError> {
        let connection = self.get_connection()?;
        let rows = SqliteDatabase::query_all_businesses(&connection)?;
        let mut businesses = Vec::with_capacity(rows.len());
        for (id, record) in rows {
            let normalized = serde_json::from_str::<Value>(&record)
                .map_err(AppError::from)
                .and_then(|value| Business::from_record(&value).map_err(AppError::from));
            match normalized {
                Ok(business) => businesses.push(business),
                Err(err) => warn!(id = %id, "Skipping stored business: {}", err),
            }
        }
        Ok(businesses)
    }

    /// Stores the record as given, keyed by its normalized id.
    pub fn insert_record(&self, record: &Value) -> Result<Business, AppError> {
        let business = Business::from_record(record)?;
        let connection = self.get_connection()?;
        SqliteDatabase::insert_business(&connection, &business.id, &record.to_string())?;
        Ok(business)
    }

    /**
    Load a JSON array of business rows from a file into the store.

    Rows are validated through `Business::from_record` and stored raw. Rows that
    fail are logged and skipped. Returns how many rows were stored.
    */
    pub fn seed_from_file(&self, path: &Path) -> Result<usize, AppError> {
        let text = fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let rows: Vec<Value> = serde_json::from_str(&text)?;

        let mut data = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match Business::from_record(row) {
                Ok(business) => data.push((business.id, row.to_string())),
                Err(err) => warn!(index, "Skipping seed row: {}", err),
            }
        }
        let stored = data.len();
        let mut connection = self.get_connection()?;
        SqliteDatabase::insert_many_businesses(&mut connection, data)?;
        info!(stored, path = %path.display(), "Seeded businesses");
        Ok(stored)
    }
}
