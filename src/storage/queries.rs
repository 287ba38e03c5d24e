//! Database query operations.
//!
//! Row-level CRUD against a single record store. Each call is one statement
//! (or one check plus one statement) on the connection held by the caller.

use duckdb::params;
use tracing::debug;

use super::models::Record;
use super::Database;
use crate::error::{StoreError, StoreResult};

impl Database {
    /// Insert a new record. Fails with [`StoreError::DuplicateKey`] if the id exists.
    pub fn insert_record(&self, store: &str, record: &Record) -> StoreResult<()> {
        if self.contains_record(store, &record.id)? {
            return Err(StoreError::DuplicateKey(record.id.clone()));
        }

        let value = serde_json::to_string(record)?;
        self.conn().execute(
            &format!(r#"INSERT INTO "{store}" (id, value) VALUES (?, ?)"#),
            params![record.id, value],
        )?;
        debug!(store, id = %record.id, "inserted record");
        Ok(())
    }

    /// Insert or replace a record by id.
    pub fn upsert_record(&self, store: &str, record: &Record) -> StoreResult<()> {
        let value = serde_json::to_string(record)?;
        self.conn().execute(
            &format!(r#"INSERT OR REPLACE INTO "{store}" (id, value) VALUES (?, ?)"#),
            params![record.id, value],
        )?;
        debug!(store, id = %record.id, "upserted record");
        Ok(())
    }

    /// Get a record by id.
    pub fn get_record(&self, store: &str, id: &str) -> StoreResult<Option<Record>> {
        let mut stmt = self
            .conn()
            .prepare(&format!(r#"SELECT value FROM "{store}" WHERE id = ?"#))?;
        let value = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .next()
            .transpose()?;

        value
            .map(|v| serde_json::from_str(&v).map_err(StoreError::from))
            .transpose()
    }

    /// List all records in key order.
    pub fn list_records(&self, store: &str) -> StoreResult<Vec<Record>> {
        let mut stmt = self
            .conn()
            .prepare(&format!(r#"SELECT value FROM "{store}" ORDER BY id"#))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for value in rows {
            records.push(serde_json::from_str(&value?)?);
        }
        Ok(records)
    }

    /// Delete a record by id. Returns whether a row was removed.
    pub fn delete_record(&self, store: &str, id: &str) -> StoreResult<bool> {
        let removed = self
            .conn()
            .execute(&format!(r#"DELETE FROM "{store}" WHERE id = ?"#), params![id])?;
        debug!(store, id, removed, "deleted record");
        Ok(removed > 0)
    }

    /// Remove every record. Returns how many rows were removed.
    pub fn clear_records(&self, store: &str) -> StoreResult<usize> {
        let removed = self.conn().execute(&format!(r#"DELETE FROM "{store}""#), [])?;
        debug!(store, removed, "cleared store");
        Ok(removed)
    }

    /// Number of records in the store.
    pub fn count_records(&self, store: &str) -> StoreResult<usize> {
        let count: i64 = self.conn().query_row(
            &format!(r#"SELECT COUNT(*) FROM "{store}""#),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn contains_record(&self, store: &str, id: &str) -> StoreResult<bool> {
        let count: i64 = self.conn().query_row(
            &format!(r#"SELECT COUNT(*) FROM "{store}" WHERE id = ?"#),
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
