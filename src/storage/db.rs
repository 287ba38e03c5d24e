//! Database connection and initialization.

use std::path::{Path, PathBuf};

use duckdb::{params, Connection};
use tracing::{debug, info};

use super::schema::{create_store, CREATE_META, META_TABLE};
use crate::error::{StoreError, StoreResult};

/// Where database files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Every open gets a fresh, private in-memory database.
    InMemory,
    /// One `<name>.duckdb` file per database name inside this directory.
    Directory(PathBuf),
}

impl StoreLocation {
    /// Path of the file backing database `name`, if any.
    pub fn database_path(&self, name: &str) -> Option<PathBuf> {
        match self {
            StoreLocation::InMemory => None,
            StoreLocation::Directory(dir) => Some(dir.join(format!("{name}.duckdb"))),
        }
    }
}

/// Database handle for a single DuckDB file.
pub struct Database {
    conn: Connection,
    name: String,
    /// Path to the database file, `None` when in memory.
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create the database `name` at the given location.
    pub fn open(location: &StoreLocation, name: &str) -> StoreResult<Self> {
        let path = location.database_path(name);

        let conn = match &path {
            Some(path) => {
                // Ensure parent directory exists
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            None => Connection::open_in_memory()?,
        };
        debug!(name, path = ?path, "opened database");

        Ok(Self {
            conn,
            name: name.to_string(),
            path,
        })
    }

    /// Bring the schema up to `version` and make sure `store` exists.
    ///
    /// Fails with [`StoreError::VersionDowngrade`] when the file was written
    /// at a higher version.
    pub fn init_schema(&mut self, store: &str, version: u32) -> StoreResult<()> {
        self.conn.execute_batch(CREATE_META)?;

        let existing = self.version()?;
        if let Some(existing) = existing {
            if version < existing {
                return Err(StoreError::VersionDowngrade {
                    name: self.name.clone(),
                    requested: version,
                    existing,
                });
            }
        }

        let tx = self.conn.transaction()?;
        tx.execute_batch(&create_store(store))?;
        if existing != Some(version) {
            tx.execute(
                &format!("INSERT OR REPLACE INTO {META_TABLE} (name, version) VALUES (?, ?)"),
                params![self.name, i64::from(version)],
            )?;
            info!(
                name = %self.name,
                from = ?existing,
                to = version,
                "upgraded database version"
            );
        }
        tx.commit()?;

        Ok(())
    }

    /// Schema version recorded in the file, `None` for a brand new database.
    pub fn version(&self) -> StoreResult<Option<u32>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT version FROM {META_TABLE} WHERE name = ?"))?;
        let version = stmt
            .query_map(params![self.name], |row| row.get::<_, i64>(0))?
            .next()
            .transpose()?;

        version
            .map(|v| {
                u32::try_from(v).map_err(|_| {
                    StoreError::InvalidConfig(format!("stored version {v} is out of range"))
                })
            })
            .transpose()
    }

    /// Close the connection, surfacing any error from the driver.
    pub fn close(self) -> StoreResult<()> {
        debug!(name = %self.name, "closing database");
        self.conn.close().map_err(|(_, e)| StoreError::Driver(e))
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Get the database name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the database path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_open() {
        let temp = TempDir::new().unwrap();
        let location = StoreLocation::Directory(temp.path().join("nested"));

        let db = Database::open(&location, "QuestionBase").unwrap();
        assert_eq!(
            db.path(),
            Some(temp.path().join("nested").join("QuestionBase.duckdb").as_path())
        );
        assert_eq!(db.name(), "QuestionBase");
    }

    #[test]
    fn test_database_init_schema() {
        let mut db = Database::open(&StoreLocation::InMemory, "QuestionBase").unwrap();
        assert_eq!(db.version().unwrap(), None);

        db.init_schema("Store1", 1).unwrap();
        assert_eq!(db.version().unwrap(), Some(1));

        // Same version again is a no-op.
        db.init_schema("Store1", 1).unwrap();
        db.init_schema("Store1", 3).unwrap();
        assert_eq!(db.version().unwrap(), Some(3));
    }

    #[test]
    fn test_database_rejects_downgrade() {
        let temp = TempDir::new().unwrap();
        let location = StoreLocation::Directory(temp.path().to_path_buf());

        let mut db = Database::open(&location, "QuestionBase").unwrap();
        db.init_schema("Store1", 2).unwrap();
        db.close().unwrap();

        let mut db = Database::open(&location, "QuestionBase").unwrap();
        let err = db.init_schema("Store1", 1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionDowngrade {
                requested: 1,
                existing: 2,
                ..
            }
        ));
    }
}
