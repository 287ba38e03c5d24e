//! Async storage handle with an explicit ready lifecycle.
//!
//! The handle owns at most one open [`Database`] and gates every operation on
//! [`HandleState::Ready`]. Each operation takes a ticket (the current
//! generation) at its ready check, waits for the connection, and is rejected
//! with [`StoreError::NotReady`] if a switch or close bumped the generation in
//! the meantime. The blocking driver call runs on tokio's blocking pool.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use super::db::{Database, StoreLocation};
use super::models::{HandleState, Record};
use crate::config::DbConfig;
use crate::error::{StoreError, StoreResult};

struct Lifecycle {
    state: HandleState,
    generation: u64,
    config: Option<DbConfig>,
}

/// Generation and store captured when an operation passed the ready check.
#[derive(Debug, Clone)]
struct Ticket {
    generation: u64,
    store: String,
}

/// Shared handle to one record store.
pub struct StorageHandle {
    location: StoreLocation,
    lifecycle: Mutex<Lifecycle>,
    conn: Arc<AsyncMutex<Option<Database>>>,
}

impl StorageHandle {
    /// Create a handle that is not yet open.
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            lifecycle: Mutex::new(Lifecycle {
                state: HandleState::NotInitialized,
                generation: 0,
                config: None,
            }),
            conn: Arc::new(AsyncMutex::new(None)),
        }
    }

    /// Create a handle and open it against `config`.
    pub async fn connect(location: StoreLocation, config: DbConfig) -> StoreResult<Self> {
        let handle = Self::new(location);
        handle.open(config).await?;
        Ok(handle)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HandleState {
        self.lifecycle.lock().state
    }

    /// Whether operations are currently accepted.
    pub fn is_ready(&self) -> bool {
        self.state() == HandleState::Ready
    }

    /// Configuration of the open (or last attempted) store.
    pub fn config(&self) -> Option<DbConfig> {
        self.lifecycle.lock().config.clone()
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Open the store described by `config`.
    ///
    /// A no-op if the handle is already ready on an equal config; otherwise
    /// behaves like [`switch`](Self::switch).
    pub async fn open(&self, config: DbConfig) -> StoreResult<()> {
        {
            let lifecycle = self.lifecycle.lock();
            if lifecycle.state == HandleState::Ready && lifecycle.config.as_ref() == Some(&config)
            {
                return Ok(());
            }
        }
        self.switch(config).await
    }

    /// Close the current store (if any) and open `config` instead.
    ///
    /// Operations issued during the switch, and operations still waiting for
    /// the connection when it started, fail with [`StoreError::NotReady`].
    pub async fn switch(&self, config: DbConfig) -> StoreResult<()> {
        let generation = self.begin_transition(Some(config.clone()));

        if let Err(err) = config.validate() {
            self.finish_transition(generation, HandleState::Error);
            return Err(err);
        }

        let mut slot = self.conn.lock().await;
        if let Some(old) = slot.take() {
            if let Err(err) = old.close() {
                warn!(error = %err, "failed to close previous database cleanly");
            }
        }

        let location = self.location.clone();
        let target = config.clone();
        let opened = tokio::task::spawn_blocking(move || {
            let mut db = Database::open(&location, &target.name)?;
            db.init_schema(&target.store, target.version)?;
            Ok::<_, StoreError>(db)
        })
        .await
        .unwrap_or_else(|e| Err(join_error(e)));

        match opened {
            Ok(db) => {
                *slot = Some(db);
                if self.finish_transition(generation, HandleState::Ready) {
                    info!(name = %config.name, store = %config.store, version = config.version, "store ready");
                }
                Ok(())
            }
            Err(err) => {
                warn!(name = %config.name, store = %config.store, error = %err, "failed to open store");
                self.finish_transition(generation, HandleState::Error);
                Err(err)
            }
        }
    }

    /// Close the connection and return to [`HandleState::NotInitialized`].
    pub async fn close(&self) -> StoreResult<()> {
        let generation = self.begin_transition(None);
        let mut slot = self.conn.lock().await;
        let result = match slot.take() {
            Some(db) => db.close(),
            None => Ok(()),
        };
        self.finish_transition(generation, HandleState::NotInitialized);
        result
    }

    /// Insert a new record; fails if the id already exists.
    pub async fn add(&self, record: Record) -> StoreResult<()> {
        self.run("add", move |db, store| db.insert_record(store, &record))
            .await
    }

    /// Insert or replace a record by id.
    pub async fn put(&self, record: Record) -> StoreResult<()> {
        self.run("put", move |db, store| db.upsert_record(store, &record))
            .await
    }

    /// Remove a record. Removing an absent id is not an error.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.run("delete", move |db, store| {
            db.delete_record(store, &id).map(|_| ())
        })
        .await
    }

    /// Get one record, or [`StoreError::NotFound`].
    pub async fn get(&self, id: &str) -> StoreResult<Record> {
        let id = id.to_string();
        self.run("get", move |db, store| {
            db.get_record(store, &id)?
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        })
        .await
    }

    /// All records, in key order.
    pub async fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.run("get_all", |db, store| db.list_records(store)).await
    }

    /// Remove every record.
    pub async fn clear(&self) -> StoreResult<()> {
        self.run("clear", |db, store| db.clear_records(store).map(|_| ()))
            .await
    }

    /// Number of records in the store.
    pub async fn count(&self) -> StoreResult<usize> {
        self.run("count", |db, store| db.count_records(store)).await
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database, &str) -> StoreResult<T> + Send + 'static,
    {
        let ticket = self.ticket(op)?;
        let slot = self.conn.clone().lock_owned().await;
        self.check_ticket(op, &ticket)?;

        tokio::task::spawn_blocking(move || {
            let db = slot.as_ref().ok_or(StoreError::NotReady)?;
            f(db, &ticket.store)
        })
        .await
        .unwrap_or_else(|e| Err(join_error(e)))
    }

    fn ticket(&self, op: &'static str) -> StoreResult<Ticket> {
        let lifecycle = self.lifecycle.lock();
        match (&lifecycle.state, &lifecycle.config) {
            (HandleState::Ready, Some(config)) => Ok(Ticket {
                generation: lifecycle.generation,
                store: config.store.clone(),
            }),
            _ => {
                warn!(op, state = %lifecycle.state, "rejected operation: store not ready");
                Err(StoreError::NotReady)
            }
        }
    }

    fn check_ticket(&self, op: &'static str, ticket: &Ticket) -> StoreResult<()> {
        let lifecycle = self.lifecycle.lock();
        if lifecycle.state == HandleState::Ready && lifecycle.generation == ticket.generation {
            Ok(())
        } else {
            warn!(op, "rejected operation: store switched while waiting");
            Err(StoreError::NotReady)
        }
    }

    /// Mark the handle not ready and invalidate outstanding tickets.
    fn begin_transition(&self, config: Option<DbConfig>) -> u64 {
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.generation += 1;
        lifecycle.state = HandleState::NotInitialized;
        lifecycle.config = config;
        lifecycle.generation
    }

    /// Settle a transition unless a newer one has started since.
    fn finish_transition(&self, generation: u64, state: HandleState) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation != generation {
            return false;
        }
        lifecycle.state = state;
        true
    }
}

fn join_error(err: tokio::task::JoinError) -> StoreError {
    StoreError::Io(std::io::Error::other(format!("store task failed: {err}")))
}
