//! qbank library - a local question-bank editor.
//!
//! This crate provides the record store and its async handle, the form
//! editor transforms, the table view, and spreadsheet export.

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod storage;
pub mod view;

pub use config::{AppConfig, DbConfig};
pub use error::{EditorError, ExportError, StoreError, StoreResult};
pub use storage::{Answer, HandleState, Record, StorageHandle};
