//! Table view over the record store.

use std::fmt::Write;

use tracing::info;

use crate::editor::{self, Confirm, EditorMode, RecordDraft, Submission};
use crate::error::{EditorError, StoreResult};
use crate::storage::{Record, StorageHandle};

/// Columns shown by [`QuestionTable::render`].
pub const COLUMNS: [&str; 4] = ["id", "provenance", "topic", "answer"];

const MAX_CELL_WIDTH: usize = 40;

/// What happened to a confirm-gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Cancelled,
}

/// Last loaded snapshot of the store, refreshed after every mutation.
#[derive(Debug, Default)]
pub struct QuestionTable {
    rows: Vec<Record>,
}

impl QuestionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Reload every record from the store.
    pub async fn load(&mut self, handle: &StorageHandle) -> StoreResult<()> {
        self.rows = handle.get_all().await?;
        Ok(())
    }

    /// Open a record in the editor.
    pub async fn edit(
        &self,
        handle: &StorageHandle,
        id: &str,
    ) -> Result<RecordDraft, EditorError> {
        editor::load(handle, id).await
    }

    /// Submit a draft, then reload.
    pub async fn save(
        &mut self,
        handle: &StorageHandle,
        draft: &RecordDraft,
        mode: EditorMode,
        confirm: &mut dyn Confirm,
    ) -> Result<Submission, EditorError> {
        let submission = editor::submit(handle, draft, mode, confirm).await?;
        if let Submission::Saved(_) = submission {
            self.load(handle).await?;
        }
        Ok(submission)
    }

    /// Delete one record after confirmation, then reload.
    pub async fn delete(
        &mut self,
        handle: &StorageHandle,
        id: &str,
        confirm: &mut dyn Confirm,
    ) -> StoreResult<Outcome> {
        if !confirm.confirm(&format!("Delete record '{id}'?")) {
            return Ok(Outcome::Cancelled);
        }
        handle.delete(id).await?;
        info!(id, "deleted record");
        self.load(handle).await?;
        Ok(Outcome::Done)
    }

    /// Remove every record after confirmation, then reload.
    pub async fn clear_all(
        &mut self,
        handle: &StorageHandle,
        confirm: &mut dyn Confirm,
    ) -> StoreResult<Outcome> {
        if !confirm.confirm("Remove all records?") {
            return Ok(Outcome::Cancelled);
        }
        handle.clear().await?;
        info!("cleared all records");
        self.load(handle).await?;
        Ok(Outcome::Done)
    }

    /// Render the loaded rows as an aligned text table.
    pub fn render(&self) -> String {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    cell(&r.id),
                    cell(&r.provenance),
                    cell(&r.topic),
                    r.answer.to_string(),
                ]
            })
            .collect();

        let mut widths = COLUMNS.map(|c| c.chars().count());
        for row in &cells {
            for (width, value) in widths.iter_mut().zip(row) {
                *width = (*width).max(value.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &COLUMNS.map(String::from), &widths);
        push_line(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
        for row in &cells {
            push_line(&mut out, row, &widths);
        }
        let _ = write!(out, "({} records)", self.rows.len());
        out
    }
}

/// Single-line, width-capped cell text.
fn cell(value: &str) -> String {
    let flat = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_CELL_WIDTH {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
    cut.push_str("...");
    cut
}

fn push_line(out: &mut String, row: &[String; 4], widths: &[usize; 4]) {
    let line = row
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let pad = width.saturating_sub(value.chars().count());
            format!("{value}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
