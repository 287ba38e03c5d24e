//! Record form editing.
//!
//! A [`RecordDraft`] holds the raw form fields. Submitting validates it, asks
//! for confirmation, and writes it through the [`StorageHandle`].

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EditorError;
use crate::storage::{Answer, Record, StorageHandle};

/// Leading `A.` / `B．` style option label.
static OPTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-D][.．]\s*").expect("valid option prefix regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Separator between options in the normalized form.
pub const OPTION_SEPARATOR: &str = " | ";

/// Asks the user to approve an action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Approves everything (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Whether a submit creates a new record or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit,
}

/// Outcome of [`submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Saved(Record),
    Cancelled,
}

/// Editable form fields. Empty strings mean "not filled in".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub id: String,
    pub provenance: String,
    pub stem: String,
    pub topic: String,
    pub options: String,
    pub answer: String,
    pub analyze: String,
}

impl From<Record> for RecordDraft {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            provenance: record.provenance,
            stem: record.stem,
            topic: record.topic,
            options: record.options,
            answer: record.answer.to_string(),
            analyze: record.analyze,
        }
    }
}

impl RecordDraft {
    /// Check required fields and build the record.
    pub fn validate(&self) -> Result<Record, EditorError> {
        let fields = [
            ("id", &self.id),
            ("provenance", &self.provenance),
            ("stem", &self.stem),
            ("topic", &self.topic),
            ("options", &self.options),
            ("answer", &self.answer),
            ("analyze", &self.analyze),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(EditorError::MissingFields(missing));
        }

        let answer: Answer = self.answer.parse().map_err(EditorError::InvalidAnswer)?;

        Ok(Record {
            id: self.id.trim().to_string(),
            provenance: self.provenance.clone(),
            stem: self.stem.clone(),
            topic: self.topic.clone(),
            options: self.options.clone(),
            answer,
            analyze: self.analyze.clone(),
        })
    }

    /// Remove all whitespace from the stem.
    pub fn strip_stem_whitespace(&mut self) {
        self.stem = strip_whitespace(&self.stem);
    }

    /// Normalize the options text in place.
    pub fn format_options(&mut self) {
        self.options = format_options(&self.options);
    }
}

/// Turn free-form option lines into `Paris | London | ...`.
///
/// Labels (`A.`-`D.`) are stripped only from raw line-per-option input, i.e.
/// text with a newline and no `|` yet. Output never has a newline, so a second
/// pass strips nothing and already-normalized text is unchanged.
/// Inner whitespace is collapsed and blank lines are dropped either way.
pub fn format_options(text: &str) -> String {
    let labeled = text.contains('\n') && !text.contains('|');
    text.split(['\n', '|'])
        .map(|segment| {
            let segment = segment.trim();
            let segment = if labeled {
                OPTION_PREFIX.replace(segment, "")
            } else {
                segment.into()
            };
            WHITESPACE_RUN.replace_all(segment.trim(), " ").into_owned()
        })
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(OPTION_SEPARATOR)
}

/// Remove every whitespace character.
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Fetch a record into a draft for editing.
pub async fn load(handle: &StorageHandle, id: &str) -> Result<RecordDraft, EditorError> {
    Ok(handle.get(id).await?.into())
}

/// Validate, confirm, and save a draft.
pub async fn submit(
    handle: &StorageHandle,
    draft: &RecordDraft,
    mode: EditorMode,
    confirm: &mut dyn Confirm,
) -> Result<Submission, EditorError> {
    let record = draft.validate()?;

    let prompt = match mode {
        EditorMode::Create => format!("Add record '{}'?", record.id),
        EditorMode::Edit => format!("Save changes to record '{}'?", record.id),
    };
    if !confirm.confirm(&prompt) {
        return Ok(Submission::Cancelled);
    }

    match mode {
        EditorMode::Create => handle.add(record.clone()).await?,
        EditorMode::Edit => handle.put(record.clone()).await?,
    }
    info!(id = %record.id, ?mode, "saved record");

    Ok(Submission::Saved(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::error::StoreError;
    use crate::storage::StoreLocation;

    fn draft(id: &str) -> RecordDraft {
        RecordDraft {
            id: id.to_string(),
            provenance: "2018 Fujian".to_string(),
            stem: "Read the passage below.".to_string(),
            topic: "Capital of France?".to_string(),
            options: "A. Paris\nB. London\nC. Rome\nD. Berlin".to_string(),
            answer: "a".to_string(),
            analyze: "<p>Paris.</p>".to_string(),
        }
    }

    async fn open_memory() -> StorageHandle {
        StorageHandle::connect(StoreLocation::InMemory, DbConfig::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_format_options() {
        assert_eq!(format_options("A. Paris\nB. London"), "Paris | London");
        assert_eq!(format_options("Paris | London"), "Paris | London");
        assert_eq!(
            format_options("A.Paris\r\n\nB．  New   York \nC. Rome\n"),
            "Paris | New York | Rome"
        );
    }

    #[test]
    fn test_format_options_is_idempotent() {
        let inputs = [
            "A. Paris\nB. London",
            "A. 北京\nB. 上海\nC. 广州\nD. 深圳",
            "  A.  one  two \n\n B. three",
            "A. D.C. United\nB. Arsenal",
            "",
        ];
        for input in inputs {
            let once = format_options(input);
            assert_eq!(format_options(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_format_options_keeps_label_like_text() {
        let once = format_options("A. D.C. United\nB. Arsenal");
        assert_eq!(once, "D.C. United | Arsenal");
        assert_eq!(format_options(&once), "D.C. United | Arsenal");
        // A single line has no labels to strip.
        assert_eq!(format_options("C. United"), "C. United");
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(" a b\tc\n d "), "abcd");

        let mut d = draft("1-1");
        d.stem = "题 干 \n 内容".to_string();
        d.strip_stem_whitespace();
        assert_eq!(d.stem, "题干内容");
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let err = RecordDraft {
            id: "1-1".to_string(),
            topic: "   ".to_string(),
            ..RecordDraft::default()
        }
        .validate()
        .unwrap_err();

        match err {
            EditorError::MissingFields(fields) => assert_eq!(
                fields,
                ["provenance", "stem", "topic", "options", "answer", "analyze"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_bad_answer() {
        let mut d = draft("1-1");
        d.answer = "E".to_string();
        assert!(matches!(d.validate(), Err(EditorError::InvalidAnswer(a)) if a == "E"));
    }

    #[test]
    fn test_draft_from_record() {
        let record = draft("1-1").validate().unwrap();
        let back = RecordDraft::from(record.clone());
        assert_eq!(back.answer, "A");
        assert_eq!(back.validate().unwrap(), record);
    }

    #[tokio::test]
    async fn test_submit_create_and_edit() {
        let handle = open_memory().await;

        let mut d = draft("1-1");
        d.format_options();
        let saved = submit(&handle, &d, EditorMode::Create, &mut AssumeYes)
            .await
            .unwrap();
        assert!(matches!(saved, Submission::Saved(ref r) if r.options == "Paris | London | Rome | Berlin"));

        // Creating the same id again collides.
        let err = submit(&handle, &d, EditorMode::Create, &mut AssumeYes)
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Store(StoreError::DuplicateKey(_))));

        let mut edited = load(&handle, "1-1").await.unwrap();
        edited.answer = "C".to_string();
        submit(&handle, &edited, EditorMode::Edit, &mut AssumeYes)
            .await
            .unwrap();
        assert_eq!(handle.get("1-1").await.unwrap().answer, Answer::C);
    }

    #[tokio::test]
    async fn test_declined_submit_writes_nothing() {
        let handle = open_memory().await;
        let mut prompts = Vec::new();
        let mut decline = |prompt: &str| {
            prompts.push(prompt.to_string());
            false
        };

        let outcome = submit(&handle, &draft("1-1"), EditorMode::Create, &mut decline)
            .await
            .unwrap();
        assert_eq!(outcome, Submission::Cancelled);
        assert_eq!(prompts, ["Add record '1-1'?"]);
        assert!(handle.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_skips_confirmation() {
        let handle = open_memory().await;
        let mut asked = false;
        let mut confirm = |_: &str| {
            asked = true;
            true
        };

        let result = submit(
            &handle,
            &RecordDraft::default(),
            EditorMode::Create,
            &mut confirm,
        )
        .await;
        assert!(matches!(result, Err(EditorError::MissingFields(_))));
        assert!(!asked);
    }
}
