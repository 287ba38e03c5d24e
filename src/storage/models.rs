//! Data models for storage layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One question-bank entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// User-assigned key, e.g. `1-1` for group one, question one.
    pub id: String,
    /// Where the question comes from.
    pub provenance: String,
    /// Question stem. May contain HTML from a rich-text editor.
    pub stem: String,
    /// Question body text.
    pub topic: String,
    /// Options in `A | B | C | D` form with letter prefixes removed.
    pub options: String,
    /// Correct option.
    pub answer: Answer,
    /// Explanation. May contain HTML.
    pub analyze: String,
}

/// Correct option letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    A,
    B,
    C,
    D,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::A => "A",
            Answer::B => "B",
            Answer::C => "C",
            Answer::D => "D",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Answer::A),
            "B" => Ok(Answer::B),
            "C" => Ok(Answer::C),
            "D" => Ok(Answer::D),
            _ => Err(s.to_string()),
        }
    }
}

/// Lifecycle of a [`StorageHandle`](super::StorageHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Never opened, closed, or mid-switch.
    NotInitialized,
    /// Connection is open; operations are accepted.
    Ready,
    /// The last open attempt failed.
    Error,
}

impl fmt::Display for HandleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HandleState::NotInitialized => "not-initialized",
            HandleState::Ready => "ready",
            HandleState::Error => "error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_parse() {
        assert_eq!("a".parse::<Answer>().unwrap(), Answer::A);
        assert_eq!(" D ".parse::<Answer>().unwrap(), Answer::D);
        assert!("E".parse::<Answer>().is_err());
        assert!("".parse::<Answer>().is_err());
    }

    #[test]
    fn test_record_field_order() {
        let record = Record {
            id: "1-1".to_string(),
            provenance: "2018 Fujian".to_string(),
            stem: "<p>stem</p>".to_string(),
            topic: "Capital of France?".to_string(),
            options: "Paris | London".to_string(),
            answer: Answer::A,
            analyze: "Paris is the capital.".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            ["id", "provenance", "stem", "topic", "options", "answer", "analyze"]
        );
        assert_eq!(value["answer"], "A");
    }
}
