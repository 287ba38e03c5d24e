//! Interactive confirmation on the terminal.

use std::io::{self, BufRead, Write};

use crate::editor::{AssumeYes, Confirm};

use super::args::ConfirmArgs;

/// Asks on stderr and reads a `y`/`yes` answer from stdin.
///
/// End of input counts as "no".
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&mut self, prompt: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{prompt} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

/// Pick the confirmation strategy for a command.
pub fn confirmer(args: ConfirmArgs) -> Box<dyn Confirm> {
    if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt)
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn test_confirmer_with_yes_flag() {
        let mut confirm = confirmer(ConfirmArgs { yes: true });
        assert!(confirm.confirm("Remove all records?"));
    }
}
