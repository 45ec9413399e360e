//! Line-oriented operator input.
//!
//! Interactive flows read through `Prompt` so they can be driven by a script in tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub trait Prompt {
    /// Show `question` and return the answer line with surrounding whitespace trimmed.
    /// End of input yields an empty string.
    fn ask(&mut self, question: &str) -> String;

    /// Print an informational line.
    fn say(&mut self, line: &str);

    /// True once input is exhausted; callers looping on `ask` stop here.
    fn closed(&self) -> bool {
        false
    }

    /// Block until the operator acknowledges.
    fn pause(&mut self) {
        let _ = self.ask("Press Enter to return to the menu...");
    }

    /// True for `y`/`yes` (case-insensitive); anything else declines.
    fn confirm(&mut self, question: &str) -> bool {
        is_yes(&self.ask(&format!("{question} (y/n): ")))
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Reads stdin and writes to stdout.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    eof: bool,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether both ends are attached to a terminal.
    pub fn is_interactive() -> bool {
        atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, question: &str) -> String {
        print!("{question}");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.eof = true;
                println!();
                String::new()
            }
            Ok(_) => line.trim().to_string(),
        }
    }

    fn say(&mut self, line: &str) {
        println!("{line}");
    }

    fn closed(&self) -> bool {
        self.eof
    }
}

/// Replays canned answers and records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    exhausted: bool,
    pub questions: Vec<String>,
    pub output: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    /// Everything said so far, one line per entry, joined with newlines.
    pub fn transcript(&self) -> String {
        self.output.join("\n")
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&mut self, question: &str) -> String {
        self.questions.push(question.to_string());
        match self.answers.pop_front() {
            Some(a) => a.trim().to_string(),
            None => {
                self.exhausted = true;
                String::new()
            }
        }
    }

    fn say(&mut self, line: &str) {
        self.output.push(line.to_string());
    }

    fn closed(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_accepts_only_yes() {
        let mut p = ScriptedPrompt::new(["Y", "yes", "n", "", "sure"]);
        assert!(p.confirm("push?"));
        assert!(p.confirm("push?"));
        assert!(!p.confirm("push?"));
        assert!(!p.confirm("push?"));
        assert!(!p.confirm("push?"));
        assert_eq!(p.questions[0], "push? (y/n): ");
    }

    #[test]
    fn test_scripted_prompt_runs_dry_as_empty_answers() {
        let mut p = ScriptedPrompt::new(["  main  "]);
        assert_eq!(p.ask("branch: "), "main");
        assert!(!p.closed());
        assert_eq!(p.ask("again: "), "");
        assert_eq!(p.remaining(), 0);
        assert!(p.closed());
    }
}
