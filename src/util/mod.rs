//! Process execution, atomic file writes and the quoting used when commands are logged.

pub mod exec;
pub mod fs;

pub use exec::{CommandResult, CommandRunner, ExecRequest, ScriptedRunner, SystemRunner};

/// Render an argument vector as one line a POSIX shell would split back into `words`.
pub fn command_preview(words: &[String]) -> String {
    words
        .iter()
        .map(|w| quote_word(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_word(word: &str) -> String {
    let plain = |c: char| c.is_ascii_alphanumeric() || "-_=./:@,+%".contains(c);
    if !word.is_empty() && word.chars().all(plain) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}
