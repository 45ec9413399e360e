//! Parsing for `git status --porcelain`, `git diff --numstat` and `git ls-files` output.

use std::fmt;

/// One line of porcelain status: two-character code plus path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: String,
    pub path: String,
}

impl StatusEntry {
    pub fn label(&self) -> &'static str {
        status_label(&self.code)
    }
}

/// One line of `--numstat`. Counts are None for binary files (git prints `-`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffStat {
    pub path: String,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

impl fmt::Display for DiffStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = |n: Option<u64>| n.map_or_else(|| "-".to_string(), |v| v.to_string());
        write!(
            f,
            "{}: +{} -{}",
            self.path,
            count(self.additions),
            count(self.deletions)
        )
    }
}

/// Snapshot of repository changes taken right before a push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub status: Vec<StatusEntry>,
    pub unstaged: Vec<DiffStat>,
    pub staged: Vec<DiffStat>,
    pub untracked: Vec<String>,
}

impl ChangeSet {
    /// Nothing to commit according to porcelain status.
    pub fn is_clean(&self) -> bool {
        self.status.is_empty()
    }

    /// `(label, path)` per status entry, in status order.
    pub fn classify(&self) -> Vec<(&'static str, &str)> {
        self.status
            .iter()
            .map(|e| (e.label(), e.path.as_str()))
            .collect()
    }
}

const STATUS_LABELS: &[(&str, &str)] = &[
    ("M ", "modified-staged"),
    (" M", "modified-unstaged"),
    ("A ", "added-staged"),
    (" A", "added-unstaged"),
    ("D ", "deleted-staged"),
    (" D", "deleted-unstaged"),
    ("R ", "renamed"),
    ("C ", "copied"),
    ("U ", "unmerged"),
    ("??", "untracked"),
];

/// Human-readable label for a porcelain code; `unknown` when nothing matches.
pub fn status_label(code: &str) -> &'static str {
    STATUS_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
        .unwrap_or("unknown")
}

/// Parse porcelain v1 output. Leading spaces are significant, so lines are never trimmed
/// at the start.
pub fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let code = line.get(..2)?;
            let path = line.get(3..).unwrap_or("").trim_end();
            Some(StatusEntry {
                code: code.to_string(),
                path: path.to_string(),
            })
        })
        .collect()
}

/// Parse `git diff --numstat` output (`<add>\t<del>\t<path>` per line).
pub fn parse_numstat(output: &str) -> Vec<DiffStat> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let additions = parts.next()?.trim();
            let deletions = parts.next()?.trim();
            let path = parts.next()?.trim();
            if path.is_empty() {
                return None;
            }
            Some(DiffStat {
                path: path.to_string(),
                additions: additions.parse().ok(),
                deletions: deletions.parse().ok(),
            })
        })
        .collect()
}

pub fn parse_path_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `git rev-list --left-right --count origin/<branch>...HEAD`: left is behind,
/// right is ahead. Returns `(ahead, behind)`.
pub fn parse_left_right(output: &str) -> Option<(u64, u64)> {
    let mut it = output.split_whitespace();
    let behind = it.next()?.parse().ok()?;
    let ahead = it.next()?.parse().ok()?;
    if it.next().is_some() {
        return None;
    }
    Some((ahead, behind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_first_match_and_unknown() {
        assert_eq!(status_label("M "), "modified-staged");
        assert_eq!(status_label(" M"), "modified-unstaged");
        assert_eq!(status_label("??"), "untracked");
        assert_eq!(status_label("R "), "renamed");
        assert_eq!(status_label("MM"), "unknown");
        assert_eq!(status_label("AM"), "unknown");
    }

    #[test]
    fn test_porcelain_keeps_leading_space_of_first_line() {
        let out = " M src/lib.rs\n?? notes/new file.md\nM  README.md\n";
        let entries = parse_porcelain(out);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].code, " M");
        assert_eq!(entries[0].path, "src/lib.rs");
        assert_eq!(entries[1].path, "notes/new file.md");
        assert_eq!(entries[2].label(), "modified-staged");
    }

    #[test]
    fn test_classify_preserves_status_order() {
        let cs = ChangeSet {
            status: parse_porcelain("M  a.txt\n?? b.txt\n"),
            ..ChangeSet::default()
        };
        assert_eq!(
            cs.classify(),
            vec![("modified-staged", "a.txt"), ("untracked", "b.txt")]
        );
        assert!(!cs.is_clean());
        assert!(ChangeSet::default().is_clean());
    }

    #[test]
    fn test_numstat_handles_binary_and_blank_lines() {
        let stats = parse_numstat("3\t1\tsrc/main.rs\n-\t-\tlogo.png\n\n");
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].additions, Some(3));
        assert_eq!(stats[0].to_string(), "src/main.rs: +3 -1");
        assert_eq!(stats[1].additions, None);
        assert_eq!(stats[1].to_string(), "logo.png: +- --");
    }

    #[test]
    fn test_left_right_order_is_behind_then_ahead() {
        assert_eq!(parse_left_right("2\t5\n"), Some((5, 2)));
        assert_eq!(parse_left_right(""), None);
        assert_eq!(parse_left_right("fatal: bad revision"), None);
    }
}
