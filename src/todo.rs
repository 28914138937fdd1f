//! Todo lists
//!
//! This module builds the initial todo list for a range of commits, renders it for
//! the editor and reconciles the edited text back into an ordered list of steps.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::editor::{Editor, EditorError, COMMENT_CHAR};
use crate::guide::todo_help;
use crate::odb::{Commit, CommitResolver};
use crate::step::{Step, StepError, StepKind};

/// Label of the buffer handed to the editor
pub const TODO_LABEL: &str = "git-zipfix-todo";

/// Fatal errors while reconciling an edited todo list. Nothing from a failed
/// pass is kept.
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("invalid todo on line {number} '{line}': {source}")]
    InvalidLine {
        number: usize,
        line: String,
        #[source]
        source: StepError,
    },

    #[error("line {number}: non-index todo '{line}' follows an index todo")]
    IndexNotLast { number: usize, line: String },

    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// A non-fatal observation about an edited todo list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The commit appears on more than one line
    Duplicate(Commit),
    /// The commit was in the original list but no longer is
    Missing(Commit),
    /// The commit was not in the original list
    Added(Commit),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Duplicate(c) => write!(f, "commit {c} referenced multiple times"),
            Diagnostic::Missing(c) => write!(f, "commit {c} missing from todo list"),
            Diagnostic::Added(c) => write!(f, "commit {c} not in original todo list"),
        }
    }
}

/// Diagnostics collected over one reconcile pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Emits every diagnostic as a warning
    pub fn flush(&self) {
        for diagnostic in &self.entries {
            warn!("{}", diagnostic);
        }
    }
}

/// The result of reconciling an edited todo list
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub steps: Vec<Step>,
    pub diagnostics: Diagnostics,
}

impl Reconciled {
    pub fn into_inner(self) -> Vec<Step> {
        self.steps
    }
}

/// Where the parser is relative to the trailing index step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Scanning,
    IndexSeen,
}

/// Builds the initial todo list: one pick per commit in order, then an index
/// step for `index` if given.
pub fn build_todos<I>(commits: I, index: Option<Commit>) -> Vec<Step>
where
    I: IntoIterator<Item = Commit>,
{
    let mut steps: Vec<Step> = commits
        .into_iter()
        .map(|commit| Step::new(StepKind::Pick, commit))
        .collect();
    if let Some(index) = index {
        steps.push(Step::new(StepKind::Index, index));
    }
    steps
}

/// Renders steps one per line
pub fn format_todos(steps: &[Step]) -> String {
    steps
        .iter()
        .map(|step| step.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses an edited todo buffer and compares it against the `original` list.
///
/// Blank and comment lines are skipped. The first malformed line, unknown commit
/// or out-of-place index step fails the whole pass. Duplicate, missing and added
/// commits are only recorded in the returned diagnostics.
pub fn parse_todos<R>(
    original: &[Step],
    response: &[u8],
    resolver: &R,
) -> Result<Reconciled, TodoError>
where
    R: CommitResolver + ?Sized,
{
    let text = String::from_utf8_lossy(response);

    let mut steps: Vec<Step> = Vec::new();
    let mut diagnostics = Diagnostics::default();
    let mut seen: HashSet<Commit> = HashSet::new();
    let mut state = ParseState::Scanning;

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(COMMENT_CHAR) {
            continue;
        }

        let number = i + 1;
        let step = Step::parse(line, resolver).map_err(|source| TodoError::InvalidLine {
            number,
            line: line.to_string(),
            source,
        })?;
        debug!(number, kind = %step.kind(), commit = %step.commit().short_id(), "parsed todo");

        if !seen.insert(step.commit().clone()) {
            diagnostics.push(Diagnostic::Duplicate(step.commit().clone()));
        }

        state = match (state, step.kind()) {
            (_, StepKind::Index) => ParseState::IndexSeen,
            (ParseState::IndexSeen, _) => {
                return Err(TodoError::IndexNotLast {
                    number,
                    line: line.to_string(),
                });
            }
            (ParseState::Scanning, _) => ParseState::Scanning,
        };

        steps.push(step);
    }

    // `seen` now holds every commit in the result
    let before: HashSet<&Commit> = original.iter().map(Step::commit).collect();

    let mut reported = HashSet::new();
    for commit in original.iter().map(Step::commit) {
        if !seen.contains(commit) && reported.insert(commit) {
            diagnostics.push(Diagnostic::Missing(commit.clone()));
        }
    }
    for commit in steps.iter().map(Step::commit) {
        if !before.contains(commit) && reported.insert(commit) {
            diagnostics.push(Diagnostic::Added(commit.clone()));
        }
    }

    Ok(Reconciled { steps, diagnostics })
}

/// Opens `todos` in `editor` and returns the list the user saved.
///
/// Diagnostics are logged once the whole response has been parsed. An empty
/// result is returned as-is; deciding whether it means "abort" is up to the caller.
#[instrument(skip_all, fields(count = todos.len()))]
pub fn edit_todos<E, R>(todos: Vec<Step>, editor: &E, resolver: &R) -> Result<Vec<Step>, TodoError>
where
    E: Editor + ?Sized,
    R: CommitResolver + ?Sized,
{
    let body = format_todos(&todos);
    let help = todo_help(todos.len());
    let response = editor.edit(TODO_LABEL, body.as_bytes(), &help)?;

    let reconciled = parse_todos(&todos, &response, resolver)?;
    reconciled.diagnostics.flush();
    if reconciled.steps.is_empty() {
        info!("edited todo list is empty");
    }
    Ok(reconciled.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odb::{OdbError, Oid};
    use pretty_assertions::assert_eq;

    /// Resolves tokens that are a prefix of one of its commits
    struct Commits(Vec<Commit>);

    impl CommitResolver for Commits {
        fn resolve(&self, token: &str) -> Result<Commit, OdbError> {
            self.0
                .iter()
                .find(|c| c.oid().as_str().starts_with(token))
                .cloned()
                .ok_or_else(|| OdbError::UnknownCommit(token.to_string()))
        }
    }

    fn commit(hex: &str, summary: &str) -> Commit {
        Commit::new(hex.parse::<Oid>().unwrap(), summary)
    }

    fn repo() -> Commits {
        Commits(vec![
            commit("aaaaaaa1", "first"),
            commit("bbbbbbb2", "second"),
            commit("ccccccc3", "third"),
        ])
    }

    fn kinds(steps: &[Step]) -> Vec<(StepKind, &str)> {
        steps
            .iter()
            .map(|s| (s.kind(), s.commit().short_id()))
            .collect()
    }

    #[test]
    fn test_format_todos_one_line_per_step() {
        let r = repo();
        let steps = build_todos(r.0.clone(), None);
        assert_eq!(
            format_todos(&steps),
            "pick aaaaaaa first\npick bbbbbbb second\npick ccccccc third"
        );
        assert_eq!(format_todos(&[]), "");
    }

    #[test]
    fn test_comment_lines_are_skipped() {
        let r = repo();
        let response = b"pick aaaa first\n\n# Interactive Zipfix Todos (1 commands)\n  # indented\n";
        let reconciled = parse_todos(&[], response, &r).unwrap();
        assert_eq!(kinds(&reconciled.steps), vec![(StepKind::Pick, "aaaaaaa")]);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let r = repo();
        let response = b"pick aaaa caf\xff summary\n";
        let reconciled = parse_todos(&[], response, &r).unwrap();
        assert_eq!(reconciled.steps.len(), 1);
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let r = repo();
        let err = parse_todos(&[], b"pick aaaa\n\nsquash bbbb\n", &r).unwrap_err();
        match err {
            TodoError::InvalidLine { number, line, source } => {
                assert_eq!(number, 3);
                assert_eq!(line, "squash bbbb");
                assert!(matches!(source, StepError::InvalidKind(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_index_not_last_names_offending_line() {
        let r = repo();
        let response = b"index aaaa\n\ti bbbb\n\t\r\n#note\npick cccc\n";
        let err = parse_todos(&[], response, &r).unwrap_err();
        assert!(matches!(err, TodoError::IndexNotLast { number: 5, .. }));
        assert_eq!(
            err.to_string(),
            "line 5: non-index todo 'pick cccc' follows an index todo"
        );
    }

    #[test]
    fn test_repeated_index_lines_are_accepted() {
        let r = repo();
        let reconciled = parse_todos(&[], b"pick aaaa\nindex bbbb\ni cccc\n", &r).unwrap();
        assert_eq!(
            kinds(&reconciled.steps),
            vec![
                (StepKind::Pick, "aaaaaaa"),
                (StepKind::Index, "bbbbbbb"),
                (StepKind::Index, "ccccccc"),
            ]
        );
    }

    #[test]
    fn test_missing_reported_once_per_commit() {
        let r = repo();
        let original = vec![
            Step::new(StepKind::Pick, r.0[0].clone()),
            Step::new(StepKind::Fixup, r.0[0].clone()),
        ];
        let reconciled = parse_todos(&original, b"", &r).unwrap();
        assert!(reconciled.steps.is_empty());
        assert_eq!(
            reconciled.diagnostics.iter().cloned().collect::<Vec<_>>(),
            vec![Diagnostic::Missing(r.0[0].clone())]
        );
    }

    #[test]
    fn test_diagnostic_messages() {
        let c = commit("0123456789", "Fix things");
        assert_eq!(
            Diagnostic::Duplicate(c.clone()).to_string(),
            "commit 0123456 Fix things referenced multiple times"
        );
        assert_eq!(
            Diagnostic::Missing(c.clone()).to_string(),
            "commit 0123456 Fix things missing from todo list"
        );
        assert_eq!(
            Diagnostic::Added(c).to_string(),
            "commit 0123456 Fix things not in original todo list"
        );
    }
}
