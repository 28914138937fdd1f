//! Todo steps
//!
//! This module defines the verbs a todo line may carry and the `Step` type that
//! pairs a verb with a commit, along with the one-line text form of each.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::odb::{Commit, CommitResolver, OdbError};

/// Errors raised while parsing a single todo line
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("step kind '{0}' must be one of: pick, fixup, reword, or index")]
    InvalidKind(String),

    #[error("step kind '{token}' is ambiguous between: {}", .candidates.join(", "))]
    AmbiguousKind {
        token: String,
        candidates: Vec<&'static str>,
    },

    #[error("todo entry '{0}' must follow format <keyword> <sha> <optional message>")]
    MalformedLine(String),

    #[error(transparent)]
    UnknownCommit(#[from] OdbError),
}

/// The verb of a todo line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Use the commit as-is
    Pick,
    /// Fuse the commit's changes into the previous commit
    Fixup,
    /// Use the commit, but edit its message
    Reword,
    /// Leave the commit's changes unstaged
    Index,
}

impl StepKind {
    /// All kinds in parse order. When a token prefixes several keywords, this is
    /// the order they are reported in.
    pub const ALL: [StepKind; 4] = [
        StepKind::Pick,
        StepKind::Fixup,
        StepKind::Reword,
        StepKind::Index,
    ];

    /// Returns the canonical keyword
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Pick => "pick",
            StepKind::Fixup => "fixup",
            StepKind::Reword => "reword",
            StepKind::Index => "index",
        }
    }

    /// Returns the shortest accepted abbreviation
    pub fn abbreviation(self) -> &'static str {
        &self.as_str()[..1]
    }

    /// Returns what the step does, as shown in the todo help text
    pub fn description(self) -> &'static str {
        match self {
            StepKind::Pick => "use commit",
            StepKind::Fixup => "use commit, but fuse changes into previous commit",
            StepKind::Reword => "use commit, but edit the commit message",
            StepKind::Index => "leave commit changes unstaged",
        }
    }

    /// Parses a keyword or any unambiguous prefix of one.
    pub fn parse(token: &str) -> Result<Self, StepError> {
        let word = match_keyword(token, &Self::ALL.map(StepKind::as_str))?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == word)
            .ok_or_else(|| StepError::InvalidKind(token.to_string()))
    }
}

/// Returns the words in `words` that start with `token`, keeping their order
fn prefix_matches<'a>(token: &str, words: &[&'a str]) -> Vec<&'a str> {
    words
        .iter()
        .copied()
        .filter(|word| word.starts_with(token))
        .collect()
}

/// Picks the single keyword `token` abbreviates
fn match_keyword(token: &str, words: &[&'static str]) -> Result<&'static str, StepError> {
    if token.is_empty() {
        return Err(StepError::InvalidKind(String::new()));
    }

    let candidates = prefix_matches(token, words);
    if candidates.len() > 1 {
        return Err(StepError::AmbiguousKind {
            token: token.to_string(),
            candidates,
        });
    }
    candidates
        .first()
        .copied()
        .ok_or_else(|| StepError::InvalidKind(token.to_string()))
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepKind {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A single entry in the todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    kind: StepKind,
    commit: Commit,
}

impl Step {
    /// Creates a new step
    pub fn new(kind: StepKind, commit: Commit) -> Self {
        Self { kind, commit }
    }

    /// Gets the kind of this step
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Gets the commit this step applies
    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    /// Parses a todo line of the form `<keyword> <sha> [message]`.
    ///
    /// The message is ignored; the commit is looked up through `resolver`.
    pub fn parse<R: CommitResolver + ?Sized>(line: &str, resolver: &R) -> Result<Self, StepError> {
        let mut tokens = line.split_whitespace();
        let (Some(keyword), Some(hash)) = (tokens.next(), tokens.next()) else {
            return Err(StepError::MalformedLine(line.to_string()));
        };

        let kind = StepKind::parse(keyword)?;
        let commit = resolver.resolve(hash)?;
        Ok(Self::new(kind, commit))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.kind,
            self.commit.short_id(),
            self.commit.summary_line()
        )
    }
}
