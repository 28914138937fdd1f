//! Zipfix library crate
//!
//! This library plans interactive history edits: it turns a range of commits into
//! an editable todo list, hands it to the user's editor and parses the result back
//! into a validated, ordered list of steps.

pub mod cli;
pub mod config;
pub mod editor;
pub mod guide;
pub mod odb;
pub mod step;
pub mod todo;

// Re-export commonly used types
pub use config::Config;
pub use editor::{Editor, EditorError, ExternalEditor};
pub use odb::{Commit, CommitResolver, OdbError, Oid, Repository};
pub use step::{Step, StepError, StepKind};
pub use todo::{
    build_todos, edit_todos, format_todos, parse_todos, Diagnostic, Diagnostics, Reconciled,
    TodoError,
};
