//! Configuration
//!
//! Settings for a zipfix run: which repository to work in and which editor to
//! open the todo list with.

use std::path::PathBuf;

use tracing::debug;

use crate::odb::{OdbError, Repository};

/// Editor used when nothing else is configured
pub const DEFAULT_EDITOR: &str = "vi";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory inside the repository to operate on
    pub repo_dir: PathBuf,
    /// Editor command given on the command line or through `GIT_EDITOR`
    pub editor: Option<String>,
}

impl Config {
    /// Works out the editor command, following git's precedence:
    /// `GIT_EDITOR`, `core.editor`, `VISUAL`, `EDITOR`, then `vi`.
    pub fn editor_command(&self, repo: &Repository) -> Result<String, OdbError> {
        let core_editor = repo.config_value("core.editor")?;
        let editor = resolve_editor(self.editor.as_deref(), core_editor.as_deref(), |var| {
            std::env::var(var).ok()
        });
        debug!(%editor, "resolved editor");
        Ok(editor)
    }
}

fn resolve_editor<F>(explicit: Option<&str>, core_editor: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(editor) = explicit.filter(|v| is_set(v)) {
        return editor.to_string();
    }
    if let Some(editor) = core_editor.filter(|v| is_set(v)) {
        return editor.to_string();
    }
    for var in ["VISUAL", "EDITOR"] {
        if let Some(editor) = env(var).filter(|v| is_set(v)) {
            return editor;
        }
    }
    DEFAULT_EDITOR.to_string()
}

fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}
