//! Editor invocation
//!
//! The todo list is handed to a human through an `Editor`. `ExternalEditor`
//! writes the buffer to a temporary file, runs the user's editor against it and
//! returns whatever was saved.

use std::io::Write;
use std::process::Command;

use tracing::{debug, instrument};

/// Character that starts a comment line in an editor buffer
pub const COMMENT_CHAR: char = '#';

/// Errors raised while running the editor
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("editor I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no editor configured")]
    NoEditor,

    #[error("could not parse editor command '{0}'")]
    InvalidCommand(String),

    #[error("editor '{editor}' exited with {status}")]
    EditorFailed { editor: String, status: String },
}

/// Lets a human edit a buffer.
///
/// `body` is the editable content; `comments` is help text that the
/// implementation shows as comment lines. The saved content is returned
/// verbatim, comment lines included.
pub trait Editor {
    fn edit(&self, label: &str, body: &[u8], comments: &str) -> Result<Vec<u8>, EditorError>;
}

impl<F> Editor for F
where
    F: Fn(&str, &[u8], &str) -> Result<Vec<u8>, EditorError>,
{
    fn edit(&self, label: &str, body: &[u8], comments: &str) -> Result<Vec<u8>, EditorError> {
        self(label, body, comments)
    }
}

/// Builds the buffer shown to the user: the body, a blank line, then the
/// dedented comment text with every line prefixed by `#`.
pub fn render_buffer(body: &[u8], comments: &str) -> Vec<u8> {
    let mut buffer = body.to_vec();
    if !buffer.is_empty() && !buffer.ends_with(b"\n") {
        buffer.push(b'\n');
    }

    let comments = dedent(comments);
    if comments.trim().is_empty() {
        return buffer;
    }

    buffer.push(b'\n');
    for line in comments.trim_matches('\n').lines() {
        let line = line.trim_end();
        if line.is_empty() {
            buffer.extend_from_slice(COMMENT_CHAR.to_string().as_bytes());
        } else {
            buffer.extend_from_slice(format!("{COMMENT_CHAR} {line}").as_bytes());
        }
        buffer.push(b'\n');
    }
    buffer
}

/// Removes the common leading whitespace of all non-blank lines
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs a user-configured editor command in a subprocess.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: Vec<String>,
}

impl ExternalEditor {
    /// Creates an editor from a shell-style command string such as `code --wait`
    pub fn new(command: &str) -> Result<Self, EditorError> {
        let parts = shell_words::split(command)
            .map_err(|_| EditorError::InvalidCommand(command.to_string()))?;
        if parts.is_empty() {
            return Err(EditorError::NoEditor);
        }
        Ok(Self { command: parts })
    }

    /// Returns the program and its leading arguments
    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl Editor for ExternalEditor {
    #[instrument(skip(self, body, comments))]
    fn edit(&self, label: &str, body: &[u8], comments: &str) -> Result<Vec<u8>, EditorError> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{label}-"))
            .suffix(".txt")
            .tempfile()?;
        file.write_all(&render_buffer(body, comments))?;
        file.flush()?;

        let (program, args) = self.command.split_first().ok_or(EditorError::NoEditor)?;
        debug!(editor = %program, path = %file.path().display(), "launching editor");

        let status = Command::new(program)
            .args(args)
            .arg(file.path())
            .status()?;
        if !status.success() {
            return Err(EditorError::EditorFailed {
                editor: self.command.join(" "),
                status: status.to_string(),
            });
        }

        // Editors may replace the file rather than write in place, so read by path
        let response = std::fs::read(file.path())?;
        debug!(bytes = response.len(), "editor closed");
        Ok(response)
    }
}
