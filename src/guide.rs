//! Help text shown alongside the todo list
//!
//! The todo buffer carries a comment header explaining the available commands and
//! what editing the list does. The command table is generated from `StepKind` so
//! the help and the parser always agree on the vocabulary.

use crate::step::StepKind;

/// Generate the comment header for a todo list with `count` commands
pub fn todo_help(count: usize) -> String {
    format!(
        r#"Interactive Zipfix Todos ({count} commands)

{commands}

{ordering}

{removal}"#,
        commands = get_commands_section(),
        ordering = get_ordering_section(),
        removal = get_removal_section(),
    )
}

fn get_commands_section() -> String {
    let mut section = String::from("Commands:");
    for kind in StepKind::ALL {
        section.push_str(&format!(
            "\n {}, {} <commit> = {}",
            kind.abbreviation(),
            kind.as_str(),
            kind.description()
        ));
    }
    section
}

fn get_ordering_section() -> &'static str {
    "These lines can be re-ordered; they are executed from top to bottom."
}

fn get_removal_section() -> &'static str {
    r#"If a line is removed, it will be treated like an 'index' line.

However, if you remove everything, these changes will be aborted."#
}
