//! CLI module
//!
//! This module provides the command-line interface for zipfix. It plans a todo
//! list for a range of commits and prints the result; applying the plan is left
//! to other tooling.

use std::io;
use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use colored::Colorize;
use tracing::{info, Level};

use crate::{
    config::Config,
    editor::ExternalEditor,
    odb::Repository,
    step::{Step, StepKind},
    todo::{build_todos, edit_todos},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,

    /// Editor command used for the todo list
    #[arg(long, env = "GIT_EDITOR")]
    editor: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and edit the todo list for the commits after <BASE>
    Todo {
        /// Exclusive lower bound of the commit range
        base: String,

        /// Inclusive upper bound of the commit range
        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Append the staged changes as a trailing index step
        #[arg(short, long)]
        index: bool,

        /// Print the initial todo list without opening an editor
        #[arg(long)]
        no_edit: bool,

        /// Output format for the resulting plan
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Errors raised by the command line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("todo list is empty, aborting")]
    EmptyPlan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            repo_dir: self.repo.clone(),
            editor: self.editor.clone(),
        }
    }
}

/// Run the CLI application
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Todo {
            base,
            head,
            index,
            no_edit,
            format,
        } => {
            let config = cli.config();
            let repo = Repository::open(&config.repo_dir)?;

            let commits = repo.commits_between(base, head)?;
            let index_commit = if *index { repo.index_commit()? } else { None };
            let todos = build_todos(commits, index_commit);
            info!(count = todos.len(), "built todo list");

            let steps = if *no_edit {
                todos
            } else {
                let editor = ExternalEditor::new(&config.editor_command(&repo)?)?;
                edit_todos(todos, &editor, &repo)?
            };

            let steps = check_plan(steps)?;
            print_plan(&steps, *format)?;
            Ok(())
        }

        Commands::Completions { shell } => {
            // Generate completions for the specified shell
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Rejects an empty plan: a cleared todo list means the user aborted
fn check_plan(steps: Vec<Step>) -> Result<Vec<Step>, CliError> {
    if steps.is_empty() {
        return Err(CliError::EmptyPlan);
    }
    Ok(steps)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn print_plan(steps: &[Step], format: OutputFormat) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(steps)?);
        }
        OutputFormat::Text => {
            for step in steps {
                println!(
                    "{} {} {}",
                    colored_kind(step.kind()),
                    step.commit().short_id().dimmed(),
                    step.commit().summary_line()
                );
            }
        }
    }
    Ok(())
}

fn colored_kind(kind: StepKind) -> colored::ColoredString {
    let word = format!("{:<6}", kind.as_str());
    match kind {
        StepKind::Pick => word.green(),
        StepKind::Fixup => word.yellow(),
        StepKind::Reword => word.cyan(),
        StepKind::Index => word.magenta(),
    }
}
