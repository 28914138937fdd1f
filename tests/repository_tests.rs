use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use zipfix::{
    build_todos, format_todos, parse_todos, CommitResolver, OdbError, Repository, StepKind,
};

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .output()
        .expect("spawn git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

/// Creates a repository with commits "base", "one", "two"
fn fixture() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.name", "Test"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    for name in ["base", "one", "two"] {
        std::fs::write(dir.path().join(name), name).expect("write file");
        git(dir.path(), &["add", name]);
        git(dir.path(), &["commit", "-q", "-m", name]);
    }
    dir
}

#[test]
fn test_commits_between_lists_oldest_first() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();
    assert!(repo.git_dir().ends_with(".git"));

    let commits = repo.commits_between("HEAD~2", "HEAD").unwrap();
    let summaries: Vec<&str> = commits.iter().map(|c| c.summary_line()).collect();
    assert_eq!(summaries, vec!["one", "two"]);
}

#[test]
fn test_resolve_short_and_unknown() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();

    let head = repo.resolve("HEAD").unwrap();
    let by_short = repo.resolve(head.short_id()).unwrap();
    assert_eq!(by_short, head);
    assert_eq!(by_short.summary_line(), "two");

    assert!(matches!(
        repo.resolve("no-such-ref"),
        Err(OdbError::UnknownCommit(_))
    ));
}

#[test]
fn test_index_commit_only_when_staged() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();
    assert!(repo.index_commit().unwrap().is_none());

    std::fs::write(dir.path().join("one"), "changed").unwrap();
    git(dir.path(), &["add", "one"]);

    let index = repo.index_commit().unwrap().expect("index commit");
    assert_eq!(index.summary_line(), "<git index>");
    let parent = git(dir.path(), &["rev-parse", &format!("{}^", index.oid())]);
    assert_eq!(parent, repo.resolve("HEAD").unwrap().oid().as_str());
}

#[test]
fn test_todo_round_trip_through_git() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();

    let todos = build_todos(repo.commits_between("HEAD~2", "HEAD").unwrap(), None);
    let text = format_todos(&todos);
    let reconciled = parse_todos(&todos, text.as_bytes(), &repo).unwrap();

    assert_eq!(reconciled.steps, todos);
    assert!(reconciled.steps.iter().all(|s| s.kind() == StepKind::Pick));
    assert!(reconciled.diagnostics.is_empty());
}

#[test]
fn test_config_value() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();
    git(dir.path(), &["config", "core.editor", "nano -w"]);

    assert_eq!(
        repo.config_value("core.editor").unwrap().as_deref(),
        Some("nano -w")
    );
    assert_eq!(repo.config_value("zipfix.unset").unwrap(), None);
}

#[test]
fn test_broken_config_is_a_git_error() {
    if !git_available() {
        return;
    }
    let dir = fixture();
    let repo = Repository::open(dir.path()).unwrap();
    std::fs::write(repo.git_dir().join("config"), "[core\nbroken").unwrap();

    assert!(matches!(
        repo.config_value("core.editor"),
        Err(OdbError::Git { .. })
    ));
    assert!(matches!(repo.index_commit(), Err(OdbError::Git { .. })));
}
