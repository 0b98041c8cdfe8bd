/// End-to-end tests for the git-blamebot command line:
/// command routing, checkpoint recording, attribution output and clearing.
mod repos;

use predicates::prelude::*;
use repos::test_repo::TestRepo;

#[test]
fn test_help_variants() {
    let repo = TestRepo::new();
    for arg in ["help", "--help", "-h"] {
        repo.blamebot_cmd(&[arg])
            .assert()
            .success()
            .stderr(predicate::str::contains("Usage: git-blamebot <command>"));
    }
}

#[test]
fn test_no_args_shows_help() {
    let repo = TestRepo::new();
    repo.blamebot_cmd(&[])
        .assert()
        .success()
        .stderr(predicate::str::contains("Commands:"));
}

#[test]
fn test_version_command() {
    let repo = TestRepo::new();
    repo.blamebot_cmd(&["--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_command_fails() {
    let repo = TestRepo::new();
    repo.blamebot_cmd(&["frobnicate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown git-blamebot command"));
}

#[test]
fn test_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::Command::cargo_bin("git-blamebot").unwrap();
    cmd.args(["attribute"])
        .current_dir(dir.path())
        .env("GIT_CEILING_DIRECTORIES", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not inside a git repository"));
}

#[test]
fn test_checkpoint_usage_errors_fail() {
    let repo = TestRepo::new();
    repo.blamebot_cmd(&["checkpoint", "pre-edit", "a.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tool-use-id"));
    repo.blamebot_cmd(&["checkpoint", "post-edit", "a.txt", "--tool-use-id", "t1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--edit-id"));
}

#[test]
fn test_post_edit_reports_changed_lines() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\ntwo\nthree\n");
    repo.commit_all("initial");

    repo.pre_edit("a.txt", "t1");
    repo.write_file("a.txt", "one\ntwo\nbot line\nthree\n");
    let output = repo.post_edit("a.txt", "t1", "e1");

    assert!(
        output.contains("1 line(s) changed: 3"),
        "unexpected post-edit output: {}",
        output
    );
}

#[test]
fn test_attribute_single_edit() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\ntwo\nthree\n");
    repo.commit_all("initial");

    repo.automated_edit("a.txt", "one\ntwo\nbot line\nthree\n", "t1", "e1");

    let output = repo.blamebot(&["attribute"]).unwrap();
    assert_eq!(output, "a.txt\n  e1 3\n");
}

#[test]
fn test_attribute_follows_later_human_edits() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\ntwo\nthree\n");
    repo.commit_all("initial");

    repo.automated_edit("a.txt", "one\ntwo\nbot line\nthree\n", "t1", "e1");
    // Human inserts two lines at the top after the automated edit.
    repo.write_file("a.txt", "header\n\none\ntwo\nbot line\nthree\n");

    let output = repo.blamebot(&["attribute", "a.txt"]).unwrap();
    assert_eq!(output, "a.txt\n  e1 5\n");
}

#[test]
fn test_attribute_new_file() {
    let repo = TestRepo::new();
    repo.write_file("README.md", "readme\n");
    repo.commit_all("initial");

    repo.automated_edit("src/new.txt", "alpha\nbeta", "t1", "e2");

    let output = repo.blamebot(&["attribute"]).unwrap();
    assert_eq!(output, "src/new.txt\n  e2 1-2\n");
}

#[test]
fn test_attribute_json_output() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\ntwo\nthree\n");
    repo.commit_all("initial");

    repo.automated_edit("a.txt", "one\ntwo\nbot line\nthree\n", "t1", "e1");
    repo.automated_edit("a.txt", "one\ntwo\nbot line\nthree\nsecond bot\n", "t2", "e2");

    let output = repo.blamebot(&["attribute", "--json"]).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["a.txt"]["e1"], "3");
    assert_eq!(value["a.txt"]["e2"], "5");
}

#[test]
fn test_attribute_without_checkpoints_is_empty() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\n");
    repo.commit_all("initial");

    repo.blamebot_cmd(&["attribute"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_attribute_skips_deleted_files() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\n");
    repo.commit_all("initial");

    repo.automated_edit("a.txt", "one\nbot\n", "t1", "e1");
    std::fs::remove_file(repo.file_path("a.txt")).unwrap();

    repo.blamebot_cmd(&["attribute"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_clear_removes_checkpoints() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\n");
    repo.commit_all("initial");

    repo.automated_edit("a.txt", "one\nbot\n", "t1", "e1");
    assert_eq!(repo.blamebot(&["attribute"]).unwrap(), "a.txt\n  e1 2\n");

    repo.blamebot_cmd(&["clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared checkpoint log"));

    assert_eq!(repo.blamebot(&["attribute"]).unwrap(), "");
    assert_eq!(repo.read_file("a.txt"), "one\nbot\n");
}

#[test]
fn test_clear_removes_log_files() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\n");
    repo.commit_all("initial");

    for i in 1..=5 {
        let contents = format!("one\n{}\n", "bot\n".repeat(i));
        repo.automated_edit("a.txt", &contents, &format!("t{}", i), &format!("e{}", i));
    }
    repo.blamebot(&["attribute"]).unwrap();
    repo.blamebot(&["attribute", "--json"]).unwrap();
    assert!(repo.log_file_count() > 0);

    repo.blamebot_cmd(&["clear"]).assert().success();

    assert_eq!(repo.log_file_count(), 0);
    assert_eq!(repo.blamebot(&["attribute"]).unwrap(), "");
}

#[test]
fn test_checkpoints_do_not_write_logs() {
    let repo = TestRepo::new();
    repo.write_file("a.txt", "one\n");
    repo.commit_all("initial");

    repo.automated_edit("a.txt", "one\nbot\n", "t1", "e1");
    repo.automated_edit("a.txt", "one\nbot\nbot two\n", "t2", "e2");

    assert_eq!(repo.log_file_count(), 0);
}
