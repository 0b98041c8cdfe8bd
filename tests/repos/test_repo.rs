use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway git repository with a committer identity configured.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let repo = TestRepo { dir };
        repo.git(&["init", "-q"]).expect("git init failed");
        repo.git(&["config", "user.name", "Test User"])
            .expect("git config failed");
        repo.git(&["config", "user.email", "test@example.com"])
            .expect("git config failed");
        repo.git(&["config", "commit.gpgsign", "false"])
            .expect("git config failed");
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_file(&self, name: &str, contents: &str) {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(path, contents).expect("failed to write file");
    }

    pub fn read_file(&self, name: &str) -> String {
        fs::read_to_string(self.file_path(name)).expect("failed to read file")
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]).expect("git add failed");
        self.git(&["commit", "-q", "-m", message])
            .expect("git commit failed");
    }

    /// Number of files in `.git/blamebot/logs` (zero when the directory is gone).
    pub fn log_file_count(&self) -> usize {
        fs::read_dir(self.path().join(".git").join("blamebot").join("logs"))
            .map(|entries| entries.filter_map(|entry| entry.ok()).count())
            .unwrap_or(0)
    }

    pub fn git(&self, args: &[&str]) -> Result<String, String> {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).to_string())
        }
    }

    /// A `git-blamebot` command rooted in this repository.
    pub fn blamebot_cmd(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("git-blamebot").expect("binary not built");
        cmd.args(args).current_dir(self.path());
        cmd
    }

    /// Run `git-blamebot`, returning stdout on success and stderr on failure.
    pub fn blamebot(&self, args: &[&str]) -> Result<String, String> {
        let output = self
            .blamebot_cmd(args)
            .output()
            .map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).to_string())
        }
    }

    pub fn pre_edit(&self, file: &str, tool_use_id: &str) {
        self.blamebot(&["checkpoint", "pre-edit", file, "--tool-use-id", tool_use_id])
            .expect("pre-edit checkpoint failed");
    }

    pub fn post_edit(&self, file: &str, tool_use_id: &str, edit_id: &str) -> String {
        self.blamebot(&[
            "checkpoint",
            "post-edit",
            file,
            "--tool-use-id",
            tool_use_id,
            "--edit-id",
            edit_id,
        ])
        .expect("post-edit checkpoint failed")
    }

    /// Simulate an automated edit: checkpoint, write, checkpoint.
    pub fn automated_edit(&self, file: &str, contents: &str, tool_use_id: &str, edit_id: &str) {
        self.pre_edit(file, tool_use_id);
        self.write_file(file, contents);
        self.post_edit(file, tool_use_id, edit_id);
    }
}
