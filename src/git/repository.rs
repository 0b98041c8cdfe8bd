use crate::config;
use crate::error::BlamebotError;
use crate::git::repo_storage::RepoStorage;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub struct Repository {
    git_dir: PathBuf,
    workdir: PathBuf,
    pub storage: RepoStorage,
}

impl Repository {
    pub fn new(workdir: PathBuf, git_dir: PathBuf) -> Self {
        let storage = RepoStorage::for_repo_path(&git_dir);
        Repository {
            git_dir,
            workdir,
            storage,
        }
    }

    pub fn path(&self) -> &Path {
        &self.git_dir
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Build git args rooted at this repository's working tree.
    pub fn global_args_for_exec(&self) -> Vec<String> {
        vec![
            "-C".to_string(),
            self.workdir.to_string_lossy().to_string(),
        ]
    }

    /// Contents of `path` (repo-relative) at `rev`, e.g. `HEAD`.
    /// Decoded the same way as [`Repository::read_working_file`].
    pub fn show_file(&self, rev: &str, path: &str) -> Result<String, BlamebotError> {
        let mut args = self.global_args_for_exec();
        args.push("show".to_string());
        args.push(format!("{}:{}", rev, normalize_repo_path(path)));
        let output = exec_git(&args)?;
        Ok(decode_content(output.stdout))
    }

    /// Working tree contents of `path` (repo-relative). Invalid UTF-8 is
    /// replaced rather than rejected so every file can be snapshotted.
    pub fn read_working_file(&self, path: &str) -> Result<String, BlamebotError> {
        let bytes = fs::read(self.workdir.join(path))?;
        Ok(decode_content(bytes))
    }

    /// Convert `path` (absolute, or relative to the current directory) to a
    /// repo-relative path with forward slashes.
    pub fn relativize_path(&self, path: &str) -> String {
        let candidate = Path::new(path);
        let absolute = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(candidate),
                Err(_) => return normalize_repo_path(path),
            }
        };

        let workdir = fs::canonicalize(&self.workdir).unwrap_or_else(|_| self.workdir.clone());
        let absolute = canonicalize_lenient(&absolute);
        match absolute.strip_prefix(&workdir) {
            Ok(relative) => normalize_repo_path(&relative.to_string_lossy()),
            Err(_) => normalize_repo_path(path),
        }
    }
}

/// Canonicalize as much of `path` as exists; the file itself may not exist yet.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => canonicalize_lenient(parent).join(name),
        _ => path.to_path_buf(),
    }
}

fn decode_content(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn normalize_repo_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches("./").to_string()
}

pub fn find_repository_in_path(path: &str) -> Result<Repository, BlamebotError> {
    let args = vec![
        "-C".to_string(),
        path.to_string(),
        "rev-parse".to_string(),
        "--show-toplevel".to_string(),
        "--absolute-git-dir".to_string(),
    ];
    let output = exec_git(&args)?;
    let stdout = String::from_utf8(output.stdout)?;
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());

    let (Some(workdir), Some(git_dir)) = (lines.next(), lines.next()) else {
        return Err(BlamebotError::Generic(format!(
            "Could not determine repository layout for {}",
            path
        )));
    };

    Ok(Repository::new(PathBuf::from(workdir), PathBuf::from(git_dir)))
}

pub fn exec_git(args: &[String]) -> Result<Output, BlamebotError> {
    let output = Command::new(config::Config::get().git_cmd())
        .args(args)
        .output()?;

    if !output.status.success() {
        let code = output.status.code();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(BlamebotError::GitCliError {
            code,
            stderr,
            args: args.to_vec(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_repo_path() {
        assert_eq!(normalize_repo_path("./src/main.rs"), "src/main.rs");
        assert_eq!(normalize_repo_path("src\\lib.rs"), "src/lib.rs");
        assert_eq!(normalize_repo_path("README.md"), "README.md");
    }

    #[test]
    fn test_relativize_absolute_path_inside_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().to_path_buf(), dir.path().join(".git"));

        let absolute = dir.path().join("src").join("new_file.rs");
        assert_eq!(
            repo.relativize_path(&absolute.to_string_lossy()),
            "src/new_file.rs"
        );
    }

    #[test]
    fn test_relativize_path_outside_workdir_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().join("repo"), dir.path().join("repo/.git"));
        assert_eq!(repo.relativize_path("/elsewhere/file.rs"), "/elsewhere/file.rs");
    }

    #[test]
    fn test_read_working_file_replaces_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().to_path_buf(), dir.path().join(".git"));
        std::fs::write(dir.path().join("latin1.txt"), b"caf\xe9\nok").unwrap();

        let content = repo.read_working_file("latin1.txt").unwrap();
        assert_eq!(content, "caf\u{FFFD}\nok");
    }

    #[test]
    fn test_read_working_file_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::new(dir.path().to_path_buf(), dir.path().join(".git"));
        assert!(repo.read_working_file("nope.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_storage_lives_under_git_dir() {
        let repo = Repository::new(PathBuf::from("/work"), PathBuf::from("/work/.git"));
        assert_eq!(repo.path(), Path::new("/work/.git"));
        assert_eq!(repo.workdir(), Path::new("/work"));
        assert_eq!(
            repo.storage.checkpoints,
            PathBuf::from("/work/.git/blamebot/checkpoints")
        );
    }
}
