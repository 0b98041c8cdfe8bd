use crate::authorship::working_log::{Checkpoint, InMemoryCheckpointLog};
use crate::error::BlamebotError;
use crate::observability::log_error;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk layout under `<git-dir>/blamebot/`.
pub struct RepoStorage {
    pub repo_path: PathBuf,
    pub checkpoints: PathBuf,
    pub logs: PathBuf,
}

impl RepoStorage {
    /// `repo_path` is the git directory. Nothing is created until first write.
    pub fn for_repo_path(repo_path: &Path) -> RepoStorage {
        let blamebot_dir = repo_path.join("blamebot");
        RepoStorage {
            repo_path: repo_path.to_path_buf(),
            checkpoints: blamebot_dir.join("checkpoints"),
            logs: blamebot_dir.join("logs"),
        }
    }

    pub fn ensure_storage_directories(&self) -> Result<(), BlamebotError> {
        fs::create_dir_all(&self.checkpoints)?;
        fs::create_dir_all(&self.logs)?;
        Ok(())
    }

    pub fn checkpoint_log(&self) -> PersistedCheckpointLog {
        PersistedCheckpointLog::new(self.checkpoints.clone())
    }

    /// Remove every checkpoint, blob and log file.
    pub fn clear(&self) -> Result<(), BlamebotError> {
        self.checkpoint_log().reset_checkpoint_log()?;
        remove_dir_if_exists(&self.logs)
    }
}

/// Checkpoint records (`<id>.json`) plus the content-addressed blob store
/// (`blobs/<sha256>`) that they reference.
pub struct PersistedCheckpointLog {
    pub dir: PathBuf,
}

impl PersistedCheckpointLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.dir.join("blobs")
    }

    /// Remove every checkpoint and blob.
    pub fn reset_checkpoint_log(&self) -> Result<(), BlamebotError> {
        remove_dir_if_exists(&self.dir)
    }

    /* blob storage */
    pub fn get_file_version(&self, sha: &str) -> Result<String, BlamebotError> {
        if !is_content_sha(sha) {
            return Err(BlamebotError::BlobNotFound(sha.to_string()));
        }
        match fs::read_to_string(self.blobs_dir().join(sha)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlamebotError::BlobNotFound(sha.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn has_file_version(&self, sha: &str) -> bool {
        is_content_sha(sha) && self.blobs_dir().join(sha).is_file()
    }

    /// Store `content` under its SHA256 and return the hash. Content that is
    /// already stored is not written again.
    pub fn persist_file_version(&self, content: &str) -> Result<String, BlamebotError> {
        let sha = content_sha(content);

        let blobs_dir = self.blobs_dir();
        let blob_path = blobs_dir.join(&sha);
        // A blob of the wrong size is a leftover from an interrupted write.
        if fs::metadata(&blob_path).is_ok_and(|meta| meta.len() == content.len() as u64) {
            return Ok(sha);
        }

        fs::create_dir_all(&blobs_dir)?;
        write_atomically(&blob_path, content.as_bytes())?;

        Ok(sha)
    }

    /// Blob lookup for attribution replay: unreadable blobs are logged and
    /// read as empty content.
    pub fn blob_reader(&self) -> impl Fn(&str) -> String + '_ {
        move |sha: &str| match self.get_file_version(sha) {
            Ok(content) => content,
            Err(e) => {
                log_error(&e, Some(json!({ "operation": "read_blob", "sha": sha })));
                String::new()
            }
        }
    }

    /* checkpoint records */

    /// Persist `checkpoint` as its own record. Assigns an id when it has none
    /// and returns the id.
    pub fn append_checkpoint(&self, checkpoint: &Checkpoint) -> Result<String, BlamebotError> {
        let mut checkpoint = checkpoint.clone();
        if checkpoint.id.is_empty() {
            checkpoint.id = uuid::Uuid::new_v4().to_string();
        }

        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(&checkpoint)?;
        write_atomically(
            &self.dir.join(format!("{}.json", checkpoint.id)),
            json.as_bytes(),
        )?;

        Ok(checkpoint.id)
    }

    /// Read every checkpoint record, sorted by timestamp. A missing log reads
    /// as empty; unreadable or malformed records are logged and skipped.
    pub fn read_all_checkpoints(&self) -> Result<InMemoryCheckpointLog, BlamebotError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(InMemoryCheckpointLog::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        // Stable base order for records that share a timestamp.
        paths.sort();

        let mut checkpoints = Vec::with_capacity(paths.len());
        for path in paths {
            match read_checkpoint_record(&path) {
                Ok(checkpoint) => checkpoints.push(checkpoint),
                Err(e) => log_error(
                    &e,
                    Some(json!({
                        "operation": "read_checkpoint",
                        "path": path.to_string_lossy(),
                    })),
                ),
            }
        }

        Ok(InMemoryCheckpointLog::new(checkpoints))
    }
}

fn read_checkpoint_record(path: &Path) -> Result<Checkpoint, BlamebotError> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), BlamebotError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Write through a temp file in the same directory and rename it into place,
/// so `path` is either absent or complete.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), BlamebotError> {
    let dir = path.parent().ok_or_else(|| {
        BlamebotError::Generic(format!("No parent directory for {}", path.display()))
    })?;
    let tmp_path = dir.join(format!(".tmp-{}", uuid::Uuid::new_v4()));

    if let Err(e) = fs::write(&tmp_path, contents).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Lowercase hex SHA256 of `content`.
pub fn content_sha(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn is_content_sha(sha: &str) -> bool {
    sha.len() == 64 && sha.bytes().all(|b| b.is_ascii_hexdigit())
}
