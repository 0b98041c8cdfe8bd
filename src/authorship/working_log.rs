use crate::error::BlamebotError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Timestamp layout for checkpoints. Lexically sortable; microseconds keep
/// records written within the same second in write order.
pub const CHECKPOINT_TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/* Types  */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckpointKind {
    PreEdit,
    PostEdit,
}

impl CheckpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointKind::PreEdit => "pre-edit",
            CheckpointKind::PostEdit => "post-edit",
        }
    }

}

impl FromStr for CheckpointKind {
    type Err = BlamebotError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim() {
            "pre-edit" => Ok(CheckpointKind::PreEdit),
            "post-edit" => Ok(CheckpointKind::PostEdit),
            other => Err(BlamebotError::Generic(format!(
                "Unknown checkpoint kind: {}",
                other
            ))),
        }
    }
}

/// A snapshot reference taken on one side of a single automated edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub id: String,
    pub kind: CheckpointKind,
    /// Project-relative path
    pub file: String,
    /// SHA256 of the snapshot blob
    pub content_sha: String,
    /// Actor credited with the edit (post-edit only)
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub edit_id: Option<String>,
    /// Shared by the pre-edit and post-edit halves of one operation
    #[serde(default)]
    pub tool_use_id: String,
    pub ts: String,
}

impl Checkpoint {
    pub fn pre_edit(file: &str, content_sha: &str, tool_use_id: &str) -> Self {
        Checkpoint {
            id: String::new(),
            kind: CheckpointKind::PreEdit,
            file: file.to_string(),
            content_sha: content_sha.to_string(),
            edit_id: None,
            tool_use_id: tool_use_id.to_string(),
            ts: now_ts(),
        }
    }

    pub fn post_edit(file: &str, content_sha: &str, tool_use_id: &str, edit_id: &str) -> Self {
        Checkpoint {
            id: String::new(),
            kind: CheckpointKind::PostEdit,
            file: file.to_string(),
            content_sha: content_sha.to_string(),
            edit_id: Some(edit_id.to_string()).filter(|id| !id.is_empty()),
            tool_use_id: tool_use_id.to_string(),
            ts: now_ts(),
        }
    }

    pub fn with_ts(mut self, ts: &str) -> Self {
        self.ts = ts.to_string();
        self
    }
}

pub fn now_ts() -> String {
    chrono::Utc::now().format(CHECKPOINT_TS_FORMAT).to_string()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// All checkpoints of a log, sorted by timestamp.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCheckpointLog {
    pub checkpoints: Vec<Checkpoint>,
}

impl InMemoryCheckpointLog {
    /// Sorts by timestamp. The sort is stable, so equal timestamps keep input order.
    pub fn new(mut checkpoints: Vec<Checkpoint>) -> Self {
        checkpoints.sort_by(|a, b| a.ts.cmp(&b.ts));
        Self { checkpoints }
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn for_file(&self, file: &str) -> Vec<Checkpoint> {
        self.checkpoints
            .iter()
            .filter(|cp| cp.file == file)
            .cloned()
            .collect()
    }

    /// Files with at least one checkpoint, in first-seen order.
    pub fn edited_files(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for cp in &self.checkpoints {
            if seen.insert(cp.file.as_str()) {
                files.push(cp.file.clone());
            }
        }
        files
    }

    /// The pre-edit checkpoint sharing `tool_use_id` with a post-edit, if any.
    pub fn pre_edit_for(&self, file: &str, tool_use_id: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().rev().find(|cp| {
            cp.kind == CheckpointKind::PreEdit && cp.file == file && cp.tool_use_id == tool_use_id
        })
    }
}
