use crate::authorship::attribution_tracker::changed_lines;
use crate::authorship::line_set::LineSet;
use crate::authorship::working_log::{Checkpoint, CheckpointKind};
use crate::error::BlamebotError;
use crate::git::repository::Repository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointArgs {
    pub kind: CheckpointKind,
    pub file: String,
    pub tool_use_id: String,
    pub edit_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckpointResult {
    pub checkpoint: Checkpoint,
    /// Lines the edit touched, for post-edit checkpoints with a known pre-edit snapshot.
    pub changed_lines: Option<LineSet>,
}

/// Parse `<pre-edit|post-edit> <file> --tool-use-id <id> [--edit-id <id>]`.
pub fn parse_checkpoint_args(args: &[String]) -> Result<CheckpointArgs, String> {
    let mut positional: Vec<&str> = Vec::new();
    let mut tool_use_id = None;
    let mut edit_id = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--tool-use-id" => {
                i += 1;
                tool_use_id = Some(
                    args.get(i)
                        .ok_or("--tool-use-id requires a value")?
                        .to_string(),
                );
            }
            "--edit-id" => {
                i += 1;
                edit_id = Some(args.get(i).ok_or("--edit-id requires a value")?.to_string());
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown checkpoint option: {}", flag));
            }
            value => positional.push(value),
        }
        i += 1;
    }

    let [kind, file] = positional.as_slice() else {
        return Err("Usage: git-blamebot checkpoint <pre-edit|post-edit> <file> --tool-use-id <id> [--edit-id <id>]".to_string());
    };
    let kind = kind
        .parse::<CheckpointKind>()
        .map_err(|_| format!("Unknown checkpoint kind: {}", kind))?;

    let tool_use_id = tool_use_id
        .filter(|id| !id.trim().is_empty())
        .ok_or("--tool-use-id is required")?;

    let edit_id = edit_id.filter(|id| !id.trim().is_empty());
    if kind == CheckpointKind::PostEdit && edit_id.is_none() {
        return Err("--edit-id is required for post-edit checkpoints".to_string());
    }

    Ok(CheckpointArgs {
        kind,
        file: file.to_string(),
        tool_use_id,
        edit_id,
    })
}

/// Snapshot the working tree version of `args.file` and record a checkpoint.
/// A file that does not exist yet snapshots as empty content.
pub fn run_checkpoint(
    repo: &Repository,
    args: &CheckpointArgs,
) -> Result<CheckpointResult, BlamebotError> {
    let file = repo.relativize_path(&args.file);
    let content = match repo.read_working_file(&file) {
        Ok(content) => content,
        Err(e) if e.is_not_found() => String::new(),
        Err(e) => return Err(e),
    };

    let log = repo.storage.checkpoint_log();
    let sha = log.persist_file_version(&content)?;

    let mut checkpoint = match args.kind {
        CheckpointKind::PreEdit => Checkpoint::pre_edit(&file, &sha, &args.tool_use_id),
        CheckpointKind::PostEdit => Checkpoint::post_edit(
            &file,
            &sha,
            &args.tool_use_id,
            args.edit_id.as_deref().unwrap_or_default(),
        ),
    };
    checkpoint.id = log.append_checkpoint(&checkpoint)?;

    let changed = match args.kind {
        CheckpointKind::PreEdit => None,
        CheckpointKind::PostEdit => {
            let all = log.read_all_checkpoints()?;
            all.pre_edit_for(&file, &args.tool_use_id)
                .and_then(|pre| log.get_file_version(&pre.content_sha).ok())
                .map(|pre_content| changed_lines(&pre_content, &content, 1))
        }
    };

    Ok(CheckpointResult {
        checkpoint,
        changed_lines: changed,
    })
}

pub fn describe_result(result: &CheckpointResult) -> String {
    let checkpoint = &result.checkpoint;
    let mut message = format!(
        "Recorded {} checkpoint for {} ({})",
        checkpoint.kind.as_str(),
        checkpoint.file,
        &checkpoint.content_sha[..12.min(checkpoint.content_sha.len())]
    );
    if let Some(lines) = &result.changed_lines {
        if lines.is_empty() {
            message.push_str(", no lines changed");
        } else {
            message.push_str(&format!(", {} line(s) changed: {}", lines.len(), lines));
        }
    }
    message
}
