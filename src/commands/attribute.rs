use std::collections::BTreeMap;
use std::time::Instant;

use serde_json::json;

use crate::authorship::attribution_tracker::AttributionTracker;
use crate::authorship::chain_attribution::{FileAttribution, compute_file_attribution_with_tracker};
use crate::config::Config;
use crate::error::BlamebotError;
use crate::git::repository::Repository;
use crate::observability::{log_error, log_performance};

/// Attribution per repo-relative file path. Files nobody edited are absent.
pub type RepoAttribution = BTreeMap<String, FileAttribution>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeArgs {
    pub files: Vec<String>,
    pub json: bool,
}

pub fn parse_attribute_args(args: &[String]) -> Result<AttributeArgs, String> {
    let mut parsed = AttributeArgs::default();
    for arg in args {
        match arg.as_str() {
            "--json" => parsed.json = true,
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown attribute option: {}", flag));
            }
            file => parsed.files.push(file.to_string()),
        }
    }
    Ok(parsed)
}

/// Rebuild attribution for `files` (every file with checkpoints when empty),
/// using `HEAD` as the base version and the working tree as the current one.
pub fn compute_attributions(
    repo: &Repository,
    files: &[String],
) -> Result<RepoAttribution, BlamebotError> {
    let tracker = AttributionTracker::with_config(Config::get().attribution_config());
    compute_attributions_with_tracker(repo, files, &tracker)
}

pub fn compute_attributions_with_tracker(
    repo: &Repository,
    files: &[String],
    tracker: &AttributionTracker,
) -> Result<RepoAttribution, BlamebotError> {
    let log = repo.storage.checkpoint_log();
    let all = log.read_all_checkpoints()?;
    let mut result = RepoAttribution::new();
    if all.is_empty() {
        return Ok(result);
    }

    let files: Vec<String> = if files.is_empty() {
        all.edited_files()
    } else {
        files.iter().map(|f| repo.relativize_path(f)).collect()
    };

    for file in files {
        let checkpoints = all.for_file(&file);
        if checkpoints.is_empty() {
            continue;
        }

        // Files added since HEAD have no base version.
        let base = repo.show_file("HEAD", &file).unwrap_or_default();
        let current = match repo.read_working_file(&file) {
            Ok(content) => content,
            Err(e) => {
                log_error(&e, Some(json!({ "file": file, "operation": "attribute" })));
                continue;
            }
        };

        let start = Instant::now();
        let attribution = compute_file_attribution_with_tracker(
            tracker,
            &base,
            &current,
            &checkpoints,
            log.blob_reader(),
        );
        log_performance(
            "attribute_file",
            start.elapsed(),
            Some(json!({
                "file": file,
                "checkpoints": checkpoints.len(),
                "lines": current.lines().count(),
            })),
            None,
        );

        if !attribution.is_empty() {
            result.insert(file, attribution);
        }
    }

    Ok(result)
}

/// ```text
/// src/main.rs
///   edit-1 2,4-5
/// ```
pub fn format_attributions_text(attributions: &RepoAttribution) -> String {
    let mut output = String::new();
    for (file, attribution) in attributions {
        if needs_quoting(file) {
            output.push_str(&format!("\"{}\"", file));
        } else {
            output.push_str(file);
        }
        output.push('\n');

        for (edit_id, lines) in attribution {
            output.push_str("  ");
            output.push_str(edit_id);
            output.push(' ');
            output.push_str(&lines.to_string());
            output.push('\n');
        }
    }
    output
}

pub fn format_attributions_json(attributions: &RepoAttribution) -> Result<String, BlamebotError> {
    Ok(serde_json::to_string_pretty(attributions)?)
}

fn needs_quoting(path: &str) -> bool {
    path.contains(' ') || path.contains('\t') || path.contains('\n')
}
