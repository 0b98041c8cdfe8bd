//! Replays a file's checkpoint history to credit current lines to edits.
//!
//! The history is flattened into an ordered list of transitions between
//! content versions. Automated edits credit the lines they introduce to their
//! edit id; gaps between known versions (human edits nobody recorded) carry
//! attribution forward and credit new lines to nobody.

use crate::authorship::attribution_tracker::{AttributionTracker, LineAuthor, split_lines};
use crate::authorship::line_set::LineSet;
use crate::authorship::working_log::{Checkpoint, CheckpointKind};
use std::collections::{BTreeMap, HashMap};

/// Edit id → lines of the current content credited to that edit.
/// Human lines never appear.
pub type FileAttribution = BTreeMap<String, LineSet>;

/// One complete pre-edit/post-edit pair with its snapshots loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPair {
    pub pre_content: String,
    pub post_content: String,
    pub edit_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<'a> {
    /// Unrecorded changes between two known versions.
    HumanGap { from: &'a str, to: &'a str },
    /// A recorded automated edit.
    Edit {
        from: &'a str,
        to: &'a str,
        edit_id: Option<&'a str>,
    },
}

impl<'a> Transition<'a> {
    fn endpoints(&self) -> (&'a str, &'a str) {
        match *self {
            Transition::HumanGap { from, to } => (from, to),
            Transition::Edit { from, to, .. } => (from, to),
        }
    }

    fn actor(&self) -> Option<&'a str> {
        match *self {
            Transition::HumanGap { .. } => None,
            Transition::Edit { edit_id, .. } => edit_id,
        }
    }
}

/// Group checkpoints by correlation id (first-seen order) and keep only the
/// ids that have both halves. Returns `(pre, post)` checkpoint pairs.
///
/// Checkpoints without a correlation id are ignored. If an id has more than
/// one checkpoint of the same kind, the last one wins.
pub fn pair_checkpoints(checkpoints: &[Checkpoint]) -> Vec<(&Checkpoint, &Checkpoint)> {
    let mut order: Vec<&str> = Vec::new();
    let mut pre_by_id: HashMap<&str, &Checkpoint> = HashMap::new();
    let mut post_by_id: HashMap<&str, &Checkpoint> = HashMap::new();

    for cp in checkpoints {
        let id = cp.tool_use_id.as_str();
        if id.is_empty() {
            continue;
        }
        if !pre_by_id.contains_key(id) && !post_by_id.contains_key(id) {
            order.push(id);
        }
        match cp.kind {
            CheckpointKind::PreEdit => pre_by_id.insert(id, cp),
            CheckpointKind::PostEdit => post_by_id.insert(id, cp),
        };
    }

    order
        .into_iter()
        .filter_map(|id| Some((*pre_by_id.get(id)?, *post_by_id.get(id)?)))
        .collect()
}

/// Load the snapshots for every complete pair through `blob_reader`.
pub fn load_edit_pairs<F>(checkpoints: &[Checkpoint], blob_reader: F) -> Vec<EditPair>
where
    F: Fn(&str) -> String,
{
    pair_checkpoints(checkpoints)
        .into_iter()
        .map(|(pre, post)| EditPair {
            pre_content: blob_reader(&pre.content_sha),
            post_content: blob_reader(&post.content_sha),
            edit_id: post.edit_id.clone(),
        })
        .collect()
}

/// Lay out the replay from `base` through every pair to `current`.
pub fn plan_transitions<'a>(
    base: &'a str,
    current: &'a str,
    pairs: &'a [EditPair],
) -> Vec<Transition<'a>> {
    let mut transitions = Vec::with_capacity(pairs.len() * 2 + 1);
    let mut prev = base;

    for pair in pairs {
        if prev != pair.pre_content {
            transitions.push(Transition::HumanGap {
                from: prev,
                to: &pair.pre_content,
            });
        }
        transitions.push(Transition::Edit {
            from: &pair.pre_content,
            to: &pair.post_content,
            edit_id: pair.edit_id.as_deref(),
        });
        prev = &pair.post_content;
    }

    if prev != current {
        transitions.push(Transition::HumanGap { from: prev, to: current });
    }

    transitions
}

/// Run `transitions` starting from an all-human attribution of `base`.
/// The result is aligned to the `to` side of the last transition.
pub fn replay_transitions(
    tracker: &AttributionTracker,
    base: &str,
    transitions: &[Transition<'_>],
) -> Vec<LineAuthor> {
    let mut attribution: Vec<LineAuthor> = vec![None; split_lines(base).len()];

    for transition in transitions {
        let (from, to) = transition.endpoints();
        attribution = tracker
            .transform(
                &split_lines(from),
                &split_lines(to),
                &attribution,
                transition.actor(),
            )
            .into_lines();
    }

    attribution
}

/// Collect 1-indexed positions per actor, skipping human lines.
pub fn aggregate_attribution(attribution: &[LineAuthor]) -> FileAttribution {
    let mut result = FileAttribution::new();
    for (idx, author) in attribution.iter().enumerate() {
        if let Some(edit_id) = author {
            result
                .entry(edit_id.clone())
                .or_default()
                .insert(idx as u32 + 1);
        }
    }
    result
}

/// Credit lines of `current_content` to the automated edits recorded in
/// `checkpoints` (one file, sorted by timestamp), starting from
/// `base_content` (empty for new files).
///
/// `blob_reader` resolves snapshot hashes; it should return empty content
/// for anything it cannot read. No blob is read when there are no checkpoints.
pub fn compute_file_attribution<F>(
    base_content: &str,
    current_content: &str,
    checkpoints: &[Checkpoint],
    blob_reader: F,
) -> FileAttribution
where
    F: Fn(&str) -> String,
{
    compute_file_attribution_with_tracker(
        &AttributionTracker::new(),
        base_content,
        current_content,
        checkpoints,
        blob_reader,
    )
}

pub fn compute_file_attribution_with_tracker<F>(
    tracker: &AttributionTracker,
    base_content: &str,
    current_content: &str,
    checkpoints: &[Checkpoint],
    blob_reader: F,
) -> FileAttribution
where
    F: Fn(&str) -> String,
{
    if checkpoints.is_empty() {
        return FileAttribution::new();
    }

    let pairs = load_edit_pairs(checkpoints, blob_reader);
    if pairs.is_empty() {
        return FileAttribution::new();
    }

    let transitions = plan_transitions(base_content, current_content, &pairs);
    let attribution = replay_transitions(tracker, base_content, &transitions);
    aggregate_attribution(&attribution)
}
