//! Per-line attribution carried across a single content transition.
//!
//! Lines that survive a transition (matched by the LCS aligner) keep whoever
//! was credited with them before; every other line in the new content is
//! credited to the actor performing the transition.

use crate::authorship::line_alignment::align_lines;
use crate::authorship::line_set::LineSet;
use crate::observability::log_message;
use serde_json::json;

/// Size guard for exact alignment, in `old_lines * new_lines` cell-products.
pub const DEFAULT_MAX_ALIGNMENT_CELLS: usize = 25_000_000;

/// Cheaper guard used when only summarizing which lines an edit touched.
pub const CHANGED_LINES_MAX_CELLS: usize = 10_000;

/// Who a single line is credited to. `None` is the human / unattributed actor.
pub type LineAuthor = Option<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributionConfig {
    /// Above this many DP cells the transition is not aligned and every new
    /// line is credited to the acting actor. A 6,000 x 6,000 line pair
    /// already exceeds the default.
    pub max_alignment_cells: usize,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        AttributionConfig {
            max_alignment_cells: DEFAULT_MAX_ALIGNMENT_CELLS,
        }
    }
}

/// Outcome of carrying attribution across one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformedAttribution {
    /// One entry per line of the new content.
    Lines(Vec<LineAuthor>),
    /// The new content has no lines: the file was deleted by this transition.
    Deleted,
}

impl TransformedAttribution {
    /// Per-line authors, with a deletion treated as zero lines.
    pub fn into_lines(self) -> Vec<LineAuthor> {
        match self {
            TransformedAttribution::Lines(lines) => lines,
            TransformedAttribution::Deleted => Vec::new(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, TransformedAttribution::Deleted)
    }
}

/// Main attribution tracker
#[derive(Debug, Clone, Default)]
pub struct AttributionTracker {
    config: AttributionConfig,
}

impl AttributionTracker {
    pub fn new() -> Self {
        AttributionTracker::default()
    }

    pub fn with_config(config: AttributionConfig) -> Self {
        AttributionTracker { config }
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// True when aligning `old_len` against `new_len` lines would exceed the size guard.
    pub fn exceeds_alignment_budget(&self, old_len: usize, new_len: usize) -> bool {
        match old_len.checked_mul(new_len) {
            Some(cells) => cells > self.config.max_alignment_cells,
            None => true,
        }
    }

    /// Carry `old_attribution` (aligned to `old_lines`) across to `new_lines`.
    ///
    /// Always returns a freshly allocated result; `old_attribution` may be
    /// shorter than `old_lines`, in which case the missing entries read as human.
    pub fn transform(
        &self,
        old_lines: &[&str],
        new_lines: &[&str],
        old_attribution: &[LineAuthor],
        actor: Option<&str>,
    ) -> TransformedAttribution {
        let actor: LineAuthor = actor.map(str::to_string);

        if old_lines.is_empty() {
            return TransformedAttribution::Lines(vec![actor; new_lines.len()]);
        }

        if new_lines.is_empty() {
            return TransformedAttribution::Deleted;
        }

        if self.exceeds_alignment_budget(old_lines.len(), new_lines.len()) {
            log_message(
                "attribution alignment skipped: input exceeds size guard",
                "warning",
                Some(json!({
                    "old_lines": old_lines.len(),
                    "new_lines": new_lines.len(),
                    "max_alignment_cells": self.config.max_alignment_cells,
                })),
            );
            return TransformedAttribution::Lines(vec![actor; new_lines.len()]);
        }

        let alignment = align_lines(old_lines, new_lines);

        let attribution = alignment
            .new_to_old
            .iter()
            .map(|matched| match matched {
                Some(old_idx) => old_attribution.get(*old_idx).cloned().flatten(),
                None => actor.clone(),
            })
            .collect();

        TransformedAttribution::Lines(attribution)
    }
}

/// Split content into lines on `\n`. Empty content has zero lines.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    content.split('\n').collect()
}

/// 1-based line numbers in `new_text` that were added or changed relative to
/// `old_text`, offset so that `new_text` starts at `new_start_line`.
///
/// Falls back to the whole new range for new content, for edits too large to
/// align cheaply, and for pure deletions (so the edit never reads as empty).
pub fn changed_lines(old_text: &str, new_text: &str, new_start_line: u32) -> LineSet {
    if old_text == new_text {
        return LineSet::default();
    }

    let old_lines = split_lines(old_text);
    let new_lines = split_lines(new_text);
    let whole_range = || {
        LineSet::from_range(
            new_start_line,
            new_start_line + new_lines.len() as u32 - 1,
        )
    };

    if new_lines.is_empty() {
        return LineSet::default();
    }

    if old_lines.is_empty() || old_lines.len() * new_lines.len() > CHANGED_LINES_MAX_CELLS {
        return whole_range();
    }

    let alignment = align_lines(&old_lines, &new_lines);
    let changed: LineSet = alignment
        .unmatched_new()
        .map(|j| new_start_line + j as u32)
        .collect();

    if changed.is_empty() {
        return whole_range();
    }
    changed
}
