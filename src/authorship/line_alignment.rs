//! Longest-common-subsequence alignment of two line sequences.

/// Result of aligning an old line sequence against a new one.
///
/// `old_to_new[i]` is the index in the new sequence that old line `i` was
/// matched to, `new_to_old[j]` the reverse. `None` means unmatched (deleted
/// from old, or inserted/changed in new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAlignment {
    pub old_to_new: Vec<Option<usize>>,
    pub new_to_old: Vec<Option<usize>>,
}

impl LineAlignment {
    pub fn matched_count(&self) -> usize {
        self.new_to_old.iter().filter(|m| m.is_some()).count()
    }

    /// Indices of new lines with no counterpart in the old sequence.
    pub fn unmatched_new(&self) -> impl Iterator<Item = usize> + '_ {
        self.new_to_old
            .iter()
            .enumerate()
            .filter_map(|(j, m)| m.is_none().then_some(j))
    }
}

/// Align `old` against `new` by exact line equality.
///
/// Classic O(m·n) LCS table followed by a backtrack from `(m, n)`. When both
/// predecessor cells tie, the backtrack steps along `old` first, i.e. the old
/// line is treated as unmatched before the new one. This fixes which of
/// several equally long alignments is returned when lines repeat.
pub fn align_lines(old: &[&str], new: &[&str]) -> LineAlignment {
    let m = old.len();
    let n = new.len();
    let mut old_to_new = vec![None; m];
    let mut new_to_old = vec![None; n];

    if m == 0 || n == 0 {
        return LineAlignment {
            old_to_new,
            new_to_old,
        };
    }

    // Row-major (m+1) x (n+1) table of LCS lengths.
    let width = n + 1;
    let mut dp = vec![0u32; (m + 1) * width];
    for i in 1..=m {
        for j in 1..=n {
            dp[i * width + j] = if old[i - 1] == new[j - 1] {
                dp[(i - 1) * width + (j - 1)] + 1
            } else {
                dp[(i - 1) * width + j].max(dp[i * width + (j - 1)])
            };
        }
    }

    let (mut i, mut j) = (m, n);
    while i > 0 && j > 0 {
        if old[i - 1] == new[j - 1] {
            old_to_new[i - 1] = Some(j - 1);
            new_to_old[j - 1] = Some(i - 1);
            i -= 1;
            j -= 1;
        } else if dp[(i - 1) * width + j] >= dp[i * width + (j - 1)] {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    LineAlignment {
        old_to_new,
        new_to_old,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_insert_and_delete() {
        let old = ["A", "B", "C", "D"];
        let new = ["A", "X", "B", "D"];

        let alignment = align_lines(&old, &new);

        assert_eq!(alignment.old_to_new, vec![Some(0), Some(2), None, Some(3)]);
        assert_eq!(alignment.new_to_old, vec![Some(0), None, Some(1), Some(3)]);
        assert_eq!(alignment.matched_count(), 3);
        assert_eq!(alignment.unmatched_new().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_align_identical_sequences() {
        let lines = ["fn main() {", "    run();", "}"];
        let alignment = align_lines(&lines, &lines);
        assert_eq!(alignment.old_to_new, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(alignment.new_to_old, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_align_disjoint_sequences() {
        let alignment = align_lines(&["a", "b"], &["x", "y", "z"]);
        assert_eq!(alignment.old_to_new, vec![None, None]);
        assert_eq!(alignment.new_to_old, vec![None, None, None]);
    }

    #[test]
    fn test_align_empty_sides() {
        let alignment = align_lines(&[], &["a"]);
        assert!(alignment.old_to_new.is_empty());
        assert_eq!(alignment.new_to_old, vec![None]);

        let alignment = align_lines(&["a"], &[]);
        assert_eq!(alignment.old_to_new, vec![None]);
        assert!(alignment.new_to_old.is_empty());
    }

    #[test]
    fn test_align_is_exact_match_only() {
        let alignment = align_lines(&["value = 1", "end"], &["value = 1 ", "end"]);
        assert_eq!(alignment.new_to_old, vec![None, Some(1)]);
    }

    #[test]
    fn test_tie_break_with_duplicate_new_lines() {
        // One old "x" against two new "x": the match lands on the later new line
        // because the backtrack consumes new lines only when old cannot move.
        let alignment = align_lines(&["x"], &["x", "x"]);
        assert_eq!(alignment.new_to_old, vec![None, Some(0)]);
        assert_eq!(alignment.old_to_new, vec![Some(1)]);
    }

    #[test]
    fn test_tie_break_with_duplicate_old_lines() {
        // Two old "x" against one new "x": the later old line is the match.
        let alignment = align_lines(&["x", "x"], &["x"]);
        assert_eq!(alignment.old_to_new, vec![None, Some(0)]);
        assert_eq!(alignment.new_to_old, vec![Some(1)]);
    }

    #[test]
    fn test_tie_break_when_both_branches_tie() {
        // old [a, b] vs new [b, a]: LCS length 1, both "a" and "b" are valid.
        // At (2, 2) the cells above and left tie, so old "b" is dropped first and
        // "a" ends up matched.
        let alignment = align_lines(&["a", "b"], &["b", "a"]);
        assert_eq!(alignment.old_to_new, vec![Some(1), None]);
        assert_eq!(alignment.new_to_old, vec![None, Some(0)]);
    }
}
