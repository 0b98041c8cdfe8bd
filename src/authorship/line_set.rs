//! Compact sets of 1-indexed line numbers.
//!
//! A `LineSet` renders as ascending comma-separated groups where consecutive
//! runs collapse into inclusive ranges, e.g. `"5,7-8,12"`.

use crate::error::BlamebotError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Upper bound on the number of lines a parsed or deserialized `LineSet` may
/// expand to. Larger inputs are rejected as invalid.
pub const MAX_PARSED_LINES: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineRange {
    Single(u32),
    Range(u32, u32),
}

impl LineRange {
    pub fn start(&self) -> u32 {
        match self {
            LineRange::Single(line) => *line,
            LineRange::Range(start, _) => *start,
        }
    }

    pub fn end(&self) -> u32 {
        match self {
            LineRange::Single(line) => *line,
            LineRange::Range(_, end) => *end,
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start() && line <= self.end()
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRange::Single(line) => write!(f, "{}", line),
            LineRange::Range(start, end) => write!(f, "{}-{}", start, end),
        }
    }
}

/// Sorted, deduplicated set of positive line numbers.
///
/// Line 0 is never a member; inserting it is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LineSet {
    lines: Vec<u32>,
}

impl LineSet {
    pub fn new<I: IntoIterator<Item = u32>>(lines: I) -> Self {
        let mut lines: Vec<u32> = lines.into_iter().filter(|line| *line > 0).collect();
        lines.sort_unstable();
        lines.dedup();
        LineSet { lines }
    }

    /// Inclusive range `[start, end]`. Empty when `start` is 0 or `end < start`.
    pub fn from_range(start: u32, end: u32) -> Self {
        if start == 0 || end < start {
            return LineSet::default();
        }
        LineSet {
            lines: (start..=end).collect(),
        }
    }

    /// Returns the union of this set and `{line}`.
    pub fn add(mut self, line: u32) -> Self {
        self.insert(line);
        self
    }

    /// Adds `line` in place. Returns false if it was already present (or 0).
    pub fn insert(&mut self, line: u32) -> bool {
        if line == 0 {
            return false;
        }
        // Attribution aggregation appends in ascending order, so check the tail first.
        match self.lines.last() {
            None => {
                self.lines.push(line);
                true
            }
            Some(&last) if line > last => {
                self.lines.push(line);
                true
            }
            _ => match self.lines.binary_search(&line) {
                Ok(_) => false,
                Err(pos) => {
                    self.lines.insert(pos, line);
                    true
                }
            },
        }
    }

    pub fn union(&self, other: &LineSet) -> LineSet {
        LineSet::new(self.lines.iter().chain(other.lines.iter()).copied())
    }

    pub fn contains(&self, line: u32) -> bool {
        self.lines.binary_search(&line).is_ok()
    }

    /// True if any line in `[start, end]` is in the set.
    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        let idx = self.lines.partition_point(|line| *line < start);
        idx < self.lines.len() && self.lines[idx] <= end
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn min(&self) -> Option<u32> {
        self.lines.first().copied()
    }

    pub fn max(&self) -> Option<u32> {
        self.lines.last().copied()
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.iter().copied()
    }

    /// Collapse consecutive runs into ranges, ascending.
    pub fn ranges(&self) -> Vec<LineRange> {
        let mut ranges = Vec::new();
        let mut iter = self.lines.iter().copied();
        let Some(first) = iter.next() else {
            return ranges;
        };

        let (mut start, mut end) = (first, first);
        for line in iter {
            if line == end + 1 {
                end = line;
                continue;
            }
            ranges.push(make_range(start, end));
            start = line;
            end = line;
        }
        ranges.push(make_range(start, end));
        ranges
    }
}

fn make_range(start: u32, end: u32) -> LineRange {
    if start == end {
        LineRange::Single(start)
    } else {
        LineRange::Range(start, end)
    }
}

impl fmt::Display for LineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, range) in self.ranges().iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl FromStr for LineSet {
    type Err = BlamebotError;

    /// Parse compact notation like `"5"`, `"5-7"`, or `"5,7-8,12"`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut lines = Vec::new();

        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            if let Some((start, end)) = part.split_once('-') {
                let start = parse_line_number(start)?;
                let end = parse_line_number(end)?;
                if end < start {
                    return Err(BlamebotError::InvalidLineSet(format!(
                        "invalid range {}-{}",
                        start, end
                    )));
                }
                check_parsed_size(lines.len(), start, end)?;
                lines.extend(start..=end);
            } else {
                check_parsed_size(lines.len(), 1, 1)?;
                lines.push(parse_line_number(part)?);
            }
        }

        Ok(LineSet::new(lines))
    }
}

/// Fails if adding `[start, end]` to `current` parsed lines would exceed
/// `MAX_PARSED_LINES`.
fn check_parsed_size(current: usize, start: u32, end: u32) -> Result<(), BlamebotError> {
    let span = (end - start) as usize + 1;
    if current.saturating_add(span) > MAX_PARSED_LINES {
        return Err(BlamebotError::InvalidLineSet(format!(
            "line set expands to more than {} lines",
            MAX_PARSED_LINES
        )));
    }
    Ok(())
}

fn parse_line_number(raw: &str) -> Result<u32, BlamebotError> {
    let raw = raw.trim();
    let line: u32 = raw
        .parse()
        .map_err(|e| BlamebotError::InvalidLineSet(format!("invalid line number {:?}: {}", raw, e)))?;
    if line == 0 {
        return Err(BlamebotError::InvalidLineSet(
            "line numbers start at 1".to_string(),
        ));
    }
    Ok(line)
}

impl FromIterator<u32> for LineSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        LineSet::new(iter)
    }
}

impl Serialize for LineSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty() {
            serializer.serialize_none()
        } else {
            serializer.collect_str(self)
        }
    }
}

/// Accepted wire shapes: the compact string, or the legacy `[start, end]` pair.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawLineSet {
    Compact(String),
    Legacy([Option<u32>; 2]),
}

impl<'de> Deserialize<'de> for LineSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawLineSet>::deserialize(deserializer)?;
        match raw {
            None => Ok(LineSet::default()),
            Some(RawLineSet::Compact(s)) => s.parse().map_err(serde::de::Error::custom),
            Some(RawLineSet::Legacy([Some(start), Some(end)])) => {
                if start > 0 && end >= start {
                    check_parsed_size(0, start, end).map_err(serde::de::Error::custom)?;
                }
                Ok(LineSet::from_range(start, end))
            }
            Some(RawLineSet::Legacy([Some(start), None])) => Ok(LineSet::new([start])),
            Some(RawLineSet::Legacy(_)) => Ok(LineSet::default()),
        }
    }
}
