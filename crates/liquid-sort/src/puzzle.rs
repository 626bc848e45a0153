//! Puzzle representation types.
//!
//! Input labels are interned into dense [`Color`] ids once, up front, so the
//! search only ever compares and hashes small integers. A [`Palette`] keeps
//! the mapping back to the caller's labels for reporting.

use std::fmt;

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ValidationError;
use crate::executor::pour;

/// A liquid label exactly as it appears in the puzzle input.
///
/// Any JSON number or string is accepted. Numbers and strings never compare
/// equal, so `1` and `"1"` are different liquids. Numbers compare by their
/// JSON value, so `1` and `1.0` are different liquids too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DropLabel {
    Number(serde_json::Number),
    Text(String),
}

impl From<i64> for DropLabel {
    fn from(value: i64) -> Self {
        DropLabel::Number(value.into())
    }
}

impl From<&str> for DropLabel {
    fn from(value: &str) -> Self {
        DropLabel::Text(value.to_string())
    }
}

impl From<String> for DropLabel {
    fn from(value: String) -> Self {
        DropLabel::Text(value)
    }
}

impl fmt::Display for DropLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropLabel::Number(n) => write!(f, "{}", n),
            DropLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Raw puzzle input: one label list per tube, bottom drop first.
pub type PuzzleInput = Vec<Vec<DropLabel>>;

/// Interned liquid id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color(pub u16);

/// A tube's contents, bottom first. The last element is the top drop.
pub type Tube = SmallVec<[Color; 8]>;

/// Top drop of a tube, if any
pub fn top(tube: &[Color]) -> Option<Color> {
    tube.last().copied()
}

/// True if every drop in the tube has the same color (empty tubes included)
pub fn is_monochrome(tube: &[Color]) -> bool {
    match tube.first() {
        None => true,
        Some(bottom) => tube.iter().all(|c| c == bottom),
    }
}

/// Label <-> color id table for one puzzle.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    labels: Vec<DropLabel>,
    ids: FxHashMap<DropLabel, Color>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id for a label, assigning the next free id on first sight.
    pub fn intern(&mut self, label: &DropLabel) -> Result<Color, ValidationError> {
        if let Some(&color) = self.ids.get(label) {
            return Ok(color);
        }
        let next = self.labels.len();
        if next > u16::MAX as usize {
            return Err(ValidationError::TooLarge(format!(
                "more than {} distinct liquids",
                u16::MAX as usize + 1
            )));
        }
        let color = Color(next as u16);
        self.labels.push(label.clone());
        self.ids.insert(label.clone(), color);
        Ok(color)
    }

    pub fn label(&self, color: Color) -> Option<&DropLabel> {
        self.labels.get(color.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A single pour, as a pair of 0-based tube indices.
///
/// Serializes as `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

impl From<[usize; 2]> for Move {
    fn from([from, to]: [usize; 2]) -> Self {
        Self { from, to }
    }
}

impl From<Move> for [usize; 2] {
    fn from(mv: Move) -> Self {
        [mv.from, mv.to]
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// When a configuration counts as sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalRule {
    /// Every tube is empty or a single color, at any fill level
    #[default]
    Monochrome,
    /// Every tube is empty or completely full of a single color
    FullOrEmpty,
}

/// Canonical byte key of a configuration's tube contents.
///
/// Each tube is written as its length followed by its color ids, all as
/// little-endian u16. The length prefix keeps the encoding injective.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Box<[u8]>);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// One puzzle state: every tube's contents plus the shared capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    tubes: Vec<Tube>,
    capacity: usize,
}

impl Configuration {
    /// Validate raw input and build the starting configuration.
    ///
    /// The capacity is taken from the first tube. Every tube must be empty
    /// or hold exactly that many drops.
    pub fn from_input(input: &[Vec<DropLabel>]) -> Result<(Self, Palette), ValidationError> {
        let first = input.first().ok_or(ValidationError::Empty)?;
        let capacity = first.len();
        if capacity > u16::MAX as usize {
            return Err(ValidationError::TooLarge(format!(
                "tube capacity {} exceeds {}",
                capacity,
                u16::MAX
            )));
        }

        let mut palette = Palette::new();
        let mut tubes = Vec::with_capacity(input.len());
        for (index, labels) in input.iter().enumerate() {
            if !labels.is_empty() && labels.len() != capacity {
                return Err(ValidationError::TubeVolumeMismatch {
                    tube: index,
                    expected: capacity,
                    actual: labels.len(),
                });
            }
            let mut tube = Tube::with_capacity(capacity);
            for label in labels {
                tube.push(palette.intern(label)?);
            }
            tubes.push(tube);
        }

        if tubes.len() != input.len() {
            return Err(ValidationError::TubeCountMismatch {
                expected: input.len(),
                actual: tubes.len(),
            });
        }

        Ok((Self { tubes, capacity }, palette))
    }

    #[cfg(test)]
    pub(crate) fn from_colors(tubes: &[&[u16]], capacity: usize) -> Self {
        Self {
            tubes: tubes
                .iter()
                .map(|t| t.iter().map(|&c| Color(c)).collect())
                .collect(),
            capacity,
        }
    }

    pub fn tube_count(&self) -> usize {
        self.tubes.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn tubes(&self) -> &[Tube] {
        &self.tubes
    }

    pub fn tube(&self, index: usize) -> Option<&Tube> {
        self.tubes.get(index)
    }

    pub fn total_drops(&self) -> usize {
        self.tubes.iter().map(|t| t.len()).sum()
    }

    /// Copy this configuration and apply a pour to the copy.
    ///
    /// Panics if either index is out of range or both are the same tube.
    pub fn with_pour(&self, mv: Move) -> Self {
        let mut next = self.clone();
        let (from, to) = pair_mut(&mut next.tubes, mv.from, mv.to);
        pour(from, to, self.capacity);
        next
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let mut bytes = Vec::with_capacity(2 * (self.tubes.len() + self.total_drops()));
        for tube in &self.tubes {
            bytes.extend_from_slice(&(tube.len() as u16).to_le_bytes());
            for color in tube {
                bytes.extend_from_slice(&color.0.to_le_bytes());
            }
        }
        Fingerprint(bytes.into_boxed_slice())
    }

    pub fn is_goal(&self, rule: GoalRule) -> bool {
        self.tubes.iter().all(|tube| match rule {
            GoalRule::Monochrome => is_monochrome(tube),
            GoalRule::FullOrEmpty => {
                tube.is_empty() || (tube.len() == self.capacity && is_monochrome(tube))
            }
        })
    }

    /// Map the tubes back to the caller's labels.
    pub fn to_labels(&self, palette: &Palette) -> PuzzleInput {
        self.tubes
            .iter()
            .map(|tube| {
                tube.iter()
                    .filter_map(|&c| palette.label(c).cloned())
                    .collect()
            })
            .collect()
    }

    /// One line per tube, bottom drop first, `-` for an empty tube.
    pub fn render(&self, palette: &Palette) -> String {
        let mut lines = Vec::with_capacity(self.tubes.len());
        for (index, tube) in self.tubes.iter().enumerate() {
            let contents = if tube.is_empty() {
                "-".to_string()
            } else {
                tube.iter()
                    .map(|&c| match palette.label(c) {
                        Some(label) => label.to_string(),
                        None => format!("#{}", c.0),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            lines.push(format!("{:>3}: {}", index, contents));
        }
        lines.join("\n")
    }
}

/// Borrow two distinct tubes mutably at once
fn pair_mut(tubes: &mut [Tube], a: usize, b: usize) -> (&mut Tube, &mut Tube) {
    assert!(a != b, "cannot pour tube {} into itself", a);
    if a < b {
        let (left, right) = tubes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = tubes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
