//! Chord classification from single chroma frames.
//!
//! The classifier is deliberately coarse: the dominant pitch class becomes the
//! chord root, and the quality is decided by comparing the energy of the major
//! third against the minor third above that root. Full chord-quality
//! estimation from chroma is a much harder problem; two qualities over twelve
//! roots is the vocabulary this crate commits to.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::chroma::{ChromaFrame, PITCH_CLASSES};

/// Pitch class names in chromatic order, starting at C.
pub const NOTE_NAMES: [&str; PITCH_CLASSES] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A chord label: one of twelve roots, major or minor. 24 values total.
///
/// `Display` renders the conventional short form (`C`, `F#m`, ...), which is
/// also how the label serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordLabel {
    root: usize,
    minor: bool,
}

impl ChordLabel {
    /// The root pitch class index (0 = C ... 11 = B).
    pub fn root(&self) -> usize {
        self.root
    }

    /// Whether the label carries the minor quality.
    pub fn is_minor(&self) -> bool {
        self.minor
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", NOTE_NAMES[self.root])?;
        if self.minor {
            write!(f, "m")?;
        }
        Ok(())
    }
}

impl Serialize for ChordLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Classify a single chroma frame as a major or minor chord.
///
/// Root selection: the pitch class with the highest energy wins; on an exact
/// tie the lowest index wins. The tie-break is load-bearing — it keeps the
/// classifier deterministic for degenerate frames (e.g. silence).
///
/// Quality: major only when the major third above the root carries strictly
/// more energy than the minor third. Equal thirds fall to minor.
pub fn classify(frame: &ChromaFrame) -> ChordLabel {
    let mut root = 0;
    for (idx, &energy) in frame.iter().enumerate() {
        if energy > frame[root] {
            root = idx;
        }
    }

    let major_third = frame[(root + 4) % PITCH_CLASSES];
    let minor_third = frame[(root + 3) % PITCH_CLASSES];

    ChordLabel {
        root,
        minor: major_third <= minor_third,
    }
}
