//! Core record types for the maple run-length encoding.

use std::fmt;

/// The symbol class of a multi-position maple run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunKind {
    /// `-` — a deletion relative to the reference.
    Gap,
    /// `n` — a no-call / low-confidence stretch.
    Unknown,
}

impl RunKind {
    /// The single-character symbol used in maple files.
    #[inline]
    pub fn symbol(&self) -> char {
        match self {
            RunKind::Gap => '-',
            RunKind::Unknown => 'n',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '-' => Some(RunKind::Gap),
            'n' => Some(RunKind::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One maple record. Positions are 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapleRecord {
    /// Single-base substitution at `pos`; spans exactly `[pos, pos]`.
    Edit { base: char, pos: u64 },
    /// A run of `len` consecutive positions starting at `pos`;
    /// spans `[pos, pos + len - 1]`.
    Run { kind: RunKind, pos: u64, len: u64 },
    /// A `>`-prefixed section line, kept verbatim. Not positional.
    Header(String),
}

impl MapleRecord {
    /// Construct an `Unknown` run, the kind every split piece carries.
    #[inline]
    pub fn unknown(pos: u64, len: u64) -> Self {
        MapleRecord::Run {
            kind: RunKind::Unknown,
            pos,
            len,
        }
    }

    /// Start position, or None for headers.
    #[inline]
    pub fn pos(&self) -> Option<u64> {
        match self {
            MapleRecord::Edit { pos, .. } | MapleRecord::Run { pos, .. } => Some(*pos),
            MapleRecord::Header(_) => None,
        }
    }

    /// Number of positions covered beyond a point. Edits extend over a
    /// single position; a run's extent is its length.
    #[inline]
    pub fn extent(&self) -> u64 {
        match self {
            MapleRecord::Run { len, .. } => *len,
            _ => 0,
        }
    }

    /// Last covered position. For a degenerate zero-length run this is
    /// the start position itself.
    #[inline]
    pub fn last_pos(&self) -> Option<u64> {
        match self {
            MapleRecord::Edit { pos, .. } => Some(*pos),
            MapleRecord::Run { pos, len, .. } => Some(pos + len.saturating_sub(1)),
            MapleRecord::Header(_) => None,
        }
    }

    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, MapleRecord::Header(_))
    }
}

impl fmt::Display for MapleRecord {
    /// Writes the exact tab-separated maple line (no trailing newline).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapleRecord::Edit { base, pos } => write!(f, "{}\t{}", base, pos),
            MapleRecord::Run { kind, pos, len } => write!(f, "{}\t{}\t{}", kind, pos, len),
            MapleRecord::Header(line) => write!(f, "{}", line),
        }
    }
}
