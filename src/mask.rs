//! Mask interval loading and the forward-only cursor over it.
//!
//! Mask regions arrive as BED triples (0-based, half-open). They are
//! converted to the maple coordinate convention (1-based, inclusive) at the
//! parse boundary: `start = bed_start + 1`, `end = bed_end`. Everything
//! downstream works in maple coordinates only.

use crate::maple::{MapleError, Result};
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, split_bed_fields};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One masking region, 1-based inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskInterval {
    pub start: u64,
    pub end: u64,
}

impl MaskInterval {
    #[inline]
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Convert a BED pair (0-based start, exclusive end) into maple
    /// coordinates. This conversion is load-bearing: off-by-one here
    /// shifts every mask boundary.
    #[inline]
    pub fn from_bed(bed_start: u64, bed_end: u64) -> Self {
        Self {
            start: bed_start + 1,
            end: bed_end,
        }
    }
}

/// The ordered, immutable mask interval list for one chromosome.
///
/// Parsed from text exactly once per run and shared read-only across every
/// maple file (and across worker threads); per-file scan state lives in
/// [`MaskCursor`], not here.
#[derive(Debug, Clone, Default)]
pub struct MaskSet {
    intervals: Vec<MaskInterval>,
}

impl MaskSet {
    pub fn new(intervals: Vec<MaskInterval>) -> Result<Self> {
        validate_order(&intervals)?;
        Ok(Self { intervals })
    }

    /// Load mask intervals from a BED file.
    ///
    /// Only columns 2 and 3 are consulted; column 1 (chromosome) is assumed
    /// consistent with the maple files being masked and is not checked.
    /// Malformed data lines are reported and skipped. Out-of-order or
    /// overlapping intervals are fatal: the forward sweep requires the
    /// supplied order and never re-sorts.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut intervals = Vec::new();
        let mut line_buf = String::with_capacity(256);
        let mut line_number = 0usize;

        loop {
            line_buf.clear();
            let bytes_read = reader.read_line(&mut line_buf)?;
            if bytes_read == 0 {
                break;
            }
            line_number += 1;

            let line = line_buf.trim_end().as_bytes();
            if should_skip_line(line) {
                continue;
            }

            let Some((start_field, end_field)) = split_bed_fields(line) else {
                warn!(
                    "{}: line {}: expected at least 3 tab-separated columns, skipping",
                    path.display(),
                    line_number
                );
                continue;
            };

            let (Some(bed_start), Some(bed_end)) =
                (parse_u64_fast(start_field), parse_u64_fast(end_field))
            else {
                warn!(
                    "{}: line {}: non-integer mask coordinates, skipping",
                    path.display(),
                    line_number
                );
                continue;
            };

            if bed_start > bed_end {
                return Err(MapleError::Parse {
                    line: line_number,
                    message: format!("mask start ({}) > end ({})", bed_start, bed_end),
                });
            }

            intervals.push(MaskInterval::from_bed(bed_start, bed_end));
        }

        Self::new(intervals)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// A fresh cursor, rewound to the first interval. One per maple file.
    #[inline]
    pub fn cursor(&self) -> MaskCursor<'_> {
        MaskCursor {
            intervals: &self.intervals,
            idx: 0,
        }
    }
}

fn validate_order(intervals: &[MaskInterval]) -> Result<()> {
    for pair in intervals.windows(2) {
        if pair[1].start <= pair[0].end {
            return Err(MapleError::InvalidFormat(format!(
                "mask intervals must be ascending and non-overlapping: \
                 [{}, {}] is followed by [{}, {}]",
                pair[0].start, pair[0].end, pair[1].start, pair[1].end
            )));
        }
    }
    Ok(())
}

/// Forward-only cursor over a [`MaskSet`].
///
/// `advance()` past the final interval enters a terminal exhausted state;
/// the index never decreases over a file's scan.
#[derive(Debug, Clone)]
pub struct MaskCursor<'a> {
    intervals: &'a [MaskInterval],
    idx: usize,
}

impl<'a> MaskCursor<'a> {
    /// Peek at the current interval without consuming it.
    #[inline]
    pub fn current(&self) -> Option<MaskInterval> {
        self.intervals.get(self.idx).copied()
    }

    /// Move to the next interval, or into the exhausted state.
    #[inline]
    pub fn advance(&mut self) {
        if self.idx < self.intervals.len() {
            self.idx += 1;
        }
    }

    /// True once the cursor has moved past the final interval.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.idx >= self.intervals.len()
    }

    /// Monotone scan position, exposed for stats and assertions.
    #[inline]
    pub fn index(&self) -> usize {
        self.idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn bed_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_bed_coordinate_conversion() {
        // BED 119..130 covers maple positions 120..=130.
        let iv = MaskInterval::from_bed(119, 130);
        assert_eq!(iv, MaskInterval::new(120, 130));
    }

    #[test]
    fn test_load_and_cursor() {
        let file = bed_file("chr1\t119\t130\nchr1\t200\t250\n");
        let set = MaskSet::from_path(file.path()).unwrap();
        assert_eq!(set.len(), 2);

        let mut cursor = set.cursor();
        assert_eq!(cursor.current(), Some(MaskInterval::new(120, 130)));
        cursor.advance();
        assert_eq!(cursor.current(), Some(MaskInterval::new(201, 250)));
        assert!(!cursor.is_exhausted());
        cursor.advance();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.current(), None);

        // Terminal: further advances stay exhausted.
        cursor.advance();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_cursor_rewind_is_a_new_cursor() {
        let file = bed_file("chr1\t0\t10\n");
        let set = MaskSet::from_path(file.path()).unwrap();

        let mut first = set.cursor();
        first.advance();
        assert!(first.is_exhausted());

        let second = set.cursor();
        assert_eq!(second.index(), 0);
        assert_eq!(second.current(), Some(MaskInterval::new(1, 10)));
    }

    #[test]
    fn test_skip_comments_and_track_lines() {
        let file = bed_file("# comment\ntrack name=mask\nchr1\t10\t20\n");
        let set = MaskSet::from_path(file.path()).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_malformed_line_skipped() {
        let file = bed_file("chr1\t10\n chr1\t10\t20\nchr1\t30\t40\n");
        // Line 1 has two columns, line 2 has a mangled chromosome but three
        // columns; only the coordinate columns matter, so line 2 parses.
        let set = MaskSet::from_path(file.path()).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unsorted_mask_rejected() {
        let file = bed_file("chr1\t100\t200\nchr1\t50\t80\n");
        let err = MaskSet::from_path(file.path()).unwrap_err();
        assert!(matches!(err, MapleError::InvalidFormat(_)));
    }

    #[test]
    fn test_overlapping_mask_rejected() {
        let file = bed_file("chr1\t100\t200\nchr1\t150\t300\n");
        assert!(MaskSet::from_path(file.path()).is_err());
    }

    #[test]
    fn test_empty_mask_set() {
        let file = bed_file("# nothing here\n");
        let set = MaskSet::from_path(file.path()).unwrap();
        assert!(set.is_empty());
        assert!(set.cursor().is_exhausted());
    }
}
