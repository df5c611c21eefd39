//! Maple masking: the sweep-line merge of a maple record stream with an
//! ordered mask interval stream, plus the per-file orchestrator.
//!
//! Both streams are position-sorted, so one forward cursor per stream is
//! enough: an interval the sweep has passed is never examined again, and
//! total work is O(records + intervals) per file.
//!
//! # Requirements
//!
//! Maple records must be in increasing position order and mask intervals
//! ascending and non-overlapping ([`MaskSet`] enforces the latter on load).

use crate::maple::{MapleError, MapleReader, Result};
use crate::mask::{MaskCursor, MaskSet};
use crate::record::MapleRecord;
use crate::streaming::MapleWriter;
use log::{error, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Result of pushing one record through the mask engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskedOutput {
    /// No overlap (or the mask stream is exhausted): emit the input as-is.
    Unchanged,
    /// The record lies inside a mask region: emit nothing.
    Dropped,
    /// One surviving piece (head or tail of a straddling run).
    One(MapleRecord),
    /// Head and tail survive around an interior mask region.
    Two(MapleRecord, MapleRecord),
}

/// Apply the current mask region to one record, advancing the cursor past
/// regions that end before the record starts.
///
/// Single-position records (edits, degenerate zero-length runs) are kept
/// or dropped whole. Extended runs are clipped: the sub-span inside the
/// mask is suppressed and any surviving head/tail is re-emitted as an
/// `n` run at its new coordinates. Zero-length pieces are never emitted.
pub fn mask_record(record: &MapleRecord, cursor: &mut MaskCursor<'_>) -> MaskedOutput {
    let Some(pos) = record.pos() else {
        // Headers never enter the positional merge.
        return MaskedOutput::Unchanged;
    };

    // Skip regions ending before this record; past the final region the
    // cursor goes exhausted and everything else in the file passes through.
    while let Some(region) = cursor.current() {
        if region.end < pos {
            cursor.advance();
        } else {
            break;
        }
    }
    let Some(region) = cursor.current() else {
        return MaskedOutput::Unchanged;
    };
    let (start, end) = (region.start, region.end);

    let ext = record.extent();
    if ext == 0 {
        // Point decision: after the advance loop end >= pos always holds,
        // so only the region starting beyond the point lets it through.
        return if start > pos || end < pos {
            MaskedOutput::Unchanged
        } else {
            MaskedOutput::Dropped
        };
    }

    let last = pos + ext - 1;

    if start <= pos && end <= last {
        // Mask covers the head; the tail survives if any of it is left.
        if end < last {
            MaskedOutput::One(MapleRecord::unknown(end + 1, last - end))
        } else {
            MaskedOutput::Dropped
        }
    } else if start > last {
        // Region begins past the run's end: no overlap.
        MaskedOutput::Unchanged
    } else if start > pos {
        // Region starts inside the run; the head always survives.
        let head = MapleRecord::unknown(pos, start - pos);
        if end < last {
            MaskedOutput::Two(head, MapleRecord::unknown(end + 1, last - end))
        } else {
            // end >= last: the tail is fully masked (zero-length remainder
            // when end == last), so only the head is written.
            MaskedOutput::One(head)
        }
    } else {
        // start <= pos && end > last: the region swallows the whole run.
        MaskedOutput::Dropped
    }
}

/// Per-file masking statistics.
#[derive(Debug, Default, Clone)]
pub struct MaskFileStats {
    /// Positional records read
    pub records: usize,
    /// Records/pieces written (headers not counted)
    pub written: usize,
    /// Records dropped entirely
    pub dropped: usize,
    /// Input records that were clipped into new pieces
    pub clipped: usize,
    /// Malformed lines skipped
    pub skipped_lines: usize,
}

/// Aggregate statistics for one masking run.
#[derive(Debug, Default, Clone)]
pub struct MaskStats {
    /// Maple files fully processed
    pub files: usize,
    /// Maple files skipped after an error
    pub files_skipped: usize,
    /// Mask intervals loaded from the BED file
    pub intervals: usize,
    pub records: usize,
    pub written: usize,
    pub dropped: usize,
    pub clipped: usize,
    pub skipped_lines: usize,
}

impl MaskStats {
    fn absorb(&mut self, file: &MaskFileStats) {
        self.files += 1;
        self.records += file.records;
        self.written += file.written;
        self.dropped += file.dropped;
        self.clipped += file.clipped;
        self.skipped_lines += file.skipped_lines;
    }
}

impl std::fmt::Display for MaskStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Files: {} ({} skipped), Intervals: {}, Records: {}, Written: {}, Dropped: {}, Clipped: {}, Bad lines: {}",
            self.files,
            self.files_skipped,
            self.intervals,
            self.records,
            self.written,
            self.dropped,
            self.clipped,
            self.skipped_lines
        )
    }
}

/// Masking command configuration.
#[derive(Debug, Clone)]
pub struct MaskCommand {
    /// Process independent maple files on the rayon pool. Each file gets
    /// its own rewound cursor; per-file output ordering is unaffected.
    pub parallel: bool,
}

impl Default for MaskCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskCommand {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Mask every maple file named in `list_path` against the BED regions
    /// in `bed_path`, writing one output per input into `out_dir`.
    ///
    /// A missing list or BED file is fatal. A failure on an individual
    /// maple file (missing input, write error) is reported against that
    /// path and the remaining files are still processed.
    pub fn run<P: AsRef<Path>>(&self, list_path: P, bed_path: P, out_dir: P) -> Result<MaskStats> {
        let list_path = list_path.as_ref();
        let bed_path = bed_path.as_ref();
        let out_dir = out_dir.as_ref();

        let inputs = read_file_list(list_path).map_err(|e| {
            MapleError::InvalidFormat(format!("failed to read file list {}: {}", list_path.display(), e))
        })?;
        let masks = MaskSet::from_path(bed_path).map_err(|e| {
            MapleError::InvalidFormat(format!("failed to load mask file {}: {}", bed_path.display(), e))
        })?;
        fs::create_dir_all(out_dir)?;

        let outcomes: Vec<(PathBuf, Result<MaskFileStats>)> = if self.parallel {
            inputs
                .par_iter()
                .map(|input| {
                    let result = self.mask_file(input, out_dir, &masks);
                    (input.clone(), result)
                })
                .collect()
        } else {
            inputs
                .iter()
                .map(|input| {
                    let result = self.mask_file(input, out_dir, &masks);
                    (input.clone(), result)
                })
                .collect()
        };

        let mut stats = MaskStats {
            intervals: masks.len(),
            ..MaskStats::default()
        };
        for (input, outcome) in outcomes {
            match outcome {
                Ok(file_stats) => stats.absorb(&file_stats),
                Err(e) => {
                    error!("{}: {}", input.display(), e);
                    stats.files_skipped += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Mask a single maple file into `out_dir`, against a fresh cursor.
    pub fn mask_file(
        &self,
        input: &Path,
        out_dir: &Path,
        masks: &MaskSet,
    ) -> Result<MaskFileStats> {
        let file_name = input.file_name().ok_or_else(|| {
            MapleError::InvalidFormat(format!("no file name in path {}", input.display()))
        })?;
        let dest = out_dir.join(file_name);

        let mut reader = MapleReader::from_path(input)?;
        let mut writer = MapleWriter::new(File::create(&dest)?);
        let mut cursor = masks.cursor();
        let mut stats = MaskFileStats::default();

        loop {
            let record = match reader.read_record() {
                Ok(Some(record)) => record,
                Ok(None) => break,
                Err(e @ MapleError::Parse { .. }) => {
                    // Malformed lines are reported and skipped; the scan
                    // continues with the cursor untouched.
                    warn!("{}: {}", input.display(), e);
                    stats.skipped_lines += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let MapleRecord::Header(line) = &record {
                writer.write_header(line)?;
                continue;
            }
            stats.records += 1;

            match mask_record(&record, &mut cursor) {
                MaskedOutput::Unchanged => {
                    writer.write_record(&record)?;
                    stats.written += 1;
                }
                MaskedOutput::Dropped => stats.dropped += 1,
                MaskedOutput::One(piece) => {
                    writer.write_record(&piece)?;
                    stats.written += 1;
                    stats.clipped += 1;
                }
                MaskedOutput::Two(head, tail) => {
                    writer.write_record(&head)?;
                    writer.write_record(&tail)?;
                    stats.written += 2;
                    stats.clipped += 1;
                }
            }
        }

        writer.flush()?;
        Ok(stats)
    }
}

/// Read a maple-file list: one path per line, blank lines ignored.
fn read_file_list(path: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        paths.push(PathBuf::from(line));
    }
    Ok(paths)
}
