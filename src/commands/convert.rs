//! GVCF to maple conversion.
//!
//! A per-line classifier over a single-sample haploid GVCF: confidently
//! called reference blocks vanish (the maple encoding is implicit reference
//! match), everything below the depth/quality thresholds becomes an `n`
//! run or point, and passing single-base alternate calls become edits.

use crate::maple::{MapleError, Result};
use crate::record::RunKind;
use crate::streaming::MapleWriter;
use flate2::read::MultiGzDecoder;
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// How the depth and quality thresholds combine.
///
/// `And` requires both DP and GQ to pass (the recommended setting);
/// `Or` accepts a call when either passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combine {
    #[default]
    And,
    Or,
}

impl Combine {
    /// True when a call with the given depth and quality must be masked.
    #[inline]
    fn fails(&self, dp: u64, gq: u64, dp_min: u64, gq_min: u64) -> bool {
        match self {
            Combine::And => dp < dp_min || gq < gq_min,
            Combine::Or => dp < dp_min && gq < gq_min,
        }
    }
}

/// Conversion statistics.
#[derive(Debug, Default, Clone)]
pub struct ConvertStats {
    /// GVCF data lines read
    pub lines: usize,
    /// Chromosome sections started
    pub chromosomes: usize,
    /// Single-base alternate calls written
    pub edits: usize,
    /// `n` records written (blocks and points)
    pub no_calls: usize,
    /// Lines that matched no GVCF shape or failed to parse
    pub skipped_lines: usize,
}

impl std::fmt::Display for ConvertStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Lines: {}, Chromosomes: {}, Edits: {}, No-calls: {}, Skipped: {}",
            self.lines, self.chromosomes, self.edits, self.no_calls, self.skipped_lines
        )
    }
}

/// GVCF conversion configuration.
///
/// The recommended thresholds are DP >= 20 and GQ >= 99 combined with `And`.
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    /// Minimum read depth (DP) for a confident call
    pub dp_min: u64,
    /// Minimum genotype quality (GQ) for a confident call
    pub gq_min: u64,
    /// Threshold combination rule
    pub combine: Combine,
}

impl Default for ConvertCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertCommand {
    pub fn new() -> Self {
        Self {
            dp_min: 20,
            gq_min: 99,
            combine: Combine::And,
        }
    }

    /// Convert one GVCF file (plain or gzipped) into a maple file.
    ///
    /// When `output` is None the destination is the input path with its
    /// `.g.vcf.gz` / `.g.vcf` suffix replaced by `.maple`; any other input
    /// name is rejected rather than guessed at.
    pub fn run(&self, input: &Path, output: Option<&Path>) -> Result<ConvertStats> {
        let dest = match output {
            Some(path) => path.to_path_buf(),
            None => derive_output_path(input)?,
        };
        let reader = open_maybe_gzip(input)?;
        let mut writer = MapleWriter::new(File::create(&dest)?);

        // Section headers are labeled `>{stem}_{n}` with a running
        // chromosome counter.
        let stem = dest
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("maple")
            .to_string();

        let mut stats = ConvertStats::default();
        let mut current_chrom: Option<String> = None;

        for (line_number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            stats.lines += 1;

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 10 {
                warn!(
                    "{}: line {}: expected 10 GVCF columns, got {}, skipping",
                    input.display(),
                    line_number + 1,
                    fields.len()
                );
                stats.skipped_lines += 1;
                continue;
            }

            if current_chrom.as_deref() != Some(fields[0]) {
                current_chrom = Some(fields[0].to_string());
                stats.chromosomes += 1;
                writer.write_header(&format!(">{}_{}", stem, stats.chromosomes))?;
            }

            match self.classify(&fields) {
                Ok(Some(Emit::NoCallBlock { pos, len })) => {
                    writer.write_run(RunKind::Unknown, pos, len)?;
                    stats.no_calls += 1;
                }
                Ok(Some(Emit::NoCallPoint { pos })) => {
                    writer.write_point(pos)?;
                    stats.no_calls += 1;
                }
                Ok(Some(Emit::Edit { base, pos })) => {
                    writer.write_edit(base, pos)?;
                    stats.edits += 1;
                }
                Ok(None) => {}
                Err(message) => {
                    warn!(
                        "{}: line {}: {}, skipping",
                        input.display(),
                        line_number + 1,
                        message
                    );
                    stats.skipped_lines += 1;
                }
            }
        }

        writer.flush()?;
        Ok(stats)
    }

    /// Decide what, if anything, one GVCF data line contributes.
    fn classify(&self, fields: &[&str]) -> std::result::Result<Option<Emit>, String> {
        let pos: u64 = fields[1]
            .parse()
            .map_err(|_| format!("invalid POS '{}'", fields[1]))?;
        let reference = fields[3];
        let alt = fields[4];
        let info = fields[7];
        let format = fields[8];
        let sample = fields[9];

        // Confidently-called reference blocks: ALT is bare <NON_REF>, the
        // sample is homozygous reference. Blocks below threshold become an
        // `n` run covering [POS, END].
        if alt == "<NON_REF>" && format.starts_with("GT:DP:GQ") && sample.starts_with("0:") {
            let stats: Vec<&str> = sample.split(':').collect();
            if stats.len() < 3 {
                return Err(format!("sample column '{}' too short for GT:DP:GQ", sample));
            }
            let dp = parse_metric(stats[1], "DP")?;
            let gq = parse_metric(stats[2], "GQ")?;
            if self.combine.fails(dp, gq, self.dp_min, self.gq_min) {
                let end = parse_info_end(info)?;
                if end < pos {
                    return Err(format!("INFO END {} before POS {}", end, pos));
                }
                return Ok(Some(Emit::NoCallBlock {
                    pos,
                    len: end - pos + 1,
                }));
            }
            return Ok(None);
        }

        // A multi-base REF is a deletion-shaped event the maple encoding
        // cannot carry; it is recorded as a point no-call.
        if reference.len() > 1 {
            return Ok(Some(Emit::NoCallPoint { pos }));
        }

        // Alternate calls: GT selects the allele; low-confidence calls and
        // insertions (multi-base alleles) become point no-calls.
        if alt.contains(",<NON_REF>") && format.starts_with("GT:AD:DP:GQ") {
            let stats: Vec<&str> = sample.split(':').collect();
            if stats.len() < 4 {
                return Err(format!(
                    "sample column '{}' too short for GT:AD:DP:GQ",
                    sample
                ));
            }
            let dp = parse_metric(stats[2], "DP")?;
            let gq = parse_metric(stats[3], "GQ")?;
            let mut missing = self.combine.fails(dp, gq, self.dp_min, self.gq_min);

            // GT of '.' or 0 never names a usable alternate allele.
            let allele: usize = stats[0].parse().unwrap_or(0);
            let base = if allele == 0 {
                missing = true;
                None
            } else {
                let chosen = alt.split(',').nth(allele - 1);
                match chosen {
                    Some(a) if a.len() == 1 => a.chars().next(),
                    _ => {
                        missing = true;
                        None
                    }
                }
            };

            return Ok(Some(match (missing, base) {
                (false, Some(base)) => Emit::Edit { base, pos },
                _ => Emit::NoCallPoint { pos },
            }));
        }

        // No read depth at all (GT:GQ:PL records): a bad call.
        if format.starts_with("GT:GQ:PL") {
            return Ok(Some(Emit::NoCallPoint { pos }));
        }

        Ok(None)
    }
}

enum Emit {
    NoCallBlock { pos: u64, len: u64 },
    NoCallPoint { pos: u64 },
    Edit { base: char, pos: u64 },
}

fn parse_metric(value: &str, name: &str) -> std::result::Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {} value '{}'", name, value))
}

/// Extract the END= value from a reference block's INFO column.
fn parse_info_end(info: &str) -> std::result::Result<u64, String> {
    info.split(';')
        .find_map(|kv| kv.strip_prefix("END="))
        .ok_or_else(|| format!("no END= in INFO '{}'", info))?
        .parse()
        .map_err(|_| format!("invalid END= in INFO '{}'", info))
}

/// Replace the GVCF suffix with `.maple`, next to the input.
fn derive_output_path(input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            MapleError::InvalidFormat(format!("no file name in path {}", input.display()))
        })?;

    let stem = name
        .strip_suffix(".g.vcf.gz")
        .or_else(|| name.strip_suffix(".g.vcf"))
        .ok_or_else(|| {
            MapleError::InvalidFormat(format!(
                "cannot derive output name from '{}': expected a .g.vcf or .g.vcf.gz suffix \
                 (pass an explicit output path instead)",
                name
            ))
        })?;

    Ok(input.with_file_name(format!("{}.maple", stem)))
}

/// Open a GVCF input, transparently decompressing gzip.
///
/// Detection is by `.gz` extension or the gzip magic bytes, so misnamed
/// files still open correctly.
fn open_maybe_gzip(path: &Path) -> Result<Box<dyn BufRead>> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let bytes_read = file.read(&mut magic)?;
    drop(file);
    let file = File::open(path)?;

    let is_gzip = path.extension().is_some_and(|ext| ext == "gz")
        || (bytes_read >= 2 && magic == [0x1f, 0x8b]);

    if is_gzip {
        // MultiGzDecoder: bgzip-compressed GVCFs are multi-member gzip.
        Ok(Box::new(BufReader::with_capacity(
            128 * 1024,
            MultiGzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(128 * 1024, file)))
    }
}
