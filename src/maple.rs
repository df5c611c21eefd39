//! Streaming maple file parser.

use crate::record::{MapleRecord, RunKind};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading maple or mask data.
#[derive(Error, Debug)]
pub enum MapleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, MapleError>;

/// A streaming maple file reader.
///
/// Lazy and forward-only; restarting a scan means reopening the file.
pub struct MapleReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl MapleReader<File> {
    /// Open a maple file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> MapleReader<R> {
    /// Create a new maple reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(256),
        }
    }

    /// Line number of the most recently read line (1-based).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next maple record.
    ///
    /// Blank lines are skipped. A malformed data line yields
    /// `MapleError::Parse`; the reader remains usable afterwards, so the
    /// caller decides between skip-and-continue and failing the file.
    pub fn read_record(&mut self) -> Result<Option<MapleRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }

            // Section headers bypass positional parsing entirely.
            if line.starts_with('>') {
                return Ok(Some(MapleRecord::Header(line.to_string())));
            }

            return self.parse_line(line).map(Some);
        }
    }

    /// Parse a single maple data line.
    fn parse_line(&self, line: &str) -> Result<MapleRecord> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(self.parse_err(format!(
                "expected at least 2 tab-separated columns, got {}",
                fields.len()
            )));
        }

        let mut symbol = fields[0].chars();
        let tag = match (symbol.next(), symbol.next()) {
            (Some(c), None) => c,
            _ => {
                return Err(self.parse_err(format!("invalid record symbol '{}'", fields[0])));
            }
        };

        let pos = self.parse_position(fields[1], "position")?;

        if let Some(kind) = RunKind::from_symbol(tag) {
            // A missing length column denotes a single-position no-call,
            // the form the GVCF converter writes for point events.
            let len = match fields.get(2) {
                Some(field) => self.parse_position(field, "length")?,
                None => 1,
            };
            return Ok(MapleRecord::Run { kind, pos, len });
        }

        match tag {
            'A' | 'C' | 'G' | 'T' => Ok(MapleRecord::Edit { base: tag, pos }),
            other => Err(self.parse_err(format!("unknown record symbol '{}'", other))),
        }
    }

    fn parse_position(&self, s: &str, field_name: &str) -> Result<u64> {
        s.parse()
            .map_err(|_| self.parse_err(format!("invalid {}: '{}'", field_name, s)))
    }

    fn parse_err(&self, message: String) -> MapleError {
        MapleError::Parse {
            line: self.line_number,
            message,
        }
    }

    /// Get an iterator over all records.
    pub fn records(self) -> MapleRecordIter<R> {
        MapleRecordIter { reader: self }
    }
}

/// Iterator over maple records.
pub struct MapleRecordIter<R: Read> {
    reader: MapleReader<R>,
}

impl<R: Read> Iterator for MapleRecordIter<R> {
    type Item = Result<MapleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Parse records from a string (useful for testing).
pub fn parse_records(content: &str) -> Result<Vec<MapleRecord>> {
    MapleReader::new(content.as_bytes()).records().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_records() {
        let content = ">sample_1\nA\t488\nn\t1000\t372\n-\t2500\t10\nT\t3000\n";
        let records = parse_records(content).unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(records[0], MapleRecord::Header(">sample_1".to_string()));
        assert_eq!(records[1], MapleRecord::Edit { base: 'A', pos: 488 });
        assert_eq!(records[2], MapleRecord::unknown(1000, 372));
        assert_eq!(
            records[3],
            MapleRecord::Run {
                kind: RunKind::Gap,
                pos: 2500,
                len: 10
            }
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let records = parse_records("A\t10\n\n\nC\t20\n").unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_length_defaults_to_one() {
        let records = parse_records("n\t100\n-\t200\n").unwrap();
        assert_eq!(records[0], MapleRecord::unknown(100, 1));
        assert_eq!(
            records[1],
            MapleRecord::Run {
                kind: RunKind::Gap,
                pos: 200,
                len: 1
            }
        );
    }

    #[test]
    fn test_single_column_rejected() {
        let err = parse_records("A\n").unwrap_err();
        assert!(matches!(err, MapleError::Parse { .. }));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = parse_records("X\t100\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("unknown record symbol"), "got: {}", msg);
    }

    #[test]
    fn test_non_integer_position() {
        let err = parse_records("A\tabc\n").unwrap_err();
        assert!(matches!(err, MapleError::Parse { .. }));
    }

    #[test]
    fn test_reader_continues_after_parse_error() {
        let mut reader = MapleReader::new("A\t10\nbogus line\nC\t20\n".as_bytes());
        assert!(reader.read_record().unwrap().is_some());
        assert!(reader.read_record().is_err());
        let third = reader.read_record().unwrap().unwrap();
        assert_eq!(third, MapleRecord::Edit { base: 'C', pos: 20 });
    }
}
