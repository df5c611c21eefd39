//! Buffered maple output formatting.
//!
//! Uses itoa for integer formatting to avoid allocation in the hot path.

use crate::maple::{MapleError, Result};
use crate::record::{MapleRecord, RunKind};
use std::io::{BufWriter, Write};

/// Buffer size for MapleWriter (2MB).
const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Buffered maple file writer.
pub struct MapleWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> MapleWriter<W> {
    /// Create a new MapleWriter with the default buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    /// Create a new MapleWriter with a specific buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write any maple record as one line.
    #[inline]
    pub fn write_record(&mut self, record: &MapleRecord) -> Result<()> {
        match record {
            MapleRecord::Edit { base, pos } => self.write_edit(*base, *pos),
            MapleRecord::Run { kind, pos, len } => self.write_run(*kind, *pos, *len),
            MapleRecord::Header(line) => self.write_header(line),
        }
    }

    /// Write a single-base edit line: `<base>\t<pos>`.
    #[inline]
    pub fn write_edit(&mut self, base: char, pos: u64) -> Result<()> {
        let mut symbol = [0u8; 4];
        self.writer
            .write_all(base.encode_utf8(&mut symbol).as_bytes())
            .map_err(MapleError::Io)?;
        self.writer.write_all(b"\t").map_err(MapleError::Io)?;
        self.writer
            .write_all(self.itoa_buf.format(pos).as_bytes())
            .map_err(MapleError::Io)?;
        self.writer.write_all(b"\n").map_err(MapleError::Io)?;
        Ok(())
    }

    /// Write a run line: `<symbol>\t<pos>\t<len>`.
    #[inline]
    pub fn write_run(&mut self, kind: RunKind, pos: u64, len: u64) -> Result<()> {
        let symbol = match kind {
            RunKind::Gap => b"-",
            RunKind::Unknown => b"n",
        };
        self.writer.write_all(symbol).map_err(MapleError::Io)?;
        self.writer.write_all(b"\t").map_err(MapleError::Io)?;
        self.writer
            .write_all(self.itoa_buf.format(pos).as_bytes())
            .map_err(MapleError::Io)?;
        self.writer.write_all(b"\t").map_err(MapleError::Io)?;
        self.writer
            .write_all(self.itoa_buf.format(len).as_bytes())
            .map_err(MapleError::Io)?;
        self.writer.write_all(b"\n").map_err(MapleError::Io)?;
        Ok(())
    }

    /// Write a two-column point no-call: `n\t<pos>`.
    ///
    /// The length column is omitted for point events; readers default it
    /// to one.
    #[inline]
    pub fn write_point(&mut self, pos: u64) -> Result<()> {
        self.writer.write_all(b"n\t").map_err(MapleError::Io)?;
        self.writer
            .write_all(self.itoa_buf.format(pos).as_bytes())
            .map_err(MapleError::Io)?;
        self.writer.write_all(b"\n").map_err(MapleError::Io)?;
        Ok(())
    }

    /// Write a header line verbatim.
    #[inline]
    pub fn write_header(&mut self, line: &str) -> Result<()> {
        self.writer
            .write_all(line.as_bytes())
            .map_err(MapleError::Io)?;
        self.writer.write_all(b"\n").map_err(MapleError::Io)?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(MapleError::Io)
    }
}
