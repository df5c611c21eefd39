//! Shared streaming utilities.
//!
//! - Zero-allocation byte parsing for coordinate files
//! - Buffered, itoa-backed maple output

pub mod output;
pub mod parsing;

pub use output::MapleWriter;
pub use parsing::{parse_u64_fast, should_skip_line, split_bed_fields};
