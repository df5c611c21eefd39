//! Command implementations for maple-tools.

pub mod convert;
pub mod mask;

pub use convert::{Combine, ConvertCommand, ConvertStats};
pub use mask::{mask_record, MaskCommand, MaskFileStats, MaskStats, MaskedOutput};
