//! Item serialization strategies
//!
//! The stream writer is generic over an [`ItemEncoder`]. Compact `serde_json`
//! is the only encoder shipped; [`select_encoder`] returns it.

use crate::error::Result;
use crate::types::Item;

/// Serializes one item into the output buffer
pub trait ItemEncoder: Send + Sync {
    /// Append the encoded item to `out`
    fn encode(&self, item: &Item, out: &mut Vec<u8>) -> Result<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Compact UTF-8 JSON without insignificant whitespace
///
/// Non-ASCII characters are written as-is rather than escaped.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompactJsonEncoder;

impl ItemEncoder for CompactJsonEncoder {
    fn encode(&self, item: &Item, out: &mut Vec<u8>) -> Result<()> {
        serde_json::to_writer(out, item)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "serde_json-compact"
    }
}

/// Encoder used for the output file (always [`CompactJsonEncoder`])
pub fn select_encoder() -> CompactJsonEncoder {
    CompactJsonEncoder
}
