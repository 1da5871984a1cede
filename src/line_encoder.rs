use crate::harmonize::ChordLine;
use anyhow::Result;

/// A streaming consumer of harmonized chord lines.
///
/// Encoders write each line as it is produced and finalize their output in
/// `close`. `close` must be idempotent; writing after `close` is an error.
pub trait LineEncoder {
    fn write_line(&mut self, line: &ChordLine) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
