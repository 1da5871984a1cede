use anyhow::Result;
use std::io::Write;

use crate::harmonize::ChordLine;
use crate::line_encoder::LineEncoder;

/// Title written at the top of every sheet.
const SHEET_TITLE: &str = "# Recovered Songbook";

/// Separator between chords in a line header.
const CHORD_JOIN: &str = "   ";

/// A `LineEncoder` that writes a Markdown chord sheet.
///
/// Design:
/// - We stream output directly to a `Write` implementation.
/// - The title is written lazily on the first line so that:
///   - callers can construct the encoder without immediately writing output
///   - "no lines" runs emit nothing rather than a bare heading
///
/// Each line renders as a bold `**[MM:SS]  chords**` header followed by the
/// lyric text and a blank line:
///
/// ```text
/// **[00:12]  G   Em**
/// hello darkness my old friend
/// ```
pub struct SheetEncoder<W: Write> {
    /// The underlying writer we stream the sheet into.
    w: W,

    /// Whether we've written the title.
    started: bool,

    /// Whether the encoder has been closed.
    closed: bool,
}

impl<W: Write> SheetEncoder<W> {
    /// Create a new sheet encoder that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            closed: false,
        }
    }

    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            writeln!(&mut self.w, "{SHEET_TITLE}")?;
            writeln!(&mut self.w)?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> LineEncoder for SheetEncoder<W> {
    fn write_line(&mut self, line: &ChordLine) -> Result<()> {
        if self.closed {
            anyhow::bail!("cannot write line: encoder is already closed");
        }

        self.start_if_needed()?;

        let chords = line
            .chords
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(CHORD_JOIN);

        // Header: timestamp plus chords, bold. Lines with no chords still get
        // their timestamp so the sheet stays scannable.
        if chords.is_empty() {
            writeln!(&mut self.w, "**{}**", line.timestamp)?;
        } else {
            writeln!(&mut self.w, "**{}  {}**", line.timestamp, chords)?;
        }

        writeln!(&mut self.w, "{}", line.text)?;
        writeln!(&mut self.w)?;

        // Flush so streaming consumers (stdout, pipes, sockets) see output promptly.
        self.w.flush()?;

        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::classify;
    use crate::chroma::PITCH_CLASSES;

    fn line(timestamp: &str, roots: &[usize], text: &str) -> ChordLine {
        let chords = roots
            .iter()
            .map(|&root| {
                let mut frame = [0.0; PITCH_CLASSES];
                frame[root] = 1.0;
                frame[(root + 4) % PITCH_CLASSES] = 0.5;
                classify(&frame)
            })
            .collect();
        ChordLine {
            timestamp: timestamp.to_owned(),
            chords,
            text: text.to_owned(),
        }
    }

    #[test]
    fn sheet_close_without_lines_emits_nothing() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SheetEncoder::new(&mut out);
        enc.close()?;
        assert_eq!(std::str::from_utf8(&out)?, "");
        Ok(())
    }

    #[test]
    fn sheet_writes_title_once_and_bold_headers() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SheetEncoder::new(&mut out);

        enc.write_line(&line("[00:00]", &[7, 4], "hello"))?;
        enc.write_line(&line("[00:05]", &[0], "world"))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert!(s.starts_with("# Recovered Songbook\n\n"));
        assert!(s.contains("**[00:00]  G   E**\nhello\n\n"));
        assert!(s.contains("**[00:05]  C**\nworld\n\n"));
        assert_eq!(s.matches("# Recovered Songbook").count(), 1);
        Ok(())
    }

    #[test]
    fn chordless_lines_keep_their_timestamp() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SheetEncoder::new(&mut out);
        enc.write_line(&line("[01:30]", &[], "instrumental break"))?;
        enc.close()?;

        let s = std::str::from_utf8(&out)?;
        assert!(s.contains("**[01:30]**\ninstrumental break\n\n"));
        Ok(())
    }

    #[test]
    fn sheet_write_after_close_errors() -> anyhow::Result<()> {
        let mut out = Vec::new();
        let mut enc = SheetEncoder::new(&mut out);
        enc.close()?;
        let err = enc.write_line(&line("[00:00]", &[0], "nope")).unwrap_err();
        assert!(err.to_string().contains("already closed"));
        Ok(())
    }
}
