//! Optional vocal/instrumental source separation.
//!
//! Separation models are heavyweight and not everyone wants them, so the
//! capability lives behind a small trait: the pipeline takes an optional
//! boxed `Separator` and the rest of the crate carries no separation
//! dependencies. The bundled implementation shells out to an external
//! two-stem separation program.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, ensure, Context, Result};

/// The pair of stem files a separation run produces.
#[derive(Debug, Clone)]
pub struct SeparatedStems {
    pub vocals: PathBuf,
    pub instrumental: PathBuf,
}

/// A source-separation collaborator.
///
/// Implementations split a mixed recording into an isolated vocal stem and
/// an instrumental stem, writing both under `out_dir`.
pub trait Separator {
    fn separate(&self, audio: &Path, out_dir: &Path) -> Result<SeparatedStems>;
}

/// Default name of the external separation program.
pub const DEFAULT_SEPARATOR_PROGRAM: &str = "demucs";

/// A `Separator` that drives an external two-stem separation program.
///
/// The program is invoked as
/// `<program> --two-stems vocals -o <out_dir> <audio>` and is expected to
/// write `vocals.wav` and `no_vocals.wav` somewhere below `out_dir` (demucs
/// nests them under `<model>/<track>/`); we search rather than hard-code the
/// nesting.
pub struct CommandSeparator {
    program: String,
}

impl CommandSeparator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The configured program name, for diagnostics.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandSeparator {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR_PROGRAM)
    }
}

impl Separator for CommandSeparator {
    fn separate(&self, audio: &Path, out_dir: &Path) -> Result<SeparatedStems> {
        ensure!(audio.is_file(), "audio file not found at '{}'", audio.display());
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create '{}'", out_dir.display()))?;

        tracing::info!(program = %self.program, audio = %audio.display(), "separating stems");

        let status = Command::new(&self.program)
            .arg("--two-stems")
            .arg("vocals")
            .arg("-o")
            .arg(out_dir)
            .arg(audio)
            .status()
            .with_context(|| format!("failed to launch separation program '{}'", self.program))?;

        if !status.success() {
            bail!("separation program '{}' exited with {status}", self.program);
        }

        let vocals = find_stem(out_dir, "vocals.wav")?;
        let instrumental = find_stem(out_dir, "no_vocals.wav")?;

        Ok(SeparatedStems {
            vocals,
            instrumental,
        })
    }
}

/// Locate a produced stem file below `out_dir`.
///
/// Separation programs nest output under model/track directories whose names
/// depend on the input filename, so we walk the tree for the stem name.
fn find_stem(out_dir: &Path, name: &str) -> Result<PathBuf> {
    let mut pending = vec![out_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("failed to read '{}'", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.file_name().is_some_and(|f| f == name) {
                return Ok(path);
            }
        }
    }

    bail!(
        "separation produced no '{name}' under '{}'",
        out_dir.display()
    );
}
