//! Load-once model cache keyed by tier.
//!
//! Loading a Whisper model is by far the most expensive step of an analysis,
//! so contexts are constructed once per distinct tier and reused across
//! calls. The cache is owned by whoever drives the pipeline (CLI, server)
//! and injected into it; nothing in this crate reaches for global state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use whisper_rs::WhisperContext;

use crate::model_tier::ModelTier;
use crate::transcribe::get_context;

/// A cache of loaded Whisper contexts, one per model tier.
///
/// Contexts are loaded lazily on first request for a tier and held until the
/// cache is dropped (process shutdown, in practice).
pub struct ModelCache {
    model_dir: PathBuf,
    loaded: HashMap<ModelTier, WhisperContext>,
}

impl ModelCache {
    /// Create a cache that resolves tier model files under `model_dir`.
    ///
    /// We fail fast if the directory is missing so the first analysis doesn't
    /// pay for the mistake.
    pub fn new(model_dir: impl Into<PathBuf>) -> Result<Self> {
        let model_dir = model_dir.into();
        ensure!(
            model_dir.is_dir(),
            "model directory not found at '{}'",
            model_dir.display()
        );

        Ok(Self {
            model_dir,
            loaded: HashMap::new(),
        })
    }

    /// The directory model files are resolved from.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// The path a tier's model file resolves to, whether or not it exists.
    pub fn model_path(&self, tier: ModelTier) -> PathBuf {
        self.model_dir.join(tier.model_filename())
    }

    /// Tiers whose model file is present on disk.
    pub fn available_tiers(&self) -> Vec<ModelTier> {
        ModelTier::all()
            .into_iter()
            .filter(|tier| self.model_path(*tier).is_file())
            .collect()
    }

    /// Get the context for a tier, loading the model on first use.
    pub fn context(&mut self, tier: ModelTier) -> Result<&WhisperContext> {
        if !self.loaded.contains_key(&tier) {
            let path = self.model_path(tier);
            ensure!(
                path.is_file(),
                "no '{tier}' model at '{}'; download the ggml model file first",
                path.display()
            );

            let path_str = path
                .to_str()
                .with_context(|| format!("model path is not valid UTF-8: '{}'", path.display()))?;

            tracing::info!(%tier, path = %path.display(), "loading whisper model");
            let ctx = get_context(path_str)?;
            self.loaded.insert(tier, ctx);
        }

        // The entry was just inserted if it was missing.
        self.loaded
            .get(&tier)
            .context("model cache entry vanished")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_dir_is_rejected_up_front() {
        let err = ModelCache::new("/definitely/not/a/real/dir").unwrap_err();
        assert!(err.to_string().contains("model directory not found"));
    }

    #[test]
    fn missing_model_file_names_the_tier() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut cache = ModelCache::new(dir.path())?;
        let err = cache.context(ModelTier::Base).unwrap_err();
        assert!(err.to_string().contains("base"));
        assert!(err.to_string().contains("ggml-base.bin"));
        Ok(())
    }

    #[test]
    fn available_tiers_reflect_files_on_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("ggml-tiny.bin"), b"stub")?;

        let cache = ModelCache::new(dir.path())?;
        assert_eq!(cache.available_tiers(), vec![ModelTier::Tiny]);
        Ok(())
    }
}
