// ============================================================
// Layer 2 — GalleryUseCase
// ============================================================
// Renders a 5 × 5 grid of training images starting at a chosen
// index. Reuses the training images already in the session when
// there are any; otherwise loads the corpus and publishes them.

use anyhow::{Context, Result};
use burn::prelude::Backend;
use std::path::{Path, PathBuf};

use crate::domain::traits::CorpusProvider;
use crate::infra::{
    gallery::{self, ImageGallery},
    session::SessionContext,
};

pub struct GalleryUseCase {
    offset: usize,
    output: PathBuf,
}

impl GalleryUseCase {
    pub fn new(offset: usize, output: impl Into<PathBuf>) -> Self {
        Self { offset, output: output.into() }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Returns the written image, or None when there was nothing to draw
    pub fn execute<B: Backend>(
        &self,
        session:  &mut SessionContext<B>,
        provider: &dyn CorpusProvider,
    ) -> Result<Option<PathBuf>> {
        if session.training_set().is_none() {
            tracing::info!("Loading images from {}", provider.describe());
            let corpus = provider
                .load()
                .with_context(|| format!("Could not load {}", provider.describe()))?;
            session.publish_training_set(corpus.train().clone());
        }

        let train = session
            .training_set()
            .context("No training images in the session")?;

        let tiles = gallery::tiles(train.labels(), self.offset);
        if tiles.is_empty() {
            tracing::warn!(
                "Offset {} is past the last of {} training images",
                self.offset,
                train.len()
            );
        }

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        Ok(ImageGallery::new(&self.output).render(train.images(), &tiles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::data::synthetic::SyntheticCorpus;

    #[test]
    fn test_loads_and_publishes_when_session_empty() {
        let dir     = tempfile::tempdir().unwrap();
        let mut session = SessionContext::<NdArray>::new();
        let provider    = SyntheticCorpus::new(40, 10, 5);

        GalleryUseCase::new(10, dir.path().join("g").join("samples.png"))
            .execute(&mut session, &provider)
            .unwrap();

        assert_eq!(session.training_images().map(|i| i.len()), Some(40));
        assert!(dir.path().join("g").is_dir());
    }

    #[test]
    fn test_offset_past_end_draws_nothing() {
        let dir     = tempfile::tempdir().unwrap();
        let mut session = SessionContext::<NdArray>::new();
        let provider    = SyntheticCorpus::new(20, 10, 5);

        let written = GalleryUseCase::new(500, dir.path().join("samples.png"))
            .execute(&mut session, &provider)
            .unwrap();
        assert!(written.is_none());
    }

    #[test]
    fn test_missing_corpus_is_an_error() {
        let dir     = tempfile::tempdir().unwrap();
        let mut session = SessionContext::<NdArray>::new();
        let provider    = crate::data::loader::Cifar10Loader::new(dir.path().join("missing"));

        let result = GalleryUseCase::new(0, dir.path().join("samples.png"))
            .execute(&mut session, &provider);
        assert!(result.is_err());
        assert!(session.training_set().is_none());
    }
}
