use std::{
    future::Future,
    path::Path,
    sync::{Arc, PoisonError, RwLock, RwLockWriteGuard},
};

use image::DynamicImage;
use tracing::{debug, info};

use crate::{
    acquisition::{SelectionSlot, acquire_file},
    error::{LeafDiagError, Result},
    pipeline::LeafAnalyzer,
    types::AnalysisResult,
};

/// Select-then-analyze workflow around one [`LeafAnalyzer`].
///
/// Holds at most one current image. Selecting a new file supersedes any
/// selection still being read; when the older read finishes its image is
/// discarded instead of replacing the newer one.
#[derive(Clone)]
pub struct DiagnosisSession {
    analyzer: Arc<LeafAnalyzer>,
    image: Arc<RwLock<Option<Arc<DynamicImage>>>>,
    slot: SelectionSlot,
}

impl DiagnosisSession {
    pub fn new(analyzer: LeafAnalyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            image: Arc::new(RwLock::new(None)),
            slot: SelectionSlot::new(),
        }
    }

    pub fn analyzer(&self) -> &LeafAnalyzer {
        &self.analyzer
    }

    /// Read and decode `path`. The selection counts as started when this is
    /// called, not when the returned future is first polled.
    ///
    /// Resolves to `Ok(false)` when a newer selection (or a reset) arrived
    /// while this one was in flight.
    pub fn select_file(&self, path: &Path) -> impl Future<Output = Result<bool>> + Send + use<> {
        let ticket = self.slot.begin();
        let session = self.clone();
        let path = path.to_path_buf();

        async move {
            let limits = session.analyzer.config().acquisition.clone();
            let image = acquire_file(&path, &limits).await?;

            // Checked under the write lock so a concurrent reset cannot be overwritten.
            let mut current = session.write();
            if ticket.is_current() {
                *current = Some(Arc::new(image));
                Ok(true)
            } else {
                debug!("Discarding superseded selection");
                Ok(false)
            }
        }
    }

    /// Use an already decoded image, superseding any pending selection.
    pub fn set_image(&self, image: DynamicImage) {
        self.slot.clear();
        self.store(Some(Arc::new(image)));
    }

    pub fn has_image(&self) -> bool {
        self.current().is_some()
    }

    pub fn analyze(&self) -> Result<AnalysisResult> {
        let image = self.current().ok_or_else(|| {
            LeafDiagError::InvalidInput("please select an image".to_string())
        })?;
        self.analyzer.analyze(&image)
    }

    /// Forget the current image and cancel any selection in flight.
    pub fn reset(&self) {
        info!("Resetting diagnosis session");
        self.slot.clear();
        self.store(None);
    }

    fn current(&self) -> Option<Arc<DynamicImage>> {
        match self.image.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, image: Option<Arc<DynamicImage>>) {
        *self.write() = image;
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<DynamicImage>>> {
        self.image.write().unwrap_or_else(PoisonError::into_inner)
    }
}
