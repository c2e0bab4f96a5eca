//! Turning a user-selected file into a decoded bitmap.
//!
//! Sources are screened by MIME type and size before any bytes are read, then
//! decoded off the async executor. A newer selection supersedes an older one
//! through [`SelectionSlot`]; results of a superseded selection are dropped.

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::{
    config::AcquisitionLimits,
    error::{LeafDiagError, Result},
};

const UNKNOWN_MIME: &str = "application/octet-stream";

/// MIME type implied by the file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or(UNKNOWN_MIME)
}

/// Reject non-image sources and files above the size ceiling.
pub fn validate_source(mime: &str, size: u64, limits: &AcquisitionLimits) -> Result<()> {
    if !mime.starts_with("image/") {
        return Err(LeafDiagError::InvalidInput(format!(
            "please select a valid image file (got {mime})"
        )));
    }
    if size > limits.max_file_bytes {
        return Err(LeafDiagError::InvalidInput(format!(
            "file is too large ({} bytes, max {} bytes)",
            size, limits.max_file_bytes
        )));
    }
    Ok(())
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| LeafDiagError::InvalidInput(format!("unable to decode image: {e}")))
}

/// Screen, read and decode an image file.
pub async fn acquire_file(path: impl AsRef<Path>, limits: &AcquisitionLimits) -> Result<DynamicImage> {
    let path = path.as_ref();
    let read_failure = |source| LeafDiagError::ReadFailure {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(read_failure)?;
    let mime = mime_for_path(path);
    debug!(?path, mime, size = metadata.len(), "Screening source");
    validate_source(mime, metadata.len(), limits)?;

    let bytes = read_capped(path, limits).await?;
    let image = tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| LeafDiagError::ProcessingFailure(format!("decoder task failed: {e}")))??;

    info!("Acquired {:?} ({}x{})", path, image.width(), image.height());
    Ok(image)
}

/// Read at most `limits.max_file_bytes`, rejecting a file that turns out
/// larger than the ceiling once read.
pub async fn read_capped(path: &Path, limits: &AcquisitionLimits) -> Result<Vec<u8>> {
    let read_failure = |source| LeafDiagError::ReadFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = tokio::fs::File::open(path).await.map_err(read_failure)?;
    let mut bytes = Vec::new();
    file.take(limits.max_file_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .await
        .map_err(read_failure)?;

    if bytes.len() as u64 > limits.max_file_bytes {
        return Err(LeafDiagError::InvalidInput(format!(
            "file is too large (more than {} bytes)",
            limits.max_file_bytes
        )));
    }
    Ok(bytes)
}

/// Generation counter deciding which selection is current.
#[derive(Debug, Clone, Default)]
pub struct SelectionSlot {
    generation: Arc<AtomicU64>,
}

impl SelectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new selection, superseding every earlier ticket.
    pub fn begin(&self) -> SelectionTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        SelectionTicket {
            generation,
            slot: Arc::clone(&self.generation),
        }
    }

    /// Supersede any in-flight selection without starting a new one.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[derive(Debug)]
pub struct SelectionTicket {
    generation: u64,
    slot: Arc<AtomicU64>,
}

impl SelectionTicket {
    pub fn is_current(&self) -> bool {
        self.slot.load(Ordering::Acquire) == self.generation
    }

    /// `Some(value)` if no newer selection has started, otherwise `None`.
    pub fn resolve<T>(self, value: T) -> Option<T> {
        self.is_current().then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("leaf_diag_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).expect("Should create temp dir");
        dir
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("leaf.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("leaf.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("notes.txt")), UNKNOWN_MIME);
        assert_eq!(mime_for_path(Path::new("no_extension")), UNKNOWN_MIME);
    }

    #[test]
    fn test_validate_source() {
        let limits = AcquisitionLimits::default();
        assert!(validate_source("image/png", 1024, &limits).is_ok());
        assert!(validate_source("image/jpeg", limits.max_file_bytes, &limits).is_ok());

        let too_big = validate_source("image/jpeg", limits.max_file_bytes + 1, &limits).unwrap_err();
        assert!(too_big.is_input_error());
        assert!(too_big.to_string().contains("too large"));

        let not_image = validate_source("text/plain", 10, &limits).unwrap_err();
        assert!(matches!(not_image, LeafDiagError::InvalidInput(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not a png").unwrap_err();
        assert!(matches!(err, LeafDiagError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_acquire_png_round_trip() {
        let dir = temp_dir("acquire");
        let path = dir.join("leaf.png");
        RgbImage::from_pixel(6, 4, Rgb([43, 200, 43])).save(&path).expect("Should save");

        let image = acquire_file(&path, &AcquisitionLimits::default()).await.expect("Should acquire");
        assert_eq!((image.width(), image.height()), (6, 4));
        assert_eq!(image.to_rgb8().get_pixel(0, 0), &Rgb([43, 200, 43]));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_read_failure() {
        let err = acquire_file("/definitely/missing/leaf.png", &AcquisitionLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LeafDiagError::ReadFailure { .. }));
    }

    #[tokio::test]
    async fn test_size_checked_before_decoding() {
        let dir = temp_dir("oversized");
        let path = dir.join("leaf.png");
        std::fs::write(&path, vec![0u8; 64]).expect("Should write");

        let limits = AcquisitionLimits { max_file_bytes: 32 };
        let err = acquire_file(&path, &limits).await.unwrap_err();
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_read_capped_rejects_bytes_past_ceiling() {
        let dir = temp_dir("capped");
        let path = dir.join("grown.png");
        std::fs::write(&path, vec![7u8; 48]).expect("Should write");

        let exact = read_capped(&path, &AcquisitionLimits { max_file_bytes: 48 })
            .await
            .expect("Should read");
        assert_eq!(exact.len(), 48);

        let err = read_capped(&path, &AcquisitionLimits { max_file_bytes: 47 })
            .await
            .unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_corrupt_image_is_invalid_input() {
        let dir = temp_dir("corrupt");
        let path = dir.join("leaf.png");
        std::fs::write(&path, b"not really a png").expect("Should write");

        let err = acquire_file(&path, &AcquisitionLimits::default()).await.unwrap_err();
        assert!(matches!(err, LeafDiagError::InvalidInput(_)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_newer_selection_supersedes() {
        let slot = SelectionSlot::new();
        let first = slot.begin();
        assert!(first.is_current());

        let second = slot.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(first.resolve("stale"), None);
        assert_eq!(second.resolve("fresh"), Some("fresh"));
    }

    #[test]
    fn test_clear_invalidates_in_flight_selection() {
        let slot = SelectionSlot::new();
        let ticket = slot.begin();
        slot.clear();
        assert!(!ticket.is_current());
    }
}
