//! Locally selected images and their transient previews.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};

/// Maximum image size accepted for upload (10 MB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Image MIME types accepted for upload.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heif",
    "image/avif",
];

/// An image selected on the local machine, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalImage {
    /// Wrap in-memory image data, sniffing the content type from its bytes.
    pub fn from_bytes(file_name: &str, bytes: Vec<u8>) -> ClientResult<Self> {
        if bytes.len() > MAX_IMAGE_SIZE {
            return Err(ClientError::InvalidRequest(format!(
                "{file_name}: image exceeds {MAX_IMAGE_SIZE} bytes"
            )));
        }

        let content_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .filter(|mime| ALLOWED_IMAGE_TYPES.contains(mime))
            .ok_or_else(|| {
                ClientError::InvalidRequest(format!("{file_name}: not a supported image"))
            })?;

        Ok(Self {
            file_name: sanitize_file_name(file_name),
            content_type: content_type.to_string(),
            bytes,
        })
    }

    /// Read an image from disk.
    pub fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        Self::from_bytes(name, bytes)
    }
}

/// Keep only the final path component and replace unsafe characters.
fn sanitize_file_name(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);

    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(200)
        .collect()
}

/// Handle to a transient preview of a local image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Creates and releases previews. Every created preview must be revoked
/// once its media item leaves the editor.
pub trait PreviewStore: Send + Sync {
    fn create(&self, image: &LocalImage) -> PreviewRef;
    fn revoke(&self, preview: &PreviewRef);
}

/// Preview store tracking live previews in memory.
#[derive(Debug, Default)]
pub struct InMemoryPreviews {
    live: Mutex<HashMap<PreviewRef, usize>>,
}

impl InMemoryPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of previews created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }

    pub fn is_live(&self, preview: &PreviewRef) -> bool {
        self.live.lock().contains_key(preview)
    }

    /// Bytes held by live previews.
    pub fn live_bytes(&self) -> usize {
        self.live.lock().values().sum()
    }
}

impl PreviewStore for InMemoryPreviews {
    fn create(&self, image: &LocalImage) -> PreviewRef {
        let preview = PreviewRef(format!("preview:{}", Uuid::now_v7()));
        self.live.lock().insert(preview.clone(), image.bytes.len());
        preview
    }

    fn revoke(&self, preview: &PreviewRef) {
        if self.live.lock().remove(preview).is_none() {
            debug!(preview = %preview.as_str(), "revoking unknown preview");
        }
    }
}

/// A media item in the editor: the image plus its preview handle.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub image: LocalImage,
    pub preview: PreviewRef,
}
