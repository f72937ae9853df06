use std::collections::VecDeque;
use std::sync::Arc;

use uuid::Uuid;

use crate::canvas::PixelBuffer;
use crate::error::Result;
use crate::io;
use crate::segmentation::{Segmenter, composite_mask};
use crate::session::{CommittedImage, EditorSession};
use crate::settings::{DEFAULT_GALLERY_CAPACITY, EditorSettings};

/// One processed image.
#[derive(Clone, Debug)]
pub struct GalleryItem {
    pub id: Uuid,
    pub file_name: String,
    /// Cut-out result (mask composited, plus any stored edits).
    pub pixels: PixelBuffer,
    /// Decoded source before masking; used by the restore brush.
    pub source: Arc<PixelBuffer>,
}

impl GalleryItem {
    pub fn new(file_name: &str, pixels: PixelBuffer, source: Arc<PixelBuffer>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            pixels,
            source,
        }
    }
}

/// Decode → segment → composite for one file.
pub async fn process_file<S: Segmenter>(name: &str, bytes: &[u8], segmenter: &S) -> Result<GalleryItem> {
    let source = io::decode_image(bytes)?;
    let mask = segmenter.segment(&source).await.inspect_err(|e| {
        log::error!("{}: segmentation ({}) failed: {}", name, segmenter.name(), e);
    })?;
    let mut pixels = source.clone();
    composite_mask(&mut pixels, &mask)?;
    log::info!("processed {} ({}x{})", name, pixels.width(), pixels.height());
    Ok(GalleryItem::new(name, pixels, Arc::new(source)))
}

/// In-memory list of processed images, newest first.
#[derive(Debug)]
pub struct Gallery {
    items: VecDeque<GalleryItem>,
    capacity: usize,
}

impl Default for Gallery {
    fn default() -> Self {
        Self::new(DEFAULT_GALLERY_CAPACITY)
    }
}

impl Gallery {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn from_settings(settings: &EditorSettings) -> Self {
        Self::new(settings.gallery_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert at the front; the oldest item falls off past capacity.
    pub fn add(&mut self, item: GalleryItem) -> Uuid {
        let id = item.id;
        self.items.push_front(item);
        while self.items.len() > self.capacity {
            if let Some(evicted) = self.items.pop_back() {
                log::debug!("gallery full, evicting {}", evicted.file_name);
            }
        }
        id
    }

    pub fn get(&self, id: Uuid) -> Option<&GalleryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn remove(&mut self, id: Uuid) -> Option<GalleryItem> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        self.items.remove(pos)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &GalleryItem> {
        self.items.iter()
    }

    /// Start editing an item. The session works on its own copy.
    pub fn open_session(&self, id: Uuid, settings: &EditorSettings) -> Option<EditorSession> {
        let item = self.get(id)?;
        Some(EditorSession::from_buffers(
            &item.file_name,
            item.pixels.clone(),
            item.source.clone(),
            settings.clone(),
        ))
    }

    /// Replace an item with the result of a closed session. The stored
    /// source becomes the session's reference, which was cropped, flipped
    /// and rotated along with the pixels. Returns `false` for an unknown id.
    pub fn store_edit(&mut self, id: Uuid, edit: CommittedImage) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return false;
        };
        let CommittedImage { pixels, reference } = edit;
        item.source = if reference.dimensions() == pixels.dimensions() {
            reference
        } else {
            log::warn!("{}: stored reference has wrong size, using edit", item.file_name);
            Arc::new(pixels.clone())
        };
        item.pixels = pixels;
        true
    }

    /// `<stem>-no-bg.png` for the item's original file name.
    pub fn export_name(&self, id: Uuid) -> Option<String> {
        self.get(id).map(|item| io::output_file_name(&item.file_name))
    }
}
