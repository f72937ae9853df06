// ============================================================================
// SEGMENTATION — background-removal collaborator and mask compositing
// ============================================================================

use std::future::Future;
use std::path::{Path, PathBuf};

use image::{GrayImage, imageops};

use crate::canvas::{CHANNELS, PixelBuffer};
use crate::error::SegmentationError;

/// Single-channel alpha matte, one byte per pixel, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct AlphaMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for AlphaMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AlphaMask({}x{})", self.width, self.height)
    }
}

impl AlphaMask {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, SegmentationError> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize {
            return Err(SegmentationError::Failed(format!(
                "mask data of {} bytes does not describe a {}x{} matte",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Uniform mask.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    pub fn from_gray_image(img: GrayImage) -> Result<Self, SegmentationError> {
        let (w, h) = img.dimensions();
        Self::new(w, h, img.into_raw())
    }

    /// The alpha channel of `buffer`.
    pub fn from_alpha(buffer: &PixelBuffer) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            data: buffer.alpha_channel().collect(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear resample to `width × height`.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        if (width, height) == self.dimensions() {
            return self.clone();
        }
        let Some(gray) = GrayImage::from_raw(self.width, self.height, self.data.clone()) else {
            return Self::filled(width, height, 0);
        };
        let out = imageops::resize(&gray, width, height, imageops::FilterType::Triangle);
        Self {
            width,
            height,
            data: out.into_raw(),
        }
    }
}

/// The background remover: `segment(image) -> alpha mask` of the same size.
///
/// One call per source image. Calls for different images are independent.
pub trait Segmenter {
    fn segment(
        &self,
        image: &PixelBuffer,
    ) -> impl Future<Output = Result<AlphaMask, SegmentationError>> + Send;

    /// Short name for logs.
    fn name(&self) -> &str {
        "segmenter"
    }
}

/// Write `mask` into the alpha channel of `buffer`. RGB is left untouched.
pub fn composite_mask(buffer: &mut PixelBuffer, mask: &AlphaMask) -> Result<(), SegmentationError> {
    let (w, h) = buffer.dimensions();
    if mask.dimensions() != (w, h) {
        return Err(SegmentationError::MaskSizeMismatch {
            expected_w: w,
            expected_h: h,
            actual_w: mask.width,
            actual_h: mask.height,
        });
    }
    for (px, &a) in buffer.as_raw_mut().chunks_exact_mut(CHANNELS).zip(mask.data.iter()) {
        px[3] = a;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
//  Shipped collaborators
// ---------------------------------------------------------------------------

/// Uses a precomputed matte stored as an image file (any format `image`
/// decodes; converted to 8-bit grey). A matte of a different size is
/// resampled to the source dimensions.
#[derive(Clone, Debug)]
pub struct MaskFileSegmenter {
    path: PathBuf,
}

impl MaskFileSegmenter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Segmenter for MaskFileSegmenter {
    async fn segment(&self, image: &PixelBuffer) -> Result<AlphaMask, SegmentationError> {
        let bytes = std::fs::read(&self.path)?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            SegmentationError::Failed(format!("cannot decode mask {}: {}", self.path.display(), e))
        })?;
        let mask = AlphaMask::from_gray_image(decoded.to_luma8())?;
        let (w, h) = image.dimensions();
        if mask.dimensions() != (w, h) {
            log::info!(
                "resizing mask {:?} to {}x{}",
                mask.dimensions(),
                w,
                h
            );
        }
        Ok(mask.resized(w, h))
    }

    fn name(&self) -> &str {
        "mask-file"
    }
}

/// Keeps the image's own alpha channel, for sources that are already cut out.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAlphaSegmenter;

impl Segmenter for KeepAlphaSegmenter {
    async fn segment(&self, image: &PixelBuffer) -> Result<AlphaMask, SegmentationError> {
        Ok(AlphaMask::from_alpha(image))
    }

    fn name(&self) -> &str {
        "keep-alpha"
    }
}

/// Adapts a synchronous function.
pub struct FnSegmenter<F>(pub F);

impl<F> Segmenter for FnSegmenter<F>
where
    F: Fn(&PixelBuffer) -> Result<AlphaMask, SegmentationError> + Sync,
{
    async fn segment(&self, image: &PixelBuffer) -> Result<AlphaMask, SegmentationError> {
        (self.0)(image)
    }

    fn name(&self) -> &str {
        "function"
    }
}
