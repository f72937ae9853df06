// ============================================================================
// PIXEL BUFFER — flat RGBA8 raster owned by the editing session
// ============================================================================

use image::{Rgba, RgbaImage};

use crate::error::{EditorError, Result};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Sanity cap on raster size (256 megapixels).
const MAX_PIXELS: u64 = 256_000_000;

/// A `width × height` RGBA raster, row-major, 4 bytes per pixel.
///
/// `data.len() == width * height * 4` holds at all times. Every resize
/// reallocates and re-establishes the invariant; content is never scaled.
///
/// Coordinates handed to the accessors must already be clamped to
/// `[0, width) × [0, height)`. Out-of-range access panics.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(
            width > 0 && height > 0,
            "PixelBuffer::new: dimensions must be non-zero, got {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * CHANNELS],
        }
    }

    /// Create a buffer filled with `color`.
    pub fn new_filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut buf = Self::new(width, height);
        buf.fill(color);
        buf
    }

    /// Wrap raw RGBA bytes. Rejects zero dimensions and length mismatches.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(EditorError::Input(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Import from an `image` crate raster.
    pub fn from_rgba_image(src: &RgbaImage) -> Result<Self> {
        Self::from_raw(src.width(), src.height(), src.as_raw().clone())
    }

    /// Export to an `image` crate raster (a copy).
    pub fn to_rgba_image(&self) -> RgbaImage {
        // Length invariant guarantees `from_raw` succeeds.
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    // ---- accessors ----------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Heap bytes held by the pixel data.
    pub fn memory_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether signed coordinates fall inside the raster.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Flattened pixel index (`y * width + x`).
    #[inline]
    pub fn pixel_index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) out of bounds for {}x{} buffer",
            x,
            y,
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let off = self.pixel_index(x, y) * CHANNELS;
        [
            self.data[off],
            self.data[off + 1],
            self.data[off + 2],
            self.data[off + 3],
        ]
    }

    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, px: [u8; 4]) {
        let off = self.pixel_index(x, y) * CHANNELS;
        self.data[off..off + CHANNELS].copy_from_slice(&px);
    }

    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.data[self.pixel_index(x, y) * CHANNELS + 3]
    }

    #[inline]
    pub fn set_alpha(&mut self, x: u32, y: u32, a: u8) {
        let off = self.pixel_index(x, y) * CHANNELS + 3;
        self.data[off] = a;
    }

    /// Same as [`get_pixel`](Self::get_pixel) but returns an `image::Rgba`.
    pub fn rgba(&self, x: u32, y: u32) -> Rgba<u8> {
        Rgba(self.get_pixel(x, y))
    }

    // ---- region operations --------------------------------------------------

    /// Copy the `w × h` rectangle at `(x, y)` into a new buffer.
    pub fn get_region(&self, x: u32, y: u32, w: u32, h: u32) -> PixelBuffer {
        assert!(
            w > 0 && h > 0 && x as u64 + w as u64 <= self.width as u64
                && y as u64 + h as u64 <= self.height as u64,
            "region {}x{} at ({}, {}) outside {}x{} buffer",
            w,
            h,
            x,
            y,
            self.width,
            self.height
        );
        let mut out = PixelBuffer::new(w, h);
        let src_stride = self.width as usize * CHANNELS;
        let row_bytes = w as usize * CHANNELS;
        for row in 0..h as usize {
            let src_off = (y as usize + row) * src_stride + x as usize * CHANNELS;
            let dst_off = row * row_bytes;
            out.data[dst_off..dst_off + row_bytes]
                .copy_from_slice(&self.data[src_off..src_off + row_bytes]);
        }
        out
    }

    /// Write `src` with its top-left corner at `(x, y)`. The region must fit.
    pub fn put_region(&mut self, src: &PixelBuffer, x: u32, y: u32) {
        assert!(
            x as u64 + src.width as u64 <= self.width as u64
                && y as u64 + src.height as u64 <= self.height as u64,
            "region {}x{} at ({}, {}) outside {}x{} buffer",
            src.width,
            src.height,
            x,
            y,
            self.width,
            self.height
        );
        let dst_stride = self.width as usize * CHANNELS;
        let row_bytes = src.width as usize * CHANNELS;
        for row in 0..src.height as usize {
            let dst_off = (y as usize + row) * dst_stride + x as usize * CHANNELS;
            let src_off = row * row_bytes;
            self.data[dst_off..dst_off + row_bytes]
                .copy_from_slice(&src.data[src_off..src_off + row_bytes]);
        }
    }

    /// Reallocate to `new_w × new_h`, fully transparent. Existing content is
    /// discarded; callers copy what they need before resizing.
    pub fn resize(&mut self, new_w: u32, new_h: u32) {
        assert!(
            new_w > 0 && new_h > 0,
            "PixelBuffer::resize: dimensions must be non-zero, got {}x{}",
            new_w,
            new_h
        );
        self.width = new_w;
        self.height = new_h;
        self.data = vec![0; new_w as usize * new_h as usize * CHANNELS];
    }

    /// Replace this buffer's content (and dimensions) with `other`'s.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }

    pub fn fill(&mut self, color: [u8; 4]) {
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&color);
        }
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Iterate the alpha channel in pixel order.
    pub fn alpha_channel(&self) -> impl Iterator<Item = u8> + '_ {
        self.data.chunks_exact(CHANNELS).map(|px| px[3])
    }
}

/// Reject zero or oversized dimensions.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EditorError::Input(format!(
            "zero-sized image ({}x{})",
            width, height
        )));
    }
    if width as u64 * height as u64 > MAX_PIXELS {
        return Err(EditorError::Input(format!(
            "image {}x{} exceeds {} pixels",
            width, height, MAX_PIXELS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                buf.put_pixel(x, y, [x as u8, y as u8, (x + y) as u8, 255]);
            }
        }
        buf
    }

    #[test]
    fn new_buffer_is_transparent_and_sized() {
        let buf = PixelBuffer::new(3, 2);
        assert_eq!(buf.as_raw().len(), 3 * 2 * 4);
        assert!(buf.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn from_raw_rejects_bad_input() {
        assert!(PixelBuffer::from_raw(0, 4, Vec::new()).is_err());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 15]).is_err());
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn region_copy_preserves_pixels() {
        let buf = gradient(8, 6);
        let region = buf.get_region(2, 1, 4, 3);
        assert_eq!(region.dimensions(), (4, 3));
        assert_eq!(region.get_pixel(0, 0), buf.get_pixel(2, 1));
        assert_eq!(region.get_pixel(3, 2), buf.get_pixel(5, 3));

        let mut target = PixelBuffer::new(8, 6);
        target.put_region(&region, 2, 1);
        assert_eq!(target.get_pixel(5, 3), buf.get_pixel(5, 3));
        assert_eq!(target.get_pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn resize_reallocates_without_scaling() {
        let mut buf = gradient(4, 4);
        buf.resize(2, 5);
        assert_eq!(buf.dimensions(), (2, 5));
        assert_eq!(buf.as_raw().len(), 2 * 5 * 4);
        assert!(buf.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn out_of_bounds_access_panics() {
        let buf = PixelBuffer::new(2, 2);
        let _ = buf.get_pixel(2, 0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn oversized_region_panics() {
        let buf = PixelBuffer::new(4, 4);
        let _ = buf.get_region(2, 2, 3, 1);
    }
}
