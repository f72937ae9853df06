// ============================================================================
// ADJUSTMENT STAGES — per-pixel colour functions of the filter chain
// ============================================================================
//
// Every stage works on straight (non-premultiplied) f32 RGBA in 0..=255 and
// clamps its result, so stages compose the same way compositing filters do.
// Percent parameters use 100 as identity unless noted.
// ============================================================================

use rayon::prelude::*;

/// One pixel in the working f32 buffer.
pub type Rgbaf = [f32; 4];

/// Apply `transform` to every pixel of an interleaved f32 RGBA buffer,
/// parallel over rows of `row_len` floats.
pub fn apply_pixel_transform<F>(data: &mut [f32], row_len: usize, transform: F)
where
    F: Fn(&mut Rgbaf) + Sync,
{
    if row_len == 0 {
        return;
    }
    data.par_chunks_mut(row_len).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let mut p = [px[0], px[1], px[2], px[3]];
            transform(&mut p);
            px.copy_from_slice(&p);
        }
    });
}

#[inline]
fn clamp_rgb(px: &mut Rgbaf) {
    for c in px.iter_mut().take(3) {
        *c = c.clamp(0.0, 255.0);
    }
}

/// Linear brightness: `c * pct / 100`.
#[inline]
pub fn brightness(px: &mut Rgbaf, pct: f32) {
    let k = pct / 100.0;
    px[0] *= k;
    px[1] *= k;
    px[2] *= k;
    clamp_rgb(px);
}

/// Contrast around mid-grey: `(c - 127.5) * pct / 100 + 127.5`.
#[inline]
pub fn contrast(px: &mut Rgbaf, pct: f32) {
    let k = pct / 100.0;
    for c in px.iter_mut().take(3) {
        *c = (*c - 127.5) * k + 127.5;
    }
    clamp_rgb(px);
}

/// Invert toward `255 - c`; 0 is identity, 100 is a full negative.
#[inline]
pub fn invert(px: &mut Rgbaf, pct: f32) {
    let k = (pct / 100.0).clamp(0.0, 1.0);
    for c in px.iter_mut().take(3) {
        *c = *c * (1.0 - k) + (255.0 - *c) * k;
    }
}

/// Scale alpha: `a * pct / 100`.
#[inline]
pub fn opacity(px: &mut Rgbaf, pct: f32) {
    px[3] = (px[3] * (pct / 100.0).clamp(0.0, 1.0)).clamp(0.0, 255.0);
}

// ---------------------------------------------------------------------------
//  3×3 colour matrices (saturate, hue-rotate, sepia, grayscale)
// ---------------------------------------------------------------------------

/// Linear RGB transform applied as `out = M · rgb`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorMatrix(pub [[f32; 3]; 3]);

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix =
        ColorMatrix([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Saturation; 100 is identity, 0 is fully desaturated, 200 doubles it.
    pub fn saturate(pct: f32) -> Self {
        let s = pct / 100.0;
        ColorMatrix([
            [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
        ])
    }

    /// Hue rotation by `deg` degrees, luminance preserving.
    pub fn hue_rotate(deg: f32) -> Self {
        let (sin, cos) = deg.to_radians().sin_cos();
        ColorMatrix([
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ])
    }

    /// Sepia tone; 0 is identity, 100 is full sepia.
    pub fn sepia(pct: f32) -> Self {
        let inv = 1.0 - (pct / 100.0).clamp(0.0, 1.0);
        ColorMatrix([
            [0.393 + 0.607 * inv, 0.769 - 0.769 * inv, 0.189 - 0.189 * inv],
            [0.349 - 0.349 * inv, 0.686 + 0.314 * inv, 0.168 - 0.168 * inv],
            [0.272 - 0.272 * inv, 0.534 - 0.534 * inv, 0.131 + 0.869 * inv],
        ])
    }

    /// BT.709 greyscale; 0 is identity, 100 is fully grey.
    pub fn grayscale(pct: f32) -> Self {
        let inv = 1.0 - (pct / 100.0).clamp(0.0, 1.0);
        ColorMatrix([
            [0.2126 + 0.7874 * inv, 0.7152 - 0.7152 * inv, 0.0722 - 0.0722 * inv],
            [0.2126 - 0.2126 * inv, 0.7152 + 0.2848 * inv, 0.0722 - 0.0722 * inv],
            [0.2126 - 0.2126 * inv, 0.7152 - 0.7152 * inv, 0.0722 + 0.9278 * inv],
        ])
    }

    #[inline]
    pub fn apply(&self, px: &mut Rgbaf) {
        let [r, g, b, _] = *px;
        let m = &self.0;
        px[0] = m[0][0] * r + m[0][1] * g + m[0][2] * b;
        px[1] = m[1][0] * r + m[1][1] * g + m[1][2] * b;
        px[2] = m[2][0] * r + m[2][1] * g + m[2][2] * b;
        clamp_rgb(px);
    }
}
