// ============================================================================
// FILTER CHAIN — filter stack, presets, blur, and the pure chain function
// ============================================================================

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::canvas::{CHANNELS, PixelBuffer};
use crate::ops::adjustments::{self, ColorMatrix};
use crate::ops::transform;

/// Non-destructive filter parameters.
///
/// Ranges: brightness, contrast, saturation in `[0, 200]` percent; hue in
/// `[-180, 180]` degrees; blur in `[0, 10]` px; sepia, grayscale, invert,
/// opacity in `[0, 100]` percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterStack {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub hue: f32,
    pub blur: f32,
    pub sepia: f32,
    pub grayscale: f32,
    pub invert: f32,
    pub opacity: f32,
}

impl Default for FilterStack {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
            blur: 0.0,
            sepia: 0.0,
            grayscale: 0.0,
            invert: 0.0,
            opacity: 100.0,
        }
    }
}

impl FilterStack {
    /// Copy with every parameter clamped to its range. NaN becomes identity.
    pub fn clamped(&self) -> Self {
        let d = FilterStack::default();
        let c = |v: f32, lo: f32, hi: f32, id: f32| if v.is_nan() { id } else { v.clamp(lo, hi) };
        Self {
            brightness: c(self.brightness, 0.0, 200.0, d.brightness),
            contrast: c(self.contrast, 0.0, 200.0, d.contrast),
            saturation: c(self.saturation, 0.0, 200.0, d.saturation),
            hue: c(self.hue, -180.0, 180.0, d.hue),
            blur: c(self.blur, 0.0, 10.0, d.blur),
            sepia: c(self.sepia, 0.0, 100.0, d.sepia),
            grayscale: c(self.grayscale, 0.0, 100.0, d.grayscale),
            invert: c(self.invert, 0.0, 100.0, d.invert),
            opacity: c(self.opacity, 0.0, 100.0, d.opacity),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == FilterStack::default()
    }
}

/// Named parameter bundles. Applying one replaces the whole stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterPreset {
    None,
    Vivid,
    Vintage,
    Noir,
    Warm,
    Cool,
    Fade,
    Dramatic,
}

impl FilterPreset {
    pub fn all() -> &'static [FilterPreset] {
        &[
            FilterPreset::None,
            FilterPreset::Vivid,
            FilterPreset::Vintage,
            FilterPreset::Noir,
            FilterPreset::Warm,
            FilterPreset::Cool,
            FilterPreset::Fade,
            FilterPreset::Dramatic,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterPreset::None => "none",
            FilterPreset::Vivid => "vivid",
            FilterPreset::Vintage => "vintage",
            FilterPreset::Noir => "noir",
            FilterPreset::Warm => "warm",
            FilterPreset::Cool => "cool",
            FilterPreset::Fade => "fade",
            FilterPreset::Dramatic => "dramatic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::all().iter().copied().find(|p| p.name() == name)
    }

    pub fn stack(&self) -> FilterStack {
        let base = FilterStack::default();
        match self {
            FilterPreset::None => base,
            FilterPreset::Vivid => FilterStack {
                contrast: 110.0,
                saturation: 140.0,
                ..base
            },
            FilterPreset::Vintage => FilterStack {
                brightness: 105.0,
                contrast: 90.0,
                saturation: 80.0,
                sepia: 45.0,
                ..base
            },
            FilterPreset::Noir => FilterStack {
                contrast: 130.0,
                grayscale: 100.0,
                ..base
            },
            FilterPreset::Warm => FilterStack {
                saturation: 115.0,
                hue: -10.0,
                sepia: 15.0,
                ..base
            },
            FilterPreset::Cool => FilterStack {
                saturation: 90.0,
                hue: 15.0,
                ..base
            },
            FilterPreset::Fade => FilterStack {
                brightness: 110.0,
                contrast: 80.0,
                saturation: 70.0,
                ..base
            },
            FilterPreset::Dramatic => FilterStack {
                brightness: 95.0,
                contrast: 150.0,
                saturation: 120.0,
                ..base
            },
        }
    }
}

// ============================================================================
// GAUSSIAN BLUR (separable, f32, premultiplied)
// ============================================================================

fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (sigma * 3.0).ceil() as usize;
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let mut kernel = vec![0.0f32; len];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        let v = (-x * x / s2).exp();
        *k = v;
        sum += v;
    }
    let inv = 1.0 / sum;
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Blur an interleaved straight-alpha f32 RGBA buffer in place.
///
/// Colour is premultiplied for the passes so transparent pixels do not bleed
/// their (meaningless) RGB into the cut-out edge, then un-premultiplied.
pub fn gaussian_blur(data: &mut [f32], w: usize, h: usize, sigma: f32) {
    if w == 0 || h == 0 || sigma <= 0.0 {
        return;
    }
    let kernel = build_gaussian_kernel(sigma);
    let radius = kernel.len() / 2;
    let row_len = w * 4;

    data.par_chunks_mut(4).for_each(|px| {
        let a = px[3] / 255.0;
        px[0] *= a;
        px[1] *= a;
        px[2] *= a;
    });

    // --- Horizontal pass ---
    let mut buf_h = vec![0.0f32; data.len()];
    buf_h.par_chunks_mut(row_len).enumerate().for_each(|(y, row_out)| {
        let row_in = &data[y * row_len..(y + 1) * row_len];
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize).clamp(0, w as isize - 1)
                    as usize;
                for c in 0..4 {
                    acc[c] += row_in[sx * 4 + c] * kv;
                }
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass, written back into `data` ---
    data.par_chunks_mut(row_len).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize).clamp(0, h as isize - 1)
                    as usize;
                let idx = sy * row_len + x * 4;
                for c in 0..4 {
                    acc[c] += buf_h[idx + c] * kv;
                }
            }
            let a = acc[3];
            if a > 1e-3 {
                let k = 255.0 / a;
                acc[0] = (acc[0] * k).clamp(0.0, 255.0);
                acc[1] = (acc[1] * k).clamp(0.0, 255.0);
                acc[2] = (acc[2] * k).clamp(0.0, 255.0);
            } else {
                acc = [0.0; 4];
            }
            row_out[x * 4..x * 4 + 4].copy_from_slice(&acc);
        }
    });
}

// ============================================================================
// CHAIN
// ============================================================================

/// Pure chain: `(original, stack, rotation) -> display`.
///
/// Fixed order: brightness → contrast → saturation → hue-rotate → blur →
/// sepia → grayscale → invert → opacity, then the composite-time rotation
/// (degrees, clockwise, around the centre). Always starts from `original`;
/// identity parameters and zero rotation return an exact copy.
pub fn apply_filter_chain(original: &PixelBuffer, stack: &FilterStack, rotation: f32) -> PixelBuffer {
    let stack = stack.clamped();
    let rotation = transform::normalize_degrees(rotation);
    let filtered = if stack.is_identity() {
        original.clone()
    } else {
        run_stages(original, &stack)
    };
    if rotation.abs() < 1e-3 {
        filtered
    } else {
        transform::rotate_arbitrary(&filtered, rotation)
    }
}

fn run_stages(original: &PixelBuffer, s: &FilterStack) -> PixelBuffer {
    let (w, h) = original.dimensions();
    let row_len = w as usize * CHANNELS;
    let mut data: Vec<f32> = original.as_raw().par_iter().map(|&b| b as f32).collect();

    let saturate = ColorMatrix::saturate(s.saturation);
    let hue = ColorMatrix::hue_rotate(s.hue);
    adjustments::apply_pixel_transform(&mut data, row_len, |p| {
        adjustments::brightness(p, s.brightness);
        adjustments::contrast(p, s.contrast);
        saturate.apply(p);
        hue.apply(p);
    });

    if s.blur > 0.0 {
        gaussian_blur(&mut data, w as usize, h as usize, s.blur);
    }

    let sepia = ColorMatrix::sepia(s.sepia);
    let gray = ColorMatrix::grayscale(s.grayscale);
    adjustments::apply_pixel_transform(&mut data, row_len, |p| {
        sepia.apply(p);
        gray.apply(p);
        adjustments::invert(p, s.invert);
        adjustments::opacity(p, s.opacity);
    });

    let bytes: Vec<u8> = data.par_iter().map(|&v| v.round().clamp(0.0, 255.0) as u8).collect();
    // Same dimensions as `original`, so the length always matches.
    PixelBuffer::from_raw(w, h, bytes).unwrap_or_else(|_| original.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelBuffer {
        let mut buf = PixelBuffer::new(16, 12);
        for y in 0..12 {
            for x in 0..16 {
                let a = if x < 3 { 0 } else { 255 };
                buf.put_pixel(x, y, [(x * 15) as u8, (y * 20) as u8, 90, a]);
            }
        }
        buf
    }

    #[test]
    fn identity_chain_is_exact_copy() {
        let orig = sample();
        assert_eq!(apply_filter_chain(&orig, &FilterStack::default(), 0.0), orig);
        assert_eq!(apply_filter_chain(&orig, &FilterStack::default(), 360.0), orig);
    }

    #[test]
    fn chain_is_deterministic_and_never_cumulative() {
        let orig = sample();
        let f = FilterStack {
            brightness: 150.0,
            hue: 40.0,
            blur: 2.0,
            sepia: 30.0,
            ..FilterStack::default()
        };
        let first = apply_filter_chain(&orig, &f, 12.0);
        let reset = apply_filter_chain(&orig, &FilterStack::default(), 0.0);
        let again = apply_filter_chain(&orig, &f, 12.0);
        assert_eq!(reset, orig);
        assert_eq!(first, again);
    }

    #[test]
    fn clamped_limits_ranges() {
        let s = FilterStack {
            brightness: 500.0,
            hue: -400.0,
            blur: f32::NAN,
            opacity: -3.0,
            ..FilterStack::default()
        }
        .clamped();
        assert_eq!(s.brightness, 200.0);
        assert_eq!(s.hue, -180.0);
        assert_eq!(s.blur, 0.0);
        assert_eq!(s.opacity, 0.0);
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let orig = PixelBuffer::new_filled(2, 2, [10, 20, 30, 200]);
        let out = apply_filter_chain(
            &orig,
            &FilterStack { opacity: 50.0, ..FilterStack::default() },
            0.0,
        );
        assert_eq!(out.get_pixel(1, 1), [10, 20, 30, 100]);
    }

    #[test]
    fn blur_keeps_uniform_colour_and_transparent_rgb_out() {
        let mut buf = PixelBuffer::new_filled(9, 9, [50, 100, 150, 255]);
        for y in 0..9 {
            buf.put_pixel(0, y, [255, 0, 0, 0]);
        }
        let out = apply_filter_chain(&buf, &FilterStack { blur: 2.0, ..FilterStack::default() }, 0.0);
        let p = out.get_pixel(4, 4);
        assert_eq!(&p[..3], &[50, 100, 150]);
        // The transparent red column must not tint its neighbour.
        let edge = out.get_pixel(1, 4);
        assert!(edge[0] <= 51, "{edge:?}");
        assert!(edge[3] < 255);
    }

    #[test]
    fn presets_round_trip_by_name() {
        for p in FilterPreset::all() {
            assert_eq!(FilterPreset::from_name(p.name()), Some(*p));
        }
        assert_eq!(FilterPreset::from_name(" Noir "), Some(FilterPreset::Noir));
        assert!(FilterPreset::None.stack().is_identity());
        assert_eq!(FilterPreset::Noir.stack().grayscale, 100.0);
    }
}
