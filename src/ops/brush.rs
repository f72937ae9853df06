// ============================================================================
// BRUSH STAMPS — hard eraser and restore brush
// ============================================================================

use crate::canvas::PixelBuffer;

pub const MIN_BRUSH_SIZE: u32 = 5;
pub const MAX_BRUSH_SIZE: u32 = 100;
pub const DEFAULT_BRUSH_SIZE: u32 = 20;

/// Alpha below which the restore brush considers a pixel erased.
const RESTORE_THRESHOLD: u8 = 128;

/// Inclusive pixel bounds of a disk clipped to the buffer, or `None` when the
/// disk misses the buffer entirely.
fn disk_bounds(buf: &PixelBuffer, cx: f32, cy: f32, radius: f32) -> Option<(u32, u32, u32, u32)> {
    let (w, h) = buf.dimensions();
    if radius <= 0.0 {
        return None;
    }
    let x0 = (cx - radius).floor();
    let y0 = (cy - radius).floor();
    let x1 = (cx + radius).ceil();
    let y1 = (cy + radius).ceil();
    if x1 < 0.0 || y1 < 0.0 || x0 >= w as f32 || y0 >= h as f32 {
        return None;
    }
    Some((
        x0.max(0.0) as u32,
        y0.max(0.0) as u32,
        (x1 as u32).min(w - 1),
        (y1 as u32).min(h - 1),
    ))
}

#[inline]
fn center_distance(px: u32, py: u32, cx: f32, cy: f32) -> f32 {
    let dx = px as f32 + 0.5 - cx;
    let dy = py as f32 + 0.5 - cy;
    (dx * dx + dy * dy).sqrt()
}

/// Eraser stamp: every pixel whose centre lies inside the disk of diameter
/// `size` around `(cx, cy)` becomes fully transparent.
pub fn erase_disk(buf: &mut PixelBuffer, cx: f32, cy: f32, size: u32) -> usize {
    let radius = size as f32 / 2.0;
    let Some((x0, y0, x1, y1)) = disk_bounds(buf, cx, cy, radius) else {
        return 0;
    };
    let mut changed = 0;
    for py in y0..=y1 {
        for px in x0..=x1 {
            if center_distance(px, py, cx, cy) <= radius && buf.alpha(px, py) != 0 {
                buf.set_alpha(px, py, 0);
                changed += 1;
            }
        }
    }
    changed
}

/// Restore stamp: brings back erased pixels from `reference` (the source
/// image as decoded, before the mask was applied).
///
/// Inside the disk of radius `size`, a pixel with alpha below 128 gains
/// `255 - d * 255 / r` alpha, capped at the reference alpha; RGB is copied
/// from the reference. Repeated passes build up coverage.
pub fn restore_disk(
    buf: &mut PixelBuffer,
    reference: &PixelBuffer,
    cx: f32,
    cy: f32,
    size: u32,
) -> usize {
    if buf.dimensions() != reference.dimensions() {
        log::warn!(
            "restore skipped: reference {:?} does not match buffer {:?}",
            reference.dimensions(),
            buf.dimensions()
        );
        return 0;
    }
    let radius = size as f32;
    let Some((x0, y0, x1, y1)) = disk_bounds(buf, cx, cy, radius) else {
        return 0;
    };
    let mut changed = 0;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let d = center_distance(px, py, cx, cy);
            if d > radius {
                continue;
            }
            let cur = buf.get_pixel(px, py);
            if cur[3] >= RESTORE_THRESHOLD {
                continue;
            }
            let src = reference.get_pixel(px, py);
            let gain = 255.0 - d * 255.0 / radius;
            let a = (cur[3] as f32 + gain).round().min(255.0).min(src[3] as f32) as u8;
            if a > cur[3] {
                buf.put_pixel(px, py, [src[0], src[1], src[2], a]);
                changed += 1;
            }
        }
    }
    changed
}
