// ============================================================================
// TRANSFORM OPERATIONS — flip, rotate, crop for the edit buffer
// ============================================================================

use rayon::prelude::*;

use crate::canvas::{CHANNELS, PixelBuffer};

/// Quarter-turn rotations that change the committed pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuarterTurn {
    Cw90,
    Ccw90,
    Half,
}

impl QuarterTurn {
    /// Parse a signed angle in degrees (`90`, `-90`, `270`, `180`, ...).
    pub fn from_degrees(deg: i32) -> Option<Self> {
        match deg.rem_euclid(360) {
            90 => Some(QuarterTurn::Cw90),
            270 => Some(QuarterTurn::Ccw90),
            180 => Some(QuarterTurn::Half),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuarterTurn::Cw90 => "Rotate 90° CW",
            QuarterTurn::Ccw90 => "Rotate 90° CCW",
            QuarterTurn::Half => "Rotate 180°",
        }
    }

    pub fn swaps_dimensions(&self) -> bool {
        !matches!(self, QuarterTurn::Half)
    }
}

// ---------------------------------------------------------------------------
//  Committed transforms (mutate the buffer in place)
// ---------------------------------------------------------------------------

/// Mirror left↔right.
pub fn flip_horizontal(buf: &mut PixelBuffer) {
    let row_bytes = buf.width() as usize * CHANNELS;
    buf.as_raw_mut().par_chunks_mut(row_bytes).for_each(|row| {
        let n = row.len() / CHANNELS;
        for i in 0..n / 2 {
            let j = n - 1 - i;
            for c in 0..CHANNELS {
                row.swap(i * CHANNELS + c, j * CHANNELS + c);
            }
        }
    });
}

/// Mirror top↔bottom.
pub fn flip_vertical(buf: &mut PixelBuffer) {
    let row_bytes = buf.width() as usize * CHANNELS;
    let h = buf.height() as usize;
    let data = buf.as_raw_mut();
    for y in 0..h / 2 {
        let (top, bottom) = data.split_at_mut((h - 1 - y) * row_bytes);
        top[y * row_bytes..(y + 1) * row_bytes].swap_with_slice(&mut bottom[..row_bytes]);
    }
}

/// Apply a quarter turn. 90° turns swap width and height; the content goes
/// through an intermediate buffer sized to the new dimensions.
pub fn rotate(buf: &mut PixelBuffer, turn: QuarterTurn) {
    match turn {
        QuarterTurn::Cw90 => rotate_90_cw(buf),
        QuarterTurn::Ccw90 => rotate_90_ccw(buf),
        QuarterTurn::Half => rotate_180(buf),
    }
}

/// Rotate 90° clockwise (swaps W↔H).
pub fn rotate_90_cw(buf: &mut PixelBuffer) {
    let (w, h) = buf.dimensions();
    let rotated = remap(buf, h, w, |dx, dy| (dy, h - 1 - dx));
    buf.copy_from(&rotated);
}

/// Rotate 90° counter-clockwise (swaps W↔H).
pub fn rotate_90_ccw(buf: &mut PixelBuffer) {
    let (w, h) = buf.dimensions();
    let rotated = remap(buf, h, w, |dx, dy| (w - 1 - dy, dx));
    buf.copy_from(&rotated);
}

/// Rotate 180°. Equivalent to reversing pixel order.
pub fn rotate_180(buf: &mut PixelBuffer) {
    let data = buf.as_raw_mut();
    let n = data.len() / CHANNELS;
    for i in 0..n / 2 {
        let j = n - 1 - i;
        for c in 0..CHANNELS {
            data.swap(i * CHANNELS + c, j * CHANNELS + c);
        }
    }
}

/// Build a `new_w × new_h` buffer where each destination pixel `(dx, dy)`
/// copies the source pixel returned by `src_of(dx, dy)`.
fn remap<F>(src: &PixelBuffer, new_w: u32, new_h: u32, src_of: F) -> PixelBuffer
where
    F: Fn(u32, u32) -> (u32, u32) + Sync,
{
    let mut dst = PixelBuffer::new(new_w, new_h);
    let row_bytes = new_w as usize * CHANNELS;
    let src_w = src.width() as usize;
    let src_raw = src.as_raw();
    dst.as_raw_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(dy, row)| {
            for dx in 0..new_w as usize {
                let (sx, sy) = src_of(dx as u32, dy as u32);
                let s = (sy as usize * src_w + sx as usize) * CHANNELS;
                row[dx * CHANNELS..dx * CHANNELS + CHANNELS]
                    .copy_from_slice(&src_raw[s..s + CHANNELS]);
            }
        });
    dst
}

/// Crop to the `w × h` rectangle at `(x, y)`: copy the region out, reallocate
/// the buffer to the new size, write the region back at the origin.
///
/// Returns `false` (and leaves the buffer alone) if the rectangle is empty
/// or does not fit.
pub fn crop(buf: &mut PixelBuffer, x: u32, y: u32, w: u32, h: u32) -> bool {
    let (bw, bh) = buf.dimensions();
    if w == 0 || h == 0 || x as u64 + w as u64 > bw as u64 || y as u64 + h as u64 > bh as u64 {
        return false;
    }
    let region = buf.get_region(x, y, w, h);
    buf.resize(w, h);
    buf.put_region(&region, 0, 0);
    true
}

// ---------------------------------------------------------------------------
//  Composite-time rotation (never committed)
// ---------------------------------------------------------------------------

/// Rotate `src` by `degrees` (clockwise on screen) around its centre into a
/// buffer of the same size. Bilinear sampling; areas that fall outside the
/// source are transparent.
pub fn rotate_arbitrary(src: &PixelBuffer, degrees: f32) -> PixelBuffer {
    let (w, h) = src.dimensions();
    let mut dst = PixelBuffer::new(w, h);
    let cx = w as f32 * 0.5;
    let cy = h as f32 * 0.5;
    let (sin, cos) = degrees.to_radians().sin_cos();

    let src_w = w as i32;
    let src_h = h as i32;
    let src_stride = w as usize * CHANNELS;
    let src_raw = src.as_raw();
    let row_bytes = w as usize * CHANNELS;

    dst.as_raw_mut()
        .par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(dy, row)| {
            let v = dy as f32 + 0.5 - cy;
            for dx in 0..w as usize {
                let u = dx as f32 + 0.5 - cx;
                // Inverse rotation back into source pixel-centre space.
                let src_x = cos * u + sin * v + cx - 0.5;
                let src_y = -sin * u + cos * v + cy - 0.5;

                let x0 = src_x.floor() as i32;
                let y0 = src_y.floor() as i32;
                if x0 < -1 || y0 < -1 || x0 >= src_w || y0 >= src_h {
                    continue;
                }
                let fx = src_x - x0 as f32;
                let fy = src_y - y0 as f32;

                let sample = |sx: i32, sy: i32| -> [f32; 4] {
                    if sx < 0 || sy < 0 || sx >= src_w || sy >= src_h {
                        [0.0; 4]
                    } else {
                        let idx = sy as usize * src_stride + sx as usize * CHANNELS;
                        [
                            src_raw[idx] as f32,
                            src_raw[idx + 1] as f32,
                            src_raw[idx + 2] as f32,
                            src_raw[idx + 3] as f32,
                        ]
                    }
                };

                let tl = sample(x0, y0);
                let tr = sample(x0 + 1, y0);
                let bl = sample(x0, y0 + 1);
                let br = sample(x0 + 1, y0 + 1);

                let px = dx * CHANNELS;
                for c in 0..CHANNELS {
                    let top = tl[c] + (tr[c] - tl[c]) * fx;
                    let bot = bl[c] + (br[c] - bl[c]) * fx;
                    row[px + c] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
                }
            }
        });
    dst
}

/// Normalise an angle to `(-180, 180]`.
pub fn normalize_degrees(deg: f32) -> f32 {
    let mut d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d -= 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(w: u32, h: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        for y in 0..h {
            for x in 0..w {
                buf.put_pixel(x, y, [x as u8, y as u8, 7, 255]);
            }
        }
        buf
    }

    #[test]
    fn flips_mirror_and_are_involutions() {
        let orig = numbered(5, 3);
        let mut buf = orig.clone();
        flip_horizontal(&mut buf);
        assert_eq!(buf.get_pixel(0, 1), orig.get_pixel(4, 1));
        flip_horizontal(&mut buf);
        assert_eq!(buf, orig);

        flip_vertical(&mut buf);
        assert_eq!(buf.get_pixel(2, 0), orig.get_pixel(2, 2));
        flip_vertical(&mut buf);
        assert_eq!(buf, orig);
    }

    #[test]
    fn rotate_cw_moves_corners() {
        let orig = numbered(4, 2);
        let mut buf = orig.clone();
        rotate_90_cw(&mut buf);
        assert_eq!(buf.dimensions(), (2, 4));
        // Top-left goes to top-right.
        assert_eq!(buf.get_pixel(1, 0), orig.get_pixel(0, 0));
        // Bottom-left goes to top-left.
        assert_eq!(buf.get_pixel(0, 0), orig.get_pixel(0, 1));
    }

    #[test]
    fn rotate_ccw_undoes_cw() {
        let orig = numbered(7, 3);
        let mut buf = orig.clone();
        rotate_90_cw(&mut buf);
        rotate_90_ccw(&mut buf);
        assert_eq!(buf, orig);
    }

    #[test]
    fn four_quarter_turns_round_trip() {
        let orig = numbered(6, 4);
        let mut buf = orig.clone();
        for _ in 0..4 {
            rotate(&mut buf, QuarterTurn::Cw90);
        }
        assert_eq!(buf, orig);
    }

    #[test]
    fn half_turn_equals_two_quarters() {
        let orig = numbered(5, 4);
        let mut a = orig.clone();
        rotate_180(&mut a);
        let mut b = orig.clone();
        rotate_90_cw(&mut b);
        rotate_90_cw(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn crop_keeps_region_at_origin() {
        let orig = numbered(10, 8);
        let mut buf = orig.clone();
        assert!(crop(&mut buf, 3, 2, 4, 5));
        assert_eq!(buf.dimensions(), (4, 5));
        assert_eq!(buf.get_pixel(0, 0), orig.get_pixel(3, 2));
        assert_eq!(buf.get_pixel(3, 4), orig.get_pixel(6, 6));
        assert!(!crop(&mut buf, 2, 2, 4, 4));
        assert_eq!(buf.dimensions(), (4, 5));
    }

    #[test]
    fn arbitrary_rotation_keeps_canvas_and_center() {
        let mut src = PixelBuffer::new_filled(9, 9, [0, 0, 0, 255]);
        src.put_pixel(4, 4, [255, 0, 0, 255]);
        let out = rotate_arbitrary(&src, 90.0);
        assert_eq!(out.dimensions(), (9, 9));
        assert_eq!(out.get_pixel(4, 4)[0], 255);
        let out = rotate_arbitrary(&src, 45.0);
        // Corners fall outside the rotated source.
        assert_eq!(out.alpha(0, 0), 0);
    }

    #[test]
    fn quarter_turn_parsing() {
        assert_eq!(QuarterTurn::from_degrees(-90), Some(QuarterTurn::Ccw90));
        assert_eq!(QuarterTurn::from_degrees(450), Some(QuarterTurn::Cw90));
        assert_eq!(QuarterTurn::from_degrees(45), None);
        assert_eq!(normalize_degrees(270.0), -90.0);
    }
}
