use crate::canvas::{CHANNELS, PixelBuffer};

/// Default colour tolerance for the wand and the smart brush.
pub const DEFAULT_TOLERANCE: f32 = 10.0;

/// Euclidean RGB distance. Alpha is excluded from the metric:
/// it is the channel these tools modify.
#[inline]
pub fn color_distance(a: [u8; 4], b: [u8; 4]) -> f32 {
    let dr = a[0] as f32 - b[0] as f32;
    let dg = a[1] as f32 - b[1] as f32;
    let db = a[2] as f32 - b[2] as f32;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Magic Wand: contiguous select-and-erase.
///
/// 4-connected flood from `(x, y)`. A pixel joins the region when it is not
/// already transparent and its RGB distance to the seed is `<= tolerance`;
/// joined pixels get alpha 0. Uses an explicit stack and a visited table
/// sized to the raster, so very large regions cannot blow the call stack.
///
/// Returns the number of erased pixels. Seeding outside the buffer or on a
/// transparent pixel is a no-op.
pub fn magic_wand_erase(buf: &mut PixelBuffer, x: u32, y: u32, tolerance: f32) -> usize {
    let (w, h) = buf.dimensions();
    if x >= w || y >= h {
        return 0;
    }
    let seed = buf.get_pixel(x, y);
    if seed[3] == 0 {
        return 0;
    }

    let w = w as usize;
    let h = h as usize;
    let data = buf.as_raw_mut();
    let mut visited = vec![false; w * h];
    let mut stack: Vec<usize> = Vec::with_capacity(1024);
    let mut erased = 0usize;

    let start = y as usize * w + x as usize;
    visited[start] = true;
    stack.push(start);

    while let Some(idx) = stack.pop() {
        let off = idx * CHANNELS;
        let px = [data[off], data[off + 1], data[off + 2], data[off + 3]];
        if px[3] == 0 || color_distance(px, seed) > tolerance {
            continue;
        }
        data[off + 3] = 0;
        erased += 1;

        let px_x = idx % w;
        let px_y = idx / w;
        let mut visit = |n: usize| {
            if !visited[n] {
                visited[n] = true;
                stack.push(n);
            }
        };
        if px_x > 0 {
            visit(idx - 1);
        }
        if px_x + 1 < w {
            visit(idx + 1);
        }
        if px_y > 0 {
            visit(idx - w);
        }
        if px_y + 1 < h {
            visit(idx + w);
        }
    }
    erased
}

/// Smart Brush: soft, colour-gated erase inside a disk.
///
/// The reference colour is the pixel under the disk centre. Every pixel
/// within `radius` whose RGB distance to the reference is `<= tolerance`
/// keeps `d / radius` of its alpha, where `d` is its distance from the centre:
/// full erase at the centre, untouched at the rim.
///
/// Called once per pointer event; history is recorded by the caller at
/// gesture end. Returns the number of pixels whose alpha changed.
pub fn smart_brush_erase(
    buf: &mut PixelBuffer,
    cx: f32,
    cy: f32,
    radius: f32,
    tolerance: f32,
) -> usize {
    let (w, h) = buf.dimensions();
    if radius <= 0.0 || cx < 0.0 || cy < 0.0 || cx >= w as f32 || cy >= h as f32 {
        return 0;
    }
    let reference = buf.get_pixel(cx.floor() as u32, cy.floor() as u32);
    if reference[3] == 0 {
        return 0;
    }

    let x0 = (cx - radius).floor().max(0.0) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let x1 = ((cx + radius).ceil() as u32).min(w - 1);
    let y1 = ((cy + radius).ceil() as u32).min(h - 1);

    let mut changed = 0usize;
    for py in y0..=y1 {
        for px in x0..=x1 {
            let d = ((px as f32 + 0.5 - cx).powi(2) + (py as f32 + 0.5 - cy).powi(2)).sqrt();
            if d > radius {
                continue;
            }
            let p = buf.get_pixel(px, py);
            if p[3] == 0 || color_distance(p, reference) > tolerance {
                continue;
            }
            let keep = d / radius;
            let a = (p[3] as f32 * keep).round() as u8;
            if a != p[3] {
                buf.set_alpha(px, py, a);
                changed += 1;
            }
        }
    }
    changed
}
