// ============================================================================
// VIEWPORT — zoom / pan state and device → image coordinate mapping
// ============================================================================

/// A 2D point. Used for both device-space and image-space positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Screen rectangle occupied by the displayed image element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

pub const DEFAULT_ZOOM: f32 = 1.0;
pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Transient view state. Never persisted, never part of history.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub pan: Point,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            pan: Point::default(),
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: ZOOM_STEP,
        }
    }
}

impl Viewport {
    /// Viewport with custom zoom bounds (from settings). Bad bounds fall back
    /// to the defaults.
    pub fn with_limits(min_zoom: f32, max_zoom: f32, zoom_step: f32) -> Self {
        let mut vp = Self::default();
        if min_zoom > 0.0 && max_zoom >= min_zoom {
            vp.min_zoom = min_zoom;
            vp.max_zoom = max_zoom;
        }
        if zoom_step > 0.0 {
            vp.zoom_step = zoom_step;
        }
        vp.zoom = DEFAULT_ZOOM.clamp(vp.min_zoom, vp.max_zoom);
        vp
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.zoom_step);
    }

    /// Set zoom, clamped to the viewport bounds. Rounded to two decimals so
    /// repeated stepping does not accumulate float error.
    pub fn set_zoom(&mut self, zoom: f32) {
        let z = (zoom * 100.0).round() / 100.0;
        self.zoom = z.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn reset(&mut self) {
        self.zoom = DEFAULT_ZOOM.clamp(self.min_zoom, self.max_zoom);
        self.pan = Point::default();
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan.x += dx;
        self.pan.y += dy;
    }

    pub fn zoom_percent(&self) -> u32 {
        (self.zoom * 100.0).round() as u32
    }

    /// Map a device point into image space for a buffer of
    /// `buffer_w × buffer_h` pixels.
    pub fn to_image_space(
        &self,
        device: Point,
        bbox: &BoundingBox,
        buffer_w: u32,
        buffer_h: u32,
    ) -> Point {
        to_image_space(device, self, bbox, buffer_w, buffer_h)
    }
}

/// Device → image mapping.
///
/// `x = (device.x - bbox.left - pan.x) * buffer_w / (bbox.width * zoom)`,
/// symmetric for y. With zero pan this is exactly the unpanned formula. A
/// degenerate bounding box maps everything to the origin.
pub fn to_image_space(
    device: Point,
    viewport: &Viewport,
    bbox: &BoundingBox,
    buffer_w: u32,
    buffer_h: u32,
) -> Point {
    let sx = bbox.width * viewport.zoom;
    let sy = bbox.height * viewport.zoom;
    if sx <= 0.0 || sy <= 0.0 {
        return Point::default();
    }
    Point {
        x: (device.x - bbox.left - viewport.pan.x) * (buffer_w as f32 / sx),
        y: (device.y - bbox.top - viewport.pan.y) * (buffer_h as f32 / sy),
    }
}

/// Clamp an image-space point to a valid pixel coordinate, or `None` if the
/// point lies outside the raster.
pub fn to_pixel(p: Point, width: u32, height: u32) -> Option<(u32, u32)> {
    if p.x < 0.0 || p.y < 0.0 {
        return None;
    }
    let x = p.x.floor() as u64;
    let y = p.y.floor() as u64;
    if x >= width as u64 || y >= height as u64 {
        return None;
    }
    Some((x as u32, y as u32))
}
