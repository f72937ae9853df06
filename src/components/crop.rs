// ============================================================================
// CROP CONTROLLER — interactive crop rectangle with handles and aspect ratio
// ============================================================================
//
// States: Idle → Drafting → Adjusting(Settled | Moving | Resizing) → (commit
// or cancel) → Idle. All coordinates are image space.
// ============================================================================

use crate::viewport::Point;

pub const DEFAULT_MIN_CROP: f32 = 10.0;
pub const DEFAULT_HANDLE_TOLERANCE: f32 = 10.0;
pub const DEFAULT_CROP_SIZE: f32 = 100.0;

/// Pointer travel (image units) before a draft follows the pointer instead of
/// keeping its default size.
const DRAFT_THRESHOLD: f32 = 1.0;
/// Smallest edge any adjusted rectangle may shrink to.
const MIN_EDGE: f32 = 1.0;

// ---------------------------------------------------------------------------
//  Aspect ratio
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum AspectRatio {
    #[default]
    Free,
    /// width / height
    Fixed(f32),
}

impl AspectRatio {
    pub fn from_dimensions(w: f32, h: f32) -> Self {
        if w > 0.0 && h > 0.0 && (w / h).is_finite() {
            AspectRatio::Fixed(w / h)
        } else {
            AspectRatio::Free
        }
    }

    /// Parse `free`, `W:H`, `W/H` or a plain ratio such as `1.5`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("free") {
            return Some(AspectRatio::Free);
        }
        if let Some((w, h)) = s.split_once([':', '/']) {
            let w: f32 = w.trim().parse().ok()?;
            let h: f32 = h.trim().parse().ok()?;
            return match AspectRatio::from_dimensions(w, h) {
                AspectRatio::Free => None,
                fixed => Some(fixed),
            };
        }
        let r: f32 = s.parse().ok()?;
        (r > 0.0 && r.is_finite()).then_some(AspectRatio::Fixed(r))
    }

    pub fn value(&self) -> Option<f32> {
        match *self {
            AspectRatio::Free => None,
            AspectRatio::Fixed(r) => Some(r),
        }
    }

    /// Ratios offered by the crop tool.
    pub fn presets() -> [(&'static str, AspectRatio); 6] {
        [
            ("Free", AspectRatio::Free),
            ("1:1", AspectRatio::Fixed(1.0)),
            ("4:3", AspectRatio::Fixed(4.0 / 3.0)),
            ("3:2", AspectRatio::Fixed(3.0 / 2.0)),
            ("16:9", AspectRatio::Fixed(16.0 / 9.0)),
            ("9:16", AspectRatio::Fixed(9.0 / 16.0)),
        ]
    }
}

// ---------------------------------------------------------------------------
//  Rectangle and handles
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn ratio(&self) -> f32 {
        self.width / self.height
    }

    pub fn handle_position(&self, handle: CropHandle) -> Point {
        let (hx, hy) = handle.signs();
        let px = match hx {
            -1 => self.x,
            1 => self.right(),
            _ => self.x + self.width * 0.5,
        };
        let py = match hy {
            -1 => self.y,
            1 => self.bottom(),
            _ => self.y + self.height * 0.5,
        };
        Point::new(px, py)
    }

    /// Integer pixel bounds `(x, y, w, h)`, rounded and clipped to the image.
    pub fn to_pixels(&self, img_w: u32, img_h: u32) -> (u32, u32, u32, u32) {
        let x0 = self.x.round().clamp(0.0, img_w as f32) as u32;
        let y0 = self.y.round().clamp(0.0, img_h as f32) as u32;
        let x1 = self.right().round().clamp(0.0, img_w as f32) as u32;
        let y1 = self.bottom().round().clamp(0.0, img_h as f32) as u32;
        (x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// Four corners plus four edge midpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CropHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl CropHandle {
    pub const ALL: [CropHandle; 8] = [
        CropHandle::TopLeft,
        CropHandle::Top,
        CropHandle::TopRight,
        CropHandle::Right,
        CropHandle::BottomRight,
        CropHandle::Bottom,
        CropHandle::BottomLeft,
        CropHandle::Left,
    ];

    /// Which edges the handle drags: -1 left/top, 1 right/bottom, 0 neither.
    pub fn signs(&self) -> (i8, i8) {
        match self {
            CropHandle::TopLeft => (-1, -1),
            CropHandle::Top => (0, -1),
            CropHandle::TopRight => (1, -1),
            CropHandle::Right => (1, 0),
            CropHandle::BottomRight => (1, 1),
            CropHandle::Bottom => (0, 1),
            CropHandle::BottomLeft => (-1, 1),
            CropHandle::Left => (-1, 0),
        }
    }

    pub fn is_corner(&self) -> bool {
        let (hx, hy) = self.signs();
        hx != 0 && hy != 0
    }
}

// ---------------------------------------------------------------------------
//  State machine
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    Settled,
    Moving { grab: Point, start: CropRect },
    Resizing { handle: CropHandle, grab: Point, start: CropRect },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CropPhase {
    Idle,
    Drafting { anchor: Point },
    Adjusting(Adjustment),
}

/// Pixel region accepted by [`CropController::commit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

pub struct CropController {
    phase: CropPhase,
    selection: Option<CropRect>,
    ratio: AspectRatio,
    image_w: f32,
    image_h: f32,
    pub default_size: f32,
    pub min_size: f32,
    pub handle_tolerance: f32,
}

impl CropController {
    pub fn new(image_w: u32, image_h: u32) -> Self {
        Self {
            phase: CropPhase::Idle,
            selection: None,
            ratio: AspectRatio::Free,
            image_w: image_w as f32,
            image_h: image_h as f32,
            default_size: DEFAULT_CROP_SIZE,
            min_size: DEFAULT_MIN_CROP,
            handle_tolerance: DEFAULT_HANDLE_TOLERANCE,
        }
    }

    pub fn phase(&self) -> CropPhase {
        self.phase
    }

    pub fn selection(&self) -> Option<CropRect> {
        self.selection
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn is_active(&self) -> bool {
        self.selection.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(
            self.phase,
            CropPhase::Drafting { .. }
                | CropPhase::Adjusting(Adjustment::Moving { .. })
                | CropPhase::Adjusting(Adjustment::Resizing { .. })
        )
    }

    /// Handle within tolerance of `p`, nearest first. On small selections the
    /// tolerance shrinks to a quarter of the shorter side so the interior
    /// still grabs for a move.
    pub fn hit_test(&self, p: Point) -> Option<CropHandle> {
        let rect = self.selection?;
        let tolerance = self.handle_tolerance.min(rect.width.min(rect.height) / 4.0);
        CropHandle::ALL
            .iter()
            .map(|&h| (h, rect.handle_position(h).distance(p)))
            .filter(|&(_, d)| d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(h, _)| h)
    }

    /// Returns `true` when the selection changed.
    pub fn pointer_down(&mut self, p: Point) -> bool {
        if let (Some(rect), CropPhase::Adjusting(_)) = (self.selection, self.phase) {
            if let Some(handle) = self.hit_test(p) {
                self.phase = CropPhase::Adjusting(Adjustment::Resizing { handle, grab: p, start: rect });
                return false;
            }
            if rect.contains(p) {
                self.phase = CropPhase::Adjusting(Adjustment::Moving { grab: p, start: rect });
                return false;
            }
        }
        // New draft anchored at the (clamped) click point.
        let anchor = Point::new(p.x.clamp(0.0, self.image_w), p.y.clamp(0.0, self.image_h));
        self.selection = Some(self.default_rect(anchor));
        self.phase = CropPhase::Drafting { anchor };
        true
    }

    pub fn pointer_move(&mut self, p: Point) -> bool {
        let next = match self.phase {
            CropPhase::Idle | CropPhase::Adjusting(Adjustment::Settled) => return false,
            CropPhase::Drafting { anchor } => {
                if anchor.distance(p) < DRAFT_THRESHOLD {
                    return false;
                }
                self.draft_rect(anchor, p)
            }
            CropPhase::Adjusting(Adjustment::Moving { grab, start }) => {
                self.moved_rect(start, p.x - grab.x, p.y - grab.y)
            }
            CropPhase::Adjusting(Adjustment::Resizing { handle, grab, start }) => {
                self.resized_rect(start, handle, p.x - grab.x, p.y - grab.y)
            }
        };
        if self.selection == Some(next) {
            return false;
        }
        self.selection = Some(next);
        true
    }

    pub fn pointer_up(&mut self, p: Point) -> bool {
        let changed = self.pointer_move(p);
        if !matches!(self.phase, CropPhase::Idle) {
            self.phase = CropPhase::Adjusting(Adjustment::Settled);
        }
        changed
    }

    /// Place a selection programmatically. The rectangle is clipped to the
    /// image and reshaped to the active ratio.
    pub fn set_selection(&mut self, rect: CropRect) {
        let x = rect.x.clamp(0.0, (self.image_w - MIN_EDGE).max(0.0));
        let y = rect.y.clamp(0.0, (self.image_h - MIN_EDGE).max(0.0));
        let w = rect.width.min(self.image_w - x).max(MIN_EDGE.min(self.image_w - x));
        let h = rect.height.min(self.image_h - y).max(MIN_EDGE.min(self.image_h - y));
        let mut r = CropRect::new(x, y, w, h);
        if let Some(ratio) = self.ratio.value() {
            r = self.reshape_centered(r, ratio);
        }
        self.selection = Some(r);
        self.phase = CropPhase::Adjusting(Adjustment::Settled);
    }

    /// Change the constraint. An existing selection is reshaped around its
    /// centre to match.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.ratio = ratio;
        if let (Some(rect), Some(r)) = (self.selection, ratio.value()) {
            self.selection = Some(self.reshape_centered(rect, r));
        }
    }

    /// Validate and consume the selection.
    ///
    /// Rectangles smaller than `min_size` on either side are rejected: the
    /// call returns `None` and the selection is left in place.
    pub fn commit(&mut self) -> Option<CropRegion> {
        let rect = self.selection?;
        let (x, y, width, height) = rect.to_pixels(self.image_w as u32, self.image_h as u32);
        if (width as f32) < self.min_size || (height as f32) < self.min_size {
            log::debug!(
                "crop {}x{} rejected (minimum {})",
                width,
                height,
                self.min_size
            );
            return None;
        }
        self.selection = None;
        self.phase = CropPhase::Idle;
        Some(CropRegion { x, y, width, height })
    }

    /// Discard the selection and any drag in progress.
    pub fn cancel(&mut self) {
        self.selection = None;
        self.phase = CropPhase::Idle;
    }

    /// The edit buffer changed size; any selection is stale.
    pub fn image_resized(&mut self, image_w: u32, image_h: u32) {
        self.image_w = image_w as f32;
        self.image_h = image_h as f32;
        self.cancel();
    }

    // ---- geometry ----------------------------------------------------------

    fn default_rect(&self, anchor: Point) -> CropRect {
        let (mut w, mut h) = match self.ratio.value() {
            Some(r) => (self.default_size, self.default_size / r),
            None => (self.default_size, self.default_size),
        };
        let fit = (self.image_w / w).min(self.image_h / h).min(1.0);
        w *= fit;
        h *= fit;
        let x = anchor.x.min(self.image_w - w).max(0.0);
        let y = anchor.y.min(self.image_h - h).max(0.0);
        CropRect::new(x, y, w, h)
    }

    fn draft_rect(&self, anchor: Point, p: Point) -> CropRect {
        let px = p.x.clamp(0.0, self.image_w);
        let py = p.y.clamp(0.0, self.image_h);
        let (sx, avail_w) = draft_side(anchor.x, px, self.image_w);
        let (sy, avail_h) = draft_side(anchor.y, py, self.image_h);
        let mut w = (px - anchor.x).abs().max(MIN_EDGE).min(avail_w);
        let mut h = (py - anchor.y).abs().max(MIN_EDGE).min(avail_h);

        if let Some(r) = self.ratio.value() {
            let (cw, ch) = constrain(w, h, r, w, h);
            let (fw, fh) = fit_within(cw, ch, avail_w, avail_h);
            w = fw;
            h = fh;
        }
        if w <= 0.0 || h <= 0.0 {
            return self.selection.unwrap_or_else(|| self.default_rect(anchor));
        }
        let x = if sx > 0.0 { anchor.x } else { anchor.x - w };
        let y = if sy > 0.0 { anchor.y } else { anchor.y - h };
        CropRect::new(x, y, w, h)
    }

    fn moved_rect(&self, start: CropRect, dx: f32, dy: f32) -> CropRect {
        let x = (start.x + dx).clamp(0.0, (self.image_w - start.width).max(0.0));
        let y = (start.y + dy).clamp(0.0, (self.image_h - start.height).max(0.0));
        CropRect::new(x, y, start.width, start.height)
    }

    fn resized_rect(&self, start: CropRect, handle: CropHandle, dx: f32, dy: f32) -> CropRect {
        let (hx, hy) = handle.signs();
        // Edge opposite the dragged one stays put; an undragged axis pivots on
        // its centre when the ratio forces it to change.
        let anchor_x = match hx {
            -1 => start.right(),
            1 => start.x,
            _ => start.x + start.width * 0.5,
        };
        let anchor_y = match hy {
            -1 => start.bottom(),
            1 => start.y,
            _ => start.y + start.height * 0.5,
        };
        let avail_w = match hx {
            -1 => anchor_x,
            1 => self.image_w - anchor_x,
            _ => 2.0 * anchor_x.min(self.image_w - anchor_x),
        };
        let avail_h = match hy {
            -1 => anchor_y,
            1 => self.image_h - anchor_y,
            _ => 2.0 * anchor_y.min(self.image_h - anchor_y),
        };

        let raw_w = (start.width + hx as f32 * dx).max(MIN_EDGE);
        let raw_h = (start.height + hy as f32 * dy).max(MIN_EDGE);

        let (w, h) = match self.ratio.value() {
            Some(r) => {
                let (cw, ch) = match (hx, hy) {
                    (0, _) => (raw_h * r, raw_h),
                    (_, 0) => (raw_w, raw_w / r),
                    _ => constrain(raw_w, raw_h, r, start.width, start.height),
                };
                fit_within(cw, ch, avail_w, avail_h)
            }
            None => {
                let w = if hx == 0 { start.width } else { raw_w.min(avail_w) };
                let h = if hy == 0 { start.height } else { raw_h.min(avail_h) };
                (w, h)
            }
        };
        if w <= 0.0 || h <= 0.0 {
            return start;
        }

        let free = self.ratio.value().is_none();
        let x = match hx {
            -1 => anchor_x - w,
            1 => anchor_x,
            _ if free => start.x,
            _ => anchor_x - w * 0.5,
        };
        let y = match hy {
            -1 => anchor_y - h,
            1 => anchor_y,
            _ if free => start.y,
            _ => anchor_y - h * 0.5,
        };
        CropRect::new(x, y, w, h)
    }

    fn reshape_centered(&self, rect: CropRect, ratio: f32) -> CropRect {
        let c = rect.center();
        let (w, h) = if rect.ratio() >= ratio {
            (rect.height * ratio, rect.height)
        } else {
            (rect.width, rect.width / ratio)
        };
        let (w, h) = fit_within(w, h, self.image_w, self.image_h);
        let x = (c.x - w * 0.5).clamp(0.0, (self.image_w - w).max(0.0));
        let y = (c.y - h * 0.5).clamp(0.0, (self.image_h - h).max(0.0));
        CropRect::new(x, y, w, h)
    }
}

/// Derive one side from the other so `w / h == ratio`. The side that moved
/// more (relative to `base_w × base_h`) drives.
fn constrain(w: f32, h: f32, ratio: f32, base_w: f32, base_h: f32) -> (f32, f32) {
    let rel_w = (w - base_w).abs() / base_w.max(MIN_EDGE);
    let rel_h = (h - base_h).abs() / base_h.max(MIN_EDGE);
    let width_dominant = if rel_w == rel_h { w / ratio >= h } else { rel_w > rel_h };
    if width_dominant {
        (w, w / ratio)
    } else {
        (h * ratio, h)
    }
}

/// Direction (`1.0` or `-1.0`) and room for a draft along one axis. The draft
/// follows the pointer unless the anchor sits against that edge, in which
/// case it grows the other way.
fn draft_side(anchor: f32, pointer: f32, extent: f32) -> (f32, f32) {
    let (ahead, behind) = if pointer >= anchor {
        (extent - anchor, anchor)
    } else {
        (anchor, extent - anchor)
    };
    let sign = if pointer >= anchor { 1.0 } else { -1.0 };
    if ahead < MIN_EDGE && behind > ahead {
        (-sign, behind)
    } else {
        (sign, ahead)
    }
}

/// Uniformly scale `(w, h)` down so it fits `avail_w × avail_h`.
fn fit_within(w: f32, h: f32, avail_w: f32, avail_h: f32) -> (f32, f32) {
    let k = (avail_w / w).min(avail_h / h).min(1.0).max(0.0);
    (w * k, h * k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(ctrl: &mut CropController, x: f32, y: f32, w: f32, h: f32) {
        ctrl.set_selection(CropRect::new(x, y, w, h));
    }

    #[test]
    fn click_creates_default_rect_at_anchor() {
        let mut c = CropController::new(500, 400);
        assert!(c.pointer_down(Point::new(50.0, 60.0)));
        assert!(matches!(c.phase(), CropPhase::Drafting { .. }));
        assert_eq!(c.selection(), Some(CropRect::new(50.0, 60.0, 100.0, 100.0)));
        c.pointer_up(Point::new(50.0, 60.0));
        assert_eq!(c.phase(), CropPhase::Adjusting(Adjustment::Settled));
        assert_eq!(c.selection().map(|r| r.width), Some(100.0));
    }

    #[test]
    fn default_rect_near_edge_stays_inside() {
        let mut c = CropController::new(120, 80);
        c.pointer_down(Point::new(110.0, 75.0));
        let r = c.selection().unwrap();
        assert!(r.right() <= 120.0 && r.bottom() <= 80.0);
        assert!(r.x >= 0.0 && r.y >= 0.0);
    }

    #[test]
    fn drafting_follows_pointer_in_any_direction() {
        let mut c = CropController::new(300, 300);
        c.pointer_down(Point::new(100.0, 100.0));
        c.pointer_move(Point::new(40.0, 180.0));
        assert_eq!(c.selection(), Some(CropRect::new(40.0, 100.0, 60.0, 80.0)));
    }

    #[test]
    fn move_is_clamped_to_image() {
        let mut c = CropController::new(200, 200);
        settled(&mut c, 50.0, 50.0, 40.0, 40.0);
        c.pointer_down(Point::new(70.0, 70.0));
        c.pointer_move(Point::new(500.0, 70.0));
        c.pointer_up(Point::new(500.0, 70.0));
        assert_eq!(c.selection(), Some(CropRect::new(160.0, 50.0, 40.0, 40.0)));
    }

    #[test]
    fn fixed_ratio_draft_from_far_edge_grows_inward() {
        let mut c = CropController::new(200, 100);
        c.set_aspect_ratio(AspectRatio::Fixed(16.0 / 9.0));
        c.pointer_down(Point::new(200.0, 50.0));
        c.pointer_move(Point::new(260.0, 80.0));
        c.pointer_up(Point::new(260.0, 80.0));
        let r = c.selection().unwrap();
        assert!(r.width >= 1.0 && r.height >= 1.0, "{r:?}");
        assert!((r.width / r.height - 16.0 / 9.0).abs() < 1e-3, "{r:?}");
        assert!(r.x >= 0.0 && r.y >= 0.0, "{r:?}");
        assert!(r.right() <= 200.001 && r.bottom() <= 100.001, "{r:?}");
        assert!((r.right() - 200.0).abs() < 1e-3, "{r:?}");
    }

    #[test]
    fn free_draft_from_bottom_edge_stays_inside() {
        let mut c = CropController::new(100, 100);
        c.pointer_down(Point::new(40.0, 100.0));
        c.pointer_up(Point::new(70.0, 140.0));
        let r = c.selection().unwrap();
        assert!(r.height >= 1.0, "{r:?}");
        assert!(r.bottom() <= 100.001, "{r:?}");
        assert_eq!(r.width, 30.0);
    }

    #[test]
    fn small_selection_moves_from_its_centre() {
        let mut c = CropController::new(200, 200);
        settled(&mut c, 50.0, 50.0, 16.0, 16.0);
        c.pointer_down(Point::new(58.0, 58.0));
        assert!(matches!(c.phase(), CropPhase::Adjusting(Adjustment::Moving { .. })));
        c.pointer_up(Point::new(78.0, 68.0));
        assert_eq!(c.selection(), Some(CropRect::new(70.0, 60.0, 16.0, 16.0)));
        assert_eq!(c.hit_test(Point::new(71.0, 61.0)), Some(CropHandle::TopLeft));
    }

    #[test]
    fn handles_hit_within_tolerance() {
        let mut c = CropController::new(200, 200);
        settled(&mut c, 50.0, 50.0, 100.0, 60.0);
        assert_eq!(c.hit_test(Point::new(48.0, 53.0)), Some(CropHandle::TopLeft));
        assert_eq!(c.hit_test(Point::new(100.0, 111.0)), Some(CropHandle::Bottom));
        assert_eq!(c.hit_test(Point::new(100.0, 80.0)), None);
    }

    #[test]
    fn free_edge_resize_only_changes_one_side() {
        let mut c = CropController::new(300, 300);
        settled(&mut c, 50.0, 50.0, 100.0, 60.0);
        c.pointer_down(Point::new(150.0, 80.0));
        c.pointer_up(Point::new(180.0, 95.0));
        assert_eq!(c.selection(), Some(CropRect::new(50.0, 50.0, 130.0, 60.0)));
    }

    #[test]
    fn fixed_ratio_holds_for_every_handle_and_direction() {
        let ratio = 16.0 / 9.0;
        let deltas = [(-200.0, 5.0), (30.0, -12.0), (7.0, 90.0), (-3.0, -400.0), (250.0, 250.0)];
        for handle in CropHandle::ALL {
            for &(dx, dy) in &deltas {
                let mut c = CropController::new(640, 480);
                c.set_aspect_ratio(AspectRatio::Fixed(ratio));
                settled(&mut c, 200.0, 150.0, 160.0, 90.0);
                let grab = c.selection().unwrap().handle_position(handle);
                c.pointer_down(grab);
                c.pointer_up(Point::new(grab.x + dx, grab.y + dy));
                let r = c.selection().unwrap();
                assert!(
                    (r.ratio() - ratio).abs() < 1e-3,
                    "{handle:?} ({dx}, {dy}) -> {r:?}"
                );
                assert!(r.x >= -1e-3 && r.y >= -1e-3, "{handle:?} {r:?}");
                assert!(r.right() <= 640.001 && r.bottom() <= 480.001, "{handle:?} {r:?}");
            }
        }
    }

    #[test]
    fn commit_below_minimum_is_rejected() {
        let mut c = CropController::new(100, 100);
        settled(&mut c, 10.0, 10.0, 5.0, 5.0);
        assert_eq!(c.commit(), None);
        assert!(c.is_active());
        settled(&mut c, 10.0, 20.0, 30.0, 40.0);
        assert_eq!(
            c.commit(),
            Some(CropRegion { x: 10, y: 20, width: 30, height: 40 })
        );
        assert!(!c.is_active());
        assert_eq!(c.phase(), CropPhase::Idle);
    }

    #[test]
    fn cancel_discards_draft() {
        let mut c = CropController::new(100, 100);
        c.pointer_down(Point::new(5.0, 5.0));
        c.pointer_move(Point::new(60.0, 60.0));
        c.cancel();
        assert_eq!(c.selection(), None);
        assert_eq!(c.phase(), CropPhase::Idle);
    }

    #[test]
    fn ratio_parsing() {
        assert_eq!(AspectRatio::parse("free"), Some(AspectRatio::Free));
        assert_eq!(AspectRatio::parse("16:9"), Some(AspectRatio::Fixed(16.0 / 9.0)));
        assert_eq!(AspectRatio::parse("4/3"), Some(AspectRatio::Fixed(4.0 / 3.0)));
        assert_eq!(AspectRatio::parse("1.5"), Some(AspectRatio::Fixed(1.5)));
        assert_eq!(AspectRatio::parse("0:9"), None);
        assert_eq!(AspectRatio::parse("wide"), None);
    }
}
