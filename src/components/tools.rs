use crate::canvas::PixelBuffer;
use crate::components::crop::{AspectRatio, CropController};
use crate::ops::brush::{self, DEFAULT_BRUSH_SIZE, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE};
use crate::ops::selection::{self, DEFAULT_TOLERANCE};
use crate::viewport::{Point, to_pixel};

/// Editing tools. Each variant has exactly one handler in [`handle_event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Crop,
    Eraser,
    Restore,
    MagicWand,
    SmartBrush,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Crop,
            Tool::Eraser,
            Tool::Restore,
            Tool::MagicWand,
            Tool::SmartBrush,
        ]
    }

    /// Name used for history entries and the status line.
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Crop => "Crop",
            Tool::Eraser => "Eraser",
            Tool::Restore => "Restore Brush",
            Tool::MagicWand => "Magic Wand",
            Tool::SmartBrush => "Smart Brush",
        }
    }

    /// One-line usage hint.
    pub fn hint(&self) -> &'static str {
        match self {
            Tool::Crop => "Drag to select the area to keep, Enter to apply, Esc to cancel",
            Tool::Eraser => "Drag to erase",
            Tool::Restore => "Drag to bring back erased areas",
            Tool::MagicWand => "Click a colour to remove its connected region",
            Tool::SmartBrush => "Drag over a colour to fade it out",
        }
    }

    /// Tools that paint along a pointer stroke.
    pub fn is_stroke(&self) -> bool {
        matches!(self, Tool::Eraser | Tool::Restore | Tool::SmartBrush)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolProperties {
    /// Brush diameter in image pixels, within `[MIN_BRUSH_SIZE, MAX_BRUSH_SIZE]`.
    pub brush_size: u32,
    /// RGB distance threshold for the wand and the smart brush.
    pub tolerance: f32,
    pub aspect_ratio: AspectRatio,
}

impl Default for ToolProperties {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            aspect_ratio: AspectRatio::Free,
        }
    }
}

impl ToolProperties {
    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = if tolerance.is_nan() { DEFAULT_TOLERANCE } else { tolerance.clamp(0.0, 100.0) };
    }
}

/// Pointer gesture in image space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

impl GestureEvent {
    pub fn point(&self) -> Point {
        match *self {
            GestureEvent::Down(p) | GestureEvent::Move(p) | GestureEvent::Up(p) => p,
        }
    }

    pub fn map(self, f: impl FnOnce(Point) -> Point) -> Self {
        match self {
            GestureEvent::Down(p) => GestureEvent::Down(f(p)),
            GestureEvent::Move(p) => GestureEvent::Move(f(p)),
            GestureEvent::Up(p) => GestureEvent::Up(f(p)),
        }
    }
}

/// What an event did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Nothing changed.
    Idle,
    /// Pixels or the crop selection changed; nothing to record yet.
    Changed,
    /// A gesture finished with committed pixel changes; record one history
    /// entry with this description.
    Completed(&'static str),
}

/// Per-stroke bookkeeping for the painting tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrokeState {
    active: bool,
    dirty: bool,
}

impl StrokeState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn begin(&mut self) {
        self.active = true;
        self.dirty = false;
    }

    /// End the stroke. Returns whether it changed any pixel.
    pub fn finish(&mut self) -> bool {
        let dirty = self.active && self.dirty;
        self.active = false;
        self.dirty = false;
        dirty
    }
}

/// Everything a tool handler may touch.
pub struct ToolContext<'a> {
    pub pixels: &'a mut PixelBuffer,
    pub reference: &'a PixelBuffer,
    pub crop: &'a mut CropController,
    pub props: &'a ToolProperties,
    pub stroke: &'a mut StrokeState,
}

/// Route one event to the active tool's handler.
pub fn handle_event(tool: Tool, ctx: &mut ToolContext<'_>, event: GestureEvent) -> ToolOutcome {
    match tool {
        Tool::Crop => handle_crop(ctx, event),
        Tool::Eraser => handle_stroke(tool, ctx, event, |c, p| {
            brush::erase_disk(c.pixels, p.x, p.y, c.props.brush_size)
        }),
        Tool::Restore => handle_stroke(tool, ctx, event, |c, p| {
            brush::restore_disk(c.pixels, c.reference, p.x, p.y, c.props.brush_size)
        }),
        Tool::SmartBrush => handle_stroke(tool, ctx, event, |c, p| {
            let radius = c.props.brush_size as f32 / 2.0;
            selection::smart_brush_erase(c.pixels, p.x, p.y, radius, c.props.tolerance)
        }),
        Tool::MagicWand => handle_magic_wand(ctx, event),
    }
}

fn handle_crop(ctx: &mut ToolContext<'_>, event: GestureEvent) -> ToolOutcome {
    let changed = match event {
        GestureEvent::Down(p) => ctx.crop.pointer_down(p),
        GestureEvent::Move(p) => ctx.crop.pointer_move(p),
        GestureEvent::Up(p) => {
            let changed = ctx.crop.pointer_up(p);
            // The phase always changes on release; the overlay follows it.
            changed || ctx.crop.is_active()
        }
    };
    if changed { ToolOutcome::Changed } else { ToolOutcome::Idle }
}

/// Shared stroke driver: stamp on down and on every move while held, one
/// history entry on release if anything changed.
fn handle_stroke<F>(tool: Tool, ctx: &mut ToolContext<'_>, event: GestureEvent, stamp: F) -> ToolOutcome
where
    F: Fn(&mut ToolContext<'_>, Point) -> usize,
{
    match event {
        GestureEvent::Down(p) => {
            ctx.stroke.begin();
            let n = stamp(ctx, p);
            ctx.stroke.dirty |= n > 0;
            if n > 0 { ToolOutcome::Changed } else { ToolOutcome::Idle }
        }
        GestureEvent::Move(p) => {
            if !ctx.stroke.is_active() {
                return ToolOutcome::Idle;
            }
            let n = stamp(ctx, p);
            ctx.stroke.dirty |= n > 0;
            if n > 0 { ToolOutcome::Changed } else { ToolOutcome::Idle }
        }
        GestureEvent::Up(_) => {
            if ctx.stroke.finish() {
                ToolOutcome::Completed(tool.label())
            } else {
                ToolOutcome::Idle
            }
        }
    }
}

fn handle_magic_wand(ctx: &mut ToolContext<'_>, event: GestureEvent) -> ToolOutcome {
    let GestureEvent::Down(p) = event else {
        return ToolOutcome::Idle;
    };
    let (w, h) = ctx.pixels.dimensions();
    let Some((x, y)) = to_pixel(p, w, h) else {
        return ToolOutcome::Idle;
    };
    let erased = selection::magic_wand_erase(ctx.pixels, x, y, ctx.props.tolerance);
    log::debug!("magic wand at ({}, {}) erased {} px", x, y, erased);
    if erased > 0 {
        ToolOutcome::Completed(Tool::MagicWand.label())
    } else {
        ToolOutcome::Idle
    }
}
