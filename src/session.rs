// ============================================================================
// EDITOR SESSION — one open image: buffers, history, tools, filters
// ============================================================================
//
// Single owner of the edit buffer. Every mutation runs synchronously inside
// a call; the only asynchronous step is segmentation during `open`.
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::canvas::PixelBuffer;
use crate::compositor::FilterCompositor;
use crate::components::crop::{AspectRatio, CropController, CropRect};
use crate::components::history::{HistoryEntry, HistoryManager};
use crate::components::tools::{
    GestureEvent, StrokeState, Tool, ToolContext, ToolOutcome, ToolProperties, handle_event,
};
use crate::error::Result;
use crate::io;
use crate::ops::filters::{FilterPreset, FilterStack};
use crate::ops::transform::{self, QuarterTurn};
use crate::segmentation::{Segmenter, composite_mask};
use crate::settings::EditorSettings;
use crate::viewport::{BoundingBox, Viewport};

/// Shade drawn over the area a crop would remove.
const CROP_SHADE: [u8; 4] = [0, 0, 0, 128];
/// Crop rectangle outline.
const CROP_OUTLINE: [u8; 4] = [0, 255, 0, 255];
const CROP_OUTLINE_WIDTH: u32 = 2;

/// Open an editing session from encoded image bytes with default settings.
pub async fn open_session<S: Segmenter>(source: &[u8], segmenter: &S) -> Result<EditorSession> {
    EditorSession::open("image", source, segmenter, EditorSettings::default()).await
}

/// Last committed state of a closed session, with the restore reference
/// that lines up with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedImage {
    pub pixels: PixelBuffer,
    pub reference: Arc<PixelBuffer>,
}

pub struct EditorSession {
    id: Uuid,
    name: String,
    /// Committed + in-progress pixels.
    pixels: PixelBuffer,
    /// Decoded source before masking, aligned with `pixels`.
    reference: Arc<PixelBuffer>,
    /// Same size as `pixels`; crop shading is drawn here.
    overlay: PixelBuffer,
    history: HistoryManager,
    compositor: FilterCompositor,
    crop: CropController,
    viewport: Viewport,
    tool: Tool,
    props: ToolProperties,
    stroke: StrokeState,
    settings: EditorSettings,
}

impl EditorSession {
    /// Decode → segment → composite the mask into alpha.
    ///
    /// Fails with `Input` for bad image data and `Segmentation` when the
    /// collaborator fails; in both cases no session exists afterwards.
    pub async fn open<S: Segmenter>(
        name: &str,
        source: &[u8],
        segmenter: &S,
        settings: EditorSettings,
    ) -> Result<Self> {
        let decoded = io::decode_image(source)?;
        let mask = match segmenter.segment(&decoded).await {
            Ok(mask) => mask,
            Err(e) => {
                log::error!("{}: segmentation ({}) failed: {}", name, segmenter.name(), e);
                return Err(e.into());
            }
        };
        let mut pixels = decoded.clone();
        composite_mask(&mut pixels, &mask)?;
        Ok(Self::from_buffers(name, pixels, Arc::new(decoded), settings))
    }

    /// Start a session over an already composited buffer. `reference` must
    /// have the same dimensions as `pixels`; otherwise `pixels` itself is used.
    pub fn from_buffers(
        name: &str,
        pixels: PixelBuffer,
        reference: Arc<PixelBuffer>,
        settings: EditorSettings,
    ) -> Self {
        let settings = settings.sanitized();
        let reference = if reference.dimensions() == pixels.dimensions() {
            reference
        } else {
            log::warn!("{}: restore reference has wrong size, using edit buffer", name);
            Arc::new(pixels.clone())
        };
        let (w, h) = pixels.dimensions();

        let mut history = HistoryManager::new(settings.max_undo_steps, Some(settings.history_memory_bytes()));
        history.init(HistoryEntry::new("Open", pixels.clone(), reference.clone()));

        let mut crop = CropController::new(w, h);
        crop.default_size = settings.crop_default_size;
        crop.min_size = settings.crop_min_size;
        crop.handle_tolerance = settings.crop_handle_tolerance;

        let mut props = ToolProperties::default();
        props.set_brush_size(settings.brush_size);
        props.set_tolerance(settings.tolerance);

        let id = Uuid::new_v4();
        log::info!("session {} opened: {} ({}x{})", id, name, w, h);

        Self {
            id,
            name: name.to_string(),
            compositor: FilterCompositor::new(pixels.clone()),
            overlay: PixelBuffer::new(w, h),
            pixels,
            reference,
            history,
            crop,
            viewport: Viewport::with_limits(settings.zoom_min, settings.zoom_max, settings.zoom_step),
            tool: Tool::default(),
            props,
            stroke: StrokeState::default(),
            settings,
        }
    }

    // ---- accessors -----------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn reference(&self) -> &PixelBuffer {
        &self.reference
    }

    pub fn overlay(&self) -> &PixelBuffer {
        &self.overlay
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn crop(&self) -> &CropController {
        &self.crop
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn properties(&self) -> &ToolProperties {
        &self.props
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn filter_stack(&self) -> &FilterStack {
        self.compositor.stack()
    }

    pub fn rotation(&self) -> f32 {
        self.compositor.rotation()
    }

    /// What the user sees: filtered + rotated committed pixels, or the live
    /// buffer while a stroke is in progress or no filter is active.
    pub fn display(&self) -> &PixelBuffer {
        if self.stroke.is_active() || !self.compositor.is_active() {
            &self.pixels
        } else {
            self.compositor.display()
        }
    }

    // ---- tool properties -----------------------------------------------------

    pub fn set_brush_size(&mut self, size: u32) {
        self.props.set_brush_size(size);
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.props.set_tolerance(tolerance);
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.props.aspect_ratio = ratio;
        self.crop.set_aspect_ratio(ratio);
        self.refresh_overlay();
    }

    /// Switch tools. A stroke in progress is finished (and recorded) first.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.tool == tool {
            return;
        }
        self.finish_stroke();
        log::debug!("tool {} -> {}", self.tool.label(), tool.label());
        self.tool = tool;
    }

    // ---- gestures ------------------------------------------------------------

    /// Select `tool` and feed it a sequence of image-space events.
    /// Returns `true` if pixels or the crop selection changed.
    pub fn apply_tool(&mut self, tool: Tool, events: &[GestureEvent]) -> bool {
        self.set_tool(tool);
        let mut changed = false;
        for &event in events {
            changed |= self.handle_gesture(event) != ToolOutcome::Idle;
        }
        changed
    }

    /// Same as [`apply_tool`](Self::apply_tool) with device-space events
    /// mapped through the viewport and the displayed element's bounds.
    pub fn apply_tool_device(&mut self, tool: Tool, events: &[GestureEvent], bbox: &BoundingBox) -> bool {
        let (w, h) = self.pixels.dimensions();
        let viewport = self.viewport;
        let mapped: Vec<GestureEvent> = events
            .iter()
            .map(|e| e.map(|p| viewport.to_image_space(p, bbox, w, h)))
            .collect();
        self.apply_tool(tool, &mapped)
    }

    /// One event to the active tool.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> ToolOutcome {
        let mut ctx = ToolContext {
            pixels: &mut self.pixels,
            reference: &self.reference,
            crop: &mut self.crop,
            props: &self.props,
            stroke: &mut self.stroke,
        };
        let outcome = handle_event(self.tool, &mut ctx, event);
        match &outcome {
            ToolOutcome::Idle => {}
            ToolOutcome::Changed => {
                if self.tool == Tool::Crop {
                    self.refresh_overlay();
                }
            }
            ToolOutcome::Completed(description) => self.commit_edit(description),
        }
        outcome
    }

    fn finish_stroke(&mut self) {
        if self.stroke.finish() {
            self.commit_edit(self.tool.label());
        }
    }

    /// Record the current pixels as a history entry and rebase the filters.
    fn commit_edit(&mut self, description: &str) {
        self.compositor.reset_original(&self.pixels);
        self.history.commit(HistoryEntry::new(
            description,
            self.pixels.clone(),
            self.reference.clone(),
        ));
        log::info!(
            "{}: {} ({} undo steps, {} KiB history)",
            self.name,
            description,
            self.history.undo_count(),
            self.history.memory_usage() / 1024
        );
    }

    // ---- crop ----------------------------------------------------------------

    /// Place a crop selection directly (image space).
    pub fn set_crop_selection(&mut self, rect: CropRect) {
        self.crop.set_selection(rect);
        self.refresh_overlay();
    }

    /// Apply the crop selection. Returns `false` when there is no selection
    /// or it is below the minimum size; nothing changes in that case.
    pub fn commit_crop(&mut self) -> bool {
        self.finish_stroke();
        let Some(region) = self.crop.commit() else {
            return false;
        };
        let (x, y, w, h) = (region.x, region.y, region.width, region.height);
        if !transform::crop(&mut self.pixels, x, y, w, h) {
            log::warn!("{}: crop region {:?} outside the image", self.name, region);
            return false;
        }
        let mut reference = (*self.reference).clone();
        transform::crop(&mut reference, x, y, w, h);
        self.reference = Arc::new(reference);
        self.after_geometry_change();
        self.commit_edit("Crop");
        true
    }

    pub fn cancel_crop(&mut self) {
        if self.crop.is_active() {
            self.crop.cancel();
            self.refresh_overlay();
        }
    }

    // ---- transforms ----------------------------------------------------------

    pub fn flip_horizontal(&mut self) {
        self.apply_geometry("Flip Horizontal", transform::flip_horizontal);
    }

    pub fn flip_vertical(&mut self) {
        self.apply_geometry("Flip Vertical", transform::flip_vertical);
    }

    pub fn rotate(&mut self, turn: QuarterTurn) {
        self.apply_geometry(turn.label(), |buf| transform::rotate(buf, turn));
    }

    pub fn rotate_90(&mut self, clockwise: bool) {
        self.rotate(if clockwise { QuarterTurn::Cw90 } else { QuarterTurn::Ccw90 });
    }

    pub fn rotate_180(&mut self) {
        self.rotate(QuarterTurn::Half);
    }

    /// Run a geometric op on the edit buffer and the restore reference, then
    /// record it as one history entry.
    fn apply_geometry<F>(&mut self, description: &str, op: F)
    where
        F: Fn(&mut PixelBuffer),
    {
        self.finish_stroke();
        op(&mut self.pixels);
        let mut reference = (*self.reference).clone();
        op(&mut reference);
        self.reference = Arc::new(reference);
        self.after_geometry_change();
        self.commit_edit(description);
    }

    /// Auxiliary state follows the edit buffer's geometry.
    fn after_geometry_change(&mut self) {
        let (w, h) = self.pixels.dimensions();
        if self.overlay.dimensions() != (w, h) {
            self.overlay.resize(w, h);
        }
        self.crop.image_resized(w, h);
        self.refresh_overlay();
    }

    // ---- filters -------------------------------------------------------------

    /// Replace the filter parameters. Never touches the committed pixels.
    pub fn set_filter(&mut self, stack: FilterStack) {
        self.compositor.set_stack(stack);
    }

    pub fn apply_preset(&mut self, preset: FilterPreset) {
        self.compositor.apply_preset(preset);
    }

    /// Composite-time rotation in degrees (clockwise).
    pub fn set_rotation(&mut self, degrees: f32) {
        self.compositor.set_rotation(degrees);
    }

    pub fn reset_filters(&mut self) {
        self.compositor.reset_filters();
    }

    // ---- history -------------------------------------------------------------

    /// Step back one commit. No-op (returns `false`) at the oldest state.
    pub fn undo(&mut self) -> bool {
        self.finish_stroke();
        let Some(entry) = self.history.undo() else {
            return false;
        };
        let (pixels, reference) = (entry.pixels.clone(), entry.reference.clone());
        log::debug!("{}: undo", self.name);
        self.restore(pixels, reference);
        true
    }

    /// Step forward one commit. No-op (returns `false`) at the newest state.
    pub fn redo(&mut self) -> bool {
        self.finish_stroke();
        let Some(entry) = self.history.redo() else {
            return false;
        };
        let (pixels, reference) = (entry.pixels.clone(), entry.reference.clone());
        log::debug!("{}: redo", self.name);
        self.restore(pixels, reference);
        true
    }

    fn restore(&mut self, pixels: PixelBuffer, reference: Arc<PixelBuffer>) {
        let resized = pixels.dimensions() != self.pixels.dimensions();
        self.pixels = pixels;
        self.reference = reference;
        self.compositor.reset_original(&self.pixels);
        if resized {
            self.after_geometry_change();
        }
    }

    // ---- export / close ------------------------------------------------------

    /// PNG of what is displayed (committed pixels through the filter chain
    /// and composite rotation). Failure leaves the session untouched.
    pub fn export_bytes(&self) -> Result<Vec<u8>> {
        let buf = if self.compositor.is_active() {
            self.compositor.display()
        } else {
            self.committed_pixels()
        };
        match io::encode_png(buf) {
            Ok(bytes) => {
                log::info!("{}: exported {} bytes", self.name, bytes.len());
                Ok(bytes)
            }
            Err(e) => {
                log::error!("{}: export failed: {}", self.name, e);
                Err(e)
            }
        }
    }

    /// Export to a file.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let bytes = self.export_bytes()?;
        std::fs::write(path, bytes)?;
        log::info!("{}: saved {}", self.name, path.display());
        Ok(())
    }

    /// The rendered result as a buffer (same content as `export_bytes`).
    pub fn rendered(&self) -> PixelBuffer {
        if self.compositor.is_active() {
            self.compositor.display().clone()
        } else {
            self.committed_pixels().clone()
        }
    }

    fn committed_pixels(&self) -> &PixelBuffer {
        self.history.current().map(|e| &e.pixels).unwrap_or(&self.pixels)
    }

    /// End the session. Uncommitted work (a stroke in progress, a crop
    /// draft) is dropped; the last committed pixels and their reference are
    /// returned.
    pub fn close(self) -> CommittedImage {
        log::info!(
            "session {} closed: {} ({} history entries)",
            self.id,
            self.name,
            self.history.len()
        );
        match self.history.current() {
            Some(entry) => CommittedImage {
                pixels: entry.pixels.clone(),
                reference: entry.reference.clone(),
            },
            None => CommittedImage {
                pixels: self.pixels,
                reference: self.reference,
            },
        }
    }

    // ---- overlay -------------------------------------------------------------

    /// Redraw the crop overlay: shade outside the selection plus an outline.
    pub fn refresh_overlay(&mut self) {
        self.overlay.clear();
        let Some(rect) = self.crop.selection() else {
            return;
        };
        let (w, h) = self.overlay.dimensions();
        let (x0, y0, rw, rh) = rect.to_pixels(w, h);
        let (x1, y1) = (x0 + rw, y0 + rh);
        for y in 0..h {
            for x in 0..w {
                let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
                if !inside {
                    self.overlay.put_pixel(x, y, CROP_SHADE);
                } else if x < x0 + CROP_OUTLINE_WIDTH
                    || x + CROP_OUTLINE_WIDTH >= x1
                    || y < y0 + CROP_OUTLINE_WIDTH
                    || y + CROP_OUTLINE_WIDTH >= y1
                {
                    self.overlay.put_pixel(x, y, CROP_OUTLINE);
                }
            }
        }
    }
}
