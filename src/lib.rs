//! CutoutFE: editing and compositing for background-removed photos.
//!
//! An [`EditorSession`] owns one image: the edit buffer, a snapshot history,
//! the crop selection, the active tool and a non-destructive filter chain.
//! Sessions are opened from encoded bytes through a [`Segmenter`] that
//! supplies the alpha mask.

pub mod canvas;
pub mod cli;
pub mod components;
pub mod compositor;
pub mod error;
pub mod gallery;
pub mod io;
pub mod logger;
pub mod ops;
pub mod segmentation;
pub mod session;
pub mod settings;
pub mod viewport;

pub use canvas::PixelBuffer;
pub use components::crop::{AspectRatio, CropController, CropRect};
pub use components::history::{HistoryEntry, HistoryManager};
pub use components::tools::{GestureEvent, Tool, ToolOutcome};
pub use error::{EditorError, Result, SegmentationError};
pub use gallery::{Gallery, GalleryItem};
pub use ops::filters::{FilterPreset, FilterStack};
pub use ops::transform::QuarterTurn;
pub use segmentation::{AlphaMask, FnSegmenter, KeepAlphaSegmenter, MaskFileSegmenter, Segmenter};
pub use session::{CommittedImage, EditorSession, open_session};
pub use settings::EditorSettings;
pub use viewport::{BoundingBox, Point, Viewport};
