//! Pure pixel operations over [`PixelBuffer`](crate::canvas::PixelBuffer).

pub mod adjustments;
pub mod brush;
pub mod filters;
pub mod selection;
pub mod transform;
