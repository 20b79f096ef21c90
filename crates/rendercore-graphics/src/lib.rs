//! Pure geometry data for the RenderCore mount engine
//!
//! Bounds, offsets and paddings flow from layout into the mount phase as
//! plain `f32` values. Nothing in here knows about hosts or content.

mod geometry;

pub use geometry::*;

pub mod prelude {
    pub use crate::geometry::{EdgeInsets, Point, Rect, Size};
}
