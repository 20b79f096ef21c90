//! Layout-side value types for RenderCore
//!
//! The layout pass itself is pluggable. This crate only carries the data that
//! crosses the boundary between the layout pass and the reducer: packed size
//! constraints, the per-pass [`LayoutContext`] and the [`LayoutCache`] that is
//! carried from one pass to the next.

pub mod collections;
mod context;
mod size_spec;

pub use context::{LayoutCache, LayoutContext};
pub use size_spec::{SizeConstraints, SizeSpec, SizeSpecMode};

pub mod prelude {
    pub use crate::context::{LayoutCache, LayoutContext};
    pub use crate::size_spec::{SizeConstraints, SizeSpec, SizeSpecMode};
}
