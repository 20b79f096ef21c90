//! Contracts between the layout pass and the reducer.

use crate::render_unit::{LayoutData, RenderUnit};
use rendercore_graphics::EdgeInsets;
use rendercore_layout::{LayoutContext, SizeConstraints};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Output of laying out one node.
///
/// Children are addressed by index; their offsets are relative to this
/// result's origin.
pub trait LayoutResult: Send + Sync {
    fn render_unit(&self) -> Option<&Arc<RenderUnit>>;

    fn layout_data(&self) -> Option<&Arc<dyn LayoutData>> {
        None
    }

    fn width(&self) -> f32;

    fn height(&self) -> f32;

    fn padding(&self) -> EdgeInsets {
        EdgeInsets::ZERO
    }

    fn child_count(&self) -> usize;

    fn child_at(&self, index: usize) -> Option<&dyn LayoutResult>;

    fn x_for_child_at(&self, index: usize) -> f32;

    fn y_for_child_at(&self, index: usize) -> f32;

    /// Side data for extensions that build their input while reducing.
    fn extension_data(&self, _type_id: TypeId) -> Option<&(dyn Any + Send + Sync)> {
        None
    }
}

impl dyn LayoutResult + '_ {
    /// Typed access to [`LayoutResult::extension_data`].
    pub fn extension_data_of<T: Any + Send + Sync>(&self) -> Option<&T> {
        let data: &dyn Any = self.extension_data(TypeId::of::<T>())?;
        data.downcast_ref::<T>()
    }
}

/// Something that can be laid out.
pub trait Node: Send + Sync {
    fn calculate_layout(
        &self,
        context: &mut LayoutContext,
        constraints: SizeConstraints,
    ) -> Arc<dyn LayoutResult>;
}
