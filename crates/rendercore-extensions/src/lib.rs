//! Mount extensions built on the RenderCore extension hooks.
//!
//! [`IncrementalMountExtension`] mounts only what intersects the visible
//! rect of the root host. [`VisibilityExtension`] reports when tagged
//! layout results enter and leave that rect.

mod incremental_mount;
mod visibility;

pub use incremental_mount::{
    IncrementalMountConfig, IncrementalMountExtension, IncrementalMountInput, IncrementalMountNode,
};
pub use visibility::{
    VisibilityChangedEvent, VisibilityExtension, VisibilityHandlers, VisibilityInput,
    VisibilityOutput,
};

pub mod prelude {
    pub use crate::incremental_mount::{IncrementalMountConfig, IncrementalMountExtension};
    pub use crate::visibility::{VisibilityChangedEvent, VisibilityExtension, VisibilityHandlers};
}
