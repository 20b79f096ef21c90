#![doc = r"Render tree reconciliation and mount engine."]
//!
//! A layout pass produces a tree of [`LayoutResult`]s. The [`reducer`]
//! flattens it into an immutable [`RenderTree`], and a [`MountState`] drives
//! a live [`Host`] hierarchy from whatever it showed before toward that tree,
//! reusing content wherever a [`RenderUnit`] id survives between generations.

pub mod binder;
pub mod content;
pub mod error;
pub mod error_reporter;
pub mod extension;
pub mod host;
pub mod layout_result;
pub mod mount_delegate;
pub mod mount_item;
pub mod mount_state;
pub mod pool;
pub mod reducer;
pub mod render_tree;
pub mod render_unit;

pub use binder::{
    BindContext, BindData, Binder, BinderError, BinderId, BinderKey, BinderObserver, BinderType,
    DelegateBinder, FnBinder,
};
pub use content::{Content, ContentAllocator, ContextScope, MountContent, RenderType, ScopeId};
pub use error::RenderCoreError;
pub use error_reporter::{ErrorReporterDelegate, LogErrorReporter, LogLevel};
pub use extension::{
    AnyMountExtension, ExtensionInput, ExtensionState, ItemEvent, LayoutVisitor, MountExtension,
    MountTarget, MountedItemRef, RenderCoreExtension, VisitedNode,
};
pub use host::{Host, HostChild, HostChildren, HostView};
pub use layout_result::{LayoutResult, Node};
pub use mount_delegate::{DelegateCore, MountDelegate};
pub use mount_item::MountItem;
pub use mount_state::{MountState, MountStateConfig, MountedItems};
pub use pool::{ContentPool, DefaultContentPool, MountItemsPool, PoolError, PoolKey};
pub use reducer::reduce;
pub use render_tree::{ExtensionResult, RenderTree, RenderTreeNode};
pub use render_unit::{LayoutData, RenderUnit, RenderUnitBuilder, RenderUnitId, ROOT_HOST_ID};

pub use rendercore_graphics::{EdgeInsets, Point, Rect, Size};
pub use rendercore_layout::{LayoutCache, LayoutContext, SizeConstraints, SizeSpec};

pub(crate) use rendercore_layout::collections;

pub type Result<T, E = RenderCoreError> = std::result::Result<T, E>;
