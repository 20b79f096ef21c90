//! Testing utilities and harness for RenderCore

pub mod binder;
pub mod content;
pub mod layout;
pub mod reporter;
pub mod rule;

pub use binder::{recording_binder, RecordingBinder};
pub use content::{
    HostAllocator, Operation, OperationLog, RecordingHostView, TestDrawable, TestDrawableAllocator,
};
pub use layout::{TestLayout, TestNode};
pub use reporter::{CapturedReport, ErrorReporterGuard};
pub use rule::MountTestRule;

pub mod prelude {
    pub use crate::binder::*;
    pub use crate::content::*;
    pub use crate::layout::*;
    pub use crate::reporter::*;
    pub use crate::rule::*;
}
