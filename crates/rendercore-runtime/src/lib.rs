//! Runtime services that produce render trees off the UI thread.
//!
//! [`RenderState`] resolves a tree description into a layout node and lays
//! it out into a [`rendercore_core::RenderTree`], committing results by
//! version and promoting them to the UI thread through a
//! [`UiThreadScheduler`].

mod error;
mod future;
mod render_state;
mod scheduler;

pub use error::RenderStateError;
pub use future::ThreadInheritingPriorityFuture;
pub use render_state::{RenderState, RenderStateDelegate, Resolver};
pub use scheduler::{
    ChannelUiScheduler, NoopPriorityController, ThreadPriorityController, UiThreadScheduler,
};

pub mod prelude {
    pub use crate::error::RenderStateError;
    pub use crate::render_state::{RenderState, RenderStateDelegate, Resolver};
    pub use crate::scheduler::{ChannelUiScheduler, UiThreadScheduler};
}
