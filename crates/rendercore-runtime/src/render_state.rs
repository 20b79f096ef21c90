//! Resolve and layout pipeline.
//!
//! A tree description is resolved into a layout [`Node`] together with the
//! pending state updates, and that node is laid out and reduced into a
//! [`RenderTree`]. Both stages run as [`ThreadInheritingPriorityFuture`]s so
//! a thread asking for a result that another thread is already computing
//! waits for it instead of computing it again. Every result carries a
//! version and only results newer than the committed one are committed.

use crate::error::RenderStateError;
use crate::future::ThreadInheritingPriorityFuture;
use crate::scheduler::{NoopPriorityController, ThreadPriorityController, UiThreadScheduler};
use rendercore_core::{reduce, Node, RenderCoreExtension, RenderTree, Size};
use rendercore_layout::{LayoutCache, LayoutContext, SizeConstraints};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_RENDER_STATE_ID: AtomicU64 = AtomicU64::new(1);

/// Turns a tree description and the state updates queued against it into
/// a layout node.
pub trait Resolver: Send + Sync + 'static {
    type Tree: Send + Sync + 'static;
    type Update: Clone + Send + Sync + 'static;

    fn resolve(&self, tree: &Self::Tree, updates: &[Self::Update]) -> Arc<dyn Node>;
}

pub trait RenderStateDelegate: Send + Sync {
    /// A newer render tree was committed. May run on any thread.
    fn commit(
        &self,
        layout_version: u64,
        previous: Option<&Arc<RenderTree>>,
        next: &Arc<RenderTree>,
    );

    /// The committed tree reached the UI thread and can be mounted.
    fn commit_to_ui(&self, tree: &Arc<RenderTree>);
}

type ResolveFuture = ThreadInheritingPriorityFuture<Arc<dyn Node>>;

#[derive(Clone)]
struct LayoutOutput {
    tree: Arc<RenderTree>,
    cache: LayoutCache,
}

type LayoutFuture = ThreadInheritingPriorityFuture<Result<LayoutOutput, RenderStateError>>;

struct PendingResolve<T> {
    version: u64,
    tree: Arc<T>,
    updates_end: usize,
    future: Arc<ResolveFuture>,
}

struct PendingLayout {
    version: u64,
    resolve_version: u64,
    constraints: SizeConstraints,
    future: Arc<LayoutFuture>,
}

struct PipelineState<R: Resolver> {
    tree: Option<Arc<R::Tree>>,
    pending_updates: Vec<R::Update>,
    /// Absolute index of `pending_updates[0]` in the update stream.
    updates_base: usize,
    size_constraints: Option<SizeConstraints>,

    next_resolve_version: u64,
    committed_resolve_version: Option<u64>,
    committed_node: Option<Arc<dyn Node>>,
    resolve: Option<PendingResolve<R::Tree>>,

    next_layout_version: u64,
    committed_layout_version: Option<u64>,
    committed_constraints: Option<SizeConstraints>,
    committed_tree: Option<Arc<RenderTree>>,
    layout: Option<PendingLayout>,
    layout_cache: LayoutCache,
}

impl<R: Resolver> Default for PipelineState<R> {
    fn default() -> Self {
        Self {
            tree: None,
            pending_updates: Vec::new(),
            updates_base: 0,
            size_constraints: None,
            next_resolve_version: 0,
            committed_resolve_version: None,
            committed_node: None,
            resolve: None,
            next_layout_version: 0,
            committed_layout_version: None,
            committed_constraints: None,
            committed_tree: None,
            layout: None,
            layout_cache: LayoutCache::new(),
        }
    }
}

struct UiState {
    layout_version: Option<u64>,
    tree: Option<Arc<RenderTree>>,
}

struct Shared<R: Resolver> {
    id: u64,
    resolver: Arc<R>,
    delegate: Arc<dyn RenderStateDelegate>,
    scheduler: Arc<dyn UiThreadScheduler>,
    priorities: Arc<dyn ThreadPriorityController>,
    extensions: Vec<Arc<dyn RenderCoreExtension>>,
    pipeline: Mutex<PipelineState<R>>,
    ui: Mutex<UiState>,
}

/// Owns the resolve and layout pipeline of one root.
///
/// Cloning yields another handle to the same pipeline, so it can be driven
/// from several threads at once.
pub struct RenderState<R: Resolver> {
    shared: Arc<Shared<R>>,
}

impl<R: Resolver> Clone for RenderState<R> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<R: Resolver> RenderState<R> {
    pub fn new(
        resolver: R,
        delegate: Arc<dyn RenderStateDelegate>,
        scheduler: Arc<dyn UiThreadScheduler>,
    ) -> Self {
        Self::with_options(
            resolver,
            delegate,
            scheduler,
            Arc::new(NoopPriorityController),
            Vec::new(),
        )
    }

    pub fn with_options(
        resolver: R,
        delegate: Arc<dyn RenderStateDelegate>,
        scheduler: Arc<dyn UiThreadScheduler>,
        priorities: Arc<dyn ThreadPriorityController>,
        extensions: Vec<Arc<dyn RenderCoreExtension>>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: NEXT_RENDER_STATE_ID.fetch_add(1, Ordering::Relaxed),
                resolver: Arc::new(resolver),
                delegate,
                scheduler,
                priorities,
                extensions,
                pipeline: Mutex::new(PipelineState::default()),
                ui: Mutex::new(UiState {
                    layout_version: None,
                    tree: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    fn pipeline(&self) -> MutexGuard<'_, PipelineState<R>> {
        self.shared
            .pipeline
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the tree description and runs the pipeline.
    pub fn set_tree(&self, tree: R::Tree) -> Result<(), RenderStateError> {
        self.pipeline().tree = Some(Arc::new(tree));
        self.resolve_and_layout()
    }

    /// Queues a state update against the current tree and runs the pipeline.
    pub fn enqueue_state_update(&self, update: R::Update) -> Result<(), RenderStateError> {
        {
            let mut pipeline = self.pipeline();
            pipeline.pending_updates.push(update);
            if pipeline.tree.is_none() {
                return Ok(());
            }
        }
        self.resolve_and_layout()
    }

    /// Lays out against `constraints` unless a tree for them is committed.
    pub fn set_size_constraints(&self, constraints: SizeConstraints) -> Result<(), RenderStateError> {
        {
            let mut pipeline = self.pipeline();
            if pipeline.size_constraints == Some(constraints)
                && pipeline.committed_constraints == Some(constraints)
            {
                return Ok(());
            }
            pipeline.size_constraints = Some(constraints);
            if pipeline.committed_node.is_none() {
                return Ok(());
            }
        }
        self.layout().map(|_| ())
    }

    /// Lays out against `constraints` on this thread and returns the
    /// resulting size.
    pub fn measure(&self, constraints: SizeConstraints) -> Result<Size, RenderStateError> {
        {
            let mut pipeline = self.pipeline();
            pipeline.size_constraints = Some(constraints);
            if pipeline.committed_node.is_none() && pipeline.tree.is_none() {
                return Err(RenderStateError::NoTree);
            }
        }
        if self.pipeline().committed_node.is_none() {
            self.resolve()?;
        }
        let tree = self.layout()?;
        Ok(Size::new(tree.width(), tree.height()))
    }

    fn resolve_and_layout(&self) -> Result<(), RenderStateError> {
        self.resolve()?;
        if self.pipeline().size_constraints.is_none() {
            return Ok(());
        }
        self.layout().map(|_| ())
    }

    fn resolve(&self) -> Result<(), RenderStateError> {
        let (version, updates_end, future) = {
            let mut pipeline = self.pipeline();
            let tree = pipeline.tree.clone().ok_or(RenderStateError::NoTree)?;
            let updates_end = pipeline.updates_base + pipeline.pending_updates.len();
            let reusable = pipeline
                .resolve
                .as_ref()
                .filter(|pending| {
                    Arc::ptr_eq(&pending.tree, &tree)
                        && pending.updates_end == updates_end
                        && !pending.future.is_released()
                })
                .map(|pending| (pending.version, pending.future.clone()));
            if let Some((version, future)) = reusable {
                log::trace!("render state {} reusing resolve {version}", self.shared.id);
                (version, updates_end, future)
            } else {
                let version = pipeline.next_resolve_version;
                pipeline.next_resolve_version += 1;
                let resolver = self.shared.resolver.clone();
                let updates = pipeline.pending_updates.clone();
                let input = tree.clone();
                let future = Arc::new(ThreadInheritingPriorityFuture::with_priority_controller(
                    "resolve",
                    self.shared.priorities.clone(),
                    move || resolver.resolve(&input, &updates),
                ));
                pipeline.resolve = Some(PendingResolve {
                    version,
                    tree,
                    updates_end,
                    future: future.clone(),
                });
                (version, updates_end, future)
            }
        };

        let node = future
            .run_and_get()
            .ok_or(RenderStateError::Released { stage: "resolve" })?;
        self.commit_resolve(version, updates_end, node);
        Ok(())
    }

    fn commit_resolve(&self, version: u64, updates_end: usize, node: Arc<dyn Node>) {
        let mut pipeline = self.pipeline();
        if pipeline
            .committed_resolve_version
            .is_some_and(|committed| committed >= version)
        {
            log::debug!(
                "render state {} discarding stale resolve {version}",
                self.shared.id
            );
            return;
        }
        let consumed = updates_end.saturating_sub(pipeline.updates_base);
        let consumed = consumed.min(pipeline.pending_updates.len());
        pipeline.pending_updates.drain(..consumed);
        pipeline.updates_base += consumed;
        pipeline.committed_resolve_version = Some(version);
        pipeline.committed_node = Some(node);
        if pipeline.resolve.as_ref().is_some_and(|pending| pending.version == version) {
            pipeline.resolve = None;
        }
        log::debug!(
            "render state {} committed resolve {version}, {} updates pending",
            self.shared.id,
            pipeline.pending_updates.len()
        );
    }

    /// Lays out the committed node and commits the result if it is still
    /// the newest. Returns the tree this call produced or waited for.
    fn layout(&self) -> Result<Arc<RenderTree>, RenderStateError> {
        let (version, future) = {
            let mut pipeline = self.pipeline();
            let node = pipeline.committed_node.clone().ok_or(RenderStateError::NoTree)?;
            let constraints = pipeline
                .size_constraints
                .ok_or(RenderStateError::NoSizeConstraints)?;
            let resolve_version = pipeline.committed_resolve_version.unwrap_or_default();
            let reusable = pipeline
                .layout
                .as_ref()
                .filter(|pending| {
                    pending.resolve_version == resolve_version
                        && pending.constraints == constraints
                        && !pending.future.is_released()
                })
                .map(|pending| (pending.version, pending.future.clone()));
            if let Some((version, future)) = reusable {
                log::trace!("render state {} reusing layout {version}", self.shared.id);
                (version, future)
            } else {
                let version = pipeline.next_layout_version;
                pipeline.next_layout_version += 1;
                let cache = pipeline.layout_cache.carry_forward();
                let id = self.shared.id;
                let extensions = self.shared.extensions.clone();
                let future = Arc::new(ThreadInheritingPriorityFuture::with_priority_controller(
                    "layout",
                    self.shared.priorities.clone(),
                    move || {
                        let mut context = LayoutContext::new(id, version, cache);
                        let result = node.calculate_layout(&mut context, constraints);
                        let tree =
                            reduce(&*result, constraints, id, &extensions)?.with_generation(version);
                        Ok(LayoutOutput {
                            tree: Arc::new(tree),
                            cache: context.into_cache(),
                        })
                    },
                ));
                pipeline.layout = Some(PendingLayout {
                    version,
                    resolve_version,
                    constraints,
                    future: future.clone(),
                });
                (version, future)
            }
        };

        let output = future
            .run_and_get()
            .ok_or(RenderStateError::Released { stage: "layout" })??;
        let tree = output.tree.clone();
        self.commit_layout(version, output);
        Ok(tree)
    }

    fn commit_layout(&self, version: u64, output: LayoutOutput) {
        let previous = {
            let mut pipeline = self.pipeline();
            if pipeline
                .committed_layout_version
                .is_some_and(|committed| committed >= version)
            {
                log::debug!(
                    "render state {} discarding stale layout {version}",
                    self.shared.id
                );
                return;
            }
            if pipeline.layout.as_ref().is_some_and(|pending| pending.version == version) {
                pipeline.layout = None;
            }
            pipeline.committed_layout_version = Some(version);
            pipeline.committed_constraints = Some(output.tree.size_constraints());
            pipeline.layout_cache = output.cache;
            pipeline.committed_tree.replace(output.tree.clone())
        };
        log::debug!("render state {} committed layout {version}", self.shared.id);
        self.shared
            .delegate
            .commit(version, previous.as_ref(), &output.tree);

        if self.shared.scheduler.is_ui_thread() {
            Self::promote_committed_tree(&self.shared);
        } else {
            let shared = self.shared.clone();
            self.shared
                .scheduler
                .post(Box::new(move || Self::promote_committed_tree(&shared)));
        }
    }

    /// Hands the newest committed tree to the UI side if it has not seen it.
    fn promote_committed_tree(shared: &Shared<R>) {
        let (version, tree) = {
            let pipeline = shared
                .pipeline
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            match (pipeline.committed_layout_version, &pipeline.committed_tree) {
                (Some(version), Some(tree)) => (version, tree.clone()),
                _ => return,
            }
        };
        {
            let mut ui = shared
                .ui
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if ui.layout_version.is_some_and(|promoted| promoted >= version) {
                return;
            }
            ui.layout_version = Some(version);
            ui.tree = Some(tree.clone());
        }
        log::trace!("render state {} promoted layout {version} to UI", shared.id);
        shared.delegate.commit_to_ui(&tree);
    }

    pub fn committed_render_tree(&self) -> Option<Arc<RenderTree>> {
        self.pipeline().committed_tree.clone()
    }

    /// Newest tree promoted to the UI thread.
    pub fn ui_render_tree(&self) -> Option<Arc<RenderTree>> {
        self.shared
            .ui
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .tree
            .clone()
    }

    pub fn committed_resolve_version(&self) -> Option<u64> {
        self.pipeline().committed_resolve_version
    }

    pub fn committed_layout_version(&self) -> Option<u64> {
        self.pipeline().committed_layout_version
    }

    pub fn pending_update_count(&self) -> usize {
        self.pipeline().pending_updates.len()
    }

    pub fn size_constraints(&self) -> Option<SizeConstraints> {
        self.pipeline().size_constraints
    }

    pub fn has_tree(&self) -> bool {
        self.pipeline().tree.is_some()
    }
}

#[cfg(test)]
#[path = "tests/render_state_tests.rs"]
mod tests;
