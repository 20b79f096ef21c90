//! The reconciliation engine.
//!
//! [`MountState::mount`] takes the next [`RenderTree`] and brings the host
//! hierarchy in line with it:
//!
//! 1. items whose id left the tree, whose host changed or whose content
//!    type changed are unmounted; items that only changed position are moved
//!    within their host,
//! 2. the root item is created or updated,
//! 3. every other node is mounted, updated in place, or evicted when an
//!    extension holds no mount reference for it.
//!
//! Content survives as long as its render unit id does, so consecutive
//! trees that share ids reuse the same content objects.

use crate::binder::{BindContext, BinderObserver};
use crate::collections::map::HashMap;
use crate::content::{Content, ContextScope};
use crate::error::RenderCoreError;
use crate::error_reporter::{self, LogLevel};
use crate::extension::{ItemEvent, MountTarget};
use crate::mount_delegate::{MountDelegate, MountRequest};
use crate::mount_item::MountItem;
use crate::pool::MountItemsPool;
use crate::render_tree::{RenderTree, RenderTreeNode};
use crate::render_unit::{layout_data_equivalent, RenderUnit, RenderUnitId, ROOT_HOST_ID};
use rendercore_graphics::{EdgeInsets, Rect};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use web_time::Instant;

const ERROR_CATEGORY: &str = "RenderCore:MountState";

#[derive(Clone, Debug)]
pub struct MountStateConfig {
    /// Mount a missing parent host before its child instead of failing.
    pub ensure_parent_mounted: bool,
    /// Walk the tree from the last node to the first during the mount pass.
    pub mount_leaf_first: bool,
    /// Upper bound on ancestors mounted on behalf of one node.
    pub max_parent_mount_depth: usize,
    /// Fail the pass when a binder observer skips or repeats a call.
    pub strict_binder_observer: bool,
}

impl Default for MountStateConfig {
    fn default() -> Self {
        Self {
            ensure_parent_mounted: true,
            mount_leaf_first: false,
            max_parent_mount_depth: 256,
            strict_binder_observer: cfg!(debug_assertions),
        }
    }
}

/// Mounted items by render unit id.
#[derive(Default)]
pub struct MountedItems {
    items: HashMap<RenderUnitId, MountItem>,
}

impl MountedItems {
    pub fn get(&self, id: RenderUnitId) -> Option<&MountItem> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: RenderUnitId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn require(&self, id: RenderUnitId) -> Result<&MountItem, RenderCoreError> {
        self.items.get(&id).ok_or(RenderCoreError::ItemNotFound { id })
    }

    fn require_mut(&mut self, id: RenderUnitId) -> Result<&mut MountItem, RenderCoreError> {
        self.items
            .get_mut(&id)
            .ok_or(RenderCoreError::ItemNotFound { id })
    }

    fn insert(&mut self, item: MountItem) {
        self.items.insert(item.id(), item);
    }

    fn remove(&mut self, id: RenderUnitId) -> Option<MountItem> {
        self.items.remove(&id)
    }
}

impl MountTarget for MountedItems {
    fn is_mounted(&self, id: RenderUnitId) -> bool {
        self.contains(id)
    }

    fn content_by_id(&self, id: RenderUnitId) -> Option<Content> {
        self.get(id).map(|item| item.content().clone())
    }

    fn root_host(&self) -> Option<Content> {
        self.content_by_id(ROOT_HOST_ID)
    }
}

struct MountingGuard {
    flag: Rc<Cell<bool>>,
}

impl MountingGuard {
    fn enter(flag: &Rc<Cell<bool>>) -> Result<Self, RenderCoreError> {
        if flag.replace(true) {
            return Err(RenderCoreError::AlreadyMounting);
        }
        Ok(Self { flag: flag.clone() })
    }
}

impl Drop for MountingGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

fn bind_context<'a>(
    scope: &'a ContextScope,
    observer: &'a Option<Rc<dyn BinderObserver>>,
    config: &MountStateConfig,
) -> BindContext<'a> {
    BindContext {
        scope,
        observer: observer.as_deref(),
        strict_observer: config.strict_binder_observer,
    }
}

type RenderTreeListener = Box<dyn FnMut(&Arc<RenderTree>)>;

pub struct MountState {
    root_host: Content,
    scope: ContextScope,
    pool: Rc<MountItemsPool>,
    config: MountStateConfig,
    render_tree: Option<Arc<RenderTree>>,
    items: MountedItems,
    delegate: MountDelegate,
    is_mounting: Rc<Cell<bool>>,
    needs_remount: bool,
    binder_observer: Option<Rc<dyn BinderObserver>>,
    render_tree_updated_listener: Option<RenderTreeListener>,
}

impl MountState {
    pub fn new(
        root_host: Content,
        scope: ContextScope,
        pool: Rc<MountItemsPool>,
    ) -> Result<Self, RenderCoreError> {
        Self::with_config(root_host, scope, pool, MountStateConfig::default())
    }

    pub fn with_config(
        root_host: Content,
        scope: ContextScope,
        pool: Rc<MountItemsPool>,
        config: MountStateConfig,
    ) -> Result<Self, RenderCoreError> {
        if root_host.as_host().is_none() {
            return Err(RenderCoreError::NotAHost { id: ROOT_HOST_ID });
        }
        Ok(Self {
            root_host,
            scope,
            pool,
            config,
            render_tree: None,
            items: MountedItems::default(),
            delegate: MountDelegate::new(),
            is_mounting: Rc::new(Cell::new(false)),
            needs_remount: false,
            binder_observer: None,
            render_tree_updated_listener: None,
        })
    }

    /// Reconciles the host hierarchy with `tree`.
    ///
    /// Failures are reported to the error reporter and returned. A failed
    /// pass leaves the state flagged for remount.
    pub fn mount(&mut self, tree: Arc<RenderTree>) -> Result<(), RenderCoreError> {
        let _guard = match MountingGuard::enter(&self.is_mounting) {
            Ok(guard) => guard,
            Err(err) => {
                self.report_failure("mount", &err);
                return Err(err);
            }
        };
        let result = self.mount_tree(&tree);
        if let Err(err) = &result {
            self.needs_remount = true;
            self.report_failure("mount", err);
        }
        result
    }

    fn mount_tree(&mut self, tree: &Arc<RenderTree>) -> Result<(), RenderCoreError> {
        if let Some(current) = &self.render_tree {
            if Arc::ptr_eq(current, tree) && !self.needs_remount {
                log::trace!("render tree {} already mounted", tree.render_state_id());
                return Ok(());
            }
        }
        log::debug!(
            "mounting render tree {} with {} nodes",
            tree.render_state_id(),
            tree.mount_count()
        );

        if !self.delegate.matches(tree.extension_results()) {
            self.delegate.unregister_all(&self.items)?;
            self.delegate.register_from(tree.extension_results());
        }

        let visible_rect = self.local_visible_rect();
        self.delegate
            .before_mount(&self.items, tree.extension_results(), visible_rect)?;

        self.delegate.start_notify_visible_bounds_changed_section();
        let result = self.reconcile(tree);
        let flush = self.delegate.end_notify_visible_bounds_changed_section();
        if result.is_err() {
            self.delegate.reset_sections();
        }
        result?;
        self.needs_remount = false;

        if flush {
            let visible_rect = self.local_visible_rect();
            self.delegate
                .notify_visible_bounds_changed(&self.items, visible_rect)?;
        }
        self.delegate.after_mount(&self.items)?;
        self.process_requests()?;

        if let Some(listener) = self.render_tree_updated_listener.as_mut() {
            listener(tree);
        }
        Ok(())
    }

    fn reconcile(&mut self, tree: &Arc<RenderTree>) -> Result<(), RenderCoreError> {
        self.prepare_mount(tree)?;
        self.render_tree = Some(tree.clone());
        self.mount_root(tree)?;

        let count = tree.mount_count();
        for step in 0..count.saturating_sub(1) {
            let index = if self.config.mount_leaf_first {
                count - 1 - step
            } else {
                step + 1
            };
            let Some(node) = tree.node_at(index) else {
                continue;
            };
            let id = node.id();
            let mountable = self.delegate.core().maybe_lock_for_mount(id);
            if self.items.contains(id) {
                if mountable {
                    self.update_item(node.clone())?;
                } else {
                    log::trace!("evicting {id}, no mount reference held");
                    self.unmount_item(id)?;
                }
            } else if mountable {
                self.mount_render_unit(tree, index, 0)?;
            }
        }
        Ok(())
    }

    /// Unmounts or moves items of the previous tree ahead of the mount pass.
    fn prepare_mount(&mut self, next: &RenderTree) -> Result<(), RenderCoreError> {
        let Some(previous) = self.render_tree.clone() else {
            return Ok(());
        };
        for node in previous.nodes().iter().skip(1) {
            let id = node.id();
            let Some(item) = self.items.get(id) else {
                continue;
            };
            let Some(next_index) = next.index_of(id) else {
                self.unmount_item(id)?;
                continue;
            };
            let next_node = &next.nodes()[next_index];
            let host_changed = item.host_id() != next.parent_id(next_index);
            let content_changed = !item.render_unit().same_content_type(next_node.render_unit());
            if host_changed || content_changed {
                log::trace!(
                    "remounting {id}: host changed {host_changed}, content changed {content_changed}"
                );
                self.unmount_item(id)?;
                continue;
            }
            let old_position = item.position_in_host();
            let new_position = next_node.position_in_parent();
            if old_position != new_position {
                let child = item.host_child();
                let host_id = item.host_id().ok_or(RenderCoreError::ItemNotFound { id })?;
                let host_content = self.items.require(host_id)?.content().clone();
                let host = host_content
                    .as_host()
                    .ok_or(RenderCoreError::NotAHost { id: host_id })?;
                log::trace!("moving {id} from {old_position} to {new_position}");
                host.move_item(&child, old_position, new_position);
                self.items.require_mut(id)?.set_position_in_host(new_position);
            }
        }
        Ok(())
    }

    fn mount_root(&mut self, tree: &RenderTree) -> Result<(), RenderCoreError> {
        let root = tree.root().clone();
        if self.items.contains(ROOT_HOST_ID) {
            return self.update_item(root);
        }
        let mut item = MountItem::new(root.clone(), self.root_host.clone(), None);
        let context = bind_context(&self.scope, &self.binder_observer, &self.config);
        root.render_unit().mount_binders(
            context,
            &self.root_host,
            root.layout_data_ref(),
            &mut item.bind_data,
        )?;
        self.items.insert(item);
        let item = self.items.require(ROOT_HOST_ID)?;
        self.delegate
            .on_item(ItemEvent::Mount, &self.items, item.as_ref())?;
        self.bind_item(ROOT_HOST_ID)
    }

    fn mount_render_unit(
        &mut self,
        tree: &RenderTree,
        index: usize,
        depth: usize,
    ) -> Result<(), RenderCoreError> {
        let node = tree
            .node_at(index)
            .cloned()
            .ok_or(RenderCoreError::MissingRootNode)?;
        let id = node.id();
        if self.items.contains(id) {
            return Ok(());
        }
        let parent_index = node.parent().ok_or(RenderCoreError::MissingRootNode)?;
        let parent_id = tree.nodes()[parent_index].id();
        if !self.items.contains(parent_id) {
            if !self.config.ensure_parent_mounted {
                return Err(RenderCoreError::ParentNotMounted {
                    id,
                    parent: parent_id,
                });
            }
            if depth >= self.config.max_parent_mount_depth {
                return Err(RenderCoreError::ParentMountDepthExceeded {
                    id,
                    limit: self.config.max_parent_mount_depth,
                });
            }
            self.mount_render_unit(tree, parent_index, depth + 1)?;
        }

        let host_content = self.items.require(parent_id)?.content().clone();
        let host = host_content
            .as_host()
            .ok_or(RenderCoreError::NotAHost { id: parent_id })?;

        let unit = node.render_unit();
        let content = self
            .pool
            .acquire_content(&self.scope, unit.allocator().as_ref());
        let mut item = MountItem::new(node.clone(), content.clone(), Some(parent_id));
        let context = bind_context(&self.scope, &self.binder_observer, &self.config);
        unit.mount_binders(context, &content, node.layout_data_ref(), &mut item.bind_data)?;
        let child = item.host_child();
        self.items.insert(item);

        let item = self.items.require(id)?;
        self.delegate
            .on_item(ItemEvent::Mount, &self.items, item.as_ref())?;

        log::trace!("mounting {id} into {parent_id} at {}", node.position_in_parent());
        host.mount(node.position_in_parent(), child);
        self.bind_item(id)?;
        self.apply_bounds(id, None)
    }

    fn update_item(&mut self, node: Arc<RenderTreeNode>) -> Result<(), RenderCoreError> {
        let id = node.id();
        let item = self.items.require(id)?;
        let previous = item.node().clone();
        let should_update = !Arc::ptr_eq(previous.render_unit(), node.render_unit())
            || !layout_data_equivalent(previous.layout_data(), node.layout_data())
            || self.delegate.should_update_item(&previous, &node);

        if should_update {
            let was_bound = item.is_bound();
            if was_bound {
                self.delegate
                    .on_item(ItemEvent::Unbind, &self.items, item.as_ref())?;
            }
            let context = bind_context(&self.scope, &self.binder_observer, &self.config);
            let item = self.items.require_mut(id)?;
            let content = item.content().clone();
            RenderUnit::update_binders(
                previous.render_unit(),
                node.render_unit(),
                context,
                &content,
                previous.layout_data_ref(),
                node.layout_data_ref(),
                &mut item.bind_data,
                was_bound,
            )?;
            item.update(node);
            if was_bound {
                let item = self.items.require(id)?;
                self.delegate
                    .on_item(ItemEvent::Bind, &self.items, item.as_ref())?;
            }
        } else {
            self.items.require_mut(id)?.update(node);
        }

        if !self.items.require(id)?.is_bound() {
            self.bind_item(id)?;
        }
        if id != ROOT_HOST_ID {
            self.apply_bounds(id, Some(previous.bounds()))?;
        }
        Ok(())
    }

    fn bind_item(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        let context = bind_context(&self.scope, &self.binder_observer, &self.config);
        let item = self.items.require_mut(id)?;
        if item.is_bound() {
            return Ok(());
        }
        let node = item.node().clone();
        let content = item.content().clone();
        node.render_unit().attach_binders(
            context,
            &content,
            node.layout_data_ref(),
            &mut item.bind_data,
        )?;
        item.set_bound(true);
        let item = self.items.require(id)?;
        self.delegate
            .on_item(ItemEvent::Bind, &self.items, item.as_ref())
    }

    fn unbind_item(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        let item = self.items.require(id)?;
        if !item.is_bound() {
            return Ok(());
        }
        self.delegate
            .on_item(ItemEvent::Unbind, &self.items, item.as_ref())?;
        let context = bind_context(&self.scope, &self.binder_observer, &self.config);
        let item = self.items.require_mut(id)?;
        let node = item.node().clone();
        let content = item.content().clone();
        node.render_unit().detach_binders(
            context,
            &content,
            node.layout_data_ref(),
            &mut item.bind_data,
        )?;
        item.set_bound(false);
        Ok(())
    }

    fn apply_bounds(
        &mut self,
        id: RenderUnitId,
        previous: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        let item = self.items.require(id)?;
        let node = item.node();
        let bounds = node.bounds();
        item.content().set_bounds(bounds);
        if let Some(padding) = node.resolved_padding() {
            item.content().set_padding(padding);
        }
        let changed = previous != Some(bounds);
        let is_host = item.content().as_host().is_some();
        self.delegate
            .on_bounds_applied_to_item(&self.items, item.as_ref(), changed)?;
        if changed && is_host && self.delegate.request_visible_bounds_notification() {
            let visible_rect = self.local_visible_rect();
            self.delegate
                .notify_visible_bounds_changed(&self.items, visible_rect)?;
        }
        Ok(())
    }

    /// Unmounts `id` and everything mounted inside it, children first.
    fn unmount_item(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        let content = self.items.require(id)?.content().clone();
        if let Some(host) = content.as_host() {
            let children: Vec<_> = (0..host.child_count())
                .filter_map(|ordinal| host.child_at(ordinal))
                .collect();
            for child in children.iter().rev() {
                let tracked = self
                    .items
                    .get(child.id)
                    .is_some_and(|item| item.content().ptr_eq(&child.content));
                if !tracked {
                    return Err(RenderCoreError::UntrackedHostChild {
                        host: id,
                        child: child.id,
                    });
                }
                self.unmount_item(child.id)?;
            }
            let remaining = host.child_count();
            if remaining != 0 {
                return Err(RenderCoreError::HostChildrenLeftBehind {
                    host: id,
                    remaining,
                });
            }
        }

        self.unbind_item(id)?;

        let item = self.items.require(id)?;
        let node = item.node().clone();
        let host_id = item.host_id();
        let mut delegated = false;
        if let Some(host_id) = host_id {
            let host_content = self.items.require(host_id)?.content().clone();
            let host = host_content
                .as_host()
                .ok_or(RenderCoreError::NotAHost { id: host_id })?;
            let child = item.host_child();
            let position = item.position_in_host();
            match self.delegate.unmount_delegate_for(item.as_ref()) {
                Some(delegate) => {
                    log::trace!("unmount of {id} delegated");
                    self.delegate
                        .delegate_unmount(delegate, &self.items, host, position, &child)?;
                    delegated = true;
                }
                None => {
                    log::trace!("unmounting {id} from {host_id} at {position}");
                    if !host.unmount(position, &child) {
                        return Err(RenderCoreError::ChildNotInHost {
                            host: host_id,
                            child: id,
                            position,
                        });
                    }
                }
            }
        }

        let item = self.items.require(id)?;
        self.delegate
            .on_item(ItemEvent::Unmount, &self.items, item.as_ref())?;
        let context = bind_context(&self.scope, &self.binder_observer, &self.config);
        let item = self.items.require_mut(id)?;
        node.render_unit().unmount_binders(
            context,
            &content,
            node.layout_data_ref(),
            &mut item.bind_data,
        )?;
        if node.resolved_padding().is_some() {
            content.set_padding(EdgeInsets::ZERO);
        }
        self.items.remove(id);

        if host_id.is_some() && !delegated {
            self.pool
                .release_content(&self.scope, node.render_unit().allocator().as_ref(), content)?;
        }
        Ok(())
    }

    /// Applies mount and unmount requests extensions queued outside a pass.
    fn process_requests(&mut self) -> Result<(), RenderCoreError> {
        while let Some(request) = self.delegate.next_request() {
            match request {
                MountRequest::Mount(id) => {
                    if self.delegate.core().maybe_lock_for_mount(id) {
                        self.mount_by_id(id)?;
                    }
                }
                MountRequest::Unmount(id) => {
                    if self.items.contains(id) && !self.delegate.core().maybe_lock_for_mount(id) {
                        self.unmount_item(id)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn mount_by_id(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        let Some(tree) = self.render_tree.clone() else {
            return Ok(());
        };
        match tree.index_of(id) {
            Some(index) if index > 0 && !self.items.contains(id) => {
                self.mount_render_unit(&tree, index, 0)
            }
            _ => Ok(()),
        }
    }

    /// Mounts one node of the current tree outside a full pass.
    pub fn notify_mount(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        self.run_guarded("notify_mount", |state| {
            state.mount_by_id(id)?;
            state.process_requests()
        })
    }

    /// Unmounts one node of the current tree outside a full pass.
    pub fn notify_unmount(&mut self, id: RenderUnitId) -> Result<(), RenderCoreError> {
        self.run_guarded("notify_unmount", |state| {
            if id != ROOT_HOST_ID && state.items.contains(id) {
                state.unmount_item(id)?;
            }
            state.process_requests()
        })
    }

    /// Tells extensions the visible part of the root host changed.
    pub fn notify_visible_bounds_changed(&mut self) -> Result<(), RenderCoreError> {
        self.run_guarded("notify_visible_bounds_changed", |state| {
            let visible_rect = state.local_visible_rect();
            state
                .delegate
                .notify_visible_bounds_changed(&state.items, visible_rect)?;
            state.process_requests()
        })
    }

    /// Runs attach binders of every mounted item that is not bound.
    pub fn attach(&mut self) -> Result<(), RenderCoreError> {
        self.run_guarded("attach", |state| {
            let Some(tree) = state.render_tree.clone() else {
                return Ok(());
            };
            for node in tree.nodes() {
                if state.items.contains(node.id()) {
                    state.bind_item(node.id())?;
                }
            }
            Ok(())
        })
    }

    /// Runs detach binders of every mounted item, children first.
    pub fn detach(&mut self) -> Result<(), RenderCoreError> {
        self.run_guarded("detach", |state| {
            if let Some(tree) = state.render_tree.clone() {
                for node in tree.nodes().iter().rev() {
                    if state.items.contains(node.id()) {
                        state.unbind_item(node.id())?;
                    }
                }
            }
            state.delegate.on_unbind(&state.items)?;
            state.needs_remount = true;
            Ok(())
        })
    }

    /// Unmounts everything including the root item and drops all
    /// extensions. The next mount starts from scratch.
    pub fn unmount_all_items(&mut self) -> Result<(), RenderCoreError> {
        self.run_guarded("unmount_all_items", |state| {
            if state.items.contains(ROOT_HOST_ID) {
                state.unmount_item(ROOT_HOST_ID)?;
            }
            state.delegate.unregister_all(&state.items)?;
            state.needs_remount = true;
            Ok(())
        })
    }

    pub fn has_items_to_premount(&self) -> bool {
        self.delegate.has_items_to_premount()
    }

    /// Lets an extension mount one item ahead of need.
    pub fn premount_next(&mut self) -> Result<bool, RenderCoreError> {
        self.run_guarded("premount_next", |state| {
            let premounted = state.delegate.premount_next(&state.items)?;
            state.process_requests()?;
            Ok(premounted)
        })
    }

    /// Premounts until nothing is left or `deadline` passes. Returns the
    /// number of items premounted.
    pub fn premount_until(&mut self, deadline: Instant) -> Result<usize, RenderCoreError> {
        let mut premounted = 0;
        while self.has_items_to_premount() && Instant::now() < deadline {
            if !self.premount_next()? {
                break;
            }
            premounted += 1;
        }
        Ok(premounted)
    }

    fn run_guarded<T>(
        &mut self,
        operation: &str,
        body: impl FnOnce(&mut Self) -> Result<T, RenderCoreError>,
    ) -> Result<T, RenderCoreError> {
        let result = MountingGuard::enter(&self.is_mounting).and_then(|_guard| body(self));
        if let Err(err) = &result {
            self.report_failure(operation, err);
        }
        result
    }

    fn report_failure(&self, operation: &str, err: &RenderCoreError) {
        let render_state_id = self
            .render_tree
            .as_ref()
            .map(|tree| tree.render_state_id().to_string())
            .unwrap_or_default();
        error_reporter::report(
            LogLevel::Error,
            ERROR_CATEGORY,
            &format!("{operation} failed: {err}"),
            Some(err),
            0,
            &[
                ("render_state_id", render_state_id),
                ("mounted_items", self.items.len().to_string()),
            ],
        );
    }

    fn local_visible_rect(&self) -> Option<Rect> {
        self.root_host
            .as_host()
            .and_then(|host| host.local_visible_rect())
    }

    pub fn root_host(&self) -> &Content {
        &self.root_host
    }

    pub fn scope(&self) -> &ContextScope {
        &self.scope
    }

    pub fn config(&self) -> &MountStateConfig {
        &self.config
    }

    pub fn render_tree(&self) -> Option<&Arc<RenderTree>> {
        self.render_tree.as_ref()
    }

    pub fn needs_remount(&self) -> bool {
        self.needs_remount
    }

    pub fn set_needs_remount(&mut self, needs_remount: bool) {
        self.needs_remount = needs_remount;
    }

    pub fn is_mounting(&self) -> bool {
        self.is_mounting.get()
    }

    pub fn mount_delegate(&self) -> &MountDelegate {
        &self.delegate
    }

    pub fn mounted_items(&self) -> &MountedItems {
        &self.items
    }

    pub fn set_binder_observer(&mut self, observer: Option<Rc<dyn BinderObserver>>) {
        self.binder_observer = observer;
    }

    pub fn set_render_tree_updated_listener(
        &mut self,
        listener: Option<Box<dyn FnMut(&Arc<RenderTree>)>>,
    ) {
        self.render_tree_updated_listener = listener;
    }

    /// Number of nodes in the current tree, root included.
    pub fn render_unit_count(&self) -> usize {
        self.render_tree.as_ref().map_or(0, |tree| tree.mount_count())
    }

    /// Number of mounted items, root included.
    pub fn mount_item_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_root_item(&self, index: usize) -> bool {
        index == 0
    }

    pub fn mount_item_at(&self, index: usize) -> Option<&MountItem> {
        let id = self.render_tree.as_ref()?.node_at(index)?.id();
        self.items.get(id)
    }

    pub fn mount_item_by_id(&self, id: RenderUnitId) -> Option<&MountItem> {
        self.items.get(id)
    }

    pub fn content_at(&self, index: usize) -> Option<&Content> {
        self.mount_item_at(index).map(MountItem::content)
    }

    pub fn content_by_id(&self, id: RenderUnitId) -> Option<&Content> {
        self.items.get(id).map(MountItem::content)
    }
}

#[cfg(test)]
#[path = "tests/mount_state_tests.rs"]
mod tests;
