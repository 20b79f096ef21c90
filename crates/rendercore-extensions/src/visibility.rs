//! Visibility events for tagged layout results.
//!
//! Layout results opt in by exposing [`VisibilityHandlers`] as extension
//! data. After every mount pass, and whenever the visible rect of the root
//! host changes, each tagged result's bounds are intersected with that rect
//! and the handlers are told about transitions.

use rendercore_core::{
    AnyMountExtension, ExtensionInput, ExtensionState, LayoutVisitor, MountExtension, Rect,
    RenderCoreError, RenderCoreExtension, VisitedNode,
};
use rendercore_layout::collections::map::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityChangedEvent {
    /// Visible part of the result in root host coordinates. Empty once the
    /// result is invisible.
    pub visible_rect: Rect,
    pub percent_visible_width: f32,
    pub percent_visible_height: f32,
}

impl VisibilityChangedEvent {
    fn invisible() -> Self {
        Self {
            visible_rect: Rect::ZERO,
            percent_visible_width: 0.0,
            percent_visible_height: 0.0,
        }
    }

    fn of(bounds: &Rect, visible_rect: Rect) -> Self {
        Self {
            visible_rect,
            percent_visible_width: percent(visible_rect.width, bounds.width),
            percent_visible_height: percent(visible_rect.height, bounds.height),
        }
    }
}

fn percent(visible: f32, total: f32) -> f32 {
    if total <= 0.0 {
        100.0
    } else {
        (visible / total * 100.0).min(100.0)
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;
type ChangedCallback = Arc<dyn Fn(&VisibilityChangedEvent) + Send + Sync>;

/// Callbacks attached to one layout result. `key` identifies the result
/// across trees.
#[derive(Clone)]
pub struct VisibilityHandlers {
    key: u64,
    on_visible: Option<Callback>,
    on_invisible: Option<Callback>,
    on_full_impression: Option<Callback>,
    on_visibility_changed: Option<ChangedCallback>,
}

impl VisibilityHandlers {
    pub fn new(key: u64) -> Self {
        Self {
            key,
            on_visible: None,
            on_invisible: None,
            on_full_impression: None,
            on_visibility_changed: None,
        }
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn on_visible(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_visible = Some(Arc::new(callback));
        self
    }

    pub fn on_invisible(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_invisible = Some(Arc::new(callback));
        self
    }

    /// Fires the first time the whole result is inside the visible rect.
    pub fn on_full_impression(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_full_impression = Some(Arc::new(callback));
        self
    }

    pub fn on_visibility_changed(
        mut self,
        callback: impl Fn(&VisibilityChangedEvent) + Send + Sync + 'static,
    ) -> Self {
        self.on_visibility_changed = Some(Arc::new(callback));
        self
    }

    fn dispatch_visible(&self) {
        if let Some(callback) = &self.on_visible {
            callback();
        }
    }

    fn dispatch_invisible(&self) {
        if let Some(callback) = &self.on_invisible {
            callback();
        }
    }

    fn dispatch_full_impression(&self) {
        if let Some(callback) = &self.on_full_impression {
            callback();
        }
    }

    fn dispatch_changed(&self, event: &VisibilityChangedEvent) {
        if let Some(callback) = &self.on_visibility_changed {
            callback(event);
        }
    }
}

impl fmt::Debug for VisibilityHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityHandlers")
            .field("key", &self.key)
            .field("on_visible", &self.on_visible.is_some())
            .field("on_invisible", &self.on_invisible.is_some())
            .field("on_full_impression", &self.on_full_impression.is_some())
            .field("on_visibility_changed", &self.on_visibility_changed.is_some())
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct VisibilityOutput {
    pub key: u64,
    /// Bounds in root host coordinates.
    pub bounds: Rect,
    pub handlers: VisibilityHandlers,
}

#[derive(Clone, Debug, Default)]
pub struct VisibilityInput {
    outputs: Vec<VisibilityOutput>,
}

impl VisibilityInput {
    pub fn outputs(&self) -> &[VisibilityOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct VisibilityExtension;

impl VisibilityExtension {
    pub fn new() -> Self {
        Self
    }
}

impl RenderCoreExtension for VisibilityExtension {
    fn name(&self) -> &'static str {
        "Visibility"
    }

    fn create_layout_visitor(&self) -> Option<Box<dyn LayoutVisitor>> {
        Some(Box::new(HandlerCollector::default()))
    }

    fn create_mount_extension(&self) -> Option<Box<dyn AnyMountExtension>> {
        Some(VisibilityMount.into_any())
    }
}

#[derive(Default)]
struct HandlerCollector {
    outputs: Vec<VisibilityOutput>,
}

impl LayoutVisitor for HandlerCollector {
    fn visit(&mut self, node: &VisitedNode<'_>) {
        if let Some(handlers) = node.layout.extension_data_of::<VisibilityHandlers>() {
            self.outputs.push(VisibilityOutput {
                key: handlers.key(),
                bounds: node.absolute_bounds,
                handlers: handlers.clone(),
            });
        }
    }

    fn finish(self: Box<Self>) -> Option<ExtensionInput> {
        Some(Arc::new(VisibilityInput {
            outputs: self.outputs,
        }))
    }
}

struct Tracked {
    handlers: VisibilityHandlers,
    full_impression: bool,
    visible_rect: Rect,
}

#[derive(Default)]
struct VisibilityState {
    input: Option<Arc<VisibilityInput>>,
    visible_rect: Option<Rect>,
    tracked: HashMap<u64, Tracked>,
}

impl VisibilityState {
    fn process(&mut self) {
        let (Some(input), Some(visible_rect)) = (self.input.clone(), self.visible_rect) else {
            return;
        };
        let mut seen = Vec::with_capacity(input.len());
        for output in input.outputs() {
            seen.push(output.key);
            let visible_part = visible_part(&visible_rect, &output.bounds);
            match (self.tracked.get_mut(&output.key), visible_part) {
                (None, Some(part)) => {
                    let full = is_fully_visible(&output.bounds, &part);
                    log::trace!("visibility key {} became visible", output.key);
                    output.handlers.dispatch_visible();
                    if full {
                        output.handlers.dispatch_full_impression();
                    }
                    output
                        .handlers
                        .dispatch_changed(&VisibilityChangedEvent::of(&output.bounds, part));
                    self.tracked.insert(
                        output.key,
                        Tracked {
                            handlers: output.handlers.clone(),
                            full_impression: full,
                            visible_rect: part,
                        },
                    );
                }
                (Some(tracked), Some(part)) => {
                    tracked.handlers = output.handlers.clone();
                    if !tracked.full_impression && is_fully_visible(&output.bounds, &part) {
                        tracked.full_impression = true;
                        tracked.handlers.dispatch_full_impression();
                    }
                    if tracked.visible_rect != part {
                        tracked.visible_rect = part;
                        tracked
                            .handlers
                            .dispatch_changed(&VisibilityChangedEvent::of(&output.bounds, part));
                    }
                }
                (Some(_), None) => {
                    if let Some(tracked) = self.tracked.remove(&output.key) {
                        became_invisible(output.key, &tracked);
                    }
                }
                (None, None) => {}
            }
        }

        let gone: Vec<u64> = self
            .tracked
            .keys()
            .copied()
            .filter(|key| !seen.contains(key))
            .collect();
        for key in gone {
            if let Some(tracked) = self.tracked.remove(&key) {
                became_invisible(key, &tracked);
            }
        }
    }

    fn clear(&mut self) {
        for (key, tracked) in self.tracked.drain() {
            became_invisible(key, &tracked);
        }
    }
}

fn became_invisible(key: u64, tracked: &Tracked) {
    log::trace!("visibility key {key} became invisible");
    tracked.handlers.dispatch_invisible();
    tracked
        .handlers
        .dispatch_changed(&VisibilityChangedEvent::invisible());
}

fn visible_part(visible_rect: &Rect, bounds: &Rect) -> Option<Rect> {
    if bounds.is_empty() {
        return visible_rect
            .contains(bounds.x, bounds.y)
            .then_some(*bounds);
    }
    visible_rect.intersection(bounds)
}

fn is_fully_visible(bounds: &Rect, part: &Rect) -> bool {
    part.width >= bounds.width && part.height >= bounds.height
}

struct VisibilityMount;

impl MountExtension for VisibilityMount {
    type Input = VisibilityInput;
    type State = VisibilityState;

    fn name(&self) -> &'static str {
        "Visibility"
    }

    fn create_state(&self) -> Self::State {
        VisibilityState::default()
    }

    fn before_mount(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        input: Option<Arc<VisibilityInput>>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        let current = state.state_mut();
        current.input = input;
        current.visible_rect = local_visible_rect;
        Ok(())
    }

    fn after_mount(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        state.state_mut().process();
        Ok(())
    }

    fn on_visible_bounds_changed(
        &self,
        state: &mut ExtensionState<'_, Self::State>,
        local_visible_rect: Option<Rect>,
    ) -> Result<(), RenderCoreError> {
        let current = state.state_mut();
        current.visible_rect = local_visible_rect;
        current.process();
        Ok(())
    }

    fn on_unbind(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        state.state_mut().clear();
        Ok(())
    }

    fn on_unmount(&self, state: &mut ExtensionState<'_, Self::State>) -> Result<(), RenderCoreError> {
        let current = state.state_mut();
        current.clear();
        current.input = None;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/visibility_tests.rs"]
mod tests;
