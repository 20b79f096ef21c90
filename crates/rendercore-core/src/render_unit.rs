//! Render units: immutable descriptors of mountable content.

use crate::binder::{
    BindContext, BindData, BinderId, BinderKey, BinderType, DelegateBinder, KeyedCategory,
};
use crate::content::{Content, ContentAllocator, ContextScope, RenderType};
use crate::error::RenderCoreError;
use crate::host::HostView;
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Identity of a render unit across tree generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RenderUnitId(pub u64);

impl RenderUnitId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Id of the implicit root node. It is the host passed to the mount state.
pub const ROOT_HOST_ID: RenderUnitId = RenderUnitId(0);

/// Opaque per-node output of layout handed to binders.
///
/// Implemented for every `PartialEq + Debug` type, so equivalence is value
/// equality of the same concrete type.
pub trait LayoutData: Any + Send + Sync + fmt::Debug {
    fn equivalent_to(&self, other: &dyn LayoutData) -> bool;
}

impl<T: Any + Send + Sync + fmt::Debug + PartialEq> LayoutData for T {
    fn equivalent_to(&self, other: &dyn LayoutData) -> bool {
        let other: &dyn Any = other;
        other.downcast_ref::<T>().is_some_and(|other| other == self)
    }
}

impl dyn LayoutData {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

/// Equal-or-equivalent comparison of optional layout data.
pub fn layout_data_equivalent(
    current: Option<&Arc<dyn LayoutData>>,
    next: Option<&Arc<dyn LayoutData>>,
) -> bool {
    match (current, next) {
        (None, None) => true,
        (Some(current), Some(next)) => {
            Arc::ptr_eq(current, next) || current.equivalent_to(&**next)
        }
        _ => false,
    }
}

/// Immutable description of one piece of mountable content.
///
/// Render units are cheap and may be shared between trees; the content they
/// describe is created through the allocator and pooled separately.
pub struct RenderUnit {
    id: RenderUnitId,
    allocator: Arc<dyn ContentAllocator>,
    description: Option<&'static str>,
    fixed_mount_binders: Vec<DelegateBinder>,
    optional_mount_binders: IndexMap<BinderKey, DelegateBinder>,
    attach_binders: IndexMap<BinderKey, DelegateBinder>,
}

pub struct RenderUnitBuilder {
    unit: RenderUnit,
}

impl RenderUnitBuilder {
    pub fn fixed_mount_binder(mut self, binder: DelegateBinder) -> Self {
        self.unit.fixed_mount_binders.push(binder);
        self
    }

    /// Adds or replaces the optional mount binder with the same key.
    pub fn optional_mount_binder(mut self, binder: DelegateBinder) -> Self {
        self.unit
            .optional_mount_binders
            .insert(binder.key(), binder);
        self
    }

    pub fn attach_binder(mut self, binder: DelegateBinder) -> Self {
        self.unit.attach_binders.insert(binder.key(), binder);
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.unit.description = Some(description);
        self
    }

    pub fn build(self) -> RenderUnit {
        self.unit
    }
}

struct RootHostAllocator;

impl ContentAllocator for RootHostAllocator {
    fn create_content(&self, _scope: &ContextScope) -> Content {
        Content::new(HostView::new())
    }

    fn render_type(&self) -> RenderType {
        RenderType::View
    }

    fn pooling_disabled(&self) -> bool {
        true
    }
}

static ROOT_RENDER_UNIT: LazyLock<Arc<RenderUnit>> = LazyLock::new(|| {
    Arc::new(
        RenderUnit::builder(ROOT_HOST_ID, Arc::new(RootHostAllocator))
            .description("root host")
            .build(),
    )
});

impl RenderUnit {
    pub fn builder(id: RenderUnitId, allocator: Arc<dyn ContentAllocator>) -> RenderUnitBuilder {
        RenderUnitBuilder {
            unit: RenderUnit {
                id,
                allocator,
                description: None,
                fixed_mount_binders: Vec::new(),
                optional_mount_binders: IndexMap::new(),
                attach_binders: IndexMap::new(),
            },
        }
    }

    /// Render unit of the implicit root node.
    pub fn root() -> Arc<RenderUnit> {
        ROOT_RENDER_UNIT.clone()
    }

    #[inline]
    pub fn id(&self) -> RenderUnitId {
        self.id
    }

    pub fn render_type(&self) -> RenderType {
        self.allocator.render_type()
    }

    pub fn allocator(&self) -> &Arc<dyn ContentAllocator> {
        &self.allocator
    }

    pub fn description(&self) -> &'static str {
        self.description
            .unwrap_or_else(|| self.allocator.description())
    }

    pub fn fixed_mount_binders(&self) -> &[DelegateBinder] {
        &self.fixed_mount_binders
    }

    pub fn optional_mount_binder(&self, key: BinderKey) -> Option<&DelegateBinder> {
        self.optional_mount_binders.get(&key)
    }

    pub fn attach_binder(&self, key: BinderKey) -> Option<&DelegateBinder> {
        self.attach_binders.get(&key)
    }

    pub fn binder_count(&self) -> usize {
        self.fixed_mount_binders.len()
            + self.optional_mount_binders.len()
            + self.attach_binders.len()
    }

    /// True when content from `other`'s allocator can be reused for this unit.
    pub fn same_content_type(&self, other: &RenderUnit) -> bool {
        self.render_type() == other.render_type()
            && self.allocator.pool_key() == other.allocator.pool_key()
    }

    fn binder_id(&self, binder_type: BinderType, key: BinderKey) -> BinderId {
        BinderId {
            render_unit_id: self.id,
            binder_type,
            key,
        }
    }

    /// Runs fixed then optional mount binders, in order.
    pub fn mount_binders(
        &self,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: &mut BindData,
    ) -> Result<(), RenderCoreError> {
        for (index, binder) in self.fixed_mount_binders.iter().enumerate() {
            let id = self.binder_id(BinderType::Mount, binder.key());
            let data = binder.bind(id, context, content, layout_data)?;
            bind_data.set_fixed(index, data);
        }
        for binder in self.optional_mount_binders.values() {
            let id = self.binder_id(BinderType::Mount, binder.key());
            let data = binder.bind(id, context, content, layout_data)?;
            bind_data.set_keyed(KeyedCategory::OptionalMount, binder.key(), data);
        }
        Ok(())
    }

    /// Undoes [`Self::mount_binders`] in reverse order.
    pub fn unmount_binders(
        &self,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: &mut BindData,
    ) -> Result<(), RenderCoreError> {
        for binder in self.optional_mount_binders.values().rev() {
            let data = bind_data.take_keyed(KeyedCategory::OptionalMount, binder.key());
            self.unbind_one(binder, BinderType::Mount, context, content, layout_data, data)?;
        }
        for (index, binder) in self.fixed_mount_binders.iter().enumerate().rev() {
            let data = bind_data.take_fixed(index);
            self.unbind_one(binder, BinderType::Mount, context, content, layout_data, data)?;
        }
        bind_data.truncate_fixed(0);
        Ok(())
    }

    pub fn attach_binders(
        &self,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: &mut BindData,
    ) -> Result<(), RenderCoreError> {
        for binder in self.attach_binders.values() {
            let id = self.binder_id(BinderType::Attach, binder.key());
            let data = binder.bind(id, context, content, layout_data)?;
            bind_data.set_keyed(KeyedCategory::Attach, binder.key(), data);
        }
        Ok(())
    }

    pub fn detach_binders(
        &self,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: &mut BindData,
    ) -> Result<(), RenderCoreError> {
        for binder in self.attach_binders.values().rev() {
            let data = bind_data.take_keyed(KeyedCategory::Attach, binder.key());
            self.unbind_one(binder, BinderType::Attach, context, content, layout_data, data)?;
        }
        Ok(())
    }

    fn unbind_one(
        &self,
        binder: &DelegateBinder,
        binder_type: BinderType,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        data: Option<Box<dyn Any>>,
    ) -> Result<(), RenderCoreError> {
        let id = self.binder_id(binder_type, binder.key());
        match data {
            Some(data) => binder.unbind(id, context, content, layout_data, data),
            None => {
                log::trace!("{id} has no bind data, skipping unbind");
                Ok(())
            }
        }
    }

    /// Moves mounted content from `current`'s binders to `next`'s.
    ///
    /// Each category is diffed on its own and only binders that report a
    /// change are unbound and bound again. Attach binders are unbound before
    /// mount binders and bound after them, and only touched while the item
    /// is attached.
    #[allow(clippy::too_many_arguments)]
    pub fn update_binders(
        current: &RenderUnit,
        next: &RenderUnit,
        context: BindContext<'_>,
        content: &Content,
        current_layout_data: Option<&dyn LayoutData>,
        next_layout_data: Option<&dyn LayoutData>,
        bind_data: &mut BindData,
        is_attached: bool,
    ) -> Result<(), RenderCoreError> {
        let attach = diff_keyed(
            &current.attach_binders,
            &next.attach_binders,
            current_layout_data,
            next_layout_data,
        );
        let optional = diff_keyed(
            &current.optional_mount_binders,
            &next.optional_mount_binders,
            current_layout_data,
            next_layout_data,
        );
        let fixed = diff_fixed(
            &current.fixed_mount_binders,
            &next.fixed_mount_binders,
            current_layout_data,
            next_layout_data,
        );

        if is_attached {
            for binder in attach.unbind.iter().rev() {
                let data = bind_data.take_keyed(KeyedCategory::Attach, binder.key());
                current.unbind_one(
                    binder,
                    BinderType::Attach,
                    context,
                    content,
                    current_layout_data,
                    data,
                )?;
            }
        }
        for binder in optional.unbind.iter().rev() {
            let data = bind_data.take_keyed(KeyedCategory::OptionalMount, binder.key());
            current.unbind_one(
                binder,
                BinderType::Mount,
                context,
                content,
                current_layout_data,
                data,
            )?;
        }
        for &index in fixed.unbind.iter().rev() {
            let data = bind_data.take_fixed(index);
            current.unbind_one(
                &current.fixed_mount_binders[index],
                BinderType::Mount,
                context,
                content,
                current_layout_data,
                data,
            )?;
        }

        bind_data.truncate_fixed(next.fixed_mount_binders.len());
        for &index in &fixed.bind {
            let binder = &next.fixed_mount_binders[index];
            let id = next.binder_id(BinderType::Mount, binder.key());
            let data = binder.bind(id, context, content, next_layout_data)?;
            bind_data.set_fixed(index, data);
        }
        for binder in &optional.bind {
            let id = next.binder_id(BinderType::Mount, binder.key());
            let data = binder.bind(id, context, content, next_layout_data)?;
            bind_data.set_keyed(KeyedCategory::OptionalMount, binder.key(), data);
        }
        if is_attached {
            for binder in &attach.bind {
                let id = next.binder_id(BinderType::Attach, binder.key());
                let data = binder.bind(id, context, content, next_layout_data)?;
                bind_data.set_keyed(KeyedCategory::Attach, binder.key(), data);
            }
        }
        Ok(())
    }
}

struct KeyedDiff<'a> {
    unbind: SmallVec<[&'a DelegateBinder; 4]>,
    bind: SmallVec<[&'a DelegateBinder; 4]>,
}

fn diff_keyed<'a>(
    current: &'a IndexMap<BinderKey, DelegateBinder>,
    next: &'a IndexMap<BinderKey, DelegateBinder>,
    current_layout_data: Option<&dyn LayoutData>,
    next_layout_data: Option<&dyn LayoutData>,
) -> KeyedDiff<'a> {
    let mut diff = KeyedDiff {
        unbind: SmallVec::new(),
        bind: SmallVec::new(),
    };
    for (key, binder) in current {
        match next.get(key) {
            None => diff.unbind.push(binder),
            Some(next_binder) => {
                if binder.should_update(next_binder, current_layout_data, next_layout_data) {
                    diff.unbind.push(binder);
                }
            }
        }
    }
    for (key, binder) in next {
        match current.get(key) {
            None => diff.bind.push(binder),
            Some(current_binder) => {
                if current_binder.should_update(binder, current_layout_data, next_layout_data) {
                    diff.bind.push(binder);
                }
            }
        }
    }
    diff
}

struct FixedDiff {
    unbind: SmallVec<[usize; 4]>,
    bind: SmallVec<[usize; 4]>,
}

fn diff_fixed(
    current: &[DelegateBinder],
    next: &[DelegateBinder],
    current_layout_data: Option<&dyn LayoutData>,
    next_layout_data: Option<&dyn LayoutData>,
) -> FixedDiff {
    let mut diff = FixedDiff {
        unbind: SmallVec::new(),
        bind: SmallVec::new(),
    };
    for index in 0..current.len().max(next.len()) {
        match (current.get(index), next.get(index)) {
            (Some(current), Some(next)) => {
                if current.key() != next.key()
                    || current.should_update(next, current_layout_data, next_layout_data)
                {
                    diff.unbind.push(index);
                    diff.bind.push(index);
                }
            }
            (Some(_), None) => diff.unbind.push(index),
            (None, Some(_)) => diff.bind.push(index),
            (None, None) => {}
        }
    }
    diff
}

impl fmt::Debug for RenderUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderUnit")
            .field("id", &self.id)
            .field("description", &self.description())
            .field("binders", &self.binder_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/render_unit_tests.rs"]
mod tests;
