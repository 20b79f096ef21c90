//! Binders: paired bind/unbind callbacks attached to a render unit.
//!
//! A [`Binder`] is written against concrete model and content types. The
//! render unit stores it type-erased as a [`DelegateBinder`] together with
//! the model it binds, and whatever `bind` returns is kept in the mount
//! item's [`BindData`] until the matching `unbind` consumes it.

use crate::collections::map::HashMap;
use crate::content::{Content, ContextScope};
use crate::error::RenderCoreError;
use crate::render_unit::{LayoutData, RenderUnitId};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Error returned by a binder's own callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderError {
    message: String,
}

impl BinderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BinderError {}

pub trait Binder: Send + Sync + 'static {
    type Model: Send + Sync + 'static;
    /// Content type the binder works on. Use [`Content`] to accept any.
    type Content: 'static;
    type BindData: 'static;

    fn should_update(
        &self,
        current: &Self::Model,
        next: &Self::Model,
        current_layout_data: Option<&dyn LayoutData>,
        next_layout_data: Option<&dyn LayoutData>,
    ) -> bool;

    fn bind(
        &self,
        scope: &ContextScope,
        content: &Self::Content,
        model: &Self::Model,
        layout_data: Option<&dyn LayoutData>,
    ) -> Result<Self::BindData, BinderError>;

    fn unbind(
        &self,
        scope: &ContextScope,
        content: &Self::Content,
        model: &Self::Model,
        layout_data: Option<&dyn LayoutData>,
        bind_data: Self::BindData,
    ) -> Result<(), BinderError>;

    fn description(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// Addresses a binder inside the optional and attach binder maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinderKey {
    Type(TypeId),
    Explicit(u64),
    Named(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinderType {
    Mount,
    Attach,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BinderId {
    pub render_unit_id: RenderUnitId,
    pub binder_type: BinderType,
    pub key: BinderKey,
}

impl fmt::Display for BinderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} binder {:?} of {}",
            self.binder_type, self.key, self.render_unit_id
        )
    }
}

/// Wraps every bind and unbind call. `func` must be invoked exactly once.
pub trait BinderObserver {
    fn observe_bind(&self, id: &BinderId, func: &mut dyn FnMut());

    fn observe_unbind(&self, id: &BinderId, func: &mut dyn FnMut());
}

/// Everything a binder call needs besides the content and layout data.
#[derive(Clone, Copy)]
pub struct BindContext<'a> {
    pub scope: &'a ContextScope,
    pub observer: Option<&'a dyn BinderObserver>,
    /// Fail the pass when an observer skips or repeats a call.
    pub strict_observer: bool,
}

impl<'a> BindContext<'a> {
    pub fn new(scope: &'a ContextScope) -> Self {
        Self {
            scope,
            observer: None,
            strict_observer: cfg!(debug_assertions),
        }
    }

    pub fn with_observer(mut self, observer: Option<&'a dyn BinderObserver>) -> Self {
        self.observer = observer;
        self
    }
}

pub(crate) trait ErasedBinder: Send + Sync {
    fn should_update(
        &self,
        next: &dyn ErasedBinder,
        current_layout_data: Option<&dyn LayoutData>,
        next_layout_data: Option<&dyn LayoutData>,
    ) -> bool;

    fn bind(
        &self,
        scope: &ContextScope,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
    ) -> Result<Box<dyn Any>, RenderCoreError>;

    fn unbind(
        &self,
        scope: &ContextScope,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: Box<dyn Any>,
    ) -> Result<(), RenderCoreError>;

    fn description(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}

struct ModelBinder<B: Binder> {
    model: B::Model,
    binder: B,
}

/// Resolves the binder's content type, either the handle itself or the
/// object behind it.
fn content_as<T: 'static>(content: &Content) -> Option<&T> {
    let handle: &dyn Any = content;
    handle
        .downcast_ref::<T>()
        .or_else(|| content.downcast_ref::<T>())
}

impl<B: Binder> ModelBinder<B> {
    fn typed_content<'c>(&self, content: &'c Content) -> Result<&'c B::Content, RenderCoreError> {
        content_as::<B::Content>(content).ok_or_else(|| RenderCoreError::ContentTypeMismatch {
            binder: self.binder.description(),
            expected: type_name::<B::Content>(),
            actual: content.type_name(),
        })
    }
}

impl<B: Binder> ErasedBinder for ModelBinder<B> {
    fn should_update(
        &self,
        next: &dyn ErasedBinder,
        current_layout_data: Option<&dyn LayoutData>,
        next_layout_data: Option<&dyn LayoutData>,
    ) -> bool {
        match next.as_any().downcast_ref::<ModelBinder<B>>() {
            Some(next) => self.binder.should_update(
                &self.model,
                &next.model,
                current_layout_data,
                next_layout_data,
            ),
            None => true,
        }
    }

    fn bind(
        &self,
        scope: &ContextScope,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
    ) -> Result<Box<dyn Any>, RenderCoreError> {
        let content = self.typed_content(content)?;
        self.binder
            .bind(scope, content, &self.model, layout_data)
            .map(|data| Box::new(data) as Box<dyn Any>)
            .map_err(|source| RenderCoreError::Binder {
                binder: self.binder.description(),
                source,
            })
    }

    fn unbind(
        &self,
        scope: &ContextScope,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: Box<dyn Any>,
    ) -> Result<(), RenderCoreError> {
        let content = self.typed_content(content)?;
        let bind_data = bind_data
            .downcast::<B::BindData>()
            .map_err(|_| RenderCoreError::BindDataMismatch {
                binder: self.binder.description(),
            })?;
        self.binder
            .unbind(scope, content, &self.model, layout_data, *bind_data)
            .map_err(|source| RenderCoreError::Binder {
                binder: self.binder.description(),
                source,
            })
    }

    fn description(&self) -> &'static str {
        self.binder.description()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A binder paired with the model it binds.
#[derive(Clone)]
pub struct DelegateBinder {
    key: BinderKey,
    inner: Arc<dyn ErasedBinder>,
}

impl DelegateBinder {
    /// Keyed by the binder's type.
    pub fn new<B: Binder>(model: B::Model, binder: B) -> Self {
        Self {
            key: BinderKey::Type(TypeId::of::<B>()),
            inner: Arc::new(ModelBinder { model, binder }),
        }
    }

    pub fn with_key(mut self, key: BinderKey) -> Self {
        self.key = key;
        self
    }

    pub fn key(&self) -> BinderKey {
        self.key
    }

    pub fn description(&self) -> &'static str {
        self.inner.description()
    }

    pub(crate) fn should_update(
        &self,
        next: &DelegateBinder,
        current_layout_data: Option<&dyn LayoutData>,
        next_layout_data: Option<&dyn LayoutData>,
    ) -> bool {
        self.inner
            .should_update(&*next.inner, current_layout_data, next_layout_data)
    }

    /// Runs `bind`, routed through the observer when one is installed.
    pub(crate) fn bind(
        &self,
        id: BinderId,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
    ) -> Result<Option<Box<dyn Any>>, RenderCoreError> {
        let Some(observer) = context.observer else {
            return self
                .inner
                .bind(context.scope, content, layout_data)
                .map(Some);
        };
        let mut calls = 0u32;
        let mut result = None;
        observer.observe_bind(&id, &mut || {
            calls += 1;
            if calls == 1 {
                result = Some(self.inner.bind(context.scope, content, layout_data));
            }
        });
        check_observer_calls(id, calls, context.strict_observer)?;
        result.transpose()
    }

    pub(crate) fn unbind(
        &self,
        id: BinderId,
        context: BindContext<'_>,
        content: &Content,
        layout_data: Option<&dyn LayoutData>,
        bind_data: Box<dyn Any>,
    ) -> Result<(), RenderCoreError> {
        let Some(observer) = context.observer else {
            return self
                .inner
                .unbind(context.scope, content, layout_data, bind_data);
        };
        let mut calls = 0u32;
        let mut bind_data = Some(bind_data);
        let mut result = Ok(());
        observer.observe_unbind(&id, &mut || {
            calls += 1;
            if let Some(data) = bind_data.take() {
                result = self
                    .inner
                    .unbind(context.scope, content, layout_data, data);
            }
        });
        check_observer_calls(id, calls, context.strict_observer)?;
        result
    }
}

fn check_observer_calls(id: BinderId, calls: u32, strict: bool) -> Result<(), RenderCoreError> {
    if calls == 1 {
        return Ok(());
    }
    if strict {
        return Err(RenderCoreError::BinderObserverContract { binder: id, calls });
    }
    log::warn!("binder observer ran {id} {calls} times");
    Ok(())
}

impl fmt::Debug for DelegateBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateBinder")
            .field("key", &self.key)
            .field("binder", &self.inner.description())
            .finish()
    }
}

/// Binder built from two closures. Rebinds whenever the model changes.
pub struct FnBinder<M, C, D> {
    name: &'static str,
    bind: Box<dyn Fn(&C, &M) -> D + Send + Sync>,
    unbind: Box<dyn Fn(&C, &M, D) + Send + Sync>,
    _marker: PhantomData<fn() -> (M, D)>,
}

impl<M, C, D> FnBinder<M, C, D> {
    pub fn new(
        name: &'static str,
        bind: impl Fn(&C, &M) -> D + Send + Sync + 'static,
        unbind: impl Fn(&C, &M, D) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            bind: Box::new(bind),
            unbind: Box::new(unbind),
            _marker: PhantomData,
        }
    }
}

impl<M, C, D> Binder for FnBinder<M, C, D>
where
    M: PartialEq + Send + Sync + 'static,
    C: 'static,
    D: 'static,
{
    type Model = M;
    type Content = C;
    type BindData = D;

    fn should_update(
        &self,
        current: &M,
        next: &M,
        _current_layout_data: Option<&dyn LayoutData>,
        _next_layout_data: Option<&dyn LayoutData>,
    ) -> bool {
        current != next
    }

    fn bind(
        &self,
        _scope: &ContextScope,
        content: &C,
        model: &M,
        _layout_data: Option<&dyn LayoutData>,
    ) -> Result<D, BinderError> {
        Ok((self.bind)(content, model))
    }

    fn unbind(
        &self,
        _scope: &ContextScope,
        content: &C,
        model: &M,
        _layout_data: Option<&dyn LayoutData>,
        bind_data: D,
    ) -> Result<(), BinderError> {
        (self.unbind)(content, model, bind_data);
        Ok(())
    }

    fn description(&self) -> &'static str {
        self.name
    }
}

/// Data stashed by bind calls of one mounted item, waiting for unbind.
#[derive(Default)]
pub struct BindData {
    fixed: Vec<Option<Box<dyn Any>>>,
    optional: HashMap<BinderKey, Box<dyn Any>>,
    attach: HashMap<BinderKey, Box<dyn Any>>,
}

impl BindData {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_fixed(&mut self, index: usize, data: Option<Box<dyn Any>>) {
        if self.fixed.len() <= index {
            self.fixed.resize_with(index + 1, || None);
        }
        self.fixed[index] = data;
    }

    pub(crate) fn take_fixed(&mut self, index: usize) -> Option<Box<dyn Any>> {
        self.fixed.get_mut(index).and_then(Option::take)
    }

    pub(crate) fn truncate_fixed(&mut self, len: usize) {
        self.fixed.truncate(len);
    }

    pub(crate) fn set_keyed(
        &mut self,
        binder_type: KeyedCategory,
        key: BinderKey,
        data: Option<Box<dyn Any>>,
    ) {
        let map = self.keyed_mut(binder_type);
        match data {
            Some(data) => {
                map.insert(key, data);
            }
            None => {
                map.remove(&key);
            }
        }
    }

    pub(crate) fn take_keyed(
        &mut self,
        binder_type: KeyedCategory,
        key: BinderKey,
    ) -> Option<Box<dyn Any>> {
        self.keyed_mut(binder_type).remove(&key)
    }

    fn keyed_mut(&mut self, category: KeyedCategory) -> &mut HashMap<BinderKey, Box<dyn Any>> {
        match category {
            KeyedCategory::OptionalMount => &mut self.optional,
            KeyedCategory::Attach => &mut self.attach,
        }
    }

    /// Entries still waiting for their unbind call.
    pub fn pending_len(&self) -> usize {
        self.fixed.iter().filter(|data| data.is_some()).count()
            + self.optional.len()
            + self.attach.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }
}

impl fmt::Debug for BindData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindData")
            .field("pending", &self.pending_len())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum KeyedCategory {
    OptionalMount,
    Attach,
}

#[cfg(test)]
#[path = "tests/binder_tests.rs"]
mod tests;
