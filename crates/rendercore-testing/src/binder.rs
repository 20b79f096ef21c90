use crate::content::{Operation, OperationLog};
use rendercore_core::{
    Binder, BinderError, BinderKey, Content, ContextScope, DelegateBinder, LayoutData,
};

/// Binds a number to any content and logs each bind and unbind.
pub struct RecordingBinder {
    name: &'static str,
    log: OperationLog,
}

impl RecordingBinder {
    pub fn new(name: &'static str, log: OperationLog) -> Self {
        Self { name, log }
    }
}

impl Binder for RecordingBinder {
    type Model = u32;
    type Content = Content;
    type BindData = u32;

    fn should_update(
        &self,
        current: &u32,
        next: &u32,
        _current_layout_data: Option<&dyn LayoutData>,
        _next_layout_data: Option<&dyn LayoutData>,
    ) -> bool {
        current != next
    }

    fn bind(
        &self,
        _scope: &ContextScope,
        _content: &Content,
        model: &u32,
        _layout_data: Option<&dyn LayoutData>,
    ) -> Result<u32, BinderError> {
        self.log.push(Operation::Bind {
            binder: self.name,
            model: *model,
        });
        Ok(*model)
    }

    fn unbind(
        &self,
        _scope: &ContextScope,
        _content: &Content,
        _model: &u32,
        _layout_data: Option<&dyn LayoutData>,
        bound: u32,
    ) -> Result<(), BinderError> {
        self.log.push(Operation::Unbind {
            binder: self.name,
            model: bound,
        });
        Ok(())
    }

    fn description(&self) -> &'static str {
        self.name
    }
}

/// A [`RecordingBinder`] keyed by its name.
pub fn recording_binder(log: &OperationLog, name: &'static str, model: u32) -> DelegateBinder {
    DelegateBinder::new(model, RecordingBinder::new(name, log.clone()))
        .with_key(BinderKey::Named(name))
}
