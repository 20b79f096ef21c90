use crate::binder::{BinderError, BinderId};
use crate::pool::PoolError;
use crate::render_unit::RenderUnitId;
use std::fmt;

/// Failure raised by the mount engine.
///
/// Structural and re-entrancy violations are programmer errors; they abort
/// the current pass instead of leaving a partially reconciled hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCoreError {
    AlreadyMounting,
    MissingRootNode,
    DuplicateRenderUnitId {
        id: RenderUnitId,
        first_index: usize,
        second_index: usize,
    },
    InvalidParentIndex {
        index: usize,
        parent: usize,
    },
    ItemNotFound {
        id: RenderUnitId,
    },
    NotAHost {
        id: RenderUnitId,
    },
    ParentNotMounted {
        id: RenderUnitId,
        parent: RenderUnitId,
    },
    UntrackedHostChild {
        host: RenderUnitId,
        child: RenderUnitId,
    },
    HostChildrenLeftBehind {
        host: RenderUnitId,
        remaining: usize,
    },
    ChildNotInHost {
        host: RenderUnitId,
        child: RenderUnitId,
        position: usize,
    },
    ParentMountDepthExceeded {
        id: RenderUnitId,
        limit: usize,
    },
    ReferenceCountUnderflow {
        id: RenderUnitId,
    },
    ReferenceAlreadyOwned {
        extension: &'static str,
        id: RenderUnitId,
    },
    ReferenceNotOwned {
        extension: &'static str,
        id: RenderUnitId,
    },
    ContentTypeMismatch {
        binder: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    BindDataMismatch {
        binder: &'static str,
    },
    Binder {
        binder: &'static str,
        source: BinderError,
    },
    BinderObserverContract {
        binder: BinderId,
        calls: u32,
    },
    PoolRelease {
        content_type: &'static str,
        source: PoolError,
    },
    Extension {
        extension: &'static str,
        message: String,
    },
}

impl RenderCoreError {
    pub fn extension(extension: &'static str, message: impl Into<String>) -> Self {
        RenderCoreError::Extension {
            extension,
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderCoreError::AlreadyMounting => {
                write!(f, "mount was called while a mount pass is already running")
            }
            RenderCoreError::MissingRootNode => {
                write!(f, "render tree does not start with the root host node")
            }
            RenderCoreError::DuplicateRenderUnitId {
                id,
                first_index,
                second_index,
            } => write!(
                f,
                "render unit id {id} appears at index {first_index} and {second_index}"
            ),
            RenderCoreError::InvalidParentIndex { index, parent } => {
                write!(f, "node {index} has parent index {parent} that does not precede it")
            }
            RenderCoreError::ItemNotFound { id } => {
                write!(f, "no mounted item tracked for render unit {id}")
            }
            RenderCoreError::NotAHost { id } => {
                write!(f, "content of render unit {id} is not a host")
            }
            RenderCoreError::ParentNotMounted { id, parent } => {
                write!(f, "parent {parent} of render unit {id} is not mounted")
            }
            RenderCoreError::UntrackedHostChild { host, child } => {
                write!(f, "host {host} holds child {child} which is not tracked")
            }
            RenderCoreError::HostChildrenLeftBehind { host, remaining } => {
                write!(f, "host {host} still holds {remaining} children after unmount")
            }
            RenderCoreError::ChildNotInHost {
                host,
                child,
                position,
            } => write!(f, "{child} was not found in host {host} at {position}"),
            RenderCoreError::ParentMountDepthExceeded { id, limit } => write!(
                f,
                "mounting ancestors of render unit {id} exceeded depth limit {limit}"
            ),
            RenderCoreError::ReferenceCountUnderflow { id } => {
                write!(f, "mount reference for render unit {id} released below zero")
            }
            RenderCoreError::ReferenceAlreadyOwned { extension, id } => {
                write!(f, "{extension} already holds a mount reference for {id}")
            }
            RenderCoreError::ReferenceNotOwned { extension, id } => {
                write!(f, "{extension} does not hold a mount reference for {id}")
            }
            RenderCoreError::ContentTypeMismatch {
                binder,
                expected,
                actual,
            } => write!(f, "binder {binder} expects {expected} but got {actual}"),
            RenderCoreError::BindDataMismatch { binder } => {
                write!(f, "bind data handed to {binder} has an unexpected type")
            }
            RenderCoreError::Binder { binder, source } => {
                write!(f, "binder {binder} failed: {source}")
            }
            RenderCoreError::BinderObserverContract { binder, calls } => write!(
                f,
                "binder observer ran {binder} {calls} times instead of exactly once"
            ),
            RenderCoreError::PoolRelease {
                content_type,
                source,
            } => write!(f, "releasing {content_type} to its pool failed: {source}"),
            RenderCoreError::Extension { extension, message } => {
                write!(f, "extension {extension} failed: {message}")
            }
        }
    }
}

impl std::error::Error for RenderCoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderCoreError::Binder { source, .. } => Some(source),
            RenderCoreError::PoolRelease { source, .. } => Some(source),
            _ => None,
        }
    }
}
