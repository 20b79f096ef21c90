use rendercore_core::RenderCoreError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderStateError {
    /// Layout was requested before any tree was set.
    NoTree,
    /// Layout was requested before any size constraints were set.
    NoSizeConstraints,
    /// The computation was released before it produced a result.
    Released { stage: &'static str },
    Reduce(RenderCoreError),
}

impl fmt::Display for RenderStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStateError::NoTree => write!(f, "no tree has been set"),
            RenderStateError::NoSizeConstraints => write!(f, "no size constraints have been set"),
            RenderStateError::Released { stage } => write!(f, "{stage} was released before finishing"),
            RenderStateError::Reduce(err) => write!(f, "reducing the layout failed: {err}"),
        }
    }
}

impl std::error::Error for RenderStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderStateError::Reduce(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderCoreError> for RenderStateError {
    fn from(err: RenderCoreError) -> Self {
        RenderStateError::Reduce(err)
    }
}
