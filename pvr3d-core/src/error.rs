/// Resource manager error taxonomy
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::obj::ObjError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
    Model,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Texture => f.write_str("texture"),
            ResourceKind::Model => f.write_str("model"),
        }
    }
}

/// Why a load, free or render was rejected. The operation left no state behind.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("cannot allocate more than {limit} {kind}s")]
    CapacityExhausted { kind: ResourceKind, limit: usize },

    #[error("couldn't open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} holds {actual} bytes, expected exactly {expected}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ObjError,
    },

    #[error("invalid {kind} handle {handle}")]
    InvalidHandle { kind: ResourceKind, handle: String },
}

impl ResourceError {
    pub(crate) fn invalid_handle(kind: ResourceKind, handle: impl fmt::Display) -> Self {
        ResourceError::InvalidHandle {
            kind,
            handle: handle.to_string(),
        }
    }
}
