//! Error types.

use thiserror::Error;

use crate::host::HostId;
use crate::types::ModelId;
use crate::view::Lifecycle;

/// Errors raised by host document operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host node {0:?} is no longer alive")]
    DeadNode(HostId),

    #[error("host node {0:?} is a text node and cannot hold children")]
    NotAContainer(HostId),

    #[error("appending {child:?} to {parent:?} would create a cycle")]
    Cycle { parent: HostId, child: HostId },
}

/// Errors raised while building, rendering or updating views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("model {0} does not exist")]
    UnknownModel(ModelId),

    #[error("model {model} is not a {expected} model")]
    KindMismatch {
        model: ModelId,
        expected: &'static str,
    },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("view for model {0} is not ready")]
    NotReady(ModelId),

    #[error("view for model {0} has been removed")]
    Removed(ModelId),

    #[error("view for model {model} cannot {operation} while {state:?}")]
    InvalidState {
        model: ModelId,
        operation: &'static str,
        state: Lifecycle,
    },

    #[error("failed to materialize a view for model {model}: {reason}")]
    Materialize { model: ModelId, reason: String },

    #[error("failed to spawn update task: {0}")]
    Spawn(String),
}
