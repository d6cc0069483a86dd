use thiserror::Error;

use crate::model::ConstraintId;

/// Top-level error type for the space constraint solver.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} must be positive")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised by the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Malformed solver input, detected while building the constraint graph.
///
/// These indicate a broken scene description rather than an unsatisfiable
/// one, so they are never downgraded to a solve outcome.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("constraint {constraint:?} references a face that is not in the store")]
    UnknownFace { constraint: ConstraintId },

    #[error("constraint {constraint:?} references a face whose body is not in the store")]
    UnknownBody { constraint: ConstraintId },

    #[error("constraint {constraint:?} joins two faces of the same body")]
    SelfConstraint { constraint: ConstraintId },

    #[error("constraint {constraint:?} has a non-finite value")]
    NonFiniteValue { constraint: ConstraintId },

    #[error("constraint {constraint:?} joins faces with non-parallel normals (sin = {angle_sin})")]
    IncompatibleNormals {
        constraint: ConstraintId,
        angle_sin: f64,
    },
}

impl BuildError {
    /// Returns the constraint that failed to build.
    #[must_use]
    pub fn constraint(&self) -> ConstraintId {
        match self {
            Self::UnknownFace { constraint }
            | Self::UnknownBody { constraint }
            | Self::SelfConstraint { constraint }
            | Self::NonFiniteValue { constraint }
            | Self::IncompatibleNormals { constraint, .. } => *constraint,
        }
    }
}

/// Convenience type alias for results using [`SpaceError`].
pub type Result<T> = std::result::Result<T, SpaceError>;
