pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod model;
pub mod solver;

pub use config::SolverConfig;
pub use error::{BuildError, Result, SpaceError};
pub use model::{
    Body, BodyFlags, BodyId, ConstraintId, Face, FaceDistanceConstraint, FaceId, FaceType,
    SpaceStore,
};
pub use solver::{SolveReport, SolveResult, SpaceSolver};
