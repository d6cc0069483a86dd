use crate::math::Matrix4;

use super::face::FaceId;

slotmap::new_key_type! {
    /// Unique identifier for a body in the space store.
    pub struct BodyId;
}

/// Behavioural flags of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyFlags {
    /// The body is an anchor: the solver never moves it.
    pub is_fixed: bool,
    /// The body is a parametric model that may need a rebuild after moving.
    pub is_pm_model: bool,
    /// All faces of the body move together. Informational: the solver
    /// translates every movable body as a whole whatever this is set to.
    pub is_rigid: bool,
    /// The body was edited by the caller since the last solve.
    pub is_changed: bool,
}

impl Default for BodyFlags {
    fn default() -> Self {
        Self {
            is_fixed: false,
            is_pm_model: false,
            is_rigid: true,
            is_changed: false,
        }
    }
}

impl BodyFlags {
    /// Flags for an anchored body.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            is_fixed: true,
            ..Self::default()
        }
    }
}

/// A rigid or parametric object placed in world space.
///
/// Faces are owned by the store and listed here by ID. `bound_faces`
/// describe the outer envelope, `inner_faces` optional internal planes
/// (shelves, partitions) that constraints may also reference.
#[derive(Debug, Clone, Default)]
pub struct Body {
    /// Faces on the outer boundary.
    pub bound_faces: Vec<FaceId>,
    /// Faces inside the body.
    pub inner_faces: Vec<FaceId>,
    /// World transform. `None` means identity.
    pub matrix: Option<Matrix4>,
    /// Behavioural flags.
    pub flags: BodyFlags,
}

impl Body {
    /// Creates a movable rigid body at the world origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the world transform.
    #[must_use]
    pub fn with_matrix(mut self, matrix: Matrix4) -> Self {
        self.matrix = Some(matrix);
        self
    }

    /// Sets the behavioural flags.
    #[must_use]
    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns the world transform, identity if unset.
    #[must_use]
    pub fn world_matrix(&self) -> Matrix4 {
        self.matrix.unwrap_or_else(Matrix4::identity)
    }

    /// Returns `true` if the solver must not move this body.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.flags.is_fixed
    }
}
