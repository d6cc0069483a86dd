use super::face::FaceId;

slotmap::new_key_type! {
    /// Unique identifier for a constraint in the space store.
    pub struct ConstraintId;
}

/// Signed distance between two faces along the first face's normal.
///
/// A positive `value` places `face2` that many units in the direction of
/// `face1`'s outward normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDistanceConstraint {
    /// Reference face.
    pub face1: FaceId,
    /// Offset face.
    pub face2: FaceId,
    /// Required signed distance.
    pub value: f64,
}

impl FaceDistanceConstraint {
    /// Creates a new face distance constraint.
    #[must_use]
    pub fn new(face1: FaceId, face2: FaceId, value: f64) -> Self {
        Self {
            face1,
            face2,
            value,
        }
    }
}
