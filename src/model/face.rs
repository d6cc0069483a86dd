use crate::geometry::Plane;

use super::body::BodyId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the space store.
    pub struct FaceId;
}

/// Which side of its body a face sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FaceType {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl FaceType {
    /// All six face types.
    pub const ALL: [Self; 6] = [
        Self::Front,
        Self::Back,
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
    ];

    /// The face type on the opposite side of the body.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Front => Self::Back,
            Self::Back => Self::Front,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

/// A planar face of a body.
#[derive(Debug, Clone)]
pub struct Face {
    /// The owning body.
    pub body: BodyId,
    /// The side of the body this face represents.
    pub face_type: FaceType,
    /// The face plane in the body's local frame.
    pub surface: Plane,
}

impl Face {
    /// Creates a new face.
    #[must_use]
    pub fn new(body: BodyId, face_type: FaceType, surface: Plane) -> Self {
        Self {
            body,
            face_type,
            surface,
        }
    }
}
