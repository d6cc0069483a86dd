use crate::error::{GeometryError, Result};
use crate::geometry::Plane;
use crate::math::{Matrix4, Point3, Vector3};

use super::{Body, BodyFlags, BodyId, Face, FaceType, SpaceStore};

/// Creates a box-shaped body with one bound face per [`FaceType`].
///
/// In the body's local frame the box spans `[0, size]` on each axis and
/// every face normal points outward: left −X, right +X, front −Y,
/// back +Y, bottom −Z, top +Z.
pub struct MakeCuboid {
    size: Vector3,
    matrix: Option<Matrix4>,
    flags: BodyFlags,
}

impl MakeCuboid {
    /// Creates a new `MakeCuboid` operation for a movable body at the origin.
    #[must_use]
    pub fn new(size: Vector3) -> Self {
        Self {
            size,
            matrix: None,
            flags: BodyFlags::default(),
        }
    }

    /// Places the body with the given world transform.
    #[must_use]
    pub fn with_matrix(mut self, matrix: Matrix4) -> Self {
        self.matrix = Some(matrix);
        self
    }

    /// Sets the body's behavioural flags.
    #[must_use]
    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Executes the operation, creating the body and its faces in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if any extent of `size` is not strictly positive.
    pub fn execute(&self, store: &mut SpaceStore) -> Result<BodyId> {
        for (parameter, value) in [
            ("size.x", self.size.x),
            ("size.y", self.size.y),
            ("size.z", self.size.z),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(GeometryError::NonPositive { parameter, value }.into());
            }
        }

        let mut body = Body::new().with_flags(self.flags);
        body.matrix = self.matrix;
        let id = store.add_body(body);

        let (sx, sy, sz) = (self.size.x, self.size.y, self.size.z);
        for face_type in FaceType::ALL {
            let (origin, normal) = match face_type {
                FaceType::Left => (Point3::origin(), -Vector3::x()),
                FaceType::Right => (Point3::new(sx, 0.0, 0.0), Vector3::x()),
                FaceType::Front => (Point3::origin(), -Vector3::y()),
                FaceType::Back => (Point3::new(0.0, sy, 0.0), Vector3::y()),
                FaceType::Bottom => (Point3::origin(), -Vector3::z()),
                FaceType::Top => (Point3::new(0.0, 0.0, sz), Vector3::z()),
            };
            store.add_bound_face(Face::new(id, face_type, Plane::new(origin, normal)?))?;
        }

        Ok(id)
    }
}
