use crate::error::{GeometryError, Result};
use crate::math::{transform_direction, transform_point, Matrix4, Point3, Vector3, TOLERANCE};

/// An infinite oriented plane in 3D space.
///
/// Defined by an origin point and a unit normal. Faces use the normal as
/// their outward direction, so distances measured along it are signed.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// The normal is normalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from the plane to `point`, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Orthogonal projection of `point` onto the plane.
    #[must_use]
    pub fn projected_point(&self, point: &Point3) -> Point3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Translates the plane in place.
    pub fn translate(&mut self, displacement: &Vector3) {
        self.origin += displacement;
    }

    /// Returns a translated copy of the plane.
    #[must_use]
    pub fn translated(&self, displacement: &Vector3) -> Self {
        let mut plane = self.clone();
        plane.translate(displacement);
        plane
    }

    /// Transforms the plane in place by a rigid 4x4 matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix collapses the normal to zero length.
    pub fn transform(&mut self, matrix: &Matrix4) -> Result<()> {
        let normal = transform_direction(matrix, &self.normal);
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(
                GeometryError::Degenerate("transform collapses plane normal".into()).into(),
            );
        }
        self.origin = transform_point(matrix, &self.origin);
        self.normal = normal / len;
        Ok(())
    }

    /// Returns a copy of the plane transformed by a rigid 4x4 matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix collapses the normal to zero length.
    pub fn transformed(&self, matrix: &Matrix4) -> Result<Self> {
        let mut plane = self.clone();
        plane.transform(matrix)?;
        Ok(plane)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::translation;

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Plane::new(Point3::origin(), Vector3::zeros()).is_err());
    }

    #[test]
    fn signed_distance_follows_normal() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Vector3::new(0.0, 0.0, 5.0)).unwrap();
        assert!((plane.normal().norm() - 1.0).abs() < TOLERANCE);
        assert!((plane.signed_distance(&Point3::new(3.0, 1.0, 5.0)) - 3.0).abs() < TOLERANCE);
        assert!((plane.signed_distance(&Point3::new(3.0, 1.0, 0.0)) + 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn projection_lands_on_plane() {
        let plane = Plane::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let p = plane.projected_point(&Point3::new(4.0, 2.0, -1.0));
        assert!((p - Point3::new(1.0, 2.0, -1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn transformed_rotates_normal_and_moves_origin() {
        let plane = Plane::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let rot = nalgebra::Rotation3::from_axis_angle(
            &Vector3::z_axis(),
            std::f64::consts::FRAC_PI_2,
        )
        .to_homogeneous();
        let m = translation(&Vector3::new(0.0, 0.0, 3.0)) * rot;

        let moved = plane.transformed(&m).unwrap();
        assert!((moved.origin() - Point3::new(0.0, 1.0, 3.0)).norm() < 1e-9);
        assert!((moved.normal() - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-9);
        // the source is untouched
        assert!((plane.origin() - Point3::new(1.0, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn translated_keeps_normal() {
        let plane = Plane::new(Point3::origin(), Vector3::new(0.0, -1.0, 0.0)).unwrap();
        let moved = plane.translated(&Vector3::new(0.0, -4.0, 0.0));
        assert_eq!(moved.normal(), plane.normal());
        assert!((moved.signed_distance(&Point3::origin()) + 4.0).abs() < TOLERANCE);
    }
}
