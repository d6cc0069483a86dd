pub mod body;
pub mod constraint;
pub mod cuboid;
pub mod face;

pub use body::{Body, BodyFlags, BodyId};
pub use constraint::{ConstraintId, FaceDistanceConstraint};
pub use cuboid::MakeCuboid;
pub use face::{Face, FaceId, FaceType};

use crate::error::StoreError;
use slotmap::SlotMap;

/// Central arena that owns bodies, faces and constraints.
///
/// Entities reference each other via typed IDs (generational indices),
/// so faces point at their body without back-references and the solver
/// can key its scratch data by ID.
#[derive(Debug, Default)]
pub struct SpaceStore {
    bodies: SlotMap<BodyId, Body>,
    faces: SlotMap<FaceId, Face>,
    constraints: SlotMap<ConstraintId, FaceDistanceConstraint>,
}

impl SpaceStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Body operations ---

    /// Inserts a body and returns its ID.
    ///
    /// Face lists on the inserted body are cleared; faces are attached
    /// with [`add_bound_face`](Self::add_bound_face) and
    /// [`add_inner_face`](Self::add_inner_face).
    pub fn add_body(&mut self, mut body: Body) -> BodyId {
        body.bound_faces.clear();
        body.inner_faces.clear();
        self.bodies.insert(body)
    }

    /// Returns a reference to the body, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn body(&self, id: BodyId) -> Result<&Body, StoreError> {
        self.bodies
            .get(id)
            .ok_or_else(|| StoreError::EntityNotFound("body".into()))
    }

    /// Returns a mutable reference to the body, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body, StoreError> {
        self.bodies
            .get_mut(id)
            .ok_or_else(|| StoreError::EntityNotFound("body".into()))
    }

    /// Removes a body together with all of its faces.
    ///
    /// Constraints that referenced those faces stay in the store and will
    /// fail to build until they are removed too.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let body = self.bodies.remove(id)?;
        for face in body.bound_faces.iter().chain(&body.inner_faces) {
            self.faces.remove(*face);
        }
        Some(body)
    }

    /// Iterates over all bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter()
    }

    // --- Face operations ---

    /// Inserts a face on its body's outer boundary and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning body is not in the store.
    pub fn add_bound_face(&mut self, face: Face) -> Result<FaceId, StoreError> {
        let body = face.body;
        self.body(body)?;
        let id = self.faces.insert(face);
        self.body_mut(body)?.bound_faces.push(id);
        Ok(id)
    }

    /// Inserts an inner face on its body and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the owning body is not in the store.
    pub fn add_inner_face(&mut self, face: Face) -> Result<FaceId, StoreError> {
        let body = face.body;
        self.body(body)?;
        let id = self.faces.insert(face);
        self.body_mut(body)?.inner_faces.push(id);
        Ok(id)
    }

    /// Returns a reference to the face, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn face(&self, id: FaceId) -> Result<&Face, StoreError> {
        self.faces
            .get(id)
            .ok_or_else(|| StoreError::EntityNotFound("face".into()))
    }

    /// Removes a face and detaches it from its body.
    pub fn remove_face(&mut self, id: FaceId) -> Option<Face> {
        let face = self.faces.remove(id)?;
        if let Some(body) = self.bodies.get_mut(face.body) {
            body.bound_faces.retain(|f| *f != id);
            body.inner_faces.retain(|f| *f != id);
        }
        Some(face)
    }

    /// Finds the first face of the given type on a body, searching
    /// bound faces before inner faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not in the store or has no such face.
    pub fn face_of(&self, body: BodyId, face_type: FaceType) -> Result<FaceId, StoreError> {
        let data = self.body(body)?;
        data.bound_faces
            .iter()
            .chain(&data.inner_faces)
            .copied()
            .find(|id| {
                self.faces
                    .get(*id)
                    .is_some_and(|face| face.face_type == face_type)
            })
            .ok_or_else(|| StoreError::EntityNotFound(format!("{face_type:?} face")))
    }

    /// Returns `true` if the face is listed among its body's inner faces.
    #[must_use]
    pub fn is_inner_face(&self, id: FaceId) -> bool {
        self.faces
            .get(id)
            .and_then(|face| self.bodies.get(face.body))
            .is_some_and(|body| body.inner_faces.contains(&id))
    }

    // --- Constraint operations ---

    /// Inserts a constraint and returns its ID.
    ///
    /// References are not checked here; dangling faces are reported when
    /// the solver builds its graph.
    pub fn add_constraint(&mut self, constraint: FaceDistanceConstraint) -> ConstraintId {
        self.constraints.insert(constraint)
    }

    /// Returns a reference to the constraint, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn constraint(&self, id: ConstraintId) -> Result<&FaceDistanceConstraint, StoreError> {
        self.constraints
            .get(id)
            .ok_or_else(|| StoreError::EntityNotFound("constraint".into()))
    }

    /// Removes a constraint.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Option<FaceDistanceConstraint> {
        self.constraints.remove(id)
    }

    /// Iterates over all constraints in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &FaceDistanceConstraint)> {
        self.constraints.iter()
    }

    /// Returns the number of constraints.
    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
