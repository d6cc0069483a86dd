use std::collections::BTreeSet;

use slotmap::SecondaryMap;
use tracing::debug;

use crate::config::SolverConfig;
use crate::error::{BuildError, Result};
use crate::geometry::Plane;
use crate::math::{is_identity, Matrix4, Vector3};
use crate::model::{BodyId, ConstraintId, FaceId, FaceType, SpaceStore};

/// World-space view of a constrained face.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The face in the store.
    pub face: FaceId,
    /// Index of the owning body's node.
    pub node: usize,
    /// Side of the body.
    pub face_type: FaceType,
    /// Inherited from the owning body.
    pub is_fixed: bool,
    /// The face plane transformed into world space.
    pub abs_surf: Plane,
    /// The face is one of the body's inner faces.
    pub is_inner: bool,
    /// Inherited from the owning body.
    pub is_changed: bool,
}

/// A body in the constraint graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// The body in the store.
    pub body: BodyId,
    /// World transform at build time.
    pub geo: Matrix4,
    /// The body is fixed by the caller.
    pub is_fixed: bool,
    /// The body was edited by the caller.
    pub is_changed: bool,
    /// The body is a parametric model.
    pub is_pm_model: bool,
    /// Incident edge indices, in constraint order.
    pub edges: Vec<usize>,
    /// Set by the sorter: the node keeps its transform.
    pub anchor: bool,
    /// Set by propagation: translation applied on top of `geo`.
    pub delta: Vector3,
    /// Set by propagation once `delta` is final.
    pub solved: bool,
}

/// A constraint in the constraint graph.
#[derive(Debug, Clone)]
pub struct Edge {
    /// The constraint in the store.
    pub cst: ConstraintId,
    /// Node owning `face1`.
    pub v: usize,
    /// Node owning `face2`.
    pub w: usize,
    /// Index of `face1` in [`ConstraintGraph::faces`].
    pub face1: usize,
    /// Index of `face2` in [`ConstraintGraph::faces`].
    pub face2: usize,
    /// Required signed distance.
    pub value: f64,
    /// Set by the sorter: the endpoint this edge places. `None` while the
    /// edge is still usable in both directions.
    pub target: Option<usize>,
    /// Set by propagation once the edge has been satisfied.
    pub solved: bool,
}

impl Edge {
    /// Returns the endpoint opposite to `node`.
    #[must_use]
    pub fn other(&self, node: usize) -> usize {
        if node == self.v {
            self.w
        } else {
            self.v
        }
    }

    /// Returns the endpoint that places the target, once oriented.
    #[must_use]
    pub fn source(&self) -> Option<usize> {
        self.target.map(|t| self.other(t))
    }
}

/// Scratch graph of one solve call.
///
/// Bodies become nodes and constraints become edges, all addressed by plain
/// indices. The sorter and propagation write their state back onto it.
#[derive(Debug, Default)]
pub struct ConstraintGraph {
    /// Constrained bodies, ascending by body ID.
    pub nodes: Vec<Node>,
    /// Constrained faces, in first-reference order.
    pub faces: Vec<FaceData>,
    /// Constraints, in store order.
    pub edges: Vec<Edge>,
}

struct Resolved {
    cst: ConstraintId,
    face1: FaceId,
    face2: FaceId,
    body1: BodyId,
    body2: BodyId,
    value: f64,
}

impl ConstraintGraph {
    /// Builds the graph for every constraint in the store.
    ///
    /// Bodies without constraints are left out.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] for the first constraint that references a
    /// missing face or body, joins two faces of one body, has a NaN or
    /// infinite value, or joins faces whose world normals are not parallel
    /// within [`SolverConfig::normal_tolerance`].
    pub fn build(store: &SpaceStore, config: &SolverConfig) -> Result<Self> {
        let mut resolved = Vec::with_capacity(store.constraint_count());
        let mut bodies = BTreeSet::new();

        for (cst, constraint) in store.constraints() {
            let face1 = store
                .face(constraint.face1)
                .map_err(|_| BuildError::UnknownFace { constraint: cst })?;
            let face2 = store
                .face(constraint.face2)
                .map_err(|_| BuildError::UnknownFace { constraint: cst })?;
            if store.body(face1.body).is_err() || store.body(face2.body).is_err() {
                return Err(BuildError::UnknownBody { constraint: cst }.into());
            }
            if face1.body == face2.body {
                return Err(BuildError::SelfConstraint { constraint: cst }.into());
            }
            if !constraint.value.is_finite() {
                return Err(BuildError::NonFiniteValue { constraint: cst }.into());
            }
            bodies.insert(face1.body);
            bodies.insert(face2.body);
            resolved.push(Resolved {
                cst,
                face1: constraint.face1,
                face2: constraint.face2,
                body1: face1.body,
                body2: face2.body,
                value: constraint.value,
            });
        }

        let mut graph = Self::default();
        let mut node_of: SecondaryMap<BodyId, usize> = SecondaryMap::new();
        for body_id in bodies {
            let body = store.body(body_id)?;
            node_of.insert(body_id, graph.nodes.len());
            graph.nodes.push(Node {
                body: body_id,
                geo: body.world_matrix(),
                is_fixed: body.flags.is_fixed,
                is_changed: body.flags.is_changed,
                is_pm_model: body.flags.is_pm_model,
                edges: Vec::new(),
                anchor: false,
                delta: Vector3::zeros(),
                solved: false,
            });
        }

        let mut face_of: SecondaryMap<FaceId, usize> = SecondaryMap::new();
        for r in resolved {
            let v = node_of[r.body1];
            let w = node_of[r.body2];
            let face1 = graph.face_index(store, &mut face_of, r.face1, v)?;
            let face2 = graph.face_index(store, &mut face_of, r.face2, w)?;

            let n1 = graph.faces[face1].abs_surf.normal();
            let n2 = graph.faces[face2].abs_surf.normal();
            let angle_sin = n1.cross(n2).norm();
            if angle_sin > config.normal_tolerance {
                return Err(BuildError::IncompatibleNormals {
                    constraint: r.cst,
                    angle_sin,
                }
                .into());
            }

            let index = graph.edges.len();
            graph.nodes[v].edges.push(index);
            graph.nodes[w].edges.push(index);
            graph.edges.push(Edge {
                cst: r.cst,
                v,
                w,
                face1,
                face2,
                value: r.value,
                target: None,
                solved: false,
            });
        }

        debug!(
            nodes = graph.nodes.len(),
            faces = graph.faces.len(),
            edges = graph.edges.len(),
            "built constraint graph"
        );
        Ok(graph)
    }

    /// Returns the index of the face's [`FaceData`], materializing it on
    /// first use.
    fn face_index(
        &mut self,
        store: &SpaceStore,
        face_of: &mut SecondaryMap<FaceId, usize>,
        face_id: FaceId,
        node: usize,
    ) -> Result<usize> {
        if let Some(&index) = face_of.get(face_id) {
            return Ok(index);
        }
        let face = store.face(face_id)?;
        let owner = &self.nodes[node];
        let abs_surf = if is_identity(&owner.geo) {
            face.surface.clone()
        } else {
            face.surface.transformed(&owner.geo)?
        };
        let index = self.faces.len();
        self.faces.push(FaceData {
            face: face_id,
            node,
            face_type: face.face_type,
            is_fixed: owner.is_fixed,
            abs_surf,
            is_inner: store.is_inner_face(face_id),
            is_changed: owner.is_changed,
        });
        face_of.insert(face_id, index);
        Ok(index)
    }

    /// Signed distance of `face2` from `face1` along `face1`'s normal, with
    /// each endpoint shifted by its node's current `delta`.
    #[must_use]
    pub fn distance(&self, edge: &Edge) -> f64 {
        let f1 = &self.faces[edge.face1].abs_surf;
        let f2 = &self.faces[edge.face2].abs_surf;
        let shift = self.nodes[edge.w].delta - self.nodes[edge.v].delta;
        f1.signed_distance(f2.origin()) + shift.dot(f1.normal())
    }

    /// World normal of the edge's reference face.
    #[must_use]
    pub fn normal(&self, edge: &Edge) -> Vector3 {
        *self.faces[edge.face1].abs_surf.normal()
    }
}
