use tracing::trace;

use crate::config::SolverConfig;
use crate::math::{Vector3, TOLERANCE};

use super::graph::ConstraintGraph;

/// Edges that cannot be satisfied together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The edge whose requirement could not be met.
    pub edge: usize,
    /// Edge indices, in constraint order. Includes the edges that placed
    /// every non-anchor body the disagreeing requirements start from.
    pub edges: Vec<usize>,
}

/// Places every node of `order`, writing `delta` and `solved` on nodes and
/// `solved` on edges.
///
/// Anchors keep a zero delta and only validate the edges that point into
/// them. Node state along `order` is reset first, so the same group may be
/// propagated more than once.
///
/// # Errors
///
/// Returns the conflicting edges of the first node whose requirements
/// disagree by more than [`SolverConfig::distance_tolerance`].
pub fn propagate(
    graph: &mut ConstraintGraph,
    order: &[usize],
    config: &SolverConfig,
) -> Result<(), Conflict> {
    for &node in order {
        graph.nodes[node].delta = Vector3::zeros();
        graph.nodes[node].solved = false;
        for i in 0..graph.nodes[node].edges.len() {
            let e = graph.nodes[node].edges[i];
            graph.edges[e].solved = false;
        }
    }

    for &node in order {
        let incoming: Vec<usize> = graph.nodes[node]
            .edges
            .iter()
            .copied()
            .filter(|&e| graph.edges[e].target == Some(node))
            .collect();

        if graph.nodes[node].anchor {
            for &e in &incoming {
                let edge = &graph.edges[e];
                let residual = edge.value - graph.distance(edge);
                if residual.abs() > config.distance_tolerance {
                    return Err(Conflict {
                        edge: e,
                        edges: vec![e],
                    });
                }
            }
        } else {
            let mut placement = Placement::new(config);
            for &e in &incoming {
                let edge = &graph.edges[e];
                let residual = edge.value - graph.distance(edge);
                let normal = graph.normal(edge);
                let dir = if edge.w == node { normal } else { -normal };
                if let Err(conflict) = placement.apply(e, dir, residual) {
                    return Err(with_upstream(graph, conflict));
                }
            }
            trace!(node, delta = ?placement.translation, "placed body");
            graph.nodes[node].delta = placement.translation;
        }

        for e in incoming {
            graph.edges[e].solved = true;
        }
        graph.nodes[node].solved = true;
    }
    Ok(())
}

/// Adds the edges that placed the sources of `conflict`, walking back to the
/// anchors.
fn with_upstream(graph: &ConstraintGraph, conflict: Conflict) -> Conflict {
    let mut visited = vec![false; graph.nodes.len()];
    let mut edges = conflict.edges;
    let mut stack: Vec<usize> = edges.iter().filter_map(|&e| graph.edges[e].source()).collect();
    while let Some(node) = stack.pop() {
        if visited[node] || graph.nodes[node].anchor {
            continue;
        }
        visited[node] = true;
        for &e in &graph.nodes[node].edges {
            let edge = &graph.edges[e];
            if edge.target == Some(node) {
                edges.push(e);
                stack.extend(edge.source());
            }
        }
    }
    edges.sort_unstable();
    edges.dedup();
    Conflict {
        edge: conflict.edge,
        edges,
    }
}

/// Translation of one body built up from per-edge requirements.
struct Placement {
    translation: Vector3,
    /// Orthonormal basis of the directions fixed so far.
    basis: Vec<Vector3>,
    applied: Vec<(usize, Vector3)>,
    parallel: f64,
    tolerance: f64,
}

impl Placement {
    fn new(config: &SolverConfig) -> Self {
        Self {
            translation: Vector3::zeros(),
            basis: Vec::with_capacity(3),
            applied: Vec::new(),
            parallel: config.normal_tolerance.max(TOLERANCE),
            tolerance: config.distance_tolerance,
        }
    }

    /// Requires `translation · dir == amount` for the unit vector `dir`.
    fn apply(&mut self, edge: usize, dir: Vector3, amount: f64) -> Result<(), Conflict> {
        let residual = amount - self.translation.dot(&dir);

        let mut free = dir;
        for axis in &self.basis {
            free -= axis * axis.dot(&dir);
        }
        let free_len = free.norm();

        if free_len > self.parallel {
            // moving along the free component leaves earlier directions intact
            let axis = free / free_len;
            self.translation += axis * (residual / free_len);
            self.basis.push(axis);
        } else if residual.abs() > self.tolerance {
            let mut edges: Vec<usize> = self
                .applied
                .iter()
                .filter(|(_, d)| d.dot(&dir).abs() > self.parallel)
                .map(|(e, _)| *e)
                .collect();
            edges.push(edge);
            return Err(Conflict { edge, edges });
        }

        self.applied.push((edge, dir));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn placement() -> Placement {
        Placement::new(&SolverConfig::default())
    }

    #[test]
    fn single_requirement_moves_along_its_direction() {
        let mut p = placement();
        p.apply(0, Vector3::x(), 2.5).unwrap();
        assert_abs_diff_eq!(p.translation, Vector3::new(2.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn orthogonal_requirements_compose() {
        let mut p = placement();
        p.apply(0, Vector3::x(), 2.0).unwrap();
        p.apply(1, -Vector3::y(), 3.0).unwrap();
        p.apply(2, Vector3::z(), -1.0).unwrap();
        assert_abs_diff_eq!(p.translation, Vector3::new(2.0, -3.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn agreeing_parallel_requirements_are_redundant() {
        let mut p = placement();
        p.apply(0, Vector3::x(), 4.0).unwrap();
        p.apply(1, -Vector3::x(), -4.0).unwrap();
        assert_abs_diff_eq!(p.translation, Vector3::new(4.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn disagreeing_parallel_requirements_conflict() {
        let mut p = placement();
        p.apply(3, Vector3::y(), 1.0).unwrap();
        p.apply(5, Vector3::x(), 1.0).unwrap();
        let conflict = p.apply(7, Vector3::y(), 2.0).unwrap_err();
        // the x edge is independent and not part of the conflict
        assert_eq!(conflict.edges, vec![3, 7]);
        assert_eq!(conflict.edge, 7);
    }

    #[test]
    fn oblique_requirement_keeps_earlier_ones() {
        let mut p = placement();
        p.apply(0, Vector3::x(), 1.0).unwrap();
        let diag = Vector3::new(1.0, 1.0, 0.0).normalize();
        p.apply(1, diag, 0.0).unwrap();
        assert_abs_diff_eq!(p.translation.dot(&Vector3::x()), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.translation.dot(&diag), 0.0, epsilon = 1e-12);
    }
}
