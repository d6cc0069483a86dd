use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use tracing::debug;

use crate::config::SolverConfig;

use super::graph::ConstraintGraph;
use super::group::ConstraintGroup;
use super::propagate::propagate;

/// Propagation order of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedGroup {
    /// Node indices, anchors first. Every non-anchor node has at least one
    /// oriented edge from a node earlier in the order.
    pub top_sorts: Vec<usize>,
    /// The group contains a fixed body. When `false` a single root node
    /// was promoted to anchor.
    pub anchored: bool,
}

/// An anchor-free group whose cycles do not close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConstraint {
    /// Edges of the offending cycle(s), in constraint order.
    pub edges: Vec<usize>,
}

/// Orients every edge of `group` and orders its nodes with Kahn's algorithm.
///
/// Fixed bodies are the anchors. A group without one is rooted at its
/// smallest changed body, or failing that its smallest body. Edges point
/// away from the anchors by breadth-first layer, ties broken by body ID,
/// and nodes with no pending edges are released smallest ID first.
///
/// # Errors
///
/// Returns [`LoopConstraint`] when the group has no fixed body and a cycle
/// of its constraints has a non-zero net offset.
pub fn sort(
    graph: &mut ConstraintGraph,
    group: &ConstraintGroup,
    config: &SolverConfig,
) -> Result<SortedGroup, LoopConstraint> {
    let count = group.bs.len();
    let slot = |node: usize| group.bs.partition_point(|&n| n < node);

    let anchored = group.bs.iter().any(|&n| graph.nodes[n].is_fixed);
    let root = group
        .bs
        .iter()
        .copied()
        .find(|&n| graph.nodes[n].is_changed)
        .or_else(|| group.bs.first().copied());

    let mut layer = vec![usize::MAX; count];
    let mut queue = VecDeque::new();
    for (i, &n) in group.bs.iter().enumerate() {
        let anchor = if anchored {
            graph.nodes[n].is_fixed
        } else {
            Some(n) == root
        };
        graph.nodes[n].anchor = anchor;
        if anchor {
            layer[i] = 0;
            queue.push_back(n);
        }
    }
    while let Some(n) = queue.pop_front() {
        let next = layer[slot(n)] + 1;
        for &e in &graph.nodes[n].edges {
            let m = graph.edges[e].other(n);
            let sm = slot(m);
            if layer[sm] == usize::MAX {
                layer[sm] = next;
                queue.push_back(m);
            }
        }
    }

    let mut in_degree = vec![0_usize; count];
    for &e in &group.cs {
        let edge = &graph.edges[e];
        let key_v = (layer[slot(edge.v)], edge.v);
        let key_w = (layer[slot(edge.w)], edge.w);
        let target = if key_v < key_w { edge.w } else { edge.v };
        graph.edges[e].target = Some(target);
        in_degree[slot(target)] += 1;
    }

    let mut ready = BinaryHeap::new();
    for (i, &n) in group.bs.iter().enumerate() {
        if in_degree[i] == 0 {
            ready.push(Reverse((!graph.nodes[n].anchor, n)));
        }
    }
    let mut top_sorts = Vec::with_capacity(count);
    while let Some(Reverse((_, n))) = ready.pop() {
        top_sorts.push(n);
        for &e in &graph.nodes[n].edges {
            let edge = &graph.edges[e];
            if edge.source() != Some(n) {
                continue;
            }
            let t = edge.other(n);
            let st = slot(t);
            in_degree[st] -= 1;
            if in_degree[st] == 0 {
                ready.push(Reverse((!graph.nodes[t].anchor, t)));
            }
        }
    }
    debug_assert_eq!(top_sorts.len(), count, "oriented group must be acyclic");

    debug!(
        bodies = count,
        constraints = group.cs.len(),
        anchored,
        "sorted constraint group"
    );

    // a connected group has a cycle exactly when it has as many edges as nodes
    if !anchored && group.cs.len() >= count {
        if let Err(conflict) = propagate(graph, &top_sorts, config) {
            let edges = loop_edges(graph, group, conflict.edge);
            return Err(LoopConstraint { edges });
        }
    }

    Ok(SortedGroup {
        top_sorts,
        anchored,
    })
}

/// Edges of the two-edge-connected component containing `seed`.
fn loop_edges(graph: &ConstraintGraph, group: &ConstraintGroup, seed: usize) -> Vec<usize> {
    let edge_slot = |e: usize| group.cs.partition_point(|&x| x < e);
    let node_slot = |node: usize| group.bs.partition_point(|&n| n < node);

    let bridge = bridges(graph, group);
    if bridge[edge_slot(seed)] {
        return vec![seed];
    }

    let mut seen_node = vec![false; group.bs.len()];
    let mut seen_edge = vec![false; group.cs.len()];
    let start = graph.edges[seed].v;
    seen_node[node_slot(start)] = true;
    let mut queue = VecDeque::from([start]);
    while let Some(n) = queue.pop_front() {
        for &e in &graph.nodes[n].edges {
            let se = edge_slot(e);
            if bridge[se] {
                continue;
            }
            seen_edge[se] = true;
            let m = graph.edges[e].other(n);
            let sm = node_slot(m);
            if !seen_node[sm] {
                seen_node[sm] = true;
                queue.push_back(m);
            }
        }
    }

    group
        .cs
        .iter()
        .zip(seen_edge)
        .filter_map(|(&e, seen)| seen.then_some(e))
        .collect()
}

/// Flags the bridges of a connected group, indexed like `group.cs`.
fn bridges(graph: &ConstraintGraph, group: &ConstraintGroup) -> Vec<bool> {
    let edge_slot = |e: usize| group.cs.partition_point(|&x| x < e);
    let node_slot = |node: usize| group.bs.partition_point(|&n| n < node);

    let mut bridge = vec![false; group.cs.len()];
    let Some(&root) = group.bs.first() else {
        return bridge;
    };

    let mut disc = vec![usize::MAX; group.bs.len()];
    let mut low = vec![0_usize; group.bs.len()];
    disc[node_slot(root)] = 0;
    let mut timer = 1;

    // (node, edge it was reached by, next incident edge to visit)
    let mut stack: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];
    while let Some(top) = stack.last_mut() {
        let (n, parent) = (top.0, top.1);
        let sn = node_slot(n);
        let incident = &graph.nodes[n].edges;
        if top.2 < incident.len() {
            let e = incident[top.2];
            top.2 += 1;
            if Some(e) == parent {
                continue;
            }
            let m = graph.edges[e].other(n);
            let sm = node_slot(m);
            if disc[sm] == usize::MAX {
                disc[sm] = timer;
                low[sm] = timer;
                timer += 1;
                stack.push((m, Some(e), 0));
            } else {
                low[sn] = low[sn].min(disc[sm]);
            }
        } else {
            stack.pop();
            if let Some(pe) = parent {
                let sp = node_slot(graph.edges[pe].other(n));
                low[sp] = low[sp].min(low[sn]);
                if low[sn] > disc[sp] {
                    bridge[edge_slot(pe)] = true;
                }
            }
        }
    }
    bridge
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{translation, Vector3};
    use crate::model::{
        BodyFlags, BodyId, FaceDistanceConstraint, FaceType, MakeCuboid, SpaceStore,
    };
    use crate::solver::group::group;

    fn cube(store: &mut SpaceStore, x: f64, flags: BodyFlags) -> BodyId {
        MakeCuboid::new(Vector3::new(1.0, 1.0, 1.0))
            .with_matrix(translation(&Vector3::new(x, 0.0, 0.0)))
            .with_flags(flags)
            .execute(store)
            .unwrap()
    }

    /// `b` sits `gap` units to the right of `a`.
    fn gap(store: &mut SpaceStore, a: BodyId, b: BodyId, gap: f64) {
        let f1 = store.face_of(a, FaceType::Right).unwrap();
        let f2 = store.face_of(b, FaceType::Left).unwrap();
        store.add_constraint(FaceDistanceConstraint::new(f1, f2, gap));
    }

    fn sorted(store: &SpaceStore) -> (ConstraintGraph, Result<SortedGroup, LoopConstraint>) {
        let config = SolverConfig::default();
        let mut graph = ConstraintGraph::build(store, &config).unwrap();
        let groups = group(&graph);
        assert_eq!(groups.len(), 1);
        let result = sort(&mut graph, &groups[0], &config);
        (graph, result)
    }

    #[test]
    fn anchors_come_first_and_edges_point_away() {
        let mut store = SpaceStore::new();
        let c = cube(&mut store, 10.0, BodyFlags::default());
        let b = cube(&mut store, 5.0, BodyFlags::default());
        let a = cube(&mut store, 0.0, BodyFlags::fixed());
        gap(&mut store, b, c, 1.0);
        gap(&mut store, a, b, 1.0);

        let (graph, result) = sorted(&store);
        let sorted = result.unwrap();
        assert!(sorted.anchored);
        let bodies: Vec<_> = sorted.top_sorts.iter().map(|&n| graph.nodes[n].body).collect();
        assert_eq!(bodies, vec![a, b, c]);

        for edge in &graph.edges {
            let target = edge.target.unwrap();
            let source = edge.source().unwrap();
            let pos = |n| sorted.top_sorts.iter().position(|&x| x == n).unwrap();
            assert!(pos(source) < pos(target));
        }
        assert!(graph.nodes.iter().filter(|n| n.anchor).all(|n| n.is_fixed));
    }

    #[test]
    fn ties_release_smallest_body_first() {
        let mut store = SpaceStore::new();
        let a = cube(&mut store, 0.0, BodyFlags::fixed());
        let b = cube(&mut store, 5.0, BodyFlags::default());
        let c = cube(&mut store, 10.0, BodyFlags::default());
        gap(&mut store, a, c, 1.0);
        gap(&mut store, a, b, 1.0);

        let (graph, result) = sorted(&store);
        let bodies: Vec<_> = result
            .unwrap()
            .top_sorts
            .iter()
            .map(|&n| graph.nodes[n].body)
            .collect();
        assert_eq!(bodies, vec![a, b, c]);
    }

    #[test]
    fn unanchored_chain_roots_at_changed_body() {
        let mut store = SpaceStore::new();
        let a = cube(&mut store, 0.0, BodyFlags::default());
        let b = cube(&mut store, 5.0, BodyFlags {
            is_changed: true,
            ..BodyFlags::default()
        });
        let c = cube(&mut store, 10.0, BodyFlags::default());
        gap(&mut store, a, b, 1.0);
        gap(&mut store, b, c, 1.0);

        let (graph, result) = sorted(&store);
        let sorted = result.unwrap();
        assert!(!sorted.anchored);
        assert_eq!(graph.nodes[sorted.top_sorts[0]].body, b);
        assert!(graph.nodes[sorted.top_sorts[0]].anchor);
        assert_eq!(graph.nodes.iter().filter(|n| n.anchor).count(), 1);
    }

    #[test]
    fn unanchored_open_loop_is_rejected() {
        let mut store = SpaceStore::new();
        let a = cube(&mut store, 0.0, BodyFlags::default());
        let b = cube(&mut store, 2.0, BodyFlags::default());
        let c = cube(&mut store, 4.0, BodyFlags::default());
        gap(&mut store, a, b, 1.0);
        gap(&mut store, b, c, 1.0);
        // a closing distance of 3 would agree; 5 leaves a net offset of 2
        gap(&mut store, a, c, 5.0);

        let (_, result) = sorted(&store);
        assert_eq!(result.unwrap_err().edges, vec![0, 1, 2]);
    }

    #[test]
    fn unanchored_closed_loop_sorts() {
        let mut store = SpaceStore::new();
        let a = cube(&mut store, 0.0, BodyFlags::default());
        let b = cube(&mut store, 2.0, BodyFlags::default());
        let c = cube(&mut store, 4.0, BodyFlags::default());
        gap(&mut store, a, b, 1.0);
        gap(&mut store, b, c, 1.0);
        gap(&mut store, a, c, 3.0);

        let (_, result) = sorted(&store);
        assert_eq!(result.unwrap().top_sorts.len(), 3);
    }

    #[test]
    fn loop_report_leaves_out_the_tail() {
        let mut store = SpaceStore::new();
        let a = cube(&mut store, 0.0, BodyFlags::default());
        let b = cube(&mut store, 2.0, BodyFlags::default());
        let tail = cube(&mut store, 8.0, BodyFlags::default());
        gap(&mut store, b, tail, 2.0);
        gap(&mut store, a, b, 1.0);
        gap(&mut store, a, b, 4.0);

        let (_, result) = sorted(&store);
        assert_eq!(result.unwrap_err().edges, vec![1, 2]);
    }
}
