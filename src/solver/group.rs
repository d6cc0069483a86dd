use super::graph::ConstraintGraph;

/// A connected component of the constraint graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintGroup {
    /// Node indices, ascending (and therefore ascending by body ID).
    pub bs: Vec<usize>,
    /// Edge indices, in constraint order.
    pub cs: Vec<usize>,
}

/// Partitions the graph into connected components.
///
/// Groups are ordered by their smallest body ID. Every node in the graph
/// carries at least one constraint, so no singleton groups appear.
#[must_use]
pub fn group(graph: &ConstraintGraph) -> Vec<ConstraintGroup> {
    let mut sets = DisjointSet::new(graph.nodes.len());
    for edge in &graph.edges {
        sets.union(edge.v, edge.w);
    }

    let mut slot_of_root = vec![usize::MAX; graph.nodes.len()];
    let mut groups: Vec<ConstraintGroup> = Vec::new();
    for node in 0..graph.nodes.len() {
        let root = sets.find(node);
        if slot_of_root[root] == usize::MAX {
            slot_of_root[root] = groups.len();
            groups.push(ConstraintGroup {
                bs: Vec::new(),
                cs: Vec::new(),
            });
        }
        groups[slot_of_root[root]].bs.push(node);
    }
    for (index, edge) in graph.edges.iter().enumerate() {
        let root = sets.find(edge.v);
        groups[slot_of_root[root]].cs.push(index);
    }
    groups
}

/// Union-find with path halving and union by size.
struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::math::{translation, Vector3};
    use crate::model::{BodyFlags, FaceDistanceConstraint, FaceType, MakeCuboid, SpaceStore};

    fn row(store: &mut SpaceStore, count: usize) -> Vec<crate::model::BodyId> {
        (0..count)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = 3.0 * i as f64;
                MakeCuboid::new(Vector3::new(1.0, 1.0, 1.0))
                    .with_matrix(translation(&Vector3::new(x, 0.0, 0.0)))
                    .with_flags(if i == 0 {
                        BodyFlags::fixed()
                    } else {
                        BodyFlags::default()
                    })
                    .execute(store)
                    .unwrap()
            })
            .collect()
    }

    fn link(store: &mut SpaceStore, a: crate::model::BodyId, b: crate::model::BodyId) {
        let f1 = store.face_of(a, FaceType::Right).unwrap();
        let f2 = store.face_of(b, FaceType::Left).unwrap();
        store.add_constraint(FaceDistanceConstraint::new(f1, f2, -1.0));
    }

    #[test]
    fn disjoint_pairs_form_two_groups() {
        let mut store = SpaceStore::new();
        let b = row(&mut store, 5);
        link(&mut store, b[3], b[4]);
        link(&mut store, b[0], b[1]);

        let graph = ConstraintGraph::build(&store, &SolverConfig::default()).unwrap();
        let groups = group(&graph);

        assert_eq!(groups.len(), 2);
        // b[2] is unconstrained and never appears
        assert_eq!(graph.nodes.len(), 4);
        let bodies: Vec<Vec<_>> = groups
            .iter()
            .map(|g| g.bs.iter().map(|&n| graph.nodes[n].body).collect())
            .collect();
        assert_eq!(bodies, vec![vec![b[0], b[1]], vec![b[3], b[4]]]);
        assert_eq!(groups[0].cs, vec![1]);
        assert_eq!(groups[1].cs, vec![0]);
    }

    #[test]
    fn chain_is_one_group() {
        let mut store = SpaceStore::new();
        let b = row(&mut store, 4);
        link(&mut store, b[2], b[3]);
        link(&mut store, b[0], b[1]);
        link(&mut store, b[1], b[2]);

        let graph = ConstraintGraph::build(&store, &SolverConfig::default()).unwrap();
        let groups = group(&graph);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].bs, vec![0, 1, 2, 3]);
        assert_eq!(groups[0].cs, vec![0, 1, 2]);
    }

    #[test]
    fn empty_graph_has_no_groups() {
        assert!(group(&ConstraintGraph::default()).is_empty());
    }
}
