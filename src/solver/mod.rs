pub mod graph;
pub mod group;
pub mod propagate;
pub mod report;
pub mod sort;

pub use graph::{ConstraintGraph, Edge, FaceData, Node};
pub use group::ConstraintGroup;
pub use propagate::Conflict;
pub use report::{GroupReport, SolveReport, SolveResult};
pub use sort::{LoopConstraint, SortedGroup};

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::error::Result;
use crate::math::{translation, TOLERANCE};
use crate::model::SpaceStore;

/// Places bodies so that every face distance constraint in a store holds.
///
/// One call runs build → group → sort → propagate → report. Groups are
/// independent: a failing group leaves its bodies where they were and does
/// not stop the others from being solved.
#[derive(Debug, Clone, Default)]
pub struct SpaceSolver {
    config: SolverConfig,
}

impl SpaceSolver {
    /// Creates a new solver.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Returns the solver configuration.
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves the store and writes the new transforms of moved bodies back
    /// onto it.
    ///
    /// # Errors
    ///
    /// Returns a build error if a constraint is malformed; the store is
    /// left untouched in that case.
    pub fn execute(&self, store: &mut SpaceStore) -> Result<SolveReport> {
        let report = self.solve(store)?;
        let mut written = 0_usize;
        for (&body, matrix) in &report.transforms {
            let data = store.body_mut(body)?;
            if data.world_matrix() != *matrix {
                data.matrix = Some(*matrix);
                written += 1;
            }
        }
        debug!(written, "wrote back body transforms");
        Ok(report)
    }

    /// Solves the store without modifying it.
    ///
    /// # Errors
    ///
    /// Returns a build error if a constraint is malformed.
    pub fn solve(&self, store: &SpaceStore) -> Result<SolveReport> {
        if store.constraint_count() == 0 {
            debug!("no constraints to solve");
            return Ok(SolveReport::empty());
        }

        let mut graph = ConstraintGraph::build(store, &self.config)?;
        let groups = group::group(&graph);
        info!(
            bodies = graph.nodes.len(),
            constraints = graph.edges.len(),
            groups = groups.len(),
            "solving face distance constraints"
        );

        let mut reports = Vec::with_capacity(groups.len());
        let mut transforms = BTreeMap::new();
        let mut rebuild = Vec::new();

        for (index, group) in groups.iter().enumerate() {
            let (anchored, failure) = match sort::sort(&mut graph, group, &self.config) {
                Err(LoopConstraint { edges }) => {
                    (false, Some((SolveResult::LoopConstraint, edges)))
                }
                Ok(sorted) => (
                    sorted.anchored,
                    propagate::propagate(&mut graph, &sorted.top_sorts, &self.config)
                        .err()
                        .map(|Conflict { edges, .. }| (SolveResult::OverConstraint, edges)),
                ),
            };

            let (result, conflicts) = match failure {
                Some((result, edges)) => {
                    warn!(
                        group = index,
                        ?result,
                        conflicts = edges.len(),
                        "constraint group cannot be solved"
                    );
                    (result, edges.iter().map(|&e| graph.edges[e].cst).collect())
                }
                None => {
                    debug_assert!(group.cs.iter().all(|&e| graph.edges[e].solved));
                    for &n in &group.bs {
                        debug_assert!(graph.nodes[n].solved);
                        let node = &graph.nodes[n];
                        if node.is_fixed {
                            continue;
                        }
                        let moved = node.delta.norm() > TOLERANCE;
                        let matrix = if moved {
                            translation(&node.delta) * node.geo
                        } else {
                            node.geo
                        };
                        transforms.insert(node.body, matrix);
                        if moved && node.is_pm_model {
                            rebuild.push(node.body);
                        }
                    }
                    (SolveResult::Success, Vec::new())
                }
            };

            reports.push(GroupReport {
                bodies: group.bs.iter().map(|&n| graph.nodes[n].body).collect(),
                constraints: group.cs.iter().map(|&e| graph.edges[e].cst).collect(),
                anchored,
                result,
                conflicts,
            });
        }

        let report = SolveReport::from_groups(reports, transforms, rebuild);
        info!(result = ?report.result, "solve finished");
        Ok(report)
    }
}
