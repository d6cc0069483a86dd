use std::collections::BTreeMap;

use crate::math::Matrix4;
use crate::model::{BodyId, ConstraintId, FaceDistanceConstraint, SpaceStore};

/// Outcome of solving a group, or of a whole solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveResult {
    /// Every constraint is satisfied.
    Success,
    /// A body is required to be in two places at once.
    OverConstraint,
    /// A group without a fixed body has a cycle that does not close.
    LoopConstraint,
}

impl SolveResult {
    /// Returns `true` for [`SolveResult::Success`].
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Result of one connected group.
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Bodies of the group, ascending by ID.
    pub bodies: Vec<BodyId>,
    /// Constraints of the group, in store order.
    pub constraints: Vec<ConstraintId>,
    /// Whether the group contains a fixed body.
    pub anchored: bool,
    /// Outcome of the group.
    pub result: SolveResult,
    /// Constraints responsible for a failure. Empty on success.
    pub conflicts: Vec<ConstraintId>,
}

/// Result of a solve call.
#[derive(Debug, Clone)]
pub struct SolveReport {
    /// [`SolveResult::Success`] if every group succeeded, otherwise the
    /// result of the first failing group.
    pub result: SolveResult,
    /// One report per group, ordered by smallest body ID.
    pub groups: Vec<GroupReport>,
    /// New world transforms of the movable bodies of successful groups.
    pub transforms: BTreeMap<BodyId, Matrix4>,
    /// Conflicts of all failing groups, group by group.
    pub conflicts: Vec<ConstraintId>,
    /// Parametric bodies that moved and may need a rebuild.
    pub rebuild: Vec<BodyId>,
}

impl SolveReport {
    /// A report for a call with nothing to solve.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_groups(Vec::new(), BTreeMap::new(), Vec::new())
    }

    /// Assembles the report from its group reports.
    #[must_use]
    pub fn from_groups(
        groups: Vec<GroupReport>,
        transforms: BTreeMap<BodyId, Matrix4>,
        rebuild: Vec<BodyId>,
    ) -> Self {
        let result = groups
            .iter()
            .map(|g| g.result)
            .find(|r| !r.is_success())
            .unwrap_or(SolveResult::Success);
        let conflicts = groups
            .iter()
            .flat_map(|g| g.conflicts.iter().copied())
            .collect();
        Self {
            result,
            groups,
            transforms,
            conflicts,
            rebuild,
        }
    }

    /// Returns `true` if every group succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }

    /// Looks up the conflicting constraints in the store.
    ///
    /// Constraints removed since the solve are skipped.
    #[must_use]
    pub fn conflicting_constraints(&self, store: &SpaceStore) -> Vec<FaceDistanceConstraint> {
        self.conflicts
            .iter()
            .filter_map(|&id| store.constraint(id).ok().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn group(result: SolveResult, conflicts: Vec<ConstraintId>) -> GroupReport {
        GroupReport {
            bodies: Vec::new(),
            constraints: Vec::new(),
            anchored: true,
            result,
            conflicts,
        }
    }

    #[test]
    fn first_failing_group_decides() {
        let mut ids: SlotMap<ConstraintId, ()> = SlotMap::with_key();
        let (c1, c2) = (ids.insert(()), ids.insert(()));

        let report = SolveReport::from_groups(
            vec![
                group(SolveResult::Success, vec![]),
                group(SolveResult::LoopConstraint, vec![c1]),
                group(SolveResult::OverConstraint, vec![c2]),
            ],
            BTreeMap::new(),
            Vec::new(),
        );
        assert_eq!(report.result, SolveResult::LoopConstraint);
        assert_eq!(report.conflicts, vec![c1, c2]);
        assert!(!report.is_success());
    }

    #[test]
    fn empty_report_succeeds() {
        let report = SolveReport::empty();
        assert!(report.is_success());
        assert!(report.groups.is_empty());
        assert!(report.transforms.is_empty());
    }
}
