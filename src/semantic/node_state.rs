use crate::{ast::ast::NodeId, errors::errors::InternalError, semantic::symbols::ids::ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    #[default]
    Unvisited,
    Unresolved,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeState {
    pub status: NodeStatus,
    /// Scope active when the node was last visited.
    pub scope: Option<ScopeId>,
}

/// Per-node progress bookkeeping for the type fixpoint.
///
/// Status only moves forward: `Unvisited -> Unresolved -> Completed`.
#[derive(Debug, Default, Clone)]
pub struct NodeStateTracker {
    states: Vec<NodeState>,
    progressed: bool,
}

impl NodeStateTracker {
    pub fn new(node_count: usize) -> Self {
        NodeStateTracker {
            states: vec![NodeState::default(); node_count],
            progressed: false,
        }
    }

    fn state_mut(&mut self, node: NodeId) -> &mut NodeState {
        let index = node.index();
        if self.states.len() <= index {
            self.states.resize(index + 1, NodeState::default());
        }
        &mut self.states[index]
    }

    pub fn state(&self, node: NodeId) -> NodeState {
        self.states.get(node.index()).copied().unwrap_or_default()
    }

    pub fn status(&self, node: NodeId) -> NodeStatus {
        self.state(node).status
    }

    pub fn mark_unresolved(&mut self, node: NodeId, scope: ScopeId) -> Result<(), InternalError> {
        let state = self.state_mut(node);
        if state.status == NodeStatus::Completed {
            return Err(InternalError::StateRegression { node: node.0 });
        }

        state.status = NodeStatus::Unresolved;
        state.scope = Some(scope);
        Ok(())
    }

    pub fn mark_completed(&mut self, node: NodeId, scope: ScopeId) {
        let state = self.state_mut(node);
        if state.status == NodeStatus::Completed {
            return;
        }

        let was_pending = state.status == NodeStatus::Unresolved;
        state.status = NodeStatus::Completed;
        state.scope = Some(scope);
        if was_pending {
            self.progressed = true;
        }
    }

    /// Notes that a pending node gained a more specific fact without completing.
    pub fn record_progress(&mut self) {
        self.progressed = true;
    }

    /// Pending nodes in id order, each with the scope to resume it in.
    pub fn unresolved(&self) -> Vec<(NodeId, ScopeId)> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.status == NodeStatus::Unresolved)
            .filter_map(|(index, state)| Some((NodeId(index as u32), state.scope?)))
            .collect()
    }

    /// Returns and clears the progress flag.
    pub fn take_progress(&mut self) -> bool {
        std::mem::take(&mut self.progressed)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ast::ast::NodeId, errors::errors::InternalError, semantic::symbols::ids::ScopeId};

    use super::{NodeStateTracker, NodeStatus};

    #[test]
    fn test_states_move_forward_only() {
        let mut tracker = NodeStateTracker::new(4);
        let node = NodeId(2);

        assert_eq!(tracker.status(node), NodeStatus::Unvisited);
        tracker.mark_unresolved(node, ScopeId(1)).unwrap();
        assert_eq!(tracker.unresolved(), vec![(node, ScopeId(1))]);

        tracker.mark_completed(node, ScopeId(1));
        assert_eq!(tracker.status(node), NodeStatus::Completed);
        assert_eq!(
            tracker.mark_unresolved(node, ScopeId(1)),
            Err(InternalError::StateRegression { node: 2 })
        );
        assert!(tracker.unresolved().is_empty());
    }

    #[test]
    fn test_progress_is_consumed() {
        let mut tracker = NodeStateTracker::new(2);

        // First visits do not count as progress.
        tracker.mark_completed(NodeId(0), ScopeId(0));
        assert!(!tracker.take_progress());

        tracker.mark_unresolved(NodeId(1), ScopeId(0)).unwrap();
        tracker.mark_completed(NodeId(1), ScopeId(0));
        assert!(tracker.take_progress());
        assert!(!tracker.take_progress());

        tracker.record_progress();
        assert!(tracker.take_progress());
    }

    #[test]
    fn test_unresolved_is_sorted_by_node() {
        let mut tracker = NodeStateTracker::new(0);
        tracker.mark_unresolved(NodeId(9), ScopeId(3)).unwrap();
        tracker.mark_unresolved(NodeId(1), ScopeId(2)).unwrap();

        assert_eq!(
            tracker.unresolved(),
            vec![(NodeId(1), ScopeId(2)), (NodeId(9), ScopeId(3))]
        );
    }
}
