//! Discrete lattice states and plans

/// Index of a motion primitive within the action set of a heading
pub type ActionId = u8;

/// Grid cell plus heading bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphState {
    pub x: i32,
    pub y: i32,
    pub theta: u8,
}

impl GraphState {
    pub fn new(x: i32, y: i32, theta: u8) -> Self {
        Self { x, y, theta }
    }
}

/// Discrete plan: a start state followed by actions, each with the
/// obstacle penalty it accumulated when it was planned.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticePlan {
    pub start: GraphState,
    actions: Vec<(ActionId, f64)>,
}

impl Default for LatticePlan {
    fn default() -> Self {
        Self::new(GraphState::new(0, 0, 0))
    }
}

impl LatticePlan {
    pub fn new(start: GraphState) -> Self {
        Self {
            start,
            actions: Vec::new(),
        }
    }

    pub fn push(&mut self, action: ActionId, penalty: f64) {
        self.actions.push((action, penalty));
    }

    /// Append another plan. An empty plan adopts the other's start state.
    pub fn append(&mut self, other: &LatticePlan) {
        if self.actions.is_empty() {
            self.start = other.start;
        }
        self.actions.extend_from_slice(&other.actions);
    }

    pub fn truncate(&mut self, len: usize) {
        self.actions.truncate(len);
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn action(&self, i: usize) -> ActionId {
        self.actions[i].0
    }

    pub fn penalty(&self, i: usize) -> f64 {
        self.actions[i].1
    }

    pub fn actions(&self) -> &[(ActionId, f64)] {
        &self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_to_empty_takes_start() {
        let mut a = LatticePlan::new(GraphState::new(0, 0, 0));
        let mut b = LatticePlan::new(GraphState::new(3, 4, 2));
        b.push(0, 0.0);
        b.push(3, 0.5);
        a.append(&b);
        assert_eq!(a.start, GraphState::new(3, 4, 2));
        assert_eq!(a.len(), 2);
        assert_eq!(a.action(1), 3);
        assert_eq!(a.penalty(1), 0.5);
    }

    #[test]
    fn test_append_keeps_start_when_non_empty() {
        let mut a = LatticePlan::new(GraphState::new(1, 1, 0));
        a.push(0, 0.0);
        let mut b = LatticePlan::new(GraphState::new(2, 1, 0));
        b.push(1, 0.0);
        a.append(&b);
        assert_eq!(a.start, GraphState::new(1, 1, 0));
        assert_eq!(a.actions(), &[(0, 0.0), (1, 0.0)]);
    }
}
