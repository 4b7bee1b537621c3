use std::collections::HashSet;

/// (character id, region id)
pub type OverlapPair = (u64, u64);

/// Trigger enter/exit transitions for one frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TriggerTransitions {
    pub entered: Vec<OverlapPair>,
    pub exited: Vec<OverlapPair>,
}

impl TriggerTransitions {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Diffs this frame's overlap set against the previous one.
/// Output is sorted so callers see a stable order.
pub fn compute_touch_transitions(
    current: &HashSet<OverlapPair>,
    previous: &HashSet<OverlapPair>,
) -> TriggerTransitions {
    let mut entered: Vec<_> = current.difference(previous).copied().collect();
    let mut exited: Vec<_> = previous.difference(current).copied().collect();
    entered.sort_unstable();
    exited.sort_unstable();
    TriggerTransitions { entered, exited }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_touch_transitions() {
        let previous = HashSet::from([(1, 10), (1, 11)]);
        let current = HashSet::from([(1, 11), (1, 12), (2, 10)]);

        let transitions = compute_touch_transitions(&current, &previous);
        assert_eq!(transitions.entered, vec![(1, 12), (2, 10)]);
        assert_eq!(transitions.exited, vec![(1, 10)]);
    }

    #[test]
    fn test_steady_overlap_has_no_transitions() {
        let set = HashSet::from([(1, 10)]);
        assert!(compute_touch_transitions(&set, &set).is_empty());
    }
}
