use learnify_schema::paths::PathProgressState;

/// Fresh progress positioned at the first node.
pub fn start(node_ids: &[i64]) -> PathProgressState {
    PathProgressState {
        current_node_id: node_ids.first().copied(),
        ..PathProgressState::default()
    }
}

/// Marks a node done. `node_ids` must be in path order.
pub fn complete_node(mut state: PathProgressState, node_ids: &[i64], node_id: i64) -> PathProgressState {
    if !state.completed_node_ids.contains(&node_id) {
        state.completed_node_ids.push(node_id);
    }
    state.current_node_id = node_ids
        .iter()
        .copied()
        .find(|id| !state.completed_node_ids.contains(id));
    state.overall_progress = overall_progress(state.completed_node_ids.len(), node_ids.len());
    state
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn overall_progress(completed: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    (completed.min(total) as f64 / total as f64 * 100.0).round() as i64
}

/// Replaces the skill lists after a diagnostic.
pub fn apply_skills(
    mut state: PathProgressState,
    mastered: &[String],
    in_progress: &[String],
) -> PathProgressState {
    state.mastered_skills = mastered.to_vec();
    state.in_progress_skills = in_progress.to_vec();
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: [i64; 3] = [10, 20, 30];

    #[test]
    fn starts_at_first_node() {
        let state = start(&NODES);
        assert_eq!(state.current_node_id, Some(10));
        assert_eq!(state.overall_progress, 0);
        assert_eq!(start(&[]).current_node_id, None);
    }

    #[test]
    fn completion_advances_to_first_unfinished() {
        let state = complete_node(start(&NODES), &NODES, 20);
        assert_eq!(state.current_node_id, Some(10));
        assert_eq!(state.overall_progress, 33);

        let state = complete_node(state, &NODES, 10);
        assert_eq!(state.current_node_id, Some(30));
        assert_eq!(state.overall_progress, 67);
    }

    #[test]
    fn completing_twice_counts_once() {
        let state = complete_node(start(&NODES), &NODES, 10);
        let state = complete_node(state, &NODES, 10);
        assert_eq!(state.completed_node_ids, vec![10]);
    }

    #[test]
    fn finishing_clears_current_node() {
        let state = NODES
            .iter()
            .fold(start(&NODES), |s, &id| complete_node(s, &NODES, id));
        assert_eq!(state.current_node_id, None);
        assert_eq!(state.overall_progress, 100);
    }

    #[test]
    fn skills_are_replaced() {
        let state = apply_skills(start(&NODES), &["a".into()], &["b".into()]);
        let state = apply_skills(state, &[], &["c".into()]);
        assert!(state.mastered_skills.is_empty());
        assert_eq!(state.in_progress_skills, vec!["c"]);
    }
}
