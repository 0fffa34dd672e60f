use std::collections::BTreeSet;

use maze_core::config::{LearningConfig, MazeConfig};
use maze_core::registry::kinds;
use maze_core::training::MemorySink;
use maze_core::{
    Action, AdvanceStopReason, ComponentSpec, Registries, RewardScheme, RunConfig, StateKey,
    Training,
};

/// Open 3x3 grid: start in the centre, end in the top-left corner of the ring.
fn ring_config() -> RunConfig {
    RunConfig {
        seed: 3,
        levels: 1,
        learning: LearningConfig {
            alpha: 1.0,
            gamma: 1.0,
            initial_q_value: 0.0,
            reset_qtable_per_level: false,
        },
        rewards: RewardScheme { wall: -5.0, way: -1.0, end: 10.0 },
        maze: MazeConfig {
            width: 3,
            height: 3,
            layout: Some(vec!["E..".to_owned(), ".S.".to_owned(), "...".to_owned()]),
        },
        policy: ComponentSpec::new(kinds::GREEDY),
        episode_criteria: vec![ComponentSpec::new(kinds::REACHED_END)],
        level_criteria: vec![ComponentSpec::new(kinds::EPISODE_LIMIT).with("episodes", 1.0)],
        ..Default::default()
    }
}

fn key(raw: &str) -> StateKey {
    StateKey::from_string(raw)
}

#[test]
fn test_greedy_ring_episode_matches_hand_computed_updates() {
    let mut training = Training::new(ring_config(), &Registries::builtin()).expect("valid config");
    let mut sink = MemorySink::default();
    let result = training.advance(1_000, &mut sink).expect("runs");
    assert_eq!(result.stop_reason, AdvanceStopReason::Finished);

    // Greedy takes the first maximum in Up, Right, Down, Left order. Every step into a
    // way node costs -1 and meets a successor whose best value is still 0, so each
    // visited pair lands on -1 until the final move onto the end earns 10.
    let expected = [
        ("1111", Action::Up, -1.0),
        ("0111", Action::Right, -1.0),
        ("0011", Action::Down, -1.0),
        ("1011", Action::Up, -1.0),
        ("0011", Action::Left, -1.0),
        ("0111", Action::Down, -1.0),
        ("1111", Action::Right, -1.0),
        ("1011", Action::Down, -1.0),
        ("1001", Action::Up, -1.0),
        ("1011", Action::Left, -1.0),
        ("1111", Action::Down, -1.0),
        ("1101", Action::Up, -1.0),
        ("1111", Action::Left, -1.0),
        ("1110", Action::Up, 10.0),
    ];
    assert_eq!(sink.steps.len(), expected.len());
    for (record, &(state, action, value)) in sink.steps.iter().zip(&expected) {
        assert_eq!(record.old_state, key(state));
        assert_eq!(record.action, action);
        assert_eq!(record.old_q, 0.0);
        assert_eq!(record.new_q, value);
    }

    let qtable = training.agent().qtable();
    assert_eq!(qtable.len(), 8, "every cell of the open grid has its own fingerprint");
    for &(state, action, value) in &expected {
        assert_eq!(qtable.q_value(&key(state), action), Ok(value));
    }

    let visited: BTreeSet<(StateKey, Action)> =
        expected.iter().map(|&(state, action, _)| (key(state), action)).collect();
    for state in qtable.states() {
        for action in qtable.actions(state).expect("registered") {
            let value = qtable.q_value(state, action).expect("registered");
            assert_eq!(
                value != 0.0,
                visited.contains(&(state.clone(), action)),
                "{state} {action:?} = {value}"
            );
        }
    }

    assert_eq!(sink.episodes.len(), 1);
    let episode = &sink.episodes[0];
    assert!(episode.reached_end);
    assert_eq!(episode.actions, 14);
    assert_eq!(episode.reward, -13.0 + 10.0);
    assert_eq!(episode.episode_criteria, vec!["reached_end".to_owned()]);
    assert_eq!(episode.level_criteria, vec!["episode_limit(1)".to_owned()]);
    assert_eq!(&episode.qtable, qtable);
}

#[test]
fn test_ring_qtable_exports_in_csv_form() {
    let mut training = Training::new(ring_config(), &Registries::builtin()).expect("valid config");
    training.advance(1_000, &mut MemorySink::default()).expect("runs");
    let csv = training.agent().qtable().to_csv();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("State;Up;Right;Down;Left"));
    assert!(csv.contains("\n0011;NaN;NaN;-1;-1\n"), "{csv}");
    assert!(csv.contains("\n1110;10;0;0;NaN\n"), "{csv}");
    assert_eq!(csv.lines().count(), 9);
}
