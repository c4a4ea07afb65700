//! Determinism testing utilities.
//!
//! Provides a harness for verifying that games produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Every dice roll comes from the generator stored inside the
//! [`GameState`], so two states built from the same setup must stay
//! identical for as long as they receive the same commands. Sources of
//! divergence to watch for:
//!
//! - **Hash map iteration order**: state containers are vectors or
//!   `BTreeMap`s, never `HashMap`s.
//! - **System randomness**: no generator other than the seeded one.
//! - **Lossy snapshots**: a JSON or bincode round trip must carry the
//!   generator position along with the board.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: single commands and battles
//! 2. **Property tests**: random seeds and forces still reproduce
//! 3. **Integration tests**: whole AI games are reproducible
//! 4. **Parallel tests**: N games on N threads all match

use std::thread;

use conquest_core::prelude::*;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps played per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of games played on parallel threads.
#[derive(Debug, Clone)]
pub struct ParallelGameResult {
    /// Final state hash from each game.
    pub hashes: Vec<u64>,
    /// Number of AI turns each game played.
    pub turns: u64,
    /// Number of games run.
    pub num_games: usize,
}

impl ParallelGameResult {
    /// Check if all games produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all games matched.
    ///
    /// # Panics
    ///
    /// Panics if games produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel games diverged!\n\
                 Games: {}\n\
                 Turns: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_games,
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use conquest_test_utils::determinism::{play_ai_turn, verify_determinism};
/// use conquest_test_utils::fixtures::ring_state;
///
/// let result = verify_determinism(
///     3,
///     8,
///     || ring_state(3, 4, "doc"),
///     play_ai_turn,
///     |state| state.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play one computer player's turn in place.
///
/// Does nothing once the game is over or a human is to move.
///
/// # Panics
///
/// Panics if the turn processor reports an error.
pub fn play_ai_turn(state: &mut GameState) {
    let run = TurnProcessor::new()
        .with_turn_limit(1)
        .run(state.clone())
        .unwrap_or_else(|err| panic!("AI turn failed: {err}"));
    *state = run.state;
}

/// Play `turns` AI turns from a fresh `setup` on every run and compare hashes.
pub fn verify_game_determinism<F>(runs: usize, turns: u64, setup: F) -> DeterminismResult
where
    F: Fn() -> GameState,
{
    verify_determinism(runs, turns, setup, play_ai_turn, GameState::state_hash)
}

/// Play N games on scoped threads and collect their final hashes.
///
/// # Panics
///
/// Panics if a game thread panics.
pub fn run_parallel_games_scoped<F>(setup_fn: F, num_games: usize, turns: u64) -> ParallelGameResult
where
    F: Fn() -> GameState + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut state = setup_fn();
                    for _ in 0..turns {
                        play_ai_turn(&mut state);
                    }
                    state.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    ParallelGameResult {
        hashes,
        turns,
        num_games,
    }
}

/// Compare two games turn by turn, finding the first divergence.
///
/// # Returns
///
/// `None` if the games stay identical, `Some(turn)` for the first AI turn
/// after which their hashes differ (0 for the opening state).
pub fn find_first_divergence<F>(setup_fn: F, turns: u64) -> Option<u64>
where
    F: Fn() -> GameState,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        play_ai_turn(&mut first);
        play_ai_turn(&mut second);

        if first.state_hash() != second.state_hash() {
            return Some(turn);
        }
    }

    None
}

/// Verify that JSON and bincode snapshots restore a game exactly.
///
/// Plays `turns` AI turns, restores the state from both encodings, and
/// then plays one more turn on the original and on each copy. The copies
/// must match the original both before and after that turn, which also
/// checks that the dice generator resumes where it stopped.
pub fn verify_serialization_determinism<F>(setup_fn: F, turns: u64) -> bool
where
    F: Fn() -> GameState,
{
    let mut state = setup_fn();
    for _ in 0..turns {
        play_ai_turn(&mut state);
    }

    let Ok(json) = state.to_json() else {
        return false;
    };
    let Ok(mut from_json) = GameState::from_json(&json) else {
        return false;
    };
    let Ok(bytes) = bincode::serialize(&state) else {
        return false;
    };
    let Ok(mut from_bytes) = bincode::deserialize::<GameState>(&bytes) else {
        return false;
    };

    if from_json.state_hash() != state.state_hash() || from_bytes.state_hash() != state.state_hash() {
        return false;
    }

    play_ai_turn(&mut state);
    play_ai_turn(&mut from_json);
    play_ai_turn(&mut from_bytes);

    from_json == state && from_bytes == state
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of games and battles.
pub mod strategies {
    use conquest_core::prelude::*;
    use proptest::prelude::*;

    /// Seed strings as players would type them.
    pub fn arb_seed() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 _-]{0,24}"
    }

    /// Soldier count for one side of a battle.
    ///
    /// Range: 1 to 40
    pub fn arb_force() -> impl Strategy<Value = u32> {
        1u32..=40
    }

    /// Attacker and defender counts.
    pub fn arb_battle() -> impl Strategy<Value = (u32, u32)> {
        (arb_force(), arb_force())
    }

    /// Any temple upgrade path.
    pub fn arb_upgrade_kind() -> impl Strategy<Value = UpgradeKind> {
        prop_oneof![
            Just(UpgradeKind::Water),
            Just(UpgradeKind::Fire),
            Just(UpgradeKind::Earth),
            Just(UpgradeKind::Air),
        ]
    }

    /// Any build action.
    pub fn arb_build_action() -> impl Strategy<Value = BuildAction> {
        prop_oneof![
            Just(BuildAction::RecruitSoldier),
            Just(BuildAction::Rebuild),
            arb_upgrade_kind().prop_map(BuildAction::Upgrade),
        ]
    }

    /// Any command on a board of `regions` regions with `players` seats.
    ///
    /// Most generated commands are invalid for a given state; they are
    /// meant to exercise rejection paths.
    pub fn arb_command(regions: usize, players: u8) -> impl Strategy<Value = Command> {
        let region = 0..regions;
        let player = 0..players;
        prop_oneof![
            (player.clone(), region.clone(), region.clone(), 0u32..8).prop_map(
                |(player, from, to, count)| Command::MoveArmy {
                    player,
                    from,
                    to,
                    count,
                }
            ),
            (player.clone(), region, arb_build_action()).prop_map(|(player, region, action)| {
                Command::Build {
                    player,
                    region,
                    action,
                }
            }),
            player.clone().prop_map(|player| Command::EndTurn { player }),
            player.prop_map(|player| Command::Resign { player }),
        ]
    }

    /// Generate a sequence of commands.
    pub fn arb_command_sequence(
        regions: usize,
        players: u8,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<Command>> {
        prop::collection::vec(arb_command(regions, players), 0..=max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{duel_state_ai, ring_state};
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(5, 100, || 0u64, |n| *n += 3, |n| *n);
        result.assert_deterministic();
        assert_eq!(result.unique_hashes(), vec![300]);
    }

    #[test]
    fn test_nondeterminism_is_reported() {
        let counter = std::cell::Cell::new(0u64);
        let result = verify_determinism(
            3,
            1,
            || {
                counter.set(counter.get() + 1);
                counter.get()
            },
            |_| {},
            |n| *n,
        );
        assert!(!result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 3);
    }

    #[test]
    fn test_ring_game_determinism() {
        verify_game_determinism(3, 24, || ring_state(4, 5, "ring-det")).assert_deterministic();
    }

    #[test]
    fn test_duel_game_determinism() {
        verify_game_determinism(3, 10, || duel_state_ai("duel-det")).assert_deterministic();
    }

    #[test]
    fn test_different_seeds_usually_diverge() {
        let a = verify_game_determinism(1, 20, || ring_state(4, 8, "alpha"));
        let b = verify_game_determinism(1, 20, || ring_state(4, 8, "omega"));
        // Same board, different dice.
        assert_ne!(a.hashes, b.hashes);
    }

    #[test]
    fn test_find_divergence_on_deterministic_game() {
        assert_eq!(find_first_divergence(|| ring_state(3, 6, "diverge"), 15), None);
    }

    #[test]
    fn test_serialization_preserves_opening() {
        assert!(verify_serialization_determinism(|| ring_state(3, 6, "snap"), 0));
    }

    #[test]
    fn test_serialization_preserves_midgame() {
        assert!(verify_serialization_determinism(|| ring_state(4, 6, "snap-mid"), 12));
    }

    #[test]
    fn test_parallel_games_match() {
        run_parallel_games_scoped(|| ring_state(4, 5, "parallel"), 4, 16).assert_deterministic();
    }

    #[test]
    fn test_play_ai_turn_stops_at_human() {
        let mut state = crate::fixtures::duel_state("human");
        let before = state.clone();
        play_ai_turn(&mut state);
        assert_eq!(state, before);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_battles_reproduce_for_any_seed(seed in arb_seed(), (a, d) in arb_battle()) {
            let mut first = DeterministicRng::new(&seed);
            let mut second = DeterministicRng::new(&seed);
            let battle = Battle::default();
            prop_assert_eq!(battle.fight(&mut first, a, d), battle.fight(&mut second, a, d));
            prop_assert_eq!(first.get_state(), second.get_state());
        }

        #[test]
        fn test_random_commands_never_break_invariants(
            commands in arb_command_sequence(6, 3, 24),
        ) {
            let processor = CommandProcessor::new().with_invariant_checks(true);
            let mut state = ring_state(2, 6, "fuzz");
            for command in commands {
                match processor.process(&state, command) {
                    Ok(executed) => state = executed.into_state(),
                    Err(err) => prop_assert!(err.is_rejection(), "unexpected error: {}", err),
                }
                prop_assert!(state.check_invariants().is_ok());
            }
        }
    }
}
