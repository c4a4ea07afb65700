//! Test fixtures and helpers.
//!
//! Pre-built boards and game states for consistent testing.

use conquest_core::prelude::*;

/// Three regions in a line: `Home(temple) - Ford - Keep(temple)`.
///
/// # Panics
///
/// Never in practice; the board is statically valid.
#[must_use]
pub fn duel_map() -> MapData {
    MapData::from_edges(
        &[("Home", (0, 0), true), ("Ford", (1, 0), false), ("Keep", (2, 0), true)],
        &[(0, 1), (1, 2)],
    )
    .expect("duel map is valid")
}

/// The canonical two-player opening: player 0 holds regions 0 (2 soldiers)
/// and 1 (3 soldiers), player 1 holds region 2 (1 soldier), no faith.
///
/// # Panics
///
/// Never in practice; the setup is statically valid.
#[must_use]
pub fn duel_state(seed: &str) -> GameState {
    duel_setup(seed, Player::human(0, "Attacker"), Player::human(1, "Defender"))
}

/// [`duel_state`] with both seats played by the AI.
#[must_use]
pub fn duel_state_ai(seed: &str) -> GameState {
    duel_setup(
        seed,
        Player::ai(0, "Attacker", None),
        Player::ai(1, "Defender", Some("cautious")),
    )
}

fn duel_setup(seed: &str, a: Player, b: Player) -> GameState {
    GameSetup::new(duel_map(), seed)
        .player(a)
        .player(b)
        .place(0, 0, 2)
        .place(1, 0, 3)
        .place(2, 1, 1)
        .build()
        .expect("duel setup is valid")
}

/// `n` regions in a line, temples on even indices.
///
/// # Panics
///
/// Panics if `n` is zero.
#[must_use]
pub fn line_map(n: usize) -> MapData {
    let names: Vec<String> = (0..n).map(|i| format!("Line{i}")).collect();
    let regions: Vec<(&str, (i32, i32), bool)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), (i as i32, 0), i % 2 == 0))
        .collect();
    let edges: Vec<(RegionId, RegionId)> = (1..n).map(|i| (i - 1, i)).collect();
    MapData::from_edges(&regions, &edges).expect("line map is valid")
}

/// `n` regions in a ring, temples on every third region starting at 0.
///
/// # Panics
///
/// Panics if `n` is less than 3.
#[must_use]
pub fn ring_map(n: usize) -> MapData {
    assert!(n >= 3, "a ring needs at least three regions");
    let names: Vec<String> = (0..n).map(|i| format!("Ring{i}")).collect();
    let regions: Vec<(&str, (i32, i32), bool)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), (i as i32, 0), i % 3 == 0))
        .collect();
    let edges: Vec<(RegionId, RegionId)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    MapData::from_edges(&regions, &edges).expect("ring map is valid")
}

/// An all-AI game on a ring of `3 * players` regions. Each player starts on
/// a temple region with `soldiers` soldiers.
///
/// # Panics
///
/// Panics if `players` is below 2 or above the default player limit.
#[must_use]
pub fn ring_state(players: u8, soldiers: u32, seed: &str) -> GameState {
    let map = ring_map(usize::from(players) * 3);
    let mut setup = GameSetup::new(map, seed);
    for slot in 0..players {
        let personality = if slot % 2 == 0 { "aggressive" } else { "cautious" };
        setup = setup
            .player(Player::ai(slot, format!("Bot{slot}"), Some(personality)))
            .place(usize::from(slot) * 3, slot, soldiers);
    }
    setup.build().expect("ring setup is valid")
}

/// Apply a scripted command sequence, returning every intermediate state
/// after the initial one.
///
/// # Panics
///
/// Panics if any command is rejected.
#[must_use]
pub fn play(state: &GameState, commands: &[Command]) -> Vec<GameState> {
    let processor = CommandProcessor::new();
    let mut states = Vec::with_capacity(commands.len());
    let mut current = state.clone();
    for command in commands {
        current = match processor.process(&current, command.clone()) {
            Ok(executed) => executed.into_state(),
            Err(err) => panic!("scripted command {command:?} failed: {err}"),
        };
        states.push(current.clone());
    }
    states
}
