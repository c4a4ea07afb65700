//! Shipped scenario files load, validate and play.

use std::path::PathBuf;

use conquest_headless::{run_game, RunConfig, Scenario};

fn scenario_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

#[test]
fn test_every_shipped_scenario_validates() {
    let mut found = 0;
    for entry in std::fs::read_dir(scenario_dir()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("ron") {
            continue;
        }
        let scenario = Scenario::load(&path).unwrap();
        scenario.validate().unwrap();
        found += 1;
    }
    assert!(found > 0);
}

#[test]
fn test_crossroads_overrides_rules_and_plays() {
    let scenario = Scenario::load(scenario_dir().join("crossroads.ron")).unwrap();
    assert_eq!(scenario.rules.max_turns, Some(30));
    assert_eq!(scenario.rules.max_moves_per_turn, 3);

    let outcome = run_game(&scenario, &RunConfig::new("crossroads")).unwrap();
    assert!(outcome.final_state.is_game_over());
    assert!(outcome.metrics.turns <= 30);
}
