//! Integration tests for complete Streets flows.
//!
//! These tests verify end-to-end scenarios including:
//! - Reading and writing the JSON wire format
//! - Scoring finished sheets
//! - Whole games played by the move strategies, with every turn validated

use rand::prelude::*;
use serde_json::{json, Value};
use streets_core::{
    score, score_breakdown, standings, strategy_for, validate_move, CityPlan, ConstructionCard,
    Criteria, Effect, GameState, HouseValue, MoveStrategy, PlayerState, SearchSettings,
    SpecialCriteria, Street,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// Wire form of an empty street with `len` homes.
fn blank_street(len: usize) -> Value {
    let mut homes = vec![json!("blank"), json!(false)];
    homes.extend((1..len).map(|_| json!([false, "blank", false])));
    json!({ "homes": homes, "parks": 0, "pools": [false, false, false] })
}

fn standard_plans() -> [CityPlan; 3] {
    [
        CityPlan::new(Criteria::Estates(vec![1, 1, 2, 6]), 1, 8, 4).unwrap(),
        CityPlan::new(Criteria::Special(SpecialCriteria::TwoStreetsAllPools), 2, 10, 5)
            .unwrap(),
        CityPlan::new(Criteria::Estates(vec![3, 4]), 3, 12, 7).unwrap(),
    ]
}

fn table(plans: [CityPlan; 3], won: [bool; 3], cards: [(u8, Effect); 3]) -> GameState {
    GameState::new(
        plans,
        won,
        cards.map(|(n, e)| ConstructionCard::new(n, e).unwrap()),
        cards.map(|(_, e)| e),
    )
    .unwrap()
}

/// Draw three random face-up cards.
fn draw(rng: &mut StdRng) -> [(u8, Effect); 3] {
    let mut card = || {
        let number = rng.gen_range(1..=15);
        let effect = *Effect::ALL.choose(rng).unwrap();
        (number, effect)
    };
    [card(), card(), card()]
}

/// Play rounds until every sheet is finished or `rounds` runs out, checking
/// each turn with the validator. Returns the final sheets.
fn play_game(strategies: &[Box<dyn MoveStrategy>], seed: u64, rounds: usize) -> Vec<PlayerState> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut won = [false; 3];
    let mut sheets = vec![PlayerState::empty(); strategies.len()];

    for _ in 0..rounds {
        if sheets.iter().any(PlayerState::is_game_over) {
            break;
        }
        let game = table(standard_plans(), won, draw(&mut rng));
        let mut next_sheets = Vec::with_capacity(sheets.len());
        for (strategy, sheet) in strategies.iter().zip(&sheets) {
            let next = strategy.next_move(&game, sheet).unwrap();
            if let Err(err) = validate_move(&game, sheet, &next) {
                panic!("{} produced an illegal move: {}", strategy.name(), err);
            }
            next_sheets.push(next);
        }
        for sheet in &next_sheets {
            for (slot, score) in sheet.city_plan_score().iter().enumerate() {
                won[slot] |= score.is_some();
            }
        }
        sheets = next_sheets;
    }
    sheets
}

// =============================================================================
// 1. Wire Format Tests
// =============================================================================

mod wire_format {
    use super::*;

    #[test]
    fn test_fenced_street_round_trip() {
        let wire = json!({
            "homes": [1, false, [true, 2, true], [false, 3, true], [false, 4, true],
                      [true, 5, false], [false, 6, false], [false, 7, false],
                      [false, 8, false], [false, 9, false], [false, 10, false]],
            "parks": 3,
            "pools": [false, true, true]
        });
        let street: Street = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(street.len(), 10);
        assert_eq!(street.parks_score(), 10);
        assert_eq!(serde_json::to_value(&street).unwrap(), wire);
    }

    #[test]
    fn test_bis_and_roundabout_round_trip() {
        let wire = json!({
            "homes": [1, false, [false, [1, "bis"], false], [false, 4, false],
                      [true, "roundabout", false], [true, 2, false], [false, "blank", false],
                      [false, 9, false], [false, "blank", false], [false, "blank", false],
                      [false, "blank", false], [false, 15, false]],
            "parks": 0,
            "pools": [true, false, false]
        });
        let street: Street = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(street.index(), 1);
        assert_eq!(street.bis_count(), 1);
        assert_eq!(street.roundabout_count(), 1);
        assert_eq!(serde_json::to_value(&street).unwrap(), wire);
    }

    #[test]
    fn test_player_state_round_trip() {
        let wire = json!({
            "agents": [1, 0, 2, 0, 0, 4],
            "city-plan-score": [8, "blank", "blank"],
            "refusals": 1,
            "streets": [blank_street(10), blank_street(11), blank_street(12)],
            "temps": 5
        });
        let state: PlayerState = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(state.agents(), [1, 0, 2, 0, 0, 4]);
        assert_eq!(state.city_plan_score(), [Some(8), None, None]);
        assert_eq!(serde_json::to_value(&state).unwrap(), wire);
    }

    #[test]
    fn test_game_state_round_trip() {
        let wire = json!({
            "city-plans": [
                { "criteria": ["all houses", 0], "position": 1, "score1": 6, "score2": 2 },
                { "criteria": "all pools all parks one roundabout", "position": 2, "score1": 11, "score2": 6 },
                { "criteria": [2, 5], "position": 3, "score1": 9, "score2": 5 }
            ],
            "city-plans-won": [false, false, false],
            "construction-cards": [[1, "surveyor"], [15, "bis"], [6, "temp"]],
            "effects": ["pool", "bis", "temp"]
        });
        let game: GameState = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(
            game.plan_at(1).unwrap().criteria(),
            &Criteria::Special(SpecialCriteria::AllHousesFirstStreet)
        );
        assert_eq!(serde_json::to_value(&game).unwrap(), wire);
    }

    #[test]
    fn test_unsorted_city_plan_rejected() {
        let wire = json!({ "criteria": [8, 4, 2, 6], "position": 1, "score1": 8, "score2": 4 });
        assert!(serde_json::from_value::<CityPlan>(wire).is_err());

        let wire = json!({ "criteria": [1, 1, 2, 6], "position": 1, "score1": 8, "score2": 4 });
        assert!(serde_json::from_value::<CityPlan>(wire).is_ok());
    }

    #[test]
    fn test_invalid_streets_rejected() {
        let cases = [
            // not increasing
            json!([3, false, [false, 2, false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false]]),
            // roundabout without a fence on its right
            json!([1, false, [true, "roundabout", false], [false, 2, false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false]]),
            // blank house used in a plan
            json!(["blank", true, [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false]]),
            // house number out of range
            json!([18, false, [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false], [false, "blank", false], [false, "blank", false],
                   [false, "blank", false]]),
        ];
        for homes in cases {
            let wire = json!({ "homes": homes, "parks": 0, "pools": [false, false, false] });
            assert!(serde_json::from_value::<Street>(wire).is_err());
        }

        // pool over an empty slot
        let mut wire = blank_street(12);
        wire["pools"] = json!([false, true, false]);
        assert!(serde_json::from_value::<Street>(wire).is_err());

        // too many parks for the houses built
        let mut wire = blank_street(11);
        wire["parks"] = json!(1);
        assert!(serde_json::from_value::<Street>(wire).is_err());
    }
}

// =============================================================================
// 2. Scoring Tests
// =============================================================================

mod scoring_flow {
    use super::*;

    #[test]
    fn test_scoring_is_deterministic() {
        let mut state = PlayerState::empty();
        for (slot, num) in (0..6).zip([1u8, 3, 4, 6, 9, 10]) {
            state.place_house(1, slot, HouseValue::Number(num)).unwrap();
        }
        state.place_fence(1, 3).unwrap();
        state.place_fence(1, 6).unwrap();
        state.build_pool(1, 0).unwrap();
        state.add_agent(2).unwrap();

        let first = score(&state, &[]);
        assert_eq!(first, score(&state, &[]));
        assert_eq!(first, score_breakdown(&state, &[]).total);
    }

    #[test]
    fn test_full_breakdown() {
        let mut state = PlayerState::empty();
        // street 1: [1 3 4] [6 9 10] -> two estates of three
        for (slot, num) in (0..6).zip([1u8, 3, 4, 6, 9, 10]) {
            state.place_house(1, slot, HouseValue::Number(num)).unwrap();
        }
        state.place_fence(1, 3).unwrap();
        state.place_fence(1, 6).unwrap();
        state.build_pool(1, 0).unwrap();
        state.build_pool(1, 1).unwrap();
        state.set_parks(1, 2).unwrap();
        state.add_agent(2).unwrap();
        // the fence keeps a bis from copying slot 5
        assert!(state.place_house(1, 6, HouseValue::Bis(10)).is_err());
        state.add_refusal().unwrap();
        for _ in 0..4 {
            state.add_temp().unwrap();
        }

        let breakdown = score_breakdown(&state, &[4, 2]);
        assert_eq!(breakdown.estates, 8);
        assert_eq!(breakdown.pools, 6);
        assert_eq!(breakdown.parks, 4);
        assert_eq!(breakdown.temps, 7);
        assert_eq!(breakdown.refusal_penalty, 0);
        assert_eq!(breakdown.total, 25);
    }

    #[test]
    fn test_bis_penalty() {
        let mut state = PlayerState::empty();
        state.place_house(2, 4, HouseValue::Number(8)).unwrap();
        state.place_house(2, 5, HouseValue::Bis(8)).unwrap();
        state.place_house(2, 3, HouseValue::Bis(8)).unwrap();
        assert_eq!(score_breakdown(&state, &[]).bis_penalty, 3);
        assert_eq!(score(&state, &[]), -3);
    }

    #[test]
    fn test_standings_rank_temps_together() {
        let mut sheets = vec![PlayerState::empty(); 4];
        for (sheet, temps) in sheets.iter_mut().zip([5, 2, 5, 1]) {
            for _ in 0..temps {
                sheet.add_temp().unwrap();
            }
        }
        assert_eq!(standings(&sheets), vec![7, 4, 7, 1]);
    }
}

// =============================================================================
// 3. Full Game Tests
// =============================================================================

mod game_flow {
    use super::*;

    #[test]
    fn test_first_fit_game() {
        let strategies = vec![strategy_for(&SearchSettings::first_fit()).unwrap()];
        let sheets = play_game(&strategies, 7, 40);
        assert_eq!(sheets.len(), 1);
        assert!(sheets[0].streets().iter().any(|s| !s.is_empty()));
    }

    #[test]
    fn test_smart_against_first_fit() {
        let strategies = vec![
            strategy_for(&SearchSettings::smart().with_seed(1)).unwrap(),
            strategy_for(&SearchSettings::first_fit()).unwrap(),
        ];
        let sheets = play_game(&strategies, 2024, 40);
        let scores = standings(&sheets);
        assert_eq!(scores.len(), 2);
        assert!(sheets.iter().all(|s| s.roundabouts() <= 2));
    }

    #[test]
    fn test_seeded_games_repeat() {
        let build = || {
            vec![strategy_for(&SearchSettings::smart().with_seed(99).sequential()).unwrap()]
        };
        let first = play_game(&build(), 5, 25);
        let second = play_game(&build(), 5, 25);
        assert_eq!(first, second);
    }

    #[test]
    fn test_smart_claims_special_plan() {
        let plans = [
            CityPlan::new(Criteria::Special(SpecialCriteria::SevenTemps), 1, 6, 3).unwrap(),
            CityPlan::new(Criteria::Estates(vec![2, 2]), 2, 8, 4).unwrap(),
            CityPlan::new(Criteria::Estates(vec![1, 4]), 3, 10, 6).unwrap(),
        ];
        let game = table(plans, [true, false, false], [(8, Effect::Temp); 3]);

        let mut state = PlayerState::empty();
        for _ in 0..6 {
            state.add_temp().unwrap();
        }
        let search = strategy_for(&SearchSettings::smart().with_seed(4)).unwrap();
        let next = search.next_move(&game, &state).unwrap();

        assert_eq!(next.temps(), 7);
        assert_eq!(next.city_plan_score()[0], Some(3));
        let delta = validate_move(&game, &state, &next).unwrap();
        assert_eq!(delta.city_plan_claims.len(), 1);
    }
}
