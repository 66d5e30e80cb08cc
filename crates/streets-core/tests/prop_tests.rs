//! Property-based tests for scoring and the move search.
//!
//! Random card sequences are played through both strategies; every move
//! they produce must pass the validator, and scoring must stay a pure
//! function of the sheet.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use streets_core::{
    score, score_breakdown, strategy_for, validate_move, CityPlan, ConstructionCard, Criteria,
    Effect, GameState, PlayerState, SearchSettings, SpecialCriteria,
};

fn effect_strategy() -> impl Strategy<Value = Effect> {
    prop::sample::select(Effect::ALL.to_vec())
}

fn cards_strategy() -> impl Strategy<Value = [(u8, Effect); 3]> {
    prop::array::uniform3((1u8..=15, effect_strategy()))
}

fn table(cards: [(u8, Effect); 3], won: [bool; 3]) -> GameState {
    let plans = [
        CityPlan::new(Criteria::Special(SpecialCriteria::SevenTemps), 1, 6, 3).unwrap(),
        CityPlan::new(Criteria::Special(SpecialCriteria::TwoStreetsAllParks), 2, 8, 4).unwrap(),
        CityPlan::new(Criteria::Estates(vec![2, 3]), 3, 9, 5).unwrap(),
    ];
    GameState::new(
        plans,
        won,
        cards.map(|(n, e)| ConstructionCard::new(n, e).unwrap()),
        cards.map(|(_, e)| e),
    )
    .unwrap()
}

/// Play `rounds` with one strategy, asserting every move validates.
fn play(settings: SearchSettings, rounds: &[[(u8, Effect); 3]]) -> Result<PlayerState, TestCaseError> {
    let strategy = strategy_for(&settings).unwrap();
    let mut state = PlayerState::empty();
    let mut won = [false; 3];

    for cards in rounds {
        if state.is_game_over() {
            break;
        }
        let game = table(*cards, won);
        let next = strategy.next_move(&game, &state).unwrap();
        let verdict = validate_move(&game, &state, &next);
        prop_assert!(verdict.is_ok(), "{} move rejected: {:?}", strategy.name(), verdict);
        for (slot, claimed) in next.city_plan_score().iter().enumerate() {
            won[slot] |= claimed.is_some();
        }
        state = next;
    }
    Ok(state)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Every smart move is a legal turn.
    #[test]
    fn prop_smart_moves_validate(
        rounds in prop::collection::vec(cards_strategy(), 1..30),
        seed in any::<u64>(),
    ) {
        play(SearchSettings::smart().with_seed(seed).sequential(), &rounds)?;
    }

    /// Every first-fit move is a legal turn.
    #[test]
    fn prop_first_fit_moves_validate(rounds in prop::collection::vec(cards_strategy(), 1..30)) {
        play(SearchSettings::first_fit(), &rounds)?;
    }

    /// Scoring is deterministic and the categories add up to the total.
    #[test]
    fn prop_score_breakdown_sums(
        rounds in prop::collection::vec(cards_strategy(), 1..25),
        seed in any::<u64>(),
        others in prop::collection::vec(0u8..=11, 0..4),
    ) {
        let state = play(SearchSettings::smart().with_seed(seed), &rounds)?;

        let breakdown = score_breakdown(&state, &others);
        let expected = breakdown.parks + breakdown.pools + breakdown.city_plans
            + breakdown.temps + breakdown.estates
            - breakdown.bis_penalty - breakdown.refusal_penalty - breakdown.roundabout_penalty;
        prop_assert_eq!(breakdown.total, expected);
        prop_assert_eq!(score(&state, &others), score(&state, &others));
        prop_assert!(breakdown.bis_penalty >= 0 && breakdown.refusal_penalty >= 0);
    }

    /// A sheet survives a trip through its JSON form.
    #[test]
    fn prop_played_sheet_round_trips(
        rounds in prop::collection::vec(cards_strategy(), 1..25),
        seed in any::<u64>(),
    ) {
        let state = play(SearchSettings::smart().with_seed(seed).sequential(), &rounds)?;
        let json = serde_json::to_string(&state).unwrap();
        let back: PlayerState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, state);
    }
}
