//! Final score of a player sheet.

use crate::player_state::PlayerState;
use crate::types::{
    clamped, BIS_PENALTY, ESTATE_SCORES, POOLS_SCORE, REFUSAL_PENALTY, ROUNDABOUT_PENALTY,
    TEMP_SCORES,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Points per scoring category. Penalties are stored as positive numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub parks: i32,
    pub pools: i32,
    pub city_plans: i32,
    pub temps: i32,
    pub estates: i32,
    pub bis_penalty: i32,
    pub refusal_penalty: i32,
    pub roundabout_penalty: i32,
    pub total: i32,
}

/// Score a sheet. `all_temps` holds the temps counts of every player in the
/// game and only affects the temps category.
pub fn score(state: &PlayerState, all_temps: &[u8]) -> i32 {
    score_breakdown(state, all_temps).total
}

/// Score a sheet, keeping each category separate.
pub fn score_breakdown(state: &PlayerState, all_temps: &[u8]) -> ScoreBreakdown {
    let streets = state.streets();

    let mut estates: BTreeMap<usize, usize> = BTreeMap::new();
    for street in streets {
        for (size, count) in street.estate_sizes() {
            *estates.entry(size).or_insert(0) += count;
        }
    }
    let agents = state.agents();
    let estate_points = estates
        .iter()
        .map(|(&size, &count)| {
            let agents_used = usize::from(agents[size - 1]);
            clamped(ESTATE_SCORES[size - 1], agents_used) * count as i32
        })
        .sum();

    let pools_built: usize = streets.iter().map(|s| s.pools_built()).sum();
    let bis_built: usize = streets.iter().map(|s| s.bis_count()).sum();

    let mut breakdown = ScoreBreakdown {
        parks: streets.iter().map(|s| s.parks_score()).sum(),
        pools: clamped(&POOLS_SCORE, pools_built),
        city_plans: state
            .city_plan_score()
            .iter()
            .flatten()
            .map(|&points| points as i32)
            .sum(),
        temps: temps_score(state.temps(), all_temps),
        estates: estate_points,
        bis_penalty: clamped(&BIS_PENALTY, bis_built),
        refusal_penalty: clamped(&REFUSAL_PENALTY, usize::from(state.refusals())),
        roundabout_penalty: clamped(&ROUNDABOUT_PENALTY, state.roundabouts()),
        total: 0,
    };
    breakdown.total = breakdown.parks
        + breakdown.pools
        + breakdown.city_plans
        + breakdown.temps
        + breakdown.estates
        - breakdown.bis_penalty
        - breakdown.refusal_penalty
        - breakdown.roundabout_penalty;
    breakdown
}

/// Points for temps: 7, 4 or 1 for the highest, second and third highest
/// distinct counts among all players. Zero temps never score.
pub fn temps_score(temps: u8, all_temps: &[u8]) -> i32 {
    if temps == 0 {
        return 0;
    }
    let mut ranking: Vec<u8> = all_temps.to_vec();
    ranking.push(temps);
    ranking.sort_unstable_by(|a, b| b.cmp(a));
    ranking.dedup();

    ranking
        .iter()
        .position(|&t| t == temps)
        .and_then(|rank| TEMP_SCORES.get(rank))
        .copied()
        .unwrap_or(0)
}

/// Score every player of a round against the same temps ranking.
pub fn standings(players: &[PlayerState]) -> Vec<i32> {
    let all_temps: Vec<u8> = players.iter().map(PlayerState::temps).collect();
    players
        .iter()
        .map(|player| score(player, &all_temps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::home::HouseValue;

    #[test]
    fn test_empty_sheet_scores_zero() {
        assert_eq!(score(&PlayerState::empty(), &[]), 0);
        assert_eq!(score_breakdown(&PlayerState::empty(), &[3, 1]), ScoreBreakdown::default());
    }

    #[test]
    fn test_temps_ranking() {
        assert_eq!(temps_score(0, &[0, 0]), 0);
        assert_eq!(temps_score(4, &[]), 7);
        assert_eq!(temps_score(4, &[4, 6]), 4);
        assert_eq!(temps_score(2, &[6, 6, 4, 4]), 1);
        assert_eq!(temps_score(1, &[6, 4, 2]), 0);
    }

    #[test]
    fn test_largest_plan_scores() {
        let mut state = PlayerState::empty();
        for slot in 0..3 {
            state.claim_city_plan(slot, 99).unwrap();
        }
        assert_eq!(score_breakdown(&state, &[]).city_plans, 297);
        assert_eq!(score(&state, &[]), 297);
    }

    #[test]
    fn test_penalties_can_go_negative() {
        let mut state = PlayerState::empty();
        state.add_refusal().unwrap();
        state.add_refusal().unwrap();
        state.place_roundabout(0, 5).unwrap();
        let breakdown = score_breakdown(&state, &[]);
        assert_eq!(breakdown.refusal_penalty, 3);
        assert_eq!(breakdown.roundabout_penalty, 3);
        assert_eq!(breakdown.total, -6);
    }

    #[test]
    fn test_estates_and_agents() {
        let mut state = PlayerState::empty();
        // a full first street in two estates of five houses
        for (slot, num) in (0..10).zip(1u8..) {
            state.place_house(0, slot, HouseValue::Number(num)).unwrap();
        }
        state.place_fence(0, 5).unwrap();
        assert_eq!(score_breakdown(&state, &[]).estates, 10);

        state.add_agent(4).unwrap();
        state.add_agent(4).unwrap();
        assert_eq!(score_breakdown(&state, &[]).estates, 14);
    }

    #[test]
    fn test_pools_parks_and_plans() {
        let mut state = PlayerState::empty();
        for (slot, num) in [(0, 1), (1, 2), (2, 3), (6, 7)] {
            state.place_house(0, slot, HouseValue::Number(num)).unwrap();
        }
        state.build_pool(0, 0).unwrap();
        state.build_pool(0, 1).unwrap();
        state.set_parks(0, 3).unwrap();
        state.claim_city_plan(2, 9).unwrap();

        let breakdown = score_breakdown(&state, &[]);
        assert_eq!(breakdown.pools, 6);
        assert_eq!(breakdown.parks, 10);
        assert_eq!(breakdown.city_plans, 9);
        assert_eq!(breakdown.total, 25);
    }

    #[test]
    fn test_standings_share_temps() {
        let mut first = PlayerState::empty();
        let mut second = PlayerState::empty();
        for _ in 0..3 {
            first.add_temp().unwrap();
        }
        second.add_temp().unwrap();
        assert_eq!(standings(&[first, second]), vec![7, 4]);
    }
}
