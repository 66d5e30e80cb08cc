//! The shared table: city plans and the face-up construction cards.

use crate::card::{ConstructionCard, Effect};
use crate::city_plan::CityPlan;
use serde::{Deserialize, Serialize};

/// What every player sees on the table this round.
///
/// Validation and search only ever read it; the dealer replaces the cards
/// between rounds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameStateWire", into = "GameStateWire")]
pub struct GameState {
    city_plans: [CityPlan; 3],
    city_plans_won: [bool; 3],
    construction_cards: [ConstructionCard; 3],
    effects: [Effect; 3],
}

impl GameState {
    pub fn new(
        city_plans: [CityPlan; 3],
        city_plans_won: [bool; 3],
        construction_cards: [ConstructionCard; 3],
        effects: [Effect; 3],
    ) -> Result<Self, GameStateError> {
        let mut positions: Vec<u8> = city_plans.iter().map(CityPlan::position).collect();
        positions.sort_unstable();
        if positions != [1, 2, 3] {
            return Err(GameStateError::PlanPositions(positions));
        }
        Ok(Self {
            city_plans,
            city_plans_won,
            construction_cards,
            effects,
        })
    }

    pub fn city_plans(&self) -> &[CityPlan; 3] {
        &self.city_plans
    }

    pub fn city_plans_won(&self) -> [bool; 3] {
        self.city_plans_won
    }

    pub fn construction_cards(&self) -> &[ConstructionCard; 3] {
        &self.construction_cards
    }

    pub fn effects(&self) -> [Effect; 3] {
        self.effects
    }

    /// The city plan at board position `position` (1-3).
    pub fn plan_at(&self, position: u8) -> Option<&CityPlan> {
        self.city_plans.iter().find(|plan| plan.position() == position)
    }

    /// Whether the plan at `position` has been claimed by anyone before.
    pub fn plan_won(&self, position: u8) -> bool {
        usize::from(position)
            .checked_sub(1)
            .and_then(|slot| self.city_plans_won.get(slot))
            .copied()
            .unwrap_or(false)
    }

    /// Each live card number together with the effect it is played with.
    pub fn plays(&self) -> impl Iterator<Item = (u8, Effect)> + '_ {
        self.construction_cards
            .iter()
            .zip(self.effects)
            .map(|(card, effect)| (card.number(), effect))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct GameStateWire {
    city_plans: [CityPlan; 3],
    city_plans_won: [bool; 3],
    construction_cards: [ConstructionCard; 3],
    effects: [Effect; 3],
}

impl TryFrom<GameStateWire> for GameState {
    type Error = GameStateError;

    fn try_from(wire: GameStateWire) -> Result<Self, Self::Error> {
        GameState::new(
            wire.city_plans,
            wire.city_plans_won,
            wire.construction_cards,
            wire.effects,
        )
    }
}

impl From<GameState> for GameStateWire {
    fn from(state: GameState) -> Self {
        Self {
            city_plans: state.city_plans,
            city_plans_won: state.city_plans_won,
            construction_cards: state.construction_cards,
            effects: state.effects,
        }
    }
}

/// Errors raised while building the shared table.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameStateError {
    #[error("city plans must sit at positions 1, 2 and 3, got {0:?}")]
    PlanPositions(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> serde_json::Value {
        json!({
            "city-plans": [
                { "criteria": [1, 1, 2, 6], "position": 1, "score1": 8, "score2": 4 },
                { "criteria": "two streets all pools", "position": 2, "score1": 10, "score2": 5 },
                { "criteria": [3, 4], "position": 3, "score1": 12, "score2": 7 }
            ],
            "city-plans-won": [false, true, false],
            "construction-cards": [[3, "pool"], [8, "temp"], [11, "bis"]],
            "effects": ["surveyor", "temp", "agent"]
        })
    }

    #[test]
    fn test_game_state_wire() {
        let state: GameState = serde_json::from_value(table()).unwrap();
        assert_eq!(state.plan_at(2).unwrap().score1(), 10);
        assert!(state.plan_won(2));
        assert!(!state.plan_won(4));
        assert_eq!(
            state.plays().collect::<Vec<_>>(),
            vec![(3, Effect::Surveyor), (8, Effect::Temp), (11, Effect::Agent)]
        );
        assert_eq!(serde_json::to_value(&state).unwrap(), table());
    }

    #[test]
    fn test_duplicate_positions_rejected() {
        let mut wire = table();
        wire["city-plans"][2]["position"] = json!(1);
        assert!(serde_json::from_value::<GameState>(wire).is_err());

        let state: GameState = serde_json::from_value(table()).unwrap();
        let cards = *state.construction_cards();
        let mut plans = state.city_plans().clone();
        plans.swap(0, 1);
        assert!(GameState::new(plans.clone(), [false; 3], cards, state.effects()).is_ok());

        plans[0] = plans[1].clone();
        assert_eq!(
            GameState::new(plans, [false; 3], cards, state.effects()),
            Err(GameStateError::PlanPositions(vec![1, 1, 3]))
        );
    }

    #[test]
    fn test_malformed_tables_rejected() {
        let mut two_cards = table();
        two_cards["construction-cards"] = json!([[3, "pool"], [8, "temp"]]);

        let mut bad_effect = table();
        bad_effect["effects"] = json!(["surveyor", "temp", "banker"]);

        let mut extra = table();
        extra["round"] = json!(4);

        for wire in [two_cards, bad_effect, extra] {
            assert!(serde_json::from_value::<GameState>(wire).is_err());
        }
    }
}
