//! A player's sheet: three streets plus the counters around them.

use crate::home::HouseValue;
use crate::street::{Street, StreetError};
use crate::types::{
    StreetId, AGENT_MAXES, MAX_PLAN_SCORE, MAX_REFUSALS, MAX_ROUNDABOUTS, MAX_TEMPS, STREET_COUNT,
};
use serde::{Deserialize, Serialize};

/// Everything one player has written on their sheet.
///
/// A fresh sheet is created when a player joins and is replaced wholesale
/// every turn; mutators exist for the move search and for tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlayerStateWire", into = "PlayerStateWire")]
pub struct PlayerState {
    agents: [u8; 6],
    city_plan_score: [Option<u32>; 3],
    refusals: u8,
    streets: [Street; STREET_COUNT],
    temps: u8,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            agents: [0; 6],
            city_plan_score: [None; 3],
            refusals: 0,
            streets: [Street::blank(0), Street::blank(1), Street::blank(2)],
            temps: 0,
        }
    }
}

impl PlayerState {
    /// Create a sheet from its parts, checking every sheet-level rule.
    pub fn new(
        agents: [u8; 6],
        city_plan_score: [Option<u32>; 3],
        refusals: u8,
        streets: [Street; STREET_COUNT],
        temps: u8,
    ) -> Result<Self, PlayerStateError> {
        let state = Self {
            agents,
            city_plan_score,
            refusals,
            streets,
            temps,
        };
        state.check()?;
        Ok(state)
    }

    /// An empty sheet, as handed out when a player joins.
    pub fn empty() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<(), PlayerStateError> {
        for (size, (&count, &max)) in self.agents.iter().zip(AGENT_MAXES.iter()).enumerate() {
            if count > max {
                return Err(PlayerStateError::TooManyAgents {
                    size: size + 1,
                    count,
                });
            }
        }
        if self.refusals > MAX_REFUSALS {
            return Err(PlayerStateError::TooManyRefusals(self.refusals));
        }
        if self.temps > MAX_TEMPS {
            return Err(PlayerStateError::TooManyTemps(self.temps));
        }
        if let Some(&score) = self.city_plan_score.iter().flatten().find(|&&s| s > MAX_PLAN_SCORE) {
            return Err(PlayerStateError::PlanScoreTooHigh(score));
        }
        for (position, street) in self.streets.iter().enumerate() {
            if street.index() != position {
                return Err(PlayerStateError::StreetOutOfPlace {
                    position,
                    found: street.index(),
                });
            }
        }
        if self.roundabouts() > MAX_ROUNDABOUTS {
            return Err(PlayerStateError::TooManyRoundabouts(self.roundabouts()));
        }
        Ok(())
    }

    pub fn agents(&self) -> [u8; 6] {
        self.agents
    }

    pub fn city_plan_score(&self) -> [Option<u32>; 3] {
        self.city_plan_score
    }

    pub fn refusals(&self) -> u8 {
        self.refusals
    }

    pub fn streets(&self) -> &[Street; STREET_COUNT] {
        &self.streets
    }

    pub fn street(&self, index: StreetId) -> Option<&Street> {
        self.streets.get(index)
    }

    pub fn temps(&self) -> u8 {
        self.temps
    }

    /// Roundabouts built across all three streets.
    pub fn roundabouts(&self) -> usize {
        self.streets.iter().map(Street::roundabout_count).sum()
    }

    /// The game ends for this player after three refusals, once every street
    /// is full, or when all three city plans have been claimed.
    pub fn is_game_over(&self) -> bool {
        self.refusals >= MAX_REFUSALS
            || self.streets.iter().all(Street::is_full)
            || self.city_plan_score.iter().all(Option::is_some)
    }

    /// Blank slots of `street` that accept house number `num`.
    pub fn legal_slots(&self, street: StreetId, num: u8) -> Vec<usize> {
        self.street(street)
            .map(|s| s.legal_slots(num))
            .unwrap_or_default()
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    pub fn place_house(
        &mut self,
        street: StreetId,
        slot: usize,
        value: HouseValue,
    ) -> Result<(), PlayerStateError> {
        Ok(self.street_mut(street)?.try_place_home(slot, value)?)
    }

    /// Build a roundabout, honouring the per-sheet limit.
    pub fn place_roundabout(&mut self, street: StreetId, slot: usize) -> Result<(), PlayerStateError> {
        if self.roundabouts() >= MAX_ROUNDABOUTS {
            return Err(PlayerStateError::TooManyRoundabouts(self.roundabouts() + 1));
        }
        Ok(self.street_mut(street)?.place_roundabout(slot)?)
    }

    pub fn place_fence(&mut self, street: StreetId, boundary: usize) -> Result<(), PlayerStateError> {
        Ok(self.street_mut(street)?.place_fence(boundary)?)
    }

    pub fn set_parks(&mut self, street: StreetId, parks: u8) -> Result<(), PlayerStateError> {
        Ok(self.street_mut(street)?.set_parks(parks)?)
    }

    pub fn build_pool(&mut self, street: StreetId, pool: usize) -> Result<(), PlayerStateError> {
        Ok(self.street_mut(street)?.build_pool(pool)?)
    }

    pub fn mark_in_plan(&mut self, street: StreetId, slot: usize) -> Result<(), PlayerStateError> {
        Ok(self.street_mut(street)?.mark_in_plan(slot)?)
    }

    pub fn add_temp(&mut self) -> Result<(), PlayerStateError> {
        if self.temps >= MAX_TEMPS {
            return Err(PlayerStateError::TooManyTemps(self.temps + 1));
        }
        self.temps += 1;
        Ok(())
    }

    pub fn add_refusal(&mut self) -> Result<(), PlayerStateError> {
        if self.refusals >= MAX_REFUSALS {
            return Err(PlayerStateError::TooManyRefusals(self.refusals + 1));
        }
        self.refusals += 1;
        Ok(())
    }

    /// Cross out one agent box for estates of `size_index + 1` houses.
    pub fn add_agent(&mut self, size_index: usize) -> Result<(), PlayerStateError> {
        let max = *AGENT_MAXES
            .get(size_index)
            .ok_or(PlayerStateError::UnknownAgent(size_index))?;
        let count = &mut self.agents[size_index];
        if *count >= max {
            return Err(PlayerStateError::TooManyAgents {
                size: size_index + 1,
                count: *count + 1,
            });
        }
        *count += 1;
        Ok(())
    }

    /// Record the points won for the city plan in `slot` (position - 1).
    pub fn claim_city_plan(&mut self, slot: usize, score: u32) -> Result<(), PlayerStateError> {
        let entry = self
            .city_plan_score
            .get_mut(slot)
            .ok_or(PlayerStateError::UnknownPlan(slot))?;
        if entry.is_some() {
            return Err(PlayerStateError::PlanAlreadyClaimed(slot + 1));
        }
        if score > MAX_PLAN_SCORE {
            return Err(PlayerStateError::PlanScoreTooHigh(score));
        }
        *entry = Some(score);
        Ok(())
    }

    fn street_mut(&mut self, index: StreetId) -> Result<&mut Street, PlayerStateError> {
        self.streets
            .get_mut(index)
            .ok_or(PlayerStateError::UnknownStreet(index))
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Clone, Copy, Serialize, Deserialize)]
enum BlankTag {
    #[serde(rename = "blank")]
    Blank,
}

/// A city-plan score cell: `"blank"` or the points won.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum ScoreCell {
    Claimed(u32),
    Blank(BlankTag),
}

impl From<ScoreCell> for Option<u32> {
    fn from(cell: ScoreCell) -> Self {
        match cell {
            ScoreCell::Claimed(score) => Some(score),
            ScoreCell::Blank(_) => None,
        }
    }
}

impl From<Option<u32>> for ScoreCell {
    fn from(score: Option<u32>) -> Self {
        score.map_or(ScoreCell::Blank(BlankTag::Blank), ScoreCell::Claimed)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlayerStateWire {
    agents: [u8; 6],
    #[serde(rename = "city-plan-score")]
    city_plan_score: [ScoreCell; 3],
    refusals: u8,
    streets: [Street; STREET_COUNT],
    temps: u8,
}

impl TryFrom<PlayerStateWire> for PlayerState {
    type Error = PlayerStateError;

    fn try_from(wire: PlayerStateWire) -> Result<Self, Self::Error> {
        PlayerState::new(
            wire.agents,
            wire.city_plan_score.map(Option::from),
            wire.refusals,
            wire.streets,
            wire.temps,
        )
    }
}

impl From<PlayerState> for PlayerStateWire {
    fn from(state: PlayerState) -> Self {
        Self {
            agents: state.agents,
            city_plan_score: state.city_plan_score.map(ScoreCell::from),
            refusals: state.refusals,
            streets: state.streets,
            temps: state.temps,
        }
    }
}

/// Errors raised while building or mutating a player sheet.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayerStateError {
    #[error(transparent)]
    Street(#[from] StreetError),
    #[error("{count} agents used for estates of size {size} is more than allowed")]
    TooManyAgents { size: usize, count: u8 },
    #[error("{0} refusals is more than the 3 allowed")]
    TooManyRefusals(u8),
    #[error("{0} temps is more than the 11 allowed")]
    TooManyTemps(u8),
    #[error("{0} roundabouts is more than the 2 allowed")]
    TooManyRoundabouts(usize),
    #[error("street {position} has the length of street {found}")]
    StreetOutOfPlace { position: StreetId, found: StreetId },
    #[error("there is no street {0}")]
    UnknownStreet(StreetId),
    #[error("there is no agent column {0}")]
    UnknownAgent(usize),
    #[error("there is no city plan slot {0}")]
    UnknownPlan(usize),
    #[error("city plan {0} has already been claimed")]
    PlanAlreadyClaimed(usize),
    #[error("a city plan score of {0} is more than the 99 allowed")]
    PlanScoreTooHigh(u32),
}
