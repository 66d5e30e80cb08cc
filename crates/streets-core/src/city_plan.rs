//! City plans: the three shared scoring objectives.

use crate::criteria::{Criteria, CriteriaError};
use crate::types::MAX_PLAN_SCORE;
use serde::{Deserialize, Serialize};

/// One city plan card on the table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CityPlanWire", into = "CityPlanWire")]
pub struct CityPlan {
    criteria: Criteria,
    position: u8,
    score1: u32,
    score2: u32,
}

impl CityPlan {
    pub fn new(
        criteria: Criteria,
        position: u8,
        score1: u32,
        score2: u32,
    ) -> Result<Self, CityPlanError> {
        if !(1..=3).contains(&position) {
            return Err(CityPlanError::Position(position.into()));
        }
        if let Some(score) = [score1, score2].into_iter().find(|&s| s > MAX_PLAN_SCORE) {
            return Err(CityPlanError::Score(score));
        }
        criteria.check(position)?;
        Ok(Self {
            criteria,
            position,
            score1,
            score2,
        })
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Board position, 1-3.
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Points for the first player to claim the plan.
    pub fn score1(&self) -> u32 {
        self.score1
    }

    /// Points for everyone claiming it later.
    pub fn score2(&self) -> u32 {
        self.score2
    }

    /// Points owed to a claimant, given whether the plan was already won.
    pub fn score_for(&self, already_won: bool) -> u32 {
        if already_won {
            self.score2
        } else {
            self.score1
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CityPlanWire {
    criteria: Criteria,
    position: i64,
    score1: u32,
    score2: u32,
}

impl TryFrom<CityPlanWire> for CityPlan {
    type Error = CityPlanError;

    fn try_from(wire: CityPlanWire) -> Result<Self, Self::Error> {
        let position = u8::try_from(wire.position).map_err(|_| CityPlanError::Position(wire.position))?;
        CityPlan::new(wire.criteria, position, wire.score1, wire.score2)
    }
}

impl From<CityPlan> for CityPlanWire {
    fn from(plan: CityPlan) -> Self {
        Self {
            criteria: plan.criteria,
            position: plan.position.into(),
            score1: plan.score1,
            score2: plan.score2,
        }
    }
}

/// Errors raised while building a city plan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CityPlanError {
    #[error("city plan position {0} is not 1, 2 or 3")]
    Position(i64),
    #[error("city plan score {0} is more than the 99 allowed")]
    Score(u32),
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
}
