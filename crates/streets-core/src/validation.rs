//! Turn validation: decide whether `after` is `before` plus exactly one legal
//! turn, given the cards on the table.

use crate::card::Effect;
use crate::criteria::{Criteria, SpecialCriteria};
use crate::game_state::GameState;
use crate::home::HouseValue;
use crate::player_state::PlayerState;
use crate::types::{StreetId, MAX_ROUNDABOUTS, POOL_LOCS, TEMP_SHIFT};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A house written this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub street: StreetId,
    pub slot: usize,
    pub value: HouseValue,
}

/// A city plan claimed this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanClaim {
    pub position: u8,
    pub score: u32,
}

/// Everything that changed between two sheets, once the turn is known to be
/// legal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDelta {
    /// Street and boundary of the surveyor fence, not counting roundabout
    /// fences.
    pub fence: Option<(StreetId, usize)>,
    pub house: Option<Placement>,
    pub bis_house: Option<Placement>,
    pub roundabout: Option<(StreetId, usize)>,
    pub park: Option<StreetId>,
    /// Street and pool index.
    pub pool: Option<(StreetId, usize)>,
    pub temp: bool,
    pub agent: bool,
    pub refusal: bool,
    pub new_plan_homes: Vec<(StreetId, usize)>,
    pub city_plan_claims: Vec<PlanClaim>,
}

impl TurnDelta {
    /// The single effect used this turn, if any.
    ///
    /// Fails when more than one effect was used.
    pub fn effect(&self) -> Result<Option<Effect>, MoveError> {
        let used = [
            (self.fence.is_some(), Effect::Surveyor),
            (self.bis_house.is_some(), Effect::Bis),
            (self.agent, Effect::Agent),
            (self.temp, Effect::Temp),
            (self.park.is_some(), Effect::Landscaper),
            (self.pool.is_some(), Effect::Pool),
        ];
        let mut effects = used.iter().filter(|(flag, _)| *flag).map(|(_, e)| *e);
        let first = effects.next();
        if effects.next().is_some() {
            return Err(MoveError::MultipleEffects);
        }
        Ok(first)
    }

    fn touches_plans(&self) -> bool {
        !self.new_plan_homes.is_empty() || !self.city_plan_claims.is_empty()
    }
}

/// Check that `after` follows from `before` by one legal turn.
///
/// Both sheets are only read. On success the reconstructed turn is returned;
/// otherwise the first broken rule.
pub fn validate_move(
    game: &GameState,
    before: &PlayerState,
    after: &PlayerState,
) -> Result<TurnDelta, MoveError> {
    let result = TurnCheck::new(game, before, after).run();
    match &result {
        Ok(delta) => debug!(house = ?delta.house, refusal = delta.refusal, "move accepted"),
        Err(err) => debug!(error = %err, "move rejected"),
    }
    result
}

struct TurnCheck<'a> {
    game: &'a GameState,
    before: &'a PlayerState,
    after: &'a PlayerState,
    delta: TurnDelta,
}

impl<'a> TurnCheck<'a> {
    fn new(game: &'a GameState, before: &'a PlayerState, after: &'a PlayerState) -> Self {
        Self {
            game,
            before,
            after,
            delta: TurnDelta::default(),
        }
    }

    fn run(mut self) -> Result<TurnDelta, MoveError> {
        self.scan_streets()?;
        self.scan_counters()?;
        self.scan_city_plans()?;

        let Some(house) = self.delta.house else {
            self.check_refusal()?;
            return Ok(self.delta);
        };
        if self.delta.refusal {
            return Err(MoveError::RefusalWithHouse);
        }

        let candidates = self.matching_cards(house.value)?;
        if let Some(effect) = self.delta.effect()? {
            if !candidates.contains(&effect) {
                return Err(MoveError::EffectNotPlayed(effect));
            }
        }

        self.check_city_plans()?;
        Ok(self.delta)
    }

    // =========================================================================
    // Street scan
    // =========================================================================

    fn scan_streets(&mut self) -> Result<(), MoveError> {
        let (before, after) = (self.before, self.after);
        let mut fences = Vec::new();
        let mut parks = Vec::new();
        let mut pools = Vec::new();

        for (street, (old, new)) in before.streets().iter().zip(after.streets()).enumerate() {
            for (slot, (h1, h2)) in old.homes().iter().zip(new.homes()).enumerate() {
                if h1.value() != h2.value() {
                    if !h1.is_blank() {
                        return Err(MoveError::ValueChanged { street, slot });
                    }
                    self.record_value(street, slot, h2.value())?;
                }

                if h1.fence_left() != h2.fence_left() {
                    if h1.fence_left() {
                        return Err(MoveError::FenceRemoved {
                            street,
                            boundary: slot,
                        });
                    }
                    let split = slot
                        .checked_sub(1)
                        .and_then(|prev| old.home(prev))
                        .is_some_and(|prev| prev.in_plan() && h1.in_plan());
                    if split {
                        return Err(MoveError::FenceSplitsEstate {
                            street,
                            boundary: slot,
                        });
                    }
                    fences.push((street, slot));
                }

                if h1.in_plan() != h2.in_plan() {
                    if h1.in_plan() {
                        return Err(MoveError::PlanMarkRemoved { street, slot });
                    }
                    self.delta.new_plan_homes.push((street, slot));
                }
            }

            match new.parks().checked_sub(old.parks()) {
                Some(0) => {}
                Some(1) => parks.push(street),
                _ => return Err(MoveError::ParksChanged { street }),
            }

            for (pool, (&p1, &p2)) in old.pools().iter().zip(new.pools().iter()).enumerate() {
                if p1 && !p2 {
                    return Err(MoveError::PoolRemoved { street, pool });
                }
                if !p1 && p2 {
                    pools.push((street, pool));
                }
            }
        }

        // The fences around a new roundabout come with it.
        if let Some((street, slot)) = self.delta.roundabout {
            fences.retain(|&(s, boundary)| s != street || (boundary != slot && boundary != slot + 1));
        }
        if fences.len() > 1 {
            return Err(MoveError::TooManyFences);
        }
        self.delta.fence = fences.first().copied();

        let house_street = self.delta.house.map(|h| h.street);
        match parks.as_slice() {
            [] => {}
            [street] if Some(*street) == house_street => self.delta.park = Some(*street),
            _ => return Err(MoveError::ParkNotWithHouse),
        }

        match pools.as_slice() {
            [] => {}
            [(street, pool)] => {
                let on_house = self
                    .delta
                    .house
                    .is_some_and(|h| h.street == *street && h.slot == POOL_LOCS[*street][*pool]);
                if !on_house {
                    return Err(MoveError::PoolNotOnHouse);
                }
                self.delta.pool = Some((*street, *pool));
            }
            _ => return Err(MoveError::PoolNotOnHouse),
        }

        Ok(())
    }

    fn record_value(&mut self, street: StreetId, slot: usize, value: HouseValue) -> Result<(), MoveError> {
        let placement = Placement {
            street,
            slot,
            value,
        };
        match value {
            HouseValue::Blank => return Err(MoveError::ValueChanged { street, slot }),
            HouseValue::Number(_) => {
                if self.delta.house.replace(placement).is_some() {
                    return Err(MoveError::TooManyHouses);
                }
            }
            HouseValue::Bis(_) => {
                if self.delta.bis_house.replace(placement).is_some() {
                    return Err(MoveError::TooManyBis);
                }
            }
            HouseValue::Roundabout => {
                if self.delta.roundabout.replace((street, slot)).is_some() {
                    return Err(MoveError::TooManyRoundabouts);
                }
                if self.before.roundabouts() >= MAX_ROUNDABOUTS {
                    return Err(MoveError::RoundaboutLimit);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Counters and city-plan scores
    // =========================================================================

    fn scan_counters(&mut self) -> Result<(), MoveError> {
        let (a1, a2) = (self.before.agents(), self.after.agents());
        if a1.iter().zip(a2.iter()).any(|(old, new)| new < old) {
            return Err(MoveError::AgentsDecreased);
        }
        let sum = |agents: [u8; 6]| agents.iter().map(|&a| u32::from(a)).sum::<u32>();

        self.delta.temp = step(self.before.temps().into(), self.after.temps().into(), "temps")?;
        self.delta.refusal = step(
            self.before.refusals().into(),
            self.after.refusals().into(),
            "refusals",
        )?;
        self.delta.agent = step(sum(a1), sum(a2), "agents")?;
        Ok(())
    }

    fn scan_city_plans(&mut self) -> Result<(), MoveError> {
        let scores = self.before.city_plan_score().into_iter().zip(self.after.city_plan_score());
        for (slot, (old, new)) in scores.enumerate() {
            match (old, new) {
                (None, Some(score)) => self.delta.city_plan_claims.push(PlanClaim {
                    position: slot as u8 + 1,
                    score,
                }),
                (old, new) if old == new => {}
                _ => return Err(MoveError::PlanScoreChanged(slot as u8 + 1)),
            }
        }
        Ok(())
    }

    // =========================================================================
    // Refusals and cards
    // =========================================================================

    /// A turn without a house must be a bare refusal, and only when none of
    /// the live cards fits anywhere.
    fn check_refusal(&self) -> Result<(), MoveError> {
        if !self.delta.refusal {
            return Err(MoveError::NoAction);
        }
        if self.delta.effect()?.is_some()
            || self.delta.roundabout.is_some()
            || self.delta.touches_plans()
        {
            return Err(MoveError::RefusalWithAction);
        }

        for (street, road) in self.before.streets().iter().enumerate() {
            for slot in (0..road.len()).filter(|&s| road.home(s).is_some_and(|h| h.is_blank())) {
                for (number, _) in self.game.plays() {
                    if road.can_place(slot, HouseValue::Number(number)) {
                        return Err(MoveError::RefusalNotNeeded {
                            street,
                            slot,
                            number,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Effects of every card that could have produced `value`.
    fn matching_cards(&self, value: HouseValue) -> Result<Vec<Effect>, MoveError> {
        let number = value.num().unwrap_or_default();
        let mut effects = Vec::new();
        for (card, effect) in self.game.plays() {
            let shifted = effect == Effect::Temp
                && self.delta.temp
                && (card.saturating_sub(TEMP_SHIFT)..=card + TEMP_SHIFT).contains(&number);
            if card == number || shifted {
                effects.push(effect);
            }
        }
        if effects.is_empty() {
            return Err(MoveError::MustPlayCard(number));
        }
        Ok(effects)
    }

    // =========================================================================
    // Estates and city plans
    // =========================================================================

    fn check_city_plans(&self) -> Result<(), MoveError> {
        let mut claims = Vec::with_capacity(self.delta.city_plan_claims.len());
        for claim in &self.delta.city_plan_claims {
            let plan = self
                .game
                .plan_at(claim.position)
                .ok_or(MoveError::UnknownPlan(claim.position))?;
            let expected = plan.score_for(self.game.plan_won(claim.position));
            if claim.score != expected {
                return Err(MoveError::WrongPlanScore {
                    position: claim.position,
                    expected,
                    claimed: claim.score,
                });
            }
            claims.push((claim.position, plan.criteria()));
        }

        let excluded = self.excluded_homes(claims.iter().map(|(_, criteria)| *criteria));
        let mut estates = self.new_estates(&excluded)?;

        for (position, criteria) in claims {
            if !criteria.is_satisfied(self.after, &mut estates) {
                return Err(MoveError::CriteriaNotMet {
                    position,
                    criteria: criteria.clone(),
                });
            }
        }

        if !estates.is_empty() {
            return Err(MoveError::UnclaimedEstate);
        }
        Ok(())
    }

    /// Homes marked for an "end houses" or "all houses" claim, which are not
    /// part of any estate.
    fn excluded_homes<'c>(
        &self,
        claimed: impl Iterator<Item = &'c Criteria>,
    ) -> BTreeSet<(StreetId, usize)> {
        let mut excluded = BTreeSet::new();
        for criteria in claimed {
            let Criteria::Special(special) = criteria else {
                continue;
            };
            for (street, road) in self.after.streets().iter().enumerate() {
                if *special == SpecialCriteria::EndHouses {
                    excluded.insert((street, 0));
                    excluded.insert((street, road.len() - 1));
                } else if special.consumed_street() == Some(street) {
                    excluded.extend((0..road.len()).map(|slot| (street, slot)));
                }
            }
        }
        excluded
    }

    /// Group the newly marked homes into fenced estates, as size -> count.
    fn new_estates(
        &self,
        excluded: &BTreeSet<(StreetId, usize)>,
    ) -> Result<BTreeMap<usize, usize>, MoveError> {
        let mut estates = BTreeMap::new();
        let mut run: Vec<(StreetId, usize)> = Vec::new();

        for &(street, slot) in self
            .delta
            .new_plan_homes
            .iter()
            .filter(|home| !excluded.contains(home))
        {
            let Some(home) = self.after.street(street).and_then(|s| s.home(slot)) else {
                return Err(MoveError::EstateNotContiguous { street, slot });
            };
            match run.last() {
                None if !home.fence_left() => {
                    return Err(MoveError::EstateNotFenced { street, slot })
                }
                Some(&(s, prev)) if s != street || prev + 1 != slot => {
                    return Err(MoveError::EstateNotContiguous { street, slot })
                }
                _ => run.push((street, slot)),
            }
            if home.fence_right() {
                *estates.entry(run.len()).or_insert(0) += 1;
                run.clear();
            }
        }

        if let Some(&(street, slot)) = run.last() {
            return Err(MoveError::EstateNotClosed { street, slot });
        }
        Ok(estates)
    }
}

/// Compare a counter across the turn: unchanged is `false`, one more is
/// `true`, anything else is illegal.
fn step(before: u32, after: u32, counter: &'static str) -> Result<bool, MoveError> {
    match after.checked_sub(before) {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        _ => Err(MoveError::CounterChanged(counter)),
    }
}

/// The first rule a submitted turn breaks.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("cannot change the number on a house after it's built (street {}, slot {slot})", .street + 1)]
    ValueChanged { street: StreetId, slot: usize },
    #[error("you may only build one non-bis house per turn")]
    TooManyHouses,
    #[error("you may only build one bis house per turn")]
    TooManyBis,
    #[error("you may only build one roundabout per turn")]
    TooManyRoundabouts,
    #[error("no more than 2 roundabouts may be built")]
    RoundaboutLimit,
    #[error("cannot remove a fence (street {}, boundary {boundary})", .street + 1)]
    FenceRemoved { street: StreetId, boundary: usize },
    #[error("cannot build a fence between houses used in a plan (street {}, boundary {boundary})", .street + 1)]
    FenceSplitsEstate { street: StreetId, boundary: usize },
    #[error("cannot build more than one fence per turn")]
    TooManyFences,
    #[error("cannot remove a house from a city plan (street {}, slot {slot})", .street + 1)]
    PlanMarkRemoved { street: StreetId, slot: usize },
    #[error("parks in street {} must stay the same or increase by one", .street + 1)]
    ParksChanged { street: StreetId },
    #[error("only one park per turn, in the street of the new house")]
    ParkNotWithHouse,
    #[error("cannot remove pool {pool} from street {}", .street + 1)]
    PoolRemoved { street: StreetId, pool: usize },
    #[error("only one pool per turn, on the new house")]
    PoolNotOnHouse,
    #[error("{0} must stay the same or increase by one")]
    CounterChanged(&'static str),
    #[error("agents cannot be removed")]
    AgentsDecreased,
    #[error("city plan {0} can only be claimed once")]
    PlanScoreChanged(u8),
    #[error("must either place a house or use a refusal")]
    NoAction,
    #[error("cannot use a refusal and place a house")]
    RefusalWithHouse,
    #[error("cannot combine a refusal with an effect, a roundabout or a city plan")]
    RefusalWithAction,
    #[error("invalid refusal use, you can place a house ({number} fits street {}, slot {slot})", .street + 1)]
    RefusalNotNeeded {
        street: StreetId,
        slot: usize,
        number: u8,
    },
    #[error("you must play a card: no live card allows house {0}")]
    MustPlayCard(u8),
    #[error("cannot use multiple effects in one turn")]
    MultipleEffects,
    #[error("invalid use of the {0} effect")]
    EffectNotPlayed(Effect),
    #[error("city plan estates must start at a fence (street {}, slot {slot})", .street + 1)]
    EstateNotFenced { street: StreetId, slot: usize },
    #[error("city plan estates must end at a fence (street {}, slot {slot})", .street + 1)]
    EstateNotClosed { street: StreetId, slot: usize },
    #[error("houses of one estate must be adjacent (street {}, slot {slot})", .street + 1)]
    EstateNotContiguous { street: StreetId, slot: usize },
    #[error("there is no city plan {0}")]
    UnknownPlan(u8),
    #[error("city plan {position} is worth {expected}, not {claimed}")]
    WrongPlanScore {
        position: u8,
        expected: u32,
        claimed: u32,
    },
    #[error("criteria {criteria} of city plan {position} is not met")]
    CriteriaNotMet { position: u8, criteria: Criteria },
    #[error("marked more city plan estates than were claimed")]
    UnclaimedEstate,
}
