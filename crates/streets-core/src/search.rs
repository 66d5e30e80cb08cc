//! Move search: pick the next sheet for a computer player.

use crate::card::Effect;
use crate::criteria::Criteria;
use crate::game_state::GameState;
use crate::home::HouseValue;
use crate::player_state::PlayerState;
use crate::scoring::score;
use crate::settings::{SearchSettings, SettingsError, StrategyKind};
use crate::types::{pool_at, StreetId, AGENT_MAXES, MAX_ROUNDABOUTS, MAX_TEMPS, STREET_COUNT};
use rand::prelude::*;
use rayon::prelude::*;
use std::sync::Mutex;
use tracing::{debug, trace};

/// Agent columns to upgrade, most valuable first.
const AGENT_PRIORITY: [usize; 6] = [4, 3, 2, 5, 1, 0];

/// Fence positions tried by the surveyor, splitting streets into fours.
const FENCE_PRIORITY: [usize; 2] = [3, 7];

/// Something that can play a turn for a player.
pub trait MoveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return the sheet after this player's turn.
    ///
    /// When no card fits anywhere the result is `state` plus one refusal.
    fn next_move(&self, game: &GameState, state: &PlayerState) -> Result<PlayerState, SearchError>;
}

/// Build the strategy named by `settings`.
pub fn strategy_for(settings: &SearchSettings) -> Result<Box<dyn MoveStrategy>, SettingsError> {
    settings.validate()?;
    Ok(match settings.strategy {
        StrategyKind::Smart => Box::new(SmartSearch::new(settings.clone())?),
        StrategyKind::FirstFit => Box::new(FirstFit),
    })
}

/// Errors from a move search.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("the sheet has no refusals left and no card fits")]
    GameOver,
    #[error("search internal error: {0}")]
    Internal(String),
}

/// Refuse on an untouched copy of `state`.
fn refuse(state: &PlayerState) -> Result<PlayerState, SearchError> {
    let mut refused = state.clone();
    refused.add_refusal().map_err(|_| SearchError::GameOver)?;
    debug!(refusals = refused.refusals(), "no card fits, refusing");
    Ok(refused)
}

// =============================================================================
// First fit
// =============================================================================

/// Places the first card that fits, in card then street then slot order.
/// Never uses an effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstFit;

impl MoveStrategy for FirstFit {
    fn name(&self) -> &'static str {
        "first-fit"
    }

    fn next_move(&self, game: &GameState, state: &PlayerState) -> Result<PlayerState, SearchError> {
        for (number, _) in game.plays() {
            for street in 0..STREET_COUNT {
                let Some(&slot) = state.legal_slots(street, number).first() else {
                    continue;
                };
                let mut next = state.clone();
                if next.place_house(street, slot, HouseValue::Number(number)).is_ok() {
                    debug!(street, slot, number, "first fit");
                    return Ok(next);
                }
            }
        }
        refuse(state)
    }
}

// =============================================================================
// Smart search
// =============================================================================

/// Scores every reachable sheet and keeps the best, breaking ties at random.
pub struct SmartSearch {
    settings: SearchSettings,
    rng: Mutex<StdRng>,
}

impl SmartSearch {
    pub fn new(settings: SearchSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            settings,
            rng: Mutex::new(rng),
        })
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Every sheet reachable from `base` by one house plus its effect.
    pub fn candidates(&self, game: &GameState, base: &PlayerState) -> Vec<PlayerState> {
        let mut candidates = Vec::new();
        for (card, effect) in game.plays() {
            for (number, shifted) in self.numbers_for(card, effect, base) {
                for street in 0..STREET_COUNT {
                    for slot in base.legal_slots(street, number) {
                        let mut placed = base.clone();
                        if placed
                            .place_house(street, slot, HouseValue::Number(number))
                            .is_err()
                        {
                            continue;
                        }
                        let play = Play {
                            street,
                            slot,
                            number,
                            effect,
                        };
                        if shifted {
                            // the shift itself is the temp effect
                            if placed.add_temp().is_ok() {
                                candidates.push(placed);
                            }
                            continue;
                        }
                        candidates.extend(with_effect(&placed, play));
                        candidates.push(placed);
                    }
                }
            }
        }

        if self.settings.claim_city_plans {
            for candidate in &mut candidates {
                claim_special_plans(game, candidate);
            }
        }
        trace!(count = candidates.len(), "candidates built");
        candidates
    }

    /// Card numbers to try, flagged when reached through a temp shift.
    fn numbers_for(&self, card: u8, effect: Effect, state: &PlayerState) -> Vec<(u8, bool)> {
        let mut numbers = vec![(card, false)];
        if effect == Effect::Temp && state.temps() < MAX_TEMPS {
            let shift = self.settings.temp_shift;
            for number in card.saturating_sub(shift)..=card + shift {
                if number != card {
                    numbers.push((number, true));
                }
            }
        }
        numbers
    }

    fn best(&self, mut candidates: Vec<PlayerState>) -> Result<PlayerState, SearchError> {
        let scores: Vec<i32> =
            if self.settings.parallel && candidates.len() >= self.settings.parallel_threshold {
                candidates.par_iter().map(|c| score(c, &[])).collect()
            } else {
                candidates.iter().map(|c| score(c, &[])).collect()
            };

        let Some(&top) = scores.iter().max() else {
            return Err(SearchError::Internal("no candidates to rank".into()));
        };
        let ties: Vec<usize> = (0..scores.len()).filter(|&i| scores[i] == top).collect();

        let mut rng = self
            .rng
            .lock()
            .map_err(|e| SearchError::Internal(format!("RNG lock poisoned: {e}")))?;
        let &pick = ties
            .choose(&mut *rng)
            .ok_or_else(|| SearchError::Internal("failed to break a tie".into()))?;

        debug!(score = top, ties = ties.len(), "picked best candidate");
        Ok(candidates.swap_remove(pick))
    }
}

impl MoveStrategy for SmartSearch {
    fn name(&self) -> &'static str {
        "smart"
    }

    fn next_move(&self, game: &GameState, state: &PlayerState) -> Result<PlayerState, SearchError> {
        if self.settings.place_roundabouts && state.roundabouts() < MAX_ROUNDABOUTS {
            let mut base = state.clone();
            if place_roundabout(&mut base) {
                let candidates = self.candidates(game, &base);
                if !candidates.is_empty() {
                    return self.best(candidates);
                }
                debug!("roundabout leaves no room, searching without it");
            }
        }

        let candidates = self.candidates(game, state);
        if candidates.is_empty() {
            return refuse(state);
        }
        self.best(candidates)
    }
}

/// Build a roundabout mid-street on the first street without one.
fn place_roundabout(state: &mut PlayerState) -> bool {
    for street in 0..STREET_COUNT {
        let Some(road) = state.street(street) else {
            continue;
        };
        if road.roundabout_count() > 0 {
            continue;
        }
        let middle = road.len() / 2;
        for slot in [middle, middle - 1] {
            if state.place_roundabout(street, slot).is_ok() {
                debug!(street, slot, "roundabout placed");
                return true;
            }
        }
    }
    false
}

/// One house written by a card.
#[derive(Clone, Copy, Debug)]
struct Play {
    street: StreetId,
    slot: usize,
    number: u8,
    effect: Effect,
}

/// Sheets adding the card's effect to `placed`, best effort.
fn with_effect(placed: &PlayerState, play: Play) -> Vec<PlayerState> {
    let Play {
        street,
        slot,
        number,
        effect,
    } = play;
    let mut next = placed.clone();

    let applied = match effect {
        Effect::Temp => next.add_temp().is_ok(),
        Effect::Landscaper => {
            let parks = next.street(street).map_or(0, |s| s.parks());
            next.set_parks(street, parks + 1).is_ok()
        }
        Effect::Agent => AGENT_PRIORITY
            .iter()
            .find(|&&column| next.agents()[column] < AGENT_MAXES[column])
            .is_some_and(|&column| next.add_agent(column).is_ok()),
        Effect::Pool => pool_at(street, slot).is_some_and(|pool| next.build_pool(street, pool).is_ok()),
        Effect::Surveyor => FENCE_PRIORITY.iter().any(|&boundary| {
            let open = next
                .street(street)
                .is_some_and(|s| boundary < s.len() && !s.has_fence(boundary));
            open && next.place_fence(street, boundary).is_ok()
        }),
        Effect::Bis => return bis_neighbours(placed, street, slot, number),
    };

    if applied {
        vec![next]
    } else {
        Vec::new()
    }
}

/// Up to two sheets, each with a bis copy of `number` beside the new house.
fn bis_neighbours(placed: &PlayerState, street: StreetId, slot: usize, number: u8) -> Vec<PlayerState> {
    let Some(road) = placed.street(street) else {
        return Vec::new();
    };
    let left = slot
        .checked_sub(1)
        .filter(|_| road.home(slot).is_some_and(|h| !h.fence_left()));
    let right = Some(slot + 1).filter(|_| road.home(slot).is_some_and(|h| !h.fence_right()));

    [left, right]
        .into_iter()
        .flatten()
        .filter_map(|neighbour| {
            let mut next = placed.clone();
            next.place_house(street, neighbour, HouseValue::Bis(number))
                .ok()
                .map(|_| next)
        })
        .collect()
}

/// Claim every open city plan whose special criteria is met without marking
/// houses.
fn claim_special_plans(game: &GameState, state: &mut PlayerState) {
    for plan in game.city_plans() {
        let Criteria::Special(special) = plan.criteria() else {
            continue;
        };
        let slot = usize::from(plan.position() - 1);
        if special.needs_plan_marks()
            || state.city_plan_score()[slot].is_some()
            || !special.is_satisfied(state)
        {
            continue;
        }
        let points = plan.score_for(game.plan_won(plan.position()));
        if state.claim_city_plan(slot, points).is_ok() {
            debug!(position = plan.position(), points, "claiming city plan");
        }
    }
}
