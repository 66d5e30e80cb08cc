//! Streets: ordered rows of homes with their parks and pools.

use crate::home::{Home, HomeError, HouseValue};
use crate::types::{StreetId, MAX_ESTATE_SIZE, PARK_MAXES, POOL_LOCS, STREET_COUNT, STREET_LENS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One street on a player sheet.
///
/// The street index is implied by the number of homes (10, 11 or 12), so a
/// street decoded from the wire always knows where it belongs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StreetWire", into = "StreetWire")]
pub struct Street {
    index: StreetId,
    homes: Vec<Home>,
    parks: u8,
    pools: [bool; 3],
}

impl Street {
    /// Create a street from its homes, checking every street rule.
    pub fn new(homes: Vec<Home>, parks: u8, pools: [bool; 3]) -> Result<Self, StreetError> {
        let index = STREET_LENS
            .iter()
            .position(|&len| len == homes.len())
            .ok_or(StreetError::WrongLength(homes.len()))?;

        let street = Self {
            index,
            homes,
            parks,
            pools,
        };
        street.check_fences()?;
        street.check_rules()?;
        Ok(street)
    }

    /// An empty street for the given index.
    pub fn empty(index: StreetId) -> Result<Self, StreetError> {
        if index >= STREET_COUNT {
            return Err(StreetError::UnknownStreet(index));
        }
        Ok(Self::blank(index))
    }

    /// Empty street; `index` must be below `STREET_COUNT`.
    pub(crate) fn blank(index: StreetId) -> Self {
        let mut homes = vec![Home::blank(); STREET_LENS[index]];
        if let Some(first) = homes.first_mut() {
            first.set_fence_left(true);
        }
        if let Some(last) = homes.last_mut() {
            last.set_fence_right(true);
        }
        Self {
            index,
            homes,
            parks: 0,
            pools: [false; 3],
        }
    }

    pub fn index(&self) -> StreetId {
        self.index
    }

    pub fn homes(&self) -> &[Home] {
        &self.homes
    }

    pub fn home(&self, slot: usize) -> Option<&Home> {
        self.homes.get(slot)
    }

    pub fn len(&self) -> usize {
        self.homes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.homes.iter().all(Home::is_blank)
    }

    pub fn parks(&self) -> u8 {
        self.parks
    }

    pub fn pools(&self) -> [bool; 3] {
        self.pools
    }

    /// Most parks this street can ever hold.
    pub fn park_max(&self) -> u8 {
        PARK_MAXES[self.index]
    }

    /// Whether there is a fence between slot `boundary - 1` and `boundary`.
    pub fn has_fence(&self, boundary: usize) -> bool {
        self.homes
            .get(boundary)
            .map(Home::fence_left)
            .unwrap_or(false)
    }

    // =========================================================================
    // Derived queries
    // =========================================================================

    /// Completed estates on this street, as size -> count.
    ///
    /// An estate is a run of filled houses closed by fences on both ends.
    /// Runs longer than six houses are dropped without scoring.
    pub fn estate_sizes(&self) -> BTreeMap<usize, usize> {
        let mut estates = BTreeMap::new();
        let mut run: Option<usize> = None;

        for home in &self.homes {
            if !home.value().is_filled() {
                run = None;
                continue;
            }
            if home.fence_left() {
                run = Some(0);
            }
            if let Some(size) = run {
                let size = size + 1;
                run = if size > MAX_ESTATE_SIZE {
                    None
                } else if home.fence_right() {
                    *estates.entry(size).or_insert(0) += 1;
                    None
                } else {
                    Some(size)
                };
            }
        }

        estates
    }

    pub fn pools_built(&self) -> usize {
        self.pools.iter().filter(|&&pool| pool).count()
    }

    pub fn all_pools(&self) -> bool {
        self.pools.iter().all(|&pool| pool)
    }

    pub fn has_max_parks(&self) -> bool {
        self.parks == self.park_max()
    }

    pub fn bis_count(&self) -> usize {
        self.homes.iter().filter(|h| h.value().is_bis()).count()
    }

    pub fn roundabout_count(&self) -> usize {
        self.homes.iter().filter(|h| h.value().is_roundabout()).count()
    }

    /// Number of regular (non-bis, non-roundabout) houses.
    pub fn number_count(&self) -> usize {
        self.homes.iter().filter(|h| h.value().is_number()).count()
    }

    pub fn is_full(&self) -> bool {
        self.homes.iter().all(|h| !h.is_blank())
    }

    /// Points for parks: two per park, with a bonus for completing the row.
    pub fn parks_score(&self) -> i32 {
        let parks = i32::from(self.parks);
        if self.has_max_parks() {
            parks * 4 - 2
        } else {
            parks * 2
        }
    }

    // =========================================================================
    // Mutators
    // =========================================================================

    /// Write a house number into a blank slot.
    ///
    /// Only the ordering and bis rules are re-checked; on failure the slot is
    /// left blank.
    pub fn try_place_home(&mut self, slot: usize, value: HouseValue) -> Result<(), StreetError> {
        if !value.is_filled() {
            return Err(StreetError::NotAHouse(value));
        }
        self.transact(|street| {
            let home = street.blank_slot_mut(slot)?;
            home.set_value(value);
            home.check()
                .map_err(|source| StreetError::Home { slot, source })?;
            street.check_ordering()?;
            street.check_bis()
        })
    }

    /// Whether `value` could be written into `slot` right now.
    pub fn can_place(&self, slot: usize, value: HouseValue) -> bool {
        self.clone().try_place_home(slot, value).is_ok()
    }

    /// Every blank slot that accepts house number `num`.
    pub fn legal_slots(&self, num: u8) -> Vec<usize> {
        (0..self.homes.len())
            .filter(|&slot| self.can_place(slot, HouseValue::Number(num)))
            .collect()
    }

    /// Build a roundabout in a blank slot, fencing it on both sides.
    pub fn place_roundabout(&mut self, slot: usize) -> Result<(), StreetError> {
        if self.roundabout_count() > 0 {
            return Err(StreetError::TooManyRoundabouts {
                street: self.index,
            });
        }
        self.transact(|street| {
            street.blank_slot_mut(slot)?.set_value(HouseValue::Roundabout);
            street.set_fence(slot);
            street.set_fence(slot + 1);
            street.check_rules()
        })
    }

    /// Build a fence between slot `boundary - 1` and slot `boundary`.
    pub fn place_fence(&mut self, boundary: usize) -> Result<(), StreetError> {
        if boundary == 0 || boundary >= self.homes.len() {
            return Err(StreetError::FenceOutOfRange(boundary));
        }
        if self.has_fence(boundary) {
            return Err(StreetError::FenceExists(boundary));
        }
        if self.homes[boundary - 1].in_plan() && self.homes[boundary].in_plan() {
            return Err(StreetError::FenceSplitsEstate(boundary));
        }
        self.transact(|street| {
            street.set_fence(boundary);
            street.check_bis()
        })
    }

    pub fn set_parks(&mut self, parks: u8) -> Result<(), StreetError> {
        self.transact(|street| {
            street.parks = parks;
            street.check_parks()
        })
    }

    /// Build pool number `pool` (0-2) of this street.
    pub fn build_pool(&mut self, pool: usize) -> Result<(), StreetError> {
        if pool >= self.pools.len() {
            return Err(StreetError::PoolOutOfRange(pool));
        }
        if self.pools[pool] {
            return Err(StreetError::PoolExists(pool));
        }
        self.transact(|street| {
            street.pools[pool] = true;
            street.check_pools()
        })
    }

    /// Mark a house as used for a city plan.
    pub fn mark_in_plan(&mut self, slot: usize) -> Result<(), StreetError> {
        self.transact(|street| {
            let home = street
                .homes
                .get_mut(slot)
                .ok_or(StreetError::SlotOutOfRange(slot))?;
            home.set_in_plan(true);
            home.check()
                .map_err(|source| StreetError::Home { slot, source })
        })
    }

    /// Run a mutation, restoring the previous street if it fails.
    fn transact<F>(&mut self, mutate: F) -> Result<(), StreetError>
    where
        F: FnOnce(&mut Self) -> Result<(), StreetError>,
    {
        let backup = self.clone();
        let result = mutate(self);
        if result.is_err() {
            *self = backup;
        }
        result
    }

    fn blank_slot_mut(&mut self, slot: usize) -> Result<&mut Home, StreetError> {
        let home = self
            .homes
            .get_mut(slot)
            .ok_or(StreetError::SlotOutOfRange(slot))?;
        if !home.is_blank() {
            return Err(StreetError::SlotOccupied(slot));
        }
        Ok(home)
    }

    /// Raise the fence at `boundary`; the street ends are always fenced.
    fn set_fence(&mut self, boundary: usize) {
        if let Some(home) = self.homes.get_mut(boundary) {
            home.set_fence_left(true);
        }
        if let Some(prev) = boundary.checked_sub(1).and_then(|b| self.homes.get_mut(b)) {
            prev.set_fence_right(true);
        }
    }

    // =========================================================================
    // Rule checks
    // =========================================================================

    fn check_fences(&self) -> Result<(), StreetError> {
        let (Some(first), Some(last)) = (self.homes.first(), self.homes.last()) else {
            return Err(StreetError::WrongLength(0));
        };
        if !first.fence_left() || !last.fence_right() {
            return Err(StreetError::OpenEnd);
        }
        for (slot, pair) in self.homes.windows(2).enumerate() {
            if pair[0].fence_right() != pair[1].fence_left() {
                return Err(StreetError::FenceMismatch(slot + 1));
            }
        }
        Ok(())
    }

    fn check_rules(&self) -> Result<(), StreetError> {
        for (slot, home) in self.homes.iter().enumerate() {
            home.check()
                .map_err(|source| StreetError::Home { slot, source })?;
        }
        if self.roundabout_count() > 1 {
            return Err(StreetError::TooManyRoundabouts {
                street: self.index,
            });
        }
        self.check_ordering()?;
        self.check_bis()?;
        self.check_pools()?;
        self.check_parks()
    }

    /// Regular house numbers strictly increase; a roundabout restarts the run.
    fn check_ordering(&self) -> Result<(), StreetError> {
        let mut prev: Option<u8> = None;
        for (slot, home) in self.homes.iter().enumerate() {
            match home.value() {
                HouseValue::Blank | HouseValue::Bis(_) => {}
                HouseValue::Roundabout => prev = None,
                HouseValue::Number(num) => {
                    if prev.is_some_and(|p| num <= p) {
                        return Err(StreetError::NotIncreasing {
                            street: self.index,
                            slot,
                        });
                    }
                    prev = Some(num);
                }
            }
        }
        Ok(())
    }

    /// Each unfenced run of equal bis houses must touch a regular house with
    /// the same number, with no fence in between.
    fn check_bis(&self) -> Result<(), StreetError> {
        let len = self.homes.len();
        let mut slot = 0;
        while slot < len {
            let HouseValue::Bis(num) = self.homes[slot].value() else {
                slot += 1;
                continue;
            };

            let start = slot;
            let mut end = slot;
            while end + 1 < len
                && !self.homes[end].fence_right()
                && self.homes[end + 1].value() == HouseValue::Bis(num)
            {
                end += 1;
            }

            let anchored_left = start > 0
                && !self.homes[start].fence_left()
                && self.homes[start - 1].value() == HouseValue::Number(num);
            let anchored_right = end + 1 < len
                && !self.homes[end].fence_right()
                && self.homes[end + 1].value() == HouseValue::Number(num);
            if !anchored_left && !anchored_right {
                return Err(StreetError::BisWithoutAnchor {
                    street: self.index,
                    slot: start,
                });
            }

            slot = end + 1;
        }
        Ok(())
    }

    fn check_pools(&self) -> Result<(), StreetError> {
        for (pool, &built) in self.pools.iter().enumerate() {
            let slot = POOL_LOCS[self.index][pool];
            if built && !self.homes[slot].value().is_number() {
                return Err(StreetError::PoolOnEmpty {
                    street: self.index,
                    pool,
                });
            }
        }
        Ok(())
    }

    fn check_parks(&self) -> Result<(), StreetError> {
        let max = self.park_max().min(self.number_count() as u8);
        if self.parks > max {
            return Err(StreetError::TooManyParks {
                street: self.index,
                parks: self.parks,
                max,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// `{"homes": [house, in_plan, [fence, house, in_plan], ...], "parks", "pools"}`.
///
/// The first home is written as two bare elements and carries no fence flag;
/// the street ends are implicitly fenced.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StreetWire {
    homes: Vec<Value>,
    parks: u8,
    pools: [bool; 3],
}

fn decode_house(raw: &Value, slot: usize) -> Result<HouseValue, StreetError> {
    HouseValue::deserialize(raw).map_err(|e| StreetError::Malformed(format!("slot {}: {}", slot, e)))
}

fn decode_flag(raw: &Value, slot: usize) -> Result<bool, StreetError> {
    raw.as_bool().ok_or_else(|| {
        StreetError::Malformed(format!("slot {}: expected a boolean, got {}", slot, raw))
    })
}

fn encode_house(value: HouseValue) -> Value {
    match value {
        HouseValue::Blank => Value::from("blank"),
        HouseValue::Roundabout => Value::from("roundabout"),
        HouseValue::Number(n) => Value::from(n),
        HouseValue::Bis(n) => Value::Array(vec![Value::from(n), Value::from("bis")]),
    }
}

impl TryFrom<StreetWire> for Street {
    type Error = StreetError;

    fn try_from(wire: StreetWire) -> Result<Self, Self::Error> {
        // One extra entry because the first home is split in two.
        let count = wire.homes.len().saturating_sub(1);
        if !STREET_LENS.contains(&count) {
            return Err(StreetError::WrongLength(count));
        }

        let mut slots = Vec::with_capacity(count);
        slots.push((
            true,
            decode_house(&wire.homes[0], 0)?,
            decode_flag(&wire.homes[1], 0)?,
        ));
        for (offset, raw) in wire.homes[2..].iter().enumerate() {
            let slot = offset + 1;
            match raw.as_array().map(Vec::as_slice) {
                Some([fence, house, in_plan]) => slots.push((
                    decode_flag(fence, slot)?,
                    decode_house(house, slot)?,
                    decode_flag(in_plan, slot)?,
                )),
                _ => {
                    return Err(StreetError::Malformed(format!(
                        "slot {}: expected [fence, house, in_plan], got {}",
                        slot, raw
                    )))
                }
            }
        }

        let mut homes = Vec::with_capacity(count);
        for (slot, &(fence_left, value, in_plan)) in slots.iter().enumerate() {
            let fence_right = slots.get(slot + 1).map_or(true, |next| next.0);
            let home = Home::new(fence_left, value, in_plan, fence_right)
                .map_err(|source| StreetError::Home { slot, source })?;
            homes.push(home);
        }

        Street::new(homes, wire.parks, wire.pools)
    }
}

impl From<Street> for StreetWire {
    fn from(street: Street) -> Self {
        let mut homes = Vec::with_capacity(street.homes.len() + 1);
        for (slot, home) in street.homes.iter().enumerate() {
            if slot == 0 {
                homes.push(encode_house(home.value()));
                homes.push(Value::Bool(home.in_plan()));
            } else {
                homes.push(Value::Array(vec![
                    Value::Bool(home.fence_left()),
                    encode_house(home.value()),
                    Value::Bool(home.in_plan()),
                ]));
            }
        }
        Self {
            homes,
            parks: street.parks,
            pools: street.pools,
        }
    }
}

/// Errors raised while building or mutating a street.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StreetError {
    #[error("a street must have 10, 11 or 12 homes, got {0}")]
    WrongLength(usize),
    #[error("there is no street {0}")]
    UnknownStreet(usize),
    #[error("malformed street: {0}")]
    Malformed(String),
    #[error("the first and last homes of a street are always fenced")]
    OpenEnd,
    #[error("fence flags disagree at boundary {0}")]
    FenceMismatch(usize),
    #[error("slot {slot}: {source}")]
    Home { slot: usize, source: HomeError },
    #[error("street {}: regular house numbers must strictly increase (slot {slot})", .street + 1)]
    NotIncreasing { street: StreetId, slot: usize },
    #[error("street {}: bis at slot {slot} must share an unfenced neighbour's number", .street + 1)]
    BisWithoutAnchor { street: StreetId, slot: usize },
    #[error("street {}: pool {pool} must sit on a regular house", .street + 1)]
    PoolOnEmpty { street: StreetId, pool: usize },
    #[error("street {}: {parks} parks exceeds the limit of {max}", .street + 1)]
    TooManyParks { street: StreetId, parks: u8, max: u8 },
    #[error("street {}: only one roundabout per street", .street + 1)]
    TooManyRoundabouts { street: StreetId },
    #[error("slot {0} is outside the street")]
    SlotOutOfRange(usize),
    #[error("slot {0} is already built")]
    SlotOccupied(usize),
    #[error("{0} is not a house number")]
    NotAHouse(HouseValue),
    #[error("no fence position {0} on this street")]
    FenceOutOfRange(usize),
    #[error("there is already a fence at {0}")]
    FenceExists(usize),
    #[error("a fence at {0} would split houses used in a plan")]
    FenceSplitsEstate(usize),
    #[error("there is no pool {0}")]
    PoolOutOfRange(usize),
    #[error("pool {0} is already built")]
    PoolExists(usize),
}
