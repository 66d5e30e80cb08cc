//! City-plan criteria: estate lists and the named special conditions.

use crate::player_state::PlayerState;
use crate::street::Street;
use crate::types::MAX_ESTATE_SIZE;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A named criteria card that is not an estate list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialCriteria {
    /// `["all houses", 0]`
    AllHousesFirstStreet,
    /// `["all houses", 2]`
    AllHousesThirdStreet,
    /// `"end houses"`
    EndHouses,
    /// `"7 temps"`
    SevenTemps,
    /// `"5 bis"`
    FiveBis,
    /// `"two streets all parks"`
    TwoStreetsAllParks,
    /// `"two streets all pools"`
    TwoStreetsAllPools,
    /// `["all pools all parks", 1]`
    AllPoolsAllParksSecondStreet,
    /// `["all pools all parks", 2]`
    AllPoolsAllParksThirdStreet,
    /// `"all pools all parks one roundabout"`
    AllPoolsAllParksOneRoundabout,
}

impl SpecialCriteria {
    /// City-plan position this card may appear at.
    pub fn position(&self) -> u8 {
        match self {
            SpecialCriteria::AllHousesFirstStreet
            | SpecialCriteria::AllHousesThirdStreet
            | SpecialCriteria::EndHouses
            | SpecialCriteria::SevenTemps
            | SpecialCriteria::FiveBis => 1,
            SpecialCriteria::TwoStreetsAllParks
            | SpecialCriteria::TwoStreetsAllPools
            | SpecialCriteria::AllPoolsAllParksSecondStreet
            | SpecialCriteria::AllPoolsAllParksThirdStreet
            | SpecialCriteria::AllPoolsAllParksOneRoundabout => 2,
        }
    }

    /// Whether claiming this card marks houses as used in a plan.
    pub fn needs_plan_marks(&self) -> bool {
        matches!(
            self,
            SpecialCriteria::AllHousesFirstStreet
                | SpecialCriteria::AllHousesThirdStreet
                | SpecialCriteria::EndHouses
        )
    }

    /// The street whose houses are all consumed by an "all houses" claim.
    pub fn consumed_street(&self) -> Option<usize> {
        match self {
            SpecialCriteria::AllHousesFirstStreet => Some(0),
            SpecialCriteria::AllHousesThirdStreet => Some(2),
            _ => None,
        }
    }

    pub fn is_satisfied(&self, state: &PlayerState) -> bool {
        let streets = state.streets();
        match self {
            SpecialCriteria::AllHousesFirstStreet => all_houses_in_plan(&streets[0]),
            SpecialCriteria::AllHousesThirdStreet => all_houses_in_plan(&streets[2]),
            SpecialCriteria::EndHouses => streets.iter().all(|street| {
                let ends = [street.homes().first(), street.homes().last()];
                ends.into_iter()
                    .all(|home| home.is_some_and(|h| h.value().is_filled() && h.in_plan()))
            }),
            SpecialCriteria::SevenTemps => state.temps() >= 7,
            SpecialCriteria::FiveBis => streets.iter().any(|s| s.bis_count() >= 5),
            SpecialCriteria::TwoStreetsAllParks => {
                streets.iter().filter(|s| s.has_max_parks()).count() >= 2
            }
            SpecialCriteria::TwoStreetsAllPools => {
                streets.iter().filter(|s| s.all_pools()).count() >= 2
            }
            SpecialCriteria::AllPoolsAllParksSecondStreet => pools_and_parks_done(&streets[1]),
            SpecialCriteria::AllPoolsAllParksThirdStreet => pools_and_parks_done(&streets[2]),
            SpecialCriteria::AllPoolsAllParksOneRoundabout => streets
                .iter()
                .any(|s| pools_and_parks_done(s) && s.roundabout_count() > 0),
        }
    }

    fn wire_name(&self) -> (&'static str, Option<u8>) {
        match self {
            SpecialCriteria::AllHousesFirstStreet => ("all houses", Some(0)),
            SpecialCriteria::AllHousesThirdStreet => ("all houses", Some(2)),
            SpecialCriteria::EndHouses => ("end houses", None),
            SpecialCriteria::SevenTemps => ("7 temps", None),
            SpecialCriteria::FiveBis => ("5 bis", None),
            SpecialCriteria::TwoStreetsAllParks => ("two streets all parks", None),
            SpecialCriteria::TwoStreetsAllPools => ("two streets all pools", None),
            SpecialCriteria::AllPoolsAllParksSecondStreet => ("all pools all parks", Some(1)),
            SpecialCriteria::AllPoolsAllParksThirdStreet => ("all pools all parks", Some(2)),
            SpecialCriteria::AllPoolsAllParksOneRoundabout => {
                ("all pools all parks one roundabout", None)
            }
        }
    }

    fn from_wire(name: &str, param: Option<i64>) -> Result<Self, CriteriaError> {
        let special = match (name, param) {
            ("all houses", Some(0)) => SpecialCriteria::AllHousesFirstStreet,
            ("all houses", Some(2)) => SpecialCriteria::AllHousesThirdStreet,
            ("end houses", None) => SpecialCriteria::EndHouses,
            ("7 temps", None) => SpecialCriteria::SevenTemps,
            ("5 bis", None) => SpecialCriteria::FiveBis,
            ("two streets all parks", None) => SpecialCriteria::TwoStreetsAllParks,
            ("two streets all pools", None) => SpecialCriteria::TwoStreetsAllPools,
            ("all pools all parks", Some(1)) => SpecialCriteria::AllPoolsAllParksSecondStreet,
            ("all pools all parks", Some(2)) => SpecialCriteria::AllPoolsAllParksThirdStreet,
            ("all pools all parks one roundabout", None) => {
                SpecialCriteria::AllPoolsAllParksOneRoundabout
            }
            _ => {
                return Err(CriteriaError::UnknownCriteria(match param {
                    Some(param) => format!("[{:?}, {}]", name, param),
                    None => format!("{:?}", name),
                }))
            }
        };
        Ok(special)
    }
}

/// Every house of the street is built and marked; a roundabout slot counts as
/// complete.
fn all_houses_in_plan(street: &Street) -> bool {
    street
        .homes()
        .iter()
        .all(|h| h.value().is_roundabout() || (h.value().is_filled() && h.in_plan()))
}

fn pools_and_parks_done(street: &Street) -> bool {
    street.all_pools() && street.has_max_parks()
}

impl fmt::Display for SpecialCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.wire_name() {
            (name, Some(param)) => write!(f, "{} ({})", name, param),
            (name, None) => f.write_str(name),
        }
    }
}

/// What a city plan asks for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawCriteria")]
pub enum Criteria {
    /// Estate sizes to build, in non-decreasing order.
    Estates(Vec<u8>),
    Special(SpecialCriteria),
}

impl Criteria {
    /// Build an estate-list criteria.
    pub fn estates(sizes: Vec<u8>) -> Result<Self, CriteriaError> {
        if sizes.is_empty() {
            return Err(CriteriaError::Empty);
        }
        if let Some(&bad) = sizes
            .iter()
            .find(|&&size| size == 0 || usize::from(size) > MAX_ESTATE_SIZE)
        {
            return Err(CriteriaError::EstateSize(bad.into()));
        }
        if sizes.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(CriteriaError::NotIncreasing(sizes));
        }
        Ok(Criteria::Estates(sizes))
    }

    /// Check that this criteria is well formed and may sit on a plan at
    /// `position`.
    pub fn check(&self, position: u8) -> Result<(), CriteriaError> {
        match self {
            Criteria::Estates(sizes) => Criteria::estates(sizes.clone()).map(|_| ()),
            Criteria::Special(special) if special.position() != position => {
                Err(CriteriaError::WrongPosition {
                    criteria: *special,
                    position,
                })
            }
            Criteria::Special(_) => Ok(()),
        }
    }

    pub fn needs_plan_marks(&self) -> bool {
        match self {
            Criteria::Estates(_) => true,
            Criteria::Special(special) => special.needs_plan_marks(),
        }
    }

    /// Check this criteria against a sheet.
    ///
    /// Estate lists consume matching sizes from `estates` (size -> count) and
    /// leave it untouched on failure; special criteria only look at `state`.
    pub fn is_satisfied(&self, state: &PlayerState, estates: &mut BTreeMap<usize, usize>) -> bool {
        match self {
            Criteria::Estates(sizes) => {
                let mut remaining = estates.clone();
                for &size in sizes {
                    match remaining.get_mut(&usize::from(size)) {
                        Some(count) if *count > 0 => {
                            *count -= 1;
                            if *count == 0 {
                                remaining.remove(&usize::from(size));
                            }
                        }
                        _ => return false,
                    }
                }
                *estates = remaining;
                true
            }
            Criteria::Special(special) => special.is_satisfied(state),
        }
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criteria::Estates(sizes) => write!(f, "{:?}", sizes),
            Criteria::Special(special) => write!(f, "{}", special),
        }
    }
}

impl Serialize for Criteria {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Criteria::Estates(sizes) => sizes.serialize(serializer),
            Criteria::Special(special) => match special.wire_name() {
                (name, None) => serializer.serialize_str(name),
                (name, Some(param)) => {
                    let mut tuple = serializer.serialize_tuple(2)?;
                    tuple.serialize_element(name)?;
                    tuple.serialize_element(&param)?;
                    tuple.end()
                }
            },
        }
    }
}

/// Wire shapes: `[1, 2, 2]`, `"end houses"` or `["all houses", 0]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCriteria {
    Sizes(Vec<i64>),
    Name(String),
    Param(String, i64),
}

impl TryFrom<RawCriteria> for Criteria {
    type Error = CriteriaError;

    fn try_from(raw: RawCriteria) -> Result<Self, Self::Error> {
        match raw {
            RawCriteria::Sizes(sizes) => {
                let sizes = sizes
                    .into_iter()
                    .map(|size| u8::try_from(size).map_err(|_| CriteriaError::EstateSize(size)))
                    .collect::<Result<Vec<_>, _>>()?;
                Criteria::estates(sizes)
            }
            RawCriteria::Name(name) => SpecialCriteria::from_wire(&name, None).map(Criteria::Special),
            RawCriteria::Param(name, param) => {
                SpecialCriteria::from_wire(&name, Some(param)).map(Criteria::Special)
            }
        }
    }
}

/// Errors raised while reading a criteria.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("an estate criteria needs at least one size")]
    Empty,
    #[error("estate size {0} is outside 1-6")]
    EstateSize(i64),
    #[error("estate sizes {0:?} are not in increasing order")]
    NotIncreasing(Vec<u8>),
    #[error("unknown criteria {0}")]
    UnknownCriteria(String),
    #[error("criteria '{criteria}' cannot appear on city plan {position}")]
    WrongPosition {
        criteria: SpecialCriteria,
        position: u8,
    },
}
