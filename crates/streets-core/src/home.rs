//! A single house slot on a street.

use crate::types::MAX_HOUSE_NUMBER;
use serde::{Deserialize, Serialize, Serializer};

/// What is written in a house slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawHouse")]
pub enum HouseValue {
    /// Nothing built yet.
    #[default]
    Blank,
    /// A regular numbered house.
    Number(u8),
    /// A duplicate of an adjacent house number.
    Bis(u8),
    /// A roundabout, which restarts the increasing sequence.
    Roundabout,
}

impl HouseValue {
    /// Create a numbered house, checking the range.
    pub fn number(num: u8) -> Result<Self, HomeError> {
        if num > MAX_HOUSE_NUMBER {
            return Err(HomeError::NumberOutOfRange(num.into()));
        }
        Ok(HouseValue::Number(num))
    }

    /// Create a bis house, checking the range.
    pub fn bis(num: u8) -> Result<Self, HomeError> {
        if num > MAX_HOUSE_NUMBER {
            return Err(HomeError::NumberOutOfRange(num.into()));
        }
        Ok(HouseValue::Bis(num))
    }

    pub const fn is_blank(&self) -> bool {
        matches!(self, HouseValue::Blank)
    }

    pub const fn is_bis(&self) -> bool {
        matches!(self, HouseValue::Bis(_))
    }

    pub const fn is_roundabout(&self) -> bool {
        matches!(self, HouseValue::Roundabout)
    }

    /// True for a numbered (non-bis) house.
    pub const fn is_number(&self) -> bool {
        matches!(self, HouseValue::Number(_))
    }

    /// True when the slot carries a house number, bis or not.
    pub const fn is_filled(&self) -> bool {
        matches!(self, HouseValue::Number(_) | HouseValue::Bis(_))
    }

    /// The house number, for numbered and bis houses.
    pub const fn num(&self) -> Option<u8> {
        match self {
            HouseValue::Number(n) | HouseValue::Bis(n) => Some(*n),
            HouseValue::Blank | HouseValue::Roundabout => None,
        }
    }

    fn check_range(&self) -> Result<(), HomeError> {
        match self.num() {
            Some(n) if n > MAX_HOUSE_NUMBER => Err(HomeError::NumberOutOfRange(n.into())),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for HouseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HouseValue::Blank => write!(f, "blank"),
            HouseValue::Number(n) => write!(f, "{}", n),
            HouseValue::Bis(n) => write!(f, "{} bis", n),
            HouseValue::Roundabout => write!(f, "roundabout"),
        }
    }
}

impl Serialize for HouseValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            HouseValue::Blank => serializer.serialize_str("blank"),
            HouseValue::Roundabout => serializer.serialize_str("roundabout"),
            HouseValue::Number(n) => serializer.serialize_u8(*n),
            HouseValue::Bis(n) => (*n, "bis").serialize(serializer),
        }
    }
}

/// Untyped wire shape of a house value: a number, a word, or `[n, "bis"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawHouse {
    Number(i64),
    Word(String),
    Bis(i64, String),
}

fn house_number(raw: i64) -> Result<u8, HomeError> {
    u8::try_from(raw)
        .ok()
        .filter(|n| *n <= MAX_HOUSE_NUMBER)
        .ok_or(HomeError::NumberOutOfRange(raw))
}

impl TryFrom<RawHouse> for HouseValue {
    type Error = HomeError;

    fn try_from(raw: RawHouse) -> Result<Self, Self::Error> {
        match raw {
            RawHouse::Number(n) => Ok(HouseValue::Number(house_number(n)?)),
            RawHouse::Word(word) => match word.as_str() {
                "blank" => Ok(HouseValue::Blank),
                "roundabout" => Ok(HouseValue::Roundabout),
                _ => Err(HomeError::UnknownHouse(word)),
            },
            RawHouse::Bis(n, tag) if tag == "bis" => Ok(HouseValue::Bis(house_number(n)?)),
            RawHouse::Bis(_, tag) => Err(HomeError::UnknownHouse(tag)),
        }
    }
}

/// One slot on a street, with the fences on either side of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Home {
    fence_left: bool,
    fence_right: bool,
    value: HouseValue,
    in_plan: bool,
}

impl Home {
    /// Create a home, checking its local invariants.
    pub fn new(
        fence_left: bool,
        value: HouseValue,
        in_plan: bool,
        fence_right: bool,
    ) -> Result<Self, HomeError> {
        let home = Self {
            fence_left,
            fence_right,
            value,
            in_plan,
        };
        home.check()?;
        Ok(home)
    }

    /// An empty slot with no fences.
    pub const fn blank() -> Self {
        Self {
            fence_left: false,
            fence_right: false,
            value: HouseValue::Blank,
            in_plan: false,
        }
    }

    pub const fn fence_left(&self) -> bool {
        self.fence_left
    }

    pub const fn fence_right(&self) -> bool {
        self.fence_right
    }

    pub const fn value(&self) -> HouseValue {
        self.value
    }

    /// Whether this house has been used for a city plan.
    pub const fn in_plan(&self) -> bool {
        self.in_plan
    }

    pub const fn is_blank(&self) -> bool {
        self.value.is_blank()
    }

    /// Re-check the local invariants after a raw mutation.
    pub(crate) fn check(&self) -> Result<(), HomeError> {
        self.value.check_range()?;
        if self.in_plan && !self.value.is_filled() {
            if self.value.is_roundabout() {
                return Err(HomeError::RoundaboutInPlan);
            }
            return Err(HomeError::PlanOnEmpty);
        }
        if self.value.is_roundabout() && !(self.fence_left && self.fence_right) {
            return Err(HomeError::RoundaboutUnfenced);
        }
        Ok(())
    }

    pub(crate) fn set_value(&mut self, value: HouseValue) {
        self.value = value;
    }

    pub(crate) fn set_fence_left(&mut self, fence: bool) {
        self.fence_left = fence;
    }

    pub(crate) fn set_fence_right(&mut self, fence: bool) {
        self.fence_right = fence;
    }

    pub(crate) fn set_in_plan(&mut self, in_plan: bool) {
        self.in_plan = in_plan;
    }
}

/// Errors raised while building or mutating a home.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HomeError {
    #[error("house number {0} is outside 0-17")]
    NumberOutOfRange(i64),
    #[error("unknown house value '{0}', expected a number, \"blank\", \"roundabout\" or [n, \"bis\"]")]
    UnknownHouse(String),
    #[error("only a numbered house can be used in a plan")]
    PlanOnEmpty,
    #[error("a roundabout cannot be used in a plan")]
    RoundaboutInPlan,
    #[error("a roundabout needs a fence on both sides")]
    RoundaboutUnfenced,
}
