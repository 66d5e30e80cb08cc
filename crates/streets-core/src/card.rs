//! Construction cards and their effects.

use crate::types::{MAX_CARD_NUMBER, MIN_CARD_NUMBER};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The bonus action printed on the back of a construction card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Effect {
    /// Build one fence.
    Surveyor,
    /// Upgrade one estate size.
    Agent,
    /// Build one park in the street of the new house.
    Landscaper,
    /// Build the pool of the new house.
    Pool,
    /// Shift the house number by up to two.
    Temp,
    /// Duplicate a neighbouring house number.
    Bis,
}

impl Effect {
    pub const ALL: [Effect; 6] = [
        Effect::Surveyor,
        Effect::Agent,
        Effect::Landscaper,
        Effect::Pool,
        Effect::Temp,
        Effect::Bis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Surveyor => "surveyor",
            Effect::Agent => "agent",
            Effect::Landscaper => "landscaper",
            Effect::Pool => "pool",
            Effect::Temp => "temp",
            Effect::Bis => "bis",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Effect {
    type Err = ConstructionCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Effect::ALL
            .into_iter()
            .find(|effect| effect.name() == s)
            .ok_or_else(|| ConstructionCardError::UnknownEffect(s.to_string()))
    }
}

impl TryFrom<String> for Effect {
    type Error = ConstructionCardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Effect {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

/// A face-up card: a house number and its paired effect.
///
/// Serialized as `[number, "effect"]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "CardWire", into = "CardWire")]
pub struct ConstructionCard {
    number: u8,
    effect: Effect,
}

impl ConstructionCard {
    pub fn new(number: u8, effect: Effect) -> Result<Self, ConstructionCardError> {
        if !(MIN_CARD_NUMBER..=MAX_CARD_NUMBER).contains(&number) {
            return Err(ConstructionCardError::NumberOutOfRange(number.into()));
        }
        Ok(Self { number, effect })
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }
}

#[derive(Serialize, Deserialize)]
struct CardWire(i64, Effect);

impl TryFrom<CardWire> for ConstructionCard {
    type Error = ConstructionCardError;

    fn try_from(CardWire(number, effect): CardWire) -> Result<Self, Self::Error> {
        let number =
            u8::try_from(number).map_err(|_| ConstructionCardError::NumberOutOfRange(number))?;
        ConstructionCard::new(number, effect)
    }
}

impl From<ConstructionCard> for CardWire {
    fn from(card: ConstructionCard) -> Self {
        CardWire(card.number.into(), card.effect)
    }
}

/// Errors raised while reading a card or an effect.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionCardError {
    #[error("card number {0} is outside 1-15")]
    NumberOutOfRange(i64),
    #[error("unknown effect '{0}'")]
    UnknownEffect(String),
}
