//! Move search configuration.

use crate::types::TEMP_SHIFT;
use serde::{Deserialize, Serialize};

/// Which move strategy to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Score every candidate and keep the best.
    #[default]
    Smart,
    /// Take the first legal house found.
    FirstFit,
}

/// Configuration for a move search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    /// Strategy to build.
    pub strategy: StrategyKind,
    /// Seed for tie breaking (None = seeded from the OS).
    pub seed: Option<u64>,
    /// Score candidates on the rayon thread pool.
    pub parallel: bool,
    /// Candidate count below which scoring stays on the calling thread.
    pub parallel_threshold: usize,
    /// Build a roundabout whenever the sheet still allows one.
    pub place_roundabouts: bool,
    /// Claim special city plans that need no marked houses.
    pub claim_city_plans: bool,
    /// How far a temp card may shift a number (0-2).
    pub temp_shift: u8,
}

impl SearchSettings {
    /// Settings for the scoring search.
    pub fn smart() -> Self {
        Self {
            strategy: StrategyKind::Smart,
            seed: None,
            parallel: true,
            parallel_threshold: 32,
            place_roundabouts: true,
            claim_city_plans: true,
            temp_shift: TEMP_SHIFT,
        }
    }

    /// Settings for the first-fit player.
    pub fn first_fit() -> Self {
        Self {
            strategy: StrategyKind::FirstFit,
            parallel: false,
            place_roundabouts: false,
            claim_city_plans: false,
            temp_shift: 0,
            ..Self::smart()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Keep all candidate scoring on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Validate settings and return any errors.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.temp_shift > TEMP_SHIFT {
            return Err(SettingsError::TempShiftTooLarge(self.temp_shift));
        }
        if self.parallel && self.parallel_threshold == 0 {
            return Err(SettingsError::ZeroParallelThreshold);
        }
        Ok(())
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::smart()
    }
}

/// Errors from invalid search settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsError {
    TempShiftTooLarge(u8),
    ZeroParallelThreshold,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::TempShiftTooLarge(shift) => {
                write!(f, "Temp shift of {} exceeds the maximum of {}", shift, TEMP_SHIFT)
            }
            SettingsError::ZeroParallelThreshold => {
                write!(f, "Parallel threshold must be at least 1")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SearchSettings::default();
        assert_eq!(settings.strategy, StrategyKind::Smart);
        assert!(settings.parallel);
        assert_eq!(settings.temp_shift, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_first_fit_settings() {
        let settings = SearchSettings::first_fit().with_seed(9);
        assert_eq!(settings.strategy, StrategyKind::FirstFit);
        assert_eq!(settings.seed, Some(9));
        assert!(!settings.place_roundabouts);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_temp_shift() {
        let settings = SearchSettings {
            temp_shift: 3,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::TempShiftTooLarge(3)));
    }

    #[test]
    fn test_validation_threshold() {
        let settings = SearchSettings {
            parallel_threshold: 0,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(SettingsError::ZeroParallelThreshold));
        assert!(settings.sequential().validate().is_ok());
    }

    #[test]
    fn test_settings_from_partial_json() {
        let settings: SearchSettings =
            serde_json::from_str(r#"{"strategy": "first-fit", "seed": 42}"#).unwrap();
        assert_eq!(settings.strategy, StrategyKind::FirstFit);
        assert_eq!(settings.seed, Some(42));
        assert!(settings.parallel);

        assert!(serde_json::from_str::<SearchSettings>(r#"{"depth": 2}"#).is_err());
    }
}
