//! Streets Core Library
//!
//! Rules engine for a street-building roll-and-write game. Players write
//! house numbers into three streets, build parks, pools, fences and
//! roundabouts, and claim city plans for points.
//!
//! # Design Principles
//!
//! - **Snapshots in, verdicts out**: a turn is judged from the sheets before
//!   and after it, never from a list of actions
//! - **Checked values**: every entity is built through a constructor that
//!   enforces its rules, including when read from JSON
//! - **Deterministic**: scoring is pure; the search is reproducible from a seed

// Sheet and table entities
pub mod card;
pub mod city_plan;
pub mod criteria;
pub mod game_state;
pub mod home;
pub mod player_state;
pub mod street;
pub mod types;

// Engines
pub mod scoring;
pub mod search;
pub mod validation;

// Configuration
pub mod settings;

// Re-exports for convenience
pub use card::{ConstructionCard, ConstructionCardError, Effect};
pub use city_plan::{CityPlan, CityPlanError};
pub use criteria::{Criteria, CriteriaError, SpecialCriteria};
pub use game_state::{GameState, GameStateError};
pub use home::{Home, HomeError, HouseValue};
pub use player_state::{PlayerState, PlayerStateError};
pub use scoring::{score, score_breakdown, standings, temps_score, ScoreBreakdown};
pub use search::{strategy_for, FirstFit, MoveStrategy, SearchError, SmartSearch};
pub use settings::{SearchSettings, SettingsError, StrategyKind};
pub use street::{Street, StreetError};
pub use types::StreetId;
pub use validation::{validate_move, MoveError, PlanClaim, Placement, TurnDelta};
