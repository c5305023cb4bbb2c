//! Error taxonomy for the generation engine.
//!
//! Configuration problems and broken invariants are errors. Expected misses
//! of the probabilistic search are [`ResolutionFailure`] values that callers
//! branch on instead of propagating.
use thiserror::Error;

use crate::mission_type::MissionType;
use crate::units::UnitId;

/// Unrecoverable template, catalog or configuration problems.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{file}: missing required section [{section}]")]
    MissingSection { file: String, section: String },
    #[error("{file}: section [{section}] is missing key `{key}`")]
    MissingKey {
        file: String,
        section: String,
        key: String,
    },
    #[error("{file}: [{section}] `{key}` has invalid value `{value}`: {reason}")]
    InvalidValue {
        file: String,
        section: String,
        key: String,
        value: String,
        reason: String,
    },
    #[error("[{section}] `{key}`: unparseable aircraft parameters `{value}`: {reason}")]
    AircraftParam {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
    #[error("air unit `{unit}` references unknown aircraft class `{class}`")]
    UnknownAircraft { unit: UnitId, class: String },
    #[error("generation config `{field}` out of range: {reason}")]
    Range { field: &'static str, reason: String },
    #[error("generation config JSON: {0}")]
    Json(String),
}

/// Pool bookkeeping violations. Always a bug in the caller or the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("unknown unit `{0}`")]
    UnknownUnit(UnitId),
    #[error("unit `{0}` is already assigned")]
    AlreadyAssigned(UnitId),
    #[error("unit `{0}` is not available")]
    NotAvailable(UnitId),
    #[error("duplicate unit id `{0}`")]
    DuplicateId(UnitId),
}

/// Errors that abort a generation pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("no mission could be resolved for player unit `{unit}`: {reason}")]
    PlayerMission {
        unit: UnitId,
        reason: ResolutionFailure,
    },
    #[error("player unit could not be chosen: {0}")]
    PlayerUnit(String),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Expected, non-fatal outcomes of target/escort/path searches.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionFailure {
    #[error("no viable mission type")]
    NoMissionType,
    #[error("aircraft class cannot fly {0:?}")]
    UnsupportedMission(MissionType),
    #[error("no target available for {0:?}")]
    NoTarget(MissionType),
    #[error("no escort partner available")]
    NoEscortCandidate,
    #[error("no offensive unit to react to")]
    NoOffensiveUnit,
    #[error("no friendly unit to follow")]
    NoFollowCandidate,
    #[error("no hunting area available")]
    NoHuntingArea,
    #[error("host found no path")]
    NoPath,
    #[error("host path request timed out after {polls} polls")]
    PathTimeout { polls: u64 },
    #[error("no random point found after {attempts} attempts")]
    NoRandomPoint { attempts: u32 },
    #[error("no front marker for the unit's army")]
    NoFrontMarker,
    #[error("linked generation deeper than {0}")]
    DepthExceeded(u8),
    #[error("unit `{0}` is not available")]
    UnitUnavailable(UnitId),
    #[error("ground unit kind cannot be given an operation")]
    UnsupportedGroundKind,
    #[error("route has fewer than two waypoints")]
    RouteTooShort,
}

pub type GenerationResult<T> = Result<T, GenerationError>;
