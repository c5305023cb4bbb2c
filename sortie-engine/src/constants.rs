//! Centralized tuning constants for the Sortie generation engine.
//!
//! These values define the fixed geometry and table math of a generation
//! pass. Anything an operator is expected to tune lives in
//! [`crate::config::GenerationConfig`] instead.

// Diagnostic keys ----------------------------------------------------------
pub const LOG_AIR_JAMMED: &str = "log.air.jammed";
pub const LOG_AIR_UNRESOLVED: &str = "log.air.unresolved";
pub const LOG_AIR_ESCORT_SKIPPED: &str = "log.air.escort_skipped";
pub const LOG_AIR_DEFENSE_SKIPPED: &str = "log.air.defense_skipped";
pub const LOG_AIR_EXPLICIT_ARMY_MISMATCH: &str = "log.air.explicit_army_mismatch";
pub const LOG_GROUND_ROUTE_ARMY_MISMATCH: &str = "log.ground.route_army_mismatch";
pub const LOG_GROUND_EXPLICIT_ARMY_MISMATCH: &str = "log.ground.explicit_army_mismatch";
pub const LOG_GROUND_ROUTE_TOO_SHORT: &str = "log.ground.route_too_short";
pub const LOG_GROUND_STATIC_UNOWNED: &str = "log.ground.static_unowned";
pub const LOG_GROUND_RANDOM_POINT_EXHAUSTED: &str = "log.ground.random_point_exhausted";
pub const LOG_GROUND_UNRESOLVED: &str = "log.ground.unresolved";
pub const LOG_GROUND_COLUMN_SKIPPED: &str = "log.ground.column_skipped";
pub const LOG_PADDING_SKIPPED: &str = "log.padding.skipped";

// Air operations -----------------------------------------------------------
/// Radius around a committed unit inside which no other unit may stay available.
pub const RUNWAY_JAM_RADIUS: f64 = 1000.0;
/// Escort and defensive chains never nest deeper than this.
pub const MAX_LINK_DEPTH: u8 = 2;
pub const MAX_FLIGHTS: u8 = 4;
pub const MAX_FLIGHT_SIZE: u8 = 4;
/// Escorts and followers fly this far above their partner.
pub const ESCORT_ALTITUDE_OFFSET: f64 = 200.0;
/// Ingress waypoint sits this fraction of the way from base to target.
pub const INGRESS_FRACTION: f64 = 0.6;
/// Player rank indices span `0..=PLAYER_RANK_MAX`.
pub const PLAYER_RANK_MAX: u8 = 5;
pub const PLAYER_RANK_DIVISOR: usize = 6;

/// Skill draws for fighter-like roles (0 rookie .. 3 ace).
pub const FIGHTER_SKILL_TABLE: [u8; 5] = [0, 1, 1, 2, 3];
/// Skill draws for bombers, attackers and reconnaissance crews.
pub const BOMBER_SKILL_TABLE: [u8; 5] = [0, 0, 1, 1, 2];

// Ground operations --------------------------------------------------------
/// Perpendicular spacing between ships of a column formation.
pub const COLUMN_BASE_OFFSET: f64 = 500.0;
pub const RANDOM_POINT_ATTEMPTS: u32 = 100;
pub const MIN_ROUTE_WAYPOINTS: usize = 2;
/// Start/end search radius handed to the host pathfinder.
pub const PATH_ENDPOINT_RADIUS: f64 = 250.0;
/// Synthetic land units start within this multiple of an airfield radius.
pub const PADDING_AIRPORT_SPREAD: f64 = 4.0;
/// Second waypoint of a synthetic land unit lies within this distance.
pub const PADDING_DRIVE_DISTANCE: f64 = 3000.0;
pub const PADDING_ID_PREFIX: &str = "gen_";
pub const DEFAULT_GROUND_SPEED: f64 = 10.0;
pub const DEFAULT_SHIP_SPEED: f64 = 6.0;
pub const DEFAULT_TRAIN_SPEED: f64 = 15.0;
