//! Sortie Mission Engine
//!
//! Procedural generation of daily air and ground operations for a campaign
//! running on top of a flight-simulation host. The host is reached only
//! through [`WorldQuery`]; templates and mission data go through the generic
//! section store in [`section`].

pub mod air;
pub mod aircraft;
pub mod army;
pub mod briefing;
pub mod config;
pub mod constants;
pub mod engine;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod ground;
pub mod mission_type;
pub mod numbers;
pub mod output;
pub mod pools;
pub mod rng;
pub mod sandbox;
pub mod section;
pub mod selector;
pub mod template;
pub mod units;
pub mod world;

// Re-export commonly used types
pub use air::{
    AssignRequest, Assignment, ForcedTarget, Forcing, MissionChoice, assign_mission,
    assign_player_seat, compose_flights,
};
pub use aircraft::{AircraftCatalog, AircraftClass, AircraftRole};
pub use army::Army;
pub use briefing::{Briefing, BriefingWaypoint, UnitBriefing};
pub use config::{CountRange, GenerationConfig, PaddingConfig, ValueRange};
pub use engine::{
    DayParameters, GeneratedMission, GeneratedTemplate, MissionEngine, PlayerAssignment,
    PlayerSelector,
};
pub use environment::{EnvSetting, EnvironmentRequest, resolve_environment};
pub use error::{ConfigError, GenerationError, GenerationResult, PoolError, ResolutionFailure};
pub use geometry::{Point, Vector2};
pub use ground::{
    GroundAssignment, GroundNetwork, SampleArea, assign_ground_operation, build_column,
    build_network, create_random_point, find_path, pad_ground_presence,
};
pub use mission_type::MissionType;
pub use pools::{Diagnostic, Diagnostics, GenerationContext, ResourcePools};
pub use rng::RngBundle;
pub use sandbox::{SandboxWorld, sample_template};
pub use section::{SectionRead, SectionStore, SectionWrite};
pub use selector::{select_by_distance, select_index_by_distance};
pub use template::{CampaignTemplate, Environment, FrontMarker, RouteSkeleton, TemplateSource};
pub use units::{
    AirUnit, AirWaypoint, AirWaypointKind, Flights, GroundKind, GroundUnit, GroundWaypoint,
    SkillSetting, SkillSpec, SpawnMode, SpawnOverrides, SpawnSpec, StaticKind, StaticObject,
    Target, UnitId,
};
pub use world::{
    Airport, Bounds, PathPoint, PathQuery, PathStatus, PathTicket, Surface, TerrainFlags,
    WorldQuery,
};
