//! Air units, ground units and static objects as the generator sees them.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::army::Army;
use crate::geometry::Point;
use crate::mission_type::MissionType;

pub type UnitId = String;

/// Ground unit classes that drive both targeting and movement rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundKind {
    Armor,
    Vehicle,
    Train,
    Ship,
    Unknown,
}

impl GroundKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Armor => "armor",
            Self::Vehicle => "vehicle",
            Self::Train => "train",
            Self::Ship => "ship",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for GroundKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "armor" | "armour" => Ok(Self::Armor),
            "vehicle" => Ok(Self::Vehicle),
            "train" => Ok(Self::Train),
            "ship" => Ok(Self::Ship),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown ground kind `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticKind {
    Artillery,
    Radar,
    Depot,
    Aircraft,
    Ship,
    Other,
}

impl StaticKind {
    pub const SYNTHETIC: [Self; 4] = [Self::Artillery, Self::Radar, Self::Depot, Self::Aircraft];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Artillery => "artillery",
            Self::Radar => "radar",
            Self::Depot => "depot",
            Self::Aircraft => "aircraft",
            Self::Ship => "ship",
            Self::Other => "other",
        }
    }
}

impl FromStr for StaticKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "artillery" => Ok(Self::Artillery),
            "radar" => Ok(Self::Radar),
            "depot" => Ok(Self::Depot),
            "aircraft" => Ok(Self::Aircraft),
            "ship" => Ok(Self::Ship),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown static kind `{other}`")),
        }
    }
}

/// Per-kind behaviour switches for static objects.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum StaticOptions {
    #[default]
    None,
    Artillery { timeout_min: u32, hide_radius: f64 },
    Ship { sleep_min: u32, skill: u8, slow_fire: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticObject {
    pub id: UnitId,
    pub army: Army,
    pub kind: StaticKind,
    /// Host object class, written through untouched.
    pub class: String,
    pub position: Point,
    pub direction: f64,
    #[serde(default)]
    pub options: StaticOptions,
}

/// Curve control point hanging off a line waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplinePoint {
    pub point: Point,
    /// Raw control parameters as the host produced them.
    pub control: SmallVec<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundWaypoint {
    pub point: Point,
    pub speed: Option<f64>,
    #[serde(default)]
    pub sub_waypoints: Vec<SplinePoint>,
}

impl GroundWaypoint {
    #[must_use]
    pub const fn line(point: Point, speed: Option<f64>) -> Self {
        Self {
            point,
            speed,
            sub_waypoints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundUnit {
    pub id: UnitId,
    pub army: Army,
    pub kind: GroundKind,
    /// Host unit class, written through untouched.
    pub class: String,
    pub count: u8,
    pub waypoints: Vec<GroundWaypoint>,
    #[serde(default)]
    pub mission_assigned: bool,
}

impl GroundUnit {
    /// Current position: the first waypoint.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        self.waypoints.first().map(|wp| wp.point)
    }
}

/// What a generated air mission is aimed at. Exactly one kind per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    Ground(UnitId),
    Static(UnitId),
    Area(Point),
    Air(UnitId),
}

impl Target {
    #[must_use]
    pub fn air_unit(&self) -> Option<&str> {
        match self {
            Self::Air(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

pub type FlightSlots = SmallVec<[u32; 4]>;

/// Flight index → ordered aircraft slot ids.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flights(pub Vec<FlightSlots>);

impl Flights {
    /// `count` flights of `size` aircraft numbered sequentially from zero.
    #[must_use]
    pub fn numbered(count: u8, size: u8) -> Self {
        let mut next = 0u32;
        let flights = (0..count)
            .map(|_| {
                (0..size)
                    .map(|_| {
                        let slot = next;
                        next += 1;
                        slot
                    })
                    .collect()
            })
            .collect();
        Self(flights)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn aircraft(&self) -> usize {
        self.0.iter().map(SmallVec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(SmallVec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlightSlots> {
        self.0.iter()
    }
}

/// Skill applied to a generated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillSetting {
    Unit(u8),
    PerFlight(Vec<u8>),
}

impl Default for SkillSetting {
    fn default() -> Self {
        Self::Unit(1)
    }
}

/// Explicit skill override supplied by the caller, honoured verbatim.
pub type SkillSpec = SkillSetting;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnMode {
    Air,
    Runway,
    Parked,
}

impl SpawnMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::Runway => "runway",
            Self::Parked => "parked",
        }
    }
}

/// Spawn, speed and fuel overrides. `None` keeps the host default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnOverrides {
    pub mode: Option<SpawnMode>,
    pub speed: Option<f64>,
    pub fuel: Option<u8>,
}

pub type SpawnSpec = SpawnOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirWaypointKind {
    Takeoff,
    Ingress,
    Action,
    Landing,
}

impl AirWaypointKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Takeoff => "Takeoff",
            Self::Ingress => "Ingress",
            Self::Action => "Target",
            Self::Landing => "Landing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirWaypoint {
    pub kind: AirWaypointKind,
    pub point: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirUnit {
    pub id: UnitId,
    pub army: Army,
    /// Key into the aircraft catalog.
    pub aircraft: String,
    /// Base position.
    pub position: Point,
    pub nominal_flights: u8,
    pub nominal_flight_size: u8,
    pub mission: Option<MissionType>,
    pub target: Option<Target>,
    /// Unit escorting this one, if any.
    pub escorted_by: Option<UnitId>,
    pub altitude: Option<f64>,
    pub loadout: String,
    pub flights: Flights,
    pub skill: SkillSetting,
    pub spawn: SpawnOverrides,
    pub route: Vec<AirWaypoint>,
    pub player_slot: Option<u32>,
}

impl AirUnit {
    #[must_use]
    pub fn new(id: &str, army: Army, aircraft: &str, position: Point) -> Self {
        Self {
            id: id.to_string(),
            army,
            aircraft: aircraft.to_string(),
            position,
            nominal_flights: 1,
            nominal_flight_size: 4,
            mission: None,
            target: None,
            escorted_by: None,
            altitude: None,
            loadout: String::new(),
            flights: Flights::default(),
            skill: SkillSetting::default(),
            spawn: SpawnOverrides::default(),
            route: Vec::new(),
            player_slot: None,
        }
    }

    /// Drop everything a previous generation pass attached.
    pub fn reset_mission(&mut self) {
        self.mission = None;
        self.target = None;
        self.escorted_by = None;
        self.altitude = None;
        self.loadout.clear();
        self.flights = Flights::default();
        self.skill = SkillSetting::default();
        self.spawn = SpawnOverrides::default();
        self.route.clear();
        self.player_slot = None;
    }

    /// Position of the action waypoint once a route exists.
    #[must_use]
    pub fn action_point(&self) -> Option<Point> {
        self.route
            .iter()
            .find(|wp| wp.kind == AirWaypointKind::Action)
            .map(|wp| wp.point)
    }
}

impl fmt::Display for AirUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.id, self.army, self.aircraft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flights_number_sequentially_across_flights() {
        let flights = Flights::numbered(3, 2);
        assert_eq!(flights.count(), 3);
        assert_eq!(flights.aircraft(), 6);
        let slots: Vec<u32> = flights.iter().flat_map(|f| f.iter().copied()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5]);
        assert!(Flights::default().is_empty());
    }

    #[test]
    fn reset_clears_generated_state() {
        let mut unit = AirUnit::new("r01", Army::Red, "yak", Point::ground(0.0, 0.0));
        unit.mission = Some(MissionType::Escort);
        unit.target = Some(Target::Air("r02".into()));
        unit.flights = Flights::numbered(1, 2);
        unit.player_slot = Some(0);
        unit.reset_mission();
        assert_eq!(unit.mission, None);
        assert_eq!(unit.target, None);
        assert!(unit.flights.is_empty());
        assert_eq!(unit.player_slot, None);
    }

    #[test]
    fn ground_kinds_parse_with_aliases() {
        assert_eq!("Armour".parse::<GroundKind>(), Ok(GroundKind::Armor));
        assert!("tank".parse::<GroundKind>().is_err());
        assert_eq!("radar".parse::<StaticKind>(), Ok(StaticKind::Radar));
    }
}
