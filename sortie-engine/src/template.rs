//! Campaign templates: the raw skeletons read from section files and the
//! built per-day template the orchestrator generates missions from.
//!
//! Template sections:
//!
//! ```text
//! [MAIN]         Name, Day, Time, Weather, CloudHeight
//! [Aircraft]     <class> <role|missions|loadouts>
//! [AirUnits]     <id> <army> <class> <x> <y> <flights> <flight size>
//! [Routes]       <id> <road|waterway|railway> <unit kind> <class> <army|-> <count>
//! [<id>_Route]   P <x> <y> [speed]
//! [Statics]      <id> <army|-> <kind> <class> <x> <y> <direction> [options]
//! [FrontMarkers] <id> <x> <y> <army>
//! ```
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::aircraft::AircraftCatalog;
use crate::army::Army;
use crate::error::ConfigError;
use crate::geometry::Point;
use crate::section::{SectionRead, SectionStore, SectionWrite};
use crate::units::{
    AirUnit, GroundKind, GroundUnit, StaticKind, StaticObject, StaticOptions, UnitId,
};

pub const SECTION_MAIN: &str = "MAIN";
pub const SECTION_AIRCRAFT: &str = "Aircraft";
pub const SECTION_AIR_UNITS: &str = "AirUnits";
pub const SECTION_ROUTES: &str = "Routes";
pub const SECTION_STATICS: &str = "Statics";
pub const SECTION_FRONT_MARKERS: &str = "FrontMarkers";
const ROUTE_SUFFIX: &str = "_Route";
const NO_ARMY: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Road,
    Waterway,
    Railway,
}

impl RouteKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Road => "road",
            Self::Waterway => "waterway",
            Self::Railway => "railway",
        }
    }
}

impl FromStr for RouteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "road" => Ok(Self::Road),
            "waterway" => Ok(Self::Waterway),
            "railway" => Ok(Self::Railway),
            other => Err(format!("unknown route kind `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub point: Point,
    pub speed: Option<f64>,
}

/// Template route a ground unit may be derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSkeleton {
    pub id: UnitId,
    pub kind: RouteKind,
    pub unit_kind: GroundKind,
    pub class: String,
    /// Explicit army; must agree with the front line when present.
    pub army: Option<Army>,
    pub count: u8,
    pub points: Vec<RoutePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSkeleton {
    pub id: UnitId,
    pub army: Option<Army>,
    pub kind: StaticKind,
    pub class: String,
    pub position: Point,
    pub direction: f64,
    pub options: StaticOptions,
}

/// Point ground units head for when given a random operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMarker {
    pub id: String,
    pub point: Point,
    pub army: Army,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Hour of day, fractional.
    pub time: f64,
    pub weather: u8,
    pub cloud_height: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            time: 12.0,
            weather: 0,
            cloud_height: 1_500.0,
        }
    }
}

/// Everything parsed out of one or more template files, before any
/// front-line filtering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateSource {
    pub name: Option<String>,
    pub day: Option<u32>,
    pub environment: Option<Environment>,
    pub aircraft: AircraftCatalog,
    pub air_units: BTreeMap<UnitId, AirUnit>,
    pub routes: BTreeMap<UnitId, RouteSkeleton>,
    pub statics: BTreeMap<UnitId, StaticSkeleton>,
    pub front_markers: Vec<FrontMarker>,
}

impl TemplateSource {
    /// Parse and merge several files; later files override earlier ids.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found in any file.
    pub fn from_files<S: SectionRead>(files: &[S]) -> Result<Self, ConfigError> {
        let mut source = Self::default();
        for file in files {
            source.merge_file(file)?;
        }
        Ok(source)
    }

    /// Parse one file into `self`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the file, section and key at fault.
    pub fn merge_file<S: SectionRead>(&mut self, file: &S) -> Result<(), ConfigError> {
        if file.has_section(SECTION_MAIN) {
            self.merge_main(file)?;
        }
        if let Some(entries) = file.entries(SECTION_AIRCRAFT) {
            for (name, params) in entries {
                self.aircraft.insert_params(SECTION_AIRCRAFT, name, params)?;
            }
        }
        if let Some(entries) = file.entries(SECTION_AIR_UNITS) {
            for (id, value) in entries {
                let unit = parse_air_unit(file, id, value)?;
                self.air_units.insert(unit.id.clone(), unit);
            }
        }
        if let Some(entries) = file.entries(SECTION_ROUTES) {
            for (id, value) in entries {
                let route = parse_route(file, id, value)?;
                self.routes.insert(route.id.clone(), route);
            }
        }
        if let Some(entries) = file.entries(SECTION_STATICS) {
            for (id, value) in entries {
                let object = parse_static(file, id, value)?;
                self.statics.insert(object.id.clone(), object);
            }
        }
        if let Some(entries) = file.entries(SECTION_FRONT_MARKERS) {
            for (id, value) in entries {
                let marker = parse_front_marker(file, id, value)?;
                self.front_markers.retain(|m| m.id != marker.id);
                self.front_markers.push(marker);
            }
        }
        Ok(())
    }

    fn merge_main<S: SectionRead>(&mut self, file: &S) -> Result<(), ConfigError> {
        if let Some(name) = file.get(SECTION_MAIN, "Name") {
            self.name = Some(name.to_string());
        }
        if let Some(day) = file.parse_optional::<u32>(SECTION_MAIN, "Day")? {
            self.day = Some(day);
        }
        let mut env = self.environment.unwrap_or_default();
        env.time = file
            .parse_optional(SECTION_MAIN, "Time")?
            .unwrap_or(env.time);
        env.weather = file
            .parse_optional(SECTION_MAIN, "Weather")?
            .unwrap_or(env.weather);
        env.cloud_height = file
            .parse_optional(SECTION_MAIN, "CloudHeight")?
            .unwrap_or(env.cloud_height);
        self.environment = Some(env);
        Ok(())
    }

    /// Every air unit must name a known aircraft class.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAircraft`] for the first unit that does not.
    pub fn check_aircraft(&self) -> Result<(), ConfigError> {
        for unit in self.air_units.values() {
            if self.aircraft.get(&unit.aircraft).is_none() {
                return Err(ConfigError::UnknownAircraft {
                    unit: unit.id.clone(),
                    class: unit.aircraft.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The built per-day template missions are generated from.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignTemplate {
    pub name: String,
    pub day: u32,
    pub environment: Environment,
    pub aircraft: AircraftCatalog,
    pub air_units: BTreeMap<UnitId, AirUnit>,
    pub ground_units: BTreeMap<UnitId, GroundUnit>,
    pub statics: BTreeMap<UnitId, StaticObject>,
    pub front_markers: Vec<FrontMarker>,
}

impl CampaignTemplate {
    /// Render the template back into section form.
    ///
    /// Ground units become routes with explicit armies so reloading the file
    /// re-validates them against the front line of the day it is loaded.
    #[must_use]
    pub fn to_store(&self, file_name: &str) -> SectionStore {
        let mut store = SectionStore::new(file_name);
        store.set(SECTION_MAIN, "Name", &self.name);
        store.set(SECTION_MAIN, "Day", &self.day.to_string());
        store.set(SECTION_MAIN, "Time", &fmt_num(self.environment.time));
        store.set(SECTION_MAIN, "Weather", &self.environment.weather.to_string());
        store.set(
            SECTION_MAIN,
            "CloudHeight",
            &fmt_num(self.environment.cloud_height),
        );

        store.ensure_section(SECTION_AIRCRAFT);
        for class in self.aircraft.iter() {
            store.append(SECTION_AIRCRAFT, &class.name, &class.to_params());
        }

        store.ensure_section(SECTION_AIR_UNITS);
        for unit in self.air_units.values() {
            let value = format!(
                "{} {} {} {} {} {}",
                unit.army.code(),
                unit.aircraft,
                fmt_num(unit.position.x),
                fmt_num(unit.position.y),
                unit.nominal_flights,
                unit.nominal_flight_size
            );
            store.append(SECTION_AIR_UNITS, &unit.id, &value);
        }

        store.ensure_section(SECTION_ROUTES);
        for unit in self.ground_units.values() {
            let kind = match unit.kind {
                GroundKind::Ship => RouteKind::Waterway,
                GroundKind::Train => RouteKind::Railway,
                _ => RouteKind::Road,
            };
            let value = format!(
                "{} {} {} {} {}",
                kind.as_str(),
                unit.kind.as_str(),
                unit.class,
                unit.army.code(),
                unit.count
            );
            store.append(SECTION_ROUTES, &unit.id, &value);
            let section = format!("{}{ROUTE_SUFFIX}", unit.id);
            for wp in &unit.waypoints {
                let mut line = format!("{} {}", fmt_num(wp.point.x), fmt_num(wp.point.y));
                if let Some(speed) = wp.speed {
                    let _ = write!(line, " {}", fmt_num(speed));
                }
                store.append(&section, "P", &line);
            }
        }

        store.ensure_section(SECTION_STATICS);
        for object in self.statics.values() {
            let mut value = format!(
                "{} {} {} {} {} {}",
                object.army.code(),
                object.kind.as_str(),
                object.class,
                fmt_num(object.position.x),
                fmt_num(object.position.y),
                fmt_num(object.direction)
            );
            if let Some(options) = fmt_static_options(&object.options) {
                let _ = write!(value, " {options}");
            }
            store.append(SECTION_STATICS, &object.id, &value);
        }

        store.ensure_section(SECTION_FRONT_MARKERS);
        for marker in &self.front_markers {
            let value = format!(
                "{} {} {}",
                fmt_num(marker.point.x),
                fmt_num(marker.point.y),
                marker.army.code()
            );
            store.append(SECTION_FRONT_MARKERS, &marker.id, &value);
        }
        store
    }
}

/// Shortest decimal rendering that reparses to the same value.
#[must_use]
pub fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn fields(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}

/// Parse the `idx`th whitespace field of an entry.
fn field<S, T>(
    file: &S,
    section: &str,
    key: &str,
    value: &str,
    parts: &[&str],
    idx: usize,
    what: &str,
) -> Result<T, ConfigError>
where
    S: SectionRead,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = parts
        .get(idx)
        .ok_or_else(|| file.invalid(section, key, value, &format!("missing {what}")))?;
    raw.parse::<T>()
        .map_err(|e| file.invalid(section, key, value, &format!("{what}: {e}")))
}

fn optional_army<S: SectionRead>(
    file: &S,
    section: &str,
    key: &str,
    value: &str,
    raw: Option<&&str>,
) -> Result<Option<Army>, ConfigError> {
    match raw {
        None => Err(file.invalid(section, key, value, "missing army")),
        Some(&NO_ARMY) => Ok(None),
        Some(code) => code
            .parse::<Army>()
            .map(Some)
            .map_err(|e| file.invalid(section, key, value, &e)),
    }
}

fn parse_air_unit<S: SectionRead>(file: &S, id: &str, value: &str) -> Result<AirUnit, ConfigError> {
    let s = SECTION_AIR_UNITS;
    let parts = fields(value);
    let army: Army = field(file, s, id, value, &parts, 0, "army")?;
    let class: String = field(file, s, id, value, &parts, 1, "aircraft class")?;
    let x: f64 = field(file, s, id, value, &parts, 2, "x")?;
    let y: f64 = field(file, s, id, value, &parts, 3, "y")?;
    let flights: u8 = field(file, s, id, value, &parts, 4, "flight count")?;
    let size: u8 = field(file, s, id, value, &parts, 5, "flight size")?;
    if flights == 0 || size == 0 {
        return Err(file.invalid(s, id, value, "flight shape must be non-zero"));
    }
    let mut unit = AirUnit::new(id, army, &class, Point::ground(x, y));
    unit.nominal_flights = flights;
    unit.nominal_flight_size = size;
    Ok(unit)
}

fn parse_route<S: SectionRead>(
    file: &S,
    id: &str,
    value: &str,
) -> Result<RouteSkeleton, ConfigError> {
    let s = SECTION_ROUTES;
    let parts = fields(value);
    let kind: RouteKind = field(file, s, id, value, &parts, 0, "route kind")?;
    let unit_kind: GroundKind = field(file, s, id, value, &parts, 1, "unit kind")?;
    let class: String = field(file, s, id, value, &parts, 2, "unit class")?;
    let army = optional_army(file, s, id, value, parts.get(3))?;
    let count: u8 = field(file, s, id, value, &parts, 4, "unit count")?;

    let route_section = format!("{id}{ROUTE_SUFFIX}");
    let mut points = Vec::new();
    for (key, line) in file.require_entries(&route_section)? {
        let parts = fields(line);
        let x: f64 = field(file, &route_section, key, line, &parts, 0, "x")?;
        let y: f64 = field(file, &route_section, key, line, &parts, 1, "y")?;
        let speed = match parts.get(2) {
            Some(raw) => Some(raw.parse::<f64>().map_err(|e| {
                file.invalid(&route_section, key, line, &format!("speed: {e}"))
            })?),
            None => None,
        };
        points.push(RoutePoint {
            point: Point::ground(x, y),
            speed,
        });
    }

    Ok(RouteSkeleton {
        id: id.to_string(),
        kind,
        unit_kind,
        class,
        army,
        count: count.max(1),
        points,
    })
}

fn parse_static<S: SectionRead>(
    file: &S,
    id: &str,
    value: &str,
) -> Result<StaticSkeleton, ConfigError> {
    let s = SECTION_STATICS;
    let parts = fields(value);
    let army = optional_army(file, s, id, value, parts.first())?;
    let kind: StaticKind = field(file, s, id, value, &parts, 1, "static kind")?;
    let class: String = field(file, s, id, value, &parts, 2, "object class")?;
    let x: f64 = field(file, s, id, value, &parts, 3, "x")?;
    let y: f64 = field(file, s, id, value, &parts, 4, "y")?;
    let direction: f64 = field(file, s, id, value, &parts, 5, "direction")?;
    let options = match parts.get(6) {
        Some(raw) => parse_static_options(kind, raw).map_err(|e| file.invalid(s, id, value, &e))?,
        None => StaticOptions::None,
    };
    Ok(StaticSkeleton {
        id: id.to_string(),
        army,
        kind,
        class,
        position: Point::ground(x, y),
        direction,
        options,
    })
}

fn parse_front_marker<S: SectionRead>(
    file: &S,
    id: &str,
    value: &str,
) -> Result<FrontMarker, ConfigError> {
    let s = SECTION_FRONT_MARKERS;
    let parts = fields(value);
    let x: f64 = field(file, s, id, value, &parts, 0, "x")?;
    let y: f64 = field(file, s, id, value, &parts, 1, "y")?;
    let army: Army = field(file, s, id, value, &parts, 2, "army")?;
    Ok(FrontMarker {
        id: id.to_string(),
        point: Point::ground(x, y),
        army,
    })
}

/// `timeout=30,hide=500` for artillery, `sleep=10,skill=2,slow_fire=1.5` for ships.
fn parse_static_options(kind: StaticKind, raw: &str) -> Result<StaticOptions, String> {
    let mut pairs = BTreeMap::new();
    for pair in raw.split(',').filter(|p| !p.is_empty()) {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| format!("option `{pair}` lacks `=`"))?;
        pairs.insert(k.trim(), v.trim());
    }
    let num = |key: &str| -> Result<Option<f64>, String> {
        pairs
            .get(key)
            .map(|v| v.parse::<f64>().map_err(|e| format!("option `{key}`: {e}")))
            .transpose()
    };
    let int = |key: &str| -> Result<Option<u32>, String> {
        pairs
            .get(key)
            .map(|v| v.parse::<u32>().map_err(|e| format!("option `{key}`: {e}")))
            .transpose()
    };
    match kind {
        StaticKind::Artillery => Ok(StaticOptions::Artillery {
            timeout_min: int("timeout")?.unwrap_or(0),
            hide_radius: num("hide")?.unwrap_or(0.0),
        }),
        StaticKind::Ship => Ok(StaticOptions::Ship {
            sleep_min: int("sleep")?.unwrap_or(0),
            skill: u8::try_from(int("skill")?.unwrap_or(2)).map_err(|e| e.to_string())?,
            slow_fire: num("slow_fire")?.unwrap_or(1.0),
        }),
        other => Err(format!("{} objects take no options", other.as_str())),
    }
}

#[must_use]
pub fn fmt_static_options(options: &StaticOptions) -> Option<String> {
    match options {
        StaticOptions::None => None,
        StaticOptions::Artillery {
            timeout_min,
            hide_radius,
        } => Some(format!("timeout={timeout_min},hide={}", fmt_num(*hide_radius))),
        StaticOptions::Ship {
            sleep_min,
            skill,
            slow_fire,
        } => Some(format!(
            "sleep={sleep_min},skill={skill},slow_fire={}",
            fmt_num(*slow_fire)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission_type::MissionType;

    const FILE: &str = "\
[MAIN]
  Name Test Front
  Day 3
  Time 9.5
  Weather 1
[Aircraft]
  yak1 fighter|intercept,escort
  il2 attack|attack_armor|attack_armor=4xPTAB
[AirUnits]
  r01 1 il2 1000 2000 2 4
  b01 2 yak1 90000 2000 1 2
[Routes]
  rail1 railway train loco 1 1
  road1 road armor t34 - 5
[rail1_Route]
  P 100 100 15
  P 500 100
[road1_Route]
  P 0 0
  P 10 10
[Statics]
  art1 1 artillery zis3 300 400 90 timeout=30,hide=500
  dep1 - depot depot 10 10 0
[FrontMarkers]
  fm1 500 500 1
";

    #[test]
    fn parses_every_section() {
        let store = SectionStore::parse("front.tpl", FILE).unwrap();
        let source = TemplateSource::from_files(&[store]).unwrap();
        assert_eq!(source.name.as_deref(), Some("Test Front"));
        assert_eq!(source.day, Some(3));
        let env = source.environment.unwrap();
        assert!((env.time - 9.5).abs() < f64::EPSILON);
        assert_eq!(env.weather, 1);
        assert!((env.cloud_height - 1_500.0).abs() < f64::EPSILON);
        assert!(source.aircraft.supports("il2", MissionType::AttackArmor));
        assert_eq!(source.air_units["r01"].nominal_flights, 2);
        assert_eq!(source.routes["rail1"].army, Some(Army::Red));
        assert_eq!(source.routes["road1"].army, None);
        assert_eq!(source.routes["rail1"].points[0].speed, Some(15.0));
        assert_eq!(
            source.statics["art1"].options,
            StaticOptions::Artillery {
                timeout_min: 30,
                hide_radius: 500.0
            }
        );
        assert_eq!(source.front_markers.len(), 1);
        source.check_aircraft().unwrap();
    }

    #[test]
    fn missing_route_section_is_reported() {
        let store = SectionStore::parse("bad.tpl", "[Routes]\n  r9 road armor t34 1 1\n").unwrap();
        let err = TemplateSource::from_files(&[store]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingSection {
                file: "bad.tpl".into(),
                section: "r9_Route".into()
            }
        );
    }

    #[test]
    fn bad_values_name_the_key() {
        let store = SectionStore::parse("bad.tpl", "[AirUnits]\n  r01 1 il2 x 0 1 1\n").unwrap();
        match TemplateSource::from_files(&[store]).unwrap_err() {
            ConfigError::InvalidValue { section, key, .. } => {
                assert_eq!(section, SECTION_AIR_UNITS);
                assert_eq!(key, "r01");
            }
            other => panic!("unexpected {other:?}"),
        }
        let store =
            SectionStore::parse("bad.tpl", "[Statics]\n  s 1 radar r 0 0 0 sleep=1\n").unwrap();
        assert!(TemplateSource::from_files(&[store]).is_err());
    }

    #[test]
    fn unknown_aircraft_is_a_config_error() {
        let store = SectionStore::parse("t.tpl", "[AirUnits]\n  r01 1 ghost 0 0 1 1\n").unwrap();
        let source = TemplateSource::from_files(&[store]).unwrap();
        assert!(matches!(
            source.check_aircraft(),
            Err(ConfigError::UnknownAircraft { .. })
        ));
    }

    #[test]
    fn later_files_override_earlier_ids() {
        let a = SectionStore::parse("a", "[FrontMarkers]\n  fm1 0 0 1\n").unwrap();
        let b = SectionStore::parse("b", "[FrontMarkers]\n  fm1 5 5 2\n").unwrap();
        let source = TemplateSource::from_files(&[a, b]).unwrap();
        assert_eq!(source.front_markers.len(), 1);
        assert_eq!(source.front_markers[0].army, Army::Blue);
    }

    #[test]
    fn numbers_render_compactly() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(-3.25), "-3.25");
    }
}
