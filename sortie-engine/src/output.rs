//! Mission data written through the section store.
//!
//! ```text
//! [MAIN]          copied from the environment template, then Mission, Day,
//!                 Time, Weather, CloudHeight, PlayerUnit, PlayerSlot
//! [Wing]          <id> <army> <class>               assigned air units, in order
//! [<id>]          Mission, Target, Altitude, Loadout, Flights, Skill, ...
//! [<id>_Way]      <takeoff|ingress|action|landing> <x> <y> <z>
//! [Chiefs]        <id> <army> <kind> <class> <count>
//! [<id>_Road]     <x> <y> <speed|-> (with S <x> <y> <control...> curve lines)
//! [NStationary]   <id> <army> <kind> <class> <x> <y> <direction> [options]
//! ```
use std::fmt::Write as _;

use crate::pools::ResourcePools;
use crate::section::{SectionRead, SectionStore, SectionWrite};
use crate::template::{Environment, fmt_num, fmt_static_options};
use crate::units::{AirUnit, AirWaypointKind, GroundUnit, SkillSetting, Target};

pub const SECTION_WING: &str = "Wing";
pub const SECTION_CHIEFS: &str = "Chiefs";
pub const SECTION_STATIONARY: &str = "NStationary";
const WAY_SUFFIX: &str = "_Way";
const ROAD_SUFFIX: &str = "_Road";

/// Header values of one mission file.
#[derive(Debug, Clone, Copy)]
pub struct MissionHeader<'a> {
    pub mission_id: &'a str,
    pub day: u32,
    pub environment: &'a Environment,
    pub player_unit: &'a str,
    pub player_slot: u32,
}

/// Serialize a finished pass.
///
/// Every section of `environment_template` is copied first; `MAIN` keys the
/// pass owns are then overwritten. Only assigned air units are written;
/// ground units and statics are written from the full history pools.
#[must_use]
pub fn write_mission(
    environment_template: &SectionStore,
    header: &MissionHeader<'_>,
    pools: &ResourcePools,
) -> SectionStore {
    let mut store = SectionStore::new(header.mission_id);
    for section in environment_template.section_names() {
        store.ensure_section(section);
        for (key, value) in environment_template.entries(section).unwrap_or_default() {
            store.append(section, key, value);
        }
    }

    store.set("MAIN", "Mission", header.mission_id);
    store.set("MAIN", "Day", &header.day.to_string());
    store.set("MAIN", "Time", &fmt_num(header.environment.time));
    store.set("MAIN", "Weather", &header.environment.weather.to_string());
    store.set(
        "MAIN",
        "CloudHeight",
        &fmt_num(header.environment.cloud_height),
    );
    store.set("MAIN", "PlayerUnit", header.player_unit);
    store.set("MAIN", "PlayerSlot", &header.player_slot.to_string());

    store.ensure_section(SECTION_WING);
    for unit in pools.assigned_air() {
        let value = format!("{} {}", unit.army.code(), unit.aircraft);
        store.append(SECTION_WING, &unit.id, &value);
    }
    for unit in pools.assigned_air() {
        write_air_unit(&mut store, unit);
    }

    store.ensure_section(SECTION_CHIEFS);
    for unit in pools.all_ground() {
        let value = format!(
            "{} {} {} {}",
            unit.army.code(),
            unit.kind.as_str(),
            unit.class,
            unit.count
        );
        store.append(SECTION_CHIEFS, &unit.id, &value);
        write_road(&mut store, unit);
    }

    store.ensure_section(SECTION_STATIONARY);
    for object in pools.all_statics() {
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
        store.append(SECTION_STATIONARY, &object.id, &value);
    }
    store
}

fn write_air_unit(store: &mut SectionStore, unit: &AirUnit) {
    let section = unit.id.as_str();
    if let Some(mission) = unit.mission {
        store.set(section, "Mission", mission.as_str());
    }
    if let Some(target) = &unit.target {
        store.set(section, "Target", &fmt_target(target));
    }
    if let Some(altitude) = unit.altitude {
        store.set(section, "Altitude", &fmt_num(altitude));
    }
    store.set(section, "Loadout", &unit.loadout);
    let flights: Vec<String> = unit
        .flights
        .iter()
        .map(|flight| {
            flight
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    store.set(section, "Flights", &flights.join(" "));
    store.set(section, "Skill", &fmt_skill(&unit.skill));
    if let Some(mode) = unit.spawn.mode {
        store.set(section, "Spawn", mode.as_str());
    }
    if let Some(speed) = unit.spawn.speed {
        store.set(section, "Speed", &fmt_num(speed));
    }
    if let Some(fuel) = unit.spawn.fuel {
        store.set(section, "Fuel", &fuel.to_string());
    }
    if let Some(escort) = &unit.escorted_by {
        store.set(section, "EscortedBy", escort);
    }
    if let Some(slot) = unit.player_slot {
        store.set(section, "Player", &slot.to_string());
    }

    let way = format!("{}{WAY_SUFFIX}", unit.id);
    store.ensure_section(&way);
    for wp in &unit.route {
        let value = format!(
            "{} {} {}",
            fmt_num(wp.point.x),
            fmt_num(wp.point.y),
            fmt_num(wp.point.z)
        );
        store.append(&way, waypoint_key(wp.kind), &value);
    }
}

fn write_road(store: &mut SectionStore, unit: &GroundUnit) {
    let road = format!("{}{ROAD_SUFFIX}", unit.id);
    store.ensure_section(&road);
    for wp in &unit.waypoints {
        let speed = wp.speed.map_or_else(|| "-".to_string(), fmt_num);
        let value = format!("{} {speed}", fmt_num(wp.point.y));
        store.append(&road, &fmt_num(wp.point.x), &value);
        for sub in &wp.sub_waypoints {
            let mut value = format!("{} {}", fmt_num(sub.point.x), fmt_num(sub.point.y));
            for control in &sub.control {
                let _ = write!(value, " {}", fmt_num(*control));
            }
            store.append(&road, "S", &value);
        }
    }
}

const fn waypoint_key(kind: AirWaypointKind) -> &'static str {
    match kind {
        AirWaypointKind::Takeoff => "takeoff",
        AirWaypointKind::Ingress => "ingress",
        AirWaypointKind::Action => "action",
        AirWaypointKind::Landing => "landing",
    }
}

#[must_use]
pub fn fmt_target(target: &Target) -> String {
    match target {
        Target::Ground(id) => format!("ground {id}"),
        Target::Static(id) => format!("static {id}"),
        Target::Area(point) => format!("area {} {}", fmt_num(point.x), fmt_num(point.y)),
        Target::Air(id) => format!("air {id}"),
    }
}

#[must_use]
pub fn fmt_skill(skill: &SkillSetting) -> String {
    match skill {
        SkillSetting::Unit(level) => level.to_string(),
        SkillSetting::PerFlight(levels) => levels
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}
