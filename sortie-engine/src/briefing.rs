//! Human-readable briefing assembled after a pass.
use serde::Serialize;
use std::fmt::Write as _;

use crate::army::Army;
use crate::environment::{clock_label, weather_label};
use crate::pools::ResourcePools;
use crate::template::{Environment, fmt_num};
use crate::units::{AirUnit, Target};
use crate::world::WorldQuery;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriefingWaypoint {
    pub label: &'static str,
    pub sector: String,
    pub altitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitBriefing {
    pub unit: String,
    pub army: Army,
    pub aircraft: String,
    pub mission: String,
    pub altitude: Option<f64>,
    pub target: Option<String>,
    pub waypoints: Vec<BriefingWaypoint>,
    /// Unit this one escorts, follows or intercepts.
    pub escorting: Option<String>,
    pub escorted_by: Option<String>,
    pub player: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Briefing {
    pub title: String,
    pub day: u32,
    pub time: String,
    pub weather: &'static str,
    pub cloud_height: f64,
    /// Player unit first, then the other assigned units in assignment order.
    pub units: Vec<UnitBriefing>,
}

impl Briefing {
    /// Build briefing entries for every assigned air unit.
    #[must_use]
    pub fn build<W: WorldQuery>(
        world: &W,
        title: &str,
        day: u32,
        environment: &Environment,
        pools: &ResourcePools,
        player_unit: &str,
    ) -> Self {
        let mut units: Vec<UnitBriefing> = pools
            .assigned_air()
            .map(|unit| unit_briefing(world, pools, unit, unit.id == player_unit))
            .collect();
        if let Some(pos) = units.iter().position(|u| u.player) {
            let player = units.remove(pos);
            units.insert(0, player);
        }
        Self {
            title: title.to_string(),
            day,
            time: clock_label(environment.time),
            weather: weather_label(environment.weather),
            cloud_height: environment.cloud_height,
            units,
        }
    }

    #[must_use]
    pub fn player(&self) -> Option<&UnitBriefing> {
        self.units.first().filter(|u| u.player)
    }

    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "{} - Day {}", self.title, self.day);
        let _ = writeln!(
            text,
            "Time {}, weather {}, clouds at {} m",
            self.time,
            self.weather,
            fmt_num(self.cloud_height)
        );
        for unit in &self.units {
            text.push('\n');
            let marker = if unit.player { " (you)" } else { "" };
            let _ = writeln!(
                text,
                "{} [{} {}]{marker}: {}",
                unit.unit, unit.army, unit.aircraft, unit.mission
            );
            if let Some(target) = &unit.target {
                let _ = writeln!(text, "  Target: {target}");
            }
            if let Some(altitude) = unit.altitude {
                let _ = writeln!(text, "  Altitude: {} m", fmt_num(altitude));
            }
            if let Some(escorting) = &unit.escorting {
                let _ = writeln!(text, "  Covering: {escorting}");
            }
            if let Some(escort) = &unit.escorted_by {
                let _ = writeln!(text, "  Escorted by: {escort}");
            }
            for (idx, wp) in unit.waypoints.iter().enumerate() {
                let _ = writeln!(
                    text,
                    "  {}. {} {} at {} m",
                    idx + 1,
                    wp.label,
                    wp.sector,
                    fmt_num(wp.altitude)
                );
            }
        }
        text
    }
}

fn unit_briefing<W: WorldQuery>(
    world: &W,
    pools: &ResourcePools,
    unit: &AirUnit,
    player: bool,
) -> UnitBriefing {
    let target = unit.target.as_ref().map(|target| match target {
        Target::Ground(id) => {
            let sector = pools
                .ground(id)
                .and_then(|g| g.position())
                .map(|p| world.sector_name(&p));
            describe(id, sector)
        }
        Target::Static(id) => {
            let sector = pools
                .static_object(id)
                .map(|s| world.sector_name(&s.position));
            describe(id, sector)
        }
        Target::Area(point) => format!("area {}", world.sector_name(point)),
        Target::Air(id) => {
            let mission = pools
                .air(id)
                .and_then(|a| a.mission)
                .map_or("unassigned", |m| m.label());
            format!("{id} ({mission})")
        }
    });
    UnitBriefing {
        unit: unit.id.clone(),
        army: unit.army,
        aircraft: unit.aircraft.clone(),
        mission: unit.mission.map_or("Unassigned", |m| m.label()).to_string(),
        altitude: unit.altitude,
        target,
        waypoints: unit
            .route
            .iter()
            .map(|wp| BriefingWaypoint {
                label: wp.kind.label(),
                sector: world.sector_name(&wp.point),
                altitude: wp.point.z,
            })
            .collect(),
        escorting: unit
            .target
            .as_ref()
            .and_then(Target::air_unit)
            .map(str::to_string),
        escorted_by: unit.escorted_by.clone(),
        player,
    }
}

fn describe(id: &str, sector: Option<String>) -> String {
    sector.map_or_else(|| id.to_string(), |s| format!("{id} in {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::mission_type::MissionType;
    use crate::sandbox::SandboxWorld;
    use crate::units::{AirWaypoint, AirWaypointKind};

    fn assigned(id: &str, mission: MissionType, target: Target) -> AirUnit {
        let mut unit = AirUnit::new(id, Army::Red, "yak1", Point::ground(15_000.0, 60_000.0));
        unit.mission = Some(mission);
        unit.target = Some(target);
        unit.altitude = Some(3_000.0);
        unit.route = vec![
            AirWaypoint {
                kind: AirWaypointKind::Takeoff,
                point: Point::ground(15_000.0, 60_000.0),
            },
            AirWaypoint {
                kind: AirWaypointKind::Action,
                point: Point::new(45_000.0, 61_000.0, 3_000.0),
            },
        ];
        unit
    }

    #[test]
    fn player_comes_first_with_cross_references() {
        let world = SandboxWorld::new();
        let mut pools = ResourcePools::new();
        let area = Target::Area(Point::ground(45_000.0, 61_000.0));
        let mut lead = assigned("r01", MissionType::AttackDepot, area);
        lead.escorted_by = Some("r02".into());
        pools.insert_air(lead).unwrap();
        pools
            .insert_air(assigned("r02", MissionType::Escort, Target::Air("r01".into())))
            .unwrap();
        pools.assign_air("r01").unwrap();
        pools.assign_air("r02").unwrap();

        let env = Environment::default();
        let briefing = Briefing::build(&world, "Sandbox Front", 2, &env, &pools, "r02");
        assert_eq!(briefing.units.len(), 2);
        let player = briefing.player().unwrap();
        assert_eq!(player.unit, "r02");
        assert_eq!(player.escorting.as_deref(), Some("r01"));
        assert_eq!(briefing.units[1].escorted_by.as_deref(), Some("r02"));
        assert_eq!(briefing.units[1].waypoints[1].sector, "E7");

        let text = briefing.to_text();
        assert!(text.starts_with("Sandbox Front - Day 2\n"));
        assert!(text.contains("r02 [Red yak1] (you): Escort"));
        assert!(text.contains("Escorted by: r02"));
        assert!(text.contains("2. Target E7 at 3000 m"));
    }
}
