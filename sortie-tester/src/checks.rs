//! Structural checks run against every generated mission.
use std::collections::HashSet;

use sortie_engine::constants::{ESCORT_ALTITUDE_OFFSET, MIN_ROUTE_WAYPOINTS, RUNWAY_JAM_RADIUS};
use sortie_engine::output::SECTION_WING;
use sortie_engine::{
    AirWaypointKind, GeneratedMission, MissionType, ResourcePools, SectionRead, Target,
};

/// Every violation found in `mission`; empty when it is sound.
pub fn check_mission(mission: &GeneratedMission) -> Vec<String> {
    let mut violations = Vec::new();
    check_pools(&mission.pools, &mut violations);
    check_escorts(&mission.pools, &mut violations);
    check_jamming(&mission.pools, &mut violations);
    check_routes(&mission.pools, &mut violations);
    check_player(mission, &mut violations);

    let written = mission.data.entries(SECTION_WING).map_or(0, <[_]>::len);
    let assigned = mission.pools.assigned_air().count();
    if written != assigned {
        violations.push(format!("{written} wing entries for {assigned} assigned units"));
    }
    violations
}

fn check_pools(pools: &ResourcePools, violations: &mut Vec<String>) {
    for unit in pools.all_air() {
        let memberships = [
            pools.is_air_available(&unit.id),
            pools.is_air_assigned(&unit.id),
            pools.is_air_jammed(&unit.id),
        ]
        .into_iter()
        .filter(|&member| member)
        .count();
        if memberships != 1 {
            violations.push(format!("{} sits in {memberships} air pools", unit.id));
        }
    }

    let mut claimed = HashSet::new();
    for unit in pools.assigned_air() {
        let target = match &unit.target {
            Some(Target::Ground(id) | Target::Static(id)) => id,
            Some(Target::Area(_) | Target::Air(_)) => continue,
            None => {
                violations.push(format!("{} is assigned without a target", unit.id));
                continue;
            }
        };
        if !claimed.insert(target.clone()) {
            violations.push(format!("{target} is targeted by more than one unit"));
        }
    }
}

fn check_escorts(pools: &ResourcePools, violations: &mut Vec<String>) {
    for unit in pools.assigned_air() {
        if let Some(escort_id) = &unit.escorted_by {
            let paired = pools.air(escort_id).is_some_and(|escort| {
                pools.is_air_assigned(escort_id)
                    && escort.mission == Some(MissionType::Escort)
                    && escort.target.as_ref().and_then(Target::air_unit) == Some(unit.id.as_str())
            });
            if !paired {
                violations.push(format!("{} names {escort_id} as escort without a match", unit.id));
            }
        }
        if unit.mission != Some(MissionType::Escort) {
            continue;
        }
        let Some(escorted) = unit
            .target
            .as_ref()
            .and_then(Target::air_unit)
            .and_then(|id| pools.air(id))
        else {
            violations.push(format!("escort {} has no escorted unit", unit.id));
            continue;
        };
        if escorted.escorted_by.as_deref() != Some(unit.id.as_str()) {
            violations.push(format!("{} does not point back at escort {}", escorted.id, unit.id));
        }
        if let (Some(own), Some(theirs)) = (unit.altitude, escorted.altitude)
            && (own - theirs - ESCORT_ALTITUDE_OFFSET).abs() > 1e-6
        {
            violations.push(format!("escort {} flies at {own} over {theirs}", unit.id));
        }
        if unit.flights.count() > escorted.flights.count() {
            violations.push(format!("escort {} outnumbers {}", unit.id, escorted.id));
        }
    }
}

fn check_jamming(pools: &ResourcePools, violations: &mut Vec<String>) {
    for jammed in pools.jammed_air() {
        let blocked = pools
            .assigned_air()
            .any(|u| u.position.planar_distance(&jammed.position) <= RUNWAY_JAM_RADIUS);
        if !blocked {
            violations.push(format!("{} jammed with no assigned runway nearby", jammed.id));
        }
    }
    for assigned in pools.assigned_air() {
        for idle in pools.available_air() {
            if idle.position.planar_distance(&assigned.position) <= RUNWAY_JAM_RADIUS {
                violations.push(format!("{} left available beside {}", idle.id, assigned.id));
            }
        }
    }
}

fn check_routes(pools: &ResourcePools, violations: &mut Vec<String>) {
    for unit in pools.assigned_air() {
        let first = unit.route.first().map(|wp| wp.kind);
        let last = unit.route.last().map(|wp| wp.kind);
        let has_action = unit.route.iter().any(|wp| wp.kind == AirWaypointKind::Action);
        if first != Some(AirWaypointKind::Takeoff)
            || last != Some(AirWaypointKind::Landing)
            || !has_action
        {
            violations.push(format!("{} has an incomplete route", unit.id));
        }
        if unit.flights.is_empty() {
            violations.push(format!("{} has no flights", unit.id));
        }
    }
    for unit in pools.all_ground() {
        if unit.waypoints.len() < MIN_ROUTE_WAYPOINTS {
            violations.push(format!(
                "{} has {} waypoint(s)",
                unit.id,
                unit.waypoints.len()
            ));
        }
    }
}

fn check_player(mission: &GeneratedMission, violations: &mut Vec<String>) {
    let seated: Vec<&str> = mission
        .pools
        .all_air()
        .filter(|u| u.player_slot.is_some())
        .map(|u| u.id.as_str())
        .collect();
    if seated != [mission.player.unit.as_str()] {
        violations.push(format!("player seats: {seated:?}"));
    }
    if mission.briefing.player().is_none() {
        violations.push("briefing has no player entry".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortie_engine::{
        AirUnit, Army, DayParameters, GenerationConfig, MissionEngine, PlayerSelector, Point,
        SandboxWorld, SectionStore, sample_template,
    };

    fn mission(seed: u64) -> GeneratedMission {
        let engine = MissionEngine::new(SandboxWorld::new(), GenerationConfig::default()).unwrap();
        let template = engine
            .generate_initial_template(&[sample_template().unwrap()], seed)
            .unwrap()
            .template;
        engine
            .generate_mission(
                &SectionStore::new("env"),
                &template,
                "check",
                &PlayerSelector::Random { army: None },
                &DayParameters::new(seed),
            )
            .unwrap()
    }

    #[test]
    fn generated_missions_are_sound() {
        for seed in [1, 2, 3] {
            let violations = check_mission(&mission(seed));
            assert!(violations.is_empty(), "seed {seed}: {violations:?}");
        }
    }

    #[test]
    fn broken_escort_link_is_reported() {
        let mut mission = mission(4);
        let id = mission.player.unit.clone();
        mission.pools.air_mut(&id).unwrap().escorted_by = Some("ghost".to_string());
        let violations = check_mission(&mission);
        assert!(violations.iter().any(|v| v.contains("ghost")));
    }

    #[test]
    fn idle_unit_beside_an_assigned_runway_is_reported() {
        let mut pools = ResourcePools::new();
        pools
            .insert_air(AirUnit::new("r01", Army::Red, "yak1", Point::ground(0.0, 0.0)))
            .unwrap();
        pools
            .insert_air(AirUnit::new("r02", Army::Red, "yak1", Point::ground(600.0, 0.0)))
            .unwrap();
        pools
            .insert_air(AirUnit::new("r03", Army::Red, "yak1", Point::ground(5_000.0, 0.0)))
            .unwrap();
        pools.assign_air("r01").unwrap();

        let mut violations = Vec::new();
        check_jamming(&pools, &mut violations);
        assert_eq!(violations, vec!["r02 left available beside r01".to_string()]);
    }
}
