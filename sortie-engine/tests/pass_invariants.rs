use std::collections::HashSet;

use sortie_engine::constants::{ESCORT_ALTITUDE_OFFSET, RUNWAY_JAM_RADIUS};
use sortie_engine::output::{SECTION_CHIEFS, SECTION_WING};
use sortie_engine::{
    AirWaypointKind, DayParameters, EnvironmentRequest, GeneratedMission, GenerationConfig,
    MissionEngine, MissionType, PaddingConfig, PlayerSelector, SandboxWorld, SectionRead,
    SectionStore, Target, sample_template,
};

const SEEDS: std::ops::RangeInclusive<u64> = 1..=12;

fn busy_config() -> GenerationConfig {
    GenerationConfig {
        additional_air_operations: 10,
        additional_ground_operations: 6,
        escort_chance: 0.8,
        defensive_response_chance: 0.8,
        padding: PaddingConfig {
            land_units_per_army: 4,
            ships_per_army: 2,
            statics_per_army: 6,
        },
        ..GenerationConfig::default()
    }
}

fn generate(seed: u64) -> GeneratedMission {
    let engine = MissionEngine::new(SandboxWorld::new(), busy_config()).unwrap();
    let template = engine
        .generate_initial_template(&[sample_template().unwrap()], seed)
        .unwrap()
        .template;
    engine
        .generate_mission(
            &SectionStore::new("env.mis"),
            &template,
            &format!("seed{seed}"),
            &PlayerSelector::Random { army: None },
            &DayParameters::new(seed).with_environment(EnvironmentRequest::random()),
        )
        .unwrap()
}

#[test]
fn pools_stay_exclusive() {
    for seed in SEEDS {
        let mission = generate(seed);
        let pools = &mission.pools;
        let assigned: Vec<&str> = pools.assigned_air().map(|u| u.id.as_str()).collect();
        let unique: HashSet<&str> = assigned.iter().copied().collect();
        assert_eq!(unique.len(), assigned.len(), "seed {seed}: duplicate assignment");

        for unit in pools.all_air() {
            let states = [
                pools.is_air_available(&unit.id),
                pools.is_air_assigned(&unit.id),
                pools.is_air_jammed(&unit.id),
            ];
            let set = states.iter().filter(|&&s| s).count();
            assert_eq!(set, 1, "seed {seed}: {} is in {set} pools", unit.id);
        }

        let mut targets = HashSet::new();
        for unit in pools.assigned_air() {
            match unit.target.as_ref() {
                Some(Target::Ground(id)) => {
                    assert!(pools.ground(id).unwrap().mission_assigned);
                    assert!(targets.insert(id.clone()), "seed {seed}: {id} targeted twice");
                }
                Some(Target::Static(id)) => {
                    assert!(!pools.is_static_available(id));
                    assert!(targets.insert(id.clone()), "seed {seed}: {id} targeted twice");
                }
                Some(Target::Area(_) | Target::Air(_)) => {}
                None => panic!("seed {seed}: {} has no target", unit.id),
            }
        }

        let wing = mission.data.entries(SECTION_WING).unwrap();
        assert_eq!(wing.len(), assigned.len());
        assert!(wing.iter().all(|(id, _)| !pools.is_air_jammed(id)));
    }
}

#[test]
fn escorts_are_paired_both_ways() {
    for seed in SEEDS {
        let pools = generate(seed).pools;
        for unit in pools.assigned_air() {
            if let Some(escort_id) = &unit.escorted_by {
                let escort = pools.air(escort_id).unwrap();
                assert!(pools.is_air_assigned(escort_id), "seed {seed}: {escort_id}");
                assert_eq!(escort.mission, Some(MissionType::Escort));
                assert_eq!(escort.target, Some(Target::Air(unit.id.clone())));
                assert_eq!(escort.army, unit.army);
            }
            if unit.mission == Some(MissionType::Escort) {
                let Some(Target::Air(escorted_id)) = &unit.target else {
                    panic!("seed {seed}: escort {} has no partner", unit.id);
                };
                let escorted = pools.air(escorted_id).unwrap();
                assert_eq!(escorted.escorted_by.as_ref(), Some(&unit.id));
                assert!(unit.flights.count() <= escorted.flights.count());
                let expected = escorted.altitude.unwrap() + ESCORT_ALTITUDE_OFFSET;
                assert!((unit.altitude.unwrap() - expected).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn jammed_units_sit_next_to_an_assigned_runway() {
    let mut jammed_total = 0;
    for seed in SEEDS {
        let pools = generate(seed).pools;
        for assigned in pools.assigned_air() {
            let idle = pools.available_air().find(|u| {
                u.position.planar_distance(&assigned.position) <= RUNWAY_JAM_RADIUS
            });
            assert!(
                idle.is_none(),
                "seed {seed}: {} left available beside {}",
                idle.map_or("", |u| u.id.as_str()),
                assigned.id
            );
        }
        for jammed in pools.jammed_air() {
            jammed_total += 1;
            let near = pools
                .assigned_air()
                .any(|u| u.position.planar_distance(&jammed.position) <= RUNWAY_JAM_RADIUS);
            assert!(near, "seed {seed}: {} jammed with no neighbour", jammed.id);
        }
    }
    assert!(jammed_total > 0, "sample airfields share runways");
}

#[test]
fn routes_are_complete() {
    for seed in SEEDS {
        let mission = generate(seed);
        for unit in mission.pools.assigned_air() {
            let kinds: Vec<AirWaypointKind> = unit.route.iter().map(|wp| wp.kind).collect();
            assert_eq!(kinds.first(), Some(&AirWaypointKind::Takeoff), "{}", unit.id);
            assert_eq!(kinds.last(), Some(&AirWaypointKind::Landing), "{}", unit.id);
            assert!(kinds.contains(&AirWaypointKind::Action), "{}", unit.id);
            assert!(!unit.flights.is_empty());
        }

        let chiefs = mission.data.entries(SECTION_CHIEFS).unwrap();
        assert_eq!(chiefs.len(), mission.pools.all_ground().count());
        for (id, _) in chiefs {
            let road = mission.data.entries(&format!("{id}_Road")).unwrap();
            let line_points = road.iter().filter(|(key, _)| key != "S").count();
            assert!(line_points >= 2, "seed {seed}: {id} has {line_points} waypoint(s)");
        }
    }
}

#[test]
fn exactly_one_player_seat() {
    for seed in SEEDS {
        let mission = generate(seed);
        let seated: Vec<&str> = mission
            .pools
            .all_air()
            .filter(|u| u.player_slot.is_some())
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(seated, vec![mission.player.unit.as_str()]);
        assert_eq!(
            mission.data.get(&mission.player.unit, "Player"),
            Some(mission.player.slot.to_string().as_str())
        );
    }
}
