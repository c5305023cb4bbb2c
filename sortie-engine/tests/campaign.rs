use sortie_engine::constants::{LOG_GROUND_COLUMN_SKIPPED, LOG_GROUND_ROUTE_ARMY_MISMATCH};
use sortie_engine::{
    Army, CampaignTemplate, DayParameters, EnvSetting, EnvironmentRequest, GenerationConfig,
    GenerationContext, GenerationError, GroundAssignment, GroundKind, MissionEngine, MissionType,
    PlayerSelector, ResolutionFailure, ResourcePools, RngBundle, SandboxWorld, SectionRead,
    SectionStore, assign_ground_operation, sample_template,
};

fn engine() -> MissionEngine<SandboxWorld> {
    MissionEngine::new(SandboxWorld::new(), GenerationConfig::default()).unwrap()
}

fn first_day(engine: &MissionEngine<SandboxWorld>, seed: u64) -> CampaignTemplate {
    engine
        .generate_initial_template(&[sample_template().unwrap()], seed)
        .unwrap()
        .template
}

fn environment_file() -> SectionStore {
    let text = "[MAIN]\n  MAP Sandbox/load.ini\n[Season]\n  Year 1943\n";
    SectionStore::parse("env.mis", text).unwrap()
}

fn pools_of(template: &CampaignTemplate) -> ResourcePools {
    let mut pools = ResourcePools::new();
    for unit in template.air_units.values() {
        pools.insert_air(unit.clone()).unwrap();
    }
    for unit in template.ground_units.values() {
        pools.insert_ground(unit.clone()).unwrap();
    }
    for object in template.statics.values() {
        pools.insert_static(object.clone()).unwrap();
    }
    pools
}

#[test]
fn recon_flight_against_the_only_target() {
    let text = "\
[Aircraft]
  pe2 recon|recon
[AirUnits]
  r05 1 pe2 10000 80000 1 2
[Statics]
  bd1 - depot Warehouse 70000 62000 0
";
    let file = SectionStore::parse("recon.txt", text).unwrap();
    let engine = engine();
    let template = engine.generate_initial_template(&[file], 1).unwrap().template;
    let mission = engine
        .generate_mission(
            &environment_file(),
            &template,
            "recon",
            &PlayerSelector::Random { army: None },
            &DayParameters::new(9),
        )
        .unwrap();

    assert_eq!(mission.player.unit, "r05");
    assert_eq!(mission.player.mission, MissionType::Recon);
    assert_eq!(mission.data.get("r05", "Mission"), Some("recon"));
    assert_eq!(mission.data.get("r05", "Target"), Some("static bd1"));
    assert_eq!(mission.data.get("MAIN", "MAP"), Some("Sandbox/load.ini"));
    assert_eq!(mission.data.get("Season", "Year"), Some("1943"));
    let briefing = mission.briefing.player().unwrap();
    assert_eq!(briefing.target.as_deref(), Some("bd1 in H7"));
}

#[test]
fn escort_with_nothing_to_escort_fails_the_player() {
    let text = "\
[Aircraft]
  yak1 fighter|escort
[AirUnits]
  r03 1 yak1 18000 40000 2 4
";
    let file = SectionStore::parse("lonely.txt", text).unwrap();
    let engine = engine();
    let template = engine.generate_initial_template(&[file], 1).unwrap().template;
    let result = engine.generate_mission(
        &environment_file(),
        &template,
        "lonely",
        &PlayerSelector::Unit("r03".into()),
        &DayParameters::new(3).with_mission(MissionType::Escort),
    );
    assert!(matches!(
        result,
        Err(GenerationError::PlayerMission {
            reason: ResolutionFailure::NoEscortCandidate,
            ..
        })
    ));
}

#[test]
fn railway_across_the_front_is_dropped() {
    let text = "\
[Routes]
  xt1 railway train G8 - 1
[xt1_Route]
  P 40000 40000 15
  P 60000 40000
";
    let file = SectionStore::parse("rail.txt", text).unwrap();
    let generated = engine().generate_initial_template(&[file], 1).unwrap();
    assert!(generated.template.ground_units.is_empty());
    assert_eq!(generated.diagnostics.count(LOG_GROUND_ROUTE_ARMY_MISMATCH), 1);
}

#[test]
fn ship_operation_forms_a_column() {
    let engine = engine();
    let template = first_day(&engine, 2);
    let cfg = GenerationConfig::default();
    let mut ctx = GenerationContext::new(
        pools_of(&template),
        RngBundle::from_user_seed(21),
        &cfg,
        &template.aircraft,
    );

    let outcome =
        assign_ground_operation(&mut ctx, engine.world(), &template.front_markers, "rs1").unwrap();
    let GroundAssignment::Assigned { unit, column } = outcome else {
        panic!("ship operation should resolve: {outcome:?}");
    };
    assert_eq!(unit, "rs1");
    assert_eq!(column, vec!["rs1.1".to_string(), "rs1.2".to_string()]);
    assert_eq!(ctx.diagnostics.count(LOG_GROUND_COLUMN_SKIPPED), 0);

    let lead = ctx.pools.ground("rs1").unwrap().clone();
    let mut expected = 0.0;
    for id in &column {
        let duplicate = ctx.pools.ground(id).unwrap();
        assert_eq!(duplicate.kind, GroundKind::Ship);
        assert_eq!(duplicate.army, Army::Red);
        assert!(duplicate.mission_assigned);
        assert_eq!(duplicate.waypoints.len(), lead.waypoints.len());
        expected += 500.0;
        let gap = duplicate.waypoints[0]
            .point
            .planar_distance(&lead.waypoints[0].point);
        assert!((gap - expected).abs() < 1e-6, "{id} sits {gap} m away");
    }
    assert!(!ctx.pools.is_ground_available("rs1"));
}

#[test]
fn same_seed_reproduces_the_mission() {
    let engine = engine();
    let day = DayParameters::new(77).with_environment(EnvironmentRequest::random());
    let run = || {
        let template = first_day(&engine, 5);
        engine
            .generate_mission(
                &environment_file(),
                &template,
                "repeat",
                &PlayerSelector::Random { army: None },
                &day,
            )
            .unwrap()
    };
    let first = run();
    let second = run();
    assert_eq!(first.data.to_text(), second.data.to_text());
    assert_eq!(first.briefing, second.briefing);
    assert_eq!(first.player, second.player);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn explicit_environment_is_written() {
    let engine = engine();
    let template = first_day(&engine, 1);
    let request = EnvironmentRequest {
        time: EnvSetting::Explicit(14.5),
        weather: EnvSetting::Explicit(2),
        cloud_height: EnvSetting::Template,
    };
    let mission = engine
        .generate_mission(
            &environment_file(),
            &template,
            "weather",
            &PlayerSelector::Random { army: Some(Army::Blue) },
            &DayParameters::new(4).with_environment(request),
        )
        .unwrap();
    assert_eq!(mission.data.get("MAIN", "Time"), Some("14.5"));
    assert_eq!(mission.data.get("MAIN", "Weather"), Some("2"));
    assert_eq!(mission.data.get("MAIN", "CloudHeight"), Some("1500"));
    assert_eq!(mission.briefing.time, "14:30");
    assert_eq!(mission.briefing.weather, "Hazy");
    assert_eq!(template.air_units[&mission.player.unit].army, Army::Blue);
}

#[test]
fn multi_day_campaign_carries_forward() {
    let engine = engine();
    let mut template = first_day(&engine, 100);
    for day in 1..=4u64 {
        assert_eq!(u64::from(template.day), day);
        let mission = engine
            .generate_mission(
                &environment_file(),
                &template,
                &format!("day{day}"),
                &PlayerSelector::Random { army: Some(Army::Red) },
                &DayParameters::new(day * 31).with_rank(u8::try_from(day).unwrap()),
            )
            .unwrap();
        assert_eq!(mission.data.get("MAIN", "Day"), Some(day.to_string().as_str()));
        assert!(mission.pools.is_air_assigned(&mission.player.unit));

        template = engine
            .generate_daily_template(&[sample_template().unwrap()], &template, day)
            .unwrap()
            .template;
        assert!(template.air_units.values().all(|u| u.mission.is_none()));
        assert!(template.ground_units.values().all(|u| !u.mission_assigned));
    }
    assert_eq!(template.day, 5);
}

#[test]
fn saved_template_reloads_with_the_same_units() {
    let engine = engine();
    let template = first_day(&engine, 8);
    let text = template.to_store("day1.txt").to_text();
    let reloaded = engine
        .generate_initial_template(&[SectionStore::parse("day1.txt", &text).unwrap()], 8)
        .unwrap()
        .template;
    assert_eq!(reloaded.name, template.name);
    assert_eq!(reloaded.day, template.day);
    assert!(reloaded.air_units.keys().eq(template.air_units.keys()));
    assert!(reloaded.ground_units.keys().eq(template.ground_units.keys()));
    assert!(reloaded.statics.keys().eq(template.statics.keys()));
    assert_eq!(reloaded.front_markers, template.front_markers);
}
