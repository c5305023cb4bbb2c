//! Scenario catalog run by the harness against the sandbox host.
use anyhow::{Context, Result, bail, ensure};
use sortie_engine::output::SECTION_WING;
use sortie_engine::{
    Army, CampaignTemplate, DayParameters, EnvironmentRequest, GeneratedMission,
    GenerationConfig, MissionEngine, PlayerSelector, SandboxWorld, SectionRead, SectionStore,
    sample_template,
};

use crate::checks::check_mission;

const ENVIRONMENT_FILE: &str = "[MAIN]\n  MAP Sandbox/load.ini\n";

pub type ScenarioFn = fn(&Harness, u64) -> Result<()>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        key: "smoke",
        description: "Build the sample template and generate one mission",
        run: smoke,
    },
    Scenario {
        key: "campaign",
        description: "Carry the campaign across --days consecutive days",
        run: campaign,
    },
    Scenario {
        key: "determinism",
        description: "Same seed twice must give byte-identical mission data",
        run: determinism,
    },
    Scenario {
        key: "invariants",
        description: "Pool, escort, jamming and route invariants on one mission",
        run: invariants,
    },
];

pub fn get_scenario(key: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key.eq_ignore_ascii_case(key))
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.description))
}

/// Expand `all` into every catalog key, keeping explicit keys in order.
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = requested
        .iter()
        .filter(|s| !s.eq_ignore_ascii_case("all"))
        .cloned()
        .collect();
    if requested.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        for (key, _) in list_scenarios() {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push(key.to_string());
            }
        }
    }
    scenarios
}

/// Engine plus the knobs shared by every scenario.
pub struct Harness {
    engine: MissionEngine<SandboxWorld>,
    environment: SectionStore,
    days: u32,
}

impl Harness {
    pub fn new(config: GenerationConfig, days: u32) -> Result<Self> {
        let engine = MissionEngine::new(SandboxWorld::new(), config)
            .context("generation config rejected")?;
        let environment = SectionStore::parse("environment.mis", ENVIRONMENT_FILE)
            .context("embedded environment file")?;
        Ok(Self {
            engine,
            environment,
            days: days.max(1),
        })
    }

    fn first_template(&self, seed: u64) -> Result<CampaignTemplate> {
        let file = sample_template().context("embedded sample template")?;
        let generated = self
            .engine
            .generate_initial_template(&[file], seed)
            .with_context(|| format!("initial template for seed {seed}"))?;
        for diagnostic in generated.diagnostics.iter() {
            log::debug!("template seed {seed}: {} {}", diagnostic.key, diagnostic.detail);
        }
        Ok(generated.template)
    }

    fn mission(
        &self,
        template: &CampaignTemplate,
        seed: u64,
        player: &PlayerSelector,
    ) -> Result<GeneratedMission> {
        let day = DayParameters::new(seed).with_environment(EnvironmentRequest::random());
        self.engine
            .generate_mission(
                &self.environment,
                template,
                &format!("day{}", template.day),
                player,
                &day,
            )
            .with_context(|| format!("mission for day {} seed {seed}", template.day))
    }
}

fn ensure_sound(mission: &GeneratedMission) -> Result<()> {
    let violations = check_mission(mission);
    if !violations.is_empty() {
        bail!("{}", violations.join("; "));
    }
    Ok(())
}

fn smoke(harness: &Harness, seed: u64) -> Result<()> {
    let template = harness.first_template(seed)?;
    ensure!(!template.air_units.is_empty(), "template has no air units");
    ensure!(!template.ground_units.is_empty(), "template has no ground units");
    let mission = harness.mission(&template, seed, &PlayerSelector::Random { army: None })?;
    let wing = mission.data.entries(SECTION_WING).map_or(0, <[_]>::len);
    ensure!(wing > 0, "mission wrote no air units");
    ensure!(
        mission.data.get("MAIN", "PlayerUnit") == Some(mission.player.unit.as_str()),
        "player unit missing from mission data"
    );
    Ok(())
}

fn campaign(harness: &Harness, seed: u64) -> Result<()> {
    let mut template = harness.first_template(seed)?;
    for offset in 0..harness.days {
        let day_seed = seed.wrapping_add(u64::from(offset));
        let army = if offset % 2 == 0 { Army::Red } else { Army::Blue };
        let selector = PlayerSelector::Random { army: Some(army) };
        let mission = harness.mission(&template, day_seed, &selector)?;
        ensure_sound(&mission).with_context(|| format!("day {}", template.day))?;

        let previous_day = template.day;
        let statics = sample_template().context("embedded sample template")?;
        template = harness
            .engine
            .generate_daily_template(&[statics], &template, day_seed)
            .with_context(|| format!("daily template after day {previous_day}"))?
            .template;
        ensure!(
            template.day == previous_day + 1,
            "day went from {previous_day} to {}",
            template.day
        );
    }
    Ok(())
}

fn determinism(harness: &Harness, seed: u64) -> Result<()> {
    let run = || -> Result<String> {
        let template = harness.first_template(seed)?;
        let mission = harness.mission(&template, seed, &PlayerSelector::Random { army: None })?;
        Ok(mission.data.to_text())
    };
    let first = run()?;
    let second = run()?;
    if first != second {
        let line = first
            .lines()
            .zip(second.lines())
            .position(|(a, b)| a != b)
            .map_or(0, |idx| idx + 1);
        bail!("mission data diverged at line {line}");
    }
    Ok(())
}

fn invariants(harness: &Harness, seed: u64) -> Result<()> {
    let template = harness.first_template(seed)?;
    let mission = harness.mission(&template, seed, &PlayerSelector::Random { army: None })?;
    ensure_sound(&mission)
}
