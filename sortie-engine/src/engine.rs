//! Per-day orchestration: templates in, mission data and briefing out.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::air::{AssignRequest, Assignment, MissionChoice, assign_mission, assign_player_seat};
use crate::aircraft::AircraftCatalog;
use crate::army::Army;
use crate::briefing::Briefing;
use crate::config::GenerationConfig;
use crate::constants::{LOG_AIR_EXPLICIT_ARMY_MISMATCH, LOG_GROUND_UNRESOLVED};
use crate::environment::{EnvironmentRequest, resolve_environment};
use crate::error::{ConfigError, GenerationError, GenerationResult, PoolError, ResolutionFailure};
use crate::ground::{GroundAssignment, assign_ground_operation, build_network, pad_ground_presence};
use crate::mission_type::MissionType;
use crate::output::{MissionHeader, write_mission};
use crate::pools::{Diagnostics, GenerationContext, ResourcePools};
use crate::rng::RngBundle;
use crate::section::{SectionRead, SectionStore};
use crate::template::{CampaignTemplate, Environment, FrontMarker, TemplateSource};
use crate::units::{AirUnit, SkillSpec, SpawnSpec, UnitId};
use crate::world::WorldQuery;

const DEFAULT_CAMPAIGN_NAME: &str = "Campaign";

/// How the player's air unit is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSelector {
    Unit(UnitId),
    /// Any available unit, optionally restricted to one army.
    Random { army: Option<Army> },
}

/// Caller-supplied parameters of one mission day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayParameters {
    pub seed: u64,
    #[serde(default)]
    pub environment: EnvironmentRequest,
    /// Force the player's mission type.
    #[serde(default)]
    pub mission: Option<MissionType>,
    /// Player rank, 0 (most junior) to 5.
    #[serde(default)]
    pub rank: u8,
    #[serde(default)]
    pub skill: Option<SkillSpec>,
    #[serde(default)]
    pub spawn: Option<SpawnSpec>,
}

impl DayParameters {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_mission(mut self, mission: MissionType) -> Self {
        self.mission = Some(mission);
        self
    }

    #[must_use]
    pub const fn with_rank(mut self, rank: u8) -> Self {
        self.rank = rank;
        self
    }

    #[must_use]
    pub const fn with_environment(mut self, environment: EnvironmentRequest) -> Self {
        self.environment = environment;
        self
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedTemplate {
    pub template: CampaignTemplate,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerAssignment {
    pub unit: UnitId,
    pub mission: MissionType,
    pub slot: u32,
}

/// Everything one mission pass produced.
#[derive(Debug, Clone)]
pub struct GeneratedMission {
    pub data: SectionStore,
    pub briefing: Briefing,
    pub player: PlayerAssignment,
    pub environment: Environment,
    /// Final pool state, kept for inspection.
    pub pools: ResourcePools,
    pub diagnostics: Diagnostics,
}

/// Template parts shared by the initial and daily builds.
struct TemplateParts {
    name: String,
    day: u32,
    environment: Environment,
    aircraft: AircraftCatalog,
    air_units: BTreeMap<UnitId, AirUnit>,
    front_markers: Vec<FrontMarker>,
}

/// Mission generation engine bound to one host.
pub struct MissionEngine<W: WorldQuery> {
    world: W,
    config: GenerationConfig,
}

impl<W: WorldQuery> MissionEngine<W> {
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(world: W, config: GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { world, config })
    }

    pub const fn world(&self) -> &W {
        &self.world
    }

    pub const fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Build the first day's template from campaign files.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Config`] for malformed files or air units
    /// naming unknown aircraft classes.
    pub fn generate_initial_template<S: SectionRead>(
        &self,
        files: &[S],
        seed: u64,
    ) -> GenerationResult<GeneratedTemplate> {
        let source = TemplateSource::from_files(files)?;
        source.check_aircraft()?;
        let parts = TemplateParts {
            name: source
                .name
                .clone()
                .unwrap_or_else(|| DEFAULT_CAMPAIGN_NAME.to_string()),
            day: source.day.unwrap_or(1),
            environment: source.environment.unwrap_or_default(),
            aircraft: source.aircraft.clone(),
            air_units: source.air_units.clone(),
            front_markers: source.front_markers.clone(),
        };
        Ok(self.assemble(parts, &source, seed))
    }

    /// Carry `previous` into the next day, re-deriving the ground network
    /// from `static_files` against today's front line.
    ///
    /// Air units and aircraft from `static_files` override carried ones;
    /// environment and front markers carry over unless the files set them.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Config`] for malformed files or unknown
    /// aircraft classes.
    pub fn generate_daily_template<S: SectionRead>(
        &self,
        static_files: &[S],
        previous: &CampaignTemplate,
        seed: u64,
    ) -> GenerationResult<GeneratedTemplate> {
        let source = TemplateSource::from_files(static_files)?;

        let mut aircraft = previous.aircraft.clone();
        for class in source.aircraft.iter() {
            aircraft.insert(class.clone());
        }
        let mut air_units = previous.air_units.clone();
        air_units.extend(source.air_units.clone());
        for unit in air_units.values() {
            if aircraft.get(&unit.aircraft).is_none() {
                return Err(ConfigError::UnknownAircraft {
                    unit: unit.id.clone(),
                    class: unit.aircraft.clone(),
                }
                .into());
            }
        }

        let front_markers = if source.front_markers.is_empty() {
            previous.front_markers.clone()
        } else {
            source.front_markers.clone()
        };
        let parts = TemplateParts {
            name: previous.name.clone(),
            day: previous.day + 1,
            environment: source.environment.unwrap_or(previous.environment),
            aircraft,
            air_units,
            front_markers,
        };
        Ok(self.assemble(parts, &source, seed))
    }

    fn assemble(
        &self,
        parts: TemplateParts,
        source: &TemplateSource,
        seed: u64,
    ) -> GeneratedTemplate {
        let rng = RngBundle::from_user_seed(seed);
        let mut diagnostics = Diagnostics::default();

        let mut network = build_network(
            &self.world,
            source.routes.values(),
            source.statics.values(),
            &mut diagnostics,
        );
        pad_ground_presence(
            &self.world,
            &mut *rng.padding(),
            &self.config.padding,
            &mut network,
            &mut diagnostics,
        );

        let mut air_units = BTreeMap::new();
        for (id, mut unit) in parts.air_units {
            let owner = self.world.owner_at(&unit.position);
            if owner != Some(unit.army) {
                let found = owner.map_or("no man's land", Army::label);
                diagnostics.record(
                    LOG_AIR_EXPLICIT_ARMY_MISMATCH,
                    format!("{id} is {} but its base lies in {found}", unit.army),
                );
                continue;
            }
            unit.reset_mission();
            air_units.insert(id, unit);
        }

        log::info!(
            "template `{}` day {}: {} air units, {} ground units, {} statics",
            parts.name,
            parts.day,
            air_units.len(),
            network.ground.len(),
            network.statics.len()
        );
        GeneratedTemplate {
            template: CampaignTemplate {
                name: parts.name,
                day: parts.day,
                environment: parts.environment,
                aircraft: parts.aircraft,
                air_units,
                ground_units: network.ground,
                statics: network.statics,
                front_markers: parts.front_markers,
            },
            diagnostics,
        }
    }

    /// Generate one mission from a daily template.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::PlayerUnit`] or
    /// [`GenerationError::PlayerMission`] when no player mission can be
    /// resolved, and pool or invariant errors from the generators.
    pub fn generate_mission(
        &self,
        environment: &SectionStore,
        daily: &CampaignTemplate,
        mission_id: &str,
        player: &PlayerSelector,
        day: &DayParameters,
    ) -> GenerationResult<GeneratedMission> {
        let pools = load_pools(daily)?;
        let rng = RngBundle::from_user_seed(day.seed);
        let mut ctx = GenerationContext::new(pools, rng, &self.config, &daily.aircraft);

        let (player_unit, player_mission) = assign_player(&mut ctx, player, day)?;
        let slot = {
            let unit = ctx
                .pools
                .air_mut(&player_unit)
                .ok_or_else(|| PoolError::UnknownUnit(player_unit.clone()))?;
            assign_player_seat(unit, day.rank).ok_or_else(|| {
                GenerationError::Invariant(format!(
                    "player unit `{player_unit}` has no flight slots"
                ))
            })?
        };

        let resolved = resolve_environment(
            &daily.environment,
            &day.environment,
            &self.config,
            &mut *ctx.rng.environment(),
        );

        let air_operations = add_air_operations(&mut ctx)?;
        let ground_operations = self.add_ground_operations(&mut ctx, &daily.front_markers)?;
        log::info!(
            "mission `{mission_id}`: player {player_unit} on {player_mission}, \
             {air_operations} extra air and {ground_operations} ground operations, \
             {} diagnostics",
            ctx.diagnostics.len()
        );

        let header = MissionHeader {
            mission_id,
            day: daily.day,
            environment: &resolved,
            player_unit: &player_unit,
            player_slot: slot,
        };
        let data = write_mission(environment, &header, &ctx.pools);
        let briefing = Briefing::build(
            &self.world,
            &daily.name,
            daily.day,
            &resolved,
            &ctx.pools,
            &player_unit,
        );

        Ok(GeneratedMission {
            data,
            briefing,
            player: PlayerAssignment {
                unit: player_unit,
                mission: player_mission,
                slot,
            },
            environment: resolved,
            pools: ctx.pools,
            diagnostics: ctx.diagnostics,
        })
    }

    fn add_ground_operations(
        &self,
        ctx: &mut GenerationContext<'_>,
        markers: &[FrontMarker],
    ) -> GenerationResult<u32> {
        let mut candidates: Vec<UnitId> =
            ctx.pools.available_ground().map(|u| u.id.clone()).collect();
        let mut added = 0;
        while added < self.config.additional_ground_operations && !candidates.is_empty() {
            let idx = ctx.rng.ground().gen_range(0..candidates.len());
            let id = candidates.remove(idx);
            match assign_ground_operation(ctx, &self.world, markers, &id)? {
                GroundAssignment::Assigned { .. } => added += 1,
                GroundAssignment::Unresolved(reason) => {
                    ctx.diagnostics
                        .record(LOG_GROUND_UNRESOLVED, format!("{id}: {reason}"));
                }
            }
        }
        Ok(added)
    }
}

fn load_pools(daily: &CampaignTemplate) -> GenerationResult<ResourcePools> {
    let mut pools = ResourcePools::new();
    for unit in daily.air_units.values() {
        let mut unit = unit.clone();
        unit.reset_mission();
        pools.insert_air(unit)?;
    }
    for unit in daily.ground_units.values() {
        let mut unit = unit.clone();
        unit.mission_assigned = false;
        pools.insert_ground(unit)?;
    }
    for object in daily.statics.values() {
        pools.insert_static(object.clone())?;
    }
    Ok(pools)
}

/// Resolve the player's unit and mission. Exhaustion is fatal.
fn assign_player(
    ctx: &mut GenerationContext<'_>,
    player: &PlayerSelector,
    day: &DayParameters,
) -> GenerationResult<(UnitId, MissionType)> {
    let choice = day
        .mission
        .map_or(MissionChoice::Random, MissionChoice::Exactly);
    let mut candidates: Vec<UnitId> = match player {
        PlayerSelector::Unit(id) => {
            if ctx.pools.air(id).is_none() {
                return Err(GenerationError::PlayerUnit(format!("unknown air unit `{id}`")));
            }
            vec![id.clone()]
        }
        PlayerSelector::Random { army } => ctx
            .pools
            .available_air()
            .filter(|u| army.is_none_or(|a| u.army == a))
            .map(|u| u.id.clone())
            .collect(),
    };
    if candidates.is_empty() {
        return Err(GenerationError::PlayerUnit(
            "no air unit available for the player".to_string(),
        ));
    }

    let mut last = (candidates[0].clone(), ResolutionFailure::NoMissionType);
    while !candidates.is_empty() {
        let idx = ctx.rng.air().gen_range(0..candidates.len());
        let unit = candidates.remove(idx);
        let mut request = AssignRequest::new(&unit).with_mission(choice);
        if let Some(skill) = &day.skill {
            request = request.with_skill(skill.clone());
        }
        if let Some(spawn) = day.spawn {
            request = request.with_spawn(spawn);
        }
        match assign_mission(ctx, &request)? {
            Assignment::Assigned { unit, mission } => return Ok((unit, mission)),
            Assignment::Unresolved(reason) => {
                log::warn!("player candidate {unit} unresolved: {reason}");
                last = (unit, reason);
            }
        }
    }
    Err(GenerationError::PlayerMission {
        unit: last.0,
        reason: last.1,
    })
}

/// Random additional air missions. Units that fail are dropped from this
/// pass's candidate list, not from the pool.
fn add_air_operations(ctx: &mut GenerationContext<'_>) -> GenerationResult<u32> {
    let mut candidates: Vec<UnitId> = ctx.pools.available_air().map(|u| u.id.clone()).collect();
    let mut added = 0;
    while added < ctx.cfg.additional_air_operations && !candidates.is_empty() {
        let idx = ctx.rng.air().gen_range(0..candidates.len());
        let unit = candidates.remove(idx);
        if !ctx.pools.is_air_available(&unit) {
            continue;
        }
        if assign_mission(ctx, &AssignRequest::new(&unit))?.is_assigned() {
            added += 1;
        }
    }
    Ok(added)
}
