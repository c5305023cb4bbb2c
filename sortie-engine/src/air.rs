//! Air operation generation.
//!
//! One call to [`assign_mission`] gives one air unit a mission, and may pull
//! in linked units on the way: an escort and the unit it escorts, an
//! offensive unit and the defender reacting to it. Linked generation recurses
//! through [`assign_mission`] with an explicit [`Forcing`] and a bounded
//! depth. Expected dead ends come back as [`Assignment::Unresolved`]; only
//! bookkeeping violations are errors.
use rand::Rng;

use crate::aircraft::{AircraftClass, AircraftRole};
use crate::army::Army;
use crate::config::GenerationConfig;
use crate::constants::{
    ESCORT_ALTITUDE_OFFSET, INGRESS_FRACTION, LOG_AIR_DEFENSE_SKIPPED, LOG_AIR_ESCORT_SKIPPED,
    LOG_AIR_JAMMED, LOG_AIR_UNRESOLVED, MAX_FLIGHT_SIZE, MAX_FLIGHTS, MAX_LINK_DEPTH,
    PLAYER_RANK_DIVISOR, PLAYER_RANK_MAX, RUNWAY_JAM_RADIUS,
};
use crate::error::{ConfigError, GenerationError, GenerationResult, PoolError, ResolutionFailure};
use crate::geometry::Point;
use crate::mission_type::MissionType;
use crate::numbers::round_count;
use crate::pools::GenerationContext;
use crate::selector::select_index_by_distance;
use crate::units::{
    AirUnit, AirWaypoint, AirWaypointKind, Flights, SkillSetting, SkillSpec, SpawnSpec, Target,
    UnitId,
};

/// Which mission types a request may end up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionChoice {
    /// Any type the aircraft class supports and the pools can satisfy.
    Random,
    /// Only escorted types; used when an escort looks for a partner.
    Escorted,
    Exactly(MissionType),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForcedTarget {
    Ground(UnitId),
    Static(UnitId),
}

/// Constraint placed on a linked request by the unit that started it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Forcing {
    #[default]
    Unforced,
    /// Attack exactly this target; set by a defender looking for an offender.
    Target(ForcedTarget),
    /// The given unit escorts whatever this request resolves to.
    Escort(UnitId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignRequest {
    pub unit: UnitId,
    pub mission: MissionChoice,
    pub allow_defensive_response: bool,
    pub forcing: Forcing,
    pub skill: Option<SkillSpec>,
    pub spawn: Option<SpawnSpec>,
    pub depth: u8,
}

impl AssignRequest {
    /// Unforced random request with defensive responses enabled.
    #[must_use]
    pub fn new(unit: &str) -> Self {
        Self {
            unit: unit.to_string(),
            mission: MissionChoice::Random,
            allow_defensive_response: true,
            forcing: Forcing::Unforced,
            skill: None,
            spawn: None,
            depth: 0,
        }
    }

    #[must_use]
    pub const fn with_mission(mut self, mission: MissionChoice) -> Self {
        self.mission = mission;
        self
    }

    #[must_use]
    pub fn with_skill(mut self, skill: SkillSpec) -> Self {
        self.skill = Some(skill);
        self
    }

    #[must_use]
    pub const fn with_spawn(mut self, spawn: SpawnSpec) -> Self {
        self.spawn = Some(spawn);
        self
    }

    fn linked(
        unit: &str,
        mission: MissionChoice,
        forcing: Forcing,
        allow: bool,
        depth: u8,
    ) -> Self {
        Self {
            unit: unit.to_string(),
            mission,
            allow_defensive_response: allow,
            forcing,
            skill: None,
            spawn: None,
            depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Assigned { unit: UnitId, mission: MissionType },
    Unresolved(ResolutionFailure),
}

impl Assignment {
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned { .. })
    }
}

/// Outcome of one mission type attempt. The outer error is fatal.
type Attempt = GenerationResult<Result<(), ResolutionFailure>>;

enum RouteShape {
    /// Base, ingress, aim point, base.
    Direct,
    /// Partner's ingress and action legs, offset upwards.
    Shadow(UnitId),
}

struct Plan {
    mission: MissionType,
    target: Target,
    aim: Point,
    altitude: f64,
    flight_cap: Option<usize>,
    route: RouteShape,
}

/// Give `request.unit` a mission.
///
/// # Errors
///
/// Returns [`GenerationError`] on pool bookkeeping violations, broken
/// escort pairings or an air unit whose aircraft class is unknown.
pub fn assign_mission(
    ctx: &mut GenerationContext<'_>,
    request: &AssignRequest,
) -> GenerationResult<Assignment> {
    let id = request.unit.as_str();
    if request.depth > MAX_LINK_DEPTH {
        return Ok(unresolved(ctx, id, ResolutionFailure::DepthExceeded(MAX_LINK_DEPTH)));
    }
    if !ctx.pools.is_air_available(id) || ctx.is_in_flight(id) {
        return Ok(unresolved(ctx, id, ResolutionFailure::UnitUnavailable(id.to_string())));
    }
    let class = aircraft_class(ctx, id)?;

    let mut candidates: Vec<MissionType> = match request.mission {
        MissionChoice::Exactly(mission) => {
            if !class.supports(mission) {
                return Ok(unresolved(ctx, id, ResolutionFailure::UnsupportedMission(mission)));
            }
            vec![mission]
        }
        MissionChoice::Random => class
            .missions
            .iter()
            .copied()
            .filter(|&m| is_type_available(ctx, id, m))
            .collect(),
        MissionChoice::Escorted => class
            .missions
            .iter()
            .copied()
            .filter(|&m| m.is_escorted() && is_type_available(ctx, id, m))
            .collect(),
    };

    ctx.push_in_flight(id);
    let mut last_failure = ResolutionFailure::NoMissionType;
    while !candidates.is_empty() {
        let idx = ctx.rng.air().gen_range(0..candidates.len());
        let mission = candidates.remove(idx);
        let attempt = match mission {
            MissionType::Recon
            | MissionType::ArmedRecon
            | MissionType::AttackArmor
            | MissionType::AttackVehicle
            | MissionType::AttackTrain
            | MissionType::AttackShip
            | MissionType::AttackArtillery
            | MissionType::AttackRadar
            | MissionType::AttackAircraft
            | MissionType::AttackDepot => fly_offensive(ctx, request, &class, mission),
            MissionType::Escort => fly_escort(ctx, request),
            MissionType::Intercept | MissionType::Cover => fly_defensive(ctx, request, mission),
            MissionType::Follow => fly_follow(ctx, request, &class),
            MissionType::Hunting => fly_hunting(ctx, request, &class),
        };
        match attempt {
            Ok(Ok(())) => {
                ctx.pop_in_flight(id);
                log::debug!("{id} assigned {mission} at depth {}", request.depth);
                return Ok(Assignment::Assigned {
                    unit: id.to_string(),
                    mission,
                });
            }
            Ok(Err(failure)) => {
                ctx.diagnostics
                    .record(LOG_AIR_UNRESOLVED, format!("{id} {mission}: {failure}"));
                last_failure = failure;
            }
            Err(err) => {
                ctx.pop_in_flight(id);
                return Err(err);
            }
        }
    }
    ctx.pop_in_flight(id);

    let failure = match request.mission {
        MissionChoice::Exactly(_) => last_failure,
        _ => ResolutionFailure::NoMissionType,
    };
    Ok(Assignment::Unresolved(failure))
}

fn unresolved(ctx: &mut GenerationContext<'_>, id: &str, failure: ResolutionFailure) -> Assignment {
    ctx.diagnostics
        .record(LOG_AIR_UNRESOLVED, format!("{id}: {failure}"));
    Assignment::Unresolved(failure)
}

fn aircraft_class(ctx: &GenerationContext<'_>, id: &str) -> GenerationResult<AircraftClass> {
    let unit = ctx
        .pools
        .air(id)
        .ok_or_else(|| PoolError::UnknownUnit(id.to_string()))?;
    ctx.catalog
        .get(&unit.aircraft)
        .cloned()
        .ok_or_else(|| {
            GenerationError::Config(ConfigError::UnknownAircraft {
                unit: unit.id.clone(),
                class: unit.aircraft.clone(),
            })
        })
}

fn unit_position(ctx: &GenerationContext<'_>, id: &str) -> GenerationResult<(Army, Point)> {
    ctx.pools
        .air(id)
        .map(|u| (u.army, u.position))
        .ok_or_else(|| PoolError::UnknownUnit(id.to_string()).into())
}

/// Whether the pools can currently satisfy `mission` for unit `id`.
fn is_type_available(ctx: &GenerationContext<'_>, id: &str, mission: MissionType) -> bool {
    let Some(unit) = ctx.pools.air(id) else {
        return false;
    };
    match mission {
        MissionType::Escort => !escort_candidates(ctx, unit).is_empty(),
        MissionType::Intercept | MissionType::Cover => has_threat(ctx, unit.army.opposing()),
        MissionType::Follow => !follow_candidates(ctx, unit).is_empty(),
        MissionType::Hunting => !hunting_areas(ctx, unit).is_empty(),
        offensive => has_offensive_target(ctx, unit.army, offensive),
    }
}

fn has_offensive_target(ctx: &GenerationContext<'_>, army: Army, mission: MissionType) -> bool {
    let enemy = army.opposing();
    let multi = ctx.cfg.multi_assignment;
    ctx.pools.ground_targets(multi).any(|g| {
        g.army == enemy && mission.ground_kinds().contains(&g.kind) && g.position().is_some()
    }) || ctx
        .pools
        .static_targets(multi)
        .any(|s| s.army == enemy && mission.static_kinds().contains(&s.kind))
}

/// Escorted mission types `unit` could fly right now.
fn escorted_missions(ctx: &GenerationContext<'_>, unit: &AirUnit) -> Vec<MissionType> {
    ctx.catalog.get(&unit.aircraft).map_or_else(Vec::new, |class| {
        class
            .missions
            .iter()
            .copied()
            .filter(|&m| m.is_escorted() && has_offensive_target(ctx, unit.army, m))
            .collect()
    })
}

fn escort_candidates(ctx: &GenerationContext<'_>, escort: &AirUnit) -> Vec<(UnitId, Point)> {
    ctx.pools
        .available_air()
        .filter(|u| u.army == escort.army && u.id != escort.id && !ctx.is_in_flight(&u.id))
        .filter(|u| !escorted_missions(ctx, u).is_empty())
        .map(|u| (u.id.clone(), u.position))
        .collect()
}

/// Any opposing unit that could start an offensive mission.
fn has_threat(ctx: &GenerationContext<'_>, enemy: Army) -> bool {
    ctx.pools
        .available_air()
        .filter(|u| u.army == enemy && !ctx.is_in_flight(&u.id))
        .any(|u| {
            ctx.catalog.get(&u.aircraft).is_some_and(|class| {
                class
                    .missions
                    .iter()
                    .any(|&m| m.is_offensive() && has_offensive_target(ctx, u.army, m))
            })
        })
}

fn follow_candidates(ctx: &GenerationContext<'_>, unit: &AirUnit) -> Vec<(UnitId, Point)> {
    ctx.pools
        .assigned_air()
        .filter(|u| u.army == unit.army && u.id != unit.id && !u.route.is_empty())
        .map(|u| (u.id.clone(), u.position))
        .collect()
}

/// Action points and altitudes of assigned enemy units.
fn hunting_areas(ctx: &GenerationContext<'_>, unit: &AirUnit) -> Vec<(Point, f64)> {
    let enemy = unit.army.opposing();
    ctx.pools
        .assigned_air()
        .filter(|u| u.army == enemy)
        .filter_map(|u| Some((u.action_point()?, u.altitude?)))
        .collect()
}

/// Pick an enemy ground or static target for `mission`, biased towards `from`.
fn resolve_target(
    ctx: &GenerationContext<'_>,
    army: Army,
    from: &Point,
    mission: MissionType,
) -> Option<(Target, Point)> {
    let enemy = army.opposing();
    let multi = ctx.cfg.multi_assignment;
    let ground: Vec<(UnitId, Point)> = ctx
        .pools
        .ground_targets(multi)
        .filter(|g| g.army == enemy && mission.ground_kinds().contains(&g.kind))
        .filter_map(|g| Some((g.id.clone(), g.position()?)))
        .collect();
    let statics: Vec<(UnitId, Point)> = ctx
        .pools
        .static_targets(multi)
        .filter(|s| s.army == enemy && mission.static_kinds().contains(&s.kind))
        .map(|s| (s.id.clone(), s.position))
        .collect();

    let mut rng = ctx.rng.air();
    let ground_pick = select_index_by_distance(from, &ground, |c| c.1, &mut *rng)
        .map(|idx| (Target::Ground(ground[idx].0.clone()), ground[idx].1));
    let static_pick = select_index_by_distance(from, &statics, |c| c.1, &mut *rng)
        .map(|idx| (Target::Static(statics[idx].0.clone()), statics[idx].1));
    match (ground_pick, static_pick) {
        (Some(g), Some(s)) => Some(if rng.gen_bool(0.5) { g } else { s }),
        (g, s) => g.or(s),
    }
}

fn forced_target(ctx: &GenerationContext<'_>, forced: &ForcedTarget) -> Option<(Target, Point)> {
    let multi = ctx.cfg.multi_assignment;
    match forced {
        ForcedTarget::Ground(id) => {
            let usable = multi || ctx.pools.is_ground_available(id);
            let point = ctx.pools.ground(id)?.position()?;
            usable.then(|| (Target::Ground(id.clone()), point))
        }
        ForcedTarget::Static(id) => {
            let usable = multi || ctx.pools.is_static_available(id);
            let point = ctx.pools.static_object(id)?.position;
            usable.then(|| (Target::Static(id.clone()), point))
        }
    }
}

fn fly_offensive(
    ctx: &mut GenerationContext<'_>,
    request: &AssignRequest,
    class: &AircraftClass,
    mission: MissionType,
) -> Attempt {
    let id = request.unit.as_str();
    let (army, position) = unit_position(ctx, id)?;
    let resolved = match &request.forcing {
        Forcing::Target(forced) => forced_target(ctx, forced),
        _ => resolve_target(ctx, army, &position, mission),
    };
    let Some((target, aim)) = resolved else {
        return Ok(Err(ResolutionFailure::NoTarget(mission)));
    };

    // The escort of an Escort-forced request finalizes itself once we return.
    let partner = if request.forcing == Forcing::Unforced
        && mission.is_escorted()
        && request.allow_defensive_response
    {
        reserve_optional_escort(ctx, id, army, &position)
    } else {
        None
    };

    let altitude = draw_altitude(ctx, mission);
    let plan = Plan {
        mission,
        target,
        aim,
        altitude,
        flight_cap: None,
        route: RouteShape::Direct,
    };
    let committed = commit(ctx, id, class, plan, request.skill.as_ref(), request.spawn.as_ref());
    if let Some(escort) = &partner {
        ctx.pop_in_flight(escort);
    }
    committed?;

    if let Some(escort) = partner {
        finalize_escort(ctx, &escort, id, None, None)?;
    }
    if request.allow_defensive_response {
        defensive_response(ctx, id, &aim, request.depth)?;
    }
    Ok(Ok(()))
}

/// Roll for an optional escort and reserve the partner before commit.
fn reserve_optional_escort(
    ctx: &mut GenerationContext<'_>,
    escorted: &str,
    army: Army,
    position: &Point,
) -> Option<UnitId> {
    let wanted = ctx.rng.air().gen_bool(ctx.cfg.escort_chance);
    if !wanted {
        return None;
    }
    let candidates: Vec<(UnitId, Point)> = ctx
        .pools
        .available_air()
        .filter(|u| u.army == army && u.id != escorted && !ctx.is_in_flight(&u.id))
        .filter(|u| ctx.catalog.supports(&u.aircraft, MissionType::Escort))
        .map(|u| (u.id.clone(), u.position))
        .collect();
    let picked = {
        let mut rng = ctx.rng.air();
        select_index_by_distance(position, &candidates, |c| c.1, &mut *rng)
    };
    let Some(idx) = picked else {
        ctx.diagnostics
            .record(LOG_AIR_ESCORT_SKIPPED, format!("{escorted}: no escort available"));
        return None;
    };
    let escort = candidates[idx].0.clone();
    ctx.push_in_flight(&escort);
    Some(escort)
}

fn fly_escort(ctx: &mut GenerationContext<'_>, request: &AssignRequest) -> Attempt {
    let id = request.unit.as_str();
    let (_, position) = unit_position(ctx, id)?;
    let mut candidates = match ctx.pools.air(id) {
        Some(unit) => escort_candidates(ctx, unit),
        None => Vec::new(),
    };
    loop {
        let picked = {
            let mut rng = ctx.rng.air();
            select_index_by_distance(&position, &candidates, |c| c.1, &mut *rng)
        };
        let Some(idx) = picked else {
            return Ok(Err(ResolutionFailure::NoEscortCandidate));
        };
        let (partner, _) = candidates.remove(idx);
        let linked = AssignRequest::linked(
            &partner,
            MissionChoice::Escorted,
            Forcing::Escort(id.to_string()),
            request.allow_defensive_response,
            request.depth + 1,
        );
        if assign_mission(ctx, &linked)?.is_assigned() {
            finalize_escort(ctx, id, &partner, request.skill.as_ref(), request.spawn.as_ref())?;
            return Ok(Ok(()));
        }
    }
}

/// Commit `escort` as the escort of the already committed `escorted` unit.
fn finalize_escort(
    ctx: &mut GenerationContext<'_>,
    escort: &str,
    escorted: &str,
    skill: Option<&SkillSpec>,
    spawn: Option<&SpawnSpec>,
) -> GenerationResult<()> {
    let partner = ctx
        .pools
        .air(escorted)
        .ok_or_else(|| PoolError::UnknownUnit(escorted.to_string()))?;
    let aim = partner.action_point().unwrap_or(partner.position);
    let altitude = partner.altitude.unwrap_or_default() + ESCORT_ALTITUDE_OFFSET;
    let cap = partner.flights.count();
    let class = aircraft_class(ctx, escort)?;
    let plan = Plan {
        mission: MissionType::Escort,
        target: Target::Air(escorted.to_string()),
        aim,
        altitude,
        flight_cap: Some(cap),
        route: RouteShape::Shadow(escorted.to_string()),
    };
    commit(ctx, escort, &class, plan, skill, spawn)?;
    if let Some(unit) = ctx.pools.air_mut(escorted) {
        unit.escorted_by = Some(escort.to_string());
    }

    let paired = ctx.pools.is_air_assigned(escort) && ctx.pools.is_air_assigned(escorted);
    debug_assert!(paired, "escort pairing {escort}/{escorted} not fully assigned");
    if !paired {
        return Err(GenerationError::Invariant(format!(
            "escort pairing {escort}/{escorted} not fully assigned"
        )));
    }
    Ok(())
}

type ThreatGroup = (Target, Point, Vec<(UnitId, MissionType, Point)>);

fn fly_defensive(
    ctx: &mut GenerationContext<'_>,
    request: &AssignRequest,
    mission: MissionType,
) -> Attempt {
    let id = request.unit.as_str();
    let (army, position) = unit_position(ctx, id)?;
    let enemy = army.opposing();

    let threats: Vec<(UnitId, Point, Vec<MissionType>)> = ctx
        .pools
        .available_air()
        .filter(|u| u.army == enemy && !ctx.is_in_flight(&u.id))
        .filter_map(|u| {
            let class = ctx.catalog.get(&u.aircraft)?;
            let offensive: Vec<MissionType> =
                class.missions.iter().copied().filter(|m| m.is_offensive()).collect();
            Some((u.id.clone(), u.position, offensive))
        })
        .collect();

    let mut groups: Vec<ThreatGroup> = Vec::new();
    for (unit, unit_pos, missions) in threats {
        for threat in missions {
            let Some((target, point)) = resolve_target(ctx, enemy, &unit_pos, threat) else {
                continue;
            };
            match groups.iter_mut().find(|g| g.0 == target) {
                Some(group) => group.2.push((unit.clone(), threat, unit_pos)),
                None => groups.push((target, point, vec![(unit.clone(), threat, unit_pos)])),
            }
        }
    }

    loop {
        let picked_group = {
            let mut rng = ctx.rng.air();
            select_index_by_distance(&position, &groups, |g| g.1, &mut *rng)
        };
        let Some(group_idx) = picked_group else {
            return Ok(Err(ResolutionFailure::NoOffensiveUnit));
        };
        let picked_member = {
            let (_, target_point, members) = &groups[group_idx];
            let mut rng = ctx.rng.air();
            select_index_by_distance(target_point, members, |m| m.2, &mut *rng)
        };
        let Some(member_idx) = picked_member else {
            groups.remove(group_idx);
            continue;
        };
        let (offender, threat, _) = groups[group_idx].2.remove(member_idx);
        let forced = match &groups[group_idx].0 {
            Target::Ground(g) => ForcedTarget::Ground(g.clone()),
            Target::Static(s) => ForcedTarget::Static(s.clone()),
            Target::Area(_) | Target::Air(_) => {
                groups.remove(group_idx);
                continue;
            }
        };
        if groups[group_idx].2.is_empty() {
            groups.remove(group_idx);
        }

        let linked = AssignRequest::linked(
            &offender,
            MissionChoice::Exactly(threat),
            Forcing::Target(forced),
            false,
            request.depth + 1,
        );
        if assign_mission(ctx, &linked)?.is_assigned() {
            finalize_defender(
                ctx,
                id,
                &offender,
                mission,
                request.skill.as_ref(),
                request.spawn.as_ref(),
            )?;
            return Ok(Ok(()));
        }
    }
}

/// Commit `defender` against the already committed `offender`.
fn finalize_defender(
    ctx: &mut GenerationContext<'_>,
    defender: &str,
    offender: &str,
    mission: MissionType,
    skill: Option<&SkillSpec>,
    spawn: Option<&SpawnSpec>,
) -> GenerationResult<()> {
    let target = ctx
        .pools
        .air(offender)
        .ok_or_else(|| PoolError::UnknownUnit(offender.to_string()))?;
    let aim = target.action_point().unwrap_or(target.position);
    let cap = target.flights.count();
    let class = aircraft_class(ctx, defender)?;
    let altitude = draw_altitude(ctx, mission);
    let plan = Plan {
        mission,
        target: Target::Air(offender.to_string()),
        aim,
        altitude,
        flight_cap: Some(cap),
        route: RouteShape::Direct,
    };
    commit(ctx, defender, &class, plan, skill, spawn)
}

/// Maybe send an enemy fighter after a freshly committed offensive unit.
fn defensive_response(
    ctx: &mut GenerationContext<'_>,
    offender: &str,
    aim: &Point,
    depth: u8,
) -> GenerationResult<()> {
    let triggered = ctx.rng.air().gen_bool(ctx.cfg.defensive_response_chance);
    if !triggered {
        return Ok(());
    }
    if depth + 1 > MAX_LINK_DEPTH {
        ctx.diagnostics
            .record(LOG_AIR_DEFENSE_SKIPPED, format!("{offender}: link depth"));
        return Ok(());
    }
    let (army, _) = unit_position(ctx, offender)?;
    let candidates: Vec<(UnitId, Point, Vec<MissionType>)> = ctx
        .pools
        .available_air()
        .filter(|u| u.army == army.opposing() && !ctx.is_in_flight(&u.id))
        .filter_map(|u| {
            let class = ctx.catalog.get(&u.aircraft)?;
            let missions: Vec<MissionType> = [MissionType::Intercept, MissionType::Cover]
                .into_iter()
                .filter(|&m| class.supports(m))
                .collect();
            (!missions.is_empty()).then(|| (u.id.clone(), u.position, missions))
        })
        .collect();
    let picked = {
        let mut rng = ctx.rng.air();
        select_index_by_distance(aim, &candidates, |c| c.1, &mut *rng).map(|idx| {
            let missions = &candidates[idx].2;
            (idx, missions[rng.gen_range(0..missions.len())])
        })
    };
    let Some((idx, mission)) = picked else {
        ctx.diagnostics
            .record(LOG_AIR_DEFENSE_SKIPPED, format!("{offender}: no defender available"));
        return Ok(());
    };
    let defender = candidates[idx].0.clone();
    finalize_defender(ctx, &defender, offender, mission, None, None)
}

fn fly_follow(
    ctx: &mut GenerationContext<'_>,
    request: &AssignRequest,
    class: &AircraftClass,
) -> Attempt {
    let id = request.unit.as_str();
    let (_, position) = unit_position(ctx, id)?;
    let candidates = match ctx.pools.air(id) {
        Some(unit) => follow_candidates(ctx, unit),
        None => Vec::new(),
    };
    let picked = {
        let mut rng = ctx.rng.air();
        select_index_by_distance(&position, &candidates, |c| c.1, &mut *rng)
    };
    let Some(idx) = picked else {
        return Ok(Err(ResolutionFailure::NoFollowCandidate));
    };
    let leader = candidates[idx].0.clone();
    let Some(lead) = ctx.pools.air(&leader) else {
        return Ok(Err(ResolutionFailure::NoFollowCandidate));
    };
    let plan = Plan {
        mission: MissionType::Follow,
        target: Target::Air(leader.clone()),
        aim: lead.action_point().unwrap_or(lead.position),
        altitude: lead.altitude.unwrap_or_default() + ESCORT_ALTITUDE_OFFSET,
        flight_cap: None,
        route: RouteShape::Shadow(leader.clone()),
    };
    commit(ctx, id, class, plan, request.skill.as_ref(), request.spawn.as_ref())?;
    Ok(Ok(()))
}

fn fly_hunting(
    ctx: &mut GenerationContext<'_>,
    request: &AssignRequest,
    class: &AircraftClass,
) -> Attempt {
    let id = request.unit.as_str();
    let (_, position) = unit_position(ctx, id)?;
    let areas = match ctx.pools.air(id) {
        Some(unit) => hunting_areas(ctx, unit),
        None => Vec::new(),
    };
    let picked = {
        let mut rng = ctx.rng.air();
        select_index_by_distance(&position, &areas, |a| a.0, &mut *rng)
    };
    let Some(idx) = picked else {
        return Ok(Err(ResolutionFailure::NoHuntingArea));
    };
    let (aim, altitude) = areas[idx];
    let plan = Plan {
        mission: MissionType::Hunting,
        target: Target::Area(aim),
        aim,
        altitude,
        flight_cap: None,
        route: RouteShape::Direct,
    };
    commit(ctx, id, class, plan, request.skill.as_ref(), request.spawn.as_ref())?;
    Ok(Ok(()))
}

/// Assign the unit, claim its target, fill in everything the mission file
/// needs, then jam its runway.
fn commit(
    ctx: &mut GenerationContext<'_>,
    id: &str,
    class: &AircraftClass,
    plan: Plan,
    skill: Option<&SkillSpec>,
    spawn: Option<&SpawnSpec>,
) -> GenerationResult<()> {
    let multi = ctx.cfg.multi_assignment;
    ctx.pools.assign_air(id)?;
    match &plan.target {
        Target::Ground(ground) => ctx.pools.assign_ground(ground, multi)?,
        Target::Static(object) => ctx.pools.assign_static(object, multi)?,
        Target::Area(_) | Target::Air(_) => {}
    }

    let unit = ctx
        .pools
        .air(id)
        .ok_or_else(|| PoolError::UnknownUnit(id.to_string()))?;
    let flights = compose_flights(
        ctx.cfg,
        unit.nominal_flights,
        unit.nominal_flight_size,
        plan.mission,
        plan.flight_cap,
    );
    let route = match &plan.route {
        RouteShape::Direct => direct_route(&unit.position, &plan.aim, plan.altitude),
        RouteShape::Shadow(partner) => match ctx.pools.air(partner) {
            Some(lead) if !lead.route.is_empty() => {
                shadow_route(&unit.position, &lead.route, ESCORT_ALTITUDE_OFFSET)
            }
            _ => direct_route(&unit.position, &plan.aim, plan.altitude),
        },
    };
    let skill = skill
        .cloned()
        .unwrap_or_else(|| draw_skill(ctx, class.role));
    let spawn = spawn.copied().map(|mut s| {
        s.fuel = s.fuel.map(|fuel| fuel.min(100));
        s
    });

    let unit = ctx
        .pools
        .air_mut(id)
        .ok_or_else(|| PoolError::UnknownUnit(id.to_string()))?;
    unit.mission = Some(plan.mission);
    unit.target = Some(plan.target);
    unit.altitude = Some(plan.altitude);
    unit.loadout = class.loadout_for(plan.mission).to_string();
    unit.flights = flights;
    unit.skill = skill;
    unit.spawn = spawn.unwrap_or_default();
    unit.route = route;

    jam_around(ctx, id);
    Ok(())
}

/// Take every other available unit within the runway radius out of the pass.
fn jam_around(ctx: &mut GenerationContext<'_>, id: &str) {
    let Some(position) = ctx.pools.air(id).map(|u| u.position) else {
        return;
    };
    for other in ctx.pools.available_air_near(&position, RUNWAY_JAM_RADIUS, id) {
        if ctx.is_in_flight(&other) {
            continue;
        }
        if ctx.pools.jam_air(&other) {
            if ctx.cfg.debug {
                log::debug!("{other} jammed by {id}");
            }
            ctx.diagnostics
                .record(LOG_AIR_JAMMED, format!("{other} by {id}"));
        }
    }
}

/// Scaled flight shape for a mission.
#[must_use]
pub fn compose_flights(
    cfg: &GenerationConfig,
    nominal_flights: u8,
    nominal_size: u8,
    mission: MissionType,
    cap: Option<usize>,
) -> Flights {
    let mut count = round_count(
        f64::from(nominal_flights) * cfg.flight_count_multiplier,
        1,
        MAX_FLIGHTS,
    );
    let mut size = round_count(
        f64::from(nominal_size) * cfg.flight_size_multiplier,
        1,
        MAX_FLIGHT_SIZE,
    );
    match mission {
        MissionType::Recon => {
            count = 1;
            size = 1;
        }
        MissionType::ArmedRecon => count = 1,
        _ => {}
    }
    if let Some(cap) = cap {
        let cap = u8::try_from(cap).unwrap_or(MAX_FLIGHTS).max(1);
        count = count.min(cap);
    }
    Flights::numbered(count, size)
}

fn draw_skill(ctx: &GenerationContext<'_>, role: AircraftRole) -> SkillSetting {
    let table = role.skill_table();
    SkillSetting::Unit(table[ctx.rng.air().gen_range(0..table.len())])
}

fn draw_altitude(ctx: &GenerationContext<'_>, mission: MissionType) -> f64 {
    let band = mission.altitude_band();
    ctx.rng.air().gen_range(band.min..=band.max).round()
}

fn direct_route(base: &Point, aim: &Point, altitude: f64) -> Vec<AirWaypoint> {
    vec![
        AirWaypoint {
            kind: AirWaypointKind::Takeoff,
            point: base.with_altitude(0.0),
        },
        AirWaypoint {
            kind: AirWaypointKind::Ingress,
            point: base.lerp(aim, INGRESS_FRACTION).with_altitude(altitude),
        },
        AirWaypoint {
            kind: AirWaypointKind::Action,
            point: aim.with_altitude(altitude),
        },
        AirWaypoint {
            kind: AirWaypointKind::Landing,
            point: base.with_altitude(0.0),
        },
    ]
}

/// Own takeoff and landing around the partner's airborne legs.
fn shadow_route(base: &Point, partner: &[AirWaypoint], offset: f64) -> Vec<AirWaypoint> {
    let mut route = vec![AirWaypoint {
        kind: AirWaypointKind::Takeoff,
        point: base.with_altitude(0.0),
    }];
    route.extend(
        partner
            .iter()
            .filter(|wp| matches!(wp.kind, AirWaypointKind::Ingress | AirWaypointKind::Action))
            .map(|wp| AirWaypoint {
                kind: wp.kind,
                point: wp.point.with_altitude(wp.point.z + offset),
            }),
    );
    route.push(AirWaypoint {
        kind: AirWaypointKind::Landing,
        point: base.with_altitude(0.0),
    });
    route
}

/// Seat the player in `unit` according to rank; returns the chosen slot.
///
/// Slots are ordered senior first: flight leaders, then element leaders,
/// then wingmen, where the element size is 3, 2 or 1 depending on what
/// divides the flight size. Rank 0 gets the most junior seat.
pub fn assign_player_seat(unit: &mut AirUnit, rank: u8) -> Option<u32> {
    let rank = usize::from(rank.min(PLAYER_RANK_MAX));
    let mut ordering: Vec<(u8, usize, usize, u32)> = Vec::new();
    for (flight_idx, flight) in unit.flights.iter().enumerate() {
        let element = match flight.len() {
            n if n % 3 == 0 => 3,
            n if n % 2 == 0 => 2,
            _ => 1,
        };
        for (pos, &slot) in flight.iter().enumerate() {
            let seniority = match pos {
                0 => 0,
                p if p % element == 0 => 1,
                _ => 2,
            };
            ordering.push((seniority, pos, flight_idx, slot));
        }
    }
    if ordering.is_empty() {
        return None;
    }
    ordering.sort_unstable();
    let n = ordering.len();
    let seat = ordering[n - 1 - rank * n / PLAYER_RANK_DIVISOR].3;
    unit.player_slot = Some(seat);
    Some(seat)
}
