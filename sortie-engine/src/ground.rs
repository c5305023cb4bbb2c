//! Ground network generation.
//!
//! Template route skeletons become ground units once the front line of the
//! day agrees with them. During a mission pass individual units are then
//! given random operations: trains run the tail of their line, land columns
//! drive towards the front, ships sail and form up in columns.
use rand::Rng;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use crate::army::Army;
use crate::config::{GenerationConfig, PaddingConfig};
use crate::constants::{
    COLUMN_BASE_OFFSET, DEFAULT_GROUND_SPEED, DEFAULT_SHIP_SPEED, DEFAULT_TRAIN_SPEED,
    LOG_GROUND_COLUMN_SKIPPED, LOG_GROUND_EXPLICIT_ARMY_MISMATCH, LOG_GROUND_RANDOM_POINT_EXHAUSTED,
    LOG_GROUND_ROUTE_ARMY_MISMATCH, LOG_GROUND_ROUTE_TOO_SHORT, LOG_GROUND_STATIC_UNOWNED,
    LOG_PADDING_SKIPPED, MIN_ROUTE_WAYPOINTS, PADDING_AIRPORT_SPREAD, PADDING_DRIVE_DISTANCE,
    PADDING_ID_PREFIX, PATH_ENDPOINT_RADIUS, RANDOM_POINT_ATTEMPTS,
};
use crate::error::{GenerationError, ResolutionFailure};
use crate::geometry::{Point, Vector2};
use crate::numbers::u32_to_usize;
use crate::pools::{Diagnostics, GenerationContext};
use crate::template::{FrontMarker, RouteKind, RouteSkeleton, StaticSkeleton};
use crate::units::{
    GroundKind, GroundUnit, GroundWaypoint, SplinePoint, StaticKind, StaticObject, StaticOptions,
    UnitId,
};
use crate::world::{Bounds, PathPoint, PathQuery, PathStatus, Surface, TerrainFlags, WorldQuery};

const PADDING_LAND_CLASS: &str = "Truck";
const PADDING_SHIP_CLASS: &str = "Cargo";

/// Ground units and statics that survived front-line filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroundNetwork {
    pub ground: BTreeMap<UnitId, GroundUnit>,
    pub statics: BTreeMap<UnitId, StaticObject>,
}

impl GroundNetwork {
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ground.contains_key(id) || self.statics.contains_key(id)
    }

    fn land_units(&self, army: Army) -> usize {
        self.ground
            .values()
            .filter(|u| {
                u.army == army && u.kind != GroundKind::Ship && u.kind != GroundKind::Unknown
            })
            .count()
    }

    fn ships(&self, army: Army) -> usize {
        self.ground
            .values()
            .filter(|u| u.army == army && u.kind == GroundKind::Ship)
            .count()
    }

    fn statics_of(&self, army: Army) -> usize {
        self.statics.values().filter(|s| s.army == army).count()
    }

    fn free_id(&self, next: &mut u32) -> UnitId {
        loop {
            let id = format!("{PADDING_ID_PREFIX}{next}");
            *next += 1;
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

/// Result of giving one ground unit an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GroundAssignment {
    /// `column` lists the duplicates created alongside the unit.
    Assigned { unit: UnitId, column: Vec<UnitId> },
    Unresolved(ResolutionFailure),
}

/// Where a random point may be sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleArea {
    Circle { center: Point, radius: f64 },
    Box(Bounds),
}

/// Build the day's ground network from template skeletons.
///
/// Routes whose army cannot be derived from the front line, routes whose
/// explicit army disagrees with it and routes shorter than two points are
/// dropped with a diagnostic. Statics are filtered the same way.
pub fn build_network<'a, W: WorldQuery>(
    world: &W,
    routes: impl IntoIterator<Item = &'a RouteSkeleton>,
    statics: impl IntoIterator<Item = &'a StaticSkeleton>,
    diagnostics: &mut Diagnostics,
) -> GroundNetwork {
    let mut network = GroundNetwork::default();
    for route in routes {
        if let Some(unit) = place_route(world, route, diagnostics) {
            network.ground.insert(unit.id.clone(), unit);
        }
    }
    for skeleton in statics {
        if let Some(object) = place_static(world, skeleton, diagnostics) {
            network.statics.insert(object.id.clone(), object);
        }
    }
    log::info!(
        "ground network: {} units, {} statics",
        network.ground.len(),
        network.statics.len()
    );
    network
}

fn place_route<W: WorldQuery>(
    world: &W,
    route: &RouteSkeleton,
    diagnostics: &mut Diagnostics,
) -> Option<GroundUnit> {
    let (Some(first), Some(last)) = (route.points.first(), route.points.last()) else {
        diagnostics.record(LOG_GROUND_ROUTE_TOO_SHORT, format!("{} has no points", route.id));
        return None;
    };
    if route.points.len() < MIN_ROUTE_WAYPOINTS {
        diagnostics.record(
            LOG_GROUND_ROUTE_TOO_SHORT,
            format!("{} has {} point(s)", route.id, route.points.len()),
        );
        return None;
    }

    let derived = match route.kind {
        RouteKind::Road | RouteKind::Waterway => world.owner_at(&last.point),
        RouteKind::Railway => {
            let start = world.owner_at(&first.point);
            let end = world.owner_at(&last.point);
            if start == end { start } else { None }
        }
    };
    let Some(army) = derived else {
        diagnostics.record(
            LOG_GROUND_ROUTE_ARMY_MISMATCH,
            format!("{} ({}) has no single owning army", route.id, route.kind.as_str()),
        );
        return None;
    };
    if let Some(explicit) = route.army
        && explicit != army
    {
        diagnostics.record(
            LOG_GROUND_EXPLICIT_ARMY_MISMATCH,
            format!("{} declared {explicit} but lies in {army} territory", route.id),
        );
        return None;
    }

    Some(GroundUnit {
        id: route.id.clone(),
        army,
        kind: route.unit_kind,
        class: route.class.clone(),
        count: route.count,
        waypoints: route
            .points
            .iter()
            .map(|p| GroundWaypoint::line(p.point, p.speed))
            .collect(),
        mission_assigned: false,
    })
}

fn place_static<W: WorldQuery>(
    world: &W,
    skeleton: &StaticSkeleton,
    diagnostics: &mut Diagnostics,
) -> Option<StaticObject> {
    let Some(army) = world.owner_at(&skeleton.position) else {
        diagnostics.record(LOG_GROUND_STATIC_UNOWNED, skeleton.id.clone());
        return None;
    };
    if let Some(explicit) = skeleton.army
        && explicit != army
    {
        diagnostics.record(
            LOG_GROUND_EXPLICIT_ARMY_MISMATCH,
            format!("{} declared {explicit} but lies in {army} territory", skeleton.id),
        );
        return None;
    }
    Some(StaticObject {
        id: skeleton.id.clone(),
        army,
        kind: skeleton.kind,
        class: skeleton.class.clone(),
        position: skeleton.position,
        direction: skeleton.direction,
        options: skeleton.options,
    })
}

/// Give one available ground unit a random operation and assign it.
///
/// # Errors
///
/// Only pool bookkeeping failures are errors; everything expected comes back
/// as [`GroundAssignment::Unresolved`].
pub fn assign_ground_operation<W: WorldQuery>(
    ctx: &mut GenerationContext<'_>,
    world: &W,
    markers: &[FrontMarker],
    id: &str,
) -> Result<GroundAssignment, GenerationError> {
    let Some(unit) = ctx.pools.ground(id).filter(|_| ctx.pools.is_ground_available(id)) else {
        return Ok(GroundAssignment::Unresolved(ResolutionFailure::UnitUnavailable(
            id.to_string(),
        )));
    };
    let unit = unit.clone();

    let planned = match unit.kind {
        GroundKind::Train => Ok(trim_train_route(ctx, &unit)),
        GroundKind::Armor | GroundKind::Vehicle => drive_to_front(ctx, world, markers, &unit),
        GroundKind::Ship => sail(ctx, world, &unit),
        GroundKind::Unknown => Err(ResolutionFailure::UnsupportedGroundKind),
    };
    let planned = match planned {
        Ok(planned) => planned,
        Err(reason) => return Ok(GroundAssignment::Unresolved(reason)),
    };
    if planned.waypoints.len() < MIN_ROUTE_WAYPOINTS {
        return Ok(GroundAssignment::Unresolved(ResolutionFailure::RouteTooShort));
    }

    let column = if planned.kind == GroundKind::Ship {
        build_column(&planned, ctx.cfg.ship_column_count, &mut ctx.diagnostics)
    } else {
        Vec::new()
    };

    if let Some(slot) = ctx.pools.ground_mut(id) {
        slot.waypoints = planned.waypoints;
        slot.count = planned.count;
    }
    ctx.pools.assign_ground(id, false)?;

    let mut column_ids = Vec::with_capacity(column.len());
    for duplicate in column {
        let dup_id = duplicate.id.clone();
        ctx.pools.insert_ground(duplicate)?;
        ctx.pools.assign_ground(&dup_id, false)?;
        column_ids.push(dup_id);
    }
    log::debug!(
        "ground operation for {id} ({}), {} column duplicate(s)",
        unit.kind.as_str(),
        column_ids.len()
    );
    Ok(GroundAssignment::Assigned {
        unit: id.to_string(),
        column: column_ids,
    })
}

fn trim_train_route(ctx: &GenerationContext<'_>, unit: &GroundUnit) -> GroundUnit {
    let mut planned = unit.clone();
    if planned.waypoints.len() > MIN_ROUTE_WAYPOINTS {
        let max_skip = planned.waypoints.len() - MIN_ROUTE_WAYPOINTS;
        let skip = ctx.rng.ground().gen_range(0..=max_skip);
        let speed = planned.waypoints.first().and_then(|wp| wp.speed);
        planned.waypoints.drain(..skip);
        if let Some(first) = planned.waypoints.first_mut()
            && first.speed.is_none()
        {
            first.speed = speed;
        }
    }
    if let Some(first) = planned.waypoints.first_mut() {
        first.speed = first.speed.or(Some(DEFAULT_TRAIN_SPEED));
    }
    planned
}

fn drive_to_front<W: WorldQuery>(
    ctx: &mut GenerationContext<'_>,
    world: &W,
    markers: &[FrontMarker],
    unit: &GroundUnit,
) -> Result<GroundUnit, ResolutionFailure> {
    let start = unit.position().ok_or(ResolutionFailure::RouteTooShort)?;
    let marker = markers
        .iter()
        .filter(|m| m.army == unit.army)
        .min_by(|a, b| {
            a.point
                .planar_distance(&start)
                .total_cmp(&b.point.planar_distance(&start))
        })
        .ok_or(ResolutionFailure::NoFrontMarker)?;
    let area = SampleArea::Circle {
        center: marker.point,
        radius: ctx.cfg.front_marker_radius,
    };
    let end = {
        let mut rng = ctx.rng.ground();
        create_random_point(
            world,
            &mut *rng,
            &area,
            Some(unit.army),
            TerrainFlags::LAND,
            &mut ctx.diagnostics,
        )
    }
    .ok_or(ResolutionFailure::NoRandomPoint {
        attempts: RANDOM_POINT_ATTEMPTS,
    })?;

    let query = PathQuery {
        start,
        start_radius: PATH_ENDPOINT_RADIUS,
        end,
        end_radius: PATH_ENDPOINT_RADIUS,
        surface: Surface::Land,
        army: unit.army,
    };
    let mut waypoints = find_path(world, ctx.cfg, &query)?;
    set_lead_speed(&mut waypoints, unit, DEFAULT_GROUND_SPEED);

    let mut planned = unit.clone();
    planned.waypoints = waypoints;
    if unit.kind == GroundKind::Armor {
        let range = ctx.cfg.armor_count_range;
        planned.count = ctx.rng.ground().gen_range(range.min..=range.max);
    }
    Ok(planned)
}

fn sail<W: WorldQuery>(
    ctx: &mut GenerationContext<'_>,
    world: &W,
    unit: &GroundUnit,
) -> Result<GroundUnit, ResolutionFailure> {
    let start = unit.position().ok_or(ResolutionFailure::RouteTooShort)?;
    let area = SampleArea::Box(world.theatre_bounds());
    let end = {
        let mut rng = ctx.rng.ground();
        create_random_point(
            world,
            &mut *rng,
            &area,
            Some(unit.army),
            TerrainFlags::WATER,
            &mut ctx.diagnostics,
        )
    }
    .ok_or(ResolutionFailure::NoRandomPoint {
        attempts: RANDOM_POINT_ATTEMPTS,
    })?;
    let query = PathQuery {
        start,
        start_radius: PATH_ENDPOINT_RADIUS,
        end,
        end_radius: PATH_ENDPOINT_RADIUS,
        surface: Surface::Water,
        army: unit.army,
    };
    let mut waypoints = find_path(world, ctx.cfg, &query)?;
    set_lead_speed(&mut waypoints, unit, DEFAULT_SHIP_SPEED);
    let mut planned = unit.clone();
    planned.waypoints = waypoints;
    Ok(planned)
}

fn set_lead_speed(waypoints: &mut [GroundWaypoint], unit: &GroundUnit, fallback: f64) {
    let speed = unit
        .waypoints
        .first()
        .and_then(|wp| wp.speed)
        .unwrap_or(fallback);
    if let Some(first) = waypoints.first_mut() {
        first.speed = Some(speed);
    }
}

/// Ask the host for a path and wait for it.
///
/// Polls every `path_poll_interval_ms` until `path_timeout_ms` has been
/// spent. Curve-control points become spline sub-waypoints of the line
/// waypoint before them.
///
/// # Errors
///
/// [`ResolutionFailure::NoPath`] when the host gives up,
/// [`ResolutionFailure::PathTimeout`] when the budget runs out.
pub fn find_path<W: WorldQuery>(
    world: &W,
    cfg: &GenerationConfig,
    query: &PathQuery,
) -> Result<Vec<GroundWaypoint>, ResolutionFailure> {
    let ticket = world.request_path(query);
    let budget = crate::numbers::poll_budget(cfg.path_timeout_ms, cfg.path_poll_interval_ms);
    for _ in 0..budget {
        match world.poll_path(ticket) {
            PathStatus::Pending => {
                thread::sleep(Duration::from_millis(cfg.path_poll_interval_ms));
            }
            PathStatus::Success(points) => return Ok(path_to_waypoints(points)),
            PathStatus::Failed => return Err(ResolutionFailure::NoPath),
        }
    }
    log::warn!("path request {ticket:?} timed out after {budget} polls");
    Err(ResolutionFailure::PathTimeout { polls: budget })
}

fn path_to_waypoints(points: Vec<PathPoint>) -> Vec<GroundWaypoint> {
    let mut waypoints: Vec<GroundWaypoint> = Vec::with_capacity(points.len());
    for PathPoint { point, curve } in points {
        match (curve, waypoints.last_mut()) {
            (Some(control), Some(previous)) => previous.sub_waypoints.push(SplinePoint {
                point,
                control: SmallVec::from_vec(control),
            }),
            _ => waypoints.push(GroundWaypoint::line(point, None)),
        }
    }
    waypoints
}

/// Sample a point inside `area` owned by `army` (when given) whose terrain
/// intersects `terrain`. Gives up after a fixed number of attempts.
pub fn create_random_point<W, R>(
    world: &W,
    rng: &mut R,
    area: &SampleArea,
    army: Option<Army>,
    terrain: TerrainFlags,
    diagnostics: &mut Diagnostics,
) -> Option<Point>
where
    W: WorldQuery,
    R: Rng + ?Sized,
{
    for _ in 0..RANDOM_POINT_ATTEMPTS {
        let candidate = match *area {
            SampleArea::Circle { center, radius } => {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                let dist = radius * rng.r#gen::<f64>().sqrt();
                Point::new(
                    angle.cos().mul_add(dist, center.x),
                    angle.sin().mul_add(dist, center.y),
                    center.z,
                )
            }
            SampleArea::Box(bounds) => Point::ground(
                rng.gen_range(bounds.min_x..=bounds.max_x),
                rng.gen_range(bounds.min_y..=bounds.max_y),
            ),
        };
        if army.is_some_and(|a| world.owner_at(&candidate) != Some(a)) {
            continue;
        }
        if world.terrain_at(&candidate).intersects(terrain) {
            return Some(candidate);
        }
    }
    diagnostics.record(
        LOG_GROUND_RANDOM_POINT_EXHAUSTED,
        format!("{area:?} for {army:?} over {terrain:?}"),
    );
    None
}

/// Duplicate `base` into a column of `count` units including the base.
///
/// The i-th duplicate is `base.i`, offset `500 * i` along the left-hand
/// normal of the route at each waypoint.
pub fn build_column(
    base: &GroundUnit,
    count: u8,
    diagnostics: &mut Diagnostics,
) -> Vec<GroundUnit> {
    let mut column = Vec::new();
    if base.waypoints.len() < MIN_ROUTE_WAYPOINTS {
        diagnostics.record(LOG_GROUND_COLUMN_SKIPPED, base.id.clone());
        return column;
    }
    let tangents = waypoint_tangents(&base.waypoints);
    for index in 1..count {
        let distance = COLUMN_BASE_OFFSET * f64::from(index);
        let waypoints: Vec<GroundWaypoint> = base
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, wp)| {
                let normal = tangents[i].perpendicular();
                let segment = segment_tangent(&base.waypoints, i).perpendicular();
                GroundWaypoint {
                    point: wp.point.offset(normal, distance),
                    speed: wp.speed,
                    sub_waypoints: wp
                        .sub_waypoints
                        .iter()
                        .map(|sp| SplinePoint {
                            point: sp.point.offset(segment, distance),
                            control: sp.control.clone(),
                        })
                        .collect(),
                }
            })
            .collect();
        if waypoints.len() < MIN_ROUTE_WAYPOINTS {
            diagnostics.record(LOG_GROUND_COLUMN_SKIPPED, format!("{}.{index}", base.id));
            continue;
        }
        column.push(GroundUnit {
            id: format!("{}.{index}", base.id),
            army: base.army,
            kind: base.kind,
            class: base.class.clone(),
            count: base.count,
            waypoints,
            mission_assigned: false,
        });
    }
    column
}

/// Unit tangent at each waypoint: outgoing at the start, incoming at the end,
/// the average of both in between.
fn waypoint_tangents(waypoints: &[GroundWaypoint]) -> Vec<Vector2> {
    let last = waypoints.len() - 1;
    (0..waypoints.len())
        .map(|i| {
            let incoming = (i > 0).then(|| {
                waypoints[i - 1]
                    .point
                    .towards(&waypoints[i].point)
                    .normalized()
            });
            let outgoing = (i < last).then(|| {
                waypoints[i]
                    .point
                    .towards(&waypoints[i + 1].point)
                    .normalized()
            });
            match (incoming, outgoing) {
                (Some(a), Some(b)) => {
                    let averaged = a.add(b).normalized();
                    if averaged.length() == 0.0 { a } else { averaged }
                }
                (Some(v), None) | (None, Some(v)) => v,
                (None, None) => Vector2::default(),
            }
        })
        .collect()
}

/// Direction of the segment leaving waypoint `i` (entering it for the last one).
fn segment_tangent(waypoints: &[GroundWaypoint], i: usize) -> Vector2 {
    if i + 1 < waypoints.len() {
        waypoints[i].point.towards(&waypoints[i + 1].point).normalized()
    } else if i > 0 {
        waypoints[i - 1].point.towards(&waypoints[i].point).normalized()
    } else {
        Vector2::default()
    }
}

/// Top each army up to the configured ground presence.
///
/// Land units drive short legs near the army's airports, ships anywhere on
/// the army's water, statics sit near airports. A unit whose points cannot be
/// found is skipped with a diagnostic and padding for that kind stops.
pub fn pad_ground_presence<W, R>(
    world: &W,
    rng: &mut R,
    minimums: &PaddingConfig,
    network: &mut GroundNetwork,
    diagnostics: &mut Diagnostics,
) where
    W: WorldQuery,
    R: Rng + ?Sized,
{
    let airports = world.airports();
    let bounds = world.theatre_bounds();
    let mut next_id = 0u32;

    for army in Army::ALL {
        let army_airports: Vec<Point> = airports
            .iter()
            .filter(|a| world.owner_at(&a.position) == Some(army))
            .map(|a| a.position)
            .collect();
        let spread = airports
            .iter()
            .map(|a| a.radius)
            .fold(0.0_f64, f64::max)
            * PADDING_AIRPORT_SPREAD;

        while network.land_units(army) < u32_to_usize(minimums.land_units_per_army) {
            let Some(unit) = padding_land_unit(
                world,
                rng,
                &army_airports,
                spread,
                army,
                network,
                &mut next_id,
                diagnostics,
            ) else {
                diagnostics.record(LOG_PADDING_SKIPPED, format!("{army} land unit"));
                break;
            };
            network.ground.insert(unit.id.clone(), unit);
        }

        while network.ships(army) < u32_to_usize(minimums.ships_per_army) {
            let area = SampleArea::Box(bounds);
            let Some(start) = create_random_point(
                world,
                rng,
                &area,
                Some(army),
                TerrainFlags::WATER,
                diagnostics,
            ) else {
                diagnostics.record(LOG_PADDING_SKIPPED, format!("{army} ship"));
                break;
            };
            let leg = SampleArea::Circle {
                center: start,
                radius: PADDING_DRIVE_DISTANCE,
            };
            let Some(end) = create_random_point(
                world,
                rng,
                &leg,
                Some(army),
                TerrainFlags::WATER,
                diagnostics,
            ) else {
                diagnostics.record(LOG_PADDING_SKIPPED, format!("{army} ship"));
                break;
            };
            let id = network.free_id(&mut next_id);
            let class = existing_class(network, army, GroundKind::Ship)
                .unwrap_or_else(|| PADDING_SHIP_CLASS.to_string());
            network.ground.insert(
                id.clone(),
                GroundUnit {
                    id,
                    army,
                    kind: GroundKind::Ship,
                    class,
                    count: 1,
                    waypoints: vec![
                        GroundWaypoint::line(start, Some(DEFAULT_SHIP_SPEED)),
                        GroundWaypoint::line(end, None),
                    ],
                    mission_assigned: false,
                },
            );
        }

        while network.statics_of(army) < u32_to_usize(minimums.statics_per_army) {
            let Some(object) = padding_static(
                world,
                rng,
                &army_airports,
                spread,
                army,
                network,
                &mut next_id,
                diagnostics,
            ) else {
                diagnostics.record(LOG_PADDING_SKIPPED, format!("{army} static"));
                break;
            };
            network.statics.insert(object.id.clone(), object);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn padding_land_unit<W, R>(
    world: &W,
    rng: &mut R,
    airports: &[Point],
    spread: f64,
    army: Army,
    network: &GroundNetwork,
    next_id: &mut u32,
    diagnostics: &mut Diagnostics,
) -> Option<GroundUnit>
where
    W: WorldQuery,
    R: Rng + ?Sized,
{
    let center = pick(rng, airports)?;
    let area = SampleArea::Circle {
        center,
        radius: spread,
    };
    let start =
        create_random_point(world, rng, &area, Some(army), TerrainFlags::LAND, diagnostics)?;
    let leg = SampleArea::Circle {
        center: start,
        radius: PADDING_DRIVE_DISTANCE,
    };
    let end = create_random_point(world, rng, &leg, Some(army), TerrainFlags::LAND, diagnostics)?;
    let class = existing_class(network, army, GroundKind::Vehicle)
        .unwrap_or_else(|| PADDING_LAND_CLASS.to_string());
    Some(GroundUnit {
        id: network.free_id(next_id),
        army,
        kind: GroundKind::Vehicle,
        class,
        count: 1,
        waypoints: vec![
            GroundWaypoint::line(start, Some(DEFAULT_GROUND_SPEED)),
            GroundWaypoint::line(end, None),
        ],
        mission_assigned: false,
    })
}

#[allow(clippy::too_many_arguments)]
fn padding_static<W, R>(
    world: &W,
    rng: &mut R,
    airports: &[Point],
    spread: f64,
    army: Army,
    network: &GroundNetwork,
    next_id: &mut u32,
    diagnostics: &mut Diagnostics,
) -> Option<StaticObject>
where
    W: WorldQuery,
    R: Rng + ?Sized,
{
    let center = pick(rng, airports)?;
    let area = SampleArea::Circle {
        center,
        radius: spread,
    };
    let position =
        create_random_point(world, rng, &area, Some(army), TerrainFlags::LAND, diagnostics)?;
    let kind = *pick_ref(rng, &StaticKind::SYNTHETIC)?;
    let class = network
        .statics
        .values()
        .find(|s| s.army == army && s.kind == kind)
        .map_or_else(|| kind.as_str().to_string(), |s| s.class.clone());
    Some(StaticObject {
        id: network.free_id(next_id),
        army,
        kind,
        class,
        position,
        direction: rng.gen_range(0.0..360.0),
        options: StaticOptions::None,
    })
}

fn existing_class(network: &GroundNetwork, army: Army, kind: GroundKind) -> Option<String> {
    network
        .ground
        .values()
        .find(|u| u.army == army && u.kind == kind)
        .map(|u| u.class.clone())
}

fn pick<R: Rng + ?Sized>(rng: &mut R, points: &[Point]) -> Option<Point> {
    pick_ref(rng, points).copied()
}

fn pick_ref<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.gen_range(0..items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::AircraftCatalog;
    use crate::pools::ResourcePools;
    use crate::rng::RngBundle;
    use crate::sandbox::{NEVER_RESOLVE, SandboxWorld};
    use crate::template::RoutePoint;

    fn skeleton(
        id: &str,
        kind: RouteKind,
        unit_kind: GroundKind,
        army: Option<Army>,
        points: &[(f64, f64)],
    ) -> RouteSkeleton {
        RouteSkeleton {
            id: id.to_string(),
            kind,
            unit_kind,
            class: "cls".to_string(),
            army,
            count: 1,
            points: points
                .iter()
                .map(|&(x, y)| RoutePoint {
                    point: Point::ground(x, y),
                    speed: None,
                })
                .collect(),
        }
    }

    fn unit(id: &str, kind: GroundKind, army: Army, points: &[(f64, f64)]) -> GroundUnit {
        GroundUnit {
            id: id.to_string(),
            army,
            kind,
            class: "cls".to_string(),
            count: 1,
            waypoints: points
                .iter()
                .map(|&(x, y)| GroundWaypoint::line(Point::ground(x, y), None))
                .collect(),
            mission_assigned: false,
        }
    }

    #[test]
    fn railway_across_the_front_is_dropped() {
        let world = SandboxWorld::new();
        let mut diagnostics = Diagnostics::default();
        let routes = [skeleton(
            "rail",
            RouteKind::Railway,
            GroundKind::Train,
            None,
            &[(40_000.0, 40_000.0), (60_000.0, 40_000.0)],
        )];
        let network = build_network(&world, &routes, &[], &mut diagnostics);
        assert!(network.ground.is_empty());
        assert_eq!(diagnostics.count(LOG_GROUND_ROUTE_ARMY_MISMATCH), 1);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn roads_take_the_destination_owner() {
        let world = SandboxWorld::new();
        let mut diagnostics = Diagnostics::default();
        let across = [(40_000.0, 40_000.0), (60_000.0, 40_000.0)];
        let routes = [
            skeleton("road", RouteKind::Road, GroundKind::Armor, None, &across),
            skeleton("liar", RouteKind::Road, GroundKind::Armor, Some(Army::Red), &across),
            skeleton("stub", RouteKind::Road, GroundKind::Armor, None, &across[..1]),
        ];
        let network = build_network(&world, &routes, &[], &mut diagnostics);
        assert_eq!(network.ground.len(), 1);
        assert_eq!(network.ground["road"].army, Army::Blue);
        assert_eq!(diagnostics.count(LOG_GROUND_EXPLICIT_ARMY_MISMATCH), 1);
        assert_eq!(diagnostics.count(LOG_GROUND_ROUTE_TOO_SHORT), 1);
    }

    #[test]
    fn statics_are_filtered_by_owner() {
        let world = SandboxWorld::new();
        let mut diagnostics = Diagnostics::default();
        let make = |id: &str, army: Option<Army>, x: f64| StaticSkeleton {
            id: id.to_string(),
            army,
            kind: StaticKind::Depot,
            class: "depot".to_string(),
            position: Point::ground(x, 50_000.0),
            direction: 0.0,
            options: StaticOptions::None,
        };
        let statics = [
            make("ok", None, 10_000.0),
            make("wrong", Some(Army::Blue), 10_000.0),
            make("off_map", None, -5.0),
        ];
        let network = build_network(&world, &[], &statics, &mut diagnostics);
        assert_eq!(network.statics.len(), 1);
        assert_eq!(network.statics["ok"].army, Army::Red);
        assert_eq!(diagnostics.count(LOG_GROUND_STATIC_UNOWNED), 1);
        assert_eq!(diagnostics.count(LOG_GROUND_EXPLICIT_ARMY_MISMATCH), 1);
    }

    #[test]
    fn column_offsets_follow_the_left_normal() {
        let points = [(0.0, 0.0), (1000.0, 0.0), (2000.0, 0.0)];
        let base = unit("ship", GroundKind::Ship, Army::Red, &points);
        let mut diagnostics = Diagnostics::default();
        let column = build_column(&base, 3, &mut diagnostics);
        assert_eq!(column.len(), 2);
        assert_eq!(column[0].id, "ship.1");
        assert_eq!(column[1].id, "ship.2");
        let mut expected = 0.0;
        for dup in &column {
            expected += 500.0;
            for (wp, original) in dup.waypoints.iter().zip(&base.waypoints) {
                assert!((wp.point.x - original.point.x).abs() < 1e-9);
                assert!((wp.point.y - expected).abs() < 1e-9);
            }
        }
        assert!(build_column(&base, 1, &mut diagnostics).is_empty());
    }

    #[test]
    fn column_averages_tangents_at_corners() {
        let points = [(0.0, 0.0), (1000.0, 0.0), (1000.0, 1000.0)];
        let base = unit("ship", GroundKind::Ship, Army::Red, &points);
        let column = build_column(&base, 2, &mut Diagnostics::default());
        let corner = column[0].waypoints[1].point;
        let expected =
            Point::ground(1000.0, 0.0).offset(Vector2::new(-1.0, 1.0).normalized(), 500.0);
        assert!(corner.planar_distance(&expected) < 1e-9);
    }

    #[test]
    fn find_path_times_out_and_fails() {
        let cfg = GenerationConfig {
            path_poll_interval_ms: 1,
            path_timeout_ms: 5,
            ..GenerationConfig::default()
        };
        let query = PathQuery {
            start: Point::ground(30_000.0, 50_000.0),
            start_radius: 100.0,
            end: Point::ground(40_000.0, 50_000.0),
            end_radius: 100.0,
            surface: Surface::Land,
            army: Army::Red,
        };
        let stuck = SandboxWorld {
            pending_polls: NEVER_RESOLVE,
            ..SandboxWorld::default()
        };
        assert_eq!(
            find_path(&stuck, &cfg, &query),
            Err(ResolutionFailure::PathTimeout { polls: 5 })
        );

        let broken = SandboxWorld {
            fail_paths: true,
            ..SandboxWorld::default()
        };
        assert_eq!(find_path(&broken, &cfg, &query), Err(ResolutionFailure::NoPath));
    }

    #[test]
    fn curve_points_become_sub_waypoints() {
        let cfg = GenerationConfig {
            path_poll_interval_ms: 1,
            ..GenerationConfig::default()
        };
        let world = SandboxWorld {
            curved_paths: true,
            ..SandboxWorld::default()
        };
        let query = PathQuery {
            start: Point::ground(20_000.0, 10_000.0),
            start_radius: 100.0,
            end: Point::ground(30_000.0, 10_000.0),
            end_radius: 100.0,
            surface: Surface::Water,
            army: Army::Red,
        };
        let waypoints = find_path(&world, &cfg, &query).unwrap();
        assert_eq!(waypoints.len(), 3);
        assert_eq!(waypoints[0].sub_waypoints.len(), 1);
        assert_eq!(waypoints[1].sub_waypoints.len(), 1);
        assert!(waypoints[2].sub_waypoints.is_empty());
    }

    #[test]
    fn random_point_respects_army_and_terrain() {
        let world = SandboxWorld::new();
        let bundle = RngBundle::from_user_seed(4);
        let mut diagnostics = Diagnostics::default();
        let area = SampleArea::Box(world.theatre_bounds());
        for _ in 0..50 {
            let p = create_random_point(
                &world,
                &mut *bundle.ground(),
                &area,
                Some(Army::Blue),
                TerrainFlags::WATER,
                &mut diagnostics,
            )
            .unwrap();
            assert_eq!(world.owner_at(&p), Some(Army::Blue));
            assert!(world.terrain_at(&p).contains(TerrainFlags::WATER));
        }
        let inland = SampleArea::Circle {
            center: Point::ground(30_000.0, 80_000.0),
            radius: 1_000.0,
        };
        let dry = create_random_point(
            &world,
            &mut *bundle.ground(),
            &inland,
            None,
            TerrainFlags::WATER,
            &mut diagnostics,
        );
        assert!(dry.is_none());
        assert_eq!(diagnostics.count(LOG_GROUND_RANDOM_POINT_EXHAUSTED), 1);
    }

    #[test]
    fn ground_operations_by_kind() {
        let world = SandboxWorld::new();
        let cfg = GenerationConfig {
            path_poll_interval_ms: 1,
            ..GenerationConfig::default()
        };
        let catalog = AircraftCatalog::new();
        let mut pools = ResourcePools::new();
        pools
            .insert_ground(unit(
                "train",
                GroundKind::Train,
                Army::Red,
                &[
                    (10_000.0, 40_000.0),
                    (20_000.0, 40_000.0),
                    (30_000.0, 40_000.0),
                    (40_000.0, 40_000.0),
                ],
            ))
            .unwrap();
        pools
            .insert_ground(unit(
                "tanks",
                GroundKind::Armor,
                Army::Red,
                &[(30_000.0, 50_000.0), (35_000.0, 50_000.0)],
            ))
            .unwrap();
        pools
            .insert_ground(unit(
                "boat",
                GroundKind::Ship,
                Army::Red,
                &[(20_000.0, 10_000.0), (25_000.0, 10_000.0)],
            ))
            .unwrap();
        pools
            .insert_ground(unit(
                "odd",
                GroundKind::Unknown,
                Army::Red,
                &[(20_000.0, 50_000.0), (25_000.0, 50_000.0)],
            ))
            .unwrap();
        let markers = vec![FrontMarker {
            id: "fm".to_string(),
            point: Point::ground(45_000.0, 50_000.0),
            army: Army::Red,
        }];
        let mut ctx = GenerationContext::new(pools, RngBundle::from_user_seed(11), &cfg, &catalog);

        let train = assign_ground_operation(&mut ctx, &world, &markers, "train").unwrap();
        assert!(matches!(train, GroundAssignment::Assigned { .. }));
        let wps = &ctx.pools.ground("train").unwrap().waypoints;
        assert!(wps.len() >= 2);
        assert_eq!(wps.last().unwrap().point, Point::ground(40_000.0, 40_000.0));

        let tanks = assign_ground_operation(&mut ctx, &world, &markers, "tanks").unwrap();
        assert!(matches!(tanks, GroundAssignment::Assigned { .. }), "{tanks:?}");
        let armor = ctx.pools.ground("tanks").unwrap();
        assert!((3..=8).contains(&armor.count));
        let end = armor.waypoints.last().unwrap().point;
        assert!(end.planar_distance(&markers[0].point) <= cfg.front_marker_radius + 1e-6);

        match assign_ground_operation(&mut ctx, &world, &markers, "boat").unwrap() {
            GroundAssignment::Assigned { column, .. } => {
                assert_eq!(column, vec!["boat.1".to_string(), "boat.2".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(ctx.pools.ground("boat.2").unwrap().mission_assigned);

        assert_eq!(
            assign_ground_operation(&mut ctx, &world, &markers, "odd").unwrap(),
            GroundAssignment::Unresolved(ResolutionFailure::UnsupportedGroundKind)
        );
        assert_eq!(
            assign_ground_operation(&mut ctx, &world, &markers, "train").unwrap(),
            GroundAssignment::Unresolved(ResolutionFailure::UnitUnavailable("train".into()))
        );
        assert!(
            ctx.pools
                .all_ground()
                .filter(|u| u.mission_assigned)
                .all(|u| u.waypoints.len() >= 2)
        );
    }

    #[test]
    fn armor_without_marker_is_unresolved() {
        let world = SandboxWorld::new();
        let cfg = GenerationConfig::default();
        let catalog = AircraftCatalog::new();
        let mut pools = ResourcePools::new();
        pools
            .insert_ground(unit(
                "tanks",
                GroundKind::Vehicle,
                Army::Blue,
                &[(70_000.0, 50_000.0), (65_000.0, 50_000.0)],
            ))
            .unwrap();
        let mut ctx = GenerationContext::new(pools, RngBundle::from_user_seed(2), &cfg, &catalog);
        assert_eq!(
            assign_ground_operation(&mut ctx, &world, &[], "tanks").unwrap(),
            GroundAssignment::Unresolved(ResolutionFailure::NoFrontMarker)
        );
        assert!(ctx.pools.is_ground_available("tanks"));
    }

    #[test]
    fn padding_tops_up_each_army() {
        let world = SandboxWorld::new();
        let bundle = RngBundle::from_user_seed(8);
        let mut network = GroundNetwork::default();
        let taken = unit(
            "gen_0",
            GroundKind::Vehicle,
            Army::Red,
            &[(20_000.0, 60_000.0), (21_000.0, 60_000.0)],
        );
        network.ground.insert("gen_0".into(), taken);
        let mut diagnostics = Diagnostics::default();
        let minimums = PaddingConfig {
            land_units_per_army: 2,
            ships_per_army: 1,
            statics_per_army: 2,
        };
        pad_ground_presence(
            &world,
            &mut *bundle.padding(),
            &minimums,
            &mut network,
            &mut diagnostics,
        );
        for army in Army::ALL {
            assert_eq!(network.land_units(army), 2);
            assert_eq!(network.ships(army), 1);
            assert_eq!(network.statics_of(army), 2);
        }
        assert!(network.ground.values().all(|u| u.waypoints.len() == 2));
        assert!(
            network
                .ground
                .values()
                .all(|u| world.owner_at(&u.waypoints[0].point) == Some(u.army))
        );
        assert_eq!(diagnostics.count(LOG_PADDING_SKIPPED), 0);
        assert!(network.ground.contains_key("gen_1"));
    }
}
