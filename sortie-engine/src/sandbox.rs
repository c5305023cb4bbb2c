//! Deterministic synthetic host for tests and the QA harness.
//!
//! The theatre is a square split by a vertical front line: everything west
//! of `front_x` is Red, everything east is Blue. South of `coast_y` is sea.
//! Paths are straight segments that resolve after a fixed number of polls.
use std::cell::RefCell;

use crate::army::Army;
use crate::error::ConfigError;
use crate::geometry::Point;
use crate::numbers::{floor_index, usize_to_u64};
use crate::section::SectionStore;
use crate::world::{
    Airport, Bounds, PathPoint, PathQuery, PathStatus, PathTicket, TerrainFlags, WorldQuery,
};

const SAMPLE_TEMPLATE: &str = include_str!("../data/sandbox_template.txt");
const SAMPLE_TEMPLATE_NAME: &str = "sandbox_template.txt";
const SECTOR_SIZE: f64 = 10_000.0;
const SECTOR_COLUMNS: u32 = 26;
const PATH_STEP: f64 = 5_000.0;

/// Never resolve path requests; used to exercise the poll timeout.
pub const NEVER_RESOLVE: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub(crate) struct PendingPath {
    query: PathQuery,
    polls: u32,
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    pub bounds: Bounds,
    pub front_x: f64,
    pub coast_y: f64,
    pub airports: Vec<Airport>,
    /// Polls answered `Pending` before a request resolves.
    pub pending_polls: u32,
    /// Insert a curve control point between consecutive path points.
    pub curved_paths: bool,
    /// Fail every path request.
    pub fail_paths: bool,
    pub(crate) requests: RefCell<Vec<PendingPath>>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self {
            bounds: Bounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 100_000.0,
                max_y: 100_000.0,
            },
            front_x: 50_000.0,
            coast_y: 20_000.0,
            airports: vec![
                Airport {
                    name: "Red Field".to_string(),
                    position: Point::ground(15_000.0, 60_000.0),
                    radius: 1_500.0,
                },
                Airport {
                    name: "Blue Field".to_string(),
                    position: Point::ground(85_000.0, 60_000.0),
                    radius: 1_500.0,
                },
            ],
            pending_polls: 1,
            curved_paths: false,
            fail_paths: false,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl SandboxWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path requests submitted so far.
    #[must_use]
    pub fn path_requests(&self) -> usize {
        self.requests.borrow().len()
    }

    fn resolve(&self, query: &PathQuery) -> PathStatus {
        let wanted = query.surface.terrain();
        if self.fail_paths
            || !self.terrain_at(&query.start).intersects(wanted)
            || !self.terrain_at(&query.end).intersects(wanted)
        {
            return PathStatus::Failed;
        }
        let length = query.start.planar_distance(&query.end);
        let steps = (length / PATH_STEP).ceil().max(1.0);
        let mut points = Vec::new();
        let mut step = 0.0;
        while step <= steps {
            let point = query.start.lerp(&query.end, step / steps);
            if self.curved_paths && step > 0.0 {
                let mid = query
                    .start
                    .lerp(&query.end, (step - 0.5) / steps);
                points.push(PathPoint {
                    point: mid,
                    curve: Some(vec![0.5, 0.5]),
                });
            }
            points.push(PathPoint::line(point));
            step += 1.0;
        }
        PathStatus::Success(points)
    }
}

impl WorldQuery for SandboxWorld {
    fn owner_army(&self, x: f64, y: f64) -> Option<Army> {
        if !self.bounds.contains(&Point::ground(x, y)) {
            return None;
        }
        Some(if x < self.front_x { Army::Red } else { Army::Blue })
    }

    fn land_type(&self, x: f64, y: f64) -> TerrainFlags {
        let point = Point::ground(x, y);
        if !self.bounds.contains(&point) {
            return TerrainFlags::empty();
        }
        if y < self.coast_y {
            return TerrainFlags::WATER;
        }
        let mut flags = TerrainFlags::LAND | TerrainFlags::ROAD | TerrainFlags::RAIL;
        if self
            .airports
            .iter()
            .any(|a| a.position.planar_distance(&point) <= a.radius)
        {
            flags |= TerrainFlags::AIRFIELD;
        }
        flags
    }

    fn request_path(&self, query: &PathQuery) -> PathTicket {
        let mut requests = self.requests.borrow_mut();
        requests.push(PendingPath {
            query: query.clone(),
            polls: 0,
        });
        PathTicket(usize_to_u64(requests.len() - 1))
    }

    fn poll_path(&self, ticket: PathTicket) -> PathStatus {
        let query = {
            let mut requests = self.requests.borrow_mut();
            let Some(pending) = usize::try_from(ticket.0)
                .ok()
                .and_then(|idx| requests.get_mut(idx))
            else {
                return PathStatus::Failed;
            };
            if pending.polls < self.pending_polls {
                pending.polls += 1;
                return PathStatus::Pending;
            }
            pending.query.clone()
        };
        self.resolve(&query)
    }

    fn airports(&self) -> Vec<Airport> {
        self.airports.clone()
    }

    fn theatre_bounds(&self) -> Bounds {
        self.bounds
    }

    fn sector_name(&self, point: &Point) -> String {
        let col = floor_index((point.x - self.bounds.min_x) / SECTOR_SIZE, SECTOR_COLUMNS - 1);
        let row = floor_index((point.y - self.bounds.min_y) / SECTOR_SIZE, u32::MAX - 1);
        let letter = char::from_u32(u32::from(b'A') + col).unwrap_or('Z');
        format!("{letter}{}", row + 1)
    }
}

/// The embedded sample campaign matching [`SandboxWorld::default`].
///
/// # Errors
///
/// Only fails if the embedded file is malformed.
pub fn sample_template() -> Result<SectionStore, ConfigError> {
    SectionStore::parse(SAMPLE_TEMPLATE_NAME, SAMPLE_TEMPLATE)
}
