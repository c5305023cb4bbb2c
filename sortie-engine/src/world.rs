//! Host world queries consumed by the generator.
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::army::Army;
use crate::geometry::Point;

bitflags! {
    /// Terrain classes reported by the host for a map point.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TerrainFlags: u8 {
        const LAND = 0b0000_0001;
        const WATER = 0b0000_0010;
        const ROAD = 0b0000_0100;
        const RAIL = 0b0000_1000;
        const AIRFIELD = 0b0001_0000;
    }
}

/// Surface a ground path is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Land,
    Water,
    Rail,
}

impl Surface {
    /// Terrain accepted at path endpoints for this surface.
    #[must_use]
    pub const fn terrain(self) -> TerrainFlags {
        match self {
            Self::Land => TerrainFlags::LAND,
            Self::Water => TerrainFlags::WATER,
            Self::Rail => TerrainFlags::RAIL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub name: String,
    pub position: Point,
    pub radius: f64,
}

/// Axis-aligned theatre rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, point: &Point) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathQuery {
    pub start: Point,
    pub start_radius: f64,
    pub end: Point,
    pub end_radius: f64,
    pub surface: Surface,
    pub army: Army,
}

/// One point of a host path. Points carrying `curve` are spline controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub point: Point,
    pub curve: Option<Vec<f64>>,
}

impl PathPoint {
    #[must_use]
    pub const fn line(point: Point) -> Self {
        Self { point, curve: None }
    }
}

/// Handle for an asynchronous host path request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum PathStatus {
    Pending,
    Success(Vec<PathPoint>),
    Failed,
}

/// World queries supplied by the flight-simulation host.
///
/// Implementations must answer identically for identical inputs within one
/// pass so that generation stays reproducible.
pub trait WorldQuery {
    /// Army controlling a map point, if any.
    fn owner_army(&self, x: f64, y: f64) -> Option<Army>;

    fn land_type(&self, x: f64, y: f64) -> TerrainFlags;

    /// Submit an asynchronous path request.
    fn request_path(&self, query: &PathQuery) -> PathTicket;

    /// Poll a previously submitted request.
    fn poll_path(&self, ticket: PathTicket) -> PathStatus;

    fn airports(&self) -> Vec<Airport>;

    fn theatre_bounds(&self) -> Bounds;

    /// Grid sector label used in briefings.
    fn sector_name(&self, point: &Point) -> String;

    fn owner_at(&self, point: &Point) -> Option<Army> {
        self.owner_army(point.x, point.y)
    }

    fn terrain_at(&self, point: &Point) -> TerrainFlags {
        self.land_type(point.x, point.y)
    }
}
