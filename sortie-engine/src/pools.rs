//! Resource pools and the per-pass generation context.
//!
//! Every unit lives in exactly one backing map. The pools only track ids:
//! an air unit is available, assigned or jammed; a ground unit or static is
//! available or assigned. Assignment is one-way within a pass.
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::aircraft::AircraftCatalog;
use crate::config::GenerationConfig;
use crate::error::PoolError;
use crate::geometry::Point;
use crate::rng::RngBundle;
use crate::units::{AirUnit, GroundUnit, StaticObject, UnitId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePools {
    air: BTreeMap<UnitId, AirUnit>,
    ground: BTreeMap<UnitId, GroundUnit>,
    statics: BTreeMap<UnitId, StaticObject>,
    available_air: BTreeSet<UnitId>,
    assigned_air: Vec<UnitId>,
    jammed_air: BTreeSet<UnitId>,
    available_ground: BTreeSet<UnitId>,
    assigned_ground: Vec<UnitId>,
    available_statics: BTreeSet<UnitId>,
    assigned_statics: Vec<UnitId>,
}

impl ResourcePools {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an air unit to the available pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DuplicateId`] when the id is taken.
    pub fn insert_air(&mut self, unit: AirUnit) -> Result<(), PoolError> {
        if self.air.contains_key(&unit.id) {
            return Err(PoolError::DuplicateId(unit.id));
        }
        self.available_air.insert(unit.id.clone());
        self.air.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Add a ground unit to the available pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DuplicateId`] when the id is taken.
    pub fn insert_ground(&mut self, unit: GroundUnit) -> Result<(), PoolError> {
        if self.ground.contains_key(&unit.id) || self.statics.contains_key(&unit.id) {
            return Err(PoolError::DuplicateId(unit.id));
        }
        self.available_ground.insert(unit.id.clone());
        self.ground.insert(unit.id.clone(), unit);
        Ok(())
    }

    /// Add a static object to the available pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::DuplicateId`] when the id is taken.
    pub fn insert_static(&mut self, object: StaticObject) -> Result<(), PoolError> {
        if self.statics.contains_key(&object.id) || self.ground.contains_key(&object.id) {
            return Err(PoolError::DuplicateId(object.id));
        }
        self.available_statics.insert(object.id.clone());
        self.statics.insert(object.id.clone(), object);
        Ok(())
    }

    #[must_use]
    pub fn air(&self, id: &str) -> Option<&AirUnit> {
        self.air.get(id)
    }

    pub fn air_mut(&mut self, id: &str) -> Option<&mut AirUnit> {
        self.air.get_mut(id)
    }

    #[must_use]
    pub fn ground(&self, id: &str) -> Option<&GroundUnit> {
        self.ground.get(id)
    }

    pub fn ground_mut(&mut self, id: &str) -> Option<&mut GroundUnit> {
        self.ground.get_mut(id)
    }

    #[must_use]
    pub fn static_object(&self, id: &str) -> Option<&StaticObject> {
        self.statics.get(id)
    }

    #[must_use]
    pub fn is_air_available(&self, id: &str) -> bool {
        self.available_air.contains(id)
    }

    #[must_use]
    pub fn is_air_assigned(&self, id: &str) -> bool {
        self.assigned_air.iter().any(|a| a == id)
    }

    #[must_use]
    pub fn is_air_jammed(&self, id: &str) -> bool {
        self.jammed_air.contains(id)
    }

    #[must_use]
    pub fn is_ground_available(&self, id: &str) -> bool {
        self.available_ground.contains(id)
    }

    #[must_use]
    pub fn is_static_available(&self, id: &str) -> bool {
        self.available_statics.contains(id)
    }

    /// Available air units in id order.
    pub fn available_air(&self) -> impl Iterator<Item = &AirUnit> {
        self.available_air.iter().filter_map(|id| self.air.get(id))
    }

    /// Assigned air units in assignment order.
    pub fn assigned_air(&self) -> impl Iterator<Item = &AirUnit> {
        self.assigned_air.iter().filter_map(|id| self.air.get(id))
    }

    pub fn all_air(&self) -> impl Iterator<Item = &AirUnit> {
        self.air.values()
    }

    pub fn jammed_air(&self) -> impl Iterator<Item = &AirUnit> {
        self.jammed_air.iter().filter_map(|id| self.air.get(id))
    }

    pub fn available_ground(&self) -> impl Iterator<Item = &GroundUnit> {
        self.available_ground.iter().filter_map(|id| self.ground.get(id))
    }

    /// Every ground unit of the pass, assigned or not.
    pub fn all_ground(&self) -> impl Iterator<Item = &GroundUnit> {
        self.ground.values()
    }

    pub fn available_statics(&self) -> impl Iterator<Item = &StaticObject> {
        self.available_statics
            .iter()
            .filter_map(|id| self.statics.get(id))
    }

    /// Every static object of the pass, assigned or not.
    pub fn all_statics(&self) -> impl Iterator<Item = &StaticObject> {
        self.statics.values()
    }

    /// Ground units a target search may consider.
    pub fn ground_targets(
        &self,
        multi_assignment: bool,
    ) -> Box<dyn Iterator<Item = &GroundUnit> + '_> {
        if multi_assignment {
            Box::new(self.all_ground())
        } else {
            Box::new(self.available_ground())
        }
    }

    /// Static objects a target search may consider.
    pub fn static_targets(
        &self,
        multi_assignment: bool,
    ) -> Box<dyn Iterator<Item = &StaticObject> + '_> {
        if multi_assignment {
            Box::new(self.all_statics())
        } else {
            Box::new(self.available_statics())
        }
    }

    /// Move an available air unit to the assigned list.
    ///
    /// # Errors
    ///
    /// Unknown, already assigned or jammed units are rejected.
    pub fn assign_air(&mut self, id: &str) -> Result<(), PoolError> {
        if !self.air.contains_key(id) {
            return Err(PoolError::UnknownUnit(id.to_string()));
        }
        if self.is_air_assigned(id) {
            return Err(PoolError::AlreadyAssigned(id.to_string()));
        }
        if !self.available_air.remove(id) {
            return Err(PoolError::NotAvailable(id.to_string()));
        }
        self.assigned_air.push(id.to_string());
        Ok(())
    }

    /// Remove an available air unit without assigning it. Returns whether it was available.
    pub fn jam_air(&mut self, id: &str) -> bool {
        if self.available_air.remove(id) {
            self.jammed_air.insert(id.to_string());
            true
        } else {
            false
        }
    }

    /// Available air units within `radius` of `position`, excluding `skip`.
    #[must_use]
    pub fn available_air_near(&self, position: &Point, radius: f64, skip: &str) -> Vec<UnitId> {
        self.available_air()
            .filter(|unit| unit.id != skip)
            .filter(|unit| unit.position.planar_distance(position) <= radius)
            .map(|unit| unit.id.clone())
            .collect()
    }

    /// Mark a ground unit assigned.
    ///
    /// With `multi_assignment` a repeat assignment is a no-op.
    ///
    /// # Errors
    ///
    /// Unknown units, and repeat assignments without `multi_assignment`, are rejected.
    pub fn assign_ground(&mut self, id: &str, multi_assignment: bool) -> Result<(), PoolError> {
        let unit = self
            .ground
            .get_mut(id)
            .ok_or_else(|| PoolError::UnknownUnit(id.to_string()))?;
        if !self.available_ground.remove(id) {
            return if multi_assignment && unit.mission_assigned {
                Ok(())
            } else {
                Err(PoolError::AlreadyAssigned(id.to_string()))
            };
        }
        unit.mission_assigned = true;
        self.assigned_ground.push(id.to_string());
        Ok(())
    }

    /// Mark a static object assigned.
    ///
    /// # Errors
    ///
    /// Same rules as [`Self::assign_ground`].
    pub fn assign_static(&mut self, id: &str, multi_assignment: bool) -> Result<(), PoolError> {
        if !self.statics.contains_key(id) {
            return Err(PoolError::UnknownUnit(id.to_string()));
        }
        if !self.available_statics.remove(id) {
            return if multi_assignment && self.assigned_statics.iter().any(|s| s == id) {
                Ok(())
            } else {
                Err(PoolError::AlreadyAssigned(id.to_string()))
            };
        }
        self.assigned_statics.push(id.to_string());
        Ok(())
    }

    pub fn assigned_ground_ids(&self) -> impl Iterator<Item = &str> {
        self.assigned_ground.iter().map(String::as_str)
    }
}

/// One keyed, non-fatal event of a generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub key: &'static str,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.detail)
    }
}

/// Collected diagnostics, mirrored to the `log` facade as they arrive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn record(&mut self, key: &'static str, detail: impl Into<String>) {
        let diagnostic = Diagnostic {
            key,
            detail: detail.into(),
        };
        log::trace!("{diagnostic}");
        self.0.push(diagnostic);
    }

    #[must_use]
    pub fn count(&self, key: &str) -> usize {
        self.0.iter().filter(|d| d.key == key).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}

/// All mutable state of one generation pass.
#[derive(Debug)]
pub struct GenerationContext<'a> {
    pub pools: ResourcePools,
    pub rng: RngBundle,
    pub cfg: &'a GenerationConfig,
    pub catalog: &'a AircraftCatalog,
    pub diagnostics: Diagnostics,
    /// Units on the linked-generation stack or reserved as partners.
    in_flight: Vec<UnitId>,
}

impl<'a> GenerationContext<'a> {
    #[must_use]
    pub fn new(
        pools: ResourcePools,
        rng: RngBundle,
        cfg: &'a GenerationConfig,
        catalog: &'a AircraftCatalog,
    ) -> Self {
        Self {
            pools,
            rng,
            cfg,
            catalog,
            diagnostics: Diagnostics::default(),
            in_flight: Vec::new(),
        }
    }

    pub fn push_in_flight(&mut self, id: &str) {
        self.in_flight.push(id.to_string());
    }

    /// Pop the most recent entry for `id`.
    pub fn pop_in_flight(&mut self, id: &str) {
        if let Some(pos) = self.in_flight.iter().rposition(|u| u == id) {
            self.in_flight.remove(pos);
        }
    }

    #[must_use]
    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.iter().any(|u| u == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::army::Army;
    use crate::units::{GroundKind, GroundWaypoint, StaticKind, StaticOptions};

    fn air(id: &str, x: f64) -> AirUnit {
        AirUnit::new(id, Army::Red, "yak", Point::ground(x, 0.0))
    }

    fn ground(id: &str) -> GroundUnit {
        GroundUnit {
            id: id.to_string(),
            army: Army::Blue,
            kind: GroundKind::Armor,
            class: "t34".to_string(),
            count: 1,
            waypoints: vec![
                GroundWaypoint::line(Point::ground(0.0, 0.0), None),
                GroundWaypoint::line(Point::ground(1.0, 0.0), None),
            ],
            mission_assigned: false,
        }
    }

    fn depot(id: &str) -> StaticObject {
        StaticObject {
            id: id.to_string(),
            army: Army::Blue,
            kind: StaticKind::Depot,
            class: "depot".to_string(),
            position: Point::ground(0.0, 0.0),
            direction: 0.0,
            options: StaticOptions::None,
        }
    }

    #[test]
    fn air_assignment_is_exclusive() {
        let mut pools = ResourcePools::new();
        pools.insert_air(air("a", 0.0)).unwrap();
        pools.insert_air(air("b", 10.0)).unwrap();
        assert_eq!(pools.insert_air(air("a", 0.0)), Err(PoolError::DuplicateId("a".into())));

        pools.assign_air("a").unwrap();
        assert_eq!(pools.assign_air("a"), Err(PoolError::AlreadyAssigned("a".into())));
        assert_eq!(pools.assign_air("zz"), Err(PoolError::UnknownUnit("zz".into())));
        assert!(!pools.is_air_available("a"));

        assert!(pools.jam_air("b"));
        assert!(!pools.jam_air("b"));
        assert_eq!(pools.assign_air("b"), Err(PoolError::NotAvailable("b".into())));
        assert_eq!(pools.available_air().count(), 0);
        assert_eq!(pools.assigned_air().count(), 1);
        assert_eq!(pools.jammed_air().count(), 1);
    }

    #[test]
    fn ground_assignment_respects_multi_assignment() {
        let mut pools = ResourcePools::new();
        pools.insert_ground(ground("g")).unwrap();
        pools.insert_static(depot("s")).unwrap();
        assert_eq!(pools.insert_static(depot("g")), Err(PoolError::DuplicateId("g".into())));

        pools.assign_ground("g", false).unwrap();
        assert!(pools.ground("g").unwrap().mission_assigned);
        assert_eq!(pools.assign_ground("g", false), Err(PoolError::AlreadyAssigned("g".into())));
        assert_eq!(pools.assign_ground("g", true), Ok(()));
        assert_eq!(pools.assigned_ground_ids().count(), 1);

        assert_eq!(pools.ground_targets(false).count(), 0);
        assert_eq!(pools.ground_targets(true).count(), 1);

        pools.assign_static("s", true).unwrap();
        assert_eq!(pools.assign_static("s", true), Ok(()));
        assert!(pools.assign_static("s", false).is_err());
        assert_eq!(pools.static_targets(false).count(), 0);
        assert_eq!(pools.all_statics().count(), 1);
    }

    #[test]
    fn nearby_query_uses_planar_radius() {
        let mut pools = ResourcePools::new();
        pools.insert_air(air("home", 0.0)).unwrap();
        pools.insert_air(air("near", 999.0)).unwrap();
        pools.insert_air(air("edge", 1000.0)).unwrap();
        pools.insert_air(air("far", 1001.0)).unwrap();
        let near = pools.available_air_near(&Point::ground(0.0, 0.0), 1000.0, "home");
        assert_eq!(near, vec!["edge".to_string(), "near".to_string()]);
    }

    #[test]
    fn diagnostics_count_by_key() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.record("log.a", "one");
        diagnostics.record("log.b", "two");
        diagnostics.record("log.a", "three");
        assert_eq!(diagnostics.count("log.a"), 2);
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics.iter().next().unwrap().to_string(), "log.a: one");
    }

    #[test]
    fn in_flight_stack_nests() {
        let cfg = GenerationConfig::default();
        let catalog = AircraftCatalog::new();
        let rng = RngBundle::from_user_seed(1);
        let mut ctx = GenerationContext::new(ResourcePools::new(), rng, &cfg, &catalog);
        ctx.push_in_flight("a");
        ctx.push_in_flight("a");
        ctx.pop_in_flight("a");
        assert!(ctx.is_in_flight("a"));
        ctx.pop_in_flight("a");
        assert!(!ctx.is_in_flight("a"));
    }
}
