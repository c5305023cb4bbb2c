//! Aircraft classes and the parameter strings that describe them.
//!
//! A parameter string has up to three `|`-separated fields:
//!
//! ```text
//! role|mission,mission,...|mission=loadout;mission=loadout
//! ```
//!
//! e.g. `attack|armed_recon,attack_armor,attack_vehicle|attack_armor=4xPTAB`.
//! The optional third field maps a mission (or `default`) to a loadout name.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constants::{BOMBER_SKILL_TABLE, FIGHTER_SKILL_TABLE};
use crate::error::ConfigError;
use crate::mission_type::MissionType;

const DEFAULT_LOADOUT: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AircraftRole {
    Fighter,
    Attack,
    Bomber,
    Recon,
}

impl AircraftRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fighter => "fighter",
            Self::Attack => "attack",
            Self::Bomber => "bomber",
            Self::Recon => "recon",
        }
    }

    #[must_use]
    pub const fn is_fighter_like(self) -> bool {
        matches!(self, Self::Fighter)
    }

    /// Five-tier random skill table for this role.
    #[must_use]
    pub const fn skill_table(self) -> &'static [u8; 5] {
        if self.is_fighter_like() {
            &FIGHTER_SKILL_TABLE
        } else {
            &BOMBER_SKILL_TABLE
        }
    }
}

impl FromStr for AircraftRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fighter" => Ok(Self::Fighter),
            "attack" => Ok(Self::Attack),
            "bomber" => Ok(Self::Bomber),
            "recon" => Ok(Self::Recon),
            other => Err(format!("unknown aircraft role `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AircraftClass {
    pub name: String,
    pub role: AircraftRole,
    pub missions: Vec<MissionType>,
    pub loadouts: BTreeMap<MissionType, String>,
    pub default_loadout: String,
}

impl AircraftClass {
    /// Parse one aircraft parameter string.
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed field.
    pub fn parse(name: &str, params: &str) -> Result<Self, String> {
        let mut fields = params.split('|');
        let role = fields
            .next()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| "missing role".to_string())?
            .parse::<AircraftRole>()?;
        let missions_field = fields
            .next()
            .ok_or_else(|| "missing mission list".to_string())?;
        let mut missions = Vec::new();
        for token in missions_field.split(',').filter(|t| !t.trim().is_empty()) {
            let mission = token.parse::<MissionType>()?;
            if !missions.contains(&mission) {
                missions.push(mission);
            }
        }
        if missions.is_empty() {
            return Err("empty mission list".to_string());
        }

        let mut loadouts = BTreeMap::new();
        let mut default_loadout = DEFAULT_LOADOUT.to_string();
        if let Some(loadout_field) = fields.next() {
            for pair in loadout_field.split(';').filter(|p| !p.trim().is_empty()) {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("loadout entry `{pair}` lacks `=`"))?;
                let value = value.trim();
                if value.is_empty() {
                    return Err(format!("loadout entry `{pair}` has no loadout"));
                }
                if key.trim().eq_ignore_ascii_case(DEFAULT_LOADOUT) {
                    default_loadout = value.to_string();
                } else {
                    loadouts.insert(key.parse::<MissionType>()?, value.to_string());
                }
            }
        }
        if fields.next().is_some() {
            return Err("too many `|` separated fields".to_string());
        }

        Ok(Self {
            name: name.to_string(),
            role,
            missions,
            loadouts,
            default_loadout,
        })
    }

    /// Render back into parameter-string form.
    #[must_use]
    pub fn to_params(&self) -> String {
        let missions: Vec<&str> = self.missions.iter().map(|m| m.as_str()).collect();
        let mut params = format!("{}|{}", self.role.as_str(), missions.join(","));
        let mut loadouts: Vec<String> = self
            .loadouts
            .iter()
            .map(|(mission, loadout)| format!("{}={loadout}", mission.as_str()))
            .collect();
        if self.default_loadout != DEFAULT_LOADOUT {
            loadouts.push(format!("{DEFAULT_LOADOUT}={}", self.default_loadout));
        }
        if !loadouts.is_empty() {
            params.push('|');
            params.push_str(&loadouts.join(";"));
        }
        params
    }

    #[must_use]
    pub fn supports(&self, mission: MissionType) -> bool {
        self.missions.contains(&mission)
    }

    #[must_use]
    pub fn loadout_for(&self, mission: MissionType) -> &str {
        self.loadouts
            .get(&mission)
            .map_or(self.default_loadout.as_str(), String::as_str)
    }
}

/// Every aircraft class known to a campaign, keyed by class name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AircraftCatalog {
    classes: BTreeMap<String, AircraftClass>,
}

impl AircraftCatalog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            classes: BTreeMap::new(),
        }
    }

    /// Parse and insert one class from a template entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AircraftParam`] naming the section and key on a malformed string.
    pub fn insert_params(
        &mut self,
        section: &str,
        name: &str,
        params: &str,
    ) -> Result<(), ConfigError> {
        let class =
            AircraftClass::parse(name, params).map_err(|reason| ConfigError::AircraftParam {
                section: section.to_string(),
                key: name.to_string(),
                value: params.to_string(),
                reason,
            })?;
        self.classes.insert(name.to_string(), class);
        Ok(())
    }

    pub fn insert(&mut self, class: AircraftClass) {
        self.classes.insert(class.name.clone(), class);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AircraftClass> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn supports(&self, name: &str, mission: MissionType) -> bool {
        self.get(name).is_some_and(|c| c.supports(mission))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AircraftClass> {
        self.classes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_parameter_string() {
        let class = AircraftClass::parse(
            "il2",
            "attack|armed_recon,attack_armor,attack_armor|attack_armor=4xPTAB;default=2xFAB100",
        )
        .unwrap();
        assert_eq!(class.role, AircraftRole::Attack);
        assert_eq!(
            class.missions,
            vec![MissionType::ArmedRecon, MissionType::AttackArmor]
        );
        assert_eq!(class.loadout_for(MissionType::AttackArmor), "4xPTAB");
        assert_eq!(class.loadout_for(MissionType::ArmedRecon), "2xFAB100");
        assert_eq!(class.role.skill_table(), &BOMBER_SKILL_TABLE);
    }

    #[test]
    fn params_render_back_to_the_same_class() {
        let class = AircraftClass::parse(
            "il2",
            "attack|armed_recon,attack_armor|attack_armor=4xPTAB;default=2xFAB100",
        )
        .unwrap();
        let reparsed = AircraftClass::parse("il2", &class.to_params()).unwrap();
        assert_eq!(reparsed, class);
    }

    #[test]
    fn loadouts_are_optional() {
        let class = AircraftClass::parse("yak", "fighter|intercept,escort").unwrap();
        assert_eq!(class.loadout_for(MissionType::Escort), "default");
        assert_eq!(class.role.skill_table(), &FIGHTER_SKILL_TABLE);
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert!(AircraftClass::parse("x", "").is_err());
        assert!(AircraftClass::parse("x", "fighter").is_err());
        assert!(AircraftClass::parse("x", "fighter|").is_err());
        assert!(AircraftClass::parse("x", "glider|recon").is_err());
        assert!(AircraftClass::parse("x", "fighter|dogfight").is_err());
        assert!(AircraftClass::parse("x", "fighter|escort|escort").is_err());
        assert!(AircraftClass::parse("x", "fighter|escort|escort=a|extra").is_err());
    }

    #[test]
    fn catalog_reports_section_and_key() {
        let mut catalog = AircraftCatalog::new();
        let err = catalog
            .insert_params("Aircraft", "he111", "bomber|carpet_bomb")
            .unwrap_err();
        match err {
            ConfigError::AircraftParam { section, key, .. } => {
                assert_eq!(section, "Aircraft");
                assert_eq!(key, "he111");
            }
            other => panic!("unexpected error {other:?}"),
        }
        catalog
            .insert_params("Aircraft", "he111", "bomber|attack_depot")
            .unwrap();
        assert!(catalog.supports("he111", MissionType::AttackDepot));
        assert!(!catalog.supports("he111", MissionType::Escort));
        assert!(!catalog.supports("ju87", MissionType::AttackDepot));
    }
}
