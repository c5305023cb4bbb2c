//! Mission type enumeration and its classification axes.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::units::{GroundKind, StaticKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionType {
    Recon,
    ArmedRecon,
    AttackArmor,
    AttackVehicle,
    AttackTrain,
    AttackShip,
    AttackArtillery,
    AttackRadar,
    AttackAircraft,
    AttackDepot,
    Intercept,
    Escort,
    Cover,
    Follow,
    Hunting,
}

/// Altitude band in metres, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeBand {
    pub min: f64,
    pub max: f64,
}

const RECON_BAND: AltitudeBand = AltitudeBand {
    min: 3000.0,
    max: 5000.0,
};
const ARMED_RECON_BAND: AltitudeBand = AltitudeBand {
    min: 500.0,
    max: 1500.0,
};
const ATTACK_BAND: AltitudeBand = AltitudeBand {
    min: 800.0,
    max: 2500.0,
};
const FIGHTER_BAND: AltitudeBand = AltitudeBand {
    min: 2500.0,
    max: 5000.0,
};

const ALL_GROUND: &[GroundKind] = &[
    GroundKind::Armor,
    GroundKind::Vehicle,
    GroundKind::Train,
    GroundKind::Ship,
];
const ARMED_RECON_GROUND: &[GroundKind] =
    &[GroundKind::Armor, GroundKind::Vehicle, GroundKind::Train];
const ALL_STATIC: &[StaticKind] = &[
    StaticKind::Artillery,
    StaticKind::Radar,
    StaticKind::Depot,
    StaticKind::Aircraft,
    StaticKind::Ship,
];
const ARMED_RECON_STATIC: &[StaticKind] =
    &[StaticKind::Artillery, StaticKind::Radar, StaticKind::Depot];

impl MissionType {
    pub const ALL: [Self; 15] = [
        Self::Recon,
        Self::ArmedRecon,
        Self::AttackArmor,
        Self::AttackVehicle,
        Self::AttackTrain,
        Self::AttackShip,
        Self::AttackArtillery,
        Self::AttackRadar,
        Self::AttackAircraft,
        Self::AttackDepot,
        Self::Intercept,
        Self::Escort,
        Self::Cover,
        Self::Follow,
        Self::Hunting,
    ];

    /// Requires an enemy ground or static target.
    #[must_use]
    pub const fn is_offensive(self) -> bool {
        matches!(
            self,
            Self::Recon
                | Self::ArmedRecon
                | Self::AttackArmor
                | Self::AttackVehicle
                | Self::AttackTrain
                | Self::AttackShip
                | Self::AttackArtillery
                | Self::AttackRadar
                | Self::AttackAircraft
                | Self::AttackDepot
        )
    }

    /// Generated only as a reaction to one offensive unit.
    #[must_use]
    pub const fn is_defensive(self) -> bool {
        matches!(self, Self::Intercept | Self::Cover)
    }

    /// Benefits from an escort pairing.
    #[must_use]
    pub const fn is_escorted(self) -> bool {
        matches!(
            self,
            Self::ArmedRecon
                | Self::AttackArmor
                | Self::AttackVehicle
                | Self::AttackTrain
                | Self::AttackShip
                | Self::AttackArtillery
                | Self::AttackRadar
                | Self::AttackAircraft
                | Self::AttackDepot
        )
    }

    /// Ground unit kinds this mission may target.
    #[must_use]
    pub const fn ground_kinds(self) -> &'static [GroundKind] {
        match self {
            Self::Recon => ALL_GROUND,
            Self::ArmedRecon => ARMED_RECON_GROUND,
            Self::AttackArmor => &[GroundKind::Armor],
            Self::AttackVehicle => &[GroundKind::Vehicle],
            Self::AttackTrain => &[GroundKind::Train],
            Self::AttackShip => &[GroundKind::Ship],
            _ => &[],
        }
    }

    /// Static object kinds this mission may target.
    #[must_use]
    pub const fn static_kinds(self) -> &'static [StaticKind] {
        match self {
            Self::Recon => ALL_STATIC,
            Self::ArmedRecon => ARMED_RECON_STATIC,
            Self::AttackShip => &[StaticKind::Ship],
            Self::AttackArtillery => &[StaticKind::Artillery],
            Self::AttackRadar => &[StaticKind::Radar],
            Self::AttackAircraft => &[StaticKind::Aircraft],
            Self::AttackDepot => &[StaticKind::Depot],
            _ => &[],
        }
    }

    #[must_use]
    pub const fn altitude_band(self) -> AltitudeBand {
        match self {
            Self::Recon => RECON_BAND,
            Self::ArmedRecon => ARMED_RECON_BAND,
            Self::Intercept | Self::Escort | Self::Cover | Self::Follow | Self::Hunting => {
                FIGHTER_BAND
            }
            _ => ATTACK_BAND,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recon => "recon",
            Self::ArmedRecon => "armed_recon",
            Self::AttackArmor => "attack_armor",
            Self::AttackVehicle => "attack_vehicle",
            Self::AttackTrain => "attack_train",
            Self::AttackShip => "attack_ship",
            Self::AttackArtillery => "attack_artillery",
            Self::AttackRadar => "attack_radar",
            Self::AttackAircraft => "attack_aircraft",
            Self::AttackDepot => "attack_depot",
            Self::Intercept => "intercept",
            Self::Escort => "escort",
            Self::Cover => "cover",
            Self::Follow => "follow",
            Self::Hunting => "hunting",
        }
    }

    /// Human-readable label used in briefings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Recon => "Reconnaissance",
            Self::ArmedRecon => "Armed reconnaissance",
            Self::AttackArmor => "Attack armored column",
            Self::AttackVehicle => "Attack vehicle convoy",
            Self::AttackTrain => "Attack train",
            Self::AttackShip => "Attack shipping",
            Self::AttackArtillery => "Attack artillery position",
            Self::AttackRadar => "Attack radar station",
            Self::AttackAircraft => "Attack parked aircraft",
            Self::AttackDepot => "Attack supply depot",
            Self::Intercept => "Intercept",
            Self::Escort => "Escort",
            Self::Cover => "Cover target area",
            Self::Follow => "Follow",
            Self::Hunting => "Free hunt",
        }
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown mission type `{}`", s.trim()))
    }
}
