//! Chemical species definitions.

use serde::{Deserialize, Serialize};

/// Working-fluid components and secondary (heat-source/sink) fluids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    /// Propane (R290)
    #[serde(rename = "PROPANE")]
    Propane,
    /// n-Butane (R600)
    #[serde(rename = "BUTANE")]
    NButane,
    /// Isobutane (R600a)
    #[serde(rename = "ISOBUTANE")]
    Isobutane,
    /// Propylene (R1270)
    #[serde(rename = "PROPYLENE")]
    Propylene,
    /// Dimethyl ether (RE170)
    #[serde(rename = "DME")]
    DimethylEther,
    /// Carbon dioxide (R744)
    #[serde(rename = "CO2")]
    CO2,
    /// Ethane (R170)
    #[serde(rename = "ETHANE")]
    Ethane,
    /// n-Pentane (R601)
    #[serde(rename = "PENTANE")]
    NPentane,
    /// n-Hexane
    #[serde(rename = "HEXANE")]
    NHexane,
    /// Toluene
    #[serde(rename = "TOLUENE")]
    Toluene,
    /// Water (hot-side secondary fluid)
    #[serde(rename = "WATER")]
    Water,
    /// Ethylene glycol brine (cold-side secondary fluid)
    #[serde(rename = "ETHYLENEGLYCOL")]
    EthyleneGlycol,
}

/// Constants of the ideal-solution surrogate.
///
/// Critical constants and acentric factors are standard reference data; heat
/// capacities and liquid densities are representative values near 0-60 °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurrogateParams {
    /// Critical temperature [K]
    pub tc_k: f64,
    /// Critical pressure [bar]
    pub pc_bar: f64,
    /// Acentric factor
    pub omega: f64,
    /// Molar mass [kg/kmol]
    pub molar_mass: f64,
    /// Ideal-gas heat capacity [kJ/(kg·K)]
    pub cp_vapor: f64,
    /// Liquid heat capacity [kJ/(kg·K)]
    pub cp_liquid: f64,
    /// Liquid density [kg/m³]
    pub rho_liquid: f64,
}

impl Species {
    pub const ALL: [Species; 12] = [
        Species::Propane,
        Species::NButane,
        Species::Isobutane,
        Species::Propylene,
        Species::DimethylEther,
        Species::CO2,
        Species::Ethane,
        Species::NPentane,
        Species::NHexane,
        Species::Toluene,
        Species::Water,
        Species::EthyleneGlycol,
    ];

    /// Default candidate list for blend screening.
    pub const CANDIDATES: [Species; 5] = [
        Species::Propane,
        Species::NButane,
        Species::Isobutane,
        Species::Propylene,
        Species::DimethylEther,
    ];

    /// Canonical identifier, used as persistence key.
    pub fn key(&self) -> &'static str {
        match self {
            Species::Propane => "PROPANE",
            Species::NButane => "BUTANE",
            Species::Isobutane => "ISOBUTANE",
            Species::Propylene => "PROPYLENE",
            Species::DimethylEther => "DME",
            Species::CO2 => "CO2",
            Species::Ethane => "ETHANE",
            Species::NPentane => "PENTANE",
            Species::NHexane => "HEXANE",
            Species::Toluene => "TOLUENE",
            Species::Water => "WATER",
            Species::EthyleneGlycol => "ETHYLENEGLYCOL",
        }
    }

    /// Get human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Species::Propane => "Propane",
            Species::NButane => "n-Butane",
            Species::Isobutane => "Isobutane",
            Species::Propylene => "Propylene",
            Species::DimethylEther => "Dimethyl Ether",
            Species::CO2 => "Carbon Dioxide",
            Species::Ethane => "Ethane",
            Species::NPentane => "n-Pentane",
            Species::NHexane => "n-Hexane",
            Species::Toluene => "Toluene",
            Species::Water => "Water",
            Species::EthyleneGlycol => "Ethylene Glycol",
        }
    }

    /// Whether the species is a secondary fluid rather than a blend component.
    pub fn is_secondary(&self) -> bool {
        matches!(self, Species::Water | Species::EthyleneGlycol)
    }

    /// Get molar mass [kg/kmol] for this species.
    pub fn molar_mass(&self) -> f64 {
        self.surrogate().molar_mass
    }

    pub fn surrogate(&self) -> SurrogateParams {
        let (tc_k, pc_bar, omega, molar_mass, cp_vapor, cp_liquid, rho_liquid) = match self {
            Species::Propane => (369.89, 42.51, 0.152, 44.097, 1.67, 2.50, 500.0),
            Species::NButane => (425.13, 37.96, 0.201, 58.122, 1.70, 2.40, 579.0),
            Species::Isobutane => (407.81, 36.29, 0.184, 58.122, 1.67, 2.40, 557.0),
            Species::Propylene => (364.21, 45.55, 0.146, 42.080, 1.52, 2.60, 514.0),
            Species::DimethylEther => (400.38, 53.37, 0.196, 46.068, 1.43, 2.30, 668.0),
            Species::CO2 => (304.13, 73.77, 0.224, 44.010, 0.85, 2.20, 770.0),
            Species::Ethane => (305.32, 48.72, 0.099, 30.069, 1.75, 3.00, 370.0),
            Species::NPentane => (469.70, 33.70, 0.251, 72.149, 1.66, 2.30, 626.0),
            Species::NHexane => (507.82, 30.34, 0.299, 86.175, 1.66, 2.27, 659.0),
            Species::Toluene => (591.75, 41.26, 0.266, 92.138, 1.13, 1.70, 867.0),
            Species::Water => (647.10, 220.64, 0.344, 18.015, 1.87, 4.18, 997.0),
            Species::EthyleneGlycol => (720.00, 82.00, 0.510, 62.068, 1.20, 3.60, 1040.0),
        };
        SurrogateParams {
            tc_k,
            pc_bar,
            omega,
            molar_mass,
            cp_vapor,
            cp_liquid,
            rho_liquid,
        }
    }

    /// Map to rfluids Pure enum (internal use for CoolProp backend).
    ///
    /// Returns `None` for the glycol brine, which CoolProp models as an
    /// incompressible binary mixture instead.
    #[cfg(feature = "coolprop")]
    pub(crate) fn rfluids_pure(&self) -> Option<rfluids::substance::Pure> {
        use rfluids::substance::Pure;
        match self {
            Species::Propane => Some(Pure::nPropane),
            Species::NButane => Some(Pure::nButane),
            Species::Isobutane => Some(Pure::Isobutane),
            Species::Propylene => Some(Pure::Propylene),
            Species::DimethylEther => Some(Pure::DimethylEther),
            Species::CO2 => Some(Pure::CarbonDioxide),
            Species::Ethane => Some(Pure::Ethane),
            Species::NPentane => Some(Pure::nPentane),
            Species::NHexane => Some(Pure::nHexane),
            Species::Toluene => Some(Pure::Toluene),
            Species::Water => Some(Pure::Water),
            Species::EthyleneGlycol => None,
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PROPANE" | "NPROPANE" | "N-PROPANE" | "C3H8" | "R290" => Ok(Species::Propane),
            "BUTANE" | "NBUTANE" | "N-BUTANE" | "R600" => Ok(Species::NButane),
            "ISOBUTANE" | "IBUTANE" | "I-BUTANE" | "R600A" => Ok(Species::Isobutane),
            "PROPYLENE" | "PROPENE" | "C3H6" | "R1270" => Ok(Species::Propylene),
            "DME" | "DIMETHYLETHER" | "DIMETHYL ETHER" | "RE170" => Ok(Species::DimethylEther),
            "CO2" | "CARBONDIOXIDE" | "CARBON DIOXIDE" | "R744" => Ok(Species::CO2),
            "ETHANE" | "C2H6" | "R170" => Ok(Species::Ethane),
            "PENTANE" | "NPENTANE" | "N-PENTANE" | "R601" => Ok(Species::NPentane),
            "HEXANE" | "NHEXANE" | "N-HEXANE" => Ok(Species::NHexane),
            "TOLUENE" => Ok(Species::Toluene),
            "WATER" | "H2O" => Ok(Species::Water),
            "ETHYLENEGLYCOL" | "ETHYLENE GLYCOL" | "MEG" | "GLYCOL" => {
                Ok(Species::EthyleneGlycol)
            }
            _ => Err("unknown species"),
        }
    }
}
