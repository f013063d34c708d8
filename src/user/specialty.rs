use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Closed set of specialties a user picks at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialty {
    Software,
    Electromechanics,
    Electronics,
    RenewableEnergy,
    Accounting,
    Automotive,
    Architecture,
    GraphicDesign,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown specialty {0:?}")]
pub struct UnknownSpecialty(pub String);

impl Specialty {
    pub const ALL: [Specialty; 9] = [
        Specialty::Software,
        Specialty::Electromechanics,
        Specialty::Electronics,
        Specialty::RenewableEnergy,
        Specialty::Accounting,
        Specialty::Automotive,
        Specialty::Architecture,
        Specialty::GraphicDesign,
        Specialty::Other,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Specialty::Software => "software",
            Specialty::Electromechanics => "electromechanics",
            Specialty::Electronics => "electronics",
            Specialty::RenewableEnergy => "renewable_energy",
            Specialty::Accounting => "accounting",
            Specialty::Automotive => "automotive",
            Specialty::Architecture => "architecture",
            Specialty::GraphicDesign => "graphic_design",
            Specialty::Other => "other",
        }
    }

    /// Display label for pickers and the profile view.
    pub fn label(self) -> &'static str {
        match self {
            Specialty::Software => "Software Development",
            Specialty::Electromechanics => "Electromechanics",
            Specialty::Electronics => "Electronics",
            Specialty::RenewableEnergy => "Renewable Energy",
            Specialty::Accounting => "Accounting",
            Specialty::Automotive => "Automotive Mechanics",
            Specialty::Architecture => "Architecture",
            Specialty::GraphicDesign => "Graphic Design",
            Specialty::Other => "Other",
        }
    }
}

impl FromStr for Specialty {
    type Err = UnknownSpecialty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specialty::ALL
            .into_iter()
            .find(|sp| sp.tag() == s)
            .ok_or_else(|| UnknownSpecialty(s.to_string()))
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
