//! Enumerated option domains offered by the configurator.
//!
//! Declaration order is load-bearing: pricing derives multipliers from
//! `ordinal()`, so reordering variants changes prices.

use serde::{Deserialize, Serialize};

macro_rules! catalog_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn ordinal(self) -> usize {
                self as usize
            }

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            /// Display label in the source locale.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Accepts either the identifier or the display label.
            pub fn parse(raw: &str) -> Option<Self> {
                let raw = raw.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| option.name() == raw || option.label() == raw)
            }
        }
    };
}

catalog_enum! {
    /// Opening type of one sash.
    pub enum SectionType {
        TiltTurn => "Uchylno-rozwieralne",
        #[default]
        Fixed => "Stałe",
        Casement => "Rozwierane",
        Tilt => "Uchylne",
    }
}

catalog_enum! {
    pub enum Material {
        #[default]
        PVC => "PVC",
        Aluminium => "Aluminium",
        Wood => "Drewno",
    }
}

catalog_enum! {
    pub enum GlassType {
        #[default]
        SingleChamber => "Jednokomorowe",
        DoubleChamber => "Dwukomorowe",
        TripleChamber => "Trzykomorowe",
    }
}

catalog_enum! {
    pub enum FrameColor {
        #[default]
        White => "Biały",
        Black => "Czarny",
        Anthracite => "Antracyt",
        GoldenOak => "Złoty Dąb",
    }
}

impl SectionType {
    /// Fixed panes carry no handle and no opening marks.
    pub fn is_openable(self) -> bool {
        self != SectionType::Fixed
    }
}

/// Fitting-complexity surcharge shared by every window of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "InstallationRecord", try_from = "InstallationRecord")]
pub enum InstallationClass {
    #[default]
    Standard,
    Complex,
    Atypical,
}

impl InstallationClass {
    pub const ALL: &'static [InstallationClass] = &[
        InstallationClass::Standard,
        InstallationClass::Complex,
        InstallationClass::Atypical,
    ];

    pub fn multiplier(self) -> f64 {
        match self {
            InstallationClass::Standard => 1.0,
            InstallationClass::Complex => 1.3,
            InstallationClass::Atypical => 1.5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InstallationClass::Standard => "Standard",
            InstallationClass::Complex => "Complex",
            InstallationClass::Atypical => "Atypical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InstallationClass::Standard => "Standardowy",
            InstallationClass::Complex => "Złożony",
            InstallationClass::Atypical => "Nietypowy",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|class| class.name() == raw || class.label() == raw)
    }
}

/// Wire shape of an installation class: `{ "type": ..., "multiplier": ... }`.
///
/// The multiplier is informational on input; the class name decides.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstallationRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    multiplier: Option<f64>,
}

impl From<InstallationClass> for InstallationRecord {
    fn from(class: InstallationClass) -> Self {
        Self {
            kind: class.name().to_string(),
            multiplier: Some(class.multiplier()),
        }
    }
}

impl TryFrom<InstallationRecord> for InstallationClass {
    type Error = String;

    fn try_from(record: InstallationRecord) -> Result<Self, Self::Error> {
        InstallationClass::parse(&record.kind)
            .ok_or_else(|| format!("unknown installation type: {}", record.kind))
    }
}
