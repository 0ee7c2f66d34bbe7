//! Closed categorical domains for every phase.
//!
//! Values outside these sets are caller errors: parsing reports
//! `UnknownSelector` instead of falling back to a zero factor.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EmissionsError;

/// One discrete shipbuilding activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Production,
    Welding,
    PlasmaCutting,
    Coating,
    Sandblasting,
    ShopTestEngine,
    EngineConstruction,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Production,
        Phase::Welding,
        Phase::PlasmaCutting,
        Phase::Coating,
        Phase::Sandblasting,
        Phase::ShopTestEngine,
        Phase::EngineConstruction,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Phase::Production => "Production",
            Phase::Welding => "Welding",
            Phase::PlasmaCutting => "Plasma Cutting",
            Phase::Coating => "Coating",
            Phase::Sandblasting => "Sandblasting",
            Phase::ShopTestEngine => "Shop Test Engine",
            Phase::EngineConstruction => "Engine Construction",
        }
    }

    /// Snake-case key used in scenario files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            Phase::Production => "production",
            Phase::Welding => "welding",
            Phase::PlasmaCutting => "plasma_cutting",
            Phase::Coating => "coating",
            Phase::Sandblasting => "sandblasting",
            Phase::ShopTestEngine => "shop_test_engine",
            Phase::EngineConstruction => "engine_construction",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', ' '], "_");
        Phase::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown phase: {s}"))
    }
}

/// Declares a closed, label-addressed selector enum.
///
/// Serde and `FromStr` both go through the display label, and the first
/// listed variant is the "not yet entered" default.
macro_rules! selector_enum {
    (
        $(#[$meta:meta])*
        $name:ident for $phase:expr, default $default:ident {
            $($variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = EmissionsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| EmissionsError::unknown_selector($phase, s))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let label = String::deserialize(deserializer)?;
                label.parse().map_err(de::Error::custom)
            }
        }
    };
}

selector_enum! {
    /// Arc welding process.
    WeldingMethod for Phase::Welding, default Fcaw {
        Fcaw => "FCAW",
        Gmaw => "GMAW",
        Saw => "SAW",
        Smaw => "SMAW",
    }
}

selector_enum! {
    /// Every electrode label across all welding methods.
    ///
    /// Which electrodes a method accepts is given by [`WeldingMethod::electrodes`].
    Electrode for Phase::Welding, default E110 {
        E110 => "E110",
        E11018 => "E11018",
        E308Lt => "E308LT",
        E316Lt => "E316LT",
        E70T => "E70T",
        E71T => "E71T",
        E308L => "E308L",
        E70S => "E70S",
        Er1260 => "ER1260",
        Er5154 => "ER5154",
        Er316 => "ER316",
        ErNiCrMo => "ERNiCrMo",
        ErNiCu => "ERNiCu",
        Er316Er316L => "ER316, ER316L",
        Er309Er309L => "ER309, ER309L",
        Em12K => "EM12K",
        Mn14Cr4 => "14Mn-4Cr",
        E308 => "E308",
        E310 => "E310",
        E316 => "E316",
        E410 => "E410",
        E6010 => "E6010",
        E6011 => "E6011",
        E6012 => "E6012",
        E6013 => "E6013",
        E7018 => "E7018",
        E7024 => "E7024",
        E7028 => "E7028",
        E8018 => "E8018",
        E9015 => "E9015",
        E9018 => "E9018",
        ECoCr => "ECoCr",
        ENiCl => "ENi-Cl",
        ENiCrMo => "ENiCrMo",
        ENiCu => "ENi-Cu",
    }
}

impl WeldingMethod {
    /// Electrodes with a published fume factor for this method.
    pub fn electrodes(self) -> &'static [Electrode] {
        use Electrode::*;
        match self {
            WeldingMethod::Fcaw => &[E110, E11018, E308Lt, E316Lt, E70T, E71T],
            WeldingMethod::Gmaw => &[E308L, E70S, Er1260, Er5154, Er316, ErNiCrMo, ErNiCu],
            WeldingMethod::Saw => &[Er316Er316L, Er309Er309L, Em12K],
            WeldingMethod::Smaw => &[
                Mn14Cr4, E11018, E308, E310, E316, E410, E6010, E6011, E6012, E6013, E7018,
                E7024, E7028, E8018, E9015, E9018, ECoCr, ENiCl, ENiCrMo, ENiCu,
            ],
        }
    }

    pub fn accepts(self, electrode: Electrode) -> bool {
        self.electrodes().contains(&electrode)
    }
}

selector_enum! {
    /// Plasma gas.
    PlasmaGas for Phase::PlasmaCutting, default Air {
        Air => "Air",
        Oxygen => "Oxygen",
        Nitrogen => "Nitrogen",
    }
}

selector_enum! {
    /// Fume-control style of the cutting table.
    CutStyle for Phase::PlasmaCutting, default Dry {
        Dry => "Dry",
        SemiDry => "Semi-dry",
        Wet => "Wet",
    }
}

selector_enum! {
    /// Plate material and thickness class.
    Thickness for Phase::PlasmaCutting, default MildSteel8mm {
        MildSteel8mm => "Mild steel, 8mm",
        Stainless8mm => "Stainless, 8mm",
        Stainless35mm => "Stainless, 35mm",
    }
}

selector_enum! {
    /// Coating application line.
    CoatingMethod for Phase::Coating, default ConveyorSingleFlow {
        ConveyorSingleFlow => "Conveyor Single Flow",
        ConveyorDip => "Conveyor Dip",
        ConveyorSingleSpray => "Conveyor Single Spray",
        ConveyorTwoCoatFlowSpray => "Conveyor Two-Coat, Flow and Spray",
        ConveyorTwoCoatDipSpray => "Conveyor Two-Coat, Dip and Spray",
        ConveyorTwoCoatSpray => "Conveyor Two-Coat, Spray",
        ManualTwoCoatSprayAirDry => "Manual Two-Coat, Spray and Air Dry",
    }
}

selector_enum! {
    /// Wind speed during open-air blasting.
    WindSpeed for Phase::Sandblasting, default Mph5 {
        Mph5 => "5 mph",
        Mph10 => "10 mph",
        Mph15 => "15 mph",
    }
}

selector_enum! {
    /// Condition of the blasted surface.
    SurfaceType for Phase::Sandblasting, default Precleaned {
        Precleaned => "Precleaned",
        Painted => "Painted",
        Oxidized => "Oxidized",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn electrode_domain_sizes() {
        assert_eq!(Electrode::ALL.len(), 35);
        let listed: usize = WeldingMethod::ALL.iter().map(|m| m.electrodes().len()).sum();
        // E11018 is listed under both FCAW and SMAW.
        assert_eq!(listed, 36);
        for e in Electrode::ALL {
            assert!(WeldingMethod::ALL.iter().any(|m| m.accepts(*e)), "{e} unused");
        }
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("smaw".parse::<WeldingMethod>().unwrap(), WeldingMethod::Smaw);
        assert_eq!("ENi-Cu".parse::<Electrode>().unwrap(), Electrode::ENiCu);
        assert_eq!(
            "mild steel, 8mm".parse::<Thickness>().unwrap(),
            Thickness::MildSteel8mm
        );
        assert_eq!("10 mph".parse::<WindSpeed>().unwrap(), WindSpeed::Mph10);
    }

    #[test]
    fn unknown_label_is_unknown_selector() {
        match "Argon".parse::<PlasmaGas>() {
            Err(EmissionsError::UnknownSelector { phase, selector }) => {
                assert_eq!(phase, Phase::PlasmaCutting);
                assert_eq!(selector, "Argon");
            }
            other => panic!("expected UnknownSelector, got {other:?}"),
        }
        assert!("20 mph".parse::<WindSpeed>().is_err());
    }

    #[test]
    fn defaults_are_first_listed() {
        assert_eq!(WeldingMethod::default(), WeldingMethod::Fcaw);
        assert_eq!(Electrode::default(), Electrode::E110);
        assert_eq!(CoatingMethod::default(), CoatingMethod::ConveyorSingleFlow);
        assert_eq!(SurfaceType::default(), SurfaceType::Precleaned);
    }

    #[test]
    fn phase_parses_from_key_and_label() {
        assert_eq!("plasma_cutting".parse::<Phase>().unwrap(), Phase::PlasmaCutting);
        assert_eq!("Shop Test Engine".parse::<Phase>().unwrap(), Phase::ShopTestEngine);
        assert_eq!("engine-construction".parse::<Phase>().unwrap(), Phase::EngineConstruction);
        assert!("painting".parse::<Phase>().is_err());
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Electrode::Er316Er316L).unwrap();
        assert_eq!(json, "\"ER316, ER316L\"");
        let style: CutStyle = serde_json::from_str("\"Semi-dry\"").unwrap();
        assert_eq!(style, CutStyle::SemiDry);
        let method: WeldingMethod = serde_json::from_str("\"smaw\"").unwrap();
        assert_eq!(method, WeldingMethod::Smaw);
        assert!(serde_json::from_str::<WindSpeed>("\"20 mph\"").is_err());
    }
}
