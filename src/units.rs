use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, EmissionsError, EmissionsResult};
use crate::selectors::Phase;

/// Square metres per square foot.
pub const SQ_M_PER_SQ_FT: f64 = 0.092903;

/// Unit flag carried with a coated surface area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaUnit {
    #[default]
    #[serde(rename = "ft2", alias = "ft²", alias = "sqft")]
    SquareFeet,
    #[serde(rename = "m2", alias = "m²", alias = "sqm")]
    SquareMetres,
}

impl AreaUnit {
    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::SquareFeet => "ft²",
            AreaUnit::SquareMetres => "m²",
        }
    }
}

impl fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AreaUnit {
    type Err = EmissionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ft2" | "ft²" | "sqft" => Ok(AreaUnit::SquareFeet),
            "m2" | "m²" | "sqm" => Ok(AreaUnit::SquareMetres),
            _ => Err(EmissionsError::unknown_selector(Phase::Coating, s)),
        }
    }
}

/// Surface area tagged with the unit it was entered in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceArea {
    pub value: f64,
    #[serde(default)]
    pub unit: AreaUnit,
}

impl SurfaceArea {
    pub fn square_feet(value: f64) -> Self {
        SurfaceArea {
            value,
            unit: AreaUnit::SquareFeet,
        }
    }

    pub fn square_metres(value: f64) -> Self {
        SurfaceArea {
            value,
            unit: AreaUnit::SquareMetres,
        }
    }

    /// Area in ft², the canonical unit of the coating factor table.
    pub fn to_square_feet(self) -> EmissionsResult<f64> {
        let value = ensure_non_negative("coated_area", self.value)?;
        Ok(SurfaceArea { value, ..self }.in_square_feet())
    }

    /// Unchecked conversion to ft².
    pub fn in_square_feet(self) -> f64 {
        match self.unit {
            AreaUnit::SquareFeet => self.value,
            AreaUnit::SquareMetres => self.value / SQ_M_PER_SQ_FT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_metres_convert_to_square_feet() {
        let ft2 = SurfaceArea::square_metres(100.0).to_square_feet().unwrap();
        assert!((ft2 - 1076.3915).abs() < 1e-3);
    }

    #[test]
    fn square_feet_pass_through() {
        assert_eq!(SurfaceArea::square_feet(42.0).to_square_feet().unwrap(), 42.0);
    }

    #[test]
    fn negative_area_is_rejected() {
        assert!(SurfaceArea::square_feet(-1.0).to_square_feet().is_err());
    }

    #[test]
    fn unit_aliases_parse() {
        assert_eq!("m²".parse::<AreaUnit>().unwrap(), AreaUnit::SquareMetres);
        assert_eq!("ft2".parse::<AreaUnit>().unwrap(), AreaUnit::SquareFeet);
        assert_eq!("SQM".parse::<AreaUnit>().unwrap(), AreaUnit::SquareMetres);
        assert!(matches!(
            "acre".parse::<AreaUnit>(),
            Err(EmissionsError::UnknownSelector {
                phase: Phase::Coating,
                ..
            })
        ));
    }
}
