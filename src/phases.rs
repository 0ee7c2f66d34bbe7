//! Per-phase emission calculators.
//!
//! Each input type is a pure function of itself and the catalog. Zero
//! inputs yield a fully-keyed, all-zero result; negative inputs are
//! rejected with `InvalidInput`.

use serde::{Deserialize, Serialize};

use crate::catalog::{EmissionFactorCatalog, FactorSet};
use crate::error::{ensure_non_negative, EmissionsResult};
use crate::pollutant::{Grams, PhaseEmissionResult, Pollutant};
use crate::selectors::{
    CoatingMethod, CutStyle, Electrode, Phase, PlasmaGas, SurfaceType, Thickness, WeldingMethod,
    WindSpeed,
};
use crate::units::{AreaUnit, SurfaceArea};

/// Shared contract for the seven phase calculators.
pub trait PhaseCalculator: Sized {
    const PHASE: Phase;

    /// Name and unit of the scalar perturbed by sensitivity analysis.
    const PRIMARY_QUANTITY: &'static str;

    /// Emitted grams per pollutant for this phase.
    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult>;

    fn primary_quantity(&self) -> f64;

    /// Same input with the primary scalar replaced.
    fn with_primary_quantity(&self, value: f64) -> Self;
}

/// Multiply every factor in `set` by `quantity`.
fn scale(phase: Phase, set: &FactorSet, quantity: f64) -> PhaseEmissionResult {
    let mut result = PhaseEmissionResult::new(phase);
    for (pollutant, factor) in set {
        result.insert(*pollutant, Grams(factor * quantity));
    }
    result
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionInput {
    pub steel_kg: f64,
}

impl PhaseCalculator for ProductionInput {
    const PHASE: Phase = Phase::Production;
    const PRIMARY_QUANTITY: &'static str = "steel weight (kg)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let steel_kg = ensure_non_negative("steel_kg", self.steel_kg)?;
        Ok(scale(Self::PHASE, catalog.production(), steel_kg))
    }

    fn primary_quantity(&self) -> f64 {
        self.steel_kg
    }

    fn with_primary_quantity(&self, value: f64) -> Self {
        ProductionInput { steel_kg: value }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeldingInput {
    pub method: WeldingMethod,
    pub electrode: Electrode,
    pub electrode_kg: f64,
}

impl PhaseCalculator for WeldingInput {
    const PHASE: Phase = Phase::Welding;
    const PRIMARY_QUANTITY: &'static str = "electrode mass (kg)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let electrode_kg = ensure_non_negative("electrode_kg", self.electrode_kg)?;
        let pm = catalog.welding_pm(self.method, self.electrode)?;
        let mut result = PhaseEmissionResult::new(Self::PHASE);
        result.insert(Pollutant::Pm, Grams(pm * electrode_kg));
        Ok(result)
    }

    fn primary_quantity(&self) -> f64 {
        self.electrode_kg
    }

    fn with_primary_quantity(&self, value: f64) -> Self {
        WeldingInput {
            electrode_kg: value,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlasmaCuttingInput {
    pub gas: PlasmaGas,
    pub style: CutStyle,
    pub thickness: Thickness,
    pub duration_min: f64,
}

impl PhaseCalculator for PlasmaCuttingInput {
    const PHASE: Phase = Phase::PlasmaCutting;
    const PRIMARY_QUANTITY: &'static str = "cutting duration (min)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let minutes = ensure_non_negative("duration_min", self.duration_min)?;
        let f = catalog.plasma_cutting(self.gas, self.style, self.thickness)?;
        let mut result = PhaseEmissionResult::new(Self::PHASE);
        result.insert(Pollutant::Pm, Grams(f.pm_g_per_min * minutes));
        result.insert(Pollutant::Nox, Grams(f.nox_g_per_min * minutes));
        Ok(result)
    }

    fn primary_quantity(&self) -> f64 {
        self.duration_min
    }

    fn with_primary_quantity(&self, value: f64) -> Self {
        PlasmaCuttingInput {
            duration_min: value,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoatingInput {
    pub method: CoatingMethod,
    pub area: f64,
    pub unit: AreaUnit,
}

impl CoatingInput {
    pub fn surface_area(&self) -> SurfaceArea {
        SurfaceArea {
            value: self.area,
            unit: self.unit,
        }
    }
}

impl PhaseCalculator for CoatingInput {
    const PHASE: Phase = Phase::Coating;
    const PRIMARY_QUANTITY: &'static str = "coated area (ft²)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let ft2 = self.surface_area().to_square_feet()?;
        let voc = catalog.coating_voc(self.method)?;
        let mut result = PhaseEmissionResult::new(Self::PHASE);
        result.insert(Pollutant::Voc, Grams(voc * ft2));
        Ok(result)
    }

    /// Perturbed in ft², whatever unit the area was entered in.
    fn primary_quantity(&self) -> f64 {
        self.surface_area().in_square_feet()
    }

    fn with_primary_quantity(&self, value: f64) -> Self {
        CoatingInput {
            area: value,
            unit: AreaUnit::SquareFeet,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandblastingInput {
    pub wind_speed: WindSpeed,
    pub surface: SurfaceType,
    pub sand_kg: f64,
}

impl PhaseCalculator for SandblastingInput {
    const PHASE: Phase = Phase::Sandblasting;
    const PRIMARY_QUANTITY: &'static str = "sand used (kg)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let sand_kg = ensure_non_negative("sand_kg", self.sand_kg)?;
        // Factor is applied as grams PM per kg sand.
        let pm = catalog.sandblasting_pm(self.wind_speed, self.surface)?;
        let mut result = PhaseEmissionResult::new(Self::PHASE);
        result.insert(Pollutant::Pm, Grams(pm * sand_kg));
        Ok(result)
    }

    fn primary_quantity(&self) -> f64 {
        self.sand_kg
    }

    fn with_primary_quantity(&self, value: f64) -> Self {
        SandblastingInput {
            sand_kg: value,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShopTestEngineInput {
    pub main_engines: u32,
    pub main_power_kw: f64,
    pub aux_engines: u32,
    pub aux_power_kw: f64,
}

impl ShopTestEngineInput {
    /// Fuel burned on the test bed, (main, aux) in kg.
    pub fn fuel_kg(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<(f64, f64)> {
        let main_kw = ensure_non_negative("main_power_kw", self.main_power_kw)?;
        let aux_kw = ensure_non_negative("aux_power_kw", self.aux_power_kw)?;
        let f = catalog.shop_test();
        Ok((
            f64::from(self.main_engines) * main_kw * f.main_fuel_kg_per_kw,
            f64::from(self.aux_engines) * aux_kw * f.aux_fuel_kg_per_kw,
        ))
    }

    /// Total rated power on the test bed, main plus auxiliary.
    pub fn installed_kw(&self) -> f64 {
        f64::from(self.main_engines) * self.main_power_kw
            + f64::from(self.aux_engines) * self.aux_power_kw
    }
}

impl PhaseCalculator for ShopTestEngineInput {
    const PHASE: Phase = Phase::ShopTestEngine;
    const PRIMARY_QUANTITY: &'static str = "installed test power (kW)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let (fuel_main, fuel_aux) = self.fuel_kg(catalog)?;
        let f = catalog.shop_test();
        let mut result = PhaseEmissionResult::new(Self::PHASE);
        let gases = f
            .main_engine_g_per_kg_fuel
            .keys()
            .chain(f.aux_engine_g_per_kg_fuel.keys());
        for gas in gases {
            let main = f.main_engine_g_per_kg_fuel.get(gas).copied().unwrap_or(0.0);
            let aux = f.aux_engine_g_per_kg_fuel.get(gas).copied().unwrap_or(0.0);
            result.insert(*gas, Grams(main * fuel_main + aux * fuel_aux));
        }
        Ok(result)
    }

    fn primary_quantity(&self) -> f64 {
        self.installed_kw()
    }

    /// Scales main and auxiliary ratings together so the mix is kept.
    fn with_primary_quantity(&self, value: f64) -> Self {
        let installed = self.installed_kw();
        if installed <= 0.0 || !installed.is_finite() {
            return *self;
        }
        let k = value / installed;
        ShopTestEngineInput {
            main_power_kw: self.main_power_kw * k,
            aux_power_kw: self.aux_power_kw * k,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConstructionInput {
    pub power_kw: f64,
}

impl PhaseCalculator for EngineConstructionInput {
    const PHASE: Phase = Phase::EngineConstruction;
    const PRIMARY_QUANTITY: &'static str = "engine power (kW)";

    fn compute(&self, catalog: &EmissionFactorCatalog) -> EmissionsResult<PhaseEmissionResult> {
        let power_kw = ensure_non_negative("power_kw", self.power_kw)?;
        Ok(scale(Self::PHASE, catalog.engine_construction(), power_kw))
    }

    fn primary_quantity(&self) -> f64 {
        self.power_kw
    }

    fn with_primary_quantity(&self, value: f64) -> Self {
        EngineConstructionInput { power_kw: value }
    }
}
