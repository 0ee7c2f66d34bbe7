//! A full seven-phase input set and the report driver that runs it.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accumulator::CombinedTotals;
use crate::catalog::EmissionFactorCatalog;
use crate::error::{EmissionsError, EmissionsResult};
use crate::phases::{
    CoatingInput, EngineConstructionInput, PhaseCalculator, PlasmaCuttingInput, ProductionInput,
    SandblastingInput, ShopTestEngineInput, WeldingInput,
};
use crate::pollutant::{Grams, PhaseEmissionResult, Pollutant};
use crate::selectors::Phase;
use crate::sensitivity::{analyze, SensitivityOutcome};

/// Inputs for every phase of one ship. Missing tables take the
/// "not yet entered" defaults and contribute zero.
///
/// Selector labels and engine counts are kept as written and only
/// resolved when their phase runs, so a bad value fails that phase alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub production: ProductionInput,
    pub welding: WeldingEntry,
    pub plasma_cutting: PlasmaCuttingEntry,
    pub coating: CoatingEntry,
    pub sandblasting: SandblastingEntry,
    pub shop_test_engine: ShopTestEngineEntry,
    pub engine_construction: EngineConstructionInput,
}

/// One phase table of a scenario file, turned into a typed input on demand.
pub trait PhaseEntry {
    type Input: PhaseCalculator;

    fn resolve(&self) -> EmissionsResult<Self::Input>;
}

impl PhaseEntry for ProductionInput {
    type Input = ProductionInput;

    fn resolve(&self) -> EmissionsResult<ProductionInput> {
        Ok(*self)
    }
}

impl PhaseEntry for EngineConstructionInput {
    type Input = EngineConstructionInput;

    fn resolve(&self) -> EmissionsResult<EngineConstructionInput> {
        Ok(*self)
    }
}

/// Absent labels fall back to the selector's default.
fn label<T>(raw: &Option<String>) -> EmissionsResult<T>
where
    T: FromStr<Err = EmissionsError> + Default,
{
    raw.as_deref().map_or_else(|| Ok(T::default()), |s| s.parse())
}

fn engine_count(field: &'static str, count: i64) -> EmissionsResult<u32> {
    u32::try_from(count).map_err(|_| EmissionsError::InvalidInput {
        field,
        value: count as f64,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeldingEntry {
    pub method: Option<String>,
    pub electrode: Option<String>,
    pub electrode_kg: f64,
}

impl PhaseEntry for WeldingEntry {
    type Input = WeldingInput;

    fn resolve(&self) -> EmissionsResult<WeldingInput> {
        Ok(WeldingInput {
            method: label(&self.method)?,
            electrode: label(&self.electrode)?,
            electrode_kg: self.electrode_kg,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlasmaCuttingEntry {
    pub gas: Option<String>,
    pub style: Option<String>,
    pub thickness: Option<String>,
    pub duration_min: f64,
}

impl PhaseEntry for PlasmaCuttingEntry {
    type Input = PlasmaCuttingInput;

    fn resolve(&self) -> EmissionsResult<PlasmaCuttingInput> {
        Ok(PlasmaCuttingInput {
            gas: label(&self.gas)?,
            style: label(&self.style)?,
            thickness: label(&self.thickness)?,
            duration_min: self.duration_min,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoatingEntry {
    pub method: Option<String>,
    pub area: f64,
    pub unit: Option<String>,
}

impl PhaseEntry for CoatingEntry {
    type Input = CoatingInput;

    fn resolve(&self) -> EmissionsResult<CoatingInput> {
        Ok(CoatingInput {
            method: label(&self.method)?,
            area: self.area,
            unit: label(&self.unit)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandblastingEntry {
    pub wind_speed: Option<String>,
    pub surface: Option<String>,
    pub sand_kg: f64,
}

impl PhaseEntry for SandblastingEntry {
    type Input = SandblastingInput;

    fn resolve(&self) -> EmissionsResult<SandblastingInput> {
        Ok(SandblastingInput {
            wind_speed: label(&self.wind_speed)?,
            surface: label(&self.surface)?,
            sand_kg: self.sand_kg,
        })
    }
}

/// Counts are signed here so a negative count is reported per phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShopTestEngineEntry {
    pub main_engines: i64,
    pub main_power_kw: f64,
    pub aux_engines: i64,
    pub aux_power_kw: f64,
}

impl PhaseEntry for ShopTestEngineEntry {
    type Input = ShopTestEngineInput;

    fn resolve(&self) -> EmissionsResult<ShopTestEngineInput> {
        Ok(ShopTestEngineInput {
            main_engines: engine_count("main_engines", self.main_engines)?,
            main_power_kw: self.main_power_kw,
            aux_engines: engine_count("aux_engines", self.aux_engines)?,
            aux_power_kw: self.aux_power_kw,
        })
    }
}

fn run<E: PhaseEntry>(
    entry: &E,
    catalog: &EmissionFactorCatalog,
) -> EmissionsResult<PhaseEmissionResult> {
    entry.resolve()?.compute(catalog)
}

fn perturb<E: PhaseEntry>(
    entry: &E,
    catalog: &EmissionFactorCatalog,
    delta_percent: f64,
) -> EmissionsResult<SensitivityOutcome> {
    analyze(&entry.resolve()?, catalog, delta_percent)
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> EmissionsResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> EmissionsResult<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn compute_phase(
        &self,
        phase: Phase,
        catalog: &EmissionFactorCatalog,
    ) -> EmissionsResult<PhaseEmissionResult> {
        match phase {
            Phase::Production => run(&self.production, catalog),
            Phase::Welding => run(&self.welding, catalog),
            Phase::PlasmaCutting => run(&self.plasma_cutting, catalog),
            Phase::Coating => run(&self.coating, catalog),
            Phase::Sandblasting => run(&self.sandblasting, catalog),
            Phase::ShopTestEngine => run(&self.shop_test_engine, catalog),
            Phase::EngineConstruction => run(&self.engine_construction, catalog),
        }
    }

    /// Perturb the phase's primary quantity by `delta_percent`.
    pub fn sensitivity(
        &self,
        phase: Phase,
        catalog: &EmissionFactorCatalog,
        delta_percent: f64,
    ) -> EmissionsResult<SensitivityOutcome> {
        match phase {
            Phase::Production => perturb(&self.production, catalog, delta_percent),
            Phase::Welding => perturb(&self.welding, catalog, delta_percent),
            Phase::PlasmaCutting => perturb(&self.plasma_cutting, catalog, delta_percent),
            Phase::Coating => perturb(&self.coating, catalog, delta_percent),
            Phase::Sandblasting => perturb(&self.sandblasting, catalog, delta_percent),
            Phase::ShopTestEngine => perturb(&self.shop_test_engine, catalog, delta_percent),
            Phase::EngineConstruction => {
                perturb(&self.engine_construction, catalog, delta_percent)
            }
        }
    }
}

/// Name of the scalar a phase's sensitivity analysis perturbs.
pub fn primary_quantity(phase: Phase) -> &'static str {
    match phase {
        Phase::Production => ProductionInput::PRIMARY_QUANTITY,
        Phase::Welding => WeldingInput::PRIMARY_QUANTITY,
        Phase::PlasmaCutting => PlasmaCuttingInput::PRIMARY_QUANTITY,
        Phase::Coating => CoatingInput::PRIMARY_QUANTITY,
        Phase::Sandblasting => SandblastingInput::PRIMARY_QUANTITY,
        Phase::ShopTestEngine => ShopTestEngineInput::PRIMARY_QUANTITY,
        Phase::EngineConstruction => EngineConstructionInput::PRIMARY_QUANTITY,
    }
}

/// Outcome of one phase inside a report: emissions or the rejection reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseOutcome {
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emissions: Option<BTreeMap<Pollutant, Grams>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-phase results plus combined totals for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionReport {
    pub phases: Vec<PhaseOutcome>,
    pub totals: CombinedTotals,
    pub co2_metric_tons: f64,
}

impl EmissionReport {
    /// Run every phase independently; a rejected phase is recorded and
    /// left out of the totals without affecting the others.
    pub fn compute(scenario: &Scenario, catalog: &EmissionFactorCatalog) -> Self {
        let mut totals = CombinedTotals::new_session();
        let mut phases = Vec::with_capacity(Phase::ALL.len());

        for phase in Phase::ALL {
            match scenario.compute_phase(phase, catalog) {
                Ok(result) => {
                    totals.add(&result);
                    phases.push(PhaseOutcome {
                        phase,
                        emissions: Some(result.emissions),
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(phase = %phase, error = %e, "phase rejected");
                    phases.push(PhaseOutcome {
                        phase,
                        emissions: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let co2_metric_tons = totals.co2_metric_tons();
        info!(
            failed = phases.iter().filter(|p| !p.is_ok()).count(),
            co2_t = co2_metric_tons,
            "emission report complete"
        );
        EmissionReport {
            phases,
            totals,
            co2_metric_tons,
        }
    }

    pub fn phase(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PhaseOutcome> {
        self.phases.iter().filter(|p| !p.is_ok())
    }
}
