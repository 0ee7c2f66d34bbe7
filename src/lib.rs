#![forbid(unsafe_code)]

//! Air-pollutant emission estimates for the phases of steel shipbuilding.
//!
//! Phase inputs (mass, duration, power, area) are mapped through the
//! emission factor catalog into grams per pollutant, then summed into
//! session totals.

pub mod accumulator;
pub mod catalog;
pub mod error;
pub mod phases;
pub mod pollutant;
pub mod scenario;
pub mod selectors;
pub mod sensitivity;
pub mod units;

pub use accumulator::CombinedTotals;
pub use catalog::{EmissionFactorCatalog, FactorSet, Selector};
pub use error::{EmissionsError, EmissionsResult};
pub use phases::{
    CoatingInput, EngineConstructionInput, PhaseCalculator, PlasmaCuttingInput, ProductionInput,
    SandblastingInput, ShopTestEngineInput, WeldingInput,
};
pub use pollutant::{Grams, PhaseEmissionResult, Pollutant};
pub use scenario::{
    CoatingEntry, EmissionReport, PhaseEntry, PhaseOutcome, PlasmaCuttingEntry, SandblastingEntry,
    Scenario, ShopTestEngineEntry, WeldingEntry,
};
pub use selectors::{
    CoatingMethod, CutStyle, Electrode, Phase, PlasmaGas, SurfaceType, Thickness, WeldingMethod,
    WindSpeed,
};
pub use sensitivity::{analyze, sensitivity, SensitivityOutcome, SensitivityReport, SensitivityRow};
pub use units::{AreaUnit, SurfaceArea};
