//! One-at-a-time sensitivity: re-run a phase calculator at a perturbed
//! input and report the per-pollutant change.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::EmissionFactorCatalog;
use crate::error::{EmissionsError, EmissionsResult};
use crate::phases::PhaseCalculator;
use crate::pollutant::{Grams, PhaseEmissionResult, Pollutant};

/// Conventional slider range for `delta_percent`; not enforced.
pub const CONVENTIONAL_DELTA_RANGE: (f64, f64) = (-50.0, 50.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityRow {
    pub baseline: Grams,
    pub adjusted: Grams,
    pub delta: Grams,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub baseline_input: f64,
    pub adjusted_input: f64,
    pub delta_percent: f64,
    pub rows: BTreeMap<Pollutant, SensitivityRow>,
}

impl SensitivityReport {
    pub fn row(&self, pollutant: Pollutant) -> Option<&SensitivityRow> {
        self.rows.get(&pollutant)
    }
}

/// Result of a sensitivity request. A non-positive baseline has nothing to
/// perturb and is reported as unavailable rather than as an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SensitivityOutcome {
    Unavailable { baseline_input: f64 },
    Computed(SensitivityReport),
}

impl SensitivityOutcome {
    pub fn report(&self) -> Option<&SensitivityReport> {
        match self {
            SensitivityOutcome::Computed(r) => Some(r),
            SensitivityOutcome::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.report().is_some()
    }
}

/// Evaluate `compute` at `baseline_input` and at
/// `baseline_input * (1 + delta_percent / 100)`.
pub fn sensitivity<F>(
    baseline_input: f64,
    delta_percent: f64,
    mut compute: F,
) -> EmissionsResult<SensitivityOutcome>
where
    F: FnMut(f64) -> EmissionsResult<PhaseEmissionResult>,
{
    if !delta_percent.is_finite() {
        return Err(EmissionsError::InvalidInput {
            field: "delta_percent",
            value: delta_percent,
        });
    }
    if baseline_input.is_nan() || baseline_input <= 0.0 {
        return Ok(SensitivityOutcome::Unavailable { baseline_input });
    }

    let adjusted_input = baseline_input * (1.0 + delta_percent / 100.0);
    let baseline = compute(baseline_input)?;
    let adjusted = compute(adjusted_input)?;

    let rows = baseline
        .emissions
        .keys()
        .chain(adjusted.emissions.keys())
        .map(|p| {
            let b = baseline.get(*p);
            let a = adjusted.get(*p);
            (
                *p,
                SensitivityRow {
                    baseline: b,
                    adjusted: a,
                    delta: a - b,
                },
            )
        })
        .collect();

    Ok(SensitivityOutcome::Computed(SensitivityReport {
        baseline_input,
        adjusted_input,
        delta_percent,
        rows,
    }))
}

/// Perturb a phase input's primary quantity.
pub fn analyze<C: PhaseCalculator>(
    input: &C,
    catalog: &EmissionFactorCatalog,
    delta_percent: f64,
) -> EmissionsResult<SensitivityOutcome> {
    sensitivity(input.primary_quantity(), delta_percent, |value| {
        input.with_primary_quantity(value).compute(catalog)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::{
        CoatingInput, EngineConstructionInput, ProductionInput, ShopTestEngineInput,
    };
    use crate::selectors::CoatingMethod;
    use crate::units::AreaUnit;

    #[test]
    fn production_plus_fifty_percent() {
        let catalog = EmissionFactorCatalog::shared();
        let outcome = analyze(&ProductionInput { steel_kg: 1000.0 }, catalog, 50.0).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.adjusted_input, 1500.0);
        let co2 = report.row(Pollutant::Co2).unwrap();
        assert!((co2.baseline.0 - 996_000.0).abs() < 1e-6);
        assert!((co2.adjusted.0 - 1_494_000.0).abs() < 1e-6);
        assert!((co2.delta.0 - 498_000.0).abs() < 1e-6);
        assert_eq!(report.rows.len(), 8);
    }

    #[test]
    fn negative_delta_reduces_emissions() {
        let catalog = EmissionFactorCatalog::shared();
        let input = CoatingInput {
            method: CoatingMethod::ConveyorTwoCoatSpray,
            area: 200.0,
            unit: AreaUnit::SquareFeet,
        };
        let outcome = analyze(&input, catalog, -25.0).unwrap();
        let row = *outcome.report().unwrap().row(Pollutant::Voc).unwrap();
        assert!((row.baseline.0 - 5000.0).abs() < 1e-9);
        assert!((row.adjusted.0 - 3750.0).abs() < 1e-9);
        assert!((row.delta.0 + 1250.0).abs() < 1e-9);
    }

    #[test]
    fn coating_in_square_metres_is_perturbed_in_square_feet() {
        let catalog = EmissionFactorCatalog::shared();
        let input = CoatingInput {
            method: CoatingMethod::ConveyorSingleSpray,
            area: 100.0,
            unit: AreaUnit::SquareMetres,
        };
        let outcome = analyze(&input, catalog, 10.0).unwrap();
        let report = outcome.report().unwrap();
        assert!((report.baseline_input - 100.0 / 0.092903).abs() < 1e-9);
        let row = *report.row(Pollutant::Voc).unwrap();
        assert!((row.baseline.0 - 13_454.89).abs() < 0.01);
        assert!((row.delta.0 - 0.1 * row.baseline.0).abs() < 1e-6);
    }

    #[test]
    fn auxiliary_only_shop_test_is_available() {
        let catalog = EmissionFactorCatalog::shared();
        let input = ShopTestEngineInput {
            aux_engines: 2,
            aux_power_kw: 500.0,
            ..Default::default()
        };
        let outcome = analyze(&input, catalog, 20.0).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.baseline_input, 1000.0);
        let co2 = report.row(Pollutant::Co2).unwrap();
        assert!((co2.baseline.0 - 3206.0 * 350.0).abs() < 1e-6);
        assert!((co2.delta.0 - 0.2 * co2.baseline.0).abs() < 1e-6);
    }

    #[test]
    fn shop_test_rating_without_engines_is_unavailable() {
        let catalog = EmissionFactorCatalog::shared();
        let input = ShopTestEngineInput {
            main_engines: 0,
            main_power_kw: 9960.0,
            ..Default::default()
        };
        assert!(!analyze(&input, catalog, 20.0).unwrap().is_available());
    }

    #[test]
    fn zero_baseline_is_unavailable() {
        let catalog = EmissionFactorCatalog::shared();
        let outcome = analyze(&EngineConstructionInput::default(), catalog, 10.0).unwrap();
        assert_eq!(
            outcome,
            SensitivityOutcome::Unavailable {
                baseline_input: 0.0
            }
        );
        assert!(!outcome.is_available());
    }

    #[test]
    fn unbounded_delta_is_not_clamped() {
        let outcome = sensitivity(10.0, 400.0, |v| {
            let mut r = PhaseEmissionResult::new(crate::selectors::Phase::Sandblasting);
            r.insert(Pollutant::Pm, Grams(v));
            Ok(r)
        })
        .unwrap();
        assert_eq!(outcome.report().unwrap().adjusted_input, 50.0);
    }

    #[test]
    fn delta_below_minus_hundred_percent_is_invalid_input() {
        let catalog = EmissionFactorCatalog::shared();
        let err = analyze(&ProductionInput { steel_kg: 10.0 }, catalog, -150.0).unwrap_err();
        assert!(matches!(err, EmissionsError::InvalidInput { .. }));
    }

    #[test]
    fn non_finite_delta_is_rejected() {
        let catalog = EmissionFactorCatalog::shared();
        assert!(analyze(&ProductionInput { steel_kg: 10.0 }, catalog, f64::NAN).is_err());
    }

    #[test]
    fn unavailable_serializes_with_status_tag() {
        let json = serde_json::to_string(&SensitivityOutcome::Unavailable {
            baseline_input: 0.0,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"unavailable","baseline_input":0.0}"#);
    }
}
