//! Property-based tests for the emission pipeline.
//!
//! Covers: non-negativity, linearity in the primary quantity, order
//! independence of accumulation, sensitivity consistency.

use proptest::prelude::*;
use shipyard_emissions::{
    analyze, AreaUnit, CoatingInput, CoatingMethod, CombinedTotals, CutStyle, Electrode,
    EmissionFactorCatalog, EngineConstructionInput, PhaseCalculator, PhaseEmissionResult,
    PlasmaCuttingInput, PlasmaGas, Pollutant, ProductionInput, SandblastingInput,
    ShopTestEngineInput, SurfaceType, Thickness, WeldingInput, WeldingMethod, WindSpeed,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    /// Production emissions are factor x mass and never negative.
    #[test]
    fn production_is_linear(steel_kg in 0.0f64..1.0e8) {
        let catalog = EmissionFactorCatalog::shared();
        let r = ProductionInput { steel_kg }.compute(catalog).unwrap();
        for (pollutant, factor) in catalog.production() {
            let g = r.get(*pollutant).0;
            prop_assert!(g >= 0.0);
            prop_assert!(close(g, factor * steel_kg));
        }
    }

    /// Every plasma selector combination resolves for any duration.
    #[test]
    fn plasma_selectors_always_resolve(
        gas in prop::sample::select(PlasmaGas::ALL.to_vec()),
        style in prop::sample::select(CutStyle::ALL.to_vec()),
        thickness in prop::sample::select(Thickness::ALL.to_vec()),
        duration_min in 0.0f64..1.0e5,
    ) {
        let catalog = EmissionFactorCatalog::shared();
        let r = PlasmaCuttingInput { gas, style, thickness, duration_min }
            .compute(catalog)
            .unwrap();
        prop_assert_eq!(r.len(), 2);
        prop_assert!(r.get(Pollutant::Pm).0 >= 0.0);
        prop_assert!(r.get(Pollutant::Nox).0 >= 0.0);
    }

    /// Totals do not depend on the order phases are added in.
    #[test]
    fn accumulation_is_order_independent(
        steel_kg in 0.0f64..1.0e7,
        sand_kg in 0.0f64..1.0e5,
        power_kw in 0.0f64..5.0e4,
        main_engines in 0u32..4,
        aux_engines in 0u32..6,
        electrode_kg in 0.0f64..1.0e5,
        duration_min in 0.0f64..1.0e5,
        area in 0.0f64..1.0e6,
        rotate in 0usize..7,
    ) {
        let catalog = EmissionFactorCatalog::shared();
        let mut results: Vec<PhaseEmissionResult> = vec![
            ProductionInput { steel_kg }.compute(catalog).unwrap(),
            WeldingInput {
                method: WeldingMethod::Smaw,
                electrode: Electrode::E7018,
                electrode_kg,
            }
            .compute(catalog)
            .unwrap(),
            PlasmaCuttingInput {
                gas: PlasmaGas::Oxygen,
                style: CutStyle::Wet,
                thickness: Thickness::Stainless8mm,
                duration_min,
            }
            .compute(catalog)
            .unwrap(),
            CoatingInput {
                method: CoatingMethod::ConveyorTwoCoatSpray,
                area,
                unit: AreaUnit::SquareMetres,
            }
            .compute(catalog)
            .unwrap(),
            SandblastingInput {
                wind_speed: WindSpeed::Mph15,
                surface: SurfaceType::Oxidized,
                sand_kg,
            }
            .compute(catalog)
            .unwrap(),
            ShopTestEngineInput {
                main_engines,
                main_power_kw: power_kw,
                aux_engines,
                aux_power_kw: power_kw / 10.0,
            }
            .compute(catalog)
            .unwrap(),
            EngineConstructionInput { power_kw }.compute(catalog).unwrap(),
        ];
        let forward: CombinedTotals = results.iter().collect();
        results.rotate_left(rotate);
        results.reverse();
        prop_assert_eq!(results.len(), 7);
        let shuffled: CombinedTotals = results.iter().collect();
        for p in Pollutant::ALL {
            prop_assert!(close(forward.get(p).0, shuffled.get(p).0));
            let direct: f64 = results.iter().map(|r| r.get(p).0).sum();
            prop_assert!(close(forward.get(p).0, direct));
        }
    }

    /// adjusted = baseline x (1 + delta/100) and delta = adjusted - baseline.
    #[test]
    fn sensitivity_scales_linearly(
        power_kw in 1.0f64..1.0e5,
        delta in -50.0f64..50.0,
    ) {
        let catalog = EmissionFactorCatalog::shared();
        let outcome = analyze(&EngineConstructionInput { power_kw }, catalog, delta).unwrap();
        let report = outcome.report().unwrap();
        prop_assert!(close(report.adjusted_input, power_kw * (1.0 + delta / 100.0)));
        prop_assert_eq!(report.rows.len(), 7);
        for row in report.rows.values() {
            prop_assert!(close(row.adjusted.0, row.baseline.0 * (1.0 + delta / 100.0)));
            prop_assert!(close(row.delta.0, row.adjusted.0 - row.baseline.0));
        }
    }

    /// Negative quantities are rejected rather than clamped.
    #[test]
    fn negative_quantities_are_rejected(value in -1.0e6f64..-1.0e-9) {
        let catalog = EmissionFactorCatalog::shared();
        let production = ProductionInput { steel_kg: value }.compute(catalog);
        prop_assert!(production.is_err());
        let sandblasting = SandblastingInput { sand_kg: value, ..Default::default() }
            .compute(catalog);
        prop_assert!(sandblasting.is_err());
    }
}
