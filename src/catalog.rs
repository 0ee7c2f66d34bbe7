//! Emission factor catalog.
//!
//! Tables are keyed by typed selector tuples and validated against the
//! closed selector domains when loaded, so a lookup with a valid selector
//! always resolves.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{EmissionsError, EmissionsResult};
use crate::pollutant::Pollutant;
use crate::selectors::{
    CoatingMethod, CutStyle, Electrode, Phase, PlasmaGas, SurfaceType, Thickness, WeldingMethod,
    WindSpeed,
};

/// Pollutant -> per-unit factor. The unit depends on the phase.
pub type FactorSet = BTreeMap<Pollutant, f64>;

/// Keyed selector for a catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    Production,
    Welding {
        method: WeldingMethod,
        electrode: Electrode,
    },
    PlasmaCutting {
        gas: PlasmaGas,
        style: CutStyle,
        thickness: Thickness,
    },
    Coating(CoatingMethod),
    Sandblasting {
        wind: WindSpeed,
        surface: SurfaceType,
    },
    ShopTestMainFuel,
    ShopTestAuxFuel,
    EngineConstruction,
}

impl Selector {
    pub fn phase(&self) -> Phase {
        match self {
            Selector::Production => Phase::Production,
            Selector::Welding { .. } => Phase::Welding,
            Selector::PlasmaCutting { .. } => Phase::PlasmaCutting,
            Selector::Coating(_) => Phase::Coating,
            Selector::Sandblasting { .. } => Phase::Sandblasting,
            Selector::ShopTestMainFuel | Selector::ShopTestAuxFuel => Phase::ShopTestEngine,
            Selector::EngineConstruction => Phase::EngineConstruction,
        }
    }
}

/// Plasma cutting fume and NOx rates, g/min.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmaFactors {
    pub pm_g_per_min: f64,
    pub nox_g_per_min: f64,
}

/// Shop test factor sets (g per kg fuel) and fuel burn per kW of rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopTestFactors {
    pub main_engine_g_per_kg_fuel: FactorSet,
    pub aux_engine_g_per_kg_fuel: FactorSet,
    pub main_fuel_kg_per_kw: f64,
    pub aux_fuel_kg_per_kw: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeldingFactor {
    pub method: WeldingMethod,
    pub electrode: Electrode,
    pub pm_g_per_kg_electrode: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlasmaFactor {
    pub gas: PlasmaGas,
    pub style: CutStyle,
    pub thickness: Thickness,
    #[serde(flatten)]
    pub factors: PlasmaFactors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoatingFactor {
    pub method: CoatingMethod,
    pub voc_g_per_ft2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandblastingFactor {
    pub wind_speed: WindSpeed,
    pub surface: SurfaceType,
    pub pm_g_per_kg_sand: f64,
}

/// On-disk form of the catalog: flat row lists, one table per phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub production_g_per_kg_steel: FactorSet,
    pub welding: Vec<WeldingFactor>,
    pub plasma_cutting: Vec<PlasmaFactor>,
    pub coating: Vec<CoatingFactor>,
    pub sandblasting: Vec<SandblastingFactor>,
    pub shop_test_engine: ShopTestFactors,
    pub engine_construction_g_per_kw: FactorSet,
}

/// Immutable, validated emission factor tables for all seven phases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile", into = "CatalogFile")]
pub struct EmissionFactorCatalog {
    production: FactorSet,
    welding: BTreeMap<(WeldingMethod, Electrode), f64>,
    plasma_cutting: BTreeMap<(PlasmaGas, CutStyle, Thickness), PlasmaFactors>,
    coating: BTreeMap<CoatingMethod, f64>,
    sandblasting: BTreeMap<(WindSpeed, SurfaceType), f64>,
    shop_test: ShopTestFactors,
    engine_construction: FactorSet,
}

static SHARED: OnceLock<EmissionFactorCatalog> = OnceLock::new();

impl EmissionFactorCatalog {
    /// Published factor tables shipped with the crate.
    pub fn builtin() -> Self {
        Self::assemble(builtin_file())
    }

    /// Process-wide built-in catalog, built on first use.
    pub fn shared() -> &'static EmissionFactorCatalog {
        SHARED.get_or_init(Self::builtin)
    }

    /// Load a catalog from JSON, validating every table.
    pub fn from_file(path: impl AsRef<Path>) -> EmissionsResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> EmissionsResult<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::try_from(file)
    }

    pub fn to_json(&self) -> EmissionsResult<String> {
        Ok(serde_json::to_string_pretty(&CatalogFile::from(self.clone()))?)
    }

    /// Factor set for a selector.
    ///
    /// Welding returns `{PM}`, plasma cutting `{PM, NOx}`, coating `{VOC}`
    /// and sandblasting `{PM}`; the remaining selectors return their full
    /// flat factor sets.
    pub fn lookup(&self, selector: Selector) -> EmissionsResult<FactorSet> {
        let set = match selector {
            Selector::Production => self.production.clone(),
            Selector::Welding { method, electrode } => {
                single(Pollutant::Pm, self.welding_pm(method, electrode)?)
            }
            Selector::PlasmaCutting {
                gas,
                style,
                thickness,
            } => {
                let f = self.plasma_cutting(gas, style, thickness)?;
                FactorSet::from([
                    (Pollutant::Pm, f.pm_g_per_min),
                    (Pollutant::Nox, f.nox_g_per_min),
                ])
            }
            Selector::Coating(method) => single(Pollutant::Voc, self.coating_voc(method)?),
            Selector::Sandblasting { wind, surface } => {
                single(Pollutant::Pm, self.sandblasting_pm(wind, surface)?)
            }
            Selector::ShopTestMainFuel => self.shop_test.main_engine_g_per_kg_fuel.clone(),
            Selector::ShopTestAuxFuel => self.shop_test.aux_engine_g_per_kg_fuel.clone(),
            Selector::EngineConstruction => self.engine_construction.clone(),
        };
        Ok(set)
    }

    /// g/kg steel.
    pub fn production(&self) -> &FactorSet {
        &self.production
    }

    /// g PM per kg electrode; the electrode must belong to the method's list.
    pub fn welding_pm(&self, method: WeldingMethod, electrode: Electrode) -> EmissionsResult<f64> {
        self.welding.get(&(method, electrode)).copied().ok_or_else(|| {
            EmissionsError::unknown_selector(
                Phase::Welding,
                format!("electrode {electrode} is not available for {method}"),
            )
        })
    }

    pub fn plasma_cutting(
        &self,
        gas: PlasmaGas,
        style: CutStyle,
        thickness: Thickness,
    ) -> EmissionsResult<PlasmaFactors> {
        self.plasma_cutting
            .get(&(gas, style, thickness))
            .copied()
            .ok_or_else(|| {
                EmissionsError::unknown_selector(
                    Phase::PlasmaCutting,
                    format!("{gas} / {style} / {thickness}"),
                )
            })
    }

    /// g VOC per ft².
    pub fn coating_voc(&self, method: CoatingMethod) -> EmissionsResult<f64> {
        self.coating
            .get(&method)
            .copied()
            .ok_or_else(|| EmissionsError::unknown_selector(Phase::Coating, method.label()))
    }

    /// g PM per kg sand.
    pub fn sandblasting_pm(&self, wind: WindSpeed, surface: SurfaceType) -> EmissionsResult<f64> {
        self.sandblasting
            .get(&(wind, surface))
            .copied()
            .ok_or_else(|| {
                EmissionsError::unknown_selector(Phase::Sandblasting, format!("{wind} / {surface}"))
            })
    }

    pub fn shop_test(&self) -> &ShopTestFactors {
        &self.shop_test
    }

    /// g/kW of engine rating.
    pub fn engine_construction(&self) -> &FactorSet {
        &self.engine_construction
    }

    fn assemble(file: CatalogFile) -> Self {
        EmissionFactorCatalog {
            production: file.production_g_per_kg_steel,
            welding: file
                .welding
                .into_iter()
                .map(|w| ((w.method, w.electrode), w.pm_g_per_kg_electrode))
                .collect(),
            plasma_cutting: file
                .plasma_cutting
                .into_iter()
                .map(|p| ((p.gas, p.style, p.thickness), p.factors))
                .collect(),
            coating: file
                .coating
                .into_iter()
                .map(|c| (c.method, c.voc_g_per_ft2))
                .collect(),
            sandblasting: file
                .sandblasting
                .into_iter()
                .map(|s| ((s.wind_speed, s.surface), s.pm_g_per_kg_sand))
                .collect(),
            shop_test: file.shop_test_engine,
            engine_construction: file.engine_construction_g_per_kw,
        }
    }
}

impl Default for EmissionFactorCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<CatalogFile> for EmissionFactorCatalog {
    type Error = EmissionsError;

    fn try_from(file: CatalogFile) -> Result<Self, Self::Error> {
        file.validate()?;
        Ok(Self::assemble(file))
    }
}

impl From<EmissionFactorCatalog> for CatalogFile {
    fn from(c: EmissionFactorCatalog) -> Self {
        CatalogFile {
            production_g_per_kg_steel: c.production,
            welding: c
                .welding
                .into_iter()
                .map(|((method, electrode), pm)| WeldingFactor {
                    method,
                    electrode,
                    pm_g_per_kg_electrode: pm,
                })
                .collect(),
            plasma_cutting: c
                .plasma_cutting
                .into_iter()
                .map(|((gas, style, thickness), factors)| PlasmaFactor {
                    gas,
                    style,
                    thickness,
                    factors,
                })
                .collect(),
            coating: c
                .coating
                .into_iter()
                .map(|(method, voc)| CoatingFactor {
                    method,
                    voc_g_per_ft2: voc,
                })
                .collect(),
            sandblasting: c
                .sandblasting
                .into_iter()
                .map(|((wind_speed, surface), pm)| SandblastingFactor {
                    wind_speed,
                    surface,
                    pm_g_per_kg_sand: pm,
                })
                .collect(),
            shop_test_engine: c.shop_test,
            engine_construction_g_per_kw: c.engine_construction,
        }
    }
}

impl CatalogFile {
    /// Check every table covers its closed selector domain exactly once
    /// with finite, non-negative factors.
    pub fn validate(&self) -> EmissionsResult<()> {
        check_factor_set("production", &self.production_g_per_kg_steel)?;
        check_factor_set("engine construction", &self.engine_construction_g_per_kw)?;
        check_factor_set("shop test main engine", &self.shop_test_engine.main_engine_g_per_kg_fuel)?;
        check_factor_set("shop test aux engine", &self.shop_test_engine.aux_engine_g_per_kg_fuel)?;
        check_factor("shop test main fuel rate", self.shop_test_engine.main_fuel_kg_per_kw)?;
        check_factor("shop test aux fuel rate", self.shop_test_engine.aux_fuel_kg_per_kw)?;

        let mut seen = BTreeSet::new();
        for w in &self.welding {
            if !w.method.accepts(w.electrode) {
                return Err(invalid(format!(
                    "welding electrode {} does not belong to {}",
                    w.electrode, w.method
                )));
            }
            check_factor("welding", w.pm_g_per_kg_electrode)?;
            if !seen.insert((w.method, w.electrode)) {
                return Err(invalid(format!("duplicate welding row {} / {}", w.method, w.electrode)));
            }
        }
        for method in WeldingMethod::ALL {
            for electrode in method.electrodes() {
                if !seen.contains(&(*method, *electrode)) {
                    return Err(invalid(format!("missing welding row {method} / {electrode}")));
                }
            }
        }

        let mut seen = BTreeSet::new();
        for p in &self.plasma_cutting {
            check_factor("plasma cutting PM", p.factors.pm_g_per_min)?;
            check_factor("plasma cutting NOx", p.factors.nox_g_per_min)?;
            if !seen.insert((p.gas, p.style, p.thickness)) {
                return Err(invalid(format!(
                    "duplicate plasma cutting row {} / {} / {}",
                    p.gas, p.style, p.thickness
                )));
            }
        }
        for gas in PlasmaGas::ALL {
            for style in CutStyle::ALL {
                for thickness in Thickness::ALL {
                    if !seen.contains(&(*gas, *style, *thickness)) {
                        return Err(invalid(format!(
                            "missing plasma cutting row {gas} / {style} / {thickness}"
                        )));
                    }
                }
            }
        }

        let mut seen = BTreeSet::new();
        for c in &self.coating {
            check_factor("coating", c.voc_g_per_ft2)?;
            if !seen.insert(c.method) {
                return Err(invalid(format!("duplicate coating row {}", c.method)));
            }
        }
        if let Some(missing) = CoatingMethod::ALL.iter().find(|m| !seen.contains(*m)) {
            return Err(invalid(format!("missing coating row {missing}")));
        }

        let mut seen = BTreeSet::new();
        for s in &self.sandblasting {
            check_factor("sandblasting", s.pm_g_per_kg_sand)?;
            if !seen.insert((s.wind_speed, s.surface)) {
                return Err(invalid(format!(
                    "duplicate sandblasting row {} / {}",
                    s.wind_speed, s.surface
                )));
            }
        }
        for wind in WindSpeed::ALL {
            for surface in SurfaceType::ALL {
                if !seen.contains(&(*wind, *surface)) {
                    return Err(invalid(format!("missing sandblasting row {wind} / {surface}")));
                }
            }
        }

        Ok(())
    }
}

fn single(pollutant: Pollutant, factor: f64) -> FactorSet {
    FactorSet::from([(pollutant, factor)])
}

fn invalid(msg: String) -> EmissionsError {
    EmissionsError::InvalidCatalog(msg)
}

fn check_factor(table: &str, value: f64) -> EmissionsResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{table} factor {value} must be finite and non-negative")))
    }
}

fn check_factor_set(table: &str, set: &FactorSet) -> EmissionsResult<()> {
    if set.is_empty() {
        return Err(invalid(format!("{table} factor set is empty")));
    }
    set.values().try_for_each(|v| check_factor(table, *v))
}

fn builtin_file() -> CatalogFile {
    use Pollutant::*;

    let welding = [
        (WeldingMethod::Fcaw, Electrode::E110, 20.8),
        (WeldingMethod::Fcaw, Electrode::E11018, 57.0),
        (WeldingMethod::Fcaw, Electrode::E308Lt, 9.1),
        (WeldingMethod::Fcaw, Electrode::E316Lt, 8.5),
        (WeldingMethod::Fcaw, Electrode::E70T, 15.1),
        (WeldingMethod::Fcaw, Electrode::E71T, 12.2),
        (WeldingMethod::Gmaw, Electrode::E308L, 5.4),
        (WeldingMethod::Gmaw, Electrode::E70S, 5.2),
        (WeldingMethod::Gmaw, Electrode::Er1260, 20.5),
        (WeldingMethod::Gmaw, Electrode::Er5154, 24.1),
        (WeldingMethod::Gmaw, Electrode::Er316, 3.2),
        (WeldingMethod::Gmaw, Electrode::ErNiCrMo, 3.9),
        (WeldingMethod::Gmaw, Electrode::ErNiCu, 2.0),
        (WeldingMethod::Saw, Electrode::Er316Er316L, 7.95),
        (WeldingMethod::Saw, Electrode::Er309Er309L, 17.62),
        (WeldingMethod::Saw, Electrode::Em12K, 0.05),
        (WeldingMethod::Smaw, Electrode::Mn14Cr4, 81.6),
        (WeldingMethod::Smaw, Electrode::E11018, 16.4),
        (WeldingMethod::Smaw, Electrode::E308, 10.8),
        (WeldingMethod::Smaw, Electrode::E310, 15.1),
        (WeldingMethod::Smaw, Electrode::E316, 10.0),
        (WeldingMethod::Smaw, Electrode::E410, 13.2),
        (WeldingMethod::Smaw, Electrode::E6010, 25.6),
        (WeldingMethod::Smaw, Electrode::E6011, 38.4),
        (WeldingMethod::Smaw, Electrode::E6012, 8.0),
        (WeldingMethod::Smaw, Electrode::E6013, 19.7),
        (WeldingMethod::Smaw, Electrode::E7018, 18.4),
        (WeldingMethod::Smaw, Electrode::E7024, 9.2),
        (WeldingMethod::Smaw, Electrode::E7028, 18.0),
        (WeldingMethod::Smaw, Electrode::E8018, 17.1),
        (WeldingMethod::Smaw, Electrode::E9015, 17.0),
        (WeldingMethod::Smaw, Electrode::E9018, 16.9),
        (WeldingMethod::Smaw, Electrode::ECoCr, 27.9),
        (WeldingMethod::Smaw, Electrode::ENiCl, 18.2),
        (WeldingMethod::Smaw, Electrode::ENiCrMo, 11.7),
        (WeldingMethod::Smaw, Electrode::ENiCu, 10.1),
    ];

    // (PM, NOx) g/min per thickness class, in Thickness::ALL order.
    let plasma: [(PlasmaGas, CutStyle, [(f64, f64); 3]); 9] = [
        (PlasmaGas::Air, CutStyle::Dry, [(23.0, 6.6), (35.0, 6.3), (2.6, 9.8)]),
        (PlasmaGas::Air, CutStyle::SemiDry, [(3.0, 3.7), (4.1, 3.3), (0.2, 5.2)]),
        (PlasmaGas::Air, CutStyle::Wet, [(0.25, 1.4), (0.35, 1.5), (0.02, 2.6)]),
        (PlasmaGas::Oxygen, CutStyle::Dry, [(17.25, 6.6), (26.25, 6.3), (1.95, 9.8)]),
        (PlasmaGas::Oxygen, CutStyle::SemiDry, [(2.25, 3.7), (3.075, 3.3), (0.15, 5.2)]),
        (PlasmaGas::Oxygen, CutStyle::Wet, [(0.1875, 1.4), (0.2625, 1.5), (0.015, 2.6)]),
        (PlasmaGas::Nitrogen, CutStyle::Dry, [(23.0, 5.28), (35.0, 5.04), (2.6, 7.84)]),
        (PlasmaGas::Nitrogen, CutStyle::SemiDry, [(3.0, 2.96), (4.1, 2.64), (0.2, 4.16)]),
        (PlasmaGas::Nitrogen, CutStyle::Wet, [(0.25, 1.12), (0.35, 1.2), (0.02, 2.08)]),
    ];

    let coating = [
        (CoatingMethod::ConveyorSingleFlow, 6.94),
        (CoatingMethod::ConveyorDip, 6.94),
        (CoatingMethod::ConveyorSingleSpray, 12.5),
        (CoatingMethod::ConveyorTwoCoatFlowSpray, 19.44),
        (CoatingMethod::ConveyorTwoCoatDipSpray, 19.44),
        (CoatingMethod::ConveyorTwoCoatSpray, 25.0),
        (CoatingMethod::ManualTwoCoatSprayAirDry, 24.94),
    ];

    // Precleaned, Painted, Oxidized.
    let sandblasting = [
        (WindSpeed::Mph5, [29.0, 27.0, 25.0]),
        (WindSpeed::Mph10, [68.0, 70.0, 26.0]),
        (WindSpeed::Mph15, [92.0, 91.0, 89.0]),
    ];

    CatalogFile {
        production_g_per_kg_steel: FactorSet::from([
            (Co2, 996.0),
            (Co, 31.83),
            (Ch4, 0.16317),
            (Nox, 5.84),
            (Pm, 0.92896),
            (Sox, 5.58372),
            (Voc, 0.01257),
            (Nmvoc, 0.01084),
        ]),
        welding: welding
            .into_iter()
            .map(|(method, electrode, pm)| WeldingFactor {
                method,
                electrode,
                pm_g_per_kg_electrode: pm,
            })
            .collect(),
        plasma_cutting: plasma
            .into_iter()
            .flat_map(|(gas, style, rows)| {
                Thickness::ALL
                    .iter()
                    .zip(rows)
                    .map(move |(thickness, (pm, nox))| PlasmaFactor {
                        gas,
                        style,
                        thickness: *thickness,
                        factors: PlasmaFactors {
                            pm_g_per_min: pm,
                            nox_g_per_min: nox,
                        },
                    })
            })
            .collect(),
        coating: coating
            .into_iter()
            .map(|(method, voc)| CoatingFactor {
                method,
                voc_g_per_ft2: voc,
            })
            .collect(),
        sandblasting: sandblasting
            .into_iter()
            .flat_map(|(wind_speed, row)| {
                SurfaceType::ALL
                    .iter()
                    .zip(row)
                    .map(move |(surface, pm)| SandblastingFactor {
                        wind_speed,
                        surface: *surface,
                        pm_g_per_kg_sand: pm,
                    })
            })
            .collect(),
        shop_test_engine: ShopTestFactors {
            main_engine_g_per_kg_fuel: FactorSet::from([
                (Co2, 3114.0),
                (Co, 2.77),
                (Ch4, 0.06),
                (Nox, 90.3),
                (Pm, 7.28),
                (Sox, 49.08),
                (Nmvoc, 3.08),
            ]),
            aux_engine_g_per_kg_fuel: FactorSet::from([
                (Co2, 3206.0),
                (Co, 3.84),
                (Ch4, 0.6),
                (Pm, 0.04),
                (Nmvoc, 1.75),
            ]),
            main_fuel_kg_per_kw: 1.886,
            aux_fuel_kg_per_kw: 0.35,
        },
        engine_construction_g_per_kw: FactorSet::from([
            (Co2, 84827.0),
            (Co, 183.0),
            (Ch4, 104.0),
            (Nox, 270.0),
            (Pm, 29.0),
            (Sox, 557.0),
            (Nmvoc, 18.0),
        ]),
    }
}
