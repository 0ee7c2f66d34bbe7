use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::selectors::Phase;

/// Tracked gas and particulate species, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "CO2")]
    Co2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "CH4")]
    Ch4,
    #[serde(rename = "NOx")]
    Nox,
    #[serde(rename = "PM")]
    Pm,
    #[serde(rename = "SOx")]
    Sox,
    #[serde(rename = "VOC")]
    Voc,
    #[serde(rename = "NMVOC")]
    Nmvoc,
}

impl Pollutant {
    pub const ALL: [Pollutant; 8] = [
        Pollutant::Co2,
        Pollutant::Co,
        Pollutant::Ch4,
        Pollutant::Nox,
        Pollutant::Pm,
        Pollutant::Sox,
        Pollutant::Voc,
        Pollutant::Nmvoc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Pollutant::Co2 => "CO2",
            Pollutant::Co => "CO",
            Pollutant::Ch4 => "CH4",
            Pollutant::Nox => "NOx",
            Pollutant::Pm => "PM",
            Pollutant::Sox => "SOx",
            Pollutant::Voc => "VOC",
            Pollutant::Nmvoc => "NMVOC",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pollutant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pollutant::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown pollutant: {s}"))
    }
}

/// Emitted mass in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grams(pub f64);

impl Grams {
    pub const ZERO: Grams = Grams(0.0);

    /// Display conversion only; totals stay in grams.
    pub fn to_metric_tons(self) -> f64 {
        self.0 / 1.0e6
    }
}

impl Add for Grams {
    type Output = Grams;

    fn add(self, rhs: Grams) -> Grams {
        Grams(self.0 + rhs.0)
    }
}

impl AddAssign for Grams {
    fn add_assign(&mut self, rhs: Grams) {
        self.0 += rhs.0;
    }
}

impl Sub for Grams {
    type Output = Grams;

    fn sub(self, rhs: Grams) -> Grams {
        Grams(self.0 - rhs.0)
    }
}

/// Pollutant -> emitted grams for one phase invocation.
///
/// Keys are exactly the pollutants the phase's factor set covers, so a
/// zero input still yields a fully-keyed, all-zero result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseEmissionResult {
    pub phase: Phase,
    pub emissions: BTreeMap<Pollutant, Grams>,
}

impl PhaseEmissionResult {
    pub fn new(phase: Phase) -> Self {
        PhaseEmissionResult {
            phase,
            emissions: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, pollutant: Pollutant, grams: Grams) {
        self.emissions.insert(pollutant, grams);
    }

    /// Emitted grams, or zero when the phase does not produce the pollutant.
    pub fn get(&self, pollutant: Pollutant) -> Grams {
        self.emissions.get(&pollutant).copied().unwrap_or(Grams::ZERO)
    }

    pub fn contains(&self, pollutant: Pollutant) -> bool {
        self.emissions.contains_key(&pollutant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, Grams)> + '_ {
        self.emissions.iter().map(|(p, g)| (*p, *g))
    }

    pub fn len(&self) -> usize {
        self.emissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }
}
