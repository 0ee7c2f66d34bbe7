use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pollutant::{Grams, PhaseEmissionResult, Pollutant};

/// Running per-pollutant total for one calculation session.
///
/// Starts at zero for every pollutant and only ever grows by summation.
/// Adding the same phase twice double-counts it; callers add each phase once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinedTotals {
    totals: BTreeMap<Pollutant, Grams>,
}

impl CombinedTotals {
    pub fn new_session() -> Self {
        CombinedTotals {
            totals: Pollutant::ALL.into_iter().map(|p| (p, Grams::ZERO)).collect(),
        }
    }

    /// Sum a phase result into the totals. Pollutants the phase did not
    /// emit are left untouched.
    pub fn add(&mut self, result: &PhaseEmissionResult) {
        for (pollutant, grams) in result.iter() {
            *self.totals.entry(pollutant).or_insert(Grams::ZERO) += grams;
        }
        debug!(
            phase = %result.phase,
            pollutants = result.len(),
            "accumulated phase emissions"
        );
    }

    /// Value-style variant of [`CombinedTotals::add`].
    pub fn with(mut self, result: &PhaseEmissionResult) -> Self {
        self.add(result);
        self
    }

    pub fn get(&self, pollutant: Pollutant) -> Grams {
        self.totals.get(&pollutant).copied().unwrap_or(Grams::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, Grams)> + '_ {
        self.totals.iter().map(|(p, g)| (*p, *g))
    }

    pub fn co2_metric_tons(&self) -> f64 {
        self.get(Pollutant::Co2).to_metric_tons()
    }
}

impl Default for CombinedTotals {
    fn default() -> Self {
        Self::new_session()
    }
}

impl<'a> FromIterator<&'a PhaseEmissionResult> for CombinedTotals {
    fn from_iter<I: IntoIterator<Item = &'a PhaseEmissionResult>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new_session(), CombinedTotals::with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::Phase;

    fn result(phase: Phase, rows: &[(Pollutant, f64)]) -> PhaseEmissionResult {
        let mut r = PhaseEmissionResult::new(phase);
        for (p, g) in rows {
            r.insert(*p, Grams(*g));
        }
        r
    }

    #[test]
    fn new_session_is_zero_for_every_pollutant() {
        let t = CombinedTotals::new_session();
        assert_eq!(t.iter().count(), 8);
        assert!(t.iter().all(|(_, g)| g == Grams::ZERO));
    }

    #[test]
    fn add_sums_matching_keys_only() {
        let mut t = CombinedTotals::new_session();
        t.add(&result(Phase::Welding, &[(Pollutant::Pm, 184.0)]));
        t.add(&result(
            Phase::PlasmaCutting,
            &[(Pollutant::Pm, 115.0), (Pollutant::Nox, 33.0)],
        ));
        assert_eq!(t.get(Pollutant::Pm), Grams(299.0));
        assert_eq!(t.get(Pollutant::Nox), Grams(33.0));
        assert_eq!(t.get(Pollutant::Co2), Grams::ZERO);
    }

    #[test]
    fn adding_twice_double_counts() {
        let r = result(Phase::Sandblasting, &[(Pollutant::Pm, 10.0)]);
        let t = CombinedTotals::new_session().with(&r).with(&r);
        assert_eq!(t.get(Pollutant::Pm), Grams(20.0));
    }

    #[test]
    fn order_does_not_change_totals() {
        let a = result(Phase::Coating, &[(Pollutant::Voc, 1250.0)]);
        let b = result(Phase::Welding, &[(Pollutant::Pm, 184.0)]);
        let c = result(Phase::Production, &[(Pollutant::Co2, 996.0), (Pollutant::Voc, 0.5)]);
        let forward: CombinedTotals = [&a, &b, &c].into_iter().collect();
        let backward: CombinedTotals = [&c, &b, &a].into_iter().collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn co2_in_metric_tons() {
        let t = CombinedTotals::new_session()
            .with(&result(Phase::ShopTestEngine, &[(Pollutant::Co2, 2_500_000.0)]));
        assert!((t.co2_metric_tons() - 2.5).abs() < 1e-12);
    }
}
