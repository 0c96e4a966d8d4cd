//! Gas mixture composition.

use std::fmt;

use crate::error::{GasError, GasResult};
use crate::species::{Element, Species};
use sf_core::numeric::{Tolerances, nearly_equal};

/// Allowed deviation of a caller-supplied fraction sum from one in
/// [`Composition::exact_mole_fractions`].
pub const FRACTION_SUM_TOL: f64 = 1e-6;

/// Mixture composition stored as dense, normalized mole fractions.
///
/// There is one slot per [`Species`]; species that are not present hold
/// exactly zero. The fractions always sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    x: [f64; Species::COUNT],
}

fn accumulate(
    fractions: &[(Species, f64)],
    what: &'static str,
) -> GasResult<[f64; Species::COUNT]> {
    if fractions.is_empty() {
        return Err(GasError::InvalidComposition {
            what: "empty composition",
        });
    }
    let mut raw = [0.0; Species::COUNT];
    for (species, frac) in fractions {
        if !frac.is_finite() {
            return Err(GasError::InvalidComposition { what });
        }
        if *frac < 0.0 {
            return Err(GasError::InvalidComposition {
                what: "negative fraction",
            });
        }
        raw[species.index()] += frac;
    }
    Ok(raw)
}

impl Composition {
    /// A single pure species.
    pub fn pure(species: Species) -> Self {
        let mut x = [0.0; Species::COUNT];
        x[species.index()] = 1.0;
        Self { x }
    }

    /// Create a composition from mole fractions (or mole numbers).
    ///
    /// Repeated species are summed; the result is normalized to sum=1.
    pub fn new_mole_fractions(fractions: Vec<(Species, f64)>) -> GasResult<Self> {
        let raw = accumulate(&fractions, "non-finite mole fraction")?;
        Self::from_moles(&raw)
    }

    /// Create a composition from mass fractions (or masses).
    pub fn new_mass_fractions(fractions: Vec<(Species, f64)>) -> GasResult<Self> {
        let mut raw = accumulate(&fractions, "non-finite mass fraction")?;
        for species in Species::ALL {
            raw[species.index()] /= species.molar_mass();
        }
        Self::from_moles(&raw)
    }

    /// Create a composition from mole fractions that must already sum to one.
    ///
    /// Fails with `InvalidComposition` if the sum is off by more than
    /// [`FRACTION_SUM_TOL`].
    pub fn exact_mole_fractions(fractions: Vec<(Species, f64)>) -> GasResult<Self> {
        let raw = accumulate(&fractions, "non-finite mole fraction")?;
        let sum: f64 = raw.iter().sum();
        if (sum - 1.0).abs() > FRACTION_SUM_TOL {
            return Err(GasError::InvalidComposition {
                what: "mole fractions do not sum to one",
            });
        }
        Self::from_moles(&raw)
    }

    /// Normalize a dense vector of mole numbers.
    pub fn from_moles(moles: &[f64; Species::COUNT]) -> GasResult<Self> {
        let mut sum = 0.0;
        for n in moles {
            if !n.is_finite() {
                return Err(GasError::InvalidComposition {
                    what: "non-finite mole number",
                });
            }
            if *n < 0.0 {
                return Err(GasError::InvalidComposition {
                    what: "negative mole number",
                });
            }
            sum += n;
        }
        if sum <= 0.0 || !sum.is_finite() {
            return Err(GasError::InvalidComposition {
                what: "mole numbers sum to zero or non-finite",
            });
        }
        let mut x = [0.0; Species::COUNT];
        for (xi, n) in x.iter_mut().zip(moles) {
            *xi = n / sum;
        }
        Ok(Self { x })
    }

    /// Parse `"CH4:1, H2O:2"` style text as mole fractions (normalized).
    pub fn parse_mole_fractions(text: &str) -> GasResult<Self> {
        let mut items = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = part.split_once(':').ok_or(GasError::InvalidArg {
                what: "composition entries must look like SPECIES:VALUE",
            })?;
            let species: Species = name.parse().map_err(|_| GasError::InvalidArg {
                what: "unknown species in composition text",
            })?;
            let value: f64 = value.trim().parse().map_err(|_| GasError::InvalidArg {
                what: "composition value is not a number",
            })?;
            items.push((species, value));
        }
        Self::new_mole_fractions(items)
    }

    /// Mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.x[species.index()]
    }

    /// Dense mole-fraction vector in [`Species::ALL`] order.
    pub fn mole_fractions(&self) -> &[f64; Species::COUNT] {
        &self.x
    }

    /// Dense mass-fraction vector in [`Species::ALL`] order.
    pub fn mass_fractions(&self) -> [f64; Species::COUNT] {
        let m_mix = self.molar_mass();
        let mut y = [0.0; Species::COUNT];
        for species in Species::ALL {
            let i = species.index();
            y[i] = self.x[i] * species.molar_mass() / m_mix;
        }
        y
    }

    pub fn mass_fraction(&self, species: Species) -> f64 {
        self.x[species.index()] * species.molar_mass() / self.molar_mass()
    }

    pub fn contains(&self, species: Species) -> bool {
        self.x[species.index()] > 0.0
    }

    /// Returns `Some(species)` if exactly one species has fraction ≈1.0.
    pub fn is_pure(&self) -> Option<Species> {
        let tol = Tolerances {
            abs: 1e-10,
            rel: 1e-10,
        };
        Species::ALL
            .into_iter()
            .find(|s| nearly_equal(self.x[s.index()], 1.0, tol))
    }

    /// Iterate over species with non-zero mole fractions.
    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        Species::ALL
            .into_iter()
            .map(|s| (s, self.x[s.index()]))
            .filter(|(_, x)| *x > 0.0)
    }

    /// Mixture molar mass [kg/kmol]: M_mix = Σ x_i M_i.
    pub fn molar_mass(&self) -> f64 {
        self.iter().map(|(s, x)| s.molar_mass() * x).sum()
    }

    /// Moles of each element per mole of mixture, indexed by [`Element::index`].
    pub fn element_moles(&self) -> [f64; Element::COUNT] {
        let mut b = [0.0; Element::COUNT];
        for (species, x) in self.iter() {
            for (element, n) in species.elements() {
                b[element.index()] += x * f64::from(*n);
            }
        }
        b
    }

    /// Oxygen atoms needed per mole of mixture to oxidise every fuel species.
    pub fn oxygen_demand(&self) -> f64 {
        self.iter().map(|(s, x)| x * s.oxygen_demand()).sum()
    }

    /// Blend several compositions weighted by molar amounts.
    pub fn blend_molar(parts: &[(&Composition, f64)]) -> GasResult<Self> {
        let mut moles = [0.0; Species::COUNT];
        for (comp, amount) in parts {
            if !amount.is_finite() || *amount < 0.0 {
                return Err(GasError::InvalidArg {
                    what: "blend amounts must be finite and non-negative",
                });
            }
            for (n, x) in moles.iter_mut().zip(comp.x.iter()) {
                *n += amount * x;
            }
        }
        Self::from_moles(&moles)
    }

    /// Blend several compositions weighted by mass.
    pub fn blend_mass(parts: &[(&Composition, f64)]) -> GasResult<Self> {
        let molar: Vec<(&Composition, f64)> = parts
            .iter()
            .map(|(c, mass)| (*c, mass / c.molar_mass()))
            .collect();
        Self::blend_molar(&molar)
    }

    /// Complete oxidation of H₂, CO and CH₄ using the O₂ already present.
    ///
    /// Products are H₂O and CO₂; inerts pass through. Fails when the mixture
    /// holds less O₂ than the fuel requires.
    pub fn oxidized(&self) -> GasResult<Self> {
        let o2_needed = 0.5 * self.oxygen_demand();
        let o2 = self.mole_fraction(Species::O2);
        if o2 < o2_needed * (1.0 - 1e-12) {
            return Err(GasError::InvalidComposition {
                what: "insufficient oxygen for complete oxidation",
            });
        }

        let mut n = self.x;
        let take = |n: &mut [f64; Species::COUNT], s: Species| std::mem::take(&mut n[s.index()]);
        let h2 = take(&mut n, Species::H2);
        let co = take(&mut n, Species::CO);
        let ch4 = take(&mut n, Species::CH4);
        n[Species::H2O.index()] += h2 + 2.0 * ch4;
        n[Species::CO2.index()] += co + ch4;
        n[Species::O2.index()] = (o2 - o2_needed).max(0.0);
        Self::from_moles(&n)
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (species, x) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}:{:.6}", species.key(), x)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerances {
        Tolerances {
            abs: 1e-12,
            rel: 1e-10,
        }
    }

    #[test]
    fn pure_composition() {
        let comp = Composition::pure(Species::O2);
        assert_eq!(comp.is_pure(), Some(Species::O2));
        assert_eq!(comp.mole_fraction(Species::O2), 1.0);
        assert_eq!(comp.mole_fraction(Species::N2), 0.0);
        assert_eq!(comp.mole_fractions().len(), Species::COUNT);
    }

    #[test]
    fn mixture_normalization_non_unit_sum() {
        let comp =
            Composition::new_mole_fractions(vec![(Species::O2, 2.0), (Species::N2, 8.0)]).unwrap();
        assert!(nearly_equal(comp.mole_fraction(Species::O2), 0.2, tol()));
        assert!(nearly_equal(comp.mole_fraction(Species::N2), 0.8, tol()));
        assert_eq!(comp.is_pure(), None);
    }

    #[test]
    fn repeated_species_are_summed() {
        let comp = Composition::new_mole_fractions(vec![
            (Species::H2, 1.0),
            (Species::H2, 1.0),
            (Species::H2O, 2.0),
        ])
        .unwrap();
        assert!(nearly_equal(comp.mole_fraction(Species::H2), 0.5, tol()));
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert!(Composition::new_mole_fractions(vec![]).is_err());
        assert!(
            Composition::new_mole_fractions(vec![(Species::O2, -0.5), (Species::N2, 1.5)])
                .is_err()
        );
        assert!(
            Composition::new_mole_fractions(vec![(Species::O2, 0.0), (Species::N2, 0.0)]).is_err()
        );
        assert!(Composition::new_mole_fractions(vec![(Species::O2, f64::NAN)]).is_err());
    }

    #[test]
    fn exact_fractions_reject_bad_sum() {
        let err = Composition::exact_mole_fractions(vec![(Species::O2, 0.21), (Species::N2, 0.78)])
            .unwrap_err();
        assert!(matches!(err, GasError::InvalidComposition { .. }));
        assert!(
            Composition::exact_mole_fractions(vec![(Species::O2, 0.21), (Species::N2, 0.79)])
                .is_ok()
        );
    }

    #[test]
    fn mass_and_mole_fraction_conversion() {
        // 0.1 kg CH4 + 0.2 kg H2O
        let comp =
            Composition::new_mass_fractions(vec![(Species::CH4, 0.1), (Species::H2O, 0.2)])
                .unwrap();
        let n_ch4 = 0.1 / Species::CH4.molar_mass();
        let n_h2o = 0.2 / Species::H2O.molar_mass();
        let x_ch4 = n_ch4 / (n_ch4 + n_h2o);
        assert!(nearly_equal(comp.mole_fraction(Species::CH4), x_ch4, tol()));
        assert!((x_ch4 - 0.3596).abs() < 1e-3);

        let y = comp.mass_fractions();
        assert!(nearly_equal(y[Species::CH4.index()], 1.0 / 3.0, tol()));
        assert!(nearly_equal(comp.mass_fraction(Species::H2O), 2.0 / 3.0, tol()));
    }

    #[test]
    fn element_moles_of_air() {
        let air =
            Composition::new_mole_fractions(vec![(Species::O2, 0.21), (Species::N2, 0.79)])
                .unwrap();
        let b = air.element_moles();
        assert!(nearly_equal(b[Element::O.index()], 0.42, tol()));
        assert!(nearly_equal(b[Element::N.index()], 1.58, tol()));
        assert_eq!(b[Element::C.index()], 0.0);
    }

    #[test]
    fn molar_blend() {
        let a = Composition::pure(Species::H2);
        let b = Composition::pure(Species::O2);
        let mix = Composition::blend_molar(&[(&a, 2.0), (&b, 1.0)]).unwrap();
        assert!(nearly_equal(mix.mole_fraction(Species::H2), 2.0 / 3.0, tol()));

        let mass_mix = Composition::blend_mass(&[(&a, 2.015_88), (&b, 31.998_8)]).unwrap();
        assert!(nearly_equal(mass_mix.mole_fraction(Species::H2), 0.5, tol()));
    }

    #[test]
    fn oxidation_conserves_atoms() {
        let fuel = Composition::new_mole_fractions(vec![
            (Species::CH4, 0.1),
            (Species::H2, 0.2),
            (Species::CO, 0.1),
            (Species::O2, 0.5),
            (Species::N2, 0.1),
        ])
        .unwrap();
        let burnt = fuel.oxidized().unwrap();
        assert_eq!(burnt.mole_fraction(Species::CH4), 0.0);
        assert_eq!(burnt.mole_fraction(Species::H2), 0.0);
        assert_eq!(burnt.mole_fraction(Species::CO), 0.0);

        // element ratios survive the change of total moles
        let b0 = fuel.element_moles();
        let b1 = burnt.element_moles();
        let ratio = b1[Element::N.index()] / b0[Element::N.index()];
        for e in [Element::C, Element::H, Element::O] {
            assert!(nearly_equal(b1[e.index()], b0[e.index()] * ratio, tol()));
        }
    }

    #[test]
    fn oxidation_needs_oxygen() {
        let fuel =
            Composition::new_mole_fractions(vec![(Species::H2, 0.9), (Species::O2, 0.1)]).unwrap();
        assert!(fuel.oxidized().is_err());
    }

    #[test]
    fn parse_and_display() {
        let comp = Composition::parse_mole_fractions("CH4:1, H2O:3").unwrap();
        assert!(nearly_equal(comp.mole_fraction(Species::H2O), 0.75, tol()));
        let text = comp.to_string();
        assert!(text.contains("H2O:0.750000"));
        assert!(Composition::parse_mole_fractions("CH4=1").is_err());
        assert!(Composition::parse_mole_fractions("XYZ:1").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_sum_is_one(fracs in prop::collection::vec(0.0_f64..1.0_f64, 1..8)) {
            let input: Vec<(Species, f64)> = fracs
                .iter()
                .enumerate()
                .map(|(i, &f)| (Species::ALL[i % Species::COUNT], f))
                .collect();

            if let Ok(comp) = Composition::new_mole_fractions(input) {
                let sum: f64 = comp.mole_fractions().iter().sum();
                let tol = Tolerances { abs: 1e-12, rel: 1e-12 };
                prop_assert!(nearly_equal(sum, 1.0, tol));
                let ysum: f64 = comp.mass_fractions().iter().sum();
                prop_assert!(nearly_equal(ysum, 1.0, tol));
            }
        }

        #[test]
        fn mass_round_trip(fracs in prop::collection::vec(0.01_f64..1.0_f64, Species::COUNT)) {
            let input: Vec<(Species, f64)> = Species::ALL.iter().copied().zip(fracs).collect();
            let comp = Composition::new_mole_fractions(input).unwrap();
            let y = comp.mass_fractions();
            let back = Composition::new_mass_fractions(
                Species::ALL.iter().copied().zip(y).collect(),
            )
            .unwrap();
            for s in Species::ALL {
                prop_assert!((back.mole_fraction(s) - comp.mole_fraction(s)).abs() < 1e-12);
            }
        }
    }
}
