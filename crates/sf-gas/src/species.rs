//! Chemical species and elements known to the gas model.

use std::fmt;

/// Chemical elements appearing in the species set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    C,
    H,
    O,
    N,
    Ar,
}

impl Element {
    pub const COUNT: usize = 5;
    pub const ALL: [Element; Element::COUNT] =
        [Element::C, Element::H, Element::O, Element::N, Element::Ar];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::C => "C",
            Element::H => "H",
            Element::O => "O",
            Element::N => "N",
            Element::Ar => "Ar",
        }
    }
}

/// Gas-phase species of a reformer / fuel-cell / combustion mixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Species {
    /// Hydrogen (H₂)
    H2,
    /// Oxygen (O₂)
    O2,
    /// Water vapour (H₂O)
    H2O,
    /// Carbon monoxide (CO)
    CO,
    /// Carbon dioxide (CO₂)
    CO2,
    /// Methane (CH₄)
    CH4,
    /// Nitrogen (N₂)
    N2,
    /// Argon (Ar)
    Ar,
}

impl Species {
    pub const COUNT: usize = 8;
    pub const ALL: [Species; Species::COUNT] = [
        Species::H2,
        Species::O2,
        Species::H2O,
        Species::CO,
        Species::CO2,
        Species::CH4,
        Species::N2,
        Species::Ar,
    ];

    /// Position of the species in dense composition vectors.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(&self) -> &'static str {
        match self {
            Species::H2 => "H2",
            Species::O2 => "O2",
            Species::H2O => "H2O",
            Species::CO => "CO",
            Species::CO2 => "CO2",
            Species::CH4 => "CH4",
            Species::N2 => "N2",
            Species::Ar => "Ar",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Species::H2 => "Hydrogen",
            Species::O2 => "Oxygen",
            Species::H2O => "Water",
            Species::CO => "Carbon monoxide",
            Species::CO2 => "Carbon dioxide",
            Species::CH4 => "Methane",
            Species::N2 => "Nitrogen",
            Species::Ar => "Argon",
        }
    }

    /// Molar mass [kg/kmol].
    pub fn molar_mass(&self) -> f64 {
        match self {
            Species::H2 => 2.015_88,
            Species::O2 => 31.998_8,
            Species::H2O => 18.015_28,
            Species::CO => 28.010_1,
            Species::CO2 => 44.009_5,
            Species::CH4 => 16.042_46,
            Species::N2 => 28.013_4,
            Species::Ar => 39.948,
        }
    }

    /// Atoms of each element per molecule.
    pub fn elements(&self) -> &'static [(Element, u8)] {
        match self {
            Species::H2 => &[(Element::H, 2)],
            Species::O2 => &[(Element::O, 2)],
            Species::H2O => &[(Element::H, 2), (Element::O, 1)],
            Species::CO => &[(Element::C, 1), (Element::O, 1)],
            Species::CO2 => &[(Element::C, 1), (Element::O, 2)],
            Species::CH4 => &[(Element::C, 1), (Element::H, 4)],
            Species::N2 => &[(Element::N, 2)],
            Species::Ar => &[(Element::Ar, 1)],
        }
    }

    /// Number of atoms of `element` in one molecule.
    pub fn atoms(&self, element: Element) -> f64 {
        self.elements()
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, n)| f64::from(*n))
            .unwrap_or(0.0)
    }

    /// Oxygen atoms needed to fully oxidise one molecule to CO₂ and H₂O.
    pub fn oxygen_demand(&self) -> f64 {
        match self {
            Species::H2 | Species::CO => 1.0,
            Species::CH4 => 4.0,
            _ => 0.0,
        }
    }

    /// Takes no part in any reaction modelled here.
    pub fn is_inert(&self) -> bool {
        matches!(self, Species::N2 | Species::Ar)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H2" | "HYDROGEN" => Ok(Species::H2),
            "O2" | "OXYGEN" => Ok(Species::O2),
            "H2O" | "WATER" | "STEAM" => Ok(Species::H2O),
            "CO" | "CARBONMONOXIDE" | "CARBON MONOXIDE" => Ok(Species::CO),
            "CO2" | "CARBONDIOXIDE" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "CH4" | "METHANE" => Ok(Species::CH4),
            "N2" | "NITROGEN" => Ok(Species::N2),
            "AR" | "ARGON" => Ok(Species::Ar),
            _ => Err("unknown species"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_all_order() {
        for (i, sp) in Species::ALL.iter().enumerate() {
            assert_eq!(sp.index(), i);
        }
        for (i, el) in Element::ALL.iter().enumerate() {
            assert_eq!(el.index(), i);
        }
    }

    #[test]
    fn parse_round_trip() {
        for sp in Species::ALL {
            let parsed: Species = sp.key().parse().unwrap();
            assert_eq!(parsed, sp);
        }
        assert_eq!("methane".parse::<Species>().unwrap(), Species::CH4);
        assert_eq!(" steam ".parse::<Species>().unwrap(), Species::H2O);
        assert!("C3H8".parse::<Species>().is_err());
    }

    #[test]
    fn molar_mass_consistent_with_atoms() {
        let atomic = |e: Element| match e {
            Element::C => 12.0107,
            Element::H => 1.00794,
            Element::O => 15.9994,
            Element::N => 14.0067,
            Element::Ar => 39.948,
        };
        for sp in Species::ALL {
            let from_atoms: f64 = sp
                .elements()
                .iter()
                .map(|(e, n)| atomic(*e) * f64::from(*n))
                .sum();
            assert!((from_atoms - sp.molar_mass()).abs() < 2e-3, "{sp}");
        }
    }

    #[test]
    fn oxygen_demand() {
        assert_eq!(Species::CH4.oxygen_demand(), 4.0);
        assert_eq!(Species::H2.oxygen_demand(), 1.0);
        assert_eq!(Species::N2.oxygen_demand(), 0.0);
        assert!(Species::Ar.is_inert());
        assert!(!Species::CO.is_inert());
    }
}
