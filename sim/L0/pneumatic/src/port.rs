//! Valve ports connecting a chamber to the outside.

use std::collections::BTreeMap;
use std::fmt;

use sim_thermo::Orifice;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the two cylinder chambers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Chamber {
    /// Full-bore side, pushes the piston out.
    Head,
    /// Annulus side around the rod, pulls the piston in.
    Rod,
}

impl Chamber {
    /// The other chamber.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Head => Self::Rod,
            Self::Rod => Self::Head,
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Head => "head",
            Self::Rod => "rod",
        })
    }
}

/// What the far side of a port is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PortTarget {
    /// Ambient air, an infinite source and sink.
    Atmosphere,
    /// The cylinder's supply reservoir.
    Reservoir,
    /// The other chamber of the same cylinder.
    Chamber(Chamber),
}

/// Which way a port lets gas through, seen from its chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PortDirection {
    /// Only into the chamber (check valve from the target).
    Inlet,
    /// Only out of the chamber (check valve toward the target).
    Exhaust,
    /// Either way, following the pressure gradient.
    #[default]
    Bidirectional,
}

impl PortDirection {
    /// Apply the check-valve restriction to a signed rate (positive = into
    /// the chamber).
    #[must_use]
    pub fn restrict(self, rate: f64) -> f64 {
        match self {
            Self::Inlet => rate.max(0.0),
            Self::Exhaust => rate.min(0.0),
            Self::Bidirectional => rate,
        }
    }
}

/// A named valve between a chamber and a target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValvePort {
    /// Port name, addressed by valve-state updates.
    pub name: String,
    /// Chamber on the near side.
    pub chamber: Chamber,
    /// What the far side connects to.
    pub target: PortTarget,
    /// Flow restriction.
    pub orifice: Orifice,
    /// Allowed flow direction.
    pub direction: PortDirection,
}

impl ValvePort {
    /// Create a bidirectional port.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        chamber: Chamber,
        target: PortTarget,
        orifice: Orifice,
    ) -> Self {
        Self {
            name: name.into(),
            chamber,
            target,
            orifice,
            direction: PortDirection::Bidirectional,
        }
    }

    /// Exhaust from a chamber to atmosphere.
    #[must_use]
    pub fn exhaust(name: impl Into<String>, chamber: Chamber, orifice: Orifice) -> Self {
        Self::new(name, chamber, PortTarget::Atmosphere, orifice)
            .with_direction(PortDirection::Exhaust)
    }

    /// Supply from the reservoir into a chamber.
    #[must_use]
    pub fn supply(name: impl Into<String>, chamber: Chamber, orifice: Orifice) -> Self {
        Self::new(name, chamber, PortTarget::Reservoir, orifice)
            .with_direction(PortDirection::Inlet)
    }

    /// Crossover between the head and rod chambers.
    #[must_use]
    pub fn crossover(name: impl Into<String>, orifice: Orifice) -> Self {
        Self::new(name, Chamber::Head, PortTarget::Chamber(Chamber::Rod), orifice)
    }

    /// Set the allowed flow direction.
    #[must_use]
    pub fn with_direction(mut self, direction: PortDirection) -> Self {
        self.direction = direction;
        self
    }
}

/// Open/closed state per port name. Ports not listed are closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValveStates {
    open: BTreeMap<String, bool>,
}

impl ValveStates {
    /// All valves closed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one valve.
    #[must_use]
    pub fn with(mut self, port: impl Into<String>, open: bool) -> Self {
        self.set(port, open);
        self
    }

    /// Set one valve in place.
    pub fn set(&mut self, port: impl Into<String>, open: bool) {
        self.open.insert(port.into(), open);
    }

    /// Whether the named valve is open.
    #[must_use]
    pub fn is_open(&self, port: &str) -> bool {
        self.open.get(port).copied().unwrap_or(false)
    }

    /// Names and states of every listed valve.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.open.iter().map(|(name, open)| (name.as_str(), *open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_restricts_sign() {
        assert_eq!(PortDirection::Inlet.restrict(-1.0), 0.0);
        assert_eq!(PortDirection::Inlet.restrict(2.0), 2.0);
        assert_eq!(PortDirection::Exhaust.restrict(2.0), 0.0);
        assert_eq!(PortDirection::Exhaust.restrict(-1.0), -1.0);
        assert_eq!(PortDirection::Bidirectional.restrict(-1.0), -1.0);
    }

    #[test]
    fn test_port_presets() {
        let port = ValvePort::exhaust("vent", Chamber::Head, Orifice::default());
        assert_eq!(port.target, PortTarget::Atmosphere);
        assert_eq!(port.direction, PortDirection::Exhaust);

        let port = ValvePort::supply("fill", Chamber::Rod, Orifice::default());
        assert_eq!(port.target, PortTarget::Reservoir);
        assert_eq!(port.direction, PortDirection::Inlet);

        let port = ValvePort::crossover("bypass", Orifice::default());
        assert_eq!(port.target, PortTarget::Chamber(Chamber::Rod));
        assert_eq!(Chamber::Head.opposite(), Chamber::Rod);
    }

    #[test]
    fn test_unlisted_valves_are_closed() {
        let valves = ValveStates::new().with("fill", true).with("vent", false);
        assert!(valves.is_open("fill"));
        assert!(!valves.is_open("vent"));
        assert!(!valves.is_open("bypass"));
        assert_eq!(valves.iter().count(), 2);
    }
}
