//! Particle and event types for collision data.

use serde::{Deserialize, Serialize};

/// PDG Monte Carlo identity codes used by the analysis.
pub mod pid {
    /// Photon.
    pub const PHOTON: i32 = 22;
    /// Neutral pion.
    pub const PI0: i32 = 111;
    /// Positive pion.
    pub const PI_PLUS: i32 = 211;
    /// Positive kaon.
    pub const K_PLUS: i32 = 321;
    /// Proton.
    pub const PROTON: i32 = 2212;
    /// Neutron.
    pub const NEUTRON: i32 = 2112;
    /// Electron.
    pub const ELECTRON: i32 = 11;
}

/// A final-state particle.
///
/// Kinematics are stored in collider coordinates: transverse momentum in
/// GeV, pseudorapidity and azimuthal angle in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// PDG identity code.
    pub pid: i32,
    /// Transverse momentum (GeV).
    pub pt: f64,
    /// Pseudorapidity.
    pub eta: f64,
    /// Azimuthal angle (radians).
    pub phi: f64,
}

impl Particle {
    /// Creates a new particle.
    #[inline]
    #[must_use]
    pub fn new(pid: i32, pt: f64, eta: f64, phi: f64) -> Self {
        Self { pid, pt, eta, phi }
    }

    /// Returns the pseudorapidity magnitude.
    #[inline]
    #[must_use]
    pub fn abs_eta(&self) -> f64 {
        self.eta.abs()
    }

    /// Returns the electric charge in units of e/3.
    #[inline]
    #[must_use]
    pub fn three_charge(&self) -> i32 {
        three_charge(self.pid)
    }

    /// Returns true if the particle carries electric charge.
    #[inline]
    #[must_use]
    pub fn is_charged(&self) -> bool {
        self.three_charge() != 0
    }
}

/// A single collision event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Impact parameter of the collision (fm).
    #[serde(default)]
    pub impact_parameter: f64,
    /// Final-state particles.
    #[serde(default)]
    pub particles: Vec<Particle>,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(impact_parameter: f64, particles: Vec<Particle>) -> Self {
        Self {
            impact_parameter,
            particles,
        }
    }

    /// Returns the number of particles in the event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Returns true if the event has no particles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of charged final-state particles.
    #[must_use]
    pub fn charged_multiplicity(&self) -> usize {
        self.particles.iter().filter(|p| p.is_charged()).count()
    }
}

/// Quark charges (e/3) for d, u, s, c, b, t.
const QUARK_THREE_CHARGE: [i32; 6] = [-1, 2, -1, 2, -1, 2];

fn quark_three_charge(flavour: u32) -> Option<i32> {
    match flavour {
        1..=6 => Some(QUARK_THREE_CHARGE[(flavour - 1) as usize]),
        _ => None,
    }
}

fn fundamental_three_charge(apid: u32) -> i32 {
    match apid {
        1..=6 => QUARK_THREE_CHARGE[(apid - 1) as usize],
        7 => -1,
        8 => 2,
        11 | 13 | 15 | 17 => -3,
        24 | 34 | 37 => 3,
        _ => 0,
    }
}

/// Electric charge of a PDG code in units of e/3.
///
/// Handles fundamental particles, mesons, baryons and nuclear codes
/// (`10LZZZAAAI`). Unknown or exotic codes are treated as neutral.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn three_charge(pid: i32) -> i32 {
    let apid = pid.unsigned_abs();

    let charge = if apid >= 1_000_000_000 {
        3 * ((apid / 10_000) % 1000) as i32
    } else if apid < 100 {
        fundamental_three_charge(apid)
    } else {
        let nq3 = (apid / 10) % 10;
        let nq2 = (apid / 100) % 10;
        let nq1 = (apid / 1000) % 10;

        match (quark_three_charge(nq2), quark_three_charge(nq3)) {
            (Some(q2), Some(q3)) if nq1 == 0 => {
                // For s and b mesons the heavier slot holds the antiquark.
                if nq2 == 3 || nq2 == 5 {
                    q3 - q2
                } else {
                    q2 - q3
                }
            }
            (Some(q2), Some(q3)) => quark_three_charge(nq1).map_or(0, |q1| q1 + q2 + q3),
            _ => 0,
        }
    };

    if pid < 0 {
        -charge
    } else {
        charge
    }
}
