use particle_id::ParticleID;
use particle_id::sm_elementary_particles::gluon;
use serde::{Deserialize, Serialize};

use crate::kinematics::{self, FourMomentum};

const PHOTON: i32 = 22;

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct Particle {
    pub id: ParticleID,
    pub p: FourMomentum,
    pub eta: f64,
    pub phi: f64,
    pub pt: f64,
    /// Electric charge in units of e/3
    pub three_charge: i32,
}

impl Particle {
    pub fn new(id: ParticleID, p: FourMomentum) -> Self {
        Particle {
            id,
            p,
            eta: kinematics::eta(&p),
            phi: kinematics::phi(&p),
            pt: kinematics::pt(&p),
            three_charge: three_charge(id),
        }
    }

    pub fn is_charged(&self) -> bool {
        self.three_charge != 0
    }

    pub fn is_photon(&self) -> bool {
        self.id.id().abs() == PHOTON
    }

    pub fn is_parton(&self) -> bool {
        self.id == gluon || (1..=5).contains(&self.id.id().abs())
    }

    pub fn is_quark(&self) -> bool {
        self.id.id().abs() < 7
    }

    pub fn mass(&self) -> f64 {
        kinematics::mass(&self.p)
    }
}

/// Three times the electric charge of a particle
///
/// Elementary particles are looked up directly, hadrons are decoded from
/// the quark content in their PDG Monte Carlo number. Anything else
/// (nuclei, generator-specific codes) counts as neutral.
pub fn three_charge(id: ParticleID) -> i32 {
    let pdg = id.id();
    let sign = pdg.signum();
    let abs = pdg.abs();
    let charge = match abs {
        1..=8 => quark_three_charge(abs),
        11 | 13 | 15 | 17 => -3,
        12 | 14 | 16 | 18 => 0,
        21..=23 | 25 => 0,
        24 | 37 => 3,
        _ => hadron_three_charge(abs),
    };
    sign * charge
}

fn quark_three_charge(flavour: i32) -> i32 {
    if flavour % 2 == 0 {
        2
    } else {
        -1
    }
}

fn hadron_three_charge(abs: i32) -> i32 {
    // nuclear codes 10LZZZAAAI
    if abs >= 1_000_000_000 {
        return 0;
    }
    let n_j = abs % 10;
    let n_q3 = (abs / 10) % 10;
    let n_q2 = (abs / 100) % 10;
    let n_q1 = (abs / 1000) % 10;
    if n_j == 0 || n_q3 == 0 || n_q2 == 0 || n_q3 > 6 || n_q2 > 6 || n_q1 > 6 {
        return 0;
    }
    if n_q1 == 0 {
        // meson: quark n_q2, antiquark n_q3
        if n_q2 % 2 == 1 {
            quark_three_charge(n_q3) - quark_three_charge(n_q2)
        } else {
            quark_three_charge(n_q2) - quark_three_charge(n_q3)
        }
    } else {
        quark_three_charge(n_q1) + quark_three_charge(n_q2) + quark_three_charge(n_q3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charge(pdg: i32) -> i32 {
        three_charge(ParticleID::new(pdg))
    }

    #[test]
    fn leptons_and_bosons() {
        assert_eq!(charge(11), -3);
        assert_eq!(charge(-13), 3);
        assert_eq!(charge(12), 0);
        assert_eq!(charge(22), 0);
        assert_eq!(charge(-24), -3);
        assert_eq!(charge(2), 2);
        assert_eq!(charge(-1), 1);
    }

    #[test]
    fn mesons() {
        assert_eq!(charge(211), 3);
        assert_eq!(charge(-211), -3);
        assert_eq!(charge(111), 0);
        assert_eq!(charge(321), 3);
        assert_eq!(charge(-321), -3);
        assert_eq!(charge(311), 0);
        assert_eq!(charge(130), 0);
        assert_eq!(charge(411), 3);
        assert_eq!(charge(431), 3);
        assert_eq!(charge(521), 3);
        assert_eq!(charge(443), 0);
    }

    #[test]
    fn baryons() {
        assert_eq!(charge(2212), 3);
        assert_eq!(charge(-2212), -3);
        assert_eq!(charge(2112), 0);
        assert_eq!(charge(3122), 0);
        assert_eq!(charge(3222), 3);
        assert_eq!(charge(3112), -3);
        assert_eq!(charge(3334), -3);
        assert_eq!(charge(2224), 6);
    }

    #[test]
    fn unknown_is_neutral() {
        assert_eq!(charge(1000020040), 0);
        assert_eq!(charge(0), 0);
        assert_eq!(charge(81), 0);
    }

    #[test]
    fn photon_classification() {
        let photon = Particle::new(ParticleID::new(22), [1., 1., 0., 0.]);
        assert!(photon.is_photon());
        assert!(!photon.is_charged());
        let pion = Particle::new(ParticleID::new(-211), [2., 1., 0., 0.]);
        assert!(!pion.is_photon());
        assert!(pion.is_charged());
    }
}
