//! Four-momentum helpers.
//!
//! Momenta are stored as `[E, px, py, pz]`, the same layout the event
//! readers hand out.
use std::f64::consts::PI;

use jetty::PseudoJet;

/// Four-momentum `[E, px, py, pz]`
pub type FourMomentum = [f64; 4];

/// Pseudorapidity assigned to objects without transverse momentum, on top of |pz|
const MAX_ETA: f64 = 1e5;

pub fn pt2(p: &FourMomentum) -> f64 {
    p[1] * p[1] + p[2] * p[2]
}

pub fn pt(p: &FourMomentum) -> f64 {
    pt2(p).sqrt()
}

pub fn m2(p: &FourMomentum) -> f64 {
    p[0] * p[0] - p[1] * p[1] - p[2] * p[2] - p[3] * p[3]
}

/// Invariant mass, negative for space-like momenta
pub fn mass(p: &FourMomentum) -> f64 {
    let m2 = m2(p);
    if m2 < 0. {
        -(-m2).sqrt()
    } else {
        m2.sqrt()
    }
}

/// Azimuthal angle in `[-π, π]`
pub fn phi(p: &FourMomentum) -> f64 {
    if p[1] == 0. && p[2] == 0. {
        return 0.;
    }
    p[2].atan2(p[1])
}

/// Pseudorapidity
pub fn eta(p: &FourMomentum) -> f64 {
    let pt = pt(p);
    if pt == 0. {
        let eta = MAX_ETA + p[3].abs();
        return if p[3] >= 0. { eta } else { -eta };
    }
    (p[3] / pt).asinh()
}

/// Map an azimuthal angle into `[0, 2π)`
pub fn phi_0_2pi(phi: f64) -> f64 {
    let phi = phi.rem_euclid(2. * PI);
    if phi >= 2. * PI {
        0.
    } else {
        phi
    }
}

/// Distance in the rapidity-azimuth plane between two momenta
///
/// Both momenta must satisfy E ≥ |pz|.
pub fn delta_r(p1: &FourMomentum, p2: &FourMomentum) -> f64 {
    PseudoJet::from(p1).delta_r(&PseudoJet::from(p2)).raw()
}

/// E-scheme recombination
pub fn add(p1: &FourMomentum, p2: &FourMomentum) -> FourMomentum {
    [p1[0] + p2[0], p1[1] + p2[1], p1[2] + p2[2], p1[3] + p2[3]]
}

/// Massless momentum from transverse momentum, pseudorapidity and azimuth
pub fn from_pt_eta_phi(pt: f64, eta: f64, phi: f64) -> FourMomentum {
    [
        pt * eta.cosh(),
        pt * phi.cos(),
        pt * phi.sin(),
        pt * eta.sinh(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn massless_pseudorapidity() {
        let p = from_pt_eta_phi(10., 0.35, 1.2);
        assert_abs_diff_eq!(eta(&p), 0.35, epsilon = 1e-12);
        assert_abs_diff_eq!(phi(&p), 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(pt(&p), 10., epsilon = 1e-12);
        assert_abs_diff_eq!(mass(&p), 0., epsilon = 1e-6);
    }

    #[test]
    fn azimuth_wraps_around() {
        assert_abs_diff_eq!(phi_0_2pi(-PI / 2.), 1.5 * PI, epsilon = 1e-12);
        assert!(phi_0_2pi(-1e-18) < 2. * PI);
        let p1 = from_pt_eta_phi(1., 0., 3.1);
        let p2 = from_pt_eta_phi(1., 0., -3.1);
        assert_abs_diff_eq!(delta_r(&p1, &p2), 2. * PI - 6.2, epsilon = 1e-12);
    }

    #[test]
    fn beam_collinear_pseudorapidity_is_finite() {
        let p = [5., 0., 0., 5.];
        assert!(eta(&p).is_finite());
        assert!(eta(&p) > MAX_ETA);
        assert!(eta(&[5., 0., 0., -5.]) < -MAX_ETA);
    }

    #[test]
    fn mass_of_pair() {
        let p1 = [5., 0., 3., 4.];
        let p2 = [5., 0., -3., -4.];
        assert_abs_diff_eq!(mass(&add(&p1, &p2)), 10., epsilon = 1e-12);
        assert!(mass(&[1., 2., 0., 0.]) < 0.);
    }
}
