use serde::{Deserialize, Serialize};
use strum::Display;

use crate::kinematics::{self, FourMomentum};
use crate::particle::Particle;

/// Choice of calorimeter cluster energy
#[derive(
    Display,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Deserialize,
    Serialize,
)]
pub enum EnergyScheme {
    #[strum(to_string = "raw")]
    Raw,
    #[default]
    #[strum(to_string = "non-linearity corrected")]
    NonLinearityCorrected,
    #[strum(to_string = "hadronically corrected")]
    HadronicCorrected,
}

/// Cluster energies for each correction scheme
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Deserialize, Serialize)]
pub struct ClusterEnergies {
    pub raw: f64,
    pub non_linearity_corrected: f64,
    pub hadronic_corrected: f64,
}

impl ClusterEnergies {
    pub fn get(&self, scheme: EnergyScheme) -> f64 {
        match scheme {
            EnergyScheme::Raw => self.raw,
            EnergyScheme::NonLinearityCorrected => self.non_linearity_corrected,
            EnergyScheme::HadronicCorrected => self.hadronic_corrected,
        }
    }
}

/// Calorimeter cluster, treated as a massless neutral object
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Deserialize, Serialize)]
pub struct CaloCluster {
    /// Cluster position in the detector frame
    pub position: [f64; 3],
    pub energies: ClusterEnergies,
}

impl CaloCluster {
    /// Momentum seen from `vertex` with the energy given by `scheme`
    pub fn momentum(&self, vertex: &[f64; 3], scheme: EnergyScheme) -> FourMomentum {
        let e = self.energies.get(scheme);
        let dir = [
            self.position[0] - vertex[0],
            self.position[1] - vertex[1],
            self.position[2] - vertex[2],
        ];
        let norm = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
        if norm == 0. {
            return [e, 0., 0., 0.];
        }
        let scale = e / norm;
        [e, scale * dir[0], scale * dir[1], scale * dir[2]]
    }
}

/// Jet constituent
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub enum Constituent {
    Particle(Particle),
    Cluster(CaloCluster),
}

impl Constituent {
    pub fn momentum(&self, vertex: &[f64; 3], scheme: EnergyScheme) -> FourMomentum {
        match self {
            Constituent::Particle(p) => p.p,
            Constituent::Cluster(c) => c.momentum(vertex, scheme),
        }
    }

    /// Momentum with the default energy scheme and a vertex at the origin
    pub fn nominal_momentum(&self) -> FourMomentum {
        self.momentum(&[0.; 3], EnergyScheme::default())
    }

    pub fn is_charged(&self) -> bool {
        match self {
            Constituent::Particle(p) => p.is_charged(),
            Constituent::Cluster(_) => false,
        }
    }

    pub fn is_photon(&self) -> bool {
        match self {
            Constituent::Particle(p) => p.is_photon(),
            Constituent::Cluster(_) => false,
        }
    }

    pub fn pt(&self) -> f64 {
        match self {
            Constituent::Particle(p) => p.pt,
            Constituent::Cluster(_) => kinematics::pt(&self.nominal_momentum()),
        }
    }

    pub fn eta(&self) -> f64 {
        match self {
            Constituent::Particle(p) => p.eta,
            Constituent::Cluster(_) => kinematics::eta(&self.nominal_momentum()),
        }
    }

    pub fn phi(&self) -> f64 {
        match self {
            Constituent::Particle(p) => p.phi,
            Constituent::Cluster(_) => kinematics::phi(&self.nominal_momentum()),
        }
    }
}

impl From<Particle> for Constituent {
    fn from(p: Particle) -> Self {
        Constituent::Particle(p)
    }
}

impl From<CaloCluster> for Constituent {
    fn from(c: CaloCluster) -> Self {
        Constituent::Cluster(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cluster() -> CaloCluster {
        CaloCluster {
            position: [440., 0., 0.],
            energies: ClusterEnergies {
                raw: 10.,
                non_linearity_corrected: 11.,
                hadronic_corrected: 9.,
            },
        }
    }

    #[test]
    fn cluster_energy_follows_scheme() {
        let c = cluster();
        let origin = [0.; 3];
        assert_eq!(c.momentum(&origin, EnergyScheme::Raw)[0], 10.);
        assert_eq!(c.momentum(&origin, EnergyScheme::NonLinearityCorrected)[0], 11.);
        assert_eq!(c.momentum(&origin, EnergyScheme::HadronicCorrected)[0], 9.);
    }

    #[test]
    fn cluster_direction_depends_on_vertex() {
        let c = cluster();
        let p = c.momentum(&[0., 0., -440.], EnergyScheme::Raw);
        assert_abs_diff_eq!(kinematics::mass(&p), 0., epsilon = 1e-6);
        assert_abs_diff_eq!(p[1], p[3], epsilon = 1e-12);
        assert_abs_diff_eq!(p[2], 0., epsilon = 1e-12);
    }

    #[test]
    fn clusters_are_neutral() {
        let c = Constituent::from(cluster());
        assert!(!c.is_charged());
        assert!(!c.is_photon());
        assert_abs_diff_eq!(c.pt(), 11., epsilon = 1e-12);
    }
}
