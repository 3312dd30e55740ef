use std::cmp::Ordering;

use log::debug;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::cluster::{cluster_inclusive, ClusteringFailure};
use crate::constituent::Constituent;
use crate::kinematics::{self, FourMomentum};
use crate::particle::Particle;

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
pub enum JetAlgorithm {
    #[default]
    #[strum(to_string = "anti-kt")]
    AntiKt,
    #[strum(to_string = "kt")]
    Kt,
    #[strum(to_string = "Cambridge/Aachen")]
    CambridgeAachen,
}

#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(default)]
pub struct JetDefinition {
    pub algorithm: JetAlgorithm,
    pub radius: f64,
    pub min_pt: f64,
}

impl Default for JetDefinition {
    fn default() -> Self {
        Self {
            algorithm: JetAlgorithm::AntiKt,
            radius: 0.4,
            min_pt: 0.,
        }
    }
}

impl JetDefinition {
    /// Cluster particles into jets, hardest first
    pub fn find_jets(&self, particles: &[Particle]) -> Result<Vec<Jet>, ClusteringFailure> {
        let momenta: Vec<FourMomentum> = particles.iter().map(|p| p.p).collect();
        let seq = cluster_inclusive(&momenta, self.algorithm, self.radius)?;
        let minpt2 = self.min_pt * self.min_pt;
        let mut jets: Vec<Jet> = seq
            .jets
            .iter()
            .filter(|&&id| seq.tree.node(id).pt2() > minpt2)
            .map(|&id| {
                let constituents = seq
                    .tree
                    .leaves(id)
                    .into_iter()
                    .map(|n| Constituent::Particle(particles[n]))
                    .collect();
                Jet::new(seq.tree.node(id).momentum(), constituents)
            })
            .collect();
        jets.sort_by(|a, b| b.pt.partial_cmp(&a.pt).unwrap_or(Ordering::Equal));
        debug!(
            "Found {} {} jets with R = {} from {} particles",
            jets.len(),
            self.algorithm,
            self.radius,
            particles.len()
        );
        Ok(jets)
    }
}

/// A jet: its four-momentum and its constituents
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize, Serialize)]
pub struct Jet {
    pub p: FourMomentum,
    pub eta: f64,
    pub phi: f64,
    pub pt: f64,
    pub constituents: Vec<Constituent>,
}

impl Jet {
    pub fn new(p: FourMomentum, constituents: Vec<Constituent>) -> Self {
        Self {
            p,
            eta: kinematics::eta(&p),
            phi: kinematics::phi(&p),
            pt: kinematics::pt(&p),
            constituents,
        }
    }

    /// Jet with the E-scheme sum of its constituents as momentum
    pub fn from_constituents(constituents: Vec<Constituent>) -> Self {
        let p = constituents
            .iter()
            .map(|c| c.nominal_momentum())
            .fold([0.; 4], |acc, p| kinematics::add(&acc, &p));
        Self::new(p, constituents)
    }

    pub fn mass(&self) -> f64 {
        kinematics::mass(&self.p)
    }

    /// Number of constituents
    pub fn n(&self) -> usize {
        self.constituents.len()
    }

    /// Fraction of the jet energy carried by neutral constituents
    pub fn nef(&self) -> f64 {
        let (neutral, total) = self.constituents.iter().fold((0., 0.), |(neutral, total), c| {
            let e = c.nominal_momentum()[0];
            if c.is_charged() {
                (neutral, total + e)
            } else {
                (neutral + e, total + e)
            }
        });
        if total > 0. {
            neutral / total
        } else {
            0.
        }
    }

    /// Constituent with the largest transverse momentum
    pub fn leading(&self) -> Option<&Constituent> {
        self.constituents.iter().fold(None, |max: Option<&Constituent>, c| match max {
            Some(max) if max.pt() >= c.pt() => Some(max),
            _ => Some(c),
        })
    }

    pub fn max_constituent_pt(&self) -> f64 {
        self.leading().map(|c| c.pt()).unwrap_or(0.)
    }
}
