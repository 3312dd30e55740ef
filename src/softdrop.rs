//! Soft-drop declustering of jets.
//!
//! The constituents of a jet are reclustered into a single binary tree,
//! which is then walked from the root along the primary branch: at every
//! splitting the softer child is tested against the soft-drop condition
//!
//! ```text
//! z ≥ zcut (ΔR / R)^β,   z = pt_soft / (pt_hard + pt_soft),
//! ```
//!
//! and the walk continues into the harder child. The harder child is the
//! one with strictly larger transverse momentum; on exact ties it is the
//! child that was created first by the recombination.
//!
//! [`Declusterer::softdrop`] stops at the first splitting passing the
//! condition, [`Declusterer::iterative`] collects all passing splittings
//! until the primary branch ends in a single constituent.
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::{recluster, ClusteringFailure};
use crate::constituent::EnergyScheme;
use crate::jets::{Jet, JetAlgorithm};
use crate::kinematics::FourMomentum;
use crate::tree::{ClusterTree, NodeId};

/// Grooming settings
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(default)]
pub struct SoftdropParams {
    pub beta: f64,
    pub zcut: f64,
    pub reclusterizer: JetAlgorithm,
    pub use_charged: bool,
    pub use_neutral: bool,
}

impl Default for SoftdropParams {
    fn default() -> Self {
        Self {
            beta: 0.,
            zcut: 0.1,
            reclusterizer: JetAlgorithm::CambridgeAachen,
            use_charged: true,
            use_neutral: true,
        }
    }
}

/// Observables of one splitting
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct SoftdropResult {
    /// Momentum fraction of the softer branch, 0 if untagged
    pub zg: f64,
    /// Angular distance between the branches, 0 if untagged
    pub rg: f64,
    /// Mass of the groomed jet
    pub mg: f64,
    /// Transverse momentum of the groomed jet
    pub ptg: f64,
    /// Mass drop max(m_hard, m_soft) / m
    pub mug: f64,
    /// Number of branches removed before this splitting
    pub n_dropped: usize,
    /// Position on the primary branch, the root splitting has depth 0
    pub depth: usize,
}

impl SoftdropResult {
    pub fn is_tagged(&self, zcut: f64) -> bool {
        self.zg >= zcut
    }
}

#[derive(Error, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclusterError {
    #[error("fewer than two constituents to decluster")]
    InsufficientConstituents,
    #[error("jet without mass")]
    ZeroMass,
    #[error("reclustering failed: {0}")]
    ClusteringFailure(#[from] ClusteringFailure),
}

impl DeclusterError {
    /// Numeric error code: 1 constituents, 2 mass, 3 and 4 reclustering
    pub fn code(&self) -> u8 {
        match self {
            DeclusterError::InsufficientConstituents => 1,
            DeclusterError::ZeroMass => 2,
            DeclusterError::ClusteringFailure(ClusteringFailure::NonFiniteMomentum) => 3,
            DeclusterError::ClusteringFailure(ClusteringFailure::Incomplete) => 4,
        }
    }
}

/// One step on the primary branch
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Splitting {
    pub parent: NodeId,
    pub harder: NodeId,
    pub softer: NodeId,
    pub z: f64,
    pub delta_r: f64,
    pub depth: usize,
}

/// Walk down the harder branch of a clustering tree, starting at `root`
pub struct PrimaryBranch<'a> {
    tree: &'a ClusterTree,
    current: NodeId,
    depth: usize,
}

impl<'a> PrimaryBranch<'a> {
    pub fn new(tree: &'a ClusterTree, root: NodeId) -> Self {
        Self { tree, current: root, depth: 0 }
    }

    /// Where the walk currently stands
    pub fn current(&self) -> NodeId {
        self.current
    }
}

impl<'a> Iterator for PrimaryBranch<'a> {
    type Item = Splitting;

    fn next(&mut self) -> Option<Self::Item> {
        let (first, second) = self.tree.node(self.current).children?;
        let (n1, n2) = (self.tree.node(first), self.tree.node(second));
        let (harder, softer) = if n2.pt2() > n1.pt2() {
            (second, first)
        } else {
            (first, second)
        };
        let (pt_hard, pt_soft) = (self.tree.node(harder).pt(), self.tree.node(softer).pt());
        let sum = pt_hard + pt_soft;
        let z = if sum > 0. { pt_soft / sum } else { 0. };
        let splitting = Splitting {
            parent: self.current,
            harder,
            softer,
            z,
            delta_r: n1.delta_r(n2),
            depth: self.depth,
        };
        self.current = harder;
        self.depth += 1;
        Some(splitting)
    }
}

/// Soft-drop declustering for one jet collection
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct Declusterer {
    /// Jet radius R₀ in the angular term of the grooming condition
    pub radius: f64,
    pub params: SoftdropParams,
    /// Energy definition for calorimeter cluster constituents
    pub energy_scheme: EnergyScheme,
    /// Primary vertex, used to point calorimeter clusters
    pub vertex: [f64; 3],
    /// Reject jets with non-positive mass
    pub drop_mass0_jets: bool,
}

impl Declusterer {
    pub fn new(radius: f64, params: SoftdropParams) -> Self {
        Self {
            radius,
            params,
            energy_scheme: EnergyScheme::default(),
            vertex: [0.; 3],
            drop_mass0_jets: true,
        }
    }

    /// First splitting passing the grooming condition
    ///
    /// If no splitting passes, the returned result has `zg = rg = 0` and
    /// describes the single constituent at the end of the primary branch.
    pub fn softdrop(&self, jet: &Jet) -> Result<SoftdropResult, DeclusterError> {
        let (tree, root) = self.build_tree(jet)?;
        let mut branch = PrimaryBranch::new(&tree, root);
        let mut n_dropped = 0;
        for splitting in branch.by_ref() {
            if self.passes(&splitting) {
                trace!("tagged at depth {} with z = {}", splitting.depth, splitting.z);
                return Ok(self.result(&tree, &splitting, n_dropped));
            }
            n_dropped += 1;
        }
        let leaf = tree.node(branch.current());
        trace!("untagged after {n_dropped} splittings");
        Ok(SoftdropResult {
            zg: 0.,
            rg: 0.,
            mg: leaf.mass(),
            ptg: leaf.pt(),
            mug: 0.,
            n_dropped,
            depth: n_dropped,
        })
    }

    /// All splittings on the primary branch passing the grooming condition
    ///
    /// The number of entries is the soft-drop multiplicity n_sd.
    pub fn iterative(&self, jet: &Jet) -> Result<Vec<SoftdropResult>, DeclusterError> {
        let (tree, root) = self.build_tree(jet)?;
        let mut n_dropped = 0;
        let mut res = Vec::new();
        for splitting in PrimaryBranch::new(&tree, root) {
            if self.passes(&splitting) {
                res.push(self.result(&tree, &splitting, n_dropped));
            } else {
                n_dropped += 1;
            }
        }
        Ok(res)
    }

    fn passes(&self, splitting: &Splitting) -> bool {
        let SoftdropParams { beta, zcut, .. } = self.params;
        let threshold = if beta == 0. {
            zcut
        } else {
            zcut * (splitting.delta_r / self.radius).powf(beta)
        };
        splitting.z >= threshold
    }

    fn result(
        &self,
        tree: &ClusterTree,
        splitting: &Splitting,
        n_dropped: usize,
    ) -> SoftdropResult {
        let parent = tree.node(splitting.parent);
        let mass = parent.mass();
        let mug = if mass > 0. {
            let m_hard = tree.node(splitting.harder).mass();
            let m_soft = tree.node(splitting.softer).mass();
            m_hard.max(m_soft) / mass
        } else {
            0.
        };
        SoftdropResult {
            zg: splitting.z,
            rg: splitting.delta_r,
            mg: mass,
            ptg: parent.pt(),
            mug,
            n_dropped,
            depth: splitting.depth,
        }
    }

    fn build_tree(&self, jet: &Jet) -> Result<(ClusterTree, NodeId), DeclusterError> {
        if self.drop_mass0_jets && jet.mass() <= 0. {
            return Err(DeclusterError::ZeroMass);
        }
        let inputs = self.select_constituents(jet);
        if inputs.len() < 2 {
            return Err(DeclusterError::InsufficientConstituents);
        }
        Ok(recluster(&inputs, self.params.reclusterizer, self.radius)?)
    }

    fn select_constituents(&self, jet: &Jet) -> Vec<FourMomentum> {
        let SoftdropParams { use_charged, use_neutral, .. } = self.params;
        jet.constituents
            .iter()
            .filter(|c| if c.is_charged() { use_charged } else { use_neutral })
            .map(|c| c.momentum(&self.vertex, self.energy_scheme))
            .collect()
    }
}
