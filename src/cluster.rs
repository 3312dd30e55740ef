//! Sequential pairwise recombination on top of `jetty`.
//!
//! `jetty` decides which objects to combine. Its cluster history is
//! replayed step by step into a [`ClusterTree`], so that every jet keeps
//! its full recombination tree and its constituents.
use jetty::distance::Distance;
use jetty::{anti_kt_f, cambridge_aachen_f, kt_f, ClusterHistory, ClusterStep, PseudoJet};
use log::trace;
use noisy_float::prelude::*;
use thiserror::Error;

use crate::jets::JetAlgorithm;
use crate::kinematics::FourMomentum;
use crate::tree::{ClusterTree, NodeId};

/// Beam distance when clustering down to a single object
const NO_BEAM_DISTANCE: f64 = 1e300;

#[derive(Error, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClusteringFailure {
    #[error("input momentum with non-finite components or undefined rapidity")]
    NonFiniteMomentum,
    #[error("recombination did not end in the expected objects")]
    Incomplete,
}

/// Result of a clustering: the full history and the final jets
#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct ClusterSequence {
    pub tree: ClusterTree,
    /// Final jets in the order in which they were found
    pub jets: Vec<NodeId>,
}

/// Wraps a distance so that nothing is ever promoted to a jet
/// while there is a partner left to combine with
struct Exclusive<D>(D);

impl<D: Distance> Distance for Exclusive<D> {
    fn distance(&self, p1: &PseudoJet, p2: &PseudoJet) -> N64 {
        self.0.distance(p1, p2)
    }

    fn beam_distance(&self, _p1: &PseudoJet) -> N64 {
        n64(NO_BEAM_DISTANCE)
    }
}

fn history_with<D>(partons: Vec<PseudoJet>, distance: D, exclusive: bool) -> ClusterHistory<'static>
where
    D: Distance + 'static,
{
    if exclusive {
        ClusterHistory::new(partons, Exclusive(distance))
    } else {
        ClusterHistory::new(partons, distance)
    }
}

fn history(
    partons: Vec<PseudoJet>,
    algorithm: JetAlgorithm,
    radius: f64,
    exclusive: bool,
) -> ClusterHistory<'static> {
    match algorithm {
        JetAlgorithm::AntiKt => history_with(partons, anti_kt_f(radius), exclusive),
        JetAlgorithm::Kt => history_with(partons, kt_f(radius), exclusive),
        JetAlgorithm::CambridgeAachen => {
            history_with(partons, cambridge_aachen_f(radius), exclusive)
        }
    }
}

// Rapidity is only defined for E ≥ |pz|
fn to_pseudojets(inputs: &[FourMomentum]) -> Result<Vec<PseudoJet>, ClusteringFailure> {
    inputs
        .iter()
        .map(|p| {
            if p.iter().all(|c| c.is_finite()) && p[0] >= p[3].abs() {
                Ok(PseudoJet::from(*p))
            } else {
                Err(ClusteringFailure::NonFiniteMomentum)
            }
        })
        .collect()
}

/// Remove the active node with momentum `p`
fn take(
    tree: &ClusterTree,
    active: &mut Vec<NodeId>,
    p: &PseudoJet,
) -> Result<NodeId, ClusteringFailure> {
    let pos = active
        .iter()
        .position(|&id| tree.node(id).p == *p)
        .ok_or(ClusteringFailure::Incomplete)?;
    Ok(active.remove(pos))
}

fn replay(
    inputs: &[FourMomentum],
    algorithm: JetAlgorithm,
    radius: f64,
    exclusive: bool,
) -> Result<ClusterSequence, ClusteringFailure> {
    let partons = to_pseudojets(inputs)?;
    let mut tree = ClusterTree::with_inputs(&partons);
    let mut active: Vec<NodeId> = (0..partons.len()).collect();
    let mut jets = Vec::new();
    for step in history(partons, algorithm, radius, exclusive) {
        match step {
            ClusterStep::Combine([p1, p2]) => {
                let a = take(&tree, &mut active, &p1)?;
                let b = take(&tree, &mut active, &p2)?;
                let id = tree.merge(a, b);
                trace!("recombined {a} and {b} into {id}");
                active.push(id);
            }
            ClusterStep::Jet(jet) => jets.push(take(&tree, &mut active, &jet)?),
        }
    }
    if !active.is_empty() {
        return Err(ClusteringFailure::Incomplete);
    }
    Ok(ClusterSequence { tree, jets })
}

/// Cluster `inputs` into inclusive jets
pub fn cluster_inclusive(
    inputs: &[FourMomentum],
    algorithm: JetAlgorithm,
    radius: f64,
) -> Result<ClusterSequence, ClusteringFailure> {
    replay(inputs, algorithm, radius, false)
}

/// Recombine `inputs` pairwise until a single root is left
///
/// Beam distances play no role, so the jet radius only rescales all
/// distances and cannot change the history. Returns the tree and its root.
pub fn recluster(
    inputs: &[FourMomentum],
    algorithm: JetAlgorithm,
    radius: f64,
) -> Result<(ClusterTree, NodeId), ClusteringFailure> {
    let ClusterSequence { tree, jets } = replay(inputs, algorithm, radius, true)?;
    match jets[..] {
        [root] => Ok((tree, root)),
        _ => Err(ClusteringFailure::Incomplete),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::from_pt_eta_phi;
    use approx::assert_relative_eq;

    #[test]
    fn cambridge_aachen_merges_closest_pair_first() {
        // the two soft particles are closest in angle, the hard one far away
        let inputs = [
            from_pt_eta_phi(100., 0., 0.),
            from_pt_eta_phi(1., 0.3, 0.),
            from_pt_eta_phi(1., 0.35, 0.),
        ];
        let (tree, root) = recluster(&inputs, JetAlgorithm::CambridgeAachen, 0.4).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node(3).children, Some((1, 2)));
        assert_eq!(tree.node(root).children, Some((0, 3)));
    }

    #[test]
    fn kt_merges_softest_first() {
        let inputs = [
            from_pt_eta_phi(100., 0., 0.),
            from_pt_eta_phi(50., 0.05, 0.),
            from_pt_eta_phi(1., 0.3, 0.),
        ];
        let (tree, _) = recluster(&inputs, JetAlgorithm::Kt, 0.4).unwrap();
        // kt distance is smallest for the soft particle and its nearest neighbour
        assert_eq!(tree.node(3).children, Some((1, 2)));
    }

    #[test]
    fn reclustering_conserves_momentum() {
        let inputs = [
            from_pt_eta_phi(20., 0.1, 0.1),
            from_pt_eta_phi(5., -0.1, 0.2),
            from_pt_eta_phi(7., 0.05, -0.15),
            from_pt_eta_phi(3., 0.2, 0.0),
        ];
        let (tree, root) = recluster(&inputs, JetAlgorithm::CambridgeAachen, 0.4).unwrap();
        let total = inputs.iter().fold([0.; 4], |mut acc, p| {
            acc.iter_mut().zip(p).for_each(|(a, b)| *a += b);
            acc
        });
        for (a, b) in tree.node(root).momentum().iter().zip(total.iter()) {
            assert_relative_eq!(a, b, max_relative = 1e-12);
        }
        assert_eq!(tree.leaves(root), vec![0, 1, 2, 3]);
        assert_eq!(tree.len(), 2 * inputs.len() - 1);
    }

    #[test]
    fn reclustering_ignores_the_radius() {
        // far apart compared to R, still ends in a single root
        let inputs = [
            from_pt_eta_phi(30., 0., 0.),
            from_pt_eta_phi(20., 0.5, 2.),
            from_pt_eta_phi(10., -0.5, -2.),
        ];
        for algorithm in [JetAlgorithm::AntiKt, JetAlgorithm::Kt, JetAlgorithm::CambridgeAachen] {
            let (tree, root) = recluster(&inputs, algorithm, 0.1).unwrap();
            assert_eq!(tree.roots().collect::<Vec<_>>(), vec![root]);
            assert_eq!(tree.leaves(root), vec![0, 1, 2]);
        }
    }

    #[test]
    fn history_follows_jetty() {
        let inputs = [
            from_pt_eta_phi(60., 0., 0.),
            from_pt_eta_phi(1., 0.1, 0.05),
            from_pt_eta_phi(7., -0.1, 0.1),
            from_pt_eta_phi(30., 0.2, -0.2),
            from_pt_eta_phi(3., 0.05, 0.3),
        ];
        let (tree, _) = recluster(&inputs, JetAlgorithm::CambridgeAachen, 0.4).unwrap();
        let partons: Vec<PseudoJet> = inputs.iter().map(PseudoJet::from).collect();
        let merged: Vec<f64> = ClusterHistory::new(partons, cambridge_aachen_f(100.))
            .filter_map(|step| match step {
                ClusterStep::Combine([p1, p2]) => Some((p1 + p2).pt().raw()),
                ClusterStep::Jet(_) => None,
            })
            .collect();
        let internal: Vec<f64> = tree.nodes()[inputs.len()..].iter().map(|n| n.pt()).collect();
        assert_eq!(internal, merged);
    }

    #[test]
    fn inclusive_anti_kt_separates_distant_jets() {
        let inputs = [
            from_pt_eta_phi(50., 0., 0.),
            from_pt_eta_phi(5., 0.1, 0.1),
            from_pt_eta_phi(40., 0., 3.),
            from_pt_eta_phi(2., -0.1, 2.9),
        ];
        let seq = cluster_inclusive(&inputs, JetAlgorithm::AntiKt, 0.4).unwrap();
        assert_eq!(seq.jets.len(), 2);
        let mut constituents: Vec<_> = seq.jets.iter().map(|&j| seq.tree.leaves(j)).collect();
        constituents.sort();
        assert_eq!(constituents, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn non_finite_input_fails() {
        let inputs = [[1., f64::NAN, 0., 0.], [1., 1., 0., 0.]];
        assert_eq!(
            recluster(&inputs, JetAlgorithm::CambridgeAachen, 0.4).unwrap_err(),
            ClusteringFailure::NonFiniteMomentum
        );
        let spacelike = [[1., 1., 0., 2.], [1., 1., 0., 0.]];
        assert_eq!(
            cluster_inclusive(&spacelike, JetAlgorithm::AntiKt, 0.4).unwrap_err(),
            ClusteringFailure::NonFiniteMomentum
        );
    }

    #[test]
    fn empty_input() {
        let seq = cluster_inclusive(&[], JetAlgorithm::AntiKt, 0.4).unwrap();
        assert!(seq.jets.is_empty());
        assert_eq!(
            recluster(&[], JetAlgorithm::CambridgeAachen, 0.4).unwrap_err(),
            ClusteringFailure::Incomplete
        );
    }
}
