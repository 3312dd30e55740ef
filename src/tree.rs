//! Clustering history stored as an arena of nodes.
//!
//! Leaves are the clustering inputs, every internal node is the
//! recombination of exactly two earlier nodes. Node ids are indices into
//! the arena, so a child id is always smaller than its parent's.
use jetty::PseudoJet;

use crate::kinematics::FourMomentum;

pub type NodeId = usize;

#[derive(Copy, Clone, PartialEq, PartialOrd, Debug)]
pub struct Node {
    pub p: PseudoJet,
    /// `(first, second)` with `first` created before `second`
    pub children: Option<(NodeId, NodeId)>,
    pub parent: Option<NodeId>,
    /// Position in the clustering input, for leaves
    pub input: Option<usize>,
}

impl Node {
    fn new(p: PseudoJet) -> Self {
        Self { p, children: None, parent: None, input: None }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn momentum(&self) -> FourMomentum {
        [self.p.e().raw(), self.p.px().raw(), self.p.py().raw(), self.p.pz().raw()]
    }

    pub fn pt2(&self) -> f64 {
        self.p.pt2().raw()
    }

    pub fn pt(&self) -> f64 {
        self.p.pt().raw()
    }

    pub fn mass(&self) -> f64 {
        crate::kinematics::mass(&self.momentum())
    }

    pub fn delta_r(&self, other: &Node) -> f64 {
        self.p.delta_r(&other.p).raw()
    }
}

#[derive(Clone, PartialEq, PartialOrd, Debug, Default)]
pub struct ClusterTree {
    nodes: Vec<Node>,
}

impl ClusterTree {
    /// Tree with one leaf per input and no recombinations yet
    pub fn with_inputs(inputs: &[PseudoJet]) -> Self {
        let nodes = inputs
            .iter()
            .enumerate()
            .map(|(n, p)| {
                let mut node = Node::new(*p);
                node.input = Some(n);
                node
            })
            .collect();
        Self { nodes }
    }

    /// Recombine two parentless nodes into a new one
    pub fn merge(&mut self, a: NodeId, b: NodeId) -> NodeId {
        debug_assert_ne!(a, b);
        debug_assert!(self.nodes[a].parent.is_none());
        debug_assert!(self.nodes[b].parent.is_none());
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let p = self.nodes[first].p + self.nodes[second].p;
        let id = self.nodes.len();
        let mut node = Node::new(p);
        node.children = Some((first, second));
        self.nodes.push(node);
        self.nodes[first].parent = Some(id);
        self.nodes[second].parent = Some(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Input positions of all leaves below `id`, in ascending order
    pub fn leaves(&self, id: NodeId) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut todo = vec![id];
        while let Some(id) = todo.pop() {
            let node = &self.nodes[id];
            match node.children {
                Some((first, second)) => {
                    todo.push(first);
                    todo.push(second);
                }
                None => leaves.extend(node.input),
            }
        }
        leaves.sort_unstable();
        leaves
    }
}
