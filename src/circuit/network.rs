//! Node and branch bookkeeping.
//!
//! The [`Network`] owns every unknown of the linear system: one voltage per
//! non-ground node and one current per branch. It translates node and branch
//! handles into matrix indices and stores the values of the last solve.

use std::collections::HashMap;

use super::types::{BranchId, NodeId, VarIndex};

/// Canonical name of the ground node.
pub const GROUND_NAME: &str = "0";

/// An auxiliary current unknown between two nodes.
///
/// Positive current flows from `a` through the owning device to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub a: NodeId,
    pub b: NodeId,
}

/// Nodes, branches and their last-solved values.
#[derive(Debug, Clone)]
pub struct Network {
    /// Mapping from node names (and ground aliases) to node IDs
    node_map: HashMap<String, NodeId>,
    /// Reverse mapping from node IDs to names
    node_names: Vec<String>,
    /// Allocated branches, in allocation order
    branches: Vec<Branch>,
    /// Node voltages indexed by node ID, ground included
    voltages: Vec<f64>,
    /// Branch currents indexed by branch ID
    currents: Vec<f64>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create a network that contains only the ground node.
    pub fn new() -> Self {
        let mut node_map = HashMap::new();
        node_map.insert(GROUND_NAME.to_string(), NodeId::GROUND);
        node_map.insert("GND".to_string(), NodeId::GROUND);
        Self {
            node_map,
            node_names: vec![GROUND_NAME.to_string()],
            branches: Vec::new(),
            voltages: vec![0.0],
            currents: Vec::new(),
        }
    }

    /// Return the node with the given name, appending a new one if needed.
    ///
    /// Node IDs are assigned in order of first appearance and never reused.
    pub fn make_node(&mut self, name: &str) -> NodeId {
        if let Some(&node) = self.node_map.get(name) {
            return node;
        }
        let node = NodeId(self.node_names.len());
        self.node_map.insert(name.to_string(), node);
        self.node_names.push(name.to_string());
        self.voltages.push(0.0);
        node
    }

    /// Make `name` refer to the ground node.
    ///
    /// Returns `false` if the name is already bound to a different node.
    pub fn alias_ground(&mut self, name: &str) -> bool {
        match self.node_map.get(name) {
            Some(node) => node.is_ground(),
            None => {
                self.node_map.insert(name.to_string(), NodeId::GROUND);
                true
            }
        }
    }

    /// Allocate a new branch current unknown between two nodes.
    pub fn make_branch(&mut self, a: NodeId, b: NodeId) -> BranchId {
        let branch = BranchId(self.branches.len());
        self.branches.push(Branch { a, b });
        self.currents.push(0.0);
        branch
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_map.get(name).copied()
    }

    /// Get the name of a node.
    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_names[node.0]
    }

    /// Get the terminals of a branch.
    pub fn branch(&self, branch: BranchId) -> Branch {
        self.branches[branch.0]
    }

    /// Readback label for a branch current, e.g. `I[NP->0]`.
    pub fn branch_label(&self, branch: BranchId) -> String {
        let Branch { a, b } = self.branch(branch);
        format!("I[{}->{}]", self.node_name(a), self.node_name(b))
    }

    /// Number of nodes (including ground).
    pub fn num_nodes(&self) -> usize {
        self.node_names.len()
    }

    /// Number of branch current variables.
    pub fn num_branches(&self) -> usize {
        self.branches.len()
    }

    /// Total number of unknowns: nodes excluding ground plus branches.
    pub fn unknowns(&self) -> usize {
        (self.num_nodes() - 1) + self.num_branches()
    }

    /// Get the matrix index for a node voltage.
    /// Returns None for ground (node 0).
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        VarIndex::Voltage(node).to_index(self.num_nodes())
    }

    /// Get the matrix index for a branch current.
    pub fn branch_index(&self, branch: BranchId) -> usize {
        (self.num_nodes() - 1) + branch.0
    }

    /// Get the matrix index for any unknown.
    pub fn index_of(&self, var: VarIndex) -> Option<usize> {
        var.to_index(self.num_nodes())
    }

    /// Voltage at a node from the last solve (0 for ground).
    pub fn voltage(&self, node: NodeId) -> f64 {
        self.voltages[node.0]
    }

    /// Current through a branch from the last solve.
    pub fn current(&self, branch: BranchId) -> f64 {
        self.currents[branch.0]
    }

    /// Iterate over all node IDs excluding ground.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (1..self.num_nodes()).map(NodeId)
    }

    /// Iterate over all branch IDs.
    pub fn branches(&self) -> impl Iterator<Item = BranchId> {
        (0..self.num_branches()).map(BranchId)
    }

    /// Copy a solution vector into node voltages and branch currents.
    pub fn update(&mut self, x: &[f64]) {
        debug_assert_eq!(x.len(), self.unknowns());
        let n = self.num_nodes() - 1;
        self.voltages[1..].copy_from_slice(&x[..n]);
        self.currents.copy_from_slice(&x[n..]);
    }

    /// Copy node voltages and branch currents into a solution vector.
    pub fn store(&self, x: &mut [f64]) {
        debug_assert_eq!(x.len(), self.unknowns());
        let n = self.num_nodes() - 1;
        x[..n].copy_from_slice(&self.voltages[1..]);
        x[n..].copy_from_slice(&self.currents);
    }

    /// Zero every node voltage and branch current.
    pub fn reset(&mut self) {
        self.voltages.fill(0.0);
        self.currents.fill(0.0);
    }
}
