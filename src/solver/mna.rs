//! MNA system assembly.
//!
//! [`MnaMatrix`] owns the system matrix and right-hand side for one solve.
//! Devices never touch it directly: they receive a [`Stamper`], which only
//! offers additive writes and translates node/branch handles into rows and
//! columns, silently dropping anything that lands on ground.

use crate::circuit::{BranchId, Network, NodeId, VarIndex};
use crate::error::Result;

use super::linear::{self, Matrix};

/// MNA matrix system Ax = z.
#[derive(Debug, Clone)]
pub struct MnaMatrix {
    /// System matrix A
    pub a: Matrix,
    /// Source vector z; holds the solution x after [`MnaMatrix::solve`]
    pub z: Vec<f64>,
}

impl MnaMatrix {
    /// Create a zeroed system for `size` unknowns.
    pub fn new(size: usize) -> Self {
        Self {
            a: Matrix::new(size),
            z: vec![0.0; size],
        }
    }

    /// Matrix dimension.
    pub fn size(&self) -> usize {
        self.z.len()
    }

    /// Clear the matrix and vector to zero.
    pub fn clear(&mut self) {
        self.a.clear();
        self.z.fill(0.0);
    }

    /// Solve in place. On success [`MnaMatrix::solution`] holds x.
    pub fn solve(&mut self) -> Result<()> {
        linear::solve(&mut self.a, &mut self.z)
    }

    /// Solution vector (valid after a successful solve).
    pub fn solution(&self) -> &[f64] {
        &self.z
    }
}

/// Additive write access to an [`MnaMatrix`] for one assembly pass.
pub struct Stamper<'a> {
    matrix: &'a mut MnaMatrix,
    network: &'a Network,
}

impl<'a> Stamper<'a> {
    /// Bind a stamper to a system and the network that sized it.
    pub fn new(matrix: &'a mut MnaMatrix, network: &'a Network) -> Self {
        debug_assert_eq!(matrix.size(), network.unknowns());
        Self { matrix, network }
    }

    /// Add `x` to A[row, col]. Ground rows and columns are dropped.
    pub fn stamp_a(&mut self, row: impl Into<VarIndex>, col: impl Into<VarIndex>, x: f64) {
        let row = self.network.index_of(row.into());
        let col = self.network.index_of(col.into());
        if let (Some(i), Some(j)) = (row, col) {
            self.matrix.a.add(i, j, x);
        }
    }

    /// Add `x` to z[row]. Ground rows are dropped.
    pub fn stamp_b(&mut self, row: impl Into<VarIndex>, x: f64) {
        if let Some(i) = self.network.index_of(row.into()) {
            self.matrix.z[i] += x;
        }
    }

    /// Coefficient of `var` in a branch equation, used by dependent sources.
    pub fn stamp_matrix(&mut self, branch: BranchId, var: impl Into<VarIndex>, coefficient: f64) {
        self.stamp_a(branch, var, coefficient);
    }

    /// Stamp a conductance between two nodes.
    /// For a conductance G between nodes a and b:
    ///   A[a,a] += G
    ///   A[b,b] += G
    ///   A[a,b] -= G
    ///   A[b,a] -= G
    pub fn stamp_conductance(&mut self, a: NodeId, b: NodeId, g: f64) {
        self.stamp_a(a, a, g);
        self.stamp_a(b, b, g);
        self.stamp_a(a, b, -g);
        self.stamp_a(b, a, -g);
    }

    /// Stamp a current source between two nodes.
    /// Current `i` flows from a to b through the device.
    pub fn stamp_current_source(&mut self, a: NodeId, b: NodeId, i: f64) {
        // Current leaves a and enters b
        self.stamp_b(a, -i);
        self.stamp_b(b, i);
    }

    /// Stamp a voltage source between two nodes with branch current at index br.
    /// V[a] - V[b] = v
    pub fn stamp_voltage_source(&mut self, a: NodeId, b: NodeId, br: BranchId, v: f64) {
        // KCL contribution of the branch current
        self.stamp_a(a, br, 1.0);
        self.stamp_a(b, br, -1.0);
        // KVL equation
        self.stamp_a(br, a, 1.0);
        self.stamp_a(br, b, -1.0);
        self.stamp_b(br, v);
    }

    /// Stamp a VCCS (Voltage-Controlled Current Source).
    /// Current gm * (V[cp] - V[cn]) flows from `out_p` to `out_n` through the device.
    pub fn stamp_vccs(&mut self, out_p: NodeId, out_n: NodeId, cp: NodeId, cn: NodeId, gm: f64) {
        self.stamp_a(out_p, cp, gm);
        self.stamp_a(out_p, cn, -gm);
        self.stamp_a(out_n, cp, -gm);
        self.stamp_a(out_n, cn, gm);
    }
}
