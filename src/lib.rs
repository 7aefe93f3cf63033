//! # Nodal Core
//!
//! A DC operating-point circuit simulator.
//!
//! This library provides:
//! - A node/branch network model that maps circuit quantities onto matrix rows
//! - An extensible device framework with a fixed evaluation lifecycle
//! - A device library (passives, independent and controlled sources, diode,
//!   BJT, MOSFET, JFET, op-amp)
//! - Modified Nodal Analysis (MNA) assembly, dense Gaussian elimination and
//!   a damped Newton-Raphson controller
//!
//! ## Architecture
//!
//! - [`circuit`] - Nodes, branches and the [`Circuit`] that owns the devices
//! - [`devices`] - The [`Device`](devices::Device) contract and the device library
//! - [`solver`] - Linear solver, stamping facade and the iteration controller
//!
//! ## Usage
//!
//! ```
//! use nodal_core::devices::num;
//! use nodal_core::{solve, Circuit, SolveOptions};
//!
//! let mut circuit = Circuit::new();
//! circuit.add_device("V", "V1", &["in", "0"], &[("V", num(10.0))])?;
//! circuit.add_device("R", "R1", &["in", "out"], &[("R", num(1000.0))])?;
//! circuit.add_device("R", "R2", &["out", "0"], &[("R", num(1000.0))])?;
//!
//! solve(&mut circuit, &SolveOptions::default())?;
//! assert!((circuit.node_voltage("out")? - 5.0).abs() < 1e-9);
//! # Ok::<(), nodal_core::NodalError>(())
//! ```
//!
//! ## Solve Method
//!
//! Each Newton iteration:
//!
//! 1. Clears the system matrix A and right-hand side b
//! 2. Lets every device linearize itself around the last node voltages
//! 3. Lets every device stamp its linearization into A and b
//! 4. Solves Ax = b and writes x back into node voltages and branch currents
//!
//! Iteration stops once two consecutive solutions agree within
//! `abs_tol + rel_tol * max(|new|, |old|)` for every unknown.

pub mod circuit;
pub mod devices;
pub mod error;
pub mod solver;

// Re-export main types for convenience
pub use circuit::Circuit;
pub use error::{NodalError, Result};
pub use solver::{solve, SolveOptions, Simulator};

/// The electrical charge on the electron, C.
pub const Q: f64 = 1.602176634e-19;

/// The Boltzmann constant, J/K.
pub const K: f64 = 1.380649e-23;

/// Offset between degrees Celsius and kelvin.
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Default circuit temperature in degrees Celsius (300 K).
pub const DEFAULT_TEMP: f64 = 26.85;

/// Default minimum conductance added across nonlinear devices.
pub const GMIN: f64 = 1e-12;
