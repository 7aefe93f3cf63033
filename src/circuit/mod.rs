//! Circuit representation and validation.
//!
//! This module provides the in-memory circuit model. The [`Network`] owns the
//! unknowns of the linear system (node voltages and branch currents); the
//! [`Circuit`] adds the devices connected to it and the readback API.

mod graph;
mod network;
mod types;
mod validate;

pub use graph::Circuit;
pub use network::{Branch, Network, GROUND_NAME};
pub use types::*;
pub use validate::validate_circuit;
