//! Circuit validation.

use log::warn;

use crate::error::{NodalError, Result};

use super::Circuit;

/// Validate a circuit for simulation.
///
/// An empty circuit is rejected. Nodes touched by a single terminal are
/// reported but allowed: they usually hang off a capacitor or an unused
/// output and only become a problem if they leave the matrix singular.
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    if circuit.devices().is_empty() {
        return Err(NodalError::EmptyCircuit);
    }

    let network = circuit.network();
    let mut connections = vec![0usize; network.num_nodes()];
    for device in circuit.devices() {
        for node in device.nodes() {
            connections[node.0] += 1;
        }
    }
    for node in network.nodes() {
        if connections[node.0] == 1 {
            warn!("node '{}' has only one connection", network.node_name(node));
        }
    }

    Ok(())
}
