//! Circuit graph structure.

use std::collections::HashMap;

use log::debug;

use super::network::Network;
use super::types::{BranchId, DeviceId, NodeId};
use crate::devices::{self, Device, DeviceInstance, ParamValue, Params, ProbeValue};
use crate::error::{NodalError, Result};

/// A circuit: the node network plus every device connected to it.
#[derive(Debug, Default)]
pub struct Circuit {
    /// Nodes, branches and the last solution
    network: Network,
    /// All devices in insertion order
    devices: Vec<DeviceInstance>,
    /// Mapping from instance names to device IDs
    device_map: HashMap<String, DeviceId>,
}

impl Circuit {
    /// Create an empty circuit containing only the ground node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` an additional alias of the ground node.
    pub fn ground(&mut self, name: &str) -> Result<NodeId> {
        if self.network.alias_ground(name) {
            Ok(NodeId::GROUND)
        } else {
            Err(NodalError::InvalidTopology {
                message: format!("node '{name}' already exists and cannot become ground"),
            })
        }
    }

    /// Return the node with the given name, creating it on first use.
    pub fn node(&mut self, name: &str) -> NodeId {
        self.network.make_node(name)
    }

    /// Add a device of a built-in class.
    ///
    /// `terminals` are node names in the class's terminal order; unknown
    /// names create new nodes. Parameters are validated before anything is
    /// added to the circuit.
    pub fn add_device(
        &mut self,
        class: &str,
        name: &str,
        terminals: &[&str],
        params: &[(&str, ParamValue)],
    ) -> Result<DeviceId> {
        let device = devices::create_device(class)?;
        self.add_instance(name, terminals, device, params)
    }

    /// Add a device built outside the built-in registry.
    pub fn add_instance(
        &mut self,
        name: &str,
        terminals: &[&str],
        mut device: Box<dyn Device>,
        params: &[(&str, ParamValue)],
    ) -> Result<DeviceId> {
        if self.device_map.contains_key(name) {
            return Err(NodalError::DuplicateDevice {
                name: name.to_string(),
            });
        }

        let class = device.class();
        if terminals.len() != class.num_terminals {
            return Err(NodalError::TerminalCount {
                device: name.to_string(),
                expected: class.num_terminals,
                found: terminals.len(),
            });
        }

        let params = Params::new(name, class.params, params)?;

        let nodes: Vec<NodeId> = terminals
            .iter()
            .map(|terminal| self.network.make_node(terminal))
            .collect();
        device.connect(&mut self.network, &nodes);

        let id = DeviceId(self.devices.len());
        debug!("added {} '{}' on {:?}", class.id, name, terminals);
        self.devices
            .push(DeviceInstance::new(name.to_string(), nodes, device, params));
        self.device_map.insert(name.to_string(), id);
        Ok(id)
    }

    /// The node network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// All devices in insertion order.
    pub fn devices(&self) -> &[DeviceInstance] {
        &self.devices
    }

    /// Find a device by instance name.
    pub fn device(&self, name: &str) -> Result<&DeviceInstance> {
        self.device_map
            .get(name)
            .map(|id| &self.devices[id.0])
            .ok_or_else(|| NodalError::DeviceNotFound {
                name: name.to_string(),
            })
    }

    /// Read an output probe of a device.
    pub fn op(&self, device: &str, name: &str) -> Result<f64> {
        self.device(device)?.op(name)
    }

    /// Every output probe of a device, in declaration order.
    pub fn probes(&self, device: &str) -> Result<Vec<ProbeValue>> {
        Ok(self.device(device)?.probes())
    }

    /// Find a node ID by name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.network.find_node(name)
    }

    /// Voltage of a named node from the last solve.
    pub fn node_voltage(&self, name: &str) -> Result<f64> {
        self.find_node(name)
            .map(|node| self.network.voltage(node))
            .ok_or_else(|| NodalError::NodeNotFound {
                node: name.to_string(),
            })
    }

    /// Current through a branch from the last solve.
    pub fn branch_current(&self, branch: BranchId) -> f64 {
        self.network.current(branch)
    }

    /// Get the total size of the MNA solution vector.
    pub fn matrix_size(&self) -> usize {
        self.network.unknowns()
    }

    /// Change one parameter of a device. The next solve picks it up.
    pub fn set_param(&mut self, device: &str, name: &str, value: ParamValue) -> Result<()> {
        let id = *self
            .device_map
            .get(device)
            .ok_or_else(|| NodalError::DeviceNotFound {
                name: device.to_string(),
            })?;
        self.devices[id.0].set_param(name, value)
    }

    /// Forget the last solution so the next solve starts from zero.
    pub fn reset_state(&mut self) {
        self.network.reset();
        for device in &mut self.devices {
            device.reset_state();
        }
    }

    /// Every unknown with its readback label: `V[node]` for node voltages,
    /// `I[a->b]` for branch currents.
    pub fn operating_point(&self) -> Vec<(String, f64)> {
        let voltages = self.network.nodes().map(|node| {
            (
                format!("V[{}]", self.network.node_name(node)),
                self.network.voltage(node),
            )
        });
        let currents = self
            .network
            .branches()
            .map(|branch| (self.network.branch_label(branch), self.network.current(branch)));
        voltages.chain(currents).collect()
    }

    pub(crate) fn split_mut(&mut self) -> (&mut Network, &mut [DeviceInstance]) {
        (&mut self.network, self.devices.as_mut_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::num;

    #[test]
    fn test_add_device_creates_nodes() {
        let mut circuit = Circuit::new();
        circuit
            .add_device("V", "V1", &["in", "0"], &[("V", num(5.0))])
            .unwrap();
        circuit
            .add_device("R", "R1", &["in", "out"], &[("R", num(1e3))])
            .unwrap();
        assert_eq!(circuit.find_node("in"), Some(NodeId(1)));
        assert_eq!(circuit.find_node("out"), Some(NodeId(2)));
        // Two nodes plus the source branch
        assert_eq!(circuit.matrix_size(), 3);
        assert_eq!(circuit.devices().len(), 2);
    }

    #[test]
    fn test_duplicate_device() {
        let mut circuit = Circuit::new();
        circuit
            .add_device("R", "R1", &["a", "0"], &[("R", num(1.0))])
            .unwrap();
        let err = circuit
            .add_device("R", "R1", &["b", "0"], &[("R", num(1.0))])
            .unwrap_err();
        assert!(matches!(err, NodalError::DuplicateDevice { .. }));
    }

    #[test]
    fn test_rejected_device_leaves_no_trace() {
        let mut circuit = Circuit::new();
        let err = circuit
            .add_device("R", "R1", &["a", "b", "c"], &[("R", num(1.0))])
            .unwrap_err();
        assert_eq!(
            err,
            NodalError::TerminalCount {
                device: "R1".to_string(),
                expected: 2,
                found: 3
            }
        );
        let err = circuit
            .add_device("R", "R1", &["a", "b"], &[("R", num(-1.0))])
            .unwrap_err();
        assert!(matches!(err, NodalError::ParameterRange { .. }));
        assert_eq!(circuit.find_node("a"), None);
        assert!(circuit.devices().is_empty());
    }

    #[test]
    fn test_unknown_class() {
        let mut circuit = Circuit::new();
        let err = circuit.add_device("Q9", "X1", &["a", "0"], &[]).unwrap_err();
        assert!(matches!(err, NodalError::UnknownDeviceClass { .. }));
    }

    #[test]
    fn test_ground_aliases() {
        let mut circuit = Circuit::new();
        assert_eq!(circuit.node("GND"), NodeId::GROUND);
        assert_eq!(circuit.ground("NCN").unwrap(), NodeId::GROUND);
        assert_eq!(circuit.node("NCN"), NodeId::GROUND);
        circuit.node("x");
        assert!(matches!(
            circuit.ground("x"),
            Err(NodalError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn test_lookup_errors() {
        let circuit = Circuit::new();
        assert!(matches!(
            circuit.node_voltage("nowhere"),
            Err(NodalError::NodeNotFound { .. })
        ));
        assert!(matches!(
            circuit.op("R9", "V"),
            Err(NodalError::DeviceNotFound { .. })
        ));
        assert!(circuit.probes("R9").is_err());
    }

    #[test]
    fn test_probe_table_order() {
        let mut circuit = Circuit::new();
        circuit
            .add_device("R", "R1", &["a", "0"], &[("R", num(1.0))])
            .unwrap();
        let names: Vec<&str> = circuit
            .probes("R1")
            .unwrap()
            .iter()
            .map(|probe| probe.name)
            .collect();
        assert_eq!(names, vec!["V", "I", "P"]);
    }

    #[test]
    fn test_set_param_validates() {
        let mut circuit = Circuit::new();
        circuit
            .add_device("R", "R1", &["a", "0"], &[("R", num(1.0))])
            .unwrap();
        circuit.set_param("R1", "R", num(2.0)).unwrap();
        assert_eq!(circuit.device("R1").unwrap().params().number("R"), 2.0);
        assert!(circuit.set_param("R1", "C", num(1.0)).is_err());
        assert!(circuit.set_param("R2", "R", num(1.0)).is_err());
    }

    #[test]
    fn test_operating_point_labels() {
        let mut circuit = Circuit::new();
        circuit
            .add_device("V", "V1", &["in", "0"], &[("V", num(1.0))])
            .unwrap();
        let labels: Vec<String> = circuit
            .operating_point()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["V[in]", "I[in->0]"]);
    }
}
