//! Endpoint role resolution.
//!
//! Classifies the endpoints of a multi-channel node by generic device class
//! and assigns the singular roles (root control, temperature sensor) and the
//! list of input sensors. Ties always go to the lowest endpoint id, which is
//! how manufacturers number endpoints by physical terminal.

pub mod graph;

pub use graph::{CommandClass, Endpoint, EndpointGraph, GenericDeviceClass};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Role assignment for one device session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// All discovered endpoints in ascending id order.
    pub endpoints: Vec<Endpoint>,
    pub root_endpoint: Option<u8>,
    pub temperature_endpoint: Option<u8>,
    /// Binary/notification sensor endpoints in ascending id order.
    pub input_endpoints: Vec<u8>,
    /// Command classes of the root node.
    pub root_command_classes: BTreeSet<CommandClass>,
}

impl Topology {
    /// A node without endpoints: everything binds to the root node.
    pub fn is_flat(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoint(&self, id: u8) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.id == id)
    }

    /// Whether `endpoint` (`None` for the root node) supports `command_class`.
    pub fn supports(&self, endpoint: Option<u8>, command_class: CommandClass) -> bool {
        match endpoint {
            None => self.root_command_classes.contains(&command_class),
            Some(id) => self
                .endpoint(id)
                .is_some_and(|endpoint| endpoint.supports(command_class)),
        }
    }
}

/// Assigns endpoint roles from an [`EndpointGraph`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyResolver {
    root_class_override: Option<GenericDeviceClass>,
}

impl TopologyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `class` instead of the switch classes to find the root endpoint.
    ///
    /// Thermostats expose their controlling endpoint with a thermostat
    /// generic class rather than a switch.
    pub fn with_root_class(class: GenericDeviceClass) -> Self {
        Self {
            root_class_override: Some(class),
        }
    }

    /// Resolve roles. Never fails; missing roles stay `None`/empty.
    pub fn resolve(&self, graph: &EndpointGraph) -> Topology {
        // BTreeMap iteration is ascending by id
        let endpoints: Vec<Endpoint> = graph.endpoints.values().cloned().collect();

        let root_endpoint = endpoints
            .iter()
            .find(|endpoint| match self.root_class_override {
                Some(class) => endpoint.generic_class == class,
                None => endpoint.generic_class.is_switch(),
            })
            .map(|endpoint| endpoint.id);

        let temperature_endpoint = endpoints
            .iter()
            .find(|endpoint| endpoint.generic_class == GenericDeviceClass::SensorMultilevel)
            .map(|endpoint| endpoint.id);

        let input_endpoints: Vec<u8> = endpoints
            .iter()
            .filter(|endpoint| endpoint.generic_class.is_input_sensor())
            .map(|endpoint| endpoint.id)
            .collect();

        let topology = Topology {
            endpoints,
            root_endpoint,
            temperature_endpoint,
            input_endpoints,
            root_command_classes: graph.root_command_classes.clone(),
        };
        log_topology(&topology);
        topology
    }
}

fn log_topology(topology: &Topology) {
    if topology.is_flat() {
        info!("[Topology] Flat device, binding to root node");
        return;
    }
    info!(
        "[Topology] {} endpoint(s): root={:?} temperature={:?} inputs={:?}",
        topology.endpoints.len(),
        topology.root_endpoint,
        topology.temperature_endpoint,
        topology.input_endpoints
    );
    for endpoint in &topology.endpoints {
        let classes: Vec<&str> = endpoint
            .command_classes
            .iter()
            .map(|cc| cc.as_ref())
            .collect();
        debug!(
            "[Topology]   endpoint {}: {} [{}]",
            endpoint.id,
            endpoint.generic_class,
            classes.join(", ")
        );
    }
}
