//! A set of independent valves sharing one node numbering.

use crate::error::{SimError, SimResult};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use vn_core::NodeId;
use vn_fluids::{FlowRelation, FluidState};
use vn_valve::{FlowSummary, PortStates, PressureSensitiveValve, SensedPotentials};

/// A valve and the nodes it is wired to.
#[derive(Debug)]
pub struct BankEntry {
    pub valve: PressureSensitiveValve,
    /// Inlet and outlet nodes
    pub ports: [NodeId; 2],
    /// Nodes whose potential difference is the control pressure
    pub sense: [NodeId; 2],
}

/// Valves stepped together against the same node potentials.
///
/// Valves share no state, so [`step`](Self::step) runs them in parallel; each
/// one writes only its own admittance block.
#[derive(Debug, Default)]
pub struct ValveBank {
    node_count: usize,
    entries: Vec<BankEntry>,
}

impl ValveBank {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            entries: Vec::new(),
        }
    }

    /// Add a valve, checking its node ids against the bank's node count.
    pub fn push(&mut self, entry: BankEntry) -> SimResult<usize> {
        for node in entry.ports.iter().chain(entry.sense.iter()) {
            if node.slot() >= self.node_count {
                return Err(SimError::IndexOob {
                    what: "valve node",
                    index: node.slot(),
                    len: self.node_count,
                });
            }
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[BankEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&BankEntry> {
        self.entries.iter().find(|e| e.valve.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut BankEntry> {
        self.entries.iter_mut().find(|e| e.valve.name() == name)
    }

    fn check_lengths(&self, potentials: &[f64], fluids: &[FluidState]) -> SimResult<()> {
        if potentials.len() != self.node_count {
            return Err(SimError::InvalidArg {
                what: "potentials length must match node count",
            });
        }
        if fluids.len() != self.node_count {
            return Err(SimError::InvalidArg {
                what: "fluids length must match node count",
            });
        }
        Ok(())
    }

    /// Step every valve with the node potentials (kPa) and fluid states.
    pub fn step(
        &mut self,
        potentials: &[f64],
        fluids: &[FluidState],
        relation: &dyn FlowRelation,
        dt: f64,
    ) -> SimResult<()> {
        self.check_lengths(potentials, fluids)?;
        self.entries.par_iter_mut().for_each(|entry| {
            let [a, b] = entry.sense;
            let [inlet, outlet] = entry.ports;
            let sensed = SensedPotentials::new(potentials[a.slot()], potentials[b.slot()]);
            let ports = PortStates {
                inlet: &fluids[inlet.slot()],
                outlet: &fluids[outlet.slot()],
            };
            entry.valve.step(sensed, ports, relation, dt);
        });
        Ok(())
    }

    /// Flows through every valve for the given potentials.
    pub fn compute_flows(
        &mut self,
        potentials: &[f64],
        fluids: &[FluidState],
    ) -> SimResult<Vec<FlowSummary>> {
        self.check_lengths(potentials, fluids)?;
        let flows = self
            .entries
            .par_iter_mut()
            .map(|entry| {
                let [inlet, outlet] = entry.ports;
                let ports = PortStates {
                    inlet: &fluids[inlet.slot()],
                    outlet: &fluids[outlet.slot()],
                };
                entry
                    .valve
                    .compute_flows([potentials[inlet.slot()], potentials[outlet.slot()]], ports)
            })
            .collect();
        Ok(flows)
    }

    /// Stamp each valve's admittance block and source into the network system.
    pub fn assemble(&self) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.node_count;
        let mut matrix = DMatrix::zeros(n, n);
        let mut source = DVector::zeros(n);
        for entry in &self.entries {
            let block = entry.valve.admittance();
            let rhs = entry.valve.source();
            let slots = [entry.ports[0].slot(), entry.ports[1].slot()];
            for (i, &row) in slots.iter().enumerate() {
                source[row] += rhs[i];
                for (j, &col) in slots.iter().enumerate() {
                    matrix[(row, col)] += block[(i, j)];
                }
            }
        }
        (matrix, source)
    }

    /// True if any valve rewrote its admittance block since the last acknowledge.
    pub fn needs_refactor(&self) -> bool {
        self.entries.iter().any(|e| e.valve.admittance_updated())
    }

    /// Mark every admittance block as consumed.
    pub fn acknowledge(&mut self) {
        for entry in &mut self.entries {
            entry.valve.acknowledge_admittance();
        }
    }
}
