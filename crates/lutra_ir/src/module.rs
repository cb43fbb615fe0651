//! Module container and netlist-building helpers.

use crate::arena::Arena;
use crate::cell::{Cell, CellKind, Connection};
use crate::ids::{CellId, PortId, SignalId};
use crate::port::{Port, PortDirection};
use crate::signal::Signal;
use lutra_common::Ident;
use serde::{Deserialize, Serialize};

/// A single gate-level module.
///
/// `aliases` records pairs of trivially equivalent nets (assign-through
/// wires) left behind by elaboration; the [`SigMap`](crate::sigmap::SigMap)
/// collapses them to canonical representatives before mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// The module name.
    pub name: Ident,
    /// Module-level ports.
    pub ports: Vec<Port>,
    /// All signals in the module.
    pub signals: Arena<SignalId, Signal>,
    /// All cells in the module.
    pub cells: Arena<CellId, Cell>,
    /// Pairs of aliased signals.
    pub aliases: Vec<(SignalId, SignalId)>,
}

impl Module {
    /// Creates a new, empty module.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            ports: Vec::new(),
            signals: Arena::new(),
            cells: Arena::new(),
            aliases: Vec::new(),
        }
    }

    /// Adds a signal and returns its ID.
    pub fn add_signal(&mut self, name: Ident) -> SignalId {
        let id = SignalId::from_raw(self.signals.len() as u32);
        self.signals.alloc(Signal { id, name })
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(&mut self, name: Ident, kind: CellKind, connections: Vec<Connection>) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        self.cells.alloc(Cell {
            id,
            name,
            kind,
            connections,
        })
    }

    /// Adds a module port covering the given signal bits.
    pub fn add_port(&mut self, name: Ident, direction: PortDirection, bits: Vec<SignalId>) -> PortId {
        let id = PortId::from_raw(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            name,
            direction,
            bits,
        });
        id
    }

    /// Records that two signals alias the same net.
    pub fn add_alias(&mut self, a: SignalId, b: SignalId) {
        self.aliases.push((a, b));
    }

    /// Iterates the bits of all input ports.
    pub fn input_bits(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
            .flat_map(|p| p.bits.iter().copied())
    }

    /// Iterates the bits of all output ports.
    pub fn output_bits(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Output)
            .flat_map(|p| p.bits.iter().copied())
    }
}

/// Creates an input connection.
pub fn input_conn(port: Ident, signal: SignalId) -> Connection {
    Connection {
        port,
        direction: PortDirection::Input,
        signal,
    }
}

/// Creates an output connection.
pub fn output_conn(port: Ident, signal: SignalId) -> Connection {
    Connection {
        port,
        direction: PortDirection::Output,
        signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lutra_common::Interner;

    #[test]
    fn add_signal_assigns_sequential_ids() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"));
        let a = m.add_signal(interner.get_or_intern("a"));
        let b = m.add_signal(interner.get_or_intern("b"));
        assert_eq!(a.as_raw(), 0);
        assert_eq!(b.as_raw(), 1);
        assert_eq!(m.signals.len(), 2);
    }

    #[test]
    fn add_cell_and_query_connections() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"));
        let a = m.add_signal(interner.get_or_intern("a"));
        let y = m.add_signal(interner.get_or_intern("y"));
        let c = m.add_cell(
            interner.get_or_intern("inv0"),
            CellKind::Not,
            vec![
                input_conn(interner.get_or_intern("A"), a),
                output_conn(interner.get_or_intern("Y"), y),
            ],
        );
        assert_eq!(m.cells.get(c).output_signal(), Some(y));
    }

    #[test]
    fn port_bits_iteration() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"));
        let a0 = m.add_signal(interner.get_or_intern("a[0]"));
        let a1 = m.add_signal(interner.get_or_intern("a[1]"));
        let y = m.add_signal(interner.get_or_intern("y"));
        m.add_port(
            interner.get_or_intern("a"),
            PortDirection::Input,
            vec![a0, a1],
        );
        m.add_port(interner.get_or_intern("y"), PortDirection::Output, vec![y]);

        let inputs: Vec<SignalId> = m.input_bits().collect();
        assert_eq!(inputs, vec![a0, a1]);
        let outputs: Vec<SignalId> = m.output_bits().collect();
        assert_eq!(outputs, vec![y]);
    }

    #[test]
    fn aliases_recorded() {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"));
        let a = m.add_signal(interner.get_or_intern("a"));
        let b = m.add_signal(interner.get_or_intern("a_alias"));
        m.add_alias(a, b);
        assert_eq!(m.aliases, vec![(a, b)]);
    }
}
