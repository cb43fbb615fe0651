//! The combinational-mapping view of a module.
//!
//! Construction records the port connections of every known cell, including
//! sequential and I/O primitives, so that boundary-driven signals appear in
//! the driver map and are correctly identified as mapping roots. The
//! topological order is computed only over signals whose driver is a
//! combinational gate; an input edge from a non-combinational driver
//! contributes nothing to the in-degree and therefore acts as a primary
//! input.

use lutra_common::Interner;
use lutra_diagnostics::{code::codes, Diagnostic, DiagnosticSink};
use lutra_ir::{CellId, CellKind, CellLibrary, Module, PortDirection, SigMap, SignalId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Summary counters for a built graph.
#[derive(Debug, Clone, Copy)]
pub struct GraphStats {
    /// Signals with a recorded driver.
    pub n_driven: usize,
    /// Signals with at least one reader.
    pub n_read: usize,
    /// Combinational-gate outputs in the topological order.
    pub n_topo: usize,
}

/// Driver/reader lookup and cached topological order over canonical bits.
pub struct MappingGraph {
    drivers: HashMap<SignalId, CellId>,
    readers: HashMap<SignalId, Vec<CellId>>,
    cell_inputs: HashMap<CellId, Vec<SignalId>>,
    cell_outputs: HashMap<CellId, SignalId>,
    comb_cells: HashSet<CellId>,
    transparent_cells: HashSet<CellId>,
    comb_outputs: BTreeSet<SignalId>,
    topo: Vec<SignalId>,
    reverse_topo: Vec<SignalId>,
    primary_inputs: BTreeSet<SignalId>,
    primary_outputs: BTreeSet<SignalId>,
}

impl MappingGraph {
    /// Builds the mapping view of a module.
    ///
    /// Cells the library does not know are skipped with a structural
    /// warning. If the combinational subgraph contains a cycle, a warning
    /// is emitted and the partial topological order is kept; signals on the
    /// cycle end up with no enumerated cuts.
    pub fn build(
        module: &Module,
        sigmap: &SigMap,
        library: &dyn CellLibrary,
        interner: &Interner,
        sink: &DiagnosticSink,
    ) -> Self {
        let mut graph = Self {
            drivers: HashMap::new(),
            readers: HashMap::new(),
            cell_inputs: HashMap::new(),
            cell_outputs: HashMap::new(),
            comb_cells: HashSet::new(),
            transparent_cells: HashSet::new(),
            comb_outputs: BTreeSet::new(),
            topo: Vec::new(),
            reverse_topo: Vec::new(),
            primary_inputs: BTreeSet::new(),
            primary_outputs: BTreeSet::new(),
        };

        // First sweep: drivers and classification, for every known cell.
        for (cell_id, cell) in module.cells.iter() {
            if !library.is_known(&cell.kind) {
                sink.emit(
                    Diagnostic::warning(
                        codes::UNKNOWN_CELL,
                        format!("skipping unknown cell '{}'", interner.resolve(cell.name)),
                    )
                    .with_note("the cell and its connections are invisible to the mapper"),
                );
                continue;
            }
            if library.is_combinational(&cell.kind) {
                graph.comb_cells.insert(cell_id);
            }
            if library.is_transparent(&cell.kind) {
                graph.transparent_cells.insert(cell_id);
            }
            for conn in &cell.connections {
                if conn.direction == PortDirection::Output {
                    let bit = sigmap.canonical(conn.signal);
                    graph.drivers.insert(bit, cell_id);
                    graph.cell_outputs.entry(cell_id).or_insert(bit);
                }
            }
        }

        // Second sweep: input lists and reader map. Constant-driven bits are
        // dropped here so they never surface as cut inputs; the simulator
        // resolves them through their driver instead.
        for (cell_id, cell) in module.cells.iter() {
            if !library.is_known(&cell.kind) {
                continue;
            }
            let mut inputs = Vec::new();
            for conn in &cell.connections {
                if conn.direction != PortDirection::Input {
                    continue;
                }
                let bit = sigmap.canonical(conn.signal);
                if graph.is_const_driven(module, bit) {
                    continue;
                }
                inputs.push(bit);
                graph.readers.entry(bit).or_default().push(cell_id);
            }
            graph.cell_inputs.insert(cell_id, inputs);
        }

        for bit in module.input_bits() {
            graph.primary_inputs.insert(sigmap.canonical(bit));
        }
        for bit in module.output_bits() {
            graph.primary_outputs.insert(sigmap.canonical(bit));
        }

        for (&bit, cell_id) in &graph.drivers {
            if graph.comb_cells.contains(cell_id) {
                graph.comb_outputs.insert(bit);
            }
        }

        graph.compute_topological_order(sink);
        graph
    }

    fn is_const_driven(&self, module: &Module, bit: SignalId) -> bool {
        self.drivers
            .get(&bit)
            .map(|&c| matches!(module.cells.get(c).kind, CellKind::Const { .. }))
            .unwrap_or(false)
    }

    /// Kahn's algorithm over combinational-gate outputs only.
    fn compute_topological_order(&mut self, sink: &DiagnosticSink) {
        let mut in_degree: HashMap<SignalId, usize> = HashMap::new();
        let mut queue: VecDeque<SignalId> = VecDeque::new();

        for &bit in &self.comb_outputs {
            let driver = self.drivers[&bit];
            let degree = self
                .cell_inputs(driver)
                .iter()
                .filter(|input| self.is_comb_driven(**input))
                .count();
            in_degree.insert(bit, degree);
            if degree == 0 {
                queue.push_back(bit);
            }
        }

        self.topo.clear();
        while let Some(bit) = queue.pop_front() {
            self.topo.push(bit);
            for &reader in self.readers(bit) {
                if !self.comb_cells.contains(&reader) {
                    continue;
                }
                let Some(&output) = self.cell_outputs.get(&reader) else {
                    continue;
                };
                if let Some(degree) = in_degree.get_mut(&output) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(output);
                    }
                }
            }
        }

        if self.topo.len() != self.comb_outputs.len() {
            sink.emit(Diagnostic::warning(
                codes::COMBINATIONAL_CYCLE,
                format!(
                    "combinational loop: {} of {} gate outputs ordered",
                    self.topo.len(),
                    self.comb_outputs.len()
                ),
            ));
        }

        self.reverse_topo = self.topo.iter().rev().copied().collect();
    }

    /// Returns the cell driving a signal, if any.
    pub fn driver(&self, signal: SignalId) -> Option<CellId> {
        self.drivers.get(&signal).copied()
    }

    /// Returns the cells reading a signal.
    pub fn readers(&self, signal: SignalId) -> &[CellId] {
        self.readers
            .get(&signal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns a cell's canonical input signals in connection order.
    pub fn cell_inputs(&self, cell: CellId) -> &[SignalId] {
        self.cell_inputs
            .get(&cell)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns a cell's (first) output signal.
    pub fn cell_output(&self, cell: CellId) -> Option<SignalId> {
        self.cell_outputs.get(&cell).copied()
    }

    /// Returns `true` if the cell was recorded at build time.
    pub fn is_known_cell(&self, cell: CellId) -> bool {
        self.cell_inputs.contains_key(&cell) || self.cell_outputs.contains_key(&cell)
    }

    /// Returns `true` for combinational gate cells.
    pub fn is_combinational(&self, cell: CellId) -> bool {
        self.comb_cells.contains(&cell)
    }

    /// Returns `true` for transparent single-input buffer cells.
    pub fn is_transparent(&self, cell: CellId) -> bool {
        self.transparent_cells.contains(&cell)
    }

    /// Returns `true` if a signal is driven by a combinational gate.
    pub fn is_comb_driven(&self, signal: SignalId) -> bool {
        self.drivers
            .get(&signal)
            .map(|c| self.comb_cells.contains(c))
            .unwrap_or(false)
    }

    /// All combinational-gate output signals, sorted.
    pub fn comb_outputs(&self) -> &BTreeSet<SignalId> {
        &self.comb_outputs
    }

    /// Iterates every signal with a recorded driver, in no particular order.
    pub fn driven_signals(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.drivers.keys().copied()
    }

    /// The cached topological order of combinational-gate outputs.
    pub fn topo_order(&self) -> &[SignalId] {
        &self.topo
    }

    /// The reversed topological order.
    pub fn reverse_topo_order(&self) -> &[SignalId] {
        &self.reverse_topo
    }

    /// Canonical bits of the module's input ports.
    pub fn primary_inputs(&self) -> &BTreeSet<SignalId> {
        &self.primary_inputs
    }

    /// Canonical bits of the module's output ports.
    pub fn primary_outputs(&self) -> &BTreeSet<SignalId> {
        &self.primary_outputs
    }

    /// Summary counters.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            n_driven: self.drivers.len(),
            n_read: self.readers.len(),
            n_topo: self.topo.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lutra_ir::module::{input_conn, output_conn};
    use lutra_ir::StdCellLibrary;

    struct TestModule {
        module: Module,
        interner: Interner,
    }

    impl TestModule {
        fn new() -> Self {
            let interner = Interner::new();
            let module = Module::new(interner.get_or_intern("top"));
            Self { module, interner }
        }

        fn sig(&mut self, name: &str) -> SignalId {
            self.module.add_signal(self.interner.get_or_intern(name))
        }

        fn gate(&mut self, name: &str, kind: CellKind, inputs: &[SignalId], output: SignalId) -> CellId {
            let mut conns = Vec::new();
            for (i, &sig) in inputs.iter().enumerate() {
                let port = self.interner.get_or_intern(&format!("{}", (b'A' + i as u8) as char));
                conns.push(input_conn(port, sig));
            }
            conns.push(output_conn(self.interner.get_or_intern("Y"), output));
            self.module
                .add_cell(self.interner.get_or_intern(name), kind, conns)
        }

        fn graph(&self) -> (MappingGraph, DiagnosticSink) {
            let sink = DiagnosticSink::new();
            let sigmap = SigMap::build(&self.module);
            let graph = MappingGraph::build(
                &self.module,
                &sigmap,
                &StdCellLibrary,
                &self.interner,
                &sink,
            );
            (graph, sink)
        }
    }

    #[test]
    fn driver_and_readers() {
        let mut t = TestModule::new();
        let a = t.sig("a");
        let b = t.sig("b");
        let y = t.sig("y");
        let c = t.gate("and0", CellKind::And, &[a, b], y);
        let (graph, _) = t.graph();

        assert_eq!(graph.driver(y), Some(c));
        assert_eq!(graph.driver(a), None);
        assert_eq!(graph.readers(a), &[c]);
        assert_eq!(graph.cell_inputs(c), &[a, b]);
        assert_eq!(graph.cell_output(c), Some(y));
        assert!(graph.is_combinational(c));
    }

    #[test]
    fn topo_order_respects_dependencies() {
        let mut t = TestModule::new();
        let a = t.sig("a");
        let b = t.sig("b");
        let c = t.sig("c");
        let t1 = t.sig("t1");
        let y = t.sig("y");
        t.gate("x1", CellKind::Xor, &[a, b], t1);
        t.gate("x2", CellKind::Xor, &[t1, c], y);
        let (graph, sink) = t.graph();

        let order = graph.topo_order();
        assert_eq!(order.len(), 2);
        let pos = |s: SignalId| order.iter().position(|&x| x == s).unwrap();
        assert!(pos(t1) < pos(y));
        assert!(!sink.has_errors());
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn boundary_driver_contributes_no_in_degree() {
        let mut t = TestModule::new();
        let d = t.sig("d");
        let clk = t.sig("clk");
        let q = t.sig("q");
        let y = t.sig("y");
        // DFF drives q; the AND of q is a zero-in-degree gate.
        let clk_port = t.interner.get_or_intern("C");
        let d_port = t.interner.get_or_intern("D");
        let q_port = t.interner.get_or_intern("Q");
        t.module.add_cell(
            t.interner.get_or_intern("ff0"),
            CellKind::Dff,
            vec![
                input_conn(d_port, d),
                input_conn(clk_port, clk),
                output_conn(q_port, q),
            ],
        );
        t.gate("and0", CellKind::And, &[q, q], y);
        let (graph, _) = t.graph();

        assert!(graph.driver(q).is_some());
        assert!(!graph.is_comb_driven(q));
        assert_eq!(graph.topo_order(), &[y]);
    }

    #[test]
    fn cycle_emits_warning_and_partial_order() {
        let mut t = TestModule::new();
        let a = t.sig("a");
        let u = t.sig("u");
        let tt = t.sig("t");
        t.gate("and0", CellKind::And, &[a, u], tt);
        t.gate("or0", CellKind::Or, &[tt, a], u);
        let (graph, sink) = t.graph();

        assert!(graph.topo_order().is_empty());
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::COMBINATIONAL_CYCLE);
    }

    #[test]
    fn unknown_cell_skipped_with_warning() {
        let mut t = TestModule::new();
        let a = t.sig("a");
        let y = t.sig("y");
        let bb_kind = CellKind::BlackBox {
            kind: t.interner.get_or_intern("VENDOR_MACRO"),
        };
        let a_port = t.interner.get_or_intern("A");
        let y_port = t.interner.get_or_intern("Y");
        t.module.add_cell(
            t.interner.get_or_intern("u0"),
            bb_kind,
            vec![input_conn(a_port, a), output_conn(y_port, y)],
        );
        let (graph, sink) = t.graph();

        assert_eq!(graph.driver(y), None);
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, codes::UNKNOWN_CELL);
    }

    #[test]
    fn const_driven_inputs_are_dropped() {
        let mut t = TestModule::new();
        let one = t.sig("one");
        let a = t.sig("a");
        let y = t.sig("y");
        let y_port = t.interner.get_or_intern("Y");
        t.module.add_cell(
            t.interner.get_or_intern("c1"),
            CellKind::Const {
                value: lutra_common::Logic::One,
            },
            vec![output_conn(y_port, one)],
        );
        let c = t.gate("and0", CellKind::And, &[a, one], y);
        let (graph, _) = t.graph();

        assert_eq!(graph.cell_inputs(c), &[a]);
        assert!(graph.readers(one).is_empty());
    }

    #[test]
    fn aliased_bits_are_canonical() {
        let mut t = TestModule::new();
        let a = t.sig("a");
        let a2 = t.sig("a_alias");
        let y = t.sig("y");
        t.module.add_alias(a2, a);
        let c = t.gate("buf0", CellKind::Buf, &[a2], y);
        let (graph, _) = t.graph();

        // The alias collapses onto the smaller ID.
        assert_eq!(graph.cell_inputs(c), &[a]);
    }

    #[test]
    fn port_bits_collected() {
        let mut t = TestModule::new();
        let a = t.sig("a");
        let y = t.sig("y");
        t.gate("buf0", CellKind::Buf, &[a], y);
        let a_name = t.interner.get_or_intern("a");
        let y_name = t.interner.get_or_intern("y");
        t.module.add_port(a_name, PortDirection::Input, vec![a]);
        t.module.add_port(y_name, PortDirection::Output, vec![y]);
        let (graph, _) = t.graph();

        assert!(graph.primary_inputs().contains(&a));
        assert!(graph.primary_outputs().contains(&y));
        let stats = graph.stats();
        assert_eq!(stats.n_topo, 1);
        assert_eq!(stats.n_driven, 1);
    }
}
