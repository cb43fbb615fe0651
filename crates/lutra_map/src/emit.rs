//! Emission of the mapped netlist.
//!
//! Produces a fresh module view containing every non-combinational cell of
//! the input plus one LUT cell per mapped cut. Trivial cuts never
//! materialize, and mapped nodes that no boundary consumer reaches are
//! elided: their logic was absorbed into wider cuts downstream.

use crate::cuts::DoubleCut;
use crate::graph::MappingGraph;
use crate::merger::MappingResult;
use crate::truth::TruthTableComputer;
use lutra_common::{Ident, Interner, Logic, TruthVec};
use lutra_diagnostics::{code::codes, Diagnostic, DiagnosticSink};
use lutra_ir::module::{input_conn, output_conn};
use lutra_ir::{Arena, Cell, CellId, CellKind, Module, Port, SigMap, Signal, SignalId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A module after technology mapping: original boundary cells plus LUTs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedModule {
    /// The module name.
    pub name: Ident,
    /// Ports, unchanged from the input module.
    pub ports: Vec<Port>,
    /// All signals, unchanged from the input module (plus a constant-zero
    /// net when unused LUT pins needed tying).
    pub signals: Arena<SignalId, Signal>,
    /// Boundary cells and emitted LUT cells.
    pub cells: Arena<CellId, Cell>,
}

/// Writes the mapped module for a finished mapping result.
///
/// Truth-table failures on the single-output path leave the node unmapped:
/// a warning is emitted and `stats.n_unmapped` counts the loss.
pub fn write_mapped_module(
    module: &Module,
    graph: &MappingGraph,
    sigmap: &SigMap,
    truth: &TruthTableComputer<'_>,
    result: &mut MappingResult,
    interner: &Interner,
    sink: &DiagnosticSink,
    k: u32,
) -> MappedModule {
    let mut out = MappedModule {
        name: module.name,
        ports: module.ports.clone(),
        signals: module.signals.clone(),
        cells: Arena::new(),
    };

    // Boundary cells survive; covered gates do not.
    for (cell_id, cell) in module.cells.iter() {
        if graph.is_known_cell(cell_id) && graph.is_combinational(cell_id) {
            continue;
        }
        let id = CellId::from_raw(out.cells.len() as u32);
        out.cells.alloc(Cell {
            id,
            ..cell.clone()
        });
    }

    let used = used_signals(module, graph, sigmap, result);
    let mut const_zero: Option<SignalId> = None;
    let mut unmapped = 0usize;

    // Single-output LUTs, in canonical output order.
    for (&output, cut) in &result.single {
        if cut.is_trivial() {
            continue;
        }
        if !used.contains(&output) {
            continue;
        }

        let inputs: Vec<SignalId> = cut.inputs.iter().copied().collect();
        let init = match truth.compute_lut_init(output, &inputs) {
            Ok(init) => init,
            Err(err) => {
                sink.emit(
                    Diagnostic::warning(codes::UNMAPPED_NODE, format!("node left unmapped: {err}"))
                        .with_signal(signal_name(module, interner, output)),
                );
                unmapped += 1;
                continue;
            }
        };

        let mut padded = TruthVec::new(1 << k);
        for i in 0..init.width() {
            padded.set(i, init.get(i));
        }

        let mut conns = Vec::new();
        for pin in 0..k {
            let port = interner.get_or_intern(&format!("I{pin}"));
            let signal = if (pin as usize) < inputs.len() {
                inputs[pin as usize]
            } else {
                tie_zero(&mut out, &mut const_zero, interner)
            };
            conns.push(input_conn(port, signal));
        }
        conns.push(output_conn(interner.get_or_intern("Z"), output));

        let name = interner.get_or_intern(&format!(
            "lut_{}",
            interner.resolve(module.signals.get(output).name)
        ));
        let id = CellId::from_raw(out.cells.len() as u32);
        out.cells.alloc(Cell {
            id,
            name,
            kind: CellKind::Lut {
                width: k,
                init: padded,
            },
            connections: conns,
        });
    }

    // Dual-output LUTs.
    for (&(z, z5), dc) in &result.dual {
        if !used.contains(&z) && !used.contains(&z5) {
            continue;
        }

        let data_inputs: Vec<SignalId> = dc.data_inputs().collect();
        let mut z_inputs = data_inputs.clone();
        z_inputs.push(dc.selector);

        let z_init = match truth.compute_lut_init(z, &z_inputs) {
            Ok(init) => init,
            Err(err) => {
                sink.emit(
                    Diagnostic::warning(codes::UNMAPPED_NODE, format!("pair left unmapped: {err}"))
                        .with_signal(signal_name(module, interner, z)),
                );
                unmapped += 2;
                continue;
            }
        };

        // 64-bit configuration: a full 6-input table directly; narrower
        // tables land in the lower half and repeat in the upper half.
        let init = if z_inputs.len() == 6 {
            z_init
        } else {
            let mut doubled = TruthVec::new(64);
            for i in 0..z_init.width() {
                doubled.set(i, z_init.get(i));
            }
            for i in 0..32 {
                doubled.set(32 + i, doubled.get(i));
            }
            doubled
        };

        let mut conns = Vec::new();
        for pin in 0..5usize {
            let port = interner.get_or_intern(&format!("I{pin}"));
            let signal = if pin < data_inputs.len() {
                data_inputs[pin]
            } else {
                tie_zero(&mut out, &mut const_zero, interner)
            };
            conns.push(input_conn(port, signal));
        }
        conns.push(input_conn(interner.get_or_intern("I5"), dc.selector));
        conns.push(output_conn(interner.get_or_intern("Z"), z));
        conns.push(output_conn(interner.get_or_intern("Z5"), z5));

        let name = interner.get_or_intern(&format!(
            "lutd_{}_{}",
            interner.resolve(module.signals.get(z).name),
            interner.resolve(module.signals.get(z5).name)
        ));
        let id = CellId::from_raw(out.cells.len() as u32);
        out.cells.alloc(Cell {
            id,
            name,
            kind: CellKind::DualLut { init },
            connections: conns,
        });
    }

    result.stats.n_unmapped += unmapped;
    out
}

/// Signals a boundary consumer actually needs: reachable from a primary
/// output or a non-combinational cell input by walking mapping inputs.
fn used_signals(
    module: &Module,
    graph: &MappingGraph,
    sigmap: &SigMap,
    result: &MappingResult,
) -> HashSet<SignalId> {
    let mut dual_by_output: HashMap<SignalId, &DoubleCut> = HashMap::new();
    for dc in result.dual.values() {
        dual_by_output.insert(dc.z, dc);
        dual_by_output.insert(dc.z5, dc);
    }

    let mut roots: BTreeSet<SignalId> = graph.primary_outputs().clone();
    for (cell_id, cell) in module.cells.iter() {
        if !graph.is_known_cell(cell_id) {
            // Unknown cells keep their fan-in alive.
            roots.extend(cell.input_signals().map(|s| sigmap.canonical(s)));
        } else if !graph.is_combinational(cell_id) {
            roots.extend(graph.cell_inputs(cell_id).iter().copied());
        }
    }

    let mut used: HashSet<SignalId> = HashSet::new();
    let mut stack: Vec<SignalId> = roots.into_iter().collect();
    while let Some(signal) = stack.pop() {
        if !used.insert(signal) {
            continue;
        }
        if let Some(cut) = result.single.get(&signal) {
            if !cut.is_trivial() {
                stack.extend(cut.inputs.iter().copied());
            }
        } else if let Some(dc) = dual_by_output.get(&signal) {
            stack.extend(dc.inputs.iter().copied());
        }
    }
    used
}

fn signal_name(module: &Module, interner: &Interner, signal: SignalId) -> String {
    interner.resolve(module.signals.get(signal).name).to_string()
}

/// The shared constant-zero net for unused LUT pins, created on first use.
fn tie_zero(
    out: &mut MappedModule,
    const_zero: &mut Option<SignalId>,
    interner: &Interner,
) -> SignalId {
    if let Some(signal) = *const_zero {
        return signal;
    }
    let sig_id = SignalId::from_raw(out.signals.len() as u32);
    out.signals.alloc(Signal {
        id: sig_id,
        name: interner.get_or_intern("const0"),
    });
    let cell_id = CellId::from_raw(out.cells.len() as u32);
    out.cells.alloc(Cell {
        id: cell_id,
        name: interner.get_or_intern("const0_driver"),
        kind: CellKind::Const { value: Logic::Zero },
        connections: vec![output_conn(interner.get_or_intern("Y"), sig_id)],
    });
    *const_zero = Some(sig_id);
    sig_id
}
