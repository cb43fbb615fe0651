//! Truth-table generation by cone simulation, plus the independence and
//! projection operations used by the dual-output verifier.

use crate::graph::MappingGraph;
use lutra_common::{Ident, Interner, Logic, TruthVec};
use lutra_ir::{CellKind, Module, SigMap, SignalId};
use std::collections::{BTreeMap, HashMap};

/// Failure to reduce a cone to a concrete truth table.
///
/// Fatal to the specific operation only: a dual-output candidate that fails
/// here is rejected, and a single-output node is left unmapped and flagged
/// in the statistics.
#[derive(Debug, thiserror::Error)]
pub enum TruthTableError {
    /// The cone reaches a cell the simulator has no semantics for.
    #[error("cone reaches unsupported cell at signal {0:?}")]
    UnsupportedCell(SignalId),

    /// The cone reaches a signal with no driver that is not a cut input.
    #[error("signal {0:?} is undriven and not a cut input")]
    Undriven(SignalId),

    /// Simulation produced an undefined value at some input combination.
    #[error("cone of {0:?} did not reduce to a constant")]
    NotConstant(SignalId),

    /// More inputs requested than the 6-input cell family supports.
    #[error("truth table over {0} inputs exceeds the 6-input limit")]
    TooManyInputs(usize),
}

/// Evaluates cones of combinational gates into truth tables.
///
/// Cut inputs act as evaluation boundaries: the simulator assigns them and
/// never walks past them. Constant cells evaluate to their value; any other
/// non-combinational driver inside a cone is an evaluation failure.
pub struct TruthTableComputer<'a> {
    module: &'a Module,
    graph: &'a MappingGraph,
    sigmap: &'a SigMap,
    port_a: Ident,
    port_b: Ident,
    port_s: Ident,
}

impl<'a> TruthTableComputer<'a> {
    /// Creates a computer over the given module view.
    pub fn new(
        module: &'a Module,
        graph: &'a MappingGraph,
        sigmap: &'a SigMap,
        interner: &Interner,
    ) -> Self {
        Self {
            module,
            graph,
            sigmap,
            port_a: interner.get_or_intern("A"),
            port_b: interner.get_or_intern("B"),
            port_s: interner.get_or_intern("S"),
        }
    }

    /// Computes the `2^n`-bit truth table of `output` over the ordered
    /// input list, where entry `sum(v_i * 2^i)` is the simulated value with
    /// input `i` set to `v_i`.
    pub fn compute_lut_init(
        &self,
        output: SignalId,
        inputs: &[SignalId],
    ) -> Result<TruthVec, TruthTableError> {
        if inputs.len() > 6 {
            return Err(TruthTableError::TooManyInputs(inputs.len()));
        }

        let size = 1u32 << inputs.len();
        let mut init = TruthVec::new(size);

        for combo in 0..size {
            let mut env: HashMap<SignalId, Logic> = HashMap::new();
            for (i, &input) in inputs.iter().enumerate() {
                env.insert(input, Logic::from_bool(combo & (1 << i) != 0));
            }
            let value = self.eval(output, &mut env)?;
            if !value.is_defined() {
                return Err(TruthTableError::NotConstant(output));
            }
            init.set(combo, value);
        }

        Ok(init)
    }

    fn eval(
        &self,
        signal: SignalId,
        env: &mut HashMap<SignalId, Logic>,
    ) -> Result<Logic, TruthTableError> {
        if let Some(&value) = env.get(&signal) {
            return Ok(value);
        }
        let Some(cell_id) = self.graph.driver(signal) else {
            return Err(TruthTableError::Undriven(signal));
        };
        let cell = self.module.cells.get(cell_id);

        // A revisit while this signal is still being evaluated can only
        // happen on a combinational cycle; the X then fails NotConstant.
        env.insert(signal, Logic::X);

        let value = match &cell.kind {
            CellKind::Const { value } => *value,
            CellKind::And => self.fold(cell_id, env, Logic::One, |a, b| a & b)?,
            CellKind::Or => self.fold(cell_id, env, Logic::Zero, |a, b| a | b)?,
            CellKind::Xor => self.fold(cell_id, env, Logic::Zero, |a, b| a ^ b)?,
            CellKind::Nand => !self.fold(cell_id, env, Logic::One, |a, b| a & b)?,
            CellKind::Nor => !self.fold(cell_id, env, Logic::Zero, |a, b| a | b)?,
            CellKind::Xnor => !self.fold(cell_id, env, Logic::Zero, |a, b| a ^ b)?,
            CellKind::Not => !self.unary(signal, cell_id, env)?,
            CellKind::Buf => self.unary(signal, cell_id, env)?,
            CellKind::Mux => {
                let a = self.mux_port(signal, cell_id, self.port_a, env)?;
                let b = self.mux_port(signal, cell_id, self.port_b, env)?;
                let sel = self.mux_port(signal, cell_id, self.port_s, env)?;
                match sel.to_bool() {
                    Some(true) => b,
                    Some(false) => a,
                    None => {
                        if a == b && a.is_defined() {
                            a
                        } else {
                            Logic::X
                        }
                    }
                }
            }
            _ => return Err(TruthTableError::UnsupportedCell(signal)),
        };

        env.insert(signal, value);
        Ok(value)
    }

    fn fold(
        &self,
        cell_id: lutra_ir::CellId,
        env: &mut HashMap<SignalId, Logic>,
        identity: Logic,
        op: fn(Logic, Logic) -> Logic,
    ) -> Result<Logic, TruthTableError> {
        let inputs: Vec<SignalId> = self
            .module
            .cells
            .get(cell_id)
            .input_signals()
            .map(|s| self.sigmap.canonical(s))
            .collect();
        let mut acc = identity;
        for input in inputs {
            acc = op(acc, self.eval(input, env)?);
        }
        Ok(acc)
    }

    fn unary(
        &self,
        signal: SignalId,
        cell_id: lutra_ir::CellId,
        env: &mut HashMap<SignalId, Logic>,
    ) -> Result<Logic, TruthTableError> {
        let input = self
            .module
            .cells
            .get(cell_id)
            .input_signals()
            .next()
            .map(|s| self.sigmap.canonical(s))
            .ok_or(TruthTableError::UnsupportedCell(signal))?;
        self.eval(input, env)
    }

    fn mux_port(
        &self,
        signal: SignalId,
        cell_id: lutra_ir::CellId,
        port: Ident,
        env: &mut HashMap<SignalId, Logic>,
    ) -> Result<Logic, TruthTableError> {
        let input = self
            .module
            .cells
            .get(cell_id)
            .input_by_port(port)
            .map(|s| self.sigmap.canonical(s))
            .ok_or(TruthTableError::UnsupportedCell(signal))?;
        self.eval(input, env)
    }
}

/// Checks that a truth table ignores every listed input position: for each
/// combination `c` and don't-care position `d`, `init[c] == init[c ^ 2^d]`.
pub fn is_independent_of_inputs(init: &TruthVec, num_inputs: usize, dont_care: &[usize]) -> bool {
    if dont_care.is_empty() {
        return true;
    }
    let table_size = 1u32 << num_inputs;
    for combo in 0..table_size {
        for &dc in dont_care {
            let flipped = combo ^ (1 << dc);
            if flipped < combo {
                continue;
            }
            if init.get(combo) != init.get(flipped) {
                return false;
            }
        }
    }
    true
}

/// Projects a truth table onto the non-fixed input positions, splicing the
/// fixed values into place when indexing the full table.
pub fn project_truth_table(
    init: &TruthVec,
    num_inputs: usize,
    fixed: &BTreeMap<usize, bool>,
) -> TruthVec {
    let remaining = num_inputs - fixed.len();
    let projected_size = 1u32 << remaining;
    let mut projected = TruthVec::new(projected_size);

    for proj_combo in 0..projected_size {
        let mut full_combo = 0u32;
        let mut proj_bit = 0;
        for i in 0..num_inputs {
            if let Some(&value) = fixed.get(&i) {
                if value {
                    full_combo |= 1 << i;
                }
            } else {
                if proj_combo & (1 << proj_bit) != 0 {
                    full_combo |= 1 << i;
                }
                proj_bit += 1;
            }
        }
        projected.set(proj_combo, init.get(full_combo));
    }

    projected
}
