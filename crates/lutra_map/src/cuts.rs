//! Cut types.
//!
//! A [`Cut`] is an unordered input set; its canonical form is the sorted
//! signal list, which `BTreeSet` iteration yields directly. Every
//! downstream consumer (deduplication, truth-table input vectors, pin
//! assignment) relies on that one canonical order.

use lutra_ir::SignalId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// An unordered set of cut input signals.
///
/// For a cut of signal `s`, every path from a primary input to `s` crosses
/// this set, and `1 <= |inputs| <= K`.
pub type Cut = BTreeSet<SignalId>;

/// A cut together with the signal it covers.
///
/// Carries no derived data: depth, area flow, and exact area are always
/// recomputed through the current timing and context state, which is how
/// evaluation-mode switches take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleCut {
    /// The cut's input set.
    pub inputs: Cut,
    /// The signal covered by this cut.
    pub output: SignalId,
}

impl SingleCut {
    /// Creates a cut with the given inputs and output.
    pub fn new(inputs: Cut, output: SignalId) -> Self {
        Self { inputs, output }
    }

    /// The trivial cut `{s}` of a primary input, constant, or boundary
    /// signal.
    pub fn trivial(signal: SignalId) -> Self {
        let mut inputs = Cut::new();
        inputs.insert(signal);
        Self {
            inputs,
            output: signal,
        }
    }

    /// Returns `true` for a trivial cut, which must never materialize a LUT.
    pub fn is_trivial(&self) -> bool {
        self.inputs.len() == 1 && self.inputs.contains(&self.output)
    }
}

/// The static ordering by `(output, inputs)`.
///
/// This has no semantic content: it exists so equal cuts collide during
/// deduplication and so queue ties break deterministically. Mode-dependent
/// preference between cuts lives in the
/// [`Evaluator`](crate::evaluator::Evaluator), never here.
impl Ord for SingleCut {
    fn cmp(&self, other: &Self) -> Ordering {
        self.output
            .cmp(&other.output)
            .then_with(|| self.inputs.cmp(&other.inputs))
    }
}

impl PartialOrd for SingleCut {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Two cuts fused into one dual-output LUT.
///
/// The shared input set has at most six signals and contains the selector.
/// Legality invariant: the function of `z5` over the sorted non-selector
/// inputs equals the function of `z` with the selector fixed to 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleCut {
    /// The merged input set, selector included.
    pub inputs: Cut,
    /// The primary output (full six-variable function).
    pub z: SignalId,
    /// The secondary output (five-variable projection).
    pub z5: SignalId,
    /// The selector input, wired to pin I5.
    pub selector: SignalId,
}

impl DoubleCut {
    /// Iterates the non-selector inputs in canonical sorted order.
    pub fn data_inputs(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.inputs
            .iter()
            .copied()
            .filter(move |&s| s != self.selector)
    }
}
