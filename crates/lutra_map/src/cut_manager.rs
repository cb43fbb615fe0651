//! Priority-cut enumeration by bounded set-merge.

use crate::config::MapConfig;
use crate::context::MappingContext;
use crate::cuts::{Cut, SingleCut};
use crate::evaluator::Evaluator;
use crate::graph::MappingGraph;
use crate::timing::TimingAnalyzer;
use lutra_ir::{CellId, SignalId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Summary counters over the retained priority cuts.
#[derive(Debug, Clone, Copy)]
pub struct CutStats {
    /// Signals with at least one priority cut.
    pub total_signals: usize,
    /// Priority cuts retained across all signals.
    pub total_cuts: usize,
}

impl CutStats {
    /// Average retained cuts per signal.
    pub fn avg_cuts_per_signal(&self) -> f64 {
        if self.total_signals == 0 {
            0.0
        } else {
            self.total_cuts as f64 / self.total_signals as f64
        }
    }
}

/// Enumerates cuts per signal in topological order and retains the P best
/// under the evaluator's current mode.
pub struct CutManager {
    max_cut_size: usize,
    max_cuts: usize,
    priority_cuts: HashMap<SignalId, Vec<SingleCut>>,
    cuts_by_size: HashMap<SignalId, BTreeMap<usize, Vec<Cut>>>,
}

impl CutManager {
    /// Creates a manager with the configured K and P.
    pub fn new(config: &MapConfig) -> Self {
        Self {
            max_cut_size: config.max_cut_size as usize,
            max_cuts: config.max_cuts_per_signal,
            priority_cuts: HashMap::new(),
            cuts_by_size: HashMap::new(),
        }
    }

    /// Recomputes priority cuts for every signal.
    ///
    /// Primary inputs and boundary-driven signals receive only the trivial
    /// cut. Gate outputs are enumerated in topological order by pairwise
    /// set-union against the running family, pruning any union larger than
    /// K at every step, then sorted under the evaluator and truncated to P.
    pub fn compute(
        &mut self,
        graph: &MappingGraph,
        evaluator: &Evaluator,
        ctx: &mut MappingContext,
        timing: &TimingAnalyzer,
    ) {
        self.priority_cuts.clear();
        self.cuts_by_size.clear();

        let mut boundary: BTreeSet<SignalId> = BTreeSet::new();
        for &pi in graph.primary_inputs() {
            if !graph.is_comb_driven(pi) {
                boundary.insert(pi);
            }
        }
        for signal in graph.driven_signals() {
            if !graph.is_comb_driven(signal) {
                boundary.insert(signal);
            }
        }
        for &signal in &boundary {
            self.priority_cuts
                .insert(signal, vec![SingleCut::trivial(signal)]);
        }

        for &signal in graph.topo_order() {
            let Some(driver) = graph.driver(signal) else {
                continue;
            };
            self.enumerate_cuts_for_gate(graph, driver, signal);
            self.select_priority_cuts(signal, evaluator, ctx, timing);
        }
    }

    /// The cut family a fan-in contributes to enumeration: its priority
    /// cuts' input sets plus the singleton `{x}`.
    ///
    /// The singleton both seeds enumeration for signals with no cuts yet
    /// (boundaries, overflow frontiers) and guarantees that every gate
    /// output keeps at least its immediate fan-in cut when wider unions
    /// blow the K bound.
    fn family(&self, signal: SignalId) -> BTreeSet<Cut> {
        let mut family = BTreeSet::new();
        if let Some(cuts) = self.priority_cuts.get(&signal) {
            for cut in cuts {
                family.insert(cut.inputs.clone());
            }
        }
        let mut singleton = Cut::new();
        singleton.insert(signal);
        family.insert(singleton);
        family
    }

    fn enumerate_cuts_for_gate(&mut self, graph: &MappingGraph, gate: CellId, output: SignalId) {
        let inputs = graph.cell_inputs(gate);

        let new_cuts: BTreeSet<Cut> = if inputs.is_empty() {
            // A gate with no live inputs (all constant): only itself.
            let mut singleton = Cut::new();
            singleton.insert(output);
            [singleton].into_iter().collect()
        } else if inputs.len() == 1 {
            self.family(inputs[0])
        } else {
            let mut merged = self.family(inputs[0]);
            for &input in &inputs[1..] {
                let next_family = self.family(input);
                let mut next_merged = BTreeSet::new();
                for a in &merged {
                    for b in &next_family {
                        let mut union = a.clone();
                        union.extend(b.iter().copied());
                        if union.len() <= self.max_cut_size {
                            next_merged.insert(union);
                        }
                    }
                }
                merged = next_merged;
            }
            merged
        };

        let by_size = self.cuts_by_size.entry(output).or_default();
        for cut in new_cuts {
            by_size.entry(cut.len()).or_default().push(cut);
        }
    }

    fn select_priority_cuts(
        &mut self,
        signal: SignalId,
        evaluator: &Evaluator,
        ctx: &mut MappingContext,
        timing: &TimingAnalyzer,
    ) {
        let Some(by_size) = self.cuts_by_size.get(&signal) else {
            return;
        };

        let mut all: Vec<SingleCut> = Vec::new();
        for size in 1..=self.max_cut_size {
            if let Some(cuts) = by_size.get(&size) {
                for cut in cuts {
                    all.push(SingleCut::new(cut.clone(), signal));
                }
            }
        }
        if all.is_empty() {
            return;
        }

        let mut scored: Vec<(crate::evaluator::CutMetrics, SingleCut)> = all
            .into_iter()
            .map(|cut| (evaluator.metrics(&cut, ctx, timing), cut))
            .collect();
        scored.sort_by(|a, b| evaluator.compare(&a.0, &b.0).then_with(|| a.1.cmp(&b.1)));
        scored.truncate(self.max_cuts);

        self.priority_cuts
            .insert(signal, scored.into_iter().map(|(_, cut)| cut).collect());
    }

    /// The top priority cut of a signal, or the trivial cut in the
    /// degenerate case (no enumerated cuts, e.g. on a combinational cycle).
    pub fn best_cut(&self, signal: SignalId) -> SingleCut {
        self.priority_cuts
            .get(&signal)
            .and_then(|cuts| cuts.first())
            .cloned()
            .unwrap_or_else(|| SingleCut::trivial(signal))
    }

    /// The full retained priority-cut list of a signal.
    pub fn priority_cuts(&self, signal: SignalId) -> &[SingleCut] {
        self.priority_cuts
            .get(&signal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Summary counters.
    pub fn stats(&self) -> CutStats {
        CutStats {
            total_signals: self.priority_cuts.len(),
            total_cuts: self.priority_cuts.values().map(Vec::len).sum(),
        }
    }
}
