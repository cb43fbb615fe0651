//! Arrival/required-time analysis under unit gate delay.

use crate::graph::MappingGraph;
use lutra_ir::SignalId;
use std::collections::HashMap;

/// Unit-delay timing view of the combinational subgraph.
///
/// Arrival times propagate forward from primary inputs and boundaries
/// (both at time 0); required times propagate backward from primary
/// outputs at a target, by default the critical depth. Signals outside
/// the cone of any primary output fall back to the critical depth when
/// their required time is queried.
pub struct TimingAnalyzer {
    arrival: HashMap<SignalId, f64>,
    required: HashMap<SignalId, f64>,
    critical_depth: i32,
}

impl TimingAnalyzer {
    /// Runs both passes: forward arrival, then backward required with the
    /// critical depth as target.
    pub fn analyze(graph: &MappingGraph) -> Self {
        let mut timing = Self {
            arrival: HashMap::new(),
            required: HashMap::new(),
            critical_depth: 0,
        };
        timing.compute_arrival_times(graph);
        timing.compute_required_times(graph, timing.critical_depth);
        timing
    }

    fn compute_arrival_times(&mut self, graph: &MappingGraph) {
        self.arrival.clear();
        for &pi in graph.primary_inputs() {
            self.arrival.insert(pi, 0.0);
        }

        self.critical_depth = 0;
        for &signal in graph.topo_order() {
            let Some(driver) = graph.driver(signal) else {
                continue;
            };
            let mut max_input_at = 0.0_f64;
            for input in graph.cell_inputs(driver) {
                if let Some(&at) = self.arrival.get(input) {
                    max_input_at = max_input_at.max(at);
                }
            }
            let at = max_input_at + 1.0;
            self.arrival.insert(signal, at);
            self.critical_depth = self.critical_depth.max(at.ceil() as i32);
        }
    }

    /// Recomputes required times from primary outputs at the given target.
    pub fn compute_required_times(&mut self, graph: &MappingGraph, target: i32) {
        self.required.clear();
        for &po in graph.primary_outputs() {
            self.required.insert(po, target as f64);
        }

        for &signal in graph.reverse_topo_order() {
            let Some(driver) = graph.driver(signal) else {
                continue;
            };
            let Some(&signal_rt) = self.required.get(&signal) else {
                continue;
            };
            for input in graph.cell_inputs(driver) {
                let input_rt = signal_rt - 1.0;
                self.required
                    .entry(*input)
                    .and_modify(|rt| *rt = rt.min(input_rt))
                    .or_insert(input_rt);
            }
        }
    }

    /// The forward-propagated arrival time; 0 for boundaries.
    pub fn arrival_time(&self, signal: SignalId) -> f64 {
        self.arrival.get(&signal).copied().unwrap_or(0.0)
    }

    /// The backward-propagated required time; signals outside any primary
    /// output cone report the critical depth.
    pub fn required_time(&self, signal: SignalId) -> f64 {
        self.required
            .get(&signal)
            .copied()
            .unwrap_or(self.critical_depth as f64)
    }

    /// Integer depth of a signal: the arrival time rounded up.
    pub fn depth(&self, signal: SignalId) -> i32 {
        self.arrival_time(signal).ceil() as i32
    }

    /// Depth of a cut: one past the deepest input.
    pub fn cut_depth<'a>(&self, inputs: impl IntoIterator<Item = &'a SignalId>) -> i32 {
        let mut max_depth = 0;
        for &input in inputs {
            max_depth = max_depth.max(self.depth(input));
        }
        max_depth + 1
    }

    /// The critical path depth over all signals.
    pub fn critical_depth(&self) -> i32 {
        self.critical_depth
    }

    /// The full arrival-time map, for downstream timing-aware passes.
    pub fn arrival_map(&self) -> &HashMap<SignalId, f64> {
        &self.arrival
    }
}
