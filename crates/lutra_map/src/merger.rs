//! The global mapping state machine and the dual-output candidate search.

use crate::config::MapConfig;
use crate::context::MappingContext;
use crate::cut_manager::CutManager;
use crate::cuts::{Cut, DoubleCut, SingleCut};
use crate::evaluator::{CutMetrics, Evaluator};
use crate::graph::MappingGraph;
use crate::timing::TimingAnalyzer;
use crate::truth::{is_independent_of_inputs, project_truth_table, TruthTableComputer};
use lutra_common::{InternalError, LutraResult, TruthVec};
use lutra_ir::{CellId, SignalId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Upper bound on the transparent-driver walk, against pathological buffer
/// chains.
const MAPPABLE_DRIVER_LIMIT: usize = 100;

/// Statistics of a mapping run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingStats {
    /// Signals mapped as single-output LUTs.
    pub n_single: usize,
    /// Fused dual-output LUT pairs.
    pub n_dual: usize,
    /// Nodes whose cone failed to reduce at emission and were left
    /// unmapped.
    pub n_unmapped: usize,
    /// Deepest mapped cut.
    pub depth: i32,
    /// Mean area flow over the non-trivial single-output cuts.
    pub avg_area_flow: f64,
    /// Dual-output candidates recorded by the structural prefilter.
    pub dual_stage1_considered: usize,
    /// Dual-output candidates submitted to truth-table verification.
    pub dual_stage2_considered: usize,
    /// Single-output cut sizes, keyed by input count.
    pub cut_size_histogram: BTreeMap<usize, usize>,
}

/// The outcome of global mapping: two disjointly-keyed maps plus counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingResult {
    /// Signals covered by a single-output cut.
    pub single: BTreeMap<SignalId, SingleCut>,
    /// Output pairs fused into dual-output LUTs, keyed by `(z, z5)`.
    pub dual: BTreeMap<(SignalId, SignalId), DoubleCut>,
    /// Run statistics.
    pub stats: MappingStats,
}

/// A queue element: the cut and its metrics captured at insertion time.
struct QueueEntry {
    metrics: CutMetrics,
    cut: SingleCut,
}

/// A dual-output candidate surviving the stage-1 structural prefilter.
///
/// The index map and don't-care positions are captured here, against the
/// sorted input lists as they existed at prefilter time; stage 2 must not
/// re-derive them.
struct MergeCandidate {
    z5_output: SignalId,
    z5_inputs: Cut,
    selector: SignalId,
    z_remaining: Cut,
    score: f64,
    index_map: BTreeMap<usize, usize>,
    dont_care: Vec<usize>,
}

/// Runs global mapping: decides per node between a single-output cut and a
/// verified dual-output fusion, and produces the final mapping tables.
pub struct GlobalMerger {
    enable_dual_output: bool,
    max_dual_candidates: usize,
    require_shared_input: bool,
    weights: crate::config::HeuristicWeights,
    single: BTreeMap<SignalId, SingleCut>,
    dual: BTreeMap<(SignalId, SignalId), DoubleCut>,
    dual_outputs: HashSet<SignalId>,
    stage1_considered: usize,
    stage2_considered: usize,
}

impl GlobalMerger {
    /// Creates a merger with the given configuration.
    pub fn new(config: &MapConfig) -> Self {
        Self {
            enable_dual_output: config.enable_dual_output,
            max_dual_candidates: config.max_dual_candidates,
            require_shared_input: config.require_shared_input,
            weights: config.weights.clone(),
            single: BTreeMap::new(),
            dual: BTreeMap::new(),
            dual_outputs: HashSet::new(),
            stage1_considered: 0,
            stage2_considered: 0,
        }
    }

    /// The single-output mapping table.
    pub fn single_mappings(&self) -> &BTreeMap<SignalId, SingleCut> {
        &self.single
    }

    /// The dual-output mapping table.
    pub fn dual_mappings(&self) -> &BTreeMap<(SignalId, SignalId), DoubleCut> {
        &self.dual
    }

    /// Mapped LUT count: one per single entry, one per fused pair.
    pub fn lut_count(&self) -> usize {
        self.single.len() + self.dual.len()
    }

    /// Runs one global mapping pass over the current priority cuts.
    ///
    /// The queue seeds from the primary outputs' mappable drivers first,
    /// then unconditionally from every combinational gate output, so that
    /// designs whose outputs feed sequential elements still cover all their
    /// logic. A completion sweep afterwards installs best cuts for anything
    /// the traversal missed.
    pub fn run_global_mapping(
        &mut self,
        graph: &MappingGraph,
        cut_mgr: &CutManager,
        evaluator: &Evaluator,
        ctx: &mut MappingContext,
        timing: &TimingAnalyzer,
        truth: &TruthTableComputer<'_>,
    ) -> LutraResult<()> {
        self.single.clear();
        self.dual.clear();
        self.dual_outputs.clear();
        self.stage1_considered = 0;
        self.stage2_considered = 0;

        let mut visited: HashSet<SignalId> = HashSet::new();
        let mut queue: Vec<QueueEntry> = Vec::new();

        for &po in graph.primary_outputs() {
            let Some(driver) = find_mappable_driver(graph, po) else {
                continue;
            };
            let Some(output) = graph.cell_output(driver) else {
                continue;
            };
            if visited.insert(output) {
                let cut = cut_mgr.best_cut(output);
                let metrics = evaluator.metrics(&cut, ctx, timing);
                queue.push(QueueEntry { metrics, cut });
            }
        }

        for &output in graph.comb_outputs() {
            if visited.insert(output) {
                let cut = cut_mgr.best_cut(output);
                let metrics = evaluator.metrics(&cut, ctx, timing);
                queue.push(QueueEntry { metrics, cut });
            }
        }

        while let Some(entry) = pop_best(&mut queue, evaluator) {
            let now_cut = entry.cut;
            let now = now_cut.output;

            let chosen = if self.enable_dual_output {
                self.find_best_double_cut(now, &queue, cut_mgr, ctx, timing, truth)?
            } else {
                None
            };

            let expand: Vec<SignalId> = match &chosen {
                Some(dc) => dc.inputs.iter().copied().collect(),
                None => now_cut.inputs.iter().copied().collect(),
            };

            match chosen {
                Some(dc) => {
                    let z5 = dc.z5;
                    visited.insert(z5);
                    queue.retain(|e| e.cut.output != z5);
                    self.dual_outputs.insert(now);
                    self.dual_outputs.insert(z5);
                    self.dual.insert((now, z5), dc);
                }
                None => {
                    self.single.insert(now, now_cut);
                }
            }

            for input in expand {
                if visited.contains(&input) {
                    continue;
                }
                let Some(driver) = graph.driver(input) else {
                    continue;
                };
                if graph.is_combinational(driver) && graph.cell_output(driver) == Some(input) {
                    visited.insert(input);
                    let cut = cut_mgr.best_cut(input);
                    let metrics = evaluator.metrics(&cut, ctx, timing);
                    queue.push(QueueEntry { metrics, cut });
                }
            }
        }

        for &output in graph.comb_outputs() {
            if self.single.contains_key(&output) || self.dual_outputs.contains(&output) {
                continue;
            }
            self.single.insert(output, cut_mgr.best_cut(output));
        }

        Ok(())
    }

    /// The two-stage dual-output search for the node being processed.
    ///
    /// Stage 1 scans the pending queue for structurally compatible
    /// `(z5, selector)` choices and scores them; stage 2 verifies the best
    /// few against the exact truth-table constraint. The first verified
    /// candidate wins.
    fn find_best_double_cut(
        &mut self,
        now: SignalId,
        queue: &[QueueEntry],
        cut_mgr: &CutManager,
        ctx: &MappingContext,
        timing: &TimingAnalyzer,
        truth: &TruthTableComputer<'_>,
    ) -> LutraResult<Option<DoubleCut>> {
        let now_cut = cut_mgr.best_cut(now);
        if now_cut.inputs.len() < 2 || now_cut.inputs.len() > 6 {
            return Ok(None);
        }

        // Stage 1: structural prefilter over the pending nodes, scanned in
        // static cut order for determinism.
        let mut pending: Vec<&SingleCut> = queue.iter().map(|e| &e.cut).collect();
        pending.sort();

        let mut candidates: Vec<MergeCandidate> = Vec::new();
        for other in pending {
            if other.output == now {
                continue;
            }
            if other.inputs.contains(&other.output) {
                continue;
            }
            if other.inputs.len() > 5 {
                continue;
            }

            for &selector in &now_cut.inputs {
                if other.inputs.contains(&selector) {
                    continue;
                }
                let mut z_remaining = now_cut.inputs.clone();
                z_remaining.remove(&selector);

                let Some((index_map, dont_care)) =
                    check_input_compatibility(&z_remaining, &other.inputs)
                else {
                    continue;
                };

                let mut merged = z_remaining.clone();
                merged.extend(other.inputs.iter().copied());
                merged.insert(selector);
                if merged.len() > 6 {
                    continue;
                }

                let shared = now_cut
                    .inputs
                    .intersection(&cut_mgr.best_cut(other.output).inputs)
                    .count();
                if self.require_shared_input && shared == 0 {
                    continue;
                }

                let score =
                    self.structural_score(now, other.output, &merged, shared, ctx, timing);
                self.stage1_considered += 1;
                candidates.push(MergeCandidate {
                    z5_output: other.output,
                    z5_inputs: other.inputs.clone(),
                    selector,
                    z_remaining,
                    score,
                    index_map,
                    dont_care,
                });
            }
        }

        if candidates.is_empty() {
            return Ok(None);
        }

        candidates.sort_by(|a, b| {
            a.score
                .total_cmp(&b.score)
                .then_with(|| a.z5_output.cmp(&b.z5_output))
                .then_with(|| a.selector.cmp(&b.selector))
        });
        candidates.truncate(self.max_dual_candidates);

        // Stage 2: exact truth-table verification, expensive and bounded.
        for candidate in &candidates {
            self.stage2_considered += 1;

            let mut z_inputs: Vec<SignalId> = candidate.z_remaining.iter().copied().collect();
            z_inputs.push(candidate.selector);
            let Ok(z_init) = truth.compute_lut_init(now, &z_inputs) else {
                continue;
            };

            let z5_inputs: Vec<SignalId> = candidate.z5_inputs.iter().copied().collect();
            let Ok(z5_init) = truth.compute_lut_init(candidate.z5_output, &z5_inputs) else {
                continue;
            };

            let legal = verify_truth_table_constraint(
                &z_init,
                &z5_init,
                z_inputs.len(),
                z5_inputs.len(),
                &candidate.index_map,
                &candidate.dont_care,
            )?;
            if !legal {
                continue;
            }

            let mut inputs = candidate.z_remaining.clone();
            inputs.extend(candidate.z5_inputs.iter().copied());
            inputs.insert(candidate.selector);
            return Ok(Some(DoubleCut {
                inputs,
                z: now,
                z5: candidate.z5_output,
                selector: candidate.selector,
            }));
        }

        Ok(None)
    }

    /// The cheap stage-1 score; lower is better.
    fn structural_score(
        &self,
        z: SignalId,
        z5: SignalId,
        merged: &Cut,
        shared_inputs: usize,
        ctx: &MappingContext,
        timing: &TimingAnalyzer,
    ) -> f64 {
        let w = &self.weights;
        let mut score = merged.len() as f64 * w.input_count;

        let merged_depth = timing.cut_depth(merged);
        if merged_depth > timing.depth(z).max(timing.depth(z5)) {
            score += w.depth_penalty;
        }

        let successors = (ctx.fanout_refs(z) + ctx.fanout_refs(z5)).max(1);
        let estimated_area_flow = (merged.len() + 1) as f64 / successors as f64;
        score += estimated_area_flow * w.area_flow;

        score += shared_inputs as f64 * w.input_sharing;
        score
    }

    /// Builds the mapping result with statistics computed against the
    /// current context and timing state.
    pub fn result(
        &self,
        evaluator: &Evaluator,
        ctx: &mut MappingContext,
        timing: &TimingAnalyzer,
    ) -> MappingResult {
        let mut stats = MappingStats {
            n_single: self.single.len(),
            n_dual: self.dual.len(),
            dual_stage1_considered: self.stage1_considered,
            dual_stage2_considered: self.stage2_considered,
            ..Default::default()
        };

        let mut flow_sum = 0.0;
        let mut flow_count = 0usize;
        for cut in self.single.values() {
            *stats.cut_size_histogram.entry(cut.inputs.len()).or_insert(0) += 1;
            if cut.is_trivial() {
                continue;
            }
            stats.depth = stats.depth.max(timing.cut_depth(&cut.inputs));
            flow_sum += evaluator.area_flow(cut, ctx);
            flow_count += 1;
        }
        for dc in self.dual.values() {
            stats.depth = stats.depth.max(timing.cut_depth(&dc.inputs));
        }
        if flow_count > 0 {
            stats.avg_area_flow = flow_sum / flow_count as f64;
        }

        MappingResult {
            single: self.single.clone(),
            dual: self.dual.clone(),
            stats,
        }
    }
}

/// Walks through transparent single-input buffers to the nearest
/// combinational driver of a signal, bounded against buffer loops.
pub fn find_mappable_driver(graph: &MappingGraph, signal: SignalId) -> Option<CellId> {
    let mut current = signal;
    for _ in 0..MAPPABLE_DRIVER_LIMIT {
        let driver = graph.driver(current)?;
        if graph.is_combinational(driver) {
            return Some(driver);
        }
        if graph.is_transparent(driver) {
            let inputs = graph.cell_inputs(driver);
            if inputs.len() == 1 {
                current = inputs[0];
                continue;
            }
        }
        return None;
    }
    None
}

/// Checks that `z5_inputs` is a subset of the non-selector inputs of `z`,
/// and captures the exact correspondence between the two sorted input
/// lists: the map sends each z5 position to its z position, and the
/// returned positions are the z positions no z5 input occupies.
pub fn check_input_compatibility(
    z_remaining: &Cut,
    z5_inputs: &Cut,
) -> Option<(BTreeMap<usize, usize>, Vec<usize>)> {
    let z_vec: Vec<SignalId> = z_remaining.iter().copied().collect();
    let z5_vec: Vec<SignalId> = z5_inputs.iter().copied().collect();

    let mut index_map = BTreeMap::new();
    for (i, s5) in z5_vec.iter().enumerate() {
        let j = z_vec.iter().position(|z| z == s5)?;
        index_map.insert(i, j);
    }

    let used: HashSet<usize> = index_map.values().copied().collect();
    let dont_care: Vec<usize> = (0..z_vec.len()).filter(|j| !used.contains(j)).collect();
    Some((index_map, dont_care))
}

/// Verifies the dual-output legality constraint
/// `F_z5(I0..I4) = F_z(I0..I4, I5 = 0)` on computed truth tables.
///
/// For a 6-input `z`, the lower INIT half is the `I5 = 0` projection; a
/// narrower `z5` additionally requires the lower half to ignore the
/// don't-care positions before projecting them to 0. For `z` of 5 or fewer
/// inputs both tables must be identical.
pub fn verify_truth_table_constraint(
    z_init: &TruthVec,
    z5_init: &TruthVec,
    z_num_inputs: usize,
    z5_num_inputs: usize,
    index_map: &BTreeMap<usize, usize>,
    dont_care: &[usize],
) -> LutraResult<bool> {
    if z_num_inputs == 6 {
        if z_init.width() != 64 || z5_init.width() != (1 << z5_num_inputs) {
            return Ok(false);
        }

        // The bitwise comparisons below assume the sorted z5 inputs occupy
        // the sorted non-don't-care z positions in the same order.
        let free: Vec<usize> = (0..5).filter(|j| !dont_care.contains(j)).collect();
        for (&i, &j) in index_map {
            if free.get(i) != Some(&j) {
                return Err(InternalError::new(
                    "dual-output input correspondence is not order-preserving",
                ));
            }
        }

        let lower_half = z_init.extract(0, 32);

        if z5_num_inputs < 5 {
            if !is_independent_of_inputs(&lower_half, 5, dont_care) {
                return Ok(false);
            }
            let fixed: BTreeMap<usize, bool> = dont_care.iter().map(|&j| (j, false)).collect();
            let projected = project_truth_table(&lower_half, 5, &fixed);
            if projected.width() != z5_init.width() {
                return Err(InternalError::new(format!(
                    "projected truth table width {} does not match z5 width {}",
                    projected.width(),
                    z5_init.width()
                )));
            }
            Ok(projected == *z5_init)
        } else {
            Ok(lower_half == *z5_init)
        }
    } else {
        Ok(z_init == z5_init)
    }
}

/// Removes and returns the queue minimum under the evaluator's comparator.
///
/// Ties break on descending static cut order, so that among equally scored
/// nodes the one nearest the outputs is processed while its fan-in cone is
/// still pending; the dual-output search draws its partners from that
/// pending set.
fn pop_best(queue: &mut Vec<QueueEntry>, evaluator: &Evaluator) -> Option<QueueEntry> {
    if queue.is_empty() {
        return None;
    }
    let mut best = 0;
    for i in 1..queue.len() {
        let ordering = evaluator
            .compare(&queue[i].metrics, &queue[best].metrics)
            .then_with(|| queue[best].cut.cmp(&queue[i].cut));
        if ordering == std::cmp::Ordering::Less {
            best = i;
        }
    }
    Some(queue.swap_remove(best))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::EvalMode;
    use lutra_common::Interner;
    use lutra_diagnostics::DiagnosticSink;
    use lutra_ir::module::{input_conn, output_conn};
    use lutra_ir::{CellKind, Module, PortDirection, SigMap, StdCellLibrary};

    fn sig(raw: u32) -> SignalId {
        SignalId::from_raw(raw)
    }

    fn cut_of(raws: &[u32]) -> Cut {
        raws.iter().map(|&r| sig(r)).collect()
    }

    #[test]
    fn input_compatibility_subset() {
        let z_remaining = cut_of(&[1, 3, 5, 7, 9]);
        let z5 = cut_of(&[3, 9]);
        let (index_map, dont_care) = check_input_compatibility(&z_remaining, &z5).unwrap();
        // Sorted z5 [3, 9] sits at sorted z positions 1 and 4.
        assert_eq!(index_map[&0], 1);
        assert_eq!(index_map[&1], 4);
        assert_eq!(dont_care, vec![0, 2, 3]);
    }

    #[test]
    fn input_compatibility_rejects_foreign_input() {
        let z_remaining = cut_of(&[1, 3]);
        let z5 = cut_of(&[3, 4]);
        assert!(check_input_compatibility(&z_remaining, &z5).is_none());
    }

    #[test]
    fn input_compatibility_full_match() {
        let z_remaining = cut_of(&[2, 4]);
        let z5 = cut_of(&[2, 4]);
        let (index_map, dont_care) = check_input_compatibility(&z_remaining, &z5).unwrap();
        assert_eq!(index_map.len(), 2);
        assert!(dont_care.is_empty());
    }

    /// Builds the tables of S4/S5: z = f ? and(a..e) : or(a..d) over
    /// inputs [a, b, c, d, e, f], z5 as given by `z5_table`.
    fn s4_z_table() -> TruthVec {
        let mut z = TruthVec::new(64);
        for combo in 0..64u32 {
            let f = combo & 32 != 0;
            let value = if f {
                (0..5).all(|i| combo & (1 << i) != 0)
            } else {
                (0..4).any(|i| combo & (1 << i) != 0)
            };
            z.set_bool(combo, value);
        }
        z
    }

    #[test]
    fn verify_accepts_legal_projection() {
        let z = s4_z_table();
        // z5 = or(a..d) over 4 inputs.
        let mut z5 = TruthVec::new(16);
        for combo in 0..16u32 {
            z5.set_bool(combo, combo != 0);
        }
        // Non-selector z inputs sorted: [a,b,c,d,e]; z5 uses positions 0..3,
        // position 4 (e) is don't care.
        let index_map: BTreeMap<usize, usize> = (0..4).map(|i| (i, i)).collect();
        let legal = verify_truth_table_constraint(&z, &z5, 6, 4, &index_map, &[4]).unwrap();
        assert!(legal);
    }

    #[test]
    fn verify_rejects_dependent_dont_care() {
        let z = s4_z_table();
        // z5 = a & b: the lower half of z still depends on c and d.
        let mut z5 = TruthVec::new(4);
        z5.set_bool(3, true);
        let index_map: BTreeMap<usize, usize> = [(0, 0), (1, 1)].into_iter().collect();
        let legal =
            verify_truth_table_constraint(&z, &z5, 6, 2, &index_map, &[2, 3, 4]).unwrap();
        assert!(!legal);
    }

    #[test]
    fn verify_five_input_z5_compares_lower_half() {
        let z = s4_z_table();
        // A z5 equal to the exact I5=0 half: or(a..d), ignoring e, as a
        // 5-input table.
        let mut z5 = TruthVec::new(32);
        for combo in 0..32u32 {
            z5.set_bool(combo, combo & 0b1111 != 0);
        }
        let index_map: BTreeMap<usize, usize> = (0..5).map(|i| (i, i)).collect();
        let legal = verify_truth_table_constraint(&z, &z5, 6, 5, &index_map, &[]).unwrap();
        assert!(legal);
    }

    #[test]
    fn verify_narrow_z_requires_identity() {
        let a = TruthVec::from_u64(0b1000, 4);
        let b = TruthVec::from_u64(0b1000, 4);
        let c = TruthVec::from_u64(0b1110, 4);
        let empty_map = BTreeMap::new();
        assert!(verify_truth_table_constraint(&a, &b, 2, 2, &empty_map, &[]).unwrap());
        assert!(!verify_truth_table_constraint(&a, &c, 2, 2, &empty_map, &[]).unwrap());
    }

    #[test]
    fn verify_flags_broken_correspondence() {
        let z = s4_z_table();
        let z5 = TruthVec::new(16);
        // An index map that is not order-preserving over the free positions.
        let index_map: BTreeMap<usize, usize> = [(0, 1), (1, 0)].into_iter().collect();
        let err = verify_truth_table_constraint(&z, &z5, 6, 4, &index_map, &[4]);
        assert!(err.is_err());
    }

    // --- Fixture for state-machine tests ---

    struct Fixture {
        module: Module,
        interner: Interner,
    }

    impl Fixture {
        fn new() -> Self {
            let interner = Interner::new();
            let module = Module::new(interner.get_or_intern("dut"));
            Self { module, interner }
        }

        fn sig(&mut self, name: &str) -> SignalId {
            self.module.add_signal(self.interner.get_or_intern(name))
        }

        fn input(&mut self, name: &str) -> SignalId {
            let s = self.sig(name);
            self.module.add_port(
                self.interner.get_or_intern(name),
                PortDirection::Input,
                vec![s],
            );
            s
        }

        fn output(&mut self, name: &str, s: SignalId) {
            self.module.add_port(
                self.interner.get_or_intern(name),
                PortDirection::Output,
                vec![s],
            );
        }

        fn gate(&mut self, kind: CellKind, inputs: &[SignalId], output: SignalId) {
            let mut conns = Vec::new();
            for (i, &sig) in inputs.iter().enumerate() {
                let port = self
                    .interner
                    .get_or_intern(&format!("{}", (b'A' + i as u8) as char));
                conns.push(input_conn(port, sig));
            }
            conns.push(output_conn(self.interner.get_or_intern("Y"), output));
            let name = self
                .interner
                .get_or_intern(&format!("g{}", self.module.cells.len()));
            self.module.add_cell(name, kind, conns);
        }

        fn run(&self, config: &MapConfig) -> MappingResult {
            let sink = DiagnosticSink::new();
            let sigmap = SigMap::build(&self.module);
            let graph = MappingGraph::build(
                &self.module,
                &sigmap,
                &StdCellLibrary,
                &self.interner,
                &sink,
            );
            let timing = TimingAnalyzer::analyze(&graph);
            let mut ctx = MappingContext::new(graph.primary_outputs().clone());
            let truth = TruthTableComputer::new(&self.module, &graph, &sigmap, &self.interner);
            let evaluator = Evaluator::new(EvalMode::Depth);
            let mut cut_mgr = CutManager::new(config);
            cut_mgr.compute(&graph, &evaluator, &mut ctx, &timing);
            let mut merger = GlobalMerger::new(config);
            merger
                .run_global_mapping(&graph, &cut_mgr, &evaluator, &mut ctx, &timing, &truth)
                .unwrap();
            merger.result(&evaluator, &mut ctx, &timing)
        }
    }

    #[test]
    fn single_and_is_mapped() {
        let mut f = Fixture::new();
        let a = f.input("a");
        let b = f.input("b");
        let y = f.sig("y");
        f.gate(CellKind::And, &[a, b], y);
        f.output("y", y);

        let result = f.run(&MapConfig::default());
        assert_eq!(result.stats.n_single, 1);
        assert_eq!(result.stats.n_dual, 0);
        let cut = &result.single[&y];
        assert_eq!(cut.inputs, cut_of(&[a.as_raw(), b.as_raw()]));
    }

    #[test]
    fn logic_behind_flops_is_still_covered() {
        let mut f = Fixture::new();
        let a = f.input("a");
        let b = f.input("b");
        let clk = f.input("clk");
        let y = f.sig("y");
        let q = f.sig("q");
        f.gate(CellKind::Xor, &[a, b], y);
        f.module.add_cell(
            f.interner.get_or_intern("ff0"),
            CellKind::Dff,
            vec![
                input_conn(f.interner.get_or_intern("D"), y),
                input_conn(f.interner.get_or_intern("C"), clk),
                output_conn(f.interner.get_or_intern("Q"), q),
            ],
        );
        f.output("q", q);

        let result = f.run(&MapConfig::default());
        // q's driver is the flop; the XOR is covered by the unconditional
        // seeding, not the output walk.
        assert!(result.single.contains_key(&y));
    }

    #[test]
    fn transparent_chain_walk_finds_gate() {
        let mut f = Fixture::new();
        let a = f.input("a");
        let b = f.input("b");
        let t = f.sig("t");
        let w = f.sig("w");
        let y = f.sig("y");
        f.gate(CellKind::And, &[a, b], t);
        f.gate(CellKind::Buf, &[t], w);
        f.module.add_cell(
            f.interner.get_or_intern("ob0"),
            CellKind::OutBuf,
            vec![
                input_conn(f.interner.get_or_intern("I"), w),
                output_conn(f.interner.get_or_intern("O"), y),
            ],
        );
        f.output("y", y);

        let sink = DiagnosticSink::new();
        let sigmap = SigMap::build(&f.module);
        let graph =
            MappingGraph::build(&f.module, &sigmap, &StdCellLibrary, &f.interner, &sink);
        // From y: through the OutBuf, landing on the Buf gate (itself
        // combinational).
        let driver = find_mappable_driver(&graph, y).unwrap();
        assert_eq!(graph.cell_output(driver), Some(w));
        // From a primary input: nothing to find.
        assert_eq!(find_mappable_driver(&graph, a), None);
    }

    #[test]
    fn dual_output_fuses_shannon_pair() {
        // z = f ? (a&b&c&d&e) : (a|b|c|d); z5 = a|b|c|d shared.
        let mut f = Fixture::new();
        let ins: Vec<SignalId> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|n| f.input(n))
            .collect();
        let &[a, b, c, d, e, sel] = ins.as_slice() else {
            unreachable!()
        };
        let t_and = f.sig("t_and");
        let z5 = f.sig("z5");
        let z = f.sig("z");
        // 5-input AND and 4-input OR as single wide gates.
        f.gate(CellKind::And, &[a, b, c, d, e], t_and);
        f.gate(CellKind::Or, &[a, b, c, d], z5);
        let conns = vec![
            input_conn(f.interner.get_or_intern("A"), z5),
            input_conn(f.interner.get_or_intern("B"), t_and),
            input_conn(f.interner.get_or_intern("S"), sel),
            output_conn(f.interner.get_or_intern("Y"), z),
        ];
        f.module
            .add_cell(f.interner.get_or_intern("mux0"), CellKind::Mux, conns);
        f.output("z", z);
        f.output("z5", z5);

        let result = f.run(&MapConfig::default());
        let dc = result
            .dual
            .get(&(z, z5))
            .expect("the (z, z5) pair should fuse");
        assert_eq!(dc.selector, sel);
        let expected: Cut = [a, b, c, d, e, sel].into_iter().collect();
        assert_eq!(dc.inputs, expected);
        assert!(!result.single.contains_key(&z));
        assert!(!result.single.contains_key(&z5));
        assert!(result.stats.dual_stage1_considered > 0);
        assert!(result.stats.dual_stage2_considered > 0);
    }

    #[test]
    fn dual_output_disabled_by_config() {
        let mut f = Fixture::new();
        let ins: Vec<SignalId> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|n| f.input(n))
            .collect();
        let &[a, b, c, d, e, sel] = ins.as_slice() else {
            unreachable!()
        };
        let t_and = f.sig("t_and");
        let z5 = f.sig("z5");
        let z = f.sig("z");
        f.gate(CellKind::And, &[a, b, c, d, e], t_and);
        f.gate(CellKind::Or, &[a, b, c, d], z5);
        let conns = vec![
            input_conn(f.interner.get_or_intern("A"), z5),
            input_conn(f.interner.get_or_intern("B"), t_and),
            input_conn(f.interner.get_or_intern("S"), sel),
            output_conn(f.interner.get_or_intern("Y"), z),
        ];
        f.module
            .add_cell(f.interner.get_or_intern("mux0"), CellKind::Mux, conns);
        f.output("z", z);
        f.output("z5", z5);

        let config = MapConfig {
            enable_dual_output: false,
            ..Default::default()
        };
        let result = f.run(&config);
        assert!(result.dual.is_empty());
        assert!(result.single.contains_key(&z));
        assert!(result.single.contains_key(&z5));
    }

    #[test]
    fn every_gate_output_is_covered() {
        let mut f = Fixture::new();
        let a = f.input("a");
        let b = f.input("b");
        let c = f.input("c");
        let t = f.sig("t");
        let y1 = f.sig("y1");
        let y2 = f.sig("y2");
        f.gate(CellKind::And, &[a, b], t);
        f.gate(CellKind::Xor, &[t, c], y1);
        f.gate(CellKind::Or, &[t, c], y2);
        f.output("y1", y1);
        f.output("y2", y2);

        let result = f.run(&MapConfig::default());
        for s in [t, y1, y2] {
            let in_single = result.single.contains_key(&s);
            let in_dual = result.dual.keys().any(|&(z, z5)| z == s || z5 == s);
            assert!(in_single || in_dual, "{s:?} not covered");
        }
    }

    #[test]
    fn result_stats_histogram() {
        let mut f = Fixture::new();
        let a = f.input("a");
        let b = f.input("b");
        let y = f.sig("y");
        f.gate(CellKind::And, &[a, b], y);
        f.output("y", y);

        let result = f.run(&MapConfig::default());
        assert_eq!(result.stats.cut_size_histogram.get(&2), Some(&1));
        assert_eq!(result.stats.depth, 1);
        assert!(result.stats.avg_area_flow > 0.0);
    }
}
