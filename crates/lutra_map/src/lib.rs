//! Priority-cut technology mapping onto single- and dual-output LUTs.
//!
//! The mapper converts a gate-level netlist into K-input lookup tables
//! (K = 6), fusing selected pairs of cuts into dual-output LUTs that share
//! five data inputs plus a selector and emit two functions at once. A
//! fused pair is legal exactly when the secondary function equals the
//! primary function with the selector fixed to zero, which is verified on
//! exact truth tables before any pair is accepted.
//!
//! Mapping runs three scheduling passes over the same machinery:
//! 1. **Depth** — minimize mapped depth.
//! 2. **Area flow** — iterate with recovered reference counts until the
//!    LUT count settles.
//! 3. **Exact area** — one final pass under the memoized exact-area cost.
//!
//! # Usage
//!
//! ```ignore
//! use lutra_map::{map_module, MapConfig};
//! let outcome = map_module(&module, &sigmap, &library, &interner, &config, &sink)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod cut_manager;
pub mod cuts;
pub mod emit;
pub mod evaluator;
pub mod graph;
pub mod merger;
pub mod timing;
pub mod truth;

pub use config::{ConfigError, HeuristicWeights, MapConfig};
pub use context::{CacheStats, MappingContext};
pub use cut_manager::CutManager;
pub use cuts::{Cut, DoubleCut, SingleCut};
pub use emit::MappedModule;
pub use evaluator::{EvalMode, Evaluator};
pub use graph::MappingGraph;
pub use merger::{GlobalMerger, MappingResult, MappingStats};
pub use timing::TimingAnalyzer;
pub use truth::{TruthTableComputer, TruthTableError};

use lutra_common::{InternalError, Interner, LutraResult};
use lutra_diagnostics::DiagnosticSink;
use lutra_ir::{CellLibrary, Module, SigMap, SignalId};
use std::collections::BTreeMap;

/// Errors aborting a mapping run.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The configuration cannot be mapped to the target cell family.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An internal invariant broke; the run is unusable.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Everything a mapping run produces.
#[derive(Debug)]
pub struct MapOutcome {
    /// The mapping tables and statistics.
    pub result: MappingResult,
    /// The mapped netlist: boundary cells plus emitted LUTs.
    pub module: MappedModule,
    /// Arrival times per canonical signal, for downstream timing-aware
    /// passes.
    pub depth_map: BTreeMap<SignalId, f64>,
}

/// Maps one module.
///
/// The module is read-only; the mapped netlist is returned as a fresh
/// [`MappedModule`]. Structural degradations (cycles, unknown cells,
/// unmappable nodes) surface as warnings in `sink`; only configuration
/// errors and internal invariant violations abort.
pub fn map_module(
    module: &Module,
    sigmap: &SigMap,
    library: &dyn CellLibrary,
    interner: &Interner,
    config: &MapConfig,
    sink: &DiagnosticSink,
) -> Result<MapOutcome, MapError> {
    config.validate()?;

    let graph = MappingGraph::build(module, sigmap, library, interner, sink);
    let timing = TimingAnalyzer::analyze(&graph);
    let mut ctx = MappingContext::new(graph.primary_outputs().clone());
    let truth = TruthTableComputer::new(module, &graph, sigmap, interner);
    let mut evaluator = Evaluator::new(EvalMode::Depth);
    let mut cut_mgr = CutManager::new(config);
    let mut merger = GlobalMerger::new(config);

    // Depth pass.
    cut_mgr.compute(&graph, &evaluator, &mut ctx, &timing);
    merger.run_global_mapping(&graph, &cut_mgr, &evaluator, &mut ctx, &timing, &truth)?;

    // Area-flow passes, until the LUT count settles.
    evaluator.set_mode(EvalMode::AreaFlow);
    let mut prev_area = i64::MAX;
    for _ in 0..config.area_flow_max_iterations {
        ctx.start_new_iteration();
        ctx.recover_references(merged_mapping_view(&merger)?);
        cut_mgr.compute(&graph, &evaluator, &mut ctx, &timing);
        merger.run_global_mapping(&graph, &cut_mgr, &evaluator, &mut ctx, &timing, &truth)?;

        let area = merger.lut_count() as i64;
        if (area - prev_area).abs() <= 1 {
            break;
        }
        prev_area = area;
    }

    // Exact-area pass.
    evaluator.set_mode(EvalMode::ExactArea);
    ctx.start_new_iteration();
    ctx.recover_references(merged_mapping_view(&merger)?);
    cut_mgr.compute(&graph, &evaluator, &mut ctx, &timing);
    merger.run_global_mapping(&graph, &cut_mgr, &evaluator, &mut ctx, &timing, &truth)?;

    // Leave the reference counts describing the final mapping, then emit.
    ctx.start_new_iteration();
    ctx.recover_references(merged_mapping_view(&merger)?);
    let mut result = merger.result(&evaluator, &mut ctx, &timing);
    let mapped = emit::write_mapped_module(
        module,
        &graph,
        sigmap,
        &truth,
        &mut result,
        interner,
        sink,
        config.max_cut_size,
    );

    let depth_map: BTreeMap<SignalId, f64> =
        timing.arrival_map().iter().map(|(&s, &at)| (s, at)).collect();

    Ok(MapOutcome {
        result,
        module: mapped,
        depth_map,
    })
}

/// The single-cut view of the full mapping: one entry per single-output
/// cut plus two entries per dual-output pair, each carrying the shared
/// input set.
///
/// A signal appearing both as a single key and as a dual output violates
/// the disjointness invariant and aborts the run.
fn merged_mapping_view(merger: &GlobalMerger) -> LutraResult<BTreeMap<SignalId, SingleCut>> {
    let mut all = merger.single_mappings().clone();
    for dc in merger.dual_mappings().values() {
        for output in [dc.z, dc.z5] {
            let entry = SingleCut::new(dc.inputs.clone(), output);
            if all.insert(output, entry).is_some() {
                return Err(InternalError::new(format!(
                    "signal {output:?} is mapped as both single and dual output"
                )));
            }
        }
    }
    Ok(all)
}
