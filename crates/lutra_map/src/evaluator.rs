//! Mode-dependent cut scoring and comparison.

use crate::context::MappingContext;
use crate::cuts::SingleCut;
use crate::timing::TimingAnalyzer;
use std::cmp::Ordering;

/// Area-flow values closer than this compare equal.
const AREA_FLOW_EPSILON: f64 = 1e-6;

/// The evaluation mode of the current mapping pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMode {
    /// Minimize mapped depth (first pass).
    Depth,
    /// Minimize area flow (middle iterations).
    AreaFlow,
    /// Minimize exact area (final pass).
    ExactArea,
}

/// The three per-cut measures, captured against the current context and
/// timing state.
///
/// Queue entries and sort batches precompute these once per cut; the
/// surrounding pass does not mutate the context while a batch is ordered,
/// so the capture is exact.
#[derive(Debug, Clone, Copy)]
pub struct CutMetrics {
    /// Mapped depth of the cut.
    pub depth: i32,
    /// Amortised area estimate `(sum(input areas) + 1) / max(1, refs)`.
    pub area_flow: f64,
    /// Exact area of the cut's output under the current mapping.
    pub area: u32,
}

/// Scores cuts and orders them under the current evaluation mode.
///
/// The evaluator stores nothing per cut; every measure is recomputed
/// through [`MappingContext`] and [`TimingAnalyzer`], which is how mode
/// switches and reference-count recovery take effect immediately.
pub struct Evaluator {
    mode: EvalMode,
}

impl Evaluator {
    /// Creates an evaluator in the given mode.
    pub fn new(mode: EvalMode) -> Self {
        Self { mode }
    }

    /// Switches the evaluation mode.
    ///
    /// Must not be called while a queue ordered by this evaluator is
    /// non-empty.
    pub fn set_mode(&mut self, mode: EvalMode) {
        self.mode = mode;
    }

    /// The current evaluation mode.
    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    /// Computes all three measures of a cut.
    pub fn metrics(
        &self,
        cut: &SingleCut,
        ctx: &mut MappingContext,
        timing: &TimingAnalyzer,
    ) -> CutMetrics {
        CutMetrics {
            depth: timing.cut_depth(&cut.inputs),
            area_flow: self.area_flow(cut, ctx),
            area: ctx.exact_area(cut.output),
        }
    }

    /// The amortised area estimate of a cut: the exact area of its inputs
    /// plus one for the LUT itself, divided by the output's fanout
    /// references.
    pub fn area_flow(&self, cut: &SingleCut, ctx: &mut MappingContext) -> f64 {
        let mut input_area = 0u32;
        for &input in &cut.inputs {
            input_area += ctx.exact_area(input);
        }
        let refs = ctx.fanout_refs(cut.output).max(1);
        (input_area + 1) as f64 / refs as f64
    }

    /// Orders two metric captures under the current mode. `Less` means the
    /// first cut is better.
    pub fn compare(&self, a: &CutMetrics, b: &CutMetrics) -> Ordering {
        match self.mode {
            EvalMode::Depth => a
                .depth
                .cmp(&b.depth)
                .then_with(|| a.area_flow.total_cmp(&b.area_flow)),
            EvalMode::AreaFlow => {
                if (a.area_flow - b.area_flow).abs() > AREA_FLOW_EPSILON {
                    a.area_flow.total_cmp(&b.area_flow)
                } else {
                    a.depth.cmp(&b.depth)
                }
            }
            EvalMode::ExactArea => a.area.cmp(&b.area).then_with(|| a.depth.cmp(&b.depth)),
        }
    }

    /// Returns `true` if `a` is strictly better than `b` under the current
    /// mode.
    pub fn better(&self, a: &CutMetrics, b: &CutMetrics) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}
