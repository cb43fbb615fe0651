//! Per-signal mapping state: reference counts, used flags, and memoized
//! exact area.

use crate::cuts::SingleCut;
use lutra_ir::SignalId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

/// Exact-area cache counters.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Total exact-area queries.
    pub calls: u64,
    /// Queries answered from the cache.
    pub hits: u64,
}

impl CacheStats {
    /// Fraction of queries answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.hits as f64 / self.calls as f64
        }
    }
}

/// Tracks the state the exact-area evaluation mode and the reference-count
/// updates depend on.
///
/// The exact-area cache is invalidated by bumping `current_iteration`
/// rather than by clearing the map: entries whose stamp no longer matches
/// are dead without being touched.
pub struct MappingContext {
    fanout_refs: HashMap<SignalId, i32>,
    used: HashSet<SignalId>,
    current_mapping: BTreeMap<SignalId, SingleCut>,
    cache: HashMap<SignalId, (u64, u32)>,
    current_iteration: u64,
    primary_outputs: BTreeSet<SignalId>,
    stats: CacheStats,
}

impl MappingContext {
    /// Creates a context for a module with the given primary-output bits.
    pub fn new(primary_outputs: BTreeSet<SignalId>) -> Self {
        Self {
            fanout_refs: HashMap::new(),
            used: HashSet::new(),
            current_mapping: BTreeMap::new(),
            cache: HashMap::new(),
            current_iteration: 0,
            primary_outputs,
            stats: CacheStats::default(),
        }
    }

    /// Starts a new mapping iteration, invalidating all cached exact areas.
    pub fn start_new_iteration(&mut self) {
        self.current_iteration += 1;
    }

    /// The current iteration number.
    pub fn iteration(&self) -> u64 {
        self.current_iteration
    }

    /// How many current-mapping cuts consume a signal as an input.
    pub fn fanout_refs(&self, signal: SignalId) -> i32 {
        self.fanout_refs.get(&signal).copied().unwrap_or(0)
    }

    /// Whether a signal is reachable from a primary output through the
    /// current mapping.
    pub fn is_used(&self, signal: SignalId) -> bool {
        self.used.contains(&signal)
    }

    /// The cut currently mapped onto a signal, if any.
    pub fn current_mapping(&self, signal: SignalId) -> Option<&SingleCut> {
        self.current_mapping.get(&signal)
    }

    /// Replaces the current mapping and rebuilds reference counts and used
    /// flags by BFS from the primary outputs: every visited signal is
    /// marked used; mapped signals bump the reference count of each cut
    /// input and the BFS continues into those inputs.
    pub fn recover_references(&mut self, mapping: BTreeMap<SignalId, SingleCut>) {
        self.fanout_refs.clear();
        self.used.clear();
        self.current_mapping = mapping;

        let mut queue: VecDeque<SignalId> = self.primary_outputs.iter().copied().collect();
        let mut seen: HashSet<SignalId> = queue.iter().copied().collect();

        while let Some(signal) = queue.pop_front() {
            self.used.insert(signal);
            if let Some(cut) = self.current_mapping.get(&signal) {
                for &input in &cut.inputs {
                    *self.fanout_refs.entry(input).or_insert(0) += 1;
                    if seen.insert(input) {
                        queue.push_back(input);
                    }
                }
            }
        }
    }

    /// The number of LUTs materialized to implement a signal under the
    /// current mapping, memoized per iteration.
    ///
    /// A mapped signal materializes iff it is a primary output or has more
    /// than one fanout reference; it then costs 1 plus the exact area of
    /// its cut inputs (shared fan-in counted once through a visited set).
    /// A single-fanout internal signal is inlined into its consumer and
    /// contributes only its inputs' area.
    pub fn exact_area(&mut self, signal: SignalId) -> u32 {
        self.stats.calls += 1;

        if let Some(&(stamp, area)) = self.cache.get(&signal) {
            if stamp == self.current_iteration {
                self.stats.hits += 1;
                return area;
            }
        }

        let mut visited = HashSet::new();
        let area = self.exact_area_rec(signal, &mut visited);
        self.cache.insert(signal, (self.current_iteration, area));
        area
    }

    fn exact_area_rec(&self, signal: SignalId, visited: &mut HashSet<SignalId>) -> u32 {
        if !visited.insert(signal) {
            return 0;
        }
        let Some(cut) = self.current_mapping.get(&signal) else {
            return 0;
        };

        let inputs_area: u32 = cut
            .inputs
            .iter()
            .map(|&input| self.exact_area_rec(input, visited))
            .sum();

        if self.primary_outputs.contains(&signal) || self.fanout_refs(signal) > 1 {
            1 + inputs_area
        } else {
            inputs_area
        }
    }

    /// Incrementally re-references a mapped signal: each cut input gains a
    /// reference, and inputs crossing the 0 -> 1 transition are referenced
    /// recursively.
    pub fn reference(&mut self, signal: SignalId) {
        let Some(cut) = self.current_mapping.get(&signal) else {
            return;
        };
        let inputs: Vec<SignalId> = cut.inputs.iter().copied().collect();
        for input in inputs {
            let refs = self.fanout_refs.entry(input).or_insert(0);
            *refs += 1;
            if *refs == 1 && self.current_mapping.contains_key(&input) {
                self.reference(input);
            }
        }
        self.used.insert(signal);
    }

    /// Incrementally de-references a mapped signal, returning the area
    /// delta: negative when LUTs disappear from the mapping.
    pub fn dereference(&mut self, signal: SignalId) -> i32 {
        let Some(cut) = self.current_mapping.get(&signal) else {
            return 0;
        };
        let inputs: Vec<SignalId> = cut.inputs.iter().copied().collect();
        let mut delta = 0;
        for input in inputs {
            if let Some(refs) = self.fanout_refs.get_mut(&input) {
                *refs -= 1;
                if *refs == 0 && self.current_mapping.contains_key(&input) {
                    delta += self.dereference(input);
                }
            }
        }
        delta -= 1;
        self.used.remove(&signal);
        delta
    }

    /// Cache counters for this context.
    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }
}
