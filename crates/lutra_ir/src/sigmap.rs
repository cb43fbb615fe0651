//! Signal canonicalization over aliased nets.

use crate::ids::SignalId;
use crate::module::Module;
use std::collections::HashMap;

/// A signal-equivalence map collapsing aliased nets to canonical
/// representatives.
///
/// Built once per module from its alias list via union-find; afterwards
/// every component of the mapper talks exclusively in canonical bits, so
/// two signals compare equal iff they name the same net. The representative
/// of an alias class is its smallest signal ID, which keeps canonicalization
/// deterministic across runs.
pub struct SigMap {
    canonical: HashMap<SignalId, SignalId>,
}

impl SigMap {
    /// Builds the canonicalizer from a module's alias pairs.
    pub fn build(module: &Module) -> Self {
        let mut parent: HashMap<SignalId, SignalId> = HashMap::new();

        fn find(parent: &mut HashMap<SignalId, SignalId>, s: SignalId) -> SignalId {
            let p = *parent.get(&s).unwrap_or(&s);
            if p == s {
                return s;
            }
            let root = find(parent, p);
            parent.insert(s, root);
            root
        }

        for &(a, b) in &module.aliases {
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            if ra != rb {
                // Smaller ID wins as representative.
                let (keep, fold) = if ra < rb { (ra, rb) } else { (rb, ra) };
                parent.insert(fold, keep);
            }
        }

        let mut canonical = HashMap::new();
        for (_, sig) in module.signals.iter() {
            let root = find(&mut parent, sig.id);
            if root != sig.id {
                canonical.insert(sig.id, root);
            }
        }

        Self { canonical }
    }

    /// Returns the canonical representative of a signal.
    pub fn canonical(&self, signal: SignalId) -> SignalId {
        self.canonical.get(&signal).copied().unwrap_or(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lutra_common::Interner;

    fn module_with_signals(n: u32) -> (Module, Interner) {
        let interner = Interner::new();
        let mut m = Module::new(interner.get_or_intern("top"));
        for i in 0..n {
            m.add_signal(interner.get_or_intern(&format!("n{i}")));
        }
        (m, interner)
    }

    #[test]
    fn identity_without_aliases() {
        let (m, _i) = module_with_signals(3);
        let sm = SigMap::build(&m);
        for raw in 0..3 {
            let s = SignalId::from_raw(raw);
            assert_eq!(sm.canonical(s), s);
        }
    }

    #[test]
    fn direct_alias_resolves_to_smaller() {
        let (mut m, _i) = module_with_signals(2);
        m.add_alias(SignalId::from_raw(1), SignalId::from_raw(0));
        let sm = SigMap::build(&m);
        assert_eq!(sm.canonical(SignalId::from_raw(1)), SignalId::from_raw(0));
        assert_eq!(sm.canonical(SignalId::from_raw(0)), SignalId::from_raw(0));
    }

    #[test]
    fn alias_chain_collapses() {
        let (mut m, _i) = module_with_signals(4);
        m.add_alias(SignalId::from_raw(3), SignalId::from_raw(2));
        m.add_alias(SignalId::from_raw(2), SignalId::from_raw(1));
        m.add_alias(SignalId::from_raw(1), SignalId::from_raw(0));
        let sm = SigMap::build(&m);
        for raw in 0..4 {
            assert_eq!(
                sm.canonical(SignalId::from_raw(raw)),
                SignalId::from_raw(0)
            );
        }
    }

    #[test]
    fn disjoint_classes_stay_apart() {
        let (mut m, _i) = module_with_signals(4);
        m.add_alias(SignalId::from_raw(0), SignalId::from_raw(1));
        m.add_alias(SignalId::from_raw(2), SignalId::from_raw(3));
        let sm = SigMap::build(&m);
        assert_eq!(sm.canonical(SignalId::from_raw(1)), SignalId::from_raw(0));
        assert_eq!(sm.canonical(SignalId::from_raw(3)), SignalId::from_raw(2));
        assert_ne!(
            sm.canonical(SignalId::from_raw(1)),
            sm.canonical(SignalId::from_raw(3))
        );
    }
}
