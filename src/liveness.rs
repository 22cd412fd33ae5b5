//! Liveness and variable-factory interfaces.
//!
//! Both are external collaborators: this crate consumes only the narrow
//! query surface the fixpoint iterator needs, never the analyses that
//! produce the answers.

use std::collections::BTreeMap as Map;
use std::collections::BTreeSet as Set;

use crate::cfg::{CallGraph, Cfg};
use crate::error::AnalysisError;
use crate::func_decl::FuncDecl;

/// Dead-at-exit queries for a single CFG, as computed by an (external)
/// backward liveness analysis.
///
/// A `Liveness` implementation answers for exactly one function's blocks --
/// it has no notion of which function it belongs to. Disambiguating
/// same-named blocks across different functions (every [`crate::testutil::TestCfg`]
/// in this crate's own harness calls its entry block `"entry"`, for
/// instance) is [`LivenessMap`]'s job, not this trait's: the engine never
/// calls `dead_exit` on a bare `Liveness` directly, only through a map entry
/// already selected for the function being analyzed.
pub trait Liveness<C: Cfg> {
    /// The set of variables dead immediately after `block` -- safe to
    /// `forget` from the post-state without losing any invariant a live
    /// successor could observe.
    fn dead_exit(&self, block: &C::Block) -> Set<C::Var>;
}

/// A liveness implementation that prunes nothing. Useful when
/// [`crate::config::AnalysisConfig::run_liveness`] is disabled, or when a
/// caller has no liveness information for a particular CFG -- its absence
/// from a supplied liveness map means "no pruning for this CFG", not
/// malformed input.
pub struct NoLiveness;

impl<C: Cfg> Liveness<C> for NoLiveness {
    fn dead_exit(&self, _block: &C::Block) -> Set<C::Var> {
        Set::new()
    }
}

/// Per-function liveness results, keyed by [`FuncDecl`] -- mirrors crab's
/// `liveness_map_t = map<cfg, liveness>` (`InterFwdAnalyzer.hpp`'s
/// `get_live(cfg)`). A function absent from the map is treated as having
/// nothing dead to prune for that function; liveness is an optional pruning
/// aid, not a soundness requirement, so a partial map is not an error.
///
/// Each entry is boxed as a trait object rather than carried as a single
/// shared type parameter on the map, since in general each function's
/// liveness result is the output of an independent backward analysis run
/// over that function's own CFG, not one value reused across functions.
pub struct LivenessMap<C: Cfg> {
    map: Map<FuncDecl<C::Var>, Box<dyn Liveness<C>>>,
}

impl<C: Cfg> LivenessMap<C> {
    pub fn new() -> Self {
        LivenessMap { map: Map::new() }
    }

    /// Record `fd`'s liveness result. A second insertion for the same
    /// function replaces the first.
    pub fn insert(&mut self, fd: FuncDecl<C::Var>, liveness: Box<dyn Liveness<C>>) {
        self.map.insert(fd, liveness);
    }

    /// The liveness result recorded for `fd`, or `None` if this map has
    /// nothing for it.
    pub fn get(&self, fd: &FuncDecl<C::Var>) -> Option<&dyn Liveness<C>> {
        self.map.get(fd).map(|b| b.as_ref())
    }

    /// Dead-at-exit variables for `block` of `fd`, or the empty set if `fd`
    /// has no entry in this map.
    pub fn dead_exit(&self, fd: &FuncDecl<C::Var>, block: &C::Block) -> Set<C::Var> {
        self.get(fd).map(|l| l.dead_exit(block)).unwrap_or_default()
    }

    /// Check that every key of this map names a function that is actually a
    /// node of `cg`. A liveness map built against a stale or different call
    /// graph is a contract violation that must be surfaced to the caller,
    /// not silently ignored -- unlike a function simply *missing* from the
    /// map, which is sound (it just means no pruning for that function).
    pub fn validate<CG>(&self, cg: &CG) -> Result<(), AnalysisError>
    where
        CG: CallGraph<Cfg = C>,
    {
        for fd in self.map.keys() {
            if !cg.functions().iter().any(|f| f.func_decl() == fd) {
                return Err(AnalysisError(format!(
                    "liveness map has an entry for `{fd}`, which is not a node of the supplied call graph"
                )));
            }
        }
        Ok(())
    }
}

impl<C: Cfg> Default for LivenessMap<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Classifies engine-internal variables (e.g. SSA shadow copies) that should
/// be stripped from invariants recorded for external consumption unless
/// [`crate::config::AnalysisConfig::keep_shadows`] is set.
pub trait VarFactory<Var> {
    fn shadow_vars(&self) -> Set<Var>;
}

/// A variable factory with no shadow variables -- the default when a caller
/// has no SSA-style naming scheme to hide.
pub struct NoShadows;

impl<Var> VarFactory<Var> for NoShadows {
    fn shadow_vars(&self) -> Set<Var> {
        Set::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{TestCallGraph, TestCfgBuilder, Var};

    struct DeadVars(Vec<Var>);

    impl Liveness<crate::testutil::TestCfg> for DeadVars {
        fn dead_exit(&self, _block: &String) -> Set<Var> {
            self.0.iter().cloned().collect()
        }
    }

    fn fd(name: &str) -> FuncDecl<Var> {
        FuncDecl::new(name, vec![], None)
    }

    #[test]
    fn same_named_blocks_in_different_functions_do_not_collide() {
        let mut map = LivenessMap::<crate::testutil::TestCfg>::new();
        map.insert(fd("f"), Box::new(DeadVars(vec!["tmp_f".to_string()])));
        map.insert(fd("g"), Box::new(DeadVars(vec!["tmp_g".to_string()])));

        let dead_f = map.dead_exit(&fd("f"), &"entry".to_string());
        let dead_g = map.dead_exit(&fd("g"), &"entry".to_string());
        assert!(dead_f.contains("tmp_f"));
        assert!(!dead_f.contains("tmp_g"));
        assert!(dead_g.contains("tmp_g"));
        assert!(!dead_g.contains("tmp_f"));
    }

    #[test]
    fn function_absent_from_the_map_has_nothing_dead() {
        let map = LivenessMap::<crate::testutil::TestCfg>::new();
        assert!(map.dead_exit(&fd("unlisted"), &"entry".to_string()).is_empty());
    }

    #[test]
    fn validate_rejects_an_entry_for_a_function_not_in_the_call_graph() {
        let main_decl = fd("main");
        let main = TestCfgBuilder::new(main_decl, "entry").block("entry", vec![]).exit("entry").build();
        let cg = TestCallGraph::new(vec![main]);

        let mut map = LivenessMap::<crate::testutil::TestCfg>::new();
        map.insert(fd("not_in_graph"), Box::new(DeadVars(vec![])));

        assert!(map.validate(&cg).is_err());
    }

    #[test]
    fn validate_accepts_a_map_whose_keys_are_all_call_graph_nodes() {
        let main_decl = fd("main");
        let main = TestCfgBuilder::new(main_decl, "entry").block("entry", vec![]).exit("entry").build();
        let cg = TestCallGraph::new(vec![main]);

        let mut map = LivenessMap::<crate::testutil::TestCfg>::new();
        map.insert(fd("main"), Box::new(DeadVars(vec![])));

        assert!(map.validate(&cg).is_ok());
    }
}
