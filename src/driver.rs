//! The inter-procedural driver: two-phase orchestration over
//! the whole call graph, and the query surface clients use afterwards.
//!
//! Phase 1 (bottom-up) populates the summary table by running every
//! non-`main` function with an exit block, in reverse topological SCC order,
//! under [`crate::transformer::BottomUpTransformer`]. Phase 2 (top-down)
//! populates per-block invariants by running every function, in forward SCC
//! order, under [`crate::transformer::TopDownTransformer`], seeded from the
//! call-context table that phase populates as it goes. A call graph with no
//! edges at all short-circuits straight to a top-down analysis of `main`
//! alone -- this assumes upstream inlining has already flattened any real
//! call structure; see [`crate::config::AnalysisConfig::analyze_callless_functions`]
//! for the surfaced opt-in this crate offers instead of changing that default.

use std::collections::BTreeMap as Map;

use log::{debug, warn};

use crate::cfg::{CallGraph, Cfg};
use crate::config::AnalysisConfig;
use crate::context::CallCtxTable;
use crate::domain::AbstractDomain;
use crate::error::AnalysisError;
use crate::fixpoint;
use crate::func_decl::FuncDecl;
use crate::liveness::{Liveness, LivenessMap, NoLiveness, VarFactory};
use crate::scc;
use crate::summary::{Summary, SummaryTable};
use crate::transformer::{BottomUpTransformer, NonCallTransformer, TopDownTransformer};

/// The stand-in used for a function with no entry in the supplied
/// [`LivenessMap`] (or when no map was supplied at all): prunes nothing.
/// A `'static` unit value, so [`InterFwdAnalyzer::liveness_for`] can hand out
/// a reference to it for any lifetime the caller needs.
const NO_LIVENESS: NoLiveness = NoLiveness;

/// Per-function pre/post invariants, keyed by [`FuncDecl`] as a `BTreeMap`
/// over `FuncDecl`'s own name-based `Ord` rather than a separately derived
/// numeric hash.
struct FuncInvariants<C: Cfg, D> {
    pre: Map<C::Block, D>,
    post: Map<C::Block, D>,
}

/// The two-phase inter-procedural forward analyzer.
///
/// `CG` is the call graph (and, through it, the CFG and statement types);
/// `D` is the single abstract domain shared by both phases (a bottom-up and
/// top-down domain that happen to coincide here, rather than two distinct
/// type parameters); `NC` supplies non-call statement semantics. Liveness is
/// not a type parameter: a [`LivenessMap`] keyed by [`FuncDecl`] is supplied
/// at construction (mirroring crab's `liveness_map_t = map<cfg, liveness>`),
/// since one function's liveness result says nothing about another's -- a
/// single shared `Liveness` value cannot distinguish same-named blocks
/// (e.g. every function's entry block called `"entry"`) across functions.
pub struct InterFwdAnalyzer<'a, CG, D, NC>
where
    CG: CallGraph,
    D: AbstractDomain<Var = <CG::Cfg as Cfg>::Var>,
{
    cg: &'a CG,
    base: &'a NC,
    liveness_map: Option<&'a LivenessMap<CG::Cfg>>,
    shadow_vars: std::collections::BTreeSet<D::Var>,
    config: AnalysisConfig,

    summaries: SummaryTable<D>,
    call_tbl: CallCtxTable<D>,
    invariants: Map<FuncDecl<D::Var>, FuncInvariants<CG::Cfg, D>>,
}

impl<'a, CG, D, NC> InterFwdAnalyzer<'a, CG, D, NC>
where
    CG: CallGraph,
    D: AbstractDomain<Var = <CG::Cfg as Cfg>::Var>,
    NC: NonCallTransformer<<CG::Cfg as Cfg>::Stmt, Dom = D>,
{
    /// Construct a new analyzer. `liveness_map` is validated against `cg`
    /// immediately: an entry for a function that is not a node of `cg` is a
    /// caller contract violation that must be reported rather than silently
    /// ignored (see [`LivenessMap::validate`]). `liveness_map` being `None`,
    /// or simply missing an entry for some function, is not an error --
    /// both mean "no pruning" for the functions without one.
    pub fn new<VF>(
        cg: &'a CG,
        base: &'a NC,
        liveness_map: Option<&'a LivenessMap<CG::Cfg>>,
        var_factory: &VF,
        config: AnalysisConfig,
    ) -> Result<Self, AnalysisError>
    where
        VF: VarFactory<D::Var>,
    {
        if let Some(map) = liveness_map {
            map.validate(cg)?;
        }

        Ok(InterFwdAnalyzer {
            cg,
            base,
            liveness_map,
            shadow_vars: var_factory.shadow_vars(),
            config,
            summaries: SummaryTable::new(),
            call_tbl: CallCtxTable::new(),
            invariants: Map::new(),
        })
    }

    /// The liveness to use for `fd`: its own entry in the supplied map if
    /// one was recorded, or the no-op fallback otherwise. Selected fresh per
    /// function rather than held as a single shared value, since each
    /// function's dead-at-exit answers are meaningful only for that
    /// function's own blocks.
    fn liveness_for(&self, fd: &FuncDecl<D::Var>) -> &'a dyn Liveness<CG::Cfg> {
        self.liveness_map.and_then(|m| m.get(fd)).unwrap_or(&NO_LIVENESS)
    }

    /// Run the full two-phase analysis, seeded at the root with `init`.
    pub fn run(&mut self, init: D) {
        debug!(target: "Inter", "starting inter-procedural analysis");

        let has_edges = self.cg.functions().iter().any(|f| !self.cg.callees(f).is_empty());

        if !has_edges {
            debug!(target: "Inter", "call graph has no edges, short-circuiting to main-only analysis");
            for f in self.cg.functions() {
                if f.func_decl().is_main() {
                    self.analyze_top_down(f, init.clone());
                } else if self.config.analyze_callless_functions {
                    self.analyze_top_down(f, D::top());
                }
            }
            return;
        }

        self.run_bottom_up();
        self.run_top_down(init);
    }

    /// Phase 1 alone -- exposed for clients that bridge two distinct
    /// bottom-up/top-down domains manually by running this phase in one
    /// domain and [`Self::run_top_down_with`] in another.
    pub fn run_bottom_up_only(&mut self) {
        self.run_bottom_up();
    }

    /// Phase 2 alone, with an externally supplied summary table (already
    /// converted into this analyzer's domain, if bridging two domains).
    pub fn run_top_down_with(&mut self, summaries: SummaryTable<D>, init: D) {
        self.summaries = summaries;
        self.run_top_down(init);
    }

    fn run_bottom_up(&mut self) {
        debug!(target: "Inter.BottomUp", "phase 1: bottom-up summary synthesis");
        let sccs = scc::reverse_topological_order(self.cg);
        for scc in &sccs {
            for f in &scc.members {
                if f.func_decl().is_main() || !f.has_exit() {
                    continue;
                }
                debug!(target: "Inter.BottomUp", "summarizing function `{}`", f.func_decl());

                let mut transformer = BottomUpTransformer::new(self.base, &self.summaries);
                let liveness = self.liveness_for(f.func_decl());
                let result = fixpoint::run(*f, D::top(), &mut transformer, liveness, &self.shadow_vars, &self.config);

                // exit() is checked above via has_exit(), so this is always Some.
                let exit_val = result.exit_post.expect("has_exit implies an exit block");
                let formals = f.func_decl().params().to_vec();
                let mut project_vars = formals.clone();
                if let Some(ret) = f.func_decl().ret() {
                    project_vars.push(ret.clone());
                }
                let projected = exit_val.project(&project_vars);

                self.summaries.insert(f.func_decl().clone(), projected, f.func_decl().ret().cloned(), formals);
            }
        }
    }

    fn run_top_down(&mut self, init: D) {
        debug!(target: "Inter.TopDown", "phase 2: top-down context propagation");
        let sccs = scc::reverse_topological_order(self.cg);
        let forward_order: Vec<_> = sccs.into_iter().rev().collect();

        let mut root_taken = false;
        for scc in &forward_order {
            if scc.recursive {
                for f in &scc.members {
                    self.call_tbl.insert(f.func_decl().clone(), D::top());
                }
            }
            for f in &scc.members {
                let entry = if !root_taken {
                    root_taken = true;
                    init.clone()
                } else {
                    self.call_tbl.get(f.func_decl())
                };
                self.analyze_top_down(*f, entry);
            }
        }
    }

    fn analyze_top_down(&mut self, f: &CG::Cfg, entry: D) {
        debug!(target: "Inter.TopDown", "analyzing function `{}`", f.func_decl());
        let liveness = self.liveness_for(f.func_decl());
        let mut transformer = TopDownTransformer::new(self.base, &self.summaries, &mut self.call_tbl);
        let result = fixpoint::run(f, entry, &mut transformer, liveness, &self.shadow_vars, &self.config);
        self.invariants.insert(f.func_decl().clone(), FuncInvariants { pre: result.pre, post: result.post });
    }

    /// The stored pre-invariant for `block` of `cfg`, or `top` if the
    /// function or block was never analyzed.
    pub fn get_pre(&self, cfg: &CG::Cfg, block: &<CG::Cfg as Cfg>::Block) -> D {
        self.invariants
            .get(cfg.func_decl())
            .and_then(|inv| inv.pre.get(block))
            .cloned()
            .unwrap_or_else(D::top)
    }

    /// The stored post-invariant for `block` of `cfg`, or `top` if the
    /// function or block was never analyzed.
    pub fn get_post(&self, cfg: &CG::Cfg, block: &<CG::Cfg as Cfg>::Block) -> D {
        self.invariants
            .get(cfg.func_decl())
            .and_then(|inv| inv.post.get(block))
            .cloned()
            .unwrap_or_else(D::top)
    }

    pub fn has_summary(&self, cfg: &CG::Cfg) -> bool {
        self.summaries.has_summary(cfg.func_decl())
    }

    /// The recorded summary for `cfg`'s function, or `top` with a warning if
    /// none was ever recorded (non-returning function, or a function never
    /// reached by the bottom-up phase).
    pub fn get_summary(&self, cfg: &CG::Cfg) -> D {
        match self.summaries.get(cfg.func_decl()) {
            Some(Summary { value, .. }) => value.clone(),
            None => {
                warn!(target: "Inter", "no summary recorded for `{}`, returning top", cfg.func_decl());
                D::top()
            }
        }
    }

    pub fn call_graph(&self) -> &'a CG {
        self.cg
    }

    /// A statement-level transformer bound to `value`, for external checkers
    /// that want to step individual statements by hand outside the engine's
    /// own fixpoint loop. Calls resolve against this analyzer's summary
    /// table with the usual havoc fallback; it never touches the
    /// call-context table, since it isn't part of either phase.
    pub fn abs_transformer<'v>(
        &self,
        value: &'v mut D,
    ) -> BoundStepper<'v, BottomUpTransformer<'_, <CG::Cfg as Cfg>::Stmt, NC>, D> {
        BoundStepper { transformer: BottomUpTransformer::new(self.base, &self.summaries), value }
    }
}

/// Wraps a [`crate::transformer::StmtTransformer`] together with the mutable
/// abstract value it steps -- see [`InterFwdAnalyzer::abs_transformer`].
pub struct BoundStepper<'v, T, D> {
    transformer: T,
    value: &'v mut D,
}

impl<'v, T, S, V, D> BoundStepper<'v, T, D>
where
    D: AbstractDomain<Var = V>,
    T: crate::transformer::StmtTransformer<S, V, D>,
{
    pub fn step(&mut self, stmt: &S) {
        *self.value = self.transformer.step(stmt, self.value);
    }

    pub fn value(&self) -> &D {
        self.value
    }
}
