//! The intra-procedural forward fixpoint iterator.
//!
//! Runs a single CFG to a fixpoint in one abstract domain, under a caller
//! supplied [`StmtTransformer`] -- the same iterator drives both the
//! bottom-up and the top-down phase, parameterized only by which transformer
//! it is handed. See [`crate::wto`] for the block-scheduling policy and
//! [`crate::driver`] for how this is threaded across a whole call graph.

use std::collections::BTreeMap as Map;
use std::collections::BTreeSet as Set;

use log::trace;

use crate::cfg::Cfg;
use crate::config::AnalysisConfig;
use crate::domain::AbstractDomain;
use crate::liveness::Liveness;
use crate::transformer::StmtTransformer;
use crate::wto;

/// Pre/post invariants recorded for every block of one CFG, plus the
/// post-state at the exit block (if the CFG has one) for convenience -- the
/// bottom-up phase projects exactly this value into a summary.
pub struct IntraResult<B, D> {
    pub pre: Map<B, D>,
    pub post: Map<B, D>,
    pub exit_post: Option<D>,
}

/// Run the forward fixpoint to completion over `cfg`, seeded with `init` at
/// the entry block.
pub fn run<C, D, T, L>(
    cfg: &C,
    init: D,
    transformer: &mut T,
    liveness: &L,
    shadow_vars: &Set<C::Var>,
    config: &AnalysisConfig,
) -> IntraResult<C::Block, D>
where
    C: Cfg,
    D: AbstractDomain<Var = C::Var>,
    T: StmtTransformer<C::Stmt, C::Var, D>,
    L: Liveness<C> + ?Sized,
{
    let wto = wto::compute(cfg);
    let entry = cfg.entry();

    // `post[b]` is the most recently computed post-state for `b`; absent
    // means "not yet computed this run", which behaves like bottom under
    // join (the predecessor simply contributes nothing until visited).
    let mut post: Map<C::Block, D> = Map::new();
    let mut widen_visits: Map<C::Block, u32> = Map::new();
    let mut jump_sets: Map<C::Block, Vec<D>> = Map::new();

    // Ascending phase: sweep the WTO order repeatedly, applying widening at
    // widening points once `widening_delay` plain joins have passed, until a
    // full sweep changes nothing.
    loop {
        let mut changed = false;
        for block in &wto.order {
            let pre = pre_state(cfg, block, &entry, &init, &post);
            let raw_post = transform_block(cfg, block, &pre, transformer);
            let pruned = prune_dead(&raw_post, block, liveness, config);

            let next = if wto.widening_points.contains(block) {
                let prev = post.get(block).cloned().unwrap_or_else(D::bottom);
                let visits = widen_visits.entry(block.clone()).or_insert(0);
                if *visits < config.widening_delay {
                    *visits += 1;
                    prev.join(&pruned)
                } else {
                    let candidate = jump_candidate(&mut jump_sets, block, &prev, &pruned, config.jump_set_size);
                    trace!(target: "Domain.count.widening", "widening at block");
                    prev.widening(&candidate)
                }
            } else {
                pruned
            };

            if post.get(block) != Some(&next) {
                changed = true;
                post.insert(block.clone(), next);
            }
        }
        if !changed {
            break;
        }
    }

    // Descending phase: up to `descending_iters` narrowing sweeps at
    // widening points, folded into a plain re-evaluation everywhere else.
    let mut rounds = 0u32;
    loop {
        if let Some(max) = config.descending_iters {
            if rounds >= max {
                break;
            }
        }
        let mut changed = false;
        for block in &wto.order {
            let pre = pre_state(cfg, block, &entry, &init, &post);
            let raw_post = transform_block(cfg, block, &pre, transformer);
            let pruned = prune_dead(&raw_post, block, liveness, config);

            let next = if wto.widening_points.contains(block) {
                let prev = post.get(block).cloned().unwrap_or_else(D::bottom);
                prev.narrowing(&pruned)
            } else {
                pruned
            };

            if post.get(block) != Some(&next) {
                changed = true;
                post.insert(block.clone(), next);
            }
        }
        rounds += 1;
        if !changed {
            break;
        }
    }

    // Both sweeps above may have called the transformer many times per
    // block with successively less-conservative pre-states; any transformer
    // side effect keyed on those intermediate states (namely the top-down
    // transformer's call-context recording) would wrongly latch onto the
    // widened, pre-narrowing values. Recompute each block exactly once more
    // from its now-stable pre-state, with the transformer's side effects
    // switched on, before reading off the invariants to record.
    transformer.finalize();
    for block in &wto.order {
        let pre = pre_state(cfg, block, &entry, &init, &post);
        let _ = transform_block(cfg, block, &pre, transformer);
    }

    // Final pass: record pre/post invariants once per block, stripping
    // shadow variables unless the caller asked to keep them.
    let mut pre_map = Map::new();
    let mut post_map = Map::new();
    for block in &wto.order {
        let pre = pre_state(cfg, block, &entry, &init, &post);
        let post_val = post.get(block).cloned().unwrap_or_else(D::bottom);

        let pre_recorded = strip_shadows(&pre, shadow_vars, config);
        let post_recorded = strip_shadows(&post_val, shadow_vars, config);

        pre_map.insert(block.clone(), pre_recorded);
        post_map.insert(block.clone(), post_recorded);
    }

    let exit_post = cfg.exit().map(|b| post.get(&b).cloned().unwrap_or_else(D::bottom));

    IntraResult { pre: pre_map, post: post_map, exit_post }
}

fn pre_state<C, D>(cfg: &C, block: &C::Block, entry: &C::Block, init: &D, post: &Map<C::Block, D>) -> D
where
    C: Cfg,
    D: AbstractDomain<Var = C::Var>,
{
    let mut acc = if block == entry { init.clone() } else { D::bottom() };
    for pred in cfg.predecessors(block) {
        if let Some(p) = post.get(&pred) {
            acc = acc.join(p);
        }
    }
    acc
}

fn transform_block<C, D, T>(cfg: &C, block: &C::Block, pre: &D, transformer: &mut T) -> D
where
    C: Cfg,
    D: AbstractDomain<Var = C::Var>,
    T: StmtTransformer<C::Stmt, C::Var, D>,
{
    let mut cur = pre.clone();
    for stmt in cfg.statements(block) {
        cur = transformer.step(stmt, &cur);
    }
    cur
}

fn prune_dead<C, D, L>(post: &D, block: &C::Block, liveness: &L, config: &AnalysisConfig) -> D
where
    C: Cfg,
    D: AbstractDomain<Var = C::Var>,
    L: Liveness<C> + ?Sized,
{
    if !config.run_liveness || post.is_bottom() || post.is_top() {
        return post.clone();
    }
    let dead: Vec<C::Var> = liveness.dead_exit(block).into_iter().collect();
    post.forget(&dead)
}

fn strip_shadows<D: AbstractDomain>(value: &D, shadow_vars: &Set<D::Var>, config: &AnalysisConfig) -> D {
    if config.keep_shadows || shadow_vars.is_empty() {
        return value.clone();
    }
    let vars: Vec<D::Var> = shadow_vars.iter().cloned().collect();
    value.forget(&vars)
}

/// The jump-set heuristic: remember up to `size` previously observed raw
/// post-states per widening point, and widen against the most recently
/// remembered member that is `>=` the previous iterate rather than against
/// the raw new value directly. Disabled (falls back to `new` verbatim) at
/// `size == 0`.
fn jump_candidate<B, D>(jump_sets: &mut Map<B, Vec<D>>, block: &B, prev: &D, new: &D, size: usize) -> D
where
    B: Clone + Eq + Ord,
    D: AbstractDomain + Clone,
{
    if size == 0 {
        return new.clone();
    }
    let set = jump_sets.entry(block.clone()).or_default();
    set.push(new.clone());
    if set.len() > size {
        set.remove(0);
    }
    set.iter().rev().find(|member| prev.leq(member)).cloned().unwrap_or_else(|| new.clone())
}
