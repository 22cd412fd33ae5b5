//! Abstract transformers.
//!
//! All non-call statement semantics (assignment, assume, havoc, and any
//! domain-specific primitive) come from a client-supplied
//! [`NonCallTransformer`] -- an external collaborator, per the crate-level
//! docs. This module owns exactly one thing: call-site handling, which is
//! where the bottom-up and top-down phases genuinely differ.

use std::marker::PhantomData;

use crate::cfg::{CallInfo, Statement};
use crate::context::CallCtxTable;
use crate::domain::AbstractDomain;
use crate::summary::SummaryTable;

/// The statement-level semantics for everything that isn't a call or a
/// return. This is the piece named "statement-level abstract transformers
/// for non-call operations" in the out-of-scope list: a real client
/// supplies one per concrete domain/statement pair.
pub trait NonCallTransformer<S> {
    type Dom: AbstractDomain;

    fn transfer(&self, stmt: &S, pre: &Self::Dom) -> Self::Dom;
}

/// Applied at a call site once the callee's formals and (renamed) summary
/// are known: `meet` the renamed summary into the current state if a
/// summary exists, or havoc the assigned variable as the sound fallback
/// otherwise.
///
/// Projecting away the callee's internal variables after the meet is a
/// no-op here: the summary stored in [`SummaryTable`] is already restricted
/// to formals-plus-return (that restriction is the table's own insertion
/// invariant), and renaming maps that exact variable set onto the caller's
/// actuals-plus-lhs, so nothing internal to the callee survives the rename
/// for `project` to need to remove.
fn apply_summary_or_havoc<V, D>(summaries: &SummaryTable<D>, call: &CallInfo<'_, V>, pre: &D) -> D
where
    V: Clone,
    D: AbstractDomain<Var = V>,
{
    let formals = call.callee.params();
    match summaries.get(call.callee) {
        Some(summary) => {
            let mut from: Vec<V> = formals.to_vec();
            let mut to: Vec<V> = call.args.to_vec();
            if let (Some(ret_var), Some(lhs)) = (call.callee.ret(), call.lhs) {
                from.push(ret_var.clone());
                to.push(lhs.clone());
            }
            let renamed = summary.value.rename(&from, &to);
            pre.meet(&renamed)
        }
        None => {
            // Sound fallback: no summary means a forward reference, an
            // indirect/unresolved call, or a callee that never returns.
            // Havoc the assigned variable; a richer IR with by-reference
            // out-parameters would havoc those too.
            let mut havoc_vars = Vec::new();
            if let Some(lhs) = call.lhs {
                havoc_vars.push(lhs.clone());
            }
            pre.forget(&havoc_vars)
        }
    }
}

/// Uniform interface the intra-procedural fixpoint iterator
/// drives, implemented by both [`BottomUpTransformer`] and
/// [`TopDownTransformer`].
pub trait StmtTransformer<S: Statement<V>, V, D: AbstractDomain<Var = V>> {
    fn step(&mut self, stmt: &S, pre: &D) -> D;

    /// Called by the iterator exactly once per intra-procedural run, after
    /// the ascending and descending sweeps have both converged and
    /// immediately before the single pass that recomputes each block's
    /// transfer from its now-stable pre-state. The default is a no-op;
    /// [`TopDownTransformer`] uses it to start recording call-context
    /// contributions only from that final, narrowed pass -- see its own
    /// docs for why recording any earlier is unsound-for-precision.
    fn finalize(&mut self) {}
}

/// The bottom-up phase's statement transformer: non-call statements are
/// delegated to `base`; calls are resolved against `summaries` with the
/// havoc fallback; recursive calls within the same SCC have no summary yet
/// and fall into that same fallback: a recursive call is simply treated as
/// unknown here.
pub struct BottomUpTransformer<'a, S, NC: NonCallTransformer<S>> {
    base: &'a NC,
    summaries: &'a SummaryTable<NC::Dom>,
    _stmt: PhantomData<S>,
}

impl<'a, S, NC: NonCallTransformer<S>> BottomUpTransformer<'a, S, NC> {
    pub fn new(base: &'a NC, summaries: &'a SummaryTable<NC::Dom>) -> Self {
        BottomUpTransformer { base, summaries, _stmt: PhantomData }
    }
}

impl<'a, S, V, NC> StmtTransformer<S, V, NC::Dom> for BottomUpTransformer<'a, S, NC>
where
    S: Statement<V>,
    V: Clone,
    NC: NonCallTransformer<S>,
    NC::Dom: AbstractDomain<Var = V>,
{
    fn step(&mut self, stmt: &S, pre: &NC::Dom) -> NC::Dom {
        if let Some(call) = stmt.as_call() {
            apply_summary_or_havoc(self.summaries, &call, pre)
        } else if stmt.as_return().is_some() {
            pre.clone()
        } else {
            self.base.transfer(stmt, pre)
        }
    }
}

/// The top-down phase's statement transformer. Identical to the bottom-up
/// one at non-call statements; at a call site it additionally projects the
/// current state onto the callee's formals (renamed from the actuals) and
/// records that as an observed entry context before combining the summary.
///
/// Recording is gated by `recording`, which starts `false` and flips to
/// `true` only via [`StmtTransformer::finalize`]. The intra-procedural
/// iterator calls every statement's transfer many times per run -- once per
/// ascending sweep, again per descending (narrowing) sweep -- and
/// [`CallCtxTable::insert`] only ever joins, never replaces. Recording on
/// every one of those intermediate sweeps would permanently pollute a
/// callee's context with the widened (pre-narrowing) entry state, since a
/// later, tighter contribution can never un-join an earlier, looser one.
/// Gating recording to the single post-convergence pass is what lets
/// narrowing's precision actually reach the call-context table.
pub struct TopDownTransformer<'a, S, NC: NonCallTransformer<S>> {
    base: &'a NC,
    summaries: &'a SummaryTable<NC::Dom>,
    call_tbl: &'a mut CallCtxTable<NC::Dom>,
    recording: bool,
    _stmt: PhantomData<S>,
}

impl<'a, S, NC: NonCallTransformer<S>> TopDownTransformer<'a, S, NC> {
    pub fn new(
        base: &'a NC,
        summaries: &'a SummaryTable<NC::Dom>,
        call_tbl: &'a mut CallCtxTable<NC::Dom>,
    ) -> Self {
        TopDownTransformer { base, summaries, call_tbl, recording: false, _stmt: PhantomData }
    }
}

impl<'a, S, V, NC> StmtTransformer<S, V, NC::Dom> for TopDownTransformer<'a, S, NC>
where
    S: Statement<V>,
    V: Clone,
    NC: NonCallTransformer<S>,
    NC::Dom: AbstractDomain<Var = V>,
{
    fn step(&mut self, stmt: &S, pre: &NC::Dom) -> NC::Dom {
        if let Some(call) = stmt.as_call() {
            if self.recording {
                let formals = call.callee.params();
                let entry = pre.rename(call.args, formals).project(formals);
                self.call_tbl.insert(call.callee.clone(), entry);
            }
            apply_summary_or_havoc(self.summaries, &call, pre)
        } else if stmt.as_return().is_some() {
            pre.clone()
        } else {
            self.base.transfer(stmt, pre)
        }
    }

    fn finalize(&mut self) {
        self.recording = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CallCtxTable;
    use crate::func_decl::FuncDecl;
    use crate::summary::SummaryTable;
    use crate::testutil::{Interval, Range, TestStmt, Var};

    fn g_decl() -> FuncDecl<Var> {
        FuncDecl::new("g", vec!["y".to_string()], None)
    }

    fn call_stmt() -> TestStmt {
        TestStmt::Call { lhs: None, callee: g_decl(), args: vec!["x".to_string()] }
    }

    #[test]
    fn context_recording_is_gated_until_finalize() {
        let summaries: SummaryTable<Interval> = SummaryTable::new();
        let mut call_tbl: CallCtxTable<Interval> = CallCtxTable::new();
        let base = Interval::top();
        let pre = Interval::top().set_exact("x", 3);

        {
            let mut transformer = TopDownTransformer::new(&base, &summaries, &mut call_tbl);
            transformer.step(&call_stmt(), &pre);
        }
        assert!(call_tbl.get(&g_decl()).is_top());

        {
            let mut transformer = TopDownTransformer::new(&base, &summaries, &mut call_tbl);
            transformer.finalize();
            transformer.step(&call_stmt(), &pre);
        }
        assert_eq!(call_tbl.get(&g_decl()).get("y"), Range::exact(3));
    }

    #[test]
    fn bottom_up_transformer_havocs_lhs_without_a_summary() {
        let summaries: SummaryTable<Interval> = SummaryTable::new();
        let base = Interval::top();
        let mut transformer = BottomUpTransformer::new(&base, &summaries);
        let pre = Interval::top().set_exact("r", 7);

        let call = TestStmt::Call { lhs: Some("r".to_string()), callee: g_decl(), args: vec!["x".to_string()] };
        let post = transformer.step(&call, &pre);
        assert_eq!(post.get("r"), Range::top());
    }
}
