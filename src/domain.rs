//! The abstract domain interface.
//!
//! This is the only thing the engine assumes about the concrete analysis
//! being run. Everything else -- what a "statement" actually does, how
//! variables are named, how a CFG is materialized -- is an external
//! collaborator consumed through a narrower trait.
//!
//! A concrete domain is assumed sound (over-approximates concrete semantics)
//! but not necessarily distributive; the engine never relies on `meet`
//! distributing over `join`.

use std::fmt::Display;
use std::hash::Hash;

/// An element of a bounded lattice, plus the structural operations
/// (`forget`/`project`/`expand`/`rename`) the engine needs to move values
/// across call boundaries.
///
/// `Var` is the type of variable identifiers the domain tracks. It has no
/// required relation to whatever a frontend's own variable representation
/// looks like, other than that the engine's `Cfg`/`Statement` traits (see
/// [`crate::cfg`]) are parameterized over the same type.
pub trait AbstractDomain: Clone + PartialEq {
    /// The type of variable this domain's environment tracks.
    type Var: Clone + Eq + Ord + Hash + Display;

    /// The top element (no information / all concrete states).
    fn top() -> Self;

    /// The bottom element (unreachable).
    fn bottom() -> Self;

    fn is_top(&self) -> bool;

    fn is_bottom(&self) -> bool;

    /// Sound approximation of `self ⊑ other`.
    fn leq(&self, other: &Self) -> bool;

    /// Least upper bound (soundly approximated).
    fn join(&self, other: &Self) -> Self;

    /// Greatest lower bound (soundly approximated).
    fn meet(&self, other: &Self) -> Self;

    /// Ascending-chain accelerator. Must satisfy `self ⊑ widening(self,
    /// other)` and `other ⊑ widening(self, other)`.
    fn widening(&self, other: &Self) -> Self;

    /// Descending refinement. Must satisfy `narrowing(self, other) ⊑ self`.
    fn narrowing(&self, other: &Self) -> Self;

    /// Havoc the listed variables (they become unconstrained / top in their
    /// own dimension, without affecting others).
    fn forget(&self, vars: &[Self::Var]) -> Self;

    /// Restrict support to the listed variables -- `forget` of the
    /// complement.
    fn project(&self, vars: &[Self::Var]) -> Self;

    /// Rename a single variable, e.g. when inlining a summary whose formal
    /// needs to become the caller's actual.
    fn expand(&self, from: &Self::Var, to: &Self::Var) -> Self;

    /// Rename a batch of variables. `from` and `to` must have equal length.
    ///
    /// The default implementation applies `expand` sequentially in order,
    /// which is correct whenever `from` and `to` are disjoint (the common
    /// case: renaming distinct formals to distinct actuals). A domain whose
    /// callers need to rename through overlapping names -- e.g. swapping two
    /// variables with `rename(&[a, b], &[b, a])` -- must override this with
    /// a simultaneous substitution.
    fn rename(&self, from: &[Self::Var], to: &[Self::Var]) -> Self {
        let mut out = self.clone();
        for (f, t) in from.iter().zip(to.iter()) {
            out = out.expand(f, t);
        }
        out
    }
}
