//! Read-only CFG and call-graph traversal surfaces (components B).
//!
//! Nothing in this module constructs a CFG or a call graph -- both are
//! external collaborators (see the crate-level docs) that the engine only
//! ever reads through these traits. A statement is narrowed down to exactly
//! the classification the engine cares about: is it a call, a return, or
//! "anything else"? Everything that falls into "anything else" (assignment,
//! assume, havoc, domain-specific primitives) is forwarded verbatim to the
//! client-supplied [`crate::transformer::NonCallTransformer`].

use std::fmt::Display;
use std::hash::Hash;

use crate::func_decl::FuncDecl;

/// A call site: the optional assigned variable, the callee's declaration,
/// and the actual arguments (in the same order as the callee's formals).
pub struct CallInfo<'a, V> {
    pub lhs: Option<&'a V>,
    pub callee: &'a FuncDecl<V>,
    pub args: &'a [V],
}

/// One statement in a basic block, classified just enough for the engine to
/// find call sites and returns.
pub trait Statement<V> {
    /// `Some(info)` if this statement is a call, `None` otherwise.
    fn as_call(&self) -> Option<CallInfo<'_, V>>;

    /// `Some(returned_var)` if this statement is a return of that variable,
    /// `Some(None)` if it is a `return;` with no value, `None` if this
    /// statement is not a return at all.
    fn as_return(&self) -> Option<Option<&V>>;
}

/// A single function's control-flow graph.
///
/// Blocks are identified by `Block`; the CFG is immutable for the duration
/// of the analysis and is assumed reachable from `entry()`.
pub trait Cfg {
    type Block: Clone + Eq + Ord + Hash + Display;
    type Var: Clone + Eq + Ord + Hash + Display;
    type Stmt: Statement<Self::Var>;

    fn func_decl(&self) -> &FuncDecl<Self::Var>;

    fn entry(&self) -> Self::Block;

    /// The designated exit block, or `None` if the function never returns
    /// (diverges, or every path ends in e.g. a trap).
    fn exit(&self) -> Option<Self::Block>;

    fn has_exit(&self) -> bool {
        self.exit().is_some()
    }

    /// All blocks in the CFG, in no particular order.
    fn blocks(&self) -> Vec<Self::Block>;

    fn successors(&self, block: &Self::Block) -> Vec<Self::Block>;

    fn predecessors(&self, block: &Self::Block) -> Vec<Self::Block>;

    /// The statements of `block`, in execution order.
    fn statements(&self, block: &Self::Block) -> &[Self::Stmt];
}

/// Nodes are CFGs, edges go caller -> callee. The engine never mutates this;
/// it only asks for the set of functions and, for each, its direct callees.
///
/// Implementations are free to compute edges lazily from call statements, or
/// to hold a precomputed adjacency -- the engine does not care.
pub trait CallGraph {
    type Cfg: Cfg;

    /// Every function-CFG that is a node of this call graph.
    fn functions(&self) -> Vec<&Self::Cfg>;

    /// The direct callees of `caller`, by reference into the same node set
    /// returned by [`CallGraph::functions`]. A callee that is not itself a
    /// node of the call graph (an unresolved indirect call, or a call to an
    /// external function) is simply absent from this list -- it is not an
    /// error, and is handled entirely by the transformer's havoc fallback.
    fn callees(&self, caller: &Self::Cfg) -> Vec<&Self::Cfg>;
}
