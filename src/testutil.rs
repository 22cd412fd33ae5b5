//! A small interval domain plus a hand-built CFG/call-graph harness.
//!
//! Everything in this module is test scaffolding, not part of the engine
//! proper -- it plays the role of the "external collaborators" (concrete
//! domain, CFG, statement transformer) that production clients of this
//! crate would bring themselves. It is kept in the library (rather than
//! duplicated between `#[cfg(test)]` unit tests and the `tests/` integration
//! suite) so both can share one fixture without drift.

#![doc(hidden)]
#![allow(missing_docs)]

use std::collections::BTreeMap as Map;
use std::fmt;

use crate::cfg::{CallGraph as CallGraphTrait, CallInfo, Cfg as CfgTrait, Statement};
use crate::domain::AbstractDomain;
use crate::func_decl::FuncDecl;
use crate::transformer::NonCallTransformer;

// ---------------------------------------------------------------------
// The interval domain.
// ---------------------------------------------------------------------

pub type Var = String;

/// An interval `[lo, hi]` with unbounded ends represented as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub lo: Option<i64>,
    pub hi: Option<i64>,
}

impl Range {
    pub fn exact(v: i64) -> Self {
        Range { lo: Some(v), hi: Some(v) }
    }

    pub fn top() -> Self {
        Range { lo: None, hi: None }
    }

    fn leq(&self, other: &Self) -> bool {
        let lo_ok = match (self.lo, other.lo) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a >= b,
        };
        let hi_ok = match (self.hi, other.hi) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a <= b,
        };
        lo_ok && hi_ok
    }

    fn union(&self, other: &Self) -> Self {
        let lo = match (self.lo, other.lo) {
            (Some(a), Some(b)) => Some(a.min(b)),
            _ => None,
        };
        let hi = match (self.hi, other.hi) {
            (Some(a), Some(b)) => Some(a.max(b)),
            _ => None,
        };
        Range { lo, hi }
    }

    /// `None` if the intersection is empty.
    fn intersect(&self, other: &Self) -> Option<Self> {
        let lo = match (self.lo, other.lo) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        let hi = match (self.hi, other.hi) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        if let (Some(l), Some(h)) = (lo, hi) {
            if l > h {
                return None;
            }
        }
        Some(Range { lo, hi })
    }

    fn widen(&self, other: &Self) -> Self {
        let lo = match (self.lo, other.lo) {
            (Some(a), Some(b)) if a <= b => Some(a),
            _ => None,
        };
        let hi = match (self.hi, other.hi) {
            (Some(a), Some(b)) if a >= b => Some(a),
            _ => None,
        };
        Range { lo, hi }
    }

    /// Narrow `self` using the more precise `other`: replaces an unbounded
    /// end of `self` with `other`'s end for that side, keeps `self`'s
    /// bound otherwise.
    fn narrow(&self, other: &Self) -> Self {
        let lo = self.lo.or(other.lo);
        let hi = self.hi.or(other.hi);
        Range { lo, hi }
    }

    fn shift(&self, delta: i64) -> Self {
        Range { lo: self.lo.map(|v| v + delta), hi: self.hi.map(|v| v + delta) }
    }

    fn is_top(&self) -> bool {
        self.lo.is_none() && self.hi.is_none()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo.map(|v| v.to_string()).unwrap_or_else(|| "-inf".to_string());
        let hi = self.hi.map(|v| v.to_string()).unwrap_or_else(|| "+inf".to_string());
        write!(f, "[{lo}, {hi}]")
    }
}

/// A non-relational interval environment: either `bottom` (unreachable), or
/// a map from variable to range, with any variable absent from the map
/// implicitly bound to `top`.
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    bottom: bool,
    values: Map<Var, Range>,
}

impl Interval {
    pub fn get(&self, var: &str) -> Range {
        if self.bottom {
            return Range { lo: None, hi: None };
        }
        self.values.get(var).copied().unwrap_or_else(Range::top)
    }

    pub fn set_exact(&self, var: &str, val: i64) -> Self {
        self.set_range(var, Range::exact(val))
    }

    pub fn set_range(&self, var: &str, range: Range) -> Self {
        if self.bottom {
            return self.clone();
        }
        let mut values = self.values.clone();
        if range.is_top() {
            values.remove(var);
        } else {
            values.insert(var.to_string(), range);
        }
        Interval { bottom: false, values }
    }

    pub fn shift(&self, var: &str, delta: i64) -> Self {
        let r = self.get(var).shift(delta);
        self.set_range(var, r)
    }

    pub fn assume_le(&self, var: &str, bound: i64) -> Self {
        let cur = self.get(var);
        match cur.intersect(&Range { lo: None, hi: Some(bound) }) {
            Some(r) => self.set_range(var, r),
            None => Interval::bottom(),
        }
    }

    pub fn assume_gt(&self, var: &str, bound: i64) -> Self {
        let cur = self.get(var);
        match cur.intersect(&Range { lo: Some(bound + 1), hi: None }) {
            Some(r) => self.set_range(var, r),
            None => Interval::bottom(),
        }
    }
}

impl AbstractDomain for Interval {
    type Var = Var;

    fn top() -> Self {
        Interval { bottom: false, values: Map::new() }
    }

    fn bottom() -> Self {
        Interval { bottom: true, values: Map::new() }
    }

    fn is_top(&self) -> bool {
        !self.bottom && self.values.is_empty()
    }

    fn is_bottom(&self) -> bool {
        self.bottom
    }

    fn leq(&self, other: &Self) -> bool {
        if self.bottom {
            return true;
        }
        if other.bottom {
            return false;
        }
        self.values.keys().chain(other.values.keys()).all(|k| self.get(k).leq(&other.get(k)))
    }

    fn join(&self, other: &Self) -> Self {
        if self.bottom {
            return other.clone();
        }
        if other.bottom {
            return self.clone();
        }
        let mut values = Map::new();
        for k in self.values.keys().chain(other.values.keys()) {
            let u = self.get(k).union(&other.get(k));
            if !u.is_top() {
                values.insert(k.clone(), u);
            }
        }
        Interval { bottom: false, values }
    }

    fn meet(&self, other: &Self) -> Self {
        if self.bottom || other.bottom {
            return Interval::bottom();
        }
        let mut values = Map::new();
        for k in self.values.keys().chain(other.values.keys()) {
            match self.get(k).intersect(&other.get(k)) {
                Some(r) => {
                    if !r.is_top() {
                        values.insert(k.clone(), r);
                    }
                }
                None => return Interval::bottom(),
            }
        }
        Interval { bottom: false, values }
    }

    fn widening(&self, other: &Self) -> Self {
        if self.bottom {
            return other.clone();
        }
        if other.bottom {
            return self.clone();
        }
        let mut values = Map::new();
        for k in self.values.keys().chain(other.values.keys()) {
            let w = self.get(k).widen(&other.get(k));
            if !w.is_top() {
                values.insert(k.clone(), w);
            }
        }
        Interval { bottom: false, values }
    }

    fn narrowing(&self, other: &Self) -> Self {
        if self.bottom || other.bottom {
            return Interval::bottom();
        }
        let mut values = Map::new();
        for k in self.values.keys().chain(other.values.keys()) {
            let n = self.get(k).narrow(&other.get(k));
            if !n.is_top() {
                values.insert(k.clone(), n);
            }
        }
        Interval { bottom: false, values }
    }

    fn forget(&self, vars: &[Var]) -> Self {
        if self.bottom {
            return self.clone();
        }
        let mut values = self.values.clone();
        for v in vars {
            values.remove(v);
        }
        Interval { bottom: false, values }
    }

    fn project(&self, vars: &[Var]) -> Self {
        if self.bottom {
            return self.clone();
        }
        let mut values = Map::new();
        for v in vars {
            if let Some(r) = self.values.get(v) {
                values.insert(v.clone(), *r);
            }
        }
        Interval { bottom: false, values }
    }

    fn expand(&self, from: &Var, to: &Var) -> Self {
        if self.bottom {
            return self.clone();
        }
        let mut values = self.values.clone();
        match values.remove(from) {
            Some(r) => {
                values.insert(to.clone(), r);
            }
            None => {
                values.remove(to);
            }
        }
        Interval { bottom: false, values }
    }
}

// ---------------------------------------------------------------------
// A tiny statement language and CFG/call-graph harness.
// ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub enum ArithOp {
    Add,
    Sub,
}

#[derive(Clone, Debug)]
pub enum TestStmt {
    SetConst { var: Var, val: i64 },
    Arith { dest: Var, src: Var, op: ArithOp, rhs: i64 },
    Copy { dest: Var, src: Var },
    AssumeLe { var: Var, bound: i64 },
    AssumeGt { var: Var, bound: i64 },
    Havoc { vars: Vec<Var> },
    Call { lhs: Option<Var>, callee: FuncDecl<Var>, args: Vec<Var> },
    Return(Option<Var>),
}

impl Statement<Var> for TestStmt {
    fn as_call(&self) -> Option<CallInfo<'_, Var>> {
        match self {
            TestStmt::Call { lhs, callee, args } => {
                Some(CallInfo { lhs: lhs.as_ref(), callee, args })
            }
            _ => None,
        }
    }

    fn as_return(&self) -> Option<Option<&Var>> {
        match self {
            TestStmt::Return(v) => Some(v.as_ref()),
            _ => None,
        }
    }
}

impl NonCallTransformer<TestStmt> for Interval {
    type Dom = Interval;

    fn transfer(&self, stmt: &TestStmt, pre: &Interval) -> Interval {
        match stmt {
            TestStmt::SetConst { var, val } => pre.set_exact(var, *val),
            TestStmt::Arith { dest, src, op, rhs } => {
                let delta = match op {
                    ArithOp::Add => *rhs,
                    ArithOp::Sub => -*rhs,
                };
                pre.set_range(dest, pre.get(src).shift(delta))
            }
            TestStmt::Copy { dest, src } => pre.set_range(dest, pre.get(src)),
            TestStmt::AssumeLe { var, bound } => pre.assume_le(var, *bound),
            TestStmt::AssumeGt { var, bound } => pre.assume_gt(var, *bound),
            TestStmt::Havoc { vars } => pre.forget(vars),
            TestStmt::Call { .. } | TestStmt::Return(_) => {
                unreachable!("call/return statements are handled by the engine, not the base transformer")
            }
        }
    }
}

/// A basic block: just an ordered statement list.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub stmts: Vec<TestStmt>,
}

/// A hand-built CFG: an adjacency list of named blocks.
pub struct TestCfg {
    decl: FuncDecl<Var>,
    entry: String,
    exit: Option<String>,
    blocks: Map<String, Block>,
    succs: Map<String, Vec<String>>,
    preds: Map<String, Vec<String>>,
}

pub struct TestCfgBuilder {
    decl: FuncDecl<Var>,
    entry: String,
    exit: Option<String>,
    blocks: Map<String, Block>,
    edges: Vec<(String, String)>,
}

impl TestCfgBuilder {
    pub fn new(decl: FuncDecl<Var>, entry: &str) -> Self {
        TestCfgBuilder {
            decl,
            entry: entry.to_string(),
            exit: None,
            blocks: Map::new(),
            edges: Vec::new(),
        }
    }

    pub fn block(mut self, name: &str, stmts: Vec<TestStmt>) -> Self {
        self.blocks.insert(name.to_string(), Block { stmts });
        self
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.edges.push((from.to_string(), to.to_string()));
        self
    }

    pub fn exit(mut self, name: &str) -> Self {
        self.exit = Some(name.to_string());
        self
    }

    pub fn build(self) -> TestCfg {
        let mut succs: Map<String, Vec<String>> = Map::new();
        let mut preds: Map<String, Vec<String>> = Map::new();
        for name in self.blocks.keys() {
            succs.entry(name.clone()).or_default();
            preds.entry(name.clone()).or_default();
        }
        for (from, to) in self.edges {
            succs.entry(from.clone()).or_default().push(to.clone());
            preds.entry(to).or_default().push(from);
        }
        TestCfg {
            decl: self.decl,
            entry: self.entry,
            exit: self.exit,
            blocks: self.blocks,
            succs,
            preds,
        }
    }
}

impl CfgTrait for TestCfg {
    type Block = String;
    type Var = Var;
    type Stmt = TestStmt;

    fn func_decl(&self) -> &FuncDecl<Var> {
        &self.decl
    }

    fn entry(&self) -> String {
        self.entry.clone()
    }

    fn exit(&self) -> Option<String> {
        self.exit.clone()
    }

    fn blocks(&self) -> Vec<String> {
        self.blocks.keys().cloned().collect()
    }

    fn successors(&self, block: &String) -> Vec<String> {
        self.succs.get(block).cloned().unwrap_or_default()
    }

    fn predecessors(&self, block: &String) -> Vec<String> {
        self.preds.get(block).cloned().unwrap_or_default()
    }

    fn statements(&self, block: &String) -> &[TestStmt] {
        &self.blocks[block].stmts
    }
}

/// A call graph over a fixed set of [`TestCfg`]s, with edges discovered by
/// scanning each CFG's call statements -- a convenience for tests; a real
/// client is free to supply an independently constructed call graph.
pub struct TestCallGraph {
    cfgs: Vec<TestCfg>,
}

impl TestCallGraph {
    pub fn new(cfgs: Vec<TestCfg>) -> Self {
        TestCallGraph { cfgs }
    }
}

impl CallGraphTrait for TestCallGraph {
    type Cfg = TestCfg;

    fn functions(&self) -> Vec<&TestCfg> {
        self.cfgs.iter().collect()
    }

    fn callees(&self, caller: &TestCfg) -> Vec<&TestCfg> {
        let mut callee_names = Vec::new();
        for block in caller.blocks() {
            for stmt in caller.statements(&block) {
                if let Some(info) = stmt.as_call() {
                    callee_names.push(info.callee.name().to_string());
                }
            }
        }
        self.cfgs
            .iter()
            .filter(|c| callee_names.iter().any(|n| n == c.func_decl().name()))
            .collect()
    }
}
