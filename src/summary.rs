//! The summary table.
//!
//! Populated exclusively by the bottom-up phase, read exclusively by the
//! top-down phase (and by callers through [`crate::driver::InterFwdAnalyzer::get_summary`]).
//! The table never evicts.

use std::collections::BTreeMap as Map;

use crate::domain::AbstractDomain;
use crate::func_decl::FuncDecl;

/// A function summary: the formals-with-optional-return it is expressed
/// over, and the abstract value restricted to exactly those variables.
///
/// Invariant: `value`'s free variables are a subset of `formals` plus `ret`.
/// Nothing in this struct enforces that invariant itself -- it is the
/// bottom-up transformer's job to `project` before calling
/// [`SummaryTable::insert`].
#[derive(Clone, Debug)]
pub struct Summary<D: AbstractDomain> {
    pub formals: Vec<D::Var>,
    pub ret: Option<D::Var>,
    pub value: D,
}

/// Per-function summaries keyed by [`FuncDecl`].
pub struct SummaryTable<D: AbstractDomain> {
    table: Map<FuncDecl<D::Var>, Summary<D>>,
}

impl<D: AbstractDomain> SummaryTable<D> {
    pub fn new() -> Self {
        SummaryTable { table: Map::new() }
    }

    pub fn has_summary(&self, fd: &FuncDecl<D::Var>) -> bool {
        self.table.contains_key(fd)
    }

    pub fn get(&self, fd: &FuncDecl<D::Var>) -> Option<&Summary<D>> {
        self.table.get(fd)
    }

    /// Record `fd`'s summary. A summary is inserted at most once per
    /// `FuncDecl` during the bottom-up phase -- the reverse-topological SCC
    /// schedule guarantees this by construction, so a second insertion for
    /// the same function is a programmer-contract violation, not a case to
    /// handle gracefully.
    pub fn insert(&mut self, fd: FuncDecl<D::Var>, value: D, ret: Option<D::Var>, formals: Vec<D::Var>) {
        let summary = Summary { formals, ret, value };
        let prior = self.table.insert(fd.clone(), summary);
        assert!(
            prior.is_none(),
            "summary table: duplicate insertion for function `{fd}`"
        );
    }
}

impl<D: AbstractDomain> Default for SummaryTable<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Interval;

    fn fd(name: &str) -> FuncDecl<String> {
        FuncDecl::new(name.to_string(), vec!["y".to_string()], Some("ret".to_string()))
    }

    #[test]
    fn round_trips_a_summary() {
        let mut table: SummaryTable<Interval> = SummaryTable::new();
        assert!(!table.has_summary(&fd("f")));

        table.insert(fd("f"), Interval::top(), Some("ret".to_string()), vec!["y".to_string()]);

        assert!(table.has_summary(&fd("f")));
        let s = table.get(&fd("f")).unwrap();
        assert_eq!(s.formals, vec!["y".to_string()]);
        assert_eq!(s.ret, Some("ret".to_string()));
    }

    #[test]
    #[should_panic(expected = "duplicate insertion")]
    fn double_insert_panics() {
        let mut table: SummaryTable<Interval> = SummaryTable::new();
        table.insert(fd("f"), Interval::top(), None, vec![]);
        table.insert(fd("f"), Interval::top(), None, vec![]);
    }
}
