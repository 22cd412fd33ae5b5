//! The call-context table.
//!
//! Populated exclusively by the top-down phase: each call site contributes
//! the abstract entry state it observes for its callee, and repeated
//! contributions for the same callee are joined rather than overwritten.

use std::collections::BTreeMap as Map;

use crate::domain::AbstractDomain;
use crate::func_decl::FuncDecl;

/// Per-function entry contexts in `D`, joined on insert.
pub struct CallCtxTable<D: AbstractDomain> {
    table: Map<FuncDecl<D::Var>, D>,
}

impl<D: AbstractDomain> CallCtxTable<D> {
    pub fn new() -> Self {
        CallCtxTable { table: Map::new() }
    }

    /// Join `v` into the stored context for `fd`, or store it verbatim if
    /// this is the first contribution.
    pub fn insert(&mut self, fd: FuncDecl<D::Var>, v: D) {
        self.table
            .entry(fd)
            .and_modify(|existing| *existing = existing.join(&v))
            .or_insert(v);
    }

    /// The stored context for `fd`, or `top` if no call site has
    /// contributed one yet.
    pub fn get(&self, fd: &FuncDecl<D::Var>) -> D {
        self.table.get(fd).cloned().unwrap_or_else(D::top)
    }
}

impl<D: AbstractDomain> Default for CallCtxTable<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Interval;

    fn fd(name: &str) -> FuncDecl<String> {
        FuncDecl::new(name.to_string(), vec!["y".to_string()], None)
    }

    #[test]
    fn absent_entry_is_top() {
        let table: CallCtxTable<Interval> = CallCtxTable::new();
        assert!(table.get(&fd("g")).is_top());
    }

    #[test]
    fn repeated_insertion_joins() {
        let mut table: CallCtxTable<Interval> = CallCtxTable::new();
        table.insert(fd("g"), Interval::top().set_exact("y", 1));
        table.insert(fd("g"), Interval::top().set_exact("y", 2));

        let ctx = table.get(&fd("g"));
        assert_eq!(ctx.get("y"), crate::testutil::Range { lo: Some(1), hi: Some(2) });
    }
}
