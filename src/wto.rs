//! Block scheduling for the intra-procedural fixpoint iterator.
//!
//! A weak topological order (WTO) in Bourdoncle's sense nests strongly
//! connected sub-components recursively, one head per nesting level. This
//! crate computes a flattened approximation instead: a
//! depth-first reverse-postorder traversal from the entry block, marking as a
//! widening point any block reached along a back edge (an edge into a block
//! still on the current DFS path). This is the same reachability-based
//! technique this codebase already uses elsewhere for loop-header detection,
//! generalized here to also produce a total visitation order.
//!
//! Every loop header gets exactly one widening/narrowing scheduling slot, and
//! non-cyclic blocks still come out in topological order. A CFG with deeply
//! nested loops may widen slightly earlier (at the outer header) than a
//! fully nested WTO would -- soundness is unaffected, since widening is still
//! applied at every back-edge target before the ascending join could
//! diverge. This is a deliberate simplification, not an oversight.

use std::collections::BTreeSet as Set;

use crate::cfg::Cfg;

/// A block visitation order plus the set of blocks marked as widening
/// points.
pub struct Wto<B> {
    pub order: Vec<B>,
    pub widening_points: Set<B>,
}

pub fn compute<C: Cfg>(cfg: &C) -> Wto<C::Block> {
    let mut visited = Set::new();
    let mut on_path = Set::new();
    let mut postorder = Vec::new();
    let mut widening_points = Set::new();

    visit(cfg, &cfg.entry(), &mut visited, &mut on_path, &mut postorder, &mut widening_points);

    postorder.reverse();
    Wto { order: postorder, widening_points }
}

fn visit<C: Cfg>(
    cfg: &C,
    block: &C::Block,
    visited: &mut Set<C::Block>,
    on_path: &mut Set<C::Block>,
    postorder: &mut Vec<C::Block>,
    widening_points: &mut Set<C::Block>,
) {
    visited.insert(block.clone());
    on_path.insert(block.clone());

    for succ in cfg.successors(block) {
        if on_path.contains(&succ) {
            widening_points.insert(succ);
        } else if !visited.contains(&succ) {
            visit(cfg, &succ, visited, on_path, postorder, widening_points);
        }
    }

    on_path.remove(block);
    postorder.push(block.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{TestCfgBuilder, Var};
    use crate::func_decl::FuncDecl;

    fn decl() -> FuncDecl<Var> {
        FuncDecl::new("f", vec![], None)
    }

    #[test]
    fn straight_line_has_no_widening_points() {
        let cfg = TestCfgBuilder::new(decl(), "a")
            .block("a", vec![])
            .block("b", vec![])
            .block("c", vec![])
            .edge("a", "b")
            .edge("b", "c")
            .exit("c")
            .build();

        let wto = compute(&cfg);
        assert!(wto.widening_points.is_empty());
        assert_eq!(wto.order.first(), Some(&"a".to_string()));
        assert_eq!(wto.order.last(), Some(&"c".to_string()));
    }

    #[test]
    fn loop_header_is_a_widening_point() {
        // a -> b -> c -> b (loop), c -> d
        let cfg = TestCfgBuilder::new(decl(), "a")
            .block("a", vec![])
            .block("b", vec![])
            .block("c", vec![])
            .block("d", vec![])
            .edge("a", "b")
            .edge("b", "c")
            .edge("c", "b")
            .edge("c", "d")
            .exit("d")
            .build();

        let wto = compute(&cfg);
        assert!(wto.widening_points.contains(&"b".to_string()));
        assert!(!wto.widening_points.contains(&"a".to_string()));
        assert!(!wto.widening_points.contains(&"d".to_string()));

        let pos = |b: &str| wto.order.iter().position(|x| x == b).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
        assert!(pos("c") < pos("d"));
    }
}
