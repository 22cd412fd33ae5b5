//! SCC condensation and reverse-topological ordering of the call graph.
//!
//! Built on `petgraph`'s Tarjan implementation, which already returns
//! components in reverse topological order -- exactly the schedule the
//! bottom-up phase needs; the top-down phase just walks it backwards.

use petgraph::graph::DiGraph;

use crate::cfg::{CallGraph, Cfg};
use crate::func_decl::FuncDecl;

/// One strongly connected component of the call graph, in the order its
/// members should be scheduled within the component.
///
/// A single-node component without a self-loop is non-recursive: `members`
/// has exactly one function and `recursive` is `false`. Every other
/// component -- multi-node, or a single node with a self-call -- is
/// recursive.
pub struct Scc<'a, C: Cfg> {
    pub members: Vec<&'a C>,
    pub recursive: bool,
}

/// Build the call graph's SCC condensation, in reverse topological order
/// (callees before callers).
pub fn reverse_topological_order<'a, CG>(cg: &'a CG) -> Vec<Scc<'a, CG::Cfg>>
where
    CG: CallGraph,
{
    let funcs = cg.functions();

    let mut graph = DiGraph::<usize, ()>::new();
    let mut node_of = Vec::with_capacity(funcs.len());
    for i in 0..funcs.len() {
        node_of.push(graph.add_node(i));
    }

    let index_of = |fd: &FuncDecl<<CG::Cfg as Cfg>::Var>| {
        funcs.iter().position(|f| f.func_decl() == fd)
    };

    for (i, f) in funcs.iter().enumerate() {
        for callee in cg.callees(f) {
            if let Some(j) = index_of(callee.func_decl()) {
                graph.add_edge(node_of[i], node_of[j], ());
            }
        }
    }

    petgraph::algo::tarjan_scc(&graph)
        .into_iter()
        .map(|component| {
            let recursive = component.len() > 1 || {
                let idx = component[0];
                let i = graph[idx];
                cg.callees(funcs[i]).iter().any(|c| index_of(c.func_decl()) == Some(i))
            };
            let members = component.iter().map(|idx| funcs[graph[*idx]]).collect();
            Scc { members, recursive }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{TestCallGraph, TestCfgBuilder, Var};
    use crate::func_decl::FuncDecl;

    fn decl(name: &str, params: Vec<Var>, ret: Option<Var>) -> FuncDecl<Var> {
        FuncDecl::new(name, params, ret)
    }

    #[test]
    fn linear_chain_is_reverse_topological() {
        use crate::testutil::TestStmt;

        let f_decl = decl("f", vec!["y".into()], Some("ret".into()));
        let main_decl = decl("main", vec![], None);

        let f = TestCfgBuilder::new(f_decl.clone(), "entry")
            .block("entry", vec![TestStmt::Return(Some("y".to_string()))])
            .exit("entry")
            .build();

        let main = TestCfgBuilder::new(main_decl, "entry")
            .block(
                "entry",
                vec![TestStmt::Call { lhs: Some("x".to_string()), callee: f_decl, args: vec!["x".to_string()] }],
            )
            .exit("entry")
            .build();

        let cg = TestCallGraph::new(vec![main, f]);
        let sccs = reverse_topological_order(&cg);

        assert_eq!(sccs.len(), 2);
        assert_eq!(sccs[0].members.len(), 1);
        assert_eq!(sccs[0].members[0].func_decl().name(), "f");
        assert!(!sccs[0].recursive);
        assert_eq!(sccs[1].members[0].func_decl().name(), "main");
    }

    #[test]
    fn self_recursive_single_node_is_recursive() {
        use crate::testutil::TestStmt;

        let f_decl = decl("f", vec!["n".into()], Some("ret".into()));
        let f = TestCfgBuilder::new(f_decl.clone(), "entry")
            .block(
                "entry",
                vec![
                    TestStmt::Call { lhs: Some("r".to_string()), callee: f_decl, args: vec!["n".to_string()] },
                    TestStmt::Return(Some("r".to_string())),
                ],
            )
            .exit("entry")
            .build();

        let cg = TestCallGraph::new(vec![f]);
        let sccs = reverse_topological_order(&cg);

        assert_eq!(sccs.len(), 1);
        assert!(sccs[0].recursive);
    }
}
