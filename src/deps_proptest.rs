//! Property-based tests for dependency tree construction.
//!
//! Random dependency graphs are generated over a small set of archives, and
//! the shallow and deep builders, summarization, and sorting are checked
//! against each other.

#[cfg(test)]
mod proptest_tests {
    use std::collections::HashMap;

    use crate::archive::Archive;
    use crate::deps::{build_deep, build_shallow, sort_tree, summarize, DependencyNode, NodeKind};
    use proptest::prelude::*;

    const SIZE: usize = 6;

    fn archive(index: usize) -> Archive {
        Archive::new("hub", "g", format!("a{}", index))
    }

    /// Adjacency lists; `None` marks an archive whose lookup fails.
    fn any_graph() -> impl Strategy<Value = Vec<Option<Vec<usize>>>> {
        prop::collection::vec(
            prop::option::weighted(0.8, prop::collection::vec(0..SIZE, 0..4)),
            SIZE,
        )
    }

    /// Like `any_graph`, but edges only point to higher indices.
    fn acyclic_graph() -> impl Strategy<Value = Vec<Option<Vec<usize>>>> {
        any_graph().prop_map(|graph| {
            graph
                .into_iter()
                .enumerate()
                .map(|(from, deps)| deps.map(|d| d.into_iter().filter(|&to| to > from).collect()))
                .collect()
        })
    }

    fn as_lookup(graph: &[Option<Vec<usize>>]) -> HashMap<Archive, Vec<Archive>> {
        graph
            .iter()
            .enumerate()
            .filter_map(|(i, deps)| {
                deps.as_ref()
                    .map(|d| (archive(i), d.iter().map(|&j| archive(j)).collect()))
            })
            .collect()
    }

    /// No archive repeats on any root-to-leaf path, except a final
    /// `Circular` leaf pointing back at an ancestor.
    fn paths_are_acyclic(node: &DependencyNode, ancestors: &mut Vec<Archive>) -> bool {
        let Some(archive) = node.archive() else {
            return true;
        };
        if node.kind() == NodeKind::Circular {
            return ancestors.contains(archive);
        }
        if ancestors.contains(archive) {
            return false;
        }
        ancestors.push(archive.clone());
        let ok = node
            .children()
            .iter()
            .all(|child| paths_are_acyclic(child, ancestors));
        ancestors.pop();
        ok
    }

    proptest! {
        /// Property: both builders install the same archives on acyclic graphs
        #[test]
        fn shallow_and_deep_agree_on_installed(graph in acyclic_graph()) {
            let lookup = as_lookup(&graph);
            let shallow = build_shallow(&archive(0), |a| lookup.get(a).cloned());
            let deep = build_deep(&archive(0), |a| lookup.get(a).cloned());
            prop_assert_eq!(shallow.installed_archives(), deep.installed_archives());
        }

        /// Property: no archive repeats on a path, for any graph
        #[test]
        fn trees_never_repeat_an_ancestor(graph in any_graph()) {
            let lookup = as_lookup(&graph);
            let shallow = build_shallow(&archive(0), |a| lookup.get(a).cloned());
            let deep = build_deep(&archive(0), |a| lookup.get(a).cloned());
            prop_assert!(paths_are_acyclic(&shallow, &mut Vec::new()));
            prop_assert!(paths_are_acyclic(&deep, &mut Vec::new()));
        }

        /// Property: shallow expansion looks every archive up at most once
        #[test]
        fn shallow_looks_up_each_archive_once(graph in any_graph()) {
            let lookup = as_lookup(&graph);
            let mut calls: HashMap<Archive, usize> = HashMap::new();
            build_shallow(&archive(0), |a| {
                *calls.entry(a.clone()).or_default() += 1;
                lookup.get(a).cloned()
            });
            prop_assert!(calls.values().all(|&n| n == 1));
        }

        /// Property: summarizing loses nothing
        #[test]
        fn summarize_round_trips(graph in any_graph()) {
            let lookup = as_lookup(&graph);
            let tree = sort_tree(build_shallow(&archive(0), |a| lookup.get(a).cloned()));
            prop_assert_eq!(summarize(tree.clone()).unsummarize(), tree);
        }
    }
}
