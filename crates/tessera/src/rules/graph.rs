//! Dependency graph over a subset of tasks, with DFS cycle detection.

use indexmap::{IndexMap, IndexSet};

/// DFS node state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Not yet visited.
    White,
    /// On the current recursion stack.
    Gray,
    /// Fully explored.
    Black,
}

/// Directed graph `task -> dependency`, restricted to a fixed node set.
///
/// Edges to tasks outside the node set are dropped on insertion, so a
/// dependency on an unrelated task can never close a cycle.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build a graph over `nodes`, asking `dependencies_of` for each node's
    /// outgoing edges.
    pub fn restricted<F>(nodes: &[String], mut dependencies_of: F) -> Self
    where
        F: FnMut(&str) -> Vec<String>,
    {
        let members: IndexSet<&str> = nodes.iter().map(String::as_str).collect();
        let mut edges = IndexMap::with_capacity(members.len());

        for node in &members {
            let targets: Vec<String> = dependencies_of(node)
                .into_iter()
                .filter(|dep| members.contains(dep.as_str()))
                .collect();
            edges.insert(node.to_string(), targets);
        }

        Self { edges }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Return the first cycle found, as the path from the re-entered node
    /// back to itself (`[A, B, C, A]`), or `None` if the graph is acyclic.
    ///
    /// Nodes are visited in insertion order, so the result is deterministic.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut colors: IndexMap<&str, Color> =
            self.edges.keys().map(|k| (k.as_str(), Color::White)).collect();
        let mut stack: Vec<&str> = Vec::new();

        for node in self.edges.keys() {
            if colors.get(node.as_str()) == Some(&Color::White) {
                if let Some(cycle) = self.visit(node, &mut colors, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        colors: &mut IndexMap<&'a str, Color>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        colors.insert(node, Color::Gray);
        stack.push(node);

        for next in self.edges.get(node).into_iter().flatten() {
            match colors.get(next.as_str()).copied() {
                // Back edge: `next` is still on the stack.
                Some(Color::Gray) => {
                    let start = stack.iter().position(|n| *n == next.as_str())?;
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(next.clone());
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.visit(next, colors, stack) {
                        return Some(cycle);
                    }
                }
                Some(Color::Black) | None => {}
            }
        }

        stack.pop();
        colors.insert(node, Color::Black);
        None
    }
}
