//! DependencyGraph: a weighted directed graph with deterministic traversal.
//!
//! [`DependencyGraph`] owns three maps: vertex -> weight, vertex -> out-neighbor
//! set, and vertex -> in-neighbor set. Every vertex with a weight has entries
//! (possibly empty) in both neighbor maps. All maps are ordered, so
//! [`DependencyGraph::vertices`], [`DependencyGraph::edges_out_of`] and
//! [`DependencyGraph::edges_into`] return sequences sorted by vertex identity
//! and repeated analysis of the same graph is reproducible.
//!
//! # Levels
//!
//! [`DependencyGraph::sort_graph_by_levels`] assigns each vertex the length of
//! the longest path from it to a sink (a vertex without out-edges has level 0),
//! then returns the vertices bucketed so that bucket 0 holds the input-most
//! vertices and the last bucket holds the sinks. Two vertices joined by an edge
//! never share a bucket, so every bucket can be evaluated concurrently.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::CoreError;

/// A directed graph over ordered vertex identifiers with per-vertex weights.
#[derive(Debug, Clone)]
pub struct DependencyGraph<V, W> {
    weights: BTreeMap<V, W>,
    out_edges: BTreeMap<V, BTreeSet<V>>,
    in_edges: BTreeMap<V, BTreeSet<V>>,
}

impl<V, W> Default for DependencyGraph<V, W> {
    fn default() -> Self {
        DependencyGraph {
            weights: BTreeMap::new(),
            out_edges: BTreeMap::new(),
            in_edges: BTreeMap::new(),
        }
    }
}

impl<V, W> DependencyGraph<V, W>
where
    V: Ord + Clone + fmt::Display,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `vertex` with `weight`, or overwrites the weight of an
    /// existing vertex. Existing edges are left untouched.
    pub fn add_vertex(&mut self, vertex: V, weight: W) {
        self.out_edges.entry(vertex.clone()).or_default();
        self.in_edges.entry(vertex.clone()).or_default();
        self.weights.insert(vertex, weight);
    }

    /// Adds an edge from `source` to `target`.
    ///
    /// Returns `false` and leaves the graph unchanged unless both endpoints
    /// were previously added with [`add_vertex`](Self::add_vertex). Adding an
    /// existing edge again is a no-op that still returns `true`.
    pub fn add_edge(&mut self, source: &V, target: &V) -> bool {
        if !(self.weights.contains_key(source) && self.weights.contains_key(target)) {
            return false;
        }
        if let Some(outs) = self.out_edges.get_mut(source) {
            outs.insert(target.clone());
        }
        if let Some(ins) = self.in_edges.get_mut(target) {
            ins.insert(source.clone());
        }
        true
    }

    /// Returns true iff `vertex` was previously added.
    pub fn contains(&self, vertex: &V) -> bool {
        self.weights.contains_key(vertex)
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns true if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.out_edges.values().map(BTreeSet::len).sum()
    }

    /// All vertices, sorted.
    pub fn vertices(&self) -> Vec<V> {
        self.weights.keys().cloned().collect()
    }

    /// Targets of edges leaving `vertex`, sorted. Empty for unknown vertices.
    pub fn edges_out_of(&self, vertex: &V) -> Vec<V> {
        self.out_edges
            .get(vertex)
            .map(|outs| outs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sources of edges entering `vertex`, sorted. Empty for unknown vertices.
    pub fn edges_into(&self, vertex: &V) -> Vec<V> {
        self.in_edges
            .get(vertex)
            .map(|ins| ins.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the weight of `vertex`.
    pub fn weight_of(&self, vertex: &V) -> Result<&W, CoreError> {
        self.weights
            .get(vertex)
            .ok_or_else(|| CoreError::VertexNotFound {
                vertex: vertex.to_string(),
            })
    }

    /// Orders all vertices so that every edge source precedes its target.
    ///
    /// Kahn's algorithm: repeatedly take a vertex whose remaining in-degree is
    /// zero, append it, and decrement the in-degree of its out-neighbors.
    pub fn topological_sort(&self) -> Result<Vec<V>, CoreError> {
        let mut remaining: BTreeMap<&V, usize> = BTreeMap::new();
        let mut active: Vec<&V> = Vec::new();
        for (vertex, ins) in &self.in_edges {
            remaining.insert(vertex, ins.len());
            if ins.is_empty() {
                active.push(vertex);
            }
        }

        let mut order = Vec::with_capacity(self.weights.len());
        while let Some(source) = active.pop() {
            order.push(source.clone());
            for target in &self.out_edges[source] {
                if let Some(count) = remaining.get_mut(target) {
                    *count -= 1;
                    if *count == 0 {
                        active.push(target);
                    }
                }
            }
        }

        if order.len() != self.weights.len() {
            return Err(CoreError::CycleDetected {
                ordered: order.len(),
                total: self.weights.len(),
            });
        }
        Ok(order)
    }

    /// Returns each vertex's level: 0 for sinks, otherwise one more than the
    /// highest level among its out-neighbors.
    pub fn levels(&self) -> Result<BTreeMap<V, usize>, CoreError> {
        let order = self.topological_sort()?;
        let mut levels: BTreeMap<V, usize> = BTreeMap::new();
        // Walk backwards from the outputs so every out-neighbor is already
        // assigned when a vertex is reached.
        for vertex in order.into_iter().rev() {
            let level = self.out_edges[&vertex]
                .iter()
                .map(|target| levels[target] + 1)
                .max()
                .unwrap_or(0);
            levels.insert(vertex, level);
        }
        Ok(levels)
    }

    /// Groups vertices by level, input-most bucket first.
    ///
    /// The result has `max_level + 1` buckets; bucket `i` holds the vertices
    /// of level `max_level - i`. Vertices within a bucket are sorted. An empty
    /// graph yields no buckets.
    pub fn sort_graph_by_levels(&self) -> Result<Vec<Vec<V>>, CoreError> {
        let levels = self.levels()?;
        let Some(max_level) = levels.values().copied().max() else {
            return Ok(Vec::new());
        };
        let mut buckets = vec![Vec::new(); max_level + 1];
        for (vertex, level) in levels {
            buckets[max_level - level].push(vertex);
        }
        Ok(buckets)
    }

    /// Copies the graph into a petgraph [`DiGraph`] (for DOT rendering),
    /// inserting vertices in sorted order.
    pub fn to_petgraph(&self) -> DiGraph<V, ()> {
        let mut graph = DiGraph::with_capacity(self.len(), self.edge_count());
        let mut indices: BTreeMap<&V, NodeIndex> = BTreeMap::new();
        for vertex in self.weights.keys() {
            indices.insert(vertex, graph.add_node(vertex.clone()));
        }
        for (source, targets) in &self.out_edges {
            for target in targets {
                graph.add_edge(indices[source], indices[target], ());
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn graph_of(vertices: &[u32], edges: &[(u32, u32)]) -> DependencyGraph<u32, ()> {
        let mut graph = DependencyGraph::new();
        for &v in vertices {
            graph.add_vertex(v, ());
        }
        for (s, t) in edges {
            assert!(graph.add_edge(s, t));
        }
        graph
    }

    #[test]
    fn simple_graph_level_sort() {
        //       > 2 >
        // 0 > 1 > 3 > 4
        //   > > > > >
        let graph = graph_of(
            &[0, 1, 2, 3, 4],
            &[(0, 1), (1, 2), (1, 3), (1, 4), (2, 4), (3, 4)],
        );
        let levels = graph.sort_graph_by_levels().unwrap();
        assert_eq!(levels, vec![vec![0], vec![1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn multi_input_graph_level_sort() {
        let graph = graph_of(
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            &[
                (0, 5),
                (1, 6),
                (2, 7),
                (3, 8),
                (4, 9),
                (5, 6),
                (6, 7),
                (7, 8),
                (8, 9),
                (9, 10),
            ],
        );
        let levels = graph.sort_graph_by_levels().unwrap();
        assert_eq!(
            levels,
            vec![
                vec![0],
                vec![1, 5],
                vec![2, 6],
                vec![3, 7],
                vec![4, 8],
                vec![9],
                vec![10],
            ]
        );
    }

    #[test]
    fn multi_output_graph_level_sort() {
        let graph = graph_of(
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
            &[
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 4),
                (4, 5),
                (4, 6),
                (1, 9),
                (2, 8),
                (3, 7),
            ],
        );
        let levels = graph.sort_graph_by_levels().unwrap();
        assert_eq!(levels.len(), 6);
        assert_eq!(levels[4], vec![4]);
        assert_eq!(levels[5], vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn string_vertices_sort_lexically() {
        let mut graph: DependencyGraph<String, i32> = DependencyGraph::new();
        for name in ["_5_", "_2_", "_3_"] {
            graph.add_vertex(name.to_string(), 1);
        }
        graph.add_edge(&"_2_".to_string(), &"_3_".to_string());
        assert_eq!(graph.vertices(), vec!["_2_", "_3_", "_5_"]);
        assert_eq!(graph.topological_sort().unwrap().len(), 3);
    }

    #[test]
    fn add_edge_with_missing_target_fails_without_mutation() {
        let mut graph = graph_of(&[0, 1], &[(0, 1)]);
        assert!(!graph.add_edge(&0, &7));
        assert!(!graph.add_edge(&7, &0));
        assert_eq!(graph.edges_out_of(&0), vec![1]);
        assert_eq!(graph.edges_into(&0), Vec::<u32>::new());
        assert!(!graph.contains(&7));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let mut graph = graph_of(&[0, 1], &[(0, 1)]);
        assert!(graph.add_edge(&0, &1));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges_into(&1), vec![0]);
    }

    #[test]
    fn add_vertex_overwrites_weight_but_keeps_edges() {
        let mut graph: DependencyGraph<u32, &str> = DependencyGraph::new();
        graph.add_vertex(0, "a");
        graph.add_vertex(1, "b");
        graph.add_edge(&0, &1);
        graph.add_vertex(0, "c");
        assert_eq!(*graph.weight_of(&0).unwrap(), "c");
        assert_eq!(graph.edges_out_of(&0), vec![1]);
    }

    #[test]
    fn unknown_vertex_queries() {
        let graph = graph_of(&[0], &[]);
        assert!(graph.edges_out_of(&3).is_empty());
        assert!(graph.edges_into(&3).is_empty());
        match graph.weight_of(&3) {
            Err(CoreError::VertexNotFound { vertex }) => assert_eq!(vertex, "3"),
            other => panic!("expected VertexNotFound, got {:?}", other),
        }
    }

    #[test]
    fn cycle_is_detected() {
        let graph = graph_of(&[0, 1, 2, 3], &[(0, 1), (1, 2), (2, 1), (2, 3)]);
        assert!(matches!(
            graph.topological_sort(),
            Err(CoreError::CycleDetected { ordered: 1, total: 4 })
        ));
        assert!(matches!(
            graph.sort_graph_by_levels(),
            Err(CoreError::CycleDetected { .. })
        ));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let graph = graph_of(&[0], &[(0, 0)]);
        assert!(graph.topological_sort().is_err());
    }

    #[test]
    fn empty_graph_has_no_levels() {
        let graph: DependencyGraph<u32, ()> = DependencyGraph::new();
        assert!(graph.topological_sort().unwrap().is_empty());
        assert!(graph.sort_graph_by_levels().unwrap().is_empty());
    }

    #[test]
    fn petgraph_copy_preserves_shape() {
        let graph = graph_of(&[0, 1, 2], &[(0, 1), (0, 2)]);
        let pg = graph.to_petgraph();
        assert_eq!(pg.node_count(), 3);
        assert_eq!(pg.edge_count(), 2);
    }

    /// Random DAG: edges only go from a lower to a higher position in a
    /// shuffled labelling, so the graph is acyclic but ids are not ordered.
    fn arb_dag() -> impl Strategy<Value = DependencyGraph<u32, ()>> {
        (1usize..32).prop_flat_map(|n| {
            (
                Just((0..n as u32).collect::<Vec<_>>()).prop_shuffle(),
                prop::collection::vec((0..n, 0..n), 0..n * 3),
            )
                .prop_map(|(labels, pairs)| {
                    let mut graph = DependencyGraph::new();
                    for &label in &labels {
                        graph.add_vertex(label, ());
                    }
                    for (a, b) in pairs {
                        if a < b {
                            graph.add_edge(&labels[a], &labels[b]);
                        }
                    }
                    graph
                })
        })
    }

    proptest! {
        #[test]
        fn topological_order_respects_every_edge(graph in arb_dag()) {
            let order = graph.topological_sort().unwrap();
            prop_assert_eq!(order.len(), graph.len());
            let position: BTreeMap<u32, usize> =
                order.iter().enumerate().map(|(i, v)| (*v, i)).collect();
            for u in graph.vertices() {
                for v in graph.edges_out_of(&u) {
                    prop_assert!(position[&u] < position[&v]);
                }
            }
        }

        #[test]
        fn levels_follow_longest_path_rule(graph in arb_dag()) {
            let levels = graph.levels().unwrap();
            for v in graph.vertices() {
                let expected = graph
                    .edges_out_of(&v)
                    .iter()
                    .map(|w| levels[w] + 1)
                    .max()
                    .unwrap_or(0);
                prop_assert_eq!(levels[&v], expected);
                for w in graph.edges_out_of(&v) {
                    prop_assert_ne!(levels[&v], levels[&w]);
                }
            }
        }

        #[test]
        fn buckets_partition_vertices(graph in arb_dag()) {
            let buckets = graph.sort_graph_by_levels().unwrap();
            let total: usize = buckets.iter().map(Vec::len).sum();
            prop_assert_eq!(total, graph.len());
            prop_assert!(buckets.iter().all(|b| !b.is_empty()));
        }
    }
}
