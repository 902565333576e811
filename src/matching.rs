//! Perfect matchings with alternating-path search over a group-local graph.
//!
//! One engine serves the three consumers (enumeration over fixed
//! vertex/edge sets, in-place modification of a stored assignment, and
//! heteroatom-state expansion); they differ only in the
//! [`MatchConstraints`] they supply.

use crate::bits;

/// Caller-supplied usability predicates. A matching never covers an
/// unusable vertex and never changes the state of an unusable edge; the
/// alternating-path search refuses paths whose endpoints are unusable.
pub trait MatchConstraints {
    fn vertex_usable(&self, v: usize) -> bool {
        let _ = v;
        true
    }
    fn edge_usable(&self, e: usize) -> bool {
        let _ = e;
        true
    }
}

/// No restrictions.
pub struct Unconstrained;

impl MatchConstraints for Unconstrained {}

/// Local-index topology of an aromatic group.
///
/// Vertices are `0..vertex_count`; edge `i` corresponds to bit `i` of a
/// stored assignment row for the group.
pub struct MatchingGraph {
    vertex_count: usize,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl MatchingGraph {
    pub fn new(vertex_count: usize, edges: Vec<(usize, usize)>) -> Self {
        let mut adjacency = vec![Vec::new(); vertex_count];
        for (i, &(u, v)) in edges.iter().enumerate() {
            adjacency[u].push((v, i));
            adjacency[v].push((u, i));
        }
        Self {
            vertex_count,
            edges,
            adjacency,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn endpoints(&self, e: usize) -> (usize, usize) {
        self.edges[e]
    }
}

/// An explicit alternating path: edge indices whose matched states
/// alternate along the walk. Produced by
/// [`Matching::find_alternating_path`] and consumed by
/// [`Matching::apply_path`]; holding one across other mutations of the
/// matching makes it stale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternatingPath {
    edges: Vec<usize>,
}

impl AlternatingPath {
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// A matching over a [`MatchingGraph`].
pub struct Matching<'g> {
    graph: &'g MatchingGraph,
    vertex_match: Vec<Option<usize>>,
    edge_matched: Vec<bool>,
}

impl<'g> Matching<'g> {
    pub fn new(graph: &'g MatchingGraph) -> Self {
        Self {
            graph,
            vertex_match: vec![None; graph.vertex_count()],
            edge_matched: vec![false; graph.edge_count()],
        }
    }

    pub fn reset(&mut self) {
        self.vertex_match.fill(None);
        self.edge_matched.fill(false);
    }

    pub fn is_edge_matched(&self, e: usize) -> bool {
        self.edge_matched[e]
    }

    pub fn is_vertex_matched(&self, v: usize) -> bool {
        self.vertex_match[v].is_some()
    }

    /// Force an edge's matching state, updating the endpoint pointers.
    pub fn set_edge_matched(&mut self, e: usize, matched: bool) {
        let (u, v) = self.graph.endpoints(e);
        self.edge_matched[e] = matched;
        if matched {
            self.vertex_match[u] = Some(e);
            self.vertex_match[v] = Some(e);
        } else {
            if self.vertex_match[u] == Some(e) {
                self.vertex_match[u] = None;
            }
            if self.vertex_match[v] == Some(e) {
                self.vertex_match[v] = None;
            }
        }
    }

    /// Uncover a vertex by unmatching its incident matched edge, if any.
    pub fn remove_vertex(&mut self, v: usize) {
        if let Some(e) = self.vertex_match[v] {
            self.set_edge_matched(e, false);
        }
    }

    /// Extend the current matching until every usable vertex is covered.
    /// Returns false (leaving a partial matching) if some usable vertex
    /// cannot be covered.
    pub fn find_perfect(&mut self, constraints: &impl MatchConstraints) -> bool {
        for start in 0..self.graph.vertex_count() {
            if !constraints.vertex_usable(start) || self.vertex_match[start].is_some() {
                continue;
            }
            if !self.augment_from(start, constraints) {
                return false;
            }
        }
        true
    }

    // Breadth-first search for an augmenting path from an exposed vertex
    // to another exposed vertex, alternating unmatched/matched edges.
    fn augment_from(&mut self, start: usize, constraints: &impl MatchConstraints) -> bool {
        let n = self.graph.vertex_count();
        let mut prev: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut queue = std::collections::VecDeque::new();

        visited[start] = true;
        queue.push_back(start);

        while let Some(u) = queue.pop_front() {
            for &(w, e) in &self.graph.adjacency[u] {
                if self.edge_matched[e]
                    || !constraints.edge_usable(e)
                    || !constraints.vertex_usable(w)
                    || visited[w]
                {
                    continue;
                }
                visited[w] = true;
                prev[w] = Some((u, e));

                let Some(me) = self.vertex_match[w] else {
                    self.flip_augmenting_path(&prev, start, w);
                    return true;
                };
                if !constraints.edge_usable(me) {
                    continue;
                }
                let (a, b) = self.graph.endpoints(me);
                let x = if a == w { b } else { a };
                if !visited[x] {
                    visited[x] = true;
                    prev[x] = Some((w, me));
                    queue.push_back(x);
                }
            }
        }
        false
    }

    fn flip_augmenting_path(
        &mut self,
        prev: &[Option<(usize, usize)>],
        start: usize,
        end: usize,
    ) {
        let mut edges = Vec::new();
        let mut cur = end;
        while cur != start {
            let (p, e) = prev[cur].expect("path exists");
            edges.push(e);
            cur = p;
        }
        self.apply_path(&AlternatingPath { edges });
    }

    /// Search for a simple alternating path from `from` to `to`.
    /// `first_strong` fixes whether the edge leaving `from` must be
    /// matched; `last_strong` likewise for the edge arriving at `to`.
    /// Endpoints and interior vertices must all be usable.
    pub fn find_alternating_path(
        &self,
        from: usize,
        to: usize,
        first_strong: bool,
        last_strong: bool,
        constraints: &impl MatchConstraints,
    ) -> Option<AlternatingPath> {
        if from == to
            || !constraints.vertex_usable(from)
            || !constraints.vertex_usable(to)
        {
            return None;
        }
        let mut visited = vec![false; self.graph.vertex_count()];
        visited[from] = true;
        let mut edges = Vec::new();
        if self.alt_dfs(from, first_strong, to, last_strong, constraints, &mut visited, &mut edges)
        {
            Some(AlternatingPath { edges })
        } else {
            None
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn alt_dfs(
        &self,
        u: usize,
        want_matched: bool,
        to: usize,
        last_strong: bool,
        constraints: &impl MatchConstraints,
        visited: &mut [bool],
        edges: &mut Vec<usize>,
    ) -> bool {
        for &(w, e) in &self.graph.adjacency[u] {
            if self.edge_matched[e] != want_matched || !constraints.edge_usable(e) {
                continue;
            }
            if w == to {
                // The target is terminal; reaching it with the wrong
                // parity does not allow passing through.
                if want_matched == last_strong {
                    edges.push(e);
                    return true;
                }
                continue;
            }
            if visited[w] || !constraints.vertex_usable(w) {
                continue;
            }
            visited[w] = true;
            edges.push(e);
            if self.alt_dfs(w, !want_matched, to, last_strong, constraints, visited, edges) {
                return true;
            }
            edges.pop();
            visited[w] = false;
        }
        false
    }

    /// XOR the matching along a path: matched edges become unmatched and
    /// vice versa, with endpoint pointers kept consistent.
    pub fn apply_path(&mut self, path: &AlternatingPath) {
        let to_match: Vec<usize> = path
            .edges
            .iter()
            .copied()
            .filter(|&e| !self.edge_matched[e])
            .collect();
        for &e in &path.edges {
            if self.edge_matched[e] {
                self.set_edge_matched(e, false);
            }
        }
        for e in to_match {
            self.set_edge_matched(e, true);
        }
    }

    /// The matching as a packed bit row: bit `i` set iff edge `i` is
    /// matched. Row width is `bits::bytes_for(edge_count)`.
    pub fn edges_state(&self) -> Vec<u8> {
        let mut row = vec![0u8; bits::bytes_for(self.graph.edge_count())];
        for (i, &m) in self.edge_matched.iter().enumerate() {
            if m {
                bits::set(&mut row, i, true);
            }
        }
        row
    }

    /// Replace the matching with the one encoded in a packed bit row.
    pub fn load_edges_state(&mut self, row: &[u8]) {
        self.reset();
        for e in 0..self.graph.edge_count() {
            if bits::get(row, e) {
                self.set_edge_matched(e, true);
            }
        }
    }
}
