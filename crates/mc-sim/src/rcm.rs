//! Reverse Cuthill–McKee ordering of the principal dependency pattern.

use std::collections::VecDeque;

/// A symmetric permutation of the principal quantities and the bandwidth of
/// the dependency pattern in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    /// `permutation[k]` is the principal placed at position `k`.
    pub permutation: Vec<usize>,
    /// `inverse[i]` is the position of principal `i`.
    pub inverse: Vec<usize>,
    pub lower: usize,
    pub upper: usize,
}

impl Ordering {
    /// Order `dependencies` (`dependencies[i]` lists the principals that
    /// principal `i` reads) and measure the resulting bands.
    pub fn new(dependencies: &[Vec<usize>]) -> Self {
        let permutation = reverse_cuthill_mckee(&symmetric_adjacency(dependencies));
        let mut inverse = vec![0; permutation.len()];
        for (k, &i) in permutation.iter().enumerate() {
            inverse[i] = k;
        }
        let (lower, upper) = bandwidth(dependencies, &inverse);
        Self {
            permutation,
            inverse,
            lower,
            upper,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.permutation.iter().enumerate().all(|(k, &i)| k == i)
    }
}

/// Undirected neighbour lists without self loops, sorted and deduplicated.
fn symmetric_adjacency(dependencies: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = dependencies.len();
    let mut adj = vec![Vec::new(); n];
    for (i, deps) in dependencies.iter().enumerate() {
        for &j in deps.iter().filter(|&&j| j != i && j < n) {
            adj[i].push(j);
            adj[j].push(i);
        }
    }
    for list in &mut adj {
        list.sort_unstable();
        list.dedup();
    }
    adj
}

/// Deterministic RCM: components are visited in order of their smallest
/// node, each starts from its minimum-degree node (lowest index on ties),
/// neighbours are queued by `(degree, index)`, and every component's
/// ordering is reversed in place.
pub fn reverse_cuthill_mckee(adj: &[Vec<usize>]) -> Vec<usize> {
    let n = adj.len();
    let degree = |i: usize| adj[i].len();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    for seed in 0..n {
        if visited[seed] {
            continue;
        }
        let component = collect_component(adj, seed);
        let start = component
            .iter()
            .copied()
            .min_by_key(|&i| (degree(i), i))
            .unwrap_or(seed);

        let first = order.len();
        visited[start] = true;
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            order.push(node);
            let mut next: Vec<usize> = adj[node].iter().copied().filter(|&j| !visited[j]).collect();
            next.sort_unstable_by_key(|&j| (degree(j), j));
            for j in next {
                visited[j] = true;
                queue.push_back(j);
            }
        }
        order[first..].reverse();
    }
    order
}

fn collect_component(adj: &[Vec<usize>], seed: usize) -> Vec<usize> {
    let mut seen = vec![false; adj.len()];
    let mut stack = vec![seed];
    let mut out = Vec::new();
    seen[seed] = true;
    while let Some(i) = stack.pop() {
        out.push(i);
        for &j in &adj[i] {
            if !seen[j] {
                seen[j] = true;
                stack.push(j);
            }
        }
    }
    out
}

/// `(lower, upper)` bandwidth of the directed pattern under `inverse`.
fn bandwidth(dependencies: &[Vec<usize>], inverse: &[usize]) -> (usize, usize) {
    let mut lower = 0;
    let mut upper = 0;
    for (i, deps) in dependencies.iter().enumerate() {
        let row = inverse[i];
        for &j in deps {
            let col = inverse[j];
            if col < row {
                lower = lower.max(row - col);
            } else {
                upper = upper.max(col - row);
            }
        }
    }
    (lower, upper)
}
