//! Dependency analysis over resolved input indices.
//!
//! Principal coupling is followed through chains of secondary quantities so
//! that the resulting pattern matches the sparsity of the vector field's
//! Jacobian. Secondary and init evaluation orders come from the strongly
//! connected components of their own dependency graphs.

use mc_graph::Role;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::assembly::InputIndex;

/// For every principal (by position in `principal_ids`), the sorted principal
/// positions its rate reads, directly or through secondary quantities.
pub(crate) fn principal_dependencies(
    principal_ids: &[usize],
    roles: &[Role],
    inputs: &InputIndex,
) -> Vec<Vec<usize>> {
    let mut position = vec![None; roles.len()];
    for (k, &col) in principal_ids.iter().enumerate() {
        position[col] = Some(k);
    }

    let mut visited = vec![usize::MAX; roles.len()];
    let mut stack = Vec::new();
    principal_ids
        .iter()
        .enumerate()
        .map(|(k, &col)| {
            let mut deps = Vec::new();
            stack.extend(inputs.inputs(col));
            while let Some(c) = stack.pop() {
                if visited[c] == k {
                    continue;
                }
                visited[c] = k;
                match roles[c] {
                    Role::Differential => deps.extend(position[c]),
                    Role::Algebraic => stack.extend(inputs.inputs(c)),
                    Role::InitOnly | Role::Inert => {}
                }
            }
            deps.sort_unstable();
            deps
        })
        .collect()
}

/// Evaluation order over a subset of columns, plus the groups that depend on
/// each other circularly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EvaluationPlan {
    /// Dependencies first; members of one cycle appear in column order.
    pub order: Vec<usize>,
    pub circular: Vec<Vec<usize>>,
}

/// Order `members` so each comes after the members it reads through
/// `inputs`.
pub(crate) fn evaluation_plan(members: &[usize], n_cols: usize, inputs: &InputIndex) -> EvaluationPlan {
    let mut node_of: Vec<Option<NodeIndex>> = vec![None; n_cols];
    let mut graph = DiGraph::<usize, ()>::with_capacity(members.len(), members.len());
    for &col in members {
        node_of[col] = Some(graph.add_node(col));
    }
    for &col in members {
        let Some(from) = node_of[col] else { continue };
        for input in inputs.inputs(col) {
            if let Some(to) = node_of[input] {
                graph.update_edge(from, to, ());
            }
        }
    }

    // Tarjan emits components in reverse topological order of the
    // "reads from" edges, i.e. dependencies first.
    let mut plan = EvaluationPlan::default();
    for component in tarjan_scc(&graph) {
        let mut cols: Vec<usize> = component.iter().map(|&n| graph[n]).collect();
        cols.sort_unstable();
        let cyclic = component.len() > 1 || graph.contains_edge(component[0], component[0]);
        if cyclic {
            plan.circular.push(cols.clone());
        }
        plan.order.extend(cols);
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(rows: &[&[usize]]) -> InputIndex {
        InputIndex::from_rows(&rows.iter().map(|r| r.to_vec()).collect::<Vec<_>>())
    }

    #[test]
    fn coupling_follows_secondary_chains() {
        // 0,1 differential; 2,3 algebraic; 0 reads 2, 2 reads 3, 3 reads 1
        let roles = [Role::Differential, Role::Differential, Role::Algebraic, Role::Algebraic];
        let inputs = index(&[&[2], &[], &[3], &[1]]);
        let deps = principal_dependencies(&[0, 1], &roles, &inputs);
        assert_eq!(deps, vec![vec![1], vec![]]);
    }

    #[test]
    fn constants_do_not_couple() {
        let roles = [Role::Differential, Role::Inert, Role::InitOnly];
        let inputs = index(&[&[0, 1, 2], &[], &[]]);
        let deps = principal_dependencies(&[0], &roles, &inputs);
        assert_eq!(deps, vec![vec![0]]);
    }

    #[test]
    fn plan_orders_dependencies_first() {
        // 0 reads 1, 1 reads 2
        let inputs = index(&[&[1], &[2], &[]]);
        let plan = evaluation_plan(&[0, 1, 2], 3, &inputs);
        assert_eq!(plan.order, vec![2, 1, 0]);
        assert!(plan.circular.is_empty());
    }

    #[test]
    fn plan_reports_cycles() {
        // 0 <-> 1, 2 reads itself, 3 reads 0
        let inputs = index(&[&[1], &[0], &[2], &[0]]);
        let plan = evaluation_plan(&[0, 1, 2, 3], 4, &inputs);
        assert!(plan.circular.contains(&vec![0, 1]));
        assert!(plan.circular.contains(&vec![2]));
        assert_eq!(plan.circular.len(), 2);
        let pos = |c: usize| plan.order.iter().position(|&x| x == c).unwrap();
        assert!(pos(3) > pos(0) && pos(3) > pos(1));
    }
}
