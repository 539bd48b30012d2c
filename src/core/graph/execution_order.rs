use log::warn;
use std::collections::{BTreeSet, HashSet};

/// Ordering-relevant view of a block, indexed by declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderNode {
    /// Holds state across ticks and may read previous-tick inputs
    pub stateful: bool,
}

/// Manages topological sorting of blocks into evaluation order
pub struct ExecutionOrderBuilder;

impl ExecutionOrderBuilder {
    /// Staged Kahn's algorithm over `edges` (source index, target index).
    ///
    /// Every stage holds the blocks whose dependencies are satisfied by earlier
    /// stages, sorted by declaration index. When no block is ready the
    /// remaining graph is cyclic; one block on a cycle is released as its own
    /// stage and reads previous-tick values for the unsatisfied edges.
    /// State-holding blocks are released before combinational ones.
    pub fn build_stages(nodes: &[OrderNode], edges: &BTreeSet<(usize, usize)>) -> Vec<Vec<usize>> {
        let mut adj_list: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut in_degree: Vec<usize> = vec![0; nodes.len()];

        for &(source, target) in edges {
            if source >= nodes.len() || target >= nodes.len() || source == target {
                continue;
            }
            adj_list[source].push(target);
            in_degree[target] += 1;
        }

        let mut remaining: BTreeSet<usize> = (0..nodes.len()).collect();
        let mut stages = Vec::new();

        while !remaining.is_empty() {
            let mut current_stage: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&index| in_degree[index] == 0)
                .collect();

            if current_stage.is_empty() {
                let released = Self::release_from_cycle(nodes, &adj_list, &remaining);
                if !nodes[released].stateful {
                    warn!(
                        "Combinational loop through block #{}, it reads previous-tick values",
                        released
                    );
                }
                current_stage.push(released);
            }

            for &index in &current_stage {
                remaining.remove(&index);
                for &neighbor in &adj_list[index] {
                    if remaining.contains(&neighbor) {
                        in_degree[neighbor] = in_degree[neighbor].saturating_sub(1);
                    }
                }
            }

            stages.push(current_stage);
        }

        stages
    }

    /// Flattened evaluation order
    pub fn build_order(nodes: &[OrderNode], edges: &BTreeSet<(usize, usize)>) -> Vec<usize> {
        Self::build_stages(nodes, edges).into_iter().flatten().collect()
    }

    /// Pick the block to release when every remaining block waits on another.
    /// Lowest declared state-holding block on a cycle first, then the lowest
    /// declared block on a cycle.
    fn release_from_cycle(nodes: &[OrderNode], adj_list: &[Vec<usize>], remaining: &BTreeSet<usize>) -> usize {
        let on_cycle: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&index| Self::reaches_itself(index, adj_list, remaining))
            .collect();

        on_cycle
            .iter()
            .copied()
            .find(|&index| nodes[index].stateful)
            .or_else(|| on_cycle.first().copied())
            // A stuck remainder always contains a cycle; keep going regardless.
            .or_else(|| remaining.iter().next().copied())
            .unwrap_or(0)
    }

    fn reaches_itself(start: usize, adj_list: &[Vec<usize>], remaining: &BTreeSet<usize>) -> bool {
        let mut visited = HashSet::new();
        let mut stack: Vec<usize> = adj_list[start].clone();
        while let Some(index) = stack.pop() {
            if index == start {
                return true;
            }
            if !remaining.contains(&index) || !visited.insert(index) {
                continue;
            }
            stack.extend(adj_list[index].iter().copied());
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combinational(count: usize) -> Vec<OrderNode> {
        vec![OrderNode { stateful: false }; count]
    }

    fn edges(pairs: &[(usize, usize)]) -> BTreeSet<(usize, usize)> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_build_stages_simple() {
        // 0 -> 1 -> 2
        let stages = ExecutionOrderBuilder::build_stages(&combinational(3), &edges(&[(0, 1), (1, 2)]));
        assert_eq!(stages, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_build_stages_parallel() {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let stages = ExecutionOrderBuilder::build_stages(
            &combinational(4),
            &edges(&[(0, 1), (0, 2), (1, 3), (2, 3)]),
        );
        assert_eq!(stages, vec![vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        // 2 -> 0, 1 independent
        let order = ExecutionOrderBuilder::build_order(&combinational(3), &edges(&[(2, 0)]));
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_stateful_block_breaks_cycle() {
        // 0 (and) -> 1 (latch) -> 0, latch released first
        let nodes = vec![OrderNode { stateful: false }, OrderNode { stateful: true }];
        let order = ExecutionOrderBuilder::build_order(&nodes, &edges(&[(0, 1), (1, 0)]));
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_stateful_block_downstream_of_cycle_waits() {
        // cycle 1 <-> 2 with 2 stateful; 0 stateful hangs off 1
        let nodes = vec![
            OrderNode { stateful: true },
            OrderNode { stateful: false },
            OrderNode { stateful: true },
        ];
        let order = ExecutionOrderBuilder::build_order(&nodes, &edges(&[(1, 2), (2, 1), (1, 0)]));
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn test_combinational_loop_still_orders_everything() {
        let order = ExecutionOrderBuilder::build_order(&combinational(3), &edges(&[(0, 1), (1, 0), (1, 2)]));
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_self_edges_are_ignored() {
        let order = ExecutionOrderBuilder::build_order(&combinational(2), &edges(&[(0, 0), (0, 1)]));
        assert_eq!(order, vec![0, 1]);
    }
}
