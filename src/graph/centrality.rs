//! Value-weighted PageRank and the composite centrality score

use super::CrawlGraph;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-8;

/// Small floor so that zero-value pages still receive teleport mass
const VALUE_FLOOR: f64 = 0.05;

impl CrawlGraph {
    /// PageRank with teleportation biased toward high-value pages
    ///
    /// Returns one score per node index, rescaled so the maximum is 1.
    /// An empty graph yields an empty vector.
    pub(super) fn importance_rank(&self) -> Vec<f64> {
        let n = self.nodes.len();
        if n == 0 {
            return Vec::new();
        }

        let bias: Vec<f64> = self.nodes.iter().map(|node| node.data_value + VALUE_FLOOR).collect();
        let bias_total: f64 = bias.iter().sum();
        let teleport: Vec<f64> = bias.iter().map(|b| b / bias_total).collect();

        let mut rank = teleport.clone();
        for _ in 0..MAX_ITERATIONS {
            let dangling: f64 = (0..n)
                .filter(|&i| self.out_edges[i].is_empty())
                .map(|i| rank[i])
                .sum();

            let mut next: Vec<f64> = teleport
                .iter()
                .map(|t| (1.0 - DAMPING) * t + DAMPING * dangling * t)
                .collect();

            for (i, edges) in self.out_edges.iter().enumerate() {
                if edges.is_empty() {
                    continue;
                }
                let share = DAMPING * rank[i] / edges.len() as f64;
                for (target, _) in edges {
                    next[*target] += share;
                }
            }

            let delta: f64 = next.iter().zip(&rank).map(|(a, b)| (a - b).abs()).sum();
            rank = next;
            if delta < TOLERANCE {
                break;
            }
        }

        let max = rank.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            rank.iter_mut().for_each(|r| *r /= max);
        }
        rank
    }

    /// Composite centrality per node index
    ///
    /// `rank_w * importance_rank + value_w * data_value + success_w * success`
    /// with weights 0.4 / 0.3 / 0.3 by default.
    pub(super) fn composite_centrality(&self, rank: &[f64]) -> Vec<f64> {
        let w = &self.config.weights;
        self.nodes
            .iter()
            .zip(rank)
            .map(|(node, r)| {
                w.centrality_rank * r
                    + w.centrality_value * node.data_value
                    + w.centrality_success * if node.success { 1.0 } else { 0.0 }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::create_test_config;
    use super::*;
    use std::collections::HashMap;

    fn star() -> CrawlGraph {
        let mut graph = CrawlGraph::new(create_test_config());
        for leaf in ["L1", "L2", "L3"] {
            graph.add_crawl_result(leaf, None, &["HUB".to_string()], true, 0.2, 1.0, HashMap::new());
        }
        graph.add_crawl_result("HUB", None, &[], true, 0.9, 1.0, HashMap::new());
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = CrawlGraph::new(create_test_config());
        assert!(graph.importance_rank().is_empty());
    }

    #[test]
    fn test_hub_has_highest_rank() {
        let graph = star();
        let rank = graph.importance_rank();
        let hub = graph.index["HUB"];

        assert!((rank[hub] - 1.0).abs() < 1e-9);
        assert!(rank.iter().all(|r| *r >= 0.0 && *r <= 1.0 + 1e-12));
        assert!(rank[graph.index["L1"]] < rank[hub]);
    }

    #[test]
    fn test_value_biases_teleport() {
        let mut graph = CrawlGraph::new(create_test_config());
        graph.add_crawl_result("RICH", None, &[], true, 1.0, 1.0, HashMap::new());
        graph.add_crawl_result("POOR", None, &[], true, 0.0, 1.0, HashMap::new());

        let rank = graph.importance_rank();
        assert!(rank[graph.index["RICH"]] > rank[graph.index["POOR"]]);
    }

    #[test]
    fn test_composite_weights() {
        let graph = star();
        let rank = graph.importance_rank();
        let composite = graph.composite_centrality(&rank);
        let hub = graph.index["HUB"];

        assert!((composite[hub] - (0.4 * 1.0 + 0.3 * 0.9 + 0.3)).abs() < 1e-9);
    }
}
