//! Crawl pattern analysis report

use super::CrawlGraph;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

const TOP_CENTRALITY: usize = 10;
const MAX_HOTSPOTS: usize = 5;
const HOTSPOT_MIN_PAGES: usize = 2;
const HOTSPOT_FAILURE_RATE: f64 = 0.5;

/// Result of [`CrawlGraph::analyze_crawl_patterns`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Not enough data for a meaningful pass
    Insufficient { nodes: usize, required: usize },
    Report(AnalysisReport),
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&AnalysisReport> {
        match self {
            AnalysisOutcome::Report(report) => Some(report),
            AnalysisOutcome::Insufficient { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub statistics: GraphStatistics,
    pub centrality: Vec<NodeCentrality>,
    pub communities: Vec<CommunitySummary>,
    pub propagation: HashMap<String, f64>,
    pub efficiency: EfficiencyReport,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub crawled_count: usize,
    pub density: f64,
    pub weak_components: usize,
    pub weakly_connected: bool,
    pub success_rate: f64,
    pub total_value: f64,
    pub avg_value: f64,
    pub max_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeCentrality {
    pub url: String,
    pub importance_rank: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunitySummary {
    pub size: usize,
    pub success_rate: f64,
    pub total_value: f64,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyReport {
    /// Node count per BFS depth from the root nodes (in-degree 0)
    pub depth_distribution: Vec<usize>,
    pub unreachable: usize,
    pub failure_hotspots: Vec<FailureHotspot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureHotspot {
    pub domain: String,
    pub crawled: usize,
    pub failed: usize,
    pub failure_rate: f64,
}

/// Composite centrality computed by a read-only analysis pass
///
/// Indexed by node position at the time of the pass; nodes added since then
/// keep an importance of zero until the next pass.
#[derive(Debug, Clone)]
pub struct ImportanceScores(Vec<f64>);

impl CrawlGraph {
    /// Runs a full analysis pass and refreshes the importance cache
    ///
    /// Returns [`AnalysisOutcome::Insufficient`] when the graph has fewer than
    /// `min_nodes_for_analysis` nodes or nothing has been crawled yet. A
    /// successful pass also refreshes the importance cache read by the
    /// scheduler's prioritizer.
    pub fn analyze_crawl_patterns(&mut self) -> AnalysisOutcome {
        let (outcome, scores) = self.analyze();
        if let Some(scores) = scores {
            self.apply_importance(scores);
        }
        outcome
    }

    /// Runs a full analysis pass without modifying the graph
    ///
    /// Lets callers analyze a snapshot off the lock and take the write lock
    /// only for [`CrawlGraph::apply_importance`].
    pub fn analyze(&self) -> (AnalysisOutcome, Option<ImportanceScores>) {
        let required = self.config.min_nodes_for_analysis;
        let nodes = self.nodes.len();
        if nodes < required || nodes == 0 || !self.nodes.iter().any(|n| n.crawled) {
            debug!("Skipping graph analysis: {} nodes (need {})", nodes, required);
            return (AnalysisOutcome::Insufficient { nodes, required }, None);
        }

        let rank = self.importance_rank();
        let composite = self.composite_centrality(&rank);

        let statistics = self.statistics();
        let report = AnalysisReport {
            centrality: self.top_centrality(&rank, &composite),
            communities: self.community_summaries(),
            propagation: self.value_propagation(),
            efficiency: self.efficiency(),
            recommendations: recommendations(&statistics),
            statistics,
        };

        debug!(
            "Graph analysis: {} nodes, {} edges, {} communities",
            report.statistics.node_count,
            report.statistics.edge_count,
            report.communities.len()
        );
        (
            AnalysisOutcome::Report(report),
            Some(ImportanceScores(composite)),
        )
    }

    /// Stores scores from [`CrawlGraph::analyze`] in the importance cache
    pub fn apply_importance(&mut self, scores: ImportanceScores) {
        let mut importance = scores.0;
        importance.resize(self.nodes.len(), 0.0);
        self.importance = importance;
    }

    fn statistics(&self) -> GraphStatistics {
        let n = self.nodes.len();
        let e = self.edge_set.len();
        let density = if n > 1 {
            e as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        let crawled: Vec<_> = self.nodes.iter().filter(|n| n.crawled).collect();
        let successes = crawled.iter().filter(|n| n.success).count();
        let success_rate = if crawled.is_empty() {
            0.0
        } else {
            successes as f64 / crawled.len() as f64
        };
        let total_value: f64 = crawled.iter().map(|n| n.data_value).sum();
        let avg_value = if crawled.is_empty() {
            0.0
        } else {
            total_value / crawled.len() as f64
        };
        let max_value = crawled.iter().map(|n| n.data_value).fold(0.0, f64::max);

        let weak_components = self.weak_component_count();
        GraphStatistics {
            node_count: n,
            edge_count: e,
            crawled_count: crawled.len(),
            density,
            weak_components,
            weakly_connected: weak_components == 1,
            success_rate,
            total_value,
            avg_value,
            max_value,
        }
    }

    fn weak_component_count(&self) -> usize {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = 0;
        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            components += 1;
            seen[start] = true;
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                for j in self.neighbors(i) {
                    if !seen[j] {
                        seen[j] = true;
                        stack.push(j);
                    }
                }
            }
        }
        components
    }

    fn top_centrality(&self, rank: &[f64], composite: &[f64]) -> Vec<NodeCentrality> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by(|&a, &b| composite[b].total_cmp(&composite[a]));
        order
            .into_iter()
            .take(TOP_CENTRALITY)
            .map(|i| NodeCentrality {
                url: self.nodes[i].url.clone(),
                importance_rank: rank[i],
                score: composite[i],
            })
            .collect()
    }

    fn community_summaries(&self) -> Vec<CommunitySummary> {
        let mut summaries: Vec<CommunitySummary> = self
            .detect_communities()
            .into_iter()
            .map(|members| {
                let crawled = members.iter().filter(|&&i| self.nodes[i].crawled).count();
                let successes = members.iter().filter(|&&i| self.nodes[i].success).count();
                CommunitySummary {
                    size: members.len(),
                    success_rate: if crawled == 0 {
                        0.0
                    } else {
                        successes as f64 / crawled as f64
                    },
                    total_value: members.iter().map(|&i| self.nodes[i].data_value).sum(),
                    members: members.iter().map(|&i| self.nodes[i].url.clone()).collect(),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
        summaries
    }

    fn efficiency(&self) -> EfficiencyReport {
        let n = self.nodes.len();
        let mut depth: Vec<Option<usize>> = vec![None; n];
        let mut queue = VecDeque::new();
        for i in 0..n {
            if self.in_edges[i].is_empty() {
                depth[i] = Some(0);
                queue.push_back(i);
            }
        }
        while let Some(i) = queue.pop_front() {
            let d = depth[i].unwrap_or(0);
            for j in self.successors(i) {
                if depth[j].is_none() {
                    depth[j] = Some(d + 1);
                    queue.push_back(j);
                }
            }
        }

        let mut depth_distribution = Vec::new();
        let mut unreachable = 0;
        for d in &depth {
            match d {
                Some(d) => {
                    if depth_distribution.len() <= *d {
                        depth_distribution.resize(d + 1, 0);
                    }
                    depth_distribution[*d] += 1;
                }
                None => unreachable += 1,
            }
        }

        EfficiencyReport {
            depth_distribution,
            unreachable,
            failure_hotspots: self.failure_hotspots(),
        }
    }

    fn failure_hotspots(&self) -> Vec<FailureHotspot> {
        let mut per_domain: HashMap<&str, (usize, usize)> = HashMap::new();
        for node in self.nodes.iter().filter(|n| n.crawled) {
            if let Some(domain) = node.domain.as_deref() {
                let entry = per_domain.entry(domain).or_insert((0, 0));
                entry.0 += 1;
                if !node.success {
                    entry.1 += 1;
                }
            }
        }

        let mut hotspots: Vec<FailureHotspot> = per_domain
            .into_iter()
            .filter(|(_, (crawled, _))| *crawled >= HOTSPOT_MIN_PAGES)
            .map(|(domain, (crawled, failed))| FailureHotspot {
                domain: domain.to_string(),
                crawled,
                failed,
                failure_rate: failed as f64 / crawled as f64,
            })
            .filter(|h| h.failure_rate >= HOTSPOT_FAILURE_RATE)
            .collect();

        hotspots.sort_by(|a, b| {
            b.failure_rate
                .total_cmp(&a.failure_rate)
                .then(b.failed.cmp(&a.failed))
                .then(a.domain.cmp(&b.domain))
        });
        hotspots.truncate(MAX_HOTSPOTS);
        hotspots
    }
}

fn recommendations(stats: &GraphStatistics) -> Vec<String> {
    let mut out = Vec::new();
    if stats.success_rate < 0.7 {
        out.push(format!(
            "Success rate is {:.0}%: review URL targeting and filtering",
            stats.success_rate * 100.0
        ));
    }
    if stats.avg_value < 0.3 {
        out.push(format!(
            "Average data value is {:.2}: target higher-value pages",
            stats.avg_value
        ));
    }
    if stats.density < 0.1 {
        out.push("Graph is sparse: broaden link discovery".to_string());
    } else if stats.density > 0.5 {
        out.push("Graph is dense: tighten link selectivity".to_string());
    }
    out
}
