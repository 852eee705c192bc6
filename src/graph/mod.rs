//! Crawl graph analyzer
//!
//! The graph is an arena: nodes live in a `Vec` and are addressed by index,
//! with a `url -> index` map for lookup and per-node adjacency lists of
//! indices. Nodes are only ever added or have their attributes overwritten,
//! never removed, so indices stay valid for the lifetime of a run.
//!
//! Workers share one graph through [`SharedGraph`]; every mutation goes
//! through the write half of the lock.

mod analysis;
mod centrality;
mod community;

pub use analysis::{
    AnalysisOutcome, AnalysisReport, CommunitySummary, EfficiencyReport, FailureHotspot,
    GraphStatistics, ImportanceScores, NodeCentrality,
};

use crate::config::GraphConfig;
use crate::url::domain_of;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Graph shared between workers, the scheduler and the coordinator
pub type SharedGraph = Arc<RwLock<CrawlGraph>>;

/// How an edge came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// parent page → page that was crawled from it
    Discovered,

    /// crawled page → link found on it
    Extracted,

    /// page crawled → page crawled next
    CrawlOrder,
}

/// A URL in the crawl graph
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub url: String,
    pub domain: Option<String>,

    /// True once a crawl result was recorded; discovered-only nodes are false
    pub crawled: bool,
    pub success: bool,
    pub data_value: f64,
    pub response_time: f64,
    pub crawled_at: Option<DateTime<Utc>>,
    pub links_found: usize,
    pub metadata: HashMap<String, String>,
}

impl GraphNode {
    fn discovered(url: &str) -> Self {
        Self {
            url: url.to_string(),
            domain: domain_of(url),
            crawled: false,
            success: false,
            data_value: 0.0,
            response_time: 0.0,
            crawled_at: None,
            links_found: 0,
            metadata: HashMap::new(),
        }
    }
}

/// Directed crawl graph
#[derive(Debug, Clone)]
pub struct CrawlGraph {
    config: GraphConfig,
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    out_edges: Vec<Vec<(usize, EdgeKind)>>,
    in_edges: Vec<Vec<usize>>,
    edge_set: HashSet<(usize, usize)>,

    /// Composite centrality per node from the last analysis pass
    importance: Vec<f64>,
}

impl CrawlGraph {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            index: HashMap::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
            edge_set: HashSet::new(),
            importance: Vec::new(),
        }
    }

    /// Wraps a new graph for sharing
    pub fn shared(config: GraphConfig) -> SharedGraph {
        Arc::new(RwLock::new(Self::new(config)))
    }

    fn ensure_node(&mut self, url: &str) -> usize {
        if let Some(&idx) = self.index.get(url) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(GraphNode::discovered(url));
        self.index.insert(url.to_string(), idx);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        self.importance.push(0.0);
        idx
    }

    /// Adds an edge unless one already exists between the same ordered pair
    fn add_edge(&mut self, from: usize, to: usize, kind: EdgeKind) -> bool {
        if from == to || !self.edge_set.insert((from, to)) {
            return false;
        }
        self.out_edges[from].push((to, kind));
        self.in_edges[to].push(from);
        true
    }

    /// Records the outcome of crawling `url`
    ///
    /// # Arguments
    ///
    /// * `url` - The crawled page
    /// * `parent` - Page the URL was discovered on, if any
    /// * `extracted_links` - Links found on the page
    /// * `success` - Whether extraction met the success bar
    /// * `data_value` - Value of the extracted data in [0, 1]
    /// * `response_time` - Fetch time in seconds
    /// * `metadata` - Free-form attributes stored on the node
    #[allow(clippy::too_many_arguments)]
    pub fn add_crawl_result(
        &mut self,
        url: &str,
        parent: Option<&str>,
        extracted_links: &[String],
        success: bool,
        data_value: f64,
        response_time: f64,
        metadata: HashMap<String, String>,
    ) {
        let idx = self.ensure_node(url);
        {
            let node = &mut self.nodes[idx];
            node.crawled = true;
            node.success = success;
            node.data_value = data_value.clamp(0.0, 1.0);
            node.response_time = response_time.max(0.0);
            node.crawled_at = Some(Utc::now());
            node.links_found = extracted_links.len();
            node.metadata.extend(metadata);
        }

        if let Some(parent) = parent {
            let p = self.ensure_node(parent);
            self.add_edge(p, idx, EdgeKind::Discovered);
        }

        for link in extracted_links {
            let child = self.ensure_node(link);
            self.add_edge(idx, child, EdgeKind::Extracted);
        }
    }

    /// Records that `to` was crawled right after `from`
    pub fn add_crawl_order(&mut self, from: &str, to: &str) -> bool {
        let a = self.ensure_node(from);
        let b = self.ensure_node(to);
        self.add_edge(a, b, EdgeKind::CrawlOrder)
    }

    pub fn node(&self, url: &str) -> Option<&GraphNode> {
        self.index.get(url).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    /// Number of edges pointing at `url` (0 if unseen)
    pub fn in_degree(&self, url: &str) -> usize {
        self.index.get(url).map_or(0, |&i| self.in_edges[i].len())
    }

    /// Number of edges leaving `url` (0 if unseen)
    pub fn out_degree(&self, url: &str) -> usize {
        self.index.get(url).map_or(0, |&i| self.out_edges[i].len())
    }

    /// Composite centrality from the last analysis pass (0 if unseen or not yet analyzed)
    pub fn importance(&self, url: &str) -> f64 {
        self.index.get(url).map_or(0.0, |&i| self.importance[i])
    }

    /// Kind of the edge `from -> to`, if present
    pub fn edge_kind(&self, from: &str, to: &str) -> Option<EdgeKind> {
        let a = *self.index.get(from)?;
        let b = *self.index.get(to)?;
        self.out_edges[a]
            .iter()
            .find(|(t, _)| *t == b)
            .map(|(_, kind)| *kind)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_set.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter()
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    fn predecessors(&self, idx: usize) -> &[usize] {
        &self.in_edges[idx]
    }

    fn successors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        self.out_edges[idx].iter().map(|(t, _)| *t)
    }

    /// Unique neighbors in either direction
    fn neighbors(&self, idx: usize) -> HashSet<usize> {
        self.predecessors(idx)
            .iter()
            .copied()
            .chain(self.successors(idx))
            .collect()
    }

    /// Value propagated one step from graph neighbors
    ///
    /// `propagated(n) = own(n) + p * mean(own(predecessors)) + s * mean(own(successors))`
    /// with `p`/`s` taken from the configured weights (0.3 / 0.1 by default).
    /// Computed once per call, not iterated to a fixed point.
    pub fn value_propagation(&self) -> HashMap<String, f64> {
        let weights = &self.config.weights;
        let mean = |values: Vec<f64>| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };

        (0..self.nodes.len())
            .map(|i| {
                let preds = mean(
                    self.predecessors(i)
                        .iter()
                        .map(|&p| self.nodes[p].data_value)
                        .collect(),
                );
                let succs = mean(self.successors(i).map(|s| self.nodes[s].data_value).collect());
                let value = self.nodes[i].data_value
                    + weights.propagation_predecessor * preds
                    + weights.propagation_successor * succs;
                (self.nodes[i].url.clone(), value)
            })
            .collect()
    }

    /// Ranks nodes as crawl targets
    ///
    /// `score = 0.4 * own_value + 0.3 * min(degree / 10, 1) + 0.3 * successful_neighbor_fraction`
    /// (weights configurable), sorted descending. Ties keep insertion order.
    pub fn get_high_value_targets(&self, limit: usize) -> Vec<(String, f64)> {
        let weights = &self.config.weights;
        let mut scored: Vec<(String, f64)> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let degree = self.in_edges[i].len() + self.out_edges[i].len();
                let neighbors = self.neighbors(i);
                let successful = if neighbors.is_empty() {
                    0.0
                } else {
                    neighbors.iter().filter(|&&n| self.nodes[n].success).count() as f64
                        / neighbors.len() as f64
                };
                let score = weights.target_value * node.data_value
                    + weights.target_degree * (degree as f64 / 10.0).min(1.0)
                    + weights.target_neighbors * successful;
                (node.url.clone(), score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        scored
    }
}
