//! Greedy modularity community detection
//!
//! Agglomerative: every node starts in its own community, and the pair of
//! connected communities whose merge gains the most modularity is merged
//! until no merge improves it. Edge direction is ignored.
//!
//! Candidate merges live in a max-heap and each community keeps its own
//! neighbor map, so a merge only touches the edges of the two communities
//! involved. Heap entries carry the merge stamps of both sides and are
//! discarded lazily once either side has changed.

use super::CrawlGraph;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

const MIN_GAIN: f64 = 1e-12;

#[derive(Debug)]
struct Candidate {
    gain: f64,
    pair: (usize, usize),
    stamps: (u32, u32),
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Highest gain first; ties go to the smaller pair
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.pair.cmp(&self.pair))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl CrawlGraph {
    /// Groups node indices into communities
    ///
    /// Isolated nodes remain singleton communities. The result is ordered by
    /// the smallest member index of each community.
    pub(super) fn detect_communities(&self) -> Vec<Vec<usize>> {
        let n = self.nodes.len();
        let m = self.edge_set.len() as f64;
        if n == 0 {
            return Vec::new();
        }

        let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
        if m == 0.0 {
            return members.into_iter().flatten().collect();
        }

        // Undirected weights between communities; a reciprocal pair of
        // directed edges counts twice.
        let mut adjacency: Vec<HashMap<usize, f64>> = vec![HashMap::new(); n];
        let mut degree = vec![0.0; n];
        for &(a, b) in &self.edge_set {
            *adjacency[a].entry(b).or_insert(0.0) += 1.0;
            *adjacency[b].entry(a).or_insert(0.0) += 1.0;
            degree[a] += 1.0;
            degree[b] += 1.0;
        }

        // ΔQ = 2 * (e_ab - a_a * a_b)
        let two_m = 2.0 * m;
        let merge_gain = |weight: f64, da: f64, db: f64| {
            2.0 * (weight / two_m - (da / two_m) * (db / two_m))
        };

        let mut stamp = vec![0u32; n];
        let mut heap = BinaryHeap::new();
        for (a, neighbors) in adjacency.iter().enumerate() {
            for (&b, &weight) in neighbors {
                if a < b {
                    heap.push(Candidate {
                        gain: merge_gain(weight, degree[a], degree[b]),
                        pair: (a, b),
                        stamps: (0, 0),
                    });
                }
            }
        }

        while let Some(candidate) = heap.pop() {
            let (a, b) = candidate.pair;
            if members[a].is_none()
                || members[b].is_none()
                || candidate.stamps != (stamp[a], stamp[b])
            {
                continue;
            }
            if candidate.gain <= MIN_GAIN {
                break;
            }

            // Fold the smaller neighbor map into the larger one
            let (keep, absorb) = if adjacency[a].len() >= adjacency[b].len() {
                (a, b)
            } else {
                (b, a)
            };

            let absorbed = members[absorb].take().unwrap_or_default();
            if let Some(kept) = members[keep].as_mut() {
                kept.extend(absorbed);
            }
            degree[keep] += degree[absorb];
            degree[absorb] = 0.0;

            let absorbed_links = std::mem::take(&mut adjacency[absorb]);
            adjacency[keep].remove(&absorb);
            for (other, weight) in absorbed_links {
                if other == keep {
                    continue;
                }
                adjacency[other].remove(&absorb);
                *adjacency[other].entry(keep).or_insert(0.0) += weight;
                *adjacency[keep].entry(other).or_insert(0.0) += weight;
            }

            stamp[keep] += 1;
            for (&other, &weight) in &adjacency[keep] {
                let pair = ordered(keep, other);
                heap.push(Candidate {
                    gain: merge_gain(weight, degree[keep], degree[other]),
                    pair,
                    stamps: (stamp[pair.0], stamp[pair.1]),
                });
            }
        }

        let mut communities: Vec<Vec<usize>> = members.into_iter().flatten().collect();
        for c in communities.iter_mut() {
            c.sort_unstable();
        }
        communities.sort_by_key(|c| c[0]);
        communities
    }
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
