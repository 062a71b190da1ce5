//! Interaction network for group conversations.
//!
//! Nodes are participants, edges connect pairs that ever replied to each
//! other. The graph is undirected with the directional reply counts kept on
//! the edge. Requires at least three participants; the two-person case is
//! structurally trivial and reported absent.

use petgraph::graph::UnGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::accumulate::AccumulatorSet;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NetworkNode {
    pub name: String,
    pub total_messages: usize,
    /// Degree centrality: fraction of other participants this node replied
    /// with, 0-1.
    pub centrality: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NetworkEdge {
    pub a: String,
    pub b: String,
    /// Total mutual interactions.
    pub weight: u32,
    pub a_to_b: u32,
    pub b_to_a: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
    /// |E| / (n * (n-1) / 2).
    pub density: f64,
    pub most_connected: String,
}

pub fn derive(acc: &AccumulatorSet) -> Option<NetworkGraph> {
    let active: Vec<&crate::accumulate::PersonAccumulator> = acc
        .persons
        .values()
        .filter(|p| p.total_messages > 0)
        .collect();
    if active.len() < 3 {
        return None;
    }

    let mut graph: UnGraph<String, (u32, u32)> = UnGraph::new_undirected();
    let mut node_of: HashMap<&str, petgraph::graph::NodeIndex> = HashMap::new();
    for person in &active {
        let idx = graph.add_node(person.name.clone());
        node_of.insert(person.name.as_str(), idx);
    }

    // reply_pairs is directed (responder, sender); fold both directions onto
    // one undirected edge, keeping the sub-counts oriented by node order.
    for ((responder, sender), &count) in &acc.reply_pairs {
        let (Some(&from), Some(&to)) = (
            node_of.get(responder.as_str()),
            node_of.get(sender.as_str()),
        ) else {
            continue;
        };
        if from == to {
            continue;
        }
        match graph.find_edge(from, to) {
            Some(edge) => {
                if let Some((a, _)) = graph.edge_endpoints(edge) {
                    let weights = &mut graph[edge];
                    if a == from {
                        weights.0 += count;
                    } else {
                        weights.1 += count;
                    }
                }
            }
            None => {
                graph.add_edge(from, to, (count, 0));
            }
        }
    }

    let n = graph.node_count();
    let possible_edges = n * (n - 1) / 2;
    let density = if possible_edges == 0 {
        0.0
    } else {
        graph.edge_count() as f64 / possible_edges as f64
    };

    let mut nodes: Vec<NetworkNode> = graph
        .node_indices()
        .map(|idx| {
            let name = graph[idx].clone();
            let degree = graph.edges(idx).count();
            NetworkNode {
                total_messages: acc
                    .person(&name)
                    .map(|p| p.total_messages)
                    .unwrap_or(0),
                centrality: degree as f64 / (n - 1) as f64,
                name,
            }
        })
        .collect();
    nodes.sort_by(|a, b| {
        b.centrality
            .partial_cmp(&a.centrality)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.total_messages.cmp(&a.total_messages))
            .then_with(|| a.name.cmp(&b.name))
    });
    let most_connected = nodes.first().map(|n| n.name.clone())?;

    let mut edges: Vec<NetworkEdge> = graph
        .edge_indices()
        .filter_map(|edge| {
            let (a_idx, b_idx) = graph.edge_endpoints(edge)?;
            let (a_to_b, b_to_a) = graph[edge];
            Some(NetworkEdge {
                a: graph[a_idx].clone(),
                b: graph[b_idx].clone(),
                weight: a_to_b + b_to_a,
                a_to_b,
                b_to_a,
            })
        })
        .collect();
    edges.sort_by(|x, y| {
        y.weight
            .cmp(&x.weight)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });

    Some(NetworkGraph {
        nodes,
        edges,
        density,
        most_connected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::PersonAccumulator;

    fn acc_with_replies(pairs: &[(&str, &str, u32)], people: &[&str]) -> AccumulatorSet {
        let mut acc = AccumulatorSet::default();
        for &name in people {
            let mut p = PersonAccumulator::default();
            p.name = name.to_string();
            p.total_messages = 10;
            acc.total_counted += 10;
            acc.persons.insert(name.to_string(), p);
        }
        for &(responder, sender, count) in pairs {
            acc.reply_pairs
                .insert((responder.to_string(), sender.to_string()), count);
        }
        acc
    }

    #[test]
    fn two_person_conversations_have_no_network() {
        let acc = acc_with_replies(&[("A", "B", 5), ("B", "A", 5)], &["A", "B"]);
        assert!(derive(&acc).is_none());
    }

    #[test]
    fn fully_connected_group_has_density_one() {
        let acc = acc_with_replies(
            &[
                ("A", "B", 2),
                ("B", "A", 3),
                ("A", "C", 1),
                ("C", "A", 1),
                ("B", "C", 4),
                ("C", "B", 2),
            ],
            &["A", "B", "C"],
        );
        let graph = derive(&acc).unwrap();
        assert_eq!(graph.edges.len(), 3);
        assert!((graph.density - 1.0).abs() < 1e-9);
        assert!(graph.nodes.iter().all(|n| (n.centrality - 1.0).abs() < 1e-9));
    }

    #[test]
    fn directional_counts_fold_onto_one_edge() {
        let acc = acc_with_replies(
            &[("A", "B", 2), ("B", "A", 3)],
            &["A", "B", "C"],
        );
        let graph = derive(&acc).unwrap();
        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.weight, 5);
        assert_eq!(edge.a_to_b + edge.b_to_a, 5);
        assert!((graph.density - (1.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn most_connected_is_the_highest_centrality_node() {
        let acc = acc_with_replies(
            &[("A", "B", 2), ("B", "A", 1), ("C", "B", 4), ("B", "C", 1)],
            &["A", "B", "C"],
        );
        let graph = derive(&acc).unwrap();
        assert_eq!(graph.most_connected, "B");
    }
}
