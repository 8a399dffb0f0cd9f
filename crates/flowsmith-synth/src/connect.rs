//! Connection building: ordered node list in, connection map out.
//!
//! The default topology is a chain.  A conditional node sends its true
//! output to the next node and its false output to the one after, and the
//! chain resumes from the false-branch node.  When the list ends in a
//! respond node, every node left without an outgoing edge is wired into it
//! so the caller always gets an answer.

use std::collections::{BTreeMap, HashSet};

use tracing::error;

use crate::catalog::NodeKind;
use crate::document::{ConnectionTarget, NodeConnections};
use crate::selector::NodeInstance;

/// Outgoing edges keyed by source node name.
pub type ConnectionMap = BTreeMap<String, NodeConnections>;

/// `(source index, output branch, target index)`.
type Edge = (usize, usize, usize);

/// Wire `nodes` into a graph.
///
/// Lists with fewer than two nodes get an empty map.
pub fn connect(nodes: &[NodeInstance]) -> ConnectionMap {
    if nodes.len() < 2 {
        return ConnectionMap::new();
    }

    let edges = branching_edges(nodes);
    match verify(nodes, &edges) {
        Ok(()) => to_map(nodes, &edges),
        Err(problem) => {
            // Unreachable for lists built by the selector.
            error!(%problem, "branching topology rejected, falling back to a chain");
            to_map(nodes, &chain_edges(nodes.len()))
        }
    }
}

fn branching_edges(nodes: &[NodeInstance]) -> Vec<Edge> {
    let n = nodes.len();
    let mut edges = Vec::with_capacity(n + 2);

    let mut i = 0;
    while i + 1 < n {
        if nodes[i].kind.is_conditional() && i + 2 < n {
            edges.push((i, 0, i + 1));
            edges.push((i, 1, i + 2));
            i += 2;
        } else {
            edges.push((i, 0, i + 1));
            i += 1;
        }
    }

    let last = n - 1;
    if nodes[last].kind == NodeKind::RespondToWebhook {
        let has_outgoing: HashSet<usize> = edges.iter().map(|(from, _, _)| *from).collect();
        for from in 0..last {
            if !has_outgoing.contains(&from) {
                edges.push((from, 0, last));
            }
        }
    }

    edges
}

fn chain_edges(n: usize) -> Vec<Edge> {
    (0..n.saturating_sub(1)).map(|i| (i, 0, i + 1)).collect()
}

/// The builder's own checks: unique names, no self-loops, and an incoming
/// edge for every node after the first.
fn verify(nodes: &[NodeInstance], edges: &[Edge]) -> Result<(), String> {
    let mut names = HashSet::new();
    for node in nodes {
        if !names.insert(node.name.as_str()) {
            return Err(format!("duplicate node name `{}`", node.name));
        }
    }

    let mut reached = HashSet::new();
    for &(from, _, to) in edges {
        if from >= nodes.len() || to >= nodes.len() {
            return Err(format!("edge {from} -> {to} is out of range"));
        }
        if from == to {
            return Err(format!("self-loop on `{}`", nodes[from].name));
        }
        reached.insert(to);
    }

    if let Some(orphan) = (1..nodes.len()).find(|i| !reached.contains(i)) {
        return Err(format!("node `{}` has no incoming edge", nodes[orphan].name));
    }
    Ok(())
}

fn to_map(nodes: &[NodeInstance], edges: &[Edge]) -> ConnectionMap {
    let mut map = ConnectionMap::new();
    for &(from, output, to) in edges {
        let outs = map.entry(nodes[from].name.clone()).or_default();
        if outs.main.len() <= output {
            outs.main.resize_with(output + 1, Vec::new);
        }
        outs.main[output].push(ConnectionTarget::main(nodes[to].name.clone()));
    }
    map
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
