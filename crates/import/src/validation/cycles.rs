//! Cycle detection over child → parent links.
//!
//! Every node has at most one parent, so walking "up" from a node is a
//! simple chain. A chain either reaches a root, reaches a node already
//! explored by an earlier walk, or revisits a node on the current chain,
//! which closes a cycle.

use std::collections::{HashMap, HashSet};

/// Finds every distinct cycle reachable from `starts`.
///
/// `links` maps a child identifier to its parent identifier. Each returned
/// path lists the cycle members in walk order and repeats the first member
/// at the end (`A -> B -> C -> A`). A cycle is reported once no matter how
/// many starting points lead into it.
pub fn find_cycles<'a>(
    starts: impl IntoIterator<Item = &'a str>,
    links: &HashMap<&'a str, &'a str>,
) -> Vec<Vec<&'a str>> {
    let mut explored: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<Vec<&str>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in starts {
        if explored.contains(start) {
            continue;
        }

        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashMap<&str, usize> = HashMap::new();
        let mut current = Some(start);

        while let Some(node) = current {
            if let Some(&position) = on_path.get(node) {
                let mut cycle = path[position..].to_vec();

                let mut members = cycle.clone();
                members.sort_unstable();
                if reported.insert(members) {
                    cycle.push(node);
                    cycles.push(cycle);
                }
                break;
            }
            if explored.contains(node) {
                break;
            }

            on_path.insert(node, path.len());
            path.push(node);
            current = links.get(node).copied();
        }

        explored.extend(path);
    }

    cycles
}

/// Renders a cycle path as `A -> B -> A`.
pub fn format_cycle(cycle: &[&str]) -> String {
    cycle.join(" -> ")
}
