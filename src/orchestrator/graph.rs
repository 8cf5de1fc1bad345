//! Dependency graph between monitors: cycle detection and wave layering.
//!
//! The graph maps each monitor name to the names it depends on. Dependencies
//! on names that are not in the graph are left out of the ordering; such a
//! monitor is dependency-skipped every cycle.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};

pub type DependencyGraph = BTreeMap<String, Vec<String>>;

/// Detect circular dependencies using DFS
pub fn detect_cycles(graph: &DependencyGraph) -> Result<()> {
    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for name in graph.keys() {
        if !visited.contains(name.as_str()) {
            if let Some(cycle) = dfs_detect_cycle(graph, name, &mut visited, &mut rec_stack, &mut path)
            {
                bail!("Circular dependency detected: {}", cycle.join(" -> "));
            }
        }
    }

    Ok(())
}

fn dfs_detect_cycle(
    graph: &DependencyGraph,
    name: &str,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    visited.insert(name.to_string());
    rec_stack.insert(name.to_string());
    path.push(name.to_string());

    for dep in graph.get(name).into_iter().flatten() {
        if !graph.contains_key(dep) {
            continue;
        }
        if !visited.contains(dep) {
            if let Some(cycle) = dfs_detect_cycle(graph, dep, visited, rec_stack, path) {
                return Some(cycle);
            }
        } else if rec_stack.contains(dep) {
            let mut cycle = vec![dep.clone()];
            for p in path.iter().rev() {
                cycle.push(p.clone());
                if p == dep {
                    break;
                }
            }
            cycle.reverse();
            return Some(cycle);
        }
    }

    path.pop();
    rec_stack.remove(name);
    None
}

/// Split the graph into waves: every monitor's known dependencies sit in
/// strictly earlier waves. Names within a wave are sorted.
pub fn dependency_waves(graph: &DependencyGraph) -> Result<Vec<Vec<String>>> {
    let mut in_degree: BTreeMap<&str, usize> = graph.keys().map(|n| (n.as_str(), 0)).collect();
    let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, deps) in graph {
        let known: BTreeSet<&str> = deps
            .iter()
            .map(String::as_str)
            .filter(|d| graph.contains_key(*d))
            .collect();
        for dep in known {
            *in_degree.entry(name.as_str()).or_insert(0) += 1;
            dependents.entry(dep).or_default().push(name.as_str());
        }
    }

    let mut current: Vec<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(name, _)| *name)
        .collect();
    let mut waves = Vec::new();
    let mut placed = 0;

    while !current.is_empty() {
        placed += current.len();
        let mut next = Vec::new();
        for name in &current {
            for child in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(*child);
                    }
                }
            }
        }
        next.sort_unstable();
        waves.push(current.iter().map(|n| n.to_string()).collect());
        current = next;
    }

    if placed != graph.len() {
        bail!("Cycle detected in dependency graph");
    }

    Ok(waves)
}

/// `(monitor, dependency)` pairs naming monitors that are not in the graph.
pub fn unknown_dependencies(graph: &DependencyGraph) -> Vec<(String, String)> {
    graph
        .iter()
        .flat_map(|(name, deps)| {
            deps.iter()
                .filter(move |d| !graph.contains_key(*d))
                .map(move |d| (name.clone(), d.clone()))
        })
        .collect()
}
