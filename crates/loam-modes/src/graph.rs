//! Dependency-chain validation over the descriptor table.

use crate::descriptor::ModeDescriptor;
use crate::ModeError;
use std::collections::{HashMap, HashSet};

/// Advisory view over declared dependency edges. Never mutates the table.
pub struct DependencyGraph<'a> {
    descriptors: &'a HashMap<String, ModeDescriptor>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(descriptors: &'a HashMap<String, ModeDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Validate the full dependency chain reachable from `id`.
    ///
    /// Succeeds only if `id` is registered, every direct and transitive
    /// dependency is registered and enabled, and no cycle is reachable.
    /// Missing and disabled dependencies are all collected before failing,
    /// not just the first; cycles are reported as the exact identifier
    /// sequence that closes the loop.
    pub fn validate(&self, id: &str) -> Result<(), ModeError> {
        if !self.descriptors.contains_key(id) {
            return Err(ModeError::Configuration(format!(
                "mode '{}' is not registered",
                id
            )));
        }

        let mut missing = Vec::new();
        self.collect_missing(id, &mut HashSet::new(), &mut missing);
        if !missing.is_empty() {
            missing.sort();
            missing.dedup();
            return Err(ModeError::MissingDependency {
                id: id.to_string(),
                missing,
            });
        }

        let mut path = Vec::new();
        if let Some(cycle) = self.find_cycle(id, &mut path, &HashSet::new()) {
            return Err(ModeError::CircularDependency { cycle });
        }
        Ok(())
    }

    /// Every mode identifier reachable from `id`, in depth-first order,
    /// excluding `id` itself. Unregistered dependencies are included.
    pub fn chain(&self, id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        seen.insert(id.to_string());
        self.walk_chain(id, &mut seen, &mut out);
        out
    }

    fn walk_chain(&self, node: &str, seen: &mut HashSet<String>, out: &mut Vec<String>) {
        if let Some(desc) = self.descriptors.get(node) {
            for dep in &desc.config.dependencies {
                if seen.insert(dep.clone()) {
                    out.push(dep.clone());
                    self.walk_chain(dep, seen, out);
                }
            }
        }
    }

    fn collect_missing(&self, node: &str, seen: &mut HashSet<String>, missing: &mut Vec<String>) {
        if !seen.insert(node.to_string()) {
            return;
        }
        let Some(desc) = self.descriptors.get(node) else {
            return;
        };
        for dep in &desc.config.dependencies {
            match self.descriptors.get(dep) {
                None => missing.push(dep.clone()),
                Some(d) => {
                    if !d.config.enabled {
                        missing.push(dep.clone());
                    }
                    self.collect_missing(dep, seen, missing);
                }
            }
        }
    }

    /// Depth-first cycle search. `path` is the stack of identifiers on the
    /// current descent and reconstructs the reported cycle; `visited` is
    /// copied per branch so revisiting a node through an unrelated sibling
    /// branch is not mistaken for a cycle — only a node still on the current
    /// path counts.
    fn find_cycle(
        &self,
        node: &str,
        path: &mut Vec<String>,
        visited: &HashSet<String>,
    ) -> Option<Vec<String>> {
        if let Some(pos) = path.iter().position(|p| p == node) {
            let mut cycle: Vec<String> = path[pos..].to_vec();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        if visited.contains(node) {
            return None;
        }

        let mut branch_visited = visited.clone();
        branch_visited.insert(node.to_string());
        path.push(node.to_string());

        if let Some(desc) = self.descriptors.get(node) {
            for dep in &desc.config.dependencies {
                if let Some(cycle) = self.find_cycle(dep, path, &branch_visited) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        None
    }
}
