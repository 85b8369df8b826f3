//! Role graph builder.
//!
//! Takes a list of roles with their `depends_on` edges and produces a validated
//! directed acyclic graph that the planner can split into waves.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::errors::RoleGraphError;

/// Index into the role list.
pub type RoleIndex = usize;

/// A role definition as configured for a project or team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Role id (e.g. "fe")
    pub id: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Presentation color, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Roles that must finish before this one starts
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl RoleSpec {
    pub fn new(id: &str, depends_on: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_uppercase(),
            color: None,
            depends_on,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Label, or the id when no label is set.
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// A directed acyclic graph of roles.
#[derive(Debug)]
pub struct RoleGraph {
    roles: Vec<RoleSpec>,
    /// index -> roles that wait on it
    forward_edges: Vec<Vec<RoleIndex>>,
    /// index -> roles it waits on
    reverse_edges: Vec<Vec<RoleIndex>>,
}

impl RoleGraph {
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn get_role(&self, index: RoleIndex) -> Option<&RoleSpec> {
        self.roles.get(index)
    }

    /// Roles that wait on the given role.
    pub fn dependents(&self, index: RoleIndex) -> &[RoleIndex] {
        self.forward_edges.get(index).map_or(&[], |v| v.as_slice())
    }

    /// Roles the given role waits on.
    pub fn dependencies(&self, index: RoleIndex) -> &[RoleIndex] {
        self.reverse_edges.get(index).map_or(&[], |v| v.as_slice())
    }

    pub fn dependencies_satisfied(&self, index: RoleIndex, completed: &HashSet<RoleIndex>) -> bool {
        self.dependencies(index)
            .iter()
            .all(|dep| completed.contains(dep))
    }

    /// Group roles into waves: every role in a wave only waits on roles in
    /// earlier waves. Order inside a wave follows declaration order.
    pub fn compute_waves(&self) -> Vec<Vec<String>> {
        let mut waves = Vec::new();
        let mut completed: HashSet<RoleIndex> = HashSet::new();

        loop {
            let ready: Vec<RoleIndex> = (0..self.roles.len())
                .filter(|i| !completed.contains(i) && self.dependencies_satisfied(*i, &completed))
                .collect();

            if ready.is_empty() {
                break;
            }

            completed.extend(ready.iter().copied());
            waves.push(ready.iter().map(|&i| self.roles[i].id.clone()).collect());
        }

        waves
    }
}

/// Builder for role graphs.
pub struct RoleGraphBuilder {
    roles: Vec<RoleSpec>,
}

impl RoleGraphBuilder {
    pub fn new(roles: Vec<RoleSpec>) -> Self {
        Self { roles }
    }

    /// Build the graph, rejecting duplicate ids, unknown dependencies and cycles.
    pub fn build(self) -> Result<RoleGraph, RoleGraphError> {
        let mut index_map = HashMap::new();
        for (i, role) in self.roles.iter().enumerate() {
            if index_map.insert(role.id.clone(), i).is_some() {
                return Err(RoleGraphError::DuplicateRole {
                    role: role.id.clone(),
                });
            }
        }

        let mut forward_edges: Vec<Vec<RoleIndex>> = vec![Vec::new(); self.roles.len()];
        let mut reverse_edges: Vec<Vec<RoleIndex>> = vec![Vec::new(); self.roles.len()];

        for (to_idx, role) in self.roles.iter().enumerate() {
            for dep in &role.depends_on {
                let from_idx =
                    *index_map
                        .get(dep)
                        .ok_or_else(|| RoleGraphError::UnknownDependency {
                            role: role.id.clone(),
                            dependency: dep.clone(),
                        })?;

                if reverse_edges[to_idx].contains(&from_idx) {
                    continue;
                }
                forward_edges[from_idx].push(to_idx);
                reverse_edges[to_idx].push(from_idx);
            }
        }

        let graph = RoleGraph {
            roles: self.roles,
            forward_edges,
            reverse_edges,
        };

        Self::validate_no_cycles(&graph)?;

        Ok(graph)
    }

    /// Kahn's algorithm.
    fn validate_no_cycles(graph: &RoleGraph) -> Result<(), RoleGraphError> {
        let mut in_degree: Vec<usize> = graph.reverse_edges.iter().map(|deps| deps.len()).collect();

        let mut queue: Vec<RoleIndex> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut processed = 0;

        while let Some(node) = queue.pop() {
            processed += 1;

            for &dependent in graph.dependents(node) {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if processed != graph.len() {
            let roles = in_degree
                .iter()
                .enumerate()
                .filter(|&(_, deg)| *deg > 0)
                .filter_map(|(i, _)| graph.get_role(i).map(|r| r.id.clone()))
                .collect();

            return Err(RoleGraphError::Cycle { roles });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str, deps: Vec<&str>) -> RoleSpec {
        RoleSpec::new(id, deps.into_iter().map(String::from).collect())
    }

    #[test]
    fn test_build_fe_be_qa_graph() {
        let roles = vec![
            role("fe", vec![]),
            role("be", vec![]),
            role("qa", vec!["fe", "be"]),
        ];

        let graph = RoleGraphBuilder::new(roles).build().unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.dependencies(2), &[0, 1]);
        assert_eq!(graph.dependents(0), &[2]);
        assert!(graph.dependents(2).is_empty());
    }

    #[test]
    fn test_compute_waves() {
        let roles = vec![
            role("design", vec![]),
            role("fe", vec!["design"]),
            role("be", vec![]),
            role("qa", vec!["fe", "be"]),
        ];

        let graph = RoleGraphBuilder::new(roles).build().unwrap();
        let waves = graph.compute_waves();

        assert_eq!(waves.len(), 3);
        assert_eq!(waves[0], vec!["design", "be"]);
        assert_eq!(waves[1], vec!["fe"]);
        assert_eq!(waves[2], vec!["qa"]);
    }

    #[test]
    fn test_cycle_detection() {
        let roles = vec![
            role("fe", vec!["qa"]),
            role("be", vec!["fe"]),
            role("qa", vec!["be"]),
        ];

        let result = RoleGraphBuilder::new(roles).build();
        assert!(matches!(result, Err(RoleGraphError::Cycle { .. })));
        assert!(result.unwrap_err().to_string().contains("Cycle"));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let result = RoleGraphBuilder::new(vec![role("fe", vec!["fe"])]).build();
        assert!(matches!(result, Err(RoleGraphError::Cycle { .. })));
    }

    #[test]
    fn test_unknown_dependency() {
        let result = RoleGraphBuilder::new(vec![role("qa", vec!["nonexistent"])]).build();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("nonexistent"));
    }

    #[test]
    fn test_duplicate_role() {
        let result = RoleGraphBuilder::new(vec![role("fe", vec![]), role("fe", vec![])]).build();
        assert!(matches!(result, Err(RoleGraphError::DuplicateRole { .. })));
    }

    #[test]
    fn test_repeated_dependency_counted_once() {
        let graph = RoleGraphBuilder::new(vec![role("fe", vec![]), role("qa", vec!["fe", "fe"])])
            .build()
            .unwrap();
        assert_eq!(graph.dependencies(1), &[0]);
        assert_eq!(graph.compute_waves().len(), 2);
    }

    #[test]
    fn test_empty_graph() {
        let graph = RoleGraphBuilder::new(vec![]).build().unwrap();
        assert!(graph.is_empty());
        assert!(graph.compute_waves().is_empty());
    }

    #[test]
    fn test_role_spec_deserialize_defaults() {
        let spec: RoleSpec = serde_json::from_str(r#"{"id": "qa"}"#).unwrap();
        assert!(spec.depends_on.is_empty());
        assert_eq!(spec.display_name(), "qa");
        assert_eq!(spec.with_label("Quality").display_name(), "Quality");
    }
}
