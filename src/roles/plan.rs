//! Execution plans: ordered stages of roles.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::RoleGraphError;
use crate::roles::builder::RoleGraph;

/// How the roles inside a stage relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// All roles work at once; the stage lasts as long as the slowest role
    #[default]
    Parallel,
    /// Roles run one after another in listed order
    Sequential,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Parallel => write!(f, "parallel"),
            StageKind::Sequential => write!(f, "sequential"),
        }
    }
}

impl std::str::FromStr for StageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(StageKind::Parallel),
            "sequential" => Ok(StageKind::Sequential),
            _ => anyhow::bail!(
                "Invalid stage kind '{}'. Valid values: parallel, sequential",
                s
            ),
        }
    }
}

/// One group of roles. A stage starts when the previous stage has finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub kind: StageKind,
    pub roles: Vec<String>,
}

impl Stage {
    pub fn parallel(roles: &[&str]) -> Self {
        Self {
            kind: StageKind::Parallel,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn sequential(roles: &[&str]) -> Self {
        Self {
            kind: StageKind::Sequential,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }
}

/// Ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyPlan {
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl DependencyPlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// The common "these in parallel, then that chain" shape.
    pub fn two_stage(parallel: &[&str], sequential: &[&str]) -> Self {
        let mut stages = Vec::new();
        if !parallel.is_empty() {
            stages.push(Stage::parallel(parallel));
        }
        if !sequential.is_empty() {
            stages.push(Stage::sequential(sequential));
        }
        Self { stages }
    }

    /// One parallel stage per dependency wave.
    pub fn from_graph(graph: &RoleGraph) -> Self {
        let stages = graph
            .compute_waves()
            .into_iter()
            .map(|roles| Stage {
                kind: StageKind::Parallel,
                roles,
            })
            .collect();
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(|s| s.roles.is_empty())
    }

    /// Every role id mentioned, in plan order, without repeats.
    pub fn role_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stages
            .iter()
            .flat_map(|s| s.roles.iter())
            .filter(|r| seen.insert(r.as_str()))
            .cloned()
            .collect()
    }

    /// Fit the plan to a concrete set of roles.
    ///
    /// - A role listed twice keeps its first position.
    /// - Roles in `roles` the plan does not mention join the first parallel
    ///   stage, or a new leading parallel stage if there is none.
    /// - Empty stages are dropped.
    pub fn normalized(&self, roles: &[String]) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stages: Vec<Stage> = self
            .stages
            .iter()
            .map(|stage| Stage {
                kind: stage.kind,
                roles: stage
                    .roles
                    .iter()
                    .filter(|r| seen.insert(r.as_str()))
                    .cloned()
                    .collect(),
            })
            .filter(|stage| !stage.roles.is_empty())
            .collect();

        let unplanned: Vec<String> = roles
            .iter()
            .filter(|r| !seen.contains(r.as_str()))
            .cloned()
            .collect();

        if !unplanned.is_empty() {
            match stages.iter_mut().find(|s| s.kind == StageKind::Parallel) {
                Some(stage) => stage.roles.extend(unplanned),
                None => stages.insert(
                    0,
                    Stage {
                        kind: StageKind::Parallel,
                        roles: unplanned,
                    },
                ),
            }
        }

        Self { stages }
    }

    /// Check every planned role against a known set.
    pub fn validate_against(&self, known: &[String]) -> Result<(), RoleGraphError> {
        for (i, stage) in self.stages.iter().enumerate() {
            for role in &stage.roles {
                if !known.contains(role) {
                    return Err(RoleGraphError::UnknownStageRole {
                        stage: i,
                        role: role.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
