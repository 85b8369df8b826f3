//! Project export format and JSON loading.
//!
//! A project file is a read-only export of one project from the dashboard's
//! backend: the role efforts, the team roster, allocation records and progress
//! history. This module provides:
//! - `ProjectFile`, the JSON format
//! - `StartPolicy`, the choice of the date a projection starts from
//! - Assembly of a `ProjectionInput` from a project and resolved capacities

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

use crate::burndown::ProgressSnapshot;
use crate::capacity::{AllocationRecord, AllocationTable, TeamMember};
use crate::effort::RoleEffort;
use crate::errors::RoleGraphError;
use crate::projector::ProjectionInput;
use crate::roles::{DependencyPlan, RoleGraphBuilder, RoleSpec};

/// Which date a projection counts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StartPolicy {
    /// The project's explicit start date, else its creation date, else today
    #[default]
    ProjectStart,
    /// The project's creation date, else today
    Created,
    /// Today
    Today,
    /// A fixed date
    Date(NaiveDate),
}

impl StartPolicy {
    pub fn resolve(&self, project: &ProjectFile, today: NaiveDate) -> NaiveDate {
        match self {
            StartPolicy::ProjectStart => project
                .start_date
                .or(project.created_at)
                .unwrap_or(today),
            StartPolicy::Created => project.created_at.unwrap_or(today),
            StartPolicy::Today => today,
            StartPolicy::Date(date) => *date,
        }
    }
}

impl std::fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartPolicy::ProjectStart => write!(f, "start"),
            StartPolicy::Created => write!(f, "created"),
            StartPolicy::Today => write!(f, "today"),
            StartPolicy::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl std::str::FromStr for StartPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" | "project_start" => Ok(StartPolicy::ProjectStart),
            "created" => Ok(StartPolicy::Created),
            "today" => Ok(StartPolicy::Today),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(StartPolicy::Date)
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid start '{}'. Valid values: start, created, today or a YYYY-MM-DD date",
                        s
                    )
                }),
        }
    }
}

impl TryFrom<String> for StartPolicy {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StartPolicy> for String {
    fn from(policy: StartPolicy) -> Self {
        policy.to_string()
    }
}

/// One exported project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<NaiveDate>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub target_delivery_date: Option<NaiveDate>,
    /// Project-specific roles; empty means the workspace roles apply
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
    #[serde(default)]
    pub efforts: Vec<RoleEffort>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub allocations: Vec<AllocationRecord>,
    /// Explicit stage plan; wins over `roles[].depends_on`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<DependencyPlan>,
    #[serde(default)]
    pub history: Vec<ProgressSnapshot>,
}

impl ProjectFile {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: None,
            start_date: None,
            target_delivery_date: None,
            roles: Vec::new(),
            efforts: Vec::new(),
            team: Vec::new(),
            allocations: Vec::new(),
            plan: None,
            history: Vec::new(),
        }
    }

    /// Load a project from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read project file: {}", path.display()))?;

        let project: ProjectFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse project JSON: {}", path.display()))?;

        Ok(project)
    }

    /// Save the project to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize project to JSON")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write project file: {}", path.display()))?;

        Ok(())
    }

    pub fn allocation_table(&self) -> AllocationTable {
        AllocationTable::from_records(
            self.allocations
                .iter()
                .filter(|record| record.project_id == self.id),
        )
    }

    /// Role ids with an effort record, in file order.
    pub fn effort_roles(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for effort in &self.efforts {
            if !ids.contains(&effort.role) {
                ids.push(effort.role.clone());
            }
        }
        ids
    }

    /// The stage plan for this project.
    ///
    /// An explicit `plan` wins, then the project's own role graph, then
    /// `fallback`.
    pub fn dependency_plan(&self, fallback: &DependencyPlan) -> Result<DependencyPlan, RoleGraphError> {
        if let Some(plan) = &self.plan {
            return Ok(plan.clone());
        }
        if !self.roles.is_empty() {
            let graph = RoleGraphBuilder::new(self.roles.clone()).build()?;
            return Ok(DependencyPlan::from_graph(&graph));
        }
        Ok(fallback.clone())
    }

    /// Assemble the projector input from resolved per-role FTE.
    pub fn projection_input(
        &self,
        capacities: &HashMap<String, f64>,
        plan: DependencyPlan,
        start_date: NaiveDate,
    ) -> ProjectionInput {
        let mut input = ProjectionInput::new(start_date)
            .with_plan(plan)
            .with_target(self.target_delivery_date);

        for effort in &self.efforts {
            let fte = capacities.get(&effort.role).copied().unwrap_or(0.0);
            input = input.with_role(&effort.role, effort.remaining_mandays(), fte);
        }
        input
    }

    /// Warnings for data the projector will clamp or ignore.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for effort in &self.efforts {
            warnings.extend(effort.validate());
        }

        let effort_roles = self.effort_roles();
        for member in &self.team {
            if !effort_roles.contains(&member.role) {
                warnings.push(format!(
                    "Team member '{}' has role '{}' with no effort estimate",
                    member.name, member.role
                ));
            }
            if !member.fte.is_finite() || member.fte < 0.0 {
                warnings.push(format!(
                    "Team member '{}' has invalid FTE {}",
                    member.name, member.fte
                ));
            }
        }

        let foreign = self
            .allocations
            .iter()
            .filter(|record| record.project_id != self.id)
            .count();
        if foreign > 0 {
            warnings.push(format!(
                "{} allocation record(s) belong to another project and are ignored",
                foreign
            ));
        }

        if let (Some(start), Some(target)) = (self.start_date, self.target_delivery_date)
            && target < start
        {
            warnings.push(format!(
                "Target delivery date {} is before the start date {}",
                target, start
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Stage;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> ProjectFile {
        let mut project = ProjectFile::new("Checkout");
        project.created_at = Some(date("2026-01-02"));
        project.start_date = Some(date("2026-01-05"));
        project.target_delivery_date = Some(date("2026-01-30"));
        project.efforts = vec![
            RoleEffort::new("fe", 10.0, 0.0),
            RoleEffort::new("be", 6.0, 0.0),
            RoleEffort::new("qa", 4.0, 0.0),
        ];
        project.team = vec![
            TeamMember::new("Ana", "fe", 1.0),
            TeamMember::new("Cy", "be", 1.0),
        ];
        project
    }

    #[test]
    fn test_start_policy_resolve() {
        let project = sample();
        let today = date("2026-03-01");
        assert_eq!(StartPolicy::ProjectStart.resolve(&project, today), date("2026-01-05"));
        assert_eq!(StartPolicy::Created.resolve(&project, today), date("2026-01-02"));
        assert_eq!(StartPolicy::Today.resolve(&project, today), today);
        assert_eq!(
            StartPolicy::Date(date("2026-02-02")).resolve(&project, today),
            date("2026-02-02")
        );
    }

    #[test]
    fn test_start_policy_fallbacks() {
        let project = ProjectFile::new("Empty");
        let today = date("2026-03-01");
        assert_eq!(StartPolicy::ProjectStart.resolve(&project, today), today);
        assert_eq!(StartPolicy::Created.resolve(&project, today), today);
    }

    #[test]
    fn test_start_policy_parse() {
        assert_eq!("start".parse::<StartPolicy>().unwrap(), StartPolicy::ProjectStart);
        assert_eq!("TODAY".parse::<StartPolicy>().unwrap(), StartPolicy::Today);
        assert_eq!(
            "2026-04-01".parse::<StartPolicy>().unwrap(),
            StartPolicy::Date(date("2026-04-01"))
        );
        let err = "soon".parse::<StartPolicy>().unwrap_err();
        assert!(err.to_string().contains("Invalid start"));
    }

    #[test]
    fn test_start_policy_round_trips_through_string() {
        for policy in [
            StartPolicy::ProjectStart,
            StartPolicy::Created,
            StartPolicy::Today,
            StartPolicy::Date(date("2026-04-01")),
        ] {
            let parsed: StartPolicy = policy.to_string().parse().unwrap();
            assert_eq!(parsed, policy);
        }
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkout.json");
        let project = sample();
        project.save(&path).unwrap();

        let loaded = ProjectFile::load(&path).unwrap();
        assert_eq!(loaded.id, project.id);
        assert_eq!(loaded.efforts.len(), 3);
        assert_eq!(loaded.team[0].name, "Ana");
    }

    #[test]
    fn test_load_minimal_json() {
        let json = r#"{
            "id": "6f1c1f0e-6b43-4a4e-9d61-0c1c6d1f9a11",
            "name": "Minimal",
            "efforts": [{"role": "fe", "total_mandays": 3}]
        }"#;
        let project: ProjectFile = serde_json::from_str(json).unwrap();
        assert_eq!(project.name, "Minimal");
        assert!(project.team.is_empty());
        assert!(project.plan.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ProjectFile::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read project file"));
    }

    #[test]
    fn test_dependency_plan_precedence() {
        let fallback = DependencyPlan::two_stage(&["fe", "be", "qa"], &[]);
        let mut project = sample();
        assert_eq!(project.dependency_plan(&fallback).unwrap(), fallback);

        project.roles = vec![
            RoleSpec::new("fe", vec![]),
            RoleSpec::new("qa", vec!["fe".to_string()]),
        ];
        let from_graph = project.dependency_plan(&fallback).unwrap();
        assert_eq!(from_graph.stages, vec![Stage::parallel(&["fe"]), Stage::parallel(&["qa"])]);

        let explicit = DependencyPlan::two_stage(&["fe", "be"], &["qa"]);
        project.plan = Some(explicit.clone());
        assert_eq!(project.dependency_plan(&fallback).unwrap(), explicit);
    }

    #[test]
    fn test_dependency_plan_rejects_cycle() {
        let mut project = sample();
        project.roles = vec![
            RoleSpec::new("fe", vec!["qa".to_string()]),
            RoleSpec::new("qa", vec!["fe".to_string()]),
        ];
        assert!(project.dependency_plan(&DependencyPlan::default()).is_err());
    }

    #[test]
    fn test_projection_input() {
        let project = sample();
        let capacities: HashMap<String, f64> =
            [("fe".to_string(), 1.0), ("be".to_string(), 0.5)].into_iter().collect();
        let input = project.projection_input(
            &capacities,
            DependencyPlan::default(),
            date("2026-01-05"),
        );

        assert_eq!(input.roles.len(), 3);
        assert_eq!(input.roles[1].available_fte, 0.5);
        // No capacity resolved for qa
        assert_eq!(input.roles[2].available_fte, 0.0);
        assert_eq!(input.target_delivery_date, Some(date("2026-01-30")));
    }

    #[test]
    fn test_allocation_table_filters_other_projects() {
        let mut project = sample();
        let member = project.team[0].id;
        project.allocations = vec![
            AllocationRecord {
                team_member_id: member,
                project_id: project.id,
                date: date("2026-01-05"),
                fte: 0.5,
            },
            AllocationRecord {
                team_member_id: member,
                project_id: Uuid::new_v4(),
                date: date("2026-01-05"),
                fte: 0.5,
            },
        ];
        assert_eq!(project.allocation_table().len(), 1);
        assert!(project.validate().iter().any(|w| w.contains("another project")));
    }

    #[test]
    fn test_validate_warnings() {
        let mut project = sample();
        assert!(project.validate().is_empty());

        project.team.push(TeamMember::new("Dee", "ops", 1.0));
        project.efforts.push(RoleEffort::new("ux", 2.0, 120.0));
        project.target_delivery_date = Some(date("2026-01-01"));

        let warnings = project.validate();
        assert!(warnings.iter().any(|w| w.contains("'ops'")));
        assert!(warnings.iter().any(|w| w.contains("percent_done")));
        assert!(warnings.iter().any(|w| w.contains("before the start date")));
    }
}
