//! End-to-end forecast of one project.
//!
//! Wires the pieces together the way the CLI needs them:
//! start policy → capacity resolution → stage plan → projector → chart.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::burndown::BurndownChart;
use crate::burndown_config::{BurndownConfig, BurndownToml};
use crate::calendar::HolidayCalendar;
use crate::capacity::{CapacityMode, CapacityResolver};
use crate::project::{ProjectFile, StartPolicy};
use crate::projector::{DeliveryProjection, DeliveryProjector, DeliveryStatus};
use crate::roles::DependencyPlan;

/// Effective settings for a forecast run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSettings {
    pub today: NaiveDate,
    pub start: StartPolicy,
    pub capacity_mode: CapacityMode,
    pub default_fte: f64,
    pub allocation_window: u32,
    pub default_allocation_fte: Option<f64>,
}

impl ForecastSettings {
    /// Defaults from the file, with environment and CLI overrides applied.
    pub fn from_config(config: &BurndownConfig, today: NaiveDate) -> Self {
        Self {
            today,
            start: config.start_policy(),
            capacity_mode: config.capacity_mode(),
            default_fte: config.default_fte(),
            allocation_window: config.toml.defaults.allocation_window,
            default_allocation_fte: config.toml.defaults.default_allocation_fte,
        }
    }
}

/// Projection of one project plus the inputs that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub project_id: Uuid,
    pub project_name: String,
    pub start_policy: String,
    pub capacity_mode: CapacityMode,
    /// Resolved FTE per role before any default applies
    pub capacities: BTreeMap<String, f64>,
    pub status: DeliveryStatus,
    pub projection: DeliveryProjection,
    pub warnings: Vec<String>,
}

/// Runs forecasts against one workspace configuration.
#[derive(Debug, Clone)]
pub struct Forecaster {
    toml: BurndownToml,
    settings: ForecastSettings,
    calendar: HolidayCalendar,
    workspace_plan: DependencyPlan,
}

impl Forecaster {
    pub fn new(config: &BurndownConfig, today: NaiveDate) -> Result<Self> {
        Self::from_parts(
            config.toml.clone(),
            ForecastSettings::from_config(config, today),
        )
    }

    pub fn from_parts(toml: BurndownToml, settings: ForecastSettings) -> Result<Self> {
        let calendar = toml
            .holiday_calendar()
            .context("Invalid [calendar] section")?;
        let workspace_plan = toml
            .dependency_plan()
            .context("Invalid role definitions in burndown.toml")?;

        Ok(Self {
            toml,
            settings,
            calendar,
            workspace_plan,
        })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn calendar(&self) -> &HolidayCalendar {
        &self.calendar
    }

    pub fn forecast(&self, project: &ProjectFile) -> Result<Forecast> {
        let start = self.settings.start.resolve(project, self.settings.today);
        let roles = project.effort_roles();

        let allocations = project.allocation_table();
        let resolver = CapacityResolver::new(&project.team)
            .with_allocations(&allocations)
            .with_default_allocation_fte(self.settings.default_allocation_fte);
        let capacities = resolver.resolve_all(
            &roles,
            self.settings.capacity_mode,
            project.id,
            start,
            self.settings.allocation_window,
            &self.calendar,
        );

        let plan = project
            .dependency_plan(&self.workspace_plan)
            .with_context(|| format!("Invalid role dependencies in project '{}'", project.name))?;

        let projector_config = self
            .toml
            .projector_config(self.settings.default_fte, &roles)
            .context("Invalid default FTE")?;

        debug!(
            project = %project.name,
            start = %start,
            mode = %self.settings.capacity_mode,
            stages = plan.stages.len(),
            "Running forecast"
        );

        let input = project.projection_input(&capacities, plan, start);
        let projection = DeliveryProjector::new(projector_config, self.calendar.clone()).project(&input);

        let mut warnings = project.validate();
        for role in projection.defaulted_roles() {
            if let Some(schedule) = projection.role(role) {
                warnings.push(format!(
                    "Role '{}' has no capacity; assumed {} FTE",
                    role, schedule.fte
                ));
            }
        }

        Ok(Forecast {
            project_id: project.id,
            project_name: project.name.clone(),
            start_policy: self.settings.start.to_string(),
            capacity_mode: self.settings.capacity_mode,
            capacities: capacities.into_iter().collect(),
            status: projection.status(),
            projection,
            warnings,
        })
    }

    /// Chart lines for a forecast. The ideal line starts at the project's own
    /// start (or creation) date when it has one.
    pub fn chart(&self, project: &ProjectFile, forecast: &Forecast) -> BurndownChart {
        let project_start = project
            .start_date
            .or(project.created_at)
            .unwrap_or(forecast.projection.start_date);

        BurndownChart::build(
            &forecast.projection,
            &project.efforts,
            &project.history,
            project_start,
            &self.calendar,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burndown::ProgressSnapshot;
    use crate::capacity::{AllocationRecord, TeamMember};
    use crate::effort::RoleEffort;
    use crate::projector::FteSource;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn settings() -> ForecastSettings {
        ForecastSettings {
            today: date("2026-01-05"),
            start: StartPolicy::ProjectStart,
            capacity_mode: CapacityMode::Static,
            default_fte: 1.0,
            allocation_window: 20,
            default_allocation_fte: None,
        }
    }

    fn project() -> ProjectFile {
        let mut project = ProjectFile::new("Checkout");
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
            TeamMember::new("Dee", "qa", 1.0),
        ];
        project
    }

    #[test]
    fn test_forecast_default_workspace() {
        let forecaster = Forecaster::from_parts(BurndownToml::default(), settings()).unwrap();
        let forecast = forecaster.forecast(&project()).unwrap();

        // max(10, 6) then 4
        assert_eq!(forecast.projection.total_workdays, 14);
        assert_eq!(forecast.projection.calculated_delivery_date, date("2026-01-23"));
        assert_eq!(forecast.projection.diff_workdays, Some(5));
        assert_eq!(forecast.status, DeliveryStatus::OnTrack);
        assert_eq!(forecast.capacities.get("fe"), Some(&1.0));
        assert!(forecast.warnings.is_empty());
    }

    #[test]
    fn test_forecast_holidays_push_delivery() {
        let toml = BurndownToml::parse(
            r#"
[calendar]
holidays = ["2026-01-06", "2026-01-07"]
"#,
        )
        .unwrap();
        let forecaster = Forecaster::from_parts(toml, settings()).unwrap();
        let forecast = forecaster.forecast(&project()).unwrap();

        assert_eq!(forecast.projection.total_workdays, 14);
        assert_eq!(forecast.projection.calculated_delivery_date, date("2026-01-27"));
        assert_eq!(forecast.projection.diff_workdays, Some(3));
    }

    #[test]
    fn test_forecast_missing_capacity_uses_override() {
        let toml = BurndownToml::parse(
            r#"
[roles.overrides."qa"]
default_fte = 0.5
"#,
        )
        .unwrap();
        let mut project = project();
        project.team.retain(|m| m.role != "qa");

        let forecaster = Forecaster::from_parts(toml, settings()).unwrap();
        let forecast = forecaster.forecast(&project).unwrap();

        let qa = forecast.projection.role("qa").unwrap();
        assert_eq!(qa.fte_source, FteSource::Default);
        assert_eq!(qa.fte, 0.5);
        // 10 + 4 / 0.5
        assert_eq!(forecast.projection.total_workdays, 18);
        assert!(forecast.warnings.iter().any(|w| w.contains("'qa' has no capacity")));
    }

    #[test]
    fn test_forecast_allocation_mode() {
        let mut project = project();
        let fe = project.team[0].id;
        // The window covers the 20 workdays after the start date
        let mut day = date("2026-01-05");
        for _ in 0..20 {
            day = crate::calendar::add_workdays(day, 1, &crate::calendar::WeekendCalendar);
            project.allocations.push(AllocationRecord {
                team_member_id: fe,
                project_id: project.id,
                date: day,
                fte: 0.5,
            });
        }

        let mut settings = settings();
        settings.capacity_mode = CapacityMode::Allocation;
        let forecaster = Forecaster::from_parts(BurndownToml::default(), settings).unwrap();
        let forecast = forecaster.forecast(&project).unwrap();

        assert_eq!(forecast.capacities.get("fe"), Some(&0.5));
        // be and qa have no records and keep their static FTE
        assert_eq!(forecast.capacities.get("be"), Some(&1.0));
        // 10 / 0.5 then 4
        assert_eq!(forecast.projection.total_workdays, 24);
    }

    #[test]
    fn test_forecast_start_today() {
        let mut settings = settings();
        settings.start = StartPolicy::Today;
        settings.today = date("2026-01-12");
        let forecaster = Forecaster::from_parts(BurndownToml::default(), settings).unwrap();
        let forecast = forecaster.forecast(&project()).unwrap();

        assert_eq!(forecast.projection.start_date, date("2026-01-12"));
        assert_eq!(forecast.projection.calculated_delivery_date, date("2026-01-30"));
        assert_eq!(forecast.projection.diff_workdays, Some(0));
        assert_eq!(forecast.start_policy, "today");
    }

    #[test]
    fn test_forecast_invalid_holiday_fails() {
        let toml = BurndownToml::parse("[calendar]\nholidays = [\"soon\"]\n").unwrap();
        assert!(Forecaster::from_parts(toml, settings()).is_err());
    }

    #[test]
    fn test_forecast_project_cycle_fails() {
        let mut project = project();
        project.roles = vec![
            crate::roles::RoleSpec::new("fe", vec!["qa".to_string()]),
            crate::roles::RoleSpec::new("qa", vec!["fe".to_string()]),
        ];
        let forecaster = Forecaster::from_parts(BurndownToml::default(), settings()).unwrap();
        let err = forecaster.forecast(&project).unwrap_err();
        assert!(err.to_string().contains("Invalid role dependencies"));
    }

    #[test]
    fn test_chart_uses_history() {
        let mut project = project();
        project.history = vec![ProgressSnapshot {
            date: date("2026-01-05"),
            role: "fe".to_string(),
            percent_done: 0.0,
            total_mandays: None,
        }];
        let forecaster = Forecaster::from_parts(BurndownToml::default(), settings()).unwrap();
        let forecast = forecaster.forecast(&project).unwrap();
        let chart = forecaster.chart(&project, &forecast);

        assert_eq!(chart.total_mandays, 20.0);
        assert_eq!(chart.actual.len(), 1);
        assert_eq!(chart.ideal.last().unwrap().date, date("2026-01-30"));
        assert_eq!(chart.projected.last().unwrap().date, date("2026-01-23"));
    }
}
