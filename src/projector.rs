//! Delivery date projection.
//!
//! Given the remaining effort of each role, the FTE each role has available and
//! the order roles work in, the projector computes how many working days are
//! left and on which date the project will be delivered. With a target date it
//! also reports the signed slip in working days.
//!
//! The projector does no I/O and holds no mutable state. Capacity from
//! allocation tables must be resolved beforehand (see [`crate::capacity`]).
//!
//! ## Example
//!
//! ```
//! use burndown::calendar::WeekendCalendar;
//! use burndown::projector::{DeliveryProjector, ProjectionInput, ProjectorConfig};
//! use burndown::roles::DependencyPlan;
//! use chrono::NaiveDate;
//!
//! let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
//! let input = ProjectionInput::new(monday)
//!     .with_role("fe", 10.0, 1.0)
//!     .with_role("be", 6.0, 1.0)
//!     .with_role("qa", 4.0, 1.0)
//!     .with_plan(DependencyPlan::two_stage(&["fe", "be"], &["qa"]));
//!
//! let projector = DeliveryProjector::new(ProjectorConfig::default(), WeekendCalendar);
//! let projection = projector.project(&input);
//! assert_eq!(projection.total_workdays, 14);
//! assert_eq!(projection.calculated_delivery_date, NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::calendar::{WeekendCalendar, WorkdayCalendar, add_workdays, workdays_between};
use crate::effort::clamp_non_negative;
use crate::errors::ConfigError;
use crate::roles::{DependencyPlan, StageKind};

/// Fractional durations within this distance below a whole day round down.
const DURATION_EPSILON: f64 = 1e-9;

/// FTE assumed when a role has no usable capacity.
pub const DEFAULT_FTE: f64 = 1.0;

/// Longest projection reported, roughly a century of weekdays. Durations past
/// this (including ones that overflow to infinity) saturate here.
pub const MAX_PROJECTION_WORKDAYS: u32 = 26_100;

/// Projector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectorConfig {
    /// FTE used for a role whose available FTE is zero, negative or missing
    default_fte: f64,
    /// Per-role replacement for `default_fte`
    role_default_fte: HashMap<String, f64>,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            default_fte: DEFAULT_FTE,
            role_default_fte: HashMap::new(),
        }
    }
}

impl ProjectorConfig {
    pub fn new(default_fte: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            default_fte: check_fte(default_fte)?,
            role_default_fte: HashMap::new(),
        })
    }

    pub fn with_role_default_fte(mut self, role: &str, fte: f64) -> Result<Self, ConfigError> {
        self.role_default_fte
            .insert(role.to_string(), check_fte(fte)?);
        Ok(self)
    }

    pub fn default_fte(&self) -> f64 {
        self.default_fte
    }

    /// Fallback FTE for `role`.
    pub fn default_fte_for(&self, role: &str) -> f64 {
        self.role_default_fte
            .get(role)
            .copied()
            .unwrap_or(self.default_fte)
    }
}

fn check_fte(value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidDefaultFte { value })
    }
}

/// Remaining effort and capacity of one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleInput {
    pub role: String,
    pub remaining_mandays: f64,
    pub available_fte: f64,
}

/// Everything the projector needs for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInput {
    pub roles: Vec<RoleInput>,
    pub plan: DependencyPlan,
    pub start_date: NaiveDate,
    pub target_delivery_date: Option<NaiveDate>,
}

impl ProjectionInput {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            roles: Vec::new(),
            plan: DependencyPlan::default(),
            start_date,
            target_delivery_date: None,
        }
    }

    pub fn with_role(mut self, role: &str, remaining_mandays: f64, available_fte: f64) -> Self {
        self.roles.push(RoleInput {
            role: role.to_string(),
            remaining_mandays,
            available_fte,
        });
        self
    }

    pub fn with_plan(mut self, plan: DependencyPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_target(mut self, target: Option<NaiveDate>) -> Self {
        self.target_delivery_date = target;
        self
    }

    /// Role ids in input order, without repeats.
    pub fn role_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for input in &self.roles {
            if !ids.contains(&input.role) {
                ids.push(input.role.clone());
            }
        }
        ids
    }
}

/// Where the FTE used for a role came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FteSource {
    /// Capacity supplied by the caller
    Team,
    /// Capacity was zero or missing; the configured default applied
    Default,
}

/// Timeline of one role inside the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSchedule {
    pub role: String,
    pub stage: usize,
    pub stage_kind: StageKind,
    pub remaining_mandays: f64,
    pub fte: f64,
    pub fte_source: FteSource,
    /// Fractional working days
    pub duration_days: f64,
    /// Working-day offsets from the start date
    pub start_offset: f64,
    pub end_offset: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Schedule health against the target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Delivered on or before the target
    OnTrack,
    /// Delivered after the target
    Late,
    /// No target date set
    NoTarget,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::OnTrack => write!(f, "on track"),
            DeliveryStatus::Late => write!(f, "late"),
            DeliveryStatus::NoTarget => write!(f, "no target"),
        }
    }
}

/// Result of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryProjection {
    pub start_date: NaiveDate,
    pub total_workdays: u32,
    pub calculated_delivery_date: NaiveDate,
    pub target_delivery_date: Option<NaiveDate>,
    /// Working days from the calculated date to the target. Positive means
    /// margin, negative means slip.
    pub diff_workdays: Option<i64>,
    pub schedule: Vec<RoleSchedule>,
}

impl DeliveryProjection {
    pub fn status(&self) -> DeliveryStatus {
        match self.diff_workdays {
            None => DeliveryStatus::NoTarget,
            Some(diff) if diff < 0 => DeliveryStatus::Late,
            Some(_) => DeliveryStatus::OnTrack,
        }
    }

    pub fn is_late(&self) -> bool {
        self.status() == DeliveryStatus::Late
    }

    pub fn role(&self, role: &str) -> Option<&RoleSchedule> {
        self.schedule.iter().find(|s| s.role == role)
    }

    /// Roles that fell back to the default FTE.
    pub fn defaulted_roles(&self) -> Vec<&str> {
        self.schedule
            .iter()
            .filter(|s| s.fte_source == FteSource::Default && s.remaining_mandays > 0.0)
            .map(|s| s.role.as_str())
            .collect()
    }
}

/// Round a fractional working-day count up to whole days.
///
/// NaN and non-positive counts are zero. Anything at or past
/// [`MAX_PROJECTION_WORKDAYS`], `+inf` included, saturates there.
pub fn ceil_workdays(days: f64) -> u32 {
    if days.is_nan() || days <= DURATION_EPSILON {
        return 0;
    }
    clamp_workdays((days - DURATION_EPSILON).ceil())
}

/// Whole working-day offset clamped to `[0, MAX_PROJECTION_WORKDAYS]`.
fn clamp_workdays(days: f64) -> u32 {
    if days.is_nan() || days <= 0.0 {
        0
    } else if days >= f64::from(MAX_PROJECTION_WORKDAYS) {
        MAX_PROJECTION_WORKDAYS
    } else {
        days as u32
    }
}

/// Computes delivery projections against a workday calendar.
#[derive(Debug, Clone)]
pub struct DeliveryProjector<C = WeekendCalendar> {
    config: ProjectorConfig,
    calendar: C,
}

impl Default for DeliveryProjector<WeekendCalendar> {
    fn default() -> Self {
        Self::new(ProjectorConfig::default(), WeekendCalendar)
    }
}

impl<C: WorkdayCalendar> DeliveryProjector<C> {
    pub fn new(config: ProjectorConfig, calendar: C) -> Self {
        Self { config, calendar }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    /// Remaining mandays and effective FTE for every role in the input.
    /// Repeated roles add their remaining mandays; the first FTE wins.
    fn collect_roles(&self, input: &ProjectionInput) -> HashMap<String, (f64, f64, FteSource)> {
        let mut merged: HashMap<String, (f64, f64, FteSource)> = HashMap::new();

        for role in &input.roles {
            let remaining = clamp_non_negative(role.remaining_mandays);
            if let Some(entry) = merged.get_mut(&role.role) {
                entry.0 += remaining;
                continue;
            }

            let (fte, source) = if role.available_fte.is_finite() && role.available_fte > 0.0 {
                (role.available_fte, FteSource::Team)
            } else {
                let fallback = self.config.default_fte_for(&role.role);
                if remaining > 0.0 {
                    warn!(
                        role = %role.role,
                        available_fte = role.available_fte,
                        default_fte = fallback,
                        "No capacity for role, using default FTE"
                    );
                }
                (fallback, FteSource::Default)
            };
            merged.insert(role.role.clone(), (remaining, fte, source));
        }

        merged
    }

    /// Project the delivery date for `input`.
    pub fn project(&self, input: &ProjectionInput) -> DeliveryProjection {
        let roles = self.collect_roles(input);
        let plan = input.plan.normalized(&input.role_ids());

        let mut schedule = Vec::new();
        let mut stage_start = 0.0_f64;

        for (stage_idx, stage) in plan.stages.iter().enumerate() {
            let mut cursor = stage_start;
            let mut stage_end = stage_start;

            for role_id in &stage.roles {
                let Some(&(remaining, fte, fte_source)) = roles.get(role_id) else {
                    debug!(role = %role_id, stage = stage_idx, "Planned role has no effort, skipping");
                    continue;
                };

                let duration = if remaining > 0.0 { remaining / fte } else { 0.0 };
                let start_offset = match stage.kind {
                    StageKind::Parallel => stage_start,
                    StageKind::Sequential => cursor,
                };
                let end_offset = start_offset + duration;
                cursor = end_offset;
                stage_end = stage_end.max(end_offset);

                schedule.push(RoleSchedule {
                    role: role_id.clone(),
                    stage: stage_idx,
                    stage_kind: stage.kind,
                    remaining_mandays: remaining,
                    fte,
                    fte_source,
                    duration_days: duration,
                    start_offset,
                    end_offset,
                    start_date: add_workdays(
                        input.start_date,
                        clamp_workdays(start_offset.floor()),
                        &self.calendar,
                    ),
                    end_date: add_workdays(
                        input.start_date,
                        ceil_workdays(end_offset),
                        &self.calendar,
                    ),
                });
            }

            debug!(
                stage = stage_idx,
                kind = %stage.kind,
                duration = stage_end - stage_start,
                "Stage scheduled"
            );
            stage_start = stage_end;
        }

        let total_workdays = ceil_workdays(stage_start);
        if stage_start > f64::from(MAX_PROJECTION_WORKDAYS) {
            warn!(
                duration = stage_start,
                max_workdays = MAX_PROJECTION_WORKDAYS,
                "Projection exceeds the planning horizon, capping"
            );
        }
        let calculated_delivery_date = add_workdays(input.start_date, total_workdays, &self.calendar);
        let diff_workdays = input
            .target_delivery_date
            .map(|target| workdays_between(calculated_delivery_date, target, &self.calendar));

        debug!(
            total_workdays,
            %calculated_delivery_date,
            ?diff_workdays,
            "Projection computed"
        );

        DeliveryProjection {
            start_date: input.start_date,
            total_workdays,
            calculated_delivery_date,
            target_delivery_date: input.target_delivery_date,
            diff_workdays,
            schedule,
        }
    }
}
