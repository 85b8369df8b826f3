//! Team capacity resolution.
//!
//! The projector takes one pre-resolved FTE figure per role. This module turns
//! team rosters and allocation tables into that figure. Two modes exist:
//!
//! - **Static**: the sum of the FTE of every team member assigned to the role.
//! - **Allocation table**: per-day FTE from `(team_member_id, project_id, date)`
//!   records, averaged over a window of working days.
//!
//! Fetching the records is the caller's job; everything here is in-memory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::calendar::{WorkdayCalendar, add_workdays};
use crate::effort::clamp_non_negative;

/// A member of the team roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    /// Role id this member contributes to
    pub role: String,
    /// Static full-time-equivalent, e.g. 0.5 for half time
    #[serde(default = "default_member_fte")]
    pub fte: f64,
}

fn default_member_fte() -> f64 {
    1.0
}

impl TeamMember {
    pub fn new(name: &str, role: &str, fte: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role: role.to_string(),
            fte,
        }
    }
}

/// One row of the allocation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub team_member_id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub fte: f64,
}

/// Allocation records indexed by `(member, project, date)`.
#[derive(Debug, Clone, Default)]
pub struct AllocationTable {
    entries: HashMap<(Uuid, Uuid, NaiveDate), f64>,
}

impl AllocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records for the same key replace earlier ones.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AllocationRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.insert(record);
        }
        table
    }

    pub fn insert(&mut self, record: &AllocationRecord) {
        self.entries.insert(
            (record.team_member_id, record.project_id, record.date),
            clamp_non_negative(record.fte),
        );
    }

    pub fn get(&self, member: Uuid, project: Uuid, date: NaiveDate) -> Option<f64> {
        self.entries.get(&(member, project, date)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How capacity is resolved for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    /// Sum of the roster's static FTE
    #[default]
    Static,
    /// Per-day allocation records
    Allocation,
}

impl std::fmt::Display for CapacityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityMode::Static => write!(f, "static"),
            CapacityMode::Allocation => write!(f, "allocation"),
        }
    }
}

impl std::str::FromStr for CapacityMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "static" => Ok(CapacityMode::Static),
            "allocation" => Ok(CapacityMode::Allocation),
            _ => anyhow::bail!(
                "Invalid capacity mode '{}'. Valid values: static, allocation",
                s
            ),
        }
    }
}

/// Resolves per-role FTE from a roster and, optionally, an allocation table.
#[derive(Debug, Clone)]
pub struct CapacityResolver<'a> {
    members: &'a [TeamMember],
    allocations: Option<&'a AllocationTable>,
    /// FTE assumed for a member with no allocation record on a date.
    /// `None` falls back to the member's static FTE.
    default_allocation_fte: Option<f64>,
}

impl<'a> CapacityResolver<'a> {
    pub fn new(members: &'a [TeamMember]) -> Self {
        Self {
            members,
            allocations: None,
            default_allocation_fte: None,
        }
    }

    pub fn with_allocations(mut self, table: &'a AllocationTable) -> Self {
        self.allocations = Some(table);
        self
    }

    pub fn with_default_allocation_fte(mut self, fte: Option<f64>) -> Self {
        self.default_allocation_fte = fte;
        self
    }

    fn members_of<'b>(&'b self, role: &'b str) -> impl Iterator<Item = &'a TeamMember> + 'b {
        let members: &'a [TeamMember] = self.members;
        members.iter().filter(move |m| m.role == role)
    }

    /// Sum of the static FTE of all members with `role`.
    pub fn resolve_static(&self, role: &str) -> f64 {
        self.members_of(role)
            .map(|m| clamp_non_negative(m.fte))
            .sum()
    }

    /// FTE available to `role` on `project` on a single `date`.
    ///
    /// Without an allocation table this is the static figure.
    pub fn resolve_on(&self, role: &str, project: Uuid, date: NaiveDate) -> f64 {
        let Some(table) = self.allocations else {
            return self.resolve_static(role);
        };

        self.members_of(role)
            .map(|m| match table.get(m.id, project, date) {
                Some(fte) => fte,
                None => self
                    .default_allocation_fte
                    .map(clamp_non_negative)
                    .unwrap_or_else(|| clamp_non_negative(m.fte)),
            })
            .sum()
    }

    /// Mean FTE over the `workdays` working days after `from`.
    ///
    /// The window is the span `add_workdays(from, workdays)` walks: `from`
    /// itself is never part of it, just as it never counts toward a projection.
    pub fn resolve_average<C: WorkdayCalendar + ?Sized>(
        &self,
        role: &str,
        project: Uuid,
        from: NaiveDate,
        workdays: u32,
        cal: &C,
    ) -> f64 {
        if workdays == 0 || self.allocations.is_none() {
            return self.resolve_on(role, project, from);
        }

        let mut total = 0.0;
        let mut day = from;
        for _ in 0..workdays {
            day = add_workdays(day, 1, cal);
            total += self.resolve_on(role, project, day);
        }
        total / f64::from(workdays)
    }

    /// Resolve every role in `roles` with the given mode.
    pub fn resolve_all<C: WorkdayCalendar + ?Sized>(
        &self,
        roles: &[String],
        mode: CapacityMode,
        project: Uuid,
        from: NaiveDate,
        window: u32,
        cal: &C,
    ) -> HashMap<String, f64> {
        roles
            .iter()
            .map(|role| {
                let fte = match mode {
                    CapacityMode::Static => self.resolve_static(role),
                    CapacityMode::Allocation => {
                        self.resolve_average(role, project, from, window, cal)
                    }
                };
                (role.clone(), fte)
            })
            .collect()
    }
}
