//! Burndown chart series.
//!
//! Three lines make up a chart:
//! - **ideal**: total effort burned linearly down to zero at the target date
//!   (or the calculated delivery date when there is no target)
//! - **actual**: remaining effort reconstructed from progress history
//! - **projected**: today's remaining effort burned down to the calculated
//!   delivery date
//!
//! History snapshots are read-only input recorded elsewhere.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::calendar::{WorkdayCalendar, add_workdays, workdays_between};
use crate::effort::{RoleEffort, clamp_non_negative, total_remaining};
use crate::projector::DeliveryProjection;

/// One recorded progress entry for a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub date: NaiveDate,
    pub role: String,
    pub percent_done: f64,
    /// Estimate at the time of the snapshot, if it differed from today's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mandays: Option<f64>,
}

/// A single point on a chart line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurndownPoint {
    pub date: NaiveDate,
    pub remaining_mandays: f64,
}

impl BurndownPoint {
    fn new(date: NaiveDate, remaining_mandays: f64) -> Self {
        Self {
            date,
            remaining_mandays,
        }
    }
}

/// Linear burn from `initial` at `from` to zero at `to`, one point per working
/// day after `from`.
pub fn ideal_series<C: WorkdayCalendar + ?Sized>(
    from: NaiveDate,
    to: NaiveDate,
    initial: f64,
    cal: &C,
) -> Vec<BurndownPoint> {
    let initial = clamp_non_negative(initial);
    let steps = workdays_between(from, to, cal);
    if steps <= 0 {
        return vec![BurndownPoint::new(from, initial)];
    }

    let mut points = Vec::with_capacity(steps as usize + 1);
    points.push(BurndownPoint::new(from, initial));
    let mut day = from;
    for i in 1..=steps {
        day = add_workdays(day, 1, cal);
        let remaining = initial * (1.0 - i as f64 / steps as f64);
        points.push(BurndownPoint::new(day, remaining.max(0.0)));
    }
    points
}

/// Remaining effort on each date that has at least one snapshot.
///
/// For every role the latest snapshot on or before the date counts; a role
/// without one yet counts as not started. Snapshot totals override the current
/// estimate for the dates they cover.
pub fn actual_series(efforts: &[RoleEffort], snapshots: &[ProgressSnapshot]) -> Vec<BurndownPoint> {
    let dates: BTreeSet<NaiveDate> = snapshots.iter().map(|s| s.date).collect();

    let mut sorted: Vec<&ProgressSnapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|s| s.date);

    let current_totals: HashMap<&str, f64> = efforts
        .iter()
        .map(|e| (e.role.as_str(), e.total()))
        .collect();

    let mut roles: Vec<&str> = efforts.iter().map(|e| e.role.as_str()).collect();
    for snapshot in &sorted {
        if !roles.contains(&snapshot.role.as_str()) {
            roles.push(snapshot.role.as_str());
        }
    }

    let mut latest: HashMap<&str, RoleEffort> = HashMap::new();
    let mut cursor = 0;
    let mut points = Vec::with_capacity(dates.len());

    for date in dates {
        while cursor < sorted.len() && sorted[cursor].date <= date {
            let snap = sorted[cursor];
            let total = snap
                .total_mandays
                .or_else(|| current_totals.get(snap.role.as_str()).copied())
                .unwrap_or(0.0);
            latest.insert(
                snap.role.as_str(),
                RoleEffort::new(&snap.role, total, snap.percent_done),
            );
            cursor += 1;
        }

        let remaining: f64 = roles
            .iter()
            .map(|role| match latest.get(role) {
                Some(effort) => effort.remaining_mandays(),
                None => current_totals.get(role).copied().unwrap_or(0.0),
            })
            .sum();
        points.push(BurndownPoint::new(date, remaining));
    }

    points
}

/// All lines of one project's chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurndownChart {
    pub total_mandays: f64,
    pub remaining_mandays: f64,
    pub calculated_delivery_date: NaiveDate,
    pub target_delivery_date: Option<NaiveDate>,
    pub ideal: Vec<BurndownPoint>,
    pub actual: Vec<BurndownPoint>,
    pub projected: Vec<BurndownPoint>,
}

impl BurndownChart {
    /// Build the chart for a projection.
    ///
    /// The ideal line starts at `project_start` (or the earliest snapshot if
    /// that is earlier) with the full estimate. The projected line starts at
    /// the projection's start date with today's remaining effort.
    pub fn build<C: WorkdayCalendar + ?Sized>(
        projection: &DeliveryProjection,
        efforts: &[RoleEffort],
        snapshots: &[ProgressSnapshot],
        project_start: NaiveDate,
        cal: &C,
    ) -> Self {
        let total_mandays: f64 = efforts.iter().map(RoleEffort::total).sum();
        let remaining_mandays = total_remaining(efforts);

        let ideal_start = snapshots
            .iter()
            .map(|s| s.date)
            .min()
            .map_or(project_start, |d| d.min(project_start));
        let ideal_end = projection
            .target_delivery_date
            .unwrap_or(projection.calculated_delivery_date);

        Self {
            total_mandays,
            remaining_mandays,
            calculated_delivery_date: projection.calculated_delivery_date,
            target_delivery_date: projection.target_delivery_date,
            ideal: ideal_series(ideal_start, ideal_end, total_mandays, cal),
            actual: actual_series(efforts, snapshots),
            projected: ideal_series(
                projection.start_date,
                projection.calculated_delivery_date,
                remaining_mandays,
                cal,
            ),
        }
    }
}
