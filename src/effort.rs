//! Per-role effort estimates.

use serde::{Deserialize, Serialize};

/// Estimated effort for one role on one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEffort {
    /// Role id (e.g. "fe", "be", "qa")
    pub role: String,
    /// Estimated effort in mandays
    #[serde(default)]
    pub total_mandays: f64,
    /// Completion percentage, 0 to 100
    #[serde(default)]
    pub percent_done: f64,
}

impl RoleEffort {
    pub fn new(role: &str, total_mandays: f64, percent_done: f64) -> Self {
        Self {
            role: role.to_string(),
            total_mandays,
            percent_done,
        }
    }

    /// Total mandays, with negative or non-finite values read as zero.
    pub fn total(&self) -> f64 {
        clamp_non_negative(self.total_mandays)
    }

    /// Completion percentage clamped to `[0, 100]`.
    pub fn percent(&self) -> f64 {
        if self.percent_done.is_nan() {
            return 0.0;
        }
        self.percent_done.clamp(0.0, 100.0)
    }

    /// `total * (1 - percent / 100)`, never negative.
    pub fn remaining_mandays(&self) -> f64 {
        clamp_non_negative(self.total() * (1.0 - self.percent() / 100.0))
    }

    pub fn is_done(&self) -> bool {
        self.remaining_mandays() <= 0.0
    }

    /// Warnings for values that will be clamped.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.total_mandays.is_finite() || self.total_mandays < 0.0 {
            warnings.push(format!(
                "Role '{}': total_mandays {} is negative or not a number, treated as 0",
                self.role, self.total_mandays
            ));
        }
        if !(0.0..=100.0).contains(&self.percent_done) {
            warnings.push(format!(
                "Role '{}': percent_done {} is outside 0-100, clamped",
                self.role, self.percent_done
            ));
        }
        warnings
    }
}

pub(crate) fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Sum of remaining mandays over all efforts.
pub fn total_remaining(efforts: &[RoleEffort]) -> f64 {
    efforts.iter().map(RoleEffort::remaining_mandays).sum()
}
