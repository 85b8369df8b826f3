//! Typed error hierarchy for the burndown crate.
//!
//! Two enums cover the two places that can reject input:
//! - `RoleGraphError`: role dependency graph construction
//! - `ConfigError`: `burndown.toml` values that cannot be used
//!
//! The projector itself never fails; it clamps its inputs instead.

use thiserror::Error;

/// Errors from building a role dependency graph or plan.
#[derive(Debug, Error)]
pub enum RoleGraphError {
    #[error("Duplicate role id: {role}")]
    DuplicateRole { role: String },

    #[error("Role '{role}' depends on unknown role '{dependency}'")]
    UnknownDependency { role: String, dependency: String },

    #[error("Stage {stage} references unknown role '{role}'")]
    UnknownStageRole { stage: usize, role: String },

    #[error("Cycle detected in role dependencies. Involved roles: {roles:?}")]
    Cycle { roles: Vec<String> },
}

/// Errors from configuration values that cannot be applied.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid default FTE {value}: must be a finite number greater than zero")]
    InvalidDefaultFte { value: f64 },

    #[error("Invalid holiday date '{value}': expected YYYY-MM-DD")]
    InvalidHoliday { value: String },
}
