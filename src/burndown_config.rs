//! Unified configuration for a burndown workspace.
//!
//! Settings live in `.burndown/burndown.toml`. Values are layered:
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [workspace]
//! name = "platform-team"
//!
//! [defaults]
//! default_fte = 1.0
//! capacity_mode = "allocation"
//! allocation_window = 20
//! default_allocation_fte = 0.5
//! start = "start"
//!
//! [calendar]
//! holidays = ["2026-12-24", "2026-12-25"]
//!
//! [[roles.definitions]]
//! id = "fe"
//! label = "Frontend"
//!
//! [[roles.definitions]]
//! id = "qa"
//! label = "QA"
//! depends_on = ["fe"]
//!
//! [roles.overrides."qa*"]
//! default_fte = 0.5
//!
//! [[plan.stages]]
//! kind = "parallel"
//! roles = ["fe", "be"]
//!
//! [[plan.stages]]
//! kind = "sequential"
//! roles = ["qa"]
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::calendar::HolidayCalendar;
use crate::capacity::CapacityMode;
use crate::errors::{ConfigError, RoleGraphError};
use crate::init::{BURNDOWN_DIR, PROJECTS_DIR};
use crate::project::StartPolicy;
use crate::projector::{DEFAULT_FTE, ProjectorConfig};
use crate::roles::{DependencyPlan, RoleGraphBuilder, RoleSpec, default_roles};

/// Name of the configuration file inside the workspace directory.
pub const CONFIG_FILE: &str = "burndown.toml";

/// Workspace-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSection {
    /// Display name (optional, defaults to directory name)
    #[serde(default)]
    pub name: Option<String>,
}

/// Default settings for every projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsSection {
    /// FTE used when a role has no capacity
    #[serde(default = "default_fte")]
    pub default_fte: f64,
    /// Static roster FTE or allocation table
    #[serde(default)]
    pub capacity_mode: CapacityMode,
    /// Working days averaged in allocation mode
    #[serde(default = "default_allocation_window")]
    pub allocation_window: u32,
    /// FTE for a member with no allocation record on a day.
    /// Unset means the member's static FTE.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_allocation_fte: Option<f64>,
    /// Date projections count from
    #[serde(default)]
    pub start: StartPolicy,
}

fn default_fte() -> f64 {
    DEFAULT_FTE
}

fn default_allocation_window() -> u32 {
    20
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            default_fte: default_fte(),
            capacity_mode: CapacityMode::default(),
            allocation_window: default_allocation_window(),
            default_allocation_fte: None,
            start: StartPolicy::default(),
        }
    }
}

/// Non-working days on top of weekends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarSection {
    /// ISO dates (YYYY-MM-DD)
    #[serde(default)]
    pub holidays: Vec<String>,
}

/// Role-specific override settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleOverride {
    /// Fallback FTE for matching roles
    #[serde(default)]
    pub default_fte: Option<f64>,
}

/// Role definitions and pattern overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesSection {
    /// Workspace roles; empty means fe/be in parallel, then qa
    #[serde(default)]
    pub definitions: Vec<RoleSpec>,
    /// Pattern-based overrides (e.g., "qa*" -> RoleOverride)
    #[serde(default)]
    pub overrides: HashMap<String, RoleOverride>,
}

/// The complete burndown.toml structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurndownToml {
    #[serde(default)]
    pub workspace: WorkspaceSection,
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub calendar: CalendarSection,
    #[serde(default)]
    pub roles: RolesSection,
    /// Explicit stage plan; wins over role `depends_on`
    #[serde(default)]
    pub plan: DependencyPlan,
}

impl BurndownToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse burndown.toml")
    }

    /// Load from `<burndown_dir>/burndown.toml`, or defaults if it does not exist.
    pub fn load_or_default(burndown_dir: &Path) -> Result<Self> {
        let config_path = burndown_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize burndown.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Default FTE, with `BURNDOWN_DEFAULT_FTE` taking precedence over the file.
    pub fn default_fte(&self) -> f64 {
        std::env::var("BURNDOWN_DEFAULT_FTE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(self.defaults.default_fte)
    }

    /// Capacity mode, with `BURNDOWN_CAPACITY_MODE` taking precedence over the file.
    pub fn capacity_mode(&self) -> CapacityMode {
        std::env::var("BURNDOWN_CAPACITY_MODE")
            .ok()
            .and_then(|v| v.parse::<CapacityMode>().ok())
            .unwrap_or(self.defaults.capacity_mode)
    }

    /// Workspace roles, or the built-in fe/be/qa set.
    pub fn role_definitions(&self) -> Vec<RoleSpec> {
        if self.roles.definitions.is_empty() {
            default_roles()
        } else {
            self.roles.definitions.clone()
        }
    }

    /// Workspace stage plan: the explicit `[plan]`, else the role graph waves.
    pub fn dependency_plan(&self) -> Result<DependencyPlan, RoleGraphError> {
        if !self.plan.is_empty() {
            return Ok(self.plan.clone());
        }
        let graph = RoleGraphBuilder::new(self.role_definitions()).build()?;
        Ok(DependencyPlan::from_graph(&graph))
    }

    /// Effective fallback FTE for a role, applying pattern overrides.
    /// When several patterns match, the lowest FTE wins so the result does
    /// not depend on map order.
    pub fn role_default_fte(&self, role: &str, base: f64) -> f64 {
        self.roles
            .overrides
            .iter()
            .filter(|(pattern, _)| pattern_matches(pattern, role))
            .filter_map(|(_, o)| o.default_fte)
            .fold(None, |acc: Option<f64>, fte| Some(acc.map_or(fte, |a| a.min(fte))))
            .unwrap_or(base)
    }

    /// Weekends plus the configured holidays.
    pub fn holiday_calendar(&self) -> Result<HolidayCalendar, ConfigError> {
        let mut calendar = HolidayCalendar::default();
        for value in &self.calendar.holidays {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidHoliday {
                    value: value.clone(),
                }
            })?;
            calendar.add_holiday(date);
        }
        Ok(calendar)
    }

    /// Projector settings for the given roles.
    pub fn projector_config(&self, base_fte: f64, roles: &[String]) -> Result<ProjectorConfig, ConfigError> {
        let mut config = ProjectorConfig::new(base_fte)?;
        for role in roles {
            let fte = self.role_default_fte(role, base_fte);
            if fte != base_fte {
                config = config.with_role_default_fte(role, fte)?;
            }
        }
        Ok(config)
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !is_valid_fte(self.defaults.default_fte) {
            warnings.push(format!(
                "Invalid default_fte {}: must be greater than zero",
                self.defaults.default_fte
            ));
        }

        if let Some(fte) = self.defaults.default_allocation_fte
            && !(fte.is_finite() && fte >= 0.0)
        {
            warnings.push(format!("Invalid default_allocation_fte {}", fte));
        }

        if self.defaults.capacity_mode == CapacityMode::Allocation
            && self.defaults.allocation_window == 0
        {
            warnings.push(
                "allocation_window is 0: allocation mode will only use the start date".to_string(),
            );
        }

        for value in &self.calendar.holidays {
            if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
                warnings.push(format!(
                    "Invalid holiday '{}': should be a YYYY-MM-DD date",
                    value
                ));
            }
        }

        for (pattern, override_cfg) in &self.roles.overrides {
            if let Some(fte) = override_cfg.default_fte
                && !is_valid_fte(fte)
            {
                warnings.push(format!(
                    "Invalid default_fte {} in override for pattern '{}'",
                    fte, pattern
                ));
            }
        }

        if let Err(e) = RoleGraphBuilder::new(self.role_definitions()).build() {
            warnings.push(format!("Invalid role definitions: {}", e));
        }

        if !self.plan.is_empty() && !self.roles.definitions.is_empty() {
            let known: Vec<String> = self.roles.definitions.iter().map(|r| r.id.clone()).collect();
            if let Err(e) = self.plan.validate_against(&known) {
                warnings.push(format!("Invalid plan: {}", e));
            }
        }

        warnings
    }
}

fn is_valid_fte(fte: f64) -> bool {
    fte.is_finite() && fte > 0.0
}

/// Check if a pattern matches a role id.
/// Supports simple glob patterns:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pattern_lower: Vec<char> = pattern.to_lowercase().chars().collect();
    let name_lower: Vec<char> = name.to_lowercase().chars().collect();

    glob_match(&pattern_lower, &name_lower)
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|i| glob_match(rest, &text[i..])),
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}

/// Configuration combining burndown.toml with runtime overrides.
///
/// Merges settings from:
/// 1. burndown.toml file
/// 2. Environment variables
/// 3. CLI arguments
#[derive(Debug, Clone)]
pub struct BurndownConfig {
    pub project_dir: PathBuf,
    pub burndown_dir: PathBuf,
    pub toml: BurndownToml,
    pub verbose: bool,
    pub cli_default_fte: Option<f64>,
    pub cli_capacity_mode: Option<CapacityMode>,
    pub cli_start: Option<StartPolicy>,
}

impl BurndownConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let burndown_dir = project_dir.join(BURNDOWN_DIR);
        let toml = BurndownToml::load_or_default(&burndown_dir)?;

        Ok(Self {
            project_dir,
            burndown_dir,
            toml,
            verbose: false,
            cli_default_fte: None,
            cli_capacity_mode: None,
            cli_start: None,
        })
    }

    pub fn with_cli_args(
        project_dir: PathBuf,
        verbose: bool,
        default_fte: Option<f64>,
        capacity_mode: Option<CapacityMode>,
        start: Option<StartPolicy>,
    ) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.cli_default_fte = default_fte;
        config.cli_capacity_mode = capacity_mode;
        config.cli_start = start;
        Ok(config)
    }

    /// CLI → env → file → default.
    pub fn default_fte(&self) -> f64 {
        self.cli_default_fte.unwrap_or_else(|| self.toml.default_fte())
    }

    /// CLI → env → file → default.
    pub fn capacity_mode(&self) -> CapacityMode {
        self.cli_capacity_mode
            .unwrap_or_else(|| self.toml.capacity_mode())
    }

    /// CLI → file → default.
    pub fn start_policy(&self) -> StartPolicy {
        self.cli_start.unwrap_or(self.toml.defaults.start)
    }

    pub fn config_file(&self) -> PathBuf {
        self.burndown_dir.join(CONFIG_FILE)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.burndown_dir.join(PROJECTS_DIR)
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WorkdayCalendar;
    use crate::roles::{Stage, StageKind};
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_pattern_matches_exact() {
        assert!(pattern_matches("qa", "qa"));
        assert!(!pattern_matches("qa", "qa-auto"));
    }

    #[test]
    fn test_pattern_matches_star() {
        assert!(pattern_matches("qa*", "qa"));
        assert!(pattern_matches("qa*", "qa-auto"));
        assert!(pattern_matches("*-auto", "qa-auto"));
        assert!(pattern_matches("be-*-api", "be-core-api"));
        assert!(!pattern_matches("be-*-api", "be-api"));
        assert!(pattern_matches("*", "anything"));
    }

    #[test]
    fn test_pattern_matches_question_mark() {
        assert!(pattern_matches("fe?", "fe1"));
        assert!(!pattern_matches("fe?", "fe"));
        assert!(!pattern_matches("fe?", "fe12"));
    }

    #[test]
    fn test_pattern_matches_case_insensitive() {
        assert!(pattern_matches("QA*", "qa-manual"));
        assert!(pattern_matches("fe", "FE"));
    }

    #[test]
    fn test_parse_empty() {
        let toml = BurndownToml::parse("").unwrap();
        assert_eq!(toml.defaults.default_fte, 1.0);
        assert_eq!(toml.defaults.capacity_mode, CapacityMode::Static);
        assert_eq!(toml.defaults.allocation_window, 20);
        assert_eq!(toml.defaults.start, StartPolicy::ProjectStart);
        assert!(toml.plan.is_empty());
    }

    #[test]
    fn test_parse_full() {
        let content = r#"
[workspace]
name = "platform"

[defaults]
default_fte = 0.8
capacity_mode = "allocation"
allocation_window = 10
default_allocation_fte = 0.5
start = "today"

[calendar]
holidays = ["2026-12-25"]

[[roles.definitions]]
id = "fe"
label = "Frontend"

[[roles.definitions]]
id = "qa"
depends_on = ["fe"]

[roles.overrides."qa*"]
default_fte = 0.5

[[plan.stages]]
kind = "parallel"
roles = ["fe"]

[[plan.stages]]
kind = "sequential"
roles = ["qa"]
"#;
        let toml = BurndownToml::parse(content).unwrap();
        assert_eq!(toml.workspace.name.as_deref(), Some("platform"));
        assert_eq!(toml.defaults.default_fte, 0.8);
        assert_eq!(toml.defaults.capacity_mode, CapacityMode::Allocation);
        assert_eq!(toml.defaults.default_allocation_fte, Some(0.5));
        assert_eq!(toml.defaults.start, StartPolicy::Today);
        assert_eq!(toml.roles.definitions.len(), 2);
        assert_eq!(toml.plan.stages[1].kind, StageKind::Sequential);
        assert!(toml.validate().is_empty());
    }

    #[test]
    fn test_parse_invalid_start() {
        let result = BurndownToml::parse("[defaults]\nstart = \"whenever\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_dependency_plan_defaults_to_fe_be_then_qa() {
        let plan = BurndownToml::default().dependency_plan().unwrap();
        assert_eq!(
            plan.stages,
            vec![Stage::parallel(&["fe", "be"]), Stage::parallel(&["qa"])]
        );
    }

    #[test]
    fn test_dependency_plan_explicit_wins() {
        let mut toml = BurndownToml::default();
        toml.plan = DependencyPlan::two_stage(&["be"], &["fe", "qa"]);
        assert_eq!(toml.dependency_plan().unwrap(), toml.plan);
    }

    #[test]
    fn test_role_default_fte_overrides() {
        let mut toml = BurndownToml::default();
        toml.roles.overrides.insert(
            "qa*".to_string(),
            RoleOverride {
                default_fte: Some(0.5),
            },
        );
        toml.roles.overrides.insert(
            "*auto".to_string(),
            RoleOverride {
                default_fte: Some(0.25),
            },
        );
        assert_eq!(toml.role_default_fte("fe", 1.0), 1.0);
        assert_eq!(toml.role_default_fte("qa", 1.0), 0.5);
        assert_eq!(toml.role_default_fte("qa-auto", 1.0), 0.25);
    }

    #[test]
    fn test_projector_config_from_overrides() {
        let mut toml = BurndownToml::default();
        toml.roles.overrides.insert(
            "qa".to_string(),
            RoleOverride {
                default_fte: Some(0.5),
            },
        );
        let roles = vec!["fe".to_string(), "qa".to_string()];
        let config = toml.projector_config(1.0, &roles).unwrap();
        assert_eq!(config.default_fte_for("fe"), 1.0);
        assert_eq!(config.default_fte_for("qa"), 0.5);

        assert!(toml.projector_config(0.0, &roles).is_err());
    }

    #[test]
    fn test_holiday_calendar() {
        let mut toml = BurndownToml::default();
        toml.calendar.holidays = vec!["2026-12-25".to_string()];
        let cal = toml.holiday_calendar().unwrap();
        // Christmas 2026 falls on a Friday
        assert!(!cal.is_workday(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()));
        assert!(cal.is_workday(NaiveDate::from_ymd_opt(2026, 12, 24).unwrap()));

        toml.calendar.holidays.push("25/12/2026".to_string());
        assert!(matches!(
            toml.holiday_calendar(),
            Err(ConfigError::InvalidHoliday { .. })
        ));
        assert!(toml.validate().iter().any(|w| w.contains("25/12/2026")));
    }

    #[test]
    fn test_validate_warnings() {
        let mut toml = BurndownToml::default();
        assert!(toml.validate().is_empty());

        toml.defaults.default_fte = 0.0;
        toml.roles.definitions = vec![RoleSpec::new("qa", vec!["ops".to_string()])];
        toml.plan = DependencyPlan::two_stage(&["fe"], &[]);

        let warnings = toml.validate();
        assert!(warnings.iter().any(|w| w.contains("default_fte")));
        assert!(warnings.iter().any(|w| w.contains("Invalid role definitions")));
        assert!(warnings.iter().any(|w| w.contains("Invalid plan")));
    }

    #[test]
    fn test_default_fte_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("BURNDOWN_DEFAULT_FTE").ok();

        let mut toml = BurndownToml::default();
        toml.defaults.default_fte = 0.7;
        unsafe { std::env::remove_var("BURNDOWN_DEFAULT_FTE") };
        assert_eq!(toml.default_fte(), 0.7);

        unsafe { std::env::set_var("BURNDOWN_DEFAULT_FTE", "0.4") };
        assert_eq!(toml.default_fte(), 0.4);

        match saved {
            Some(val) => unsafe { std::env::set_var("BURNDOWN_DEFAULT_FTE", val) },
            None => unsafe { std::env::remove_var("BURNDOWN_DEFAULT_FTE") },
        }
    }

    #[test]
    fn test_capacity_mode_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("BURNDOWN_CAPACITY_MODE").ok();

        let toml = BurndownToml::default();
        unsafe { std::env::set_var("BURNDOWN_CAPACITY_MODE", "allocation") };
        assert_eq!(toml.capacity_mode(), CapacityMode::Allocation);
        unsafe { std::env::set_var("BURNDOWN_CAPACITY_MODE", "bogus") };
        assert_eq!(toml.capacity_mode(), CapacityMode::Static);

        match saved {
            Some(val) => unsafe { std::env::set_var("BURNDOWN_CAPACITY_MODE", val) },
            None => unsafe { std::env::remove_var("BURNDOWN_CAPACITY_MODE") },
        }
    }

    #[test]
    fn test_capacity_mode_env_is_case_insensitive() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let saved = std::env::var("BURNDOWN_CAPACITY_MODE").ok();

        let mut toml = BurndownToml::default();
        unsafe { std::env::set_var("BURNDOWN_CAPACITY_MODE", "ALLOCATION") };
        assert_eq!(toml.capacity_mode(), CapacityMode::Allocation);

        toml.defaults.capacity_mode = CapacityMode::Allocation;
        unsafe { std::env::set_var("BURNDOWN_CAPACITY_MODE", "Static") };
        assert_eq!(toml.capacity_mode(), CapacityMode::Static);

        match saved {
            Some(val) => unsafe { std::env::set_var("BURNDOWN_CAPACITY_MODE", val) },
            None => unsafe { std::env::remove_var("BURNDOWN_CAPACITY_MODE") },
        }
    }

    #[test]
    fn test_load_and_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = BurndownToml::default();
        toml.defaults.default_fte = 0.75;
        toml.calendar.holidays = vec!["2026-05-01".to_string()];
        toml.save(&path).unwrap();

        let loaded = BurndownToml::load(&path).unwrap();
        assert_eq!(loaded.defaults.default_fte, 0.75);
        assert_eq!(loaded.calendar.holidays, vec!["2026-05-01"]);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = BurndownToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.defaults.default_fte, 1.0);
    }

    #[test]
    fn test_burndown_config_cli_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().unwrap();
        let burndown_dir = dir.path().join(BURNDOWN_DIR);
        std::fs::create_dir_all(&burndown_dir).unwrap();
        std::fs::write(
            burndown_dir.join(CONFIG_FILE),
            "[defaults]\ndefault_fte = 0.5\n",
        )
        .unwrap();

        let config = BurndownConfig::with_cli_args(
            dir.path().to_path_buf(),
            true,
            Some(2.0),
            Some(CapacityMode::Allocation),
            Some(StartPolicy::Today),
        )
        .unwrap();

        assert!(config.verbose);
        assert_eq!(config.toml.defaults.default_fte, 0.5);
        assert_eq!(config.default_fte(), 2.0);
        assert_eq!(config.capacity_mode(), CapacityMode::Allocation);
        assert_eq!(config.start_policy(), StartPolicy::Today);
        assert_eq!(
            config.projects_dir(),
            dir.path().canonicalize().unwrap().join(".burndown/projects")
        );
    }
}
