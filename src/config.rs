use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use glob::glob;
use std::path::{Path, PathBuf};

use crate::burndown_config::BurndownConfig;
use crate::capacity::CapacityMode;
use crate::project::{ProjectFile, StartPolicy};

/// Runtime configuration for the CLI.
///
/// Bridges the layered `BurndownConfig` with what a command needs at run time:
/// the reference date used as "today" and discovery of project files.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub burndown_dir: PathBuf,
    pub projects_dir: PathBuf,
    pub today: NaiveDate,
    pub verbose: bool,
    burndown_config: BurndownConfig,
}

impl Config {
    pub fn new(
        project_dir: PathBuf,
        verbose: bool,
        today: Option<NaiveDate>,
        default_fte: Option<f64>,
        capacity_mode: Option<CapacityMode>,
        start: Option<StartPolicy>,
    ) -> Result<Self> {
        let burndown_config =
            BurndownConfig::with_cli_args(project_dir, verbose, default_fte, capacity_mode, start)?;

        Ok(Self {
            project_dir: burndown_config.project_dir.clone(),
            burndown_dir: burndown_config.burndown_dir.clone(),
            projects_dir: burndown_config.projects_dir(),
            today: today.unwrap_or_else(|| Local::now().date_naive()),
            verbose,
            burndown_config,
        })
    }

    pub fn burndown_config(&self) -> &BurndownConfig {
        &self.burndown_config
    }

    /// All `*.json` files under `.burndown/projects/`, sorted by path.
    pub fn project_files(&self) -> Result<Vec<PathBuf>> {
        let pattern = self
            .projects_dir
            .join("*.json")
            .to_string_lossy()
            .to_string();

        let mut files: Vec<PathBuf> = glob(&pattern)
            .context("Failed to read glob pattern")?
            .filter_map(|entry| entry.ok())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Find a project by path, by file stem under `projects/`, or by the
    /// project name stored in the file (case-insensitive).
    pub fn resolve_project(&self, name_or_path: &str) -> Result<PathBuf> {
        let as_path = Path::new(name_or_path);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let by_stem = self.projects_dir.join(format!("{}.json", name_or_path));
        if by_stem.is_file() {
            return Ok(by_stem);
        }

        for file in self.project_files()? {
            if let Ok(project) = ProjectFile::load(&file)
                && project.name.eq_ignore_ascii_case(name_or_path)
            {
                return Ok(file);
            }
        }

        Err(anyhow!(
            "No project '{}' found. Pass a path or put the export in {}",
            name_or_path,
            self.projects_dir.display()
        ))
    }
}
